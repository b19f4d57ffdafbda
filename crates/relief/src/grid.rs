//! Flat row-major square grids
//!
//! All 2D rasters in the pipeline (elevation, heightmap, water mask) are
//! stored as a single flat buffer with explicit side-length metadata and
//! bounds-checked accessors.

/// A square grid of cells stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    /// Side length in cells
    pub side: usize,
    /// Cell values in row-major order (`data[y * side + x]`)
    pub data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Create a grid with every cell set to `value`
    pub fn filled(side: usize, value: T) -> Self {
        Self {
            side,
            data: vec![value; side * side],
        }
    }

    /// Create a grid from existing row-major data
    ///
    /// # Panics
    /// Panics if data length doesn't match side * side
    pub fn from_data(side: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), side * side, "Data length must equal side * side");
        Self { side, data }
    }

    /// Get the value at a grid position
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.side && y < self.side {
            Some(self.data[y * self.side + x])
        } else {
            None
        }
    }

    /// Set the value at a grid position; out-of-bounds writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.side && y < self.side {
            self.data[y * self.side + x] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_get_set() {
        let mut grid = Grid::filled(10, 0i32);
        grid.set(5, 5, 100);
        assert_eq!(grid.get(5, 5), Some(100));
        assert_eq!(grid.get(0, 0), Some(0));
        assert_eq!(grid.get(10, 10), None);
    }

    #[test]
    fn test_grid_out_of_bounds_write_ignored() {
        let mut grid = Grid::filled(4, 1.0f32);
        grid.set(4, 0, 9.0);
        assert!(grid.data.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_grid_from_data() {
        let grid = Grid::from_data(2, vec![1, 2, 3, 4]);
        assert_eq!(grid.get(1, 0), Some(2));
        assert_eq!(grid.get(0, 1), Some(3));
    }
}
