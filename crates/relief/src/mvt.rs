//! Mapbox Vector Tile decoding
//!
//! Minimal protobuf schema for the vector tile spec plus the command-stream
//! geometry decoder. Only the pieces the water rasterizer needs: named
//! layers and their feature paths in tile-local integer coordinates.

use prost::Message;

use crate::error::Result;

/// Default tile-local coordinate extent when a layer does not declare one
pub const DEFAULT_EXTENT: u32 = 4096;

/// A decoded vector tile: a set of named layers
#[derive(Clone, PartialEq, Message)]
pub struct Tile {
    #[prost(message, repeated, tag = "3")]
    pub layers: Vec<Layer>,
}

/// One named layer of a vector tile
#[derive(Clone, PartialEq, Message)]
pub struct Layer {
    #[prost(string, required, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub features: Vec<Feature>,
    #[prost(string, repeated, tag = "3")]
    pub keys: Vec<String>,
    #[prost(message, repeated, tag = "4")]
    pub values: Vec<Value>,
    #[prost(uint32, optional, tag = "5")]
    pub extent_raw: Option<u32>,
    #[prost(uint32, required, tag = "15")]
    pub version: u32,
}

/// One feature: a geometry command stream plus attribute tag pairs
#[derive(Clone, PartialEq, Message)]
pub struct Feature {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    #[prost(uint32, repeated, tag = "2")]
    pub tags: Vec<u32>,
    #[prost(enumeration = "GeomType", optional, tag = "3")]
    pub geom_type: Option<i32>,
    #[prost(uint32, repeated, tag = "4")]
    pub geometry: Vec<u32>,
}

/// Typed attribute value (only one field is ever set)
#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(string, optional, tag = "1")]
    pub string_value: Option<String>,
    #[prost(float, optional, tag = "2")]
    pub float_value: Option<f32>,
    #[prost(double, optional, tag = "3")]
    pub double_value: Option<f64>,
    #[prost(int64, optional, tag = "4")]
    pub int_value: Option<i64>,
    #[prost(uint64, optional, tag = "5")]
    pub uint_value: Option<u64>,
    #[prost(sint64, optional, tag = "6")]
    pub sint_value: Option<i64>,
    #[prost(bool, optional, tag = "7")]
    pub bool_value: Option<bool>,
}

/// Feature geometry kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
pub enum GeomType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
}

impl Tile {
    /// Decode a tile from its binary protobuf payload
    pub fn decode_payload(payload: &[u8]) -> Result<Tile> {
        Ok(Tile::decode(payload)?)
    }

    /// Look up a layer by name
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

impl Layer {
    /// Tile-local coordinate extent of this layer
    pub fn extent(&self) -> u32 {
        self.extent_raw.unwrap_or(DEFAULT_EXTENT)
    }
}

impl Feature {
    /// Geometry kind of this feature
    pub fn kind(&self) -> GeomType {
        self.geom_type
            .and_then(|v| GeomType::try_from(v).ok())
            .unwrap_or(GeomType::Unknown)
    }

    /// Decode the command stream into paths of tile-local points.
    ///
    /// MoveTo starts a new path, LineTo extends it, ClosePath repeats the
    /// first point so rings come back explicitly closed.
    pub fn paths(&self) -> Vec<Vec<(i32, i32)>> {
        decode_paths(&self.geometry)
    }
}

fn decode_paths(commands: &[u32]) -> Vec<Vec<(i32, i32)>> {
    let mut paths: Vec<Vec<(i32, i32)>> = Vec::new();
    let mut path: Vec<(i32, i32)> = Vec::new();
    let mut cursor = 0usize;
    let mut x = 0i32;
    let mut y = 0i32;

    while cursor < commands.len() {
        let command = commands[cursor];
        cursor += 1;
        let id = command & 0x7;
        let count = command >> 3;
        match id {
            1 => {
                // MoveTo
                for _ in 0..count {
                    if cursor + 1 >= commands.len() {
                        break;
                    }
                    x += decode_zigzag(commands[cursor]);
                    y += decode_zigzag(commands[cursor + 1]);
                    cursor += 2;
                    if !path.is_empty() {
                        paths.push(std::mem::take(&mut path));
                    }
                    path.push((x, y));
                }
            }
            2 => {
                // LineTo
                for _ in 0..count {
                    if cursor + 1 >= commands.len() {
                        break;
                    }
                    x += decode_zigzag(commands[cursor]);
                    y += decode_zigzag(commands[cursor + 1]);
                    cursor += 2;
                    path.push((x, y));
                }
            }
            7 => {
                // ClosePath
                if let Some(first) = path.first().copied() {
                    path.push(first);
                }
            }
            _ => break,
        }
    }
    if !path.is_empty() {
        paths.push(path);
    }
    paths
}

fn decode_zigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}
