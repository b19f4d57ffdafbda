//! Concurrent tile acquisition
//!
//! Fans out one HTTP request per elevation tile and per vector tile of a
//! square block (2 x tile_count^2 requests in flight) and exposes a counting
//! completion barrier with a bounded timeout. A failed fetch leaves its slot
//! empty and is never retried; the gap surfaces as an eventual
//! [`Error::Timeout`] naming the number of unresolved tiles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tile::TileCoord;

/// Default raster (terrain-RGB) tile endpoint
pub const DEFAULT_RASTER_URL: &str = "https://api.mapbox.com/v4/mapbox.terrain-rgb";
/// Default vector (streets) tile endpoint
pub const DEFAULT_VECTOR_URL: &str = "https://api.mapbox.com/v4/mapbox.mapbox-streets-v8";

/// Default completion deadline for a whole block download
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(100);

/// Raw payloads for a square block of tiles, one slot per (row, col)
///
/// A slot stays `None` until its fetch resolves. Owned by a single
/// generation; discarded when the invocation completes.
#[derive(Debug, Default)]
pub struct TileBlock {
    /// Tiles per side
    pub tile_count: usize,
    /// Encoded elevation tile payloads, row-major
    pub raster: Vec<Option<Vec<u8>>>,
    /// Encoded vector tile payloads, row-major
    pub vector: Vec<Option<Vec<u8>>>,
}

impl TileBlock {
    fn empty(tile_count: usize) -> Self {
        let slots = tile_count * tile_count;
        Self {
            tile_count,
            raster: vec![None; slots],
            vector: vec![None; slots],
        }
    }

    /// Raster payload at (row, col), if resolved
    pub fn raster_at(&self, row: usize, col: usize) -> Option<&[u8]> {
        self.raster
            .get(row * self.tile_count + col)
            .and_then(|slot| slot.as_deref())
    }

    /// Vector payload at (row, col), if resolved
    pub fn vector_at(&self, row: usize, col: usize) -> Option<&[u8]> {
        self.vector
            .get(row * self.tile_count + col)
            .and_then(|slot| slot.as_deref())
    }
}

#[derive(Debug, Clone, Copy)]
enum SlotKind {
    Raster,
    Vector,
}

#[derive(Debug)]
struct Shared {
    slots: Mutex<TileBlock>,
    resolved: AtomicUsize,
    expected: usize,
    notify: Notify,
}

impl Shared {
    async fn complete_slot(&self, kind: SlotKind, index: usize, payload: Vec<u8>) {
        {
            let mut block = self.slots.lock().await;
            let slot = match kind {
                SlotKind::Raster => &mut block.raster[index],
                SlotKind::Vector => &mut block.vector[index],
            };
            *slot = Some(payload);
        }
        self.resolved.fetch_add(1, Ordering::Release);
        self.notify.notify_waiters();
    }
}

/// Handle to an in-flight block download
#[derive(Debug)]
pub struct BlockHandle {
    shared: Arc<Shared>,
}

impl BlockHandle {
    fn new(tile_count: usize) -> Self {
        let slots = tile_count * tile_count;
        Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(TileBlock::empty(tile_count)),
                resolved: AtomicUsize::new(0),
                expected: 2 * slots,
                notify: Notify::new(),
            }),
        }
    }

    /// Non-blocking check: are all slots populated?
    pub fn is_complete(&self) -> bool {
        self.shared.resolved.load(Ordering::Acquire) == self.shared.expected
    }

    /// Wait until every slot is populated or the deadline passes.
    ///
    /// Each resolved fetch signals the barrier; there is no polling. On
    /// timeout the invocation is abandoned: in-flight requests are not
    /// aborted but their results are dropped with the handle, and no
    /// partial block is ever returned.
    pub async fn wait_complete(self, timeout: Duration) -> Result<TileBlock> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.shared.notify.notified();
            let resolved = self.shared.resolved.load(Ordering::Acquire);
            if resolved == self.shared.expected {
                let mut block = self.shared.slots.lock().await;
                return Ok(std::mem::take(&mut *block));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero()
                || tokio::time::timeout(remaining, notified).await.is_err()
            {
                return Err(Error::Timeout {
                    unresolved: self.shared.expected - resolved,
                    expected: self.shared.expected,
                });
            }
        }
    }
}

/// Issues concurrent fetches for the raster and vector tiles of a block
#[derive(Debug, Clone)]
pub struct TileFetcher {
    client: reqwest::Client,
    raster_url: String,
    vector_url: String,
    token: String,
}

impl TileFetcher {
    /// Create a fetcher against the default tile endpoints
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_endpoints(token, DEFAULT_RASTER_URL, DEFAULT_VECTOR_URL)
    }

    /// Create a fetcher against custom tile endpoints
    pub fn with_endpoints(
        token: impl Into<String>,
        raster_url: impl Into<String>,
        vector_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            raster_url: raster_url.into(),
            vector_url: vector_url.into(),
            token: token.into(),
        }
    }

    fn raster_tile_url(&self, x: u32, y: u32, zoom: u8) -> String {
        format!(
            "{}/{}/{}/{}@2x.pngraw?access_token={}",
            self.raster_url, zoom, x, y, self.token
        )
    }

    fn vector_tile_url(&self, x: u32, y: u32, zoom: u8) -> String {
        format!(
            "{}/{}/{}/{}.vector.pbf?access_token={}",
            self.vector_url, zoom, x, y, self.token
        )
    }

    /// Start downloading a `tile_count` x `tile_count` block rooted at `origin`.
    ///
    /// Spawns one task per raster tile and one per vector tile; each writes
    /// its own slot on success. Failures are logged and the slot stays empty.
    pub fn fetch_block(&self, origin: TileCoord, tile_count: u32) -> BlockHandle {
        let handle = BlockHandle::new(tile_count as usize);
        debug!(
            zoom = origin.zoom,
            x = origin.x,
            y = origin.y,
            tile_count,
            "starting block download"
        );

        for row in 0..tile_count {
            for col in 0..tile_count {
                let index = (row * tile_count + col) as usize;
                let x = origin.x + col;
                let y = origin.y + row;

                let raster = self.raster_tile_url(x, y, origin.zoom);
                self.spawn_fetch(SlotKind::Raster, index, raster, handle.shared.clone());

                let vector = self.vector_tile_url(x, y, origin.zoom);
                self.spawn_fetch(SlotKind::Vector, index, vector, handle.shared.clone());
            }
        }
        handle
    }

    fn spawn_fetch(&self, kind: SlotKind, index: usize, url: String, shared: Arc<Shared>) {
        let client = self.client.clone();
        tokio::spawn(async move {
            match fetch_payload(&client, &url).await {
                Ok(payload) => shared.complete_slot(kind, index, payload).await,
                Err(err) => warn!(?kind, index, %err, "tile fetch failed, slot left empty"),
            }
        });
    }
}

async fn fetch_payload(client: &reqwest::Client, url: &str) -> reqwest::Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_barrier_completes_when_all_slots_resolve() {
        let handle = BlockHandle::new(2);
        assert!(!handle.is_complete());

        for index in 0..4 {
            let shared = handle.shared.clone();
            tokio::spawn(async move {
                shared
                    .complete_slot(SlotKind::Raster, index, vec![index as u8])
                    .await;
                shared.complete_slot(SlotKind::Vector, index, vec![]).await;
            });
        }

        let block = handle
            .wait_complete(Duration::from_secs(5))
            .await
            .expect("barrier should complete");
        assert_eq!(block.tile_count, 2);
        assert_eq!(block.raster_at(1, 1), Some(&[3u8][..]));
        assert!(block.vector.iter().all(|slot| slot.is_some()));
    }

    #[tokio::test]
    async fn test_barrier_times_out_and_reports_unresolved() {
        let handle = BlockHandle::new(1);
        let shared = handle.shared.clone();
        // Only one of two expected slots ever resolves.
        shared.complete_slot(SlotKind::Raster, 0, vec![1]).await;

        let err = handle
            .wait_complete(Duration::from_millis(50))
            .await
            .expect_err("must time out");
        match err {
            Error::Timeout {
                unresolved,
                expected,
            } => {
                assert_eq!(unresolved, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tile_url_shapes() {
        let fetcher = TileFetcher::new("tok");
        assert_eq!(
            fetcher.raster_tile_url(5, 6, 13),
            "https://api.mapbox.com/v4/mapbox.terrain-rgb/13/5/6@2x.pngraw?access_token=tok"
        );
        assert_eq!(
            fetcher.vector_tile_url(5, 6, 13),
            "https://api.mapbox.com/v4/mapbox.mapbox-streets-v8/13/5/6.vector.pbf?access_token=tok"
        );
    }
}
