//! Binary result messages for map clients.
//!
//! Frame layout, all big-endian:
//!
//! ```text
//! ---- header ----
//!  progress   totalTime   treeTime    aggTime   msgType
//! | 4 bytes | 8 bytes   | 8 bytes  | 8 bytes | 4 bytes |
//! ---- payload ----
//!   lat1      lng1       lat2       lng2      ...
//! | 8 bytes | 8 bytes  | 8 bytes  | 8 bytes | ...
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::mercator::{x_lng, y_lat};
use crate::types::Point;

/// Header length in bytes: progress, three timings, message type.
pub const HEADER_SIZE: usize = 4 + 3 * 8 + 4;

/// Message type tag for a binary point payload.
pub const MSG_BINARY: i32 = 0;

const PROGRESS_OFFSET: usize = 0;
const TOTAL_TIME_OFFSET: usize = 4;
const TREE_TIME_OFFSET: usize = 12;
const AGGREGATE_TIME_OFFSET: usize = 20;

/// Incrementally builds one result frame.
#[derive(Debug)]
pub struct MessageBuilder {
    buf: BytesMut,
    count: usize,
}

impl MessageBuilder {
    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + 16 * 2000);
        buf.put_i32(0); // progress
        buf.put_f64(0.0); // total time
        buf.put_f64(0.0); // tree time
        buf.put_f64(0.0); // aggregate time
        buf.put_i32(MSG_BINARY);
        Self { buf, count: 0 }
    }

    /// Append one lng/lat record. The payload stores latitude first.
    pub fn add(&mut self, lng: f64, lat: f64) {
        self.buf.put_f64(lat);
        self.buf.put_f64(lng);
        self.count += 1;
    }

    /// Append a unit-square point, unprojecting it to lng/lat.
    pub fn add_point(&mut self, point: Point) {
        self.add(x_lng(point.x), y_lat(point.y));
    }

    /// Patch the progress field (loaded-point count during progressive
    /// answers).
    pub fn set_progress(&mut self, progress: i32) {
        self.buf[PROGRESS_OFFSET..PROGRESS_OFFSET + 4].copy_from_slice(&progress.to_be_bytes());
    }

    /// Patch the timing fields, in seconds.
    pub fn set_timings(&mut self, total: f64, tree: f64, aggregate: f64) {
        self.buf[TOTAL_TIME_OFFSET..TOTAL_TIME_OFFSET + 8].copy_from_slice(&total.to_be_bytes());
        self.buf[TREE_TIME_OFFSET..TREE_TIME_OFFSET + 8].copy_from_slice(&tree.to_be_bytes());
        self.buf[AGGREGATE_TIME_OFFSET..AGGREGATE_TIME_OFFSET + 8]
            .copy_from_slice(&aggregate.to_be_bytes());
    }

    /// Number of point records appended so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
