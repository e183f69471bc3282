//! On-disk formats shared by the point stream producer and its readers.
//!
//! The point stream is a headerless concatenation of 8-byte records:
//!
//! ```text
//! [lon: f32 little-endian][lat: f32 little-endian]
//! ```
//!
//! one record per accepted node, in source encounter order. A reader learns
//! the record count from the file size (`size / 8`) or from the `points`
//! field of the metadata record.

use std::io::{self, ErrorKind, Write};

use serde::{Deserialize, Serialize};

/// Size of one encoded point.
pub const POINT_RECORD_BYTES: usize = 8;

/// One record of the binary point stream, in decimal degrees.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Point {
    pub lon: f32,
    pub lat: f32,
}

impl Point {
    pub fn new(lon: f32, lat: f32) -> Self {
        Self { lon, lat }
    }

    /// Encodes as `[lon LE][lat LE]`, the same bytes on every host.
    pub fn to_le_bytes(self) -> [u8; POINT_RECORD_BYTES] {
        let mut buf = [0; POINT_RECORD_BYTES];
        buf[..4].copy_from_slice(&self.lon.to_le_bytes());
        buf[4..].copy_from_slice(&self.lat.to_le_bytes());
        buf
    }

    pub fn from_le_bytes(buf: [u8; POINT_RECORD_BYTES]) -> Self {
        Self {
            lon: f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            lat: f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

/// Appends point records to a sink, counting as it goes. No header, no
/// framing; the stream is just the records in write order.
pub struct PointWriter<W: Write> {
    sink: W,
    written: u64,
}

impl<W: Write> PointWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    pub fn write_point(&mut self, point: Point) -> io::Result<()> {
        self.sink.write_all(&point.to_le_bytes())?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and hands the sink back.
    pub fn finish(mut self) -> io::Result<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Decodes an entire point stream. The length must be a multiple of the
/// record size; anything else is a truncated or foreign file.
pub fn read_points(bytes: &[u8]) -> io::Result<Vec<Point>> {
    if bytes.len() % POINT_RECORD_BYTES != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!(
                "point stream is {} bytes, not a multiple of the {}-byte record",
                bytes.len(),
                POINT_RECORD_BYTES
            ),
        ));
    }
    Ok(bytes
        .chunks_exact(POINT_RECORD_BYTES)
        .map(|chunk| {
            let mut record = [0; POINT_RECORD_BYTES];
            record.copy_from_slice(chunk);
            Point::from_le_bytes(record)
        })
        .collect())
}

/// Running min/max of longitude and latitude over accepted points.
///
/// Starts at the infinite sentinels so the first update wins both
/// comparisons on each axis. An empty box has `min > max` on both axes; no
/// box built from real points can look like that, not even a single-point
/// one.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Bounds {
    pub min_lon: f32,
    pub max_lon: f32,
    pub min_lat: f32,
    pub max_lat: f32,
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_lon: f32::INFINITY,
            max_lon: f32::NEG_INFINITY,
            min_lat: f32::INFINITY,
            max_lat: f32::NEG_INFINITY,
        }
    }

    /// Grows the box to cover one point, each axis independently.
    pub fn update(&mut self, point: Point) {
        self.min_lon = self.min_lon.min(point.lon);
        self.max_lon = self.max_lon.max(point.lon);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lat = self.max_lat.max(point.lat);
    }

    /// True until the first point is folded in.
    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon
    }

    pub fn contains(&self, point: Point) -> bool {
        point.lon >= self.min_lon
            && point.lon <= self.max_lon
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

/// The metadata record accompanying a point stream: the bounding box of
/// everything in the stream, plus the record count.
///
/// Serialized as one JSON object. With zero accepted points the four bounds
/// fields still hold the infinite sentinels, which serde_json renders as
/// `null`: `{"min_lon": null, ..., "points": 0}` is the "no geometry found"
/// record. Readers should check `points` before trusting the bounds; a
/// record with `points > 0` always carries four finite numbers.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Metadata {
    pub min_lon: f32,
    pub max_lon: f32,
    pub min_lat: f32,
    pub max_lat: f32,
    /// Number of 8-byte records in the accompanying stream.
    pub points: u64,
}

impl Metadata {
    pub fn new(bounds: Bounds, points: u64) -> Self {
        Self {
            min_lon: bounds.min_lon,
            max_lon: bounds.max_lon,
            min_lat: bounds.min_lat,
            max_lat: bounds.max_lat,
            points,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_lon: self.min_lon,
            max_lon: self.max_lon,
            min_lat: self.min_lat,
            max_lat: self.max_lat,
        }
    }
}

/// Writes the metadata record to its sink in a single write, then flushes.
pub fn write_metadata<W: Write>(mut sink: W, metadata: &Metadata) -> io::Result<()> {
    let mut json = serde_json::to_string_pretty(metadata)?;
    json.push('\n');
    sink.write_all(json.as_bytes())?;
    sink.flush()
}
