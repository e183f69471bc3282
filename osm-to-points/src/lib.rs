use std::io::{Read, Write};

use anyhow::Result;
use log::{info, warn};
use quick_xml::events::BytesStart;

use points_format::{Bounds, Point, PointWriter};

use crate::decoder::ElementDecoder;

mod decoder;

/// What a finished run looked like: the aggregated bounding box plus the
/// two counters the conversion tracks.
#[derive(Clone, Copy, Debug)]
pub struct Summary {
    pub bounds: Bounds,
    /// Every `<node>` element seen, whether or not it had usable coordinates.
    pub nodes_seen: u64,
    /// Records actually written to the point stream.
    pub points_written: u64,
}

/// Convert OSM XML into the binary point stream, reading the input in
/// bounded chunks. Every node with parseable coordinates becomes one 8-byte
/// record in `sink`, in document order; the caller writes the metadata
/// record from the returned summary.
pub fn convert_osm<R: Read, W: Write>(input: R, sink: W) -> Result<Summary> {
    info!("Scraping node coordinates");
    let mut decoder = ElementDecoder::new(input);
    let mut session = Session::new(sink);
    while let Some(tag) = decoder.next_element()? {
        session.observe(&tag)?;
    }
    let summary = session.finish()?;

    info!(
        "Accepted {} of {} nodes",
        summary.points_written, summary.nodes_seen
    );
    if summary.points_written == 0 {
        warn!("No geometry found; the bounding box is empty");
    } else {
        info!(
            "Bounds: lon {} to {}, lat {} to {}",
            summary.bounds.min_lon,
            summary.bounds.max_lon,
            summary.bounds.min_lat,
            summary.bounds.max_lat
        );
    }
    Ok(summary)
}

/// Mutable state threaded through one run. The decode loop owns it and
/// hands it every start tag; nothing here outlives the run.
struct Session<W: Write> {
    points: PointWriter<W>,
    bounds: Bounds,
    nodes_seen: u64,
}

impl<W: Write> Session<W> {
    fn new(sink: W) -> Self {
        Self {
            points: PointWriter::new(sink),
            bounds: Bounds::new(),
            nodes_seen: 0,
        }
    }

    /// Folds one start tag into the session. Only `<node>` matters, and of
    /// those only the ones carrying finite lat/lon produce output; partial
    /// or garbled records are normal in real extracts and skip silently.
    fn observe(&mut self, tag: &BytesStart) -> Result<()> {
        if tag.name().as_ref() != b"node" {
            return Ok(());
        }
        self.nodes_seen += 1;

        // Linear scan in document order; a repeated key overwrites the
        // earlier value.
        let mut lon = None;
        let mut lat = None;
        for attr in tag.attributes().with_checks(false) {
            let attr = attr?;
            // Every value is decoded, not just the two that are kept:
            // broken entity escaping anywhere in the tag is malformed XML.
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"lon" => lon = parse_coordinate(&value),
                b"lat" => lat = parse_coordinate(&value),
                _ => {}
            }
        }

        if let (Some(lon), Some(lat)) = (lon, lat) {
            let point = Point::new(lon, lat);
            self.bounds.update(point);
            self.points.write_point(point)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<Summary> {
        let points_written = self.points.written();
        self.points.finish()?;
        Ok(Summary {
            bounds: self.bounds,
            nodes_seen: self.nodes_seen,
            points_written,
        })
    }
}

/// `None` for anything that doesn't parse as a finite number (`NaN`, `inf`,
/// overflow and plain garbage alike).
fn parse_coordinate(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().filter(|v| v.is_finite())
}
