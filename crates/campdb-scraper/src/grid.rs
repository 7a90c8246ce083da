//! Splits a bounding box into a uniform grid of sub-regions.
//!
//! The search endpoint caps how deep a single query can page, so a national
//! crawl is run as many smaller boxes that each stay under that cap.

use campdb_core::BoundingBox;

/// Divides `bbox` into `divisions × divisions` cells.
///
/// Cells are ordered south-to-north, and west-to-east within each row.
/// Adjacent cells share their edge exactly, and the outermost edges are the
/// parent's own edges, so the cells tile the parent with no gaps.
///
/// `divisions == 0` yields an empty grid.
#[must_use]
pub fn partition(bbox: BoundingBox, divisions: u32) -> Vec<BoundingBox> {
    if divisions == 0 {
        return Vec::new();
    }

    let n = f64::from(divisions);
    let lat_step = bbox.lat_span() / n;
    let lng_step = bbox.lng_span() / n;

    let lat_edge = |i: u32| -> f64 {
        if i == divisions {
            bbox.north
        } else {
            bbox.south + f64::from(i) * lat_step
        }
    };
    let lng_edge = |j: u32| -> f64 {
        if j == divisions {
            bbox.east
        } else {
            bbox.west + f64::from(j) * lng_step
        }
    };

    let capacity = usize::try_from(divisions.saturating_mul(divisions)).unwrap_or_default();
    let mut cells = Vec::with_capacity(capacity);
    for i in 0..divisions {
        let south = lat_edge(i);
        let north = lat_edge(i + 1);
        for j in 0..divisions {
            cells.push(BoundingBox {
                north,
                south,
                east: lng_edge(j + 1),
                west: lng_edge(j),
            });
        }
    }
    cells
}
