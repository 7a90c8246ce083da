//! Geographic bounding boxes.
//!
//! Boxes never wrap the antimeridian: `west < east` and `south < north`
//! always hold for a box built through [`BoundingBox::new`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A rectangular region in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Builds a box, rejecting inverted, empty or non-finite extents.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBoundingBox`] unless `north > south` and
    /// `east > west` with all four edges finite.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, CoreError> {
        if ![north, south, east, west].iter().all(|v| v.is_finite()) {
            return Err(CoreError::InvalidBoundingBox(
                "all edges must be finite numbers".to_string(),
            ));
        }
        if north <= south {
            return Err(CoreError::InvalidBoundingBox(format!(
                "north ({north}) must be greater than south ({south})"
            )));
        }
        if east <= west {
            return Err(CoreError::InvalidBoundingBox(format!(
                "east ({east}) must be greater than west ({west})"
            )));
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Contiguous United States.
    #[must_use]
    pub fn conus() -> Self {
        Self {
            north: 49.38,
            south: 24.52,
            east: -66.95,
            west: -124.77,
        }
    }

    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    #[must_use]
    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    /// Formats the box the way the search API expects it: `west,south,east,north`.
    #[must_use]
    pub fn to_bbox_param(&self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[W {:.4}, S {:.4}, E {:.4}, N {:.4}]",
            self.west, self.south, self.east, self.north
        )
    }
}

/// Parses `west,south,east,north`, the same order as [`BoundingBox::to_bbox_param`].
impl FromStr for BoundingBox {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| {
                p.trim().parse::<f64>().map_err(|e| {
                    CoreError::InvalidBoundingBox(format!("\"{}\" is not a number: {e}", p.trim()))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let [west, south, east, north] = parts.as_slice() else {
            return Err(CoreError::InvalidBoundingBox(format!(
                "expected 4 comma-separated values (west,south,east,north), got {}",
                parts.len()
            )));
        };

        Self::new(*north, *south, *east, *west)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_well_formed_box() {
        let b = BoundingBox::new(49.38, 24.52, -66.95, -124.77).unwrap();
        assert_eq!(b, BoundingBox::conus());
    }

    #[test]
    fn new_rejects_inverted_latitudes() {
        let err = BoundingBox::new(10.0, 20.0, 5.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("north"));
    }

    #[test]
    fn new_rejects_antimeridian_wrap() {
        assert!(BoundingBox::new(10.0, 0.0, -170.0, 170.0).is_err());
    }

    #[test]
    fn new_rejects_nan() {
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn bbox_param_is_west_south_east_north() {
        let b = BoundingBox::new(2.0, 1.0, 4.0, 3.0).unwrap();
        assert_eq!(b.to_bbox_param(), "3,1,4,2");
    }

    #[test]
    fn parses_from_bbox_param_order() {
        let b: BoundingBox = "-124.77, 24.52, -66.95, 49.38".parse().unwrap();
        assert_eq!(b, BoundingBox::conus());
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        let err = "1,2,3".parse::<BoundingBox>().unwrap_err();
        assert!(err.to_string().contains("expected 4"));
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }
}
