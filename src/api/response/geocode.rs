use super::lenient;
use crate::model::Coordinate;
use serde::Deserialize;

/// Single result of a Nominatim `/search`. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lon: Option<f64>,
}

impl Place {
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::checked(self.lat?, self.lon?)
    }
}
