use crate::api;
use crate::model::{Coordinate, Geocoder};
use serde::Serialize;

/// Where the search center of a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterSource {
    Geocoded,
    Geolocation,
    Default,
}

impl CenterSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CenterSource::Geocoded => "geocoded",
            CenterSource::Geolocation => "geolocation",
            CenterSource::Default => "default",
        }
    }
}

/// Outcome of a forward geocoding lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    Found(Coordinate),
    NotFound,
    /// The geocoder could not be reached or answered with garbage.
    Failed,
}

impl Lookup {
    pub fn coordinate(self) -> Option<Coordinate> {
        match self {
            Lookup::Found(coordinate) => Some(coordinate),
            Lookup::NotFound | Lookup::Failed => None,
        }
    }
}

/// Forward-geocode `place`. Failures are logged and never propagated.
pub async fn forward_geocode(geocoder: &Geocoder, place: &str) -> Lookup {
    match api::geocode(geocoder, place).await {
        Ok(Some(coordinate)) => Lookup::Found(coordinate),
        Ok(None) => {
            log::info!("No geocoding result for {:?}", place);
            Lookup::NotFound
        }
        Err(e) => {
            log::warn!("Geocoding {:?} failed: {}", place, e);
            Lookup::Failed
        }
    }
}

/// Browser-supplied position; both halves must be present and valid.
pub fn geolocation(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinate> {
    Coordinate::checked(latitude?, longitude?)
}

/// Pick the search center: a geocoded place wins over the browser position,
/// which wins over the configured default.
pub fn resolve_center(
    geocoded: Option<Coordinate>,
    geolocation: Option<Coordinate>,
    default: Coordinate,
) -> (Coordinate, CenterSource) {
    match (geocoded, geolocation) {
        (Some(center), _) => (center, CenterSource::Geocoded),
        (None, Some(center)) => (center, CenterSource::Geolocation),
        (None, None) => (default, CenterSource::Default),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    const FRANKFURT: Coordinate = Coordinate {
        latitude: 50.1109,
        longitude: 8.6821,
    };

    #[test]
    fn center_priority() {
        let munich = Coordinate::new(48.1372, 11.5755);
        let berlin = Coordinate::new(52.52, 13.405);

        assert_eq!(
            (munich, CenterSource::Geocoded),
            resolve_center(Some(munich), Some(berlin), FRANKFURT)
        );
        assert_eq!(
            (berlin, CenterSource::Geolocation),
            resolve_center(None, Some(berlin), FRANKFURT)
        );
        assert_eq!(
            (FRANKFURT, CenterSource::Default),
            resolve_center(None, None, FRANKFURT)
        );
    }

    #[test]
    fn partial_geolocation_is_absent() {
        assert_eq!(None, geolocation(Some(50.0), None));
        assert_eq!(None, geolocation(None, Some(8.0)));
        assert_eq!(None, geolocation(Some(91.0), Some(8.0)));
        assert_eq!(
            Some(Coordinate::new(50.0, 8.0)),
            geolocation(Some(50.0), Some(8.0))
        );
    }

    #[tokio::test]
    async fn unreachable_geocoder_is_no_result() {
        let client = api::client(Duration::from_secs(2)).unwrap();
        /* nothing listens on the discard port */
        let geocoder = api::geocoder(
            "http://127.0.0.1:9".to_string(),
            "evfinder-test".to_string(),
            client,
        );

        let lookup = forward_geocode(&geocoder, "Frankfurt").await;
        assert_eq!(Lookup::Failed, lookup);
        assert_eq!(None, lookup.coordinate());
    }
}
