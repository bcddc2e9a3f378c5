use num_derive::FromPrimitive;
use serde::Serialize;

type KiloWatts = f64;
type Kilometers = f64;

/// Operator name shown for stations without operator information.
pub const UNKNOWN_OPERATOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Returns `Some` only for finite coordinates within WGS84 bounds.
    pub fn checked(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Some(Coordinate::new(latitude, longitude))
        } else {
            None
        }
    }
}

/// Open Charge Map endpoint handle.
#[derive(Debug, Clone)]
pub struct Api {
    pub api_url: String,
    pub api_key: Option<String>,
    pub client: reqwest::Client,
}

/// Nominatim endpoint handle.
#[derive(Debug, Clone)]
pub struct Geocoder {
    pub url: String,
    pub user_agent: String,
    pub client: reqwest::Client,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connector {
    pub power_kw: Option<KiloWatts>,
    pub quantity: Option<u32>,
    pub connection_type: Option<String>,
}

/// Station as received from the station data source. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRecord {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub location: Option<Coordinate>,
    pub connectors: Vec<Connector>,
    pub operator: Option<String>,
    pub status_code: Option<u64>,
    pub usage_cost: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerTier {
    Standard = 1,
    Fast = 2,
    Ultra = 3,
}

impl PowerTier {
    /// Number of bolt icons drawn on the map marker.
    pub fn icon_count(self) -> u8 {
        self as u8
    }

    pub fn color(self) -> &'static str {
        match self {
            PowerTier::Standard => "blue",
            PowerTier::Fast => "orange",
            PowerTier::Ultra => "purple",
        }
    }
}

/// Open Charge Map `StatusTypeID` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum StatusType {
    Unknown = 0,
    CurrentlyAvailable = 10,
    CurrentlyInUse = 20,
    TemporarilyUnavailable = 30,
    Operational = 50,
    PartlyOperational = 75,
    NotOperational = 100,
    Planned = 150,
    Removed = 200,
    RemovedDuplicate = 210,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Available,
    OccupiedOrFaulty,
    Unknown,
}

impl StatusClass {
    pub fn color(self) -> &'static str {
        match self {
            StatusClass::Available => "green",
            StatusClass::OccupiedOrFaulty => "red",
            StatusClass::Unknown => "gray",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub icon_count: u8,
    pub tier_color: &'static str,
    pub status_color: &'static str,
}

/// Display-ready station, one per map marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub location: Coordinate,
    pub power_kw: KiloWatts,
    pub connector_count: u32,
    /// Distinct connector type titles, in source order.
    pub connection_types: Vec<String>,
    pub operator: String,
    pub status: StatusClass,
    pub tier: PowerTier,
    pub marker: Marker,
    pub distance_km: Kilometers,
    pub usage_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorFilter {
    /// Drop stations whose operator contains the substring.
    Exclude(String),
    /// Keep only stations whose operator contains the substring.
    Only(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub min_power_kw: KiloWatts,
    pub operator: Option<OperatorFilter>,
    pub center: Coordinate,
    pub radius_km: Kilometers,
}

/// Optional query parameters forwarded to the station data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationQuery {
    pub max_results: u32,
    pub min_power_kw: Option<KiloWatts>,
    pub connection_type_ids: Vec<u32>,
    pub country_code: Option<String>,
}
