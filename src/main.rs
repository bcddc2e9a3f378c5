#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use evfinder_rs::locate::{self, CenterSource, Lookup};
use evfinder_rs::model::{
    Api, Coordinate, DisplayRecord, FilterCriteria, Geocoder, OperatorFilter, StationQuery,
};
use evfinder_rs::{api, filter};
use rocket::http::ContentType;
use rocket::{Build, Rocket, State};
use serde::Serialize;
use std::time::Duration;

mod metrics;

const API_URL: &str = "https://api.openchargemap.io/v3";
const GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const USER_AGENT: &str = concat!("evfinder-rs/", env!("CARGO_PKG_VERSION"));

/* Frankfurt am Main */
const DEFAULT_LATITUDE: f64 = 50.1109;
const DEFAULT_LONGITUDE: f64 = 8.6821;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct EvFinderConfig {
    api_url: String,
    api_key: Option<String>,
    geocoder_url: String,
    user_agent: String,
    default_latitude: f64,
    default_longitude: f64,
    radius_km: f64,
    min_power_kw: f64,
    max_results: u32,
    timeout_secs: u64,
}

/// Per-request defaults taken from configuration.
pub struct SearchDefaults {
    center: Coordinate,
    radius_km: f64,
    min_power_kw: f64,
    max_results: u32,
}

/// Structure containing state for API handlers.
pub struct StateData {
    api: Api,
    geocoder: Geocoder,
    defaults: SearchDefaults,
}

fn default_settings() -> Result<Config, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("api_url", API_URL)?
        .set_default("geocoder_url", GEOCODER_URL)?
        .set_default("user_agent", USER_AGENT)?
        .set_default("default_latitude", DEFAULT_LATITUDE)?
        .set_default("default_longitude", DEFAULT_LONGITUDE)?
        .set_default("radius_km", 30.0)?
        .set_default("min_power_kw", 150.0)?
        .set_default("max_results", 200i64)?
        .set_default("timeout_secs", 15i64)?;

    Ok(settings)
}

impl EvFinderConfig {
    fn default_center(&self) -> Result<Coordinate, config::ConfigError> {
        Coordinate::checked(self.default_latitude, self.default_longitude).ok_or_else(|| {
            config::ConfigError::Message(format!(
                "invalid default location {}, {}",
                self.default_latitude, self.default_longitude
            ))
        })
    }
}

pub fn read_settings() -> Result<EvFinderConfig, config::ConfigError> {
    let mut settings = default_settings()?;
    settings.merge(config::Environment::with_prefix("EVF"))?;

    let settings: EvFinderConfig = settings.try_into()?;
    settings.default_center()?;
    Ok(settings)
}

#[derive(Debug, FromForm)]
struct SearchQuery {
    place: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    radius: Option<f64>,
    min_power: Option<f64>,
    exclude_operator: Option<String>,
    only_operator: Option<String>,
    country: Option<String>,
    connection_types: Option<String>,
    max_results: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    center: Coordinate,
    center_source: CenterSource,
    radius_km: f64,
    min_power_kw: f64,
    warnings: Vec<String>,
    stations: Vec<DisplayRecord>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn operator_filter(
    exclude: Option<String>,
    only: Option<String>,
) -> Result<Option<OperatorFilter>, api::Error> {
    match (non_empty(exclude), non_empty(only)) {
        (Some(_), Some(_)) => Err(api::Error::InvalidQuery(String::from(
            "exclude_operator and only_operator are mutually exclusive",
        ))),
        (Some(exclude), None) => Ok(Some(OperatorFilter::Exclude(exclude))),
        (None, Some(only)) => Ok(Some(OperatorFilter::Only(only))),
        (None, None) => Ok(None),
    }
}

/// Parse a comma separated list of Open Charge Map connection type IDs.
fn connection_types(list: Option<&str>) -> Result<Vec<u32>, api::Error> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u32>().map_err(|_| {
                api::Error::InvalidQuery(format!("invalid connection type id: {}", id))
            })
        })
        .collect()
}

/// Geocode `place`, counting misses and upstream failures.
async fn lookup(geocoder: &Geocoder, place: &str) -> Option<Coordinate> {
    let lookup = locate::forward_geocode(geocoder, place).await;
    match lookup {
        Lookup::Found(_) => {}
        Lookup::NotFound => metrics::observe_geocode_miss(),
        Lookup::Failed => {
            metrics::observe_geocode_miss();
            metrics::observe_upstream_error("geocoder");
        }
    }
    lookup.coordinate()
}

async fn search(state: &StateData, query: SearchQuery) -> Result<SearchResponse, api::Error> {
    let radius_km = query.radius.unwrap_or(state.defaults.radius_km);
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(api::Error::InvalidQuery(format!(
            "radius must be positive, got {}",
            radius_km
        )));
    }

    let min_power_kw = query.min_power.unwrap_or(state.defaults.min_power_kw);
    if !(min_power_kw.is_finite() && min_power_kw >= 0.0) {
        return Err(api::Error::InvalidQuery(format!(
            "min_power must not be negative, got {}",
            min_power_kw
        )));
    }

    let operator = operator_filter(query.exclude_operator, query.only_operator)?;
    let station_query = StationQuery {
        max_results: query.max_results.unwrap_or(state.defaults.max_results),
        min_power_kw: Some(min_power_kw).filter(|p| *p > 0.0),
        connection_type_ids: connection_types(query.connection_types.as_deref())?,
        country_code: non_empty(query.country),
    };

    let mut warnings = Vec::new();

    let geocoded = match non_empty(query.place) {
        Some(place) => {
            let found = lookup(&state.geocoder, &place).await;
            if found.is_none() {
                warnings.push(format!("Place {:?} not found", place));
            }
            found
        }
        None => None,
    };

    let (center, center_source) = locate::resolve_center(
        geocoded,
        locate::geolocation(query.lat, query.lon),
        state.defaults.center,
    );

    let records = match api::stations(&state.api, &center, radius_km, &station_query).await {
        Ok(records) => records,
        Err(api::Error::MissingApiKey) => {
            warnings.push(String::from(
                "Station data disabled: no Open Charge Map API key configured",
            ));
            Vec::new()
        }
        Err(e) => {
            log::warn!("Loading stations failed: {}", e);
            metrics::observe_upstream_error("stations");
            warnings.push(format!("Station data unavailable: {}", e));
            Vec::new()
        }
    };

    let criteria = FilterCriteria {
        min_power_kw,
        operator,
        center,
        radius_km,
    };
    let stations = filter::filter_stations(&records, &criteria);

    log::info!(
        "search around {:?} ({}): {} of {} stations within {} km and >= {} kW",
        center,
        center_source.as_str(),
        stations.len(),
        records.len(),
        radius_km,
        min_power_kw
    );
    metrics::observe_search(center_source, records.len(), stations.len());

    Ok(SearchResponse {
        center,
        center_source,
        radius_km,
        min_power_kw,
        warnings,
        stations,
    })
}

fn json<T: Serialize>(value: &T) -> Result<(ContentType, String), api::Error> {
    serde_json::to_string(value)
        .map(|body| (ContentType::JSON, body))
        .or(Err(api::Error::FormatError))
}

#[get("/stations?<query..>")]
async fn stations_route(
    query: SearchQuery,
    state: &State<StateData>,
) -> Result<(ContentType, String), api::Error> {
    let response = search(state, query).await?;
    json(&response)
}

#[get("/geocode?<q>")]
async fn geocode_route(
    q: &str,
    state: &State<StateData>,
) -> Result<(ContentType, String), api::Error> {
    let location = lookup(&state.geocoder, q).await;
    json(&serde_json::json!({ "location": location }))
}

#[get("/metrics")]
fn metrics_route() -> Result<String, api::Error> {
    metrics::read()
}

fn build(settings: EvFinderConfig) -> Result<Rocket<Build>, config::ConfigError> {
    let center = settings.default_center()?;
    let client = api::client(Duration::from_secs(settings.timeout_secs)).map_err(|e| {
        config::ConfigError::Message(format!("unable to build HTTP client: {}", e))
    })?;
    let api = api::api(settings.api_url, settings.api_key, client.clone());
    let geocoder = api::geocoder(settings.geocoder_url, settings.user_agent, client);

    if api.api_key.is_none() {
        log::warn!("EVF_API_KEY not set; station search is disabled");
    }

    let state = StateData {
        api,
        geocoder,
        defaults: SearchDefaults {
            center,
            radius_km: settings.radius_km,
            min_power_kw: settings.min_power_kw,
            max_results: settings.max_results,
        },
    };

    Ok(rocket::build().manage(state).mount(
        "/",
        routes![stations_route, geocode_route, metrics_route],
    ))
}

#[rocket::main]
async fn main() {
    env_logger::init();

    let settings = match read_settings() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let rocket = match build(settings) {
        Ok(rocket) => rocket,
        Err(e) => {
            log::error!("Unable to start: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rocket.launch().await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
