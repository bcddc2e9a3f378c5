pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use response::geocode::Place;
use response::poi::Poi;
use serde_json::Value;

use std::time::Duration;

/// Build the HTTP client shared by the station source and the geocoder.
pub fn client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::ClientBuilder::new()
        .timeout(timeout)
        .build()
        .or(Err(Error::InternalError))
}

pub fn api(api_url: String, api_key: Option<String>, client: reqwest::Client) -> model::Api {
    model::Api {
        api_url,
        /* an empty key from the environment means "not configured" */
        api_key: api_key.filter(|key| !key.trim().is_empty()),
        client,
    }
}

pub fn geocoder(url: String, user_agent: String, client: reqwest::Client) -> model::Geocoder {
    model::Geocoder {
        url,
        user_agent,
        client,
    }
}

/// Map Non-2xx API response to Error. The URL is stripped since it carries the API key.
fn map_api_err(error: reqwest::Error) -> Error {
    let error = error.without_url();
    match error.status() {
        Some(http::StatusCode::TOO_MANY_REQUESTS) => Error::RateExceeded(error.to_string()),
        Some(http::StatusCode::UNAUTHORIZED) | Some(http::StatusCode::FORBIDDEN) => {
            Error::Unauthorized(error.to_string())
        }
        _ => Error::ApiError(error.to_string()),
    }
}

async fn get(request: reqwest::RequestBuilder) -> Result<Value, Error> {
    let text = request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(map_api_err)?
        .text()
        .await
        .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e.without_url())))?;

    log::trace!("response_text: {}", text);

    serde_json::from_str::<Value>(&text).map_err(|e| Error::InvalidResponse(text, e.to_string()))
}

/// Query parameters of a `/poi/` request around `center`.
pub fn poi_params(
    api_key: &str,
    center: &model::Coordinate,
    radius_km: f64,
    query: &model::StationQuery,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("key", api_key.to_owned()),
        ("latitude", center.latitude.to_string()),
        ("longitude", center.longitude.to_string()),
        ("distance", radius_km.to_string()),
        ("distanceunit", "KM".to_string()),
        ("maxresults", query.max_results.to_string()),
        ("verbose", "false".to_string()),
    ];

    if let Some(min_power_kw) = query.min_power_kw {
        params.push(("minpowerkw", min_power_kw.to_string()));
    }

    if !query.connection_type_ids.is_empty() {
        let ids: Vec<String> = query
            .connection_type_ids
            .iter()
            .map(ToString::to_string)
            .collect();
        params.push(("connectiontypeid", ids.join(",")));
    }

    if let Some(country_code) = &query.country_code {
        params.push(("countrycode", country_code.to_uppercase()));
    }

    params
}

/// Decode a `/poi/` response body. Records that are not objects are skipped.
pub fn station_records(value: Value) -> Result<Vec<model::StationRecord>, Error> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Poi>(item) {
                Ok(poi) => Some(model::StationRecord::from(poi)),
                Err(e) => {
                    log::warn!("Skipping undecodable POI record: {}", e);
                    None
                }
            })
            .collect()),
        other => Err(Error::InvalidResponse(
            other.to_string(),
            String::from("expected an array of POI records"),
        )),
    }
}

/// Fetch raw station records around `center`. The source may return stations outside
/// `radius_km`.
pub async fn stations(
    api: &model::Api,
    center: &model::Coordinate,
    radius_km: f64,
    query: &model::StationQuery,
) -> Result<Vec<model::StationRecord>, Error> {
    let api_key = api.api_key.as_deref().ok_or(Error::MissingApiKey)?;
    let url = format!("{}{}", api.api_url, endpoint::POI);
    let params = poi_params(api_key, center, radius_km, query);

    let value = get(api.client.get(url).query(&params)).await?;
    station_records(value)
}

/// Forward-geocode `place`, returning the first match.
pub async fn geocode(
    geocoder: &model::Geocoder,
    place: &str,
) -> Result<Option<model::Coordinate>, Error> {
    let url = format!("{}{}", geocoder.url, endpoint::SEARCH);
    let request = geocoder
        .client
        .get(url)
        .header(reqwest::header::USER_AGENT, geocoder.user_agent.as_str())
        .query(&[("q", place), ("format", "json"), ("limit", "1")]);

    let value = get(request).await?;
    let places = serde_json::from_value::<Vec<Place>>(value)
        .map_err(|e| Error::InvalidResponse(String::from("geocoder response"), e.to_string()))?;

    Ok(places.iter().find_map(Place::coordinate))
}
