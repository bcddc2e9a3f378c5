use evfinder_rs::locate::CenterSource;
use evfinder_rs::Error;
use prometheus::{Encoder, IntCounter, IntCounterVec, TextEncoder};

lazy_static! {
    static ref SEARCHES: IntCounterVec = register_int_counter_vec!(
        opts!("searches_total", "station searches served, by search center source"),
        &["center_source"],
    )
    .unwrap();
    static ref STATIONS_FETCHED: IntCounter = register_int_counter!(opts!(
        "stations_fetched_total",
        "station records received from the station data source",
    ))
    .unwrap();
    static ref STATIONS_DISPLAYED: IntCounter = register_int_counter!(opts!(
        "stations_displayed_total",
        "station records that passed the filter",
    ))
    .unwrap();
    static ref GEOCODE_MISSES: IntCounter = register_int_counter!(opts!(
        "geocode_misses_total",
        "place searches without a geocoding result",
    ))
    .unwrap();
    static ref UPSTREAM_ERRORS: IntCounterVec = register_int_counter_vec!(
        opts!("upstream_errors_total", "failed calls to upstream APIs"),
        &["source"],
    )
    .unwrap();
}

/// Record one served search.
pub fn observe_search(center_source: CenterSource, fetched: usize, displayed: usize) {
    SEARCHES
        .with_label_values(&[center_source.as_str()])
        .inc();
    STATIONS_FETCHED.inc_by(fetched as u64);
    STATIONS_DISPLAYED.inc_by(displayed as u64);
}

pub fn observe_geocode_miss() {
    GEOCODE_MISSES.inc();
}

pub fn observe_upstream_error(source: &str) {
    UPSTREAM_ERRORS.with_label_values(&[source]).inc();
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(Error::FormatError))?;
    String::from_utf8(buffer).or(Err(Error::FormatError))
}
