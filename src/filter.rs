//! Station eligibility and classification.
//!
//! Records coming from the station data source are untrusted: any field may be
//! missing or nonsensical. Nothing here panics on such input; a record lacking
//! what eligibility needs is simply not eligible, and a missing status or
//! operator is reported as unknown.

use crate::geo;
use crate::model::{
    Coordinate, DisplayRecord, FilterCriteria, Marker, OperatorFilter, PowerTier, StationRecord,
    StatusClass, StatusType, UNKNOWN_OPERATOR,
};

const FAST_TIER_ABOVE_KW: f64 = 200.0;
const ULTRA_TIER_FROM_KW: f64 = 350.0;

/// Highest power rating across all connectors, missing ratings counting as zero.
pub fn effective_power(record: &StationRecord) -> f64 {
    record
        .connectors
        .iter()
        .filter_map(|c| c.power_kw)
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max)
}

/// Total number of charging points; a connector entry without quantity counts once.
pub fn connector_count(record: &StationRecord) -> u32 {
    record
        .connectors
        .iter()
        .map(|c| c.quantity.unwrap_or(1))
        .fold(0u32, u32::saturating_add)
}

/// Connector type titles without repeats, in the order the source lists them.
pub fn connection_types(record: &StationRecord) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for title in record.connectors.iter().filter_map(|c| c.connection_type.as_ref()) {
        if !types.contains(title) {
            types.push(title.clone());
        }
    }
    types
}

pub fn power_tier(power_kw: f64) -> PowerTier {
    if power_kw >= ULTRA_TIER_FROM_KW {
        PowerTier::Ultra
    } else if power_kw > FAST_TIER_ABOVE_KW {
        PowerTier::Fast
    } else {
        PowerTier::Standard
    }
}

pub fn status_class(status_code: Option<u64>) -> StatusClass {
    let status: Option<StatusType> = status_code.and_then(num::FromPrimitive::from_u64);

    match status {
        Some(StatusType::CurrentlyAvailable)
        | Some(StatusType::Operational)
        | Some(StatusType::PartlyOperational) => StatusClass::Available,
        Some(StatusType::CurrentlyInUse)
        | Some(StatusType::TemporarilyUnavailable)
        | Some(StatusType::NotOperational) => StatusClass::OccupiedOrFaulty,
        _ => StatusClass::Unknown,
    }
}

/// Case-insensitive substring check of `operator` against `filter`. An empty
/// substring disables the filter.
pub fn operator_matches(filter: &OperatorFilter, operator: Option<&str>) -> bool {
    let (needle, keep_on_match) = match filter {
        OperatorFilter::Exclude(needle) => (needle, false),
        OperatorFilter::Only(needle) => (needle, true),
    };

    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let contains = operator
        .map(|name| name.to_lowercase().contains(&needle))
        .unwrap_or(false);

    contains == keep_on_match
}

pub fn is_eligible(record: &StationRecord, criteria: &FilterCriteria) -> bool {
    let location = match record.location {
        Some(location) => location,
        None => return false,
    };

    let operator_ok = criteria
        .operator
        .as_ref()
        .map(|filter| operator_matches(filter, record.operator.as_deref()))
        .unwrap_or(true);

    effective_power(record) >= criteria.min_power_kw
        && operator_ok
        && geo::within_radius(&criteria.center, &location, criteria.radius_km)
}

/// Build the display record for `record`. Returns `None` for records without a location.
pub fn classify(record: &StationRecord, center: &Coordinate) -> Option<DisplayRecord> {
    let location = record.location?;
    let power_kw = effective_power(record);
    let tier = power_tier(power_kw);
    let status = status_class(record.status_code);

    Some(DisplayRecord {
        id: record.id,
        title: record.title.clone(),
        address: record.address.clone(),
        location,
        power_kw,
        connector_count: connector_count(record),
        connection_types: connection_types(record),
        operator: record
            .operator
            .clone()
            .unwrap_or_else(|| UNKNOWN_OPERATOR.to_string()),
        status,
        tier,
        marker: Marker {
            icon_count: tier.icon_count(),
            tier_color: tier.color(),
            status_color: status.color(),
        },
        distance_km: geo::haversine_km(center, &location),
        usage_cost: record.usage_cost.clone(),
    })
}

/// Eligible stations as display records, nearest first.
pub fn filter_stations(records: &[StationRecord], criteria: &FilterCriteria) -> Vec<DisplayRecord> {
    let mut display: Vec<DisplayRecord> = records
        .iter()
        .filter(|record| is_eligible(record, criteria))
        .filter_map(|record| classify(record, &criteria.center))
        .collect();

    display.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    display
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::Connector;

    const FRANKFURT: Coordinate = Coordinate {
        latitude: 50.1109,
        longitude: 8.6821,
    };

    fn connector(power_kw: Option<f64>, quantity: Option<u32>) -> Connector {
        Connector {
            power_kw,
            quantity,
            connection_type: None,
        }
    }

    fn station(power_kw: f64, operator: Option<&str>, location: Coordinate) -> StationRecord {
        StationRecord {
            id: Some(1),
            location: Some(location),
            connectors: vec![connector(Some(power_kw), Some(2))],
            operator: operator.map(String::from),
            status_code: Some(50),
            ..StationRecord::default()
        }
    }

    fn criteria(min_power_kw: f64, operator: Option<OperatorFilter>) -> FilterCriteria {
        FilterCriteria {
            min_power_kw,
            operator,
            center: FRANKFURT,
            radius_km: 10.0,
        }
    }

    #[test]
    fn empty_connectors() {
        let record = StationRecord::default();
        assert_eq!(0.0, effective_power(&record));
        assert_eq!(0, connector_count(&record));
    }

    #[test]
    fn power_is_max_with_missing_as_zero() {
        let record = StationRecord {
            connectors: vec![
                connector(Some(50.0), Some(1)),
                connector(None, None),
                connector(Some(300.0), Some(4)),
                connector(Some(f64::NAN), Some(1)),
            ],
            ..StationRecord::default()
        };

        assert_eq!(300.0, effective_power(&record));
        assert_eq!(7, connector_count(&record));
    }

    #[test]
    fn only_null_power_is_zero() {
        let record = StationRecord {
            connectors: vec![connector(None, Some(2))],
            ..StationRecord::default()
        };
        assert_eq!(0.0, effective_power(&record));
        assert_eq!(2, connector_count(&record));
    }

    #[test]
    fn connection_types_are_distinct() {
        let typed = |title: &str, power_kw: f64| Connector {
            power_kw: Some(power_kw),
            quantity: Some(1),
            connection_type: Some(title.to_string()),
        };
        let record = StationRecord {
            connectors: vec![
                typed("CCS (Type 2)", 300.0),
                connector(Some(50.0), None),
                typed("CHAdeMO", 50.0),
                typed("CCS (Type 2)", 150.0),
            ],
            ..StationRecord::default()
        };

        assert_eq!(vec!["CCS (Type 2)", "CHAdeMO"], connection_types(&record));
        assert!(connection_types(&StationRecord::default()).is_empty());
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(PowerTier::Standard, power_tier(0.0));
        assert_eq!(PowerTier::Standard, power_tier(200.0));
        assert_eq!(PowerTier::Fast, power_tier(200.1));
        assert_eq!(PowerTier::Fast, power_tier(349.9));
        assert_eq!(PowerTier::Ultra, power_tier(350.0));
        assert_eq!(PowerTier::Ultra, power_tier(400.0));
    }

    #[test]
    fn tier_monotonic() {
        let mut previous = power_tier(0.0);
        let mut p = 0.0;
        while p <= 500.0 {
            let tier = power_tier(p);
            assert!(previous <= tier, "tier dropped at {} kW", p);
            previous = tier;
            p += 0.5;
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(StatusClass::Available, status_class(Some(10)));
        assert_eq!(StatusClass::Available, status_class(Some(50)));
        assert_eq!(StatusClass::OccupiedOrFaulty, status_class(Some(20)));
        assert_eq!(StatusClass::OccupiedOrFaulty, status_class(Some(30)));
        assert_eq!(StatusClass::OccupiedOrFaulty, status_class(Some(100)));
        assert_eq!(StatusClass::Unknown, status_class(Some(0)));
        assert_eq!(StatusClass::Unknown, status_class(Some(150)));
        assert_eq!(StatusClass::Unknown, status_class(Some(9999)));
        assert_eq!(StatusClass::Unknown, status_class(None));
    }

    #[test]
    fn min_power_boundary_inclusive() {
        let criteria = criteria(150.0, None);
        assert!(is_eligible(&station(150.0, None, FRANKFURT), &criteria));
        assert!(!is_eligible(&station(149.9, None, FRANKFURT), &criteria));
    }

    #[test]
    fn operator_exclusion_ignores_case() {
        let criteria = criteria(0.0, Some(OperatorFilter::Exclude("tesla".to_string())));
        let tesla = station(250.0, Some("Tesla Supercharger Nord"), FRANKFURT);
        let ionity = station(350.0, Some("IONITY"), FRANKFURT);
        let unnamed = station(350.0, None, FRANKFURT);

        assert!(!is_eligible(&tesla, &criteria));
        assert!(is_eligible(&ionity, &criteria));
        assert!(is_eligible(&unnamed, &criteria));
    }

    #[test]
    fn operator_inclusion() {
        let only = OperatorFilter::Only("Ionity".to_string());
        assert!(operator_matches(&only, Some("IONITY GmbH")));
        assert!(!operator_matches(&only, Some("EnBW")));
        assert!(!operator_matches(&only, None));
    }

    #[test]
    fn empty_operator_filter_is_ignored() {
        assert!(operator_matches(&OperatorFilter::Exclude("  ".to_string()), Some("EnBW")));
        assert!(operator_matches(&OperatorFilter::Only(String::new()), None));
    }

    #[test]
    fn outside_radius_or_without_location_is_ineligible() {
        let criteria = criteria(0.0, None);
        let far = station(300.0, None, Coordinate::new(50.3, 9.5));
        let nowhere = StationRecord {
            location: None,
            ..station(300.0, None, FRANKFURT)
        };

        assert!(!is_eligible(&far, &criteria));
        assert!(!is_eligible(&nowhere, &criteria));
        assert!(classify(&nowhere, &FRANKFURT).is_none());
    }

    #[test]
    fn classify_fills_defaults() {
        let record = StationRecord {
            status_code: None,
            ..station(360.0, None, Coordinate::new(50.1109, 8.7821))
        };
        let display = classify(&record, &FRANKFURT).unwrap();

        assert_eq!(UNKNOWN_OPERATOR, display.operator);
        assert_eq!(StatusClass::Unknown, display.status);
        assert_eq!(PowerTier::Ultra, display.tier);
        assert_eq!(3, display.marker.icon_count);
        assert_eq!("gray", display.marker.status_color);
        assert_eq!(2, display.connector_count);
        assert!(display.connection_types.is_empty());
        assert!((display.distance_km - 7.1).abs() < 0.2);
    }

    #[test]
    fn filter_sorts_by_distance() {
        let records = vec![
            station(300.0, Some("far"), Coordinate::new(50.1109, 8.7821)),
            station(100.0, Some("weak"), FRANKFURT),
            station(300.0, Some("near"), Coordinate::new(50.1109, 8.6900)),
            StationRecord::default(),
        ];

        let display = filter_stations(&records, &criteria(150.0, None));
        let operators: Vec<&str> = display.iter().map(|d| d.operator.as_str()).collect();

        assert_eq!(vec!["near", "far"], operators);
    }
}
