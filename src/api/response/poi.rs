use super::lenient;
use crate::model;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressInfo {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub address_line1: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub town: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub postcode: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub longitude: Option<f64>,
}

impl AddressInfo {
    /// "AddressLine1, Postcode Town", skipping absent parts.
    fn address(&self) -> Option<String> {
        let locality = match (self.postcode.as_deref(), self.town.as_deref()) {
            (Some(postcode), Some(town)) => Some(format!("{} {}", postcode, town)),
            (Some(part), None) | (None, Some(part)) => Some(part.to_string()),
            (None, None) => None,
        };

        let parts: Vec<String> = self.address_line1.iter().cloned().chain(locality).collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionType {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Connection {
    #[serde(rename = "PowerKW", default, deserialize_with = "lenient::opt_f64")]
    pub power_kw: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub quantity: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub connection_type: Option<ConnectionType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperatorInfo {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
}

/// Single point of interest from `/poi/`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Poi {
    #[serde(rename = "ID", default, deserialize_with = "lenient::opt_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub address_info: Option<AddressInfo>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub connections: Vec<Connection>,
    #[serde(default, deserialize_with = "lenient::opt_object")]
    pub operator_info: Option<OperatorInfo>,
    #[serde(rename = "StatusTypeID", default, deserialize_with = "lenient::opt_u64")]
    pub status_type_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub usage_cost: Option<String>,
}

impl From<Connection> for model::Connector {
    fn from(connection: Connection) -> Self {
        model::Connector {
            power_kw: connection.power_kw,
            quantity: connection.quantity,
            connection_type: connection.connection_type.and_then(|t| t.title),
        }
    }
}

impl From<Poi> for model::StationRecord {
    fn from(poi: Poi) -> Self {
        let (title, address, location) = match poi.address_info {
            Some(info) => {
                let location = match (info.latitude, info.longitude) {
                    (Some(lat), Some(lon)) => model::Coordinate::checked(lat, lon),
                    _ => None,
                };
                let address = info.address();
                (info.title, address, location)
            }
            None => (None, None, None),
        };

        model::StationRecord {
            id: poi.id,
            title,
            address,
            location,
            connectors: poi.connections.into_iter().map(Into::into).collect(),
            operator: poi.operator_info.and_then(|o| o.title),
            status_code: poi.status_type_id,
            usage_cost: poi.usage_cost,
        }
    }
}
