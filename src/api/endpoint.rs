pub type Endpoint = str;

/* Open Charge Map */
pub const POI: &Endpoint = "/poi/";

/* Nominatim */
pub const SEARCH: &Endpoint = "/search";
