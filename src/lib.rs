pub mod api;
pub mod filter;
pub mod geo;
pub mod locate;
pub mod model;

pub use api::Error;
