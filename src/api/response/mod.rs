pub mod geocode;
mod lenient;
pub mod poi;
