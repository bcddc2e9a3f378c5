use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

#[derive(Debug, Clone)]
pub enum Error {
    ApiError(String),
    Unauthorized(String),
    RateExceeded(String),
    InvalidResponse(String, String),
    MissingApiKey,
    InvalidQuery(String),
    FormatError,
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ApiError(s) => write!(f, "upstream API error: {}", s),
            Error::Unauthorized(s) => write!(f, "upstream API rejected the API key: {}", s),
            Error::RateExceeded(s) => write!(f, "upstream API rate limit exceeded: {}", s),
            Error::InvalidResponse(_, e) => write!(f, "invalid upstream response: {}", e),
            Error::MissingApiKey => write!(f, "no Open Charge Map API key configured"),
            Error::InvalidQuery(s) => write!(f, "invalid query: {}", s),
            Error::FormatError => write!(f, "unable to format response"),
            Error::InternalError => write!(f, "internal error"),
        }
    }
}

fn html(status: Status, body: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .sized_body(body.len(), Cursor::new(body))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::RateExceeded(s) => html(
                Status::TooManyRequests,
                format!("<html><body><h3>429 Too Many Requests</h3>Downstream API response: <code>{}</code></body></html>", s),
            ),
            Error::Unauthorized(s) => html(
                Status::Forbidden,
                format!("<html><body><h3>403 Forbidden</h3>Error while authenticating to downstream API: <code>{}</code></body></html>", s),
            ),
            Error::InvalidQuery(s) => html(
                Status::BadRequest,
                format!("<html><body><h3>400 Bad Request</h3><code>{}</code></body></html>", s),
            ),
            _ => html(
                Status::InternalServerError,
                format!(
                    "<html><body><h3>Unknown exception</h3><code>{:?}</code></body></html>",
                    self
                ),
            ),
        }
    }
}
