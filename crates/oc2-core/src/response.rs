use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status codes an OpenC2 response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Status {
    Processing,
    Ok,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalError,
    NotImplemented,
    ServiceUnavailable,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Processing => 102,
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::InternalError => 500,
            Status::NotImplemented => 501,
            Status::ServiceUnavailable => 503,
        }
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> u16 {
        status.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            102 => Ok(Status::Processing),
            200 => Ok(Status::Ok),
            400 => Ok(Status::BadRequest),
            401 => Ok(Status::Unauthorized),
            403 => Ok(Status::Forbidden),
            404 => Ok(Status::NotFound),
            500 => Ok(Status::InternalError),
            501 => Ok(Status::NotImplemented),
            503 => Ok(Status::ServiceUnavailable),
            other => Err(format!("unsupported OpenC2 status code {other}")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Response envelope returned to submitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub results: Map<String, Value>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            status_text: None,
            results: Map::new(),
        }
    }

    pub fn with_text(status: Status, text: impl Into<String>) -> Self {
        Self {
            status_text: Some(text.into()),
            ..Self::new(status)
        }
    }

    pub fn add_result(&mut self, name: impl Into<String>, data: Value) {
        self.results.insert(name.into(), data);
    }
}
