use thiserror::Error;

#[derive(Debug, Error)]
pub enum Oc2Error {
    #[error("wrong Content-Type: {got:?}, expected {expected:?}")]
    WrongContentType { got: String, expected: &'static str },

    #[error("data not compliant to schema:\n{0}")]
    SchemaViolation(String),

    #[error("cannot decode command: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("response_requested != 'complete'")]
    QueryResponseRequested,

    #[error("cannot encode command: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Oc2Error {
    /// True for errors caused by what the client sent. These are answered with
    /// a 400 envelope and the submission is never queued.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Oc2Error::WrongContentType { .. }
                | Oc2Error::SchemaViolation(_)
                | Oc2Error::Decode(_)
                | Oc2Error::QueryResponseRequested
        )
    }
}

pub type Result<T> = std::result::Result<T, Oc2Error>;
