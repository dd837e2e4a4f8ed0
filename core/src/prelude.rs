/// Errors raised while talking to the race-control server.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("malformed status payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("unknown action code {0}")]
    UnknownActionCode(u8),
}

pub type ClientResult<T> = Result<T, ClientError>;
