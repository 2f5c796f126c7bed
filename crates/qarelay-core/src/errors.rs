/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the dispatcher can decide
/// between the fallback reply and a silent no-op without knowing the transport.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("answer service responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed answer response: {0}")]
    MalformedResponse(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
