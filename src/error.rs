use thiserror::Error;

/// Result type for `nexusmods`, using [`nexusmods::error::Error`].
///
/// [`nexusmods::error::Error`]: enum.Error.html
pub type Result<T> = ::std::result::Result<T, Error>;

/// Enum for `nexusmods` errors.
#[derive(Error, Debug)]
pub enum Error {
    /// A request was made before [`Client::open`](crate::client::Client::open) was called.
    #[error("attempted to use a session before it was started")]
    NotStarted,

    /// A request was made after [`Client::close`](crate::client::Client::close) was called.
    #[error("attempted to use a session after it was closed")]
    Closed,

    /// [`Client::open`](crate::client::Client::open) was called while a session was still open.
    #[error("attempted to start a new session before closing the previous one")]
    AlreadyOpen,

    /// The API answered with a non-success status code. `body` is the raw response body, which
    /// usually holds a JSON `message` explaining the failure.
    #[error("HTTP error {status}{}", reason(.status, .body))]
    Remote { status: u16, body: String },

    /// The response body didn't match the expected record.
    #[error("couldn't decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request couldn't be sent, or its body couldn't be read.
    #[error("couldn't send request: {0}")]
    Request(#[from] reqwest::Error),

    /// An endpoint or link couldn't be turned into a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Writing a download to its destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The client couldn't be created. Contains a description of the error.
    #[error("couldn't create client: {0}")]
    CannotCreateClient(String),
}

impl Error {
    /// The HTTP status code returned by the API, if this is a [`Error::Remote`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn reason(status: &u16, body: &str) -> String {
    if !body.is_empty() {
        return format!(": {}", body);
    }

    // Give em a generic reason
    match *status {
        400 => String::from(" Bad Request: The request was malformed"),
        401 => String::from(" Unauthorized: The API key is missing or invalid"),
        403 => String::from(" Forbidden: The API key doesn't grant access to this resource"),
        404 => String::from(" Not Found"),
        422 => String::from(" Unprocessable Entity: The given parameters were invalid"),
        429 => String::from(" Too Many Requests: The hourly or daily request limit was exceeded"),
        500 => String::from(" Internal Server Error: Some unknown error occurred on the server"),
        502 => String::from(" Bad Gateway"),
        503 => String::from(" Service Unavailable: The API is temporarily down for maintenance"),
        _ => String::new(),
    }
}
