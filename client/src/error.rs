use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("PuppetDB returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode PuppetDB response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A composite operator without operands is rejected by PuppetDB
    #[error("Empty '{0}' operator cannot be sent to PuppetDB")]
    EmptyComposite(&'static str),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// PuppetDB answers 400 when it cannot parse or validate a query
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::Status { status: 400, .. } | Self::EmptyComposite(_))
    }
}
