use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("token endpoint returned HTTP {status}")]
    TokenEndpoint { status: u16 },

    #[error("OAuth2 token response missing {0}")]
    MalformedTokenResponse(&'static str),

    #[error("deadline exceeded waiting on {0}")]
    Timeout(&'static str),
}
