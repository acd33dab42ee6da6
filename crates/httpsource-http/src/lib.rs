//! HTTP client wrapper and auth-header injection (spec §4.10, §4.11).

pub mod auth;
mod client;
mod error;
mod request;
mod response;
mod tls;

pub use auth::{ApiKeyLocation, AuthProvider};
pub use client::{HttpClient, HttpClientConfig};
pub use error::HttpError;
pub use request::PreparedRequest;
pub use response::FetchResult;
pub use tls::{HostnameVerification, TlsVersion, TrustMode};
