mod events;
mod oauth2;

pub use events::AuthEvent;
pub use oauth2::{spawn_refresher, OAuth2Provider, RefresherHandle};

use crate::error::HttpError;
use crate::request::PreparedRequest;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

/// Where an API key is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// The five auth variants of spec §4.11.
#[derive(Clone)]
pub enum AuthProvider {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
    ApiKey { name: String, value: String, location: ApiKeyLocation },
    OAuth2(Arc<OAuth2Provider>),
}

impl AuthProvider {
    /// Injects this provider's credentials into `request`.
    pub async fn apply(&self, request: PreparedRequest) -> Result<PreparedRequest, HttpError> {
        match self {
            Self::None => Ok(request),
            Self::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                Ok(request.header("Authorization", format!("Basic {encoded}")))
            }
            Self::Bearer { token } => Ok(request.header("Authorization", format!("Bearer {token}"))),
            Self::ApiKey { name, value, location } => Ok(match location {
                ApiKeyLocation::Header => request.header(name.clone(), value.clone()),
                ApiKeyLocation::Query => request.query_param(name.clone(), value.clone()),
            }),
            Self::OAuth2(provider) => {
                let token = provider.current_token().await?;
                Ok(request.header("Authorization", format!("Bearer {token}")))
            }
        }
    }
}
