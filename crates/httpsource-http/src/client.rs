use crate::error::HttpError;
use crate::request::PreparedRequest;
use crate::response::FetchResult;
use crate::tls::{HostnameVerification, PinnedCertVerifier, TlsVersion, TrustMode};
use std::time::{Duration, Instant};

/// Configuration for the single reusable client a task owns (spec §4.10:
/// "Single reusable client per task").
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub trust_mode: TrustMode,
    pub hostname_verification: HostnameVerification,
    pub min_tls_version: TlsVersion,
    pub max_tls_version: TlsVersion,
    pub proxy_url: Option<String>,
    pub proxy_auth: Option<(String, String)>,
    pub pool_idle_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            trust_mode: TrustMode::Strict,
            hostname_verification: HostnameVerification::Enforced,
            min_tls_version: TlsVersion::Tls12,
            max_tls_version: TlsVersion::Tls13,
            proxy_url: None,
            proxy_auth: None,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

/// A single reusable HTTP client, shared by every endpoint runner of a task.
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .min_tls_version(to_reqwest_version(config.min_tls_version))
            .max_tls_version(to_reqwest_version(config.max_tls_version));

        builder = match config.hostname_verification {
            HostnameVerification::Enforced => builder,
            HostnameVerification::Skipped => builder.danger_accept_invalid_hostnames(true),
        };

        builder = match &config.trust_mode {
            TrustMode::Strict => builder,
            TrustMode::Relaxed => builder.danger_accept_invalid_certs(true),
            TrustMode::Disabled => builder.danger_accept_invalid_certs(true),
            TrustMode::Pinned { sha256 } => {
                let verifier = PinnedCertVerifier::new(*sha256);
                let tls_config = rustls::ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(verifier)
                    .with_no_client_auth();
                builder.use_preconfigured_tls(tls_config)
            }
        };

        if let Some(proxy_url) = &config.proxy_url {
            let mut proxy = reqwest::Proxy::all(proxy_url).map_err(|e| HttpError::ClientBuild(e.to_string()))?;
            if let Some((user, pass)) = &config.proxy_auth {
                proxy = proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(proxy);
        }

        let inner = builder.build().map_err(|e| HttpError::ClientBuild(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Issues one request, honoring its per-request connect/read timeouts
    /// (spec §4.10: "per-request connection/read timeouts (overridable)").
    pub async fn fetch(&self, request: PreparedRequest) -> Result<FetchResult, HttpError> {
        let method: reqwest::Method = request
            .method
            .parse()
            .unwrap_or(reqwest::Method::GET);

        let mut builder = self
            .inner
            .request(method, &request.url)
            .timeout(request.read_timeout)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let started = Instant::now();
        let response = tokio::time::timeout(request.connect_timeout.max(request.read_timeout), builder.send())
            .await
            .map_err(|_| HttpError::Timeout("http fetch"))??;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(FetchResult {
            status,
            headers,
            body,
            latency: started.elapsed(),
        })
    }
}

fn to_reqwest_version(version: TlsVersion) -> reqwest::tls::Version {
    match version {
        TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
        TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_strict_and_enforced() {
        let config = HttpClientConfig::default();
        assert!(matches!(config.trust_mode, TrustMode::Strict));
        assert_eq!(config.hostname_verification, HostnameVerification::Enforced);
    }

    #[test]
    fn client_builds_with_default_config() {
        assert!(HttpClient::new(HttpClientConfig::default()).is_ok());
    }

    #[test]
    fn client_builds_with_relaxed_trust() {
        let config = HttpClientConfig {
            trust_mode: TrustMode::Relaxed,
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::new(config).is_ok());
    }
}
