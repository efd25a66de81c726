//! Portal session: Basic-auth header derivation and the login probe.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::scrapers::HttpClient;

/// Outbound header set derived from [`Credentials`] for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders(Vec<(String, String)>);

impl AuthHeaders {
    /// Basic-auth headers for the documentation portal.
    ///
    /// Returns an empty set when the email/password pair is absent.
    pub fn basic(credentials: &Credentials) -> Self {
        match credentials.portal_login() {
            Ok((email, password)) => {
                let token = STANDARD.encode(format!("{}:{}", email, password));
                Self(vec![
                    ("Authorization".to_string(), format!("Basic {}", token)),
                    (
                        "Accept".to_string(),
                        "application/json, text/html".to_string(),
                    ),
                ])
            }
            Err(_) => Self::default(),
        }
    }

    /// The lower-case `apikey` header for the data plane.
    pub fn api_key(credentials: &Credentials) -> Self {
        match credentials.api_key() {
            Ok(key) => Self(vec![("apikey".to_string(), key.to_string())]),
            Err(_) => Self::default(),
        }
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Login state against the portal. No token is kept; headers are derived
/// again for each request.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Credentials,
    authenticated: bool,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            authenticated: false,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn headers(&self) -> AuthHeaders {
        AuthHeaders::basic(&self.credentials)
    }

    /// Log in by probing `{base_url}/catalog`.
    pub async fn authenticate(&mut self, client: &HttpClient, base_url: &str) -> bool {
        self.login_against(client, base_url, "catalog").await
    }

    /// Log in by probing `{base_url}/documentation`.
    pub async fn authenticate_documentation(
        &mut self,
        client: &HttpClient,
        base_url: &str,
    ) -> bool {
        self.login_against(client, base_url, "documentation").await
    }

    async fn login_against(&mut self, client: &HttpClient, base_url: &str, page: &str) -> bool {
        self.authenticated = false;

        if !self.credentials.has_portal_login() {
            warn!("Portal credentials are not set; skipping login");
            return false;
        }

        // Landing page first so the cookie store picks up session cookies.
        if let Err(e) = client.get(base_url, &[]).await {
            debug!("Landing page request failed: {}", e);
        }

        let url = format!("{}/{}", base_url.trim_end_matches('/'), page);
        let headers = self.headers();
        match client.get(&url, headers.as_slice()).await {
            Ok(response) => match response.status_code() {
                200 => {
                    info!("Authenticated against {}", url);
                    self.authenticated = true;
                }
                401 => warn!("Login rejected by {} (401 Unauthorized)", url),
                status => warn!("Login probe {} returned {}", url, status),
            },
            Err(e) => warn!("Login request to {} failed: {}", url, e),
        }

        self.authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header_encoding() {
        let creds = Credentials::new(Some("user@example.jp".into()), Some("pw".into()), None);
        let headers = AuthHeaders::basic(&creds);
        let expected = format!("Basic {}", STANDARD.encode("user@example.jp:pw"));
        assert_eq!(headers.get("authorization"), Some(expected.as_str()));
        assert_eq!(headers.get("Accept"), Some("application/json, text/html"));
    }

    #[test]
    fn test_headers_empty_without_credentials() {
        let creds = Credentials::default();
        assert!(AuthHeaders::basic(&creds).is_empty());
        assert!(AuthHeaders::api_key(&creds).is_empty());
    }

    #[test]
    fn test_api_key_header_is_lowercase() {
        let creds = Credentials::new(None, None, Some("k123".into()));
        let headers = AuthHeaders::api_key(&creds);
        assert_eq!(headers.as_slice()[0].0, "apikey");
        assert_eq!(headers.get("apikey"), Some("k123"));
    }

    #[test]
    fn test_credentials_are_not_interchangeable() {
        // An api key alone never produces portal headers.
        let creds = Credentials::new(None, None, Some("k123".into()));
        assert!(AuthHeaders::basic(&creds).is_empty());
    }
}
