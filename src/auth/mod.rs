//! # Authentication
//!
//! Authorization schemes applied to outgoing requests, plus the OAuth
//! password-grant form and token response used by the token endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// Supported authentication methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthMethod {
    #[default]
    None,
    BearerToken {
        token: String,
    },
    /// Pre-encoded `client:secret` blob, sent as-is after `Basic `.
    BasicEncoded {
        credentials: String,
    },
}

impl AuthMethod {
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthMethod::BearerToken {
            token: token.into(),
        }
    }

    /// `Some(blob)` becomes a Basic header, `None` leaves the request bare.
    pub fn basic_encoded(credentials: Option<&str>) -> Self {
        match credentials.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => AuthMethod::BasicEncoded {
                credentials: c.to_string(),
            },
            None => AuthMethod::None,
        }
    }

    pub fn apply(&self, req_builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let req_builder = match self {
            AuthMethod::None => req_builder,
            AuthMethod::BearerToken { token } => {
                let token = token.trim();
                if token.is_empty() {
                    return Err(ProbeError::Http("Bearer token cannot be empty".into()));
                }
                req_builder.bearer_auth(token)
            }
            AuthMethod::BasicEncoded { credentials } => {
                req_builder.header(reqwest::header::AUTHORIZATION, format!("Basic {credentials}"))
            }
        };
        Ok(req_builder)
    }
}

/// Form fields for the OAuth `password` grant with the `trust` scope.
pub fn password_grant_form(username: &str, password: &str) -> Vec<(String, String)> {
    vec![
        ("scope".into(), "trust".into()),
        ("grant_type".into(), "password".into()),
        ("username".into(), username.into()),
        ("password".into(), password.into()),
    ]
}

/// Body of a token endpoint response. Only `access_token` is required by
/// the scenario, and even that is checked explicitly rather than by serde.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// The access token, if present and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_grant_form_has_trust_scope_and_credentials() {
        let form = password_grant_form("alice", "s3cr&t");
        assert_eq!(
            form,
            vec![
                ("scope".to_string(), "trust".to_string()),
                ("grant_type".to_string(), "password".to_string()),
                ("username".to_string(), "alice".to_string()),
                ("password".to_string(), "s3cr&t".to_string()),
            ]
        );
    }

    #[test]
    fn basic_encoded_skips_blank_blob() {
        assert_eq!(AuthMethod::basic_encoded(None), AuthMethod::None);
        assert_eq!(AuthMethod::basic_encoded(Some("  ")), AuthMethod::None);
        assert_eq!(
            AuthMethod::basic_encoded(Some("Y2xpZW50OnNlY3JldA==")),
            AuthMethod::BasicEncoded {
                credentials: "Y2xpZW50OnNlY3JldA==".into()
            }
        );
    }

    #[test]
    fn token_response_tolerates_missing_fields() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"error":"invalid_grant"}"#).unwrap();
        assert!(parsed.token().is_none());

        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":" abc ","token_type":"bearer","expires_in":3599}"#)
                .unwrap();
        assert_eq!(parsed.token(), Some("abc"));
        assert_eq!(parsed.expires_in, Some(3599));
    }

    #[test]
    fn blank_bearer_token_is_rejected() {
        let client = reqwest::Client::new();
        let builder = client.get("http://localhost/");
        assert!(AuthMethod::bearer("   ").apply(builder).is_err());
    }

    #[test]
    fn encoded_basic_sets_authorization_header() {
        let client = reqwest::Client::new();
        let builder = AuthMethod::basic_encoded(Some("abc="))
            .apply(client.get("http://localhost/"))
            .unwrap();
        let request = builder.build().unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Basic abc="
        );
    }
}
