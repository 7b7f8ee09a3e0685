// Access-token login against the appliance AAA endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::check_status;
use crate::error::ClientError;

pub const TOKEN_PATH: &str = "/api/mgmt.aaa/1.0/token";

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Serialize)]
struct UserCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    user_credentials: UserCredentials<'a>,
    generate_refresh_token: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub async fn request_token(
    http: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<AccessToken, ClientError> {
    let body = TokenRequest {
        user_credentials: UserCredentials { username, password },
        generate_refresh_token: false,
    };
    let response = http
        .post(format!("{}{}", base_url, TOKEN_PATH))
        .json(&body)
        .send()
        .await?;
    let text = check_status("POST", TOKEN_PATH, response).await?;
    let parsed: TokenResponse =
        serde_json::from_str(&text).map_err(|source| ClientError::Decode {
            path: TOKEN_PATH.to_string(),
            source,
        })?;
    tracing::debug!(operation = "request_token", username, "access token acquired");
    Ok(AccessToken::new(parsed.access_token))
}

/// The token flow has no revocation endpoint; tokens expire server-side.
pub async fn revoke_token(_token: &AccessToken) {
    tracing::debug!(operation = "revoke_token", "nothing to revoke");
}
