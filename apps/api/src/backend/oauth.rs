//! OAuth redirect contract: the provider sends the browser back to the callback
//! path with `#access_token=...&refresh_token=...`.

use reqwest::Url;
use thiserror::Error;

use crate::models::user::AuthTokens;

#[derive(Debug, Error, PartialEq)]
pub enum OAuthError {
    #[error("Sign-in was cancelled or denied: {0}")]
    Denied(String),

    #[error("Callback is missing {0}")]
    MissingToken(&'static str),

    #[error("Callback fragment is malformed")]
    Malformed,
}

/// Reads the tokens from a callback fragment, with or without the leading `#`.
/// Values are percent-decoded.
pub fn parse_callback_fragment(fragment: &str) -> Result<AuthTokens, OAuthError> {
    let fragment = fragment.trim().trim_start_matches('#');
    let url = Url::parse(&format!("smartcareer://oauth/callback?{fragment}"))
        .map_err(|_| OAuthError::Malformed)?;

    let mut access_token = None;
    let mut refresh_token = None;
    let mut error = None;
    let mut error_description = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(OAuthError::Denied(error_description.unwrap_or(error)));
    }

    let access_token = access_token
        .filter(|t| !t.is_empty())
        .ok_or(OAuthError::MissingToken("access_token"))?;
    let refresh_token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(OAuthError::MissingToken("refresh_token"))?;

    Ok(AuthTokens {
        access_token,
        refresh_token,
    })
}
