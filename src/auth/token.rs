/*
Bearer tokens read from disk.

The token helper saves the provider's token response as JSON, e.g.

    {
      "access_token": "eyJ0eXAi...",
      "refresh_token": "0.AAAA...",
      "expires_in": 3599,
      "ext_expires_in": 3599,
      "token_type": "Bearer",
      "scope": "https://outlook.office365.com/SMTP.Send",
      "obtained_at": 1730816400
    }

Anything that does not look like a JSON object is taken as the raw token
text, so `access_token.txt` files keep working.
*/

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::SenderError;

/// Seconds before expiry at which a token is reported as stale.
pub const REFRESH_SKEW_SECS: i64 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub expires_in: i64,
    #[serde(default, deserialize_with = "lenient_opt_int")]
    pub ext_expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub obtained_at: i64,
}

impl AccessToken {
    /// A token with no metadata, as read from a plain text file.
    pub fn raw(token: &str) -> Self {
        AccessToken {
            access_token: token.to_string(),
            refresh_token: None,
            expires_in: 0,
            ext_expires_in: None,
            token_type: None,
            scope: None,
            obtained_at: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn token_type(&self) -> &str {
        self.token_type.as_deref().unwrap_or("Bearer")
    }

    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// `None` when the file did not record when the token was issued or for how long.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.obtained_at == 0 || self.expires_in == 0 {
            return None;
        }
        let expiry = self.obtained_at.checked_add(self.expires_in)?;
        Utc.timestamp_opt(expiry, 0).single()
    }

    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at()
            .map(|expires_at| (expires_at - now).num_seconds().max(0))
    }

    /// True if expired or expiring within `skew_secs`.
    pub fn needs_refresh(&self, now: DateTime<Utc>, skew_secs: i64) -> bool {
        matches!(self.seconds_until_expiry(now), Some(remaining) if remaining <= skew_secs)
    }
}

pub fn load_token_file(path: &Path) -> Result<AccessToken, SenderError> {
    let contents = fs::read_to_string(path).map_err(|source| SenderError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;

    let trimmed = contents.trim();
    let token = if trimmed.starts_with('{') {
        AccessToken::from_json(trimmed).map_err(|source| SenderError::TokenFormat {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        AccessToken::raw(trimmed)
    };

    if token.access_token.trim().is_empty() {
        return Err(SenderError::Validation(format!(
            "token file {} does not contain an access token",
            path.display()
        )));
    }
    Ok(token)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText {
    Int(i64),
    Text(String),
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(lenient_opt_int(deserializer)?.unwrap_or(0))
}

// Token endpoints are not consistent about quoting numbers.
fn lenient_opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<IntOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrText::Int(n)) => Ok(Some(n)),
        Some(IntOrText::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
    }
}
