use std::fmt;

use lettre::address::{Address, Envelope};
use lettre::transport::smtp::authentication::Credentials;

use crate::error::SenderError;
use crate::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};

/// Submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
}

impl ServerTarget {
    pub fn new(host: &str, port: u16) -> Self {
        ServerTarget {
            host: host.to_string(),
            port,
        }
    }
}

impl Default for ServerTarget {
    fn default() -> Self {
        ServerTarget::new(DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT)
    }
}

impl fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Username plus OAuth2 bearer token, handed to the XOAUTH2 exchange as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub username: String,
    token: String,
}

impl OAuthCredentials {
    pub fn new(username: &str, token: &str) -> Result<Self, SenderError> {
        if token.trim().is_empty() {
            return Err(SenderError::Validation("OAuth2 token is empty".to_string()));
        }
        Ok(OAuthCredentials {
            username: username.to_string(),
            token: token.to_string(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("username", &self.username)
            .field("token", &format_args!("[{} bytes]", self.token.len()))
            .finish()
    }
}

impl From<&OAuthCredentials> for Credentials {
    fn from(creds: &OAuthCredentials) -> Self {
        Credentials::new(creds.username.clone(), creds.token.clone())
    }
}

/// MAIL FROM / RCPT TO pair. Exactly one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEnvelope {
    pub from: Address,
    pub to: Address,
}

impl MailEnvelope {
    pub fn new(from: &str, to: &str) -> Result<Self, SenderError> {
        Ok(MailEnvelope {
            from: parse_address(from)?,
            to: parse_address(to)?,
        })
    }

    pub fn to_lettre(&self) -> Result<Envelope, SenderError> {
        Ok(Envelope::new(Some(self.from.clone()), vec![self.to.clone()])?)
    }
}

fn parse_address(address: &str) -> Result<Address, SenderError> {
    address.parse().map_err(|source| SenderError::Address {
        address: address.to_string(),
        source,
    })
}
