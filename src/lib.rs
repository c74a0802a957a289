pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod message;
pub mod smtp_client;

pub use entities::{MailEnvelope, OAuthCredentials, ServerTarget};
pub use error::SenderError;
pub use message::{compose, normalize_crlf, ComposedMessage};
pub use smtp_client::SubmissionClient;

pub const DEFAULT_SMTP_HOST: &str = "smtp.office365.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SUBJECT: &str = "No subject";
