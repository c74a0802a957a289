pub mod composer;
pub mod crlf;

pub use composer::{compose, format_date, ComposedMessage};
pub use crlf::normalize_crlf;
