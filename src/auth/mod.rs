pub mod token;

pub use token::{load_token_file, AccessToken, REFRESH_SKEW_SECS};
