/*
Sends one HTML email over SMTP with OAuth2 (XOAUTH2) authentication.

Example usage:
email-sender \
    --from you@contoso.com \
    --to recipient@example.com \
    --subject "OAuth2 Test" \
    --username you@contoso.com \
    --file body.html \
    --token "$(cat access_token.txt)"

Defaults to smtp.office365.com:587 (STARTTLS). SMTP_SERVER, SMTP_PORT,
SMTP_USERNAME, SMTP_OAUTH_TOKEN and SMTP_OAUTH_TOKEN_FILE may be set in the
environment or in a .env file instead of passing flags.
*/

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use clap::ErrorKind;
use dotenv::dotenv;
use log::{debug, warn};

use email_sender::auth::{load_token_file, REFRESH_SKEW_SECS};
use email_sender::config::{SendConfig, TokenSource};
use email_sender::error::EXIT_FAILURE;
use email_sender::{
    compose, MailEnvelope, OAuthCredentials, SenderError, ServerTarget, SubmissionClient,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();

    let config = match SendConfig::try_parse_from(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_FAILURE),
            };
        }
    };

    env_logger::Builder::new()
        .filter_level(if config.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    match run(&config).await {
        Ok(target) => {
            println!("Message sent successfully via {}", target);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(config: &SendConfig) -> Result<ServerTarget, SenderError> {
    let credentials = OAuthCredentials::new(&config.username, &resolve_token(&config.token)?)?;
    let envelope = MailEnvelope::new(&config.from, &config.to)?;

    let body = read_body(&config.body_file)?;
    let message = compose(&config.from, &config.to, &config.subject, &body, Utc::now())?;
    drop(body);

    let client = SubmissionClient::new(ServerTarget::new(&config.server, config.port), credentials);
    client.submit(&envelope, &message).await?;
    Ok(client.target().clone())
}

fn resolve_token(source: &TokenSource) -> Result<String, SenderError> {
    match source {
        TokenSource::Inline(token) => Ok(token.clone()),
        TokenSource::File(path) => {
            let token = load_token_file(path)?;
            debug!(
                "Loaded {} token from {} (scopes: {})",
                token.token_type(),
                path.display(),
                token.scopes().join(" ")
            );
            if token.needs_refresh(Utc::now(), REFRESH_SKEW_SECS) {
                warn!(
                    "Access token in {} is expired or expires within {} seconds; the server will likely reject it",
                    path.display(),
                    REFRESH_SKEW_SECS
                );
            }
            Ok(token.access_token)
        }
    }
}

fn read_body(path: &Path) -> Result<Vec<u8>, SenderError> {
    fs::read(path).map_err(|source| SenderError::BodyFile {
        path: path.to_path_buf(),
        source,
    })
}
