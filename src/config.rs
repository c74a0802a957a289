use std::ffi::OsString;
use std::path::PathBuf;

use clap::{value_parser, App, Arg, ArgMatches, ErrorKind, ValueSource};

use crate::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT, DEFAULT_SUBJECT};

/// Where the bearer token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Inline(String),
    File(PathBuf),
}

/// Everything one invocation needs, resolved from flags, environment and `.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConfig {
    pub server: String,
    pub port: u16,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub username: String,
    pub token: TokenSource,
    pub body_file: PathBuf,
    pub verbose: bool,
}

pub fn cli() -> App<'static> {
    App::new("email-sender")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sends an HTML email over SMTP with OAuth2 (XOAUTH2) authentication")
        .arg(Arg::new("server")
            .short('s')
            .long("server")
            .value_name("HOST")
            .help("SMTP server host")
            .env("SMTP_SERVER")
            .default_value(DEFAULT_SMTP_HOST)
            .takes_value(true))
        .arg(Arg::new("port")
            .short('P')
            .long("port")
            .value_name("PORT")
            .help("SMTP port (STARTTLS)")
            .env("SMTP_PORT")
            .default_value("587")
            .value_parser(value_parser!(u16))
            .takes_value(true))
        .arg(Arg::new("from")
            .short('f')
            .long("from")
            .value_name("FROM")
            .help("Sender email address")
            .required(true)
            .takes_value(true))
        .arg(Arg::new("to")
            .short('t')
            .long("to")
            .value_name("TO")
            .help("Recipient email address")
            .required(true)
            .takes_value(true))
        .arg(Arg::new("subject")
            .short('j')
            .long("subject")
            .value_name("SUBJECT")
            .help("Email subject")
            .default_value(DEFAULT_SUBJECT)
            .takes_value(true))
        .arg(Arg::new("username")
            .short('u')
            .long("username")
            .value_name("USERNAME")
            .help("SMTP username, usually your full UPN")
            .env("SMTP_USERNAME")
            .required(true)
            .takes_value(true))
        .arg(Arg::new("token")
            .short('T')
            .long("token")
            .value_name("TOKEN")
            .help("OAuth2 access token string")
            .env("SMTP_OAUTH_TOKEN")
            .hide_env_values(true)
            .required_unless_present("token-file")
            .takes_value(true))
        .arg(Arg::new("token-file")
            .long("token-file")
            .value_name("PATH")
            .help("File holding the access token, raw or as token-helper JSON")
            .env("SMTP_OAUTH_TOKEN_FILE")
            .takes_value(true))
        .arg(Arg::new("file")
            .short('F')
            .long("file")
            .value_name("FILE")
            .help("HTML body file")
            .required(true)
            .takes_value(true))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Log the SMTP session at debug level"))
}

impl SendConfig {
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = cli().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let text = |name: &str| matches.value_of(name).unwrap_or_default().to_string();
        let token = token_source(matches)?;

        Ok(SendConfig {
            server: text("server"),
            port: matches
                .get_one::<u16>("port")
                .copied()
                .unwrap_or(DEFAULT_SMTP_PORT),
            from: text("from"),
            to: text("to"),
            subject: text("subject"),
            username: text("username"),
            token,
            body_file: PathBuf::from(text("file")),
            verbose: matches.is_present("verbose"),
        })
    }
}

/// Picks `--token` or `--token-file`. A flag given on the command line wins
/// over one picked up from the environment; both flags on the command line
/// conflict.
fn token_source(matches: &ArgMatches) -> Result<TokenSource, clap::Error> {
    let on_command_line = |name: &str| matches.value_source(name) == Some(ValueSource::CommandLine);

    match (matches.value_of("token"), matches.value_of("token-file")) {
        (Some(_), Some(_)) if on_command_line("token") && on_command_line("token-file") => {
            Err(cli().error(
                ErrorKind::ArgumentConflict,
                "--token and --token-file cannot be used together",
            ))
        }
        (Some(_), Some(path)) if on_command_line("token-file") => {
            Ok(TokenSource::File(PathBuf::from(path)))
        }
        (Some(token), _) => Ok(TokenSource::Inline(token.to_string())),
        (None, Some(path)) => Ok(TokenSource::File(PathBuf::from(path))),
        (None, None) => Err(cli().error(
            ErrorKind::MissingRequiredArgument,
            "one of --token or --token-file is required",
        )),
    }
}
