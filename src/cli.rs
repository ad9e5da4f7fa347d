//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS};
use crate::rate_limit::{LOGIN_PER_MINUTE, REGISTER_PER_MINUTE, RateLimitConfig};
use clap::Parser;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Proxy header carrying the client IP.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    /// `X-Forwarded-For`, using the entry appended by the closest proxy
    XForwardedFor,
    /// `X-Real-IP`
    XRealIp,
    /// `CF-Connecting-IP` (Cloudflare)
    CfConnectingIp,
}

/// Reads the client IP from a trusted proxy header.
#[derive(Clone, Copy, Debug)]
pub struct IpExtractor {
    pub header_name: &'static str,
    parse: fn(&str) -> Result<String, &'static str>,
}

impl IpExtractor {
    /// Parse the client IP out of the configured header's value.
    pub fn extract(&self, header_value: &str) -> Result<String, &'static str> {
        (self.parse)(header_value)
    }
}

impl From<ClientIpHeader> for IpExtractor {
    fn from(header: ClientIpHeader) -> Self {
        match header {
            ClientIpHeader::XForwardedFor => Self {
                header_name: "x-forwarded-for",
                parse: parse_last_forwarded,
            },
            ClientIpHeader::XRealIp => Self {
                header_name: "x-real-ip",
                parse: parse_single_ip,
            },
            ClientIpHeader::CfConnectingIp => Self {
                header_name: "cf-connecting-ip",
                parse: parse_single_ip,
            },
        }
    }
}

fn parse_single_ip(value: &str) -> Result<String, &'static str> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| "IP header does not contain a valid IP address")
}

// Earlier entries are client-controlled; only the last hop was written by our proxy
fn parse_last_forwarded(value: &str) -> Result<String, &'static str> {
    let last = value
        .rsplit(',')
        .next()
        .ok_or("IP header is empty")?;
    parse_single_ip(last)
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Quillpost",
    about = "Blog and post API with JWT authentication"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file (":memory:" for a throwaway database)
    #[arg(short, long, env = "DATABASE_PATH", default_value = "quillpost.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, default_value_t = ACCESS_TOKEN_DURATION_SECS / 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub access_token_minutes: u64,

    /// Refresh token lifetime in minutes
    #[arg(long, default_value_t = REFRESH_TOKEN_DURATION_SECS / 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_token_minutes: u64,

    /// Set the Secure flag on cookies (enable when served over HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Disable new user signups
    #[arg(long)]
    pub no_signup: bool,

    /// Read the client IP from this proxy header instead of the socket address.
    /// Only set this when every request passes through a proxy that writes the header
    #[arg(long, env = "IP_HEADER")]
    pub ip_header: Option<ClientIpHeader>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    validate_jwt_secret(secret)
}

fn validate_jwt_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: String) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_token_secs: args.access_token_minutes * 60,
        refresh_token_secs: args.refresh_token_minutes * 60,
        secure_cookies: args.secure_cookies,
        no_signup: args.no_signup,
        rate_limit: Arc::new(
            RateLimitConfig::new(LOGIN_PER_MINUTE, REGISTER_PER_MINUTE)
                .with_ip_extractor(args.ip_header.map(IpExtractor::from)),
        ),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
