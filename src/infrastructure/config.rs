//! Application configuration loaded from environment variables.

use anyhow::{Result, anyhow};
use std::env;
use std::fmt;

pub const DEFAULT_TWILIO_BASE_URL: &str = "https://verify.twilio.com";

/// Credentials for the Twilio Verify service.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub service_sid: String,
    pub base_url: String,
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("service_sid", &self.service_sid)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub twilio: TwilioConfig,
    /// Echo internal error text in response bodies.
    pub expose_error_details: bool,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &"<redacted>")
            .field("db_max_connections", &self.db_max_connections)
            .field("twilio", &self.twilio)
            .field("expose_error_details", &self.expose_error_details)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("missing required environment variable {}", key))
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow!("PORT must be a port number, got `{}`", raw))?,
            None => 8080,
        };

        let expose_error_details = match lookup("EXPOSE_ERROR_DETAILS") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| anyhow!("EXPOSE_ERROR_DETAILS must be true or false, got `{}`", raw))?,
            None => true,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            database_url: required("DATABASE_URL")?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            twilio: TwilioConfig {
                account_sid: required("TWILIO_ACCOUNT_SID")?,
                auth_token: required("TWILIO_AUTH_TOKEN")?,
                service_sid: required("TWILIO_VERIFY_SERVICE_SID")?,
                base_url: lookup("TWILIO_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_TWILIO_BASE_URL.to_string()),
            },
            expose_error_details,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
