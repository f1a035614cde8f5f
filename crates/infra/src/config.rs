//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Each alert transport is enabled
//! only when all of its required variables are present; a partially configured
//! transport is an error rather than a silently disabled channel.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("{channel} channel is partially configured; missing {missing:?}")]
    Incomplete {
        channel: &'static str,
        missing: Vec<&'static str>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// SMTP email channel settings.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// Alert recipient.
    pub recipient: String,
}

impl core::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// HTTP relay (SMS / chat) channel settings.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub base_url: String,
    pub phone: String,
    pub api_key: String,
}

impl core::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("base_url", &self.base_url)
            .field("phone", &self.phone)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    pub alert_timeout: Duration,
    pub email: Option<EmailConfig>,
    pub relay: Option<RelayConfig>,
}

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_RELAY_URL: &str = "https://api.callmebot.com/whatsapp.php";
pub const DEFAULT_ALERT_TIMEOUT_SECS: u64 = 10;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let alert_timeout_secs = parse_or(
            "ALERT_TIMEOUT_SECS",
            get("ALERT_TIMEOUT_SECS"),
            DEFAULT_ALERT_TIMEOUT_SECS,
        )?;
        if alert_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "ALERT_TIMEOUT_SECS",
                message: "must be greater than zero".to_string(),
            });
        }

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    message: format!("expected `json` or `pretty`, got `{other}`"),
                });
            }
        };

        let email = match all_or_nothing("email", &get, ["EMAIL_USER", "EMAIL_PASS", "ALERT_EMAIL"])? {
            Some([username, password, recipient]) => Some(EmailConfig {
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), DEFAULT_SMTP_PORT)?,
                username,
                password,
                recipient,
            }),
            None => None,
        };

        let relay = match all_or_nothing("relay", &get, ["ALERT_PHONE", "CALLMEBOT_API_KEY"])? {
            Some([phone, api_key]) => Some(RelayConfig {
                base_url: get("RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
                phone,
                api_key,
            }),
            None => None,
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: get("DATABASE_URL"),
            log_format,
            alert_timeout: Duration::from_secs(alert_timeout_secs),
            email,
            relay,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

fn all_or_nothing<G, const N: usize>(
    channel: &'static str,
    get: &G,
    keys: [&'static str; N],
) -> Result<Option<[String; N]>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let values = keys.map(|k| get(k));
    let missing: Vec<&'static str> = keys
        .iter()
        .zip(values.iter())
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| *k)
        .collect();

    if missing.len() == N {
        return Ok(None);
    }
    if !missing.is_empty() {
        return Err(ConfigError::Incomplete { channel, missing });
    }
    Ok(Some(values.map(|v| v.unwrap_or_default())))
}
