use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub mod cors;

pub use cors::create_cors_layer;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_STATUS_SWEEP_SECS: u64 = 60;
const DEFAULT_REMINDER_LEAD_HOURS: i64 = 24;
const DEFAULT_INVITATION_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_allowed_origins: String,
    /// How often stored statuses are recomputed and pushed to clients.
    pub status_sweep_interval: Duration,
    /// How long before an event its reminder fires.
    pub reminder_lead: chrono::Duration,
    pub invitation_delay: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", DEFAULT_PORT),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            status_sweep_interval: Duration::from_secs(env_or(
                "STATUS_SWEEP_SECS",
                DEFAULT_STATUS_SWEEP_SECS,
            )),
            reminder_lead: reminder_lead(env_or(
                "REMINDER_LEAD_HOURS",
                DEFAULT_REMINDER_LEAD_HOURS,
            )),
            invitation_delay: Duration::from_millis(env_or(
                "INVITATION_DELAY_MS",
                DEFAULT_INVITATION_DELAY_MS,
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
            status_sweep_interval: Duration::from_secs(DEFAULT_STATUS_SWEEP_SECS),
            reminder_lead: reminder_lead(DEFAULT_REMINDER_LEAD_HOURS),
            invitation_delay: Duration::from_millis(DEFAULT_INVITATION_DELAY_MS),
        }
    }
}

fn reminder_lead(hours: i64) -> chrono::Duration {
    match chrono::Duration::try_hours(hours).filter(|lead| *lead >= chrono::Duration::zero()) {
        Some(lead) => lead,
        None => {
            tracing::warn!(
                "Config: REMINDER_LEAD_HOURS {} out of range, using {}",
                hours,
                DEFAULT_REMINDER_LEAD_HOURS
            );
            chrono::Duration::try_hours(DEFAULT_REMINDER_LEAD_HOURS).unwrap_or_else(chrono::Duration::zero)
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Config: invalid {} '{}': {}, using {}", key, raw, e, default);
            default
        }
    }
}
