//! Runtime configuration read from `BENKYO_*` environment variables. Invalid
//! values fall back to defaults with a warning.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::identity::EmailMatch;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub session_file: PathBuf,
    /// Seed the shared-password demo accounts.
    pub demo_mode: bool,
    pub auth_latency: Duration,
    pub email_match: EmailMatch,
    pub board_interval: Duration,
    pub upload_latency: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 7878,
            session_file: PathBuf::from("data").join("current_session.json"),
            demo_mode: true,
            auth_latency: Duration::from_millis(1000),
            email_match: EmailMatch::Exact,
            board_interval: Duration::from_secs(600),
            upload_latency: Duration::from_millis(1500),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Self { Self::from_lookup(|k| std::env::var(k).ok()) }

    /// Build from an arbitrary key lookup so tests need not touch the process
    /// environment.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut cfg = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BENKYO_HTTP_PORT") {
            match v.trim().parse::<u16>() {
                Ok(p) => cfg.http_port = p,
                Err(_) => warn!(target: "config", "invalid BENKYO_HTTP_PORT='{}', using {}", v, cfg.http_port),
            }
        }
        if let Some(v) = get("BENKYO_SESSION_FILE") {
            cfg.session_file = PathBuf::from(v);
        }
        if let Some(v) = get("BENKYO_DEMO_MODE") {
            match parse_bool(&v) {
                Some(b) => cfg.demo_mode = b,
                None => warn!(target: "config", "invalid BENKYO_DEMO_MODE='{}', using {}", v, cfg.demo_mode),
            }
        }
        if let Some(v) = get("BENKYO_AUTH_LATENCY_MS") {
            match v.trim().parse::<u64>() {
                Ok(ms) => cfg.auth_latency = Duration::from_millis(ms),
                Err(_) => warn!(target: "config", "invalid BENKYO_AUTH_LATENCY_MS='{}'", v),
            }
        }
        if let Some(v) = get("BENKYO_EMAIL_MATCH") {
            match EmailMatch::parse(&v) {
                Some(m) => cfg.email_match = m,
                None => warn!(target: "config", "invalid BENKYO_EMAIL_MATCH='{}', using exact", v),
            }
        }
        if let Some(v) = get("BENKYO_BOARD_INTERVAL_SECS") {
            match v.trim().parse::<u64>() {
                // tokio intervals must be non-zero
                Ok(s) if s > 0 => cfg.board_interval = Duration::from_secs(s),
                _ => warn!(target: "config", "invalid BENKYO_BOARD_INTERVAL_SECS='{}'", v),
            }
        }
        if let Some(v) = get("BENKYO_UPLOAD_LATENCY_MS") {
            match v.trim().parse::<u64>() {
                Ok(ms) => cfg.upload_latency = Duration::from_millis(ms),
                Err(_) => warn!(target: "config", "invalid BENKYO_UPLOAD_LATENCY_MS='{}'", v),
            }
        }
        cfg
    }
}
