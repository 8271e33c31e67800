use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// Root directory of the PDF blob store.
    pub blob_dir: String,
    pub jwt_secret: String,
    /// When set, batch-all requests must carry it in `x-cron-secret`.
    pub cron_secret: Option<String>,
    /// Period of the in-process batch sync. `None` disables the scheduler.
    pub sync_interval: Option<Duration>,
    /// Per-organization budget. `None` disables the deadline.
    pub sync_deadline: Option<Duration>,
    /// Timeout of each request to a billing provider.
    pub request_timeout: Duration,
    pub token_api_url: Option<String>,
    pub session_api_url: Option<String>,
    pub cors_allow: Vec<String>,
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_secs(key: &str) -> anyhow::Result<Option<Duration>> {
    match optional_var(key) {
        None => Ok(None),
        Some(raw) => {
            let secs: u64 = raw.parse().with_context(|| format!("Invalid {key}"))?;
            Ok((secs > 0).then(|| Duration::from_secs(secs)))
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("LL_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid LL_LISTEN_ADDR")?;
        let db_path = std::env::var("LL_DB_PATH").unwrap_or_else(|_| "./db/ledgerlink.db".into());
        let blob_dir = std::env::var("LL_BLOB_DIR").unwrap_or_else(|_| "./blobs".into());
        let jwt_secret = optional_var("LL_JWT_SECRET").context("LL_JWT_SECRET must be set")?;
        let cron_secret = optional_var("LL_CRON_SECRET");
        let sync_interval = optional_secs("LL_SYNC_INTERVAL_SECS")?;
        let sync_deadline = match optional_var("LL_SYNC_DEADLINE_SECS") {
            None => Some(Duration::from_secs(10 * 60)),
            Some(_) => optional_secs("LL_SYNC_DEADLINE_SECS")?,
        };
        let timeout_ms: u64 = std::env::var("LL_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let cors_allow = std::env::var("LL_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Self {
            listen_addr,
            db_path,
            blob_dir,
            jwt_secret,
            cron_secret,
            sync_interval,
            sync_deadline,
            request_timeout: Duration::from_millis(timeout_ms),
            token_api_url: optional_var("LL_TOKEN_API_URL"),
            session_api_url: optional_var("LL_SESSION_API_URL"),
            cors_allow,
        })
    }
}
