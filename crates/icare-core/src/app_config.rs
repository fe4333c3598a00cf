use std::net::SocketAddr;

use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Zone used to turn "now" into the local wall-clock instant the hours
    /// engine evaluates against.
    pub timezone: Tz,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub pharmacy_api_key: Option<String>,
    pub hospital_api_key: Option<String>,
    pub drug_api_key: Option<String>,
    pub publicdata_timeout_secs: u64,
    pub publicdata_max_retries: u32,
    pub publicdata_retry_backoff_base_ms: u64,
    pub chat_session_ttl_secs: u64,
    pub chat_max_sessions: usize,
    pub chat_history_limit: usize,
}

impl AppConfig {
    /// Current wall-clock time in the configured zone, without offset.
    #[must_use]
    pub fn local_now(&self) -> chrono::NaiveDateTime {
        chrono::Utc::now().with_timezone(&self.timezone).naive_local()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("timezone", &self.timezone)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("pharmacy_api_key", &redact(&self.pharmacy_api_key))
            .field("hospital_api_key", &redact(&self.hospital_api_key))
            .field("drug_api_key", &redact(&self.drug_api_key))
            .field("publicdata_timeout_secs", &self.publicdata_timeout_secs)
            .field("publicdata_max_retries", &self.publicdata_max_retries)
            .field(
                "publicdata_retry_backoff_base_ms",
                &self.publicdata_retry_backoff_base_ms,
            )
            .field("chat_session_ttl_secs", &self.chat_session_ttl_secs)
            .field("chat_max_sessions", &self.chat_max_sessions)
            .field("chat_history_limit", &self.chat_history_limit)
            .finish()
    }
}
