use super::{env_opt, env_or, env_parsed, ConfigError, ConfigSeverity};

/// Optional Redis-backed acceleration for the HA state cache. When unset,
/// the synchronizer runs with an in-memory-only cache (still coherent —
/// just not shared across restarts).
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl RedisConfig {
    pub fn from_env() -> Option<Self> {
        let host = env_opt("REDIS_HOST")?;
        Some(Self {
            host,
            port: env_parsed("REDIS_PORT", 6379),
            password: env_opt("REDIS_PASSWORD"),
            db: env_parsed("REDIS_DB", 0),
        })
    }

    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(pw) => format!("redis://:{pw}@{}:{}/{}", self.host, self.port, self.db),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NtpConfig {
    pub primary: String,
    pub backup: String,
    pub timeout_ms: u64,
}

impl NtpConfig {
    pub fn from_env() -> Self {
        Self {
            primary: env_or("NTP_SERVER", "pool.ntp.org"),
            backup: env_or("NTP_BACKUP_SERVER", "time.google.com"),
            timeout_ms: env_parsed("NTP_TIMEOUT", 5_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub cache_ttl_secs: u64,
}

impl HomeAssistantConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_opt("HA_URL"),
            token: env_opt("HA_TOKEN"),
            cache_ttl_secs: env_parsed("HA_CACHE_TTL", 30),
        }
    }

    /// The hub is only usable once both URL and token are present. Absence
    /// of either puts the synchronizer in a permanent "not configured" state
    /// per spec §4.2.
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }

    pub fn ws_url(&self) -> Option<String> {
        let base = self.url.as_ref()?;
        let ws_base = base
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        Some(format!("{}/api/websocket", ws_base.trim_end_matches('/')))
    }
}

/// Configuration for the tool-server process: dispatcher + HA synchronizer.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: String,
    pub ntp: NtpConfig,
    pub ha: HomeAssistantConfig,
    pub redis: Option<RedisConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("SERVER_PORT", 8080),
            log_level: env_or("LOG_LEVEL", "info"),
            ntp: NtpConfig::from_env(),
            ha: HomeAssistantConfig::from_env(),
            redis: RedisConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "SERVER_PORT must be greater than 0".into(),
            });
        }

        if let Some(url) = &self.ha.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "ha.url".into(),
                    message: format!("HA_URL must start with http:// or https:// (got \"{url}\")"),
                });
            }
        }

        if self.ha.url.is_some() != self.ha.token.is_some() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "ha".into(),
                message:
                    "only one of HA_URL/HA_TOKEN is set — Home Assistant tools will report not_configured"
                        .into(),
            });
        }

        if !self.ha.is_configured() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "ha".into(),
                message: "HA_URL/HA_TOKEN not configured — ha_* tools will return effector_unavailable".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_without_password() {
        let cfg = RedisConfig {
            host: "localhost".into(),
            port: 6379,
            password: None,
            db: 0,
        };
        assert_eq!(cfg.redis_url(), "redis://localhost:6379/0");
    }

    #[test]
    fn redis_url_with_password() {
        let cfg = RedisConfig {
            host: "localhost".into(),
            port: 6380,
            password: Some("s3cret".into()),
            db: 2,
        };
        assert_eq!(cfg.redis_url(), "redis://:s3cret@localhost:6380/2");
    }

    #[test]
    fn ws_url_derivation() {
        let ha = HomeAssistantConfig {
            url: Some("https://homeassistant.local:8123".into()),
            token: Some("tok".into()),
            cache_ttl_secs: 30,
        };
        assert_eq!(
            ha.ws_url().unwrap(),
            "wss://homeassistant.local:8123/api/websocket"
        );
    }

    #[test]
    fn not_configured_when_missing_token() {
        let ha = HomeAssistantConfig {
            url: Some("http://x".into()),
            token: None,
            cache_ttl_secs: 30,
        };
        assert!(!ha.is_configured());
    }
}
