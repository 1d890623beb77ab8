use super::{env_opt, env_or, env_parsed, ConfigError, ConfigSeverity};
use super::RedisConfig;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub url: String,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_or("LLM_URL", "http://localhost:11434/v1"),
            model: env_or("LLM_MODEL", "llama3"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_size: u32,
}

impl MysqlConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("MYSQL_HOST", "127.0.0.1"),
            port: env_parsed("MYSQL_PORT", 3306),
            database: env_or("MYSQL_DATABASE", "tool_gateway"),
            user: env_or("MYSQL_USER", "root"),
            password: env_or("MYSQL_PASSWORD", ""),
            pool_size: env_parsed("MYSQL_POOL_SIZE", 5),
        }
    }

    pub fn connection_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// Configuration for the orchestrator (client) process.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub port: u16,
    pub log_level: String,
    pub tool_server_url: String,
    pub whisper_url: Option<String>,
    pub llm: LlmConfig,
    pub mysql: MysqlConfig,
    /// Backend for the ephemeral interaction log (spec §4.4).
    ///
    /// Open question: spec's env table lists REDIS_* only under the
    /// tool-server's section, but the ephemeral K/V store is mandatory for
    /// the orchestrator (§4.4). We read the same REDIS_* variable names from
    /// the orchestrator's own environment rather than inventing a new name;
    /// see DESIGN.md.
    pub redis: Option<RedisConfig>,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("CLIENT_PORT", 8081),
            log_level: env_or("LOG_LEVEL", "info"),
            tool_server_url: env_or("TOOL_SERVER_URL", "http://localhost:8080"),
            whisper_url: env_opt("WHISPER_URL"),
            llm: LlmConfig::from_env(),
            mysql: MysqlConfig::from_env(),
            redis: RedisConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "orchestrator.port".into(),
                message: "CLIENT_PORT must be greater than 0".into(),
            });
        }

        if !self.tool_server_url.starts_with("http://")
            && !self.tool_server_url.starts_with("https://")
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "tool_server_url".into(),
                message: format!(
                    "TOOL_SERVER_URL must start with http:// or https:// (got \"{}\")",
                    self.tool_server_url
                ),
            });
        }

        if self.redis.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "redis".into(),
                message: "REDIS_HOST not set — ephemeral interaction log disabled, all interactions skip straight to debug-only logging".into(),
            });
        }

        if self.mysql.password.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "mysql.password".into(),
                message: "MYSQL_PASSWORD is empty".into(),
            });
        }

        errors
    }
}
