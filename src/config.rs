//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// RSA 私钥文件路径（PEM，用于签发令牌）
    pub private_key_path: String,
    /// RSA 公钥文件路径（PEM，用于验证令牌）
    pub public_key_path: String,
    /// 签名算法，目前仅支持 RS256
    pub algorithm: String,
    /// 令牌签发者（iss claim）
    pub issuer: String,
    /// 令牌受众（aud claim）
    pub audience: String,
    /// 访问令牌过期时间（分钟）
    pub access_token_exp_minutes: i64,
    /// 刷新令牌过期时间（分钟）
    pub refresh_token_exp_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("auth.private_key_path", "certs/jwt-private.pem")?
            .set_default("auth.public_key_path", "certs/jwt-public.pem")?
            .set_default("auth.algorithm", "RS256")?
            .set_default("auth.issuer", "ai-assistant-chat")?
            .set_default("auth.audience", "ai-assistant-clients")?
            .set_default("auth.access_token_exp_minutes", 3)?
            // 14 天
            .set_default("auth.refresh_token_exp_minutes", 60 * 24 * 14)?;

        // 从环境变量加载配置（前缀为 AUTH_）
        settings = settings.add_source(
            Environment::with_prefix("AUTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port < 1024 && port != 0 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 仅支持 RS256（非对称签名，公私钥分离）
        if self.auth.algorithm != "RS256" {
            return Err(ConfigError::Message(format!(
                "Unsupported JWT algorithm: {}. Only RS256 is supported",
                self.auth.algorithm
            )));
        }

        // 验证密钥路径非空
        if self.auth.private_key_path.is_empty() || self.auth.public_key_path.is_empty() {
            return Err(ConfigError::Message(
                "auth.private_key_path and auth.public_key_path must be set".to_string(),
            ));
        }

        // 验证签发者与受众非空（每个令牌都必须携带）
        if self.auth.issuer.is_empty() || self.auth.audience.is_empty() {
            return Err(ConfigError::Message(
                "auth.issuer and auth.audience must be non-empty".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.auth.access_token_exp_minutes < 1 || self.auth.access_token_exp_minutes > 1440 {
            return Err(ConfigError::Message(
                "access_token_exp_minutes must be between 1 and 1440 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if self.auth.refresh_token_exp_minutes < self.auth.access_token_exp_minutes {
            return Err(ConfigError::Message(
                "refresh_token_exp_minutes must be >= access_token_exp_minutes".to_string(),
            ));
        }

        Ok(())
    }
}

/// 便于测试的配置构造
impl AppConfig {
    pub fn for_tests(private_key_path: &str, public_key_path: &str) -> Self {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:0".to_string(),
                graceful_shutdown_timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: Secret::new("postgresql://localhost/auth_system_test".to_string()),
                max_connections: 5,
                min_connections: 1,
                acquire_timeout_secs: 5,
                idle_timeout_secs: 300,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
            auth: AuthConfig {
                private_key_path: private_key_path.to_string(),
                public_key_path: public_key_path.to_string(),
                algorithm: "RS256".to_string(),
                issuer: "ai-assistant-chat".to_string(),
                audience: "ai-assistant-clients".to_string(),
                access_token_exp_minutes: 3,
                refresh_token_exp_minutes: 60,
            },
        }
    }
}
