use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:8080";

#[derive(Debug, Error)]
pub enum ServiceConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Listener address and the browser origin allowed by CORS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ServiceConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match var("API_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ServiceConfigError::InvalidValue {
                    key: "API_PORT",
                    value,
                })?,
            None => defaults.port,
        };

        Ok(Self {
            host: var("API_HOST").unwrap_or(defaults.host),
            port,
            frontend_url: var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
