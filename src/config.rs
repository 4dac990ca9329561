/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Default difficulty when a session request omits one.
    pub default_difficulty: String,
    /// Default session length in seconds.
    pub default_duration_secs: f64,
    /// Default board display window in seconds.
    pub default_display_secs: f64,
    /// Pre-game countdown length in seconds.
    pub countdown_secs: f64,
    /// Results collaborator endpoint; `None` disables submission.
    pub results_url: Option<String>,
    /// Timeout for results submission in milliseconds.
    pub submit_timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        AppConfig {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8082),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            default_difficulty: std::env::var("ATTENTION_DEFAULT_DIFFICULTY")
                .unwrap_or_else(|_| "medium".to_string()),
            default_duration_secs: std::env::var("ATTENTION_DEFAULT_DURATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90.0),
            default_display_secs: std::env::var("ATTENTION_DEFAULT_DISPLAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3.0),
            countdown_secs: std::env::var("ATTENTION_COUNTDOWN_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3.0),
            results_url: std::env::var("ATTENTION_RESULTS_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            submit_timeout_ms: std::env::var("ATTENTION_SUBMIT_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            default_difficulty: "medium".to_string(),
            default_duration_secs: 90.0,
            default_display_secs: 3.0,
            countdown_secs: 3.0,
            results_url: None,
            submit_timeout_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8082);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.default_difficulty, "medium");
        assert_eq!(config.default_duration_secs, 90.0);
        assert_eq!(config.default_display_secs, 3.0);
        assert_eq!(config.countdown_secs, 3.0);
        assert_eq!(config.results_url, None);
        assert_eq!(config.submit_timeout_ms, 5000);
        assert_eq!(config.bind_addr(), "0.0.0.0:8082");
    }

    #[test]
    fn from_env_defaults() {
        // Without setting env vars, should fall back to defaults
        let config = AppConfig::from_env();
        assert_eq!(config.port, 8082);
        assert_eq!(config.default_difficulty, "medium");
        assert!(config.results_url.is_none());
    }
}
