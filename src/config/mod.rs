use std::env;

/// Runtime configuration for uploads, listing and reconciliation
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Seconds between background reconciliation runs (default: 900)
    pub reconcile_interval_secs: u64,

    /// Page size used when the list query does not ask for one (default: 10)
    pub default_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024, // 50 MB
            reconcile_interval_secs: 900,
            default_page_size: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.reconcile_interval_secs),

            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_page_size),
        }
    }

    /// Create config for development (short reconcile loop)
    pub fn development() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            reconcile_interval_secs: 60,
            default_page_size: 10,
        }
    }

    /// Create config for production
    pub fn production() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            reconcile_interval_secs: 900,
            default_page_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.reconcile_interval_secs, 900);
        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.reconcile_interval_secs, 60);
    }

    #[test]
    fn test_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.reconcile_interval_secs, 900);
    }
}
