use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Upper bound for token and session lifetimes (30 days).
pub const MAX_LIFETIME_MINUTES: i64 = 30 * 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/booker.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    /// Whether to set the Secure flag on session cookies.
    /// Default: false so the app works over plain HTTP on localhost.
    pub secure_cookies: bool,

    pub session_expiry_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            secure_cookies: false,
            session_expiry_minutes: 60,
        }
    }
}

/// Hardening switches. Several defaults leave a known weakness open; see
/// [`Self::weaknesses`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Lifetime of the token issued by a passed recovery challenge.
    pub reset_token_ttl_minutes: i64,

    /// When false, `/changepswd/` accepts any username without a passed
    /// challenge.
    pub require_reset_token: bool,

    /// Adds the username/digit/case/special-character rules on top of the
    /// length and confirmation checks.
    pub strict_password_policy: bool,

    /// When false, the full roster at `/appointments/` is public.
    pub restrict_roster_to_admin: bool,

    /// Apply the answer allow-list to booking notes too.
    pub validate_booking_note: bool,

    /// Skip the CSRF check on `/booking/`.
    pub csrf_exempt_booking: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            reset_token_ttl_minutes: 15,
            require_reset_token: true,
            strict_password_policy: false,
            restrict_roster_to_admin: false,
            validate_booking_note: false,
            csrf_exempt_booking: true,
        }
    }
}

impl SecurityConfig {
    /// Every hardening switch left open, as human readable names.
    #[must_use]
    pub fn weaknesses(&self) -> Vec<&'static str> {
        let mut open = Vec::new();
        if self.csrf_exempt_booking {
            open.push("booking form is exempt from CSRF protection");
        }
        if !self.restrict_roster_to_admin {
            open.push("appointment roster is readable without login");
        }
        if !self.validate_booking_note {
            open.push("booking notes are stored unvalidated");
        }
        if !self.strict_password_policy {
            open.push("password reset only checks length and confirmation");
        }
        if !self.require_reset_token {
            open.push("password reset is reachable without passing the challenge");
        }
        open
    }

    /// Returns a security config with every hardening switch turned on.
    #[must_use]
    pub fn hardened() -> Self {
        Self {
            require_reset_token: true,
            strict_password_policy: true,
            restrict_roster_to_admin: true,
            validate_booking_note: true,
            csrf_exempt_booking: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "booker".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("booker").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".booker").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if !(1..=MAX_LIFETIME_MINUTES).contains(&self.security.reset_token_ttl_minutes) {
            anyhow::bail!(
                "security.reset_token_ttl_minutes must be between 1 and {MAX_LIFETIME_MINUTES}"
            );
        }

        if !(1..=MAX_LIFETIME_MINUTES).contains(&self.server.session_expiry_minutes) {
            anyhow::bail!(
                "server.session_expiry_minutes must be between 1 and {MAX_LIFETIME_MINUTES}"
            );
        }

        Ok(())
    }

    /// Logs each hardening switch that is still open.
    pub fn warn_weaknesses(&self) {
        for weakness in self.security.weaknesses() {
            warn!(weakness, "Insecure setting active");
        }
    }
}
