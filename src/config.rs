//! Runtime configuration
//! Mission: One place for every knob, from flags or the environment

use clap::Parser;
use std::time::Duration;

use crate::auth::TokenSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "nyanime")]
#[command(about = "Nyanime anime review API server")]
pub struct Config {
    /// HMAC secret used to sign session tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "JWT_ISSUER", default_value = "Nyanime")]
    pub jwt_issuer: String,

    /// Session lifetime in hours
    #[arg(long, env = "JWT_TTL_HOURS", default_value_t = 24)]
    pub jwt_ttl_hours: i64,

    /// Clock skew tolerated when checking expiry
    #[arg(long, env = "JWT_LEEWAY_SECS", default_value_t = 0)]
    pub jwt_leeway_secs: u64,

    /// Path to SQLite database
    #[arg(long, env = "DATABASE_PATH", default_value = "nyanime.db")]
    pub database_path: String,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Browser origin allowed to call the API
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://127.0.0.1:5500")]
    pub cors_origin: String,

    /// Seconds between blacklist sweeps; 0 disables the sweeper
    #[arg(long, env = "BLACKLIST_SWEEP_SECS", default_value_t = 300)]
    pub blacklist_sweep_secs: u64,

    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[arg(long, env = "ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,
}

impl Config {
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            issuer: self.jwt_issuer.clone(),
            ttl_hours: self.jwt_ttl_hours,
            leeway_secs: self.jwt_leeway_secs,
        }
    }

    /// Sweep interval, `None` when disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.blacklist_sweep_secs > 0).then(|| Duration::from_secs(self.blacklist_sweep_secs))
    }

    /// Admin bootstrap credentials, only when both email and password are set.
    pub fn admin_bootstrap(&self) -> Option<(&str, &str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((self.admin_username.as_str(), email, password))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["nyanime", "--jwt-secret", "s3cret"]).unwrap();

        assert_eq!(config.jwt_issuer, "Nyanime");
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.jwt_leeway_secs, 0);
        assert_eq!(config.database_path, "nyanime.db");
        assert_eq!(config.cors_origin, "http://127.0.0.1:5500");
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(300)));
        assert!(config.admin_bootstrap().is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "nyanime",
            "--jwt-secret",
            "s3cret",
            "--jwt-ttl-hours",
            "2",
            "--blacklist-sweep-secs",
            "0",
            "--admin-email",
            "root@example.com",
            "--admin-password",
            "hunter2hunter2",
        ])
        .unwrap();

        let settings = config.token_settings();
        assert_eq!(settings.ttl_hours, 2);
        assert_eq!(settings.issuer, "Nyanime");
        assert!(config.sweep_interval().is_none());
        assert_eq!(
            config.admin_bootstrap(),
            Some(("admin", "root@example.com", "hunter2hunter2"))
        );
    }

    #[test]
    fn test_admin_bootstrap_needs_password() {
        let config = Config::try_parse_from([
            "nyanime",
            "--jwt-secret",
            "s3cret",
            "--admin-email",
            "root@example.com",
        ])
        .unwrap();

        assert!(config.admin_bootstrap().is_none());
    }
}
