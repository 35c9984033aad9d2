use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub redirect_server: ServerConfig,
    /// Prefix for public short links, e.g. `https://sho.rt`
    pub public_base_url: String,
    pub links: LinkConfig,
    pub geo: GeoConfig,
    pub trusted_proxy_mode: TrustedProxyMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Shortcode and validity rules applied at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub shortcode_length: usize,
    pub max_generation_attempts: u32,
    pub default_validity_minutes: i64,
    pub max_url_length: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            shortcode_length: 7,
            max_generation_attempts: 5,
            default_validity_minutes: 30,
            max_url_length: 50_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoProviderKind {
    None,
    Maxmind,
    Ipinfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub provider: GeoProviderKind,
    /// Path to a GeoLite2/GeoIP2 Country or City .mmdb file
    pub geoip_db_path: Option<String>,
    pub ipinfo_base_url: String,
    pub ipinfo_token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            provider: GeoProviderKind::None,
            geoip_db_path: None,
            ipinfo_base_url: "https://ipinfo.io".to_string(),
            ipinfo_token: None,
            timeout_ms: 500,
        }
    }
}

/// Which request headers are trusted to carry the client IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Socket address only
    None,
    /// X-Forwarded-For, then X-Real-IP
    #[default]
    Standard,
    /// CF-Connecting-IP
    Cloudflare,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str = env_or("DATABASE_BACKEND", "sqlite");

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url = env_or("DATABASE_URL", "sqlite://./shortlink.db");
        let max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 5u32)?;

        let api_host = env_or("API_HOST", "127.0.0.1");
        let api_port = parse_env("API_PORT", 8080u16)?;

        let redirect_host = env_or("REDIRECT_HOST", "127.0.0.1");
        let redirect_port = parse_env("REDIRECT_PORT", 3000u16)?;

        let public_base_url = env_or("PUBLIC_BASE_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let link_defaults = LinkConfig::default();
        let links = LinkConfig {
            shortcode_length: parse_env("SHORTCODE_LENGTH", link_defaults.shortcode_length)?,
            max_generation_attempts: parse_env(
                "SHORTCODE_MAX_ATTEMPTS",
                link_defaults.max_generation_attempts,
            )?,
            default_validity_minutes: parse_env(
                "DEFAULT_VALIDITY_MINUTES",
                link_defaults.default_validity_minutes,
            )?,
            max_url_length: parse_env("MAX_URL_LENGTH", link_defaults.max_url_length)?,
        };

        if links.shortcode_length == 0 {
            anyhow::bail!("SHORTCODE_LENGTH must be at least 1");
        }
        if links.max_generation_attempts == 0 {
            anyhow::bail!("SHORTCODE_MAX_ATTEMPTS must be at least 1");
        }
        if links.default_validity_minutes <= 0 {
            anyhow::bail!("DEFAULT_VALIDITY_MINUTES must be positive");
        }

        let provider = match env_or("GEO_PROVIDER", "none").to_lowercase().as_str() {
            "none" | "" => GeoProviderKind::None,
            "maxmind" => GeoProviderKind::Maxmind,
            "ipinfo" => GeoProviderKind::Ipinfo,
            other => {
                tracing::warn!(
                    "Unknown GEO_PROVIDER '{other}', falling back to 'none'. Supported values: none, maxmind, ipinfo"
                );
                GeoProviderKind::None
            }
        };

        let geoip_db_path = std::env::var("GEOIP_DB_PATH").ok();
        if provider == GeoProviderKind::Maxmind && geoip_db_path.is_none() {
            anyhow::bail!("GEOIP_DB_PATH must be set when GEO_PROVIDER=maxmind");
        }

        let geo_defaults = GeoConfig::default();
        let geo = GeoConfig {
            provider,
            geoip_db_path,
            ipinfo_base_url: env_or("IPINFO_BASE_URL", &geo_defaults.ipinfo_base_url)
                .trim_end_matches('/')
                .to_string(),
            ipinfo_token: std::env::var("IPINFO_TOKEN").ok(),
            timeout_ms: parse_env("GEO_TIMEOUT_MS", geo_defaults.timeout_ms)?,
        };

        let trusted_proxy_mode = match env_or("TRUSTED_PROXY_MODE", "standard")
            .to_lowercase()
            .as_str()
        {
            "none" => TrustedProxyMode::None,
            "standard" => TrustedProxyMode::Standard,
            "cloudflare" => TrustedProxyMode::Cloudflare,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'standard'. Supported values: none, standard, cloudflare"
                );
                TrustedProxyMode::Standard
            }
        };

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            redirect_server: ServerConfig {
                host: redirect_host,
                port: redirect_port,
            },
            public_base_url,
            links,
            geo,
            trusted_proxy_mode,
        })
    }

    /// Public link for a shortcode.
    pub fn short_link(&self, shortcode: &str) -> String {
        format!("{}/{}", self.public_base_url, shortcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base(base: &str) -> Config {
        Config {
            database: DatabaseConfig {
                backend: DatabaseBackend::Sqlite,
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            api_server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            redirect_server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            public_base_url: base.to_string(),
            links: LinkConfig::default(),
            geo: GeoConfig::default(),
            trusted_proxy_mode: TrustedProxyMode::default(),
        }
    }

    #[test]
    fn test_short_link_joins_base_and_code() {
        let config = config_with_base("https://sho.rt");
        assert_eq!(config.short_link("abc123"), "https://sho.rt/abc123");
    }

    #[test]
    fn test_link_defaults() {
        let links = LinkConfig::default();
        assert_eq!(links.default_validity_minutes, 30);
        assert_eq!(links.shortcode_length, 7);
        assert_eq!(links.max_url_length, 50_000);
    }

    #[test]
    fn test_parse_env_falls_back_when_unset() {
        let value = parse_env("SHORTLINK_TEST_SURELY_UNSET_VARIABLE", 42u32).unwrap();
        assert_eq!(value, 42);
    }
}
