//! Best-effort client IP to country resolution.
//!
//! Providers implement [`GeoLookup`] and may fail or hang; [`GeoResolver`]
//! bounds every lookup with a timeout and turns any failure into
//! [`UNKNOWN`], so geolocation never decides whether a redirect succeeds.

pub mod client_ip;
pub mod ipinfo;
pub mod maxmind;

use anyhow::Result;
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{GeoConfig, GeoProviderKind};
use crate::models::UNKNOWN;

pub use client_ip::extract_client_ip;
pub use ipinfo::IpInfoLookup;
pub use maxmind::MaxMindLookup;

/// A source of IP geolocation data.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// ISO 3166-1 alpha-2 country code for `ip`, or `None` when the provider has no answer.
    async fn country_code(&self, ip: IpAddr) -> Result<Option<String>>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Lookup that never knows anything.
pub struct NoGeoLookup;

#[async_trait]
impl GeoLookup for NoGeoLookup {
    async fn country_code(&self, _ip: IpAddr) -> Result<Option<String>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Fail-open wrapper around a [`GeoLookup`].
#[derive(Clone)]
pub struct GeoResolver {
    inner: Arc<dyn GeoLookup>,
    timeout: Duration,
}

impl GeoResolver {
    pub fn new(inner: Arc<dyn GeoLookup>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Resolver that always answers "Unknown".
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoGeoLookup), Duration::from_millis(1))
    }

    /// Build the resolver selected in the configuration. A provider that cannot be
    /// initialised is logged and replaced by the disabled resolver.
    pub fn from_config(config: &GeoConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);

        let inner: Arc<dyn GeoLookup> = match config.provider {
            GeoProviderKind::None => Arc::new(NoGeoLookup),
            GeoProviderKind::Maxmind => {
                let path = config.geoip_db_path.as_deref().unwrap_or_default();
                match MaxMindLookup::open(path) {
                    Ok(lookup) => Arc::new(lookup),
                    Err(e) => {
                        warn!("GeoIP database unavailable, locations will be Unknown: {e:#}");
                        Arc::new(NoGeoLookup)
                    }
                }
            }
            GeoProviderKind::Ipinfo => {
                match IpInfoLookup::new(
                    &config.ipinfo_base_url,
                    config.ipinfo_token.clone(),
                    timeout,
                ) {
                    Ok(lookup) => Arc::new(lookup),
                    Err(e) => {
                        warn!("ipinfo client unavailable, locations will be Unknown: {e:#}");
                        Arc::new(NoGeoLookup)
                    }
                }
            }
        };

        info!("Geo resolution using {} provider", inner.name());
        Self::new(inner, timeout)
    }

    /// Resolve a raw client IP string to a country code or "Unknown". Never fails.
    pub async fn resolve(&self, client_ip: Option<&str>) -> String {
        let Some(ip) = client_ip.and_then(parse_ip) else {
            return UNKNOWN.to_string();
        };

        match tokio::time::timeout(self.timeout, self.inner.country_code(ip)).await {
            Ok(Ok(Some(code))) => code,
            Ok(Ok(None)) => UNKNOWN.to_string(),
            Ok(Err(e)) => {
                debug!(provider = self.inner.name(), %ip, error = %e, "geo lookup failed");
                UNKNOWN.to_string()
            }
            Err(_) => {
                debug!(provider = self.inner.name(), %ip, "geo lookup timed out");
                UNKNOWN.to_string()
            }
        }
    }
}

/// Accepts a bare address, `ip:port`, `[v6]:port` or a forwarded-for list (first entry wins).
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let first = raw.split(',').next()?.trim();
    first
        .parse::<IpAddr>()
        .ok()
        .or_else(|| first.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Whether an address is worth sending to a geolocation provider.
pub(crate) fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}
