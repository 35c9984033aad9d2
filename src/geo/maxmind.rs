//! Country lookup against a MaxMind GeoLite2/GeoIP2 MMDB file.
//!
//! Both Country and City databases work: City is a superset of Country, and
//! only the country fields are decoded.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maxminddb::{geoip2, Mmap, Reader};
use std::net::IpAddr;
use std::sync::Arc;

use super::{is_routable, GeoLookup};

#[derive(Clone)]
pub struct MaxMindLookup {
    reader: Arc<Reader<Mmap>>,
}

impl MaxMindLookup {
    /// Memory-map the database at `path`
    pub fn open(path: &str) -> Result<Self> {
        let reader = unsafe { Reader::open_mmap(path) }
            .with_context(|| format!("Failed to open GeoIP database at {}", path))?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }

    fn lookup_sync(&self, ip: IpAddr) -> Result<Option<String>> {
        let result = self.reader.lookup(ip)?;
        let country = result.decode::<geoip2::Country>()?;
        Ok(country
            .and_then(|c| c.country.iso_code)
            .map(|code| code.to_string()))
    }
}

#[async_trait]
impl GeoLookup for MaxMindLookup {
    async fn country_code(&self, ip: IpAddr) -> Result<Option<String>> {
        if !is_routable(ip) {
            return Ok(None);
        }
        // Memory-mapped reads are fast enough to stay on the async thread.
        self.lookup_sync(ip)
    }

    fn name(&self) -> &'static str {
        "maxmind"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_invalid_path() {
        let result = MaxMindLookup::open("/nonexistent/path.mmdb");
        assert!(result.is_err());
    }
}
