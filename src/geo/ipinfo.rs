//! Country lookup through the ipinfo.io HTTP API.
//!
//! `GET {base}/{ip}/country?token=...` answers with a plain-text country code.
//! Successful answers are cached so repeat visitors do not cost a request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use std::net::IpAddr;
use std::time::Duration;
use tracing::trace;
use url::Url;

use super::{is_routable, GeoLookup};

const CACHE_TTL_SECS: u64 = 15 * 60;
const CACHE_MAX_CAPACITY: u64 = 10_000;

pub struct IpInfoLookup {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache: Cache<IpAddr, String>,
}

impl IpInfoLookup {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid ipinfo base URL {base_url}"))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build ipinfo HTTP client")?;

        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(CACHE_TTL_SECS))
            .max_capacity(CACHE_MAX_CAPACITY)
            .build();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            cache,
        })
    }

    fn request_url(&self, ip: IpAddr) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}/country", self.base_url, ip))?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }

    async fn fetch(&self, ip: IpAddr) -> Result<Option<String>> {
        let body = self
            .client
            .get(self.request_url(ip)?)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_country(&body))
    }
}

/// ipinfo answers with the bare code plus a newline; anything else is treated as no answer.
fn parse_country(body: &str) -> Option<String> {
    let code = body.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

#[async_trait]
impl GeoLookup for IpInfoLookup {
    async fn country_code(&self, ip: IpAddr) -> Result<Option<String>> {
        if !is_routable(ip) {
            return Ok(None);
        }

        if let Some(code) = self.cache.get(&ip).await {
            trace!(%ip, "ipinfo cache hit");
            return Ok(Some(code));
        }

        let code = self.fetch(ip).await?;
        if let Some(code) = &code {
            self.cache.insert(ip, code.clone()).await;
        }
        Ok(code)
    }

    fn name(&self) -> &'static str {
        "ipinfo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_country() {
        assert_eq!(parse_country("US\n"), Some("US".to_string()));
        assert_eq!(parse_country("de"), Some("DE".to_string()));
        assert_eq!(parse_country(""), None);
        assert_eq!(parse_country("undefined"), None);
        assert_eq!(parse_country("{\"error\":1}"), None);
    }

    #[test]
    fn test_request_url_carries_token() {
        let lookup = IpInfoLookup::new(
            "https://ipinfo.io/",
            Some("secret".to_string()),
            Duration::from_millis(100),
        )
        .unwrap();
        let url = lookup.request_url("8.8.8.8".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://ipinfo.io/8.8.8.8/country?token=secret");
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        assert!(IpInfoLookup::new("not a url", None, Duration::from_millis(100)).is_err());
    }
}
