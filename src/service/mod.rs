//! Shortcode lifecycle: creation, redirect resolution with click recording, and stats.

mod error;

use chrono::TimeDelta;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::clock::Clock;
use crate::config::LinkConfig;
use crate::geo::GeoResolver;
use crate::models::{ClickEvent, ShortLink, UrlRecord, UNKNOWN};
use crate::shortcode;
use crate::storage::{Storage, StorageError};

pub use error::{CreateError, ResolveError, StatsError};

pub struct RedirectService {
    storage: Arc<dyn Storage>,
    geo: GeoResolver,
    clock: Arc<dyn Clock>,
    settings: LinkConfig,
}

impl RedirectService {
    pub fn new(
        storage: Arc<dyn Storage>,
        geo: GeoResolver,
        clock: Arc<dyn Clock>,
        settings: LinkConfig,
    ) -> Self {
        Self {
            storage,
            geo,
            clock,
            settings,
        }
    }

    /// Create a short link. A blank or missing `requested_shortcode` gets a generated code.
    pub async fn create(
        &self,
        long_url: &str,
        validity_minutes: Option<i64>,
        requested_shortcode: Option<&str>,
    ) -> Result<UrlRecord, CreateError> {
        let long_url = self.validate_url(long_url)?;
        let validity = validity_minutes.unwrap_or(self.settings.default_validity_minutes);

        let requested = requested_shortcode.filter(|code| !code.trim().is_empty());

        if let Some(code) = requested {
            let link = self.new_link(code, &long_url, validity)?;
            return match self.storage.insert(&link).await {
                Ok(()) => {
                    info!(short_code = %code, "created short link");
                    Ok(UrlRecord::new(link))
                }
                Err(StorageError::Conflict) => Err(CreateError::ShortcodeTaken(code.to_string())),
                Err(e) => Err(CreateError::Storage(e.into())),
            };
        }

        let attempts = self.settings.max_generation_attempts;
        for attempt in 1..=attempts {
            let code = shortcode::generate(self.settings.shortcode_length);
            let link = self.new_link(&code, &long_url, validity)?;

            match self.storage.insert(&link).await {
                Ok(()) => {
                    info!(short_code = %code, attempt, "created short link");
                    return Ok(UrlRecord::new(link));
                }
                Err(StorageError::Conflict) => {
                    warn!(short_code = %code, attempt, "generated shortcode collided, retrying");
                }
                Err(e) => return Err(CreateError::Storage(e.into())),
            }
        }

        Err(CreateError::GenerationExhausted { attempts })
    }

    /// Resolve a shortcode to its target URL, recording the click first.
    pub async fn resolve(
        &self,
        shortcode: &str,
        referrer: Option<&str>,
        client_ip: Option<&str>,
    ) -> Result<String, ResolveError> {
        let link = self
            .storage
            .lookup(shortcode)
            .await
            .map_err(ResolveError::Storage)?
            .ok_or(ResolveError::NotFound)?;

        if link.is_expired_at(self.clock.now()) {
            debug!(short_code = %shortcode, expiry = %link.expiry, "short link expired");
            return Err(ResolveError::Expired);
        }

        let location = self.geo.resolve(client_ip).await;
        let referrer = referrer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(UNKNOWN);

        let click = ClickEvent {
            timestamp: self.clock.now(),
            referrer: referrer.to_string(),
            location,
        };

        match self.storage.record_click(shortcode, &click).await {
            Ok(updated) => {
                debug!(short_code = %shortcode, clicks = updated.click_count, "recorded click");
                Ok(updated.long_url)
            }
            Err(StorageError::NotFound) => Err(ResolveError::NotFound),
            Err(e) => {
                warn!(short_code = %shortcode, error = %e, "failed to record click");
                Err(ResolveError::RecordingFailed(e.into()))
            }
        }
    }

    /// Full record with ordered click history.
    pub async fn stats(&self, shortcode: &str) -> Result<UrlRecord, StatsError> {
        self.storage
            .load_record(shortcode)
            .await
            .map_err(StatsError::Storage)?
            .ok_or(StatsError::NotFound)
    }

    fn validate_url(&self, raw: &str) -> Result<String, CreateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CreateError::InvalidUrl("URL must not be empty".to_string()));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(CreateError::InvalidUrl(
                "URL must not contain control characters".to_string(),
            ));
        }
        if trimmed.chars().count() > self.settings.max_url_length {
            return Err(CreateError::InvalidUrl(format!(
                "URL is longer than {} characters",
                self.settings.max_url_length
            )));
        }

        let parsed =
            Url::parse(trimmed).map_err(|e| CreateError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if parsed.cannot_be_a_base() || !parsed.has_host() {
            return Err(CreateError::InvalidUrl(format!(
                "{trimmed}: absolute URL with a host required"
            )));
        }

        // Stored as given so the redirect target is exactly what the caller submitted.
        Ok(trimmed.to_string())
    }

    fn new_link(
        &self,
        shortcode: &str,
        long_url: &str,
        validity_minutes: i64,
    ) -> Result<ShortLink, CreateError> {
        if validity_minutes <= 0 {
            return Err(CreateError::InvalidValidity(validity_minutes));
        }

        let created_at = self.clock.now();
        let expiry = TimeDelta::try_minutes(validity_minutes)
            .and_then(|validity| created_at.checked_add_signed(validity))
            .ok_or(CreateError::InvalidValidity(validity_minutes))?;

        Ok(ShortLink {
            shortcode: shortcode.to_string(),
            long_url: long_url.to_string(),
            created_at,
            expiry,
            click_count: 0,
        })
    }
}
