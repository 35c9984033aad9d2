use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Placeholder stored when a referrer or location is not known.
pub const UNKNOWN: &str = "Unknown";

/// Stored header of a short link, without its click history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShortLink {
    pub shortcode: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub click_count: i64,
}

impl ShortLink {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// One recorded redirect traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClickEvent {
    #[sqlx(rename = "clicked_at")]
    pub timestamp: DateTime<Utc>,
    pub referrer: String,
    pub location: String,
}

/// A short link together with its click history in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    #[serde(flatten)]
    pub link: ShortLink,
    pub click_logs: Vec<ClickEvent>,
}

impl UrlRecord {
    pub fn new(link: ShortLink) -> Self {
        Self {
            link,
            click_logs: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub url: String,
    pub validity: Option<i64>,
    pub shortcode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlResponse {
    pub short_link: String,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClickData {
    pub timestamp: DateTime<Utc>,
    pub referrer: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub clicks: i64,
    pub click_data: Vec<ClickData>,
}

impl From<UrlRecord> for StatsResponse {
    fn from(record: UrlRecord) -> Self {
        Self {
            original_url: record.link.long_url,
            created_at: record.link.created_at,
            expiry: record.link.expiry,
            clicks: record.link.click_count,
            click_data: record
                .click_logs
                .into_iter()
                .map(|click| ClickData {
                    timestamp: click.timestamp,
                    referrer: click.referrer,
                    location: click.location,
                })
                .collect(),
        }
    }
}
