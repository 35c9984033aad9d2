use crate::models::{ClickEvent, ShortLink, UrlRecord};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("shortcode already exists")]
    Conflict,
    #[error("shortcode not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a new short link. Fails with `Conflict` if the shortcode is taken;
    /// the check and the write are a single statement.
    async fn insert(&self, link: &ShortLink) -> StorageResult<()>;

    /// Get a short link by shortcode, without its click history
    async fn lookup(&self, shortcode: &str) -> Result<Option<ShortLink>>;

    /// Append a click and bump the counter in one transaction.
    /// Returns the updated link.
    async fn record_click(&self, shortcode: &str, click: &ClickEvent) -> StorageResult<ShortLink>;

    /// Load a link together with its ordered click history
    async fn load_record(&self, shortcode: &str) -> Result<Option<UrlRecord>>;

    /// Delete a link and its click history
    async fn delete(&self, shortcode: &str) -> Result<bool>;
}
