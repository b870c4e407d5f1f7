//! Abstract storage interfaces for pluggable backends
//!
//! The auth core and the HTTP surface depend only on these traits; a
//! relational backend is a deployment concern. The in-memory provider in
//! `memory.rs` is the reference implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::error::Result;

/// A tenant-scoped content site owned by one account
///
/// The domain is the unit of authorization scoping: every nested resource
/// (page, section, media, SEO record) is reached through its domain and
/// inherits the domain's ownership check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
}

/// A page within a domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    /// URL slug, unique across the platform
    pub slug: String,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// An ordered section within a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub page_id: Uuid,
    pub title: String,
    pub content: String,
    /// Position within the page; listings are sorted by it
    pub position: i32,
}

/// Kind of content held by a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Text,
}

impl Default for MediaKind {
    fn default() -> Self {
        MediaKind::Image
    }
}

/// A media item attached to a section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub section_id: Uuid,
    pub uploader_id: Uuid,
    pub file_url: String,
    pub alt_text: Option<String>,
    pub kind: MediaKind,
}

/// Per-domain SEO metadata, at most one record per domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoRecord {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Option<String>,
    pub og_image_url: Option<String>,
}

/// Account storage interface
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new account. Fails with `Conflict` when the email is
    /// already registered; the check and the insert are atomic so two
    /// concurrent registrations cannot both succeed.
    async fn create_identity(&self, identity: Identity) -> Result<Identity>;

    /// Look up an account by id
    async fn identity_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Look up an account by email (exact match, as persisted)
    async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>>;

    /// Persist changes to an existing account
    async fn update_identity(&self, identity: Identity) -> Result<()>;
}

/// Content storage interface for domains and their nested resources
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn create_domain(&self, domain: Domain) -> Result<Domain>;
    async fn domain_by_id(&self, id: Uuid) -> Result<Option<Domain>>;
    async fn domains_by_owner(&self, owner_id: Uuid) -> Result<Vec<Domain>>;
    /// All domains, for administrative listings
    async fn list_domains(&self) -> Result<Vec<Domain>>;

    /// Insert a new page. Fails with `Conflict` when the slug is taken.
    async fn create_page(&self, page: Page) -> Result<Page>;
    async fn page_by_id(&self, id: Uuid) -> Result<Option<Page>>;
    async fn pages_by_domain(&self, domain_id: Uuid) -> Result<Vec<Page>>;

    async fn create_section(&self, section: Section) -> Result<Section>;
    async fn section_by_id(&self, id: Uuid) -> Result<Option<Section>>;
    /// Sections of a page, ordered by position
    async fn sections_by_page(&self, page_id: Uuid) -> Result<Vec<Section>>;

    async fn create_media(&self, media: Media) -> Result<Media>;
    async fn media_by_section(&self, section_id: Uuid) -> Result<Vec<Media>>;

    /// Create or replace the domain's SEO record
    async fn upsert_seo(&self, seo: SeoRecord) -> Result<SeoRecord>;
    async fn seo_by_domain(&self, domain_id: Uuid) -> Result<Option<SeoRecord>>;
}

/// Combined storage provider interface
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Get the account storage backend
    fn identities(&self) -> &dyn IdentityStore;

    /// Get the content storage backend
    fn content(&self) -> &dyn ContentStore;

    /// Health check for the storage backend
    async fn health_check(&self) -> Result<bool>;
}

/// Shared reference to a storage provider
pub type SharedStorage = std::sync::Arc<dyn StorageProvider>;
