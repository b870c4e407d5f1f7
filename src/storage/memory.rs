//! In-memory storage implementation for development and testing
//!
//! This provides a complete storage implementation that keeps all data
//! in memory. Suitable for development, testing, or small deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::*;
use crate::auth::identity::Identity;
use crate::error::{Result, SiteKeeperError};

/// In-memory combined storage provider
pub struct MemoryStorageProvider {
    identities: Arc<RwLock<HashMap<Uuid, Identity>>>,
    /// email -> identity id; the write lock on this index serializes
    /// registration, making the uniqueness check-and-insert atomic
    identity_emails: Arc<RwLock<HashMap<String, Uuid>>>,
    domains: Arc<RwLock<HashMap<Uuid, Domain>>>,
    pages: Arc<RwLock<HashMap<Uuid, Page>>>,
    /// slug -> page id
    page_slugs: Arc<RwLock<HashMap<String, Uuid>>>,
    sections: Arc<RwLock<HashMap<Uuid, Section>>>,
    media: Arc<RwLock<HashMap<Uuid, Media>>>,
    /// domain id -> SEO record; at most one per domain
    seo: Arc<RwLock<HashMap<Uuid, SeoRecord>>>,
}

impl MemoryStorageProvider {
    pub fn new() -> Self {
        Self {
            identities: Arc::new(RwLock::new(HashMap::new())),
            identity_emails: Arc::new(RwLock::new(HashMap::new())),
            domains: Arc::new(RwLock::new(HashMap::new())),
            pages: Arc::new(RwLock::new(HashMap::new())),
            page_slugs: Arc::new(RwLock::new(HashMap::new())),
            sections: Arc::new(RwLock::new(HashMap::new())),
            media: Arc::new(RwLock::new(HashMap::new())),
            seo: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStorageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryStorageProvider {
    async fn create_identity(&self, identity: Identity) -> Result<Identity> {
        // Hold the email index write lock across check and insert; a
        // concurrent registration for the same email blocks here and then
        // sees the first one's entry
        let mut emails = self.identity_emails.write().await;
        if emails.contains_key(&identity.email) {
            return Err(SiteKeeperError::Conflict(
                "Email already registered".to_string(),
            ));
        }
        emails.insert(identity.email.clone(), identity.id);

        self.identities
            .write()
            .await
            .insert(identity.id, identity.clone());

        Ok(identity)
    }

    async fn identity_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let emails = self.identity_emails.read().await;
        match emails.get(email) {
            Some(id) => Ok(self.identities.read().await.get(id).cloned()),
            None => Ok(None),
        }
    }

    async fn update_identity(&self, identity: Identity) -> Result<()> {
        let mut identities = self.identities.write().await;
        if !identities.contains_key(&identity.id) {
            return Err(SiteKeeperError::NotFound(format!(
                "Identity {}",
                identity.id
            )));
        }
        identities.insert(identity.id, identity);
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStorageProvider {
    async fn create_domain(&self, domain: Domain) -> Result<Domain> {
        self.domains.write().await.insert(domain.id, domain.clone());
        Ok(domain)
    }

    async fn domain_by_id(&self, id: Uuid) -> Result<Option<Domain>> {
        Ok(self.domains.read().await.get(&id).cloned())
    }

    async fn domains_by_owner(&self, owner_id: Uuid) -> Result<Vec<Domain>> {
        let domains = self.domains.read().await;
        let mut result: Vec<Domain> = domains
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        let domains = self.domains.read().await;
        let mut result: Vec<Domain> = domains.values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn create_page(&self, page: Page) -> Result<Page> {
        let mut slugs = self.page_slugs.write().await;
        if slugs.contains_key(&page.slug) {
            return Err(SiteKeeperError::Conflict(format!(
                "Slug '{}' already in use",
                page.slug
            )));
        }
        slugs.insert(page.slug.clone(), page.id);

        self.pages.write().await.insert(page.id, page.clone());
        Ok(page)
    }

    async fn page_by_id(&self, id: Uuid) -> Result<Option<Page>> {
        Ok(self.pages.read().await.get(&id).cloned())
    }

    async fn pages_by_domain(&self, domain_id: Uuid) -> Result<Vec<Page>> {
        let pages = self.pages.read().await;
        let mut result: Vec<Page> = pages
            .values()
            .filter(|p| p.domain_id == domain_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(result)
    }

    async fn create_section(&self, section: Section) -> Result<Section> {
        self.sections
            .write()
            .await
            .insert(section.id, section.clone());
        Ok(section)
    }

    async fn section_by_id(&self, id: Uuid) -> Result<Option<Section>> {
        Ok(self.sections.read().await.get(&id).cloned())
    }

    async fn sections_by_page(&self, page_id: Uuid) -> Result<Vec<Section>> {
        let sections = self.sections.read().await;
        let mut result: Vec<Section> = sections
            .values()
            .filter(|s| s.page_id == page_id)
            .cloned()
            .collect();
        result.sort_by_key(|s| s.position);
        Ok(result)
    }

    async fn create_media(&self, media: Media) -> Result<Media> {
        self.media.write().await.insert(media.id, media.clone());
        Ok(media)
    }

    async fn media_by_section(&self, section_id: Uuid) -> Result<Vec<Media>> {
        let media = self.media.read().await;
        Ok(media
            .values()
            .filter(|m| m.section_id == section_id)
            .cloned()
            .collect())
    }

    async fn upsert_seo(&self, seo: SeoRecord) -> Result<SeoRecord> {
        self.seo.write().await.insert(seo.domain_id, seo.clone());
        Ok(seo)
    }

    async fn seo_by_domain(&self, domain_id: Uuid) -> Result<Option<SeoRecord>> {
        Ok(self.seo.read().await.get(&domain_id).cloned())
    }
}

#[async_trait]
impl StorageProvider for MemoryStorageProvider {
    fn identities(&self) -> &dyn IdentityStore {
        self
    }

    fn content(&self) -> &dyn ContentStore {
        self
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Create a new memory-based storage provider
pub fn create_memory_storage() -> SharedStorage {
    Arc::new(MemoryStorageProvider::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Role;
    use chrono::Utc;

    fn identity(email: &str) -> Identity {
        Identity::new("Test".to_string(), email.to_string(), "hash".to_string(), Role::Editor)
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStorageProvider::new();
        store.create_identity(identity("a@example.com")).await.unwrap();

        let err = store
            .create_identity(identity("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, SiteKeeperError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let store = Arc::new(MemoryStorageProvider::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create_identity(identity("race@example.com")).await
            }));
        }

        let mut successes = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(SiteKeeperError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn test_email_lookup_is_exact_match() {
        let store = MemoryStorageProvider::new();
        store.create_identity(identity("Case@Example.com")).await.unwrap();

        assert!(store
            .identity_by_email("Case@Example.com")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .identity_by_email("case@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = MemoryStorageProvider::new();
        let owner = Uuid::new_v4();
        let domain = Uuid::new_v4();

        let page = |id: Uuid| Page {
            id,
            domain_id: domain,
            author_id: owner,
            title: "Home".to_string(),
            slug: "home".to_string(),
            content: String::new(),
            cover_image_url: None,
            updated_at: Utc::now(),
        };

        store.create_page(page(Uuid::new_v4())).await.unwrap();
        let err = store.create_page(page(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, SiteKeeperError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_sections_ordered_by_position() {
        let store = MemoryStorageProvider::new();
        let page_id = Uuid::new_v4();

        for position in [2, 0, 1] {
            store
                .create_section(Section {
                    id: Uuid::new_v4(),
                    page_id,
                    title: format!("s{}", position),
                    content: String::new(),
                    position,
                })
                .await
                .unwrap();
        }

        let sections = store.sections_by_page(page_id).await.unwrap();
        let positions: Vec<i32> = sections.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_seo_upsert_replaces() {
        let store = MemoryStorageProvider::new();
        let domain_id = Uuid::new_v4();

        let seo = |title: &str| SeoRecord {
            id: Uuid::new_v4(),
            domain_id,
            meta_title: title.to_string(),
            meta_description: String::new(),
            keywords: None,
            og_image_url: None,
        };

        store.upsert_seo(seo("first")).await.unwrap();
        store.upsert_seo(seo("second")).await.unwrap();

        let stored = store.seo_by_domain(domain_id).await.unwrap().unwrap();
        assert_eq!(stored.meta_title, "second");
    }
}
