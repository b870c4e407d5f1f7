//! Request authorization
//!
//! Resolves a presented session token into an authenticated identity and
//! enforces ownership scoping on domains and everything nested under
//! them. Every handler that touches domain-scoped data goes through this
//! guard; nothing reads or mutates content on a raw id.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::auth::token::TokenService;
use crate::error::{Result, SiteKeeperError};
use crate::storage::traits::{Domain, Media, Page, Section, SharedStorage};

pub struct AuthGuard {
    tokens: Arc<TokenService>,
    storage: SharedStorage,
}

impl AuthGuard {
    pub fn new(tokens: Arc<TokenService>, storage: SharedStorage) -> Self {
        Self { tokens, storage }
    }

    /// Resolve a raw token into the identity it was issued to
    ///
    /// Missing, malformed, expired, revoked, and orphaned tokens (issued
    /// to a since-removed account) all collapse into `Unauthenticated`.
    pub async fn resolve_identity(&self, token: &str) -> Result<Identity> {
        let claims = self
            .tokens
            .verify(token)
            .await
            .ok_or(SiteKeeperError::Unauthenticated)?;

        self.storage
            .identities()
            .identity_by_id(claims.sub)
            .await?
            .ok_or(SiteKeeperError::Unauthenticated)
    }

    /// Check that an identity may access a domain
    pub fn authorize_domain_access(identity: &Identity, domain: &Domain) -> Result<()> {
        if domain.owner_id == identity.id || identity.role.manages_all_domains() {
            Ok(())
        } else {
            Err(SiteKeeperError::Forbidden)
        }
    }

    /// Load a domain and enforce the ownership check
    pub async fn authorized_domain(&self, identity: &Identity, domain_id: Uuid) -> Result<Domain> {
        let domain = self
            .storage
            .content()
            .domain_by_id(domain_id)
            .await?
            .ok_or_else(|| SiteKeeperError::NotFound(format!("Domain {}", domain_id)))?;

        Self::authorize_domain_access(identity, &domain)?;
        Ok(domain)
    }

    /// Load a page via its owning domain
    pub async fn authorized_page(&self, identity: &Identity, page_id: Uuid) -> Result<Page> {
        let page = self
            .storage
            .content()
            .page_by_id(page_id)
            .await?
            .ok_or_else(|| SiteKeeperError::NotFound(format!("Page {}", page_id)))?;

        self.authorized_domain(identity, page.domain_id).await?;
        Ok(page)
    }

    /// Load a section via its page's owning domain
    pub async fn authorized_section(
        &self,
        identity: &Identity,
        section_id: Uuid,
    ) -> Result<Section> {
        let section = self
            .storage
            .content()
            .section_by_id(section_id)
            .await?
            .ok_or_else(|| SiteKeeperError::NotFound(format!("Section {}", section_id)))?;

        self.authorized_page(identity, section.page_id).await?;
        Ok(section)
    }

    /// Media items of a section, reached through the full ownership chain
    pub async fn authorized_section_media(
        &self,
        identity: &Identity,
        section_id: Uuid,
    ) -> Result<Vec<Media>> {
        self.authorized_section(identity, section_id).await?;
        self.storage.content().media_by_section(section_id).await
    }
}
