//! Content endpoints: domains, pages, sections, media, SEO, gallery
//!
//! Every authenticated route resolves the owning domain through the
//! guard before touching nested data; the public gallery is the single
//! unauthenticated read surface.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::{reject, with_identity, with_state};
use crate::auth::identity::Identity;
use crate::core::state::AppState;
use crate::error::{Result, SiteKeeperError};
use crate::storage::traits::{Domain, Media, MediaKind, Page, Section, SeoRecord};

const BODY_LIMIT: u64 = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct CreateDomainRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionInput {
    pub title: String,
    pub content: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub domain_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub cover_image_url: Option<String>,
    /// Optional inline sections, created with the page
    pub sections: Option<Vec<SectionInput>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub page_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMediaRequest {
    pub section_id: Uuid,
    pub file_url: String,
    pub alt_text: Option<String>,
    pub kind: Option<MediaKind>,
}

#[derive(Debug, Deserialize)]
pub struct SeoRequest {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Option<String>,
    pub og_image_url: Option<String>,
}

/// Page listing entry with its section count
#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub title: String,
    pub slug: String,
    pub sections: usize,
}

/// Full page with its sections in order
#[derive(Debug, Serialize)]
pub struct PageDetail {
    #[serde(flatten)]
    pub page: Page,
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct GalleryImage {
    pub file_url: String,
    pub alt_text: Option<String>,
    pub page_slug: String,
}

/// Public rendering payload for a domain's media
#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub domain: String,
    pub seo: Option<SeoRecord>,
    pub images: Vec<GalleryImage>,
}

/// Content endpoint routes
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create_domain = warp::path!("api" / "domains")
        .and(warp::post())
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_create_domain);

    let list_domains = warp::path!("api" / "domains")
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_list_domains);

    let get_domain = warp::path!("api" / "domains" / Uuid)
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_get_domain);

    let put_seo = warp::path!("api" / "domains" / Uuid / "seo")
        .and(warp::put())
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_upsert_seo);

    let get_seo = warp::path!("api" / "domains" / Uuid / "seo")
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_get_seo);

    let create_page = warp::path!("api" / "pages")
        .and(warp::post())
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_create_page);

    let list_pages = warp::path!("api" / "pages")
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_list_pages);

    let get_page = warp::path!("api" / "pages" / Uuid)
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_get_page);

    let list_sections = warp::path!("api" / "pages" / Uuid / "sections")
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_list_sections);

    let create_section = warp::path!("api" / "sections")
        .and(warp::post())
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_create_section);

    let list_media = warp::path!("api" / "sections" / Uuid / "media")
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handle_list_media);

    let create_media = warp::path!("api" / "media")
        .and(warp::post())
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_create_media);

    let gallery = warp::path!("api" / "gallery" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_gallery);

    create_domain
        .or(list_domains)
        .or(put_seo)
        .or(get_seo)
        .or(get_domain)
        .or(list_pages)
        .or(list_sections)
        .or(get_page)
        .or(create_page)
        .or(create_section)
        .or(list_media)
        .or(create_media)
        .or(gallery)
}

fn require_nonempty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SiteKeeperError::ValidationError(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(())
}

async fn handle_create_domain(
    identity: Identity,
    req: CreateDomainRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    require_nonempty(&req.name, "Domain name").map_err(reject)?;

    let domain = Domain {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        owner_id: identity.id,
    };
    let domain = state
        .storage
        .content()
        .create_domain(domain)
        .await
        .map_err(reject)?;

    log::info!("Domain created: {} by {}", domain.id, identity.id);
    Ok(warp::reply::with_status(
        warp::reply::json(&domain),
        StatusCode::CREATED,
    ))
}

async fn handle_list_domains(
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let domains = if identity.role.manages_all_domains() {
        state.storage.content().list_domains().await
    } else {
        state.storage.content().domains_by_owner(identity.id).await
    }
    .map_err(reject)?;

    Ok(warp::reply::json(&domains))
}

async fn handle_get_domain(
    domain_id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let domain = state
        .guard
        .authorized_domain(&identity, domain_id)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&domain))
}

async fn handle_upsert_seo(
    domain_id: Uuid,
    identity: Identity,
    req: SeoRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    require_nonempty(&req.meta_title, "Meta title").map_err(reject)?;
    state
        .guard
        .authorized_domain(&identity, domain_id)
        .await
        .map_err(reject)?;

    // Keep a stable record id across replacements
    let existing = state
        .storage
        .content()
        .seo_by_domain(domain_id)
        .await
        .map_err(reject)?;

    let record = SeoRecord {
        id: existing.map(|seo| seo.id).unwrap_or_else(Uuid::new_v4),
        domain_id,
        meta_title: req.meta_title,
        meta_description: req.meta_description,
        keywords: req.keywords,
        og_image_url: req.og_image_url,
    };
    let record = state
        .storage
        .content()
        .upsert_seo(record)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&record))
}

async fn handle_get_seo(
    domain_id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    state
        .guard
        .authorized_domain(&identity, domain_id)
        .await
        .map_err(reject)?;

    let record = state
        .storage
        .content()
        .seo_by_domain(domain_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(SiteKeeperError::NotFound(format!("SEO for domain {}", domain_id))))?;

    Ok(warp::reply::json(&record))
}

async fn handle_create_page(
    identity: Identity,
    req: CreatePageRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    require_nonempty(&req.title, "Page title").map_err(reject)?;
    require_nonempty(&req.slug, "Page slug").map_err(reject)?;

    state
        .guard
        .authorized_domain(&identity, req.domain_id)
        .await
        .map_err(reject)?;

    let page = Page {
        id: Uuid::new_v4(),
        domain_id: req.domain_id,
        author_id: identity.id,
        title: req.title,
        slug: req.slug.trim().to_string(),
        content: req.content.unwrap_or_default(),
        cover_image_url: req.cover_image_url,
        updated_at: Utc::now(),
    };
    let page = state
        .storage
        .content()
        .create_page(page)
        .await
        .map_err(reject)?;

    // Optional inline sections, positioned in the order given
    let mut sections = Vec::new();
    if let Some(inputs) = req.sections {
        for (index, input) in inputs.into_iter().enumerate() {
            let section = Section {
                id: Uuid::new_v4(),
                page_id: page.id,
                title: input.title,
                content: input.content.unwrap_or_default(),
                position: input.position.unwrap_or(index as i32),
            };
            sections.push(
                state
                    .storage
                    .content()
                    .create_section(section)
                    .await
                    .map_err(reject)?,
            );
        }
        sections.sort_by_key(|s| s.position);
    }

    log::info!("Page created: {} in domain {}", page.id, page.domain_id);
    Ok(warp::reply::with_status(
        warp::reply::json(&PageDetail { page, sections }),
        StatusCode::CREATED,
    ))
}

async fn handle_list_pages(
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let domains = if identity.role.manages_all_domains() {
        state.storage.content().list_domains().await
    } else {
        state.storage.content().domains_by_owner(identity.id).await
    }
    .map_err(reject)?;

    let mut summaries = Vec::new();
    for domain in domains {
        let pages = state
            .storage
            .content()
            .pages_by_domain(domain.id)
            .await
            .map_err(reject)?;
        for page in pages {
            let sections = state
                .storage
                .content()
                .sections_by_page(page.id)
                .await
                .map_err(reject)?;
            summaries.push(PageSummary {
                id: page.id,
                domain_id: page.domain_id,
                title: page.title,
                slug: page.slug,
                sections: sections.len(),
            });
        }
    }

    Ok(warp::reply::json(&summaries))
}

async fn handle_get_page(
    page_id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let page = state
        .guard
        .authorized_page(&identity, page_id)
        .await
        .map_err(reject)?;
    let sections = state
        .storage
        .content()
        .sections_by_page(page.id)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&PageDetail { page, sections }))
}

async fn handle_create_section(
    identity: Identity,
    req: CreateSectionRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    require_nonempty(&req.title, "Section title").map_err(reject)?;

    state
        .guard
        .authorized_page(&identity, req.page_id)
        .await
        .map_err(reject)?;

    let position = match req.position {
        Some(position) => position,
        None => {
            // Append after the page's current last section
            let existing = state
                .storage
                .content()
                .sections_by_page(req.page_id)
                .await
                .map_err(reject)?;
            existing.last().map(|s| s.position + 1).unwrap_or(0)
        }
    };

    let section = Section {
        id: Uuid::new_v4(),
        page_id: req.page_id,
        title: req.title,
        content: req.content.unwrap_or_default(),
        position,
    };
    let section = state
        .storage
        .content()
        .create_section(section)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&section),
        StatusCode::CREATED,
    ))
}

async fn handle_list_sections(
    page_id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    state
        .guard
        .authorized_page(&identity, page_id)
        .await
        .map_err(reject)?;
    let sections = state
        .storage
        .content()
        .sections_by_page(page_id)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&sections))
}

async fn handle_create_media(
    identity: Identity,
    req: CreateMediaRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    require_nonempty(&req.file_url, "File URL").map_err(reject)?;

    state
        .guard
        .authorized_section(&identity, req.section_id)
        .await
        .map_err(reject)?;

    let media = Media {
        id: Uuid::new_v4(),
        section_id: req.section_id,
        uploader_id: identity.id,
        file_url: req.file_url,
        alt_text: req.alt_text,
        kind: req.kind.unwrap_or_default(),
    };
    let media = state
        .storage
        .content()
        .create_media(media)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&media),
        StatusCode::CREATED,
    ))
}

async fn handle_list_media(
    section_id: Uuid,
    identity: Identity,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let media = state
        .guard
        .authorized_section_media(&identity, section_id)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&media))
}

/// Unauthenticated read endpoint for rendering a domain's media
async fn handle_gallery(
    domain_id: Uuid,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let domain = state
        .storage
        .content()
        .domain_by_id(domain_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(SiteKeeperError::NotFound(format!("Domain {}", domain_id))))?;

    let seo = state
        .storage
        .content()
        .seo_by_domain(domain_id)
        .await
        .map_err(reject)?;

    let mut images = Vec::new();
    let pages = state
        .storage
        .content()
        .pages_by_domain(domain_id)
        .await
        .map_err(reject)?;
    for page in pages {
        let sections = state
            .storage
            .content()
            .sections_by_page(page.id)
            .await
            .map_err(reject)?;
        for section in sections {
            let media = state
                .storage
                .content()
                .media_by_section(section.id)
                .await
                .map_err(reject)?;
            for item in media {
                if item.kind == MediaKind::Image {
                    images.push(GalleryImage {
                        file_url: item.file_url,
                        alt_text: item.alt_text,
                        page_slug: page.slug.clone(),
                    });
                }
            }
        }
    }

    Ok(warp::reply::json(&GalleryResponse {
        domain: domain.name,
        seo,
        images,
    }))
}
