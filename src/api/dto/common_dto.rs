//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ActorRole;

/// Identity of the acting party, as verified by the external auth layer.
///
/// The gateway trusts this pair and only checks it against entity
/// ownership; it never re-validates credentials.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct ActorDto {
    /// Opaque actor id.
    pub actor_id: uuid::Uuid,
    /// Asserted role of the actor.
    pub role: ActorRole,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}
