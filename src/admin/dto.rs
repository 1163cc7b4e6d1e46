use serde::{Deserialize, Serialize};

use super::listing::{ListParams, Page};
use crate::store::Project;

/// One page of an admin list view plus the state that produced it.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    #[serde(flatten)]
    pub page: Page<T>,
    pub filters: ListParams,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Set when the collection could not be loaded; the list is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Result of a mutation together with the re-fetched list.
#[derive(Debug, Serialize)]
pub struct MutationResponse<D, T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
    pub listing: ListResponse<T>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeaturedRequest {
    pub is_featured: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_projects: i64,
    pub public_projects: i64,
    /// Percentage of projects that are public, rounded.
    pub visibility_rate: i64,
    pub recent_projects: Vec<Project>,
}
