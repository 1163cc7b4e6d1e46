use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CACHE_CONTROL, ETAG, IF_NONE_MATCH},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    gallery::{Gallery, GalleryParams, GalleryView},
    home::home_summary,
    modal::{DetailModal, ProjectDetail},
};
use crate::{
    actions::{ActionError, ActionResult},
    revalidate::{GALLERY, HOME},
    state::AppState,
    store::{Experience, ProjectQuery, StoreError},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/projects", get(gallery))
        .route("/projects/:id", get(project_detail))
        .route("/experiences", get(experiences))
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub categories: Vec<String>,
    pub category: String,
    #[serde(flatten)]
    pub view: GalleryView,
    pub selected: Option<ProjectDetail>,
    /// Query string reflecting the state above, without `?`.
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExperiencesResponse {
    pub experiences: Vec<Experience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').map(str::trim).any(|t| t == etag || t == "*"))
}

fn not_modified(etag: &str) -> Response {
    let mut res = StatusCode::NOT_MODIFIED.into_response();
    if let Ok(v) = HeaderValue::from_str(etag) {
        res.headers_mut().insert(ETAG, v);
    }
    res
}

/// Tags fresh responses; degraded ones (carrying a notice) are never cached.
fn tagged<T: Serialize>(etag: &str, degraded: bool, body: T) -> Response {
    let mut res = Json(body).into_response();
    let headers = res.headers_mut();
    if degraded {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    } else if let Ok(v) = HeaderValue::from_str(etag) {
        headers.insert(ETAG, v);
    }
    res
}

#[instrument(skip(state, headers))]
pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let etag = state.revalidator.etag(HOME);
    if etag_matches(&headers, &etag) {
        return not_modified(&etag);
    }
    let summary = home_summary(state.store.as_ref()).await;
    tagged(&etag, summary.notice.is_some(), summary)
}

#[instrument(skip(state, headers))]
pub async fn gallery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<GalleryParams>,
) -> Response {
    let etag = state.revalidator.etag(GALLERY);
    if etag_matches(&headers, &etag) {
        return not_modified(&etag);
    }

    let (projects, notice) = match state.store.list_projects(&ProjectQuery::public()).await {
        Ok(projects) => (projects, None),
        Err(e) => {
            warn!(error = %e, "gallery unavailable");
            (Vec::new(), Some("Failed to load projects".to_string()))
        }
    };

    let gallery = Gallery::load(projects, &params);
    let site = &state.config.site;
    let selected = gallery
        .selected()
        .cloned()
        .map(|p| DetailModal::new(p, &site.url, &site.contact_email).into_detail());
    let body = GalleryResponse {
        categories: gallery.categories(),
        category: gallery.category().to_string(),
        view: gallery.view(),
        selected,
        query: gallery.params().to_query_string(),
        notice,
    };
    tagged(&etag, body.notice.is_some(), body)
}

#[instrument(skip(state, headers))]
pub async fn project_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ActionResult<Response> {
    let etag = state.revalidator.etag(GALLERY);
    if etag_matches(&headers, &etag) {
        return Ok(not_modified(&etag));
    }

    let project = match state.store.get_project(id).await {
        Ok(p) if p.is_public => p,
        Ok(_) | Err(StoreError::NotFound { .. }) => return Err(ActionError::NotFound("Project")),
        Err(e) => return Err(e.into()),
    };
    let site = &state.config.site;
    let detail = DetailModal::new(project, &site.url, &site.contact_email).into_detail();
    Ok(tagged(&etag, false, detail))
}

#[instrument(skip(state, headers))]
pub async fn experiences(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let etag = state.revalidator.etag(HOME);
    if etag_matches(&headers, &etag) {
        return not_modified(&etag);
    }
    let body = match state.store.list_experiences().await {
        Ok(experiences) => ExperiencesResponse {
            experiences,
            notice: None,
        },
        Err(e) => {
            warn!(error = %e, "experiences unavailable");
            ExperiencesResponse {
                experiences: Vec::new(),
                notice: Some("Failed to load experiences".into()),
            }
        }
    };
    tagged(&etag, body.notice.is_some(), body)
}
