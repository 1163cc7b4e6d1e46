use axum::{
    extract::{
        multipart::{Field, MultipartError},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        Dashboard, DeleteParams, FeaturedRequest, ListResponse, MutationResponse,
        VisibilityRequest,
    },
    extract::FormJson,
    listing::{
        ExperienceListing, ListParams, ProjectListing, EXPERIENCES_PER_PAGE, PROJECTS_PER_PAGE,
    },
};
use crate::{
    actions::{
        email::{send_email, Attachment, EmailForm, EmailOutcome},
        experiences, images,
        images::{ImageUpload, UploadedImage},
        projects, ActionError, ActionResult,
    },
    auth::RequireAdmin,
    state::AppState,
    store::{Experience, ExperiencePatch, NewExperience, NewProject, Project, ProjectPatch, ProjectQuery},
    validation::{FieldErrors, MAX_ATTACHMENT_BYTES, MAX_IMAGE_BYTES},
};

const LOAD_PROJECTS_FAILED: &str = "Failed to load projects";
const LOAD_EXPERIENCES_FAILED: &str = "Failed to load experiences";

pub fn routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/admin/images", post(upload_image))
        .route("/admin/email", post(email))
        // per-field ceilings are checked in the handlers
        .layer(DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES + 1024 * 1024));

    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/projects", get(list_projects).post(create_project))
        .route(
            "/admin/projects/:id",
            patch(update_project).delete(delete_project),
        )
        .route("/admin/projects/:id/visibility", post(set_visibility))
        .route("/admin/projects/:id/featured", post(set_featured))
        .route(
            "/admin/experiences",
            get(list_experiences).post(create_experience),
        )
        .route(
            "/admin/experiences/:id",
            patch(update_experience).delete(delete_experience),
        )
        .merge(uploads)
}

// --- list loading ---

/// Full project collection, newest first, as the list view for `params`.
/// A failed read yields an empty list and a notice.
async fn project_list(state: &AppState, params: &ListParams) -> ListResponse<Project> {
    let (items, notice) = match state.store.list_projects(&ProjectQuery::all()).await {
        Ok(items) => (items, None),
        Err(e) => {
            warn!(error = %e, "admin project list unavailable");
            (Vec::new(), Some(LOAD_PROJECTS_FAILED.to_string()))
        }
    };
    let listing = ProjectListing::new(items, PROJECTS_PER_PAGE).with_params(params);
    ListResponse {
        page: listing.current_page(),
        filters: listing.params(),
        categories: listing.categories(),
        notice,
    }
}

async fn experience_list(state: &AppState, params: &ListParams) -> ListResponse<Experience> {
    let (items, notice) = match state.store.list_experiences().await {
        Ok(items) => (items, None),
        Err(e) => {
            warn!(error = %e, "admin experience list unavailable");
            (Vec::new(), Some(LOAD_EXPERIENCES_FAILED.to_string()))
        }
    };
    let listing = ExperienceListing::new(items, EXPERIENCES_PER_PAGE).with_params(params);
    ListResponse {
        page: listing.current_page(),
        filters: listing.params(),
        categories: Vec::new(),
        notice,
    }
}

async fn after_project_mutation<D>(
    state: &AppState,
    params: &ListParams,
    message: impl Into<String>,
    data: Option<D>,
) -> Json<MutationResponse<D, Project>> {
    Json(MutationResponse {
        message: message.into(),
        data,
        listing: project_list(state, params).await,
    })
}

async fn after_experience_mutation<D>(
    state: &AppState,
    params: &ListParams,
    message: impl Into<String>,
    data: Option<D>,
) -> Json<MutationResponse<D, Experience>> {
    Json(MutationResponse {
        message: message.into(),
        data,
        listing: experience_list(state, params).await,
    })
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> ActionResult<Json<Dashboard>> {
    let total_projects = state.store.count_projects(&ProjectQuery::all()).await?;
    let public_projects = state.store.count_projects(&ProjectQuery::public()).await?;
    let recent_projects = state
        .store
        .list_projects(&ProjectQuery::all().limit(5))
        .await?;
    let visibility_rate = if total_projects == 0 {
        0
    } else {
        (public_projects as f64 / total_projects as f64 * 100.0).round() as i64
    };
    Ok(Json(Dashboard {
        total_projects,
        public_projects,
        visibility_rate,
        recent_projects,
    }))
}

#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<ListParams>,
) -> ActionResult<Json<ListResponse<Project>>> {
    Ok(Json(project_list(&state, &params).await))
}

#[instrument(skip(state))]
pub async fn list_experiences(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<ListParams>,
) -> ActionResult<Json<ListResponse<Experience>>> {
    Ok(Json(experience_list(&state, &params).await))
}

#[instrument(skip(state, session, form))]
pub async fn create_project(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Query(params): Query<ListParams>,
    FormJson(form): FormJson<NewProject>,
) -> ActionResult<(StatusCode, Json<MutationResponse<Project, Project>>)> {
    let admin = session.require()?;
    let _guard = state
        .inflight
        .begin(admin.id, "create_project")
        .ok_or(ActionError::InProgress)?;

    let project = projects::create_project(&state, &session, form).await?;
    let body = after_project_mutation(&state, &params, "Project created successfully", Some(project)).await;
    Ok((StatusCode::CREATED, body))
}

#[instrument(skip(state, session, patch))]
pub async fn update_project(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
    FormJson(patch): FormJson<ProjectPatch>,
) -> ActionResult<Json<MutationResponse<Project, Project>>> {
    let project = projects::update_project(&state, &session, id, patch).await?;
    Ok(after_project_mutation(&state, &params, "Project updated successfully", Some(project)).await)
}

#[instrument(skip(state, session))]
pub async fn delete_project(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(delete): Query<DeleteParams>,
    Query(params): Query<ListParams>,
) -> ActionResult<Json<MutationResponse<(), Project>>> {
    if !delete.confirm {
        return Err(ActionError::ConfirmationRequired);
    }
    projects::delete_project(&state, &session, id, delete.image_url.as_deref()).await?;
    Ok(after_project_mutation(&state, &params, "Project deleted successfully", None).await)
}

#[instrument(skip(state, session, body))]
pub async fn set_visibility(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
    FormJson(body): FormJson<VisibilityRequest>,
) -> ActionResult<Json<MutationResponse<Project, Project>>> {
    let project = projects::toggle_project_visibility(&state, &session, id, body.is_public).await?;
    let message = if body.is_public {
        "Project published successfully"
    } else {
        "Project hidden successfully"
    };
    Ok(after_project_mutation(&state, &params, message, Some(project)).await)
}

#[instrument(skip(state, session, body))]
pub async fn set_featured(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
    FormJson(body): FormJson<FeaturedRequest>,
) -> ActionResult<Json<MutationResponse<Project, Project>>> {
    let project = projects::toggle_project_featured(&state, &session, id, body.is_featured).await?;
    let message = if body.is_featured {
        "Project featured on the homepage"
    } else {
        "Project removed from the homepage"
    };
    Ok(after_project_mutation(&state, &params, message, Some(project)).await)
}

#[instrument(skip(state, session, form))]
pub async fn create_experience(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Query(params): Query<ListParams>,
    FormJson(form): FormJson<NewExperience>,
) -> ActionResult<(StatusCode, Json<MutationResponse<Experience, Experience>>)> {
    let admin = session.require()?;
    let _guard = state
        .inflight
        .begin(admin.id, "create_experience")
        .ok_or(ActionError::InProgress)?;

    let experience = experiences::create_experience(&state, &session, form).await?;
    let body =
        after_experience_mutation(&state, &params, "Experience created", Some(experience)).await;
    Ok((StatusCode::CREATED, body))
}

#[instrument(skip(state, session, patch))]
pub async fn update_experience(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
    FormJson(patch): FormJson<ExperiencePatch>,
) -> ActionResult<Json<MutationResponse<Experience, Experience>>> {
    let experience = experiences::update_experience(&state, &session, id, patch).await?;
    Ok(after_experience_mutation(&state, &params, "Experience updated", Some(experience)).await)
}

#[instrument(skip(state, session))]
pub async fn delete_experience(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<Uuid>,
    Query(delete): Query<DeleteParams>,
    Query(params): Query<ListParams>,
) -> ActionResult<Json<MutationResponse<(), Experience>>> {
    if !delete.confirm {
        return Err(ActionError::ConfirmationRequired);
    }
    experiences::delete_experience(&state, &session, id).await?;
    Ok(after_experience_mutation(&state, &params, "Experience deleted", None).await)
}

struct FilePart {
    file_name: String,
    content_type: String,
    body: Bytes,
}

fn multipart_error(field: &'static str, e: MultipartError) -> ActionError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ActionError::TooLarge("Upload is too large".into());
    }
    let mut errors = FieldErrors::default();
    errors.add(field, e.body_text());
    ActionError::Validation(errors)
}

async fn read_file(name: &'static str, field: Field<'_>) -> ActionResult<FilePart> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".into());
    let body = field.bytes().await.map_err(|e| multipart_error(name, e))?;
    Ok(FilePart {
        file_name,
        content_type,
        body,
    })
}

/// POST /admin/images (multipart, field `file`)
#[instrument(skip(state, session, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    mut mp: Multipart,
) -> ActionResult<(StatusCode, Json<UploadedImage>)> {
    let admin = session.require()?;
    let _guard = state
        .inflight
        .begin(admin.id, "upload_image")
        .ok_or(ActionError::InProgress)?;

    let mut file = None;
    while let Some(field) = mp.next_field().await.map_err(|e| multipart_error("file", e))? {
        if field.name() == Some("file") {
            file = Some(read_file("file", field).await?);
        }
    }
    let Some(file) = file.filter(|f| !f.body.is_empty()) else {
        let mut errors = FieldErrors::default();
        errors.add("file", "No file provided");
        return Err(errors.into());
    };
    if file.body.len() > MAX_IMAGE_BYTES {
        return Err(ActionError::TooLarge("File size must be less than 5MB".into()));
    }

    let uploaded = images::upload_image(
        &state,
        &session,
        ImageUpload {
            file_name: file.file_name,
            content_type: file.content_type,
            body: file.body,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(uploaded)))
}

/// POST /admin/email (multipart: recipient, subject, message, optional attachment)
#[instrument(skip(state, session, mp))]
pub async fn email(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    mut mp: Multipart,
) -> ActionResult<Json<EmailOutcome>> {
    let admin = session.require()?;
    let _guard = state
        .inflight
        .begin(admin.id, "send_email")
        .ok_or(ActionError::InProgress)?;

    let mut form = EmailForm {
        recipient: String::new(),
        subject: String::new(),
        message: String::new(),
        attachment: None,
    };
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| multipart_error("attachment", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "attachment" => {
                let file = read_file("attachment", field).await?;
                if file.body.len() > MAX_ATTACHMENT_BYTES {
                    return Err(ActionError::TooLarge("File size must be less than 10MB".into()));
                }
                if !file.body.is_empty() {
                    form.attachment = Some(Attachment {
                        file_name: file.file_name,
                        content_type: file.content_type,
                        body: file.body,
                    });
                }
            }
            "recipient" | "subject" | "message" => {
                let (slot, key) = match name.as_str() {
                    "recipient" => (&mut form.recipient, "recipient"),
                    "subject" => (&mut form.subject, "subject"),
                    _ => (&mut form.message, "message"),
                };
                *slot = field.text().await.map_err(|e| multipart_error(key, e))?;
            }
            _ => {}
        }
    }

    Ok(Json(send_email(&state, &session, form).await?))
}
