use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{ActionError, ActionResult, FEATURED_LIMIT};
use crate::{
    auth::Session,
    revalidate::PROJECT_PATHS,
    state::AppState,
    store::{NewProject, Project, ProjectPatch, ProjectQuery},
    validation::{parse_tags, validate_new_project, validate_project_patch},
};

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.iter().flat_map(|t| parse_tags(t)).collect()
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Stored text is what was validated: surrounding whitespace never persists.
fn tidy_form(form: &mut NewProject) {
    form.tags = normalize_tags(std::mem::take(&mut form.tags));
    for field in [
        &mut form.title,
        &mut form.category,
        &mut form.image_url,
        &mut form.description,
        &mut form.year,
        &mut form.role,
    ] {
        trim_in_place(field);
    }
}

fn tidy_patch(patch: &mut ProjectPatch) {
    patch.tags = patch.tags.take().map(normalize_tags);
    for field in [
        &mut patch.title,
        &mut patch.category,
        &mut patch.image_url,
        &mut patch.description,
        &mut patch.year,
        &mut patch.role,
    ]
    .into_iter()
    .flatten()
    {
        trim_in_place(field);
    }
}

/// Rejects when `FEATURED_LIMIT` other projects are already featured.
///
/// Check-then-set: two sessions racing here can both pass the count.
async fn ensure_featured_slot(state: &AppState, target: Option<Uuid>) -> ActionResult<()> {
    let mut query = ProjectQuery::all().featured(true);
    if let Some(id) = target {
        query = query.excluding(id);
    }
    let count = state.store.count_projects(&query).await?;
    if count >= FEATURED_LIMIT {
        warn!(count, "featured limit reached");
        return Err(ActionError::FeaturedLimit);
    }
    Ok(())
}

#[instrument(skip(state, session, form), fields(title = %form.title))]
pub async fn create_project(
    state: &AppState,
    session: &Session,
    mut form: NewProject,
) -> ActionResult<Project> {
    let admin = session.require()?;
    tidy_form(&mut form);
    validate_new_project(&form)?;
    if form.is_featured {
        ensure_featured_slot(state, None).await?;
    }

    let project = state.store.insert_project(form).await?;
    state.revalidator.revalidate(PROJECT_PATHS);
    info!(project_id = %project.id, admin_id = %admin.id, "project created");
    Ok(project)
}

#[instrument(skip(state, session, patch))]
pub async fn update_project(
    state: &AppState,
    session: &Session,
    id: Uuid,
    mut patch: ProjectPatch,
) -> ActionResult<Project> {
    let admin = session.require()?;
    tidy_patch(&mut patch);
    validate_project_patch(&patch)?;
    if patch.is_featured == Some(true) {
        ensure_featured_slot(state, Some(id)).await?;
    }

    let project = state.store.update_project(id, patch).await?;
    state.revalidator.revalidate(PROJECT_PATHS);
    info!(project_id = %project.id, admin_id = %admin.id, "project updated");
    Ok(project)
}

/// Deletes the record and, when `image_url` points into our bucket, the
/// stored image. Image removal failures are logged and otherwise ignored.
#[instrument(skip(state, session))]
pub async fn delete_project(
    state: &AppState,
    session: &Session,
    id: Uuid,
    image_url: Option<&str>,
) -> ActionResult<()> {
    let admin = session.require()?;
    let existing = state.store.get_project(id).await?;

    // only the image this record points at may be removed
    let owned = image_url.filter(|url| *url == existing.image_url);
    if image_url.is_some() && owned.is_none() {
        warn!(project_id = %id, "image url does not belong to project, left in storage");
    }
    if let Some(key) = owned.and_then(|url| state.storage.managed_key(url)) {
        if let Err(e) = state.storage.delete_object(&key).await {
            warn!(error = %e, %key, "stored image not removed");
        }
    }

    state.store.delete_project(id).await?;
    state.revalidator.revalidate(PROJECT_PATHS);
    info!(project_id = %id, admin_id = %admin.id, "project deleted");
    Ok(())
}

#[instrument(skip(state, session))]
pub async fn toggle_project_visibility(
    state: &AppState,
    session: &Session,
    id: Uuid,
    is_public: bool,
) -> ActionResult<Project> {
    let admin = session.require()?;
    let project = state
        .store
        .update_project(id, ProjectPatch::visibility(is_public))
        .await?;
    state.revalidator.revalidate(PROJECT_PATHS);
    info!(project_id = %id, admin_id = %admin.id, is_public, "project visibility changed");
    Ok(project)
}

#[instrument(skip(state, session))]
pub async fn toggle_project_featured(
    state: &AppState,
    session: &Session,
    id: Uuid,
    is_featured: bool,
) -> ActionResult<Project> {
    let admin = session.require()?;
    if is_featured {
        ensure_featured_slot(state, Some(id)).await?;
    }
    let project = state
        .store
        .update_project(id, ProjectPatch::featured(is_featured))
        .await?;
    state.revalidator.revalidate(PROJECT_PATHS);
    info!(project_id = %id, admin_id = %admin.id, is_featured, "project featured flag changed");
    Ok(project)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        auth::AdminIdentity,
        revalidate::{GALLERY, HOME},
        storage::fake::FakeStorage,
        store::{ContentStore, MemoryStore},
    };

    fn form(title: &str, category: &str) -> NewProject {
        NewProject {
            title: title.into(),
            category: category.into(),
            tags: vec!["logo, print".into()],
            image_url: String::new(),
            description: "A project description that is long enough".into(),
            year: "2023".into(),
            role: "Designer".into(),
            is_public: true,
            is_featured: false,
        }
    }

    fn admin() -> Session {
        Session::admin(AdminIdentity {
            id: Uuid::new_v4(),
            email: "admin@portfolio.test".into(),
        })
    }

    struct Harness {
        state: AppState,
        store: Arc<MemoryStore>,
        storage: Arc<FakeStorage>,
    }

    fn harness_with(storage: FakeStorage) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(storage);
        let state = AppState::fake_with(store.clone(), storage.clone());
        Harness {
            state,
            store,
            storage,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeStorage::default())
    }

    #[tokio::test]
    async fn anonymous_mutations_require_login() {
        let h = harness();
        let anon = Session::anonymous();

        let err = create_project(&h.state, &anon, form("A", "Design")).await.unwrap_err();
        assert!(matches!(err, ActionError::LoginRequired));
        let err = delete_project(&h.state, &anon, Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, ActionError::LoginRequired));
        assert!(h.store.list_projects(&ProjectQuery::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_splits_tags_and_signals_staleness() {
        let h = harness();
        let before = h.state.revalidator.generation(GALLERY);

        let p = create_project(&h.state, &admin(), form("A", "Design")).await.unwrap();

        assert_eq!(p.tags, vec!["logo", "print"]);
        assert!(h.state.revalidator.generation(GALLERY) > before);
        assert!(h.state.revalidator.generation(HOME) > 0);
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_store() {
        let h = harness();
        let mut bad = form("A", "Design");
        bad.year = "twenty".into();

        let err = create_project(&h.state, &admin(), bad).await.unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
        assert_eq!(h.store.count_projects(&ProjectQuery::all()).await.unwrap(), 0);
        assert_eq!(h.state.revalidator.generation(GALLERY), 0);
    }

    #[tokio::test]
    async fn fourth_featured_project_is_rejected() {
        let h = harness();
        let session = admin();
        let mut ids = Vec::new();
        for i in 0..4 {
            let p = create_project(&h.state, &session, form(&format!("P{i}"), "Design"))
                .await
                .unwrap();
            ids.push(p.id);
        }
        for id in &ids[..3] {
            toggle_project_featured(&h.state, &session, *id, true).await.unwrap();
        }

        let err = toggle_project_featured(&h.state, &session, ids[3], true)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::FeaturedLimit));
        assert!(!h.store.get_project(ids[3]).await.unwrap().is_featured);

        // re-featuring one of the three is not blocked by its own slot
        toggle_project_featured(&h.state, &session, ids[0], true).await.unwrap();
        // freeing a slot makes room again
        toggle_project_featured(&h.state, &session, ids[0], false).await.unwrap();
        toggle_project_featured(&h.state, &session, ids[3], true).await.unwrap();

        let featured = h
            .store
            .count_projects(&ProjectQuery::all().featured(true))
            .await
            .unwrap();
        assert_eq!(featured, 3);
    }

    #[tokio::test]
    async fn featured_cap_holds_through_update_and_create() {
        let h = harness();
        let session = admin();
        for i in 0..3 {
            let mut f = form(&format!("F{i}"), "Shirts");
            f.is_featured = true;
            create_project(&h.state, &session, f).await.unwrap();
        }
        let mut extra = form("F3", "Shirts");
        extra.is_featured = true;
        assert!(matches!(
            create_project(&h.state, &session, extra).await.unwrap_err(),
            ActionError::FeaturedLimit
        ));

        let plain = create_project(&h.state, &session, form("Plain", "Design")).await.unwrap();
        let err = update_project(&h.state, &session, plain.id, ProjectPatch::featured(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::FeaturedLimit));
    }

    #[tokio::test]
    async fn toggling_visibility_touches_only_the_target() {
        let h = harness();
        let session = admin();
        let a = create_project(&h.state, &session, form("A", "Design")).await.unwrap();
        let b = create_project(&h.state, &session, form("B", "Shirts")).await.unwrap();

        toggle_project_visibility(&h.state, &session, a.id, false).await.unwrap();

        let a2 = h.store.get_project(a.id).await.unwrap();
        let b2 = h.store.get_project(b.id).await.unwrap();
        assert!(!a2.is_public);
        assert_eq!(Project { is_public: true, ..a2 }, a);
        assert_eq!(b2, b);
    }

    #[tokio::test]
    async fn update_merges_partial_fields() {
        let h = harness();
        let session = admin();
        let p = create_project(&h.state, &session, form("Old", "Design")).await.unwrap();
        let patch = ProjectPatch {
            title: Some("New".into()),
            ..ProjectPatch::default()
        };
        let updated = update_project(&h.state, &session, p.id, patch).await.unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, p.description);

        let err = update_project(&h.state, &session, Uuid::new_v4(), ProjectPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Project not found");
    }

    #[tokio::test]
    async fn delete_removes_managed_image_first() {
        let h = harness();
        let session = admin();
        let mut f = form("A", "Design");
        f.image_url = "https://storage.test/project-images/abc-1.png".into();
        let p = create_project(&h.state, &session, f).await.unwrap();

        delete_project(&h.state, &session, p.id, Some(&p.image_url)).await.unwrap();

        assert_eq!(*h.storage.deletes.lock().unwrap(), vec!["abc-1.png".to_string()]);
        assert!(h.store.list_projects(&ProjectQuery::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_with_foreign_image_skips_storage() {
        let h = harness();
        let session = admin();
        let mut f = form("A", "Design");
        f.image_url = "https://cdn.example.com/abc-1.png".into();
        let p = create_project(&h.state, &session, f).await.unwrap();

        delete_project(&h.state, &session, p.id, Some(&p.image_url)).await.unwrap();

        assert!(h.storage.deletes.lock().unwrap().is_empty());
        assert!(h.store.get_project(p.id).await.is_err());
    }

    #[tokio::test]
    async fn failed_image_removal_does_not_block_delete() {
        let h = harness_with(FakeStorage {
            fail_deletes: true,
            ..FakeStorage::default()
        });
        let session = admin();
        let mut f = form("A", "Design");
        f.image_url = "https://storage.test/project-images/abc-1.png".into();
        let p = create_project(&h.state, &session, f).await.unwrap();

        delete_project(&h.state, &session, p.id, Some(&p.image_url)).await.unwrap();

        assert_eq!(h.storage.deletes.lock().unwrap().len(), 1);
        assert!(h.store.get_project(p.id).await.is_err());
    }

    #[tokio::test]
    async fn delete_only_removes_the_projects_own_image() {
        let h = harness();
        let session = admin();
        let mut keep = form("Keep", "Design");
        keep.image_url = "https://storage.test/project-images/keep-1.png".into();
        let keep = create_project(&h.state, &session, keep).await.unwrap();
        let mut gone = form("Gone", "Design");
        gone.image_url = "https://storage.test/project-images/gone-1.png".into();
        let gone = create_project(&h.state, &session, gone).await.unwrap();

        delete_project(&h.state, &session, gone.id, Some(&keep.image_url)).await.unwrap();

        assert!(h.storage.deletes.lock().unwrap().is_empty());
        assert!(h.store.get_project(gone.id).await.is_err());
        assert_eq!(h.store.get_project(keep.id).await.unwrap().image_url, keep.image_url);

        let err = delete_project(&h.state, &session, gone.id, None).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound("Project")));
    }

    #[tokio::test]
    async fn text_fields_are_stored_trimmed() {
        let h = harness();
        let session = admin();
        let mut f = form("  Poster  ", "Design ");
        f.year = " 2024 ".into();
        let p = create_project(&h.state, &session, f).await.unwrap();
        assert_eq!(p.title, "Poster");
        assert_eq!(p.category, "Design");
        assert_eq!(p.year, "2024");

        let patch = ProjectPatch {
            year: Some("\t1999\n".into()),
            ..ProjectPatch::default()
        };
        let updated = update_project(&h.state, &session, p.id, patch).await.unwrap();
        assert_eq!(updated.year, "1999");

        let mut bad = form("B", "Design");
        bad.year = " 20245 ".into();
        assert!(matches!(
            create_project(&h.state, &session, bad).await.unwrap_err(),
            ActionError::Validation(_)
        ));
    }
}
