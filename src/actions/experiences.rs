use tracing::{info, instrument};
use uuid::Uuid;

use super::ActionResult;
use crate::{
    auth::Session,
    revalidate::EXPERIENCE_PATHS,
    state::AppState,
    store::{Experience, ExperiencePatch, NewExperience},
    validation::{validate_experience_patch, validate_new_experience},
};

#[instrument(skip(state, session, form))]
pub async fn create_experience(
    state: &AppState,
    session: &Session,
    form: NewExperience,
) -> ActionResult<Experience> {
    let admin = session.require()?;
    validate_new_experience(&form)?;
    let experience = state.store.insert_experience(form).await?;
    state.revalidator.revalidate(EXPERIENCE_PATHS);
    info!(experience_id = %experience.id, admin_id = %admin.id, "experience created");
    Ok(experience)
}

#[instrument(skip(state, session, patch))]
pub async fn update_experience(
    state: &AppState,
    session: &Session,
    id: Uuid,
    patch: ExperiencePatch,
) -> ActionResult<Experience> {
    let admin = session.require()?;
    validate_experience_patch(&patch)?;
    let experience = state.store.update_experience(id, patch).await?;
    state.revalidator.revalidate(EXPERIENCE_PATHS);
    info!(experience_id = %id, admin_id = %admin.id, "experience updated");
    Ok(experience)
}

/// Remaining entries keep their `sort_order`; gaps are fine.
#[instrument(skip(state, session))]
pub async fn delete_experience(state: &AppState, session: &Session, id: Uuid) -> ActionResult<()> {
    let admin = session.require()?;
    state.store.delete_experience(id).await?;
    state.revalidator.revalidate(EXPERIENCE_PATHS);
    info!(experience_id = %id, admin_id = %admin.id, "experience deleted");
    Ok(())
}
