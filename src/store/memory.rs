use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ContentStore, Experience, ExperiencePatch, NewExperience, NewProject, Project, ProjectPatch,
    ProjectQuery, StoreError, StoreResult, User,
};

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    experiences: Vec<Experience>,
    users: Vec<User>,
    fail_reads: bool,
}

/// Process-local store used by tests and `AppState::fake()`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail with a backend error.
    pub async fn fail_reads(&self, fail: bool) {
        self.tables.write().await.fail_reads = fail;
    }

    /// Inserts a fully formed project, keeping its id and timestamp.
    pub async fn seed_project(&self, project: Project) {
        self.tables.write().await.projects.push(project);
    }
}

fn unavailable() -> StoreError {
    StoreError::Backend("backend unavailable".into())
}

fn sorted_recent_first(mut projects: Vec<Project>) -> Vec<Project> {
    // newest insertion wins ties on identical timestamps
    projects.reverse();
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    projects
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<Project>> {
        let t = self.tables.read().await;
        if t.fail_reads {
            return Err(unavailable());
        }
        let matching = t.projects.iter().filter(|p| query.matches(p)).cloned().collect();
        let mut rows = sorted_recent_first(matching);
        if let Some(limit) = query.limit {
            rows.truncate(limit.max(0) as usize);
        }
        Ok(rows)
    }

    async fn count_projects(&self, query: &ProjectQuery) -> StoreResult<i64> {
        let t = self.tables.read().await;
        if t.fail_reads {
            return Err(unavailable());
        }
        Ok(t.projects.iter().filter(|p| query.matches(p)).count() as i64)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Project> {
        let t = self.tables.read().await;
        if t.fail_reads {
            return Err(unavailable());
        }
        t.projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "Project" })
    }

    async fn insert_project(&self, p: NewProject) -> StoreResult<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            title: p.title,
            category: p.category,
            tags: p.tags,
            image_url: p.image_url,
            description: p.description,
            year: p.year,
            role: p.role,
            is_public: p.is_public,
            is_featured: p.is_featured,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tables.write().await.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        let mut t = self.tables.write().await;
        let project = t
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound { entity: "Project" })?;
        patch.apply(project);
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.projects.retain(|p| p.id != id);
        Ok(())
    }

    async fn list_experiences(&self) -> StoreResult<Vec<Experience>> {
        let t = self.tables.read().await;
        if t.fail_reads {
            return Err(unavailable());
        }
        let mut rows = t.experiences.clone();
        rows.sort_by_key(|e| e.sort_order);
        Ok(rows)
    }

    async fn insert_experience(&self, e: NewExperience) -> StoreResult<Experience> {
        let experience = Experience {
            id: Uuid::new_v4(),
            role: e.role,
            org: e.org,
            period: e.period,
            is_current: e.is_current,
            side: e.side,
            sort_order: e.sort_order,
        };
        self.tables.write().await.experiences.push(experience.clone());
        Ok(experience)
    }

    async fn update_experience(
        &self,
        id: Uuid,
        patch: ExperiencePatch,
    ) -> StoreResult<Experience> {
        let mut t = self.tables.write().await;
        let experience = t
            .experiences
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound { entity: "Experience" })?;
        patch.apply(experience);
        Ok(experience.clone())
    }

    async fn delete_experience(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.experiences.retain(|e| e.id != id);
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Backend(format!("user {email} already exists")));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }
}
