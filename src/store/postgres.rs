use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    ContentStore, Experience, ExperiencePatch, ExperienceRow, NewExperience, NewProject, Project,
    ProjectPatch, ProjectQuery, StoreError, StoreResult, User,
};

const PROJECT_COLUMNS: &str = "id, title, category, tags, image_url, description, year, role, \
                               is_public, is_featured, created_at";
const EXPERIENCE_COLUMNS: &str = "id, role, org, period, is_current, side, sort_order";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_project_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProjectQuery) {
    qb.push(" WHERE TRUE");
    if query.public_only {
        qb.push(" AND is_public = TRUE");
    }
    if let Some(category) = &query.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(featured) = query.featured {
        qb.push(" AND is_featured = ").push_bind(featured);
    }
    if let Some(id) = query.exclude_id {
        qb.push(" AND id <> ").push_bind(id);
    }
}

fn not_found(entity: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| match e {
        sqlx::Error::RowNotFound => StoreError::NotFound { entity },
        other => StoreError::from(other),
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<Vec<Project>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PROJECT_COLUMNS} FROM projects"));
        push_project_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC");
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        let rows = qb.build_query_as::<Project>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_projects(&self, query: &ProjectQuery) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects");
        push_project_filters(&mut qb, query);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Project"))
    }

    async fn insert_project(&self, p: NewProject) -> StoreResult<Project> {
        let row = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects
                (title, category, tags, image_url, description, year, role, is_public, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(p.title)
        .bind(p.category)
        .bind(p.tags)
        .bind(p.image_url)
        .bind(p.description)
        .bind(p.year)
        .bind(p.role)
        .bind(p.is_public)
        .bind(p.is_featured)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_project(&self, id: Uuid, patch: ProjectPatch) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects SET
                title       = COALESCE($2, title),
                category    = COALESCE($3, category),
                tags        = COALESCE($4, tags),
                image_url   = COALESCE($5, image_url),
                description = COALESCE($6, description),
                year        = COALESCE($7, year),
                role        = COALESCE($8, role),
                is_public   = COALESCE($9, is_public),
                is_featured = COALESCE($10, is_featured)
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.category)
        .bind(patch.tags)
        .bind(patch.image_url)
        .bind(patch.description)
        .bind(patch.year)
        .bind(patch.role)
        .bind(patch.is_public)
        .bind(patch.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Project"))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_experiences(&self) -> StoreResult<Vec<Experience>> {
        let rows = sqlx::query_as::<_, ExperienceRow>(&format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experiences ORDER BY sort_order ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Experience::from).collect())
    }

    async fn insert_experience(&self, e: NewExperience) -> StoreResult<Experience> {
        let row = sqlx::query_as::<_, ExperienceRow>(&format!(
            r#"
            INSERT INTO experiences (role, org, period, is_current, side, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EXPERIENCE_COLUMNS}
            "#
        ))
        .bind(e.role)
        .bind(e.org)
        .bind(e.period)
        .bind(e.is_current)
        .bind(e.side.as_str())
        .bind(e.sort_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_experience(
        &self,
        id: Uuid,
        patch: ExperiencePatch,
    ) -> StoreResult<Experience> {
        let row = sqlx::query_as::<_, ExperienceRow>(&format!(
            r#"
            UPDATE experiences SET
                role       = COALESCE($2, role),
                org        = COALESCE($3, org),
                period     = COALESCE($4, period),
                is_current = COALESCE($5, is_current),
                side       = COALESCE($6, side),
                sort_order = COALESCE($7, sort_order)
            WHERE id = $1
            RETURNING {EXPERIENCE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.role)
        .bind(patch.org)
        .bind(patch.period)
        .bind(patch.is_current)
        .bind(patch.side.map(|s| s.as_str()))
        .bind(patch.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Experience"))?;
        Ok(row.into())
    }

    async fn delete_experience(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM experiences WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}
