use serde::Serialize;
use tracing::{instrument, warn};

use crate::{
    actions::FEATURED_LIMIT,
    store::{ContentStore, Experience, Project, ProjectQuery, StoreResult, HOME_CATEGORIES},
};

pub const LOAD_HOME_FAILED: &str = "Failed to load projects";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub design: i64,
    pub branding: i64,
    pub shirts: i64,
    pub total: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct HomeSummary {
    pub projects: Vec<Project>,
    /// False when `projects` is the per-category fallback.
    pub featured: bool,
    pub counts: CategoryCounts,
    pub experiences: Vec<Experience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Featured public projects, or one recent project per home category when
/// nothing is featured.
pub async fn home_projects(store: &dyn ContentStore) -> StoreResult<(Vec<Project>, bool)> {
    let featured = store
        .list_projects(&ProjectQuery::public().featured(true).limit(FEATURED_LIMIT))
        .await?;
    if !featured.is_empty() {
        return Ok((featured, true));
    }

    let mut fallback = Vec::with_capacity(HOME_CATEGORIES.len());
    for category in HOME_CATEGORIES {
        let mut latest = store
            .list_projects(&ProjectQuery::public().category(category).limit(1))
            .await?;
        fallback.append(&mut latest);
    }
    Ok((fallback, false))
}

pub async fn category_counts(store: &dyn ContentStore) -> StoreResult<CategoryCounts> {
    let mut counts = [0i64; 3];
    for (slot, category) in counts.iter_mut().zip(["Design", "Branding", "Shirts"]) {
        *slot = store
            .count_projects(&ProjectQuery::public().category(category))
            .await?;
    }
    let [design, branding, shirts] = counts;
    Ok(CategoryCounts {
        design,
        branding,
        shirts,
        total: design + branding + shirts,
    })
}

async fn load(store: &dyn ContentStore) -> StoreResult<HomeSummary> {
    let (projects, featured) = home_projects(store).await?;
    Ok(HomeSummary {
        projects,
        featured,
        counts: category_counts(store).await?,
        experiences: store.list_experiences().await?,
        notice: None,
    })
}

/// Never fails: a backend error becomes an empty summary with a notice.
#[instrument(skip(store))]
pub async fn home_summary(store: &dyn ContentStore) -> HomeSummary {
    match load(store).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "home summary unavailable");
            HomeSummary {
                notice: Some(LOAD_HOME_FAILED.into()),
                ..HomeSummary::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use super::*;
    use crate::store::MemoryStore;

    fn project(title: &str, category: &str, age_days: i64, public: bool, featured: bool) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: title.into(),
            category: category.into(),
            tags: vec!["tag".into()],
            image_url: String::new(),
            description: "long enough description".into(),
            year: "2024".into(),
            role: "Designer".into(),
            is_public: public,
            is_featured: featured,
            created_at: OffsetDateTime::now_utc() - Duration::days(age_days),
        }
    }

    fn titles(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn featured_public_projects_most_recent_first() {
        let store = MemoryStore::new();
        store.seed_project(project("A", "Design", 4, true, true)).await;
        store.seed_project(project("B", "Shirts", 3, true, true)).await;
        store.seed_project(project("C", "Branding", 2, true, true)).await;
        store.seed_project(project("D", "Design", 1, true, false)).await;
        store.seed_project(project("Hidden", "Design", 0, false, true)).await;

        let summary = home_summary(&store).await;
        assert!(summary.featured);
        assert_eq!(titles(&summary.projects), vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn falls_back_to_latest_per_category_in_fixed_order() {
        let store = MemoryStore::new();
        store.seed_project(project("Old design", "Design", 9, true, false)).await;
        store.seed_project(project("New design", "Design", 1, true, false)).await;
        store.seed_project(project("Brand", "Branding", 2, true, false)).await;
        store.seed_project(project("Tee", "Shirts", 5, true, false)).await;
        store.seed_project(project("Secret tee", "Shirts", 0, false, false)).await;

        let summary = home_summary(&store).await;
        assert!(!summary.featured);
        assert_eq!(titles(&summary.projects), vec!["New design", "Tee", "Brand"]);
    }

    #[tokio::test]
    async fn fallback_skips_empty_categories() {
        let store = MemoryStore::new();
        store.seed_project(project("Brand", "Branding", 2, true, false)).await;

        let summary = home_summary(&store).await;
        assert_eq!(titles(&summary.projects), vec!["Brand"]);
    }

    #[tokio::test]
    async fn counts_cover_public_projects_only() {
        let store = MemoryStore::new();
        store.seed_project(project("a", "Design", 1, true, false)).await;
        store.seed_project(project("b", "Design", 1, true, false)).await;
        store.seed_project(project("c", "Shirts", 1, true, false)).await;
        store.seed_project(project("d", "Branding", 1, false, false)).await;
        store.seed_project(project("e", "Illustration", 1, true, false)).await;

        let counts = category_counts(&store).await.unwrap();
        assert_eq!(
            counts,
            CategoryCounts {
                design: 2,
                branding: 0,
                shirts: 1,
                total: 3,
            }
        );
    }

    #[tokio::test]
    async fn read_failure_is_empty_with_notice() {
        let store = MemoryStore::new();
        store.seed_project(project("a", "Design", 1, true, true)).await;
        store.fail_reads(true).await;

        let summary = home_summary(&store).await;
        assert!(summary.projects.is_empty());
        assert_eq!(summary.notice.as_deref(), Some(LOAD_HOME_FAILED));
    }
}
