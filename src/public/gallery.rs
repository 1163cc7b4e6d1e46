//! Gallery view state: category tabs, grouped listing and the open project,
//! kept in sync with the `category` / `project` query parameters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Project;

pub const ALL: &str = "All";

/// Query string form of the gallery state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GalleryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl GalleryParams {
    pub fn parse(query: &str) -> Self {
        serde_urlencoded::from_str(query).unwrap_or_default()
    }

    /// Encoded query without the leading `?`; empty when nothing is set.
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GalleryView {
    /// Every category, empty groups omitted.
    Grouped { groups: Vec<CategoryGroup> },
    Single {
        category: String,
        projects: Vec<Project>,
    },
}

#[derive(Debug, Clone)]
pub struct Gallery {
    projects: Vec<Project>,
    category: String,
    open: Option<Uuid>,
}

impl Gallery {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            category: ALL.to_string(),
            open: None,
        }
    }

    /// Applies URL state once, on initial load. A `project` that is not a
    /// valid id or not in the collection opens nothing.
    pub fn load(projects: Vec<Project>, params: &GalleryParams) -> Self {
        let mut gallery = Self::new(projects);
        if let Some(category) = &params.category {
            gallery.select_category(category);
        }
        if let Some(id) = params.project.as_deref().and_then(|p| p.parse().ok()) {
            gallery.open(id);
        }
        gallery
    }

    /// "All" followed by each category in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut out = vec![ALL.to_string()];
        for p in &self.projects {
            if !out.contains(&p.category) {
                out.push(p.category.clone());
            }
        }
        out
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn select_category(&mut self, category: &str) {
        let category = category.trim();
        self.category = if category.is_empty() {
            ALL.to_string()
        } else {
            category.to_string()
        };
    }

    pub fn view(&self) -> GalleryView {
        if self.category == ALL {
            let groups = self
                .categories()
                .into_iter()
                .skip(1)
                .map(|category| CategoryGroup {
                    projects: self.in_category(&category),
                    category,
                })
                .filter(|g| !g.projects.is_empty())
                .collect();
            GalleryView::Grouped { groups }
        } else {
            GalleryView::Single {
                category: self.category.clone(),
                projects: self.in_category(&self.category),
            }
        }
    }

    fn in_category(&self, category: &str) -> Vec<Project> {
        self.projects
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    /// Returns false, leaving the state untouched, for unknown ids.
    pub fn open(&mut self, id: Uuid) -> bool {
        let known = self.projects.iter().any(|p| p.id == id);
        if known {
            self.open = Some(id);
        }
        known
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn selected(&self) -> Option<&Project> {
        let id = self.open?;
        self.projects.iter().find(|p| p.id == id)
    }

    /// URL state to write back after any change.
    pub fn params(&self) -> GalleryParams {
        GalleryParams {
            category: (self.category != ALL).then(|| self.category.clone()),
            project: self.open.map(|id| id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;

    fn project(title: &str, category: &str, age: i64) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: title.into(),
            category: category.into(),
            tags: vec![],
            image_url: String::new(),
            description: "gallery entry".into(),
            year: "2023".into(),
            role: "Designer".into(),
            is_public: true,
            is_featured: false,
            created_at: OffsetDateTime::now_utc() - Duration::days(age),
        }
    }

    fn sample() -> Vec<Project> {
        vec![
            project("Tee", "Shirts", 1),
            project("Poster", "Design", 2),
            project("Hoodie", "Shirts", 3),
            project("Mark", "Branding", 4),
        ]
    }

    #[test]
    fn categories_follow_first_appearance() {
        let g = Gallery::new(sample());
        assert_eq!(g.categories(), vec!["All", "Shirts", "Design", "Branding"]);
    }

    #[test]
    fn all_mode_groups_and_single_mode_filters() {
        let mut g = Gallery::new(sample());
        match g.view() {
            GalleryView::Grouped { groups } => {
                let names: Vec<_> = groups.iter().map(|g| g.category.as_str()).collect();
                assert_eq!(names, vec!["Shirts", "Design", "Branding"]);
                assert_eq!(groups[0].projects.len(), 2);
            }
            other => panic!("expected grouped view, got {other:?}"),
        }

        g.select_category("Shirts");
        match g.view() {
            GalleryView::Single { category, projects } => {
                assert_eq!(category, "Shirts");
                let titles: Vec<_> = projects.iter().map(|p| p.title.as_str()).collect();
                assert_eq!(titles, vec!["Tee", "Hoodie"]);
            }
            other => panic!("expected single view, got {other:?}"),
        }
    }

    #[test]
    fn url_state_opens_known_projects_only() {
        let projects = sample();
        let target = projects[1].id;

        let g = Gallery::load(
            projects.clone(),
            &GalleryParams::parse(&format!("category=Design&project={target}")),
        );
        assert_eq!(g.category(), "Design");
        assert_eq!(g.selected().map(|p| p.title.as_str()), Some("Poster"));

        let g = Gallery::load(projects.clone(), &GalleryParams::parse("project=not-a-uuid"));
        assert!(g.selected().is_none());

        let g = Gallery::load(
            projects,
            &GalleryParams::parse(&format!("project={}", Uuid::new_v4())),
        );
        assert!(g.selected().is_none());
    }

    #[test]
    fn open_and_close_write_back_query() {
        let projects = sample();
        let id = projects[0].id;
        let mut g = Gallery::new(projects);
        assert_eq!(g.params().to_query_string(), "");

        g.select_category("Shirts");
        assert!(g.open(id));
        assert_eq!(
            g.params().to_query_string(),
            format!("category=Shirts&project={id}")
        );

        g.close();
        assert_eq!(g.params().to_query_string(), "category=Shirts");
        assert!(!g.open(Uuid::new_v4()));
        assert!(g.selected().is_none());
    }
}
