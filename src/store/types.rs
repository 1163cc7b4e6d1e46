use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Categories the home page always summarizes, in display order.
pub const HOME_CATEGORIES: [&str; 3] = ["Design", "Shirts", "Branding"];

/// Project record as stored in the `projects` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub description: String,
    pub year: String,
    pub role: String,
    pub is_public: bool,
    pub is_featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields required to insert a project; id and timestamp come from the backend.
/// Missing fields deserialize empty so validation reports them per field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewProject {
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: String,
    pub description: String,
    pub year: String,
    pub role: String,
    pub is_public: bool,
    pub is_featured: bool,
}

impl Default for NewProject {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: String::new(),
            tags: Vec::new(),
            image_url: String::new(),
            description: String::new(),
            year: String::new(),
            role: String::new(),
            is_public: true,
            is_featured: false,
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub year: Option<String>,
    pub role: Option<String>,
    pub is_public: Option<bool>,
    pub is_featured: Option<bool>,
}

impl ProjectPatch {
    pub fn visibility(is_public: bool) -> Self {
        Self {
            is_public: Some(is_public),
            ..Self::default()
        }
    }

    pub fn featured(is_featured: bool) -> Self {
        Self {
            is_featured: Some(is_featured),
            ..Self::default()
        }
    }

    pub fn apply(self, p: &mut Project) {
        if let Some(v) = self.title {
            p.title = v;
        }
        if let Some(v) = self.category {
            p.category = v;
        }
        if let Some(v) = self.tags {
            p.tags = v;
        }
        if let Some(v) = self.image_url {
            p.image_url = v;
        }
        if let Some(v) = self.description {
            p.description = v;
        }
        if let Some(v) = self.year {
            p.year = v;
        }
        if let Some(v) = self.role {
            p.role = v;
        }
        if let Some(v) = self.is_public {
            p.is_public = v;
        }
        if let Some(v) = self.is_featured {
            p.is_featured = v;
        }
    }
}

/// Filters understood by `ContentStore::list_projects` / `count_projects`.
/// Results are always ordered most-recent-first.
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub public_only: bool,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub exclude_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl ProjectQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn public() -> Self {
        Self {
            public_only: true,
            ..Self::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn excluding(mut self, id: Uuid) -> Self {
        self.exclude_id = Some(id);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, p: &Project) -> bool {
        (!self.public_only || p.is_public)
            && self.category.as_deref().map_or(true, |c| p.category == c)
            && self.featured.map_or(true, |f| p.is_featured == f)
            && self.exclude_id.map_or(true, |id| p.id != id)
    }
}

/// Timeline lane hint for an experience entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub role: String,
    pub org: String,
    pub period: String,
    pub is_current: bool,
    pub side: Side,
    pub sort_order: i32,
}

/// Raw `experiences` row; `side` is stored as text.
#[derive(Debug, FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub role: String,
    pub org: String,
    pub period: String,
    pub is_current: bool,
    pub side: String,
    pub sort_order: i32,
}

impl From<ExperienceRow> for Experience {
    fn from(r: ExperienceRow) -> Self {
        Self {
            id: r.id,
            role: r.role,
            org: r.org,
            period: r.period,
            is_current: r.is_current,
            side: r.side.parse().unwrap_or_default(),
            sort_order: r.sort_order,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewExperience {
    pub role: String,
    pub org: String,
    pub period: String,
    pub is_current: bool,
    pub side: Side,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperiencePatch {
    pub role: Option<String>,
    pub org: Option<String>,
    pub period: Option<String>,
    pub is_current: Option<bool>,
    pub side: Option<Side>,
    pub sort_order: Option<i32>,
}

impl ExperiencePatch {
    pub fn apply(self, e: &mut Experience) {
        if let Some(v) = self.role {
            e.role = v;
        }
        if let Some(v) = self.org {
            e.org = v;
        }
        if let Some(v) = self.period {
            e.period = v;
        }
        if let Some(v) = self.is_current {
            e.is_current = v;
        }
        if let Some(v) = self.side {
            e.side = v;
        }
        if let Some(v) = self.sort_order {
            e.sort_order = v;
        }
    }
}

/// Admin account record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2, never exposed
    pub created_at: OffsetDateTime,
}
