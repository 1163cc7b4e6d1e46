//! Search, category filter and pagination over a fully fetched collection.

use serde::{Deserialize, Serialize};

use crate::store::{Experience, Project};

pub const ALL: &str = "All";
pub const PROJECTS_PER_PAGE: usize = 10;
pub const EXPERIENCES_PER_PAGE: usize = 10;

/// Step relative to `page`, as sent by the pager buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageNav {
    Next,
    Previous,
}

/// Query string state of an admin list view.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav: Option<PageNav>,
}

pub trait Listable: Clone {
    /// `needle` is already lowercased and non-empty.
    fn matches_search(&self, needle: &str) -> bool;

    fn category(&self) -> Option<&str> {
        None
    }
}

impl Listable for Project {
    fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }
}

impl Listable for Experience {
    fn matches_search(&self, needle: &str) -> bool {
        self.role.to_lowercase().contains(needle) || self.org.to_lowercase().contains(needle)
    }
}

pub fn matches_category<T: Listable>(item: &T, category: &str) -> bool {
    category.is_empty() || category == ALL || item.category() == Some(category)
}

pub fn matches_search<T: Listable>(item: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    needle.is_empty() || item.matches_search(&needle)
}

/// `ceil(n / per_page)`, never less than one so the first page always renders.
pub fn total_pages(n: usize, per_page: usize) -> usize {
    n.div_ceil(per_page.max(1)).max(1)
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let total_pages = total_pages(items.len(), per_page);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    Page {
        items: items.get(start..end).unwrap_or_default().to_vec(),
        page,
        per_page,
        total_items: items.len(),
        total_pages,
        has_previous: page > 1,
        has_next: page < total_pages,
    }
}

/// List view state: the source collection plus search, category and page.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    items: Vec<T>,
    search: String,
    category: String,
    page: usize,
    per_page: usize,
}

pub type ProjectListing = Listing<Project>;
pub type ExperienceListing = Listing<Experience>;

impl<T: Listable> Listing<T> {
    pub fn new(items: Vec<T>, per_page: usize) -> Self {
        Self {
            items,
            search: String::new(),
            category: ALL.to_string(),
            page: 1,
            per_page: per_page.max(1),
        }
    }

    /// Filters from the query string first, then the requested page, then
    /// any pager step from there.
    pub fn with_params(mut self, params: &ListParams) -> Self {
        if let Some(search) = &params.search {
            self.set_search(search);
        }
        if let Some(category) = &params.category {
            self.set_category(category);
        }
        if let Some(page) = params.page {
            self.set_page(page);
        }
        match params.nav {
            Some(PageNav::Next) => self.next(),
            Some(PageNav::Previous) => self.previous(),
            None => {}
        }
        self
    }

    pub fn params(&self) -> ListParams {
        ListParams {
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            category: (self.category != ALL).then(|| self.category.clone()),
            page: Some(self.page),
            nav: None,
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.page = 1;
    }

    pub fn set_category(&mut self, category: &str) {
        self.category = if category.trim().is_empty() {
            ALL.to_string()
        } else {
            category.to_string()
        };
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    pub fn next(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn previous(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    pub fn filtered(&self) -> Vec<T> {
        self.items
            .iter()
            .filter(|item| matches_search(*item, &self.search))
            .filter(|item| matches_category(*item, &self.category))
            .cloned()
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.per_page)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn current_page(&self) -> Page<T> {
        paginate(&self.filtered(), self.page, self.per_page)
    }

    /// "All" followed by every distinct category in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut out = vec![ALL.to_string()];
        for c in self.items.iter().filter_map(Listable::category) {
            if !out.iter().any(|seen| seen == c) {
                out.push(c.to_string());
            }
        }
        out
    }
}
