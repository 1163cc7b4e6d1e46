use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use time::OffsetDateTime;
use tracing::debug;

pub const HOME: &str = "/";
pub const GALLERY: &str = "/allprojects";
pub const ADMIN: &str = "/admin";
pub const ADMIN_PROJECTS: &str = "/admin/manage-projects";
pub const ADMIN_EXPERIENCES: &str = "/admin/manage-experiences";

/// Paths that render project data.
pub const PROJECT_PATHS: &[&str] = &[HOME, GALLERY, ADMIN, ADMIN_PROJECTS];
/// Paths that render experience data.
pub const EXPERIENCE_PATHS: &[&str] = &[HOME, ADMIN_EXPERIENCES];

/// Per-path content generations. Bumping a path marks every earlier
/// response for it as stale. Tags also carry the process start time so a
/// restart never reuses a tag issued for older content.
#[derive(Clone)]
pub struct Revalidator {
    epoch: i64,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl Default for Revalidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Revalidator {
    pub fn new() -> Self {
        Self {
            epoch: OffsetDateTime::now_utc().unix_timestamp(),
            generations: Arc::default(),
        }
    }

    pub fn revalidate(&self, paths: &[&str]) {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        for path in paths {
            *generations.entry((*path).to_string()).or_insert(0) += 1;
        }
        debug!(?paths, "content revalidated");
    }

    pub fn generation(&self, path: &str) -> u64 {
        self.generations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Weak entity tag for the current generation of `path`.
    pub fn etag(&self, path: &str) -> String {
        format!(
            "W/\"{}-{:x}-{}\"",
            path.trim_start_matches('/'),
            self.epoch,
            self.generation(path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revalidate_bumps_only_listed_paths() {
        let r = Revalidator::new();
        let home_before = r.etag(HOME);
        r.revalidate(EXPERIENCE_PATHS);
        assert_ne!(r.etag(HOME), home_before);
        assert_eq!(r.generation(ADMIN_EXPERIENCES), 1);
        assert_eq!(r.generation(GALLERY), 0);
    }

    #[test]
    fn clones_share_generations() {
        let r = Revalidator::new();
        let other = r.clone();
        other.revalidate(&[GALLERY]);
        assert_eq!(r.generation(GALLERY), 1);
    }
}
