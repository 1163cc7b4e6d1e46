use std::time::{Duration, Instant};

use serde::Serialize;

use crate::store::Project;

/// How long a "copied" acknowledgment stays visible.
pub const COPIED_FOR: Duration = Duration::from_secs(2);

/// Platform clipboard. Writes may fail (permissions, headless sessions).
pub trait Clipboard {
    fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

pub fn share_url(site_url: &str, project: &Project) -> String {
    format!(
        "{}/allprojects?project={}",
        site_url.trim_end_matches('/'),
        project.id
    )
}

/// Serializable part of the modal, sent with detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub share_url: String,
    pub contact_email: String,
}

/// Open project modal with its copy actions and fullscreen flag.
#[derive(Debug)]
pub struct DetailModal {
    detail: ProjectDetail,
    link_copied_at: Option<Instant>,
    email_copied_at: Option<Instant>,
    fullscreen: bool,
}

impl DetailModal {
    pub fn new(project: Project, site_url: &str, contact_email: &str) -> Self {
        Self {
            detail: ProjectDetail {
                share_url: share_url(site_url, &project),
                contact_email: contact_email.to_string(),
                project,
            },
            link_copied_at: None,
            email_copied_at: None,
            fullscreen: false,
        }
    }

    pub fn detail(&self) -> &ProjectDetail {
        &self.detail
    }

    pub fn into_detail(self) -> ProjectDetail {
        self.detail
    }

    /// Acknowledgment is only recorded when the clipboard write succeeded.
    pub fn copy_link(&mut self, clipboard: &dyn Clipboard, now: Instant) -> anyhow::Result<()> {
        clipboard.write_text(&self.detail.share_url)?;
        self.link_copied_at = Some(now);
        Ok(())
    }

    pub fn copy_email(&mut self, clipboard: &dyn Clipboard, now: Instant) -> anyhow::Result<()> {
        clipboard.write_text(&self.detail.contact_email)?;
        self.email_copied_at = Some(now);
        Ok(())
    }

    pub fn link_copied(&self, now: Instant) -> bool {
        acknowledged(self.link_copied_at, now)
    }

    pub fn email_copied(&self, now: Instant) -> bool {
        acknowledged(self.email_copied_at, now)
    }

    /// Mirrors the fullscreen state reported by the platform.
    pub fn on_fullscreen_change(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

fn acknowledged(at: Option<Instant>, now: Instant) -> bool {
    at.is_some_and(|t| now.saturating_duration_since(t) < COPIED_FOR)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Mutex<Vec<String>>,
        deny: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&self, text: &str) -> anyhow::Result<()> {
            if self.deny {
                anyhow::bail!("clipboard permission denied");
            }
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Poster".into(),
            category: "Design".into(),
            tags: vec!["print".into()],
            image_url: String::new(),
            description: "screen printed poster".into(),
            year: "2024".into(),
            role: "Designer".into(),
            is_public: true,
            is_featured: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn share_url_points_at_gallery() {
        let p = project();
        assert_eq!(
            share_url("https://portfolio.test/", &p),
            format!("https://portfolio.test/allprojects?project={}", p.id)
        );
    }

    #[test]
    fn copy_acknowledgment_expires_after_two_seconds() {
        let clipboard = RecordingClipboard::default();
        let mut modal = DetailModal::new(project(), "https://portfolio.test", "hello@portfolio.test");
        let t0 = Instant::now();

        modal.copy_link(&clipboard, t0).unwrap();
        assert!(modal.link_copied(t0 + Duration::from_millis(1999)));
        assert!(!modal.link_copied(t0 + COPIED_FOR));
        assert!(!modal.email_copied(t0));

        modal.copy_email(&clipboard, t0).unwrap();
        assert!(modal.email_copied(t0 + Duration::from_secs(1)));
        assert_eq!(
            *clipboard.writes.lock().unwrap(),
            vec![modal.detail().share_url.clone(), "hello@portfolio.test".to_string()]
        );
    }

    #[test]
    fn failed_copy_shows_no_acknowledgment() {
        let clipboard = RecordingClipboard {
            deny: true,
            ..Default::default()
        };
        let mut modal = DetailModal::new(project(), "https://portfolio.test", "hello@portfolio.test");
        let now = Instant::now();
        assert!(modal.copy_link(&clipboard, now).is_err());
        assert!(!modal.link_copied(now));
    }

    #[test]
    fn fullscreen_mirrors_platform() {
        let mut modal = DetailModal::new(project(), "https://portfolio.test", "hello@portfolio.test");
        assert!(!modal.is_fullscreen());
        modal.on_fullscreen_change(true);
        assert!(modal.is_fullscreen());
        modal.on_fullscreen_change(false);
        assert!(!modal.is_fullscreen());
    }
}
