//! Field-level input checks run before any data access call.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::store::{ExperiencePatch, NewExperience, NewProject, ProjectPatch};

pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MIN_MESSAGE_LEN: usize = 10;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"^\d{4}$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Field name to message, serialized as a JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Splits a comma separated tag field into trimmed, non-empty labels.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn required(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

fn check_title(e: &mut FieldErrors, v: &str) {
    required(e, "title", v, "Title is required");
}

fn check_category(e: &mut FieldErrors, v: &str) {
    required(e, "category", v, "Category is required");
}

fn check_tags(e: &mut FieldErrors, v: &[String]) {
    if v.iter().all(|t| t.trim().is_empty()) {
        e.add("tags", "At least one tag is required");
    }
}

fn check_description(e: &mut FieldErrors, v: &str) {
    if v.trim().chars().count() < MIN_DESCRIPTION_LEN {
        e.add(
            "description",
            format!("Description must be at least {MIN_DESCRIPTION_LEN} characters"),
        );
    }
}

fn check_year(e: &mut FieldErrors, v: &str) {
    if !YEAR_RE.is_match(v) {
        e.add("year", "Year must be a 4-digit number");
    }
}

fn check_role(e: &mut FieldErrors, v: &str) {
    required(e, "role", v, "Role is required");
}

pub fn validate_new_project(p: &NewProject) -> Result<(), FieldErrors> {
    let mut e = FieldErrors::default();
    check_title(&mut e, &p.title);
    check_category(&mut e, &p.category);
    check_tags(&mut e, &p.tags);
    check_description(&mut e, &p.description);
    check_year(&mut e, &p.year);
    check_role(&mut e, &p.role);
    e.into_result()
}

/// Same rules as creation, applied only to the fields being changed.
pub fn validate_project_patch(p: &ProjectPatch) -> Result<(), FieldErrors> {
    let mut e = FieldErrors::default();
    if let Some(v) = &p.title {
        check_title(&mut e, v);
    }
    if let Some(v) = &p.category {
        check_category(&mut e, v);
    }
    if let Some(v) = &p.tags {
        check_tags(&mut e, v);
    }
    if let Some(v) = &p.description {
        check_description(&mut e, v);
    }
    if let Some(v) = &p.year {
        check_year(&mut e, v);
    }
    if let Some(v) = &p.role {
        check_role(&mut e, v);
    }
    e.into_result()
}

pub fn validate_new_experience(x: &NewExperience) -> Result<(), FieldErrors> {
    let mut e = FieldErrors::default();
    required(&mut e, "role", &x.role, "Role is required");
    required(&mut e, "org", &x.org, "Organization is required");
    required(&mut e, "period", &x.period, "Period is required");
    e.into_result()
}

pub fn validate_experience_patch(x: &ExperiencePatch) -> Result<(), FieldErrors> {
    let mut e = FieldErrors::default();
    if let Some(v) = &x.role {
        required(&mut e, "role", v, "Role is required");
    }
    if let Some(v) = &x.org {
        required(&mut e, "org", v, "Organization is required");
    }
    if let Some(v) = &x.period {
        required(&mut e, "period", v, "Period is required");
    }
    e.into_result()
}

pub fn validate_email_fields(recipient: &str, subject: &str, message: &str) -> Result<(), FieldErrors> {
    let mut e = FieldErrors::default();
    if !is_valid_email(recipient.trim()) {
        e.add("recipient", "Invalid email address");
    }
    required(&mut e, "subject", subject, "Subject is required");
    if message.trim().chars().count() < MIN_MESSAGE_LEN {
        e.add(
            "message",
            format!("Message must be at least {MIN_MESSAGE_LEN} characters"),
        );
    }
    e.into_result()
}
