//! Per-field validation errors shared by every form the client submits.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// A single problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in one submission attempt. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message reported for `field`, if any.
    pub fn message_for(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn contains(
        &self,
        field: &str,
    ) -> bool {
        self.message_for(field).is_some()
    }
}

/// Accumulates field errors; converts to `Ok(())` when nothing was pushed.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        field: &'static str,
        message: impl Into<String>,
    ) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn require_text(
        &mut self,
        field: &'static str,
        value: &str,
        min_len: usize,
    ) {
        let value = value.trim();
        if value.is_empty() {
            self.push(field, "is required");
        } else if value.chars().count() < min_len {
            self.push(field, format!("must be at least {min_len} characters"));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors: self.0 })
        }
    }
}

impl From<FieldErrors> for ValidationErrors {
    fn from(errors: FieldErrors) -> Self {
        Self { errors: errors.0 }
    }
}

impl fmt::Display for FieldError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Strict address check used on the simulation form.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
                .expect("email pattern is valid")
        })
        .is_match(email.trim())
}

/// Loose `something@something` check used on the contact form.
pub fn is_loose_email(email: &str) -> bool {
    static LOOSE: OnceLock<Regex> = OnceLock::new();
    LOOSE
        .get_or_init(|| Regex::new(r"^\S+@\S+$").expect("email pattern is valid"))
        .is_match(email.trim())
}
