//! Field-level input validation.
//!
//! Every input is checked completely before any store access, so a request
//! either fails with the full list of problems or is applied as a whole.

use std::fmt;
use std::str::FromStr;

use domain::{Money, Quantity};
use serde::Serialize;

/// A problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All problems found in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on one field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Returns `Ok(value)` if no error was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Requires an optional field to be present.
    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "is required");
        }
        value
    }

    /// Requires a string to contain something other than whitespace.
    pub fn non_empty(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "must not be empty");
        }
    }

    /// Requires a string to be at least `min` characters long.
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(field, format!("must be at least {min} characters"));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_email(value) {
            self.add(field, "must be a valid email address");
        }
    }

    pub fn url(&mut self, field: &str, value: &str) {
        if reqwest::Url::parse(value).is_err() {
            self.add(field, "must be a valid URL");
        }
    }

    /// Rounds a monetary amount to cents and requires the result to be
    /// greater than zero and storable.
    pub fn positive_money(&mut self, field: &str, value: Money) -> Money {
        let value = value.rounded();
        if !value.is_positive() {
            self.add(field, "must be greater than 0");
        } else if !value.is_storable() {
            self.add(field, format!("must not exceed {}", Money::largest()));
        }
        value
    }

    pub fn quantity(&mut self, field: &str, value: i64) -> Option<Quantity> {
        match Quantity::new(value) {
            Ok(quantity) => Some(quantity),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }

    /// Parses a well-formed identifier.
    pub fn id<T: FromStr>(&mut self, field: &str, value: &str) -> Option<T> {
        match value.parse::<T>() {
            Ok(id) => Some(id),
            Err(_) => {
                self.add(field, "must be a valid id");
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A deliberately loose address check: `local@domain.tld` without whitespace.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}
