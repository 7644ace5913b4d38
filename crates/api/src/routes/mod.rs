//! HTTP handlers grouped by area.

pub mod auth;
pub mod carts;
pub mod catalog;
pub mod dashboard;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod uploads;

use std::str::FromStr;

use common::PageRequest;
use serde::Deserialize;

use crate::error::ApiError;

/// `page` and `limit` as received; parsing is lenient.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_params(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Parses an identifier taken from the URL path.
fn parse_id<T: FromStr>(raw: &str, field: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid(field, "must be a valid id"))
}
