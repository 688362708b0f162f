//! # Parameter Normalization Module
//!
//! ## Purpose
//! Validates and coerces caller-supplied search parameters into values the
//! upstream decision backend accepts. The backend only honors a fixed set of
//! page sizes and 1-based page numbers, so everything else is snapped before
//! a single network call is made.
//!
//! ## Input/Output Specification
//! - **Input**: Raw parameters from the GET query string or a POST JSON body
//! - **Output**: An immutable, validated [`SearchRequest`]
//! - **Failures**: `InvalidParameter` for a missing/empty keyword or an
//!   unparseable numeric field; no network call is attempted in that case

use crate::errors::{Result, SearchError};
use serde::Deserialize;

/// Page sizes the upstream backend accepts, in ascending order
pub const VALID_PAGE_SIZES: [u32; 4] = [10, 25, 50, 100];

/// Default page size when the caller does not supply one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Raw, untrusted search parameters as they arrive at the API boundary.
///
/// Numeric and boolean fields are deserialized leniently because the GET
/// surface delivers everything as strings while the POST surface delivers
/// typed JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    pub keyword: Option<String>,
    #[serde(default)]
    pub page_number: Option<RawNumber>,
    #[serde(default)]
    pub page_size: Option<RawNumber>,
    #[serde(default)]
    pub fetch_content: Option<RawFlag>,
}

/// A number that may arrive as a JSON integer, a JSON float or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    fn to_f64(&self, field: &str) -> Result<f64> {
        match self {
            RawNumber::Int(v) => Ok(*v as f64),
            RawNumber::Float(v) => Ok(*v),
            RawNumber::Text(s) => {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| SearchError::InvalidParameter {
                        field: field.to_string(),
                        reason: format!("'{}' is not a number", s),
                    })
            }
        }
    }
}

/// A boolean that may arrive as a JSON bool, a number or a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl RawFlag {
    fn is_truthy(&self) -> bool {
        match self {
            RawFlag::Bool(v) => *v,
            RawFlag::Int(v) => *v != 0,
            RawFlag::Text(s) => {
                matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
            }
        }
    }
}

/// A validated search request, immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    keyword: String,
    page_number: u32,
    page_size: u32,
    fetch_content: bool,
}

impl SearchRequest {
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn fetch_content(&self) -> bool {
        self.fetch_content
    }
}

/// Normalize raw caller parameters into a [`SearchRequest`].
///
/// - keyword: required, trimmed; empty or missing fails with `InvalidParameter`
/// - page_number: defaults to 1; non-positive values are coerced to 1
/// - page_size: defaults to 10; other values snap to the nearest valid size,
///   exact ties resolving to the smaller one
/// - fetch_content: defaults to false; any truthy representation accepted
pub fn normalize(raw: &RawSearchParams) -> Result<SearchRequest> {
    let keyword = raw
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| SearchError::InvalidParameter {
            field: "keyword".to_string(),
            reason: "keyword is required".to_string(),
        })?
        .to_string();

    let page_number = match &raw.page_number {
        Some(value) => {
            let n = value.to_f64("page_number")? as i64;
            if n < 1 {
                1
            } else {
                // Saturate rather than wrap so oversized inputs stay >= 1
                u32::try_from(n).unwrap_or(u32::MAX)
            }
        }
        None => 1,
    };

    let page_size = match &raw.page_size {
        Some(value) => {
            let requested = value.to_f64("page_size")?;
            let snapped = snap_page_size(requested);
            if snapped as f64 != requested {
                tracing::info!(
                    requested = requested,
                    snapped = snapped,
                    "Page size not accepted by upstream, using closest valid size"
                );
            }
            snapped
        }
        None => DEFAULT_PAGE_SIZE,
    };

    let fetch_content = raw
        .fetch_content
        .as_ref()
        .map(RawFlag::is_truthy)
        .unwrap_or(false);

    Ok(SearchRequest {
        keyword,
        page_number,
        page_size,
        fetch_content,
    })
}

/// Snap a requested page size to the nearest upstream-accepted value.
///
/// Ties resolve to the smaller size: sizes are scanned in ascending order and
/// only a strictly smaller distance replaces the current candidate.
fn snap_page_size(requested: f64) -> u32 {
    let mut best = VALID_PAGE_SIZES[0];
    let mut best_distance = (requested - best as f64).abs();

    for &size in &VALID_PAGE_SIZES[1..] {
        let distance = (requested - size as f64).abs();
        if distance < best_distance {
            best = size;
            best_distance = distance;
        }
    }

    best
}
