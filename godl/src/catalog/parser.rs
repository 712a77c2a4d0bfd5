//! Catalog deserialization.
//!
//! Decodes the raw listing body returned by the catalog source into a
//! [`Catalog`]. Decoding is all-or-nothing: a structurally invalid document
//! never yields a partial catalog.

use super::model::Catalog;

/// Errors arising from catalog parsing.
#[derive(Debug, thiserror::Error)]
pub enum CatalogParseError {
    /// JSON deserialization failed.
    #[error("catalog parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a raw listing body into a [`Catalog`].
///
/// Unknown fields are ignored and missing fields take empty or zero values,
/// as does a `null` artefact list. Wrong types and a non-array top level
/// are rejected.
///
/// # Errors
///
/// Returns [`CatalogParseError`] if the body is not a valid listing.
///
/// # Examples
///
/// ```
/// use godl::catalog::parser::parse_catalog;
///
/// let body = br#"[{"version":"go1.21.0","stable":true,"files":[]}]"#;
/// let catalog = parse_catalog(body).expect("valid catalog");
/// assert_eq!(catalog.releases()[0].version(), "go1.21.0");
/// ```
pub fn parse_catalog(body: &[u8]) -> Result<Catalog, CatalogParseError> {
    Ok(serde_json::from_slice(body)?)
}
