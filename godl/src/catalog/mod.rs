//! Release catalog model and parsing.
//!
//! # Sub-modules
//!
//! - [`hash`] - Hex digest newtype with decode-then-compare equality.
//! - [`model`] - `Catalog`, `Release`, and `Artefact` types.
//! - [`parser`] - Listing JSON deserialization.

pub mod hash;
pub mod model;
pub mod parser;

pub use hash::HexDigest;
pub use model::{Artefact, Catalog, Release};
pub use parser::{CatalogParseError, parse_catalog};
