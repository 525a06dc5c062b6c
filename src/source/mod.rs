//! Source documents — the scripted bullet format.
//!
//! Text is parsed into a generic [`syntax::SyntaxNode`] tree, then walked
//! into a [`Schedule`] of per-frame bullet events. Both steps reject the
//! whole document on the first problem; there is no partial load.

pub mod schedule;
pub mod syntax;

use crate::error::FtlError;
use crate::types::Schedule;

pub use schedule::{BulletFieldKey, build as build_schedule};
pub use syntax::{SyntaxNode, parse as parse_document, unwrap};

/// Parse and validate a document in one go.
pub fn load_schedule(text: &str) -> Result<Schedule, FtlError> {
    let doc = parse_document(text)?;
    build_schedule(&doc)
}
