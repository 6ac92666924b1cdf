//! Lossy data models for GitHub Actions workflows and action manifests.
//!
//! These models retain only the fields a template-expression linter needs:
//! job and step names, step bodies (`run:` and `uses:` + `with:`), step
//! environments, and job matrices. Everything else in a document is
//! accepted and ignored.
//!
//! Fields are parsed leniently: YAML booleans and numbers in string
//! positions are stringified, nulls become empty values, and values with an
//! unexpected shape are dropped rather than failing the whole document.

#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use thiserror::Error;

pub mod action;
mod annotate;
pub mod common;
pub mod workflow;

/// Errors produced while loading a document into a model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The input isn't YAML, or its top-level shape doesn't fit the model.
    #[error("invalid YAML: {0}")]
    Syntax(#[from] serde_yaml::Error),
}
