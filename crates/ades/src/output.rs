//! Output formats for reports.

pub(crate) mod json;
pub(crate) mod plain;
