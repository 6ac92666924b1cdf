//! Analysis-side extensions to the models in [`github_actions_models`].

pub(crate) mod matrix;
pub(crate) mod uses;
pub(crate) mod version;
