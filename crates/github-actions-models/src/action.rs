//! Lossy models for GitHub Actions action definitions (`action.yml`).
//!
//! See: <https://docs.github.com/en/actions/sharing-automations/creating-actions/metadata-syntax-for-github-actions>

use serde::Deserialize;

use crate::{
    ModelError,
    annotate::{Component, Document},
    common::{Step, is_blank, lenient_steps, null_as_default, scalar_is_string},
};

/// An action manifest, reduced to its `runs:` section.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Action {
    #[serde(deserialize_with = "null_as_default")]
    pub runs: Runs,
}

/// An action's `runs:`.
///
/// Only composite actions (`using: composite`) have steps; JavaScript
/// and Docker actions keep `steps` empty.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Runs {
    #[serde(deserialize_with = "scalar_is_string")]
    pub using: String,
    #[serde(deserialize_with = "lenient_steps")]
    pub steps: Vec<Step>,
}

impl Runs {
    pub fn is_composite(&self) -> bool {
        self.using == "composite"
    }
}

impl Action {
    /// Loads an action manifest from its YAML source, capturing the
    /// comment trailing each step's `uses:` line as that step's annotation.
    pub fn from_yaml(source: &str) -> Result<Self, ModelError> {
        if is_blank(source) {
            return Ok(Self::default());
        }

        let mut action = serde_yaml::from_str::<Option<Self>>(source)?.unwrap_or_default();

        let Some(doc) = Document::parse(source) else {
            return Ok(action);
        };

        for (idx, step) in action.runs.steps.iter_mut().enumerate() {
            if step.uses.is_empty() {
                continue;
            }

            let route = [
                Component::Key("runs"),
                Component::Key("steps"),
                Component::Index(idx),
                Component::Key("uses"),
            ];
            if let Some(annotation) = doc.trailing_comment(&route) {
                step.annotation = annotation.into();
            }
        }

        Ok(action)
    }
}
