//! Lossy models for GitHub Actions workflow definitions.
//!
//! See: <https://docs.github.com/en/actions/writing-workflows/workflow-syntax-for-github-actions>

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::{
    ModelError,
    annotate::{Component, Document},
    common::{Step, is_blank, lenient_steps, null_as_default, scalar_is_string, scalar_to_string},
};

/// A workflow, reduced to its jobs.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Workflow {
    #[serde(deserialize_with = "null_as_default")]
    pub jobs: IndexMap<String, Job>,
}

impl Workflow {
    /// Loads a workflow from its YAML source, capturing the comment
    /// trailing each step's `uses:` line as that step's annotation.
    pub fn from_yaml(source: &str) -> Result<Self, ModelError> {
        // NOTE: Empty, comment-only, and null documents are all workflows
        // without jobs.
        if is_blank(source) {
            return Ok(Self::default());
        }

        let mut workflow = serde_yaml::from_str::<Option<Self>>(source)?.unwrap_or_default();

        let Some(doc) = Document::parse(source) else {
            return Ok(workflow);
        };

        for (id, job) in workflow.jobs.iter_mut() {
            for (idx, step) in job.steps.iter_mut().enumerate() {
                if step.uses.is_empty() {
                    continue;
                }

                let route = [
                    Component::Key("jobs"),
                    Component::Key(id),
                    Component::Key("steps"),
                    Component::Index(idx),
                    Component::Key("uses"),
                ];
                if let Some(annotation) = doc.trailing_comment(&route) {
                    step.annotation = annotation.into();
                }
            }
        }

        Ok(workflow)
    }
}

/// A single job. Reusable workflow calls have no steps and are modelled
/// as step-less jobs.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Job {
    #[serde(deserialize_with = "scalar_is_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_steps")]
    pub steps: Vec<Step>,
    #[serde(deserialize_with = "lenient_strategy")]
    pub strategy: Option<Strategy>,
}

impl Job {
    /// Returns this job's matrix, if it has one.
    pub fn matrix(&self) -> Option<&Matrix> {
        self.strategy.as_ref()?.matrix.as_ref()
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Strategy {
    pub matrix: Option<Matrix>,
}

fn lenient_strategy<'de, D>(de: D) -> Result<Option<Strategy>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    if !value.is_mapping() {
        return Ok(None);
    }

    Ok(Strategy::deserialize(value).ok())
}

/// A job's `strategy.matrix`.
///
/// Matrices given as an expression (e.g. `${{ fromJSON(...) }}`) can't be
/// inspected, and are modelled as an empty matrix.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Matrix {
    /// Every matrix key other than `include` and `exclude`.
    pub base: IndexMap<String, MatrixValue>,
    /// The `include` entries, each a map of keys to values.
    pub include: Vec<IndexMap<String, MatrixValue>>,
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from(Value::deserialize(de)?))
    }
}

impl From<Value> for Matrix {
    fn from(value: Value) -> Self {
        let Value::Mapping(mapping) = value else {
            return Self::default();
        };

        let mut matrix = Self::default();
        for (key, value) in mapping {
            let Some(key) = scalar_to_string(&key) else {
                continue;
            };

            match key.as_str() {
                "include" => {
                    if let Value::Sequence(entries) = value {
                        matrix.include = entries
                            .into_iter()
                            .filter_map(|entry| match MatrixValue::from(entry) {
                                MatrixValue::Map(entry) => Some(entry),
                                _ => None,
                            })
                            .collect();
                    }
                }
                "exclude" => continue,
                _ => {
                    matrix.base.insert(key, value.into());
                }
            }
        }

        matrix
    }
}

/// A dynamically typed matrix value.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixValue {
    /// A YAML string.
    String(String),
    /// Any other scalar, stringified. Null is the empty string.
    Scalar(String),
    List(Vec<MatrixValue>),
    Map(IndexMap<String, MatrixValue>),
}

impl From<Value> for MatrixValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::String(s),
            Value::Sequence(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Value::Mapping(mapping) => Self::Map(
                mapping
                    .into_iter()
                    .filter_map(|(k, v)| Some((scalar_to_string(&k)?, v.into())))
                    .collect(),
            ),
            Value::Tagged(tagged) => tagged.value.into(),
            other => Self::Scalar(scalar_to_string(&other).unwrap_or_default()),
        }
    }
}
