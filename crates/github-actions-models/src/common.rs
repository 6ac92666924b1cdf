//! Shared models and utilities.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// A string-to-string mapping, as used by `with:` and `env:`.
///
/// GitHub Actions stringifies every scalar in these positions, so
/// `with: { count: 3 }` is modelled as `count → "3"`.
pub type Env = IndexMap<String, String>;

/// Returns the string form of a YAML scalar.
///
/// Nulls become the empty string; sequences and mappings have no
/// string form.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Deserializes any scalar as a string. A non-scalar becomes the
/// empty string, so a malformed field never fails its document.
pub(crate) fn scalar_is_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(scalar_to_string(&value).unwrap_or_default())
}

/// Returns whether `source` holds no YAML document at all, i.e. is empty
/// or only comments.
pub(crate) fn is_blank(source: &str) -> bool {
    source.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Deserializes a `T`, treating an explicit null (e.g. a bare `jobs:`)
/// as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Deserializes a mapping of scalars into an [`Env`].
///
/// Entries whose key or value isn't a scalar are dropped, as is anything
/// that isn't a mapping at all (e.g. `env: ${{ fromJSON(...) }}`).
pub(crate) fn scalar_map<'de, D>(de: D) -> Result<Env, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(env_from_value(value))
}

fn env_from_value(value: Value) -> Env {
    match value {
        Value::Mapping(mapping) => mapping
            .iter()
            .filter_map(|(k, v)| Some((scalar_to_string(k)?, scalar_to_string(v)?)))
            .collect(),
        Value::Tagged(tagged) => env_from_value(tagged.value),
        _ => Env::new(),
    }
}

/// Deserializes a list of steps.
///
/// Items that aren't step-shaped become empty steps rather than being
/// removed, so that step numbering keeps matching the document.
pub(crate) fn lenient_steps<'de, D>(de: D) -> Result<Vec<Step>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Sequence(items) = Value::deserialize(de)? else {
        return Ok(vec![]);
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            Step::deserialize(item).unwrap_or_else(|e| {
                tracing::debug!("step #{idx} is malformed, treating it as empty: {e}");
                Step::default()
            })
        })
        .collect())
}

/// A single step, either in a workflow job or in a composite action.
///
/// Exactly one of `run` and `uses` is meaningful for any given step;
/// the other is empty.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Step {
    /// The step's display name, if any.
    #[serde(deserialize_with = "scalar_is_string")]
    pub name: String,
    /// The step's inline script, if any.
    #[serde(deserialize_with = "scalar_is_string")]
    pub run: String,
    /// The step's action reference, if any.
    #[serde(deserialize_with = "scalar_is_string")]
    pub uses: String,
    /// The step's action inputs.
    #[serde(deserialize_with = "scalar_map")]
    pub with: Env,
    /// The step's environment.
    #[serde(deserialize_with = "scalar_map")]
    pub env: Env,
    #[serde(deserialize_with = "scalar_is_string")]
    pub shell: String,
    /// The trimmed comment trailing this step's `uses:` line, if any.
    ///
    /// This isn't part of the YAML data model; it's filled in from the
    /// document's syntax tree after deserialization.
    #[serde(skip)]
    pub annotation: String,
}

impl Step {
    /// Parses this step's `uses:` into a [`StepUses`].
    pub fn step_uses(&self) -> Result<StepUses<'_>, UsesError> {
        StepUses::parse(&self.uses, &self.annotation)
    }
}

#[derive(Debug, PartialEq)]
pub struct UsesError(String);

impl Display for UsesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed `uses` ref: {}", self.0)
    }
}

impl std::error::Error for UsesError {}

/// A parsed `uses: <name>@<ref>` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepUses<'a> {
    /// Everything before the last `@`, e.g. `actions/checkout`.
    pub name: &'a str,
    /// Everything after the last `@`: a tag, branch, or commit.
    pub git_ref: &'a str,
    /// The comment trailing the `uses:` line, e.g. `v4.1.1` for
    /// `uses: actions/checkout@b4ff…  # v4.1.1`.
    pub annotation: &'a str,
}

impl<'a> StepUses<'a> {
    /// Parses a `uses:` clause, splitting on its last `@`.
    pub fn parse(uses: &'a str, annotation: &'a str) -> Result<Self, UsesError> {
        // NOTE: Action names can contain `@`, refs can't.
        let Some((name, git_ref)) = uses.rsplit_once('@') else {
            return Err(UsesError(format!("missing `@<ref>` in {uses}")));
        };

        if name.is_empty() {
            return Err(UsesError(format!("missing action name in {uses}")));
        }

        if git_ref.is_empty() {
            return Err(UsesError(format!("empty ref in {uses}")));
        }

        Ok(Self {
            name,
            git_ref,
            annotation,
        })
    }
}

impl Display for StepUses<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.git_ref)
    }
}
