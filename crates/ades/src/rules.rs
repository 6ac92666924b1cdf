//! Rules, i.e. the places in a step where an expression is dangerous.
//!
//! Rules come in two shapes: step rules, which apply based on the shape
//! of a step (e.g. whether it has a `run:` script), and action rules,
//! which apply to steps that use a particular action, optionally only at
//! particular versions of it.

use github_actions_models::common::{Step, StepUses};
use thiserror::Error;

use crate::{models::uses::StepUsesExt as _, utils::env_var_name};

pub(crate) mod catalogue;

/// The field of a step that a rule checks.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Field {
    /// The step's `run:` script.
    Run,
    /// The named input in the step's `with:` map.
    Input(&'static str),
}

impl Field {
    /// Returns the contents of this field in `step`, or the empty string
    /// if the step doesn't have it.
    pub(crate) fn extract<'s>(&self, step: &'s Step) -> &'s str {
        match self {
            Field::Run => &step.run,
            Field::Input(name) => step.with.get(*name).map(String::as_str).unwrap_or_default(),
        }
    }
}

/// How to address a finding.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Suggestion {
    /// Move the expression into an environment variable, and refer to that
    /// variable with `reference` (where `NAME` stands in for the variable).
    ///
    /// `passthrough` is set when the variable must also be listed in the
    /// step's `envs` input to reach the code.
    EnvVar {
        reference: &'static str,
        passthrough: bool,
    },
    /// Upgrade the action to a version that isn't vulnerable.
    Upgrade,
    /// Remove the expression; there's no safe way to interpolate it.
    Remove,
}

/// A single rule.
#[derive(Debug)]
pub(crate) struct Rule {
    pub(crate) id: &'static str,
    pub(crate) title: &'static str,
    /// A longer explanation, with an example of the fix where one exists.
    /// Begins and ends with a newline.
    pub(crate) description: &'static str,
    pub(crate) field: Field,
    pub(crate) suggestion: Suggestion,
}

impl Rule {
    /// Returns the text this rule checks in `step`.
    pub(crate) fn extract<'s>(&self, step: &'s Step) -> &'s str {
        self.field.extract(step)
    }

    /// Returns the lines of guidance for fixing `problem`, which is an
    /// expression found by this rule.
    pub(crate) fn suggestion_lines(&self, problem: &str) -> Vec<String> {
        match self.suggestion {
            Suggestion::EnvVar {
                reference,
                passthrough,
            } => {
                let name = env_var_name(problem);
                let reference = reference.replace("NAME", &name);

                let mut lines = vec![format!("1. Set `{name}: {problem}` in the step's `env` map")];
                if passthrough {
                    lines.push(format!("2. Add `{name}` to the step's `envs` input"));
                }
                lines.push(format!(
                    "{n}. Replace all occurrences of `{problem}` by `{reference}`",
                    n = lines.len() + 1
                ));
                lines.push("   (make sure to keep the behavior of the script the same)".into());
                lines
            }
            Suggestion::Upgrade => vec!["1. Upgrade the action to a non-vulnerable version".into()],
            Suggestion::Remove => vec![
                "1. Remove the expression from the input".into(),
                "   (there is no safe way to use it here)".into(),
            ],
        }
    }

    /// Renders this rule's explanation: its id and title on one line,
    /// followed by its description.
    pub(crate) fn explain(&self) -> String {
        format!(
            "{id} - {title}\n{description}",
            id = self.id,
            title = self.title,
            description = self.description
        )
    }
}

/// A rule that applies to steps based on their shape.
pub(crate) struct StepRule {
    pub(crate) applies_to: fn(&Step) -> bool,
    pub(crate) rule: &'static Rule,
}

/// The versions of an action that an action rule applies to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Versions {
    Any,
    /// Every version strictly before the given one.
    Before(&'static str),
    /// Every version from the first (inclusive) to the second (exclusive).
    Between(&'static str, &'static str),
}

impl Versions {
    fn contains(&self, uses: &StepUses) -> bool {
        match self {
            Versions::Any => true,
            Versions::Before(cutoff) => uses.is_before(cutoff),
            Versions::Between(floor, cutoff) => {
                uses.is_at_or_after(floor) && uses.is_before(cutoff)
            }
        }
    }
}

/// A rule that applies to steps that use a particular action.
pub(crate) struct ActionRule {
    /// The action's `owner/repo` name. Matched case-insensitively.
    pub(crate) action: &'static str,
    pub(crate) versions: Versions,
    pub(crate) rule: &'static Rule,
}

impl ActionRule {
    pub(crate) fn applies_to(&self, uses: &StepUses) -> bool {
        self.action.eq_ignore_ascii_case(uses.name) && self.versions.contains(uses)
    }
}

#[derive(Debug, Error)]
#[error("unknown rule {0:?}")]
pub(crate) struct UnknownRule(pub(crate) String);

/// Returns the rules that apply to `step`, in catalogue order.
///
/// Steps that use a well-formed action only get that action's rules;
/// everything else gets the step rules.
pub(crate) fn rules_for(step: &Step) -> Vec<&'static Rule> {
    if step.uses.is_empty() {
        return step_rules_for(step);
    }

    match step.step_uses() {
        Ok(uses) => catalogue::ACTION_RULES
            .iter()
            .filter(|rule| rule.applies_to(&uses))
            .map(|rule| rule.rule)
            .collect(),
        Err(e) => {
            tracing::debug!("treating step as a plain step: {e}");
            step_rules_for(step)
        }
    }
}

fn step_rules_for(step: &Step) -> Vec<&'static Rule> {
    catalogue::STEP_RULES
        .iter()
        .filter(|rule| (rule.applies_to)(step))
        .map(|rule| rule.rule)
        .collect()
}

/// Returns every rule, ordered by id.
pub(crate) fn rules() -> &'static [&'static Rule] {
    catalogue::RULES
}

/// Looks up a rule by its id, ignoring case.
pub(crate) fn find_rule(id: &str) -> Option<&'static Rule> {
    rules()
        .iter()
        .copied()
        .find(|rule| rule.id.eq_ignore_ascii_case(id))
}

/// Returns the explanation for the rule with the given id.
pub(crate) fn explain(id: &str) -> Result<String, UnknownRule> {
    find_rule(id)
        .map(Rule::explain)
        .ok_or_else(|| UnknownRule(id.into()))
}
