//! Finding dangerous expressions in workflows and actions.

use github_actions_models::{
    ModelError,
    action::Action,
    common::Step,
    workflow::{Matrix, Workflow},
};

use crate::{expr::ExprMatcher, models::matrix::is_matrix_safe, rules::rules_for};

/// A single dangerous expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Violation {
    /// The job's name, or its id if it has no name. Empty for actions.
    pub(crate) job_id: String,
    /// The step's name, or `#<index>` if it has no name.
    pub(crate) step_id: String,
    /// The expression, exactly as it appears in the step.
    pub(crate) problem: String,
    pub(crate) rule_id: &'static str,
}

/// Analyzes every job in `workflow`.
///
/// Violations are grouped by job, in the workflow's job order, and then
/// ordered by step and position within the step.
pub(crate) fn analyze_workflow(workflow: &Workflow, matcher: &dyn ExprMatcher) -> Vec<Violation> {
    let mut violations = vec![];

    for (id, job) in &workflow.jobs {
        let label = if job.name.is_empty() { id } else { &job.name };

        violations.extend(
            analyze_steps(&job.steps, job.matrix(), matcher)
                .into_iter()
                .map(|violation| Violation {
                    job_id: label.clone(),
                    ..violation
                }),
        );
    }

    violations
}

/// Analyzes the steps of `action`. Only composite actions have steps,
/// so any other kind of action has no violations.
pub(crate) fn analyze_manifest(action: &Action, matcher: &dyn ExprMatcher) -> Vec<Violation> {
    if !action.runs.is_composite() {
        tracing::debug!("skipping non-composite action ({})", action.runs.using);
        return vec![];
    }

    analyze_steps(&action.runs.steps, None, matcher)
}

/// Analyzes a document whose kind isn't known up front.
///
/// The document is analyzed as a workflow first. If that produces neither
/// jobs nor violations, it's analyzed as an action instead.
pub(crate) fn analyze_source(
    source: &str,
    matcher: &dyn ExprMatcher,
) -> Result<Vec<Violation>, ModelError> {
    let workflow_err = match Workflow::from_yaml(source) {
        Ok(workflow) => {
            let violations = analyze_workflow(&workflow, matcher);
            if !violations.is_empty() || !workflow.jobs.is_empty() {
                return Ok(violations);
            }
            None
        }
        Err(e) => {
            tracing::debug!("not a workflow: {e}");
            Some(e)
        }
    };

    match (Action::from_yaml(source), workflow_err) {
        (Ok(action), _) => Ok(analyze_manifest(&action, matcher)),
        // An empty workflow is still a workflow.
        (Err(e), None) => {
            tracing::debug!("not an action: {e}");
            Ok(vec![])
        }
        (Err(_), Some(e)) => Err(e),
    }
}

fn analyze_steps(
    steps: &[Step],
    matrix: Option<&Matrix>,
    matcher: &dyn ExprMatcher,
) -> Vec<Violation> {
    let mut violations = vec![];

    for (idx, step) in steps.iter().enumerate() {
        let label = if step.name.is_empty() {
            format!("#{idx}")
        } else {
            step.name.clone()
        };

        for rule in rules_for(step) {
            tracing::trace!("checking step {label} with {id}", id = rule.id);

            for problem in matcher.find_all(rule.extract(step)) {
                if matrix.is_some_and(|matrix| is_matrix_safe(problem, matrix, matcher)) {
                    tracing::trace!("{problem} only expands to safe matrix values");
                    continue;
                }

                violations.push(Violation {
                    job_id: String::new(),
                    step_id: label.clone(),
                    problem: problem.into(),
                    rule_id: rule.id,
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use github_actions_models::{action::Action, workflow::Workflow};
    use pretty_assertions::assert_eq;

    use super::{Violation, analyze_manifest, analyze_source, analyze_workflow};
    use crate::expr::{AllMatcher, ConservativeMatcher};

    fn violation(job: &str, step: &str, problem: &str, rule: &'static str) -> Violation {
        Violation {
            job_id: job.into(),
            step_id: step.into(),
            problem: problem.into(),
            rule_id: rule,
        }
    }

    #[test]
    fn test_named_job_and_step() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  unsafe:
    name: Unsafe
    runs-on: ubuntu-latest
    steps:
      - name: Example
        run: echo ${{ inputs.value }}
"#,
        )?;

        assert_eq!(
            analyze_workflow(&workflow, &AllMatcher),
            [violation("Unsafe", "Example", "${{ inputs.value }}", "ADES100")]
        );

        Ok(())
    }

    #[test]
    fn test_unnamed_job_and_step() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  greet:
    steps:
      - run: echo 'Hello ${{ inputs.name }}! How is your ${{ steps.id.outputs.day }}'
"#,
        )?;

        assert_eq!(
            analyze_workflow(&workflow, &AllMatcher),
            [
                violation("greet", "#0", "${{ inputs.name }}", "ADES100"),
                violation("greet", "#0", "${{ steps.id.outputs.day }}", "ADES100"),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_step_order() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  test:
    steps:
      - run: echo ${{ inputs.a }}
      - uses: actions/checkout@v4
      - name: Third
        run: |
          echo ${{ inputs.b }}
          echo ${{ inputs.c }}
      - uses: actions/github-script@v7
        with:
          script: console.log('${{ inputs.d }}')
"#,
        )?;

        assert_eq!(
            analyze_workflow(&workflow, &AllMatcher),
            [
                violation("test", "#0", "${{ inputs.a }}", "ADES100"),
                violation("test", "Third", "${{ inputs.b }}", "ADES100"),
                violation("test", "Third", "${{ inputs.c }}", "ADES100"),
                violation("test", "#3", "${{ inputs.d }}", "ADES101"),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_composite_action() -> anyhow::Result<()> {
        let action = Action::from_yaml(
            r#"
name: Example
runs:
  using: composite
  steps:
    - uses: actions/github-script@v6
      with:
        script: console.log('${{ inputs.value }}')
"#,
        )?;

        assert_eq!(
            analyze_manifest(&action, &AllMatcher),
            [violation("", "#0", "${{ inputs.value }}", "ADES101")]
        );

        Ok(())
    }

    #[test]
    fn test_non_composite_action() -> anyhow::Result<()> {
        let action = Action::from_yaml(
            r#"
runs:
  using: node20
  main: index.js
  steps:
    - run: echo ${{ inputs.value }}
"#,
        )?;

        assert!(analyze_manifest(&action, &AllMatcher).is_empty());

        Ok(())
    }

    #[test]
    fn test_version_gated_rule() -> anyhow::Result<()> {
        for (version, expected) in [
            ("v1.0.0", 1),
            ("v1.0.1", 0),
            ("v1", 0),
            ("main", 0),
            // Pins documented with a version comment.
            ("0123456789abcdef0123456789abcdef01234567 # v1.0.0", 1),
            ("0123456789abcdef0123456789abcdef01234567 # v1.0.1", 0),
            ("main # v1.0.0", 1),
            // An abbreviated version is still a version, so the comment
            // doesn't stand in for it.
            ("v1 # v1.0.0", 0),
            ("v1.0 # v1.0.0", 0),
        ] {
            let workflow = Workflow::from_yaml(&format!(
                r#"
jobs:
  tag:
    steps:
      - uses: ericcornelissen/git-tag-annotation-action@{version}
        with:
          tag: ${{{{ inputs.x }}}}
"#
            ))?;

            let violations = analyze_workflow(&workflow, &AllMatcher);
            assert_eq!(violations.len(), expected, "{version}");
            assert!(violations.iter().all(|v| v.rule_id == "ADES200"));
        }

        Ok(())
    }

    #[test]
    fn test_safe_expressions() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  test:
    steps:
      - run: echo ${{ true }} ${{ 'hello' }} ${{ always() }}
      - if: ${{ success() }}
        run: echo ${{ hashFiles('**/*.lock') }} ${{ false || inputs.x }}
"#,
        )?;

        assert_eq!(
            analyze_workflow(&workflow, &AllMatcher),
            [violation("test", "#1", "${{ false || inputs.x }}", "ADES100")]
        );

        Ok(())
    }

    #[test]
    fn test_matrix_suppression() -> anyhow::Result<()> {
        let safe = Workflow::from_yaml(
            r#"
jobs:
  test:
    strategy:
      matrix:
        runtime: ["14", "16"]
    steps:
      - run: echo ${{ matrix.runtime }}
      - run: echo ${{ matrix.runtime || 'latest' }}
"#,
        )?;
        assert!(analyze_workflow(&safe, &AllMatcher).is_empty());

        let unsafe_ = Workflow::from_yaml(
            r#"
jobs:
  test:
    strategy:
      matrix:
        runtime: ["14", "${{ inputs.x }}"]
    steps:
      - run: echo ${{ matrix.runtime }}
"#,
        )?;
        assert_eq!(
            analyze_workflow(&unsafe_, &AllMatcher),
            [violation("test", "#0", "${{ matrix.runtime }}", "ADES100")]
        );

        Ok(())
    }

    #[test]
    fn test_matrix_applies_to_action_inputs() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  test:
    strategy:
      matrix:
        greeting: [hello, hi]
    steps:
      - uses: actions/github-script@v7
        with:
          script: console.log('${{ matrix.greeting }} ${{ inputs.name }}')
"#,
        )?;

        assert_eq!(
            analyze_workflow(&workflow, &AllMatcher),
            [violation("test", "#0", "${{ inputs.name }}", "ADES101")]
        );

        Ok(())
    }

    #[test]
    fn test_conservative_matcher() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  test:
    steps:
      - run: |
          echo ${{ inputs.value }}
          echo ${{ github.event.issue.title }}
"#,
        )?;

        assert_eq!(analyze_workflow(&workflow, &AllMatcher).len(), 2);
        assert_eq!(
            analyze_workflow(&workflow, &ConservativeMatcher),
            [violation("test", "#0", "${{ github.event.issue.title }}", "ADES100")]
        );

        Ok(())
    }

    #[test]
    fn test_malformed_steps_are_skipped() -> anyhow::Result<()> {
        let workflow = Workflow::from_yaml(
            r#"
jobs:
  test:
    steps:
      - run: [not, a, script]
      - just a string
      - uses: "@"
      - name: Last
        run: echo ${{ inputs.value }}
"#,
        )?;

        assert_eq!(
            analyze_workflow(&workflow, &AllMatcher),
            [violation("test", "Last", "${{ inputs.value }}", "ADES100")]
        );

        Ok(())
    }

    #[test]
    fn test_analyze_source() -> anyhow::Result<()> {
        let workflow = "jobs:\n  test:\n    steps:\n      - run: echo ${{ inputs.value }}\n";
        assert_eq!(
            analyze_source(workflow, &AllMatcher)?,
            [violation("test", "#0", "${{ inputs.value }}", "ADES100")]
        );

        let action = r#"
runs:
  using: composite
  steps:
    - run: echo ${{ inputs.value }}
"#;
        assert_eq!(
            analyze_source(action, &AllMatcher)?,
            [violation("", "#0", "${{ inputs.value }}", "ADES100")]
        );

        // Workflows without violations are never retried as actions.
        let clean = "jobs:\n  test:\n    steps:\n      - run: echo hello\n";
        assert!(analyze_source(clean, &AllMatcher)?.is_empty());

        assert!(analyze_source("", &AllMatcher)?.is_empty());
        assert!(analyze_source("- a\n- b\n", &AllMatcher).is_err());

        Ok(())
    }
}
