//! "plain" (i.e. human-readable) output.

use std::io;

use itertools::Itertools as _;

use crate::{analyze::Violation, registry::Report, rules::find_rule};

pub(crate) fn output(
    mut sink: impl io::Write,
    report: &Report,
    suggestions: bool,
) -> io::Result<()> {
    let targets = report.targets();

    for (idx, (target, files)) in targets.iter().enumerate() {
        if idx > 0 {
            writeln!(sink)?;
        }

        if targets.len() > 1 {
            writeln!(sink, "[{target}]")?;
        }

        let mut clean = true;
        for (file, violations) in files {
            if violations.is_empty() {
                continue;
            }

            clean = false;
            writeln!(
                sink,
                "Detected {n} violation(s) in {file:?}:",
                n = violations.len()
            )?;
            render_file(&mut sink, violations, suggestions)?;
        }

        if clean {
            writeln!(sink, "Ok")?;
        }
    }

    Ok(())
}

fn render_file(
    sink: &mut impl io::Write,
    violations: &[Violation],
    suggestions: bool,
) -> io::Result<()> {
    let by_job = violations
        .iter()
        .into_group_map_by(|violation| violation.job_id.as_str());

    for (job, violations) in by_job.into_iter().sorted_by_key(|(job, _)| *job) {
        if !job.is_empty() {
            writeln!(sink, "  {n} in job {job:?}:", n = violations.len())?;
        }

        for violation in violations {
            render_violation(sink, violation, suggestions)?;
        }
    }

    Ok(())
}

fn render_violation(
    sink: &mut impl io::Write,
    violation: &Violation,
    suggestions: bool,
) -> io::Result<()> {
    write!(
        sink,
        "    step {step:?} contains {problem:?}",
        step = violation.step_id,
        problem = violation.problem
    )?;

    match find_rule(violation.rule_id).filter(|_| suggestions) {
        Some(rule) => {
            writeln!(sink, ", suggestion:")?;
            for line in rule.suggestion_lines(&violation.problem) {
                writeln!(sink, "      {line}")?;
            }
        }
        None => writeln!(sink, " ({rule})", rule = violation.rule_id)?,
    }

    Ok(())
}
