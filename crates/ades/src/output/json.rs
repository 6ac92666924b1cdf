//! JSON output.
//!
//! The format is a single object with a flat `problems` array, one
//! element per violation, sorted by file:
//!
//! ```json
//! {"problems":[{"target":"repo","file":"action.yml","job":"","step":"#0","problem":"${{ inputs.value }}"}]}
//! ```

use std::io;

use serde::Serialize;

use crate::registry::Report;

#[derive(Serialize)]
struct Output<'a> {
    problems: Vec<Problem<'a>>,
}

#[derive(Serialize)]
struct Problem<'a> {
    target: &'a str,
    file: &'a str,
    job: &'a str,
    step: &'a str,
    problem: &'a str,
}

pub(crate) fn output(mut sink: impl io::Write, report: &Report) -> anyhow::Result<()> {
    let mut problems = report
        .iter_violations()
        .map(|(target, file, violation)| Problem {
            target,
            file,
            job: &violation.job_id,
            step: &violation.step_id,
            problem: &violation.problem,
        })
        .collect::<Vec<_>>();

    // Stable, so violations within a file keep their order.
    problems.sort_by_key(|problem| problem.file);

    serde_json::to_writer(&mut sink, &Output { problems })?;
    writeln!(sink)?;
    Ok(())
}
