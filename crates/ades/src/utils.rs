//! Helper routines.

use annotate_snippets::{Group, Level, Renderer};

/// Renders an error message with one or more follow-up notes, in the
/// same style as rustc's diagnostics.
pub(crate) fn tips(err: impl AsRef<str>, tips: &[impl AsRef<str>]) -> String {
    let group = tips.iter().fold(
        Group::with_title(Level::ERROR.primary_title(err.as_ref())),
        |group, tip| group.element(Level::NOTE.message(tip.as_ref())),
    );

    let renderer = Renderer::styled();
    format!("{}", renderer.render(&[group]))
}

/// Returns the name of the environment variable that an expression
/// would be hoisted into, i.e. the upper-cased last dotted segment
/// of the expression.
///
/// For example, `${{ github.event.issue.title }}` becomes `TITLE`.
pub(crate) fn env_var_name(expression: &str) -> String {
    let body = expression
        .trim_start_matches("${{")
        .trim_end_matches("}}")
        .trim();

    let name = match body.rfind('.') {
        Some(idx) => &body[idx + 1..],
        None => body,
    };

    name.to_uppercase()
}
