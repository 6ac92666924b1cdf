//! Suppression of expressions that only expand to fixed matrix values.
//!
//! A job like
//!
//! ```yaml
//! strategy:
//!   matrix:
//!     runtime: ["14", "16"]
//! steps:
//!   - run: echo ${{ matrix.runtime }}
//! ```
//!
//! interpolates an expression into its script, but every value the
//! expression can take is known ahead of time and contains no further
//! expressions.

use std::sync::LazyLock;

use github_actions_models::workflow::{Matrix, MatrixValue};
use indexmap::IndexMap;
use regex::Regex;

use crate::expr::ExprMatcher;

#[allow(clippy::unwrap_used)]
static MATRIX_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"matrix\.[a-z._-]+").unwrap());

/// Returns whether `expr` is safe under `matrix`, i.e. whether every
/// matrix path in it resolves to one or more values, none of which contain
/// an expression, and nothing other than matrix paths is left in it.
pub(crate) fn is_matrix_safe(expr: &str, matrix: &Matrix, matcher: &dyn ExprMatcher) -> bool {
    for path in MATRIX_PATH.find_iter(expr) {
        let values = expand(matrix, path.as_str());
        if values.is_empty() {
            tracing::trace!("{path} has no known values", path = path.as_str());
            return false;
        }

        if values.iter().any(|value| !matcher.find_all(value).is_empty()) {
            tracing::trace!("{path} can expand to an expression", path = path.as_str());
            return false;
        }
    }

    // With every matrix path removed, only the expression's other operands
    // remain. The matcher ignores expressions left with no operands, or
    // with only literals and safe function calls.
    let residue = MATRIX_PATH.replace_all(expr, "");
    matcher.find_all(&residue).is_empty()
}

/// Expands a `matrix.<path>` into every value it can take, across both
/// the matrix's base dimensions and its `include` entries.
fn expand<'m>(matrix: &'m Matrix, path: &str) -> Vec<&'m str> {
    let components = path
        .strip_prefix("matrix.")
        .unwrap_or(path)
        .split('.')
        .collect::<Vec<_>>();

    let mut values = vec![];
    expand_map(&matrix.base, &components, &mut values);
    for include in &matrix.include {
        expand_map(include, &components, &mut values);
    }

    values
}

fn expand_map<'m>(
    map: &'m IndexMap<String, MatrixValue>,
    path: &[&str],
    values: &mut Vec<&'m str>,
) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };

    if let Some(value) = map.get(*head) {
        expand_value(value, tail, values);
    }
}

fn expand_value<'m>(value: &'m MatrixValue, path: &[&str], values: &mut Vec<&'m str>) {
    match value {
        // NOTE: A scalar ends the walk, even when the path has more
        // components left.
        MatrixValue::String(value) | MatrixValue::Scalar(value) => values.push(value),
        // Lists are exhaustive: each element is one possible value.
        MatrixValue::List(items) => {
            for item in items {
                expand_value(item, path, values);
            }
        }
        MatrixValue::Map(map) => expand_map(map, path, values),
    }
}
