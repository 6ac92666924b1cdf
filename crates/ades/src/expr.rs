//! Finding template expressions (`${{ ... }}`) in strings.

use std::sync::LazyLock;

use regex::Regex;

/// Matches every template expression, lazily, so that
/// `${{ a }} ${{ b }}` produces two matches rather than one.
#[allow(clippy::unwrap_used)]
static ANY_EXPR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\$\{\{.*?\}\}").unwrap());

/// Characters that can separate the operands of an expression.
const BOUNDARY: &str = r"[\s,|&!=()<>]";

/// Builds a pattern that matches `operand` as a whole operand inside an
/// expression, capturing everything around it as `leading` and `trailing`.
fn operand_in_expr(operand: &str) -> String {
    format!(
        r"(?s)(?P<leading>\$\{{\{{(?:.*?{BOUNDARY}|)){operand}(?P<trailing>(?:{BOUNDARY}.*?|)\}}\}})"
    )
}

/// Matches a literal operand: a boolean, `null`, a number, or a string.
#[allow(clippy::unwrap_used)]
static LITERAL_IN_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&operand_in_expr(
        r"(?:true|false|null|-?\d+(?:\.\d+)?|0x[0-9A-Fa-f]+|-?\d+\.\d+e-?\d+|'[^']+')",
    ))
    .unwrap()
});

/// Matches a call to a function whose result can't carry attacker
/// input: status checks and predicates with any arguments, and
/// formatting functions with no arguments left.
#[allow(clippy::unwrap_used)]
static SAFE_FUNCTION_IN_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&operand_in_expr(
        r"(?:(?:always|cancelled|contains|endsWith|failure|hashFiles|success|startsWith)\((?:[^,]*,)*[^,)]*\)|(?:format|fromJSON|join|toJSON)\([\s,]*\))",
    ))
    .unwrap()
});

/// Matches an expression with no operands left in it, e.g. `${{  }}`
/// or `${{ ( || ) }}`.
#[allow(clippy::unwrap_used)]
static EMPTY_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\$\{{\{{{BOUNDARY}*\}}\}}")).unwrap());

/// Matches any context reference that an attacker can fully control,
/// e.g. the title of an issue they opened.
///
/// The leading and trailing groups keep longer identifiers that share
/// a prefix (`github.head_refs`, `xgithub.head_ref`) from matching.
#[allow(clippy::unwrap_used)]
static ATTACKER_CONTROLLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:^|[^A-Za-z0-9_.\-])
        (?:
            github\.event\.issue\.(?:title|body)
          | github\.event\.discussion\.(?:title|body)
          | github\.event\.comment\.body
          | github\.event\.review\.body
          | github\.event\.review_comment\.body
          | github\.event\.pages\[(?:\d+|\*)\]\.page_name
          | github\.event\.commits\[(?:\d+|\*)\]\.(?:message|author\.email|author\.name)
          | github\.event\.head_commit\.(?:message|author\.email|author\.name|committer\.email)
          | github\.event\.workflow_run\.head_branch
          | github\.event\.workflow_run\.head_commit\.(?:message|author\.email|author\.name)
          | github\.event\.pull_request\.(?:title|body|head\.label|head\.repo\.default_branch|head\.ref)
          | github\.head_ref
          | github\.event\.workflow_run\.pull_requests\[(?:\d+|\*)\]\.head\.ref
        )
        (?:[^A-Za-z0-9_\-]|$)
        ",
    )
    .unwrap()
});

/// A policy for finding template expressions.
///
/// Implementations return matches in source order. Matches never overlap,
/// and each one includes its `${{` and `}}` delimiters.
pub(crate) trait ExprMatcher: Send + Sync {
    fn find_all<'a>(&self, input: &'a str) -> Vec<&'a str>;
}

/// Finds every template expression, regardless of what it references.
pub(crate) struct AllMatcher;

impl ExprMatcher for AllMatcher {
    fn find_all<'a>(&self, input: &'a str) -> Vec<&'a str> {
        ANY_EXPR
            .find_iter(input)
            .map(|m| m.as_str())
            .filter(|expr| !is_safe(expr))
            .collect()
    }
}

/// Finds only template expressions that reference at least one
/// value known to be attacker-controllable.
///
/// Composite expressions count if any of their operands does,
/// so `${{ github.head_ref || 'main' }}` is matched.
pub(crate) struct ConservativeMatcher;

impl ExprMatcher for ConservativeMatcher {
    fn find_all<'a>(&self, input: &'a str) -> Vec<&'a str> {
        AllMatcher
            .find_all(input)
            .into_iter()
            .filter(|expr| ATTACKER_CONTROLLED.is_match(expr))
            .collect()
    }
}

/// Removes every literal and safe function call from the expressions in
/// `input`, and then every expression left without operands.
///
/// Removing one operand can expose another (`contains('a', 'b')` only
/// matches once its literal arguments are gone), so this repeats until
/// nothing changes.
fn strip_safe(input: &str) -> String {
    let mut stripped = input.to_string();
    loop {
        let mut next = stripped.clone();
        for pattern in [&*LITERAL_IN_EXPR, &*SAFE_FUNCTION_IN_EXPR] {
            next = pattern
                .replace_all(&next, "${leading}${trailing}")
                .into_owned();
        }

        if next == stripped {
            break;
        }
        stripped = next;
    }

    EMPTY_EXPR.replace_all(&stripped, "").into_owned()
}

/// Returns whether `expr` is made up only of literals and safe function
/// calls.
fn is_safe(expr: &str) -> bool {
    !ANY_EXPR.is_match(&strip_safe(expr))
}
