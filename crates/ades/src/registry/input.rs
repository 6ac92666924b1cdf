//! Input discovery and loading.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use github_actions_models::{ModelError, action::Action, workflow::Workflow};
use ignore::WalkBuilder;
use thiserror::Error;

use crate::{
    analyze::{Violation, analyze_manifest, analyze_source, analyze_workflow},
    expr::ExprMatcher,
};

/// The name used as both target and file for standard input.
pub(crate) const STDIN: &str = "stdin";

#[derive(Error, Debug)]
pub(crate) enum InputError {
    /// The input couldn't be found or read.
    #[error("couldn't read {path}: {source}")]
    NotFound {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The input was read, but isn't a valid document of its kind.
    #[error("couldn't parse {path} as {kind}: {source}")]
    NotParsed {
        path: String,
        kind: InputKind,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum InputKind {
    /// A workflow file.
    Workflow,
    /// An action definition.
    Action,
    /// Either of the above; workflows are tried first.
    Unknown,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::Workflow => write!(f, "workflow"),
            InputKind::Action => write!(f, "action"),
            InputKind::Unknown => write!(f, "workflow or action"),
        }
    }
}

/// Identifies an input in a report: the target it was collected from,
/// and its path relative to that target.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub(crate) struct InputKey {
    pub(crate) target: String,
    pub(crate) file: String,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Source {
    Stdin,
    File(Utf8PathBuf),
}

/// A collected input, not yet read.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Input {
    pub(crate) key: InputKey,
    pub(crate) kind: InputKind,
    source: Source,
}

impl Input {
    fn stdin() -> Self {
        Self {
            key: InputKey {
                target: STDIN.into(),
                file: STDIN.into(),
            },
            kind: InputKind::Unknown,
            source: Source::Stdin,
        }
    }

    fn file(target: &str, file: String, kind: InputKind, path: Utf8PathBuf) -> Self {
        Self {
            key: InputKey {
                target: target.into(),
                file,
            },
            kind,
            source: Source::File(path),
        }
    }

    fn read(&self) -> Result<String, InputError> {
        let contents = match &self.source {
            Source::Stdin => io::read_to_string(io::stdin()),
            Source::File(path) => std::fs::read_to_string(path),
        };

        contents.map_err(|source| InputError::NotFound {
            path: self.key.file.clone(),
            source,
        })
    }

    /// Reads this input and analyzes it according to its kind.
    pub(crate) fn analyze(&self, matcher: &dyn ExprMatcher) -> Result<Vec<Violation>, InputError> {
        let contents = self.read()?;

        let violations = match self.kind {
            InputKind::Workflow => {
                Workflow::from_yaml(&contents).map(|workflow| analyze_workflow(&workflow, matcher))
            }
            InputKind::Action => {
                Action::from_yaml(&contents).map(|action| analyze_manifest(&action, matcher))
            }
            InputKind::Unknown => analyze_source(&contents, matcher),
        };

        violations.map_err(|source| InputError::NotParsed {
            path: self.key.file.clone(),
            kind: self.kind,
            source,
        })
    }
}

fn is_action_file(path: &Utf8Path) -> bool {
    matches!(path.file_name(), Some("action.yml" | "action.yaml"))
}

/// Collects the inputs for a single target: standard input (`-`),
/// a single file, or a directory.
pub(crate) fn collect_target(target: &str) -> Result<Vec<Input>, InputError> {
    if target == "-" {
        return Ok(vec![Input::stdin()]);
    }

    let path = Utf8Path::new(target);
    let metadata = std::fs::metadata(path).map_err(|source| InputError::NotFound {
        path: target.into(),
        source,
    })?;

    if metadata.is_dir() {
        Ok(collect_from_dir(target, path))
    } else {
        Ok(vec![collect_from_file(target, path)])
    }
}

fn collect_from_file(target: &str, path: &Utf8Path) -> Input {
    let kind = if path
        .parent()
        .is_some_and(|dir| dir.ends_with(".github/workflows"))
    {
        InputKind::Workflow
    } else if is_action_file(path) {
        InputKind::Action
    } else {
        InputKind::Workflow
    };

    tracing::debug!("collected {path} as {kind}");
    Input::file(target, target.into(), kind, path.to_path_buf())
}

fn collect_from_dir(target: &str, root: &Utf8Path) -> Vec<Input> {
    let workflows_dir = root.join(".github").join("workflows");

    // Walk everything, including hidden directories like `.github`,
    // except for `.git` itself.
    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut inputs = vec![];
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry in {target}: {e}");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let Ok(path) = <&Utf8Path>::try_from(entry.path()) else {
            tracing::warn!(
                "skipping non-UTF-8 path: {path}",
                path = entry.path().display()
            );
            continue;
        };

        let kind = if path.parent() == Some(workflows_dir.as_path())
            && matches!(path.extension(), Some("yml" | "yaml"))
        {
            InputKind::Workflow
        } else if is_action_file(path) {
            InputKind::Action
        } else {
            tracing::trace!("skipping {path}");
            continue;
        };

        let file = path.strip_prefix(root).unwrap_or(path).to_string();
        tracing::debug!("collected {path} as {kind}");
        inputs.push(Input::file(target, file, kind, path.to_path_buf()));
    }

    inputs
}
