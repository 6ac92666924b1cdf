//! Collecting the results of a run.

use std::{collections::BTreeMap, process::ExitCode};

use crate::{analyze::Violation, registry::input::InputKey};

pub(crate) mod input;

/// Everything found during a run, keyed by target and then by file.
#[derive(Debug, Default)]
pub(crate) struct Report {
    // NOTE: BTreeMaps keep targets and files in lexicographic order,
    // which is the order they're rendered in.
    targets: BTreeMap<String, BTreeMap<String, Vec<Violation>>>,
    errors: usize,
}

impl Report {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a target, so that it's reported on even if nothing in it
    /// could be analyzed.
    pub(crate) fn add_target(&mut self, target: &str) {
        self.targets.entry(target.into()).or_default();
    }

    /// Records the violations found in a single input.
    pub(crate) fn record(&mut self, key: &InputKey, violations: Vec<Violation>) {
        self.targets
            .entry(key.target.clone())
            .or_default()
            .insert(key.file.clone(), violations);
    }

    /// Records an input or target that couldn't be analyzed.
    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }

    pub(crate) fn targets(&self) -> &BTreeMap<String, BTreeMap<String, Vec<Violation>>> {
        &self.targets
    }

    /// Returns every violation along with the target and file it was
    /// found in.
    pub(crate) fn iter_violations(&self) -> impl Iterator<Item = (&str, &str, &Violation)> {
        self.targets.iter().flat_map(|(target, files)| {
            files.iter().flat_map(move |(file, violations)| {
                violations
                    .iter()
                    .map(move |violation| (target.as_str(), file.as_str(), violation))
            })
        })
    }

    pub(crate) fn violation_count(&self) -> usize {
        self.iter_violations().count()
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// The process status for this report: 1 if anything couldn't be
    /// analyzed, 2 if there are violations, and 0 otherwise.
    pub(crate) fn status(&self) -> u8 {
        if self.has_errors() {
            1
        } else if self.violation_count() > 0 {
            2
        } else {
            0
        }
    }

    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}
