//! Extension traits for the `StepUses` APIs.

use github_actions_models::common::StepUses;

use crate::models::version::{Version, is_version_like};

pub(crate) trait StepUsesExt<'a> {
    /// Returns the version this `uses:` is pinned to, if it can be
    /// determined.
    ///
    /// This is the ref itself when it's a canonical version. When the ref
    /// isn't a version at all (a SHA or a branch), it's the trailing
    /// annotation when *that* is a canonical version, as in
    /// `uses: foo/bar@<sha> # v1.2.3`. Abbreviated versions like `v1` have
    /// no pinned version.
    fn pinned_version(&self) -> Option<Version<'a>>;

    /// Returns whether this `uses:` is pinned to a version strictly before
    /// `cutoff`. Unversioned refs are never before anything.
    fn is_before(&self, cutoff: &str) -> bool;

    /// Returns whether this `uses:` is pinned to `floor` or a later version.
    /// Unversioned refs are never at or after anything.
    fn is_at_or_after(&self, floor: &str) -> bool;
}

impl<'a> StepUsesExt<'a> for StepUses<'a> {
    fn pinned_version(&self) -> Option<Version<'a>> {
        if is_version_like(self.git_ref) {
            Version::parse(self.git_ref).ok()
        } else {
            Version::parse(self.annotation).ok()
        }
    }

    fn is_before(&self, cutoff: &str) -> bool {
        match (self.pinned_version(), Version::parse(cutoff)) {
            (Some(version), Ok(cutoff)) => version < cutoff,
            _ => false,
        }
    }

    fn is_at_or_after(&self, floor: &str) -> bool {
        match (self.pinned_version(), Version::parse(floor)) {
            (Some(version), Ok(floor)) => version >= floor,
            _ => false,
        }
    }
}
