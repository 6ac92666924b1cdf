//! Parsing and comparison of versions, as they appear in
//! refs on GitHub Actions `uses:` directives.
//!
//! Only fully qualified `vX.Y.Z` versions are accepted: abbreviated
//! versions like `v1` or `v1.2` float across releases, and so can't be
//! placed before or after a fixed cutoff.

use std::{cmp::Ordering, sync::LazyLock};

use regex::Regex;

#[allow(clippy::unwrap_used)]
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)                          # verbose mode
        ^                                # start of string
        v                                # mandatory 'v' prefix
        (?<major>0|[1-9]\d*)             # major version number
        \.                               # literal dot separator
        (?<minor>0|[1-9]\d*)             # minor version number
        \.                               # literal dot separator
        (?<patch>0|[1-9]\d*)             # patch version number
        $                                # end of string
        "#,
    )
    .unwrap()
});

/// Any semantic version, including abbreviated (`v1`, `v1.2`) and
/// pre-release (`v1.2.3-rc.1`) ones.
#[allow(clippy::unwrap_used)]
static VERSION_LIKE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+(?:\.\d+){0,2}(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$").unwrap()
});

/// Returns whether `s` looks like a version, even if not a canonical one.
pub(crate) fn is_version_like(s: &str) -> bool {
    VERSION_LIKE_PATTERN.is_match(s)
}

#[derive(Debug, Eq)]
pub(crate) struct Version<'a> {
    /// The raw version, exactly as it appears in its source.
    raw: &'a str,
    major: u64,
    minor: u64,
    patch: u64,
}

impl<'a> Version<'a> {
    /// Parse a canonical version, i.e. `vX.Y.Z` without leading zeros.
    ///
    /// Returns an error on a parse failure, or if any component
    /// is too large to fit in a `u64`.
    pub(crate) fn parse(s: &'a str) -> anyhow::Result<Self> {
        let captures = VERSION_PATTERN
            .captures(s)
            .ok_or_else(|| anyhow::anyhow!("invalid version format: {s}"))?;

        let component = |name: &str| -> anyhow::Result<u64> {
            captures[name]
                .parse()
                .or_else(|e| anyhow::bail!("invalid {name} version in {s}: {e}"))
        };

        Ok(Self {
            raw: s,
            major: component("major")?,
            minor: component("minor")?,
            patch: component("patch")?,
        })
    }

    /// Return the raw version string, exactly as it was parsed.
    pub(crate) fn raw(&self) -> &'a str {
        self.raw
    }
}

impl Ord for Version<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for Version<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version<'_> {
    fn eq(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) == (other.major, other.minor, other.patch)
    }
}
