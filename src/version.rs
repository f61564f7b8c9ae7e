//! Build and version metadata embedded by `build.rs`.

use serde::Serialize;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";

/// Where and from what this binary was built.
///
/// Fields read "unknown" when the build ran outside a git checkout (source
/// tarballs, vendored builds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub sha: &'static str,
    pub dirty: bool,
    pub built_at: &'static str,
    pub target: &'static str,
}

impl BuildInfo {
    /// Metadata of the running build.
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            branch: or_unknown(option_env!("VERGEN_GIT_BRANCH")),
            sha: or_unknown(option_env!("VERGEN_GIT_SHA")),
            dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
            built_at: or_unknown(option_env!("VERGEN_BUILD_TIMESTAMP")),
            target: or_unknown(option_env!("VERGEN_CARGO_TARGET_TRIPLE")),
        }
    }

    /// First seven characters of the commit SHA.
    pub fn short_sha(&self) -> &'static str {
        let sha = self.sha;
        &sha[..7.min(sha.len())]
    }

    /// `{version}+{branch}.{sha7}`, with `.dirty` appended for dirty trees.
    pub fn version_string(&self) -> String {
        let dirty = if self.dirty { ".dirty" } else { "" };
        format!("{}+{}.{}{dirty}", self.version, self.branch, self.short_sha())
    }
}

fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(value) => value,
        None => UNKNOWN,
    }
}

/// Version string of the running build.
pub fn version_string() -> String {
    BuildInfo::current().version_string()
}
