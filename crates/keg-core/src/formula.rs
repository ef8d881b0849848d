//! TOML formula parsing
//!
//! Human-readable package-build recipes. A formula is authored once per
//! release and is read-only at install time: a new upstream version means a
//! new formula revision with a new version string and a new digest.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use keg_schema::{FormulaName, Sha256Digest, Version};

/// Conventional install-from-source entry point for Rust projects.
///
/// Matches what `cargo install` is given when packaging a crate from a
/// source checkout: the lockfile is honored and binaries land under
/// `$PREFIX/bin`.
pub const DEFAULT_BUILD_SCRIPT: &str = r#"cargo install --locked --root "$PREFIX" --path ."#;

/// Errors that can occur when loading or parsing a formula.
#[derive(Error, Debug)]
pub enum FormulaError {
    /// An I/O error occurred while reading a formula file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a valid formula.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The formula parsed but violates a structural invariant.
    #[error("Invalid formula: {0}")]
    Validation(String),
}

/// Metadata describing a formula's identity and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaInfo {
    /// Unique name that identifies this formula.
    pub name: FormulaName,
    /// Version of the packaged release. Must match what the installed
    /// binary reports via `--version`.
    pub version: Version,
    /// Short human-readable summary of the package.
    pub description: String,
    /// URL of the project's homepage.
    #[serde(default)]
    pub homepage: String,
    /// SPDX license identifier for the package.
    #[serde(default)]
    pub license: String,
}

/// Location and integrity information for the source archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Download URL for the `.tar.gz` source archive.
    pub url: String,
    /// Expected SHA-256 digest of the downloaded archive, byte-exact.
    pub sha256: Sha256Digest,
}

/// Build configuration: required tools and the script that produces `$PREFIX`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Build-time tools that must be resolvable on `PATH` before the
    /// script runs (e.g. `cargo`). Not needed by the installed binary.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Build script run via `/bin/sh -c` with cwd at the extracted source
    /// root. Defaults to [`DEFAULT_BUILD_SCRIPT`].
    #[serde(default)]
    pub script: Option<String>,
}

/// Installation specification controlling which built files are linked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallSpec {
    /// Binaries (relative to `$PREFIX`) to link into the keg bin directory.
    /// Defaults to `bin/<name>`.
    #[serde(default)]
    pub bin: Option<Vec<String>>,
}

impl InstallSpec {
    /// Returns the effective list of binaries to link, falling back to
    /// `bin/<name>` when none are explicitly configured.
    pub fn effective_bin(&self, name: &FormulaName) -> Vec<String> {
        self.bin
            .clone()
            .unwrap_or_else(|| vec![format!("bin/{name}")])
    }
}

/// A single post-install smoke check.
///
/// The installed binary is run with `args`; its stdout must contain the
/// `expect` substring. Presence only: no exit-code interpretation beyond
/// the command succeeding, no structured parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeCheck {
    /// Arguments passed to the installed binary.
    pub args: Vec<String>,
    /// Literal substring asserted against the binary's stdout.
    pub expect: String,
}

/// Post-install verification block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifySpec {
    /// Checks run in order after install; the first failure aborts.
    #[serde(default)]
    pub checks: Vec<SmokeCheck>,
}

/// Complete formula combining metadata, source, build, install, and
/// verification sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Core metadata (name, version, description, homepage, license).
    pub package: FormulaInfo,
    /// Source archive location and integrity data.
    pub source: Source,
    /// Build-time dependencies and script.
    #[serde(default)]
    pub build: BuildSpec,
    /// Which built files to link.
    #[serde(default)]
    pub install: InstallSpec,
    /// Post-install smoke checks.
    #[serde(default)]
    pub verify: Option<VerifySpec>,
}

impl Formula {
    /// Parse a formula from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns `FormulaError::Io` if the file cannot be read, or
    /// `FormulaError::Parse` if the TOML content is invalid.
    pub fn from_file(path: &Path) -> Result<Self, FormulaError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a formula from a TOML string.
    pub fn parse(content: &str) -> Result<Self, FormulaError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize this formula to a pretty-printed TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `toml::ser::Error` if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check the structural invariants a publishable formula must satisfy.
    ///
    /// The digest shape is already enforced by [`Sha256Digest`] at parse
    /// time; this covers everything TOML typing cannot express.
    pub fn validate(&self) -> Result<(), FormulaError> {
        if self.package.name.is_empty() {
            return Err(FormulaError::Validation("package.name is empty".into()));
        }
        if self.package.version.is_empty() {
            return Err(FormulaError::Validation("package.version is empty".into()));
        }
        if self.package.description.is_empty() {
            return Err(FormulaError::Validation(
                "package.description is empty".into(),
            ));
        }
        if !self.source.url.starts_with("http://") && !self.source.url.starts_with("https://") {
            return Err(FormulaError::Validation(format!(
                "source.url must be http(s): {}",
                self.source.url
            )));
        }
        if !self.homepage_ok() {
            return Err(FormulaError::Validation(format!(
                "package.homepage must be http(s): {}",
                self.package.homepage
            )));
        }
        if let Some(verify) = &self.verify {
            for (i, check) in verify.checks.iter().enumerate() {
                if check.expect.is_empty() {
                    return Err(FormulaError::Validation(format!(
                        "verify.checks[{i}].expect is empty"
                    )));
                }
            }
        }
        if let Some(script) = &self.build.script {
            if script.trim().is_empty() {
                return Err(FormulaError::Validation("build.script is empty".into()));
            }
        }
        Ok(())
    }

    fn homepage_ok(&self) -> bool {
        self.package.homepage.is_empty()
            || self.package.homepage.starts_with("http://")
            || self.package.homepage.starts_with("https://")
    }

    /// The build script to run, falling back to the conventional Cargo
    /// entry point.
    pub fn build_script(&self) -> &str {
        self.build.script.as_deref().unwrap_or(DEFAULT_BUILD_SCRIPT)
    }

    /// The smoke checks to run after install.
    ///
    /// When the formula declares none, a single default check asserts that
    /// `--version` output contains `"<name> <version>"`.
    pub fn effective_checks(&self) -> Vec<SmokeCheck> {
        match &self.verify {
            Some(v) if !v.checks.is_empty() => v.checks.clone(),
            _ => vec![SmokeCheck {
                args: vec!["--version".to_string()],
                expect: format!("{} {}", self.package.name, self.package.version),
            }],
        }
    }
}

impl std::str::FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_FORMULA: &str = r#"
[package]
name = "work-tuimer"
version = "0.3.0"
description = "Simple, keyboard-driven TUI for time-tracking"
homepage = "https://github.com/Kamyil/work-tuimer"
license = "MIT"

[source]
url = "https://github.com/Kamyil/work-tuimer/archive/refs/tags/v0.3.0.tar.gz"
sha256 = "468577cf23cab371261b2896568a539bb0bdbcdbaa0711c1653c17cb1949a6c3"

[build]
dependencies = ["cargo"]

[[verify.checks]]
args = ["--version"]
expect = "work-tuimer 0.3.0"

[[verify.checks]]
args = ["--help"]
expect = "Simple, keyboard-driven TUI"
"#;

    #[test]
    fn test_parse_formula() {
        let f = Formula::parse(EXAMPLE_FORMULA).unwrap();

        assert_eq!(f.package.name, FormulaName::from("work-tuimer"));
        assert_eq!(f.package.version, Version::from("0.3.0"));
        assert_eq!(
            f.source.sha256.as_str(),
            "468577cf23cab371261b2896568a539bb0bdbcdbaa0711c1653c17cb1949a6c3"
        );
        assert_eq!(f.build.dependencies, vec!["cargo"]);
        assert_eq!(f.verify.as_ref().unwrap().checks.len(), 2);
        f.validate().unwrap();
    }

    #[test]
    fn test_default_build_script() {
        let f = Formula::parse(EXAMPLE_FORMULA).unwrap();
        assert_eq!(f.build_script(), DEFAULT_BUILD_SCRIPT);
    }

    #[test]
    fn test_effective_bin_defaults_to_name() {
        let f = Formula::parse(EXAMPLE_FORMULA).unwrap();
        assert_eq!(
            f.install.effective_bin(&f.package.name),
            vec!["bin/work-tuimer".to_string()]
        );
    }

    #[test]
    fn test_default_smoke_check_when_verify_absent() {
        let trimmed = r#"
[package]
name = "jq"
version = "1.7"
description = "Command-line JSON processor"

[source]
url = "https://example.com/jq-1.7.tar.gz"
sha256 = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
"#;
        let f = Formula::parse(trimmed).unwrap();
        let checks = f.effective_checks();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].args, vec!["--version"]);
        assert_eq!(checks[0].expect, "jq 1.7");
    }

    #[test]
    fn test_parse_malformed_toml() {
        let bad_toml = "this is not valid toml {{{";
        assert!(Formula::parse(bad_toml).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_digest() {
        let bad_digest = r#"
[package]
name = "x"
version = "1.0"
description = "x"

[source]
url = "https://example.com/x.tar.gz"
sha256 = "deadbeef"
"#;
        let result = Formula::parse(bad_digest);
        assert!(matches!(result, Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_parse_missing_required_fields() {
        // Missing [package] section
        let incomplete = r#"
[source]
url = "https://example.com"
sha256 = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
"#;
        assert!(Formula::parse(incomplete).is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let ftp = EXAMPLE_FORMULA.replace(
            "https://github.com/Kamyil/work-tuimer/archive/refs/tags/v0.3.0.tar.gz",
            "ftp://example.com/x.tar.gz",
        );
        let f = Formula::parse(&ftp).unwrap();
        assert!(matches!(f.validate(), Err(FormulaError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_description() {
        let mut f = Formula::parse(EXAMPLE_FORMULA).unwrap();
        f.package.description = String::new();
        assert!(matches!(f.validate(), Err(FormulaError::Validation(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let f = Formula::parse(EXAMPLE_FORMULA).unwrap();
        let serialized = f.to_toml().unwrap();
        let reparsed = Formula::parse(&serialized).unwrap();
        assert_eq!(reparsed.package.name, f.package.name);
        assert_eq!(reparsed.source.sha256, f.source.sha256);
    }
}
