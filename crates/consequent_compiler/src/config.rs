//! Configuration for the consequence and rule-unit compilers.

use crate::naming::TokenSource;

/// Package used for rules and units that do not name one.
pub const DEFAULT_PACKAGE: &str = "defaultpkg";

/// Configuration shared by [`ConsequenceCompiler`](crate::ConsequenceCompiler)
/// and [`RuleUnitCompiler`](crate::RuleUnitCompiler).
#[derive(Clone, Debug)]
pub struct CompilerConfig {
    /// Package for rules and units that do not name one.
    pub package: String,

    /// Where name tokens come from.
    pub tokens: TokenSource,

    /// Whether action body signatures are checked against the layout.
    pub verify_signatures: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            tokens: TokenSource::Random,
            verify_signatures: true,
        }
    }
}

impl CompilerConfig {
    /// Creates a configuration whose generated names repeat across runs.
    #[must_use]
    pub fn reproducible(seed: u64) -> Self {
        Self {
            tokens: TokenSource::seeded(seed),
            ..Self::default()
        }
    }

    /// Builder method to set the fallback package.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// Builder method to set the token source.
    #[must_use]
    pub fn with_tokens(mut self, tokens: TokenSource) -> Self {
        self.tokens = tokens;
        self
    }

    /// Builder method to enable/disable signature verification.
    #[must_use]
    pub fn with_signature_verification(mut self, verify: bool) -> Self {
        self.verify_signatures = verify;
        self
    }

    /// Returns `package` unless it is empty, in which case the fallback.
    #[must_use]
    pub fn package_or<'a>(&'a self, package: &'a str) -> &'a str {
        if package.is_empty() {
            &self.package
        } else {
            package
        }
    }
}
