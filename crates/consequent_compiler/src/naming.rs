//! Uniquifying tokens for generated artifact names.
//!
//! Every generated consequence invoker and rule-unit class carries a random
//! token so that repeated generations in one namespace, and unrelated units
//! compiled concurrently, never collide.
//!
//! # Example
//!
//! ```
//! use consequent_compiler::naming::TokenSource;
//!
//! let tokens = TokenSource::seeded(7);
//! let a = tokens.next_token();
//! let b = tokens.next_token();
//! assert_ne!(a, b);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniquifying name tokens.
#[derive(Clone, Default)]
pub enum TokenSource {
    /// Thread-local random generator; no shared state between threads.
    #[default]
    Random,
    /// Seeded stream shared by every clone, for reproducible output.
    Seeded(Arc<Mutex<ChaCha8Rng>>),
}

impl TokenSource {
    /// Creates the thread-local random source.
    #[must_use]
    pub const fn random() -> Self {
        Self::Random
    }

    /// Creates a reproducible source from a seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))))
    }

    /// Draws the next token.
    ///
    /// Tokens are non-negative and fit in an `i64`.
    #[must_use]
    pub fn next_token(&self) -> u64 {
        let raw = match self {
            Self::Random => rand::thread_rng().next_u64(),
            Self::Seeded(rng) => rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .next_u64(),
        };
        raw >> 1
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "TokenSource::Random"),
            Self::Seeded(_) => write!(f, "TokenSource::Seeded"),
        }
    }
}

/// Replaces every character that cannot appear in an identifier with `_`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
