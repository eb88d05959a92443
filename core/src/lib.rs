//! charlm-core
//!
//! Character-level n-gram language-model scoring for text classification,
//! plus the offline pipeline that builds the model from a raw corpus.
//!
//! Public API:
//! - `Extractor` / `Feature` - per-document `LanguageModelProbability` feature
//! - `NGramModel` - compiled backoff model (bincode persisted)
//! - `ArpaModel` - ARPA text interchange format
//! - `KneserNey` - built-in smoothing estimator behind the `Estimator` trait
//! - `build_character_lm` - corpus → trigram corpus → ARPA → binary model
//! - `Config` - configuration and feature flags

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod tokenize;
pub use tokenize::{ngrams, wrap_sentinels, END_SENTINEL, MODEL_ORDER, NGRAM_WIDTH, START_SENTINEL};

pub mod ngram;
pub use ngram::{NGramModel, ProbBackoff, OOV_LOG_PROB, UNK};

pub mod arpa;
pub use arpa::{ArpaEntry, ArpaModel};

pub mod estimator;
pub use estimator::{Estimator, KneserNey};

pub mod extract;
pub use extract::{Extractor, Feature, LM_PROB};

pub mod builder;
pub use builder::{build_character_lm, generate_trigram_corpus, ModelPaths};

/// Extractor configuration.
///
/// Supplied explicitly to `Extractor::from_config`; there is no process-wide
/// configuration state.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Lowercase document text before scoring, matching the offline
    /// training convention (corpora are lowercased before windowing).
    pub ignore_case: bool,

    /// Path to the compiled binary model. Mandatory for extraction; there
    /// is no default location.
    pub binary_lm_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_case: true,
            binary_lm_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
