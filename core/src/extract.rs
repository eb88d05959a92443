//! Document feature extraction.
//!
//! One document in, one named scalar out: the language-model score of the
//! document's sentinel-wrapped character trigram sequence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ngram::NGramModel;
use crate::tokenize::{ngrams, wrap_sentinels, NGRAM_WIDTH};
use crate::Config;

/// Name of the emitted feature.
pub const LM_PROB: &str = "LanguageModelProbability";

/// A named numeric feature handed back to the classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub value: f64,
}

impl Feature {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Scores documents against a loaded n-gram model.
///
/// The model is loaded once at construction and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Extractor {
    model: NGramModel,
    ignore_case: bool,
}

impl Extractor {
    pub fn new(model: NGramModel, ignore_case: bool) -> Self {
        Self { model, ignore_case }
    }

    /// Build an extractor from configuration, loading the binary model at
    /// `binary_lm_file`. A missing or invalid model aborts construction.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config
            .binary_lm_file
            .as_ref()
            .context("binary_lm_file is not configured")?;
        let model = NGramModel::load_binary(path)
            .with_context(|| format!("initialize extractor from {}", path.display()))?;
        Ok(Self::new(model, config.ignore_case))
    }

    pub fn model(&self) -> &NGramModel {
        &self.model
    }

    /// Extract the single `LanguageModelProbability` feature for a document.
    ///
    /// When `ignore_case` is set (the default) the text is lowercased
    /// first, matching the offline training convention where corpora are
    /// lowercased before windowing.
    pub fn extract(&self, text: &str) -> Result<Vec<Feature>> {
        let text = if self.ignore_case {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let wrapped = wrap_sentinels(&text);
        let symbols = ngrams(&wrapped, NGRAM_WIDTH);
        let score = self.model.score_sentence(&symbols);
        Ok(vec![Feature::new(LM_PROB, score)])
    }
}
