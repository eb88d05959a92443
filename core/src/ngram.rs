//! Compact backoff n-gram model over character windows.
//!
//! Probabilities are stored as base-10 logarithms, following the ARPA
//! convention. Lookup walks down the orders: an unseen n-gram costs the
//! context's backoff weight plus the lower-order estimate, until the
//! unigram table (or the `<unk>` entry / out-of-vocabulary floor) answers.
//!
//! The model is immutable once loaded; scoring is a pure function of the
//! model and the input sequence, so concurrent readers need no
//! synchronization.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

use crate::arpa::ArpaModel;

/// Symbol reserved for windows never seen in training.
pub const UNK: &str = "<unk>";

/// Floor log10-probability for symbols absent from the model entirely.
pub const OOV_LOG_PROB: f64 = -20.0;

/// Conditional log10 probability plus the log10 backoff weight charged when
/// this n-gram is extended by an unseen continuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbBackoff {
    pub log_prob: f64,
    pub backoff: f64,
}

impl ProbBackoff {
    pub fn new(log_prob: f64, backoff: f64) -> Self {
        Self { log_prob, backoff }
    }
}

/// Compiled n-gram language model.
///
/// `tables[k]` maps (k+1)-gram symbol sequences to their probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NGramModel {
    order: usize,
    tables: Vec<HashMap<Vec<String>, ProbBackoff>>,
}

impl NGramModel {
    pub fn new(order: usize) -> Self {
        assert!(order >= 1, "model order must be at least 1");
        Self {
            order,
            tables: vec![HashMap::new(); order],
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of stored n-grams of the given order (1-based).
    pub fn len(&self, order: usize) -> usize {
        self.tables[order - 1].len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.is_empty())
    }

    /// Insert an n-gram entry. The sequence length selects the table.
    pub fn insert(&mut self, symbols: Vec<String>, entry: ProbBackoff) {
        debug_assert!(!symbols.is_empty() && symbols.len() <= self.order);
        self.tables[symbols.len() - 1].insert(symbols, entry);
    }

    pub fn get(&self, symbols: &[String]) -> Option<ProbBackoff> {
        self.tables[symbols.len() - 1].get(symbols).copied()
    }

    /// Sum of conditional log10 probabilities of each symbol given up to
    /// `order - 1` preceding symbols. Returns 0.0 for an empty sequence.
    pub fn score_sentence(&self, symbols: &[String]) -> f64 {
        let mut score = 0.0;
        for i in 0..symbols.len() {
            let lo = i.saturating_sub(self.order - 1);
            score += self.conditional(&symbols[lo..i], &symbols[i]);
        }
        score
    }

    /// log10 P(symbol | context), backing off through shorter contexts.
    pub fn conditional(&self, context: &[String], symbol: &String) -> f64 {
        let mut key = Vec::with_capacity(context.len() + 1);
        key.extend_from_slice(context);
        key.push(symbol.clone());
        if let Some(e) = self.tables[key.len() - 1].get(&key) {
            return e.log_prob;
        }
        if context.is_empty() {
            return self.tables[0]
                .get(std::slice::from_ref(&UNK.to_string()))
                .map(|e| e.log_prob)
                .unwrap_or(OOV_LOG_PROB);
        }
        let bo = self.tables[context.len() - 1]
            .get(context)
            .map(|e| e.backoff)
            .unwrap_or(0.0);
        bo + self.conditional(&context[1..], symbol)
    }

    /// Compile an ARPA text model into the compact in-memory form.
    pub fn from_arpa(arpa: &ArpaModel) -> Self {
        let mut model = Self::new(arpa.order());
        for order in 1..=arpa.order() {
            for e in arpa.entries(order) {
                model.insert(
                    e.symbols.clone(),
                    ProbBackoff::new(e.log_prob, e.backoff.unwrap_or(0.0)),
                );
            }
        }
        model
    }

    /// Persist the model with bincode.
    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("create binary model {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)
            .with_context(|| format!("serialize binary model {}", path.display()))?;
        Ok(())
    }

    /// Load a bincode model written by [`save_binary`](Self::save_binary).
    ///
    /// A missing, unreadable, or corrupt file is a fatal initialization
    /// error; there is no degraded mode.
    pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("open binary model {}", path.display()))?;
        let reader = BufReader::new(file);
        let model: Self = bincode::deserialize_from(reader)
            .with_context(|| format!("deserialize binary model {}", path.display()))?;
        if model.order == 0 || model.tables.len() != model.order {
            bail!("binary model {} has inconsistent order", path.display());
        }
        debug!(
            order = model.order,
            unigrams = model.len(1),
            "loaded binary n-gram model"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    #[should_panic(expected = "model order must be at least 1")]
    fn zero_order_model_is_rejected() {
        NGramModel::new(0);
    }

    fn tiny_model() -> NGramModel {
        let mut m = NGramModel::new(2);
        m.insert(sym(&["a"]), ProbBackoff::new(-1.0, -0.5));
        m.insert(sym(&["b"]), ProbBackoff::new(-0.7, 0.0));
        m.insert(sym(&["a", "b"]), ProbBackoff::new(-0.2, 0.0));
        m
    }

    #[test]
    fn seen_bigram_uses_its_probability() {
        let m = tiny_model();
        // p(a) + p(b|a)
        let score = m.score_sentence(&sym(&["a", "b"]));
        assert!((score - (-1.2)).abs() < 1e-9);
    }

    #[test]
    fn unseen_bigram_backs_off() {
        let m = tiny_model();
        // p(b) + bo(b) + p(a) = -0.7 + 0.0 + -1.0
        let score = m.score_sentence(&sym(&["b", "a"]));
        assert!((score - (-1.7)).abs() < 1e-9);
    }

    #[test]
    fn oov_symbol_charges_backoff_plus_floor() {
        let m = tiny_model();
        // p(a) + bo(a) + floor = -1.0 + -0.5 + OOV_LOG_PROB
        let score = m.score_sentence(&sym(&["a", "x"]));
        assert!((score - (-1.5 + OOV_LOG_PROB)).abs() < 1e-9);
    }

    #[test]
    fn unk_entry_replaces_floor() {
        let mut m = tiny_model();
        m.insert(sym(&[UNK]), ProbBackoff::new(-3.0, 0.0));
        let score = m.score_sentence(&sym(&["x"]));
        assert!((score - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_sequence_scores_zero() {
        let m = tiny_model();
        assert_eq!(m.score_sentence(&[]), 0.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let m = tiny_model();
        let seq = sym(&["a", "b", "a", "x", "b"]);
        assert_eq!(m.score_sentence(&seq), m.score_sentence(&seq));
    }

    #[test]
    fn binary_round_trip() {
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("charlm_test_model_{}.binary", stamp));

        let m = tiny_model();
        m.save_binary(&path).expect("save");
        let back = NGramModel::load_binary(&path).expect("load");
        assert_eq!(back.order(), 2);
        let seq = sym(&["a", "b"]);
        assert_eq!(back.score_sentence(&seq), m.score_sentence(&seq));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_model_file_fails() {
        let mut path = std::env::temp_dir();
        path.push("charlm_test_no_such_model.binary");
        assert!(NGramModel::load_binary(&path).is_err());
    }
}
