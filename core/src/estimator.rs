//! Interpolated modified Kneser-Ney estimation over a symbol corpus.
//!
//! Discounts D1/D2/D3+ are derived per order from counts-of-counts
//! (Chen & Goodman), lower orders use continuation counts, and the
//! discounted mass of each context becomes its backoff weight. Leftover
//! unigram mass goes to `<unk>`.

use ahash::RandomState;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::arpa::{ArpaEntry, ArpaModel};
use crate::ngram::UNK;

type Key = Vec<String>;

type Map<K, V> = std::collections::HashMap<K, V, RandomState>;

/// Narrow interface to the model-fitting step. Anything that can turn a
/// symbol corpus into a smoothed ARPA model can stand behind it.
pub trait Estimator {
    /// Estimate a model of the given order from a corpus holding one
    /// whitespace-separated symbol sequence per line.
    fn fit(&self, corpus: &Path, order: usize) -> Result<ArpaModel>;
}

/// The built-in interpolated modified Kneser-Ney estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct KneserNey;

impl Estimator for KneserNey {
    fn fit(&self, corpus: &Path, order: usize) -> Result<ArpaModel> {
        if order < 2 {
            bail!("model order must be at least 2, got {}", order);
        }
        let raw = count_ngrams(corpus, order)?;
        if raw[0].is_empty() {
            bail!("corpus {} contains no symbols", corpus.display());
        }
        let adjusted = adjusted_counts(&raw);

        // probs[k] holds linear (k+1)-gram probabilities; gammas[k] holds
        // the backoff mass attached to (k+1)-gram contexts.
        let mut probs: Vec<Map<Key, f64>> = Vec::with_capacity(order);
        let mut gammas: Vec<Map<Key, f64>> = vec![Map::default(); order - 1];

        // Unigrams: continuation counts interpolated with the uniform
        // distribution over the vocabulary plus <unk>.
        let d = discounts(&adjusted[0]);
        let total: f64 = adjusted[0].values().map(|&c| c as f64).sum();
        let uniform = 1.0 / (adjusted[0].len() as f64 + 1.0);
        let gamma_num: f64 = adjusted[0].values().map(|&c| discount_for(c, &d)).sum();
        let gamma = gamma_num / total;
        let mut unigrams: Map<Key, f64> = Map::default();
        for (key, &c) in &adjusted[0] {
            let p = ((c as f64) - discount_for(c, &d)).max(0.0) / total + gamma * uniform;
            unigrams.insert(key.clone(), p);
        }
        // Degenerate corpora can leave no discounted mass for <unk>.
        let unk_prob = (gamma * uniform).max(1e-10);
        unigrams.insert(vec![UNK.to_string()], unk_prob);
        probs.push(unigrams);

        for k in 2..=order {
            let table = &adjusted[k - 1];
            let d = discounts(table);

            let mut ctx_total: Map<Key, f64> = Map::default();
            let mut ctx_gamma_num: Map<Key, f64> = Map::default();
            for (key, &c) in table {
                let ctx = key[..k - 1].to_vec();
                *ctx_total.entry(ctx.clone()).or_insert(0.0) += c as f64;
                *ctx_gamma_num.entry(ctx).or_insert(0.0) += discount_for(c, &d);
            }

            let mut level: Map<Key, f64> = Map::default();
            for (key, &c) in table {
                let ctx = &key[..k - 1];
                let denom = ctx_total[ctx];
                let g = ctx_gamma_num[ctx] / denom;
                let lower = probs[k - 2]
                    .get(&key[1..])
                    .copied()
                    .unwrap_or(unk_prob);
                let p = ((c as f64) - discount_for(c, &d)).max(0.0) / denom + g * lower;
                level.insert(key.clone(), p);
            }
            probs.push(level);

            for (ctx, num) in ctx_gamma_num {
                let g = (num / ctx_total[&ctx]).max(f64::MIN_POSITIVE);
                gammas[k - 2].insert(ctx, g);
            }
        }

        let mut arpa = ArpaModel::new(order);
        for (i, level) in probs.iter().enumerate() {
            let k = i + 1;
            for (key, &p) in level {
                let backoff = if k < order {
                    gammas[k - 1].get(key).map(|g| g.log10())
                } else {
                    None
                };
                arpa.push(ArpaEntry {
                    symbols: key.clone(),
                    log_prob: p.log10(),
                    backoff,
                });
            }
        }
        arpa.sort();
        debug!(
            order,
            unigrams = arpa.entries(1).len(),
            "estimated Kneser-Ney model"
        );
        Ok(arpa)
    }
}

/// Accumulate raw n-gram counts for orders 1..=order. Lines carry their own
/// sentinel symbols, so no implicit boundary markers are added.
fn count_ngrams(corpus: &Path, order: usize) -> Result<Vec<Map<Key, u64>>> {
    let file =
        File::open(corpus).with_context(|| format!("open corpus {}", corpus.display()))?;
    let reader = BufReader::new(file);
    let mut counts: Vec<Map<Key, u64>> = vec![Map::default(); order];
    for line in reader.lines() {
        let line = line.with_context(|| format!("read corpus {}", corpus.display()))?;
        let symbols: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        for i in 0..symbols.len() {
            for k in 1..=order.min(i + 1) {
                let key = symbols[i + 1 - k..=i].to_vec();
                *counts[k - 1].entry(key).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}

/// Kneser-Ney adjusted counts: the highest order keeps raw counts, lower
/// orders count distinct left extensions. Symbols that only ever occur
/// line-initial have no left extension; those fall back to raw counts.
fn adjusted_counts(raw: &[Map<Key, u64>]) -> Vec<Map<Key, u64>> {
    let order = raw.len();
    let mut adjusted: Vec<Map<Key, u64>> = vec![Map::default(); order];
    adjusted[order - 1] = raw[order - 1].clone();
    for k in (0..order - 1).rev() {
        let mut level: Map<Key, u64> = Map::default();
        for key in raw[k + 1].keys() {
            *level.entry(key[1..].to_vec()).or_insert(0) += 1;
        }
        for (key, &c) in &raw[k] {
            level.entry(key.clone()).or_insert(c);
        }
        adjusted[k] = level;
    }
    adjusted
}

/// Chen & Goodman discount estimates from counts-of-counts, with the
/// teacher's 0.75 fallback when the statistics are too sparse.
fn discounts(counts: &Map<Key, u64>) -> [f64; 3] {
    let mut n = [0u64; 4];
    for &c in counts.values() {
        if (1..=4).contains(&c) {
            n[(c - 1) as usize] += 1;
        }
    }
    let (n1, n2, n3, n4) = (n[0] as f64, n[1] as f64, n[2] as f64, n[3] as f64);
    if n1 == 0.0 || n2 == 0.0 {
        return [0.75, 0.75, 0.75];
    }
    let y = n1 / (n1 + 2.0 * n2);
    let d1 = (1.0 - 2.0 * y * (n2 / n1)).max(0.0);
    let d2 = if n3 > 0.0 {
        (2.0 - 3.0 * y * (n3 / n2)).max(0.0)
    } else {
        d1
    };
    let d3 = if n3 > 0.0 && n4 > 0.0 {
        (3.0 - 4.0 * y * (n4 / n3)).max(0.0)
    } else {
        d2
    };
    [d1, d2, d3]
}

fn discount_for(count: u64, d: &[f64; 3]) -> f64 {
    match count {
        1 => d[0],
        2 => d[1],
        _ => d[2],
    }
}
