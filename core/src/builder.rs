//! Offline corpus → binary model pipeline.
//!
//! For an input corpus `X` the builder derives three artifacts under the
//! output directory: `X.3grm` (trigram corpus), `X.lm` (ARPA model) and
//! `X.lm.binary` (compiled model). Any I/O error aborts the build; partial
//! output is left in place.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::arpa::ArpaModel;
use crate::estimator::{Estimator, KneserNey};
use crate::ngram::NGramModel;
use crate::tokenize::{ngrams, wrap_sentinels, NGRAM_WIDTH};

/// Paths of the artifacts produced by [`build_character_lm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub trigram_corpus: PathBuf,
    pub arpa: PathBuf,
    pub binary: PathBuf,
}

/// Rewrite a raw text corpus as one line of space-separated character
/// trigrams per input line: each line is lowercased, sentinel-wrapped and
/// cut into width-3 windows. Deterministic, so reruns are byte-identical.
pub fn generate_trigram_corpus(input: &Path, output: &Path) -> Result<()> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("open corpus {}", input.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(output)
            .with_context(|| format!("create trigram corpus {}", output.display()))?,
    );
    for line in reader.lines() {
        let line = line.with_context(|| format!("read corpus {}", input.display()))?;
        let wrapped = wrap_sentinels(&line.to_lowercase());
        writeln!(writer, "{}", ngrams(&wrapped, NGRAM_WIDTH).join(" "))
            .with_context(|| format!("write trigram corpus {}", output.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("write trigram corpus {}", output.display()))?;
    Ok(())
}

/// Run the full pipeline: trigram corpus, Kneser-Ney estimation at the
/// given order, ARPA output, binary compilation.
pub fn build_character_lm(input: &Path, out_dir: &Path, order: usize) -> Result<ModelPaths> {
    let name = input
        .file_name()
        .with_context(|| format!("corpus path {} has no file name", input.display()))?
        .to_string_lossy()
        .into_owned();

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;
    let paths = ModelPaths {
        trigram_corpus: out_dir.join(format!("{}.3grm", name)),
        arpa: out_dir.join(format!("{}.lm", name)),
        binary: out_dir.join(format!("{}.lm.binary", name)),
    };

    info!(input = %input.display(), "generating trigram corpus");
    generate_trigram_corpus(input, &paths.trigram_corpus)?;

    info!(order, "estimating Kneser-Ney model");
    let arpa = KneserNey.fit(&paths.trigram_corpus, order)?;
    arpa.write(&paths.arpa)?;

    // Compile from the written artifact, not the in-memory model, so the
    // binary is exactly the compilation of the X.lm file on disk.
    info!(binary = %paths.binary.display(), "compiling binary model");
    let compiled = ArpaModel::read(&paths.arpa)?;
    NGramModel::from_arpa(&compiled).save_binary(&paths.binary)?;

    Ok(paths)
}
