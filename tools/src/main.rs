use anyhow::Result;
use charlm_core::{build_character_lm, MODEL_ORDER};
use clap::Parser;
use std::path::PathBuf;

/// Build a compact binary character language model from a raw text corpus.
///
/// Produces `<corpus>.3grm`, `<corpus>.lm` and `<corpus>.lm.binary` under
/// the output directory.
#[derive(Parser)]
struct Args {
    /// Raw corpus file, one line of text per line
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving the derived artifacts
    #[arg(long)]
    out_dir: PathBuf,

    /// Language-model order over character trigram symbols
    #[arg(long, default_value_t = MODEL_ORDER)]
    order: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let paths = build_character_lm(&args.input, &args.out_dir, args.order)?;

    println!("Wrote trigram corpus to {}", paths.trigram_corpus.display());
    println!("Wrote ARPA model to {}", paths.arpa.display());
    println!("Wrote binary model to {}", paths.binary.display());
    Ok(())
}
