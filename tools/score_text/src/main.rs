use anyhow::Result;
use charlm_core::{Extractor, NGramModel};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;

/// Score lines of text against a compiled binary character language model.
///
/// Prints `score<TAB>line` for each trailing argument, or for each stdin
/// line when no lines are given.
#[derive(Parser)]
struct Args {
    /// Path to a .lm.binary model produced by build_charlm
    #[arg(long)]
    model: PathBuf,

    /// Keep the original casing instead of lowercasing before scoring
    #[arg(long)]
    no_lowercase: bool,

    /// Lines to score
    lines: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let model = NGramModel::load_binary(&args.model)?;
    let extractor = Extractor::new(model, !args.no_lowercase);

    if args.lines.is_empty() {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            print_score(&extractor, &line)?;
        }
    } else {
        for line in &args.lines {
            print_score(&extractor, line)?;
        }
    }
    Ok(())
}

fn print_score(extractor: &Extractor, line: &str) -> Result<()> {
    let features = extractor.extract(line)?;
    println!("{}\t{}", features[0].value, line);
    Ok(())
}
