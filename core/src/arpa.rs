//! Reading and writing n-gram models in the ARPA text format.
//!
//! The layout is the conventional one: a `\data\` header listing the entry
//! count per order, one `\N-grams:` section per order holding
//! `log10prob<TAB>w1 w2 ...[<TAB>log10backoff]` lines, and a closing
//! `\end\`. Probabilities and backoff weights are base-10 logarithms.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One n-gram entry: the symbol sequence, its conditional log10
/// probability, and the log10 backoff weight when the entry also serves as
/// a context for longer n-grams.
#[derive(Debug, Clone, PartialEq)]
pub struct ArpaEntry {
    pub symbols: Vec<String>,
    pub log_prob: f64,
    pub backoff: Option<f64>,
}

/// An n-gram model in ARPA text form.
///
/// `grams[k]` holds the (k+1)-gram entries. This is the interchange
/// representation between the estimator and the compiled binary model.
#[derive(Debug, Clone, PartialEq)]
pub struct ArpaModel {
    grams: Vec<Vec<ArpaEntry>>,
}

impl ArpaModel {
    pub fn new(order: usize) -> Self {
        Self {
            grams: vec![Vec::new(); order],
        }
    }

    pub fn order(&self) -> usize {
        self.grams.len()
    }

    /// Entries of the given order (1-based).
    pub fn entries(&self, order: usize) -> &[ArpaEntry] {
        &self.grams[order - 1]
    }

    pub fn push(&mut self, entry: ArpaEntry) {
        let order = entry.symbols.len();
        self.grams[order - 1].push(entry);
    }

    /// Sort every section by symbol sequence so output is deterministic
    /// regardless of how entries were accumulated.
    pub fn sort(&mut self) {
        for section in &mut self.grams {
            section.sort_by(|a, b| a.symbols.cmp(&b.symbols));
        }
    }

    /// Read an ARPA model from a text file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("open ARPA model {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut counts: Vec<usize> = Vec::new();
        let mut grams: Vec<Vec<ArpaEntry>> = Vec::new();
        let mut in_data = false;
        let mut current: Option<usize> = None;
        let mut saw_end = false;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("read ARPA model {}", path.display()))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if line == "\\data\\" {
                in_data = true;
                continue;
            }
            if line == "\\end\\" {
                saw_end = true;
                break;
            }
            if let Some(rest) = line.strip_prefix('\\') {
                // section header like "1-grams:"
                if let Some(n) = rest
                    .strip_suffix("-grams:")
                    .and_then(|s| s.parse::<usize>().ok())
                {
                    if n == 0 || n > counts.len() {
                        bail!("ARPA section {}-grams out of range at line {}", n, lineno + 1);
                    }
                    current = Some(n);
                    continue;
                }
                bail!("unrecognized ARPA directive {:?} at line {}", line, lineno + 1);
            }
            if in_data && current.is_none() {
                // "ngram N=count"
                let rest = line
                    .strip_prefix("ngram ")
                    .with_context(|| format!("malformed ARPA count line {}", lineno + 1))?;
                let (n, c) = rest
                    .split_once('=')
                    .with_context(|| format!("malformed ARPA count line {}", lineno + 1))?;
                let n: usize = n.trim().parse()?;
                let c: usize = c.trim().parse()?;
                if n != counts.len() + 1 {
                    bail!("ARPA counts out of order at line {}", lineno + 1);
                }
                counts.push(c);
                grams.push(Vec::new());
                continue;
            }
            let order = current
                .with_context(|| format!("ARPA entry outside a section at line {}", lineno + 1))?;
            let entry = parse_entry(line, order)
                .with_context(|| format!("malformed ARPA entry at line {}", lineno + 1))?;
            grams[order - 1].push(entry);
        }

        if !saw_end {
            bail!("ARPA model {} has no \\end\\ marker", path.display());
        }
        for (i, c) in counts.iter().enumerate() {
            if grams[i].len() != *c {
                bail!(
                    "ARPA model {} declares {} {}-grams but carries {}",
                    path.display(),
                    c,
                    i + 1,
                    grams[i].len()
                );
            }
        }
        Ok(Self { grams })
    }

    /// Write the model as ARPA text.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("create ARPA model {}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "\\data\\")?;
        for (i, section) in self.grams.iter().enumerate() {
            writeln!(w, "ngram {}={}", i + 1, section.len())?;
        }
        for (i, section) in self.grams.iter().enumerate() {
            writeln!(w)?;
            writeln!(w, "\\{}-grams:", i + 1)?;
            for e in section {
                write!(w, "{:.6}\t{}", e.log_prob, e.symbols.join(" "))?;
                if let Some(bo) = e.backoff {
                    write!(w, "\t{:.6}", bo)?;
                }
                writeln!(w)?;
            }
        }
        writeln!(w)?;
        writeln!(w, "\\end\\")?;
        w.flush()
            .with_context(|| format!("write ARPA model {}", path.display()))?;
        Ok(())
    }
}

/// Parse one entry line. Fields are tab-separated, falling back to plain
/// whitespace splitting for hand-written files.
fn parse_entry(line: &str, order: usize) -> Result<ArpaEntry> {
    let fields: Vec<&str> = line.split('\t').collect();
    let (prob_s, symbols_s, backoff_s) = match fields.len() {
        2 => (fields[0], fields[1], None),
        3 => (fields[0], fields[1], Some(fields[2])),
        _ => {
            // whitespace-separated fallback
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() == order + 1 {
                return Ok(ArpaEntry {
                    symbols: parts[1..].iter().map(|s| s.to_string()).collect(),
                    log_prob: parts[0].parse()?,
                    backoff: None,
                });
            }
            if parts.len() == order + 2 {
                return Ok(ArpaEntry {
                    symbols: parts[1..=order].iter().map(|s| s.to_string()).collect(),
                    log_prob: parts[0].parse()?,
                    backoff: Some(parts[order + 1].parse()?),
                });
            }
            bail!("expected {} symbols, got {:?}", order, line);
        }
    };
    let symbols: Vec<String> = symbols_s.split_whitespace().map(|s| s.to_string()).collect();
    if symbols.len() != order {
        bail!("expected {} symbols, got {}", order, symbols.len());
    }
    Ok(ArpaEntry {
        symbols,
        log_prob: prob_s.trim().parse()?,
        backoff: match backoff_s {
            Some(s) => Some(s.trim().parse()?),
            None => None,
        },
    })
}
