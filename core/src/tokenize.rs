//! Character window extraction with start/end sentinels.
//!
//! Documents and corpus lines are wrapped with `#`/`$` markers before
//! windowing so that boundary windows stay distinguishable from interior
//! ones, then cut into overlapping fixed-width character windows. The same
//! windowing is applied at extraction time and at model-building time.

/// Marks the start of a wrapped document or corpus line.
pub const START_SENTINEL: char = '#';

/// Marks the end of a wrapped document or corpus line.
pub const END_SENTINEL: char = '$';

/// Width of the character windows fed to the language model.
pub const NGRAM_WIDTH: usize = 3;

/// Order of the language model estimated over those windows.
pub const MODEL_ORDER: usize = 5;

/// Wrap raw text with the start/end sentinels.
pub fn wrap_sentinels(text: &str) -> String {
    format!("{START_SENTINEL}{text}{END_SENTINEL}")
}

/// Extract all overlapping `n`-character windows of `text`, in order.
///
/// Returns exactly `chars - n + 1` windows, each `n` characters long, or an
/// empty vector when the text is shorter than `n`. Windows are built over
/// Unicode scalar values, not bytes.
pub fn ngrams(text: &str, n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if n == 0 || chars.len() < n {
        return Vec::new();
    }
    chars.windows(n).map(|w| w.iter().collect()).collect()
}
