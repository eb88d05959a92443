// End-to-end pipeline tests: raw corpus -> trigram corpus -> ARPA model ->
// compiled binary model -> document feature extraction.

use charlm_core::{
    build_character_lm, ArpaModel, Config, Extractor, NGramModel, LM_PROB, MODEL_ORDER,
};
use std::path::PathBuf;

fn temp_dir(tag: &str) -> PathBuf {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut dir = std::env::temp_dir();
    dir.push(format!("charlm_e2e_{}_{}", tag, stamp));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn toy_corpus(dir: &PathBuf) -> PathBuf {
    let path = dir.join("basicItalian.txt");
    let lines = [
        "piano", "piano", "piazza", "gelato", "amore", "sopratutto", "parola", "porta", "pasta",
        "pasta", "strada", "giorno",
    ];
    std::fs::write(&path, lines.join("\n") + "\n").expect("write corpus");
    path
}

#[test]
fn build_produces_all_three_artifacts() {
    let dir = temp_dir("artifacts");
    let corpus = toy_corpus(&dir);
    let paths = build_character_lm(&corpus, &dir, MODEL_ORDER).expect("build");

    assert_eq!(paths.trigram_corpus, dir.join("basicItalian.txt.3grm"));
    assert_eq!(paths.arpa, dir.join("basicItalian.txt.lm"));
    assert_eq!(paths.binary, dir.join("basicItalian.txt.lm.binary"));
    assert!(paths.trigram_corpus.exists());
    assert!(paths.arpa.exists());
    assert!(paths.binary.exists());

    let first_line = std::fs::read_to_string(&paths.trigram_corpus)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    assert_eq!(first_line, "#pi pia ian ano no$");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn binary_model_scores_like_the_arpa_it_came_from() {
    let dir = temp_dir("parity");
    let corpus = toy_corpus(&dir);
    let paths = build_character_lm(&corpus, &dir, MODEL_ORDER).expect("build");

    let from_arpa = NGramModel::from_arpa(&ArpaModel::read(&paths.arpa).expect("read arpa"));
    let from_binary = NGramModel::load_binary(&paths.binary).expect("load binary");

    let symbols: Vec<String> = ["#pi", "pia", "ian", "ano", "no$"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        from_arpa.score_sentence(&symbols),
        from_binary.score_sentence(&symbols)
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn extractor_prefers_in_domain_text() {
    let dir = temp_dir("extract");
    let corpus = toy_corpus(&dir);
    let paths = build_character_lm(&corpus, &dir, MODEL_ORDER).expect("build");

    let config = Config {
        ignore_case: true,
        binary_lm_file: Some(paths.binary.clone()),
    };
    let extractor = Extractor::from_config(&config).expect("init extractor");

    let seen = extractor.extract("piano").expect("extract")[0].clone();
    let unseen = extractor.extract("qwxkz").expect("extract")[0].clone();

    assert_eq!(seen.name, LM_PROB);
    assert_eq!(unseen.name, LM_PROB);
    assert!(seen.value.is_finite() && unseen.value.is_finite());
    assert!(seen.value > unseen.value);

    // case folding makes upper-case input score like its training form
    let upper = extractor.extract("PIANO").expect("extract")[0].value;
    assert_eq!(upper, seen.value);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn rebuilds_are_deterministic() {
    let dir = temp_dir("determinism");
    let corpus = toy_corpus(&dir);

    let first_out = dir.join("first");
    let second_out = dir.join("second");
    let first = build_character_lm(&corpus, &first_out, MODEL_ORDER).expect("first build");
    let second = build_character_lm(&corpus, &second_out, MODEL_ORDER).expect("second build");

    assert_eq!(
        std::fs::read(&first.trigram_corpus).unwrap(),
        std::fs::read(&second.trigram_corpus).unwrap()
    );
    assert_eq!(
        std::fs::read_to_string(&first.arpa).unwrap(),
        std::fs::read_to_string(&second.arpa).unwrap()
    );

    let a = NGramModel::load_binary(&first.binary).expect("load");
    let b = NGramModel::load_binary(&second.binary).expect("load");
    let symbols: Vec<String> = ["#pa", "pas", "ast", "sta", "ta$"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(a.score_sentence(&symbols), b.score_sentence(&symbols));

    let _ = std::fs::remove_dir_all(&dir);
}
