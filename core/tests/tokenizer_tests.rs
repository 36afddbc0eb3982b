use vitrine_core::tokenizer::{tokenize, Stopwords};

#[test]
fn it_lowercases_and_strips_punctuation() {
    let toks = tokenize("Red Wine, from FRANCE!", &Stopwords::none());
    assert_eq!(toks, vec!["red", "wine", "from", "france"]);
}

#[test]
fn it_filters_stopwords() {
    let toks = tokenize("The quick brown fox and the lazy dog", &Stopwords::english());
    assert!(!toks.contains(&"the".to_string()));
    assert!(!toks.contains(&"and".to_string()));
    assert!(toks.contains(&"quick".to_string()));
}

#[test]
fn it_normalizes_compatibility_forms() {
    // U+FB01 LATIN SMALL LIGATURE FI decomposes under NFKC
    let toks = tokenize("ﬁne leather", &Stopwords::none());
    assert_eq!(toks, vec!["fine", "leather"]);
}

#[test]
fn it_is_deterministic() {
    let stopwords = Stopwords::english();
    let text = "Deterministic tokenization of the same text";
    assert_eq!(tokenize(text, &stopwords), tokenize(text, &stopwords));
}

#[test]
fn empty_input_yields_no_terms() {
    assert!(tokenize("", &Stopwords::english()).is_empty());
    assert!(tokenize("   \t\n", &Stopwords::english()).is_empty());
}
