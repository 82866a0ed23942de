use boolsearch_core::tokenizer::{remove_stop_words, tokenize};

#[test]
fn it_strips_punctuation_and_keeps_case() {
    let words = tokenize("Et tu, Brute? Then fall, Caesar!");
    assert_eq!(words, vec!["Et", "tu", "Brute", "Then", "fall", "Caesar"]);
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    // stop words are lowercase only
    assert!(words.contains(&"The".to_string()));
}

#[test]
fn it_removes_stop_words_from_queries() {
    assert_eq!(remove_stop_words("Caesar and the Brutus".split(' ')), vec!["Caesar", "Brutus"]);
}
