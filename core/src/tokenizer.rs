use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref PUNCT: Regex = Regex::new(r"[[:punct:]]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its",
            "of","on","that","the","to","was","were","will","with",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Strip ASCII punctuation from a word.
pub fn remove_punctuation(word: &str) -> String { PUNCT.replace_all(word, "").into_owned() }

/// Split text on whitespace, drop stop words, then strip punctuation. Case is
/// preserved because query terms are matched case-sensitively.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| !is_stopword(w))
        .map(remove_punctuation)
        .filter(|w| !w.is_empty())
        .collect()
}

pub fn remove_stop_words<'a, I>(words: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    words.into_iter().filter(|w| !is_stopword(w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("the noble Brutus hath told you, Caesar was ambitious");
        assert_eq!(t, vec!["noble", "Brutus", "hath", "told", "you", "Caesar", "ambitious"]);
    }

    #[test]
    fn stop_words_checked_before_punctuation() {
        // stop words are matched before punctuation is stripped
        assert_eq!(tokenize("the, --"), vec!["the"]);
    }
}
