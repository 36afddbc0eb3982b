use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)\w+").expect("valid regex");
}

/// Stopword set threaded explicitly through the pipeline instead of living in
/// a process-wide singleton, so per-corpus lists and tests stay cheap.
#[derive(Debug, Clone, Default)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    /// Empty set; every token survives filtering.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(Into::into).collect())
    }

    /// Built-in English list.
    pub fn english() -> Self {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
        ];
        Self::from_words(words.iter().copied())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tokenize text into terms using NFKC normalization, lowercasing, maximal
/// word-character runs, and stopword removal. Pure and deterministic; empty
/// input yields an empty vec.
pub fn tokenize(text: &str, stopwords: &Stopwords) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    WORD_RE
        .find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| !stopwords.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Red running shoes!", &Stopwords::english());
        assert_eq!(t, vec!["red", "running", "shoes"]);
    }

    #[test]
    fn keeps_digits_and_underscores() {
        let t = tokenize("USB-C cable_2m x3", &Stopwords::none());
        assert_eq!(t, vec!["usb", "c", "cable_2m", "x3"]);
    }
}
