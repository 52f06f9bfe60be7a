use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;
use std::ops::Range;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{M}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","don","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "just","ll","ma","me","more","most","my","myself",
            "no","nor","not","now","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","we","were","what","when","where","which","while","who","whom","why","will","with","won","would",
            "you","your","yours","yourself","yourselves",
            // filler that dominates encyclopedic text
            "also","one","two","new","like","many","may","use","using","used","much","well","even","still",
            "known","often","however","though","another","every","since","first","last","around","called",
            "based","became","according","although","including","several","various","within"
        ];
        words.iter().copied().collect()
    };
}

/// A normalized token with its position in the filtered stream and the byte
/// span of the source word in the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub position: usize,
    pub span: Range<usize>,
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Normalize a single word: NFKC, lowercase, keep alphanumerics, drop
/// stopwords and single characters, then stem. `None` when nothing survives.
pub fn normalize_word(word: &str) -> Option<String> {
    let folded: String = word
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect();
    if folded.chars().count() < 2 || is_stopword(&folded) {
        return None;
    }
    Some(STEMMER.stem(&folded).into_owned())
}

/// Full analysis pass keeping source spans; positions count surviving tokens only.
pub fn analyze(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for mat in RE.find_iter(text) {
        if let Some(term) = normalize_word(mat.as_str()) {
            let position = tokens.len();
            tokens.push(Token { term, position, span: mat.range() });
        }
    }
    tokens
}

/// Tokenize text into (term, position) using NFKC normalization, lowercase, stopword removal, and stemming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    analyze(text).into_iter().map(|t| (t.term, t.position)).collect()
}

/// Normalized terms only, in order. Used for query leaves.
pub fn terms(text: &str) -> Vec<String> {
    analyze(text).into_iter().map(|t| t.term).collect()
}
