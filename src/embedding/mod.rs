//! Text-to-vector embedding and similarity search.
//!
//! Provides the [`TextVectorizer`] trait with two implementations, a TF-IDF
//! vectorizer whose vocabulary is fitted from text ([`tfidf`]) and a stateless
//! feature-hashing vectorizer ([`hashing`]), plus the persisted
//! [`EmbeddingIndex`] that ranks stored profile summaries by cosine similarity.
//! The vectorizer is created via [`create_vectorizer`] from configuration.

pub mod hashing;
pub mod index;
pub mod tfidf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use hashing::HashingVectorizer;
pub use index::{EmbeddingIndex, IndexError, ProfileSnapshot, SimilarProfile};
pub use tfidf::TfidfVectorizer;

/// Default number of dimensions of every produced vector.
pub const DEFAULT_DIMENSIONS: usize = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("empty vocabulary; text contains only stop words or no terms")]
    EmptyVocabulary,
    #[error("vectorizer is not fitted")]
    NotFitted,
}

/// Converts text into fixed-length, L2-normalized vectors.
///
/// All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait TextVectorizer {
    /// Learn whatever state the vectorizer needs from `texts`.
    fn fit(&mut self, texts: &[&str]) -> Result<(), EmbeddingError>;

    fn is_fitted(&self) -> bool;

    /// Vectorize one text. Terms the vectorizer does not know contribute nothing.
    fn transform(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector returned by [`TextVectorizer::transform`].
    fn dimensions(&self) -> usize;
}

/// Persistable vectorizer, tagged by strategy in the saved index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Vectorizer {
    Tfidf(TfidfVectorizer),
    Hashing(HashingVectorizer),
}

impl Vectorizer {
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Tfidf(_) => "tfidf",
            Self::Hashing(_) => "hashing",
        }
    }

    fn inner(&self) -> &dyn TextVectorizer {
        match self {
            Self::Tfidf(v) => v,
            Self::Hashing(v) => v,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TextVectorizer {
        match self {
            Self::Tfidf(v) => v,
            Self::Hashing(v) => v,
        }
    }
}

impl TextVectorizer for Vectorizer {
    fn fit(&mut self, texts: &[&str]) -> Result<(), EmbeddingError> {
        self.inner_mut().fit(texts)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn transform(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.inner().transform(text)
    }

    fn dimensions(&self) -> usize {
        self.inner().dimensions()
    }
}

/// Create a vectorizer from config.
///
/// Supported strategies: `"tfidf"` and `"hashing"`.
pub fn create_vectorizer(config: &crate::config::EmbeddingConfig) -> Result<Vectorizer> {
    anyhow::ensure!(config.dimensions > 0, "embedding dimensions must be positive");
    match config.strategy.as_str() {
        "tfidf" => Ok(Vectorizer::Tfidf(TfidfVectorizer::new(config.dimensions))),
        "hashing" => Ok(Vectorizer::Hashing(HashingVectorizer::new(config.dimensions))),
        other => anyhow::bail!("unknown embedding strategy: {other}. Supported: tfidf, hashing"),
    }
}

/// Lowercase, then split into runs of at least two word characters
/// (alphanumeric or `_`), dropping English stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Standard English stop-word list, sorted for binary search.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter",
    "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his", "how", "however",
    "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into", "is", "it", "its",
    "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd", "made", "many", "may",
    "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly", "move",
    "much", "must", "my", "myself", "name", "namely", "neither", "never", "nevertheless", "next",
    "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of",
    "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise",
    "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put",
    "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow",
    "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system",
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence",
    "there", "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they",
    "thick", "thin", "third", "this", "those", "though", "three", "through", "throughout",
    "thru", "thus", "to", "together", "too", "top", "toward", "towards", "twelve", "twenty",
    "two", "un", "under", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereafter", "whereas",
    "whereby", "wherein", "whereupon", "wherever", "whether", "which", "while", "whither", "who",
    "whoever", "whole", "whom", "whose", "why", "will", "with", "within", "without", "would",
    "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// Scale `v` to unit L2 norm in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x = (f64::from(*x) / norm) as f32);
    }
}

/// Cosine similarity computed in `f64`. Zero-norm inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
