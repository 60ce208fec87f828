//! Tokenizers: raw text → ordered, normalized terms.
//!
//! Ranking only consumes the [`Tokenizer`] trait, so callers can plug in any
//! segmentation. Every built-in tokenizer runs its raw tokens through a [`TermPolicy`];
//! a custom tokenizer should normalize the same way, or IDF and length statistics stop
//! meaning much (a corpus full of one-letter noise drags `avgdl` around).

use unicode_segmentation::UnicodeSegmentation;

/// Boxed error returned by tokenizers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Text → ordered sequence of normalized terms.
///
/// Implemented for closures `Fn(&str) -> Result<Vec<String>, BoxError>`, which is the
/// easiest way to adapt an external segmenter:
///
/// ```
/// use bm25rank::tokenize::{BoxError, Tokenizer};
///
/// let comma_split = |text: &str| -> Result<Vec<String>, BoxError> {
///     Ok(text.split(',').map(str::to_owned).collect())
/// };
/// assert_eq!(comma_split.tokenize("a,b").unwrap(), ["a", "b"]);
/// ```
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text`.
    fn tokenize(&self, text: &str) -> Result<Vec<String>, BoxError>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Result<Vec<String>, BoxError> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Result<Vec<String>, BoxError> {
        self(text)
    }
}

/// Normalization applied to raw tokens.
///
/// The default drops tokens whose trimmed length is at most one character and
/// lowercases the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermPolicy {
    /// Minimum length (in chars, after trimming) of a kept token.
    pub min_chars: usize,
    /// Lowercase kept tokens.
    pub lowercase: bool,
}

impl Default for TermPolicy {
    fn default() -> Self {
        Self {
            min_chars: 2,
            lowercase: true,
        }
    }
}

impl TermPolicy {
    /// Normalize one raw token, or `None` if the policy drops it.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let token = raw.trim();
        if token.chars().count() < self.min_chars {
            return None;
        }
        Some(if self.lowercase {
            token.to_lowercase()
        } else {
            token.to_owned()
        })
    }

    /// Normalize a raw token stream, preserving order.
    pub fn apply<'a, I>(&self, raw: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        raw.into_iter().filter_map(|t| self.normalize(t)).collect()
    }
}

/// Splits on Unicode word boundaries (UAX #29).
///
/// Good for space-delimited scripts. Ideographs come out one per word, so with the
/// default policy Chinese text yields no terms; use `JiebaTokenizer` for that.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeTokenizer {
    policy: TermPolicy,
}

impl UnicodeTokenizer {
    /// Tokenizer with the default [`TermPolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizer with a custom policy.
    pub fn with_policy(policy: TermPolicy) -> Self {
        Self { policy }
    }
}

impl Tokenizer for UnicodeTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.policy.apply(text.unicode_words()))
    }
}

/// Splits on whitespace only; punctuation stays attached to words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer {
    policy: TermPolicy,
}

impl WhitespaceTokenizer {
    /// Tokenizer with the default [`TermPolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizer with a custom policy.
    pub fn with_policy(policy: TermPolicy) -> Self {
        Self { policy }
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.policy.apply(text.split_whitespace()))
    }
}

/// Dictionary-based Chinese segmentation (`jieba-rs`), mixed scripts included.
#[cfg(feature = "jieba")]
pub struct JiebaTokenizer {
    jieba: jieba_rs::Jieba,
    hmm: bool,
    policy: TermPolicy,
}

#[cfg(feature = "jieba")]
impl std::fmt::Debug for JiebaTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiebaTokenizer")
            .field("hmm", &self.hmm)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "jieba")]
impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "jieba")]
impl JiebaTokenizer {
    /// Load the bundled dictionary. HMM for unknown words is off.
    pub fn new() -> Self {
        Self {
            jieba: jieba_rs::Jieba::new(),
            hmm: false,
            policy: TermPolicy::default(),
        }
    }

    /// Toggle HMM-based discovery of out-of-dictionary words.
    pub fn with_hmm(mut self, hmm: bool) -> Self {
        self.hmm = hmm;
        self
    }

    /// Replace the term policy.
    pub fn with_policy(mut self, policy: TermPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(feature = "jieba")]
impl Tokenizer for JiebaTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.policy.apply(self.jieba.cut(text, self.hmm)))
    }
}
