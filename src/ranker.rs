//! One-call ranking: tokenize, index, score, select.
//!
//! ```
//! use bm25rank::{Bm25Scorer, Ranker, WhitespaceTokenizer};
//!
//! let ranker = Ranker::new(WhitespaceTokenizer::new(), Bm25Scorer::new(1.2, 0.75)?);
//! let ranking = ranker.rank("rust", [("a", "rust rust"), ("b", "go rust"), ("c", "zig")], 2)?;
//! assert_eq!(ranking.ids().collect::<Vec<_>>(), ["a", "b"]);
//! # Ok::<(), bm25rank::Error>(())
//! ```

use crate::bm25::Bm25Scorer;
use crate::cancel::Cancellation;
use crate::corpus::CorpusIndex;
use crate::tokenize::{Tokenizer, UnicodeTokenizer};
use crate::topn::Ranking;
use crate::{Error, Result};
use tracing::instrument;

/// Rank `documents` (id → text) against `query` with the default tokenizer.
///
/// Returns at most `top_n` documents, best first (ties by id ascending).
///
/// # Errors
/// - [`Error::InvalidParameter`] if `k1 < 0` or `b` is outside `[0, 1]`
/// - [`Error::EmptyCorpus`] / [`Error::DuplicateDocumentId`] for a bad document set
pub fn rank_bm25<I, K, V>(query: &str, documents: I, top_n: usize, k1: f64, b: f64) -> Result<Ranking>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str> + Sync,
{
    Ranker::new(UnicodeTokenizer::new(), Bm25Scorer::new(k1, b)?).rank(query, documents, top_n)
}

/// A tokenizer paired with a scorer.
///
/// Holds no corpus state; every call builds and drops its own [`CorpusIndex`], so one
/// `Ranker` can be shared between threads.
#[derive(Debug, Clone)]
pub struct Ranker<T = UnicodeTokenizer> {
    tokenizer: T,
    scorer: Bm25Scorer,
}

impl Default for Ranker<UnicodeTokenizer> {
    fn default() -> Self {
        Self::new(UnicodeTokenizer::new(), Bm25Scorer::ranking_default())
    }
}

impl<T: Tokenizer> Ranker<T> {
    /// Pair `tokenizer` with `scorer`.
    pub fn new(tokenizer: T, scorer: Bm25Scorer) -> Self {
        Self { tokenizer, scorer }
    }

    /// The tokenizer.
    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// The scorer.
    pub fn scorer(&self) -> &Bm25Scorer {
        &self.scorer
    }

    /// Rank `documents` against `query`, keeping the best `top_n`.
    pub fn rank<I, K, V>(&self, query: &str, documents: I, top_n: usize) -> Result<Ranking>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str> + Sync,
    {
        self.rank_with(query, documents, top_n, &Cancellation::none())
    }

    /// [`Ranker::rank`], checking `cancel` between documents.
    #[instrument(skip_all, fields(top_n = top_n))]
    pub fn rank_with<I, K, V>(
        &self,
        query: &str,
        documents: I,
        top_n: usize,
        cancel: &Cancellation,
    ) -> Result<Ranking>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str> + Sync,
    {
        let query_terms = self
            .tokenizer
            .tokenize(query)
            .map_err(|source| Error::QueryTokenization { source })?;
        let index = CorpusIndex::build_with(documents, &self.tokenizer, cancel)?;
        self.scorer.rank(&query_terms, &index, top_n, cancel)
    }
}
