//! Okapi BM25 over a [`CorpusIndex`].
//!
//! Scoring, per document `d` and query term `t`:
//!
//! ```text
//! raw_freq = count(t, d) / |d|
//! tf       = raw_freq * (k1 + 1) / (raw_freq + k1 * (1 - b + b * |d| / avgdl))
//! idf      = ln((N + 0.5) / (df + 0.5))
//! score(d) = sum over query terms (in order, repeats included) of tf * idf
//! ```
//!
//! Note `raw_freq` is the *relative* frequency, not the raw count.
//! Ranking is deterministic (score desc, then doc id asc).
//!
//! References:
//! - Robertson & Walker (1994). "Some simple effective approximations to the 2-Poisson model..."
//! - Robertson & Zaragoza (2009). "The Probabilistic Relevance Framework: BM25 and Beyond."

use crate::cancel::Cancellation;
use crate::corpus::{fold_case, CorpusIndex};
use crate::topn::{self, Ranking};
use crate::{Error, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Default term-frequency saturation.
pub const DEFAULT_K1: f64 = 1.2;
/// Default length normalization for [`Bm25Params::default`].
pub const DEFAULT_B: f64 = 0.75;
/// Length normalization used by the public ranking entry points (`Ranker`, CLI).
pub const PUBLIC_DEFAULT_B: f64 = 0.95;

/// IDF formula selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdfVariant {
    /// `ln((N + 0.5) / (df + 0.5))`. Never negative; exactly 0 when every document
    /// contains the term.
    #[default]
    Reference,
    /// Robertson–Spärck Jones: `ln((N - df + 0.5) / (df + 0.5))`.
    ///
    /// Negative for terms in more than half the corpus. Not floored.
    RobertsonSparckJones,
}

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter (`>= 0`).
    pub k1: f64,
    /// Length normalization parameter (`0..=1`).
    pub b: f64,
    /// IDF formula.
    pub idf: IdfVariant,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            idf: IdfVariant::Reference,
        }
    }
}

impl Bm25Params {
    /// Parameters with the reference IDF. Not validated until a scorer is built.
    pub fn new(k1: f64, b: f64) -> Self {
        Self {
            k1,
            b,
            idf: IdfVariant::Reference,
        }
    }

    /// Replace the IDF formula.
    pub fn with_idf(mut self, idf: IdfVariant) -> Self {
        self.idf = idf;
        self
    }

    /// Check `k1 >= 0` (finite) and `0 <= b <= 1`.
    pub fn validate(&self) -> Result<()> {
        if !(self.k1.is_finite() && self.k1 >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "k1",
                value: self.k1,
                reason: "must be a finite value >= 0",
            });
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::InvalidParameter {
                name: "b",
                value: self.b,
                reason: "must be within [0, 1]",
            });
        }
        Ok(())
    }
}

/// BM25 scorer with validated parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bm25Scorer {
    params: Bm25Params,
}

impl Bm25Scorer {
    /// Scorer with the reference IDF.
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        Self::with_params(Bm25Params::new(k1, b))
    }

    /// Scorer from explicit parameters.
    pub fn with_params(params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// `k1 = 1.2`, `b = 0.95`: the defaults of the public ranking entry points.
    pub fn ranking_default() -> Self {
        Self {
            params: Bm25Params::new(DEFAULT_K1, PUBLIC_DEFAULT_B),
        }
    }

    /// The (validated) parameters.
    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Saturated, length-normalized term frequency.
    ///
    /// `count` occurrences in a document of `doc_len` terms. Zero occurrences give
    /// exactly 0, so empty documents (and `k1 = 0`) never divide zero by zero.
    pub fn tf(&self, count: u32, doc_len: usize, avg_doc_len: f64) -> f64 {
        if count == 0 || doc_len == 0 {
            return 0.0;
        }
        let Bm25Params { k1, b, .. } = self.params;
        let dl = doc_len as f64;
        let raw_freq = count as f64 / dl;
        raw_freq * (k1 + 1.0) / (raw_freq + k1 * (1.0 - b + b * dl / avg_doc_len))
    }

    /// Inverse document frequency of a term found in `doc_freq` of `num_docs` documents.
    pub fn idf(&self, num_docs: usize, doc_freq: u32) -> f64 {
        let n = num_docs as f64;
        let df = doc_freq as f64;
        match self.params.idf {
            IdfVariant::Reference => ((n + 0.5) / (df + 0.5)).ln(),
            IdfVariant::RobertsonSparckJones => ((n - df + 0.5) / (df + 0.5)).ln(),
        }
    }

    /// IDF of `term` (case-insensitive) over `index`.
    pub fn term_idf(&self, index: &CorpusIndex, term: &str) -> f64 {
        self.idf(index.num_docs(), index.doc_frequency(term))
    }

    /// BM25 score of the document at position `pos` in `index`.
    ///
    /// Panics if `pos >= index.num_docs()`.
    pub fn score(&self, query_terms: &[String], index: &CorpusIndex, pos: usize) -> f64 {
        let query = PreparedQuery::new(self, query_terms, index);
        self.score_prepared(&query, index, pos)
    }

    /// Scores for every document, in index order.
    pub fn score_all(
        &self,
        query_terms: &[String],
        index: &CorpusIndex,
        cancel: &Cancellation,
    ) -> Result<Vec<f64>> {
        let query = PreparedQuery::new(self, query_terms, index);
        let score_one = |pos: usize| -> Result<f64> {
            cancel.check()?;
            Ok(self.score_prepared(&query, index, pos))
        };

        #[cfg(feature = "parallel")]
        let scores = (0..index.num_docs())
            .into_par_iter()
            .map(score_one)
            .collect::<Result<Vec<f64>>>()?;
        #[cfg(not(feature = "parallel"))]
        let scores = (0..index.num_docs())
            .map(score_one)
            .collect::<Result<Vec<f64>>>()?;

        Ok(scores)
    }

    /// Score every document and keep the best `top_n`.
    ///
    /// - **Output**: `min(top_n, num_docs)` entries, sorted by `(score desc, id asc)`.
    /// - Zero and negative scores are kept; nothing is filtered.
    #[instrument(skip_all, fields(docs = index.num_docs(), query_terms = query_terms.len(), top_n = top_n))]
    pub fn rank(
        &self,
        query_terms: &[String],
        index: &CorpusIndex,
        top_n: usize,
        cancel: &Cancellation,
    ) -> Result<Ranking> {
        if top_n == 0 {
            return Ok(Ranking::default());
        }
        let scores = self.score_all(query_terms, index, cancel)?;
        let ranking = topn::select(
            index
                .documents()
                .iter()
                .map(|d| d.id.as_str())
                .zip(scores),
            top_n,
        );
        debug!(results = ranking.len(), "ranked corpus");
        Ok(ranking)
    }

    fn score_prepared(&self, query: &PreparedQuery, index: &CorpusIndex, pos: usize) -> f64 {
        let doc_len = index.documents()[pos].len();
        let avg_doc_len = index.avg_doc_len();
        let mut score = 0.0;
        for (term, &idf) in query.terms.iter().zip(query.idfs.iter()) {
            let count = index.term_count_folded(pos, term);
            if count == 0 {
                continue;
            }
            score += self.tf(count, doc_len, avg_doc_len) * idf;
        }
        score
    }
}

// Query terms folded once, with their IDFs. Repeats stay: each occurrence scores.
struct PreparedQuery {
    terms: Vec<String>,
    idfs: Vec<f64>,
}

impl PreparedQuery {
    fn new(scorer: &Bm25Scorer, query_terms: &[String], index: &CorpusIndex) -> Self {
        let terms: Vec<String> = query_terms.iter().map(|t| fold_case(t)).collect();
        let idfs = terms
            .iter()
            .map(|t| scorer.idf(index.num_docs(), index.doc_frequency_folded(t)))
            .collect();
        Self { terms, idfs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::UnicodeTokenizer;

    fn fixture() -> CorpusIndex {
        CorpusIndex::build(
            [("d1", "cat dog"), ("d2", "cat cat cat"), ("d3", "fish")],
            &UnicodeTokenizer::new(),
        )
        .unwrap()
    }

    fn q(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(matches!(
            Bm25Scorer::new(-1.0, 0.75),
            Err(Error::InvalidParameter { name: "k1", .. })
        ));
        assert!(matches!(
            Bm25Scorer::new(1.2, 1.5),
            Err(Error::InvalidParameter { name: "b", .. })
        ));
        assert!(Bm25Scorer::new(1.2, -0.1).is_err());
        assert!(Bm25Scorer::new(f64::NAN, 0.5).is_err());
        assert!(Bm25Scorer::new(1.2, f64::NAN).is_err());
        assert!(Bm25Scorer::new(0.0, 0.0).is_ok());
        assert!(Bm25Scorer::new(2.0, 1.0).is_ok());
    }

    #[test]
    fn default_params() {
        let p = Bm25Scorer::default().params();
        assert_eq!((p.k1, p.b, p.idf), (1.2, 0.75, IdfVariant::Reference));
        let p = Bm25Scorer::ranking_default().params();
        assert_eq!((p.k1, p.b), (1.2, 0.95));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn fixture_scores() {
        let ix = fixture();
        let s = Bm25Scorer::new(1.2, 0.75).unwrap();
        let idf = s.term_idf(&ix, "cat");
        assert!((idf - 1.4f64.ln()).abs() < 1e-15);

        let scores = s.score_all(&q(&["cat"]), &ix, &Cancellation::none()).unwrap();
        assert!((scores[0] - 0.21771732957843187).abs() < 1e-12);
        assert!((scores[1] - 0.2793354417232711).abs() < 1e-12);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn reference_idf_is_zero_for_ubiquitous_terms() {
        let ix = CorpusIndex::build([("a", "rust go"), ("b", "rust")], &UnicodeTokenizer::new())
            .unwrap();
        let s = Bm25Scorer::default();
        assert_eq!(s.term_idf(&ix, "rust"), 0.0);
    }

    #[test]
    fn rsj_idf_goes_negative_without_clamping() {
        let ix = fixture();
        let s = Bm25Scorer::with_params(
            Bm25Params::default().with_idf(IdfVariant::RobertsonSparckJones),
        )
        .unwrap();
        // df = N
        let idf = s.idf(ix.num_docs(), 3);
        assert!(idf < 0.0);
        assert!((idf - (0.5f64 / 3.5).ln()).abs() < 1e-15);
        // "cat" appears in 2 of 3 documents, so its documents score negative.
        let scores = s.score_all(&q(&["cat"]), &ix, &Cancellation::none()).unwrap();
        assert!(scores[0] < 0.0 && scores[1] < 0.0);
    }

    #[test]
    fn repeated_query_terms_count_twice() {
        let ix = fixture();
        let s = Bm25Scorer::default();
        let once = s.score(&q(&["cat"]), &ix, 1);
        let twice = s.score(&q(&["cat", "cat"]), &ix, 1);
        assert!((twice - 2.0 * once).abs() < 1e-15);
    }

    #[test]
    fn query_matching_is_case_insensitive() {
        let ix = fixture();
        let s = Bm25Scorer::default();
        assert_eq!(s.score(&q(&["CAT"]), &ix, 1), s.score(&q(&["cat"]), &ix, 1));
    }

    #[test]
    fn tf_edge_cases() {
        let s = Bm25Scorer::new(0.0, 0.5).unwrap();
        // k1 = 0 is a binary model: any presence gives tf = 1.
        assert_eq!(s.tf(3, 10, 4.0), 1.0);
        assert_eq!(s.tf(0, 10, 4.0), 0.0);
        assert_eq!(s.tf(0, 0, 0.0), 0.0);
    }

    #[test]
    fn rank_keeps_zero_scores_and_truncates() {
        let ix = fixture();
        let s = Bm25Scorer::default();
        let all = s.rank(&q(&["cat"]), &ix, 10, &Cancellation::none()).unwrap();
        assert_eq!(all.ids().collect::<Vec<_>>(), ["d2", "d1", "d3"]);
        assert_eq!(all.get("d3"), Some(0.0));

        let none = s.rank(&q(&["cat"]), &ix, 0, &Cancellation::none()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn cancelled_scoring_returns_error() {
        let ix = fixture();
        let c = Cancellation::until(std::time::Instant::now());
        let err = Bm25Scorer::default()
            .rank(&q(&["cat"]), &ix, 3, &c)
            .unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));
    }
}
