//! Per-call corpus index: tokenized documents plus the statistics BM25 needs.
//!
//! A [`CorpusIndex`] is built for one ranking call and dropped with it. Documents keep
//! their input order; each is stored as an `(id, terms)` pair, so identity never depends
//! on content (two ids with identical text are two documents).
//!
//! Term matching is case-insensitive: counts and document frequencies are keyed by the
//! lowercased term even if the tokenizer did not lowercase.

use crate::cancel::Cancellation;
use crate::tokenize::Tokenizer;
use crate::{Error, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// One tokenized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Caller-supplied identifier, unique within the corpus.
    pub id: String,
    /// Terms in document order (not deduplicated).
    pub terms: Vec<String>,
}

impl Document {
    /// Document length in terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if tokenization left no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Tokenized corpus with document lengths and document frequencies.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    docs: Vec<Document>,
    // Per document (same order as `docs`): folded term -> occurrences.
    term_counts: Vec<HashMap<String, u32>>,
    // Folded term -> number of documents containing it.
    doc_freq: HashMap<String, u32>,
    total_terms: usize,
}

/// Case folding used for every term comparison.
pub(crate) fn fold_case(term: &str) -> String {
    term.to_lowercase()
}

impl CorpusIndex {
    /// Tokenize `documents` and index them.
    ///
    /// Fails with [`Error::EmptyCorpus`] for no documents, [`Error::DuplicateDocumentId`]
    /// if an id repeats, and [`Error::Tokenization`] (carrying the id) if the tokenizer
    /// fails on a document.
    pub fn build<I, K, V, T>(documents: I, tokenizer: &T) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str> + Sync,
        T: Tokenizer + ?Sized,
    {
        Self::build_with(documents, tokenizer, &Cancellation::none())
    }

    /// [`CorpusIndex::build`], checking `cancel` before each document.
    #[instrument(skip_all)]
    pub fn build_with<I, K, V, T>(
        documents: I,
        tokenizer: &T,
        cancel: &Cancellation,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str> + Sync,
        T: Tokenizer + ?Sized,
    {
        let raw: Vec<(String, V)> = documents
            .into_iter()
            .map(|(id, text)| (id.into(), text))
            .collect();
        check_ids(raw.iter().map(|(id, _)| id.as_str()))?;

        let tokenize = |(id, text): &(String, V)| -> Result<Document> {
            cancel.check()?;
            let terms = tokenizer
                .tokenize(text.as_ref())
                .map_err(|source| Error::Tokenization {
                    doc_id: id.clone(),
                    source,
                })?;
            Ok(Document {
                id: id.clone(),
                terms,
            })
        };

        #[cfg(feature = "parallel")]
        let docs = raw.par_iter().map(tokenize).collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let docs = raw.iter().map(tokenize).collect::<Result<Vec<_>>>()?;

        Ok(Self::assemble(docs))
    }

    /// Index documents that were tokenized elsewhere.
    pub fn from_tokenized<I, K>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        let docs: Vec<Document> = documents
            .into_iter()
            .map(|(id, terms)| Document {
                id: id.into(),
                terms,
            })
            .collect();
        check_ids(docs.iter().map(|d| d.id.as_str()))?;
        Ok(Self::assemble(docs))
    }

    fn assemble(docs: Vec<Document>) -> Self {
        let mut term_counts = Vec::with_capacity(docs.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();
        let mut total_terms = 0;

        for doc in &docs {
            let mut counts: HashMap<String, u32> = HashMap::new();
            for term in &doc.terms {
                *counts.entry(fold_case(term)).or_insert(0) += 1;
            }
            for term in counts.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            total_terms += doc.len();
            term_counts.push(counts);
        }

        let index = Self {
            docs,
            term_counts,
            doc_freq,
            total_terms,
        };
        debug!(
            docs = index.num_docs(),
            total_terms = index.total_terms,
            vocab = index.doc_freq.len(),
            avg_doc_len = index.avg_doc_len(),
            "built corpus index"
        );
        index
    }

    /// Number of documents (always > 0).
    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    /// Total number of terms over all documents.
    pub fn total_terms(&self) -> usize {
        self.total_terms
    }

    /// Average document length in terms.
    pub fn avg_doc_len(&self) -> f64 {
        // Construction rejects empty corpora, so num_docs > 0.
        self.total_terms as f64 / self.num_docs() as f64
    }

    /// Documents in input order.
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    /// Look up a document by id.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.docs.iter().find(|d| d.id == id)
    }

    /// Number of documents containing `term` (case-insensitive).
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.doc_frequency_folded(&fold_case(term))
    }

    /// Occurrences of `term` (case-insensitive) in the document at position `pos`.
    ///
    /// Returns 0 for an out-of-range position.
    pub fn term_count(&self, pos: usize, term: &str) -> u32 {
        self.term_count_folded(pos, &fold_case(term))
    }

    pub(crate) fn doc_frequency_folded(&self, folded: &str) -> u32 {
        self.doc_freq.get(folded).copied().unwrap_or(0)
    }

    pub(crate) fn term_count_folded(&self, pos: usize, folded: &str) -> u32 {
        self.term_counts
            .get(pos)
            .and_then(|counts| counts.get(folded))
            .copied()
            .unwrap_or(0)
    }
}

fn check_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::DuplicateDocumentId(id.to_owned()));
        }
    }
    if seen.is_empty() {
        return Err(Error::EmptyCorpus);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::{BoxError, UnicodeTokenizer};

    #[test]
    fn stats_over_small_corpus() {
        let ix = CorpusIndex::build(
            [("d1", "cat dog"), ("d2", "cat cat cat"), ("d3", "fish")],
            &UnicodeTokenizer::new(),
        )
        .unwrap();
        assert_eq!(ix.num_docs(), 3);
        assert_eq!(ix.total_terms(), 6);
        assert_eq!(ix.avg_doc_len(), 2.0);
        assert_eq!(ix.doc_frequency("cat"), 2);
        assert_eq!(ix.doc_frequency("CAT"), 2);
        assert_eq!(ix.doc_frequency("bird"), 0);
        assert_eq!(ix.term_count(1, "cat"), 3);
        assert_eq!(ix.term_count(9, "cat"), 0);
        let ids: Vec<&str> = ix.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["d1", "d2", "d3"]);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let none: [(&str, &str); 0] = [];
        let err = CorpusIndex::build(none, &UnicodeTokenizer::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = CorpusIndex::build(
            [("a", "one two"), ("b", "three"), ("a", "four")],
            &UnicodeTokenizer::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateDocumentId(id) if id == "a"));
    }

    #[test]
    fn identical_content_under_distinct_ids_is_kept() {
        let ix = CorpusIndex::build([("a", "same text"), ("b", "same text")], &UnicodeTokenizer::new())
            .unwrap();
        assert_eq!(ix.num_docs(), 2);
        assert_eq!(ix.doc_frequency("same"), 2);
        assert_eq!(ix.document("b").unwrap().terms, ["same", "text"]);
    }

    #[test]
    fn tokenizer_failure_names_the_document() {
        let picky = |text: &str| -> std::result::Result<Vec<String>, BoxError> {
            if text.contains('\u{fffd}') {
                return Err("replacement character in input".into());
            }
            Ok(text.split_whitespace().map(str::to_owned).collect())
        };
        let err = CorpusIndex::build([("ok", "fine"), ("bad", "br\u{fffd}ken")], &picky)
            .unwrap_err();
        match err {
            Error::Tokenization { doc_id, source } => {
                assert_eq!(doc_id, "bad");
                assert_eq!(source.to_string(), "replacement character in input");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn counts_fold_case_for_non_lowercasing_tokenizers() {
        let ix = CorpusIndex::from_tokenized([
            ("x", vec!["Rust".to_string(), "RUST".to_string(), "go".to_string()]),
            ("y", vec!["rust".to_string()]),
        ])
        .unwrap();
        assert_eq!(ix.term_count(0, "rust"), 2);
        assert_eq!(ix.doc_frequency("Rust"), 2);
        // Lengths count raw terms.
        assert_eq!(ix.documents()[0].len(), 3);
    }

    #[test]
    fn documents_may_be_empty_after_tokenization() {
        let ix = CorpusIndex::build([("a", "x y z"), ("b", "hello")], &UnicodeTokenizer::new()).unwrap();
        assert!(ix.document("a").unwrap().is_empty());
        assert_eq!(ix.avg_doc_len(), 0.5);
    }

    #[test]
    fn cancelled_build_fails() {
        let c = Cancellation::until(std::time::Instant::now());
        let err = CorpusIndex::build_with([("a", "text")], &UnicodeTokenizer::new(), &c).unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));
    }
}
