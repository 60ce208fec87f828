//! `bm25rank`: rank a small in-memory corpus against a query with Okapi BM25.
//!
//! One ranking call does everything from scratch:
//! - tokenize the query and every document (caller-chosen [`Tokenizer`]),
//! - build a [`CorpusIndex`] (document lengths, document frequencies),
//! - score every document with [`Bm25Scorer`],
//! - keep the top-N in a [`Ranking`] (score desc, then id asc).
//!
//! Nothing is cached between calls: the index is a value owned by the call.
//!
//! ```
//! let docs = [("d1", "cat dog"), ("d2", "cat cat cat"), ("d3", "fish")];
//! let ranking = bm25rank::rank_bm25("cat", docs, 2, 1.2, 0.75).unwrap();
//! assert_eq!(ranking.ids().collect::<Vec<_>>(), ["d2", "d1"]);
//! ```
//!
//! Non-goals:
//! - Persistent or incrementally updated indexes
//! - Stemming / lemmatization (that is the tokenizer's business)
//! - Query language beyond "bag of terms"
//!
//! References:
//! - Robertson & Walker (1994): probabilistic retrieval foundations
//! - Robertson & Zaragoza (2009): BM25 and beyond

pub mod bm25;
pub mod cancel;
pub mod corpus;
pub mod ranker;
pub mod tokenize;
pub mod topn;

pub use bm25::{Bm25Params, Bm25Scorer, IdfVariant};
pub use cancel::Cancellation;
pub use corpus::{CorpusIndex, Document};
pub use error::{Error, Result};
pub use ranker::{rank_bm25, Ranker};
pub use tokenize::{TermPolicy, Tokenizer, UnicodeTokenizer, WhitespaceTokenizer};
#[cfg(feature = "jieba")]
pub use tokenize::JiebaTokenizer;
pub use topn::Ranking;

mod error {
    use crate::tokenize::BoxError;

    /// Result alias for ranking operations.
    pub type Result<T> = std::result::Result<T, Error>;

    /// Errors for BM25 ranking.
    #[derive(thiserror::Error, Debug)]
    pub enum Error {
        /// A scorer parameter was out of range.
        #[error("invalid {name} = {value}: {reason}")]
        InvalidParameter {
            /// Parameter name (`k1` or `b`).
            name: &'static str,
            /// Rejected value.
            value: f64,
            /// What the accepted range is.
            reason: &'static str,
        },
        /// No documents were supplied.
        #[error("empty corpus")]
        EmptyCorpus,
        /// The same document id was supplied twice.
        #[error("duplicate document id {0:?}")]
        DuplicateDocumentId(String),
        /// The tokenizer failed on a document.
        #[error("failed to tokenize document {doc_id:?}")]
        Tokenization {
            /// Id of the document being tokenized.
            doc_id: String,
            /// Tokenizer error.
            #[source]
            source: BoxError,
        },
        /// The tokenizer failed on the query string.
        #[error("failed to tokenize query")]
        QueryTokenization {
            /// Tokenizer error.
            #[source]
            source: BoxError,
        },
        /// The cancel flag was raised mid-call.
        #[error("ranking cancelled")]
        Cancelled,
        /// The deadline passed mid-call.
        #[error("ranking deadline exceeded")]
        DeadlineExceeded,
    }
}
