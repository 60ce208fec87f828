//! Property tests over random corpora.

use bm25rank::bm25::Bm25Scorer;
use bm25rank::{CorpusIndex, Ranker, UnicodeTokenizer};
use proptest::prelude::*;

const VOCAB: &[&str] = &["apple", "banana", "cherry", "date", "elder", "fig", "grape"];

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::sample::select(VOCAB), 0..12).prop_map(|w| w.join(" "))
}

fn arb_corpus() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec(arb_text(), 1..16).prop_map(|texts| {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| (format!("doc{i:02}"), t))
            .collect()
    })
}

proptest! {
    /// tf is never negative for valid parameters.
    #[test]
    fn tf_is_non_negative(
        k1 in 0.0f64..5.0,
        b in 0.0f64..=1.0,
        count in 0u32..50,
        extra in 0usize..50,
        avg in 0.5f64..100.0,
    ) {
        let scorer = Bm25Scorer::new(k1, b).unwrap();
        let tf = scorer.tf(count, count as usize + extra, avg);
        prop_assert!(tf >= 0.0, "tf = {}", tf);
        prop_assert!(tf.is_finite());
    }

    /// Result size is min(top_n, N), ordered by score desc then id asc.
    #[test]
    fn ranking_is_sorted_and_sized(
        docs in arb_corpus(),
        query in arb_text(),
        top_n in 0usize..20,
    ) {
        let ranker = Ranker::new(UnicodeTokenizer::new(), Bm25Scorer::default());
        let ranking = ranker.rank(&query, docs.clone(), top_n).unwrap();
        prop_assert_eq!(ranking.len(), top_n.min(docs.len()));

        let entries: Vec<(&str, f64)> = ranking.iter().collect();
        for w in entries.windows(2) {
            let ((id_a, a), (id_b, b)) = (w[0], w[1]);
            prop_assert!(a > b || (a == b && id_a < id_b), "{:?} before {:?}", w[0], w[1]);
        }
    }

    /// The ranking is a prefix of the full ranking.
    #[test]
    fn top_n_is_prefix_of_full_ranking(
        docs in arb_corpus(),
        query in arb_text(),
        top_n in 1usize..8,
    ) {
        let ranker = Ranker::new(UnicodeTokenizer::new(), Bm25Scorer::default());
        let full = ranker.rank(&query, docs.clone(), docs.len()).unwrap().into_vec();
        let cut = ranker.rank(&query, docs, top_n).unwrap().into_vec();
        prop_assert_eq!(&full[..cut.len()], &cut[..]);
    }

    /// Ranking depends only on the inputs of the call.
    #[test]
    fn rank_is_idempotent(docs in arb_corpus(), query in arb_text()) {
        let ranker = Ranker::new(UnicodeTokenizer::new(), Bm25Scorer::default());
        let a = ranker.rank(&query, docs.clone(), 5).unwrap();
        let b = ranker.rank(&query, docs, 5).unwrap();
        prop_assert_eq!(a, b);
    }

    /// With the reference IDF no score is negative.
    #[test]
    fn reference_scores_are_non_negative(docs in arb_corpus(), query in arb_text()) {
        let ix = CorpusIndex::build(docs, &UnicodeTokenizer::new()).unwrap();
        let terms: Vec<String> = query.split_whitespace().map(str::to_owned).collect();
        let scorer = Bm25Scorer::default();
        for pos in 0..ix.num_docs() {
            prop_assert!(scorer.score(&terms, &ix, pos) >= 0.0);
        }
    }
}
