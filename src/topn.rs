//! Top-N selection and the ranked result type.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Ranked documents: an order-preserving `id -> score` mapping.
///
/// Entries are sorted by score descending; equal scores are ordered by id ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    entries: Vec<(String, f64)>,
}

impl Ranking {
    /// Number of ranked documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score of `id`, if it made the cut.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|&(_, score)| score)
    }

    /// `(id, score)` pairs, best first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(id, score)| (id.as_str(), *score))
    }

    /// Ids, best first.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Consume into `(id, score)` pairs, best first.
    pub fn into_vec(self) -> Vec<(String, f64)> {
        self.entries
    }
}

impl IntoIterator for Ranking {
    type Item = (String, f64);
    type IntoIter = std::vec::IntoIter<(String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Keep the `n` best `(id, score)` pairs.
///
/// Bounded min-heap keyed by `(score, Reverse(id))`: the root is the current worst entry
/// (lowest score, then greatest id), evicted whenever the heap grows past `n`.
/// Ids are expected to be unique, which makes the order total.
pub fn select<'a, I>(scored: I, n: usize) -> Ranking
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    if n == 0 {
        return Ranking::default();
    }

    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, Reverse<&'a str>)>> = BinaryHeap::new();
    for (id, score) in scored {
        heap.push(Reverse((OrderedFloat(score), Reverse(id))));
        if heap.len() > n {
            heap.pop();
        }
    }

    // into_sorted_vec is ascending in Reverse(key), i.e. best first.
    let entries = heap
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse((OrderedFloat(score), Reverse(id)))| (id.to_owned(), score))
        .collect();
    Ranking { entries }
}
