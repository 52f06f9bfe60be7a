//! In-memory inverted index with positional postings.
//!
//! The serde layout of [`Index`] is the on-disk JSON contract consumed by
//! other processes, so field names and nesting must stay stable.

use crate::error::PersistError;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub title: String,
    pub url: String,
    /// Token count after normalization.
    pub length: u32,
}

/// Occurrences of one term in one document. `positions` is strictly increasing
/// and `tf == positions.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub tf: u32,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn from_positions(mut positions: Vec<u32>) -> Self {
        positions.sort_unstable();
        positions.dedup();
        Self { tf: positions.len() as u32, positions }
    }

    /// Set union on positions; duplicates collapse.
    pub fn absorb(&mut self, other: Posting) {
        if other.positions.is_empty() {
            return;
        }
        let mut merged = Vec::with_capacity(self.positions.len() + other.positions.len());
        let (mut i, mut j) = (0, 0);
        while i < self.positions.len() && j < other.positions.len() {
            let (a, b) = (self.positions[i], other.positions[j]);
            if a < b {
                merged.push(a);
                i += 1;
            } else if b < a {
                merged.push(b);
                j += 1;
            } else {
                merged.push(a);
                i += 1;
                j += 1;
            }
        }
        merged.extend_from_slice(&self.positions[i..]);
        merged.extend_from_slice(&other.positions[j..]);
        self.tf = merged.len() as u32;
        self.positions = merged;
    }

    pub fn contains(&self, position: u32) -> bool {
        self.positions.binary_search(&position).is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub df: u32,
    /// Keyed by doc id, ascending.
    pub postings: BTreeMap<DocId, Posting>,
}

impl TermEntry {
    pub fn single(doc_id: DocId, posting: Posting) -> Self {
        let mut postings = BTreeMap::new();
        postings.insert(doc_id, posting);
        Self { df: 1, postings }
    }

    /// Commutative, associative combine. The empty entry is the identity.
    pub fn merge(mut self, other: TermEntry) -> TermEntry {
        for (doc_id, posting) in other.postings {
            match self.postings.get_mut(&doc_id) {
                Some(existing) => existing.absorb(posting),
                None => {
                    self.postings.insert(doc_id, posting);
                }
            }
        }
        self.postings.retain(|_, p| p.tf > 0);
        self.df = self.postings.len() as u32;
        self
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.postings.keys().copied().collect()
    }
}

/// Field order mirrors the JSON contract: documents, avgdl, doc_count, terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub documents: BTreeMap<DocId, DocMeta>,
    pub avgdl: f64,
    pub doc_count: u32,
    pub terms: BTreeMap<String, TermEntry>,
}

impl Index {
    /// Assemble an index and compute its corpus statistics.
    pub fn from_parts(documents: BTreeMap<DocId, DocMeta>, terms: BTreeMap<String, TermEntry>) -> Self {
        let doc_count = documents.len() as u32;
        let avgdl = mean_length(&documents);
        Self { documents, avgdl, doc_count, terms }
    }

    pub fn is_empty(&self) -> bool { self.doc_count == 0 }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn term(&self, term: &str) -> Option<&TermEntry> { self.terms.get(term) }

    pub fn doc(&self, doc_id: DocId) -> Option<&DocMeta> { self.documents.get(&doc_id) }

    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.documents.get(&doc_id).map(|d| d.length).unwrap_or(0)
    }

    /// Every document id, ascending. The universe for negation.
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.documents.keys().copied().collect()
    }

    /// Structural checks run after deserialization.
    pub fn validate(&self) -> Result<(), PersistError> {
        if self.doc_count as usize != self.documents.len() {
            return Err(PersistError::Corrupt(format!(
                "doc_count {} but {} documents",
                self.doc_count,
                self.documents.len()
            )));
        }
        let mut tf_sums: BTreeMap<DocId, u64> = BTreeMap::new();
        for (term, entry) in &self.terms {
            if entry.df as usize != entry.postings.len() {
                return Err(PersistError::Corrupt(format!("term {term:?}: df does not match postings")));
            }
            for (doc_id, posting) in &entry.postings {
                if !self.documents.contains_key(doc_id) {
                    return Err(PersistError::Corrupt(format!("term {term:?}: unknown document {doc_id}")));
                }
                if posting.tf as usize != posting.positions.len() || posting.tf == 0 {
                    return Err(PersistError::Corrupt(format!("term {term:?}, doc {doc_id}: tf mismatch")));
                }
                if posting.positions.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(PersistError::Corrupt(format!(
                        "term {term:?}, doc {doc_id}: positions not strictly increasing"
                    )));
                }
                *tf_sums.entry(*doc_id).or_insert(0) += posting.tf as u64;
            }
        }
        for (doc_id, meta) in &self.documents {
            let sum = tf_sums.get(doc_id).copied().unwrap_or(0);
            if sum != meta.length as u64 {
                return Err(PersistError::Corrupt(format!(
                    "doc {doc_id}: length {} but postings sum to {sum}",
                    meta.length
                )));
            }
        }
        let expected = mean_length(&self.documents);
        if (expected - self.avgdl).abs() > 1e-9 * expected.max(1.0) {
            return Err(PersistError::Corrupt(format!("avgdl {} but lengths average {expected}", self.avgdl)));
        }
        Ok(())
    }
}

fn mean_length(documents: &BTreeMap<DocId, DocMeta>) -> f64 {
    if documents.is_empty() {
        return 0.0;
    }
    let total: u64 = documents.values().map(|d| d.length as u64).sum();
    total as f64 / documents.len() as f64
}
