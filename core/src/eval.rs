//! Boolean/phrase candidate resolution followed by BM25 ranking.

use crate::error::{ParseError, SearchError};
use crate::index::Index;
use crate::query::{parse, Expr};
use crate::tokenizer::terms;
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.5, b: 0.75 } }
}

impl Bm25Params {
    /// `ln((N - df + 0.5) / (df + 0.5) + 1)`, never negative.
    pub fn idf(&self, df: u32, num_docs: u32) -> f64 {
        let (n, df) = (num_docs as f64, df as f64);
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    pub fn tf_norm(&self, freq: u32, doc_len: u32, avgdl: f64) -> f64 {
        let f = freq as f64;
        let ratio = if avgdl > 0.0 { doc_len as f64 / avgdl } else { 1.0 };
        f * (self.k1 + 1.0) / (f + self.k1 * (1.0 - self.b + self.b * ratio))
    }
}

/// One ranked document and the (term, position) pairs that matched in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub score: f64,
    pub matches: Vec<(String, u32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranked {
    /// Size of the candidate set before truncation to top-k.
    pub total_hits: usize,
    pub results: Vec<ScoredResult>,
}

/// Occurrences of a single leaf (term or phrase) in one document.
/// `starts` holds the position of the first word of each match.
#[derive(Debug, Clone, Default)]
struct Hit {
    starts: Vec<u32>,
}

#[derive(Debug, Clone)]
struct LeafMatch {
    terms: Vec<String>,
    /// Term entry df for single terms, number of matching documents for phrases.
    df: u32,
    hits: BTreeMap<DocId, Hit>,
}

type LeafCache = HashMap<Vec<String>, LeafMatch>;

pub struct QueryEvaluator {
    index: Arc<Index>,
    params: Bm25Params,
    universe: Vec<DocId>,
}

impl QueryEvaluator {
    pub fn new(index: Arc<Index>, params: Bm25Params) -> Result<Self, SearchError> {
        if index.is_empty() {
            return Err(SearchError::EmptyIndex);
        }
        let universe = index.doc_ids();
        Ok(Self { index, params, universe })
    }

    pub fn index(&self) -> &Index { &self.index }

    /// Parse and evaluate in one step.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Ranked, SearchError> {
        let expr = parse(query)?;
        self.evaluate(&expr, top_k)
    }

    /// Candidate set only, ascending doc ids. A tree made only of stopword
    /// leaves resolves to the empty set.
    pub fn resolve(&self, expr: &Expr) -> Vec<DocId> {
        self.resolve_with(expr, &mut LeafCache::new()).unwrap_or_default()
    }

    /// Rank the candidates of `expr`. Fails with `NegativeOnly` when every
    /// positive leaf normalizes away but a negation still selects documents.
    pub fn evaluate(&self, expr: &Expr, top_k: usize) -> Result<Ranked, SearchError> {
        let mut leaves: Vec<Vec<String>> = Vec::new();
        for leaf in expr.positive_leaves() {
            let key = leaf_terms(leaf);
            if !key.is_empty() && !leaves.contains(&key) {
                leaves.push(key);
            }
        }

        let mut cache = LeafCache::new();
        let candidates = match self.resolve_with(expr, &mut cache) {
            Some(_) if leaves.is_empty() => return Err(ParseError::NegativeOnly.into()),
            Some(c) if !c.is_empty() => c,
            _ => return Ok(Ranked::default()),
        };
        for key in &leaves {
            if !cache.contains_key(key) {
                let m = self.match_leaf(key);
                cache.insert(key.clone(), m);
            }
        }

        let n = self.index.doc_count;
        let avgdl = self.index.avgdl;
        let mut results: Vec<ScoredResult> = candidates
            .iter()
            .map(|&doc_id| {
                let doc_len = self.index.doc_length(doc_id);
                let mut score = 0.0;
                let mut matches = Vec::new();
                for key in &leaves {
                    let leaf = &cache[key];
                    if let Some(hit) = leaf.hits.get(&doc_id) {
                        let freq = hit.starts.len() as u32;
                        score += self.params.idf(leaf.df, n) * self.params.tf_norm(freq, doc_len, avgdl);
                        for &start in &hit.starts {
                            for (offset, term) in leaf.terms.iter().enumerate() {
                                matches.push((term.clone(), start + offset as u32));
                            }
                        }
                    }
                }
                matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                matches.dedup();
                ScoredResult { doc_id, score, matches }
            })
            .collect();

        results.sort_by(rank_order);
        let total_hits = results.len();
        results.truncate(top_k);
        tracing::debug!(query = %expr, total_hits, returned = results.len(), "evaluated query");
        Ok(Ranked { total_hits, results })
    }

    /// `None` means the subtree is neutral (normalized to no terms).
    fn resolve_with(&self, expr: &Expr, cache: &mut LeafCache) -> Option<Vec<DocId>> {
        match expr {
            Expr::Term(_) | Expr::Phrase(_) => {
                let key = leaf_terms(expr);
                if key.is_empty() {
                    return None;
                }
                if !cache.contains_key(&key) {
                    let m = self.match_leaf(&key);
                    cache.insert(key.clone(), m);
                }
                Some(cache[&key].hits.keys().copied().collect())
            }
            Expr::And(l, r) => match (self.resolve_with(l, cache), self.resolve_with(r, cache)) {
                (Some(a), Some(b)) => Some(intersect(&a, &b)),
                (a, b) => a.or(b),
            },
            Expr::Or(l, r) => match (self.resolve_with(l, cache), self.resolve_with(r, cache)) {
                (Some(a), Some(b)) => Some(union(&a, &b)),
                (a, b) => a.or(b),
            },
            Expr::Not(e) => self.resolve_with(e, cache).map(|s| difference(&self.universe, &s)),
        }
    }

    fn match_leaf(&self, terms: &[String]) -> LeafMatch {
        if let [term] = terms {
            return match self.index.term(term) {
                Some(entry) => LeafMatch {
                    terms: terms.to_vec(),
                    df: entry.df,
                    hits: entry
                        .postings
                        .iter()
                        .map(|(&doc_id, p)| (doc_id, Hit { starts: p.positions.clone() }))
                        .collect(),
                },
                None => LeafMatch { terms: terms.to_vec(), df: 0, hits: BTreeMap::new() },
            };
        }

        let mut hits = BTreeMap::new();
        let entries: Option<Vec<_>> = terms.iter().map(|t| self.index.term(t)).collect();
        if let Some(entries) = entries {
            let mut docs = entries[0].doc_ids();
            for entry in &entries[1..] {
                docs = intersect(&docs, &entry.doc_ids());
            }
            for doc_id in docs {
                let postings: Vec<_> = entries.iter().map(|e| &e.postings[&doc_id]).collect();
                let starts: Vec<u32> = postings[0]
                    .positions
                    .iter()
                    .copied()
                    .filter(|&start| {
                        postings[1..]
                            .iter()
                            .enumerate()
                            .all(|(i, p)| p.contains(start + i as u32 + 1))
                    })
                    .collect();
                if !starts.is_empty() {
                    hits.insert(doc_id, Hit { starts });
                }
            }
        }
        LeafMatch { terms: terms.to_vec(), df: hits.len() as u32, hits }
    }
}

/// Score descending, then doc id ascending.
fn rank_order(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Normalized terms of a leaf. A term that normalizes to several tokens is
/// matched as a phrase.
fn leaf_terms(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Term(t) => terms(t),
        Expr::Phrase(words) => terms(&words.join(" ")),
        _ => Vec::new(),
    }
}

fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn union(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

fn difference(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &x in a {
        while j < b.len() && b[j] < x {
            j += 1;
        }
        if j >= b.len() || b[j] != x {
            out.push(x);
        }
    }
    out
}
