use anyhow::{Context, Result};
use parking_lot::RwLock;
use search_core::persist::{load_all, IndexPaths, TextStore};
use search_core::snippet::{generate_snippet, SnippetConfig};
use search_core::{Bm25Params, DocId, Index, QueryEvaluator, SearchError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

const MAX_K: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub bm25: Bm25Params,
    pub snippet: SnippetConfig,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// An immutable index plus the stored texts used for snippets.
pub struct Snapshot {
    evaluator: QueryEvaluator,
    texts: TextStore,
}

impl Snapshot {
    pub fn new(index: Index, texts: TextStore, params: Bm25Params) -> Result<Self, SearchError> {
        let evaluator = QueryEvaluator::new(Arc::new(index), params)?;
        Ok(Self { evaluator, texts })
    }

    pub fn load<P: AsRef<Path>>(dir: P, params: Bm25Params) -> Result<Self> {
        let paths = IndexPaths::new(dir.as_ref());
        let (index, texts, meta) =
            load_all(&paths).with_context(|| format!("loading index from {}", dir.as_ref().display()))?;
        tracing::info!(num_docs = meta.num_docs, num_terms = meta.num_terms, created_at = %meta.created_at, "loaded index");
        Ok(Self::new(index, texts, params)?)
    }

    pub fn index(&self) -> &Index { self.evaluator.index() }
}

/// Query facade. The current snapshot is swapped atomically; queries already
/// running keep the `Arc` they started with.
pub struct SearchEngine {
    current: RwLock<Arc<Snapshot>>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(snapshot: Snapshot, config: SearchConfig) -> Self {
        Self { current: RwLock::new(Arc::new(snapshot)), config }
    }

    pub fn open<P: AsRef<Path>>(dir: P, config: SearchConfig) -> Result<Self> {
        let snapshot = Snapshot::load(dir, config.bm25)?;
        Ok(Self::new(snapshot, config))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> { Arc::clone(&self.current.read()) }

    /// Install a new snapshot and return the previous one.
    pub fn swap(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        std::mem::replace(&mut *self.current.write(), Arc::new(snapshot))
    }

    pub fn reload<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let snapshot = Snapshot::load(dir, self.config.bm25)?;
        self.swap(snapshot);
        Ok(())
    }

    pub fn search(&self, query: &str, top_k: usize) -> SearchResponse {
        let start = std::time::Instant::now();
        let snapshot = self.snapshot();
        let k = top_k.min(MAX_K);

        let (total_hits, results, error) = match snapshot.evaluator.search(query, k) {
            Ok(ranked) => {
                let hits = ranked
                    .results
                    .into_iter()
                    .map(|r| {
                        let meta = snapshot.index().doc(r.doc_id);
                        let text = snapshot.texts.get(&r.doc_id).map(String::as_str).unwrap_or("");
                        SearchHit {
                            doc_id: r.doc_id,
                            score: r.score,
                            title: meta.map(|m| m.title.clone()).unwrap_or_default(),
                            url: meta.map(|m| m.url.clone()).unwrap_or_default(),
                            snippet: generate_snippet(text, &r.matches, &self.config.snippet),
                        }
                    })
                    .collect();
                (ranked.total_hits, hits, None)
            }
            Err(err) => {
                tracing::debug!(query, error = %err, "query rejected");
                (0, Vec::new(), Some(err.to_string()))
            }
        };

        let took_s = start.elapsed().as_secs_f64();
        SearchResponse { query: query.to_string(), took_s, total_hits, results, error }
    }
}
