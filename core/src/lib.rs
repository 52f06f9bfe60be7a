pub mod builder;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod query;
pub mod snippet;
pub mod tokenizer;

pub use builder::{build, SourceDocument};
pub use error::{ParseError, PersistError, SearchError};
pub use eval::{Bm25Params, QueryEvaluator, Ranked, ScoredResult};
pub use index::{DocMeta, Index, Posting, TermEntry};
pub use query::{parse, Expr};
pub use snippet::{generate_snippet, SnippetConfig};

pub type DocId = u32;
