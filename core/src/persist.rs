use crate::error::PersistError;
use crate::{DocId, Index};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    pub fn for_index(index: &Index) -> Self {
        MetaFile {
            num_docs: index.doc_count,
            num_terms: index.num_terms(),
            created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
            version: FORMAT_VERSION,
        }
    }
}

/// Stored raw document text, keyed by doc id. Kept apart from `index.json`
/// so the index file holds only the cross-process contract.
pub type TextStore = BTreeMap<DocId, String>;

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.json") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io { path: path.display().to_string(), source }
}

fn create(path: &Path) -> Result<BufWriter<File>, PersistError> {
    File::create(path).map(BufWriter::new).map_err(io_err(path))
}

fn open(path: &Path) -> Result<BufReader<File>, PersistError> {
    File::open(path).map(BufReader::new).map_err(io_err(path))
}

pub fn to_json(index: &Index) -> Result<String, PersistError> {
    Ok(serde_json::to_string(index)?)
}

/// Parse and validate an index from its JSON form.
pub fn from_json(json: &str) -> Result<Index, PersistError> {
    let index: Index = serde_json::from_str(json)?;
    index.validate()?;
    Ok(index)
}

pub fn save_index(paths: &IndexPaths, index: &Index) -> Result<(), PersistError> {
    create_dir_all(&paths.root).map_err(io_err(&paths.root))?;
    let path = paths.index();
    let mut f = create(&path)?;
    serde_json::to_writer(&mut f, index)?;
    f.flush().map_err(io_err(&path))?;
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<Index, PersistError> {
    let path = paths.index();
    let mut buf = String::new();
    open(&path)?.read_to_string(&mut buf).map_err(io_err(&path))?;
    from_json(&buf)
}

pub fn save_docs(paths: &IndexPaths, texts: &TextStore) -> Result<(), PersistError> {
    create_dir_all(&paths.root).map_err(io_err(&paths.root))?;
    let path = paths.docs();
    let mut f = create(&path)?;
    let bytes = bincode::serialize(texts)?;
    f.write_all(&bytes).map_err(io_err(&path))?;
    f.flush().map_err(io_err(&path))?;
    Ok(())
}

pub fn load_docs(paths: &IndexPaths) -> Result<TextStore, PersistError> {
    let path = paths.docs();
    let mut buf = Vec::new();
    open(&path)?.read_to_end(&mut buf).map_err(io_err(&path))?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), PersistError> {
    create_dir_all(&paths.root).map_err(io_err(&paths.root))?;
    let path = paths.meta();
    let mut f = create(&path)?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes()).map_err(io_err(&path))?;
    f.flush().map_err(io_err(&path))?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, PersistError> {
    let path = paths.meta();
    Ok(serde_json::from_reader(open(&path)?)?)
}

/// Write index, stored texts and metadata in one go.
pub fn save_all(paths: &IndexPaths, index: &Index, texts: &TextStore) -> Result<MetaFile, PersistError> {
    save_index(paths, index)?;
    save_docs(paths, texts)?;
    let meta = MetaFile::for_index(index);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index saved");
    Ok(meta)
}

/// Load everything a searcher needs. Rejects indexes written by a newer format.
pub fn load_all(paths: &IndexPaths) -> Result<(Index, TextStore, MetaFile), PersistError> {
    let meta = load_meta(paths)?;
    if meta.version > FORMAT_VERSION {
        return Err(PersistError::Corrupt(format!(
            "index format version {} is newer than supported {FORMAT_VERSION}",
            meta.version
        )));
    }
    let index = load_index(paths)?;
    if index.doc_count != meta.num_docs {
        return Err(PersistError::Corrupt(format!(
            "meta.json says {} docs, index.json has {}",
            meta.num_docs, index.doc_count
        )));
    }
    let texts = load_docs(paths)?;
    Ok((index, texts, meta))
}
