//! Word index: which documents mention which identifiers.
//!
//! A search only parses-and-locates documents containing its target's
//! simple name. The index is built once per snapshot.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::scope::DocKey;
use crate::project::WorkspaceSnapshot;
use crate::syntax::lexer::{TokenKind, tokenize};

#[derive(Debug, Default)]
pub struct SearchIndex {
    words: FxHashMap<SmolStr, FxHashSet<DocKey>>,
    /// Documents the index knows about. Others are never filtered out.
    indexed: FxHashSet<DocKey>,
}

impl SearchIndex {
    pub fn build(snapshot: &WorkspaceSnapshot) -> Self {
        let sources: Vec<_> = snapshot.sources().collect();
        // lex files in parallel
        let per_file: Vec<(DocKey, FxHashSet<SmolStr>)> = sources
            .par_iter()
            .map(|file| {
                let words = match tokenize(&file.text) {
                    Ok(tokens) => tokens
                        .iter()
                        .filter(|t| t.kind == TokenKind::Ident)
                        .filter_map(|t| crate::base::slice(&file.text, t.range))
                        .map(SmolStr::new)
                        .collect(),
                    Err(err) => {
                        tracing::trace!(path = %file.workspace_path(), offset = ?err.offset, "not indexing unlexable file");
                        FxHashSet::default()
                    }
                };
                (DocKey::Source(file.id), words)
            })
            .collect();

        let mut index = SearchIndex::default();
        for (doc, words) in per_file {
            index.insert(doc, words);
        }
        for archive in snapshot.archives() {
            let mut words = FxHashSet::default();
            for info in archive.types() {
                words.insert(SmolStr::new(info.simple_name()));
                words.extend(info.methods.iter().map(|m| m.name.clone()));
                words.extend(info.fields.iter().map(|f| f.name.clone()));
                words.extend(info.superclass.iter().chain(&info.interfaces).map(|t| SmolStr::new(t.simple_name())));
            }
            index.insert(DocKey::Archive(archive.id), words);
        }
        tracing::debug!(documents = index.indexed.len(), words = index.words.len(), "built search index");
        index
    }

    fn insert(&mut self, doc: DocKey, words: FxHashSet<SmolStr>) {
        self.indexed.insert(doc);
        for word in words {
            self.words.entry(word).or_default().insert(doc);
        }
    }

    /// False only when `doc` is indexed and never mentions `word`.
    pub fn may_contain(&self, doc: DocKey, word: &str) -> bool {
        !self.indexed.contains(&doc) || self.words.get(word).is_some_and(|docs| docs.contains(&doc))
    }

    pub fn documents_with(&self, word: &str) -> impl Iterator<Item = DocKey> + '_ {
        self.words.get(word).into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.indexed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectConfig, Workspace};

    #[test]
    fn test_words_map_to_documents() {
        let ws = Workspace::new();
        ws.create_project(ProjectConfig::new("P")).unwrap();
        let a = ws
            .create_file("/P/A.java", "class A { void foo() { bar(); } }")
            .unwrap();
        let b = ws.create_file("/P/B.java", "class B { /* foo */ }").unwrap();
        let snapshot = ws.snapshot();
        let index = snapshot.index();
        assert!(index.may_contain(DocKey::Source(a), "foo"));
        assert!(index.may_contain(DocKey::Source(a), "bar"));
        // comments are not indexed
        assert!(!index.may_contain(DocKey::Source(b), "foo"));
        assert_eq!(index.documents_with("foo").collect::<Vec<_>>(), [DocKey::Source(a)]);
        // JCL plus two sources
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_archives_index_declared_names() {
        let ws = Workspace::new();
        let snapshot = ws.snapshot();
        let index = snapshot.index();
        let jcl = snapshot.archives().next().unwrap().id;
        assert!(index.may_contain(DocKey::Archive(jcl), "Object"));
        assert!(index.may_contain(DocKey::Archive(jcl), "toString"));
        assert!(!index.may_contain(DocKey::Archive(jcl), "zork"));
    }

    #[test]
    fn test_index_is_shared_within_a_snapshot() {
        let ws = Workspace::new();
        let snapshot = ws.snapshot();
        assert!(std::sync::Arc::ptr_eq(&snapshot.index(), &snapshot.index()));
    }
}
