//! The search entry point.

use super::collector::SearchRequestor;
use super::locator::{MatchTarget, locate_in_archive, locate_in_source};
use super::pattern::SearchPattern;
use super::scope::{DocKey, SearchScope};
use crate::error::Result;
use crate::hir::Semantics;
use crate::project::{Workspace, WorkspaceSnapshot};

/// Runs searches over a workspace snapshot.
///
/// Documents are visited in scope order, which is (project, path) order;
/// matches within one document are reported by source offset. The same
/// query against the same snapshot always reports the same matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchEngine;

impl SearchEngine {
    pub fn new() -> Self {
        Self
    }

    /// Search the workspace's current snapshot.
    pub fn search(
        &self,
        workspace: &Workspace,
        pattern: &SearchPattern,
        scope: &SearchScope,
        requestor: &mut dyn SearchRequestor,
    ) -> Result<()> {
        let snapshot = workspace.snapshot();
        self.search_snapshot(&snapshot, pattern, scope, requestor)
    }

    pub fn search_snapshot(
        &self,
        snapshot: &WorkspaceSnapshot,
        pattern: &SearchPattern,
        scope: &SearchScope,
        requestor: &mut dyn SearchRequestor,
    ) -> Result<()> {
        let sema = Semantics::new(snapshot);
        let target = MatchTarget::new(&sema, pattern)?;
        let index = snapshot.index();
        let word = target.index_word();

        requestor.begin_reporting();
        let mut visited = 0usize;
        let mut reported = 0usize;
        for doc in scope.documents() {
            if word.is_some_and(|word| !index.may_contain(doc.key, word)) {
                continue;
            }
            let mut matches = match doc.key {
                DocKey::Source(file) => match snapshot.source(file) {
                    Some(source) => locate_in_source(&sema, &target, pattern.limit_to, doc, source),
                    None => {
                        tracing::trace!(?file, "file is gone from this snapshot");
                        continue;
                    }
                },
                DocKey::Archive(id) => match snapshot.archive(id) {
                    Some(archive) => locate_in_archive(&sema, &target, pattern.limit_to, doc, archive),
                    None => continue,
                },
            };
            visited += 1;
            matches.sort_by_key(|m| m.range.map(|r| r.start()));
            tracing::trace!(resource = %doc.resource, project = %doc.project, matches = matches.len(), "located");
            reported += matches.len();
            for found in matches {
                requestor.accept(found);
            }
        }
        requestor.end_reporting();

        tracing::debug!(
            pattern = ?pattern.target,
            limit_to = ?pattern.limit_to,
            documents = scope.documents().len(),
            visited,
            reported,
            "search finished"
        );
        Ok(())
    }
}
