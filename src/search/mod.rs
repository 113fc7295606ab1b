//! Search: patterns, scopes, the word index and the engine.
//!
//! ```text
//! SearchPattern ─┐
//!                ├─> SearchEngine ─> locator (per document) ─> SearchRequestor
//! SearchScope ───┘          │
//!                           └─> SearchIndex (skip documents without the word)
//! ```

mod collector;
mod engine;
mod index;
mod locator;
mod pattern;
mod scope;

pub use collector::{Accuracy, MatchKind, ResultCollector, SearchMatch, SearchRequestor};
pub use engine::SearchEngine;
pub use index::SearchIndex;
pub use pattern::{LimitTo, NamePattern, PatternTarget, SearchFor, SearchPattern};
pub use scope::{DocFilter, DocKey, ScopeDocument, ScopeKind, SearchScope};
