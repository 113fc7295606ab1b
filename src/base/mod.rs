//! Foundation types shared by every layer.
//!
//! - [`FileId`], [`ProjectId`], [`ArchiveId`] - workspace-local handles
//! - [`TextRange`], [`TextSize`] - byte ranges in source text
//! - [`LineCol`], [`LineIndex`] - line/column conversion
//!
//! This module has NO dependencies on other jseek modules.

mod file_id;
mod span;

pub use file_id::{ArchiveId, FileId, IdAllocator, ProjectId};
pub use span::{LineCol, LineIndex, TextRange, TextSize, slice};

pub use text_size;
