//! High-level model of Java code: declared symbols and their meaning.
//!
//! - [`SourceFile`] - a parsed compilation unit with its declared types
//! - [`TypeInfo`], [`MethodInfo`], [`FieldInfo`] - declarations from sources and archives
//! - [`Semantics`] - binds names, types expressions, finds compile-time call targets
//! - [`TypeHierarchy`] - supertypes and subtypes of a focus type
//!
//! Element identities ([`TypeKey`], [`MethodHandle`], [`FieldHandle`]) are
//! plain values and stay valid across snapshots as long as the declaring
//! file is not replaced.

mod hierarchy;
mod ids;
mod resolve;
mod source;
mod symbols;

pub use hierarchy::TypeHierarchy;
pub(crate) use hierarchy::projects_seeing;
pub use ids::{Element, FieldHandle, MethodHandle, Origin, TypeKey, erase_signature};
pub use resolve::{
    CallResolution, FieldBinding, Locals, MethodBinding, Resolved, Semantics, SourceScope, Ty,
};
pub use source::SourceFile;
pub use symbols::{FieldInfo, MethodInfo, TypeInfo, collect_types};
