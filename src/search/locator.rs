//! Finding matches inside one document.
//!
//! A [`MatchTarget`] is a [`SearchPattern`] bound to a snapshot: element
//! handles are checked to exist and a method's type hierarchy is computed
//! once. Source documents are walked with a [`Visitor`] that keeps the
//! resolution context (enclosing types, locals, element label) current;
//! archives only yield declarations and implementors.

use std::mem;

use smol_str::SmolStr;

use super::collector::{Accuracy, MatchKind, SearchMatch};
use super::pattern::{LimitTo, NamePattern, PatternTarget, SearchFor, SearchPattern};
use super::scope::ScopeDocument;
use crate::base::TextRange;
use crate::error::{Error, Result};
use crate::hir::{
    CallResolution, FieldBinding, FieldHandle, FieldInfo, Locals, MethodBinding, MethodHandle,
    MethodInfo, Resolved, Semantics, SourceFile, SourceScope, Ty, TypeHierarchy, TypeInfo, TypeKey,
};
use crate::project::Archive;
use crate::syntax::ast::{
    Block, Expr, ExprKind, FieldDecl, Ident, ImportDecl, Initializer, LambdaBody, LambdaParam,
    LocalVar, MethodDecl, Stmt, TypeDecl, TypeRef,
};
use crate::syntax::visit::{self, Visitor};

// ============================================================================
// TARGETS
// ============================================================================

#[derive(Debug)]
pub(crate) enum MatchTarget {
    Type(TypeKey),
    Method {
        handle: MethodHandle,
        /// Hierarchy of the declaring type.
        hierarchy: TypeHierarchy,
    },
    Field(FieldHandle),
    Name {
        kind: SearchFor,
        qualifier: Option<NamePattern>,
        name: NamePattern,
        params: Option<Vec<SmolStr>>,
    },
}

impl MatchTarget {
    pub(crate) fn new(sema: &Semantics<'_>, pattern: &SearchPattern) -> Result<Self> {
        let snapshot = sema.snapshot();
        let target = match &pattern.target {
            PatternTarget::Type(key) => {
                if snapshot.type_info(key).is_none() {
                    return Err(Error::ElementNotFound(key.to_string()));
                }
                MatchTarget::Type(key.clone())
            }
            PatternTarget::Method(handle) => {
                let not_found = || Error::ElementNotFound(format!("{:?}", handle));
                let owner = snapshot.type_info(&handle.owner).ok_or_else(not_found)?;
                let declared = owner.methods.iter().any(|m| m.handle(&owner.key) == *handle);
                let default_constructor = handle.is_constructor()
                    && handle.params.is_empty()
                    && !owner.methods.iter().any(|m| m.is_constructor);
                if !declared && !default_constructor {
                    return Err(not_found());
                }
                MatchTarget::Method {
                    handle: handle.clone(),
                    hierarchy: TypeHierarchy::compute(sema, &handle.owner),
                }
            }
            PatternTarget::Field(handle) => {
                let exists = snapshot
                    .type_info(&handle.owner)
                    .is_some_and(|owner| owner.field(&handle.name).is_some());
                if !exists {
                    return Err(Error::ElementNotFound(format!("{:?}", handle)));
                }
                MatchTarget::Field(handle.clone())
            }
            PatternTarget::Name {
                kind,
                qualifier,
                name,
                params,
            } => MatchTarget::Name {
                kind: *kind,
                qualifier: qualifier.clone(),
                name: name.clone(),
                params: params.clone(),
            },
        };
        if pattern.limit_to == LimitTo::Implementors && target.kind() != SearchFor::Type {
            return Err(Error::InvalidPattern(
                "implementors can only be searched for types".to_string(),
            ));
        }
        Ok(target)
    }

    pub(crate) fn kind(&self) -> SearchFor {
        match self {
            MatchTarget::Type(_) => SearchFor::Type,
            MatchTarget::Method { .. } => SearchFor::Method,
            MatchTarget::Field(_) => SearchFor::Field,
            MatchTarget::Name { kind, .. } => *kind,
        }
    }

    /// A word every matching document contains.
    pub(crate) fn index_word(&self) -> Option<&str> {
        match self {
            MatchTarget::Type(key) => Some(key.simple_name()),
            MatchTarget::Method { handle, .. } => Some(&handle.selector),
            MatchTarget::Field(handle) => Some(&handle.name),
            MatchTarget::Name { name, .. } => name.exact_word(),
        }
    }

    fn type_matches(&self, key: &TypeKey) -> bool {
        match self {
            MatchTarget::Type(target) => target == key,
            MatchTarget::Name {
                kind: SearchFor::Type,
                qualifier,
                name,
                ..
            } => {
                name.matches(key.simple_name())
                    && qualifier.as_ref().is_none_or(|q| q.matches(key.qualifier()))
            }
            _ => false,
        }
    }

    /// Whether a type name that did not resolve could denote the target.
    fn unresolved_type_matches(&self, segments: &[SmolStr]) -> bool {
        let Some((last, prefix)) = segments.split_last() else {
            return false;
        };
        match self {
            MatchTarget::Type(target) => target.simple_name() == last.as_str(),
            MatchTarget::Name {
                kind: SearchFor::Type,
                qualifier,
                name,
                ..
            } => {
                name.matches(last)
                    && (prefix.is_empty()
                        || qualifier.as_ref().is_none_or(|q| q.matches(&prefix.join("."))))
            }
            _ => false,
        }
    }

    fn method_decl_matches(&self, owner: &TypeInfo, method: &MethodInfo) -> bool {
        match self {
            MatchTarget::Method { handle, hierarchy } => {
                let candidate = method.handle(&owner.key);
                candidate == *handle
                    || (!method.is_constructor
                        && hierarchy.is_subtype(&owner.key)
                        && candidate.selector == handle.selector
                        && candidate.params == handle.params)
            }
            MatchTarget::Name {
                kind: SearchFor::Method,
                qualifier,
                name,
                params,
            } => {
                !method.is_constructor
                    && name.matches(&method.name)
                    && owner_matches(qualifier.as_ref(), &owner.key)
                    && params.as_ref().is_none_or(|p| *p == method.erased_params())
            }
            _ => false,
        }
    }

    fn field_decl_matches(&self, owner: &TypeInfo, field: &FieldInfo) -> bool {
        match self {
            MatchTarget::Field(handle) => field.handle(&owner.key) == *handle,
            MatchTarget::Name {
                kind: SearchFor::Field,
                qualifier,
                name,
                ..
            } => name.matches(&field.name) && owner_matches(qualifier.as_ref(), &owner.key),
            _ => false,
        }
    }

    /// Accuracy of a call site `selector(args)` against the target.
    fn call_matches(&self, call: &CallResolution<'_>, selector: &str, arity: usize) -> Option<Accuracy> {
        match self {
            MatchTarget::Method { handle, hierarchy } if !handle.is_constructor() => {
                if selector != handle.selector {
                    return None;
                }
                match &call.binding {
                    Some(binding) => {
                        let bound = binding.handle();
                        if bound == *handle {
                            return Some(Accuracy::Exact);
                        }
                        let same_signature =
                            bound.selector == handle.selector && bound.params == handle.params;
                        let receiver_in_hierarchy =
                            call.receiver.as_ref().is_some_and(|r| hierarchy.contains(r));
                        (same_signature && hierarchy.contains(&bound.owner) && receiver_in_hierarchy)
                            .then_some(Accuracy::Exact)
                    }
                    None if arity == handle.arity() => match &call.receiver {
                        None => Some(Accuracy::Inaccurate),
                        Some(receiver) if hierarchy.contains(receiver) => Some(Accuracy::Inaccurate),
                        Some(_) => None,
                    },
                    None => None,
                }
            }
            MatchTarget::Name {
                kind: SearchFor::Method,
                qualifier,
                name,
                params,
            } => {
                if !name.matches(selector) {
                    return None;
                }
                match &call.binding {
                    Some(binding) => (owner_matches(qualifier.as_ref(), &binding.owner.key)
                        && params.as_ref().is_none_or(|p| *p == binding.method.erased_params()))
                    .then_some(Accuracy::Exact),
                    None => params
                        .as_ref()
                        .is_none_or(|p| p.len() == arity)
                        .then_some(Accuracy::Inaccurate),
                }
            }
            _ => None,
        }
    }

    /// Accuracy of a method reference `receiver::name`. No overload is
    /// selected without the functional interface type, so a hit is never
    /// exact.
    fn method_ref_matches(&self, receiver: Option<&TypeKey>, name: &str) -> Option<Accuracy> {
        match self {
            MatchTarget::Method { handle, .. } if handle.is_constructor() => {
                (name == "new" && receiver == Some(&handle.owner)).then_some(Accuracy::Inaccurate)
            }
            MatchTarget::Method { handle, hierarchy } => {
                let in_hierarchy = receiver.is_none_or(|r| hierarchy.contains(r));
                (name == handle.selector && in_hierarchy).then_some(Accuracy::Inaccurate)
            }
            MatchTarget::Name {
                kind: SearchFor::Method,
                qualifier,
                name: pattern,
                ..
            } => {
                let owner_ok = receiver.is_none_or(|r| owner_matches(qualifier.as_ref(), r));
                (name != "new" && pattern.matches(name) && owner_ok).then_some(Accuracy::Inaccurate)
            }
            _ => None,
        }
    }

    /// Accuracy of an instance creation or explicit constructor call.
    fn constructor_matches(
        &self,
        sema: &Semantics<'_>,
        owner: Option<&TypeKey>,
        binding: Option<MethodBinding<'_>>,
        written: &str,
        arity: usize,
    ) -> Option<Accuracy> {
        let MatchTarget::Method { handle, .. } = self else {
            return None;
        };
        if !handle.is_constructor() {
            return None;
        }
        match owner {
            Some(owner) if *owner == handle.owner => match binding {
                Some(binding) => (binding.handle() == *handle).then_some(Accuracy::Exact),
                None if arity == handle.arity() => {
                    let implicit = sema
                        .type_info(owner)
                        .is_some_and(|info| !info.methods.iter().any(|m| m.is_constructor));
                    Some(if implicit { Accuracy::Exact } else { Accuracy::Inaccurate })
                }
                None => None,
            },
            Some(_) => None,
            None => (written == handle.owner.simple_name() && arity == handle.arity())
                .then_some(Accuracy::Inaccurate),
        }
    }

    /// Accuracy of a field reference named `name`. `unresolved` is set when
    /// the qualifier could not be typed.
    fn field_ref_matches(&self, binding: Option<FieldBinding<'_>>, name: &str, unresolved: bool) -> Option<Accuracy> {
        match self {
            MatchTarget::Field(handle) => match binding {
                Some(binding) => {
                    (binding.field.handle(&binding.owner.key) == *handle).then_some(Accuracy::Exact)
                }
                None => (unresolved && name == handle.name).then_some(Accuracy::Inaccurate),
            },
            MatchTarget::Name {
                kind: SearchFor::Field,
                qualifier,
                name: pattern,
                ..
            } => {
                if !pattern.matches(name) {
                    return None;
                }
                match binding {
                    Some(binding) => owner_matches(qualifier.as_ref(), &binding.owner.key)
                        .then_some(Accuracy::Exact),
                    None => unresolved.then_some(Accuracy::Inaccurate),
                }
            }
            _ => None,
        }
    }
}

/// A dotted qualifier names the declaring type in full, a plain one its
/// simple name.
fn owner_matches(qualifier: Option<&NamePattern>, owner: &TypeKey) -> bool {
    match qualifier {
        None => true,
        Some(q) if q.as_str().contains('.') => q.matches(&owner.qualified_name),
        Some(q) => q.matches(owner.simple_name()),
    }
}

/// `key` and its outer types, innermost first.
fn enclosing_chain(sema: &Semantics<'_>, key: &TypeKey) -> Vec<TypeKey> {
    let mut chain = vec![key.clone()];
    let mut outer = sema.type_info(key).and_then(|info| info.outer.clone());
    while let Some(name) = outer {
        let outer_key = TypeKey::new(key.origin, name);
        outer = sema.type_info(&outer_key).and_then(|info| info.outer.clone());
        chain.push(outer_key);
    }
    chain
}

// ============================================================================
// ARCHIVES
// ============================================================================

/// Declarations (or implementors) in an archive, in type name order.
pub(crate) fn locate_in_archive(
    sema: &Semantics<'_>,
    target: &MatchTarget,
    limit_to: LimitTo,
    doc: &ScopeDocument,
    archive: &Archive,
) -> Vec<SearchMatch> {
    let mut infos: Vec<&TypeInfo> = archive.types().iter().collect();
    infos.sort_by(|a, b| a.qualified_name().cmp(b.qualified_name()));

    let mut matches = Vec::new();
    let mut report = |element: String, kind: MatchKind| {
        matches.push(SearchMatch {
            project: doc.project.clone(),
            resource: doc.resource.clone(),
            element,
            range: None,
            source: None,
            accuracy: Accuracy::Exact,
            kind,
            file: None,
        });
    };
    for info in infos {
        if !doc.encloses(&enclosing_chain(sema, &info.key)) {
            continue;
        }
        if limit_to == LimitTo::Implementors {
            let implements = info
                .superclass
                .iter()
                .chain(&info.interfaces)
                .filter_map(|written| sema.resolve_member_ref(&info.key, written))
                .any(|key| target.type_matches(&key));
            if implements {
                report(info.qualified_name().to_string(), MatchKind::Implementor);
            }
            continue;
        }
        if !limit_to.declarations() {
            continue;
        }
        match target.kind() {
            SearchFor::Type => {
                if target.type_matches(&info.key) {
                    report(info.qualified_name().to_string(), MatchKind::Declaration);
                }
            }
            SearchFor::Method => {
                for method in info.methods.iter().filter(|m| target.method_decl_matches(info, m)) {
                    report(info.method_label(method), MatchKind::Declaration);
                }
            }
            SearchFor::Field => {
                for field in info.fields.iter().filter(|f| target.field_decl_matches(info, f)) {
                    report(info.field_label(field), MatchKind::Declaration);
                }
            }
        }
    }
    matches
}

// ============================================================================
// SOURCES
// ============================================================================

/// Every match in a compilation unit, in traversal order.
pub(crate) fn locate_in_source<'s>(
    sema: &Semantics<'s>,
    target: &MatchTarget,
    limit_to: LimitTo,
    doc: &ScopeDocument,
    file: &'s SourceFile,
) -> Vec<SearchMatch> {
    let (Some(unit), Some(scope)) = (file.unit(), sema.scope(file, None)) else {
        tracing::trace!(
            path = %file.workspace_path(),
            at = ?file.syntax_error_at(),
            "no syntax tree, skipping"
        );
        return Vec::new();
    };
    let mut locator = SourceLocator {
        sema,
        target,
        limit_to,
        doc,
        file,
        scope,
        locals: Locals::default(),
        types: Vec::new(),
        label: None,
        body_depth: 0,
        matches: Vec::new(),
    };
    if limit_to.references() && target.kind() == SearchFor::Type {
        for import in &unit.imports {
            locator.import(import);
        }
    }
    visit::walk_unit(&mut locator, unit);
    locator.matches
}

struct SourceLocator<'a, 's> {
    sema: &'a Semantics<'s>,
    target: &'a MatchTarget,
    limit_to: LimitTo,
    doc: &'a ScopeDocument,
    file: &'s SourceFile,
    scope: SourceScope<'s>,
    locals: Locals,
    /// Named types around the current position, outermost first.
    types: Vec<&'s TypeInfo>,
    /// Label of the innermost reportable element.
    label: Option<String>,
    /// Depth of method bodies, initializers and field initializers. Types
    /// declared inside them are local or anonymous and have no symbols.
    body_depth: usize,
    matches: Vec<SearchMatch>,
}

impl<'a, 's> SourceLocator<'a, 's> {
    fn report(&mut self, kind: MatchKind, range: TextRange, accuracy: Accuracy) {
        let chain: Vec<TypeKey> = self.types.iter().rev().map(|t| t.key.clone()).collect();
        if !self.doc.encloses(&chain) {
            return;
        }
        let Some(element) = self.label.clone() else {
            return;
        };
        self.matches.push(SearchMatch {
            project: self.doc.project.clone(),
            resource: self.doc.resource.clone(),
            element,
            range: Some(range),
            source: self.file.text_at(range).map(str::to_string),
            accuracy,
            kind,
            file: Some(self.file.id),
        });
    }

    fn with_label<R>(&mut self, label: Option<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = mem::replace(&mut self.label, label);
        let result = f(self);
        self.label = saved;
        result
    }

    fn in_body(&mut self, f: impl FnOnce(&mut Self)) {
        self.body_depth += 1;
        f(self);
        self.body_depth -= 1;
    }

    fn in_frame(&mut self, f: impl FnOnce(&mut Self)) {
        self.locals.push_frame();
        f(self);
        self.locals.pop_frame();
    }

    fn import(&mut self, import: &ImportDecl) {
        if import.on_demand {
            return;
        }
        let type_segments = if import.is_static {
            &import.segments[..import.segments.len().saturating_sub(1)]
        } else {
            &import.segments[..]
        };
        if type_segments.is_empty() {
            return;
        }
        let accuracy = match self.scope.env().lookup(&type_segments.join(".")) {
            Some(key) if self.target.type_matches(&key) => Accuracy::Exact,
            Some(_) => return,
            None if self.target.unresolved_type_matches(type_segments) => Accuracy::Inaccurate,
            None => return,
        };
        let label = Some(format!("import {}", import.segments.join(".")));
        self.with_label(label, |this| {
            this.report(MatchKind::Reference, import.range, accuracy)
        });
    }

    /// A type reference written at the current position.
    fn type_ref(&mut self, ty: &TypeRef) {
        if ty.is_primitive() || (ty.segments.len() == 1 && ty.segments[0] == "var") {
            return;
        }
        let accuracy = match self.sema.resolve_type_ref(&self.scope, ty) {
            Some(key) if self.target.type_matches(&key) => Accuracy::Exact,
            Some(_) => return,
            None if self.target.unresolved_type_matches(&ty.segments) => Accuracy::Inaccurate,
            None => return,
        };
        self.report(MatchKind::Reference, ty.range, accuracy);
    }

    /// A type denoted by an expression such as `X` in `X.TheX`.
    fn type_in_expr(&mut self, key: &TypeKey, range: TextRange) {
        if self.target.type_matches(key) {
            self.report(MatchKind::Reference, range, Accuracy::Exact);
        }
    }

    /// Declaration, supertype references and implementor matches of a named
    /// type. Supertypes are bound outside the type's own body.
    fn type_header(&mut self, info: &'s TypeInfo, decl: &TypeDecl) {
        if self.limit_to.declarations() && self.target.type_matches(&info.key) {
            self.report(MatchKind::Declaration, decl.name.range, Accuracy::Exact);
        }
        let supertypes = decl.superclass.iter().chain(&decl.interfaces);
        if self.limit_to == LimitTo::Implementors {
            for written in supertypes {
                let accuracy = match self.sema.resolve_type_ref(&self.scope, written) {
                    Some(key) if self.target.type_matches(&key) => Accuracy::Exact,
                    Some(_) => continue,
                    None if self.target.unresolved_type_matches(&written.segments) => {
                        Accuracy::Inaccurate
                    }
                    None => continue,
                };
                self.report(MatchKind::Implementor, written.range, accuracy);
            }
        } else if self.limit_to.references() && self.target.kind() == SearchFor::Type {
            for written in supertypes {
                self.type_ref(written);
            }
        }
    }

    fn references(&self) -> bool {
        self.limit_to.references()
    }

    fn name_expr(&mut self, ident: &Ident) {
        let resolved = self.sema.resolve_name(&self.scope, &self.locals, ident);
        match (self.target.kind(), &resolved) {
            (SearchFor::Type, Resolved::Type(key)) => self.type_in_expr(key, ident.range),
            (SearchFor::Type, Resolved::Unknown) => {
                if self.target.unresolved_type_matches(std::slice::from_ref(&ident.text)) {
                    self.report(MatchKind::Reference, ident.range, Accuracy::Inaccurate);
                }
            }
            (SearchFor::Field, Resolved::Value(_)) if self.locals.get(&ident.text).is_none() => {
                let binding = self.sema.field_in_scope(&self.scope, &ident.text);
                if let Some(accuracy) = self.target.field_ref_matches(binding, &ident.text, false) {
                    self.report(MatchKind::Reference, ident.range, accuracy);
                }
            }
            (SearchFor::Field, Resolved::Unknown) => {
                if let Some(accuracy) = self.target.field_ref_matches(None, &ident.text, true) {
                    self.report(MatchKind::Reference, ident.range, accuracy);
                }
            }
            _ => {}
        }
    }

    /// `target.name`. Returns false when the whole access denotes a type and
    /// its parts must not be visited.
    fn field_access(&mut self, expr: &Expr, target: &Expr, name: &Ident) -> bool {
        let qualifier = self.sema.resolve_expr(&self.scope, &self.locals, target);
        let whole = self
            .sema
            .resolve_member_access(&self.scope, qualifier.clone(), name);
        if let Resolved::Type(key) = &whole {
            if self.target.kind() == SearchFor::Type {
                self.type_in_expr(key, expr.range);
            }
            return false;
        }
        if self.target.kind() == SearchFor::Field {
            let (binding, unresolved) = match &qualifier {
                Resolved::Value(Ty::Class(key)) | Resolved::Type(key) => {
                    (self.sema.find_field(key, &name.text), false)
                }
                Resolved::Value(Ty::Unresolved(_) | Ty::Unknown) | Resolved::Unknown => (None, true),
                _ => (None, false),
            };
            if let Some(accuracy) = self.target.field_ref_matches(binding, &name.text, unresolved) {
                self.report(MatchKind::Reference, name.range, accuracy);
            }
        }
        true
    }

    fn call(&mut self, expr: &Expr, name: &Ident, arity: usize) {
        let call = self.sema.resolve_call(&self.scope, &self.locals, expr);
        if let Some(accuracy) = self.target.call_matches(&call, &name.text, arity) {
            let range = TextRange::new(name.range.start(), expr.range.end());
            self.report(MatchKind::Reference, range, accuracy);
        }
    }

    fn method_ref(&mut self, expr: &Expr, target: &Expr, name: &Ident) {
        let receiver = match self.sema.resolve_expr(&self.scope, &self.locals, target) {
            Resolved::Value(Ty::Class(key)) | Resolved::Type(key) => Some(key),
            _ => None,
        };
        if let Some(accuracy) = self.target.method_ref_matches(receiver.as_ref(), &name.text) {
            self.report(MatchKind::Reference, expr.range, accuracy);
        }
    }

    /// Parameters are locals of their own frame; untyped ones stay unknown.
    fn lambda(&mut self, params: &[LambdaParam], body: &LambdaBody) {
        self.in_frame(|this| {
            for param in params {
                let ty = match &param.ty {
                    Some(written) => {
                        this.visit_type_ref(written);
                        this.sema.ty_of_ref(&this.scope, written)
                    }
                    None => Ty::Unknown,
                };
                this.locals.declare(param.name.text.clone(), ty);
            }
            visit::walk_lambda_body(this, body);
        });
    }

    fn instance_creation(&mut self, expr: &Expr, ty: &TypeRef, args: &[Expr]) {
        let owner = self.sema.resolve_type_ref(&self.scope, ty);
        let arg_types = self.sema.argument_types(&self.scope, &self.locals, args);
        let binding = owner
            .as_ref()
            .and_then(|key| self.sema.find_constructor(key, &arg_types));
        if let Some(accuracy) =
            self.target
                .constructor_matches(self.sema, owner.as_ref(), binding, ty.simple_name(), args.len())
        {
            self.report(MatchKind::Reference, expr.range, accuracy);
        }
    }

    fn constructor_call(&mut self, expr: &Expr, is_super: bool, args: &[Expr]) {
        let enclosing = self.scope.enclosing.clone();
        let owner = if is_super {
            enclosing.as_ref().and_then(|key| self.sema.superclass(key))
        } else {
            enclosing
        };
        let arg_types = self.sema.argument_types(&self.scope, &self.locals, args);
        let binding = owner
            .as_ref()
            .and_then(|key| self.sema.find_constructor(key, &arg_types));
        let written = if is_super { "super" } else { "this" };
        if let Some(accuracy) =
            self.target
                .constructor_matches(self.sema, owner.as_ref(), binding, written, args.len())
        {
            self.report(MatchKind::Reference, expr.range, accuracy);
        }
    }
}

impl Visitor for SourceLocator<'_, '_> {
    fn visit_type_decl(&mut self, decl: &TypeDecl) {
        let info = (self.body_depth == 0)
            .then(|| self.file.types().iter().find(|t| t.name_range == decl.name.range))
            .flatten();
        let Some(info) = info else {
            // local or anonymous: no symbols, stays in the enclosing element
            visit::walk_type_decl(self, decl);
            return;
        };
        self.types.push(info);
        let label = Some(info.qualified_name().to_string());
        self.with_label(label, |this| {
            this.type_header(info, decl);
            let body_scope = this.scope.with_enclosing(Some(info.key.clone()));
            let outer_scope = mem::replace(&mut this.scope, body_scope);
            visit::walk_members(this, &decl.members);
            this.scope = outer_scope;
        });
        self.types.pop();
    }

    fn visit_method(&mut self, method: &MethodDecl) {
        let info = self.types.last().copied().filter(|_| self.body_depth == 0);
        let symbol = info.and_then(|owner| {
            owner
                .methods
                .iter()
                .find(|m| m.name_range == method.name.range)
                .map(|m| (owner, m))
        });
        let label = match symbol {
            Some((owner, m)) => Some(owner.method_label(m)),
            None => self.label.clone(),
        };
        self.with_label(label, |this| {
            if let Some((owner, m)) = symbol {
                if this.limit_to.declarations() && this.target.method_decl_matches(owner, m) {
                    this.report(MatchKind::Declaration, method.name.range, Accuracy::Exact);
                }
            }
            this.in_frame(|this| {
                for param in &method.params {
                    let ty = this.sema.ty_of_ref(&this.scope, &param.ty);
                    this.locals.declare(param.name.text.clone(), ty);
                }
                this.in_body(|this| visit::walk_method(this, method));
            });
        });
    }

    fn visit_field(&mut self, field: &FieldDecl) {
        let info = self.types.last().copied().filter(|_| self.body_depth == 0);
        let symbol = info.and_then(|owner| {
            owner
                .fields
                .iter()
                .find(|f| f.name_range == field.name.range)
                .map(|f| (owner, f))
        });
        let label = match symbol {
            Some((owner, f)) => Some(owner.field_label(f)),
            None => self.label.clone(),
        };
        self.with_label(label, |this| {
            if let Some((owner, f)) = symbol {
                if this.limit_to.declarations() && this.target.field_decl_matches(owner, f) {
                    this.report(MatchKind::Declaration, field.name.range, Accuracy::Exact);
                }
            }
            this.in_body(|this| visit::walk_field(this, field));
        });
    }

    fn visit_initializer(&mut self, init: &Initializer) {
        let label = match self.types.last().filter(|_| self.body_depth == 0) {
            Some(owner) if init.is_static => Some(format!("{}.static {{}}", owner.qualified_name())),
            Some(owner) => Some(format!("{}.{{}}", owner.qualified_name())),
            None => self.label.clone(),
        };
        self.with_label(label, |this| this.in_body(|this| this.visit_block(&init.body)));
    }

    fn visit_block(&mut self, block: &Block) {
        self.in_frame(|this| visit::walk_block(this, block));
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::For { .. } | Stmt::ForEach { .. } => {
                self.in_frame(|this| visit::walk_stmt(this, stmt));
            }
            Stmt::Try {
                body,
                catches,
                finally,
            } => {
                self.visit_block(body);
                for catch in catches {
                    self.in_frame(|this| {
                        this.visit_type_ref(&catch.param.ty);
                        let ty = this.sema.ty_of_ref(&this.scope, &catch.param.ty);
                        this.locals.declare(catch.param.name.text.clone(), ty);
                        this.visit_block(&catch.body);
                    });
                }
                if let Some(finally) = finally {
                    self.visit_block(finally);
                }
            }
            _ => visit::walk_stmt(self, stmt),
        }
    }

    fn visit_local(&mut self, local: &LocalVar) {
        visit::walk_local(self, local);
        let ty = self.sema.local_ty(&self.scope, &self.locals, local);
        self.locals.declare(local.name.text.clone(), ty);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if !self.references() {
            // declarations can still hide in anonymous class bodies
            visit::walk_expr(self, expr);
            return;
        }
        match (&expr.kind, self.target.kind()) {
            (ExprKind::Name(ident), _) => self.name_expr(ident),
            (ExprKind::FieldAccess { target, name }, _) => {
                if self.field_access(expr, target, name) {
                    visit::walk_expr(self, expr);
                }
            }
            (ExprKind::Call { name, args, .. }, SearchFor::Method) => {
                self.call(expr, name, args.len());
                visit::walk_expr(self, expr);
            }
            (ExprKind::New { ty, args, .. }, SearchFor::Method) => {
                self.instance_creation(expr, ty, args);
                visit::walk_expr(self, expr);
            }
            (ExprKind::ConstructorCall { is_super, args }, SearchFor::Method) => {
                self.constructor_call(expr, *is_super, args);
                visit::walk_expr(self, expr);
            }
            (ExprKind::MethodRef { target, name }, SearchFor::Method) => {
                self.method_ref(expr, target, name);
                visit::walk_expr(self, expr);
            }
            (ExprKind::Lambda { params, body }, _) => self.lambda(params, body),
            _ => visit::walk_expr(self, expr),
        }
    }

    fn visit_type_ref(&mut self, ty: &TypeRef) {
        if self.references() && self.target.kind() == SearchFor::Type {
            self.type_ref(ty);
        }
    }
}
