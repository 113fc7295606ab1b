//! Name and expression resolution.
//!
//! [`Semantics`] binds what the parser left as written: type references,
//! simple names, field accesses and call sites. Resolution is static only.
//! An expression's type is its declared type, never the type of whatever
//! was assigned to it elsewhere.
//!
//! Names in a source file are bound through the file's own project
//! environment (imports, package, classpath), independent of any search
//! scope. Archive types carry pre-qualified references and are bound by
//! qualified name.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use super::ids::{Origin, TypeKey};
use super::source::SourceFile;
use super::symbols::{FieldInfo, MethodInfo, TypeInfo};
use crate::env::ProjectEnvironment;
use crate::project::WorkspaceSnapshot;
use crate::syntax::ast::{
    BinaryOp, CompilationUnit, Expr, ExprKind, Ident, Literal, LocalVar, TypeDeclKind, TypeRef,
    UnaryOp,
};

const JAVA_LANG_OBJECT: &str = "java.lang.Object";

// ============================================================================
// TYPES
// ============================================================================

/// The static type of an expression.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Primitive(SmolStr),
    Class(TypeKey),
    Array(Box<Ty>),
    /// A named type that is not on the classpath. The simple name is kept so
    /// signatures can still be compared.
    Unresolved(SmolStr),
    Null,
    Unknown,
}

impl Ty {
    /// Erased simple name, as used in method signatures: `Object`, `int[]`.
    pub fn erased_name(&self) -> Option<SmolStr> {
        match self {
            Ty::Primitive(name) | Ty::Unresolved(name) => Some(name.clone()),
            Ty::Class(key) => Some(SmolStr::new(key.simple_name())),
            Ty::Array(elem) => elem.erased_name().map(|n| SmolStr::new(format!("{}[]", n))),
            Ty::Null | Ty::Unknown => None,
        }
    }

    fn array_of(mut self, dims: u32) -> Self {
        for _ in 0..dims {
            self = Ty::Array(Box::new(self));
        }
        self
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Primitive(name) => f.write_str(name),
            Ty::Class(key) => write!(f, "{:?}", key),
            Ty::Array(elem) => write!(f, "{:?}[]", elem),
            Ty::Unresolved(name) => write!(f, "?{}", name),
            Ty::Null => f.write_str("null"),
            Ty::Unknown => f.write_str("<unknown>"),
        }
    }
}

/// What a name or expression turned out to denote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    Value(Ty),
    Type(TypeKey),
    Package(String),
    Unknown,
}

impl Resolved {
    fn into_ty(self) -> Ty {
        match self {
            Resolved::Value(ty) => ty,
            _ => Ty::Unknown,
        }
    }
}

/// A method a call site binds to at compile time.
#[derive(Clone, Copy, Debug)]
pub struct MethodBinding<'s> {
    pub owner: &'s TypeInfo,
    pub method: &'s MethodInfo,
}

impl MethodBinding<'_> {
    pub fn handle(&self) -> super::ids::MethodHandle {
        self.method.handle(&self.owner.key)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldBinding<'s> {
    pub owner: &'s TypeInfo,
    pub field: &'s FieldInfo,
}

/// Receiver and binding of a call site.
#[derive(Clone, Debug)]
pub struct CallResolution<'s> {
    /// Static type the method is looked up on. `None` when the receiver
    /// expression could not be typed.
    pub receiver: Option<TypeKey>,
    pub binding: Option<MethodBinding<'s>>,
}

/// Local variables in scope, innermost frame last.
#[derive(Clone, Debug, Default)]
pub struct Locals {
    frames: Vec<Vec<(SmolStr, Ty)>>,
}

impl Locals {
    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn declare(&mut self, name: impl Into<SmolStr>, ty: Ty) {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push((name.into(), ty));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Ty> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(local, _)| local == name)
            .map(|(_, ty)| ty)
    }
}

// ============================================================================
// SCOPES
// ============================================================================

/// A position inside a source file: the file, its project environment and
/// the innermost enclosing type.
#[derive(Clone)]
pub struct SourceScope<'s> {
    pub file: &'s SourceFile,
    unit: &'s CompilationUnit,
    env: Rc<ProjectEnvironment<'s>>,
    pub enclosing: Option<TypeKey>,
}

impl<'s> SourceScope<'s> {
    pub fn env(&self) -> &ProjectEnvironment<'s> {
        &self.env
    }

    pub fn with_enclosing(&self, enclosing: Option<TypeKey>) -> Self {
        Self {
            enclosing,
            ..self.clone()
        }
    }

    fn package(&self) -> String {
        self.unit.package_segments().join(".")
    }
}

impl fmt::Debug for SourceScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceScope")
            .field("file", &self.file.workspace_path())
            .field("enclosing", &self.enclosing)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
struct Supertypes {
    superclass: Option<TypeKey>,
    interfaces: Vec<TypeKey>,
}

// ============================================================================
// SEMANTICS
// ============================================================================

/// Resolution over one workspace snapshot, with per-query caches.
pub struct Semantics<'s> {
    snapshot: &'s WorkspaceSnapshot,
    envs: RefCell<FxHashMap<SmolStr, Rc<ProjectEnvironment<'s>>>>,
    supertypes: RefCell<FxHashMap<TypeKey, Rc<Supertypes>>>,
}

impl<'s> Semantics<'s> {
    pub fn new(snapshot: &'s WorkspaceSnapshot) -> Self {
        Self {
            snapshot,
            envs: RefCell::new(FxHashMap::default()),
            supertypes: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn snapshot(&self) -> &'s WorkspaceSnapshot {
        self.snapshot
    }

    pub fn env(&self, project: &str) -> Option<Rc<ProjectEnvironment<'s>>> {
        if let Some(env) = self.envs.borrow().get(project) {
            return Some(env.clone());
        }
        let env = Rc::new(self.snapshot.environment(project)?);
        self.envs
            .borrow_mut()
            .insert(SmolStr::new(project), env.clone());
        Some(env)
    }

    pub fn type_info(&self, key: &TypeKey) -> Option<&'s TypeInfo> {
        self.snapshot.type_info(key)
    }

    /// A scope at the top of `file`, or inside `enclosing`.
    pub fn scope(&self, file: &'s SourceFile, enclosing: Option<TypeKey>) -> Option<SourceScope<'s>> {
        Some(SourceScope {
            file,
            unit: file.unit()?,
            env: self.env(&file.project)?,
            enclosing,
        })
    }

    /// The scope a source type's own declarations are written in.
    fn declaration_scope(&self, key: &TypeKey) -> Option<SourceScope<'s>> {
        let file = self.snapshot.source(key.origin.file()?)?;
        self.scope(file, Some(key.clone()))
    }

    fn outer_of(&self, key: &TypeKey) -> Option<TypeKey> {
        let outer = self.type_info(key)?.outer.clone()?;
        Some(TypeKey::new(key.origin, outer))
    }

    /// `key` and its enclosing types, innermost first.
    fn enclosing_chain(&self, key: Option<&TypeKey>) -> Vec<TypeKey> {
        let mut chain = Vec::new();
        let mut current = key.cloned();
        while let Some(key) = current {
            current = self.outer_of(&key);
            chain.push(key);
        }
        chain
    }

    // ------------------------------------------------------------------
    // type references
    // ------------------------------------------------------------------

    /// Bind a type reference written at `scope`.
    pub fn resolve_type_ref(&self, scope: &SourceScope<'s>, ty: &TypeRef) -> Option<TypeKey> {
        if ty.is_primitive() {
            return None;
        }
        self.resolve_type_name(scope, &ty.segments)
    }

    /// The static type a written type reference denotes.
    pub fn ty_of_ref(&self, scope: &SourceScope<'s>, ty: &TypeRef) -> Ty {
        if ty.is_primitive() {
            return Ty::Primitive(SmolStr::new(ty.simple_name())).array_of(ty.dims);
        }
        match self.resolve_type_ref(scope, ty) {
            Some(key) => Ty::Class(key),
            None => Ty::Unresolved(SmolStr::new(ty.simple_name())),
        }
        .array_of(ty.dims)
    }

    pub fn resolve_type_name(&self, scope: &SourceScope<'s>, segments: &[SmolStr]) -> Option<TypeKey> {
        let (first, rest) = segments.split_first()?;
        if let Some(key) = self.resolve_simple_type(scope, first) {
            if let Some(member) = self.member_type_path(key, rest) {
                return Some(member);
            }
        }
        if rest.is_empty() {
            return None;
        }
        let dotted = segments.join(".");
        scope.env.lookup(&dotted)
    }

    fn member_type_path(&self, mut key: TypeKey, path: &[SmolStr]) -> Option<TypeKey> {
        for segment in path {
            key = self.member_type(&key, segment)?;
        }
        Some(key)
    }

    /// A member type declared in `owner` or inherited from its supertypes.
    pub fn member_type(&self, owner: &TypeKey, name: &str) -> Option<TypeKey> {
        self.lookup_order(owner).into_iter().find_map(|key| {
            let candidate = TypeKey::new(key.origin, format!("{}.{}", key.qualified_name, name));
            self.type_info(&candidate).map(|_| candidate)
        })
    }

    /// A simple type name as seen from `scope`: enclosing and member types,
    /// single-type imports, the same package, on-demand imports, then
    /// `java.lang`.
    pub fn resolve_simple_type(&self, scope: &SourceScope<'s>, name: &str) -> Option<TypeKey> {
        for enclosing in self.enclosing_chain(scope.enclosing.as_ref()) {
            if enclosing.simple_name() == name {
                return Some(enclosing);
            }
            if let Some(member) = self.member_type(&enclosing, name) {
                return Some(member);
            }
        }

        let imports = &scope.unit.imports;
        if let Some(import) = imports
            .iter()
            .find(|i| !i.on_demand && !i.is_static && i.segments.last().is_some_and(|s| s == name))
        {
            return scope.env.lookup(&import.segments.join("."));
        }

        let package = scope.package();
        let in_package = if package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", package, name)
        };
        if let Some(key) = scope.env.lookup(&in_package) {
            return Some(key);
        }

        for import in imports.iter().filter(|i| i.on_demand && !i.is_static) {
            let candidate = format!("{}.{}", import.segments.join("."), name);
            if let Some(key) = scope.env.lookup(&candidate) {
                return Some(key);
            }
        }

        scope.env.lookup(&format!("java.lang.{}", name))
    }

    /// Bind a type reference stored in a member of `owner` (a field type,
    /// parameter or return type).
    pub fn resolve_member_ref(&self, owner: &TypeKey, ty: &TypeRef) -> Option<TypeKey> {
        if ty.is_primitive() {
            return None;
        }
        match owner.origin {
            Origin::Source(_) => {
                let scope = self.declaration_scope(owner)?;
                self.resolve_type_ref(&scope, ty)
            }
            Origin::Binary(archive) => self.binary_type(archive, &ty.dotted()),
        }
    }

    fn member_ref_ty(&self, owner: &TypeKey, ty: &TypeRef) -> Ty {
        if ty.is_primitive() {
            return Ty::Primitive(SmolStr::new(ty.simple_name())).array_of(ty.dims);
        }
        match self.resolve_member_ref(owner, ty) {
            Some(key) => Ty::Class(key),
            None => Ty::Unresolved(SmolStr::new(ty.simple_name())),
        }
        .array_of(ty.dims)
    }

    /// Archive references are qualified: the declaring archive first, then
    /// every archive in registration order.
    fn binary_type(&self, archive: crate::base::ArchiveId, qualified: &str) -> Option<TypeKey> {
        if let Some(key) = self
            .snapshot
            .archive(archive)
            .and_then(|a| a.lookup_type(qualified))
        {
            return Some(key.clone());
        }
        self.snapshot
            .archives()
            .find_map(|a| a.lookup_type(qualified).cloned())
    }

    // ------------------------------------------------------------------
    // supertypes
    // ------------------------------------------------------------------

    fn supertypes(&self, key: &TypeKey) -> Rc<Supertypes> {
        if let Some(cached) = self.supertypes.borrow().get(key) {
            return cached.clone();
        }
        let computed = Rc::new(self.compute_supertypes(key));
        self.supertypes
            .borrow_mut()
            .insert(key.clone(), computed.clone());
        computed
    }

    fn compute_supertypes(&self, key: &TypeKey) -> Supertypes {
        let Some(info) = self.type_info(key) else {
            return Supertypes::default();
        };
        let resolve = |ty: &TypeRef| -> Option<TypeKey> {
            match key.origin {
                Origin::Source(_) => {
                    // supertypes are written outside the type's own body
                    let file = self.snapshot.source(key.origin.file()?)?;
                    let outer = info.outer.as_ref().map(|o| TypeKey::new(key.origin, o.clone()));
                    let scope = self.scope(file, outer)?;
                    self.resolve_type_ref(&scope, ty)
                }
                Origin::Binary(archive) => self.binary_type(archive, &ty.dotted()),
            }
        };

        let superclass = match &info.superclass {
            Some(ty) => resolve(ty),
            None if info.kind != TypeDeclKind::Interface && info.qualified_name() != JAVA_LANG_OBJECT => {
                self.implicit_object(key)
            }
            None => None,
        };
        let interfaces = info.interfaces.iter().filter_map(resolve).collect();
        Supertypes {
            superclass: superclass.filter(|s| s != key),
            interfaces,
        }
    }

    /// `java.lang.Object` as seen from where `key` is declared.
    fn implicit_object(&self, key: &TypeKey) -> Option<TypeKey> {
        match key.origin {
            Origin::Source(file) => {
                let project = &self.snapshot.source(file)?.project;
                self.env(project)?.lookup(JAVA_LANG_OBJECT)
            }
            Origin::Binary(archive) => self.binary_type(archive, JAVA_LANG_OBJECT),
        }
    }

    pub fn superclass(&self, key: &TypeKey) -> Option<TypeKey> {
        self.supertypes(key).superclass.clone()
    }

    /// Resolved direct superclass and superinterfaces.
    pub fn direct_supertypes(&self, key: &TypeKey) -> Vec<TypeKey> {
        let supers = self.supertypes(key);
        supers
            .superclass
            .iter()
            .chain(supers.interfaces.iter())
            .cloned()
            .collect()
    }

    /// All proper supertypes, nearest first.
    pub fn all_supertypes(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut order = self.lookup_order(key);
        order.retain(|k| k != key);
        order
    }

    /// `key`, its superclass chain, then superinterfaces breadth-first. This
    /// is the order members are looked up in.
    fn lookup_order(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut seen = FxHashSet::default();
        let mut order = Vec::new();
        let mut current = Some(key.clone());
        while let Some(class) = current {
            if !seen.insert(class.clone()) {
                break;
            }
            current = self.superclass(&class);
            order.push(class);
        }
        let mut queue: VecDeque<TypeKey> = order
            .iter()
            .flat_map(|k| self.supertypes(k).interfaces.clone())
            .collect();
        while let Some(iface) = queue.pop_front() {
            if !seen.insert(iface.clone()) {
                continue;
            }
            queue.extend(self.supertypes(&iface).interfaces.iter().cloned());
            order.push(iface);
        }
        order
    }

    /// Whether `sub` is `sup` or inherits from it.
    pub fn is_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        sub == sup || self.lookup_order(sub).iter().any(|k| k == sup)
    }

    // ------------------------------------------------------------------
    // members
    // ------------------------------------------------------------------

    /// Compile-time binding of `name(args)` on `receiver`: the first type in
    /// lookup order declaring a method of that name accepting the arity.
    /// Several candidates in one type are told apart by argument types.
    pub fn find_method(&self, receiver: &TypeKey, name: &str, args: &[Ty]) -> Option<MethodBinding<'s>> {
        let mut order = self.lookup_order(receiver);
        if self.type_info(receiver).is_some_and(|i| i.is_interface()) {
            // interfaces expose Object's public methods
            if let Some(object) = self.implicit_object(receiver) {
                order.push(object);
            }
        }
        for key in order {
            let Some(owner) = self.type_info(&key) else {
                continue;
            };
            let candidates: Vec<&MethodInfo> = owner
                .methods_named(name)
                .filter(|m| m.accepts_arity(args.len()))
                .collect();
            let method = match candidates.as_slice() {
                [] => continue,
                [only] => *only,
                many => best_overload(many, args),
            };
            return Some(MethodBinding { owner, method });
        }
        None
    }

    pub fn find_constructor(&self, owner: &TypeKey, args: &[Ty]) -> Option<MethodBinding<'s>> {
        let info = self.type_info(owner)?;
        let candidates: Vec<&MethodInfo> = info
            .methods
            .iter()
            .filter(|m| m.is_constructor && m.accepts_arity(args.len()))
            .collect();
        let method = match candidates.as_slice() {
            [] => return None,
            [only] => *only,
            many => best_overload(many, args),
        };
        Some(MethodBinding { owner: info, method })
    }

    pub fn find_field(&self, receiver: &TypeKey, name: &str) -> Option<FieldBinding<'s>> {
        self.lookup_order(receiver).into_iter().find_map(|key| {
            let owner = self.type_info(&key)?;
            let field = owner.field(name)?;
            Some(FieldBinding { owner, field })
        })
    }

    pub fn field_ty(&self, binding: &FieldBinding<'s>) -> Ty {
        self.member_ref_ty(&binding.owner.key, &binding.field.ty)
    }

    pub fn return_ty(&self, binding: &MethodBinding<'s>) -> Ty {
        match &binding.method.return_type {
            Some(ret) => self.member_ref_ty(&binding.owner.key, ret),
            None => Ty::Class(binding.owner.key.clone()),
        }
    }

    // ------------------------------------------------------------------
    // expressions
    // ------------------------------------------------------------------

    /// Declared type of a local, with `var` inferred from its initializer.
    pub fn local_ty(&self, scope: &SourceScope<'s>, locals: &Locals, local: &LocalVar) -> Ty {
        let declared = self.ty_of_ref(scope, &local.ty);
        match (&declared, &local.init) {
            (Ty::Unresolved(name), Some(init)) if name == "var" && local.ty.dims == 0 => {
                self.type_of(scope, locals, init)
            }
            _ => declared,
        }
    }

    pub fn type_of(&self, scope: &SourceScope<'s>, locals: &Locals, expr: &Expr) -> Ty {
        self.resolve_expr(scope, locals, expr).into_ty()
    }

    pub fn resolve_expr(&self, scope: &SourceScope<'s>, locals: &Locals, expr: &Expr) -> Resolved {
        match &expr.kind {
            ExprKind::Literal(literal) => Resolved::Value(self.literal_ty(scope, *literal)),
            ExprKind::Name(ident) => self.resolve_name(scope, locals, ident),
            ExprKind::FieldAccess { target, name } => {
                let target = self.resolve_expr(scope, locals, target);
                self.resolve_member_access(scope, target, name)
            }
            ExprKind::Call { .. } => {
                let call = self.resolve_call(scope, locals, expr);
                match call.binding {
                    Some(binding) => Resolved::Value(self.return_ty(&binding)),
                    None => Resolved::Unknown,
                }
            }
            ExprKind::New { ty, .. } => Resolved::Value(self.ty_of_ref(scope, ty)),
            ExprKind::NewArray { ty, dims, .. } => {
                let elem = self.ty_of_ref(scope, ty);
                Resolved::Value(elem.array_of(dims.len().max(1) as u32))
            }
            ExprKind::ArrayInit(_) => Resolved::Unknown,
            ExprKind::ArrayAccess { array, .. } => match self.type_of(scope, locals, array) {
                Ty::Array(elem) => Resolved::Value(*elem),
                _ => Resolved::Unknown,
            },
            ExprKind::This => match &scope.enclosing {
                Some(key) => Resolved::Value(Ty::Class(key.clone())),
                None => Resolved::Unknown,
            },
            ExprKind::Super => match scope.enclosing.as_ref().and_then(|k| self.superclass(k)) {
                Some(key) => Resolved::Value(Ty::Class(key)),
                None => Resolved::Unknown,
            },
            ExprKind::ConstructorCall { .. } => Resolved::Value(Ty::Primitive(SmolStr::new_static("void"))),
            ExprKind::ClassLiteral(_) => match scope.env.lookup("java.lang.Class") {
                Some(key) => Resolved::Value(Ty::Class(key)),
                None => Resolved::Value(Ty::Unresolved(SmolStr::new_static("Class"))),
            },
            ExprKind::Assign { target, .. } => Resolved::Value(self.type_of(scope, locals, target)),
            ExprKind::Binary { op, lhs, rhs } => {
                Resolved::Value(self.binary_ty(scope, locals, *op, lhs, rhs))
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not => Resolved::Value(Ty::Primitive(SmolStr::new_static("boolean"))),
                _ => Resolved::Value(self.type_of(scope, locals, operand)),
            },
            ExprKind::Cast { ty, .. } => Resolved::Value(self.ty_of_ref(scope, ty)),
            ExprKind::InstanceOf { .. } => Resolved::Value(Ty::Primitive(SmolStr::new_static("boolean"))),
            ExprKind::Conditional {
                then_expr,
                else_expr,
                ..
            } => match self.type_of(scope, locals, then_expr) {
                Ty::Null | Ty::Unknown => Resolved::Value(self.type_of(scope, locals, else_expr)),
                ty => Resolved::Value(ty),
            },
            ExprKind::Paren(inner) => self.resolve_expr(scope, locals, inner),
            // functional interface types are not inferred
            ExprKind::Lambda { .. } | ExprKind::MethodRef { .. } => Resolved::Unknown,
        }
    }

    fn literal_ty(&self, scope: &SourceScope<'s>, literal: Literal) -> Ty {
        let primitive = |name: &'static str| Ty::Primitive(SmolStr::new_static(name));
        match literal {
            Literal::Int => primitive("int"),
            Literal::Long => primitive("long"),
            Literal::Float => primitive("float"),
            Literal::Double => primitive("double"),
            Literal::Char => primitive("char"),
            Literal::Boolean => primitive("boolean"),
            Literal::Null => Ty::Null,
            Literal::String => self.string_ty(scope),
        }
    }

    fn string_ty(&self, scope: &SourceScope<'s>) -> Ty {
        match scope.env.lookup("java.lang.String") {
            Some(key) => Ty::Class(key),
            None => Ty::Unresolved(SmolStr::new_static("String")),
        }
    }

    fn binary_ty(&self, scope: &SourceScope<'s>, locals: &Locals, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Ty {
        if op.is_comparison() {
            return Ty::Primitive(SmolStr::new_static("boolean"));
        }
        let left = self.type_of(scope, locals, lhs);
        if op == BinaryOp::Add {
            let is_string = |ty: &Ty| ty.erased_name().is_some_and(|n| n == "String");
            let right = self.type_of(scope, locals, rhs);
            if is_string(&left) || is_string(&right) {
                return self.string_ty(scope);
            }
        }
        left
    }

    /// A simple name in expression position: local, then field of an
    /// enclosing type, then type, then package.
    pub fn resolve_name(&self, scope: &SourceScope<'s>, locals: &Locals, ident: &Ident) -> Resolved {
        if let Some(ty) = locals.get(&ident.text) {
            return Resolved::Value(ty.clone());
        }
        if let Some(binding) = self.field_in_scope(scope, &ident.text) {
            return Resolved::Value(self.field_ty(&binding));
        }
        if let Some(key) = self.resolve_simple_type(scope, &ident.text) {
            return Resolved::Type(key);
        }
        if scope.env.has_package(&ident.text) {
            return Resolved::Package(ident.text.to_string());
        }
        Resolved::Unknown
    }

    /// A field visible by simple name from `scope`'s enclosing types.
    pub fn field_in_scope(&self, scope: &SourceScope<'s>, name: &str) -> Option<FieldBinding<'s>> {
        self.enclosing_chain(scope.enclosing.as_ref())
            .iter()
            .find_map(|key| self.find_field(key, name))
    }

    /// `target.name` where `target` has already been resolved.
    pub fn resolve_member_access(&self, scope: &SourceScope<'s>, target: Resolved, name: &Ident) -> Resolved {
        match target {
            Resolved::Value(Ty::Class(key)) => match self.find_field(&key, &name.text) {
                Some(binding) => Resolved::Value(self.field_ty(&binding)),
                None => Resolved::Unknown,
            },
            Resolved::Value(Ty::Array(_)) if name.text == "length" => {
                Resolved::Value(Ty::Primitive(SmolStr::new_static("int")))
            }
            Resolved::Type(key) => {
                if let Some(binding) = self.find_field(&key, &name.text) {
                    Resolved::Value(self.field_ty(&binding))
                } else if let Some(member) = self.member_type(&key, &name.text) {
                    Resolved::Type(member)
                } else {
                    Resolved::Unknown
                }
            }
            Resolved::Package(package) => {
                let qualified = format!("{}.{}", package, name.text);
                if let Some(key) = scope.env.lookup(&qualified) {
                    Resolved::Type(key)
                } else if scope.env.has_package(&qualified) {
                    Resolved::Package(qualified)
                } else {
                    Resolved::Unknown
                }
            }
            _ => Resolved::Unknown,
        }
    }

    /// Receiver type and compile-time binding of a call expression.
    ///
    /// An unqualified call is looked up in each enclosing type, innermost
    /// first; the receiver is the type where it was found.
    pub fn resolve_call(&self, scope: &SourceScope<'s>, locals: &Locals, call: &Expr) -> CallResolution<'s> {
        let ExprKind::Call { target, name, args } = &call.kind else {
            return CallResolution {
                receiver: None,
                binding: None,
            };
        };
        let arg_types: Vec<Ty> = args.iter().map(|a| self.type_of(scope, locals, a)).collect();

        let receiver = match target {
            None => {
                let chain = self.enclosing_chain(scope.enclosing.as_ref());
                for key in &chain {
                    if let Some(binding) = self.find_method(key, &name.text, &arg_types) {
                        return CallResolution {
                            receiver: Some(key.clone()),
                            binding: Some(binding),
                        };
                    }
                }
                chain.into_iter().next()
            }
            Some(target) => match self.resolve_expr(scope, locals, target) {
                Resolved::Value(Ty::Class(key)) | Resolved::Type(key) => Some(key),
                Resolved::Value(Ty::Array(_)) => scope.env.lookup(JAVA_LANG_OBJECT),
                _ => None,
            },
        };
        let binding = receiver
            .as_ref()
            .and_then(|key| self.find_method(key, &name.text, &arg_types));
        CallResolution { receiver, binding }
    }

    /// Argument types of a call, constructor call or instance creation.
    pub fn argument_types(&self, scope: &SourceScope<'s>, locals: &Locals, args: &[Expr]) -> Vec<Ty> {
        args.iter().map(|a| self.type_of(scope, locals, a)).collect()
    }
}

impl fmt::Debug for Semantics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semantics")
            .field("envs", &self.envs.borrow().len())
            .field("supertypes", &self.supertypes.borrow().len())
            .finish()
    }
}

/// The candidate whose parameter names agree with the most argument types.
/// Ties go to the first declared.
fn best_overload<'m>(candidates: &[&'m MethodInfo], args: &[Ty]) -> &'m MethodInfo {
    let score = |method: &MethodInfo| {
        method
            .erased_params()
            .iter()
            .zip(args)
            .filter(|(param, arg)| arg.erased_name().as_ref() == Some(*param))
            .count()
    };
    let mut best = candidates[0];
    let mut best_score = score(best);
    for &candidate in &candidates[1..] {
        let candidate_score = score(candidate);
        if candidate_score > best_score {
            best = candidate;
            best_score = candidate_score;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectConfig, Workspace};
    use crate::syntax::ast::{Member, MethodBody, Stmt};

    fn workspace() -> Workspace {
        let ws = Workspace::new();
        ws.create_project(ProjectConfig::new("P0")).unwrap();
        ws.create_folder("/P0/p0").unwrap();
        ws.create_file(
            "/P0/p0/X.java",
            "package p0;\npublic class X {\n  public static X TheX;\n  public void foo() {}\n  public static class Inner {}\n}",
        )
        .unwrap();
        ws.create_project(ProjectConfig::new("P1").variable("JCL_LIB").requires("P0"))
            .unwrap();
        ws.create_folder("/P1/p1").unwrap();
        ws.create_file(
            "/P1/p1/T.java",
            "package p1;\nimport p0.X;\npublic class T {\n  public X zork() { return X.TheX; }\n  void use(String s, Object o) { int[] xs = new int[3]; new T().zork().foo(); }\n  void over(Object o) {}\n  void over(String s) {}\n}",
        )
        .unwrap();
        ws
    }

    fn first_method_body<'a>(file: &'a SourceFile, index: usize) -> &'a [Stmt] {
        let unit = file.unit().unwrap();
        let methods: Vec<_> = unit.types[0]
            .members
            .iter()
            .filter_map(|m| match m {
                Member::Method(method) => Some(method),
                _ => None,
            })
            .collect();
        match &methods[index].body {
            MethodBody::Block(block) => &block.stmts,
            _ => panic!("expected a body"),
        }
    }

    #[test]
    fn test_resolves_imports_across_projects() {
        let ws = workspace();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let t = snapshot.compilation_unit("/P1/p1/T.java").unwrap();
        let file = snapshot.source(t).unwrap();
        let scope = sema.scope(file, Some(file.types()[0].key.clone())).unwrap();

        let x = sema.resolve_simple_type(&scope, "X").unwrap();
        assert_eq!(x.qualified_name, "p0.X");
        assert!(sema.resolve_simple_type(&scope, "String").unwrap().origin.is_binary());
        let inner = sema
            .resolve_type_name(&scope, &[SmolStr::new("X"), SmolStr::new("Inner")])
            .unwrap();
        assert_eq!(inner.qualified_name, "p0.X.Inner");
        assert!(sema.resolve_simple_type(&scope, "Missing").is_none());
    }

    #[test]
    fn test_implicit_object_needs_a_class_library() {
        let ws = workspace();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let x = snapshot
            .find_type(snapshot.compilation_unit("/P0/p0/X.java").unwrap(), "X")
            .unwrap();
        let t = snapshot
            .find_type(snapshot.compilation_unit("/P1/p1/T.java").unwrap(), "T")
            .unwrap();
        // P0 has no class library on its classpath
        assert!(sema.direct_supertypes(&x).is_empty());
        let t_supers = sema.all_supertypes(&t);
        assert_eq!(t_supers.len(), 1);
        assert_eq!(t_supers[0].qualified_name, "java.lang.Object");
    }

    #[test]
    fn test_call_chain_uses_declared_types() {
        let ws = workspace();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let file = snapshot
            .source(snapshot.compilation_unit("/P1/p1/T.java").unwrap())
            .unwrap();
        let scope = sema.scope(file, Some(file.types()[0].key.clone())).unwrap();
        let stmts = first_method_body(file, 1);
        let Stmt::Expr(call) = &stmts[1] else {
            panic!("expected a call statement");
        };
        let resolution = sema.resolve_call(&scope, &Locals::default(), call);
        assert_eq!(resolution.receiver.unwrap().qualified_name, "p0.X");
        let binding = resolution.binding.unwrap();
        assert_eq!(binding.owner.qualified_name(), "p0.X");
        assert_eq!(binding.method.name, "foo");
    }

    #[test]
    fn test_locals_shadow_fields_and_types() {
        let ws = workspace();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let file = snapshot
            .source(snapshot.compilation_unit("/P1/p1/T.java").unwrap())
            .unwrap();
        let scope = sema.scope(file, Some(file.types()[0].key.clone())).unwrap();
        let mut locals = Locals::default();
        locals.push_frame();
        locals.declare("X", Ty::Primitive(SmolStr::new("int")));
        let ident = Ident {
            text: SmolStr::new("X"),
            range: Default::default(),
        };
        assert_eq!(
            sema.resolve_name(&scope, &locals, &ident),
            Resolved::Value(Ty::Primitive(SmolStr::new("int")))
        );
        locals.pop_frame();
        assert!(matches!(sema.resolve_name(&scope, &locals, &ident), Resolved::Type(_)));
        let java = Ident {
            text: SmolStr::new("java"),
            range: Default::default(),
        };
        assert_eq!(
            sema.resolve_name(&scope, &locals, &java),
            Resolved::Package("java".to_string())
        );
    }

    #[test]
    fn test_overloads_prefer_matching_argument_types() {
        let ws = workspace();
        let snapshot = ws.snapshot();
        let sema = Semantics::new(&snapshot);
        let t = snapshot
            .find_type(snapshot.compilation_unit("/P1/p1/T.java").unwrap(), "T")
            .unwrap();
        let string = Ty::Unresolved(SmolStr::new("String"));
        let object = Ty::Unresolved(SmolStr::new("Object"));
        let by_string = sema.find_method(&t, "over", &[string]).unwrap();
        let by_object = sema.find_method(&t, "over", &[object]).unwrap();
        assert_eq!(by_string.method.erased_params(), ["String"]);
        assert_eq!(by_object.method.erased_params(), ["Object"]);
        assert!(sema.find_method(&t, "over", &[]).is_none());
    }

    #[test]
    fn test_ty_erasure() {
        let array = Ty::Array(Box::new(Ty::Primitive(SmolStr::new("int"))));
        assert_eq!(array.erased_name().unwrap(), "int[]");
        assert_eq!(Ty::Null.erased_name(), None);
    }
}
