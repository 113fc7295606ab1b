//! Declared types and their members, extracted from a compilation unit.
//!
//! Type references inside symbols stay as written. Source symbols are bound
//! later through the file's imports; archive symbols are qualified when the
//! archive is built.

use smol_str::SmolStr;

use super::ids::{FieldHandle, MethodHandle, Origin, TypeKey};
use crate::base::TextRange;
use crate::syntax::ast::{
    CompilationUnit, Member, MethodDecl, Modifiers, TypeDecl, TypeDeclKind, TypeRef,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub key: TypeKey,
    pub kind: TypeDeclKind,
    pub modifiers: Modifiers,
    /// Dotted package name, empty for the default package.
    pub package: SmolStr,
    /// Qualified name of the enclosing type for member types.
    pub outer: Option<SmolStr>,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub methods: Vec<MethodInfo>,
    pub fields: Vec<FieldInfo>,
    /// Simple names of directly nested member types.
    pub member_types: Vec<SmolStr>,
    pub name_range: TextRange,
    /// Position of the declaration in the tree: an index into
    /// `CompilationUnit::types`, then indices into `members`.
    decl_path: Vec<usize>,
}

impl TypeInfo {
    pub fn simple_name(&self) -> &str {
        self.key.simple_name()
    }

    pub fn qualified_name(&self) -> &str {
        &self.key.qualified_name
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeDeclKind::Interface
    }

    /// Find this type's declaration in the unit it was collected from.
    pub fn decl<'u>(&self, unit: &'u CompilationUnit) -> Option<&'u TypeDecl> {
        let (first, rest) = self.decl_path.split_first()?;
        let mut decl = unit.types.get(*first)?;
        for &idx in rest {
            decl = match decl.members.get(idx)? {
                Member::Type(nested) => nested,
                _ => return None,
            };
        }
        Some(decl)
    }

    pub fn methods_named(&self, name: &str) -> impl Iterator<Item = &MethodInfo> {
        self.methods
            .iter()
            .filter(move |m| m.name == name && !m.is_constructor)
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `p.X.bar() -> void`, `p.X.X()` for constructors.
    pub fn method_label(&self, method: &MethodInfo) -> String {
        let params = method.erased_params().join(", ");
        match &method.return_type {
            Some(ret) => format!(
                "{}.{}({}) -> {}",
                self.key.qualified_name,
                method.name,
                params,
                ret.display_simple()
            ),
            None => format!("{}.{}({})", self.key.qualified_name, method.name, params),
        }
    }

    pub fn field_label(&self, field: &FieldInfo) -> String {
        format!("{}.{}", self.key.qualified_name, field.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: SmolStr,
    pub params: Vec<TypeRef>,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub is_constructor: bool,
    pub is_static: bool,
    pub is_varargs: bool,
    pub name_range: TextRange,
}

impl MethodInfo {
    fn from_decl(decl: &MethodDecl) -> Self {
        Self {
            name: decl.name.text.clone(),
            params: decl.params.iter().map(|p| p.ty.clone()).collect(),
            return_type: decl.return_type.clone(),
            is_constructor: decl.is_constructor(),
            is_static: decl.modifiers.is_static,
            is_varargs: decl.params.last().is_some_and(|p| p.is_varargs),
            name_range: decl.name.range,
        }
    }

    /// Parameter types as erased simple names: `Object`, `int[]`.
    pub fn erased_params(&self) -> Vec<SmolStr> {
        self.params
            .iter()
            .map(|p| SmolStr::new(p.display_simple()))
            .collect()
    }

    pub fn handle(&self, owner: &TypeKey) -> MethodHandle {
        MethodHandle {
            owner: owner.clone(),
            selector: self.name.clone(),
            params: self.erased_params(),
        }
    }

    /// Whether a call with `arity` arguments could bind here.
    pub fn accepts_arity(&self, arity: usize) -> bool {
        if self.is_varargs {
            arity + 1 >= self.params.len()
        } else {
            arity == self.params.len()
        }
    }

    pub fn same_signature(&self, other: &MethodInfo) -> bool {
        self.name == other.name && self.erased_params() == other.erased_params()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: SmolStr,
    pub ty: TypeRef,
    pub is_static: bool,
    pub name_range: TextRange,
}

impl FieldInfo {
    pub fn handle(&self, owner: &TypeKey) -> FieldHandle {
        FieldHandle::new(owner.clone(), self.name.clone())
    }
}

/// Collect every named type in `unit`, member types included, in
/// declaration order.
pub fn collect_types(unit: &CompilationUnit, origin: Origin) -> Vec<TypeInfo> {
    let package = SmolStr::new(unit.package_segments().join("."));
    let mut out = Vec::new();
    for (idx, decl) in unit.types.iter().enumerate() {
        let qualified = if package.is_empty() {
            decl.name.text.to_string()
        } else {
            format!("{}.{}", package, decl.name.text)
        };
        collect_type(decl, origin, &package, None, qualified, vec![idx], &mut out);
    }
    out
}

fn collect_type(
    decl: &TypeDecl,
    origin: Origin,
    package: &SmolStr,
    outer: Option<SmolStr>,
    qualified: String,
    path: Vec<usize>,
    out: &mut Vec<TypeInfo>,
) {
    let mut methods = Vec::new();
    let mut fields = Vec::new();
    let mut nested = Vec::new();
    for (idx, member) in decl.members.iter().enumerate() {
        match member {
            Member::Method(method) => methods.push(MethodInfo::from_decl(method)),
            Member::Field(field) => fields.push(FieldInfo {
                name: field.name.text.clone(),
                ty: field.ty.clone(),
                is_static: field.modifiers.is_static || decl.kind == TypeDeclKind::Interface,
                name_range: field.name.range,
            }),
            Member::Type(ty) => nested.push((idx, ty)),
            Member::Initializer(_) => {}
        }
    }

    let key = TypeKey::new(origin, qualified.as_str());
    out.push(TypeInfo {
        key,
        kind: decl.kind,
        modifiers: decl.modifiers,
        package: package.clone(),
        outer,
        superclass: decl.superclass.clone(),
        interfaces: decl.interfaces.clone(),
        methods,
        fields,
        member_types: nested.iter().map(|(_, ty)| ty.name.text.clone()).collect(),
        name_range: decl.name.range,
        decl_path: path.clone(),
    });

    for (idx, ty) in nested {
        let mut nested_path = path.clone();
        nested_path.push(idx);
        collect_type(
            ty,
            origin,
            package,
            Some(SmolStr::new(&qualified)),
            format!("{}.{}", qualified, ty.name.text),
            nested_path,
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::syntax::parse;

    fn types_of(text: &str) -> Vec<TypeInfo> {
        collect_types(&parse(text).unwrap(), Origin::Source(FileId::new(0)))
    }

    #[test]
    fn test_collects_members_and_labels() {
        let types = types_of(
            "package p;\npublic class X {\n  protected void foo() {}\n  void bar() { foo(); }\n  X() {}\n  public static X TheX;\n}",
        );
        assert_eq!(types.len(), 1);
        let x = &types[0];
        assert_eq!(x.qualified_name(), "p.X");
        assert_eq!(x.package, "p");
        assert_eq!(x.methods.len(), 3);
        assert_eq!(x.method_label(&x.methods[1]), "p.X.bar() -> void");
        assert_eq!(x.method_label(&x.methods[2]), "p.X.X()");
        assert_eq!(x.methods_named("X").count(), 0);
        let the_x = x.field("TheX").unwrap();
        assert!(the_x.is_static);
        assert_eq!(x.field_label(the_x), "p.X.TheX");
    }

    #[test]
    fn test_member_types_are_qualified_through_outer() {
        let unit = parse("package p; class A { static class B { interface C {} } }").unwrap();
        let types = collect_types(&unit, Origin::Source(FileId::new(0)));
        let names: Vec<_> = types.iter().map(|t| t.qualified_name().to_string()).collect();
        assert_eq!(names, ["p.A", "p.A.B", "p.A.B.C"]);
        assert_eq!(types[2].outer.as_deref(), Some("p.A.B"));
        assert_eq!(types[0].member_types, ["B"]);
        assert_eq!(types[2].decl(&unit).unwrap().name.text, "C");
    }

    #[test]
    fn test_default_package_and_signatures() {
        let types = types_of("class Y { void method(Object o, int... xs) {} }");
        let y = &types[0];
        assert_eq!(y.qualified_name(), "Y");
        let method = &y.methods[0];
        assert_eq!(method.erased_params(), ["Object", "int[]"]);
        assert!(method.accepts_arity(1));
        assert!(method.accepts_arity(3));
        assert!(!method.accepts_arity(0));
        assert_eq!(
            method.handle(&y.key),
            MethodHandle::new(y.key.clone(), "method", &["QObject;", "[I"])
        );
    }
}
