//! Java syntax tree for the subset the search engine understands.
//!
//! Names are kept exactly as written; binding them is the resolver's job.
//! Every node that can be reported as a match carries its byte range.

use smol_str::SmolStr;

use crate::base::TextRange;

/// An identifier with its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub text: SmolStr,
    pub range: TextRange,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    /// The declared package as segments (empty for the default package).
    pub fn package_segments(&self) -> &[SmolStr] {
        self.package
            .as_ref()
            .map(|p| p.segments.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageDecl {
    pub segments: Vec<SmolStr>,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportDecl {
    pub segments: Vec<SmolStr>,
    /// `import p.*;`
    pub on_demand: bool,
    pub is_static: bool,
    /// Range of the imported name, without `import` and `;`.
    pub range: TextRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDeclKind {
    Class,
    Interface,
    Enum,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub is_public: bool,
    pub is_protected: bool,
    pub is_private: bool,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeDeclKind,
    pub modifiers: Modifiers,
    pub name: Ident,
    pub superclass: Option<TypeRef>,
    /// `implements` for classes and enums, `extends` for interfaces.
    pub interfaces: Vec<TypeRef>,
    pub members: Vec<Member>,
    pub range: TextRange,
}

impl TypeDecl {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn nested_types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Type(ty) => Some(ty),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Initializer(Initializer),
    Type(TypeDecl),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: Ident,
    pub init: Option<Expr>,
    /// Enum constants are fields typed by their enum.
    pub is_enum_constant: bool,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    pub body: MethodBody,
    pub range: TextRange,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodBody {
    /// Abstract, interface or native method.
    None,
    Block(Block),
    /// The body did not parse and was skipped as a balanced block.
    Unparsed(TextRange),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub ty: TypeRef,
    pub name: Ident,
    pub is_varargs: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Initializer {
    pub is_static: bool,
    pub body: Block,
    pub range: TextRange,
}

/// A type as written: `p.X`, `int`, `String[]`. Type arguments are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRef {
    pub segments: Vec<SmolStr>,
    pub dims: u32,
    pub range: TextRange,
}

impl TypeRef {
    pub fn simple_name(&self) -> &str {
        self.segments.last().map(SmolStr::as_str).unwrap_or("")
    }

    pub fn is_primitive(&self) -> bool {
        self.segments.len() == 1 && is_primitive_name(&self.segments[0])
    }

    /// The written name with array brackets, e.g. `Object[]`.
    pub fn display_simple(&self) -> String {
        let mut out = self.simple_name().to_string();
        for _ in 0..self.dims {
            out.push_str("[]");
        }
        out
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

pub fn is_primitive_name(name: &str) -> bool {
    matches!(
        name,
        "void" | "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double"
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVar {
    pub ty: TypeRef,
    pub name: Ident,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchClause {
    pub param: Param,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchCase {
    /// Empty for `default:`.
    pub labels: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Block(Block),
    Local(Vec<LocalVar>),
    Expr(Expr),
    Return(Option<Expr>),
    Throw(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Vec<Stmt>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    ForEach {
        var: LocalVar,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
    },
    Synchronized {
        lock: Expr,
        body: Block,
    },
    Assert {
        cond: Expr,
        message: Option<Expr>,
    },
    LocalClass(Box<TypeDecl>),
    Break,
    Continue,
    Empty,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: TextRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Literal(Literal),
    /// A simple name: local, field, type or package, decided by the resolver.
    Name(Ident),
    FieldAccess {
        target: Box<Expr>,
        name: Ident,
    },
    Call {
        target: Option<Box<Expr>>,
        name: Ident,
        args: Vec<Expr>,
    },
    New {
        ty: TypeRef,
        args: Vec<Expr>,
        /// Anonymous class body.
        body: Option<Vec<Member>>,
    },
    NewArray {
        ty: TypeRef,
        dims: Vec<Expr>,
        init: Option<Vec<Expr>>,
    },
    ArrayInit(Vec<Expr>),
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    This,
    Super,
    /// `this(...)` or `super(...)` as the first statement of a constructor.
    ConstructorCall {
        is_super: bool,
        args: Vec<Expr>,
    },
    /// `X.class`
    ClassLiteral(TypeRef),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeRef,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// `(a, b) -> a.foo(b)` or `(String s) -> { ... }`
    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
    },
    /// `target::name`, with `name` spelled `new` for constructor references.
    MethodRef {
        target: Box<Expr>,
        name: Ident,
    },
}

/// A lambda parameter; `ty` is `None` when the type is inferred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LambdaParam {
    pub ty: Option<TypeRef>,
    pub name: Ident,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Or
                | BinaryOp::And
                | BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}
