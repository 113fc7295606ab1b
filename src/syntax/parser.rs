//! Recursive-descent parser over the token stream.
//!
//! Declarations must parse for a file to be usable. Method bodies and field
//! initializers are recovered: when they fail, the parser skips the balanced
//! region, keeps the declaration, and the body is reported as unparsed.

use std::fmt;

use smol_str::SmolStr;

use super::ast::*;
use super::lexer::{Token, TokenKind, tokenize};
use crate::base::{TextRange, TextSize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: TextSize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, u32::from(self.offset))
    }
}

impl std::error::Error for ParseError {}

type PResult<T> = Result<T, ParseError>;

/// Parse one compilation unit.
pub fn parse(text: &str) -> PResult<CompilationUnit> {
    let tokens = tokenize(text).map_err(|e| ParseError {
        message: "unexpected character".to_string(),
        offset: e.offset,
    })?;
    Parser::new(text, tokens).compilation_unit()
}

struct Parser<'t> {
    text: &'t str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(text: &'t str, tokens: Vec<Token>) -> Self {
        Self { text, tokens, pos: 0 }
    }

    // ------------------------------------------------------------------
    // token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<TokenKind> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(*token)
            }
            _ => Err(self.error(format!("expected {:?}", kind))),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            offset: self.current_start(),
        }
    }

    fn current_start(&self) -> TextSize {
        self.tokens
            .get(self.pos)
            .map(|t| t.range.start())
            .unwrap_or_else(|| TextSize::of(self.text))
    }

    fn prev_end(&self) -> TextSize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.range.end())
            .unwrap_or_default()
    }

    fn range_from(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.prev_end().max(start))
    }

    fn token_text(&self, token: Token) -> &'t str {
        &self.text[token.range]
    }

    fn ident(&mut self) -> PResult<Ident> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            text: SmolStr::new(self.token_text(token)),
            range: token.range,
        })
    }

    fn qualified_name(&mut self) -> PResult<Vec<SmolStr>> {
        let mut segments = vec![self.ident()?.text];
        while self.at(TokenKind::Dot) && self.peek_at(1) == Some(TokenKind::Ident) {
            self.pos += 1;
            segments.push(self.ident()?.text);
        }
        Ok(segments)
    }

    /// Skip from an opening token to just past its matching close.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> PResult<()> {
        self.expect(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                Some(t) if t.kind == open => depth += 1,
                Some(t) if t.kind == close => depth -= 1,
                Some(_) => {}
                None => return Err(self.error(format!("unbalanced {:?}", open))),
            }
        }
        Ok(())
    }

    fn skip_type_args(&mut self) -> PResult<()> {
        if self.at(TokenKind::Lt) {
            self.skip_balanced(TokenKind::Lt, TokenKind::Gt)?;
        }
        Ok(())
    }

    /// Skip to the next `;` or `,` that is not nested, leaving it unconsumed.
    fn recover_to_declarator_end(&mut self) {
        let mut depth = 0usize;
        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Semi | TokenKind::Comma if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    // ------------------------------------------------------------------
    // declarations
    // ------------------------------------------------------------------

    fn compilation_unit(&mut self) -> PResult<CompilationUnit> {
        let mut unit = CompilationUnit::default();

        let checkpoint = self.pos;
        self.modifiers()?;
        if self.at(TokenKind::Package) {
            self.pos += 1;
            let start = self.current_start();
            let segments = self.qualified_name()?;
            let range = self.range_from(start);
            self.expect(TokenKind::Semi)?;
            unit.package = Some(PackageDecl { segments, range });
        } else {
            self.pos = checkpoint;
        }

        while self.eat(TokenKind::Import) {
            let is_static = self.eat(TokenKind::Static);
            let start = self.current_start();
            let segments = self.qualified_name()?;
            let on_demand = if self.at(TokenKind::Dot) && self.peek_at(1) == Some(TokenKind::Star) {
                self.pos += 2;
                true
            } else {
                false
            };
            let range = self.range_from(start);
            self.expect(TokenKind::Semi)?;
            unit.imports.push(ImportDecl {
                segments,
                on_demand,
                is_static,
                range,
            });
        }

        while self.peek().is_some() {
            if self.eat(TokenKind::Semi) {
                continue;
            }
            let start = self.current_start();
            let modifiers = self.modifiers()?;
            unit.types.push(self.type_decl(modifiers, start)?);
        }
        Ok(unit)
    }

    fn annotation(&mut self) -> PResult<()> {
        self.expect(TokenKind::At)?;
        self.qualified_name()?;
        if self.at(TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        }
        Ok(())
    }

    fn modifiers(&mut self) -> PResult<Modifiers> {
        let mut mods = Modifiers::default();
        loop {
            match self.peek() {
                Some(TokenKind::At) if self.peek_at(1) != Some(TokenKind::Interface) => {
                    self.annotation()?
                }
                // `default` opens a switch label inside bodies; as a modifier
                // it only precedes a member.
                Some(TokenKind::Default) if self.peek_at(1) == Some(TokenKind::Colon) => break,
                Some(kind) if kind.is_modifier() => {
                    self.pos += 1;
                    match kind {
                        TokenKind::Public => mods.is_public = true,
                        TokenKind::Protected => mods.is_protected = true,
                        TokenKind::Private => mods.is_private = true,
                        TokenKind::Static => mods.is_static = true,
                        TokenKind::Final => mods.is_final = true,
                        TokenKind::Abstract => mods.is_abstract = true,
                        _ => {}
                    }
                }
                _ => break,
            }
        }
        Ok(mods)
    }

    fn at_type_decl(&self) -> bool {
        match self.peek() {
            Some(TokenKind::Class | TokenKind::Interface | TokenKind::Enum) => true,
            Some(TokenKind::At) => self.peek_at(1) == Some(TokenKind::Interface),
            _ => false,
        }
    }

    fn type_decl(&mut self, modifiers: Modifiers, start: TextSize) -> PResult<TypeDecl> {
        let kind = match self.bump().map(|t| t.kind) {
            Some(TokenKind::Class) => TypeDeclKind::Class,
            Some(TokenKind::Interface) => TypeDeclKind::Interface,
            Some(TokenKind::Enum) => TypeDeclKind::Enum,
            Some(TokenKind::At) => {
                self.expect(TokenKind::Interface)?;
                TypeDeclKind::Interface
            }
            _ => return Err(self.error("expected type declaration")),
        };
        let name = self.ident()?;
        self.skip_type_args()?;

        let mut superclass = None;
        let mut interfaces = Vec::new();
        if self.eat(TokenKind::Extends) {
            if kind == TypeDeclKind::Interface {
                interfaces = self.type_list()?;
            } else {
                superclass = Some(self.type_ref()?);
            }
        }
        if self.eat(TokenKind::Implements) {
            interfaces.extend(self.type_list()?);
        }

        let members = self.class_body(kind, &name.text)?;
        Ok(TypeDecl {
            kind,
            modifiers,
            name,
            superclass,
            interfaces,
            members,
            range: self.range_from(start),
        })
    }

    fn type_list(&mut self) -> PResult<Vec<TypeRef>> {
        let mut types = vec![self.type_ref()?];
        while self.eat(TokenKind::Comma) {
            types.push(self.type_ref()?);
        }
        Ok(types)
    }

    fn class_body(&mut self, kind: TypeDeclKind, type_name: &str) -> PResult<Vec<Member>> {
        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        if kind == TypeDeclKind::Enum {
            self.enum_constants(type_name, &mut members)?;
        }
        while !self.eat(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(self.error("unterminated type body"));
            }
            self.member(type_name, &mut members)?;
        }
        Ok(members)
    }

    fn enum_constants(&mut self, enum_name: &str, members: &mut Vec<Member>) -> PResult<()> {
        loop {
            if self.eat(TokenKind::Semi) || self.at(TokenKind::RBrace) {
                return Ok(());
            }
            let start = self.current_start();
            while self.at(TokenKind::At) {
                self.annotation()?;
            }
            let name = self.ident()?;
            let args = if self.at(TokenKind::LParen) {
                self.arguments()?
            } else {
                Vec::new()
            };
            let body = if self.at(TokenKind::LBrace) {
                Some(self.class_body(TypeDeclKind::Class, "")?)
            } else {
                None
            };
            let ty = TypeRef {
                segments: vec![SmolStr::new(enum_name)],
                dims: 0,
                range: name.range,
            };
            let init = (!args.is_empty() || body.is_some()).then(|| Expr {
                kind: ExprKind::New {
                    ty: ty.clone(),
                    args,
                    body,
                },
                range: self.range_from(start),
            });
            members.push(Member::Field(FieldDecl {
                modifiers: Modifiers {
                    is_public: true,
                    is_static: true,
                    is_final: true,
                    ..Modifiers::default()
                },
                ty,
                name,
                init,
                is_enum_constant: true,
                range: self.range_from(start),
            }));
            if !self.eat(TokenKind::Comma) {
                if self.at(TokenKind::RBrace) {
                    return Ok(());
                }
                self.expect(TokenKind::Semi)?;
                return Ok(());
            }
        }
    }

    fn member(&mut self, type_name: &str, members: &mut Vec<Member>) -> PResult<()> {
        if self.eat(TokenKind::Semi) {
            return Ok(());
        }
        let start = self.current_start();

        if self.at(TokenKind::LBrace)
            || (self.at(TokenKind::Static) && self.peek_at(1) == Some(TokenKind::LBrace))
        {
            let is_static = self.eat(TokenKind::Static);
            let body = self.block()?;
            members.push(Member::Initializer(Initializer {
                is_static,
                body,
                range: self.range_from(start),
            }));
            return Ok(());
        }

        let modifiers = self.modifiers()?;
        if self.at_type_decl() {
            members.push(Member::Type(self.type_decl(modifiers, start)?));
            return Ok(());
        }

        self.skip_type_args()?;

        if self.at(TokenKind::Ident)
            && self.peek_at(1) == Some(TokenKind::LParen)
            && self.token_text(self.tokens[self.pos]) == type_name
        {
            let name = self.ident()?;
            members.push(Member::Method(self.method_rest(modifiers, None, name, start)?));
            return Ok(());
        }

        let ty = self.type_ref()?;
        let name = self.ident()?;
        if self.at(TokenKind::LParen) {
            members.push(Member::Method(self.method_rest(modifiers, Some(ty), name, start)?));
            return Ok(());
        }

        let mut name = name;
        loop {
            let dims = self.dims();
            let ty = TypeRef {
                dims: ty.dims + dims,
                ..ty.clone()
            };
            let init = if self.eat(TokenKind::Eq) {
                let checkpoint = self.pos;
                match self.variable_init() {
                    Ok(expr) => Some(expr),
                    Err(err) => {
                        tracing::trace!(%err, field = %name.text, "skipping field initializer");
                        self.pos = checkpoint;
                        self.recover_to_declarator_end();
                        None
                    }
                }
            } else {
                None
            };
            members.push(Member::Field(FieldDecl {
                modifiers,
                ty,
                name,
                init,
                is_enum_constant: false,
                range: self.range_from(start),
            }));
            if !self.eat(TokenKind::Comma) {
                break;
            }
            name = self.ident()?;
        }
        self.expect(TokenKind::Semi)?;
        Ok(())
    }

    fn method_rest(
        &mut self,
        modifiers: Modifiers,
        return_type: Option<TypeRef>,
        name: Ident,
        start: TextSize,
    ) -> PResult<MethodDecl> {
        let params = self.params()?;
        let extra_dims = self.dims();
        let return_type = return_type.map(|ty| TypeRef {
            dims: ty.dims + extra_dims,
            ..ty
        });
        let throws = if self.eat(TokenKind::Throws) {
            self.type_list()?
        } else {
            Vec::new()
        };

        let body = if self.eat(TokenKind::Semi) {
            MethodBody::None
        } else if self.eat(TokenKind::Default) {
            // annotation member default value
            self.recover_to_declarator_end();
            self.expect(TokenKind::Semi)?;
            MethodBody::None
        } else {
            let body_start = self.pos;
            match self.block() {
                Ok(block) => MethodBody::Block(block),
                Err(err) => {
                    tracing::debug!(%err, method = %name.text, "skipping unparsable method body");
                    self.pos = body_start;
                    let start = self.current_start();
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                    MethodBody::Unparsed(self.range_from(start))
                }
            }
        };

        Ok(MethodDecl {
            modifiers,
            return_type,
            name,
            params,
            throws,
            body,
            range: self.range_from(start),
        })
    }

    fn params(&mut self) -> PResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.param()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn param(&mut self) -> PResult<Param> {
        self.modifiers()?;
        let mut ty = self.type_ref()?;
        let is_varargs = self.eat(TokenKind::Ellipsis);
        let name = self.ident()?;
        ty.dims += self.dims() + u32::from(is_varargs);
        Ok(Param {
            ty,
            name,
            is_varargs,
        })
    }

    fn dims(&mut self) -> u32 {
        let mut dims = 0;
        while self.at(TokenKind::LBracket) && self.peek_at(1) == Some(TokenKind::RBracket) {
            self.pos += 2;
            dims += 1;
        }
        dims
    }

    /// A type without trailing array dimensions.
    fn type_ref_base(&mut self) -> PResult<TypeRef> {
        let start = self.current_start();
        if let Some(kind) = self.peek() {
            if kind.is_primitive() {
                let token = self.expect(kind)?;
                return Ok(TypeRef {
                    segments: vec![SmolStr::new(self.token_text(token))],
                    dims: 0,
                    range: token.range,
                });
            }
        }
        let mut segments = vec![self.ident()?.text];
        self.skip_type_args()?;
        while self.at(TokenKind::Dot) && self.peek_at(1) == Some(TokenKind::Ident) {
            self.pos += 1;
            segments.push(self.ident()?.text);
            self.skip_type_args()?;
        }
        Ok(TypeRef {
            segments,
            dims: 0,
            range: self.range_from(start),
        })
    }

    fn type_ref(&mut self) -> PResult<TypeRef> {
        let mut ty = self.type_ref_base()?;
        ty.dims = self.dims();
        Ok(ty)
    }

    // ------------------------------------------------------------------
    // statements
    // ------------------------------------------------------------------

    fn block(&mut self) -> PResult<Block> {
        let start = self.current_start();
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            if self.peek().is_none() {
                return Err(self.error("unterminated block"));
            }
            stmts.push(self.stmt()?);
        }
        Ok(Block {
            stmts,
            range: self.range_from(start),
        })
    }

    fn stmt(&mut self) -> PResult<Stmt> {
        let Some(kind) = self.peek() else {
            return Err(self.error("expected statement"));
        };
        match kind {
            TokenKind::LBrace => Ok(Stmt::Block(self.block()?)),
            TokenKind::Semi => {
                self.pos += 1;
                Ok(Stmt::Empty)
            }
            TokenKind::If => {
                self.pos += 1;
                let cond = self.paren_expr()?;
                let then_branch = Box::new(self.stmt()?);
                let else_branch = if self.eat(TokenKind::Else) {
                    Some(Box::new(self.stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            TokenKind::While => {
                self.pos += 1;
                let cond = self.paren_expr()?;
                let body = Box::new(self.stmt()?);
                Ok(Stmt::While { cond, body })
            }
            TokenKind::Do => {
                self.pos += 1;
                let body = Box::new(self.stmt()?);
                self.expect(TokenKind::While)?;
                let cond = self.paren_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::DoWhile { body, cond })
            }
            TokenKind::For => self.for_stmt(),
            TokenKind::Return => {
                self.pos += 1;
                let value = if self.at(TokenKind::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Throw => {
                self.pos += 1;
                let value = self.expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Throw(value))
            }
            TokenKind::Break | TokenKind::Continue => {
                self.pos += 1;
                self.eat(TokenKind::Ident);
                self.expect(TokenKind::Semi)?;
                Ok(if kind == TokenKind::Break {
                    Stmt::Break
                } else {
                    Stmt::Continue
                })
            }
            TokenKind::Try => self.try_stmt(),
            TokenKind::Switch => self.switch_stmt(),
            TokenKind::Synchronized if self.peek_at(1) == Some(TokenKind::LParen) => {
                self.pos += 1;
                let lock = self.paren_expr()?;
                let body = self.block()?;
                Ok(Stmt::Synchronized { lock, body })
            }
            TokenKind::Assert => {
                self.pos += 1;
                let cond = self.expr()?;
                let message = if self.eat(TokenKind::Colon) {
                    Some(self.expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Assert { cond, message })
            }
            TokenKind::Ident if self.peek_at(1) == Some(TokenKind::Colon) => {
                // labeled statement
                self.pos += 2;
                self.stmt()
            }
            _ => {
                let checkpoint = self.pos;
                let start = self.current_start();
                let modifiers = self.modifiers()?;
                if self.at_type_decl() {
                    return Ok(Stmt::LocalClass(Box::new(self.type_decl(modifiers, start)?)));
                }
                if self.pos != checkpoint || self.looks_like_local_decl() {
                    let locals = self.local_declarators()?;
                    self.expect(TokenKind::Semi)?;
                    return Ok(Stmt::Local(locals));
                }
                let expr = self.expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn paren_expr(&mut self) -> PResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let expr = self.expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    /// `Type name` followed by something that can only continue a declaration.
    fn looks_like_local_decl(&mut self) -> bool {
        let checkpoint = self.pos;
        let result = self.type_ref().is_ok()
            && self.at(TokenKind::Ident)
            && matches!(
                self.peek_at(1),
                Some(
                    TokenKind::Eq
                        | TokenKind::Semi
                        | TokenKind::Comma
                        | TokenKind::LBracket
                        | TokenKind::Colon
                )
            );
        self.pos = checkpoint;
        result
    }

    fn local_declarators(&mut self) -> PResult<Vec<LocalVar>> {
        let ty = self.type_ref()?;
        let mut locals = Vec::new();
        loop {
            let name = self.ident()?;
            let dims = self.dims();
            let init = if self.eat(TokenKind::Eq) {
                Some(self.variable_init()?)
            } else {
                None
            };
            locals.push(LocalVar {
                ty: TypeRef {
                    dims: ty.dims + dims,
                    ..ty.clone()
                },
                name,
                init,
            });
            if !self.eat(TokenKind::Comma) {
                return Ok(locals);
            }
        }
    }

    fn variable_init(&mut self) -> PResult<Expr> {
        if self.at(TokenKind::LBrace) {
            self.array_init()
        } else {
            self.expr()
        }
    }

    fn array_init(&mut self) -> PResult<Expr> {
        let start = self.current_start();
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            items.push(self.variable_init()?);
            if !self.eat(TokenKind::Comma) {
                self.expect(TokenKind::RBrace)?;
                break;
            }
        }
        Ok(Expr {
            kind: ExprKind::ArrayInit(items),
            range: self.range_from(start),
        })
    }

    fn for_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let mut init = Vec::new();
        if !self.at(TokenKind::Semi) {
            let checkpoint = self.pos;
            self.modifiers()?;
            if self.pos != checkpoint || self.looks_like_local_decl() {
                let ty = self.type_ref()?;
                let name = self.ident()?;
                if self.eat(TokenKind::Colon) {
                    let iterable = self.expr()?;
                    self.expect(TokenKind::RParen)?;
                    let body = Box::new(self.stmt()?);
                    return Ok(Stmt::ForEach {
                        var: LocalVar {
                            ty,
                            name,
                            init: None,
                        },
                        iterable,
                        body,
                    });
                }
                // rewind to the type so declarators parse uniformly
                self.pos = checkpoint;
                self.modifiers()?;
                init.push(Stmt::Local(self.local_declarators()?));
            } else {
                init.push(Stmt::Expr(self.expr()?));
                while self.eat(TokenKind::Comma) {
                    init.push(Stmt::Expr(self.expr()?));
                }
            }
        }
        self.expect(TokenKind::Semi)?;

        let cond = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semi)?;

        let mut update = Vec::new();
        if !self.at(TokenKind::RParen) {
            update.push(self.expr()?);
            while self.eat(TokenKind::Comma) {
                update.push(self.expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.stmt()?);
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn try_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Try)?;
        let mut resources = Vec::new();
        if self.eat(TokenKind::LParen) {
            while !self.eat(TokenKind::RParen) {
                self.modifiers()?;
                resources.push(Stmt::Local(self.local_declarators()?));
                if !self.eat(TokenKind::Semi) {
                    self.expect(TokenKind::RParen)?;
                    break;
                }
            }
        }
        let mut body = self.block()?;
        if !resources.is_empty() {
            resources.append(&mut body.stmts);
            body.stmts = resources;
        }

        let mut catches = Vec::new();
        while self.eat(TokenKind::Catch) {
            self.expect(TokenKind::LParen)?;
            self.modifiers()?;
            let ty = self.type_ref()?;
            while self.eat(TokenKind::Pipe) {
                self.type_ref()?;
            }
            let name = self.ident()?;
            self.expect(TokenKind::RParen)?;
            let body = self.block()?;
            catches.push(CatchClause {
                param: Param {
                    ty,
                    name,
                    is_varargs: false,
                },
                body,
            });
        }
        let finally = if self.eat(TokenKind::Finally) {
            Some(self.block()?)
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            return Err(self.error("try without catch or finally"));
        }
        Ok(Stmt::Try {
            body,
            catches,
            finally,
        })
    }

    fn switch_stmt(&mut self) -> PResult<Stmt> {
        self.expect(TokenKind::Switch)?;
        let selector = self.paren_expr()?;
        self.expect(TokenKind::LBrace)?;
        let mut cases: Vec<SwitchCase> = Vec::new();
        while !self.eat(TokenKind::RBrace) {
            if self.eat(TokenKind::Case) {
                let mut labels = vec![self.conditional()?];
                while self.eat(TokenKind::Comma) {
                    labels.push(self.conditional()?);
                }
                self.expect(TokenKind::Colon)?;
                cases.push(SwitchCase {
                    labels,
                    body: Vec::new(),
                });
            } else if self.eat(TokenKind::Default) {
                self.expect(TokenKind::Colon)?;
                cases.push(SwitchCase {
                    labels: Vec::new(),
                    body: Vec::new(),
                });
            } else {
                let stmt = self.stmt()?;
                match cases.last_mut() {
                    Some(case) => case.body.push(stmt),
                    None => return Err(self.error("statement before first case label")),
                }
            }
        }
        Ok(Stmt::Switch { selector, cases })
    }

    // ------------------------------------------------------------------
    // expressions
    // ------------------------------------------------------------------

    fn expr(&mut self) -> PResult<Expr> {
        if self.at_lambda() {
            return self.lambda();
        }
        let start = self.current_start();
        let target = self.conditional()?;
        if let Some(kind) = self.peek() {
            let width = match self.shift_assign_width() {
                Some(width) => width,
                None if kind.is_assignment() => 1,
                None => 0,
            };
            if width > 0 {
                self.pos += width;
                let value = self.expr()?;
                return Ok(Expr {
                    kind: ExprKind::Assign {
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    range: self.range_from(start),
                });
            }
            if kind == TokenKind::Arrow {
                return Err(self.error("unexpected '->'"));
            }
        }
        Ok(target)
    }

    /// `ident ->` or a parenthesized list followed by `->`.
    fn at_lambda(&self) -> bool {
        match self.peek() {
            Some(TokenKind::Ident) => self.peek_at(1) == Some(TokenKind::Arrow),
            Some(TokenKind::LParen) => {
                let mut depth = 0usize;
                for (i, token) in self.tokens[self.pos..].iter().enumerate() {
                    match token.kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.peek_at(i + 1) == Some(TokenKind::Arrow);
                            }
                        }
                        TokenKind::Semi | TokenKind::LBrace | TokenKind::RBrace => return false,
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn lambda(&mut self) -> PResult<Expr> {
        let start = self.current_start();
        let mut params = Vec::new();
        if self.at(TokenKind::Ident) {
            params.push(LambdaParam {
                ty: None,
                name: self.ident()?,
            });
        } else {
            self.expect(TokenKind::LParen)?;
            if !self.eat(TokenKind::RParen) {
                loop {
                    let inferred = self.at(TokenKind::Ident)
                        && matches!(self.peek_at(1), Some(TokenKind::Comma | TokenKind::RParen));
                    let param = if inferred {
                        LambdaParam {
                            ty: None,
                            name: self.ident()?,
                        }
                    } else {
                        self.modifiers()?;
                        let mut ty = self.type_ref()?;
                        let name = self.ident()?;
                        ty.dims += self.dims();
                        LambdaParam { ty: Some(ty), name }
                    };
                    params.push(param);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            }
        }
        self.expect(TokenKind::Arrow)?;
        let body = if self.at(TokenKind::LBrace) {
            LambdaBody::Block(self.block()?)
        } else {
            LambdaBody::Expr(Box::new(self.expr()?))
        };
        Ok(Expr {
            kind: ExprKind::Lambda { params, body },
            range: self.range_from(start),
        })
    }

    /// Token count of a `>>=` or `>>>=` at the cursor.
    fn shift_assign_width(&self) -> Option<usize> {
        if !self.at(TokenKind::Gt) || !self.adjacent(0) {
            return None;
        }
        match self.peek_at(1)? {
            TokenKind::GtEq => Some(2),
            TokenKind::Gt if self.adjacent(1) && self.peek_at(2) == Some(TokenKind::GtEq) => Some(3),
            _ => None,
        }
    }

    fn conditional(&mut self) -> PResult<Expr> {
        let start = self.current_start();
        let cond = self.binary(0)?;
        if !self.eat(TokenKind::Question) {
            return Ok(cond);
        }
        let then_expr = self.expr()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.conditional()?;
        Ok(Expr {
            kind: ExprKind::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            range: self.range_from(start),
        })
    }

    fn adjacent(&self, n: usize) -> bool {
        match (self.tokens.get(self.pos + n), self.tokens.get(self.pos + n + 1)) {
            (Some(a), Some(b)) => a.range.end() == b.range.start(),
            _ => false,
        }
    }

    /// The binary operator at the cursor: (op, precedence, token count).
    /// `None` op with precedence 7 marks `instanceof`.
    fn binary_op(&self) -> Option<(Option<BinaryOp>, u8, usize)> {
        if self.shift_assign_width().is_some() {
            return None;
        }
        let op = match self.peek()? {
            TokenKind::OrOr => (BinaryOp::Or, 1, 1),
            TokenKind::AndAnd => (BinaryOp::And, 2, 1),
            TokenKind::Pipe => (BinaryOp::BitOr, 3, 1),
            TokenKind::Caret => (BinaryOp::BitXor, 4, 1),
            TokenKind::Amp => (BinaryOp::BitAnd, 5, 1),
            TokenKind::EqEq => (BinaryOp::Eq, 6, 1),
            TokenKind::NotEq => (BinaryOp::NotEq, 6, 1),
            TokenKind::Instanceof => return Some((None, 7, 1)),
            TokenKind::Gt if self.peek_at(1) == Some(TokenKind::Gt) && self.adjacent(0) => {
                if self.peek_at(2) == Some(TokenKind::Gt) && self.adjacent(1) {
                    (BinaryOp::UShr, 8, 3)
                } else {
                    (BinaryOp::Shr, 8, 2)
                }
            }
            TokenKind::Lt => (BinaryOp::Lt, 7, 1),
            TokenKind::Gt => (BinaryOp::Gt, 7, 1),
            TokenKind::LtEq => (BinaryOp::LtEq, 7, 1),
            TokenKind::GtEq => (BinaryOp::GtEq, 7, 1),
            TokenKind::Shl => (BinaryOp::Shl, 8, 1),
            TokenKind::Plus => (BinaryOp::Add, 9, 1),
            TokenKind::Minus => (BinaryOp::Sub, 9, 1),
            TokenKind::Star => (BinaryOp::Mul, 10, 1),
            TokenKind::Slash => (BinaryOp::Div, 10, 1),
            TokenKind::Percent => (BinaryOp::Rem, 10, 1),
            _ => return None,
        };
        Some((Some(op.0), op.1, op.2))
    }

    fn binary(&mut self, min_prec: u8) -> PResult<Expr> {
        let start = self.current_start();
        let mut lhs = self.unary()?;
        while let Some((op, prec, width)) = self.binary_op() {
            if prec < min_prec {
                break;
            }
            self.pos += width;
            lhs = match op {
                None => {
                    let ty = self.type_ref()?;
                    // pattern binding: `x instanceof T t`
                    self.eat(TokenKind::Ident);
                    Expr {
                        kind: ExprKind::InstanceOf {
                            expr: Box::new(lhs),
                            ty,
                        },
                        range: self.range_from(start),
                    }
                }
                Some(op) => {
                    let rhs = self.binary(prec + 1)?;
                    Expr {
                        kind: ExprKind::Binary {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        range: self.range_from(start),
                    }
                }
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<Expr> {
        let start = self.current_start();
        let op = match self.peek() {
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            Some(TokenKind::Plus) => Some(UnaryOp::Plus),
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            Some(TokenKind::Tilde) => Some(UnaryOp::BitNot),
            Some(TokenKind::PlusPlus) => Some(UnaryOp::PreInc),
            Some(TokenKind::MinusMinus) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.unary()?;
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                range: self.range_from(start),
            });
        }
        if self.at(TokenKind::LParen) {
            if let Some(ty) = self.cast_prefix()? {
                let expr = if self.at_lambda() {
                    self.lambda()?
                } else {
                    self.unary()?
                };
                return Ok(Expr {
                    kind: ExprKind::Cast {
                        ty,
                        expr: Box::new(expr),
                    },
                    range: self.range_from(start),
                });
            }
        }
        self.postfix()
    }

    /// Consume `(Type)` when it is a cast, otherwise leave the cursor alone.
    fn cast_prefix(&mut self) -> PResult<Option<TypeRef>> {
        let checkpoint = self.pos;
        self.expect(TokenKind::LParen)?;
        if self.peek().is_some_and(TokenKind::is_primitive) {
            let ty = self.type_ref()?;
            self.expect(TokenKind::RParen)?;
            return Ok(Some(ty));
        }
        if self.at(TokenKind::Ident) {
            if let Ok(ty) = self.type_ref() {
                if self.eat(TokenKind::RParen) {
                    let operand_follows = matches!(
                        self.peek(),
                        Some(
                            TokenKind::Ident
                                | TokenKind::Number
                                | TokenKind::StringLit
                                | TokenKind::CharLit
                                | TokenKind::True
                                | TokenKind::False
                                | TokenKind::Null
                                | TokenKind::LParen
                                | TokenKind::This
                                | TokenKind::Super
                                | TokenKind::New
                                | TokenKind::Bang
                                | TokenKind::Tilde
                        )
                    );
                    if operand_follows {
                        return Ok(Some(ty));
                    }
                }
            }
        }
        self.pos = checkpoint;
        Ok(None)
    }

    fn postfix(&mut self) -> PResult<Expr> {
        let start = self.current_start();
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(TokenKind::Dot) => {
                    self.pos += 1;
                    match self.peek() {
                        Some(TokenKind::Lt) => {
                            self.skip_type_args()?;
                            let name = self.ident()?;
                            let args = self.arguments()?;
                            expr = Expr {
                                kind: ExprKind::Call {
                                    target: Some(Box::new(expr)),
                                    name,
                                    args,
                                },
                                range: self.range_from(start),
                            };
                        }
                        Some(TokenKind::Ident) => {
                            let name = self.ident()?;
                            expr = if self.at(TokenKind::LParen) {
                                let args = self.arguments()?;
                                Expr {
                                    kind: ExprKind::Call {
                                        target: Some(Box::new(expr)),
                                        name,
                                        args,
                                    },
                                    range: self.range_from(start),
                                }
                            } else {
                                Expr {
                                    kind: ExprKind::FieldAccess {
                                        target: Box::new(expr),
                                        name,
                                    },
                                    range: self.range_from(start),
                                }
                            };
                        }
                        Some(TokenKind::Class) => {
                            self.pos += 1;
                            let ty = name_chain_to_type(&expr)
                                .ok_or_else(|| self.error("expected type before .class"))?;
                            expr = Expr {
                                kind: ExprKind::ClassLiteral(ty),
                                range: self.range_from(start),
                            };
                        }
                        Some(TokenKind::This) => {
                            // qualified `Outer.this`
                            self.pos += 1;
                            expr = Expr {
                                kind: ExprKind::This,
                                range: self.range_from(start),
                            };
                        }
                        Some(TokenKind::New) => {
                            // inner instance creation `outer.new Inner()`
                            expr = self.primary()?;
                        }
                        _ => return Err(self.error("expected member name after '.'")),
                    }
                }
                Some(TokenKind::LBracket) => {
                    self.pos += 1;
                    let index = self.expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr {
                        kind: ExprKind::ArrayAccess {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        range: self.range_from(start),
                    };
                }
                Some(kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus)) => {
                    self.pos += 1;
                    let op = if kind == TokenKind::PlusPlus {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    expr = Expr {
                        kind: ExprKind::Unary {
                            op,
                            operand: Box::new(expr),
                        },
                        range: self.range_from(start),
                    };
                }
                Some(TokenKind::ColonColon) => {
                    self.pos += 1;
                    self.skip_type_args()?;
                    let name = match self.peek() {
                        Some(TokenKind::New) => {
                            let token = self.bump().ok_or_else(|| self.error("expected 'new'"))?;
                            Ident {
                                text: SmolStr::new_static("new"),
                                range: token.range,
                            }
                        }
                        _ => self.ident()?,
                    };
                    expr = Expr {
                        kind: ExprKind::MethodRef {
                            target: Box::new(expr),
                            name,
                        },
                        range: self.range_from(start),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn arguments(&mut self) -> PResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn primary(&mut self) -> PResult<Expr> {
        let start = self.current_start();
        let Some(token) = self.bump() else {
            return Err(self.error("expected expression"));
        };
        let kind = match token.kind {
            TokenKind::Number => ExprKind::Literal(number_kind(self.token_text(token))),
            TokenKind::StringLit => ExprKind::Literal(Literal::String),
            TokenKind::CharLit => ExprKind::Literal(Literal::Char),
            TokenKind::True | TokenKind::False => ExprKind::Literal(Literal::Boolean),
            TokenKind::Null => ExprKind::Literal(Literal::Null),
            TokenKind::This | TokenKind::Super if self.at(TokenKind::LParen) => {
                let args = self.arguments()?;
                ExprKind::ConstructorCall {
                    is_super: token.kind == TokenKind::Super,
                    args,
                }
            }
            TokenKind::This => ExprKind::This,
            TokenKind::Super => ExprKind::Super,
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            TokenKind::New => return self.creation(start),
            TokenKind::Ident => {
                let name = Ident {
                    text: SmolStr::new(self.token_text(token)),
                    range: token.range,
                };
                if self.at(TokenKind::LParen) {
                    let args = self.arguments()?;
                    ExprKind::Call {
                        target: None,
                        name,
                        args,
                    }
                } else {
                    ExprKind::Name(name)
                }
            }
            kind if kind.is_primitive() => {
                self.pos -= 1;
                let ty = self.type_ref()?;
                self.expect(TokenKind::Dot)?;
                self.expect(TokenKind::Class)?;
                ExprKind::ClassLiteral(ty)
            }
            _ => {
                self.pos -= 1;
                return Err(self.error("expected expression"));
            }
        };
        Ok(Expr {
            kind,
            range: self.range_from(start),
        })
    }

    /// After `new`.
    fn creation(&mut self, start: TextSize) -> PResult<Expr> {
        let ty = self.type_ref_base()?;
        if self.at(TokenKind::LBracket) {
            let mut dims = Vec::new();
            let mut total = 0;
            while self.eat(TokenKind::LBracket) {
                total += 1;
                if !self.eat(TokenKind::RBracket) {
                    dims.push(self.expr()?);
                    self.expect(TokenKind::RBracket)?;
                }
            }
            let init = if self.at(TokenKind::LBrace) {
                match self.array_init()?.kind {
                    ExprKind::ArrayInit(items) => Some(items),
                    _ => None,
                }
            } else {
                None
            };
            return Ok(Expr {
                kind: ExprKind::NewArray {
                    ty: TypeRef { dims: total, ..ty },
                    dims,
                    init,
                },
                range: self.range_from(start),
            });
        }
        let args = self.arguments()?;
        let body = if self.at(TokenKind::LBrace) {
            Some(self.class_body(TypeDeclKind::Class, "")?)
        } else {
            None
        };
        Ok(Expr {
            kind: ExprKind::New { ty, args, body },
            range: self.range_from(start),
        })
    }
}

fn number_kind(text: &str) -> Literal {
    let lower = text.to_ascii_lowercase();
    if lower.ends_with('l') {
        Literal::Long
    } else if lower.starts_with("0x") {
        Literal::Int
    } else if lower.ends_with('f') {
        Literal::Float
    } else if lower.ends_with('d') || lower.contains('.') || lower.contains('e') {
        Literal::Double
    } else {
        Literal::Int
    }
}

/// `a.b.C` as an expression, read back as a type name.
fn name_chain_to_type(expr: &Expr) -> Option<TypeRef> {
    fn collect(expr: &Expr, out: &mut Vec<SmolStr>) -> bool {
        match &expr.kind {
            ExprKind::Name(ident) => {
                out.push(ident.text.clone());
                true
            }
            ExprKind::FieldAccess { target, name } => {
                collect(target, out) && {
                    out.push(name.text.clone());
                    true
                }
            }
            _ => false,
        }
    }
    let mut segments = Vec::new();
    collect(expr, &mut segments).then(|| TypeRef {
        segments,
        dims: 0,
        range: expr.range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> CompilationUnit {
        parse(text).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    fn first_method(unit: &CompilationUnit) -> &MethodDecl {
        unit.types[0].methods().next().unwrap()
    }

    fn body_stmts(method: &MethodDecl) -> &[Stmt] {
        match &method.body {
            MethodBody::Block(block) => &block.stmts,
            other => panic!("expected parsed body, got {other:?}"),
        }
    }

    #[test]
    fn test_package_imports_and_class_header() {
        let unit = parse_ok(
            "package p2;\nimport p0.X;\nimport p1.*;\nimport static p0.X.TheX;\npublic class Y extends X implements I, J {}",
        );
        assert_eq!(unit.package_segments(), ["p2"]);
        assert_eq!(unit.imports.len(), 3);
        assert!(unit.imports[1].on_demand);
        assert!(unit.imports[2].is_static);
        let ty = &unit.types[0];
        assert_eq!(ty.name.text, "Y");
        assert!(ty.modifiers.is_public);
        assert_eq!(ty.superclass.as_ref().unwrap().simple_name(), "X");
        assert_eq!(ty.interfaces.len(), 2);
    }

    #[test]
    fn test_interface_extends_goes_to_interfaces() {
        let unit = parse_ok("interface I extends A, B { void method(Object o); }");
        let ty = &unit.types[0];
        assert_eq!(ty.kind, TypeDeclKind::Interface);
        assert!(ty.superclass.is_none());
        assert_eq!(ty.interfaces.len(), 2);
        let method = first_method(&unit);
        assert_eq!(method.body, MethodBody::None);
        assert_eq!(method.params[0].ty.simple_name(), "Object");
    }

    #[test]
    fn test_chained_call_ranges() {
        let text = "class Y { void bar() { new T().zork().foo(); } }";
        let unit = parse_ok(text);
        let stmts = body_stmts(first_method(&unit));
        let Stmt::Expr(expr) = &stmts[0] else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { target, name, args } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(name.text, "foo");
        assert!(args.is_empty());
        let match_range = TextRange::new(name.range.start(), expr.range.end());
        assert_eq!(&text[match_range], "foo()");
        let ExprKind::Call { target: inner, name: zork, .. } = &target.as_ref().unwrap().kind
        else {
            panic!("expected inner call");
        };
        assert_eq!(zork.text, "zork");
        assert!(matches!(inner.as_ref().unwrap().kind, ExprKind::New { .. }));
    }

    #[test]
    fn test_static_initializer_and_static_field() {
        let unit = parse_ok(
            "class Z extends Y { static { X.TheX = new Z(); } public static X TheX; }",
        );
        let members = &unit.types[0].members;
        let Member::Initializer(init) = &members[0] else {
            panic!("expected initializer");
        };
        assert!(init.is_static);
        assert!(matches!(
            init.body.stmts[0],
            Stmt::Expr(Expr {
                kind: ExprKind::Assign { .. },
                ..
            })
        ));
        let Member::Field(field) = &members[1] else {
            panic!("expected field");
        };
        assert!(field.modifiers.is_static);
        assert_eq!(field.name.text, "TheX");
    }

    #[test]
    fn test_constructor_and_explicit_super_call() {
        let unit = parse_ok("class A extends B { A(int x) { super(x); } }");
        let ctor = first_method(&unit);
        assert!(ctor.is_constructor());
        assert!(matches!(
            body_stmts(ctor)[0],
            Stmt::Expr(Expr {
                kind: ExprKind::ConstructorCall { is_super: true, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_local_declarations_and_casts() {
        let unit = parse_ok(
            "class A { void m(Object o) { int[] xs = new int[3]; String s = (String) o; a.b = (x) + 1; } }",
        );
        let stmts = body_stmts(first_method(&unit));
        assert!(matches!(&stmts[0], Stmt::Local(vars) if vars[0].ty.dims == 1));
        let Stmt::Local(vars) = &stmts[1] else {
            panic!("expected local");
        };
        assert!(matches!(
            vars[0].init.as_ref().unwrap().kind,
            ExprKind::Cast { .. }
        ));
        let Stmt::Expr(Expr {
            kind: ExprKind::Assign { value, .. },
            ..
        }) = &stmts[2]
        else {
            panic!("expected assignment");
        };
        assert!(matches!(
            value.kind,
            ExprKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_generics_are_skipped() {
        let unit = parse_ok(
            "class A<T extends B> { java.util.Map<String, List<T>> map; <U> U pick(List<? extends U> xs) { return null; } }",
        );
        let ty = &unit.types[0];
        let field = ty.fields().next().unwrap();
        assert_eq!(field.ty.dotted(), "java.util.Map");
        let method = ty.methods().next().unwrap();
        assert_eq!(method.name.text, "pick");
        assert_eq!(method.params[0].ty.simple_name(), "List");
    }

    #[test]
    fn test_control_flow() {
        let unit = parse_ok(
            r#"class A { void m(java.util.List items) {
                for (int i = 0; i < 10; i++) { if (i > 2) break; else continue; }
                for (Object o : items) { foo(o); }
                while (x >> 1 > 0) x--;
                do { x++; } while (x < 3);
                try { risky(); } catch (RuntimeException | Error e) { throw e; } finally { done(); }
                switch (x) { case 1: case 2: foo(null); break; default: bar(); }
                synchronized (this) { foo(null); }
            } }"#,
        );
        assert_eq!(body_stmts(first_method(&unit)).len(), 7);
    }

    #[test]
    fn test_unparsable_body_is_skipped() {
        let unit = parse_ok("class A { void m(int x) { switch (x) { case 1 -> go(); } } void n() {} }");
        let methods: Vec<_> = unit.types[0].methods().collect();
        assert!(matches!(methods[0].body, MethodBody::Unparsed(_)));
        assert!(matches!(methods[1].body, MethodBody::Block(_)));
    }

    #[test]
    fn test_lambdas_in_every_form() {
        let unit = parse_ok(
            "class A { void m() {
                l.forEach(x -> x.foo());
                Runnable r = () -> { foo(); };
                Cmp c = (a, b) -> a.compareTo(b);
                Fn f = (final String s, int[] n) -> s;
                Object o = (Runnable) () -> foo();
            } }",
        );
        let stmts = body_stmts(first_method(&unit));
        assert_eq!(stmts.len(), 5);
        let Stmt::Expr(call) = &stmts[0] else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { args, .. } = &call.kind else {
            panic!("expected call");
        };
        let ExprKind::Lambda { params, body } = &args[0].kind else {
            panic!("expected lambda argument");
        };
        assert_eq!(params.len(), 1);
        assert!(params[0].ty.is_none());
        assert!(matches!(body, LambdaBody::Expr(_)));

        let Stmt::Local(vars) = &stmts[3] else {
            panic!("expected local");
        };
        let Some(Expr {
            kind: ExprKind::Lambda { params, .. },
            ..
        }) = &vars[0].init
        else {
            panic!("expected typed lambda");
        };
        let types: Vec<String> = params
            .iter()
            .map(|p| p.ty.as_ref().map(|t| t.dotted()).unwrap_or_default())
            .collect();
        assert_eq!(types, ["String", "int"]);
        assert_eq!(params[1].ty.as_ref().map(|t| t.dims), Some(1));
    }

    #[test]
    fn test_method_references() {
        let unit = parse_ok("class A { void m() { Runnable r = this::foo; Make k = X::new; g(String::<T>valueOf); } }");
        let stmts = body_stmts(first_method(&unit));
        let names: Vec<String> = stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Local(vars) => vars[0].init.clone(),
                Stmt::Expr(Expr {
                    kind: ExprKind::Call { args, .. },
                    ..
                }) => args.first().cloned(),
                _ => None,
            })
            .filter_map(|expr| match expr.kind {
                ExprKind::MethodRef { name, .. } => Some(name.text.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["foo", "new", "valueOf"]);
    }

    #[test]
    fn test_compound_shift_assignments() {
        let unit = parse_ok("class A { void m(int i) { i >>= 1; i >>>= 2; i <<= 3; int j = i >>> 2 > 1 ? 1 : 0; } }");
        let method = first_method(&unit);
        let stmts = body_stmts(method);
        assert_eq!(stmts.len(), 4);
        for stmt in &stmts[..3] {
            let Stmt::Expr(expr) = stmt else {
                panic!("expected expression statement");
            };
            assert!(matches!(expr.kind, ExprKind::Assign { .. }));
        }
    }

    #[test]
    fn test_enum_constants_become_fields() {
        let unit = parse_ok("enum Color { RED, GREEN(2) { }, BLUE; int v; }");
        let fields: Vec<_> = unit.types[0].fields().collect();
        assert_eq!(fields.len(), 4);
        assert!(fields[0].is_enum_constant);
        assert_eq!(fields[0].ty.simple_name(), "Color");
        assert!(fields[1].init.is_some());
        assert!(!fields[3].is_enum_constant);
    }

    #[test]
    fn test_annotations_are_skipped() {
        let unit = parse_ok(
            "@Deprecated public class A { @Override public String toString() { return \"a\"; } @interface Marker { int value() default 1; } }",
        );
        let ty = &unit.types[0];
        assert_eq!(ty.methods().count(), 1);
        assert_eq!(ty.nested_types().count(), 1);
    }

    #[test]
    fn test_declaration_errors_fail_the_file() {
        assert!(parse("class { }").is_err());
        assert!(parse("class A { void m( }").is_err());
    }
}
