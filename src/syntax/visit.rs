//! Read-only traversal over the syntax tree.
//!
//! Override the `visit_*` hooks you care about and call the matching
//! `walk_*` function to continue into children.

use super::ast::*;

pub trait Visitor {
    fn visit_type_decl(&mut self, decl: &TypeDecl) {
        walk_type_decl(self, decl);
    }

    fn visit_method(&mut self, method: &MethodDecl) {
        walk_method(self, method);
    }

    fn visit_field(&mut self, field: &FieldDecl) {
        walk_field(self, field);
    }

    fn visit_initializer(&mut self, init: &Initializer) {
        walk_block(self, &init.body);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_local(&mut self, local: &LocalVar) {
        walk_local(self, local);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_type_ref(&mut self, _ty: &TypeRef) {}
}

pub fn walk_unit<V: Visitor + ?Sized>(v: &mut V, unit: &CompilationUnit) {
    for ty in &unit.types {
        v.visit_type_decl(ty);
    }
}

pub fn walk_type_decl<V: Visitor + ?Sized>(v: &mut V, decl: &TypeDecl) {
    if let Some(superclass) = &decl.superclass {
        v.visit_type_ref(superclass);
    }
    for iface in &decl.interfaces {
        v.visit_type_ref(iface);
    }
    walk_members(v, &decl.members);
}

pub fn walk_members<V: Visitor + ?Sized>(v: &mut V, members: &[Member]) {
    for member in members {
        match member {
            Member::Field(field) => v.visit_field(field),
            Member::Method(method) => v.visit_method(method),
            Member::Initializer(init) => v.visit_initializer(init),
            Member::Type(ty) => v.visit_type_decl(ty),
        }
    }
}

pub fn walk_method<V: Visitor + ?Sized>(v: &mut V, method: &MethodDecl) {
    if let Some(ret) = &method.return_type {
        v.visit_type_ref(ret);
    }
    for param in &method.params {
        v.visit_type_ref(&param.ty);
    }
    for thrown in &method.throws {
        v.visit_type_ref(thrown);
    }
    if let MethodBody::Block(block) = &method.body {
        v.visit_block(block);
    }
}

pub fn walk_field<V: Visitor + ?Sized>(v: &mut V, field: &FieldDecl) {
    if !field.is_enum_constant {
        v.visit_type_ref(&field.ty);
    }
    if let Some(init) = &field.init {
        v.visit_expr(init);
    }
}

pub fn walk_block<V: Visitor + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_local<V: Visitor + ?Sized>(v: &mut V, local: &LocalVar) {
    v.visit_type_ref(&local.ty);
    if let Some(init) = &local.init {
        v.visit_expr(init);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block(block) => v.visit_block(block),
        Stmt::Local(locals) => {
            for local in locals {
                v.visit_local(local);
            }
        }
        Stmt::Expr(expr) | Stmt::Throw(expr) => v.visit_expr(expr),
        Stmt::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            v.visit_expr(cond);
            v.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        Stmt::While { cond, body } | Stmt::DoWhile { body, cond } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        Stmt::For {
            init,
            cond,
            update,
            body,
        } => {
            for stmt in init {
                v.visit_stmt(stmt);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            for expr in update {
                v.visit_expr(expr);
            }
            v.visit_stmt(body);
        }
        Stmt::ForEach {
            var,
            iterable,
            body,
        } => {
            v.visit_expr(iterable);
            v.visit_local(var);
            v.visit_stmt(body);
        }
        Stmt::Try {
            body,
            catches,
            finally,
        } => {
            v.visit_block(body);
            for catch in catches {
                v.visit_type_ref(&catch.param.ty);
                v.visit_block(&catch.body);
            }
            if let Some(finally) = finally {
                v.visit_block(finally);
            }
        }
        Stmt::Switch { selector, cases } => {
            v.visit_expr(selector);
            for case in cases {
                for label in &case.labels {
                    v.visit_expr(label);
                }
                for stmt in &case.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Synchronized { lock, body } => {
            v.visit_expr(lock);
            v.visit_block(body);
        }
        Stmt::Assert { cond, message } => {
            v.visit_expr(cond);
            if let Some(message) = message {
                v.visit_expr(message);
            }
        }
        Stmt::LocalClass(decl) => v.visit_type_decl(decl),
        Stmt::Break | Stmt::Continue | Stmt::Empty => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Name(_) | ExprKind::This | ExprKind::Super => {}
        ExprKind::FieldAccess { target, .. } => v.visit_expr(target),
        ExprKind::Call { target, args, .. } => {
            if let Some(target) = target {
                v.visit_expr(target);
            }
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::New { ty, args, body } => {
            v.visit_type_ref(ty);
            for arg in args {
                v.visit_expr(arg);
            }
            if let Some(body) = body {
                walk_members(v, body);
            }
        }
        ExprKind::NewArray { ty, dims, init } => {
            v.visit_type_ref(ty);
            for dim in dims {
                v.visit_expr(dim);
            }
            for item in init.iter().flatten() {
                v.visit_expr(item);
            }
        }
        ExprKind::ArrayInit(items) => {
            for item in items {
                v.visit_expr(item);
            }
        }
        ExprKind::ArrayAccess { array, index } => {
            v.visit_expr(array);
            v.visit_expr(index);
        }
        ExprKind::ConstructorCall { args, .. } => {
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::ClassLiteral(ty) => v.visit_type_ref(ty),
        ExprKind::Assign { target, value } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Cast { ty, expr } => {
            v.visit_type_ref(ty);
            v.visit_expr(expr);
        }
        ExprKind::InstanceOf { expr, ty } => {
            v.visit_expr(expr);
            v.visit_type_ref(ty);
        }
        ExprKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            v.visit_expr(cond);
            v.visit_expr(then_expr);
            v.visit_expr(else_expr);
        }
        ExprKind::Paren(inner) => v.visit_expr(inner),
        ExprKind::Lambda { params, body } => {
            for ty in params.iter().filter_map(|p| p.ty.as_ref()) {
                v.visit_type_ref(ty);
            }
            walk_lambda_body(v, body);
        }
        ExprKind::MethodRef { target, .. } => v.visit_expr(target),
    }
}

pub fn walk_lambda_body<V: Visitor + ?Sized>(v: &mut V, body: &LambdaBody) {
    match body {
        LambdaBody::Expr(expr) => v.visit_expr(expr),
        LambdaBody::Block(block) => v.visit_block(block),
    }
}
