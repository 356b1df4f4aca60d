//! Syntax tree shared by the parser, resolver, interpreter and AST printer.
//!
//! Nodes are immutable once built.  Expressions whose binding is decided by
//! the resolver (`Variable`, `Assign`, `This`, `Super`) carry an [`ExprId`]
//! assigned at construction; the interpreter's side table of binding
//! distances is keyed by it.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Stable identity of a resolvable expression node.
///
/// Ids are unique for the life of the process, so trees parsed from
/// successive REPL lines never collide in the same interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree and
/// therefore do **not** retain a reference to the originating [`Token`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Conditional expression `condition ? then_branch : else_branch`.
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The 'this' keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method` inside a subclass method.
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

/// A function or method declaration.  Shared by reference between the
/// statement that declares it and every runtime function value built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
///
/// There is no `for` node: the parser lowers `for` loops to `Block`/`While`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}

// Dropping a deep tree through the derived glue recurses once per level.
// These impls unlink children onto a work list instead, so teardown uses
// constant stack however deep the parser was allowed to nest.

impl Expr {
    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expr::Literal(_) | Expr::Variable { .. } | Expr::This { .. } | Expr::Super { .. }
        )
    }

    /// Move every non-leaf child into `out`, leaving `nil` in its place.
    fn take_children(&mut self, out: &mut Vec<Expr>) {
        fn take(child: &mut Box<Expr>, out: &mut Vec<Expr>) {
            if !child.is_leaf() {
                out.push(std::mem::replace(&mut **child, Expr::Literal(LiteralValue::Nil)));
            }
        }

        match self {
            Expr::Literal(_) | Expr::Variable { .. } | Expr::This { .. } | Expr::Super { .. } => {}

            Expr::Unary { right: child, .. }
            | Expr::Grouping(child)
            | Expr::Assign { value: child, .. }
            | Expr::Get { object: child, .. } => take(child, out),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                take(left, out);
                take(right, out);
            }

            Expr::Set { object, value, .. } => {
                take(object, out);
                take(value, out);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                take(condition, out);
                take(then_branch, out);
                take(else_branch, out);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                take(callee, out);
                out.extend(arguments.drain(..).filter(|argument| !argument.is_leaf()));
            }
        }
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending: Vec<Expr> = Vec::new();
        self.take_children(&mut pending);

        while let Some(mut expr) = pending.pop() {
            expr.take_children(&mut pending);
        }
    }
}

impl Stmt {
    /// Move nested statements into `out`.  Function bodies are only
    /// unlinked when this statement holds the last reference to them.
    fn take_children(&mut self, out: &mut Vec<Stmt>) {
        match self {
            Stmt::Block(statements) => out.append(statements),

            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                out.push(std::mem::replace(&mut **then_branch, Stmt::Block(Vec::new())));
                if let Some(else_branch) = else_branch.take() {
                    out.push(*else_branch);
                }
            }

            Stmt::While { body, .. } => {
                out.push(std::mem::replace(&mut **body, Stmt::Block(Vec::new())));
            }

            Stmt::Function(declaration) => {
                if let Some(declaration) = Rc::get_mut(declaration) {
                    out.append(&mut declaration.body);
                }
            }

            Stmt::Class { methods, .. } => {
                for method in methods.iter_mut() {
                    if let Some(method) = Rc::get_mut(method) {
                        out.append(&mut method.body);
                    }
                }
            }

            Stmt::Expression(_) | Stmt::Print(_) | Stmt::Var { .. } | Stmt::Return { .. } => {}
        }
    }
}

impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending: Vec<Stmt> = Vec::new();
        self.take_children(&mut pending);

        while let Some(mut stmt) = pending.pop() {
            stmt.take_children(&mut pending);
        }
    }
}
