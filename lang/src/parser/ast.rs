//! Abstract syntax shared by both surface syntaxes.
//!
//! Every node records its start and end handles so the printers can
//! reproduce blank lines and interleave comments at the right places.
//! The node set is closed; the printers dispatch with exhaustive matches.

use crate::position::Pos;
use crate::scanner::TokenKind;

/// A single comment, stored in the curly-form spelling (`//…` or `/*…*/`)
/// regardless of which syntax it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub pos: Pos,
    pub text: String,
}

impl Comment {
    pub fn end(&self) -> Pos {
        self.pos.advance(self.text.len())
    }
}

/// A run of adjacent comments with no intervening token and no blank line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentGroup {
    pub list: Vec<Comment>,
}

impl CommentGroup {
    pub fn pos(&self) -> Pos {
        self.list.first().map_or(Pos::NONE, |c| c.pos)
    }

    pub fn end(&self) -> Pos {
        self.list.last().map_or(Pos::NONE, |c| c.end())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub pos: Pos,
    pub name: String,
}

impl Ident {
    pub fn end(&self) -> Pos {
        self.pos.advance(self.name.len())
    }
}

/// A literal token carried verbatim: the printers re-emit `text` unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub pos: Pos,
    pub kind: TokenKind,
    pub text: String,
}

impl BasicLit {
    pub fn end(&self) -> Pos {
        self.pos.advance(self.text.len())
    }
}

/// A named element of a struct type, parameter list or result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Expr,
}

impl Field {
    pub fn pos(&self) -> Pos {
        self.names.first().map_or_else(|| self.ty.pos(), |n| n.pos)
    }

    pub fn end(&self) -> Pos {
        self.ty.end()
    }
}

/// A bracketed (or bare, for single unparenthesized results) field list.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldList {
    /// Position of `(` or `{`; `Pos::NONE` when the list is bare.
    pub opening: Pos,
    pub fields: Vec<Field>,
    pub closing: Pos,
}

impl FieldList {
    pub fn pos(&self) -> Pos {
        if self.opening.is_valid() {
            self.opening
        } else {
            self.fields.first().map_or(Pos::NONE, |f| f.pos())
        }
    }

    pub fn end(&self) -> Pos {
        if self.closing.is_valid() {
            self.closing.advance(1)
        } else {
            self.fields.last().map_or(Pos::NONE, |f| f.end())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    /// Position of the `func` keyword; `Pos::NONE` inside a declaration
    /// header where the keyword was already printed.
    pub func: Pos,
    pub params: FieldList,
    pub results: Option<FieldList>,
}

impl FuncType {
    pub fn pos(&self) -> Pos {
        if self.func.is_valid() {
            self.func
        } else {
            self.params.pos()
        }
    }

    pub fn end(&self) -> Pos {
        match &self.results {
            Some(results) => results.end(),
            None => self.params.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    BasicLit(BasicLit),
    Unary {
        pos: Pos,
        op: TokenKind,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op_pos: Pos,
        op: TokenKind,
        right: Box<Expr>,
    },
    Paren {
        lparen: Pos,
        inner: Box<Expr>,
        rparen: Pos,
    },
    Selector {
        receiver: Box<Expr>,
        sel: Ident,
    },
    Index {
        receiver: Box<Expr>,
        lbrack: Pos,
        index: Box<Expr>,
        rbrack: Pos,
    },
    Slice {
        receiver: Box<Expr>,
        lbrack: Pos,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        rbrack: Pos,
    },
    Call {
        func: Box<Expr>,
        lparen: Pos,
        args: Vec<Expr>,
        rparen: Pos,
    },
    /// `T{…}`, or an untyped `{…}` element inside another composite.
    Composite {
        ty: Option<Box<Expr>>,
        lbrace: Pos,
        elts: Vec<Expr>,
        rbrace: Pos,
    },
    KeyValue {
        key: Box<Expr>,
        colon: Pos,
        value: Box<Expr>,
    },
    /// Pointer type or dereference, `*x`.
    Star {
        star: Pos,
        inner: Box<Expr>,
    },
    FuncLit {
        ty: FuncType,
        body: Block,
    },
    ArrayType {
        lbrack: Pos,
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
    },
    MapType {
        pos: Pos,
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncType(FuncType),
    StructType {
        pos: Pos,
        fields: FieldList,
    },
}

impl Expr {
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Ident(id) => id.pos,
            Expr::BasicLit(lit) => lit.pos,
            Expr::Unary { pos, .. } => *pos,
            Expr::Binary { left, .. } => left.pos(),
            Expr::Paren { lparen, .. } => *lparen,
            Expr::Selector { receiver, .. } => receiver.pos(),
            Expr::Index { receiver, .. } => receiver.pos(),
            Expr::Slice { receiver, .. } => receiver.pos(),
            Expr::Call { func, .. } => func.pos(),
            Expr::Composite { ty, lbrace, .. } => ty.as_ref().map_or(*lbrace, |t| t.pos()),
            Expr::KeyValue { key, .. } => key.pos(),
            Expr::Star { star, .. } => *star,
            Expr::FuncLit { ty, .. } => ty.pos(),
            Expr::ArrayType { lbrack, .. } => *lbrack,
            Expr::MapType { pos, .. } => *pos,
            Expr::FuncType(ty) => ty.pos(),
            Expr::StructType { pos, .. } => *pos,
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Expr::Ident(id) => id.end(),
            Expr::BasicLit(lit) => lit.end(),
            Expr::Unary { operand, .. } => operand.end(),
            Expr::Binary { right, .. } => right.end(),
            Expr::Paren { rparen, .. } => rparen.advance(1),
            Expr::Selector { sel, .. } => sel.end(),
            Expr::Index { rbrack, .. } => rbrack.advance(1),
            Expr::Slice { rbrack, .. } => rbrack.advance(1),
            Expr::Call { rparen, .. } => rparen.advance(1),
            Expr::Composite { rbrace, .. } => rbrace.advance(1),
            Expr::KeyValue { value, .. } => value.end(),
            Expr::Star { inner, .. } => inner.end(),
            Expr::FuncLit { body, .. } => body.end(),
            Expr::ArrayType { elem, .. } => elem.end(),
            Expr::MapType { value, .. } => value.end(),
            Expr::FuncType(ty) => ty.end(),
            Expr::StructType { fields, .. } => fields.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub open: Pos,
    pub stmts: Vec<Stmt>,
    pub close: Pos,
}

impl Block {
    pub fn pos(&self) -> Pos {
        self.open
    }

    pub fn end(&self) -> Pos {
        self.close.advance(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(Decl),
    Empty {
        pos: Pos,
    },
    Labeled {
        label: Ident,
        colon: Pos,
        stmt: Box<Stmt>,
    },
    Expr(Expr),
    IncDec {
        expr: Expr,
        tok_pos: Pos,
        op: TokenKind,
    },
    Assign {
        lhs: Vec<Expr>,
        tok_pos: Pos,
        op: TokenKind,
        rhs: Vec<Expr>,
    },
    Return {
        pos: Pos,
        results: Vec<Expr>,
    },
    /// `break`, `continue`, `goto` or `fallthrough`.
    Branch {
        pos: Pos,
        op: TokenKind,
        label: Option<Ident>,
    },
    Block(Block),
    If {
        pos: Pos,
        init: Option<Box<Stmt>>,
        cond: Expr,
        body: Block,
        else_branch: Option<Box<Stmt>>,
    },
    Switch {
        pos: Pos,
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        body: Block,
    },
    /// A `case`/`default` clause; only appears inside a switch body.
    Case {
        pos: Pos,
        values: Vec<Expr>,
        colon: Pos,
        body: Vec<Stmt>,
    },
    For {
        pos: Pos,
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Go {
        pos: Pos,
        call: Expr,
    },
    Defer {
        pos: Pos,
        call: Expr,
    },
}

impl Stmt {
    pub fn pos(&self) -> Pos {
        match self {
            Stmt::Decl(decl) => decl.pos(),
            Stmt::Empty { pos } => *pos,
            Stmt::Labeled { label, .. } => label.pos,
            Stmt::Expr(expr) => expr.pos(),
            Stmt::IncDec { expr, .. } => expr.pos(),
            Stmt::Assign { lhs, .. } => lhs.first().map_or(Pos::NONE, |e| e.pos()),
            Stmt::Return { pos, .. } => *pos,
            Stmt::Branch { pos, .. } => *pos,
            Stmt::Block(block) => block.pos(),
            Stmt::If { pos, .. } => *pos,
            Stmt::Switch { pos, .. } => *pos,
            Stmt::Case { pos, .. } => *pos,
            Stmt::For { pos, .. } => *pos,
            Stmt::Go { pos, .. } => *pos,
            Stmt::Defer { pos, .. } => *pos,
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Stmt::Decl(decl) => decl.end(),
            Stmt::Empty { pos } => *pos,
            Stmt::Labeled { stmt, .. } => stmt.end(),
            Stmt::Expr(expr) => expr.end(),
            Stmt::IncDec { tok_pos, .. } => tok_pos.advance(2),
            Stmt::Assign { rhs, .. } => rhs.last().map_or(Pos::NONE, |e| e.end()),
            Stmt::Return { pos, results } => {
                results.last().map_or_else(|| pos.advance(6), |e| e.end())
            }
            Stmt::Branch { pos, op, label } => match label {
                Some(label) => label.end(),
                None => pos.advance(op.text().len()),
            },
            Stmt::Block(block) => block.end(),
            Stmt::If {
                body, else_branch, ..
            } => match else_branch {
                Some(else_branch) => else_branch.end(),
                None => body.end(),
            },
            Stmt::Switch { body, .. } => body.end(),
            Stmt::Case { colon, body, .. } => {
                body.last().map_or_else(|| colon.advance(1), |s| s.end())
            }
            Stmt::For { body, .. } => body.end(),
            Stmt::Go { call, .. } => call.end(),
            Stmt::Defer { call, .. } => call.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    Import {
        name: Option<Ident>,
        path: BasicLit,
    },
    Value {
        names: Vec<Ident>,
        ty: Option<Expr>,
        values: Vec<Expr>,
    },
    Type {
        name: Ident,
        ty: Expr,
    },
}

impl Spec {
    pub fn pos(&self) -> Pos {
        match self {
            Spec::Import { name, path } => name.as_ref().map_or(path.pos, |n| n.pos),
            Spec::Value { names, .. } => names.first().map_or(Pos::NONE, |n| n.pos),
            Spec::Type { name, .. } => name.pos,
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Spec::Import { path, .. } => path.end(),
            Spec::Value { names, ty, values } => {
                if let Some(last) = values.last() {
                    last.end()
                } else if let Some(ty) = ty {
                    ty.end()
                } else {
                    names.last().map_or(Pos::NONE, |n| n.end())
                }
            }
            Spec::Type { ty, .. } => ty.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// `import`, `const`, `var` or `type` with one spec or a
    /// parenthesized group of specs.
    Gen {
        pos: Pos,
        tok: TokenKind,
        lparen: Pos,
        specs: Vec<Spec>,
        rparen: Pos,
    },
    Func {
        pos: Pos,
        recv: Option<FieldList>,
        name: Ident,
        ty: FuncType,
        body: Option<Block>,
    },
}

impl Decl {
    pub fn pos(&self) -> Pos {
        match self {
            Decl::Gen { pos, .. } => *pos,
            Decl::Func { pos, .. } => *pos,
        }
    }

    pub fn end(&self) -> Pos {
        match self {
            Decl::Gen {
                pos,
                tok,
                rparen,
                specs,
                ..
            } => {
                if rparen.is_valid() {
                    rparen.advance(1)
                } else if let Some(last) = specs.last() {
                    last.end()
                } else {
                    pos.advance(tok.text().len())
                }
            }
            Decl::Func { ty, body, .. } => match body {
                Some(body) => body.end(),
                None => ty.end(),
            },
        }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// Position of the `package` keyword.
    pub package: Pos,
    pub name: Ident,
    pub decls: Vec<Decl>,
    /// All comment groups, in textual order.
    pub comments: Vec<CommentGroup>,
}

impl File {
    pub fn pos(&self) -> Pos {
        self.package
    }

    pub fn end(&self) -> Pos {
        self.decls
            .last()
            .map_or_else(|| self.name.end(), |d| d.end())
    }
}
