pub mod ast;
#[cfg(test)]
mod tests;

use crate::position::Pos;
use crate::scanner::{Token, TokenKind};
use ast::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub pos: Pos,
}

impl ParseError {
    fn new(message: impl Into<String>, pos: Pos) -> ParseError {
        ParseError {
            message: message.into(),
            pos,
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parse one file from the shared token stream. The stream looks the same
/// whichever surface syntax it was scanned from, so there is a single
/// grammar here.
pub fn parse_file(tokens: Vec<Token>, comments: Vec<CommentGroup>) -> Result<File> {
    let mut parser = Parser::new(tokens);
    let file = parser.file(comments)?;
    Ok(file)
}

/// Parse a standalone expression (used by tests and the debug surface).
pub fn parse_expr(tokens: Vec<Token>) -> Result<Expr> {
    let mut parser = Parser::new(tokens);
    parser.expr()
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Composite literals are not allowed at the top level of if/for/switch
    /// headers, where `{` must read as the block opener.
    composite_ok: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            composite_ok: true,
        }
    }

    // ------------------------------------------------------------------
    // File and declarations

    fn file(&mut self, comments: Vec<CommentGroup>) -> Result<File> {
        if self.kind() == TokenKind::Eof {
            // empty or comments-only source
            return Ok(File {
                package: Pos::NONE,
                name: Ident {
                    pos: Pos::NONE,
                    name: String::new(),
                },
                decls: Vec::new(),
                comments,
            });
        }
        let package = self.expect(TokenKind::Package)?;
        let name = self.ident()?;
        self.statement_end()?;

        let mut decls = Vec::new();
        while self.kind() != TokenKind::Eof {
            decls.push(self.decl()?);
            self.statement_end()?;
        }

        Ok(File {
            package,
            name,
            decls,
            comments,
        })
    }

    fn decl(&mut self) -> Result<Decl> {
        match self.kind() {
            TokenKind::Import | TokenKind::Const | TokenKind::Var | TokenKind::Type => {
                self.gen_decl()
            }
            TokenKind::Func => self.func_decl(),
            _ => Err(self.unexpected("declaration")),
        }
    }

    fn gen_decl(&mut self) -> Result<Decl> {
        let tok = self.kind();
        let pos = self.advance_pos();
        if self.kind() == TokenKind::LParen {
            let lparen = self.advance_pos();
            let mut specs = Vec::new();
            while self.kind() != TokenKind::RParen && self.kind() != TokenKind::Eof {
                specs.push(self.spec(tok)?);
                self.statement_end()?;
            }
            let rparen = self.expect(TokenKind::RParen)?;
            Ok(Decl::Gen {
                pos,
                tok,
                lparen,
                specs,
                rparen,
            })
        } else {
            let spec = self.spec(tok)?;
            Ok(Decl::Gen {
                pos,
                tok,
                lparen: Pos::NONE,
                specs: vec![spec],
                rparen: Pos::NONE,
            })
        }
    }

    fn spec(&mut self, tok: TokenKind) -> Result<Spec> {
        match tok {
            TokenKind::Import => {
                let name = if self.kind() == TokenKind::Ident {
                    Some(self.ident()?)
                } else {
                    None
                };
                let path = self.basic_lit(TokenKind::Str)?;
                Ok(Spec::Import { name, path })
            }
            TokenKind::Type => {
                let name = self.ident()?;
                let ty = self.type_expr()?;
                Ok(Spec::Type { name, ty })
            }
            _ => {
                // const or var
                let mut names = vec![self.ident()?];
                while self.kind() == TokenKind::Comma {
                    self.advance();
                    names.push(self.ident()?);
                }
                let ty = if self.starts_type(self.kind()) {
                    Some(self.type_expr()?)
                } else {
                    None
                };
                let mut values = Vec::new();
                if self.kind() == TokenKind::Assign {
                    self.advance();
                    values = self.expr_list()?;
                }
                Ok(Spec::Value { names, ty, values })
            }
        }
    }

    fn func_decl(&mut self) -> Result<Decl> {
        let pos = self.advance_pos(); // func
        let recv = if self.kind() == TokenKind::LParen {
            Some(self.field_list()?)
        } else {
            None
        };
        let name = self.ident()?;
        let params = self.field_list()?;
        let results = self.results()?;
        let ty = FuncType {
            func: Pos::NONE,
            params,
            results,
        };
        let body = if self.kind() == TokenKind::OpenBlock {
            Some(self.block()?)
        } else {
            None
        };
        Ok(Decl::Func {
            pos,
            recv,
            name,
            ty,
            body,
        })
    }

    fn results(&mut self) -> Result<Option<FieldList>> {
        if self.kind() == TokenKind::LParen {
            return Ok(Some(self.field_list()?));
        }
        if self.starts_type(self.kind()) {
            let ty = self.type_expr()?;
            return Ok(Some(FieldList {
                opening: Pos::NONE,
                fields: vec![Field {
                    names: Vec::new(),
                    ty,
                }],
                closing: Pos::NONE,
            }));
        }
        Ok(None)
    }

    /// A parenthesized parameter/receiver/result list. Whether an
    /// identifier turns out to be a name or a bare type does not change
    /// the token order, which is all the printers reproduce.
    fn field_list(&mut self) -> Result<FieldList> {
        let opening = self.expect(TokenKind::LParen)?;
        let mut fields = Vec::new();
        while self.kind() != TokenKind::RParen && self.kind() != TokenKind::Eof {
            // collect leading identifiers that might be a name list
            let mut pending = Vec::new();
            while self.kind() == TokenKind::Ident && self.peek_kind(1) == TokenKind::Comma {
                pending.push(self.ident()?);
                self.advance(); // comma
            }
            if self.kind() == TokenKind::Ident && self.starts_type(self.peek_kind(1)) {
                pending.push(self.ident()?);
                let ty = self.type_expr()?;
                fields.push(Field { names: pending, ty });
            } else {
                // the identifiers were bare types after all
                for name in pending {
                    fields.push(Field {
                        names: Vec::new(),
                        ty: Expr::Ident(name),
                    });
                }
                if self.kind() != TokenKind::RParen {
                    let ty = self.type_expr()?;
                    fields.push(Field {
                        names: Vec::new(),
                        ty,
                    });
                }
            }
            if self.kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        let closing = self.expect(TokenKind::RParen)?;
        Ok(FieldList {
            opening,
            fields,
            closing,
        })
    }

    // ------------------------------------------------------------------
    // Types

    fn starts_type(&self, kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Ident
                | TokenKind::Mul
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::LParen
        )
    }

    fn type_expr(&mut self) -> Result<Expr> {
        match self.kind() {
            TokenKind::Ident => {
                let ident = self.ident()?;
                if self.kind() == TokenKind::Period {
                    self.advance();
                    let sel = self.ident()?;
                    Ok(Expr::Selector {
                        receiver: Box::new(Expr::Ident(ident)),
                        sel,
                    })
                } else {
                    Ok(Expr::Ident(ident))
                }
            }
            TokenKind::Mul => {
                let star = self.advance_pos();
                let inner = self.type_expr()?;
                Ok(Expr::Star {
                    star,
                    inner: Box::new(inner),
                })
            }
            TokenKind::LBracket => {
                let lbrack = self.advance_pos();
                let len = if self.kind() == TokenKind::RBracket {
                    None
                } else {
                    Some(Box::new(self.expr()?))
                };
                self.expect(TokenKind::RBracket)?;
                let elem = self.type_expr()?;
                Ok(Expr::ArrayType {
                    lbrack,
                    len,
                    elem: Box::new(elem),
                })
            }
            TokenKind::Map => {
                let pos = self.advance_pos();
                self.expect(TokenKind::LBracket)?;
                let key = self.type_expr()?;
                self.expect(TokenKind::RBracket)?;
                let value = self.type_expr()?;
                Ok(Expr::MapType {
                    pos,
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Func => {
                let func = self.advance_pos();
                let params = self.field_list()?;
                let results = self.results()?;
                Ok(Expr::FuncType(FuncType {
                    func,
                    params,
                    results,
                }))
            }
            TokenKind::Struct => self.struct_type(),
            TokenKind::LParen => {
                let lparen = self.advance_pos();
                let inner = self.type_expr()?;
                let rparen = self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren {
                    lparen,
                    inner: Box::new(inner),
                    rparen,
                })
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn struct_type(&mut self) -> Result<Expr> {
        let pos = self.advance_pos(); // struct
        let opening = self.expect(TokenKind::OpenBlock)?;
        let mut fields = Vec::new();
        while self.kind() != TokenKind::CloseBlock && self.kind() != TokenKind::Eof {
            fields.push(self.struct_field()?);
            self.statement_end()?;
        }
        let closing = self.expect(TokenKind::CloseBlock)?;
        Ok(Expr::StructType {
            pos,
            fields: FieldList {
                opening,
                fields,
                closing,
            },
        })
    }

    fn struct_field(&mut self) -> Result<Field> {
        let mut names = Vec::new();
        while self.kind() == TokenKind::Ident && self.peek_kind(1) == TokenKind::Comma {
            names.push(self.ident()?);
            self.advance(); // comma
        }
        if self.kind() == TokenKind::Ident && self.starts_type(self.peek_kind(1)) {
            names.push(self.ident()?);
            let ty = self.type_expr()?;
            return Ok(Field { names, ty });
        }
        if names.is_empty() {
            // embedded field
            let ty = self.type_expr()?;
            return Ok(Field {
                names: Vec::new(),
                ty,
            });
        }
        Err(self.unexpected("struct field type"))
    }

    // ------------------------------------------------------------------
    // Statements

    fn block(&mut self) -> Result<Block> {
        let open = self.expect(TokenKind::OpenBlock)?;
        let stmts = self.stmt_list()?;
        let close = self.expect(TokenKind::CloseBlock)?;
        Ok(Block { open, stmts, close })
    }

    fn stmt_list(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            match self.kind() {
                TokenKind::CloseBlock
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Eof => break,
                TokenKind::StatementEnd => {
                    self.advance();
                }
                _ => {
                    stmts.push(self.stmt()?);
                    self.statement_end()?;
                }
            }
        }
        Ok(stmts)
    }

    fn stmt(&mut self) -> Result<Stmt> {
        match self.kind() {
            TokenKind::Const | TokenKind::Var | TokenKind::Type => {
                Ok(Stmt::Decl(self.gen_decl()?))
            }
            TokenKind::OpenBlock => Ok(Stmt::Block(self.block()?)),
            TokenKind::Return => {
                let pos = self.advance_pos();
                let results = if self.stmt_boundary() {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                Ok(Stmt::Return { pos, results })
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                let op = self.kind();
                let pos = self.advance_pos();
                let label = if op != TokenKind::Fallthrough && self.kind() == TokenKind::Ident {
                    Some(self.ident()?)
                } else {
                    None
                };
                Ok(Stmt::Branch { pos, op, label })
            }
            TokenKind::If => self.if_stmt(),
            TokenKind::For => self.for_stmt(),
            TokenKind::Switch => self.switch_stmt(),
            TokenKind::Go => {
                let pos = self.advance_pos();
                let call = self.expr()?;
                Ok(Stmt::Go { pos, call })
            }
            TokenKind::Defer => {
                let pos = self.advance_pos();
                let call = self.expr()?;
                Ok(Stmt::Defer { pos, call })
            }
            TokenKind::StatementEnd => Ok(Stmt::Empty {
                pos: self.tok().pos,
            }),
            _ => {
                let stmt = self.simple_stmt()?;
                // a single identifier followed by a colon is a label
                if self.kind() == TokenKind::Colon {
                    if let Stmt::Expr(Expr::Ident(label)) = stmt {
                        let colon = self.advance_pos();
                        let inner = if self.stmt_boundary() {
                            Stmt::Empty { pos: colon }
                        } else {
                            self.stmt()?
                        };
                        return Ok(Stmt::Labeled {
                            label,
                            colon,
                            stmt: Box::new(inner),
                        });
                    }
                }
                Ok(stmt)
            }
        }
    }

    /// Expression, assignment or inc/dec statement; no control flow.
    fn simple_stmt(&mut self) -> Result<Stmt> {
        let lhs = self.expr_list()?;
        let kind = self.kind();
        if kind.is_assign_op() {
            let tok_pos = self.advance_pos();
            let rhs = self.expr_list()?;
            return Ok(Stmt::Assign {
                lhs,
                tok_pos,
                op: kind,
                rhs,
            });
        }
        if kind == TokenKind::Inc || kind == TokenKind::Dec {
            let tok_pos = self.advance_pos();
            let mut lhs = lhs;
            if lhs.len() != 1 {
                return Err(ParseError::new("expected one operand", tok_pos));
            }
            return Ok(Stmt::IncDec {
                expr: lhs.remove(0),
                tok_pos,
                op: kind,
            });
        }
        let mut lhs = lhs;
        if lhs.len() != 1 {
            return Err(self.unexpected("assignment"));
        }
        Ok(Stmt::Expr(lhs.remove(0)))
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let pos = self.advance_pos(); // if
        let (init, cond) = self.header()?;
        let body = self.block()?;
        // the scanner terminates the body before an else line; skip it
        if self.kind() == TokenKind::StatementEnd && self.peek_kind(1) == TokenKind::Else {
            self.advance();
        }
        let else_branch = if self.kind() == TokenKind::Else {
            self.advance();
            let branch = if self.kind() == TokenKind::If {
                self.if_stmt()?
            } else {
                Stmt::Block(self.block()?)
            };
            Some(Box::new(branch))
        } else {
            None
        };
        Ok(Stmt::If {
            pos,
            init,
            cond,
            body,
            else_branch,
        })
    }

    /// `[init ;] cond` — the shared if/switch header shape.
    fn header(&mut self) -> Result<(Option<Box<Stmt>>, Expr)> {
        let saved = self.composite_ok;
        self.composite_ok = false;
        let first = self.simple_stmt()?;
        let result = if self.kind() == TokenKind::StatementEnd {
            self.advance();
            let cond = self.expr()?;
            (Some(Box::new(first)), cond)
        } else {
            match first {
                Stmt::Expr(cond) => (None, cond),
                _ => {
                    self.composite_ok = saved;
                    return Err(self.unexpected("condition"));
                }
            }
        };
        self.composite_ok = saved;
        Ok(result)
    }

    fn for_stmt(&mut self) -> Result<Stmt> {
        let pos = self.advance_pos(); // for
        let saved = self.composite_ok;
        self.composite_ok = false;

        let mut init = None;
        let mut cond = None;
        let mut post = None;

        if self.kind() != TokenKind::OpenBlock {
            if self.kind() == TokenKind::StatementEnd {
                // for ; cond ; post
                self.advance();
            } else {
                let first = self.simple_stmt()?;
                if self.kind() == TokenKind::StatementEnd {
                    init = Some(Box::new(first));
                    self.advance();
                } else {
                    // condition-only loop (or a range clause)
                    match first {
                        Stmt::Expr(expr) => cond = Some(expr),
                        other => {
                            // `for i := range xs` has no cond/post
                            init = Some(Box::new(other));
                            self.composite_ok = saved;
                            let body = self.block()?;
                            return Ok(Stmt::For {
                                pos,
                                init,
                                cond: None,
                                post: None,
                                body,
                            });
                        }
                    }
                }
            }
            if init.is_some() {
                if self.kind() != TokenKind::StatementEnd {
                    cond = Some(self.expr()?);
                }
                self.expect(TokenKind::StatementEnd)?;
                if self.kind() != TokenKind::OpenBlock {
                    post = Some(Box::new(self.simple_stmt()?));
                }
            }
        }

        self.composite_ok = saved;
        let body = self.block()?;
        Ok(Stmt::For {
            pos,
            init,
            cond,
            post,
            body,
        })
    }

    fn switch_stmt(&mut self) -> Result<Stmt> {
        let pos = self.advance_pos(); // switch
        let mut init = None;
        let mut tag = None;
        if self.kind() != TokenKind::OpenBlock {
            let saved = self.composite_ok;
            self.composite_ok = false;
            let first = self.simple_stmt()?;
            if self.kind() == TokenKind::StatementEnd {
                self.advance();
                init = Some(Box::new(first));
                if self.kind() != TokenKind::OpenBlock {
                    match self.simple_stmt()? {
                        Stmt::Expr(expr) => tag = Some(expr),
                        _ => {
                            self.composite_ok = saved;
                            return Err(self.unexpected("switch tag"));
                        }
                    }
                }
            } else {
                match first {
                    Stmt::Expr(expr) => tag = Some(expr),
                    _ => {
                        self.composite_ok = saved;
                        return Err(self.unexpected("switch tag"));
                    }
                }
            }
            self.composite_ok = saved;
        }

        let open = self.expect(TokenKind::OpenBlock)?;
        let mut clauses = Vec::new();
        loop {
            match self.kind() {
                TokenKind::StatementEnd => {
                    self.advance();
                }
                TokenKind::Case | TokenKind::Default => clauses.push(self.case_clause()?),
                _ => break,
            }
        }
        let close = self.expect(TokenKind::CloseBlock)?;
        Ok(Stmt::Switch {
            pos,
            init,
            tag,
            body: Block {
                open,
                stmts: clauses,
                close,
            },
        })
    }

    fn case_clause(&mut self) -> Result<Stmt> {
        let is_default = self.kind() == TokenKind::Default;
        let pos = self.advance_pos();
        let values = if is_default { Vec::new() } else { self.expr_list()? };
        let colon = self.expect(TokenKind::Colon)?;
        let body = self.stmt_list()?;
        Ok(Stmt::Case {
            pos,
            values,
            colon,
            body,
        })
    }

    // ------------------------------------------------------------------
    // Expressions

    pub fn expr(&mut self) -> Result<Expr> {
        self.binary_expr(1)
    }

    fn expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut list = vec![self.expr()?];
        while self.kind() == TokenKind::Comma {
            self.advance();
            list.push(self.expr()?);
        }
        Ok(list)
    }

    fn binary_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.unary_expr()?;
        loop {
            let op = self.kind();
            let prec = op.precedence();
            if prec == 0 || prec < min_prec {
                break;
            }
            let op_pos = self.advance_pos();
            let right = self.binary_expr(prec + 1)?;
            left = Expr::Binary {
                left: Box::new(left),
                op_pos,
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Expr> {
        match self.kind() {
            TokenKind::Add
            | TokenKind::Sub
            | TokenKind::Not
            | TokenKind::Xor
            | TokenKind::And
            | TokenKind::Range => {
                let op = self.kind();
                let pos = self.advance_pos();
                let operand = self.unary_expr()?;
                Ok(Expr::Unary {
                    pos,
                    op,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Mul => {
                let star = self.advance_pos();
                let inner = self.unary_expr()?;
                Ok(Expr::Star {
                    star,
                    inner: Box::new(inner),
                })
            }
            _ => self.primary_expr(),
        }
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        let mut expr = self.operand()?;
        loop {
            match self.kind() {
                TokenKind::Period => {
                    self.advance();
                    let sel = self.ident()?;
                    expr = Expr::Selector {
                        receiver: Box::new(expr),
                        sel,
                    };
                }
                TokenKind::LParen => {
                    let lparen = self.advance_pos();
                    let saved = self.composite_ok;
                    self.composite_ok = true;
                    let mut args = Vec::new();
                    while self.kind() != TokenKind::RParen && self.kind() != TokenKind::Eof {
                        args.push(self.expr()?);
                        if self.kind() == TokenKind::Comma {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.composite_ok = saved;
                    let rparen = self.expect(TokenKind::RParen)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        lparen,
                        args,
                        rparen,
                    };
                }
                TokenKind::LBracket => {
                    let lbrack = self.advance_pos();
                    let saved = self.composite_ok;
                    self.composite_ok = true;
                    if self.kind() == TokenKind::Colon {
                        self.advance();
                        let high = if self.kind() != TokenKind::RBracket {
                            Some(Box::new(self.expr()?))
                        } else {
                            None
                        };
                        self.composite_ok = saved;
                        let rbrack = self.expect(TokenKind::RBracket)?;
                        expr = Expr::Slice {
                            receiver: Box::new(expr),
                            lbrack,
                            low: None,
                            high,
                            rbrack,
                        };
                    } else {
                        let index = self.expr()?;
                        if self.kind() == TokenKind::Colon {
                            self.advance();
                            let high = if self.kind() != TokenKind::RBracket {
                                Some(Box::new(self.expr()?))
                            } else {
                                None
                            };
                            self.composite_ok = saved;
                            let rbrack = self.expect(TokenKind::RBracket)?;
                            expr = Expr::Slice {
                                receiver: Box::new(expr),
                                lbrack,
                                low: Some(Box::new(index)),
                                high,
                                rbrack,
                            };
                        } else {
                            self.composite_ok = saved;
                            let rbrack = self.expect(TokenKind::RBracket)?;
                            expr = Expr::Index {
                                receiver: Box::new(expr),
                                lbrack,
                                index: Box::new(index),
                                rbrack,
                            };
                        }
                    }
                }
                TokenKind::OpenBlock if self.composite_ok && is_literal_type(&expr) => {
                    expr = self.composite_body(Some(Box::new(expr)))?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn operand(&mut self) -> Result<Expr> {
        match self.kind() {
            TokenKind::Ident => Ok(Expr::Ident(self.ident()?)),
            TokenKind::Int | TokenKind::Float | TokenKind::Char | TokenKind::Str => {
                let kind = self.kind();
                Ok(Expr::BasicLit(self.basic_lit(kind)?))
            }
            TokenKind::LParen => {
                let lparen = self.advance_pos();
                let saved = self.composite_ok;
                self.composite_ok = true;
                let inner = self.expr()?;
                self.composite_ok = saved;
                let rparen = self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren {
                    lparen,
                    inner: Box::new(inner),
                    rparen,
                })
            }
            TokenKind::Func => {
                let func = self.advance_pos();
                let params = self.field_list()?;
                let results = self.results()?;
                let ty = FuncType {
                    func,
                    params,
                    results,
                };
                if self.kind() == TokenKind::OpenBlock {
                    let saved = self.composite_ok;
                    self.composite_ok = true;
                    let body = self.block()?;
                    self.composite_ok = saved;
                    Ok(Expr::FuncLit { ty, body })
                } else {
                    Ok(Expr::FuncType(ty))
                }
            }
            TokenKind::LBracket | TokenKind::Map | TokenKind::Struct => self.type_expr(),
            TokenKind::OpenBlock if self.composite_ok => self.composite_body(None),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn composite_body(&mut self, ty: Option<Box<Expr>>) -> Result<Expr> {
        let lbrace = self.expect(TokenKind::OpenBlock)?;
        let saved = self.composite_ok;
        self.composite_ok = true;
        let mut elts = Vec::new();
        loop {
            // tolerate terminators synthesized inside multi-line literals
            while self.kind() == TokenKind::StatementEnd {
                self.advance();
            }
            if self.kind() == TokenKind::CloseBlock || self.kind() == TokenKind::Eof {
                break;
            }
            let elt = self.composite_elt()?;
            elts.push(elt);
            if self.kind() == TokenKind::Comma {
                self.advance();
            } else if self.kind() != TokenKind::CloseBlock {
                break;
            }
        }
        self.composite_ok = saved;
        let rbrace = self.expect(TokenKind::CloseBlock)?;
        Ok(Expr::Composite {
            ty,
            lbrace,
            elts,
            rbrace,
        })
    }

    fn composite_elt(&mut self) -> Result<Expr> {
        let key_or_value = if self.kind() == TokenKind::OpenBlock {
            self.composite_body(None)?
        } else {
            self.expr()?
        };
        if self.kind() == TokenKind::Colon {
            let colon = self.advance_pos();
            let value = if self.kind() == TokenKind::OpenBlock {
                self.composite_body(None)?
            } else {
                self.expr()?
            };
            return Ok(Expr::KeyValue {
                key: Box::new(key_or_value),
                colon,
                value: Box::new(value),
            });
        }
        Ok(key_or_value)
    }

    // ------------------------------------------------------------------
    // Plumbing

    fn ident(&mut self) -> Result<Ident> {
        if self.kind() != TokenKind::Ident {
            return Err(self.unexpected("identifier"));
        }
        let tok = self.tok().clone();
        self.advance();
        Ok(Ident {
            pos: tok.pos,
            name: tok.text,
        })
    }

    fn basic_lit(&mut self, kind: TokenKind) -> Result<BasicLit> {
        if self.kind() != kind {
            return Err(self.unexpected(match kind {
                TokenKind::Str => "string literal",
                _ => "literal",
            }));
        }
        let tok = self.tok().clone();
        self.advance();
        Ok(BasicLit {
            pos: tok.pos,
            kind: tok.kind,
            text: tok.text,
        })
    }

    /// Consume a statement terminator. Like the grammar itself, this is
    /// lenient where a terminator is implied by structure: before a
    /// closing delimiter, a case label, or end of input.
    fn statement_end(&mut self) -> Result<()> {
        match self.kind() {
            TokenKind::StatementEnd => {
                self.advance();
                Ok(())
            }
            TokenKind::CloseBlock
            | TokenKind::RParen
            | TokenKind::Case
            | TokenKind::Default
            | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of statement")),
        }
    }

    fn stmt_boundary(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::StatementEnd
                | TokenKind::CloseBlock
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Eof
        )
    }

    fn tok(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.tok().kind
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.current + ahead)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn advance(&mut self) {
        if self.current < self.tokens.len() {
            self.current += 1;
        }
    }

    fn advance_pos(&mut self) -> Pos {
        let pos = self.tok().pos;
        self.advance();
        pos
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Pos> {
        if self.kind() != kind {
            let want = match kind {
                TokenKind::OpenBlock => "block".to_string(),
                TokenKind::CloseBlock => "end of block".to_string(),
                _ => format!("'{}'", kind.text()),
            };
            return Err(self.unexpected(&want));
        }
        Ok(self.advance_pos())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.tok();
        let got = match tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Ident | TokenKind::Int | TokenKind::Float | TokenKind::Char
            | TokenKind::Str => format!("'{}'", tok.text),
            kind => format!("'{}'", kind.text()),
        };
        ParseError::new(format!("expected {}, found {}", expected, got), tok.pos)
    }
}

/// Whether an expression can be the type of a composite literal.
fn is_literal_type(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_)
            | Expr::Selector { .. }
            | Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::StructType { .. }
    )
}
