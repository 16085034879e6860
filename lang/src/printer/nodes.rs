//! The AST walk feeding the printer engine.
//!
//! One walk serves both syntaxes. The differences are confined to block
//! boundaries (braces vs. indentation), statement terminators, and where
//! alignment tabs are worth emitting; everything else is identical
//! token-level output.

use super::*;
use crate::parser::ast::*;
use crate::scanner::TokenKind as T;

impl Printer<'_> {
    // ------------------------------------------------------------------
    // Files and declarations

    pub(super) fn file(&mut self, file: &File) {
        if !file.package.is_valid() && file.decls.is_empty() {
            // empty or comments-only file; comments drain at eof
            return;
        }
        self.tok(T::Package, file.package);
        self.blank();
        self.ident(&file.name);
        self.decl_list(&file.decls);
        self.ws(Ws::Newline);
    }

    pub(super) fn decl_list(&mut self, decls: &[Decl]) {
        for decl in decls {
            let line = self.line_for(decl.pos());
            if !self.output.is_empty() || !self.wsbuf.is_empty() {
                self.linebreak(line, 1, false);
            }
            self.decl(decl);
        }
    }

    pub(super) fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Gen {
                pos,
                tok,
                lparen,
                specs,
                rparen,
            } => self.gen_decl(*pos, *tok, *lparen, specs, *rparen),
            Decl::Func {
                pos,
                recv,
                name,
                ty,
                body,
            } => {
                self.tok(T::Func, *pos);
                self.blank();
                if let Some(recv) = recv {
                    self.paren_fields(recv);
                    self.blank();
                }
                self.ident(name);
                self.signature(ty);
                if let Some(body) = body {
                    self.blank();
                    self.block(body, 1);
                }
            }
        }
    }

    fn gen_decl(&mut self, pos: Pos, tok: T, lparen: Pos, specs: &[Spec], rparen: Pos) {
        self.tok(tok, pos);
        self.blank();
        if lparen.is_valid() {
            self.tok(T::LParen, lparen);
            self.expr_depth += 1;
            if !specs.is_empty() {
                self.ws(Ws::Indent);
                self.ws(Ws::Formfeed);
                for (i, spec) in specs.iter().enumerate() {
                    if i > 0 {
                        let line = self.line_for(spec.pos());
                        self.linebreak(line, 1, false);
                    }
                    self.spec(spec);
                }
                self.ws(Ws::Unindent);
                self.ws(Ws::Formfeed);
            }
            self.expr_depth -= 1;
            self.tok(T::RParen, rparen);
        } else if let Some(spec) = specs.first() {
            self.spec(spec);
        }
    }

    fn spec(&mut self, spec: &Spec) {
        match spec {
            Spec::Import { name, path } => {
                if let Some(name) = name {
                    self.ident(name);
                    self.blank();
                }
                self.lit(path);
            }
            Spec::Value { names, ty, values } => {
                self.ident_list(names);
                if let Some(ty) = ty {
                    self.pad();
                    self.expr(ty);
                }
                if !values.is_empty() {
                    self.pad();
                    self.tok(T::Assign, Pos::NONE);
                    self.blank();
                    self.expr_list(values);
                }
            }
            Spec::Type { name, ty } => {
                self.ident(name);
                self.pad();
                self.expr(ty);
            }
        }
    }

    fn signature(&mut self, ty: &FuncType) {
        if ty.func.is_valid() {
            self.tok(T::Func, ty.func);
        }
        self.paren_fields(&ty.params);
        if let Some(results) = &ty.results {
            self.blank();
            if results.opening.is_valid() {
                self.paren_fields(results);
            } else if let Some(field) = results.fields.first() {
                self.expr(&field.ty);
            }
        }
    }

    fn paren_fields(&mut self, list: &FieldList) {
        self.tok(T::LParen, list.opening);
        self.expr_depth += 1;
        for (i, field) in list.fields.iter().enumerate() {
            if i > 0 {
                self.tok(T::Comma, Pos::NONE);
                self.blank();
            }
            if !field.names.is_empty() {
                self.ident_list(&field.names);
                self.blank();
            }
            self.expr(&field.ty);
        }
        self.expr_depth -= 1;
        self.tok(T::RParen, list.closing);
    }

    fn ident_list(&mut self, names: &[Ident]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.tok(T::Comma, Pos::NONE);
                self.blank();
            }
            self.ident(name);
        }
    }

    // ------------------------------------------------------------------
    // Statements

    /// A braced or indented block. Inside bracketed expressions and in
    /// curly output the braces are literal; otherwise indented output
    /// renders single-line (and empty) blocks with their braces and
    /// everything else by indentation alone.
    pub(super) fn block(&mut self, block: &Block, nindent: usize) {
        if self.syntax == Syntax::Curly || self.expr_depth > 0 {
            self.tok(T::OpenBlock, block.open);
            self.stmt_list(&block.stmts, nindent);
            let line = self.line_for(block.close);
            self.linebreak(line, 1, true);
            self.tok(T::CloseBlock, block.close);
            return;
        }

        let single_line = self.line_for(block.open) == self.line_for(block.close);
        if block.stmts.is_empty() || single_line {
            self.tok(T::OpenBlock, block.open);
            for (i, stmt) in block.stmts.iter().enumerate() {
                if i > 0 {
                    self.tok(T::StatementEnd, Pos::NONE);
                }
                self.blank();
                self.stmt(stmt, false);
            }
            if !block.stmts.is_empty() {
                self.blank();
            }
            self.tok(T::CloseBlock, block.close);
            return;
        }

        // offside form: the braces disappear and the body indents
        self.set_pos(block.open);
        self.stmt_list(&block.stmts, nindent);
        self.set_pos(block.close);
    }

    pub(super) fn stmt_list(&mut self, stmts: &[Stmt], nindent: usize) {
        if nindent > 0 {
            self.ws(Ws::Indent);
        }
        let mut i = 0;
        for stmt in stmts {
            if matches!(stmt, Stmt::Empty { .. }) {
                continue;
            }
            if i > 0 && self.syntax == Syntax::Curly && self.config.raw_format {
                self.tok(T::StatementEnd, Pos::NONE);
            }
            let line = self.line_for(stmt.pos());
            if !self.output.is_empty() || !self.wsbuf.is_empty() {
                self.linebreak(line, 1, i == 0);
            }
            self.stmt(stmt, false);
            i += 1;
        }
        if nindent > 0 {
            self.ws(Ws::Unindent);
        }
    }

    pub(super) fn stmt(&mut self, stmt: &Stmt, next_is_close: bool) {
        match stmt {
            Stmt::Decl(decl) => self.decl(decl),
            Stmt::Empty { .. } => {}
            Stmt::Labeled { label, colon, stmt } => self.labeled(label, *colon, stmt, next_is_close),
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::IncDec { expr, tok_pos, op } => {
                self.expr(expr);
                self.tok(*op, *tok_pos);
            }
            Stmt::Assign {
                lhs,
                tok_pos,
                op,
                rhs,
            } => {
                self.expr_list(lhs);
                self.blank();
                self.tok(*op, *tok_pos);
                self.blank();
                self.expr_list(rhs);
            }
            Stmt::Return { pos, results } => {
                self.tok(T::Return, *pos);
                if !results.is_empty() {
                    self.blank();
                    self.expr_list(results);
                }
            }
            Stmt::Branch { pos, op, label } => {
                self.tok(*op, *pos);
                if let Some(label) = label {
                    self.blank();
                    self.ident(label);
                }
            }
            Stmt::Block(block) => self.block(block, 1),
            Stmt::If {
                pos,
                init,
                cond,
                body,
                else_branch,
            } => {
                self.tok(T::If, *pos);
                self.control_clause(false, init.as_deref(), Some(cond), None);
                self.block(body, 1);
                if let Some(else_branch) = else_branch {
                    match self.syntax {
                        Syntax::Curly => self.blank(),
                        Syntax::Indented => {
                            if self.expr_depth > 0 {
                                self.blank();
                            } else {
                                self.ws(Ws::Newline);
                            }
                        }
                    }
                    self.tok(T::Else, Pos::NONE);
                    match else_branch.as_ref() {
                        stmt @ Stmt::If { .. } => {
                            self.blank();
                            self.stmt(stmt, next_is_close);
                        }
                        Stmt::Block(block) => {
                            self.blank();
                            self.block(block, 1);
                        }
                        other => {
                            // not strictly legal; print it anyway
                            self.blank();
                            self.stmt(other, next_is_close);
                        }
                    }
                }
            }
            Stmt::Switch {
                pos,
                init,
                tag,
                body,
            } => {
                self.tok(T::Switch, *pos);
                if init.is_some() || tag.is_some() {
                    self.control_clause(false, init.as_deref(), tag.as_ref(), None);
                } else {
                    self.blank();
                }
                let nindent = match self.syntax {
                    Syntax::Curly => 0,
                    Syntax::Indented => 1,
                };
                self.case_block(body, nindent);
            }
            Stmt::Case {
                pos,
                values,
                colon,
                body,
            } => {
                if values.is_empty() {
                    self.tok(T::Default, *pos);
                } else {
                    self.tok(T::Case, *pos);
                    self.blank();
                    self.expr_list(values);
                }
                self.tok(T::Colon, *colon);
                self.stmt_list(body, 1);
            }
            Stmt::For {
                pos,
                init,
                cond,
                post,
                body,
            } => {
                self.tok(T::For, *pos);
                if is_range_clause(init.as_deref(), cond.as_ref(), post.as_deref()) {
                    self.blank();
                    if let Some(init) = init {
                        self.stmt(init, false);
                    }
                    self.blank();
                } else if init.is_some() || cond.is_some() || post.is_some() {
                    self.control_clause(true, init.as_deref(), cond.as_ref(), post.as_deref());
                } else {
                    self.blank();
                }
                self.block(body, 1);
            }
            Stmt::Go { pos, call } => {
                self.tok(T::Go, *pos);
                self.blank();
                self.expr(call);
            }
            Stmt::Defer { pos, call } => {
                self.tok(T::Defer, *pos);
                self.blank();
                self.expr(call);
            }
        }
    }

    fn labeled(&mut self, label: &Ident, colon: Pos, stmt: &Stmt, next_is_close: bool) {
        match self.syntax {
            Syntax::Curly => {
                // Un-indent to position the label; the whitespace buffer
                // swaps the preceding line break with this unindent so
                // the label lands at the outer column.
                self.ws(Ws::Unindent);
                self.ident(label);
                self.tok(T::Colon, colon);
                self.ws(Ws::Indent);
                if let Stmt::Empty { pos } = stmt {
                    if !next_is_close {
                        self.ws(Ws::Newline);
                        self.tok(T::StatementEnd, *pos);
                    }
                    return;
                }
                let line = self.line_for(stmt.pos());
                self.linebreak(line, 1, true);
                self.stmt(stmt, next_is_close);
            }
            Syntax::Indented => {
                // A trailing colon records a soft indentation level, so
                // the labeled statement sits one level deeper.
                self.ident(label);
                self.tok(T::Colon, colon);
                if matches!(stmt, Stmt::Empty { .. }) {
                    return;
                }
                self.ws(Ws::Indent);
                let line = self.line_for(stmt.pos());
                self.linebreak(line, 1, false);
                self.stmt(stmt, next_is_close);
                self.ws(Ws::Unindent);
            }
        }
    }

    /// The `[init ;] cond [; post]` clause of if, switch and for.
    fn control_clause(
        &mut self,
        is_for: bool,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
    ) {
        self.blank();
        let mut needs_blank = false;
        if init.is_none() && post.is_none() {
            if let Some(cond) = cond {
                self.expr(cond);
                needs_blank = true;
            }
        } else {
            if let Some(init) = init {
                self.stmt(init, false);
            }
            self.tok(T::StatementEnd, Pos::NONE);
            self.blank();
            if let Some(cond) = cond {
                self.expr(cond);
                needs_blank = true;
            }
            if is_for {
                self.tok(T::StatementEnd, Pos::NONE);
                self.blank();
                needs_blank = false;
                if let Some(post) = post {
                    self.stmt(post, false);
                    needs_blank = true;
                }
            }
        }
        if needs_blank {
            self.blank();
        }
    }

    /// A switch body: case clauses at `nindent` relative to the switch.
    fn case_block(&mut self, body: &Block, nindent: usize) {
        match self.syntax {
            Syntax::Curly => {
                self.tok(T::OpenBlock, body.open);
            }
            Syntax::Indented => {
                self.set_pos(body.open);
            }
        }
        self.stmt_list(&body.stmts, nindent);
        match self.syntax {
            Syntax::Curly => {
                let line = self.line_for(body.close);
                self.linebreak(line, 1, true);
                self.tok(T::CloseBlock, body.close);
            }
            Syntax::Indented => {
                self.set_pos(body.close);
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions

    pub(super) fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(id) => self.ident(id),
            Expr::BasicLit(lit) => self.lit(lit),
            Expr::Unary { pos, op, operand } => {
                self.tok(*op, *pos);
                if *op == T::Range {
                    self.blank();
                }
                self.expr(operand);
            }
            Expr::Binary {
                left,
                op_pos,
                op,
                right,
            } => {
                self.expr(left);
                self.blank();
                self.tok(*op, *op_pos);
                self.blank();
                self.expr(right);
            }
            Expr::Paren {
                lparen,
                inner,
                rparen,
            } => {
                self.tok(T::LParen, *lparen);
                self.expr_depth += 1;
                self.expr(inner);
                self.expr_depth -= 1;
                self.tok(T::RParen, *rparen);
            }
            Expr::Selector { receiver, sel } => {
                self.expr(receiver);
                self.tok(T::Period, Pos::NONE);
                self.ident(sel);
            }
            Expr::Index {
                receiver,
                lbrack,
                index,
                rbrack,
            } => {
                self.expr(receiver);
                self.tok(T::LBracket, *lbrack);
                self.expr_depth += 1;
                self.expr(index);
                self.expr_depth -= 1;
                self.tok(T::RBracket, *rbrack);
            }
            Expr::Slice {
                receiver,
                lbrack,
                low,
                high,
                rbrack,
            } => {
                self.expr(receiver);
                self.tok(T::LBracket, *lbrack);
                self.expr_depth += 1;
                if let Some(low) = low {
                    self.expr(low);
                }
                self.tok(T::Colon, Pos::NONE);
                if let Some(high) = high {
                    self.expr(high);
                }
                self.expr_depth -= 1;
                self.tok(T::RBracket, *rbrack);
            }
            Expr::Call {
                func,
                lparen,
                args,
                rparen,
            } => {
                self.expr(func);
                self.tok(T::LParen, *lparen);
                self.expr_depth += 1;
                self.expr_list(args);
                self.expr_depth -= 1;
                self.tok(T::RParen, *rparen);
            }
            Expr::Composite {
                ty,
                lbrace,
                elts,
                rbrace,
            } => {
                if let Some(ty) = ty {
                    self.expr(ty);
                }
                self.tok(T::OpenBlock, *lbrace);
                self.expr_depth += 1;
                let multiline = self.line_for(*lbrace) != self.line_for(*rbrace);
                if multiline && !elts.is_empty() {
                    self.ws(Ws::Indent);
                    for (i, elt) in elts.iter().enumerate() {
                        let line = self.line_for(elt.pos());
                        self.linebreak(line, 1, i == 0);
                        self.expr(elt);
                        // the trailing comma keeps every line a
                        // continuation when read back
                        self.tok(T::Comma, Pos::NONE);
                    }
                    self.ws(Ws::Unindent);
                    let line = self.line_for(*rbrace);
                    self.linebreak(line, 1, false);
                } else {
                    self.expr_list(elts);
                }
                self.expr_depth -= 1;
                self.tok(T::CloseBlock, *rbrace);
            }
            Expr::KeyValue { key, colon, value } => {
                self.expr(key);
                self.tok(T::Colon, *colon);
                self.blank();
                self.expr(value);
            }
            Expr::Star { star, inner } => {
                self.tok(T::Mul, *star);
                self.expr(inner);
            }
            Expr::FuncLit { ty, body } => {
                self.signature(ty);
                self.blank();
                self.block(body, 1);
            }
            Expr::ArrayType { lbrack, len, elem } => {
                self.tok(T::LBracket, *lbrack);
                if let Some(len) = len {
                    self.expr_depth += 1;
                    self.expr(len);
                    self.expr_depth -= 1;
                }
                self.tok(T::RBracket, Pos::NONE);
                self.expr(elem);
            }
            Expr::MapType { pos, key, value } => {
                self.tok(T::Map, *pos);
                self.tok(T::LBracket, Pos::NONE);
                self.expr_depth += 1;
                self.expr(key);
                self.expr_depth -= 1;
                self.tok(T::RBracket, Pos::NONE);
                self.expr(value);
            }
            Expr::FuncType(ty) => self.signature(ty),
            Expr::StructType { pos, fields } => self.struct_type(*pos, fields),
        }
    }

    pub(super) fn expr_list(&mut self, list: &[Expr]) {
        for (i, expr) in list.iter().enumerate() {
            if i > 0 {
                self.tok(T::Comma, Pos::NONE);
                self.blank();
            }
            self.expr(expr);
        }
    }

    fn struct_type(&mut self, pos: Pos, fields: &FieldList) {
        self.tok(T::Struct, pos);
        let offside = self.syntax == Syntax::Indented
            && self.expr_depth == 0
            && !fields.fields.is_empty()
            && self.line_for(fields.opening) != self.line_for(fields.closing);
        if offside {
            self.set_pos(fields.opening);
            self.ws(Ws::Indent);
            for (i, field) in fields.fields.iter().enumerate() {
                let line = self.line_for(field.pos());
                self.linebreak(line, 1, i == 0);
                self.struct_field(field);
            }
            self.ws(Ws::Unindent);
            self.set_pos(fields.closing);
            return;
        }

        if fields.fields.is_empty() {
            self.tok(T::OpenBlock, fields.opening);
            self.tok(T::CloseBlock, fields.closing);
            return;
        }

        let single_line = self.line_for(fields.opening) == self.line_for(fields.closing);
        self.tok(T::OpenBlock, fields.opening);
        self.expr_depth += 1;
        if single_line {
            for (i, field) in fields.fields.iter().enumerate() {
                if i > 0 {
                    self.tok(T::StatementEnd, Pos::NONE);
                }
                self.blank();
                if !field.names.is_empty() {
                    self.ident_list(&field.names);
                    self.blank();
                }
                self.expr(&field.ty);
            }
            self.blank();
        } else {
            self.ws(Ws::Indent);
            for (i, field) in fields.fields.iter().enumerate() {
                let line = self.line_for(field.pos());
                self.linebreak(line, 1, i == 0);
                self.struct_field(field);
            }
            self.ws(Ws::Unindent);
            let line = self.line_for(fields.closing);
            self.linebreak(line, 1, false);
        }
        self.expr_depth -= 1;
        self.tok(T::CloseBlock, fields.closing);
    }

    fn struct_field(&mut self, field: &Field) {
        if !field.names.is_empty() {
            self.ident_list(&field.names);
            self.pad();
        }
        self.expr(&field.ty);
    }

    /// Alignment separator: a tabwriter cell boundary in curly output, a
    /// plain blank where no column alignment happens.
    fn pad(&mut self) {
        match self.syntax {
            Syntax::Curly => self.ws(Ws::Vtab),
            Syntax::Indented => self.blank(),
        }
    }
}

fn is_range_clause(init: Option<&Stmt>, cond: Option<&Expr>, post: Option<&Stmt>) -> bool {
    if cond.is_some() || post.is_some() {
        return false;
    }
    match init {
        Some(Stmt::Assign { rhs, .. }) => {
            matches!(rhs.first(), Some(Expr::Unary { op: T::Range, .. }))
        }
        _ => false,
    }
}
