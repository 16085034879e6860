//! Rendering ASTs back to source text.
//!
//! One engine serves both surface syntaxes. Whitespace is not written
//! eagerly: blanks, newlines and indentation changes queue up in a small
//! typed buffer and are only flushed when a real token arrives, which lets
//! the printer weigh pending comments against pending whitespace and place
//! each comment where it sat in the source. Output is routed through a
//! trimmer (and, for aligned curly output, the elastic tabstop writer) so
//! no line carries trailing whitespace.

mod nodes;

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::{self, Write};

use crate::parser::ast::{self, Comment};
use crate::position::{FileSet, Pos, Position};
use crate::scanner::TokenKind;
use crate::tabwriter::TabWriter;

/// Bytes bracketing literal regions that must pass through the tabwriter
/// and trimmer unchanged. The value never occurs in valid UTF-8.
pub const ESCAPE: u8 = 0xFF;

const MAX_NEWLINES: usize = 2;
const INFINITY: usize = 1 << 30;

/// Which surface syntax to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Curly,
    Indented,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Bypass the elastic tabstop writer.
    pub raw_format: bool,
    /// Indent with tabs independent of `use_spaces`.
    pub tab_indent: bool,
    /// Align with spaces instead of tabs.
    pub use_spaces: bool,
    /// Emit `//line` comments so positions survive reformatting.
    pub source_pos: bool,
    pub tabwidth: usize,
    /// Extra indentation applied to every line.
    pub indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            raw_format: false,
            tab_indent: false,
            use_spaces: false,
            source_pos: false,
            tabwidth: 8,
            indent: 0,
        }
    }
}

#[derive(Debug)]
pub enum EmitError {
    /// An invariant of the printer was violated; the AST is not one the
    /// printer supports or indentation underflowed.
    Internal(String),
    Io(io::Error),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitError::Internal(message) => write!(f, "printer: {}", message),
            EmitError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for EmitError {}

impl From<io::Error> for EmitError {
    fn from(err: io::Error) -> Self {
        EmitError::Io(err)
    }
}

/// What to print: a whole file or any single element of one.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    File(&'a ast::File),
    Decls(&'a [ast::Decl]),
    Stmts(&'a [ast::Stmt]),
    Decl(&'a ast::Decl),
    Stmt(&'a ast::Stmt),
    Expr(&'a ast::Expr),
}

/// Render `node` in the given syntax, writing the result to `out`.
pub fn emit<'a>(
    out: &mut dyn Write,
    fset: &'a FileSet,
    node: Node<'a>,
    config: &'a Config,
    syntax: Syntax,
) -> Result<(), EmitError> {
    let mut printer = Printer::new(config, syntax, fset);
    printer.print_node(node);
    // end of input acts like a newline
    printer.implied_term = false;
    let eof = Position {
        filename: String::new(),
        offset: INFINITY,
        line: INFINITY,
        column: 0,
    };
    printer.flush(&eof, TokenKind::Eof);

    if printer.underflow {
        return Err(EmitError::Internal(
            "negative indentation".to_string(),
        ));
    }

    let use_tabwriter = syntax == Syntax::Curly && !config.raw_format;
    let mut trimmer = Trimmer::new(out);
    if use_tabwriter {
        let minwidth = if config.tab_indent { 0 } else { config.tabwidth };
        let padchar = if config.use_spaces { b' ' } else { b'\t' };
        let mut tw = TabWriter::new(&mut trimmer, minwidth, config.tabwidth, 1, padchar);
        tw.write_all(&printer.output)?;
        tw.flush()?;
    } else {
        trimmer.write_all(&printer.output)?;
        trimmer.flush()?;
    }
    Ok(())
}

/// Whitespace queued between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ws {
    Blank,
    Vtab,
    Newline,
    Formfeed,
    Indent,
    Unindent,
    /// A slot neutralized in place; never pushed deliberately.
    Ignore,
}

impl Ws {
    fn byte(self) -> u8 {
        match self {
            Ws::Blank => b' ',
            Ws::Vtab => b'\x0B',
            Ws::Newline => b'\n',
            Ws::Formfeed => b'\x0C',
            Ws::Indent | Ws::Unindent | Ws::Ignore => 0,
        }
    }
}

struct Printer<'a> {
    config: &'a Config,
    syntax: Syntax,
    fset: &'a FileSet,

    output: Vec<u8>,
    indent: usize,
    /// Suppress the extra line break otherwise kept before a closing brace.
    no_extra_linebreak: bool,
    /// A line break here would be read back as a statement terminator.
    implied_term: bool,
    /// Last token printed; `Eof` right after whitespace.
    last_kind: TokenKind,
    wsbuf: Vec<Ws>,

    /// Position in AST (source) space.
    pos: Position,
    /// Position in output space.
    out: Position,
    /// Value of `pos` after the last `write_string`.
    last: Position,

    comments: &'a [ast::CommentGroup],
    cindex: usize,
    /// Offset of the current group's first comment, or `INFINITY`.
    comment_offset: usize,
    /// Whether the current group's interior spans newlines.
    comment_newline: bool,

    cached_pos: Pos,
    cached_line: usize,

    /// Nesting depth of bracketed expression context. In indented output,
    /// blocks inside brackets keep their literal braces because block
    /// structure cannot cross a bracketed expression.
    expr_depth: usize,

    underflow: bool,
}

impl<'a> Printer<'a> {
    fn new(config: &'a Config, syntax: Syntax, fset: &'a FileSet) -> Printer<'a> {
        Printer {
            config,
            syntax,
            fset,
            output: Vec::new(),
            indent: 0,
            no_extra_linebreak: false,
            implied_term: false,
            last_kind: TokenKind::Eof,
            wsbuf: Vec::with_capacity(16),
            pos: Position {
                filename: String::new(),
                offset: 0,
                line: 1,
                column: 1,
            },
            out: Position {
                filename: String::new(),
                offset: 0,
                line: 1,
                column: 1,
            },
            last: Position::invalid(),
            comments: &[],
            cindex: 0,
            comment_offset: INFINITY,
            comment_newline: false,
            cached_pos: Pos::NONE,
            cached_line: 0,
            expr_depth: 0,
            underflow: false,
        }
    }

    fn print_node(&mut self, node: Node<'a>) {
        if let Node::File(file) = node {
            self.comments = &file.comments;
        }
        self.next_comment();

        match node {
            Node::File(file) => self.file(file),
            Node::Decls(decls) => self.decl_list(decls),
            Node::Stmts(stmts) => {
                // a label un-indents; start at 1 so it cannot underflow
                if stmts.iter().any(|s| matches!(s, ast::Stmt::Labeled { .. })) {
                    self.indent = 1;
                }
                self.stmt_list(stmts, 0);
            }
            Node::Decl(decl) => self.decl(decl),
            Node::Stmt(stmt) => {
                if matches!(stmt, ast::Stmt::Labeled { .. }) {
                    self.indent = 1;
                }
                self.stmt(stmt, false);
            }
            Node::Expr(expr) => self.expr(expr),
        }
    }

    // ------------------------------------------------------------------
    // Position helpers

    fn pos_for(&self, pos: Pos) -> Position {
        self.fset.position(pos)
    }

    fn line_for(&mut self, pos: Pos) -> usize {
        if pos != self.cached_pos {
            self.cached_pos = pos;
            self.cached_line = self.fset.line(pos);
        }
        self.cached_line
    }

    // ------------------------------------------------------------------
    // Comment bookkeeping

    fn comment_group(&self) -> Option<&'a ast::CommentGroup> {
        let comments = self.comments;
        comments.get(self.cindex.wrapping_sub(1))
    }

    fn next_comment(&mut self) {
        let comments = self.comments;
        while self.cindex < comments.len() {
            let group = &comments[self.cindex];
            self.cindex += 1;
            if !group.list.is_empty() {
                self.comment_offset = self.pos_for(group.pos()).offset;
                self.comment_newline = self.comments_have_newline(&group.list);
                return;
            }
        }
        self.comment_offset = INFINITY;
    }

    fn comments_have_newline(&mut self, list: &[Comment]) -> bool {
        let line = self.line_for(list[0].pos);
        for (i, c) in list.iter().enumerate() {
            if i > 0 && self.line_for(c.pos) != line {
                return true;
            }
            let t = &c.text;
            if t.len() >= 2 && (t.as_bytes()[1] == b'/' || t.contains('\n')) {
                return true;
            }
        }
        false
    }

    fn comment_before(&self, next: &Position) -> bool {
        self.comment_offset < next.offset && (!self.implied_term || !self.comment_newline)
    }

    // ------------------------------------------------------------------
    // Low-level writing

    /// Emit a `//line` comment if necessary, then indentation.
    fn at_line_begin(&mut self, pos: &Position) {
        if self.config.source_pos
            && pos.is_valid()
            && (self.out.line != pos.line || self.out.filename != pos.filename)
        {
            self.output.push(ESCAPE); // protect '\n' from the tabwriter
            self.output
                .extend_from_slice(format!("//line {}:{}\n", pos.filename, pos.line).as_bytes());
            self.output.push(ESCAPE);
            self.out.filename = pos.filename.clone();
            self.out.line = pos.line;
        }

        // hard tabs - indentation must not be rewritten by the tabwriter
        let n = self.config.indent + self.indent;
        for _ in 0..n {
            self.output.push(b'\t');
        }

        self.pos.offset += n;
        self.pos.column += n;
        self.out.column += n;
    }

    fn write_byte(&mut self, ch: u8, n: usize) {
        if self.out.column == 1 {
            let pos = self.pos.clone();
            self.at_line_begin(&pos);
        }

        for _ in 0..n {
            self.output.push(ch);
        }

        self.pos.offset += n;
        if ch == b'\n' || ch == b'\x0C' {
            self.pos.line += n;
            self.out.line += n;
            self.pos.column = 1;
            self.out.column = 1;
            return;
        }
        self.pos.column += n;
        self.out.column += n;
    }

    /// Write token, literal or comment text and track both position
    /// spaces. `is_lit` brackets the text in escape sentinels so the
    /// tabwriter leaves it alone.
    fn write_string(&mut self, pos: &Position, s: &str, is_lit: bool) {
        if self.out.column == 1 {
            let begin = if pos.is_valid() {
                pos.clone()
            } else {
                self.pos.clone()
            };
            self.at_line_begin(&begin);
        }

        if pos.is_valid() {
            self.pos = pos.clone();
        }

        if is_lit {
            self.output.push(ESCAPE);
        }
        self.output.extend_from_slice(s.as_bytes());

        let mut nlines = 0;
        let mut last_nl = 0;
        for (i, b) in s.bytes().enumerate() {
            if b == b'\n' {
                nlines += 1;
                last_nl = i;
            }
        }
        self.pos.offset += s.len();
        if nlines > 0 {
            self.pos.line += nlines;
            self.out.line += nlines;
            let column = s.len() - last_nl;
            self.pos.column = column;
            self.out.column = column;
        } else {
            self.pos.column += s.len();
            self.out.column += s.len();
        }

        if is_lit {
            self.output.push(ESCAPE);
        }

        self.last = self.pos.clone();
    }

    // ------------------------------------------------------------------
    // Comment interleaving

    /// Write the whitespace before a comment, consuming as much of the
    /// pending buffer as helps position the comment nicely.
    fn write_comment_prefix(
        &mut self,
        pos: &Position,
        next: &Position,
        first_of_group: bool,
        tok: TokenKind,
    ) {
        if self.output.is_empty() {
            // the comment is the first thing printed
            return;
        }

        if pos.is_valid() && pos.filename != self.last.filename {
            self.write_byte(b'\x0C', MAX_NEWLINES);
            return;
        }

        if pos.line == self.last.line && first_of_group {
            // comment on the same line as the last item
            let mut has_sep = false;
            let mut j = 0;
            for i in 0..self.wsbuf.len() {
                match self.wsbuf[i] {
                    Ws::Blank => {
                        self.wsbuf[i] = Ws::Ignore;
                        continue;
                    }
                    Ws::Vtab => {
                        // respect existing alignment tabs
                        has_sep = true;
                        continue;
                    }
                    Ws::Indent => continue,
                    _ => {}
                }
                j = i;
                break;
            }
            self.write_whitespace(j);
            if !has_sep {
                let sep = if pos.line == next.line { b' ' } else { b'\t' };
                self.write_byte(sep, 1);
            }
        } else {
            // comment on a different line: at least one line break
            let mut dropped_linebreak = false;
            let mut j = 0;
            for i in 0..self.wsbuf.len() {
                match self.wsbuf[i] {
                    Ws::Blank | Ws::Vtab => {
                        self.wsbuf[i] = Ws::Ignore;
                        continue;
                    }
                    Ws::Indent => continue,
                    Ws::Unindent => {
                        // a non-final unindent belongs to the previous
                        // construct; apply it
                        if i + 1 < self.wsbuf.len() && self.wsbuf[i + 1] == Ws::Unindent {
                            continue;
                        }
                        // apply the final unindent only if the comment
                        // lines up with the next token and that token does
                        // not close a block (case-label comments belong to
                        // the next case, not the current one)
                        if tok != TokenKind::CloseBlock && pos.column == next.column {
                            continue;
                        }
                    }
                    Ws::Newline | Ws::Formfeed => {
                        self.wsbuf[i] = Ws::Ignore;
                        dropped_linebreak = first_of_group;
                    }
                    Ws::Ignore => {}
                }
                j = i;
                break;
            }
            self.write_whitespace(j);

            let mut n = 0;
            if pos.is_valid() && self.last.is_valid() {
                n = pos.line.saturating_sub(self.last.line);
            }
            // preserve a blank line before package-scope comments
            if self.indent == 0 && dropped_linebreak {
                n += 1;
            }
            if n == 0 && !first_of_group {
                n = 1;
            }
            if n > 0 {
                self.write_byte(b'\x0C', nlimit(n));
            }
        }
    }

    /// Write one comment, rewriting the sigil for the indented syntax and
    /// honoring `//line` directives.
    fn write_comment(&mut self, comment: &Comment) {
        let text = &comment.text;
        let pos = self.pos_for(comment.pos);

        let mut directive: Option<(String, usize)> = None;
        const LINE_PREFIX: &str = "//line ";
        if text.starts_with(LINE_PREFIX) && (!pos.is_valid() || pos.column == 1) {
            let ldir = text[LINE_PREFIX.len()..].trim();
            if let Some(i) = ldir.rfind(':') {
                if let Ok(line) = ldir[i + 1..].parse::<usize>() {
                    if line > 0 {
                        directive = Some((ldir[..i].to_string(), line));
                    }
                }
            }
        }
        let saved_indent = self.indent;
        if directive.is_some() {
            self.indent = 0;
        }

        match self.syntax {
            Syntax::Curly => {
                if let Some(body) = text.strip_prefix("//") {
                    let line = format!("//{}", trim_right(body));
                    self.write_string(&pos, &line, true);
                } else {
                    // block comments from curly sources pass through
                    // verbatim
                    self.write_string(&pos, text, true);
                }
            }
            Syntax::Indented => {
                if let Some(body) = text.strip_prefix("//") {
                    let line = format!("#{}", trim_right(body));
                    self.write_string(&pos, &line, true);
                } else {
                    // block comments do not exist in indented form;
                    // rewrite as one sigil line per source line
                    let inner = text
                        .strip_prefix("/*")
                        .and_then(|t| t.strip_suffix("*/"))
                        .unwrap_or(text);
                    for (i, line) in inner.lines().enumerate() {
                        if i > 0 {
                            self.write_byte(b'\n', 1);
                        }
                        let line = format!("#{}", trim_right(line.trim_start_matches('\t')));
                        let at = if i == 0 { pos.clone() } else { Position::invalid() };
                        self.write_string(&at, &line, true);
                    }
                }
            }
        }

        if let Some((filename, line)) = directive {
            self.pos.filename = filename;
            self.pos.line = line;
            self.pos.column = 1;
            self.indent = saved_indent;
        }
    }

    /// Write a line break after a comment if indicated, processing any
    /// leftover whitespace. Reports whether a newline was written and
    /// whether a formfeed was dropped from the buffer.
    fn write_comment_suffix(&mut self, mut needs_linebreak: bool) -> (bool, bool) {
        let mut wrote_newline = false;
        let mut dropped_ff = false;
        for i in 0..self.wsbuf.len() {
            match self.wsbuf[i] {
                Ws::Blank | Ws::Vtab => self.wsbuf[i] = Ws::Ignore,
                Ws::Indent | Ws::Unindent => {}
                Ws::Newline | Ws::Formfeed => {
                    if needs_linebreak {
                        needs_linebreak = false;
                        wrote_newline = true;
                    } else {
                        if self.wsbuf[i] == Ws::Formfeed {
                            dropped_ff = true;
                        }
                        self.wsbuf[i] = Ws::Ignore;
                    }
                }
                Ws::Ignore => {}
            }
        }
        self.write_whitespace(self.wsbuf.len());

        if needs_linebreak {
            self.write_byte(b'\n', 1);
            wrote_newline = true;
        }

        (wrote_newline, dropped_ff)
    }

    /// Consume all comments before the next token and print them together
    /// with the buffered whitespace.
    fn intersperse_comments(&mut self, next: &Position, tok: TokenKind) -> (bool, bool) {
        let mut last: Option<Comment> = None;
        while self.comment_before(next) {
            let group = match self.comment_group() {
                Some(group) => group.clone(),
                None => break,
            };
            for c in &group.list {
                if self.syntax == Syntax::Curly && tok == TokenKind::OpenBlock {
                    // a line comment here would push `{` onto its own
                    // line and change the token stream; inline it
                    self.write_inline_comment(c);
                } else {
                    let pos = self.pos_for(c.pos);
                    self.write_comment_prefix(&pos, next, last.is_none(), tok);
                    self.write_comment(c);
                }
                last = Some(c.clone());
            }
            self.next_comment();
        }

        if let Some(last) = last {
            if last.text.starts_with("/*") && self.line_for(last.pos) == next.line {
                // block comment followed on the same line: one blank
                self.write_byte(b' ', 1);
            }
            let needs_linebreak = last.text.starts_with("//")
                || tok == TokenKind::CloseBlock && !self.no_extra_linebreak
                || tok == TokenKind::Eof;
            return self.write_comment_suffix(needs_linebreak);
        }

        (false, false)
    }

    /// Rewrite a comment into inline block form so the following `{`
    /// stays on the same line.
    fn write_inline_comment(&mut self, comment: &Comment) {
        let pos = self.pos_for(comment.pos);
        let text = match comment.text.strip_prefix("//") {
            Some(body) => format!(" /*{} */ ", trim_right(body)),
            None => format!(" {} ", comment.text),
        };
        self.write_string(&pos, &text, true);
    }

    // ------------------------------------------------------------------
    // Whitespace buffer

    /// Write the first `n` buffered whitespace entries. A line break
    /// immediately followed by an unindent is swapped with it so labels
    /// and closing constructs land at the correct column.
    fn write_whitespace(&mut self, n: usize) {
        let mut i = 0;
        while i < n {
            match self.wsbuf[i] {
                Ws::Ignore => {}
                Ws::Indent => self.indent += 1,
                Ws::Unindent => {
                    if self.indent == 0 {
                        self.underflow = true;
                    } else {
                        self.indent -= 1;
                    }
                }
                ws @ (Ws::Newline | Ws::Formfeed) => {
                    if i + 1 < n && self.wsbuf[i + 1] == Ws::Unindent {
                        // Swap, and use a formfeed so a wide construct on
                        // the next line cannot stretch columns before it.
                        self.wsbuf[i] = Ws::Unindent;
                        self.wsbuf[i + 1] = Ws::Formfeed;
                        continue; // process the swapped pair again
                    }
                    self.write_byte(ws.byte(), 1);
                }
                ws => self.write_byte(ws.byte(), 1),
            }
            i += 1;
        }

        self.wsbuf.drain(0..n);
    }

    /// Print pending comments and whitespace before the token `tok` at
    /// position `next`.
    fn flush(&mut self, next: &Position, tok: TokenKind) -> (bool, bool) {
        if self.comment_before(next) {
            self.intersperse_comments(next, tok)
        } else {
            self.write_whitespace(self.wsbuf.len());
            (false, false)
        }
    }

    // ------------------------------------------------------------------
    // Item printing (the only interface the node walk uses)

    fn ws(&mut self, ws: Ws) {
        if ws == Ws::Ignore {
            return;
        }
        if self.wsbuf.len() == self.wsbuf.capacity() {
            // sequences are short; overflow gracefully at the cost of
            // comment placement
            let n = self.wsbuf.len();
            self.write_whitespace(n);
        }
        if ws == Ws::Newline || ws == Ws::Formfeed {
            self.implied_term = false;
        }
        self.wsbuf.push(ws);
        self.last_kind = TokenKind::Eof;
    }

    fn blank(&mut self) {
        self.ws(Ws::Blank);
    }

    /// Record the source position of the next item.
    fn set_pos(&mut self, pos: Pos) {
        if pos.is_valid() {
            self.pos = self.pos_for(pos);
        }
    }

    fn tok(&mut self, kind: TokenKind, pos: Pos) {
        self.set_pos(pos);
        let implied = matches!(
            kind,
            TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::CloseBlock
        );
        self.item(kind.text(), kind, false, implied);
    }

    fn ident(&mut self, id: &ast::Ident) {
        self.set_pos(id.pos);
        let name = id.name.clone();
        self.item(&name, TokenKind::Ident, false, true);
    }

    fn lit(&mut self, lit: &ast::BasicLit) {
        self.set_pos(lit.pos);
        let text = lit.text.clone();
        self.item(&text, lit.kind, true, true);
    }

    fn item(&mut self, data: &str, kind: TokenKind, is_lit: bool, implied: bool) {
        if data.is_empty() {
            return;
        }
        if may_combine(self.last_kind, data.as_bytes()[0]) {
            // the previous and current token would combine into a
            // different token sequence; force a separating blank
            self.wsbuf.push(Ws::Blank);
        }
        self.last_kind = kind;

        let next = self.pos.clone();
        let (wrote_newline, dropped_ff) = self.flush(&next, kind);

        // reproduce source blank lines as long as they cannot be read
        // back as statement terminators
        let mut implied = implied;
        if !self.implied_term {
            let mut n = nlimit(next.line.saturating_sub(self.pos.line));
            if wrote_newline && n == MAX_NEWLINES {
                n = MAX_NEWLINES - 1;
            }
            if n > 0 {
                let ch = if dropped_ff { b'\x0C' } else { b'\n' };
                self.write_byte(ch, n);
                implied = false;
            }
        }

        self.write_string(&next, data, is_lit);
        self.implied_term = implied;
    }

    /// Print line breaks to advance towards `line`, at least `min` of
    /// them. `new_section` uses a formfeed for the first break, resetting
    /// tabwriter columns.
    fn linebreak(&mut self, line: usize, min: usize, new_section: bool) -> bool {
        let mut n = nlimit(line.saturating_sub(self.pos.line));
        if n < min {
            n = min;
        }
        let mut printed = false;
        if n > 0 && new_section {
            self.ws(Ws::Formfeed);
            n -= 1;
            printed = true;
        }
        while n > 0 {
            self.ws(Ws::Newline);
            n -= 1;
            printed = true;
        }
        printed
    }
}

fn nlimit(n: usize) -> usize {
    n.min(MAX_NEWLINES)
}

fn trim_right(s: &str) -> &str {
    s.trim_end()
}

/// Whether `prev` directly followed by the byte `next` would lex as a
/// different token sequence.
fn may_combine(prev: TokenKind, next: u8) -> bool {
    match prev {
        TokenKind::Int => next == b'.',
        TokenKind::Add => next == b'+',
        TokenKind::Sub => next == b'-',
        TokenKind::Quo => next == b'*',
        TokenKind::Lss => next == b'-' || next == b'<',
        TokenKind::And => next == b'&' || next == b'^',
        _ => false,
    }
}

// ----------------------------------------------------------------------
// Trimmer

/// An output filter that strips escape sentinels and trailing blanks and
/// tabs, and converts vertical tabs and formfeeds into htabs and newlines.
/// Text bracketed by escape sentinels passes through unchanged.
struct Trimmer<'a> {
    out: &'a mut dyn Write,
    state: TrimState,
    space: Vec<u8>,
}

#[derive(PartialEq)]
enum TrimState {
    InSpace,
    InEscape,
    InText,
}

impl<'a> Trimmer<'a> {
    fn new(out: &'a mut dyn Write) -> Trimmer<'a> {
        Trimmer {
            out,
            state: TrimState::InSpace,
            space: Vec::new(),
        }
    }

    fn reset_space(&mut self) {
        self.state = TrimState::InSpace;
        self.space.clear();
    }
}

impl Write for Trimmer<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut m = 0; // start of unwritten text segment
        for (n, &raw) in data.iter().enumerate() {
            let b = if raw == b'\x0B' { b'\t' } else { raw };
            match self.state {
                TrimState::InSpace => match b {
                    b'\t' | b' ' => self.space.push(b),
                    b'\n' | b'\x0C' => {
                        self.reset_space(); // discard trailing space
                        self.out.write_all(b"\n")?;
                    }
                    ESCAPE => {
                        self.out.write_all(&self.space)?;
                        self.state = TrimState::InEscape;
                        m = n + 1;
                    }
                    _ => {
                        self.out.write_all(&self.space)?;
                        self.state = TrimState::InText;
                        m = n;
                    }
                },
                TrimState::InEscape => {
                    if b == ESCAPE {
                        self.out.write_all(&data[m..n])?;
                        self.reset_space();
                    }
                }
                TrimState::InText => match b {
                    b'\t' | b' ' => {
                        self.out.write_all(&data[m..n])?;
                        self.reset_space();
                        self.space.push(b);
                    }
                    b'\n' | b'\x0C' => {
                        self.out.write_all(&data[m..n])?;
                        self.reset_space();
                        self.out.write_all(b"\n")?;
                    }
                    ESCAPE => {
                        self.out.write_all(&data[m..n])?;
                        self.state = TrimState::InEscape;
                        m = n + 1;
                    }
                    _ => {}
                },
            }
        }

        if self.state != TrimState::InSpace {
            self.out.write_all(&data[m..])?;
            self.reset_space();
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
