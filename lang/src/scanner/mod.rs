//! Tokenization for both surface syntaxes.
//!
//! The scanner turns source bytes into one shared token stream. In curly
//! mode the block delimiters `{`, `}`, `;` are read off the input; in
//! indented mode the same `OpenBlock`/`CloseBlock`/`StatementEnd` tokens
//! are synthesized from leading whitespace and newlines under the offside
//! rule, so the parser never knows which syntax it is reading.
//!
//! Comments are delivered out-of-band as position-ordered groups; the
//! grammar itself is comment-free.

pub mod token;

pub use token::{Token, TokenKind};


use crate::parser::ast::{Comment, CommentGroup};
use crate::position::{Pos, SourceFile};

/// Which surface syntax the scanner is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Curly,
    Indented,
}

#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Collect comments into groups. When unset, comments are discarded.
    pub scan_comments: bool,
    /// Reject mixed tabs and spaces in leading indentation.
    pub strict: bool,
    /// A tab advances the indentation column to the next multiple of this.
    pub tabwidth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            scan_comments: true,
            strict: false,
            tabwidth: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    pub pos: Pos,
    pub message: String,
}

#[derive(Debug)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub comments: Vec<CommentGroup>,
    pub errors: Vec<ScanError>,
}

pub fn scan(file: &SourceFile, src: &str, mode: Mode, config: ScanConfig) -> ScanResult {
    let mut scanner = Scanner {
        file,
        src: src.as_bytes(),
        text: src,
        mode,
        config,
        offset: 0,
        tokens: Vec::new(),
        comments: Vec::new(),
        group: Vec::new(),
        group_last_end: 0,
        token_since_comment: false,
        errors: Vec::new(),
        indent_stack: vec![Level { column: 1, hard: true }],
        last_tok: None,
        continuation: false,
        pending_soft: false,
        depth: 0,
        indent_char: None,
    };
    scanner.run();
    ScanResult {
        tokens: scanner.tokens,
        comments: scanner.comments,
        errors: scanner.errors,
    }
}

/// One entry of the offside stack. Hard levels were opened by indentation
/// and close with a `CloseBlock`; soft levels record the body column after
/// a trailing colon (case clauses, labels) and close silently.
#[derive(Debug, Clone, Copy)]
struct Level {
    column: usize,
    hard: bool,
}

struct Scanner<'a> {
    file: &'a SourceFile,
    src: &'a [u8],
    text: &'a str,
    mode: Mode,
    config: ScanConfig,
    offset: usize,

    tokens: Vec<Token>,
    comments: Vec<CommentGroup>,
    group: Vec<Comment>,
    group_last_end: usize,
    token_since_comment: bool,
    errors: Vec<ScanError>,

    indent_stack: Vec<Level>,
    /// Last non-comment token of the current logical line.
    last_tok: Option<TokenKind>,
    /// The previous logical line ended with a continuation token.
    continuation: bool,
    /// The previous logical line ended with a colon.
    pending_soft: bool,
    /// Nesting depth of literal `(`, `[` and `{`. While positive, the
    /// offside rule is suspended: block structure cannot cross a
    /// bracketed expression, so newlines fall back to plain ASI.
    depth: usize,
    /// First indentation byte seen in the file; strict mode rejects a
    /// leading run that uses the other one.
    indent_char: Option<u8>,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) {
        if self.mode == Mode::Indented {
            self.line_start();
        }
        loop {
            self.skip_blanks();
            match self.peek() {
                None => break,
                Some(b'\n') => self.newline(),
                Some(_) => self.next_token(),
            }
        }
        self.finish();
    }

    // ------------------------------------------------------------------
    // Line structure

    fn newline(&mut self) {
        let pos = self.pos_here();
        self.offset += 1;
        match self.mode {
            Mode::Curly => {
                if self.asi_pending() {
                    self.push_statement_end(pos);
                }
                self.last_tok = None;
            }
            Mode::Indented => {
                if self.depth > 0 {
                    // inside brackets blocks cannot open; plain ASI applies
                    if self.asi_pending() {
                        self.push_statement_end(pos);
                    }
                    self.last_tok = None;
                    return;
                }
                self.continuation = match self.last_tok {
                    Some(t) => t.is_continuation() || t == TokenKind::Colon,
                    None => false,
                };
                self.pending_soft = self.last_tok == Some(TokenKind::Colon);
                self.line_start();
                self.last_tok = None;
            }
        }
    }

    /// Position the scanner at the first significant byte of the next
    /// logical line, skipping blank and comment-only lines, and apply the
    /// offside rule to its indentation column.
    fn line_start(&mut self) {
        loop {
            let line_begin = self.offset;
            let mut column = 1usize;
            let mut saw_tab = false;
            let mut saw_space = false;
            while let Some(b) = self.peek() {
                match b {
                    b' ' => {
                        column += 1;
                        saw_space = true;
                        self.offset += 1;
                    }
                    b'\t' => {
                        column = next_tab_stop(column, self.config.tabwidth);
                        saw_tab = true;
                        self.offset += 1;
                    }
                    b'\r' => {
                        self.offset += 1;
                    }
                    _ => break,
                }
            }
            match self.peek() {
                None => return, // finish() closes open levels
                Some(b'\n') => {
                    self.offset += 1;
                    continue;
                }
                Some(b'#') => {
                    self.scan_comment();
                    if self.peek() == Some(b'\n') {
                        self.offset += 1;
                    }
                    continue;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    self.scan_comment();
                    if self.peek() == Some(b'\n') {
                        self.offset += 1;
                    }
                    continue;
                }
                Some(_) => {
                    // commit indentation style only for lines that carry code
                    let mixed = (saw_tab && saw_space)
                        || match self.indent_char {
                            Some(b'\t') => saw_space,
                            Some(b' ') => saw_tab,
                            _ => false,
                        };
                    if self.indent_char.is_none() && (saw_tab || saw_space) {
                        self.indent_char = Some(if saw_tab { b'\t' } else { b' ' });
                    }
                    if self.config.strict && mixed {
                        self.error(line_begin, "mixed tabs and spaces in indentation");
                    }
                    self.offside(column);
                    return;
                }
            }
        }
    }

    /// The offside rule proper: compare the new line's column against the
    /// indentation stack and synthesize block and terminator tokens.
    fn offside(&mut self, column: usize) {
        let pos = self.pos_here();

        if self.continuation {
            // The previous line continues here; its indentation does not
            // touch the stack, except that a trailing colon records the
            // body column so sibling statements terminate each other.
            if self.pending_soft && column > self.top_column() {
                self.indent_stack.push(Level { column, hard: false });
            }
            self.continuation = false;
            self.pending_soft = false;
            return;
        }

        let top = self.top_column();
        if column > top {
            self.indent_stack.push(Level { column, hard: true });
            self.push_token(Token::new(TokenKind::OpenBlock, pos));
        } else if column == top {
            if self.asi_pending() {
                self.push_statement_end(pos);
            }
        } else {
            while self.indent_stack.len() > 1 && self.top_column() > column {
                let level = self.indent_stack.pop().unwrap();
                if level.hard {
                    self.push_token(Token::new(TokenKind::CloseBlock, pos));
                }
            }
            if self.top_column() != column {
                self.error_at(pos, "unindent does not match any outer indentation level");
                // resynchronize on the unmatched column
                self.indent_stack.push(Level {
                    column,
                    hard: false,
                });
            }
            self.push_statement_end(pos);
        }
    }

    fn finish(&mut self) {
        let pos = self.file.pos(self.src.len());
        match self.mode {
            Mode::Indented => {
                while self.indent_stack.len() > 1 {
                    let level = self.indent_stack.pop().unwrap();
                    if level.hard {
                        self.push_token(Token::new(TokenKind::CloseBlock, pos));
                    }
                }
                if !self.tokens.is_empty() {
                    self.push_statement_end(pos);
                }
            }
            Mode::Curly => {
                // end of input acts like a newline
                if self.asi_pending() {
                    self.push_statement_end(pos);
                }
            }
        }
        self.flush_group();
        self.tokens.push(Token::new(TokenKind::Eof, pos));
    }

    fn top_column(&self) -> usize {
        self.indent_stack.last().unwrap().column
    }

    fn asi_pending(&self) -> bool {
        matches!(self.last_tok, Some(t) if t.implies_statement_end())
    }

    fn push_statement_end(&mut self, pos: Pos) {
        match self.tokens.last() {
            None => {}
            Some(t) if t.kind == TokenKind::StatementEnd => {}
            Some(t) if t.kind == TokenKind::OpenBlock => {}
            _ => self.push_token(Token::new(TokenKind::StatementEnd, pos)),
        }
    }

    // ------------------------------------------------------------------
    // Tokens

    fn next_token(&mut self) {
        let start = self.offset;
        let pos = self.pos_here();
        let b = self.src[start];

        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_ident(),
            b'0'..=b'9' => self.scan_number(false),
            b'"' => self.scan_string(),
            b'\'' => self.scan_char(),
            b'`' => self.scan_raw_string(),
            b'#' => {
                if self.mode == Mode::Indented {
                    self.scan_comment();
                } else {
                    self.error(start, "invalid character '#'");
                    self.offset += 1;
                }
            }
            b'/' => {
                if self.peek_at(1) == Some(b'/') {
                    self.scan_comment();
                } else if self.peek_at(1) == Some(b'*') {
                    self.scan_block_comment();
                } else {
                    self.scan_operator();
                }
            }
            b'+' | b'-' | b'*' | b'%' | b'^' | b'!' | b'=' | b'<' | b'>' | b'&' | b'|' | b':' => {
                self.scan_operator()
            }
            b'.' => {
                if matches!(self.peek_at(1), Some(b'0'..=b'9')) {
                    self.scan_number(true);
                } else if self.peek_at(1) == Some(b'.') {
                    if self.peek_at(2) == Some(b'.') {
                        self.offset += 3;
                        self.push_token(Token::new(TokenKind::Ellipsis, pos));
                    } else {
                        self.error(start, "unexpected '..'");
                        self.offset += 2;
                    }
                } else {
                    self.offset += 1;
                    self.push_token(Token::new(TokenKind::Period, pos));
                }
            }
            b'(' => self.punct(TokenKind::LParen),
            b')' => self.punct(TokenKind::RParen),
            b'[' => self.punct(TokenKind::LBracket),
            b']' => self.punct(TokenKind::RBracket),
            b'{' => self.punct(TokenKind::OpenBlock),
            b'}' => self.punct(TokenKind::CloseBlock),
            b',' => self.punct(TokenKind::Comma),
            b';' => self.punct(TokenKind::StatementEnd),
            _ => {
                self.error(start, &format!("invalid character {:?}", b as char));
                // skip a whole UTF-8 sequence so we never split a char
                self.offset += 1;
                while matches!(self.peek(), Some(c) if c & 0xC0 == 0x80) {
                    self.offset += 1;
                }
            }
        }
    }

    fn punct(&mut self, kind: TokenKind) {
        let pos = self.pos_here();
        self.offset += 1;
        match kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::OpenBlock => self.depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::CloseBlock => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }
        self.push_token(Token::new(kind, pos));
    }

    fn scan_ident(&mut self) {
        let start = self.offset;
        let pos = self.pos_here();
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.offset += 1;
        }
        let name = &self.text[start..self.offset];
        let kind = TokenKind::lookup(name);
        if kind == TokenKind::Ident {
            self.push_token(Token::with_text(TokenKind::Ident, pos, name));
        } else {
            self.push_token(Token::new(kind, pos));
        }
    }

    fn scan_number(&mut self, leading_dot: bool) {
        let start = self.offset;
        let pos = self.pos_here();
        let mut kind = TokenKind::Int;

        if leading_dot {
            kind = TokenKind::Float;
            self.offset += 1; // '.'
            self.scan_digits();
        } else if self.peek() == Some(b'0')
            && matches!(self.peek_at(1), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B'))
        {
            self.offset += 2;
            while matches!(
                self.peek(),
                Some(b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' | b'_')
            ) {
                self.offset += 1;
            }
        } else {
            self.scan_digits();
            if self.peek() == Some(b'.') && !matches!(self.peek_at(1), Some(b'.')) {
                kind = TokenKind::Float;
                self.offset += 1;
                self.scan_digits();
            }
        }

        if matches!(self.peek(), Some(b'e' | b'E')) && kind != TokenKind::Int
            || matches!(self.peek(), Some(b'e' | b'E'))
                && matches!(self.peek_at(1), Some(b'0'..=b'9' | b'+' | b'-'))
        {
            kind = TokenKind::Float;
            self.offset += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.offset += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                self.error(self.offset, "malformed exponent in numeric literal");
            }
            self.scan_digits();
        }

        let text = &self.text[start..self.offset];
        self.push_token(Token::with_text(kind, pos, text));
    }

    fn scan_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9' | b'_')) {
            self.offset += 1;
        }
    }

    fn scan_string(&mut self) {
        let start = self.offset;
        let pos = self.pos_here();
        self.offset += 1; // opening quote
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    self.error(start, "unterminated string literal");
                    break;
                }
                Some(b'\\') => {
                    self.offset += 1;
                    if !matches!(self.peek(), None | Some(b'\n')) {
                        self.offset += 1;
                    }
                }
                Some(b'"') => {
                    self.offset += 1;
                    break;
                }
                Some(_) => self.offset += 1,
            }
        }
        let text = &self.text[start..self.offset];
        self.push_token(Token::with_text(TokenKind::Str, pos, text));
    }

    fn scan_char(&mut self) {
        let start = self.offset;
        let pos = self.pos_here();
        self.offset += 1; // opening quote
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    self.error(start, "unterminated character literal");
                    break;
                }
                Some(b'\\') => {
                    self.offset += 1;
                    if !matches!(self.peek(), None | Some(b'\n')) {
                        self.offset += 1;
                    }
                }
                Some(b'\'') => {
                    self.offset += 1;
                    break;
                }
                Some(_) => self.offset += 1,
            }
        }
        let text = &self.text[start..self.offset];
        self.push_token(Token::with_text(TokenKind::Char, pos, text));
    }

    fn scan_raw_string(&mut self) {
        let start = self.offset;
        let pos = self.pos_here();
        self.offset += 1; // opening backtick
        loop {
            match self.peek() {
                None => {
                    self.error(start, "unterminated raw string literal");
                    break;
                }
                Some(b'`') => {
                    self.offset += 1;
                    break;
                }
                // interior newlines are part of the literal and invisible
                // to the offside rule
                Some(_) => self.offset += 1,
            }
        }
        let text = &self.text[start..self.offset];
        self.push_token(Token::with_text(TokenKind::Str, pos, text));
    }

    fn scan_operator(&mut self) {
        let pos = self.pos_here();
        let rest = &self.src[self.offset..];
        // maximal munch: longest spellings first
        const OPS: &[(&[u8], TokenKind)] = &[
            (b"<<=", TokenKind::ShlAssign),
            (b">>=", TokenKind::ShrAssign),
            (b"&^=", TokenKind::AndNotAssign),
            (b"+=", TokenKind::AddAssign),
            (b"-=", TokenKind::SubAssign),
            (b"*=", TokenKind::MulAssign),
            (b"/=", TokenKind::QuoAssign),
            (b"%=", TokenKind::RemAssign),
            (b"&=", TokenKind::AndAssign),
            (b"|=", TokenKind::OrAssign),
            (b"^=", TokenKind::XorAssign),
            (b"&^", TokenKind::AndNot),
            (b"&&", TokenKind::LAnd),
            (b"||", TokenKind::LOr),
            (b"<-", TokenKind::Arrow),
            (b"++", TokenKind::Inc),
            (b"--", TokenKind::Dec),
            (b"==", TokenKind::Eql),
            (b"!=", TokenKind::Neq),
            (b"<=", TokenKind::Leq),
            (b">=", TokenKind::Geq),
            (b"<<", TokenKind::Shl),
            (b">>", TokenKind::Shr),
            (b":=", TokenKind::Define),
            (b"+", TokenKind::Add),
            (b"-", TokenKind::Sub),
            (b"*", TokenKind::Mul),
            (b"/", TokenKind::Quo),
            (b"%", TokenKind::Rem),
            (b"&", TokenKind::And),
            (b"|", TokenKind::Or),
            (b"^", TokenKind::Xor),
            (b"=", TokenKind::Assign),
            (b"<", TokenKind::Lss),
            (b">", TokenKind::Gtr),
            (b"!", TokenKind::Not),
            (b":", TokenKind::Colon),
        ];
        for (spelling, kind) in OPS {
            if rest.starts_with(spelling) {
                self.offset += spelling.len();
                self.push_token(Token::new(*kind, pos));
                return;
            }
        }
        self.error(self.offset, &format!("invalid character {:?}", rest[0] as char));
        self.offset += 1;
    }

    // ------------------------------------------------------------------
    // Comments

    /// Scan a line comment (`//` in curly form, `#` in indented form) up
    /// to, not including, the newline. The stored text is normalized to
    /// the `//` form.
    fn scan_comment(&mut self) {
        let start = self.offset;
        let sigil_len = if self.src[start] == b'#' { 1 } else { 2 };
        while !matches!(self.peek(), None | Some(b'\n')) {
            self.offset += 1;
        }
        let mut end = self.offset;
        if end > start && self.src[end - 1] == b'\r' {
            end -= 1;
        }
        let body = &self.text[start + sigil_len..end];
        let text = format!("//{}", body);
        self.push_comment(start, end, text);
    }

    fn scan_block_comment(&mut self) {
        let start = self.offset;
        self.offset += 2; // "/*"
        let mut terminated = false;
        while let Some(b) = self.peek() {
            if b == b'*' && self.peek_at(1) == Some(b'/') {
                self.offset += 2;
                terminated = true;
                break;
            }
            self.offset += 1;
        }
        if !terminated {
            self.error(start, "unterminated block comment");
        }
        if self.mode == Mode::Indented {
            self.error(start, "block comments are not supported in indented syntax");
            return;
        }
        let text = self.text[start..self.offset].to_string();
        let spans_newline = text.contains('\n');
        self.push_comment(start, self.offset, text);
        // a general comment spanning a newline acts like a newline
        if spans_newline && self.asi_pending() {
            let pos = self.pos_here();
            self.push_statement_end(pos);
            self.last_tok = None;
        }
    }

    fn push_comment(&mut self, start: usize, end: usize, text: String) {
        if !self.config.scan_comments {
            return;
        }
        let blank_between = self.text[self.group_last_end..start]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            >= 2;
        if !self.group.is_empty() && (self.token_since_comment || blank_between) {
            self.flush_group();
        }
        self.group.push(Comment {
            pos: self.file.pos(start),
            text,
        });
        self.group_last_end = end;
        self.token_since_comment = false;
    }

    fn flush_group(&mut self) {
        if !self.group.is_empty() {
            self.comments.push(CommentGroup {
                list: std::mem::take(&mut self.group),
            });
        }
    }

    // ------------------------------------------------------------------
    // Small helpers

    fn push_token(&mut self, token: Token) {
        self.last_tok = Some(token.kind);
        self.token_since_comment = true;
        self.tokens.push(token);
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r')) {
            self.offset += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.offset).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.offset + ahead).copied()
    }

    fn pos_here(&self) -> Pos {
        self.file.pos(self.offset)
    }

    fn error(&mut self, offset: usize, message: &str) {
        let pos = self.file.pos(offset);
        self.error_at(pos, message);
    }

    fn error_at(&mut self, pos: Pos, message: &str) {
        self.errors.push(ScanError {
            pos,
            message: message.to_string(),
        });
    }
}

fn next_tab_stop(column: usize, tabwidth: usize) -> usize {
    // columns are 1-based; a tab advances to the next multiple of tabwidth
    ((column - 1) / tabwidth + 1) * tabwidth + 1
}
