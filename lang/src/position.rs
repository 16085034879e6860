//! Source positions and the file registry.
//!
//! Tokens, comments and AST nodes carry compact [`Pos`] handles instead of
//! full locations. A [`FileSet`] owns the registered source buffers and can
//! expand any handle back into a `(filename, line, column, offset)` tuple.

use std::cell::Cell;
use std::fmt;

/// A compact handle for a location inside a [`FileSet`].
///
/// `Pos::NONE` is the invalid sentinel; valid handles are ordered so that
/// `a < b` iff `a` appears textually before `b` in the same file or in an
/// earlier-registered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn is_valid(self) -> bool {
        self != Pos::NONE
    }

    /// The handle `n` bytes past this one, within the same file.
    pub fn advance(self, n: usize) -> Pos {
        if self.is_valid() {
            Pos(self.0 + n as u32)
        } else {
            Pos::NONE
        }
    }
}

/// An expanded source location. Line and column are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub filename: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }

    pub(crate) fn invalid() -> Position {
        Position {
            filename: String::new(),
            offset: 0,
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "-");
        }
        if self.filename.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

/// One registered source buffer.
#[derive(Debug)]
pub struct SourceFile {
    name: String,
    base: u32,
    size: u32,
    /// Byte offsets of line starts; `lines[0] == 0`.
    lines: Vec<u32>,
}

impl SourceFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// The handle for the byte at `offset` within this file.
    pub fn pos(&self, offset: usize) -> Pos {
        debug_assert!(offset <= self.size as usize);
        Pos(self.base + offset as u32)
    }

    /// The byte offset of `pos` within this file.
    pub fn offset(&self, pos: Pos) -> usize {
        debug_assert!(pos.0 >= self.base && pos.0 <= self.base + self.size);
        (pos.0 - self.base) as usize
    }

    fn contains(&self, pos: Pos) -> bool {
        pos.0 >= self.base && pos.0 <= self.base + self.size
    }

    /// 1-indexed line number of the line containing `offset`.
    fn line_for_offset(&self, offset: usize) -> usize {
        self.lines.partition_point(|&start| start as usize <= offset)
    }

    fn position_for_offset(&self, offset: usize) -> Position {
        let line = self.line_for_offset(offset);
        let line_start = self.lines[line - 1] as usize;
        Position {
            filename: self.name.clone(),
            offset,
            line,
            column: offset - line_start + 1,
        }
    }
}

/// An append-only registry of source files.
///
/// Registration hands out non-overlapping handle ranges; after a file is
/// registered its handles are stable for the process lifetime. Lookup is
/// pure apart from a one-entry line cache kept for locality.
#[derive(Debug)]
pub struct FileSet {
    base: u32,
    files: Vec<SourceFile>,
    last_lookup: Cell<(u32, u32)>, // (pos, line) of the most recent line query
}

impl Default for FileSet {
    fn default() -> Self {
        FileSet::new()
    }
}

impl FileSet {
    pub fn new() -> FileSet {
        FileSet {
            base: 1, // handle 0 is reserved for Pos::NONE
            files: Vec::new(),
            last_lookup: Cell::new((0, 0)),
        }
    }

    /// Register `content` under `name` and return its file index.
    pub fn add(&mut self, name: impl Into<String>, content: &str) -> usize {
        let mut lines = vec![0u32];
        for (i, b) in content.bytes().enumerate() {
            if b == b'\n' {
                lines.push(i as u32 + 1);
            }
        }
        let size = content.len() as u32;
        self.files.push(SourceFile {
            name: name.into(),
            base: self.base,
            size,
            lines,
        });
        self.base += size + 1;
        self.files.len() - 1
    }

    pub fn file(&self, index: usize) -> &SourceFile {
        &self.files[index]
    }

    fn file_containing(&self, pos: Pos) -> Option<&SourceFile> {
        if !pos.is_valid() {
            return None;
        }
        let i = self.files.partition_point(|f| f.base <= pos.0);
        if i == 0 {
            return None;
        }
        let file = &self.files[i - 1];
        file.contains(pos).then_some(file)
    }

    /// Expand a handle to a full position. Invalid handles expand to the
    /// invalid position, which compares unequal to every real one.
    pub fn position(&self, pos: Pos) -> Position {
        match self.file_containing(pos) {
            Some(file) => file.position_for_offset(file.offset(pos)),
            None => Position::invalid(),
        }
    }

    /// Line number of `pos`, with a one-entry cache for repeated queries.
    pub fn line(&self, pos: Pos) -> usize {
        let (cached_pos, cached_line) = self.last_lookup.get();
        if cached_pos == pos.0 && cached_line != 0 {
            return cached_line as usize;
        }
        let line = match self.file_containing(pos) {
            Some(file) => file.line_for_offset(file.offset(pos)),
            None => 0,
        };
        self.last_lookup.set((pos.0, line as u32));
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_expand_to_line_and_column() {
        let mut fset = FileSet::new();
        let idx = fset.add("a.go", "one\ntwo\nthree\n");
        let file = fset.file(idx);

        let pos = file.pos(0);
        assert_eq!(fset.position(pos), Position {
            filename: "a.go".to_string(),
            offset: 0,
            line: 1,
            column: 1,
        });

        // 't' of "two"
        let pos = file.pos(4);
        let position = fset.position(pos);
        assert_eq!((position.line, position.column), (2, 1));

        // 'e' of "three"
        let pos = file.pos(11);
        let position = fset.position(pos);
        assert_eq!((position.line, position.column), (3, 4));
    }

    #[test]
    fn handles_order_across_files() {
        let mut fset = FileSet::new();
        let a = fset.add("a.go", "aaa");
        let b = fset.add("b.go", "bbb");
        assert!(fset.file(a).pos(2) < fset.file(b).pos(0));
    }

    #[test]
    fn invalid_position_is_distinct() {
        let fset = FileSet::new();
        assert!(!Pos::NONE.is_valid());
        assert!(!fset.position(Pos::NONE).is_valid());
        assert_eq!(fset.position(Pos::NONE).to_string(), "-");
    }

    #[test]
    fn line_cache_survives_repeated_queries() {
        let mut fset = FileSet::new();
        let idx = fset.add("a.go", "x\ny\nz");
        let pos = fset.file(idx).pos(2);
        assert_eq!(fset.line(pos), 2);
        assert_eq!(fset.line(pos), 2);
        assert_eq!(fset.line(fset.file(idx).pos(4)), 3);
    }

    #[test]
    fn display_renders_file_line_column() {
        let mut fset = FileSet::new();
        let idx = fset.add("pkg/main.go", "package main\n");
        let position = fset.position(fset.file(idx).pos(8));
        assert_eq!(position.to_string(), "pkg/main.go:1:9");
    }
}
