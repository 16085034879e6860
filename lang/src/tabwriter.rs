//! Elastic tabstop layout.
//!
//! The printers emit `\v` between cells that should line up vertically and
//! `\f` where a column block ends. This writer buffers its input, computes
//! one width per column over each run of lines that share that column, and
//! pads cells to that width. Text bracketed by the escape sentinel is
//! opaque: it counts toward cell width but its bytes, including `\v` and
//! newlines, are never reinterpreted.

use std::io::{self, Write};

use crate::printer::ESCAPE;

pub struct TabWriter<'a> {
    out: &'a mut dyn Write,
    minwidth: usize,
    tabwidth: usize,
    padding: usize,
    padchar: u8,
    buf: Vec<u8>,
}

impl<'a> TabWriter<'a> {
    pub fn new(
        out: &'a mut dyn Write,
        minwidth: usize,
        tabwidth: usize,
        padding: usize,
        padchar: u8,
    ) -> TabWriter<'a> {
        TabWriter {
            out,
            minwidth,
            tabwidth,
            padding,
            padchar,
            buf: Vec::new(),
        }
    }

    fn layout(&mut self) -> io::Result<()> {
        let lines = split_lines(&self.buf);

        // For each column, walk runs of consecutive lines that have a
        // terminated cell there (runs also break at formfeeds) and give
        // the whole run one width.
        let mut widths: Vec<Vec<usize>> = lines.iter().map(|l| vec![0; l.cells.len()]) .collect();
        let max_cols = lines.iter().map(|l| l.terminated()).max().unwrap_or(0);
        for col in 0..max_cols {
            let mut i = 0;
            while i < lines.len() {
                if lines[i].terminated() <= col {
                    i += 1;
                    continue;
                }
                let mut j = i;
                let mut width = self.minwidth;
                loop {
                    width = width.max(lines[j].cells[col].width + self.padding);
                    let section_ends = lines[j].hard_break;
                    j += 1;
                    if section_ends || j >= lines.len() || lines[j].terminated() <= col {
                        break;
                    }
                }
                for line in i..j {
                    widths[line][col] = width;
                }
                i = j;
            }
        }

        for (line, line_widths) in lines.iter().zip(&widths) {
            for (k, cell) in line.cells.iter().enumerate() {
                self.out.write_all(&self.buf[cell.start..cell.end])?;
                if k < line.terminated() {
                    self.pad(cell.width, line_widths[k])?;
                }
            }
            if line.has_terminator {
                self.out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn pad(&mut self, text_width: usize, cell_width: usize) -> io::Result<()> {
        if self.padchar == b'\t' {
            if self.tabwidth == 0 {
                return Ok(());
            }
            // pad with tabs up to the next stop past the cell width
            let cell_width = (cell_width + self.tabwidth - 1) / self.tabwidth * self.tabwidth;
            let gap = cell_width.saturating_sub(text_width);
            let tabs = (gap + self.tabwidth - 1) / self.tabwidth;
            for _ in 0..tabs {
                self.out.write_all(b"\t")?;
            }
        } else {
            for _ in 0..cell_width.saturating_sub(text_width) {
                self.out.write_all(&[self.padchar])?;
            }
        }
        Ok(())
    }
}

impl Write for TabWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.layout()?;
        self.buf.clear();
        self.out.flush()
    }
}

struct Cell {
    start: usize,
    end: usize,
    width: usize,
}

struct Line {
    cells: Vec<Cell>,
    /// The line's final cell was followed by the line terminator, not a
    /// `\v`; it takes part in no column.
    has_terminator: bool,
    /// Terminated by `\f`: column runs stop here.
    hard_break: bool,
}

impl Line {
    /// Number of cells that take part in column layout.
    fn terminated(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

fn split_lines(buf: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut cells = Vec::new();
    let mut start = 0;
    let mut width = 0usize;
    let mut in_escape = false;

    for (i, &b) in buf.iter().enumerate() {
        if b == ESCAPE {
            in_escape = !in_escape;
            continue;
        }
        if in_escape {
            width += visible_width(b);
            continue;
        }
        match b {
            b'\x0B' => {
                cells.push(Cell {
                    start,
                    end: i,
                    width,
                });
                start = i + 1;
                width = 0;
            }
            b'\n' | b'\x0C' => {
                cells.push(Cell {
                    start,
                    end: i,
                    width,
                });
                lines.push(Line {
                    cells: std::mem::take(&mut cells),
                    has_terminator: true,
                    hard_break: b == b'\x0C',
                });
                start = i + 1;
                width = 0;
            }
            _ => width += visible_width(b),
        }
    }
    if start < buf.len() || !cells.is_empty() {
        cells.push(Cell {
            start,
            end: buf.len(),
            width,
        });
        lines.push(Line {
            cells,
            has_terminator: false,
            hard_break: false,
        });
    }
    lines
}

fn visible_width(b: u8) -> usize {
    // UTF-8 continuation bytes take no extra column
    if b & 0xC0 == 0x80 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(input: &[u8], minwidth: usize, padchar: u8) -> String {
        let mut out = Vec::new();
        let mut tw = TabWriter::new(&mut out, minwidth, 8, 1, padchar);
        tw.write_all(input).unwrap();
        tw.flush().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn aligns_adjacent_cells_with_spaces() {
        let got = format(b"a\x0B= 1\nlonger\x0B= 2\n", 0, b' ');
        assert_eq!(got, "a      = 1\nlonger = 2\n");
    }

    #[test]
    fn single_line_gets_minimal_padding() {
        let got = format(b"x\x0B= 1\n", 0, b' ');
        assert_eq!(got, "x = 1\n");
    }

    #[test]
    fn formfeed_splits_column_runs() {
        let got = format(b"a\x0B1\x0Cverylongcell\x0B2\n", 0, b' ');
        assert_eq!(got, "a 1\nverylongcell 2\n");
    }

    #[test]
    fn last_cell_is_never_padded() {
        let got = format(b"left\x0Bright\nleft\x0Bmore\n", 0, b' ');
        assert_eq!(got, "left right\nleft more\n");
    }

    #[test]
    fn escaped_regions_are_opaque() {
        let input = [b'a', ESCAPE, b'\x0B', ESCAPE, b'\x0B', b'x', b'\n'];
        let mut out = Vec::new();
        let mut tw = TabWriter::new(&mut out, 0, 8, 1, b' ');
        tw.write_all(&input).unwrap();
        tw.flush().unwrap();
        // the escaped \v is literal text, not a separator; the sentinels
        // pass through for the trimmer to strip
        assert_eq!(out.iter().filter(|&&b| b == b'x').count(), 1);
        assert!(out.contains(&b'\x0B'));
        assert!(out.contains(&ESCAPE));
    }

    #[test]
    fn tab_padding_rounds_to_stops() {
        let got = format(b"ab\x0Bc\n", 0, b'\t');
        // cell width 3 rounds up to the 8-column stop: one tab
        assert_eq!(got, "ab\tc\n");
    }
}
