//! Plaintext pattern files.
//!
//! One line per row. A space or `.` is a dead cell, any other printable
//! character is alive; lines starting with `!` are comments. Short lines are
//! padded with dead cells.
//!
//! ```text
//! !Name: glider
//!  *
//!   *
//! ***
//! ```

use std::path::Path;

use crate::error::{Result, SiLifeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub width: usize,
    pub height: usize,
    cells: Vec<bool>,
}

impl Pattern {
    /// Parse plaintext pattern data.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.starts_with('!') {
                continue;
            }
            let line = line.trim_end_matches('\r');
            if let Some(c) = line.chars().find(|c| c.is_control()) {
                return Err(SiLifeError::Pattern { line: n + 1, reason: format!("unexpected character {:?}", c) });
            }
            lines.push(line.chars().map(|c| c != ' ' && c != '.').collect::<Vec<bool>>());
        }
        // Trailing blank lines carry no cells
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(SiLifeError::Pattern { line: 0, reason: "no pattern rows".into() });
        }
        Ok(Self::from_cells(&lines))
    }

    /// Read and parse a pattern file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SiLifeError::io(path, e))?;
        Self::parse(&text)
    }

    /// Pattern from reference-style rows (`*` alive, space dead).
    pub fn from_rows(rows: &[&str]) -> Self {
        let lines: Vec<Vec<bool>> = rows.iter().map(|r| r.chars().map(|c| c != ' ' && c != '.').collect()).collect();
        Self::from_cells(&lines)
    }

    fn from_cells(lines: &[Vec<bool>]) -> Self {
        let width = lines.iter().map(Vec::len).max().unwrap_or(0);
        let height = lines.len();
        let mut cells = vec![false; width * height];
        for (r, line) in lines.iter().enumerate() {
            cells[r * width..r * width + line.len()].copy_from_slice(line);
        }
        Pattern { width, height, cells }
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.width + col]
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Stamp the pattern onto a `width` × `height` row image with its top-left
    /// cell at (row, col). Cells past the edge wrap when `wrap` is set and are
    /// clipped otherwise. Existing live cells are kept.
    pub fn stamp(&self, rows: &mut [u64], width: usize, row: usize, col: usize, wrap: bool) {
        let height = rows.len();
        if width == 0 || height == 0 {
            return;
        }
        let (row, col) = if wrap { (row % height, col % width) } else { (row, col) };
        for pr in 0..self.height {
            for pc in 0..self.width {
                if !self.get(pr, pc) {
                    continue;
                }
                let (Some(mut r), Some(mut c)) = (row.checked_add(pr), col.checked_add(pc)) else {
                    continue;
                };
                if wrap {
                    r %= height;
                    c %= width;
                } else if r >= height || c >= width {
                    continue;
                }
                if c < 64 {
                    rows[r] |= 1u64 << c;
                }
            }
        }
    }

    /// Render as rows of `*` (alive) and ` ` (dead).
    pub fn dump(&self) -> Vec<String> {
        (0..self.height)
            .map(|r| (0..self.width).map(|c| if self.get(r, c) { '*' } else { ' ' }).collect())
            .collect()
    }
}

/// Parse a `ROW,COL` placement.
pub fn parse_position(s: &str) -> Result<(usize, usize)> {
    let bad = || SiLifeError::Pattern { line: 0, reason: format!("bad position {:?}, expected ROW,COL", s) };
    let (r, c) = s.split_once(',').ok_or_else(bad)?;
    let r = r.trim().parse().map_err(|_| bad())?;
    let c = c.trim().parse().map_err(|_| bad())?;
    Ok((r, c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_glider() {
        let p = Pattern::parse("!Name: glider\n.*.\n..*\n***\n").unwrap();
        assert_eq!((p.width, p.height), (3, 3));
        assert_eq!(p.population(), 5);
        assert_eq!(p.dump(), vec![" * ", "  *", "***"]);
    }

    #[test]
    fn test_short_lines_padded() {
        let p = Pattern::parse("*\n\n***\n\n").unwrap();
        assert_eq!((p.width, p.height), (3, 3));
        assert!(!p.get(0, 2));
        assert!(!p.get(1, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Pattern::parse("! only comments\n"), Err(SiLifeError::Pattern { .. })));
        assert!(matches!(Pattern::parse("**\n*\t*\n"), Err(SiLifeError::Pattern { line: 2, .. })));
    }

    #[test]
    fn test_stamp_clip_and_wrap() {
        let p = Pattern::from_rows(&["**", "**"]);
        let mut rows = vec![0u64; 4];
        p.stamp(&mut rows, 4, 3, 3, false);
        assert_eq!(rows, vec![0, 0, 0, 0b1000]);

        let mut rows = vec![0u64; 4];
        p.stamp(&mut rows, 4, 3, 3, true);
        assert_eq!(rows, vec![0b1001, 0, 0, 0b1001]);
    }

    #[test]
    fn test_stamp_far_placement() {
        let p = Pattern::from_rows(&["**", "**"]);
        let mut rows = vec![0u64; 4];
        p.stamp(&mut rows, 4, usize::MAX, usize::MAX, false);
        assert_eq!(rows, vec![0; 4]);

        // usize::MAX % 4 == 3
        p.stamp(&mut rows, 4, usize::MAX, usize::MAX, true);
        assert_eq!(rows, vec![0b1001, 0, 0, 0b1001]);
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("22,12").unwrap(), (22, 12));
        assert_eq!(parse_position(" 3 , 4 ").unwrap(), (3, 4));
        assert!(parse_position("3").is_err());
        assert!(parse_position("a,b").is_err());
    }
}
