use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier};
use ratatui::{Frame, Terminal, backend::TestBackend};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A horizontal run of cells sharing one non-default style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRun {
    pub y: u16,
    pub x: u16,
    pub len: u16,
    pub fg: String,
    pub bg: String,
    pub modifier: String,
}

impl StyleRun {
    fn same_style(&self, other: &StyleRun) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.modifier == other.modifier
    }
}

/// Captured cell grid of one rendered frame.
///
/// Text is kept row by row so reference files stay readable in review; only
/// cells with a non-default style produce style runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub width: u16,
    pub height: u16,
    pub lines: Vec<String>,
    /// Cell symbols row by row. A symbol is a whole grapheme and may span
    /// several chars, so comparisons index this rather than `lines`.
    #[serde(default)]
    pub symbols: Vec<Vec<String>>,
    #[serde(default)]
    pub styles: Vec<StyleRun>,
}

impl Artifact {
    /// Render `draw` into an off-screen `TestBackend` of the given size.
    pub fn capture<F>(width: u16, height: u16, draw: F) -> std::io::Result<Self>
    where
        F: FnOnce(&mut Frame, Rect),
    {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend)?;
        terminal.draw(|f| {
            let area = f.area();
            draw(f, area);
        })?;
        Ok(Self::from_buffer(terminal.backend().buffer()))
    }

    pub fn from_buffer(buffer: &Buffer) -> Self {
        let width = buffer.area.width;
        let height = buffer.area.height;
        let content = buffer.content();

        let mut lines = Vec::with_capacity(height as usize);
        let mut symbols = Vec::with_capacity(height as usize);
        let mut styles = Vec::new();

        for y in 0..height {
            let mut line = String::with_capacity(width as usize);
            let mut row = Vec::with_capacity(width as usize);
            let mut current: Option<StyleRun> = None;

            for x in 0..width {
                let cell = &content[y as usize * width as usize + x as usize];
                line.push_str(cell.symbol());
                row.push(cell.symbol().to_string());

                let run = style_of(cell).map(|(fg, bg, modifier)| StyleRun {
                    y,
                    x,
                    len: 1,
                    fg,
                    bg,
                    modifier,
                });

                current = match (current, run) {
                    (Some(mut open), Some(next)) if open.same_style(&next) => {
                        open.len += 1;
                        Some(open)
                    }
                    (open, next) => {
                        styles.extend(open);
                        next
                    }
                };
            }
            styles.extend(current);
            lines.push(line);
            symbols.push(row);
        }

        Self {
            width,
            height,
            lines,
            symbols,
            styles,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn total_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Plain text of the grid, rows separated by `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn style_grid(&self) -> Vec<Option<&StyleRun>> {
        let mut grid = vec![None; self.total_cells()];
        for run in &self.styles {
            for x in run.x..run.x.saturating_add(run.len).min(self.width) {
                if run.y < self.height {
                    grid[run.y as usize * self.width as usize + x as usize] = Some(run);
                }
            }
        }
        grid
    }

    /// Symbols of row `y`, one per cell. References written without
    /// `symbols` fall back to one char per cell.
    fn row_symbols(&self, y: usize) -> Vec<&str> {
        if let Some(row) = self.symbols.get(y) {
            return row.iter().map(String::as_str).collect();
        }
        self.lines
            .get(y)
            .map(|line| {
                line.char_indices()
                    .map(|(i, c)| &line[i..i + c.len_utf8()])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Per-cell difference mask against `other`. Both artifacts must share a size.
    fn difference_mask(&self, other: &Artifact) -> Vec<bool> {
        let ours = self.style_grid();
        let theirs = other.style_grid();
        let mut mask = vec![false; self.total_cells()];

        for y in 0..self.height as usize {
            let expected = self.row_symbols(y);
            let actual = other.row_symbols(y);

            for x in 0..self.width as usize {
                let idx = y * self.width as usize + x;
                let text_differs = expected.get(x) != actual.get(x);
                let style_differs = match (ours[idx], theirs[idx]) {
                    (None, None) => false,
                    (Some(a), Some(b)) => !a.same_style(b),
                    _ => true,
                };
                mask[idx] = text_differs || style_differs;
            }
        }
        mask
    }

    /// Number of cells whose symbol or style differs. `None` when sizes differ.
    pub fn differing_cells(&self, other: &Artifact) -> Option<usize> {
        if self.size() != other.size() {
            return None;
        }
        Some(self.difference_mask(other).iter().filter(|d| **d).count())
    }

    /// Human-readable report of the rows that differ between `self` (reference) and `actual`.
    pub fn diff_report(&self, actual: &Artifact) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "--- reference {}x{}", self.width, self.height);
        let _ = writeln!(out, "+++ actual    {}x{}", actual.width, actual.height);

        if self.size() != actual.size() {
            let _ = writeln!(out, "sizes differ, showing both grids");
            for line in &self.lines {
                let _ = writeln!(out, "-|{line}|");
            }
            for line in &actual.lines {
                let _ = writeln!(out, "+|{line}|");
            }
            return out;
        }

        let mask = self.difference_mask(actual);
        let width = self.width as usize;
        let mut differing = 0;

        for y in 0..self.height as usize {
            let row = &mask[y * width..(y + 1) * width];
            let expected = self.lines.get(y).map(String::as_str).unwrap_or_default();
            if !row.iter().any(|d| *d) {
                let _ = writeln!(out, " |{expected}|");
                continue;
            }

            let actual_line = actual.lines.get(y).map(String::as_str).unwrap_or_default();
            let markers: String = row.iter().map(|d| if *d { '^' } else { ' ' }).collect();
            differing += row.iter().filter(|d| **d).count();

            let _ = writeln!(out, "-|{expected}|");
            let _ = writeln!(out, "+|{actual_line}|");
            let _ = writeln!(out, "  {}", markers.trim_end());
        }

        let _ = writeln!(out, "{differing} of {} cells differ", self.total_cells());
        out
    }
}

fn style_of(cell: &Cell) -> Option<(String, String, String)> {
    if cell.fg == Color::Reset && cell.bg == Color::Reset && cell.modifier == Modifier::empty() {
        return None;
    }
    Some((
        format!("{:?}", cell.fg),
        format!("{:?}", cell.bg),
        format!("{:?}", cell.modifier),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Style, Stylize};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::Paragraph;

    fn plain(text: &'static str, width: u16, height: u16) -> Artifact {
        Artifact::capture(width, height, |f, area| {
            f.render_widget(Paragraph::new(text), area);
        })
        .unwrap()
    }

    #[test]
    fn test_capture_pads_rows_to_width() {
        let artifact = plain("hi", 4, 2);
        assert_eq!(artifact.lines, vec!["hi  ".to_string(), "    ".to_string()]);
        assert!(artifact.styles.is_empty());
    }

    #[test]
    fn test_style_runs_are_merged() {
        let artifact = Artifact::capture(6, 1, |f, area| {
            let line = Line::from(vec![Span::styled("abc", Style::default().red()), Span::raw("de")]);
            f.render_widget(Paragraph::new(line), area);
        })
        .unwrap();

        assert_eq!(artifact.styles.len(), 1);
        let run = &artifact.styles[0];
        assert_eq!((run.y, run.x, run.len), (0, 0, 3));
        assert_eq!(run.fg, "Red");
    }

    #[test]
    fn test_identical_renders_have_no_difference() {
        let a = plain("same", 8, 2);
        let b = plain("same", 8, 2);
        assert_eq!(a.differing_cells(&b), Some(0));
    }

    #[test]
    fn test_text_and_style_differences_are_counted() {
        let a = plain("abcd", 4, 1);
        let b = plain("abXd", 4, 1);
        assert_eq!(a.differing_cells(&b), Some(1));

        let styled = Artifact::capture(4, 1, |f, area| {
            f.render_widget(Paragraph::new("abcd").bold(), area);
        })
        .unwrap();
        assert_eq!(a.differing_cells(&styled), Some(4));
    }

    #[test]
    fn test_size_mismatch_is_not_comparable() {
        let a = plain("x", 4, 1);
        let b = plain("x", 5, 1);
        assert_eq!(a.differing_cells(&b), None);
        assert!(a.diff_report(&b).contains("sizes differ"));
    }

    #[test]
    fn test_multi_char_graphemes_stay_aligned_with_cells() {
        let a = plain("e\u{301}bcd", 4, 1);
        let b = plain("e\u{301}bcX", 4, 1);
        assert_eq!(a.symbols[0][0], "e\u{301}");
        assert_eq!(a.differing_cells(&b), Some(1));

        let c = plain("e\u{301}bcd", 4, 1);
        assert_eq!(a.differing_cells(&c), Some(0));
    }

    #[test]
    fn test_wide_characters_are_compared_per_cell() {
        let a = plain("a世b", 4, 1);
        let b = plain("a世c", 4, 1);
        assert_eq!(a.symbols[0].len(), 4);
        assert_eq!(a.differing_cells(&b), Some(1));

        let swapped = plain("a界b", 4, 1);
        assert_eq!(a.differing_cells(&swapped), Some(1));
    }

    #[test]
    fn test_reference_without_symbols_falls_back_to_chars() {
        let mut legacy = plain("abcd", 4, 1);
        legacy.symbols.clear();
        assert_eq!(legacy.differing_cells(&plain("abcd", 4, 1)), Some(0));
        assert_eq!(legacy.differing_cells(&plain("abXd", 4, 1)), Some(1));
    }

    #[test]
    fn test_diff_report_marks_columns() {
        let a = plain("abcd", 4, 1);
        let b = plain("abXd", 4, 1);
        let report = a.diff_report(&b);
        assert!(report.contains("-|abcd|"));
        assert!(report.contains("+|abXd|"));
        assert!(report.contains("    ^"));
        assert!(report.contains("1 of 4 cells differ"));
    }
}
