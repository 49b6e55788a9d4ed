//! Bar chart rendering
//!
//! Draws the sequence as one vertical bar per value, scaled to the chart
//! height, with the two positions of the last step highlighted.

use crate::config::DEFAULT_CHART_ROWS;
use crate::sorter::{Step, StepKind};

/// ANSI red, used for swap highlights
const SWAP_COLOR: &str = "\x1b[31m";
const RESET_COLOR: &str = "\x1b[0m";

/// Highlight state of a single bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Swap,
}

impl From<StepKind> for Highlight {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Swap => Highlight::Swap,
        }
    }
}

/// One bar of the chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Fraction of the chart height, equal to the value
    pub height: f64,
    pub highlight: Highlight,
}

/// Map values to bars, highlighting the indices of `step`
pub fn bars(values: &[f64], step: Option<&Step>) -> Vec<Bar> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| Bar {
            height: value,
            highlight: match step {
                Some(s) if s.touches(i) => s.kind.into(),
                _ => Highlight::None,
            },
        })
        .collect()
}

/// Terminal renderer for bar charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarChart {
    /// Chart height in character rows
    rows: usize,
    /// Emit ANSI colour codes
    color: bool,
}

impl BarChart {
    /// Create a chart `rows` characters tall
    pub fn new(rows: usize) -> Self {
        Self {
            rows: rows.max(1),
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Render the values as a framed chart, one column per value
    pub fn render(&self, values: &[f64], step: Option<&Step>) -> String {
        let bars = bars(values, step);
        let mut output = String::new();

        // Top border
        output.push('+');
        output.push_str(&"-".repeat(bars.len()));
        output.push_str("+\n");

        for row in (0..self.rows).rev() {
            output.push('|');
            for bar in &bars {
                let ch = self.cell(bar, row);
                if self.color && bar.highlight == Highlight::Swap && ch != ' ' {
                    output.push_str(SWAP_COLOR);
                    output.push(ch);
                    output.push_str(RESET_COLOR);
                } else {
                    output.push(ch);
                }
            }
            output.push_str("|\n");
        }

        // Bottom border
        output.push('+');
        output.push_str(&"-".repeat(bars.len()));
        output.push('+');

        output
    }

    /// Glyph for `bar` at `row` (0 is the bottom row)
    fn cell(&self, bar: &Bar, row: usize) -> char {
        let filled = bar.height.clamp(0.0, 1.0) * self.rows as f64;
        let cover = filled - row as f64;
        if cover >= 1.0 {
            return '█';
        }
        if cover <= 0.0 {
            return ' ';
        }
        // Partial top cell, chosen by how much of it the bar covers
        match (cover * 4.0) as usize {
            0 => ' ',
            1 => '░',
            2 => '▒',
            _ => '▓',
        }
    }
}

impl Default for BarChart {
    fn default() -> Self {
        Self::new(DEFAULT_CHART_ROWS)
    }
}
