// Copyright 2026 Business Directory Contributors
// SPDX-License-Identifier: MIT

//! Terminal progress display for the export scan.
//!
//! Uses `indicatif` to show a row counter with throughput while pages are
//! consumed, and prints a line for each sealed segment above the bar.

use crate::cli::output::{self, Styled};
use crate::exporter::ExportProgress;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar over the company rows of one export.
pub struct ScanProgress {
    bar: ProgressBar,
    styled: Styled,
}

impl ScanProgress {
    /// Create a bar that draws to stderr, or a hidden one in quiet/JSON mode.
    pub fn new() -> Self {
        let bar = if output::is_quiet() || output::is_json() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        Self {
            bar,
            styled: Styled::new(),
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(concat!(
        "  {spinner:.cyan} [{bar:30.cyan/blue}] {human_pos}/{human_len} rows",
        " ({percent}%) {per_sec} eta {eta}",
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("\u{2588}\u{2589}\u{2591}")
}

impl ExportProgress for ScanProgress {
    fn started(&self, total_rows: u64) {
        self.bar.set_length(total_rows);
        self.bar.set_style(bar_style());
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn page_done(&self, processed: u64, total_rows: u64, _elapsed: Duration) {
        // The table can grow while it is being scanned.
        if processed > total_rows {
            self.bar.set_length(processed);
        }
        self.bar.set_position(processed);
    }

    fn segment_sealed(&self, filename: &str, urls: usize) {
        self.bar.println(format!(
            "  {} {filename:<30} {}",
            self.styled.ok_sym(),
            self.styled.dim(&format!("{} URLs", output::format_count(urls as u64)))
        ));
    }

    fn finished(&self, processed: u64) {
        self.bar.set_position(processed);
        self.bar.finish_and_clear();
    }
}
