//! Byte progress for streamed file downloads.
//!
//! Each file reports `"<file> Downloaded <n> of <total> bytes <pct>%"` every
//! time another `chunk_size` bytes have arrived, and once more on completion.
//! When stderr is a terminal an indicatif bar is drawn as well.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Instant;
use tracing::{debug, info};

/// Progress of a single file download
pub struct ByteProgress {
    file_name: String,
    bytes_so_far: u64,
    total: Option<u64>,
    chunk_size: u64,
    next_report: u64,
    start_time: Instant,
    bar: ProgressBar,
}

impl ByteProgress {
    /// Track `file_name`, reporting every `chunk_size` bytes
    pub fn new(file_name: impl Into<String>, total: Option<u64>, chunk_size: usize) -> Self {
        let file_name = file_name.into();
        let chunk_size = chunk_size.max(1) as u64;
        let bar = if std::io::stderr().is_terminal() {
            create_progress_bar(&file_name, total)
        } else {
            ProgressBar::hidden()
        };

        Self {
            file_name,
            bytes_so_far: 0,
            total,
            chunk_size,
            next_report: chunk_size,
            start_time: Instant::now(),
            bar,
        }
    }

    /// Tracker that never draws a bar
    pub fn quiet(file_name: impl Into<String>, total: Option<u64>, chunk_size: usize) -> Self {
        let mut progress = Self::new(file_name, total, chunk_size);
        progress.bar = ProgressBar::hidden();
        progress
    }

    /// Bytes received so far
    pub fn bytes_so_far(&self) -> u64 {
        self.bytes_so_far
    }

    /// Announced total, if any
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Completion percentage rounded to two decimals
    pub fn percentage(&self) -> Option<f64> {
        let total = self.total?;
        if total == 0 {
            return Some(100.0);
        }
        let pct = 100.0 * self.bytes_so_far as f64 / total as f64;
        Some((pct * 100.0).round() / 100.0)
    }

    /// Record `n` more bytes
    pub fn update(&mut self, n: u64) {
        self.bytes_so_far = self.bytes_so_far.saturating_add(n);
        self.bar.set_position(self.bytes_so_far);

        if self.bytes_so_far >= self.next_report {
            debug!(file = %self.file_name, "{}", self.format_progress());
            while self.next_report <= self.bytes_so_far {
                self.next_report = self.next_report.saturating_add(self.chunk_size);
            }
        }
    }

    /// Human-readable progress line
    pub fn format_progress(&self) -> String {
        match (self.total, self.percentage()) {
            (Some(total), Some(pct)) => format!(
                "{} Downloaded {} of {} bytes {}%",
                self.file_name, self.bytes_so_far, total, pct
            ),
            _ => format!(
                "{} Downloaded {} bytes",
                self.file_name, self.bytes_so_far
            ),
        }
    }

    /// Report completion and clear the bar
    pub fn finish(&self) {
        self.bar.finish_and_clear();
        info!(
            file = %self.file_name,
            bytes = self.bytes_so_far,
            elapsed_ms = self.start_time.elapsed().as_millis() as u64,
            "{}",
            self.format_progress()
        );
    }

    /// Clear the bar after a failure
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

fn create_progress_bar(file_name: &str, total: Option<u64>) -> ProgressBar {
    let pb = match total {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(file_name.to_string());
    pb
}
