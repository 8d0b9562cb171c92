//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars.

use linya::{Bar, Progress};

/// Progress bar for visibility poll rounds
pub struct PollProgress {
  progress: Progress,
  bar: Bar,
  total: usize,
  pos: usize,
}

impl PollProgress {
  /// Create a new progress bar sized to the number of poll rounds
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress,
      bar,
      total,
      pos: 0,
    }
  }

  /// Advance by one poll round
  pub fn inc(&mut self) {
    self.pos += 1;
    self.progress.inc_and_draw(&self.bar, 1);
  }

  /// Fill the bar on early success
  pub fn finish(&mut self) {
    if self.pos < self.total {
      self.progress.set_and_draw(&self.bar, self.total);
    }
  }
}
