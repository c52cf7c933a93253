//! Spinner driven by reconciliation phase callbacks.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use ncsync_core::{DeviceReport, Phase, ReconcileObserver};

pub struct Spinner {
    bar: ProgressBar,
    total: usize,
    finished: usize,
}

impl Spinner {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{prefix}] {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        let spinner = Self {
            bar,
            total,
            finished: 0,
        };
        spinner.update_prefix();
        spinner
    }

    fn update_prefix(&self) {
        self.bar
            .set_prefix(format!("{}/{}", self.finished + 1, self.total));
    }
}

impl ReconcileObserver for Spinner {
    fn on_phase(&mut self, address: &str, phase: Phase) {
        self.bar.set_message(format!("{address}: {phase}"));
    }

    fn on_report(&mut self, report: &DeviceReport) {
        self.finished += 1;
        let line = match report.outcome.failure() {
            None => format!("✓ {}", report.address),
            Some(failure) => format!("✗ {}: {failure}", report.address),
        };
        self.bar.println(line);
        if self.finished < self.total {
            self.update_prefix();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
