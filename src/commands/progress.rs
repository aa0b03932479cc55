//! Terminal progress bars for flash operations

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sfflash_core::chip::Bank;
use sfflash_core::flash::Progress;

/// Progress reporter using indicatif progress bars
///
/// Each phase gets its own bar running from 0 to 100 percent.
pub struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
        }
    }

    fn create_bar(&mut self, phase: String) {
        self.finish_current();
        let pb = self.multi.add(ProgressBar::new(100));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos:>3}}% ({{eta}}) {}",
                    phase
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.current_bar = Some(pb);
    }

    fn create_spinner(&mut self, message: String) {
        self.finish_current();
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn set_position(&self, percent: u32) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(percent as u64);
        }
    }

    fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish();
        }
    }

    fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        // Keep the last bar on screen
        if let Some(pb) = self.current_bar.take() {
            pb.abandon();
        }
    }
}

impl Progress for IndicatifProgress {
    fn erasing_bank(&mut self, bank: Bank) {
        self.create_bar(format!("Erasing bank {}", bank));
    }

    fn erase_progress(&mut self, percent: u32) {
        self.set_position(percent);
    }

    fn erasing_chip(&mut self) {
        self.create_spinner("Erasing chip...".to_string());
    }

    fn chip_erased(&mut self) {
        self.finish("Chip erased");
    }

    fn writing(&mut self, total_bytes: u32) {
        self.create_bar(format!("Writing {} bytes", total_bytes));
    }

    fn write_progress(&mut self, percent: u32) {
        self.set_position(percent);
    }

    fn verifying(&mut self, total_bytes: u32) {
        self.create_bar(format!("Verifying {} bytes", total_bytes));
    }

    fn verify_progress(&mut self, percent: u32) {
        self.set_position(percent);
    }

    fn verified(&mut self) {
        self.finish_current();
    }
}
