//! Parse-progress rendering
//!
//! A crossbeam channel decouples the pipeline from rendering: the
//! coordinator sends one message per processed file and a render thread
//! owns the indicatif bar. When stdout is not a terminal the bar is hidden
//! and progress surfaces only through the periodic log lines.

use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Progress { file: String },
    Finished,
}

pub struct ProgressReporter {
    handle: thread::JoinHandle<()>,
}

impl ProgressReporter {
    pub fn new(total_files: usize) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let bar = if console::Term::stdout().is_term() {
            let bar = ProgressBar::new(total_files as u64);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };

        let handle = thread::spawn(move || {
            for msg in rx {
                match msg {
                    ProgressMessage::Progress { file } => {
                        bar.inc(1);
                        bar.set_message(file);
                    }
                    ProgressMessage::Finished => {
                        bar.finish_with_message("done");
                        break;
                    }
                }
            }
        });

        (Self { handle }, tx)
    }

    /// Wait for the render thread to drain. Call after dropping all senders.
    pub fn finish(self) {
        let _ = self.handle.join();
    }
}
