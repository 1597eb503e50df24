//! Spinners shown on stderr while stats requests are in flight.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressFinish, ProgressStyle};
use std::{borrow::Cow, time::Duration};

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const TICK: Duration = Duration::from_millis(80);

/// A group of spinners drawn together, one line each.
///
/// Nothing is drawn when stderr is not a terminal.
pub struct Progress {
    multi: MultiProgress,
}

impl Default for Progress {
    fn default() -> Self {
        Self::stderr()
    }
}

impl Progress {
    pub fn stderr() -> Self {
        Self { multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()) }
    }

    pub fn hidden() -> Self {
        Self { multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()) }
    }

    /// Start a ticking spinner with `message`. Dropping it clears the line.
    pub fn spinner(&self, message: impl Into<Cow<'static, str>>) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear));
        pb.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(TICK);
        pb
    }

    pub fn is_hidden(&self) -> bool {
        self.multi.is_hidden()
    }
}
