use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

/// Progress configuration for determining whether to show progress bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressConfig {
    /// Auto-detect based on TTY
    Auto,
    /// Force enable progress bars
    ForceEnable,
    /// Force disable progress bars
    ForceDisable,
}

impl ProgressConfig {
    /// Create a progress config from CLI flags and config file
    pub fn from_flags(progress_flag: bool, no_progress_flag: bool, config_value: Option<bool>) -> Self {
        if progress_flag {
            ProgressConfig::ForceEnable
        }
        else if no_progress_flag {
            ProgressConfig::ForceDisable
        }
        else {
            match config_value {
                Some(true) => ProgressConfig::ForceEnable,
                Some(false) => ProgressConfig::ForceDisable,
                None => ProgressConfig::Auto,
            }
        }
    }

    /// Determine if progress should be shown based on configuration
    pub fn should_show_progress(&self) -> bool {
        match self {
            ProgressConfig::Auto => atty::is(atty::Stream::Stderr),
            ProgressConfig::ForceEnable => true,
            ProgressConfig::ForceDisable => false,
        }
    }
}

/// Timer for tracking operation duration
#[derive(Debug, Clone)]
struct Timer {
    start: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time in seconds as a formatted string
    fn elapsed_string(&self) -> String {
        format!("{:.2}s", self.start.elapsed().as_secs_f64())
    }
}

/// Spinner for indeterminate operations
pub struct Spinner {
    bar: Option<ProgressBar>,
    timer: Timer,
}

impl Spinner {
    pub fn new(config: ProgressConfig, message: &str) -> Self {
        let bar = config.should_show_progress().then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_draw_target(ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({pos} files)") {
                pb.set_style(style);
            }
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Self {
            bar,
            timer: Timer::new(),
        }
    }

    /// Count one more processed item
    pub fn tick(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Print a line without tearing the spinner
    pub fn println(&self, line: &str) {
        match self.bar {
            Some(ref bar) => bar.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Finish and clear the spinner, returning elapsed time
    pub fn finish(self) -> String {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
        self.timer.elapsed_string()
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }
}
