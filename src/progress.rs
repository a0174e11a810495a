//! Progress reporting for the batch renderer.
//!
//! Two strategies, chosen once per batch by a capability check and never
//! affecting which files are processed:
//!
//! - **Bar**: a live progress bar with a known maximum, when the `progress`
//!   feature is compiled in, stdout is a terminal, and the operator did not
//!   pass `--no-progress`.
//! - **Plain**: one `Processing: <file>` line per file on stdout, otherwise.

use std::io::IsTerminal;

/// Operator-selected reporting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Use a progress bar when the capability is available.
    Auto,
    /// Always print plain per-file lines.
    Disabled,
}

/// An active reporting strategy for one batch.
pub enum Reporter {
    Plain,
    #[cfg(feature = "progress")]
    Bar(indicatif::ProgressBar),
}

impl Reporter {
    /// Pick a strategy for a batch of `count` files.
    pub fn start(mode: ProgressMode, count: u64) -> Self {
        match mode {
            ProgressMode::Disabled => Reporter::Plain,
            ProgressMode::Auto if !std::io::stdout().is_terminal() => Reporter::Plain,
            ProgressMode::Auto => Self::bar(count),
        }
    }

    #[cfg(feature = "progress")]
    fn bar(count: u64) -> Self {
        let bar = indicatif::ProgressBar::new(count);
        bar.set_style(
            indicatif::ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bar:40} {percent:>3}% ({eta})",
            )
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        Reporter::Bar(bar)
    }

    #[cfg(not(feature = "progress"))]
    fn bar(_count: u64) -> Self {
        Reporter::Plain
    }

    /// Report one processed file.
    pub fn file_done(&self, file_name: &str) {
        match self {
            Reporter::Plain => println!("Processing: {file_name}"),
            #[cfg(feature = "progress")]
            Reporter::Bar(bar) => bar.inc(1),
        }
    }

    /// Finish the batch.
    pub fn finish(self) {
        match self {
            Reporter::Plain => {}
            #[cfg(feature = "progress")]
            Reporter::Bar(bar) => bar.finish(),
        }
    }
}
