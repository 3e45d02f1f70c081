//! Panic hook that renders [`Error`] payloads.
//!
//! The default Rust hook only knows how to print `&str` and `String`
//! payloads; a panic raised by [`crate::check`] would show up as
//! `Box<dyn Any>`. [`install_hook`] chains in front of the current hook and
//! reports such panics with their message, causes and origin.

use std::panic::{self, Location};
use std::thread;

use tracing::{debug, error, info, trace, warn};

use crate::config::{HookConfig, HookOutput, LogLevel};
use crate::error::Error;

/// Install a panic hook for [`Error`] payloads.
///
/// Panics carrying anything else are forwarded to the hook that was
/// installed before, unchanged. Like [`std::panic::set_hook`], this is
/// process-wide.
pub fn install_hook(config: HookConfig) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let Some(err) = info.payload().downcast_ref::<Error>() else {
            previous(info);
            return;
        };

        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        let report = render(err, &config, name, info.location());
        match config.output {
            HookOutput::Stderr => eprintln!("{report}"),
            HookOutput::Tracing => emit(config.level, &report),
        }
    }));
}

fn emit(level: LogLevel, report: &str) {
    match level {
        LogLevel::Trace => trace!(target: "evo_errors::panic", "{report}"),
        LogLevel::Debug => debug!(target: "evo_errors::panic", "{report}"),
        LogLevel::Info => info!(target: "evo_errors::panic", "{report}"),
        LogLevel::Warn => warn!(target: "evo_errors::panic", "{report}"),
        LogLevel::Error => error!(target: "evo_errors::panic", "{report}"),
    }
}

pub(crate) fn render(
    err: &Error,
    config: &HookConfig,
    thread: &str,
    panicked_at: Option<&Location<'_>>,
) -> String {
    let mut report = format!("thread '{thread}' panicked");
    if let Some(at) = panicked_at {
        report.push_str(&format!(" at {at}"));
    }
    report.push_str(":\n");

    if config.show_causes {
        report.push_str(&format!("{err:#}"));
    } else {
        report.push_str(&err.to_string());
    }

    if config.show_location {
        if let Some(created) = err.location() {
            report.push_str(&format!(
                "\n  created at {}:{}",
                created.file(),
                created.line()
            ));
        }
    }
    report
}
