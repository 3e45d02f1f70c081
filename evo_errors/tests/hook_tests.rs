//! Panic hook integration.
//!
//! The hook is process-global, so this binary holds a single test that
//! installs it once and drives every case in sequence.

use evo_errors::config::{HookConfig, HookOutput, LogLevel};
use evo_errors::{check, err};
use std::io;
use std::panic::{self, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn hook_reports_errors_and_forwards_the_rest() {
    let forwarded = Arc::new(AtomicUsize::new(0));
    let counter = forwarded.clone();
    panic::set_hook(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    evo_errors::install_hook(HookConfig {
        show_location: false,
        output: HookOutput::Tracing,
        level: LogLevel::Warn,
        ..HookConfig::default()
    });

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let result = catch_unwind(|| {
            check(Err(err!("spindle stalled: {}", evo_errors::new("overcurrent"))))
        });
        assert!(result.is_err());

        let result = catch_unwind(|| panic!("plain string payload"));
        assert!(result.is_err());
    });

    drop(panic::take_hook());

    let output = captured.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("spindle stalled: overcurrent\novercurrent"));
    assert!(!output.contains("plain string payload"));
    assert_eq!(forwarded.load(Ordering::SeqCst), 1);
}
