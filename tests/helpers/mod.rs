pub mod fake_sink;

use progress_notify::{Notifier, ProgressReporter};
use std::sync::Arc;
use std::time::Duration;

use fake_sink::RecordingSink;

/// Creates a recording sink and a reporter dispatching into it.
pub fn recording_reporter(message: &str, interval: Duration) -> (RecordingSink, ProgressReporter) {
    let sink = RecordingSink::new();
    let reporter = ProgressReporter::new(Notifier::with_sink(Arc::new(sink.clone())), message)
        .with_interval(interval)
        .expect("test interval must be positive");
    (sink, reporter)
}
