//! Stack traces on JSON records.

use std::backtrace::Backtrace;
use std::fmt::{self, Write as _};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// JSON event format that adds a `stacktrace` field to every record at
/// `threshold` or more severe.
#[derive(Debug, Clone)]
pub struct WithStacktrace<F> {
    inner: F,
    threshold: Level,
}

impl<F> WithStacktrace<F> {
    pub fn new(inner: F, threshold: Level) -> Self {
        Self { inner, threshold }
    }
}

impl<S, N, F> FormatEvent<S, N> for WithStacktrace<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Levels compare by verbosity: TRACE is the greatest.
        if *event.metadata().level() > self.threshold {
            return self.inner.format_event(ctx, writer, event);
        }

        let mut record = String::new();
        self.inner
            .format_event(ctx, Writer::new(&mut record), event)?;

        let Some(body) = record.trim_end().strip_suffix('}') else {
            return writer.write_str(&record);
        };
        let trace = serde_json::to_string(&Backtrace::force_capture().to_string())
            .map_err(|_| fmt::Error)?;

        writeln!(writer, "{body},\"stacktrace\":{trace}}}")
    }
}
