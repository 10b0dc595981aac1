// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The color annotator, the heart of this crate.

use std::fmt;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use log::Record;

use crate::Charset;
use crate::Error;
use crate::RateGate;
use crate::color;
use crate::gate::now_millis;

/// Wall-clock format of the timestamp marker, e.g. `2024.08.11, 10:44:57 PM`.
const MARKER_TIME_FORMAT: &str = "%Y.%m.%d, %I:%M:%S %p";

/// An annotator that writes color-coded log records to a sink, interleaving a
/// timestamp marker at most once per interval.
///
/// Every call to [`annotate`](Annotator::annotate) produces exactly one record
/// write. When the gate is open, the record write is preceded by a marker
/// write: the current wall-clock time in yellow, ended with a colon. Marker
/// failures are swallowed and counted; record failures are returned.
///
/// The sink is locked for the whole call, so the marker and the record of one
/// event never interleave with another thread's output.
///
/// # Examples
///
/// ```
/// use logtint::Annotator;
///
/// let annotator = Annotator::builder(std::io::stdout()).build();
/// ```
pub struct Annotator {
    sink: Mutex<Box<dyn Write + Send>>,
    charset: Charset,
    gate: Arc<RateGate>,
    marker_failures: AtomicU64,
}

impl fmt::Debug for Annotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotator")
            .field("charset", &self.charset)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl Annotator {
    /// Create a builder over the given sink.
    pub fn builder(sink: impl Write + Send + 'static) -> AnnotatorBuilder {
        AnnotatorBuilder {
            sink: Box::new(sink),
            charset: Charset::default(),
            interval: Duration::from_millis(1000),
            gate: None,
        }
    }

    /// Annotate one log record: possibly write the timestamp marker, then
    /// always write the color-coded record body, flushing after each write.
    ///
    /// Returns an error if encoding the record body fails or the sink rejects
    /// the body write. Marker failures are not surfaced here; see
    /// [`marker_failures`](Annotator::marker_failures).
    pub fn annotate(&self, record: &Record) -> Result<(), Error> {
        self.annotate_at(record, now_millis())
    }

    pub(crate) fn annotate_at(&self, record: &Record, now: u64) -> Result<(), Error> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);

        if self.gate.try_fire(now) {
            // best-effort: a failed marker must not fail the record
            if self.write_marker(sink.as_mut()).is_err() {
                self.marker_failures.fetch_add(1, Ordering::Relaxed);
            }
        }

        let body = format_body(record);
        let bytes = self.charset.encode(&body)?;
        sink.write_all(&bytes)
            .map_err(|err| Error::new("failed to write log record").with_source(err))?;
        sink.flush()
            .map_err(|err| Error::new("failed to flush log record").with_source(err))?;
        Ok(())
    }

    fn write_marker(&self, sink: &mut dyn Write) -> Result<(), Error> {
        let time = jiff::fmt::strtime::format(MARKER_TIME_FORMAT, &jiff::Zoned::now())
            .map_err(|err| Error::new("failed to format marker time").with_source(err))?;
        let marker = format!("{}{}:{}", color::MARKER, time, color::NEUTRAL);
        let bytes = self.charset.encode(&marker)?;
        sink.write_all(&bytes)
            .map_err(|err| Error::new("failed to write marker").with_source(err))?;
        sink.flush()
            .map_err(|err| Error::new("failed to flush marker").with_source(err))?;
        Ok(())
    }

    /// The number of timestamp markers dropped because formatting, encoding,
    /// or the sink write failed.
    pub fn marker_failures(&self) -> u64 {
        self.marker_failures.load(Ordering::Relaxed)
    }

    /// The gate limiting marker emission.
    pub fn gate(&self) -> &Arc<RateGate> {
        &self.gate
    }
}

fn format_body(record: &Record) -> String {
    let mut text = String::with_capacity(128);
    text.push('\n');
    text.push_str(color::level_color(record.level()));
    // SAFETY: write to a string always succeeds
    write!(&mut text, "[{}] - {}", record.level(), record.args()).unwrap();
    text.push_str(color::RESET);
    text
}

/// A builder for [`Annotator`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use logtint::Annotator;
/// use logtint::Charset;
///
/// let annotator = Annotator::builder(std::io::stderr())
///     .charset(Charset::Utf8)
///     .interval(Duration::from_secs(5))
///     .build();
/// ```
#[must_use = "call `build` to obtain an annotator"]
pub struct AnnotatorBuilder {
    sink: Box<dyn Write + Send>,
    charset: Charset,
    interval: Duration,
    gate: Option<Arc<RateGate>>,
}

impl AnnotatorBuilder {
    /// Set the output charset. Default to UTF-8.
    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Set the minimum interval between two timestamp markers. Default to
    /// 1000 milliseconds. A zero interval emits a marker for every record.
    ///
    /// Ignored if a shared gate is set with [`gate`](AnnotatorBuilder::gate).
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Share a gate with other annotators, so that they compete for the same
    /// marker window instead of each keeping their own.
    pub fn gate(mut self, gate: Arc<RateGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Build the annotator.
    pub fn build(self) -> Annotator {
        let gate = self
            .gate
            .unwrap_or_else(|| Arc::new(RateGate::new(self.interval)));
        Annotator {
            sink: Mutex::new(self.sink),
            charset: self.charset,
            gate,
            marker_failures: AtomicU64::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;
    use std::sync::Mutex;

    use log::Level;

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// A sink that rejects the first `fail` writes and accepts the rest.
    #[derive(Debug, Clone, Default)]
    struct FlakySink {
        inner: SharedSink,
        fail: Arc<Mutex<usize>>,
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut fail = self.fail.lock().unwrap();
            if *fail > 0 {
                *fail -= 1;
                return Err(io::Error::other("sink rejected write"));
            }
            drop(fail);
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn annotate(annotator: &Annotator, level: Level, message: &str, now: u64) {
        annotator
            .annotate_at(
                &Record::builder()
                    .level(level)
                    .args(format_args!("{message}"))
                    .build(),
                now,
            )
            .unwrap();
    }

    #[test]
    fn test_marker_time_format() {
        let zdt: jiff::Zoned = "2024-08-11T22:44:57+02:00[+02:00]".parse().unwrap();
        let time = jiff::fmt::strtime::format(MARKER_TIME_FORMAT, &zdt).unwrap();
        assert_eq!(time, "2024.08.11, 10:44:57 PM");
    }

    #[test]
    fn test_body_bytes_for_error_record() {
        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone()).build();

        annotate(&annotator, Level::Error, "disk full", 10_000);

        let contents = contents_without_marker(&sink);
        assert_eq!(contents, b"\n\x1b[01;31m[ERROR] - disk full\x1b[0m");
    }

    #[test]
    fn test_empty_message_in_cooling_window_has_no_marker() {
        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone()).build();

        annotate(&annotator, Level::Error, "warm-up", 10_000);
        let after_first = sink.contents().len();

        annotate(&annotator, Level::Info, "", 10_500);

        let contents = sink.contents()[after_first..].to_vec();
        assert_eq!(contents, b"\n\x1b[01;34m[INFO] - \x1b[0m");
    }

    #[test]
    fn test_marker_precedes_body_of_triggering_record() {
        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone()).build();

        annotate(&annotator, Level::Warn, "hello", 10_000);

        let contents = sink.contents();
        let text = String::from_utf8(contents).unwrap();
        let marker = text.strip_suffix("\n\x1b[01;35m[WARN] - hello\x1b[0m").unwrap();
        assert!(marker.starts_with("\x1b[1;33m"));
        assert!(marker.ends_with(":\x1b[0m"));
    }

    #[test]
    fn test_burst_emits_one_marker_per_window() {
        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone()).build();

        for i in 0..100 {
            annotate(&annotator, Level::Debug, "burst", 10_000 + i);
        }
        assert_eq!(count_markers(&sink), 1);

        annotate(&annotator, Level::Debug, "later", 11_000);
        assert_eq!(count_markers(&sink), 2);
    }

    #[test]
    fn test_each_level_gets_its_own_color() {
        let cases = [
            (Level::Error, "\x1b[01;31m"),
            (Level::Warn, "\x1b[01;35m"),
            (Level::Info, "\x1b[01;34m"),
            (Level::Debug, "\x1b[01;36m"),
            (Level::Trace, "\x1b[0;37m"),
        ];
        for (level, code) in cases {
            let sink = SharedSink::default();
            let annotator = Annotator::builder(sink.clone()).build();
            annotate(&annotator, level, "x", 10_000);

            let body = contents_without_marker(&sink);
            let body = String::from_utf8(body).unwrap();
            assert_eq!(body, format!("\n{code}[{level}] - x\x1b[0m"));
        }
    }

    #[test]
    fn test_ascii_body_length_is_message_plus_wrapper() {
        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone()).build();

        annotate(&annotator, Level::Info, "", 10_000);
        let empty_len = contents_without_marker(&sink).len();

        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone()).build();
        annotate(&annotator, Level::Info, "1234567890", 10_000);

        assert_eq!(contents_without_marker(&sink).len(), empty_len + 10);
    }

    #[test]
    fn test_utf16le_body_is_twice_the_ascii_length() {
        let sink = SharedSink::default();
        let annotator = Annotator::builder(sink.clone())
            .charset(Charset::Utf16Le)
            .build();

        annotate(&annotator, Level::Info, "ok", 10_000);

        let expected = "\n\x1b[01;34m[INFO] - ok\x1b[0m";
        let contents = sink.contents();
        let body = &contents[contents.len() - expected.len() * 2..];
        assert_eq!(body, Charset::Utf16Le.encode(expected).unwrap());
    }

    #[test]
    fn test_marker_failure_is_swallowed_and_counted() {
        let flaky = FlakySink::default();
        *flaky.fail.lock().unwrap() = 1;
        let inner = flaky.inner.clone();
        let annotator = Annotator::builder(flaky).build();

        // first write (the marker) is rejected; the record still goes through
        annotate(&annotator, Level::Error, "survives", 10_000);

        assert_eq!(annotator.marker_failures(), 1);
        assert_eq!(
            inner.contents(),
            b"\n\x1b[01;31m[ERROR] - survives\x1b[0m"
        );
    }

    #[test]
    fn test_failed_marker_is_not_retried_within_window() {
        let flaky = FlakySink::default();
        *flaky.fail.lock().unwrap() = 1;
        let inner = flaky.inner.clone();
        let annotator = Annotator::builder(flaky).build();

        annotate(&annotator, Level::Info, "first", 10_000);
        annotate(&annotator, Level::Info, "second", 10_100);

        assert_eq!(annotator.marker_failures(), 1);
        assert_eq!(count_marker_bytes(&inner), 0);
    }

    #[test]
    fn test_body_write_failure_propagates() {
        let flaky = FlakySink::default();
        *flaky.fail.lock().unwrap() = 2;
        let annotator = Annotator::builder(flaky).build();

        let err = annotator
            .annotate_at(
                &Record::builder()
                    .level(Level::Error)
                    .args(format_args!("doomed"))
                    .build(),
                10_000,
            )
            .unwrap_err();
        assert!(err.to_string().contains("failed to write log record"));
        assert_eq!(annotator.marker_failures(), 1);
    }

    #[test]
    fn test_shared_gate_across_annotators() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(1000)));
        let sink_a = SharedSink::default();
        let sink_b = SharedSink::default();
        let a = Annotator::builder(sink_a.clone()).gate(gate.clone()).build();
        let b = Annotator::builder(sink_b.clone()).gate(gate.clone()).build();

        annotate(&a, Level::Info, "one", 10_000);
        annotate(&b, Level::Info, "two", 10_200);

        assert_eq!(count_markers(&sink_a), 1);
        assert_eq!(count_markers(&sink_b), 0);
    }

    fn count_markers(sink: &SharedSink) -> usize {
        count_marker_bytes(sink)
    }

    fn count_marker_bytes(sink: &SharedSink) -> usize {
        let contents = sink.contents();
        let text = String::from_utf8(contents).unwrap();
        text.matches(color::MARKER).count()
    }

    fn contents_without_marker(sink: &SharedSink) -> Vec<u8> {
        let contents = sink.contents();
        let text = String::from_utf8(contents).unwrap();
        match text.rfind('\n') {
            Some(pos) => text[pos..].as_bytes().to_vec(),
            None => text.into_bytes(),
        }
    }
}
