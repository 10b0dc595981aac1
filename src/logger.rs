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

//! Bridge the annotator into the `log` facade.

use std::io::Write;

use log::LevelFilter;
use log::Metadata;
use log::Record;

use crate::Annotator;
use crate::Error;

/// Create a [`Builder`] around the given annotator.
///
/// # Examples
///
/// ```
/// use logtint::Annotator;
///
/// let annotator = Annotator::builder(std::io::stdout()).build();
/// logtint::builder(annotator).apply().unwrap();
///
/// log::info!("This is an info message.");
/// ```
pub fn builder(annotator: Annotator) -> Builder {
    Builder {
        annotator,
        max_level: LevelFilter::Trace,
    }
}

/// Create a [`Builder`] with a default annotator over stdout.
///
/// This is a convenient API that you can use as:
///
/// ```
/// logtint::stdout().apply().unwrap();
/// ```
pub fn stdout() -> Builder {
    builder(Annotator::builder(std::io::stdout()).build())
}

/// Create a [`Builder`] with a default annotator over stderr.
///
/// This is a convenient API that you can use as:
///
/// ```
/// logtint::stderr().apply().unwrap();
/// ```
pub fn stderr() -> Builder {
    builder(Annotator::builder(std::io::stderr()).build())
}

/// A builder for installing an [`Annotator`] as the global logger.
#[must_use = "call `apply` to set the global logger"]
#[derive(Debug)]
pub struct Builder {
    annotator: Annotator,
    max_level: LevelFilter,
}

impl Builder {
    /// Set the maximum level of records the logger lets through. Default to
    /// `Trace`.
    pub fn max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    /// Set up the global logger.
    ///
    /// Returns an error if a global logger has already been set.
    pub fn apply(self) -> Result<(), Error> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(Logger {
            annotator: self.annotator,
            max_level,
        }))
        .map_err(|err| Error::new("failed to set global logger").with_source(err))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

/// The annotator exposed as a [`log::Log`] implementation.
#[derive(Debug)]
pub struct Logger {
    annotator: Annotator,
    max_level: LevelFilter,
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Err(err) = self.annotator.annotate(record) {
                handle_annotate_error(record, err);
            }
        }
    }

    fn flush(&self) {}
}

fn handle_annotate_error(record: &Record, error: Error) {
    // stderr is the last resort; if it is gone too, there is nothing to do
    let _ = writeln!(
        std::io::stderr(),
        "error annotating log record: {error}\n    attempted to log: {args}",
        args = record.args(),
    );
}
