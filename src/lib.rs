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

//! Logtint annotates log records with ANSI colors by severity level and
//! interleaves a timestamp marker into the stream at most once per interval,
//! no matter how many records arrive.
//!
//! # Overview
//!
//! The central type is [`Annotator`]: it owns a byte sink, formats every
//! record as `\n{color}[{LEVEL}] - {message}{reset}`, and fronts it with a
//! yellow wall-clock marker whenever its [`RateGate`] opens. Marker emission
//! is best-effort: failures are counted, never surfaced, never retried.
//!
//! # Examples
//!
//! Install an annotator over stdout as the global logger:
//!
//! ```
//! logtint::stdout().apply().unwrap();
//!
//! log::info!("This is an info message.");
//! ```
//!
//! Annotate into a custom sink with a 5 second marker interval:
//!
//! ```
//! use std::time::Duration;
//!
//! use logtint::Annotator;
//!
//! let annotator = Annotator::builder(Vec::<u8>::new())
//!     .interval(Duration::from_secs(5))
//!     .build();
//! logtint::builder(annotator).apply().unwrap();
//!
//! log::warn!("Watch out!");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]

pub mod color;

mod annotate;
mod charset;
mod error;
mod gate;
mod logger;

pub use annotate::Annotator;
pub use annotate::AnnotatorBuilder;
pub use charset::Charset;
pub use error::Error;
pub use gate::RateGate;
pub use logger::Builder;
pub use logger::Logger;
pub use logger::builder;
pub use logger::stderr;
pub use logger::stdout;
