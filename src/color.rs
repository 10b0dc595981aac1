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

//! ANSI escape sequences for coloring log output.
//!
//! The exact byte sequences are part of the output contract and must not change:
//! downstream consumers match on them.

use log::Level;

// Attribute codes:
// 00=none 01=bold 04=underscore 05=blink 07=reverse 08=concealed
//
// Text color codes:
// 30=black 31=red 32=green 33=yellow 34=blue 35=magenta 36=cyan 37=white

/// Color of the periodic timestamp marker.
pub const MARKER: &str = "\x1b[1;33m";
/// Neutral sequence terminating the timestamp marker.
pub const NEUTRAL: &str = "\x1b[0m";
/// Color of the ALL pseudo-level. Never selected for a record, kept for the table.
pub const ALL: &str = "\x1b[0m";
/// Color of error records.
pub const ERROR: &str = "\x1b[01;31m";
/// Color of warning records.
pub const WARN: &str = "\x1b[01;35m";
/// Color of info records.
pub const INFO: &str = "\x1b[01;34m";
/// Color of debug records.
pub const DEBUG: &str = "\x1b[01;36m";
/// Color of trace records.
pub const TRACE: &str = "\x1b[0;37m";
/// Reset sequence appended after every record body.
pub const RESET: &str = "\x1b[0m";

/// Look up the color for a record level.
pub fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => ERROR,
        Level::Warn => WARN,
        Level::Info => INFO,
        Level::Debug => DEBUG,
        Level::Trace => TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_level_has_a_distinct_color() {
        let levels = [
            Level::Error,
            Level::Warn,
            Level::Info,
            Level::Debug,
            Level::Trace,
        ];
        for (i, a) in levels.iter().enumerate() {
            for b in levels.iter().skip(i + 1) {
                assert_ne!(level_color(*a), level_color(*b));
            }
        }
    }
}
