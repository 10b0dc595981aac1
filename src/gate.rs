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

//! A once-per-interval trigger shared between annotators.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// A gate that opens at most once per interval.
///
/// The gate holds the timestamp of its last fire, in milliseconds since the
/// Unix epoch. A fresh gate has never fired, so the first [`try_fire`] always
/// succeeds. The stored timestamp never moves backwards: a caller with a stale
/// clock reading simply observes the gate as cooling.
///
/// [`try_fire`]: RateGate::try_fire
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use logtint::RateGate;
///
/// let gate = RateGate::new(Duration::from_secs(1));
/// assert!(gate.try_fire(10_000));
/// assert!(!gate.try_fire(10_500));
/// assert!(gate.try_fire(11_000));
/// ```
#[derive(Debug)]
pub struct RateGate {
    last_fire: AtomicU64,
    interval_millis: u64,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

impl RateGate {
    /// Create a gate with the given interval.
    ///
    /// A zero interval makes the gate fire on every call.
    pub fn new(interval: Duration) -> Self {
        Self {
            last_fire: AtomicU64::new(0),
            interval_millis: interval.as_millis() as u64,
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_millis)
    }

    /// Try to fire the gate at the given instant, in milliseconds since the
    /// Unix epoch.
    ///
    /// Returns `true` iff the interval has elapsed since the last fire and
    /// this caller won the update. Under concurrent calls at the same instant,
    /// exactly one caller wins.
    pub fn try_fire(&self, now_millis: u64) -> bool {
        loop {
            let last = self.last_fire.load(Ordering::Acquire);
            if last != 0 && now_millis.saturating_sub(last) < self.interval_millis {
                return false;
            }
            match self.last_fire.compare_exchange(
                last,
                now_millis.max(last),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                // lost the race; re-check against the winner's timestamp
                Err(_) => continue,
            }
        }
    }

    /// The instant of the last fire, in milliseconds since the Unix epoch.
    /// Zero if the gate has never fired.
    pub fn last_fire(&self) -> u64 {
        self.last_fire.load(Ordering::Acquire)
    }
}

/// The current wall clock in milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    jiff::Timestamp::now().as_millisecond().max(0) as u64
}
