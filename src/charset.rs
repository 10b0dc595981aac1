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

//! Output character encodings.

use std::str::FromStr;

use crate::Error;

/// The character encoding applied to formatted text before it reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// UTF-8; the default.
    #[default]
    Utf8,
    /// UTF-16, little-endian, no byte order mark.
    Utf16Le,
    /// UTF-16, big-endian, no byte order mark.
    Utf16Be,
}

impl Charset {
    /// Encode the text into bytes in this charset.
    ///
    /// All supported charsets can represent any Rust string, so this only
    /// fails if a future charset cannot; callers must still treat a failure
    /// as fatal for the text being encoded.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, Error> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Utf16Le => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(bytes)
            }
            Charset::Utf16Be => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_be_bytes());
                }
                Ok(bytes)
            }
        }
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(Charset::Utf8),
            "UTF-16LE" | "UTF16LE" => Ok(Charset::Utf16Le),
            "UTF-16BE" | "UTF16BE" => Ok(Charset::Utf16Be),
            _ => Err(Error::new(format!("unsupported charset: {s}"))),
        }
    }
}
