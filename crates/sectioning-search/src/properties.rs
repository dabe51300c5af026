// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! String key/value configuration.
//!
//! Values are read lazily through typed getters. A value that does not parse
//! as the requested type is reported at `warn` and the default is used, so a
//! misconfigured key never stops a run. [`Properties::try_get`] exposes the
//! strict variant.

use crate::error::PropertyError;
use rustc_hash::FxHashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: FxHashMap<String, String>,
}

impl Properties {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses `key = value` lines. Blank lines and lines starting with `#`
    /// are skipped; lines without `=` are reported and skipped.
    pub fn parse(text: &str) -> Self {
        let mut properties = Self::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    properties.set(key.trim(), value.trim());
                }
                None => tracing::warn!(
                    line = number + 1,
                    text = line,
                    "ignoring property line without `=`"
                ),
            }
        }
        properties
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The parsed value, `Ok(None)` if the key is missing.
    pub fn try_get<T: FromStr>(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, PropertyError> {
        let Some(raw) = self.values.get(key) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|_| PropertyError {
            key: key.to_string(),
            value: raw.clone(),
            expected,
        })
    }

    fn get_or<T: FromStr>(&self, key: &str, expected: &'static str, default: T) -> T {
        match self.try_get(key, expected) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(error) => {
                tracing::warn!(%error, "using default");
                default
            }
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_or(key, "a boolean", default)
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.get_or(key, "an unsigned integer", default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, "a number", default)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let properties: Properties = [
            ("Neighbour.BranchAndBoundTimeout", "250"),
            ("Sectioning.MPP", "true"),
            ("Sectioning.OnlineEpsilon", "0.25"),
            ("Sectioning.StudentOrder", "Priority"),
        ]
        .into_iter()
        .collect();
        assert_eq!(properties.get_u64("Neighbour.BranchAndBoundTimeout", 1000), 250);
        assert!(properties.get_bool("Sectioning.MPP", false));
        assert_eq!(properties.get_f64("Sectioning.OnlineEpsilon", 0.1), 0.25);
        assert_eq!(properties.get_str("Sectioning.StudentOrder"), Some("Priority"));
        assert_eq!(properties.get_u64("Missing", 7), 7);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        let mut properties = Properties::new();
        properties.set("Sectioning.RetryLimit", "three");
        assert_eq!(properties.get_u64("Sectioning.RetryLimit", 3), 3);
        let error = properties
            .try_get::<u64>("Sectioning.RetryLimit", "an unsigned integer")
            .unwrap_err();
        assert_eq!(error.value, "three");
    }

    #[test]
    fn test_parse_lines() {
        let properties = Properties::parse(
            "# comment\n\nSectioning.Seed = 42\nbroken line\n Sectioning.MPP=true \n",
        );
        assert_eq!(properties.len(), 2);
        assert_eq!(properties.get_u64("Sectioning.Seed", 0), 42);
        assert!(properties.get_bool("Sectioning.MPP", false));
    }
}
