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

use thiserror::Error;

/// A proposal that went stale: the shared assignment moved on while it was
/// being computed and the proposal no longer fits. The unit of work may be
/// searched again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Retryable {
    #[error("revision moved from {expected} to {found} and the {neighbour} no longer applies")]
    Stale {
        neighbour: String,
        expected: u64,
        found: u64,
    },
    #[error("revision moved from {expected} to {found} and the {neighbour} no longer improves")]
    NoLongerImproving {
        neighbour: String,
        expected: u64,
        found: u64,
    },
}

/// A configuration value that could not be read as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("property `{key}` has value `{value}`, expected {expected}")]
pub struct PropertyError {
    pub key: String,
    pub value: String,
    pub expected: &'static str,
}
