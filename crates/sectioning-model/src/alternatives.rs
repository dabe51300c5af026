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

//! Alternative-slot bookkeeping.
//!
//! A student may have at most `nr_requests()` requests assigned. Alternative
//! requests only get a slot when a non-alternative course request is left
//! unassigned: every such request gives one slot, every alternative that is
//! assigned (or waitlisted and already decided) takes one.
//!
//! The feasibility check of the branch and bound and both of its bounds read
//! the balance through [`alternative_balance`] so they can never disagree.

use crate::{index::RequestId, model::Model};

/// Alternative slots left over the requests `requests[..upto]`, where the
/// first `decided` positions are settled and `is_assigned(i)` tells whether
/// position `i` holds a value.
///
/// A waitlisted alternative in the settled prefix takes its slot even when
/// unassigned.
pub fn alternative_balance(
    model: &Model,
    requests: &[RequestId],
    upto: usize,
    decided: usize,
    is_assigned: impl Fn(usize) -> bool,
) -> i32 {
    let mut balance = 0;
    for (i, &r) in requests.iter().enumerate().take(upto) {
        let request = model.request(r);
        let assigned = is_assigned(i);
        if request.is_alternative() {
            if assigned || (i < decided && request.is_waitlist()) {
                balance -= 1;
            }
        } else if request.is_course() && !request.is_waitlist() && !assigned {
            balance += 1;
        }
    }
    balance
}

/// Whether position `idx` may take a value given which other positions hold
/// one. Non-alternative requests always may.
pub fn can_assign(
    model: &Model,
    requests: &[RequestId],
    idx: usize,
    is_assigned: impl Fn(usize) -> bool,
) -> bool {
    if !model.request(requests[idx]).is_alternative() {
        return true;
    }
    alternative_balance(model, requests, requests.len(), idx, |i| {
        i == idx || is_assigned(i)
    }) >= 0
}

/// Upper bound on how many of `requests[idx..]` can still be assigned given
/// the settled prefix: every remaining non-alternative request, plus the
/// alternative slots the prefix left.
pub fn remaining_slots(
    model: &Model,
    requests: &[RequestId],
    idx: usize,
    is_assigned: impl Fn(usize) -> bool,
) -> usize {
    let prefix = alternative_balance(model, requests, idx, idx, is_assigned);
    let non_alternatives = requests[idx..]
        .iter()
        .filter(|&&r| !model.request(r).is_alternative())
        .count();
    non_alternatives + prefix.max(0) as usize
}
