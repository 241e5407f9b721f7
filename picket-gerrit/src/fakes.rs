//! Scripted [`ChangeQuery`] double for engine and resolver tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::ResolutionError;
use crate::{ChangeQuery, ChangeRecord};

/// Map-backed resolver. Unknown numbers answer `NotFound`; `unreachable()`
/// scripts a backend outage instead.
#[derive(Debug, Default)]
pub struct FakeQuery {
    records: BTreeMap<u64, ChangeRecord>,
    down: bool,
    lookups: RefCell<Vec<u64>>,
}

impl FakeQuery {
    pub fn new() -> Self {
        FakeQuery::default()
    }

    pub fn with_change(mut self, number: u64, patchset: u32) -> Self {
        self.records.insert(number, ChangeRecord { number, patchset });
        self
    }

    /// Every lookup fails as a connect timeout.
    pub fn unreachable(mut self) -> Self {
        self.down = true;
        self
    }

    /// Change numbers looked up so far, in call order.
    pub fn lookups(&self) -> Vec<u64> {
        self.lookups.borrow().clone()
    }
}

impl ChangeQuery for FakeQuery {
    fn lookup(&self, number: u64) -> Result<ChangeRecord, ResolutionError> {
        self.lookups.borrow_mut().push(number);
        if self.down {
            return Err(ResolutionError::Timeout {
                host: "review.invalid".to_owned(),
                detail: "scripted outage".to_owned(),
            });
        }
        self.records
            .get(&number)
            .copied()
            .ok_or(ResolutionError::NotFound { number })
    }
}
