// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

/// Raised once per successful mutation, scoped to the collection that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerEvent {
    AccountsChanged,
    CategoriesChanged,
    MembersChanged,
    TransactionsChanged,
    LoansChanged,
    AllocationsChanged,
    SnapshotRestored,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: LedgerEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LedgerEvent) {}
}

/// Keeps events in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: LedgerEvent) {
        if let Ok(mut v) = self.events.lock() {
            v.push(event);
        }
    }
}

impl EventSink for Sender<LedgerEvent> {
    fn emit(&self, event: LedgerEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: LedgerEvent) {
        (**self).emit(event)
    }
}
