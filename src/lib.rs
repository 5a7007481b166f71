// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod allocation;
pub mod backup;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod events;
pub mod ledger;
pub mod models;
pub mod shared;
pub mod stats;
pub mod store;
pub mod utils;

pub use error::{EntityKind, LedgerError, Result};
pub use ledger::Ledger;
