// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod allocations;
pub mod backups;
pub mod categories;
pub mod loans;
pub mod members;
pub mod reports;
pub mod transactions;
