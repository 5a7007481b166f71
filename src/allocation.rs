// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::models::IncomeAllocation;

/// Splits `amount` by each row's percentage, in row order.
///
/// Shares are `amount * p / 100` in exact decimal arithmetic. Zero shares are
/// dropped. Weights are not normalized, so rows summing to less than 100
/// leave a remainder unallocated and rows summing to more allocate more than
/// `amount`. A share that does not fit in a `Decimal` is a validation error.
pub fn allocate(amount: Decimal, allocations: &[IncomeAllocation]) -> Result<Vec<(Uuid, Decimal)>> {
    let mut shares = Vec::with_capacity(allocations.len());
    for row in allocations {
        let share = share_of(amount, row.percentage)?;
        if !share.is_zero() {
            shares.push((row.account_id, share));
        }
    }
    Ok(shares)
}

fn share_of(amount: Decimal, percentage: u8) -> Result<Decimal> {
    amount
        .checked_mul(Decimal::from(percentage))
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| {
            LedgerError::invalid(format!("{}% of {} is out of range", percentage, amount))
        })
}

pub fn total_percentage(allocations: &[IncomeAllocation]) -> u32 {
    allocations.iter().map(|a| u32::from(a.percentage)).sum()
}

/// What `allocate` leaves over; negative when the weights exceed 100%.
pub fn unallocated(amount: Decimal, allocations: &[IncomeAllocation]) -> Result<Decimal> {
    let mut left = amount;
    for (_, share) in allocate(amount, allocations)? {
        left = left
            .checked_sub(share)
            .ok_or_else(|| LedgerError::invalid(format!("Allocations of {} overflow", amount)))?;
    }
    Ok(left)
}
