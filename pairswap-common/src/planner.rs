//! Slippage bounds and deadlines for swaps.

use std::time::Duration;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use num_bigint::BigUint;

use crate::{
    errors::SwapError,
    models::{Amount, SwapPlan},
};

/// 10000 basis points are 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// How long a planned swap stays executable.
pub const DEFAULT_DEADLINE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Rejects tolerances of 100% or more.
pub fn validate_slippage(slippage_bps: u16) -> Result<(), SwapError> {
    if slippage_bps >= BPS_DENOMINATOR {
        return Err(SwapError::InvalidSlippage(slippage_bps));
    }
    Ok(())
}

/// Minimum acceptable output: `floor(quoted * (10000 - slippage_bps) / 10000)`.
///
/// Integer division rounds down, so the bound never exceeds the true worst acceptable price.
pub fn min_amount_out(quoted: &Amount, slippage_bps: u16) -> Result<Amount, SwapError> {
    validate_slippage(slippage_bps)?;
    let kept = BigUint::from(BPS_DENOMINATOR - slippage_bps);
    let min_out = quoted.value() * kept / BigUint::from(BPS_DENOMINATOR);
    Ok(Amount::new(min_out, quoted.decimals()))
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    unix_secs(Utc::now())
}

fn unix_secs(time: DateTime<Utc>) -> u64 {
    u64::try_from(time.timestamp()).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct SwapPlanner {
    deadline_window: Duration,
}

impl Default for SwapPlanner {
    fn default() -> Self {
        Self { deadline_window: DEFAULT_DEADLINE_WINDOW }
    }
}

impl SwapPlanner {
    pub fn new(deadline_window: Duration) -> Self {
        Self { deadline_window }
    }

    pub fn deadline_window(&self) -> Duration {
        self.deadline_window
    }

    /// Builds a plan whose deadline starts counting now.
    pub fn plan(
        &self,
        amount_in: Amount,
        expected_out: Amount,
        slippage_bps: u16,
        path: Vec<Address>,
    ) -> Result<SwapPlan, SwapError> {
        self.plan_at(amount_in, expected_out, slippage_bps, path, Utc::now())
    }

    /// Builds a plan with the deadline computed from `now`.
    pub fn plan_at(
        &self,
        amount_in: Amount,
        expected_out: Amount,
        slippage_bps: u16,
        path: Vec<Address>,
        now: DateTime<Utc>,
    ) -> Result<SwapPlan, SwapError> {
        let min_out = min_amount_out(&expected_out, slippage_bps)?;
        let deadline = unix_secs(now).saturating_add(self.deadline_window.as_secs());
        Ok(SwapPlan { amount_in, expected_out, min_out, path, slippage_bps, deadline })
    }
}
