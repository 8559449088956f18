use thiserror::Error;

use crate::accounts::curve::CurveAccount;
use crate::curve::math;

/// Result type for planning operations
pub type PlanResult<T> = Result<T, ValidationError>;

/// Pre-network validation failures, surfaced before anything is submitted.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Trade amount must be greater than zero")]
    AmountTooSmall,

    #[error("Buy would exceed the supply ceiling: {total_supply} + {requested} > {max_supply}")]
    SupplyExceeded {
        requested: u64,
        total_supply: u64,
        max_supply: u64,
    },

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("Trade amount overflows the pricing arithmetic")]
    NumericOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Quote for one trade at the current curve state. `net_amount` is what the
/// trader pays (buy, fee added) or receives (sell, fee subtracted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeEstimate {
    pub direction: TradeDirection,
    pub unit_price: u64,
    pub gross_amount: u64,
    pub fee_amount: u64,
    pub net_amount: u64,
}

/// A validated estimate plus the slippage bound the instruction will carry:
/// the most a buyer authorizes paying, or the least a seller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradePlan {
    pub units: u64,
    pub estimate: TradeEstimate,
    pub bound_amount: u64,
    pub tolerance_bps: u16,
}

/// Plan a buy of `requested_units` base units. `held_lamports`, when known,
/// is checked against the bound (the worst authorized cost), not the raw
/// estimate.
pub fn plan_buy(
    curve: &CurveAccount,
    requested_units: u64,
    held_lamports: Option<u64>,
    tolerance_bps: u16,
) -> PlanResult<TradePlan> {
    if requested_units == 0 {
        return Err(ValidationError::AmountTooSmall);
    }

    let start = curve.total_supply;
    let end = start
        .checked_add(requested_units)
        .filter(|&end| end <= curve.max_supply)
        .ok_or(ValidationError::SupplyExceeded {
            requested: requested_units,
            total_supply: start,
            max_supply: curve.max_supply,
        })?;

    let unit_price = math::unit_price(
        curve.curve_type,
        curve.base_price,
        curve.slope,
        math::midpoint(start, end),
    )
    .ok_or(ValidationError::NumericOverflow)?;
    let gross = math::trade_gross(
        curve.curve_type,
        curve.base_price,
        curve.slope,
        start,
        end,
        requested_units,
    )
    .ok_or(ValidationError::NumericOverflow)?;
    let fee = math::fee_amount(gross, curve.fee_basis_points)
        .ok_or(ValidationError::NumericOverflow)?;
    let total = math::buy_total(gross, curve.fee_basis_points)
        .ok_or(ValidationError::NumericOverflow)?;

    let bound = buy_bound(total, tolerance_bps).ok_or(ValidationError::NumericOverflow)?;

    if let Some(held) = held_lamports {
        if held < bound {
            return Err(ValidationError::InsufficientBalance {
                needed: bound,
                available: held,
            });
        }
    }

    Ok(TradePlan {
        units: requested_units,
        estimate: TradeEstimate {
            direction: TradeDirection::Buy,
            unit_price,
            gross_amount: gross,
            fee_amount: fee,
            net_amount: total,
        },
        bound_amount: bound,
        tolerance_bps,
    })
}

/// Plan a sell of `requested_units` base units. Both an over-supply request
/// and a short held balance surface as `InsufficientBalance`.
pub fn plan_sell(
    curve: &CurveAccount,
    requested_units: u64,
    held_units: Option<u64>,
    tolerance_bps: u16,
) -> PlanResult<TradePlan> {
    if requested_units == 0 {
        return Err(ValidationError::AmountTooSmall);
    }

    if requested_units > curve.total_supply {
        return Err(ValidationError::InsufficientBalance {
            needed: requested_units,
            available: curve.total_supply,
        });
    }
    if let Some(held) = held_units {
        if held < requested_units {
            return Err(ValidationError::InsufficientBalance {
                needed: requested_units,
                available: held,
            });
        }
    }

    let start = curve.total_supply;
    let end = start - requested_units;

    let unit_price = math::unit_price(
        curve.curve_type,
        curve.base_price,
        curve.slope,
        math::midpoint(start, end),
    )
    .ok_or(ValidationError::NumericOverflow)?;
    let gross = math::trade_gross(
        curve.curve_type,
        curve.base_price,
        curve.slope,
        start,
        end,
        requested_units,
    )
    .ok_or(ValidationError::NumericOverflow)?;
    let fee = math::fee_amount(gross, curve.fee_basis_points)
        .ok_or(ValidationError::NumericOverflow)?;
    let net = math::sell_net(gross, curve.fee_basis_points)
        .ok_or(ValidationError::NumericOverflow)?;

    let bound = sell_bound(net, tolerance_bps);

    Ok(TradePlan {
        units: requested_units,
        estimate: TradeEstimate {
            direction: TradeDirection::Sell,
            unit_price,
            gross_amount: gross,
            fee_amount: fee,
            net_amount: net,
        },
        bound_amount: bound,
        tolerance_bps,
    })
}

/// Maximum a buyer authorizes paying after adverse movement.
fn buy_bound(estimate: u64, tolerance_bps: u16) -> Option<u64> {
    let bound = estimate as u128 * (10_000 + tolerance_bps as u128) / 10_000;
    u64::try_from(bound).ok()
}

/// Minimum a seller accepts receiving, floored at one lamport.
fn sell_bound(estimate: u64, tolerance_bps: u16) -> u64 {
    let share = 10_000u128.saturating_sub(tolerance_bps as u128);
    let bound = (estimate as u128 * share / 10_000) as u64;
    bound.max(1)
}
