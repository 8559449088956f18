use crate::accounts::curve::CurveType;

/// Base-unit scale: one whole token or SOL is 10^9 base units.
pub const SCALE: u128 = 1_000_000_000;

/// Divisor for the quadratic-like shape; larger than SCALE so the
/// self-referential term grows gradually at realistic supplies.
pub const SCALE2: u128 = 1_000_000_000_000;

/// Instantaneous unit price at the given supply, in lamports per base unit.
///
/// Every division is integer floor division, in the same order the program
/// integrates, so estimates track the authoritative on-ledger amounts.
/// Returns None when the result does not fit a u64.
pub fn unit_price(curve_type: CurveType, base_price: u64, slope: u64, supply: u64) -> Option<u64> {
    let base = base_price as u128;
    let price = match curve_type {
        CurveType::Linear => base.checked_add(slope as u128 * supply as u128 / SCALE)?,
        CurveType::Proportional => base.checked_mul(SCALE + slope as u128)? / SCALE,
        CurveType::QuadraticLike => base.checked_add(base * supply as u128 / SCALE2)?,
    };
    u64::try_from(price).ok()
}

/// Representative supply for a trade between `start` and `end`: the floored
/// midpoint. Never exceeds max(start, end), so the narrowing is lossless.
pub fn midpoint(start: u64, end: u64) -> u64 {
    ((start as u128 + end as u128) / 2) as u64
}

/// Gross amount for a trade of `units` between supplies `start` and `end`,
/// priced at the midpoint average supply (trapezoidal rule).
pub fn trade_gross(
    curve_type: CurveType,
    base_price: u64,
    slope: u64,
    start: u64,
    end: u64,
    units: u64,
) -> Option<u64> {
    let avg = midpoint(start, end);
    let price = unit_price(curve_type, base_price, slope, avg)?;
    let gross = (price as u128).checked_mul(units as u128)? / SCALE;
    u64::try_from(gross).ok()
}

/// Fee on a gross amount, floored.
pub fn fee_amount(gross: u64, fee_basis_points: u16) -> Option<u64> {
    let fee = gross as u128 * fee_basis_points as u128 / 10_000;
    u64::try_from(fee).ok()
}

/// Total a buyer pays: gross plus fee.
pub fn buy_total(gross: u64, fee_basis_points: u16) -> Option<u64> {
    gross.checked_add(fee_amount(gross, fee_basis_points)?)
}

/// Net a seller receives: gross minus fee, floored at zero.
pub fn sell_net(gross: u64, fee_basis_points: u16) -> Option<u64> {
    Some(gross.saturating_sub(fee_amount(gross, fee_basis_points)?))
}

/// Display-boundary conversion; everything upstream stays in integers.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / SCALE as f64
}
