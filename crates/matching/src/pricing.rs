// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded-range constant-product pricing for the liquidity provider
//!
//! The LP holds real reserves `(x, y)` and prices as if it held
//! `(x + vX, y + vY)` on the curve `(x + vX)(y + vY) = L²`, where
//! `vX = L/√Pb` and `vY = L·√Pa`. This concentrates the pool's liquidity
//! in the price range `[Pa, Pb]`.
//!
//! All functions are pure. Quotes are rounded to 2 decimals in the LP's
//! favor: the price it pays rounds down, the price it charges rounds up.

use bourse_sdk::Side;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

/// Decimal places of every price and balance
pub const PRICE_DECIMALS: u32 = 2;

/// Reported mid price when the pool holds no base units
pub const NO_INVENTORY_PRICE: Decimal = dec!(999999999.99);

/// Error types for pricing computations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
	#[error("Invalid price bounds: Pa={pa}, Pb={pb}")]
	InvalidBounds { pa: Decimal, pb: Decimal },
	#[error("Negative reserves: x={x}, y={y}")]
	NegativeReserves { x: Decimal, y: Decimal },
	#[error("Pool cannot absorb the trade")]
	Exhausted,
	#[error("Arithmetic overflow")]
	Overflow,
}

pub fn round_down(value: Decimal, dp: u32) -> Decimal {
	value.round_dp_with_strategy(dp, RoundingStrategy::ToNegativeInfinity)
}

pub fn round_up(value: Decimal, dp: u32) -> Decimal {
	value.round_dp_with_strategy(dp, RoundingStrategy::ToPositiveInfinity)
}

pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
	value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn checked(value: Option<Decimal>) -> Result<Decimal, PricingError> {
	value.ok_or(PricingError::Overflow)
}

fn sqrt(value: Decimal) -> Result<Decimal, PricingError> {
	value.sqrt().ok_or(PricingError::Exhausted)
}

/// Price of one unit against the pool, from the LP's side of the trade
///
/// - `Side::Buy`: the LP receives one unit (total x grows by one) and pays
///   the returned amount, rounded down
/// - `Side::Sell`: the LP gives one unit (total x shrinks by one) and
///   charges the returned amount, rounded up
pub fn calculate_prices(
	side: Side,
	reserve_x: Decimal,
	reserve_y: Decimal,
	virtual_x: Decimal,
	virtual_y: Decimal,
) -> Result<Decimal, PricingError> {
	let total_x = checked(reserve_x.checked_add(virtual_x))?;
	let total_y = checked(reserve_y.checked_add(virtual_y))?;
	let k = checked(total_x.checked_mul(total_y))?;

	let new_total_x = match side {
		Side::Buy => total_x + Decimal::ONE,
		Side::Sell => total_x - Decimal::ONE,
	};
	if new_total_x <= Decimal::ZERO {
		return Err(PricingError::Exhausted);
	}

	let new_y = checked(k.checked_div(new_total_x))? - virtual_y;
	match side {
		Side::Buy => Ok(round_down(reserve_y - new_y, PRICE_DECIMALS)),
		Side::Sell => Ok(round_up(new_y - reserve_y, PRICE_DECIMALS)),
	}
}

/// Liquidity invariant `L` for reserves `(x, y)` in the range `[Pa, Pb]`
///
/// Positive root of `L²(√Pb − √Pa) − L(√Pa·√Pb·x + y) − x·y·√Pb = 0`.
pub fn calculate_l(
	pa: Decimal,
	pb: Decimal,
	reserve_x: Decimal,
	reserve_y: Decimal,
) -> Result<Decimal, PricingError> {
	if pa <= Decimal::ZERO || pa >= pb {
		return Err(PricingError::InvalidBounds { pa, pb });
	}
	if reserve_x < Decimal::ZERO || reserve_y < Decimal::ZERO {
		return Err(PricingError::NegativeReserves {
			x: reserve_x,
			y: reserve_y,
		});
	}

	let sqrt_pa = sqrt(pa)?;
	let sqrt_pb = sqrt(pb)?;
	let sqrt_pab = sqrt_pa * sqrt_pb;
	let xy = checked(reserve_x.checked_mul(reserve_y))?;

	let part1 = checked(
		pa.checked_mul(pb)
			.and_then(|p| p.checked_mul(reserve_x))
			.and_then(|p| p.checked_mul(reserve_x)),
	)? - checked(
		(Decimal::TWO * sqrt_pab).checked_mul(xy),
	)? + checked((dec!(4) * pb).checked_mul(xy))?
		+ checked(reserve_y.checked_mul(reserve_y))?;
	let part2 = checked(sqrt_pab.checked_mul(reserve_x))? + reserve_y;

	let numerator = -(sqrt(part1.max(Decimal::ZERO))? + part2);
	let denominator = Decimal::TWO * sqrt_pa - Decimal::TWO * sqrt_pb;
	checked(numerator.checked_div(denominator))
}

/// Virtual reserves `(L/√Pb, L·√Pa)` added on top of the real ones
pub fn virtual_reserves(l: Decimal, pa: Decimal, pb: Decimal) -> Result<(Decimal, Decimal), PricingError> {
	let virtual_x = checked(l.checked_div(sqrt(pb)?))?;
	let virtual_y = checked(l.checked_mul(sqrt(pa)?))?;
	Ok((virtual_x, virtual_y))
}

/// Full repricing of a pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolQuote {
	/// Liquidity invariant, rounded to 2 decimals
	pub l: Decimal,
	/// What the LP pays for one unit; `None` if it cannot afford one
	pub bid: Option<Decimal>,
	/// What the LP charges for one unit; `None` if it holds none
	pub ask: Option<Decimal>,
	/// `y / x`, or [`NO_INVENTORY_PRICE`] when `x` is zero
	pub price: Decimal,
}

impl PoolQuote {
	/// The LP's quote on one side of the book
	pub fn for_side(&self, side: Side) -> Option<Decimal> {
		match side {
			Side::Buy => self.bid,
			Side::Sell => self.ask,
		}
	}
}

/// Reprice a pool holding `x` units and `y` currency
pub fn quote_pool(pa: Decimal, pb: Decimal, x: u64, y: Decimal) -> Result<PoolQuote, PricingError> {
	let reserve_x = Decimal::from(x);
	let l = calculate_l(pa, pb, reserve_x, y)?;
	let (virtual_x, virtual_y) = virtual_reserves(l, pa, pb)?;

	let bid = calculate_prices(Side::Buy, reserve_x, y, virtual_x, virtual_y)?;
	let bid = (bid > Decimal::ZERO && bid <= y).then_some(bid);

	let (ask, price) = if x > 0 {
		let ask = calculate_prices(Side::Sell, reserve_x, y, virtual_x, virtual_y)?;
		(Some(ask), round_half_up(y / reserve_x, PRICE_DECIMALS))
	} else {
		(None, NO_INVENTORY_PRICE)
	};

	Ok(PoolQuote {
		l: round_half_up(l, PRICE_DECIMALS),
		bid,
		ask,
		price,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn acme() -> (Decimal, Decimal) {
		(dec!(90), dec!(110))
	}

	#[test]
	fn test_rounding_directions() {
		assert_eq!(round_down(dec!(1.239), 2), dec!(1.23));
		assert_eq!(round_up(dec!(1.231), 2), dec!(1.24));
		assert_eq!(round_up(dec!(1.23), 2), dec!(1.23));
		assert_eq!(round_half_up(dec!(1.235), 2), dec!(1.24));
		assert_eq!(round_down(dec!(-0.001), 2), dec!(-0.01));
	}

	#[test]
	fn test_invariant_satisfies_curve() {
		let (pa, pb) = acme();
		let (x, y) = (dec!(100), dec!(10000));
		let l = calculate_l(pa, pb, x, y).unwrap();
		let (vx, vy) = virtual_reserves(l, pa, pb).unwrap();

		let residual = ((x + vx) * (y + vy) - l * l).abs();
		assert!(residual < dec!(0.0001) * l * l, "residual {residual}");
		// Pool mid price sits inside the range
		let mid = (y + vy) / (x + vx);
		assert!(mid > pa && mid < pb);
	}

	#[test]
	fn test_rejects_invalid_bounds() {
		assert!(matches!(
			calculate_l(dec!(110), dec!(90), dec!(1), dec!(1)),
			Err(PricingError::InvalidBounds { .. })
		));
		assert!(matches!(
			calculate_l(dec!(0), dec!(90), dec!(1), dec!(1)),
			Err(PricingError::InvalidBounds { .. })
		));
		assert!(matches!(
			calculate_l(dec!(90), dec!(110), dec!(-1), dec!(1)),
			Err(PricingError::NegativeReserves { .. })
		));
	}

	#[test]
	fn test_quotes_bracket_the_mid_price() {
		let (pa, pb) = acme();
		let quote = quote_pool(pa, pb, 100, dec!(10000)).unwrap();
		let bid = quote.bid.unwrap();
		let ask = quote.ask.unwrap();

		assert!(bid < ask);
		assert!(bid > pa && ask < pb);
		assert_eq!(quote.price, dec!(100));
		assert_eq!(quote.l.scale(), 2);
		assert_eq!(quote.for_side(Side::Sell), Some(ask));
	}

	#[test]
	fn test_buy_then_sell_returns_to_start() {
		let (pa, pb) = acme();
		let (x0, y0) = (100u64, dec!(10000));

		// LP buys one unit at its bid
		let bid = quote_pool(pa, pb, x0, y0).unwrap().bid.unwrap();
		let (x1, y1) = (x0 + 1, y0 - bid);

		// ...then sells it back at its new ask
		let ask = quote_pool(pa, pb, x1, y1).unwrap().ask.unwrap();
		let (x2, y2) = (x1 - 1, y1 + ask);

		assert_eq!(x2, x0);
		assert!(y2 >= y0, "rounding must favor the pool");
		assert!(y2 - y0 <= dec!(0.05), "drift {}", y2 - y0);
	}

	#[test]
	fn test_empty_inventory_has_no_ask() {
		let (pa, pb) = acme();
		let quote = quote_pool(pa, pb, 0, dec!(500)).unwrap();
		assert_eq!(quote.ask, None);
		assert_eq!(quote.price, NO_INVENTORY_PRICE);
		assert!(quote.bid.is_some());
	}

	#[test]
	fn test_broke_pool_has_no_bid() {
		let (pa, pb) = acme();
		let quote = quote_pool(pa, pb, 10, Decimal::ZERO).unwrap();
		assert_eq!(quote.bid, None);
		assert!(quote.ask.is_some());

		let empty = quote_pool(pa, pb, 0, Decimal::ZERO).unwrap();
		assert_eq!(empty.bid, None);
		assert_eq!(empty.ask, None);
	}

	#[test]
	fn test_price_rises_as_inventory_leaves() {
		let (pa, pb) = acme();
		let before = quote_pool(pa, pb, 100, dec!(10000)).unwrap();
		let ask = before.ask.unwrap();
		let after = quote_pool(pa, pb, 99, dec!(10000) + ask).unwrap();
		assert!(after.ask.unwrap() > ask);
		assert!(after.bid.unwrap() > before.bid.unwrap());
	}
}
