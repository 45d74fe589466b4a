//! Fixed-point currency amounts and exchange qualities
//!
//! An [`Amount`] is a signed decimal magnitude tagged with its [`Asset`].
//! Native values carry 6 decimal places, issued values 15. Amounts of
//! different assets do not compare and do not add: `partial_cmp` returns
//! `None` and the checked operations return [`Error::AssetMismatch`].

use crate::types::{AccountId, Asset, Currency};
use crate::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Decimal places kept for native amounts
pub const NATIVE_SCALE: u32 = 6;

/// Decimal places kept for issued amounts
pub const ISSUED_SCALE: u32 = 15;

/// Scale used for values of this asset
pub fn scale_of(asset: &Asset) -> u32 {
    match asset {
        Asset::Native => NATIVE_SCALE,
        Asset::Issued(_) => ISSUED_SCALE,
    }
}

/// Round toward zero at the asset's scale
pub fn round_down(asset: &Asset, value: Decimal) -> Decimal {
    value.round_dp_with_strategy(scale_of(asset), RoundingStrategy::ToZero)
}

/// Round away from zero at the asset's scale
pub fn round_up(asset: &Asset, value: Decimal) -> Decimal {
    value.round_dp_with_strategy(scale_of(asset), RoundingStrategy::AwayFromZero)
}

/// Currency amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    asset: Asset,
    value: Decimal,
}

impl Amount {
    /// Create an amount, truncating the value to the asset's scale
    pub fn new(asset: Asset, value: Decimal) -> Self {
        Self {
            asset,
            value: round_down(&asset, value),
        }
    }

    /// Native amount
    pub fn native(value: Decimal) -> Self {
        Self::new(Asset::Native, value)
    }

    /// Issued amount
    pub fn issued(value: Decimal, currency: Currency, issuer: AccountId) -> Self {
        Self::new(Asset::issued(currency, issuer), value)
    }

    /// Zero of the given asset
    pub fn zero(asset: Asset) -> Self {
        Self {
            asset,
            value: Decimal::ZERO,
        }
    }

    /// Same asset, zero magnitude
    pub fn zeroed(&self) -> Self {
        Self::zero(self.asset)
    }

    /// Asset tag
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Magnitude
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// True for the native asset
    pub fn is_native(&self) -> bool {
        self.asset.is_native()
    }

    /// True when the magnitude is zero
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// -1, 0 or 1
    pub fn signum(&self) -> i32 {
        if self.value.is_zero() {
            0
        } else if self.value.is_sign_negative() {
            -1
        } else {
            1
        }
    }

    /// Negated copy
    pub fn negate(&self) -> Self {
        Self {
            asset: self.asset,
            value: -self.value,
        }
    }

    /// Same magnitude re-tagged with another issuer
    pub fn with_issuer(&self, issuer: AccountId) -> Self {
        Self {
            asset: self.asset.with_issuer(issuer),
            value: self.value,
        }
    }

    /// Same asset, new magnitude (truncated to scale)
    pub fn with_value(&self, value: Decimal) -> Self {
        Self::new(self.asset, value)
    }

    /// Add two amounts of the same asset
    pub fn checked_add(&self, other: &Amount) -> Result<Amount> {
        self.ensure_same_asset(other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or_else(|| Error::Overflow(format!("{} + {}", self, other)))?;
        Ok(Self::new(self.asset, value))
    }

    /// Subtract two amounts of the same asset
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount> {
        self.ensure_same_asset(other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or_else(|| Error::Overflow(format!("{} - {}", self, other)))?;
        Ok(Self::new(self.asset, value))
    }

    fn ensure_same_asset(&self, other: &Amount) -> Result<()> {
        if self.asset != other.asset {
            return Err(Error::AssetMismatch {
                left: self.asset.to_string(),
                right: other.asset.to_string(),
            });
        }
        Ok(())
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.asset != other.asset {
            return None;
        }
        Some(self.value.cmp(&other.value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value.normalize(), self.asset)
    }
}

/// Exchange rate of an increment or offer: input per unit of output
///
/// Lower is better for the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quality(Decimal);

impl Quality {
    /// One unit in per unit out
    pub const ONE: Quality = Quality(Decimal::ONE);

    /// Wrap a raw rate; `None` unless strictly positive
    pub fn from_rate(rate: Decimal) -> Option<Self> {
        if rate > Decimal::ZERO {
            Some(Self(rate))
        } else {
            None
        }
    }

    /// `amount_in / amount_out` over raw values; `None` if either is not positive
    pub fn from_values(amount_in: Decimal, amount_out: Decimal) -> Option<Self> {
        if amount_in <= Decimal::ZERO || amount_out <= Decimal::ZERO {
            return None;
        }
        amount_in.checked_div(amount_out).and_then(Self::from_rate)
    }

    /// Rate as a decimal
    pub fn rate(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Rate of exchange for `amount_in` paid per `amount_out` delivered
///
/// Returns `None` when either side is zero, which callers treat as "no rate".
pub fn get_rate(amount_out: &Amount, amount_in: &Amount) -> Option<Quality> {
    Quality::from_values(amount_in.value(), amount_out.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(value: i64, issuer: &str) -> Amount {
        Amount::issued(Decimal::from(value), Currency::new(*b"USD"), AccountId::from_name(issuer))
    }

    #[test]
    fn test_zeroed_keeps_asset() {
        let amount = usd(50, "gw");
        let zero = amount.zeroed();
        assert!(zero.is_zero());
        assert_eq!(zero.asset(), amount.asset());
    }

    #[test]
    fn test_different_issuers_do_not_compare() {
        assert_eq!(usd(1, "a").partial_cmp(&usd(1, "b")), None);
        assert!(usd(1, "a") < usd(2, "a"));
        assert!(usd(1, "a").checked_add(&usd(1, "b")).is_err());
    }

    #[test]
    fn test_negate_and_signum() {
        let amount = usd(5, "gw");
        assert_eq!(amount.signum(), 1);
        assert_eq!(amount.negate().signum(), -1);
        assert_eq!(amount.zeroed().signum(), 0);
    }

    #[test]
    fn test_native_scale_truncates() {
        let amount = Amount::native(Decimal::new(1_234_567_891, 9));
        assert_eq!(amount.value(), Decimal::new(1_234_567, 6));
    }

    #[test]
    fn test_get_rate() {
        let out = usd(100, "gw");
        let inp = Amount::native(Decimal::from(120));
        let rate = get_rate(&out, &inp).unwrap();
        assert_eq!(rate.rate(), Decimal::new(12, 1));
        assert_eq!(get_rate(&out.zeroed(), &inp), None);
    }

    #[test]
    fn test_rounding_directions() {
        let asset = Asset::Native;
        let v = Decimal::new(10_000_001, 7);
        assert_eq!(round_down(&asset, v), Decimal::from(1));
        assert_eq!(round_up(&asset, v), Decimal::new(1_000_001, 6));
    }
}
