//! Fee and tax calculation
//!
//! Figures are computed in three steps, each truncated toward zero:
//!
//! ```text
//! fee   = trunc(payment_amount * fee_rate)
//! tax   = trunc(fee * tax_rate)          -- from the truncated fee
//! total = payment_amount + fee + tax
//! ```
//!
//! With the default rates (fee 4%, tax 10%) a payment of 10000 yields a fee
//! of 400, tax of 40 and a total of 10440.
//!
//! # Example
//!
//! ```
//! use shiharai_shared::billing::FeeCalculator;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let result = FeeCalculator::new().calculate(10_000)?;
//! assert_eq!(result.fee, 400);
//! assert_eq!(result.tax, 40);
//! assert_eq!(result.total_amount, 10_440);
//! # Ok(())
//! # }
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Error type for fee calculation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    /// Payment amounts must be zero or positive
    #[error("payment amount must not be negative: {0}")]
    NegativeAmount(i64),

    /// An intermediate or final figure does not fit in `i64`
    #[error("calculation overflow")]
    Overflow,
}

/// Figures produced for one payment amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    /// Amount owed to the vendor
    pub payment_amount: i64,

    /// Service fee, truncated
    pub fee: i64,

    /// Rate the fee was computed with
    pub fee_rate: Decimal,

    /// Consumption tax on the fee, truncated
    pub tax: i64,

    /// Rate the tax was computed with
    pub tax_rate: Decimal,

    /// `payment_amount + fee + tax`
    pub total_amount: i64,
}

/// Fee/tax calculator with configured default rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    fee_rate: Decimal,
    tax_rate: Decimal,
}

impl FeeCalculator {
    /// Default fee rate (4%)
    pub const DEFAULT_FEE_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 2);

    /// Default consumption tax rate (10%)
    pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

    /// Creates a calculator with the default rates
    pub fn new() -> Self {
        Self::with_rates(Self::DEFAULT_FEE_RATE, Self::DEFAULT_TAX_RATE)
    }

    /// Creates a calculator with custom rates
    pub fn with_rates(fee_rate: Decimal, tax_rate: Decimal) -> Self {
        Self { fee_rate, tax_rate }
    }

    /// Configured fee rate
    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    /// Configured tax rate
    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Calculates figures using the configured rates
    pub fn calculate(&self, payment_amount: i64) -> Result<CalculationResult, CalculationError> {
        self.calculate_with_rates(payment_amount, self.fee_rate, self.tax_rate)
    }

    /// Calculates figures using explicit rates
    ///
    /// # Errors
    ///
    /// - `CalculationError::NegativeAmount` if `payment_amount < 0`
    /// - `CalculationError::Overflow` if any figure exceeds `i64`
    pub fn calculate_with_rates(
        &self,
        payment_amount: i64,
        fee_rate: Decimal,
        tax_rate: Decimal,
    ) -> Result<CalculationResult, CalculationError> {
        if payment_amount < 0 {
            return Err(CalculationError::NegativeAmount(payment_amount));
        }

        let payment = Decimal::from(payment_amount);

        let fee = payment
            .checked_mul(fee_rate)
            .ok_or(CalculationError::Overflow)?
            .trunc();

        let tax = fee
            .checked_mul(tax_rate)
            .ok_or(CalculationError::Overflow)?
            .trunc();

        let fee = fee.to_i64().ok_or(CalculationError::Overflow)?;
        let tax = tax.to_i64().ok_or(CalculationError::Overflow)?;

        let total_amount = payment_amount
            .checked_add(fee)
            .and_then(|sum| sum.checked_add(tax))
            .ok_or(CalculationError::Overflow)?;

        Ok(CalculationResult {
            payment_amount,
            fee,
            fee_rate,
            tax,
            tax_rate,
            total_amount,
        })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new()
    }
}
