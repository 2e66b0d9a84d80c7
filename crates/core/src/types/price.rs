//! Decimal prices for delivery fees.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in euros, the only currency the restaurant bills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in euros, not cents.
    pub amount: Decimal,
}

impl Price {
    /// Symbol shown after the amount.
    pub const SYMBOL: &'static str = "€";

    #[must_use]
    pub const fn eur(amount: Decimal) -> Self {
        Self { amount }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount.round_dp(2), Self::SYMBOL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        let fee = Price::eur(Decimal::new(5, 0));
        assert_eq!(fee.to_string(), "5.00 €");

        let fee = Price::eur(Decimal::new(34_999, 4));
        assert_eq!(fee.to_string(), "3.50 €");
    }
}
