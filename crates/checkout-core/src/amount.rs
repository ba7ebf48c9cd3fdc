//! Monetary Amounts
//!
//! An [`Amount`] ties an integer value string to an asset code and scale and is
//! interpreted as `value x 10^-asset_scale` units of the asset. All arithmetic
//! runs on `u128`: asset scales can exceed what floating point represents
//! exactly, so floats never touch a value on its way to the wire.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A monetary amount in an asset's minor units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    /// Unsigned integer value in minor units, as a decimal string
    pub value: String,

    /// Asset code (e.g. "USD", "EUR")
    pub asset_code: String,

    /// Number of decimal places in the asset's minor unit
    pub asset_scale: u8,
}

impl Amount {
    /// Build from already-scaled minor units
    pub fn from_minor_units(value: u128, asset_code: impl Into<String>, asset_scale: u8) -> Self {
        Self {
            value: value.to_string(),
            asset_code: asset_code.into(),
            asset_scale,
        }
    }

    /// Parse a human-entered decimal string (e.g. "10.00") into minor units.
    ///
    /// Parsing is exact: the integer and fractional parts are scaled with
    /// integer arithmetic. Fractional digits beyond the asset scale round
    /// half-up.
    pub fn from_major_units(
        input: &str,
        asset_code: impl Into<String>,
        asset_scale: u8,
    ) -> Result<Self> {
        let minor = parse_major_units(input, asset_scale)?;
        Ok(Self::from_minor_units(minor, asset_code, asset_scale))
    }

    /// The value as an arbitrary-precision-safe integer
    pub fn minor_units(&self) -> Result<u128> {
        self.value
            .parse::<u128>()
            .map_err(|_| CoreError::InvalidAmount(self.value.clone()))
    }

    /// Render for display, e.g. `$10.00`
    pub fn format(&self) -> Result<FormattedAmount> {
        let minor = self.minor_units()?;
        let divisor = pow10(self.asset_scale)?;
        let amount = if self.asset_scale == 0 {
            minor.to_string()
        } else {
            format!(
                "{}.{:0width$}",
                minor / divisor,
                minor % divisor,
                width = self.asset_scale as usize
            )
        };
        let symbol = currency_symbol(&self.asset_code);
        let amount_with_currency = format!("{symbol}{amount}");
        Ok(FormattedAmount {
            amount,
            symbol,
            amount_with_currency,
        })
    }

    /// The fee implied by a quote: `debit - receive`, in the debit asset.
    ///
    /// A receive amount exceeding the debit amount violates the quoting
    /// contract and is rejected.
    pub fn fee(debit: &Amount, receive: &Amount) -> Result<u128> {
        let debit_minor = debit.minor_units()?;
        let receive_minor = receive.minor_units()?;
        debit_minor.checked_sub(receive_minor).ok_or_else(|| {
            CoreError::InvalidAmount(format!(
                "receive amount {} exceeds debit amount {}",
                receive.value, debit.value
            ))
        })
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} (scale {})", self.value, self.asset_code, self.asset_scale)
    }
}

/// A display-ready amount
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedAmount {
    /// Decimal string in major units, e.g. "10.00"
    pub amount: String,

    /// Currency symbol or code prefix
    pub symbol: String,

    /// Symbol and amount joined, e.g. "$10.00"
    pub amount_with_currency: String,
}

/// Symbol for well-known asset codes; falls back to the code itself
pub fn currency_symbol(asset_code: &str) -> String {
    match asset_code.to_uppercase().as_str() {
        "USD" => "$".into(),
        "EUR" => "\u{20ac}".into(),
        "GBP" => "\u{a3}".into(),
        "JPY" => "\u{a5}".into(),
        "MXN" => "MX$".into(),
        code => format!("{code} "),
    }
}

fn pow10(scale: u8) -> Result<u128> {
    10u128
        .checked_pow(u32::from(scale))
        .ok_or_else(|| CoreError::InvalidAmount(format!("asset scale {scale} too large")))
}

fn parse_major_units(input: &str, asset_scale: u8) -> Result<u128> {
    let input = input.trim();
    let invalid = || CoreError::InvalidAmount(input.to_string());

    let (int_part, frac_part) = match input.split_once('.') {
        Some((i, f)) => (i, f),
        None => (input, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let scale = asset_scale as usize;
    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| invalid())?
    };

    // Keep scale digits of the fraction, rounding half-up on the next digit.
    let mut frac_digits: String = frac_part.chars().take(scale).collect();
    while frac_digits.len() < scale {
        frac_digits.push('0');
    }
    let mut frac: u128 = if frac_digits.is_empty() {
        0
    } else {
        frac_digits.parse().map_err(|_| invalid())?
    };
    if let Some(next) = frac_part.chars().nth(scale) {
        if next >= '5' {
            frac += 1;
        }
    }

    whole
        .checked_mul(pow10(asset_scale)?)
        .and_then(|scaled| scaled.checked_add(frac))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_units_scaling() {
        let amount = Amount::from_major_units("10.00", "USD", 2).unwrap();
        assert_eq!(amount.value, "1000");
        assert_eq!(amount.asset_scale, 2);
    }

    #[test]
    fn test_major_units_rounding() {
        let amount = Amount::from_major_units("1.005", "USD", 2).unwrap();
        assert_eq!(amount.value, "101");
        let amount = Amount::from_major_units("1.004", "USD", 2).unwrap();
        assert_eq!(amount.value, "100");
    }

    #[test]
    fn test_format_round_trip() {
        for (value, scale) in [(1000u128, 2u8), (5u128, 0), (123_456_789u128, 9)] {
            let amount = Amount::from_minor_units(value, "USD", scale);
            let formatted = amount.format().unwrap();
            let parsed = Amount::from_major_units(&formatted.amount, "USD", scale).unwrap();
            assert_eq!(parsed.minor_units().unwrap(), value);
        }
    }

    #[test]
    fn test_format_pads_fraction() {
        let amount = Amount::from_minor_units(105, "USD", 2);
        assert_eq!(amount.format().unwrap().amount_with_currency, "$1.05");
    }

    #[test]
    fn test_scale_beyond_float_precision() {
        // 2^53 + 1 is not representable as f64; integer parsing keeps it exact.
        let amount = Amount::from_minor_units(9_007_199_254_740_993, "USD", 9);
        assert_eq!(amount.minor_units().unwrap(), 9_007_199_254_740_993);
    }

    #[test]
    fn test_fee_non_negative() {
        let debit = Amount::from_minor_units(1000, "USD", 2);
        let receive = Amount::from_minor_units(990, "USD", 2);
        assert_eq!(Amount::fee(&debit, &receive).unwrap(), 10);
    }

    #[test]
    fn test_fee_rejects_inverted_quote() {
        let debit = Amount::from_minor_units(990, "USD", 2);
        let receive = Amount::from_minor_units(1000, "USD", 2);
        assert!(Amount::fee(&debit, &receive).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Amount::from_major_units("ten", "USD", 2).is_err());
        assert!(Amount::from_major_units("", "USD", 2).is_err());
        assert!(Amount::from_major_units("-5", "USD", 2).is_err());
    }
}
