//! Conversion between human decimal strings and integer base units.

use alloy::primitives::U256;

/// Largest decimal count whose scale factor (`10^decimals`) fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

/// Errors produced while parsing a human-entered amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Nothing but whitespace was entered.
    #[error("amount is empty")]
    Empty,

    /// The string is not a plain decimal number.
    #[error("malformed amount '{0}'")]
    Malformed(String),

    /// The string carries a minus sign.
    #[error("negative amount '{0}'")]
    Negative(String),

    /// More significant fractional digits than the token supports.
    #[error("'{input}' has more than {decimals} fractional digits")]
    TooPrecise {
        /// The offending input.
        input: String,
        /// The token's decimal count.
        decimals: u8,
    },

    /// The value does not fit in 256 bits.
    #[error("amount '{0}' does not fit in 256 bits")]
    Overflow(String),

    /// The decimal count cannot be represented.
    #[error("decimal count {0} exceeds the supported maximum of {MAX_DECIMALS}")]
    DecimalsOutOfRange(u8),
}

/// Codec for one token's amounts, parameterized by its decimal count.
///
/// ```rust,ignore
/// let codec = AmountCodec::new(6)?;
/// let base = codec.parse("12.5")?;          // 12_500_000
/// assert_eq!(codec.format(base), "12.5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountCodec {
    decimals: u8,
}

impl AmountCodec {
    /// Create a codec for `decimals` fractional digits.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::DecimalsOutOfRange`] above [`MAX_DECIMALS`].
    pub const fn new(decimals: u8) -> Result<Self, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::DecimalsOutOfRange(decimals));
        }
        Ok(Self { decimals })
    }

    /// The decimal count.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// `10^decimals`.
    #[must_use]
    pub fn scale(&self) -> U256 {
        U256::from(10u64).pow(U256::from(self.decimals))
    }

    /// Parse a human decimal string into base units.
    ///
    /// Accepts an optional leading `+`, an optional fractional part, and
    /// surrounding whitespace. Fractional digits beyond the token's
    /// precision are accepted only when they are zeros.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] describing why the string was refused.
    pub fn parse(&self, input: &str) -> Result<U256, AmountError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative(trimmed.to_string()));
        }
        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let well_formed = !(int_part.is_empty() && frac_part.is_empty())
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(AmountError::Malformed(trimmed.to_string()));
        }

        let frac_part = frac_part.trim_end_matches('0');
        let decimals = usize::from(self.decimals);
        if frac_part.len() > decimals {
            return Err(AmountError::TooPrecise {
                input: trimmed.to_string(),
                decimals: self.decimals,
            });
        }

        let mut digits = String::with_capacity(int_part.len() + decimals);
        digits.push_str(int_part);
        digits.push_str(frac_part);
        digits.extend(std::iter::repeat_n('0', decimals - frac_part.len()));
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }

        U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow(trimmed.to_string()))
    }

    /// Format base units as a canonical human decimal string.
    ///
    /// No trailing fractional zeros, no trailing dot, no leading zeros
    /// beyond a single `0` before the dot.
    #[must_use]
    pub fn format(&self, value: U256) -> String {
        if self.decimals == 0 {
            return value.to_string();
        }
        let scale = self.scale();
        let whole = value / scale;
        let frac = value % scale;
        if frac.is_zero() {
            return whole.to_string();
        }
        let frac = frac.to_string();
        let frac = format!("{frac:0>width$}", width = usize::from(self.decimals));
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }

    /// Normalize a human decimal string to its canonical form.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn canonicalize(&self, input: &str) -> Result<String, AmountError> {
        self.parse(input).map(|value| self.format(value))
    }
}

impl Default for AmountCodec {
    /// The conventional 18-decimal codec.
    fn default() -> Self {
        Self { decimals: 18 }
    }
}

/// Parse `input` with `decimals` fractional digits.
///
/// # Errors
///
/// See [`AmountCodec::parse`].
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, AmountError> {
    AmountCodec::new(decimals)?.parse(input)
}

/// Format `value` with `decimals` fractional digits.
///
/// # Errors
///
/// Returns [`AmountError::DecimalsOutOfRange`] above [`MAX_DECIMALS`].
pub fn format_units(value: U256, decimals: u8) -> Result<String, AmountError> {
    Ok(AmountCodec::new(decimals)?.format(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Textual canonical form, computed without going through base units.
    fn canonical_text(input: &str) -> String {
        let s = input.trim().trim_start_matches('+');
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        let int_part = int_part.trim_start_matches('0');
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac_part}")
        }
    }

    #[test]
    fn parse_whole_and_fractional() {
        let codec = AmountCodec::new(18).unwrap();
        assert_eq!(
            codec.parse("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(
            codec.parse("0.5").unwrap(),
            U256::from(500_000_000_000_000_000u128)
        );
        assert_eq!(codec.parse(".5").unwrap(), codec.parse("0.5").unwrap());
        assert_eq!(codec.parse("2.").unwrap(), codec.parse("2").unwrap());
    }

    #[test]
    fn parse_with_zero_decimals() {
        let codec = AmountCodec::new(0).unwrap();
        assert_eq!(codec.parse("42").unwrap(), U256::from(42));
        assert_eq!(codec.parse("42.000").unwrap(), U256::from(42));
        assert!(matches!(
            codec.parse("42.1"),
            Err(AmountError::TooPrecise { decimals: 0, .. })
        ));
    }

    #[test]
    fn parse_rejects_bad_input() {
        let codec = AmountCodec::new(6).unwrap();
        assert_eq!(codec.parse("   "), Err(AmountError::Empty));
        assert!(matches!(codec.parse("1.2.3"), Err(AmountError::Malformed(_))));
        assert!(matches!(codec.parse("1e5"), Err(AmountError::Malformed(_))));
        assert!(matches!(codec.parse("1,000"), Err(AmountError::Malformed(_))));
        assert!(matches!(codec.parse("."), Err(AmountError::Malformed(_))));
        assert!(matches!(codec.parse("-3"), Err(AmountError::Negative(_))));
        assert!(matches!(
            codec.parse("0.0000001"),
            Err(AmountError::TooPrecise { decimals: 6, .. })
        ));
    }

    #[test]
    fn parse_detects_overflow() {
        let codec = AmountCodec::new(18).unwrap();
        let huge = "9".repeat(70);
        assert!(matches!(codec.parse(&huge), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn decimals_out_of_range() {
        assert!(AmountCodec::new(MAX_DECIMALS).is_ok());
        assert_eq!(
            AmountCodec::new(78),
            Err(AmountError::DecimalsOutOfRange(78))
        );
    }

    #[test]
    fn format_trims_trailing_zeros() {
        let codec = AmountCodec::new(6).unwrap();
        assert_eq!(codec.format(U256::from(12_500_000u64)), "12.5");
        assert_eq!(codec.format(U256::from(1u64)), "0.000001");
        assert_eq!(codec.format(U256::from(3_000_000u64)), "3");
        assert_eq!(codec.format(U256::ZERO), "0");
    }

    #[test]
    fn format_parse_round_trip_is_canonical() {
        let cases = [
            ("0", 18),
            ("000123.4500", 18),
            ("+7", 6),
            ("0.000001", 6),
            (" 1.10 ", 2),
            ("100", 0),
            ("340282366920938463463.374607431768211455", 18),
            ("0.0", 9),
        ];
        for (input, decimals) in cases {
            let codec = AmountCodec::new(decimals).unwrap();
            let round_trip = codec.format(codec.parse(input).unwrap());
            assert_eq!(round_trip, canonical_text(input), "input {input:?}");
            assert_eq!(codec.canonicalize(input).unwrap(), round_trip);
        }
    }

    #[test]
    fn free_functions_delegate() {
        assert_eq!(parse_units("1.5", 2).unwrap(), U256::from(150));
        assert_eq!(format_units(U256::from(150), 2).unwrap(), "1.5");
        assert!(parse_units("1", 80).is_err());
    }
}
