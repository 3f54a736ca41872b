use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------      Cents       ------------------------------------------------------------
/// A monetary amount in integer cents of the store currency. Upstream sends prices as decimal strings
/// ("19.99"); they are converted at the boundary and kept as integers everywhere else.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(unary Cents, Neg, neg);

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid price value: {0}")]
pub struct PriceParseError(pub String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a decimal price string ("6.00", "19.9", "7") into cents. At most two fractional digits
    /// are accepted; a single fractional digit is scaled, so "19.9" is 1990 cents, not 1909.
    pub fn parse(price: &str) -> Result<Self, PriceParseError> {
        let price = price.trim();
        // The sign lives outside the integer parse. "-0.50" has a whole part of "-0", which
        // parses to zero and loses the sign.
        let (sign, digits) = match price.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, price),
        };
        let mut parts = digits.splitn(2, '.');
        let whole = parts
            .next()
            .ok_or_else(|| PriceParseError(price.to_string()))?
            .parse::<i64>()
            .map_err(|e| PriceParseError(format!("{price}. {e}")))?;
        if whole < 0 {
            return Err(PriceParseError(price.to_string()));
        }
        let cents = match parts.next() {
            None | Some("") => 0,
            Some(frac) if frac.len() <= 2 => {
                let scale = if frac.len() == 1 { 10 } else { 1 };
                frac.parse::<i64>().map_err(|e| PriceParseError(format!("{price}. {e}")))? * scale
            },
            Some(frac) => return Err(PriceParseError(format!("{price}. Too many decimal places ({frac})"))),
        };
        Ok(Self(sign * (whole * 100 + cents)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_prices() {
        assert_eq!(Cents::parse("6.00").unwrap(), Cents::from(600));
        assert_eq!(Cents::parse("19.99").unwrap(), Cents::from(1999));
        assert_eq!(Cents::parse("19.9").unwrap(), Cents::from(1990));
        assert_eq!(Cents::parse("7").unwrap(), Cents::from(700));
        assert_eq!(Cents::parse("0.05").unwrap(), Cents::from(5));
        assert_eq!(Cents::parse(" 12.50 ").unwrap(), Cents::from(1250));
    }

    #[test]
    fn parse_negative_prices() {
        assert_eq!(Cents::parse("-12.50").unwrap(), Cents::from(-1250));
        // A "-0" whole part must not swallow the sign.
        assert_eq!(Cents::parse("-0.50").unwrap(), Cents::from(-50));
        assert_eq!(Cents::parse("-0.05").unwrap(), Cents::from(-5));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Cents::parse("").is_err());
        assert!(Cents::parse("abc").is_err());
        assert!(Cents::parse("1.234").is_err());
        assert!(Cents::parse("12,50").is_err());
        assert!(Cents::parse("--1").is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Cents::from(600).to_string(), "6.00");
        assert_eq!(Cents::from(5).to_string(), "0.05");
        assert_eq!(Cents::from(-1250).to_string(), "-12.50");
    }
}
