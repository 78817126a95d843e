//! Fixed-point temperature in hundredths of a degree Celsius.
//!
//! `i16::MIN` is reserved as the invalid sentinel ("no reading", "unset
//! threshold").  Because it is also the smallest `i16`, the derived `Ord`
//! places invalid below every real temperature, which is what
//! [`ExpiringPair`](crate::timing::ExpiringPair) relies on.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::timing::Expirable;

const INVALID_RAW: i16 = i16::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Temp(i16);

impl Temp {
    pub const INVALID: Temp = Temp(INVALID_RAW);

    /// From hundredths of a degree.  `i16::MIN` yields the invalid value.
    pub const fn from_centi(centi: i16) -> Self {
        Self(centi)
    }

    /// From whole degrees; saturates just above the sentinel.
    pub const fn from_degrees(deg: i16) -> Self {
        let c = deg as i32 * 100;
        if c <= INVALID_RAW as i32 {
            Self(INVALID_RAW + 1)
        } else if c > i16::MAX as i32 {
            Self(i16::MAX)
        } else {
            Self(c as i16)
        }
    }

    pub const fn centi(self) -> i16 {
        self.0
    }

    pub const fn valid(self) -> bool {
        self.0 != INVALID_RAW
    }

    /// `true` only when both sides are valid and `self < threshold`.
    pub fn is_below(self, threshold: Temp) -> bool {
        self.valid() && threshold.valid() && self < threshold
    }
}

impl Default for Temp {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Expirable for Temp {
    fn invalid() -> Self {
        Self::INVALID
    }

    fn is_valid(&self) -> bool {
        self.valid()
    }
}

/// Signed, two decimals: `+21.50`, `-3.25`.  Invalid prints as `??.??`.
impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid() {
            return f.write_str("??.??");
        }
        let v = i32::from(self.0);
        let sign = if v < 0 { '-' } else { '+' };
        let a = v.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, a / 100, a % 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseTempError;

impl fmt::Display for ParseTempError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed temperature")
    }
}

/// Parses `21`, `21.5`, `-3.25`, `+0.05`.  At most two fractional digits.
impl FromStr for Temp {
    type Err = ParseTempError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() || frac_part.len() > 2 {
            return Err(ParseTempError);
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(ParseTempError);
        }
        let whole: i32 = int_part.parse().map_err(|_| ParseTempError)?;
        let mut frac: i32 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| ParseTempError)?
        };
        if frac_part.len() == 1 {
            frac *= 10;
        }
        let mut centi = whole.checked_mul(100).ok_or(ParseTempError)? + frac;
        if negative {
            centi = -centi;
        }
        if centi <= i32::from(INVALID_RAW) || centi > i32::from(i16::MAX) {
            return Err(ParseTempError);
        }
        Ok(Self(centi as i16))
    }
}
