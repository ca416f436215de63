use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A finite decimal number `units * 10^-scale`, always normalized
/// (no trailing zero in the fractional part).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Decimal {
    units: i128,
    scale: u32,
}

fn pow10(exp: u32) -> Option<i128> {
    10_i128.checked_pow(exp)
}

fn gcd(mut lhs: i128, mut rhs: i128) -> i128 {
    while rhs != 0 {
        (lhs, rhs) = (rhs, lhs % rhs);
    }
    lhs.abs()
}

/// Least common multiple of two positive numbers.
pub(super) fn lcm(lhs: i128, rhs: i128) -> Option<i128> {
    let divisor = gcd(lhs, rhs);
    if divisor == 0 {
        return None;
    }
    (lhs / divisor).checked_mul(rhs)
}

/// Rounds `numerator / denominator` toward positive infinity (`denominator > 0`).
pub(super) fn div_ceil(numerator: i128, denominator: i128) -> i128 {
    -((-numerator).div_euclid(denominator))
}

/// Rounds `numerator / denominator` toward negative infinity (`denominator > 0`).
pub(super) fn div_floor(numerator: i128, denominator: i128) -> i128 {
    numerator.div_euclid(denominator)
}

impl Decimal {
    pub(super) const ONE: Self = Self { units: 1, scale: 0 };

    pub(super) fn new(units: i128, scale: u32) -> Self {
        let mut result = Self { units, scale };
        while result.scale > 0 && result.units % 10 == 0 {
            result.units /= 10;
            result.scale -= 1;
        }
        result
    }

    /// Exact decimal reading of the shortest representation of `value`.
    pub(super) fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        value.to_string().parse().ok()
    }

    pub(super) fn scale(self) -> u32 {
        self.scale
    }

    pub(super) fn is_positive(self) -> bool {
        self.units > 0
    }

    /// The units of this number expressed at a (greater or equal) scale.
    pub(super) fn units_at(self, scale: u32) -> Option<i128> {
        let factor = pow10(scale.checked_sub(self.scale)?)?;
        self.units.checked_mul(factor)
    }

    pub(super) fn checked_add(self, other: Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let units = self.units_at(scale)?.checked_add(other.units_at(scale)?)?;
        Some(Self::new(units, scale))
    }

    pub(super) fn checked_sub(self, other: Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let units = self.units_at(scale)?.checked_sub(other.units_at(scale)?)?;
        Some(Self::new(units, scale))
    }

    pub(super) fn floor(self) -> Option<Self> {
        Some(Self::new(div_floor(self.units, pow10(self.scale)?), 0))
    }

    pub(super) fn ceil(self) -> Option<Self> {
        Some(Self::new(div_ceil(self.units, pow10(self.scale)?), 0))
    }

    pub(super) fn is_integral(self) -> bool {
        self.scale == 0
    }

    pub(super) fn to_i64(self) -> Option<i64> {
        if self.is_integral() {
            i64::try_from(self.units).ok()
        } else {
            None
        }
    }

    pub(super) fn to_f64(self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let scale = self.scale.max(other.scale);
        Some(self.units_at(scale)?.cmp(&other.units_at(scale)?))
    }
}

/// Error for strings that are not plain decimal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct InvalidDecimal;

impl FromStr for Decimal {
    type Err = InvalidDecimal;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if integer.is_empty()
            || !integer.bytes().all(|byte| byte.is_ascii_digit())
            || !fraction.bytes().all(|byte| byte.is_ascii_digit())
        {
            return Err(InvalidDecimal);
        }

        let scale = u32::try_from(fraction.len()).map_err(|_| InvalidDecimal)?;
        let mut units: i128 = [integer, fraction]
            .concat()
            .parse()
            .map_err(|_| InvalidDecimal)?;
        if negative {
            units = -units;
        }
        Ok(Self::new(units, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let digits = self.units.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }

        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (integer, fraction) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{integer}.{fraction}")
    }
}
