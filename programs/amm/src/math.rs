//! Integer arithmetic shared by the registry, liquidity and swap engines.
//!
//! All amounts are `u64` in the smallest denomination. Products are formed in
//! `u128` so `a * b` never overflows; every division floors.

use crate::errors::{AmmError, Result};

/// Floor square root using Newton's method.
pub fn integer_sqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }

    let mut x = n;
    // ceil(n / 2) without overflowing at u128::MAX
    let mut y = x / 2 + x % 2;

    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }

    x
}

/// `floor(a * b / denominator)`, failing if the quotient does not fit in `u64`.
pub fn mul_div_floor(a: u64, b: u64, denominator: u64) -> Result<u64> {
    if denominator == 0 {
        return Err(AmmError::DivisionByZero);
    }
    let quotient = (a as u128)
        .checked_mul(b as u128)
        .ok_or(AmmError::MathOverflow)?
        / denominator as u128;

    u64::try_from(quotient).map_err(|_| AmmError::MathOverflow)
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(AmmError::MathOverflow)
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(AmmError::MathOverflow)
}

/// Product of two reserves, the constant-product `k`.
pub fn product(a: u64, b: u64) -> u128 {
    // u64::MAX^2 < u128::MAX
    a as u128 * b as u128
}
