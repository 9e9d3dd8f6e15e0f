//! CPF check-digit validation.
//!
//! The CPF is the Brazilian taxpayer id: 9 base digits followed by two check
//! digits computed with a weighted-sum mod-11 recurrence. Formatting
//! characters (`.`, `-`, spaces) are stripped before validation.

/// Validates a CPF.
///
/// Normalizes to digits only, requires exactly 11 digits, rejects sequences
/// of a single repeated digit (which would otherwise pass the arithmetic),
/// then verifies both check digits.
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits, 9) == digits[9] && check_digit(&digits, 10) == digits[10]
}

/// Computes the check digit over the first `n` digits, with weights
/// descending from `n + 1` down to 2.
fn check_digit(digits: &[u32], n: usize) -> u32 {
    let sum: u32 = digits[..n]
        .iter()
        .zip((2..=(n as u32 + 1)).rev())
        .map(|(d, w)| d * w)
        .sum();
    let remainder = (sum * 10) % 11;
    if remainder >= 10 {
        0
    } else {
        remainder
    }
}
