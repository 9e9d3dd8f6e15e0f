//! CNPJ check-digit validation.
//!
//! The CNPJ is the Brazilian employer/institution registry id: 12 base
//! digits followed by two check digits computed with fixed weight vectors
//! mod 11. Formatting characters (`.`, `/`, `-`) are stripped first.

const WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validates a CNPJ.
///
/// Normalizes to digits only, requires exactly 14 digits, rejects sequences
/// of a single repeated digit, then verifies both check digits.
pub fn is_valid_cnpj(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 14 {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits, &WEIGHTS_FIRST) == digits[12]
        && check_digit(&digits, &WEIGHTS_SECOND) == digits[13]
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cnpjs() {
        assert!(is_valid_cnpj("11222333000181"));
        assert!(is_valid_cnpj("11444777000161"));
    }

    #[test]
    fn test_formatted_cnpj_accepted() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
    }

    #[test]
    fn test_wrong_check_digits_rejected() {
        assert!(!is_valid_cnpj("11222333000182"));
        assert!(!is_valid_cnpj("11222333000191"));
    }

    #[test]
    fn test_repeated_digit_sequences_rejected() {
        for d in 0..=9 {
            let cnpj: String = std::iter::repeat(char::from(b'0' + d)).take(14).collect();
            assert!(!is_valid_cnpj(&cnpj), "{cnpj} must be rejected");
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(!is_valid_cnpj(""));
        assert!(!is_valid_cnpj("1122233300018"));
        assert!(!is_valid_cnpj("112223330001810"));
        // An 11-digit taxpayer id is not a registry id
        assert!(!is_valid_cnpj("52998224725"));
    }
}
