//! Per-field similarity functions.
//!
//! All return a score in [0.0, 1.0] where 1.0 means identical.

/// Map a squared L2 distance from a field index to a similarity.
///
/// `1 / (1 + d)`: 1.0 at distance zero, strictly decreasing.
#[inline]
pub fn similarity_from_l2(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// CEP with the `-` and `.` separators removed, surrounding space trimmed
pub fn clean_postal_code(cep: &str) -> String {
    cep.trim().chars().filter(|c| *c != '-' && *c != '.').collect()
}

const CEP_PREFIX_LEN: usize = 5;

/// Score two CEPs: 1.0 when equal after cleaning, 0.5 when both have at
/// least five characters and share the first five (same delivery sector),
/// 0.0 otherwise or when either side is empty.
pub fn match_postal_code(a: &str, b: &str) -> f32 {
    let a = clean_postal_code(a);
    let b = clean_postal_code(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let prefix = |s: &str| s.chars().take(CEP_PREFIX_LEN).collect::<String>();
    if a.chars().count() >= CEP_PREFIX_LEN
        && b.chars().count() >= CEP_PREFIX_LEN
        && prefix(&a) == prefix(&b)
    {
        0.5
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_from_l2() {
        assert_eq!(similarity_from_l2(0.0), 1.0);
        assert!((similarity_from_l2(1.0) - 0.5).abs() < 1e-6);
        assert!(similarity_from_l2(3.0) < similarity_from_l2(2.0));
    }

    #[test]
    fn test_postal_code_exact() {
        assert_eq!(match_postal_code("01310-100", "01310100"), 1.0);
        assert_eq!(match_postal_code("01.310-100", " 01310-100 "), 1.0);
    }

    #[test]
    fn test_postal_code_prefix() {
        assert_eq!(match_postal_code("01310-100", "01310-200"), 0.5);
        assert_eq!(match_postal_code("01310", "01310-999"), 0.5);
        assert_eq!(match_postal_code("0131", "01310-999"), 0.0);
    }

    #[test]
    fn test_postal_code_mismatch_and_empty() {
        assert_eq!(match_postal_code("01310-100", "04000-000"), 0.0);
        assert_eq!(match_postal_code("", "01310-100"), 0.0);
        assert_eq!(match_postal_code("01310-100", ""), 0.0);
        assert_eq!(match_postal_code("-", "."), 0.0);
    }

    #[test]
    fn test_clean_postal_code() {
        assert_eq!(clean_postal_code(" 01.310-100 "), "01310100");
    }
}
