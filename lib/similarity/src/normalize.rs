//! Text canonicalization for Brazilian address fields.
//!
//! Accents are stripped, case is folded, common street-type abbreviations
//! are expanded and punctuation becomes whitespace, so that
//! `"R. São João, 12"` and `"rua sao joao 12"` embed to the same vector.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Abbreviation → expansion. Each matches at a word start, with an optional
/// trailing period, and must be followed by whitespace.
const ABBREVIATIONS: [(&str, &str); 10] = [
    ("r", "rua"),
    ("av", "avenida"),
    ("trav", "travessa"),
    ("alam", "alameda"),
    ("pca", "praca"),
    ("jd", "jardim"),
    ("vl", "vila"),
    ("cj", "conjunto"),
    ("qd", "quadra"),
    ("lt", "lote"),
];

static ABBREVIATION_RULES: Lazy<Vec<(Regex, String)>> = Lazy::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, full)| {
            let pattern = format!(r"\b{}\.?\s", regex::escape(abbr));
            let re = Regex::new(&pattern).expect("valid abbreviation pattern");
            (re, format!("{} ", full))
        })
        .collect()
});

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"));

/// Latin letters that survive compatibility decomposition
fn fold_letter(c: char, out: &mut String) {
    match c {
        'ß' => out.push_str("ss"),
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        'ø' => out.push('o'),
        'đ' | 'ð' => out.push('d'),
        'ł' => out.push('l'),
        'þ' => out.push_str("th"),
        'ı' => out.push('i'),
        _ => out.push(c),
    }
}

fn strip_accents_lowercase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        for lower in c.to_lowercase() {
            fold_letter(lower, &mut out);
        }
    }
    out
}

/// Canonical form of one address field. Empty input gives `""`.
pub fn normalize_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut text = strip_accents_lowercase(text);

    for (re, replacement) in ABBREVIATION_RULES.iter() {
        if re.is_match(&text) {
            text = re.replace_all(&text, replacement.as_str()).into_owned();
        }
    }

    let text = PUNCTUATION.replace_all(&text, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviations_expand() {
        assert_eq!(normalize_text("R. das Flores"), "rua das flores");
        assert_eq!(normalize_text("Av. Paulista, 1000"), "avenida paulista 1000");
        assert_eq!(normalize_text("Trav Sete"), "travessa sete");
        assert_eq!(normalize_text("Jd. Europa"), "jardim europa");
        assert_eq!(normalize_text("Qd. 5 Lt. 12"), "quadra 5 lote 12");
        assert_eq!(normalize_text("Cj Habitacional Vl. Nova"), "conjunto habitacional vila nova");
    }

    #[test]
    fn test_abbreviation_needs_trailing_space() {
        // Ends the string: nothing follows the abbreviation
        assert_eq!(normalize_text("Travessa R."), "travessa r");
        // Part of a longer word
        assert_eq!(normalize_text("Rio Branco"), "rio branco");
        assert_eq!(normalize_text("Avare"), "avare");
    }

    #[test]
    fn test_accents_and_case() {
        assert_eq!(normalize_text("São João"), "sao joao");
        assert_eq!(normalize_text("PRAÇA DA SÉ"), "praca da se");
        assert_eq!(normalize_text("Pça. Tiradentes"), "praca tiradentes");
        assert_eq!(normalize_text("Straße"), "strasse");
    }

    #[test]
    fn test_punctuation_and_whitespace() {
        assert_eq!(normalize_text("  Rua   A-B / C  "), "rua a b c");
        assert_eq!(normalize_text("Rua_Interna"), "rua_interna");
        assert_eq!(normalize_text("Nº 10"), "no 10");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
        assert_eq!(normalize_text("..."), "");
    }

    #[test]
    fn test_idempotent() {
        for input in ["R. das Flores", "Av. Paulista, 1000", "São Paulo", "Jd. América"] {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once);
        }
    }
}
