//! Random shortcode generation.
//!
//! Codes carry no uniqueness guarantee of their own. Collisions surface as a
//! conflict from the store's atomic insert and the caller retries.

use rand::RngExt;

/// Character set for generated shortcodes (URL-safe, 62 symbols).
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a random shortcode of `length` characters.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_is_62_unique_chars() {
        let unique: HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(ALPHABET.len(), 62);
        assert_eq!(unique.len(), ALPHABET.len());
    }

    #[test]
    fn test_generate_respects_length_and_alphabet() {
        for length in [1, 6, 7, 8, 12] {
            let code = generate(length);
            assert_eq!(code.len(), length);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_generate_rarely_repeats() {
        let codes: HashSet<String> = (0..1000).map(|_| generate(7)).collect();
        // 62^7 possibilities; a handful of collisions in 1000 draws would indicate a broken RNG
        assert!(codes.len() >= 999);
    }
}
