// ── keebot-vault / password ────────────────────────────────────────────────────
//
// Password generation for drafts.

use rand::seq::SliceRandom;

/// Characters a generated password is drawn from.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Draw `length` distinct characters from [`ALPHABET`].
///
/// `length` is capped at the alphabet size since characters never repeat.
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    ALPHABET
        .choose_multiple(&mut rng, length.min(ALPHABET.len()))
        .map(|b| *b as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn alphabet_has_62_distinct_chars() {
        let set: HashSet<u8> = ALPHABET.iter().copied().collect();
        assert_eq!(ALPHABET.len(), 62);
        assert_eq!(set.len(), 62);
    }

    #[test]
    fn generated_password_has_no_repeats() {
        for _ in 0..50 {
            let pw = generate_password(8);
            assert_eq!(pw.len(), 8);
            assert!(pw.bytes().all(|b| ALPHABET.contains(&b)));
            let set: HashSet<char> = pw.chars().collect();
            assert_eq!(set.len(), 8);
        }
    }

    #[test]
    fn length_is_capped_at_alphabet_size() {
        assert_eq!(generate_password(100).len(), 62);
    }
}
