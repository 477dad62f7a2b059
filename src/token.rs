use std::collections::HashSet;

use rand::RngCore;

/// Default token size. Eight random bytes give a 64-bit space, large
/// enough that the retry loop below is effectively never taken.
pub const DEFAULT_TOKEN_BYTES: usize = 8;

/// Generates a hex-encoded random token of `length_bytes` bytes that is
/// guaranteed not to be a member of `excluded`.
///
/// The exclusion set is re-checked on every attempt, so tokens issued
/// earlier in the same batch can be added to the set between calls. The
/// loop is unbounded: it draws fresh randomness until it finds a free
/// token rather than giving up after a fixed number of attempts.
pub fn generate(length_bytes: usize, excluded: &HashSet<String>) -> String {
    let mut rng = rand::thread_rng();
    let mut buf = vec![0u8; length_bytes];

    loop {
        rng.fill_bytes(&mut buf);
        let token = hex::encode(&buf);
        if !excluded.contains(&token) {
            return token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_has_requested_length() {
        let token = generate(8, &HashSet::new());
        assert_eq!(token.len(), 16); // hex doubles the byte count
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_token_never_in_exclusion_set() {
        // A one-byte space has only 256 tokens, so collisions are
        // frequent and the retry loop actually runs.
        let mut excluded = HashSet::new();
        for b in 0u16..200 {
            excluded.insert(hex::encode([b as u8]));
        }

        for _ in 0..500 {
            let token = generate(1, &excluded);
            assert!(!excluded.contains(&token));
        }
    }

    #[test]
    fn chained_generation_yields_pairwise_distinct_tokens() {
        let mut excluded = HashSet::new();
        for _ in 0..100 {
            let token = generate(2, &excluded);
            assert!(excluded.insert(token), "token was issued twice");
        }
        assert_eq!(excluded.len(), 100);
    }
}
