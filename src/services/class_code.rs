// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Class login codes.

use ring::rand::{SecureRandom, SystemRandom};

/// Code length in characters.
pub const CODE_LEN: usize = 8;

// No 0/O or 1/I/L, so codes survive being read aloud or copied from a board.
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generate a random class code.
pub fn generate(rng: &SystemRandom) -> anyhow::Result<String> {
    // Bytes at or above this bound are rejected so every symbol is equally likely.
    let bound = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

    let mut code = String::with_capacity(CODE_LEN);
    let mut bytes = [0u8; 16];
    while code.len() < CODE_LEN {
        rng.fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("system random source failed"))?;
        for b in bytes.iter().filter(|b| **b < bound) {
            if code.len() == CODE_LEN {
                break;
            }
            code.push(ALPHABET[usize::from(*b) % ALPHABET.len()] as char);
        }
    }
    Ok(code)
}

/// Canonical form used for storage and lookup.
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let rng = SystemRandom::new();
        for _ in 0..50 {
            let code = generate(&rng).unwrap();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generate_varies() {
        let rng = SystemRandom::new();
        let a = generate(&rng).unwrap();
        let b = generate(&rng).unwrap();
        let c = generate(&rng).unwrap();
        assert!(a != b || b != c);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  abcd2345 "), "ABCD2345");
    }
}
