// src/slug.rs
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

pub const DEFAULT_SLUG_LENGTH: usize = 10;

/// Random URL-safe identifier of exactly `length` characters.
///
/// Each character carries six bits from the thread-local CSPRNG.
pub fn make_slug(length: usize) -> String {
    let mut bytes = vec![0u8; (length * 3).div_ceil(4)];
    rand::rng().fill_bytes(&mut bytes);

    let mut slug = URL_SAFE_NO_PAD.encode(&bytes);
    slug.truncate(length);
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug_length() {
        for length in [1, 8, DEFAULT_SLUG_LENGTH, 16, 32] {
            assert_eq!(make_slug(length).len(), length);
        }
    }

    #[test]
    fn test_slug_is_url_safe() {
        let slug = make_slug(32);
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "unexpected character in {slug}"
        );
    }

    #[test]
    fn test_slugs_are_distinct() {
        let slugs: HashSet<String> = (0..1000).map(|_| make_slug(DEFAULT_SLUG_LENGTH)).collect();
        assert_eq!(slugs.len(), 1000);
    }
}
