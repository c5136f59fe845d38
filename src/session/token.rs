use base64::Engine;
use rand::RngCore;

/// Generate a new session token: 256 bits from the OS CSPRNG, encoded
/// base64url without padding. The result is safe to use directly as a URL
/// path segment and as a filename component, which the file backend relies
/// on.
pub fn new_token() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// True if `token` only contains characters `new_token` can produce.
/// Used to reject hostile tokens before they reach the filesystem layer.
pub fn is_well_formed(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 64
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(new_token()));
        }
    }

    #[test]
    fn tokens_are_url_and_path_safe() {
        for _ in 0..100 {
            let t = new_token();
            assert!(is_well_formed(&t), "token not path-safe: {t}");
        }
    }

    #[test]
    fn token_length_is_stable() {
        // 32 bytes -> 43 chars of unpadded base64url
        assert_eq!(new_token().len(), 43);
    }

    #[test]
    fn rejects_traversal_attempts() {
        assert!(!is_well_formed("../../etc/passwd"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("abc/def"));
        assert!(!is_well_formed("abc.json"));
    }
}
