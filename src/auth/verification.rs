use rand::Rng;

const TOKEN_LEN: usize = 21;
const TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Opaque, URL-safe token mailed to a new account.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Gravatar URL used until the user uploads an avatar.
pub fn default_avatar_url(email: &str) -> String {
    let digest = md5::compute(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_shape() {
        let t = generate_token();
        assert_eq!(t.len(), TOKEN_LEN);
        assert!(t
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn gravatar_is_deterministic_and_normalized() {
        let a = default_avatar_url("A@X.com ");
        let b = default_avatar_url("a@x.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
        assert!(a.ends_with("?s=200&r=pg&d=mm"));
        assert_ne!(a, default_avatar_url("b@x.com"));
    }

    #[test]
    fn gravatar_hash_matches_md5() {
        // md5("") is the well-known empty digest
        assert_eq!(
            default_avatar_url(""),
            "https://www.gravatar.com/avatar/d41d8cd98f00b204e9800998ecf8427e?s=200&r=pg&d=mm"
        );
    }
}
