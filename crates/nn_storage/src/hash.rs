/// Short, stable cache id for a URL or any other fingerprint string.
///
/// 32-bit rolling hash (`h * 31 + unit` over UTF-16 code units, wrapping),
/// absolute value, rendered in base 36. Keys written by earlier versions of
/// the extension stay readable.
pub fn hash_url(url: &str) -> String {
    let mut hash: i32 = 0;
    for unit in url.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    to_base36((hash as i64).unsigned_abs())
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_values() {
        assert_eq!(hash_url(""), "0");
        assert_eq!(hash_url("a"), "2p");
        assert_eq!(hash_url("ab"), "2e9");
    }

    #[test]
    fn test_hash_is_stable_and_distinguishes() {
        let a = hash_url("https://example.com/story");
        assert_eq!(a, hash_url("https://example.com/story"));
        assert_ne!(a, hash_url("https://example.com/story2"));
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_hash_handles_overflow() {
        let long = "https://example.com/".repeat(200);
        let h = hash_url(&long);
        assert!(!h.is_empty());
        assert!(!h.starts_with('-'));
    }
}
