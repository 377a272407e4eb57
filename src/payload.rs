//! Picking the URL out of decoded QR payloads.
//!
//! The decoder hands over every symbol it found; only the first one that looks
//! like a web link is classified.

/// Case-insensitive `http` prefix. The payload is taken as decoded: no
/// trimming, so leading whitespace disqualifies it.
pub fn is_candidate_url(s: &str) -> bool {
    s.len() >= 4 && s.as_bytes()[..4].eq_ignore_ascii_case(b"http")
}

/// First payload that passes `is_candidate_url`, returned verbatim.
pub fn select_url<S: AsRef<str>>(payloads: &[S]) -> Option<&str> {
    payloads
        .iter()
        .map(|p| p.as_ref())
        .find(|p| is_candidate_url(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_check_ignores_case() {
        assert!(is_candidate_url("https://example.com"));
        assert!(is_candidate_url("HTTP://EXAMPLE.COM"));
        assert!(!is_candidate_url("WIFI:S:home;T:WPA;P:secret;;"));
        assert!(!is_candidate_url("htt"));
        assert!(!is_candidate_url(""));
    }

    #[test]
    fn first_link_wins() {
        let p = vec![
            "BEGIN:VCARD".to_string(),
            "https://first.example".to_string(),
            "https://second.example".to_string(),
        ];
        assert_eq!(select_url(&p), Some("https://first.example"));
    }

    #[test]
    fn surrounding_whitespace_is_not_stripped() {
        assert!(!is_candidate_url(" https://x.example"));
        let p = [" https://padded.example", "https://plain.example "];
        assert_eq!(select_url(&p), Some("https://plain.example "));
    }

    #[test]
    fn no_link_yields_none() {
        let p = ["tel:+123", "plain text"];
        assert_eq!(select_url(&p), None);
        let empty: [&str; 0] = [];
        assert_eq!(select_url(&empty), None);
    }
}
