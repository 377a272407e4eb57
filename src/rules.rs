//! Lexical risk rules over the URL text.
//!
//! Every rule runs; each contributes at most one reason. Reasons come out in
//! a fixed order:
//! 1. length            (`max_url_length`, chars)
//! 2. domain dots       (`max_domain_dots`)
//! 3. IPv4-like prefix  (`\d+.\d+.\d+.\d+` anchored at domain start, not validated)
//! 4. special chars     (`special_chars`, counted across the whole URL)
//! 5. suspicious TLD    (domain suffix, case-sensitive)
//! 6. shortener         (substring anywhere, case-sensitive)
//! 7. phishing keyword  (substring of the lowercased URL)
//!
//! "Domain" is the URL with a leading `http://` / `https://` removed, cut at the first `/`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Reason labels surfaced in verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuspicionReason {
    #[serde(rename = "URL is too long")]
    TooLong,
    #[serde(rename = "Too many dots in domain")]
    TooManyDots,
    #[serde(rename = "IP address used instead of domain")]
    IpAddressHost,
    #[serde(rename = "Too many special characters")]
    TooManySpecialChars,
    #[serde(rename = "Suspicious TLD used")]
    SuspiciousTld,
    #[serde(rename = "URL shortener detected")]
    Shortener,
    #[serde(rename = "Phishing keyword detected")]
    PhishingKeyword,
    /// Only produced when a verdict is rebuilt from an unsafe stored record.
    #[serde(rename = "QR is not Safe")]
    StoredUnsafe,
}

impl SuspicionReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TooLong => "URL is too long",
            Self::TooManyDots => "Too many dots in domain",
            Self::IpAddressHost => "IP address used instead of domain",
            Self::TooManySpecialChars => "Too many special characters",
            Self::SuspiciousTld => "Suspicious TLD used",
            Self::Shortener => "URL shortener detected",
            Self::PhishingKeyword => "Phishing keyword detected",
            Self::StoredUnsafe => "QR is not Safe",
        }
    }
}

impl std::fmt::Display for SuspicionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn default_max_url_length() -> usize {
    75
}
fn default_max_domain_dots() -> usize {
    3
}
fn default_max_special_chars() -> usize {
    4
}
fn default_special_chars() -> String {
    "@?-=&%".to_string()
}
fn default_suspicious_tlds() -> Vec<String> {
    [".tk", ".ml", ".ga", ".cf", ".gq"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_shorteners() -> Vec<String> {
    ["bit.ly", "tinyurl.com", "goo.gl"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_phishing_keywords() -> Vec<String> {
    [
        "login", "signin", "verify", "account", "update", "secure", "banking", "free", "gift",
        "prize", "win", "alert", "confirm", "support",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Thresholds and denylists, loaded once at startup (`[rules]` in the app config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    /// Longer than this (in chars) fires `TooLong`.
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
    /// More dots than this in the domain fires `TooManyDots`.
    #[serde(default = "default_max_domain_dots")]
    pub max_domain_dots: usize,
    /// More occurrences than this fires `TooManySpecialChars`.
    #[serde(default = "default_max_special_chars")]
    pub max_special_chars: usize,
    /// Each char of this string is counted.
    #[serde(default = "default_special_chars")]
    pub special_chars: String,
    #[serde(default = "default_suspicious_tlds")]
    pub suspicious_tlds: Vec<String>,
    #[serde(default = "default_shorteners")]
    pub shorteners: Vec<String>,
    /// Matched against the lowercased URL; entries are lowercased on load.
    #[serde(default = "default_phishing_keywords")]
    pub phishing_keywords: Vec<String>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            max_url_length: default_max_url_length(),
            max_domain_dots: default_max_domain_dots(),
            max_special_chars: default_max_special_chars(),
            special_chars: default_special_chars(),
            suspicious_tlds: default_suspicious_tlds(),
            shorteners: default_shorteners(),
            phishing_keywords: default_phishing_keywords(),
        }
    }
}

impl RuleTables {
    /// Drop empty entries (an empty needle would match every URL) and lowercase keywords.
    pub fn sanitized(mut self) -> Self {
        let clean = |items: Vec<String>| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };
        self.suspicious_tlds = clean(self.suspicious_tlds);
        self.shorteners = clean(self.shorteners);
        self.phishing_keywords = clean(self.phishing_keywords)
            .into_iter()
            .map(|k| k.to_lowercase())
            .collect();
        self
    }
}

static RE_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("scheme regex"));
static RE_IPV4_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+").expect("ipv4 regex"));

/// Domain portion: scheme stripped, cut at the first `/`.
pub fn domain_of(url: &str) -> &str {
    let rest = match RE_SCHEME.find(url) {
        Some(m) => &url[m.end()..],
        None => url,
    };
    rest.split('/').next().unwrap_or_default()
}

/// Stateless evaluator over a fixed set of tables.
#[derive(Debug, Clone, Default)]
pub struct LexicalAnalyzer {
    tables: RuleTables,
}

impl LexicalAnalyzer {
    pub fn new(tables: RuleTables) -> Self {
        Self {
            tables: tables.sanitized(),
        }
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    pub fn analyze(&self, url: &str) -> Vec<SuspicionReason> {
        let t = &self.tables;
        let domain = domain_of(url);
        let mut reasons = Vec::new();

        if url.chars().count() > t.max_url_length {
            reasons.push(SuspicionReason::TooLong);
        }
        if domain.matches('.').count() > t.max_domain_dots {
            reasons.push(SuspicionReason::TooManyDots);
        }
        if RE_IPV4_PREFIX.is_match(domain) {
            reasons.push(SuspicionReason::IpAddressHost);
        }
        let specials = url.chars().filter(|c| t.special_chars.contains(*c)).count();
        if specials > t.max_special_chars {
            reasons.push(SuspicionReason::TooManySpecialChars);
        }
        if t.suspicious_tlds.iter().any(|tld| domain.ends_with(tld.as_str())) {
            reasons.push(SuspicionReason::SuspiciousTld);
        }
        if t.shorteners.iter().any(|s| url.contains(s.as_str())) {
            reasons.push(SuspicionReason::Shortener);
        }
        let lower = url.to_lowercase();
        if t.phishing_keywords.iter().any(|k| lower.contains(k.as_str())) {
            reasons.push(SuspicionReason::PhishingKeyword);
        }

        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SuspicionReason::*;

    fn analyze(url: &str) -> Vec<SuspicionReason> {
        LexicalAnalyzer::default().analyze(url)
    }

    #[test]
    fn clean_url_has_no_reasons() {
        assert!(analyze("https://example.com/docs").is_empty());
    }

    #[test]
    fn phishy_tk_url_reports_in_rule_order() {
        let r = analyze("http://login-secure-bank.tk/verify?x=1&y=2&z=3");
        assert_eq!(r, vec![TooManySpecialChars, SuspiciousTld, PhishingKeyword]);
    }

    #[test]
    fn length_boundary_is_exclusive() {
        let base = "https://example.com/";
        let at_limit = format!("{}{}", base, "a".repeat(75 - base.len()));
        assert_eq!(at_limit.len(), 75);
        assert!(!analyze(&at_limit).contains(&TooLong));
        let over = format!("{}a", at_limit);
        assert_eq!(analyze(&over), vec![TooLong]);
    }

    #[test]
    fn dots_are_counted_in_domain_only() {
        assert!(analyze("https://a.b.c.example.com/x").contains(&TooManyDots));
        assert!(!analyze("https://a.b.example.com/x.y.z.w.v").contains(&TooManyDots));
    }

    #[test]
    fn ip_prefix_is_permissive() {
        let r = analyze("http://999.999.0.0/path");
        assert!(r.contains(&IpAddressHost));
        // three dots is at the limit, not over it
        assert!(!r.contains(&TooManyDots));
        assert!(!analyze("http://host1.2.3.4/").contains(&IpAddressHost));
    }

    #[test]
    fn special_chars_count_across_whole_url() {
        assert!(!analyze("https://example.com/?a=1&b").contains(&TooManySpecialChars));
        assert!(analyze("https://example.com/?a=1&b=2&c").contains(&TooManySpecialChars));
    }

    #[test]
    fn tld_check_is_suffix_of_domain() {
        assert!(analyze("http://example.ml/docs").contains(&SuspiciousTld));
        assert!(!analyze("http://example.com/page.tk").contains(&SuspiciousTld));
        assert!(!analyze("http://example.tkx/").contains(&SuspiciousTld));
    }

    #[test]
    fn shortener_is_case_sensitive_substring() {
        assert_eq!(analyze("https://bit.ly/abc"), vec![Shortener]);
        assert!(analyze("https://BIT.LY/abc").is_empty());
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(analyze("https://example.com/LOGIN"), vec![PhishingKeyword]);
        // "win" hides inside "windows"
        assert_eq!(analyze("https://example.com/windows"), vec![PhishingKeyword]);
    }

    #[test]
    fn scheme_strip_is_case_sensitive() {
        // Uppercase scheme is not stripped, so the domain becomes "HTTP:".
        assert_eq!(domain_of("HTTP://example.com/x"), "HTTP:");
        assert_eq!(domain_of("https://example.com/x"), "example.com");
        assert_eq!(domain_of("https://example.com"), "example.com");
    }

    #[test]
    fn custom_tables_change_thresholds() {
        let tables = RuleTables {
            max_url_length: 10,
            suspicious_tlds: vec![".zip".into(), "  ".into()],
            phishing_keywords: vec!["PAYPAL".into()],
            ..RuleTables::default()
        };
        let a = LexicalAnalyzer::new(tables);
        assert_eq!(a.tables().suspicious_tlds, vec![".zip".to_string()]);
        assert_eq!(
            a.analyze("https://paypal.zip"),
            vec![TooLong, SuspiciousTld, PhishingKeyword]
        );
    }

    #[test]
    fn labels_match_serialized_form() {
        for r in [
            TooLong,
            TooManyDots,
            IpAddressHost,
            TooManySpecialChars,
            SuspiciousTld,
            Shortener,
            PhishingKeyword,
            StoredUnsafe,
        ] {
            let s = serde_json::to_value(r).unwrap();
            assert_eq!(s.as_str(), Some(r.label()));
        }
    }
}
