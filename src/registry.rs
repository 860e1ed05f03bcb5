//! Site identity normalization and the strategy registry.
//!
//! Adding coverage for a new site means one new `(host, Strategy)`
//! entry here (plus a recipe, if none of the existing ones fit). This
//! table is intentionally the only site-specific code outside the
//! recipe bodies themselves.

use url::Url;

/// A closed set of extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Inline `html5player` setter calls in page scripts.
    PlayerScript,
    /// JSON-LD `VideoObject` metadata block.
    JsonLd,
    /// Browser session with network interception.
    Intercept,
}

/// Exact-match table keyed by normalized host.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("mixkit.co", Strategy::JsonLd),
    ("pixabay.com", Strategy::Intercept),
    ("xhamster.com", Strategy::JsonLd),
    ("xvideos.com", Strategy::PlayerScript),
];

/// Normalize a parsed URL into its site identity: lowercase host with
/// a leading `www.` stripped.
pub fn site_identity(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(
        host.strip_prefix("www.")
            .map(|h| h.to_string())
            .unwrap_or(host),
    )
}

/// Look up the strategy for a normalized host. Exact match only — no
/// wildcard or suffix matching.
pub fn strategy_for(host: &str) -> Option<Strategy> {
    STRATEGIES
        .iter()
        .find(|(h, _)| *h == host)
        .map(|(_, s)| *s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_identity_strips_www_and_lowercases() {
        let url = Url::parse("https://WWW.Mixkit.CO/video/123").unwrap();
        assert_eq!(site_identity(&url).as_deref(), Some("mixkit.co"));
    }

    #[test]
    fn test_site_identity_keeps_other_subdomains() {
        let url = Url::parse("https://cdn.mixkit.co/video").unwrap();
        assert_eq!(site_identity(&url).as_deref(), Some("cdn.mixkit.co"));
    }

    #[test]
    fn test_strategy_lookup_is_exact_match() {
        assert_eq!(strategy_for("mixkit.co"), Some(Strategy::JsonLd));
        assert_eq!(strategy_for("pixabay.com"), Some(Strategy::Intercept));
        assert_eq!(strategy_for("xvideos.com"), Some(Strategy::PlayerScript));
        // A subdomain of a supported host is not itself supported
        assert_eq!(strategy_for("cdn.mixkit.co"), None);
        assert_eq!(strategy_for("example.com"), None);
    }
}
