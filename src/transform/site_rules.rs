//! Per-host cleanup rules applied by the "apply site rules" mode.
//!
//! A rule set is keyed by page host and opted into by the user; a
//! missing rule set is a passthrough. URL rewriting is the one
//! transform with an intended side effect, so it is returned as an
//! explicit value for the host to apply rather than performed here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "[\u{1F600}-\u{1F64F}\u{1F300}-\u{1F5FF}\u{1F680}-\u{1F6FF}\u{1F1E0}-\u{1F1FF}\u{2600}-\u{26FF}\u{2700}-\u{27BF}]",
    )
    .expect("emoji pattern")
});

/// How smart quotes should be rewritten, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    #[default]
    Keep,
    Straight,
}

/// Text-cleaning switches for one host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CleanTextRules {
    #[serde(default)]
    pub zero_width: bool,
    #[serde(default)]
    pub smart_quotes: QuoteStyle,
    #[serde(default)]
    pub strip_emojis: bool,
}

/// The full rule record for one host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteRules {
    #[serde(default)]
    pub clean_text: CleanTextRules,
    /// Query parameters to strip from the page URL. A trailing `*`
    /// matches any parameter with that prefix.
    #[serde(default)]
    pub url_params_to_remove: Vec<String>,
}

/// Result of applying site rules.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRuleOutcome {
    pub text: String,
    /// Set when parameter removal changed the page URL; the host is
    /// expected to rewrite its location to this value.
    pub rewritten_url: Option<String>,
}

pub fn apply_site_rules(text: &str, rules: Option<&SiteRules>, page_url: &str) -> SiteRuleOutcome {
    let Some(rules) = rules else {
        return SiteRuleOutcome {
            text: text.to_string(),
            rewritten_url: None,
        };
    };

    let mut processed = text.to_string();
    if rules.clean_text.zero_width {
        processed.retain(|c| !matches!(c, '\u{200b}'..='\u{200d}' | '\u{feff}'));
    }
    if rules.clean_text.smart_quotes == QuoteStyle::Straight {
        processed = processed
            .chars()
            .map(|c| match c {
                '\u{201c}' | '\u{201d}' => '"',
                '\u{2018}' | '\u{2019}' => '\'',
                other => other,
            })
            .collect();
    }
    if rules.clean_text.strip_emojis {
        processed = EMOJI.replace_all(&processed, "").into_owned();
    }

    SiteRuleOutcome {
        text: processed,
        rewritten_url: strip_url_params(page_url, &rules.url_params_to_remove),
    }
}

/// Removes the listed query parameters from a URL, honoring trailing
/// `*` prefix patterns. Returns `None` when nothing changed.
fn strip_url_params(page_url: &str, params: &[String]) -> Option<String> {
    if params.is_empty() {
        return None;
    }
    let url = Url::parse(page_url).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            !params.iter().any(|pattern| {
                if let Some(prefix) = pattern.strip_suffix('*') {
                    key.starts_with(prefix)
                } else {
                    key == pattern
                }
            })
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut rewritten = url.clone();
    if kept.is_empty() {
        rewritten.set_query(None);
    } else {
        rewritten
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    if rewritten.as_str() != page_url {
        Some(rewritten.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rules_pass_through() {
        let out = apply_site_rules("a\u{200b}b", None, "https://x.test/");
        assert_eq!(out.text, "a\u{200b}b");
        assert!(out.rewritten_url.is_none());
    }

    #[test]
    fn clean_text_flags_apply_independently() {
        let rules = SiteRules {
            clean_text: CleanTextRules {
                zero_width: true,
                smart_quotes: QuoteStyle::Straight,
                strip_emojis: false,
            },
            url_params_to_remove: vec![],
        };
        let out = apply_site_rules("\u{201c}a\u{200b}b\u{201d}", Some(&rules), "https://x.test/");
        assert_eq!(out.text, "\"ab\"");
    }

    #[test]
    fn url_params_strip_exact_and_prefix() {
        let rules = SiteRules {
            clean_text: CleanTextRules::default(),
            url_params_to_remove: vec!["fbclid".to_string(), "utm_*".to_string()],
        };
        let out = apply_site_rules(
            "t",
            Some(&rules),
            "https://x.test/p?utm_source=a&fbclid=b&keep=c",
        );
        assert_eq!(
            out.rewritten_url.as_deref(),
            Some("https://x.test/p?keep=c")
        );
    }

    #[test]
    fn unchanged_url_reports_no_rewrite() {
        let rules = SiteRules {
            clean_text: CleanTextRules::default(),
            url_params_to_remove: vec!["utm_*".to_string()],
        };
        let out = apply_site_rules("t", Some(&rules), "https://x.test/p?keep=c");
        assert!(out.rewritten_url.is_none());
    }
}
