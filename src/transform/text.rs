//! Pure text transforms: cleanup, casing, statistics, encoding.
//!
//! Every function here is deterministic and side-effect free; the
//! dispatcher decides what to do with the output.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mode::CaseStyle;

/// Tracking parameters embedded in copied text, e.g. `utm_source=x`.
static TRACKING_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(utm_|fbclid|gclid|msclkid|ref|source|campaign|medium|term|content)[a-z_]*=[^\s&]+")
        .expect("tracking param pattern")
});

/// Words kept lowercase by smart title case, unless first or last.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "in", "is", "it", "of", "on", "or", "the",
    "to", "up", "yet",
];

/// Average reading speed used for the statistics report.
pub const DEFAULT_READING_WPM: u32 = 225;

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200b}'..='\u{200d}' | '\u{feff}')
}

fn strip_zero_width(text: &str) -> String {
    text.chars().filter(|c| !is_zero_width(*c)).collect()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out.trim().to_string()
}

/// Strips zero-width characters and embedded tracking parameters, then
/// collapses all whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    let stripped = strip_zero_width(text);
    let untracked = TRACKING_PARAM.replace_all(&stripped, "");
    collapse_whitespace(&untracked)
}

/// Replaces typographic punctuation with its ASCII equivalent and
/// tidies whitespace.
pub fn unicode_fix(text: &str) -> String {
    let ascii: String = text
        .chars()
        .filter(|c| !is_zero_width(*c))
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{2014}' | '\u{2013}' => '-',
            other => other,
        })
        .collect();
    collapse_whitespace(&ascii)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Title case with a stop-word list. The first and last words are
/// always capitalized, stop-words or not.
pub fn smart_title_case(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 || i == last || !STOPWORDS.contains(word) {
                capitalize(word)
            } else {
                (*word).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL-safe slug: lowercase, word characters only, separator runs
/// collapsed to single hyphens. Idempotent.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept: String = lowered
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '\t' | '\n' | '_' | '-'))
        .collect();
    let mut out = String::with_capacity(kept.len());
    let mut pending_sep = false;
    for c in kept.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_sep = !out.is_empty();
        } else {
            if pending_sep {
                out.push('-');
                pending_sep = false;
            }
            out.push(c);
        }
    }
    out
}

/// Splits into words on whitespace and lower-to-upper case boundaries,
/// used by the joined casings (camel, pascal).
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in text.chars() {
        if c.is_whitespace() || !(c.is_alphanumeric() || c == '\'') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Applies one of the supported case conversions.
pub fn convert_case(text: &str, style: CaseStyle) -> String {
    match style {
        CaseStyle::Upper => text.to_uppercase(),
        CaseStyle::Lower => text.to_lowercase(),
        CaseStyle::Title => text
            .split_whitespace()
            .map(|w| capitalize(&w.to_lowercase()))
            .collect::<Vec<_>>()
            .join(" "),
        CaseStyle::Camel => {
            let words = split_words(text);
            words
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    if i == 0 {
                        w.to_lowercase()
                    } else {
                        capitalize(&w.to_lowercase())
                    }
                })
                .collect()
        }
        CaseStyle::Pascal => split_words(text)
            .iter()
            .map(|w| capitalize(&w.to_lowercase()))
            .collect(),
        CaseStyle::Snake => join_lowered(text, '_'),
        CaseStyle::Kebab => join_lowered(text, '-'),
    }
}

fn join_lowered(text: &str, sep: char) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}

/// Word, sentence, and reading-time counts for a block of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStatistics {
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    /// Fractional minutes at the configured reading speed.
    pub reading_time: f64,
    /// Display value: fractional minutes rounded up.
    pub reading_minutes: u64,
}

pub fn text_statistics(text: &str, words_per_minute: u32) -> TextStatistics {
    let characters = text.chars().count();
    let characters_no_spaces = text.chars().filter(|c| !c.is_whitespace()).count();
    let words = text.split_whitespace().count();
    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let paragraphs = text
        .split("\n\n")
        .flat_map(|p| p.split("\r\n\r\n"))
        .filter(|p| !p.trim().is_empty())
        .count();
    let reading_time = words as f64 / words_per_minute.max(1) as f64;
    TextStatistics {
        characters,
        characters_no_spaces,
        words,
        sentences,
        paragraphs,
        reading_time: (reading_time * 10.0).round() / 10.0,
        reading_minutes: reading_time.ceil() as u64,
    }
}

pub fn format_statistics(stats: &TextStatistics) -> String {
    format!(
        "Text Statistics:\n\
         Characters: {}\n\
         Characters (no spaces): {}\n\
         Words: {}\n\
         Sentences: {}\n\
         Paragraphs: {}\n\
         Reading time: {} minutes ({} min)",
        stats.characters,
        stats.characters_no_spaces,
        stats.words,
        stats.sentences,
        stats.paragraphs,
        stats.reading_time,
        stats.reading_minutes
    )
}

pub fn base64_encode(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

/// Decodes Base64 text. Returns `None` when the input is not valid
/// Base64 or not valid UTF-8 once decoded.
pub fn base64_decode(text: &str) -> Option<String> {
    let bytes = BASE64.decode(text.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Round-trip detector guarding the decode path. Known heuristic: some
/// short strings survive decode/re-encode without being Base64, so the
/// empty string is rejected explicitly.
pub fn is_base64(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    match BASE64.decode(trimmed) {
        Ok(bytes) => BASE64.encode(&bytes) == trimmed,
        Err(_) => false,
    }
}

/// Pretty-prints JSON; unparsable input passes through unchanged.
pub fn format_json(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

/// Best-effort source language sniffing for the code-fence transform.
pub fn detect_language(text: &str) -> &'static str {
    if text.contains("function")
        || text.contains("const ")
        || text.contains("let ")
        || text.contains("var ")
    {
        return "javascript";
    }
    if text.contains("<?php") || text.contains("echo ") || text.contains('$') {
        return "php";
    }
    if text.contains("def ") || text.contains("import ") || text.contains("print(") {
        return "python";
    }
    if text.contains("public class") || text.contains("System.out.println") {
        return "java";
    }
    if text.contains("<html") || text.contains("<div") || text.contains("<span") {
        return "html";
    }
    if text.contains("color:") || text.contains("background:") || text.contains("font-size:") {
        return "css";
    }
    "text"
}

/// Wraps text in a fenced code block tagged with the sniffed language.
pub fn code_fence(text: &str) -> (String, &'static str) {
    let language = detect_language(text);
    (format!("```{}\n{}\n```", language, text), language)
}

/// Appends a source attribution block to copied text.
pub fn with_source(text: &str, title: &str, url: &str) -> String {
    format!("{}\n\nSource: {}\nURL: {}", text, title, url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_zero_width_and_tracking() {
        let input = "Check\u{200b} this https://x.test/?utm_source=mail&id=4 out";
        let cleaned = clean_text(input);
        assert!(!cleaned.contains('\u{200b}'));
        assert!(!cleaned.contains("utm_source"));
        assert!(cleaned.contains("id=4"));
    }

    #[test]
    fn unicode_fix_straightens_quotes_and_dashes() {
        assert_eq!(
            unicode_fix("\u{201c}hi\u{201d} \u{2014} it\u{2019}s  fine"),
            "\"hi\" - it's fine"
        );
    }

    #[test]
    fn smart_title_case_always_capitalizes_ends() {
        assert_eq!(
            smart_title_case("the cat of the house"),
            "The Cat of the House"
        );
        // Last word is a stop-word and still gets capitalized.
        assert_eq!(smart_title_case("a plan to stick to"), "A Plan to Stick To");
        assert_eq!(smart_title_case(""), "");
    }

    #[test]
    fn slugify_matches_expected_form() {
        assert_eq!(slugify("Hello, World!  "), "hello-world");
        assert_eq!(slugify("__already_snaked__"), "already-snaked");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_is_idempotent() {
        for input in ["Hello, World!", "A  B__C--D", "Ünïcödé Titles", "  "] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn case_conversions() {
        assert_eq!(convert_case("hello world", CaseStyle::Upper), "HELLO WORLD");
        assert_eq!(convert_case("Hello WORLD", CaseStyle::Lower), "hello world");
        assert_eq!(convert_case("hello wORLD", CaseStyle::Title), "Hello World");
        assert_eq!(convert_case("hello world", CaseStyle::Snake), "hello_world");
        assert_eq!(convert_case("hello world", CaseStyle::Kebab), "hello-world");
    }

    #[test]
    fn camel_and_pascal_split_on_case_boundaries() {
        assert_eq!(
            convert_case("hello world FooBar", CaseStyle::Camel),
            "helloWorldFooBar"
        );
        assert_eq!(
            convert_case("hello world FooBar", CaseStyle::Pascal),
            "HelloWorldFooBar"
        );
    }

    #[test]
    fn statistics_counts_words_and_sentences() {
        let stats = text_statistics("One two three. Four five.", DEFAULT_READING_WPM);
        assert_eq!(stats.words, 5);
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.characters, 25);
        assert_eq!(stats.paragraphs, 1);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn statistics_empty_input() {
        let stats = text_statistics("", DEFAULT_READING_WPM);
        assert_eq!(stats.words, 0);
        assert_eq!(stats.sentences, 0);
        assert_eq!(stats.reading_minutes, 0);
    }

    #[test]
    fn base64_round_trips() {
        for input in ["hello", "Ünïcödé", "a", ""] {
            let encoded = base64_encode(input);
            assert_eq!(base64_decode(&encoded).as_deref(), Some(input));
            if !input.is_empty() {
                assert!(is_base64(&encoded), "encode({input:?}) should detect");
            }
        }
        assert!(!is_base64("not base64!"));
        assert!(!is_base64(""));
    }

    #[test]
    fn json_formatting_passes_through_invalid_input() {
        assert_eq!(format_json("{\"a\":1}"), "{\n  \"a\": 1\n}");
        assert_eq!(format_json("not json"), "not json");
    }

    #[test]
    fn code_fence_tags_detected_language() {
        let (fenced, lang) = code_fence("const x = 1;");
        assert_eq!(lang, "javascript");
        assert!(fenced.starts_with("```javascript\n"));
        assert!(fenced.ends_with("\n```"));
    }
}
