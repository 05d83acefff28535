//! Filename templating for the image-save path.
//!
//! Patterns contain named placeholders substituted at save time.
//! Placeholders the template names but this table doesn't know stay in
//! the output as literal text, and filesystem-hostile characters in
//! the final result are replaced with underscores.

use crate::transform::text::slugify;
use chrono::{DateTime, Local};

/// Values substituted into a filename pattern.
#[derive(Debug, Clone)]
pub struct FilenameData {
    pub title: String,
    pub host: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub seq: u32,
    pub ext: String,
}

impl Default for FilenameData {
    fn default() -> Self {
        Self {
            title: "untitled".to_string(),
            host: String::new(),
            path: String::new(),
            width: 0,
            height: 0,
            seq: 1,
            ext: "png".to_string(),
        }
    }
}

/// Renders a filename from a pattern at the given timestamp.
pub fn generate_filename_at(pattern: &str, data: &FilenameData, now: DateTime<Local>) -> String {
    let title = if data.title.is_empty() {
        "untitled".to_string()
    } else {
        data.title.clone()
    };
    let path_token: String = {
        let cleaned: String = data
            .path
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
            .collect();
        cleaned.trim_matches('-').to_string()
    };
    let rand4: String = {
        use rand::Rng;
        let mut rng = rand::rng();
        (0..4)
            .map(|_| {
                let n = rng.random_range(0..36);
                char::from_digit(n, 36).unwrap_or('0')
            })
            .collect()
    };

    let tokens: Vec<(&str, String)> = vec![
        ("title:slug", slugify(&title)),
        ("title", title),
        ("host", data.host.clone()),
        ("path", path_token),
        ("date:YYYY-MM-DD", now.format("%Y-%m-%d").to_string()),
        ("date:YYYYMMDD", now.format("%Y%m%d").to_string()),
        ("time:HHmmss", now.format("%H%M%S").to_string()),
        ("w", data.width.to_string()),
        ("h", data.height.to_string()),
        ("seq", format!("{:03}", data.seq)),
        ("rand4", rand4),
        ("ext", data.ext.clone()),
    ];

    let mut filename = pattern.to_string();
    for (token, value) in &tokens {
        filename = filename.replace(&format!("{{{}}}", token), value);
    }

    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// Renders a filename from a pattern using the current local time.
pub fn generate_filename(pattern: &str, data: &FilenameData) -> String {
    generate_filename_at(pattern, data, Local::now())
}
