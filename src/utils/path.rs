//! Path utilities: home expansion and output file naming

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::utils::time::{format_filename_time, format_seconds};

/// Characters that cannot appear in a file name on common filesystems
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Current user's home directory
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Replace a leading `~` with the home directory
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
            .or_else(|| path.strip_prefix("~\\"))
    };
    match (rest, home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Replace characters illegal in file names with `_`
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if ILLEGAL_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "clip".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Values substituted into the output file name template
#[derive(Debug, Clone)]
pub struct TemplateValues<'a> {
    pub filename: &'a str,
    pub title: &'a str,
    pub start: f64,
    pub end: f64,
    pub now: DateTime<Local>,
}

impl<'a> TemplateValues<'a> {
    pub fn new(filename: &'a str, title: &'a str, start: f64, end: f64) -> Self {
        Self {
            filename,
            title,
            start,
            end,
            now: Local::now(),
        }
    }

    /// Expand every placeholder in `template`; unknown placeholders stay as written
    pub fn expand(&self, template: &str) -> String {
        let now = &self.now;
        let replacements = [
            ("{filename}", self.filename.to_string()),
            ("{title}", self.title.to_string()),
            ("{start}", format_filename_time(self.start)),
            ("{end}", format_filename_time(self.end)),
            ("{duration}", format_seconds(self.end - self.start)),
            ("{year}", format!("{:04}", now.year())),
            ("{month}", format!("{:02}", now.month())),
            ("{day}", format!("{:02}", now.day())),
            ("{hour}", format!("{:02}", now.hour())),
            ("{minute}", format!("{:02}", now.minute())),
            ("{second}", format!("{:02}", now.second())),
        ];
        replacements
            .iter()
            .fold(template.to_string(), |name, (key, value)| {
                name.replace(key, value)
            })
    }
}

/// Full output path for a clip: `<dir>/<expanded template>.<extension>`
pub fn output_path(dir: &Path, template: &str, values: &TemplateValues<'_>, extension: &str) -> PathBuf {
    let name = sanitize_filename(&values.expand(template));
    dir.join(format!("{}.{}", name, extension.trim_start_matches('.')))
}
