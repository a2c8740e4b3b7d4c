//! Section extraction from bundle files.
//!
//! A bundle holds many named sections, each fenced by a begin and an end marker
//! line:
//!
//! ```text
//! ==================== START: pm ====================
//! ...section body...
//! ==================== END: pm ====================
//! ```

use serde::{Deserialize, Serialize};

/// Keywords recognized inside marker lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarkers {
    #[serde(default = "default_begin_keyword")]
    pub begin_keyword: String,
    #[serde(default = "default_end_keyword")]
    pub end_keyword: String,
}

fn default_begin_keyword() -> String {
    "START".to_string()
}

fn default_end_keyword() -> String {
    "END".to_string()
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self {
            begin_keyword: default_begin_keyword(),
            end_keyword: default_end_keyword(),
        }
    }
}

impl SectionMarkers {
    /// Render the begin marker line for `section`.
    pub fn begin_line(&self, section: &str) -> String {
        fence(&self.begin_keyword, section)
    }

    /// Render the end marker line for `section`.
    pub fn end_line(&self, section: &str) -> String {
        fence(&self.end_keyword, section)
    }
}

fn fence(keyword: &str, section: &str) -> String {
    format!("==================== {}: {} ====================", keyword, section)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionError {
    NotFound,
    Unterminated,
}

/// Parse a marker line into `(keyword, section)`.
///
/// The line must be fenced by `=` on both sides.
fn parse_marker(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if !(trimmed.starts_with('=') && trimmed.ends_with('=')) {
        return None;
    }
    let inner = trimmed.trim_matches('=').trim();
    let (keyword, name) = inner.split_once(':')?;
    Some((keyword.trim(), name.trim()))
}

/// Return the body between the first begin marker for `section` and the next
/// matching end marker, exclusive of both marker lines.
pub fn extract_section(
    content: &str,
    section: &str,
    markers: &SectionMarkers,
) -> Result<String, SectionError> {
    let mut lines = content.lines();

    let found = lines.by_ref().any(|line| {
        parse_marker(line)
            .map(|(keyword, name)| keyword == markers.begin_keyword && name == section)
            .unwrap_or(false)
    });
    if !found {
        return Err(SectionError::NotFound);
    }

    let mut body = Vec::new();
    for line in lines {
        if let Some((keyword, name)) = parse_marker(line) {
            if keyword == markers.end_keyword && name == section {
                return Ok(body.join("\n"));
            }
        }
        body.push(line);
    }
    Err(SectionError::Unterminated)
}

/// List every section name that has a begin marker, in file order.
pub fn section_names(content: &str, markers: &SectionMarkers) -> Vec<String> {
    content
        .lines()
        .filter_map(parse_marker)
        .filter(|(keyword, _)| *keyword == markers.begin_keyword)
        .map(|(_, name)| name.to_string())
        .collect()
}
