//! Persona customization directives.
//!
//! A `customize` string is a list of directives, one per line, each targeting a
//! Markdown section of the loaded persona:
//!
//! ```text
//! REPLACE:Style:Answer in bullet points.
//! APPEND:Rules:Never skip the checklist.
//! PREPEND:Rules:Read the PRD first.
//! REMOVE:Greeting
//! ```
//!
//! Lines that do not start a directive continue the previous directive's text.
//! A string that does not open with a directive is free text and is appended
//! to a `Customization` section.

use crate::error::CustomizeParseError;

/// Section that receives free-text customization.
pub const FREE_TEXT_SECTION: &str = "Customization";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomizeDirective {
    Replace { section: String, text: String },
    Append { section: String, text: String },
    Prepend { section: String, text: String },
    Remove { section: String },
}

impl CustomizeDirective {
    pub fn section(&self) -> &str {
        match self {
            CustomizeDirective::Replace { section, .. }
            | CustomizeDirective::Append { section, .. }
            | CustomizeDirective::Prepend { section, .. }
            | CustomizeDirective::Remove { section } => section,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            CustomizeDirective::Replace { text, .. }
            | CustomizeDirective::Append { text, .. }
            | CustomizeDirective::Prepend { text, .. } => Some(text),
            CustomizeDirective::Remove { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Replace,
    Append,
    Prepend,
    Remove,
}

const KEYWORDS: [(&str, Keyword); 4] = [
    ("REPLACE:", Keyword::Replace),
    ("APPEND:", Keyword::Append),
    ("PREPEND:", Keyword::Prepend),
    ("REMOVE:", Keyword::Remove),
];

impl Keyword {
    fn label(self) -> &'static str {
        match self {
            Keyword::Replace => "REPLACE",
            Keyword::Append => "APPEND",
            Keyword::Prepend => "PREPEND",
            Keyword::Remove => "REMOVE",
        }
    }
}

fn split_keyword(line: &str) -> Option<(Keyword, &str)> {
    KEYWORDS
        .iter()
        .find_map(|(prefix, keyword)| line.strip_prefix(prefix).map(|rest| (*keyword, rest)))
}

/// Parsed, ordered set of directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customization {
    directives: Vec<CustomizeDirective>,
}

impl Customization {
    pub fn parse(raw: &str) -> Result<Self, CustomizeParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let opens_with_directive = trimmed
            .lines()
            .next()
            .map(|line| split_keyword(line.trim_start()).is_some())
            .unwrap_or(false);
        if !opens_with_directive {
            return Ok(Self {
                directives: vec![CustomizeDirective::Append {
                    section: FREE_TEXT_SECTION.to_string(),
                    text: trimmed.to_string(),
                }],
            });
        }

        let mut directives: Vec<CustomizeDirective> = Vec::new();
        for (number, line) in trimmed.lines().enumerate() {
            match split_keyword(line.trim_start()) {
                Some((keyword, rest)) => directives.push(parse_directive(keyword, rest, number + 1)?),
                None => {
                    let Some(text) = directives.last_mut().and_then(CustomizeDirective::text_mut)
                    else {
                        if line.trim().is_empty() {
                            continue;
                        }
                        return Err(CustomizeParseError::TextAfterRemove { line: number + 1 });
                    };
                    text.push('\n');
                    text.push_str(line);
                }
            }
        }
        for directive in &mut directives {
            if let Some(text) = directive.text_mut() {
                let cleaned = text.trim_end().to_string();
                *text = cleaned;
            }
        }
        Ok(Self { directives })
    }

    pub fn directives(&self) -> &[CustomizeDirective] {
        &self.directives
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Apply every directive in order. Never fails: a missing target section
    /// is created for text-carrying directives and ignored for `Remove`.
    pub fn apply(&self, persona: &str) -> String {
        if self.directives.is_empty() {
            return persona.to_string();
        }
        let mut lines: Vec<String> = persona.lines().map(str::to_string).collect();
        for directive in &self.directives {
            apply_directive(&mut lines, directive);
        }
        lines.join("\n")
    }
}

fn parse_directive(
    keyword: Keyword,
    rest: &str,
    line: usize,
) -> Result<CustomizeDirective, CustomizeParseError> {
    if keyword == Keyword::Remove {
        let section = rest.trim();
        if section.is_empty() {
            return Err(CustomizeParseError::MissingSection {
                line,
                directive: keyword.label(),
            });
        }
        return Ok(CustomizeDirective::Remove {
            section: section.to_string(),
        });
    }

    let Some((section, text)) = rest.split_once(':') else {
        return Err(CustomizeParseError::MissingText {
            line,
            directive: keyword.label(),
        });
    };
    let section = section.trim();
    if section.is_empty() {
        return Err(CustomizeParseError::MissingSection {
            line,
            directive: keyword.label(),
        });
    }
    let section = section.to_string();
    let text = text.trim_start().to_string();
    Ok(match keyword {
        Keyword::Replace => CustomizeDirective::Replace { section, text },
        Keyword::Append => CustomizeDirective::Append { section, text },
        Keyword::Prepend => CustomizeDirective::Prepend { section, text },
        Keyword::Remove => CustomizeDirective::Remove { section },
    })
}

/// Heading level and title of a Markdown ATX heading line.
fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((level, rest.trim()))
}

/// Line range `(heading, end)` of the first section titled `title`; the
/// section runs until the next heading of the same or a higher level.
fn find_section(lines: &[String], title: &str) -> Option<(usize, usize)> {
    let (start, level) = lines.iter().enumerate().find_map(|(i, line)| {
        heading(line)
            .filter(|(_, text)| text.eq_ignore_ascii_case(title))
            .map(|(level, _)| (i, level))
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| matches!(heading(line), Some((next, _)) if next <= level))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());
    Some((start, end))
}

fn text_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

fn apply_directive(lines: &mut Vec<String>, directive: &CustomizeDirective) {
    let target = find_section(lines, directive.section());
    match (directive, target) {
        (CustomizeDirective::Remove { .. }, Some((start, end))) => {
            lines.drain(start..end);
        }
        (CustomizeDirective::Remove { .. }, None) => {}
        (CustomizeDirective::Replace { text, .. }, Some((start, end))) => {
            lines.splice(start + 1..end, text_lines(text));
        }
        (CustomizeDirective::Append { text, .. }, Some((_, end))) => {
            let mut insert_at = end;
            while insert_at > 0 && lines[insert_at - 1].trim().is_empty() {
                insert_at -= 1;
            }
            lines.splice(insert_at..insert_at, text_lines(text));
        }
        (CustomizeDirective::Prepend { text, .. }, Some((start, _))) => {
            lines.splice(start + 1..start + 1, text_lines(text));
        }
        (
            CustomizeDirective::Replace { section, text }
            | CustomizeDirective::Append { section, text }
            | CustomizeDirective::Prepend { section, text },
            None,
        ) => {
            if lines.last().map(|l| !l.trim().is_empty()).unwrap_or(false) {
                lines.push(String::new());
            }
            lines.push(format!("## {}", section));
            lines.extend(text_lines(text));
        }
    }
}
