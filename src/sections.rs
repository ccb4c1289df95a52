//! Splitting a Markdown document into top-level sections.

use std::collections::HashSet;

use serde::Serialize;

/// Title of the section collecting text that precedes the first heading.
pub const INTRODUCTION_TITLE: &str = "Introduction";
/// Title of the single section of a document without level-1 headings.
pub const CONTENT_TITLE: &str = "Content";

const FALLBACK_SLUG: &str = "section";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    /// Markdown of the section, including its own heading line.
    pub raw_content: String,
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub section_id: String,
    pub title: String,
}

/// Split `markdown` on `# ` heading lines.
///
/// Text before the first heading becomes an "Introduction" section when it
/// has any non-blank content. A document without level-1 headings becomes a
/// single "Content" section. Blank input yields no sections.
#[must_use]
pub fn split(markdown: &str) -> Vec<Section> {
    let text = markdown.replace("\r\n", "\n");
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut preamble: Vec<&str> = Vec::new();
    let mut drafts: Vec<(String, Vec<&str>)> = Vec::new();

    for line in text.lines() {
        if let Some(title) = heading_title(line) {
            drafts.push((title.to_owned(), vec![line]));
            continue;
        }
        match drafts.last_mut() {
            Some((_, lines)) => lines.push(line),
            None => preamble.push(line),
        }
    }

    let mut ids = IdAllocator::default();

    if drafts.is_empty() {
        return vec![Section {
            id: ids.allocate(&slug(CONTENT_TITLE)),
            title: CONTENT_TITLE.to_owned(),
            raw_content: text.trim_end().to_owned(),
        }];
    }

    let mut sections = Vec::with_capacity(drafts.len() + 1);
    if preamble.iter().any(|line| !line.trim().is_empty()) {
        sections.push(Section {
            id: ids.allocate(&slug(INTRODUCTION_TITLE)),
            title: INTRODUCTION_TITLE.to_owned(),
            raw_content: join_lines(&preamble),
        });
    }

    for (title, lines) in drafts {
        sections.push(Section {
            id: ids.allocate(&slug(&title)),
            title,
            raw_content: join_lines(&lines),
        });
    }

    sections
}

/// Navigation entries for `sections`, in document order.
#[must_use]
pub fn outline(sections: &[Section]) -> Vec<NavEntry> {
    sections
        .iter()
        .map(|section| NavEntry {
            section_id: section.id.clone(),
            title: section.title.clone(),
        })
        .collect()
}

/// Normalize a heading title into a URL-safe identifier.
///
/// Lowercases, drops everything except word characters, whitespace and
/// hyphens, turns whitespace into hyphens and collapses repeats. Applying it
/// to its own output returns the same string.
#[must_use]
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }

    if out.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        out
    }
}

fn heading_title(line: &str) -> Option<&str> {
    let title = line.strip_prefix("# ")?.trim();
    (!title.is_empty()).then_some(title)
}

fn join_lines(lines: &[&str]) -> String {
    lines.join("\n").trim_end().to_owned()
}

/// Hands out ids, suffixing repeats with `-2`, `-3`, ...
#[derive(Debug, Default)]
struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    fn allocate(&mut self, base: &str) -> String {
        if self.used.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_sections() {
        assert!(split("").is_empty());
        assert!(split(" \n\t\n").is_empty());
    }

    #[test]
    fn two_headings_make_two_sections() {
        let doc = "# Early life\nBorn in a village.\n\n# Career\nFlew to space.\n";
        let sections = split(doc);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].id, "early-life");
        assert_eq!(sections[0].title, "Early life");
        assert_eq!(sections[0].raw_content, "# Early life\nBorn in a village.");
        assert_eq!(sections[1].id, "career");
        assert_eq!(sections[1].raw_content, "# Career\nFlew to space.");
    }

    #[test]
    fn text_before_first_heading_is_introduction() {
        let sections = split("Preface text.\n\n# Part\nBody");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, INTRODUCTION_TITLE);
        assert_eq!(sections[0].id, "introduction");
        assert_eq!(sections[0].raw_content, "Preface text.");
        assert_eq!(sections[1].title, "Part");
    }

    #[test]
    fn blank_preamble_is_dropped() {
        let sections = split("\n\n# Only\nBody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Only");
    }

    #[test]
    fn document_without_level_one_heading_is_single_section() {
        let doc = "## Sub\nText\n";
        let sections = split(doc);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, CONTENT_TITLE);
        assert_eq!(sections[0].id, "content");
        assert_eq!(sections[0].raw_content, "## Sub\nText");
    }

    #[test]
    fn lower_level_headings_stay_inside_section() {
        let sections = split("# A\n## A.1\ntext\n#B not a heading\n# C");
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert!(sections[0].raw_content.contains("#B not a heading"));
    }

    #[test]
    fn repeated_titles_get_numeric_suffixes() {
        let sections = split("# Notes\na\n# Notes\nb\n# Notes\nc");
        let ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["notes", "notes-2", "notes-3"]);
    }

    #[test]
    fn suffix_skips_ids_already_taken() {
        let sections = split("# Notes 2\na\n# Notes\nb\n# Notes\nc");
        let ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["notes-2", "notes", "notes-3"]);
    }

    #[test]
    fn slug_normalizes_titles() {
        assert_eq!(slug("Early Life & Career"), "early-life-career");
        assert_eq!(slug("  Hello,   World!  "), "hello-world");
        assert_eq!(slug("a -- b"), "a-b");
        assert_eq!(slug("Детство и юность"), "детство-и-юность");
        assert_eq!(slug("?!"), "section");
    }

    #[test]
    fn slug_is_idempotent() {
        for title in [
            "Early Life & Career",
            "--Leading and trailing--",
            "snake_case Title",
            "Детство и юность",
            "...",
        ] {
            let once = slug(title);
            assert_eq!(slug(&once), once, "title: {title}");
        }
    }

    #[test]
    fn outline_lists_sections_in_order() {
        let sections = split("# One\n# Two");
        let nav = outline(&sections);
        assert_eq!(
            nav,
            vec![
                NavEntry {
                    section_id: "one".to_owned(),
                    title: "One".to_owned(),
                },
                NavEntry {
                    section_id: "two".to_owned(),
                    title: "Two".to_owned(),
                },
            ]
        );
    }
}
