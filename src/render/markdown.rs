//! Markdown parsing via `pulldown-cmark`.
//!
//! Front matter is TOML between `+++` lines at the top of the file:
//!
//! ```text
//! +++
//! title = "Getting started"
//! template = "guide.html"
//! +++
//!
//! # Getting started
//! ```

use super::{ContentParser, JsonMap, ParsedDocument, TocEntry};
use anyhow::{Context, Result};
use pulldown_cmark::{CowStr, Event, HeadingLevel, MetadataBlockKind, Options, Parser, Tag, TagEnd};
use rustc_hash::FxHashMap;

/// Markdown with tables, footnotes, strikethrough, task lists and heading ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl MarkdownParser {
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_PLUSES_DELIMITED_METADATA_BLOCKS
    }
}

impl ContentParser for MarkdownParser {
    fn parse(&self, raw: &str) -> Result<ParsedDocument> {
        let mut front_matter = JsonMap::new();
        let mut metadata: Option<String> = None;
        let mut events: Vec<Event<'_>> = Vec::new();

        for event in Parser::new_ext(raw, Self::options()) {
            match event {
                Event::Start(Tag::MetadataBlock(MetadataBlockKind::PlusesStyle)) => {
                    metadata = Some(String::new());
                }
                Event::End(TagEnd::MetadataBlock(_)) => {
                    if let Some(text) = metadata.take() {
                        front_matter = toml::from_str(&text).context("invalid front matter")?;
                    }
                }
                Event::Text(text) if metadata.is_some() => {
                    if let Some(buf) = metadata.as_mut() {
                        buf.push_str(&text);
                    }
                }
                event => events.push(event),
            }
        }

        let toc = assign_heading_ids(&mut events);

        let mut html = String::with_capacity(raw.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());

        let title = front_matter
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| toc.iter().find(|e| e.level == 1).map(|e| e.text.clone()));

        Ok(ParsedDocument {
            html,
            front_matter,
            toc,
            title,
        })
    }
}

/// Give every heading an id and collect the table of contents.
///
/// Explicit `{#id}` attributes are kept; other ids are slugs of the heading
/// text, suffixed on collision.
fn assign_heading_ids(events: &mut [Event<'_>]) -> Vec<TocEntry> {
    let mut toc = Vec::new();
    let mut used: FxHashMap<String, usize> = FxHashMap::default();

    let mut i = 0;
    while i < events.len() {
        let Event::Start(Tag::Heading { level, id, .. }) = &events[i] else {
            i += 1;
            continue;
        };
        let level = heading_level(*level);
        let explicit = id.as_ref().map(|id| id.to_string());

        let mut text = String::new();
        let mut end = i + 1;
        while end < events.len() && !matches!(events[end], Event::End(TagEnd::Heading(_))) {
            if let Event::Text(t) | Event::Code(t) = &events[end] {
                text.push_str(t);
            }
            end += 1;
        }

        let base = explicit.unwrap_or_else(|| slugify(&text));
        let count = used.entry(base.clone()).or_insert(0);
        let unique = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(unique.clone()));
        }
        toc.push(TocEntry {
            level,
            id: unique,
            text: text.trim().to_string(),
        });
        i = end + 1;
    }
    toc
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// ASCII slug: transliterated, lowercase, `-` separated.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "section".to_string()
    } else {
        trimmed.to_string()
    }
}
