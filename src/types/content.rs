//! Generated content - the structured draft an AI call produces.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::PipelineError;
use crate::types::page::SitemapPage;

/// One question/answer pair in a draft's FAQ section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqEntry {
    #[serde(default)]
    pub question: String,

    #[serde(default)]
    pub answer: String,
}

/// A structured article draft as returned by a generation call.
///
/// Every field is optional on the wire: model output routinely drops
/// keys, and deserialization must not fail for that. Run the parsed
/// value through [`GeneratedContent::normalized`] before using it so
/// that downstream stages see usable defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub slug: String,

    /// Article body as HTML
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub meta_description: String,

    #[serde(default)]
    pub primary_keyword: String,

    #[serde(default)]
    pub semantic_keywords: Vec<String>,

    #[serde(default)]
    pub key_takeaways: Vec<String>,

    #[serde(default)]
    pub outline: Vec<String>,

    #[serde(default)]
    pub faq_section: Vec<FaqEntry>,

    #[serde(default)]
    pub references: Vec<String>,

    /// Structured-data block (JSON-LD), passed through verbatim
    #[serde(default)]
    pub json_ld_schema: serde_json::Value,
}

impl GeneratedContent {
    /// Fill in defaults for any field the model left empty.
    ///
    /// `item_title` is the title of the work item being drafted; it
    /// seeds the title, slug, keyword, and meta description fallbacks.
    pub fn normalized(mut self, item_title: &str) -> Self {
        if self.title.trim().is_empty() {
            self.title = item_title.to_string();
        }
        if self.slug.trim().is_empty() {
            self.slug = slugify(&self.title);
        }
        if self.meta_description.trim().is_empty() {
            self.meta_description = format!("Guide on {}.", self.title);
        }
        if self.primary_keyword.trim().is_empty() {
            self.primary_keyword = self.title.to_lowercase();
        }
        self
    }

    /// Word count of the body with HTML tags stripped.
    pub fn body_word_count(&self) -> usize {
        strip_tags(&self.content).split_whitespace().count()
    }
}

/// Turn a title into a URL-safe slug.
///
/// Lowercases, replaces runs of non-alphanumerics with single hyphens,
/// and trims leading/trailing hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = true;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

fn strip_tags(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    tag.replace_all(html, " ").into_owned()
}

/// Check the body's word count against the configured bounds.
///
/// Counts words after stripping HTML tags. Returns the count when it
/// falls inside `[min_words, max_words]`, otherwise a
/// [`PipelineError::ContentTooShort`] or [`PipelineError::ContentTooLong`]
/// carrying both the count and the offending content so callers can
/// feed it back into a retry prompt.
pub fn enforce_word_count(
    content: &str,
    min_words: usize,
    max_words: usize,
) -> Result<usize, PipelineError> {
    let word_count = strip_tags(content).split_whitespace().count();

    if word_count < min_words {
        return Err(PipelineError::ContentTooShort {
            word_count,
            content: content.to_string(),
        });
    }
    if word_count > max_words {
        return Err(PipelineError::ContentTooLong {
            word_count,
            content: content.to_string(),
        });
    }

    Ok(word_count)
}

/// Resolve `[LINK_CANDIDATE: keyword]` markers against a page inventory.
///
/// A marker whose keyword appears (case-insensitively) in some page's
/// title becomes an anchor to that page; markers with no match are
/// unwrapped to their keyword text. Each page is linked at most once
/// per document so a draft does not end up with duplicate anchors.
pub fn process_internal_links(content: &str, pages: &[SitemapPage]) -> String {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let marker = MARKER.get_or_init(|| Regex::new(r"\[LINK_CANDIDATE:\s*([^\]]+)\]").unwrap());

    let mut used: Vec<&str> = Vec::new();

    marker
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let keyword = caps[1].trim().to_string();
            let needle = keyword.to_lowercase();

            let target = pages.iter().find(|p| {
                !used.contains(&p.url.as_str()) && p.title.to_lowercase().contains(&needle)
            });

            match target {
                Some(page) => {
                    used.push(page.url.as_str());
                    format!("<a href=\"{}\">{}</a>", page.url, keyword)
                }
                None => keyword,
            }
        })
        .into_owned()
}
