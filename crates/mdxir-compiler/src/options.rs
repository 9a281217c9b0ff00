//! Compile options, loadable from TOML.

use chrono::{DateTime, Utc};
use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Document slug. Falls back to a `slug` string in frontmatter.
    pub slug: Option<String>,
    /// Compile timestamp; the current time when absent.
    pub compiled_at: Option<DateTime<Utc>>,
    /// Parse content expressions at compile time and fail on syntax
    /// errors instead of at render time.
    pub check_expressions: bool,
    pub markdown: MarkdownOptions,
}

/// Markdown extensions passed to pulldown-cmark.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub footnotes: bool,
    pub smart_punctuation: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: false,
            smart_punctuation: false,
        }
    }
}

impl CompileOptions {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_compiled_at(mut self, compiled_at: DateTime<Utc>) -> Self {
        self.compiled_at = Some(compiled_at);
        self
    }
}

impl MarkdownOptions {
    pub(crate) fn to_cmark(&self) -> Options {
        let mut options = Options::empty();
        for (enabled, flag) in [
            (self.tables, Options::ENABLE_TABLES),
            (self.strikethrough, Options::ENABLE_STRIKETHROUGH),
            (self.tasklists, Options::ENABLE_TASKLISTS),
            (self.footnotes, Options::ENABLE_FOOTNOTES),
            (self.smart_punctuation, Options::ENABLE_SMART_PUNCTUATION),
        ] {
            if enabled {
                options.insert(flag);
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_toml() {
        let options = CompileOptions::from_toml("").unwrap();
        assert_eq!(options, CompileOptions::default());
        assert!(options.markdown.tables);
        assert!(!options.markdown.footnotes);
    }

    #[test]
    fn full_toml() {
        let options = CompileOptions::from_toml(
            r#"
            slug = "intro"
            compiled_at = "2024-05-01T12:00:00Z"
            check_expressions = true

            [markdown]
            footnotes = true
            tables = false
            "#,
        )
        .unwrap();
        assert_eq!(options.slug.as_deref(), Some("intro"));
        assert!(options.check_expressions);
        assert!(options.markdown.footnotes && !options.markdown.tables);
        assert!(options.markdown.strikethrough);
        let flags = options.markdown.to_cmark();
        assert!(flags.contains(Options::ENABLE_FOOTNOTES));
        assert!(!flags.contains(Options::ENABLE_TABLES));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CompileOptions::from_toml("slugg = \"x\"").is_err());
    }
}
