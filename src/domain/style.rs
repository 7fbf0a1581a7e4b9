//! Resolved visual styles for token categories.
//!
//! Theme discovery and scope cascading live outside this crate. They reach
//! the core through [`StyleResolver`], which hands back one optional-field
//! [`TokenStyle`] per category. Absent fields mean "inherit".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::category::Category;

/// Font attributes parsed from a space separated list such as `"bold italic"`.
///
/// Deserialization skips unknown words with a warning; [`str::parse`]
/// rejects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl FontStyle {
    fn set(&mut self, word: &str) -> bool {
        match word {
            "bold" => self.bold = true,
            "italic" => self.italic = true,
            "underline" => self.underline = true,
            _ => return false,
        }
        true
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut style = FontStyle::default();
        for word in value.split_whitespace() {
            if !style.set(word) {
                return Err(format!("unknown font style: {word}"));
            }
        }
        Ok(style)
    }
}

impl From<String> for FontStyle {
    fn from(value: String) -> Self {
        let mut style = FontStyle::default();
        for word in value.split_whitespace() {
            if !style.set(word) {
                log::warn!(target: "irodori::config", "Ignoring unknown font style: {}", word);
            }
        }
        style
    }
}

impl From<FontStyle> for String {
    fn from(style: FontStyle) -> Self {
        style.to_string()
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = [
            (self.bold, "bold"),
            (self.italic, "italic"),
            (self.underline, "underline"),
        ]
        .into_iter()
        .filter_map(|(set, word)| set.then_some(word))
        .collect();
        f.write_str(&words.join(" "))
    }
}

/// Style for one category. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenStyle {
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub font_style: Option<FontStyle>,
}

impl TokenStyle {
    /// True when the style overrides nothing.
    pub fn is_unstyled(&self) -> bool {
        self.foreground.is_none() && self.background.is_none() && self.font_style.is_none()
    }
}

/// Source of per-category styles.
///
/// `None` means the category has no style of its own and is painted
/// unstyled.
pub trait StyleResolver: Send + Sync {
    fn resolve(&self, category: Category) -> Option<TokenStyle>;
}

/// One independently owned style per category, indexed by ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    styles: Vec<TokenStyle>,
}

impl StyleTable {
    /// Table where every category carries a copy of `default`.
    pub fn uniform(default: &TokenStyle) -> Self {
        Self {
            styles: Category::ALL.iter().map(|_| default.clone()).collect(),
        }
    }

    /// Resolve every category, falling back to an unstyled entry.
    pub fn build(resolver: &dyn StyleResolver) -> Self {
        let mut table = Self::uniform(&TokenStyle::default());
        for category in Category::ALL {
            if let Some(style) = resolver.resolve(category) {
                table.styles[category.ordinal()] = style;
            }
        }
        table
    }

    pub fn get(&self, category: Category) -> &TokenStyle {
        &self.styles[category.ordinal()]
    }

    pub fn set(&mut self, category: Category, style: TokenStyle) {
        self.styles[category.ordinal()] = style;
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::uniform(&TokenStyle::default())
    }
}
