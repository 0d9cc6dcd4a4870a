//! Documents and the parsing seam.
//!
//! The indexer only needs an ordered token sequence per document. Anything
//! that can produce one implements [`DocumentParser`]. [`TextParser`] covers
//! plain text, [`HtmlParser`] the visible text of HTML pages, and
//! [`FormatParser`] picks between them per document.

use crate::error::{IndexError, Result};
use crate::index::types::DocId;
use crate::utils::{case_fold, tokenize_whitespace};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// A document reduced to its tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub doc_id: DocId,
    pub name: String,
    pub tokens: Vec<String>,
}

impl ParsedDocument {
    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    /// Representation kept in the direct index
    pub fn to_stored(&self) -> StoredDocument {
        StoredDocument {
            doc_id: self.doc_id,
            name: self.name.clone(),
            num_tokens: self.tokens.len(),
            tokens: self.tokens.clone(),
        }
    }
}

/// One line of the direct index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub doc_id: DocId,
    pub name: String,
    pub num_tokens: usize,
    pub tokens: Vec<String>,
}

/// Reduces raw document bytes to an ordered token sequence
pub trait DocumentParser: Send + Sync {
    fn parse(&self, doc_id: DocId, name: &str, content: &[u8]) -> ParsedDocument;
}

/// Whitespace tokenizer with optional case folding.
/// Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Clone, Copy)]
pub struct TextParser {
    pub case_fold: bool,
}

impl Default for TextParser {
    fn default() -> Self {
        Self { case_fold: true }
    }
}

impl TextParser {
    fn tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = tokenize_whitespace(text);
        if self.case_fold {
            case_fold(&mut tokens);
        }
        tokens
    }
}

impl DocumentParser for TextParser {
    fn parse(&self, doc_id: DocId, name: &str, content: &[u8]) -> ParsedDocument {
        let text = String::from_utf8_lossy(content);
        ParsedDocument {
            doc_id,
            name: name.to_string(),
            tokens: self.tokens(&text),
        }
    }
}

/// Elements whose content is never shown, and comments
const HIDDEN_PATTERN: &str = concat!(
    r"(?is)<script\b.*?</script\s*>",
    r"|<style\b.*?</style\s*>",
    r"|<noscript\b.*?</noscript\s*>",
    r"|<!--.*?-->",
);
const TAG_PATTERN: &str = r"(?s)<[^>]*>";
const ENTITY_PATTERN: &str = r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);";

/// Tokens of the visible text of an HTML page.
///
/// Scripts, styles and comments are dropped, every tag becomes a word
/// break, and character references are decoded before tokenizing.
#[derive(Debug, Clone)]
pub struct HtmlParser {
    text: TextParser,
    hidden: Regex,
    tags: Regex,
    entities: Regex,
}

impl HtmlParser {
    pub fn new(case_fold: bool) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| IndexError::Config(format!("HTML pattern: {}", e)))
        };
        Ok(Self {
            text: TextParser { case_fold },
            hidden: compile(HIDDEN_PATTERN)?,
            tags: compile(TAG_PATTERN)?,
            entities: compile(ENTITY_PATTERN)?,
        })
    }

    /// The text a browser would render, with tags replaced by spaces
    pub fn visible_text(&self, html: &str) -> String {
        let shown = self.hidden.replace_all(html, " ");
        let text = self.tags.replace_all(&shown, " ");
        self.entities
            .replace_all(&text, |caps: &Captures| decode_entity(&caps[0], &caps[1]))
            .into_owned()
    }
}

fn decode_entity(whole: &str, name: &str) -> String {
    let numeric = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        None
    };
    if let Some(code) = numeric {
        return char::from_u32(code).map_or_else(|| whole.to_string(), String::from);
    }

    match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        _ => whole,
    }
    .to_string()
}

impl DocumentParser for HtmlParser {
    fn parse(&self, doc_id: DocId, name: &str, content: &[u8]) -> ParsedDocument {
        let html = String::from_utf8_lossy(content);
        ParsedDocument {
            doc_id,
            name: name.to_string(),
            tokens: self.text.tokens(&self.visible_text(&html)),
        }
    }
}

/// How corpus documents are parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Text,
    Html,
    /// HTML for `.html` and `.htm` names, plain text for the rest
    #[default]
    Auto,
}

impl DocumentFormat {
    fn is_html(self, name: &str) -> bool {
        match self {
            DocumentFormat::Text => false,
            DocumentFormat::Html => true,
            DocumentFormat::Auto => {
                let lower = name.to_ascii_lowercase();
                lower.ends_with(".html") || lower.ends_with(".htm")
            }
        }
    }
}

/// Parser used by builds: text or HTML according to a [`DocumentFormat`]
#[derive(Debug, Clone)]
pub struct FormatParser {
    format: DocumentFormat,
    text: TextParser,
    html: HtmlParser,
}

impl FormatParser {
    pub fn new(format: DocumentFormat, case_fold: bool) -> Result<Self> {
        Ok(Self {
            format,
            text: TextParser { case_fold },
            html: HtmlParser::new(case_fold)?,
        })
    }
}

impl DocumentParser for FormatParser {
    fn parse(&self, doc_id: DocId, name: &str, content: &[u8]) -> ParsedDocument {
        if self.format.is_html(name) {
            self.html.parse(doc_id, name, content)
        } else {
            self.text.parse(doc_id, name, content)
        }
    }
}
