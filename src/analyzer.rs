use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static PLAIN_TEXT: Lazy<TextAnalyzer> = Lazy::new(TextAnalyzer::plain_text);

/// One step of the plain-text pipeline. Takes the text produced by the previous
/// step and returns its rewrite.
pub trait CharacterFilter: Send + Sync {
    fn filter(&self, text: String) -> String;
}

/// Replaces every `<...>` run with a single space. Unterminated `<` is left as is.
#[derive(Debug, Default)]
pub struct HTMLTagFilter;

impl CharacterFilter for HTMLTagFilter {
    fn filter(&self, text: String) -> String {
        TAG_RE.replace_all(&text, " ").into_owned()
    }
}

/// Collapses whitespace runs to one space and trims both ends.
#[derive(Debug, Default)]
pub struct WhiteSpaceCollapseFilter;

impl CharacterFilter for WhiteSpaceCollapseFilter {
    fn filter(&self, text: String) -> String {
        WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
    }
}

/// Pure text cleaning pipeline - no async, no I/O, just text transformations
pub struct TextAnalyzer {
    char_filters: Vec<Box<dyn CharacterFilter>>,
}

impl TextAnalyzer {
    pub fn new(char_filters: Vec<Box<dyn CharacterFilter>>) -> Self {
        Self { char_filters }
    }

    /// Tags stripped, whitespace collapsed.
    pub fn plain_text() -> Self {
        Self::new(vec![
            Box::new(HTMLTagFilter),
            Box::new(WhiteSpaceCollapseFilter),
        ])
    }

    pub fn analyze(&self, text: String) -> String {
        self.char_filters
            .iter()
            .fold(text, |acc, filter| filter.filter(acc))
    }
}

/// Runs `html` through the shared plain-text pipeline.
pub fn plain_text(html: &str) -> String {
    PLAIN_TEXT.analyze(html.to_string())
}

/// Per-character lower-casing that keeps a one-to-one char mapping, so char
/// offsets found in the folded string are valid in the original.
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}
