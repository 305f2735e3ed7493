//! Legal-document structure heuristics.
//!
//! Assistant replies are plain text with a loose legal layout (titles,
//! recitals, numbered clauses, lettered sub-clauses). Each unit of text is
//! tested against [`RULES`] in order; the first rule that matches decides
//! the block kind and the rest are never consulted for that unit.

use once_cell::sync::Lazy;
use regex::Regex;

/// Horizontal alignment requested for a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Justify,
}

/// How a block should be drawn. Interpretation is up to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderIntent {
    pub align: Align,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub indented: bool,
}

impl RenderIntent {
    pub const TITLE: Self = Self {
        align: Align::Center,
        bold: true,
        italic: false,
        underline: true,
        indented: false,
    };
    pub const SECTION_HEADER: Self = Self {
        align: Align::Left,
        bold: true,
        italic: false,
        underline: false,
        indented: true,
    };
    pub const NUMBERED_CLAUSE: Self = Self {
        align: Align::Left,
        bold: true,
        italic: false,
        underline: false,
        indented: false,
    };
    pub const SUB_CLAUSE: Self = Self {
        align: Align::Left,
        bold: false,
        italic: true,
        underline: false,
        indented: true,
    };
    pub const EMPHASIZED: Self = Self {
        align: Align::Center,
        bold: true,
        italic: false,
        underline: false,
        indented: false,
    };
    pub const PARAGRAPH: Self = Self {
        align: Align::Justify,
        bold: false,
        italic: false,
        underline: false,
        indented: true,
    };
    pub const CENTERED_PARAGRAPH: Self = Self {
        align: Align::Center,
        ..Self::PARAGRAPH
    };
}

/// Text of a classified unit together with its rendering intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub intent: RenderIntent,
}

impl Line {
    fn new(text: impl Into<String>, intent: RenderIntent) -> Self {
        Self {
            text: text.into(),
            intent,
        }
    }
}

/// One classified unit of assistant output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayBlock {
    Title(Line),
    SectionHeader(Line),
    NumberedClause(Line),
    SubClause(Line),
    EmphasizedLine(Line),
    Paragraph(Line),
    /// A blank source line.
    Spacer,
}

/// Discriminant of a [`DisplayBlock`], handy for comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Title,
    SectionHeader,
    NumberedClause,
    SubClause,
    EmphasizedLine,
    Paragraph,
    Spacer,
}

impl DisplayBlock {
    pub fn kind(&self) -> BlockKind {
        match self {
            DisplayBlock::Title(_) => BlockKind::Title,
            DisplayBlock::SectionHeader(_) => BlockKind::SectionHeader,
            DisplayBlock::NumberedClause(_) => BlockKind::NumberedClause,
            DisplayBlock::SubClause(_) => BlockKind::SubClause,
            DisplayBlock::EmphasizedLine(_) => BlockKind::EmphasizedLine,
            DisplayBlock::Paragraph(_) => BlockKind::Paragraph,
            DisplayBlock::Spacer => BlockKind::Spacer,
        }
    }

    pub fn line(&self) -> Option<&Line> {
        match self {
            DisplayBlock::Title(line)
            | DisplayBlock::SectionHeader(line)
            | DisplayBlock::NumberedClause(line)
            | DisplayBlock::SubClause(line)
            | DisplayBlock::EmphasizedLine(line)
            | DisplayBlock::Paragraph(line) => Some(line),
            DisplayBlock::Spacer => None,
        }
    }

    /// Block text, empty for spacers.
    pub fn text(&self) -> &str {
        self.line().map(|l| l.text.as_str()).unwrap_or("")
    }

    pub fn intent(&self) -> RenderIntent {
        self.line().map(|l| l.intent).unwrap_or_default()
    }
}

/// Unit of text the classifier works on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClassifyMode {
    /// One block per source line; blank lines become [`DisplayBlock::Spacer`].
    #[default]
    Lines,
    /// One block per blank-line-delimited paragraph; separators produce nothing.
    Paragraphs,
}

/// Keywords that mark an upper-case line as a document title.
const TITLE_KEYWORDS: &[&str] = &["AGREEMENT", "CONTRACT", "PETITION", "RECITALS", "SEPARATION"];

/// Boilerplate openers that start a recital/operative section.
const SECTION_OPENERS: &[&str] = &["WHEREAS", "NOW THEREFORE", "IT IS AGREED"];

const CENTERED_PARAGRAPH_KEYWORDS: &[&str] = &["AGREEMENT", "RECITALS"];

/// Lines shorter than this that are fully upper case are emphasized.
const SHORT_LINE_CHARS: usize = 50;

static NUMBERED_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.").expect("numbered clause regex is valid"));
static SUB_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-z]\)|\([a-z]\))").expect("sub-clause regex is valid"));
static PARAGRAPH_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph break regex is valid"));

struct Rule {
    matches: fn(&str) -> bool,
    build: fn(&str) -> DisplayBlock,
}

/// Classification rules, highest priority first.
const RULES: &[Rule] = &[
    Rule {
        matches: is_markdown_header,
        build: build_markdown_header,
    },
    Rule {
        matches: is_instrument_title,
        build: |s| DisplayBlock::Title(Line::new(s, RenderIntent::TITLE)),
    },
    Rule {
        matches: is_boilerplate_opener,
        build: |s| DisplayBlock::SectionHeader(Line::new(s, RenderIntent::SECTION_HEADER)),
    },
    Rule {
        matches: |s| NUMBERED_CLAUSE_RE.is_match(s),
        build: |s| DisplayBlock::NumberedClause(Line::new(s, RenderIntent::NUMBERED_CLAUSE)),
    },
    Rule {
        matches: |s| SUB_CLAUSE_RE.is_match(s),
        build: |s| DisplayBlock::SubClause(Line::new(s, RenderIntent::SUB_CLAUSE)),
    },
    Rule {
        matches: is_quoted_or_short_caps,
        build: |s| DisplayBlock::EmphasizedLine(Line::new(s, RenderIntent::EMPHASIZED)),
    },
    Rule {
        matches: is_bold_wrapped,
        build: |s| DisplayBlock::EmphasizedLine(Line::new(s, RenderIntent::EMPHASIZED)),
    },
];

/// Classify assistant text line by line.
pub fn classify(text: &str) -> Vec<DisplayBlock> {
    classify_with(text, ClassifyMode::Lines)
}

/// Classify assistant text using the given unit of work.
pub fn classify_with(text: &str, mode: ClassifyMode) -> Vec<DisplayBlock> {
    match mode {
        ClassifyMode::Lines => text.lines().map(classify_unit).collect(),
        ClassifyMode::Paragraphs => {
            let normalized = text.replace("\r\n", "\n");
            PARAGRAPH_BREAK_RE
                .split(&normalized)
                .filter(|p| !p.trim().is_empty())
                .map(classify_unit)
                .collect()
        }
    }
}

/// Classify a single unit of text. Blank input yields a spacer.
pub fn classify_unit(unit: &str) -> DisplayBlock {
    let trimmed = unit.trim();
    if trimmed.is_empty() {
        return DisplayBlock::Spacer;
    }
    RULES
        .iter()
        .find(|rule| (rule.matches)(trimmed))
        .map(|rule| (rule.build)(trimmed))
        .unwrap_or_else(|| build_paragraph(trimmed))
}

fn is_markdown_header(s: &str) -> bool {
    s.starts_with('#')
}

fn build_markdown_header(s: &str) -> DisplayBlock {
    let level = s.chars().take_while(|&c| c == '#').count();
    let text = s[level..].trim();
    if level >= 3 {
        DisplayBlock::SectionHeader(Line::new(text, RenderIntent::SECTION_HEADER))
    } else {
        DisplayBlock::Title(Line::new(text, RenderIntent::TITLE))
    }
}

/// Upper case with at least one letter; punctuation-only lines don't count.
fn is_upper_case(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && s == s.to_uppercase()
}

fn is_instrument_title(s: &str) -> bool {
    is_upper_case(s) && TITLE_KEYWORDS.iter().any(|k| s.contains(k))
}

fn is_boilerplate_opener(s: &str) -> bool {
    SECTION_OPENERS.iter().any(|o| s.starts_with(o)) || s.contains("WITNESSETH")
}

fn is_quoted_or_short_caps(s: &str) -> bool {
    s.contains(['"', '\u{201C}', '\u{201D}'])
        || (s.chars().count() < SHORT_LINE_CHARS && is_upper_case(s))
}

fn is_bold_wrapped(s: &str) -> bool {
    s.len() >= 4 && s.starts_with("**") && s.ends_with("**")
}

fn build_paragraph(s: &str) -> DisplayBlock {
    let intent = if CENTERED_PARAGRAPH_KEYWORDS.iter().any(|k| s.contains(k)) {
        RenderIntent::CENTERED_PARAGRAPH
    } else {
        RenderIntent::PARAGRAPH
    };
    DisplayBlock::Paragraph(Line::new(s, intent))
}
