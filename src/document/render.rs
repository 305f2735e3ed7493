//! Plain-terminal rendering of classified blocks.

use super::classify::{Align, DisplayBlock, RenderIntent};
use super::inline::{inline_spans, InlineSpan};

const INDENT: &str = "    ";

const BOLD: &str = "\x1b[1m";
const NORMAL_INTENSITY: &str = "\x1b[22m";
const ITALIC: &str = "\x1b[3m";
const UNDERLINE: &str = "\x1b[4m";
const RESET: &str = "\x1b[0m";

/// Terminal rendering options.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Target column width.
    pub width: usize,
    /// Emit ANSI escape sequences for bold/italic/underline.
    pub ansi: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 80,
            ansi: true,
        }
    }
}

/// Render blocks as terminal text, one or more output lines per block.
pub fn render_plain(blocks: &[DisplayBlock], options: RenderOptions) -> String {
    let mut out: Vec<String> = Vec::new();
    for block in blocks {
        let Some(line) = block.line() else {
            out.push(String::new());
            continue;
        };
        let intent = line.intent;
        let indent = if intent.indented { INDENT } else { "" };
        let avail = options.width.saturating_sub(indent.len()).max(1);

        for spans in wrap_spans(&line.text, avail) {
            let visible_len: usize = spans.iter().map(|s| s.text.chars().count()).sum();
            let pad = match intent.align {
                Align::Center => " ".repeat(avail.saturating_sub(visible_len) / 2),
                Align::Left | Align::Justify => String::new(),
            };
            let styled = if options.ansi {
                style_line(&spans, intent)
            } else {
                spans.iter().map(|s| s.text.as_str()).collect()
            };
            out.push(format!("{}{}{}", indent, pad, styled));
        }
    }
    out.join("\n")
}

/// A visible character and whether it sits inside a `**` run.
type StyledChar = (char, bool);

/// Word-wrap text after resolving its emphasis markers.
///
/// Markers are parsed once for the whole text so a bold run that spans
/// several output lines stays bold on each of them. Wrapping follows
/// `wrap_words`: greedy, long words split, newlines start a new line.
fn wrap_spans(text: &str, width: usize) -> Vec<Vec<InlineSpan>> {
    let width = width.max(1);
    let chars: Vec<StyledChar> = inline_spans(text)
        .into_iter()
        .flat_map(|span| {
            let emphasized = span.emphasized;
            span.text.chars().map(move |c| (c, emphasized)).collect::<Vec<_>>()
        })
        .collect();

    let body = match chars.last() {
        Some(&('\n', _)) => &chars[..chars.len() - 1],
        _ => &chars[..],
    };

    let mut lines: Vec<Vec<StyledChar>> = Vec::new();
    for source in body.split(|&(c, _)| c == '\n') {
        let mut current: Vec<StyledChar> = Vec::new();

        for word in source.split(|&(c, _)| c.is_whitespace()).filter(|w| !w.is_empty()) {
            let mut word = word.to_vec();

            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(width);
                lines.push(word);
                word = rest;
            }

            if !current.is_empty() && current.len() + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if let Some(&(_, prev_emphasized)) = current.last() {
                // The gap inside a bold run is part of the run
                let joined = prev_emphasized && word.first().is_some_and(|&(_, e)| e);
                current.push((' ', joined));
            }
            current.extend(word);
        }

        if !current.is_empty() || source.iter().all(|&(c, _)| c.is_whitespace()) {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(Vec::new());
    }
    lines.into_iter().map(|line| group_spans(&line)).collect()
}

fn group_spans(chars: &[StyledChar]) -> Vec<InlineSpan> {
    let mut spans: Vec<InlineSpan> = Vec::new();
    for &(c, emphasized) in chars {
        match spans.last_mut() {
            Some(prev) if prev.emphasized == emphasized => prev.text.push(c),
            _ => spans.push(InlineSpan {
                text: c.to_string(),
                emphasized,
            }),
        }
    }
    spans
}

fn style_line(spans: &[InlineSpan], intent: RenderIntent) -> String {
    let mut prefix = String::new();
    if intent.bold {
        prefix.push_str(BOLD);
    }
    if intent.italic {
        prefix.push_str(ITALIC);
    }
    if intent.underline {
        prefix.push_str(UNDERLINE);
    }

    let mut body = String::new();
    for span in spans {
        // Inline emphasis is redundant inside an already bold line
        if span.emphasized && !intent.bold {
            body.push_str(BOLD);
            body.push_str(&span.text);
            body.push_str(NORMAL_INTENSITY);
        } else {
            body.push_str(&span.text);
        }
    }

    if prefix.is_empty() {
        body
    } else {
        format!("{}{}{}", prefix, body, RESET)
    }
}
