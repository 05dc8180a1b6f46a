//! HTML pretty-printer for exported step descriptions.
//!
//! Puts block-level elements on their own lines with two-space indentation
//! and keeps inline markup on the line of its enclosing block. Text and
//! attributes are never rewritten, only whitespace between them.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|<[^<>]+>|[^<]+|<").expect("valid token regex"));

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</?\s*([A-Za-z][A-Za-z0-9-]*)").expect("valid tag regex"));

/// HTML whitespace only; other Unicode spaces such as U+00A0 are text.
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\n\r\x0C]+").expect("valid whitespace regex"));

const INDENT: &str = "  ";

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hr", "html", "li", "main", "nav", "ol", "p", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open { name: String, raw: &'a str, void: bool },
    Close { name: String, raw: &'a str },
    Inline(&'a str),
    Text(&'a str),
}

fn tokenize(html: &str) -> Vec<Token<'_>> {
    TOKEN
        .find_iter(html)
        .map(|m| {
            let raw = m.as_str();
            if !raw.starts_with('<') || raw == "<" {
                return Token::Text(raw);
            }
            if raw.starts_with("<!") || raw.starts_with("<?") {
                return Token::Inline(raw);
            }
            let Some(name) = TAG_NAME.captures(raw).map(|c| c[1].to_ascii_lowercase()) else {
                return Token::Text(raw);
            };
            if raw.starts_with("</") {
                Token::Close { name, raw }
            } else {
                let void = raw.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str());
                Token::Open { name, raw, void }
            }
        })
        .collect()
}

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Line-oriented output under construction.
#[derive(Default)]
struct Printer {
    lines: Vec<String>,
    /// Inline content waiting to be placed
    pending: String,
    /// Open block elements with the index of the line that opened them
    stack: Vec<(String, usize)>,
}

impl Printer {
    fn indent(&self) -> String {
        INDENT.repeat(self.stack.len())
    }

    fn push_inline(&mut self, raw: &str) {
        self.pending.push_str(raw);
    }

    fn push_text(&mut self, text: &str) {
        let collapsed = WHITESPACE.replace_all(text, " ");
        if self.pending.is_empty() {
            self.pending.push_str(collapsed.trim_start_matches(is_html_space));
        } else {
            self.pending.push_str(&collapsed);
        }
    }

    fn flush(&mut self) {
        let content = self.pending.trim_end_matches(is_html_space).to_string();
        self.pending.clear();
        if !content.is_empty() {
            let line = format!("{}{}", self.indent(), content);
            self.lines.push(line);
        }
    }

    fn open_block(&mut self, name: String, raw: &str, void: bool) {
        self.flush();
        let line = format!("{}{}", self.indent(), raw);
        self.lines.push(line);
        if !void {
            let index = self.lines.len() - 1;
            self.stack.push((name, index));
        }
    }

    fn close_block(&mut self, name: &str, raw: &str) {
        let Some(position) = self.stack.iter().rposition(|(open, _)| open == name) else {
            self.push_inline(raw);
            return;
        };

        // Unclosed children are closed implicitly by their parent.
        while self.stack.len() > position + 1 {
            self.flush();
            self.stack.pop();
        }

        let (_, open_line) = self.stack[position].clone();
        if open_line == self.lines.len() - 1 {
            // Only inline content since the opening tag: keep it on one line.
            let content = self.pending.trim_matches(is_html_space).to_string();
            self.pending.clear();
            self.stack.pop();
            let line = &mut self.lines[open_line];
            line.push_str(&content);
            line.push_str(raw);
        } else {
            self.flush();
            self.stack.pop();
            let line = format!("{}{}", self.indent(), raw);
            self.lines.push(line);
        }
    }

    fn push_verbatim(&mut self, chunk: &str) {
        self.flush();
        let line = format!("{}{}", self.indent(), chunk);
        self.lines.push(line);
    }

    fn finish(mut self) -> String {
        self.flush();
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Pretty-print an HTML fragment.
pub fn pretty(html: &str) -> String {
    let tokens = tokenize(html);
    let mut printer = Printer::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match token {
            Token::Open { name, raw, .. } if name == "pre" => {
                let mut chunk = raw.to_string();
                for inner in iter.by_ref() {
                    match inner {
                        Token::Close { name, raw } if name == "pre" => {
                            chunk.push_str(raw);
                            break;
                        }
                        Token::Open { raw, .. } | Token::Close { raw, .. } => chunk.push_str(raw),
                        Token::Inline(raw) | Token::Text(raw) => chunk.push_str(raw),
                    }
                }
                printer.push_verbatim(&chunk);
            }
            Token::Open { name, raw, void } if is_block(&name) => {
                printer.open_block(name, raw, void);
            }
            Token::Close { name, raw } if is_block(&name) => printer.close_block(&name, raw),
            Token::Open { raw, .. } | Token::Close { raw, .. } | Token::Inline(raw) => {
                printer.push_inline(raw);
            }
            Token::Text(text) => printer.push_text(text),
        }
    }

    printer.finish()
}
