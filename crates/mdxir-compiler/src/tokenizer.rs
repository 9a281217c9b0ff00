//! MDX tokenizer.
//!
//! Splits source into frontmatter, `import`/`export` lines, tags, `{...}`
//! expressions and runs of markdown. Anything that does not scan as a tag or
//! an expression stays markdown, so stray `<` and `{` are harmless. Code
//! spans and fenced code blocks are passed through untouched.

use crate::content::{AttrValue, Attribute};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Frontmatter(String),
    /// An `import` or `export` statement.
    Module(String),
    OpenTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        offset: usize,
    },
    CloseTag {
        name: String,
        offset: usize,
    },
    Expression {
        source: String,
        offset: usize,
    },
    Markdown(String),
}

/// Tokenize a whole document.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut body = input;
    if let Some((frontmatter, rest)) = scan_frontmatter(input) {
        tokens.push(Token::Frontmatter(frontmatter.to_string()));
        body = rest;
    }
    let base = input.len() - body.len();
    Scanner::new(body, base, true).run(&mut tokens);
    tokens
}

/// Tokenize markup embedded in an expression, e.g. a prop value
/// `{<b>bold</b>}`. Offsets are reported relative to `base`.
pub fn tokenize_fragment(input: &str, base: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    Scanner::new(input, base, false).run(&mut tokens);
    tokens
}

struct Scanner<'s> {
    input: &'s str,
    rest: &'s str,
    base: usize,
    /// Recognize `import`/`export` at line starts.
    modules: bool,
    markdown: String,
}

impl<'s> Scanner<'s> {
    fn new(input: &'s str, base: usize, modules: bool) -> Self {
        Self {
            input,
            rest: input,
            base,
            modules,
            markdown: String::new(),
        }
    }

    fn offset(&self) -> usize {
        self.base + self.input.len() - self.rest.len()
    }

    fn at_line_start(&self) -> bool {
        let consumed = self.input.len() - self.rest.len();
        consumed == 0 || self.input[..consumed].ends_with('\n')
    }

    fn flush(&mut self, tokens: &mut Vec<Token>) {
        if !self.markdown.is_empty() {
            tokens.push(Token::Markdown(std::mem::take(&mut self.markdown)));
        }
    }

    /// Move `len` bytes of input into the markdown buffer.
    fn take_markdown(&mut self, len: usize) {
        self.markdown.push_str(&self.rest[..len]);
        self.rest = &self.rest[len..];
    }

    fn run(mut self, tokens: &mut Vec<Token>) {
        while let Some(c) = self.rest.chars().next() {
            if self.at_line_start() {
                if self.modules {
                    if let Some(len) = module_statement(self.rest) {
                        self.flush(tokens);
                        tokens.push(Token::Module(self.rest[..len].trim_end().to_string()));
                        self.rest = &self.rest[len..];
                        continue;
                    }
                }
                if let Some(len) = fenced_code(self.rest) {
                    self.take_markdown(len);
                    continue;
                }
            }

            match c {
                '\\' => {
                    let len = 1 + self.rest[1..].chars().next().map_or(0, char::len_utf8);
                    self.take_markdown(len);
                }
                '`' => {
                    let len = code_span(self.rest);
                    self.take_markdown(len);
                }
                '<' if self.rest.starts_with("<!--") => {
                    // HTML comments are dropped
                    let end = self.rest.find("-->").map_or(self.rest.len(), |i| i + 3);
                    self.rest = &self.rest[end..];
                }
                '<' => match scan_tag(self.rest, self.offset()) {
                    Some((token, after)) => {
                        self.flush(tokens);
                        tokens.push(token);
                        self.rest = after;
                    }
                    None => self.take_markdown(1),
                },
                '{' => match scan_braced(self.rest) {
                    Some((source, after)) => {
                        self.flush(tokens);
                        tokens.push(Token::Expression {
                            source: source.to_string(),
                            offset: self.offset() + 1,
                        });
                        self.rest = after;
                    }
                    None => self.take_markdown(1),
                },
                _ => self.take_markdown(c.len_utf8()),
            }
        }
        self.flush(tokens);
    }
}

// ── Frontmatter & module lines ────────────────────────────────────────────────

fn scan_frontmatter(s: &str) -> Option<(&str, &str)> {
    let after_open = s
        .strip_prefix("---\n")
        .or_else(|| s.strip_prefix("---\r\n"))?;
    let mut pos = 0;
    while let Some(idx) = after_open[pos..].find("---") {
        let abs = pos + idx;
        if abs == 0 || after_open.as_bytes()[abs - 1] == b'\n' {
            let content = after_open[..abs].trim_end();
            let rest = &after_open[abs + 3..];
            let rest = rest.find('\n').map_or("", |i| &rest[i + 1..]);
            return Some((content, rest));
        }
        pos = abs + 3;
    }
    None
}

/// Length of an `import`/`export` statement at the start of `s`, including
/// its line terminator. Braces may span lines.
fn module_statement(s: &str) -> Option<usize> {
    let after = s.strip_prefix("import ").or_else(|| s.strip_prefix("export "))?;
    let first = after.chars().next()?;
    if !(first.is_alphabetic() || matches!(first, '{' | '*' | '"' | '\'')) {
        return None;
    }

    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' | b'(' => depth += 1,
                b'}' | b')' => depth -= 1,
                b'\n' if depth <= 0 => return Some(i + 1),
                _ => {}
            },
        }
        i += 1;
    }
    Some(s.len())
}

// ── Code ──────────────────────────────────────────────────────────────────────

/// Length of a fenced code block starting at a line start, through its
/// closing fence (or the end of input).
fn fenced_code(s: &str) -> Option<usize> {
    let indent = s.len() - s.trim_start_matches([' ', '\t']).len();
    let line = &s[indent..];
    let fence_char = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let fence_len = line.chars().take_while(|c| *c == fence_char).count();
    if fence_len < 3 {
        return None;
    }

    let mut pos = s.find('\n').map_or(s.len(), |i| i + 1);
    while pos < s.len() {
        let end = s[pos..].find('\n').map_or(s.len(), |i| pos + i + 1);
        let candidate = s[pos..end].trim();
        if candidate.len() >= fence_len && candidate.chars().all(|c| c == fence_char) {
            return Some(end);
        }
        pos = end;
    }
    Some(s.len())
}

/// Length of an inline code span, or of the backtick run alone when it is
/// never closed.
fn code_span(s: &str) -> usize {
    let run = s.bytes().take_while(|b| *b == b'`').count();
    let mut pos = run;
    while let Some(idx) = s[pos..].find('`') {
        let start = pos + idx;
        let len = s[start..].bytes().take_while(|b| *b == b'`').count();
        if len == run {
            return start + len;
        }
        pos = start + len;
    }
    run
}

// ── Tags ──────────────────────────────────────────────────────────────────────

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-')
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Scan a tag starting with `<`: `<Tag ...>`, `<Tag ... />`, `</Tag>` and the
/// fragment forms `<>` / `</>`. Tag names start with an ASCII letter, so
/// `<!-- -->`, `<3` and `a < b` never match. `offset` is the absolute
/// position of `s`.
pub(crate) fn scan_tag(s: &str, offset: usize) -> Option<(Token, &str)> {
    let bytes = s.as_bytes();
    let mut pos = 1;
    let closing = bytes.get(pos) == Some(&b'/');
    if closing {
        pos += 1;
    }

    let name_start = pos;
    if bytes.get(pos).is_some_and(u8::is_ascii_alphabetic) {
        while pos < bytes.len() && is_name_byte(bytes[pos]) {
            pos += 1;
        }
    } else if bytes.get(pos) != Some(&b'>') {
        return None;
    }
    let name = s[name_start..pos].to_string();

    if closing {
        pos = skip_whitespace(bytes, pos);
        return (bytes.get(pos) == Some(&b'>'))
            .then(|| (Token::CloseTag { name, offset }, &s[pos + 1..]));
    }

    let mut attributes = Vec::new();
    loop {
        pos = skip_whitespace(bytes, pos);
        match bytes.get(pos)? {
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                let token = Token::OpenTag {
                    name,
                    attributes,
                    self_closing: true,
                    offset,
                };
                return Some((token, &s[pos + 2..]));
            }
            b'>' => {
                let token = Token::OpenTag {
                    name,
                    attributes,
                    self_closing: false,
                    offset,
                };
                return Some((token, &s[pos + 1..]));
            }
            b if b.is_ascii_alphabetic() || *b == b'_' => {}
            _ => return None,
        }

        let attr_start = pos;
        while pos < bytes.len() && (is_name_byte(bytes[pos]) || bytes[pos] == b':') {
            pos += 1;
        }
        let attr_name = s[attr_start..pos].to_string();

        let after_name = skip_whitespace(bytes, pos);
        if bytes.get(after_name) != Some(&b'=') {
            attributes.push(Attribute {
                name: attr_name,
                value: None,
            });
            continue;
        }
        pos = skip_whitespace(bytes, after_name + 1);

        let value = match bytes.get(pos)? {
            quote @ (b'"' | b'\'') => {
                let start = pos + 1;
                let len = s[start..].find(*quote as char)?;
                pos = start + len + 1;
                AttrValue::String(s[start..start + len].to_string())
            }
            b'{' => {
                let (source, after) = scan_braced(&s[pos..])?;
                let value = AttrValue::Expression {
                    source: source.to_string(),
                    offset: offset + pos + 1,
                };
                pos = s.len() - after.len();
                value
            }
            _ => return None,
        };
        attributes.push(Attribute {
            name: attr_name,
            value: Some(value),
        });
    }
}

// ── Expressions ───────────────────────────────────────────────────────────────

/// Whether a quote following `prev` opens a string literal. In markup text
/// (`<p>it's</p>`) the quote follows a word character and is plain text.
pub(crate) fn opens_string(prev: u8) -> bool {
    matches!(
        prev,
        b'{' | b'(' | b'[' | b',' | b'=' | b':' | b'?' | b'+' | b'!' | b'&' | b'|'
    )
}

/// End of a string literal starting at `start`, just past the closing quote.
pub(crate) fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return Some(i + 1),
            b'\n' if quote != b'`' => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Scan a balanced `{...}` block, returning its inner source and the rest.
pub(crate) fn scan_braced(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut prev = b'{';
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'"' | b'\'' | b'`' if opens_string(prev) => {
                i = skip_string(bytes, i)?;
                prev = b'"';
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = s[i + 2..].find("*/").map(|end| i + 2 + end + 2)?;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            prev = b;
        }
        i += 1;
    }
    None
}

/// Length of the complete element (or fragment) at the start of `s`,
/// including nested elements and expressions.
pub(crate) fn markup_extent(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut rest = s;
    loop {
        if rest.starts_with('<') {
            if let Some((token, after)) = scan_tag(rest, 0) {
                match token {
                    Token::OpenTag {
                        self_closing: true, ..
                    } => {}
                    Token::OpenTag { .. } => depth += 1,
                    Token::CloseTag { .. } => depth = depth.checked_sub(1)?,
                    _ => {}
                }
                rest = after;
                if depth == 0 {
                    return Some(s.len() - rest.len());
                }
                continue;
            }
        }
        if depth == 0 {
            return None;
        }
        if rest.starts_with('{') {
            if let Some((_, after)) = scan_braced(rest) {
                rest = after;
                continue;
            }
        }
        let c = rest.chars().next()?;
        rest = &rest[c.len_utf8()..];
    }
}
