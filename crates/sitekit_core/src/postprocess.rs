//! HTML output post-processing
//!
//! Runs once per written file. Only `.html` outputs are touched; the
//! transform is cosmetic and must not change what a browser renders.

use std::borrow::Cow;
use std::path::Path;

use crate::model::PostprocessMode;

const SHORT_DOCTYPE: &str = "<!doctype html>";

/// Elements whose contents are never re-split or comment-stripped.
const RAW_TEXT_TAGS: &[&str] = &["pre", "script", "style", "textarea"];

/// Tag boundaries that the tidy pass puts on their own line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "html", "li", "main", "nav", "noscript", "ol", "p", "pre", "script",
    "section", "style", "summary", "table", "tbody", "td", "template", "tfoot", "th", "thead",
    "title", "tr", "ul",
];

const VOID_BLOCK_TAGS: &[&str] = &["!doctype", "base", "hr", "link", "meta"];

pub fn postprocess<'a>(html: &'a str, output_path: &Path, mode: PostprocessMode) -> Cow<'a, str> {
    if !is_html_output(output_path) {
        return Cow::Borrowed(html);
    }
    match mode {
        PostprocessMode::None => Cow::Borrowed(html),
        PostprocessMode::Minify => Cow::Owned(minify(html)),
        PostprocessMode::Tidy => Cow::Owned(tidy(html)),
    }
}

fn is_html_output(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

pub fn minify(html: &str) -> String {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = false;
    cfg.minify_js = false;
    cfg.remove_bangs = false;
    cfg.remove_processing_instructions = true;
    let minified = minify_html::minify(html.as_bytes(), &cfg);
    shorten_doctype(&String::from_utf8_lossy(&minified))
}

/// Best-effort line formatter. Not a validating parser: malformed markup is
/// copied through as text.
pub fn tidy(html: &str) -> String {
    let tokens = tokenize(html);
    let mut out = String::with_capacity(html.len());
    let mut raw_blocks: Vec<&str> = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        let prev = idx.checked_sub(1).and_then(|prev| tokens.get(prev));
        let breaks_after_prev = prev.is_some_and(Token::closes_block);
        match token {
            Token::Text(text) => {
                let next = tokens.get(idx + 1);
                let between_tags = prev.is_some() && next.is_some() && text.trim().is_empty();
                if between_tags && (breaks_after_prev || next.is_some_and(Token::opens_block)) {
                    out.push('\n');
                } else {
                    out.push_str(text);
                }
            }
            Token::Tag { text, .. } | Token::Raw { text, .. } => {
                let after_tag = prev.is_some_and(|prev| !matches!(prev, Token::Text(_)));
                if after_tag && (breaks_after_prev || token.opens_block()) {
                    out.push('\n');
                }
                if matches!(token, Token::Raw { .. }) {
                    // Line cleanup must not reach raw contents; park them.
                    out.push_str(&raw_marker(raw_blocks.len()));
                    raw_blocks.push(text.as_str());
                } else {
                    out.push_str(text);
                }
            }
        }
    }
    let normalized = normalize_lines(&out);
    shorten_doctype(&restore_raw(&normalized, &raw_blocks))
}

fn raw_marker(idx: usize) -> String {
    format!("\u{0}raw{idx}\u{0}")
}

/// Put parked raw blocks back in order. Searching resumes after each
/// restored block, so raw contents are never scanned for markers.
fn restore_raw(text: &str, raw_blocks: &[&str]) -> String {
    let raw_len: usize = raw_blocks.iter().map(|block| block.len()).sum();
    let mut out = String::with_capacity(text.len() + raw_len);
    let mut rest = text;
    for (idx, block) in raw_blocks.iter().enumerate() {
        let marker = raw_marker(idx);
        let Some(at) = rest.find(&marker) else {
            break;
        };
        out.push_str(&rest[..at]);
        out.push_str(block);
        rest = &rest[at + marker.len()..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Tag {
        text: String,
        name: String,
        closing: bool,
    },
    /// Opening tag of a raw-text element plus its untouched contents.
    Raw { text: String, name: String },
}

impl Token {
    fn opens_block(&self) -> bool {
        match self {
            Token::Text(_) => false,
            Token::Tag { name, closing, .. } => !closing && is_block(name),
            Token::Raw { name, .. } => is_block(name),
        }
    }

    fn closes_block(&self) -> bool {
        match self {
            Token::Tag { name, closing, .. } => {
                (*closing && is_block(name)) || VOID_BLOCK_TAGS.contains(&name.as_str())
            }
            Token::Text(_) | Token::Raw { .. } => false,
        }
    }
}

fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name) || VOID_BLOCK_TAGS.contains(&name)
}

fn tokenize(html: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = html;
    while let Some(ch) = rest.chars().next() {
        if rest.starts_with("<!--") {
            rest = match rest[4..].find("-->") {
                Some(end) => &rest[4 + end + 3..],
                None => "",
            };
            continue;
        }
        if ch == '<' && starts_tag(rest) {
            let Some(end) = find_tag_end(rest) else {
                text.push_str(rest);
                break;
            };
            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            let raw_tag = &rest[..=end];
            let name = tag_name(raw_tag);
            let closing = raw_tag.starts_with("</");
            let tag = join_tag_lines(raw_tag);
            rest = &rest[end + 1..];
            if !closing && RAW_TEXT_TAGS.contains(&name.as_str()) {
                let close = find_closing(rest, &name).unwrap_or(rest.len());
                let mut block = tag;
                block.push_str(&rest[..close]);
                tokens.push(Token::Raw { text: block, name });
                rest = &rest[close..];
            } else {
                tokens.push(Token::Tag {
                    text: tag,
                    name,
                    closing,
                });
            }
            continue;
        }
        text.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

fn starts_tag(rest: &str) -> bool {
    let mut chars = rest.chars().skip(1);
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some('!') => true,
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    }
}

/// Index of the `>` closing the tag at the start of `rest`, skipping quoted
/// attribute values.
fn find_tag_end(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in rest.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '>') => return Some(idx),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Collapse whitespace runs outside quoted values, which puts a tag split
/// across several source lines back on one line.
fn join_tag_lines(tag: &str) -> String {
    if !tag.contains('\n') {
        return tag.to_string();
    }
    let mut out = String::with_capacity(tag.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for ch in tag.chars() {
        if quote.is_none() && ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && ch != '>' {
            out.push(' ');
        }
        pending_space = false;
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '"') | (None, '\'') => quote = Some(ch),
            _ => {}
        }
        out.push(ch);
    }
    out
}

/// Offset of `</name` in `rest`, matched case-insensitively.
fn find_closing(rest: &str, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let haystack = rest.to_ascii_lowercase();
    haystack.find(&needle)
}

/// Strip trailing whitespace per line and shrink runs of three or more
/// blank lines to a single one.
fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            let keep = if blank_run >= 3 { 1 } else { blank_run };
            out.extend(std::iter::repeat_n('\n', keep));
        }
        blank_run = 0;
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Replace a leading doctype declaration with `<!doctype html>`.
fn shorten_doctype(html: &str) -> String {
    let leading = html.len() - html.trim_start().len();
    let body = &html[leading..];
    if body.len() >= 9 && body[..9].eq_ignore_ascii_case("<!doctype") {
        if let Some(end) = body.find('>') {
            return format!("{}{SHORT_DOCTYPE}{}", &html[..leading], &body[end + 1..]);
        }
    }
    html.to_string()
}
