use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use pulldown_cmark_toc::{GitHubSlugifier, Slugify};

use crate::model::SyntaxConfig;
use crate::syntax_highlight::highlight_code_html_classed;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    pub syntax_highlight: bool,
    pub syntax_theme: &'a str,
}

impl<'a> RenderOptions<'a> {
    pub fn from_config(syntax: &'a SyntaxConfig) -> Self {
        Self {
            syntax_highlight: syntax.highlight,
            syntax_theme: &syntax.theme,
        }
    }
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self {
            syntax_highlight: false,
            syntax_theme: "",
        }
    }
}

fn cmark_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Markdown rendering used for page and record bodies.
///
/// Headings get GitHub-style `id` anchors and fenced code blocks are
/// wrapped in `language-*` classes, highlighted at build time when enabled.
pub fn render_markdown_with_options(md: &str, options: &RenderOptions<'_>) -> String {
    let parser = Parser::new_ext(md, cmark_options());
    let mut events = Vec::new();
    let mut code_pending: Option<CodeBlockPending> = None;
    let mut heading_pending: Option<HeadingPending> = None;
    let mut slugger = GitHubSlugifier::default();

    for event in parser {
        if let Some(heading) = heading_pending.as_mut() {
            match event {
                Event::End(TagEnd::Heading(_)) => {
                    let level_num = heading_level_value(heading.level);
                    let slug = slugger.slugify(heading.text.trim()).into_owned();
                    let mut inner = String::new();
                    html::push_html(&mut inner, heading.events.drain(..));
                    let html = format!(
                        "<h{level_num} id=\"{}\">{inner}</h{level_num}>\n",
                        escape_attr(&slug)
                    );
                    events.push(Event::Html(html.into()));
                    heading_pending = None;
                }
                Event::Text(text) => {
                    heading.text.push_str(&text);
                    heading.events.push(Event::Text(text));
                }
                Event::Code(text) => {
                    heading.text.push_str(&text);
                    heading.events.push(Event::Code(text));
                }
                Event::SoftBreak | Event::HardBreak => {
                    if !heading.text.ends_with(' ') {
                        heading.text.push(' ');
                    }
                    heading.events.push(event);
                }
                _ => {
                    heading.events.push(event);
                }
            }
            continue;
        }

        if let Some(code) = code_pending.as_mut() {
            match event {
                Event::End(TagEnd::CodeBlock) => {
                    let html = render_code_block_html(code, options);
                    events.push(Event::Html(html.into()));
                    code_pending = None;
                }
                Event::Text(text) | Event::Code(text) => {
                    code.code.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => {
                    code.code.push('\n');
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading_pending = Some(HeadingPending {
                    level,
                    text: String::new(),
                    events: Vec::new(),
                });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => extract_language(info.as_ref()),
                    CodeBlockKind::Indented => String::new(),
                };
                code_pending = Some(CodeBlockPending {
                    language,
                    code: String::new(),
                });
            }
            _ => events.push(event),
        }
    }

    let mut html_out = String::new();
    html::push_html(&mut html_out, events.into_iter());
    html_out
}

struct CodeBlockPending {
    language: String,
    code: String,
}

struct HeadingPending<'a> {
    level: HeadingLevel,
    text: String,
    events: Vec<Event<'a>>,
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_html_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn extract_language(info: &str) -> String {
    info.split_whitespace().next().unwrap_or("").to_string()
}

fn heading_level_value(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn sanitize_language(language: &str) -> String {
    language
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+'))
        .collect()
}

fn render_code_block_html(pending: &CodeBlockPending, options: &RenderOptions<'_>) -> String {
    let language_raw = pending.language.trim();
    let language = sanitize_language(language_raw);
    let class_attr = if language.is_empty() {
        String::new()
    } else {
        format!(" class=\"language-{language}\"")
    };

    if options.syntax_highlight && !language.is_empty() {
        if let Some(html) =
            highlight_code_html_classed(&pending.code, language_raw, options.syntax_theme)
        {
            return format!("<pre{class_attr}><code{class_attr}>{html}</code></pre>\n");
        }
    }

    let escaped = escape_html_text(&pending.code);
    format!("<pre{class_attr}><code{class_attr}>{escaped}</code></pre>\n")
}
