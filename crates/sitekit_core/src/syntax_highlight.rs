use std::cell::RefCell;

use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use syntect_assets::assets::HighlightingAssets;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

thread_local! {
    static ASSETS: RefCell<HighlightingAssets> = RefCell::new(HighlightingAssets::from_binary());
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, language: &str) -> Option<&'a SyntaxReference> {
    let token = language.trim().to_lowercase();
    if token.is_empty() {
        return None;
    }
    let token = map_language_alias(&token);
    syntax_set
        .find_syntax_by_token(token)
        .or_else(|| syntax_set.find_syntax_by_extension(token))
}

fn map_language_alias(token: &str) -> &str {
    match token {
        "c++" | "cpp" | "cxx" | "cc" => "cpp",
        "sh" | "shell" | "console" => "bash",
        "njk" | "nunjucks" | "jinja" => "html",
        "yml" => "yaml",
        "ts" | "typescript" => "js",
        _ => token,
    }
}

fn find_theme_name<'a, I>(theme: &str, mut themes: I) -> Option<String>
where
    I: Iterator<Item = &'a str>,
{
    let trimmed = theme.trim();
    if trimmed.is_empty() {
        return None;
    }
    let needle = trimmed.to_lowercase();
    themes
        .find(|name| *name == trimmed || name.to_lowercase() == needle)
        .map(str::to_string)
}

/// Highlight `code` into `hl-`-prefixed classed spans. `None` when the
/// language is unknown.
pub fn highlight_code_html_classed(code: &str, language: &str, _theme: &str) -> Option<String> {
    ASSETS.with(|cell| {
        let assets = cell.borrow();
        let syntax_set = assets.get_syntax_set().ok()?;
        let syntax = find_syntax(syntax_set, language)?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .ok()?;
        }
        Some(generator.finalize())
    })
}

/// Stylesheet matching the classes emitted by [`highlight_code_html_classed`].
pub fn highlight_css(theme: &str) -> Option<String> {
    ASSETS.with(|cell| {
        let assets = cell.borrow();
        let theme_name = find_theme_name(theme, assets.themes())?;
        let theme = assets.get_theme(&theme_name);
        css_for_theme_with_class_style(theme, CLASS_STYLE).ok()
    })
}
