//! Front matter block splitting and parsing

use serde_yaml::{Mapping, Value};
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("missing front matter block")]
    Missing,
    #[error("unterminated front matter block")]
    Unterminated,
    #[error("invalid YAML in front matter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter<'a> {
    pub data: Mapping,
    pub body: &'a str,
}

/// Split `raw` into the text between the leading `---` fences and the body.
///
/// Returns `Ok(None)` when the file does not open with a fence.
pub fn split_front_matter(raw: &str) -> Result<Option<(&str, &str)>, FrontMatterError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_end() != DELIMITER {
        return Ok(None);
    }
    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let block = &raw[block_start..offset];
            let body = &raw[offset + line.len()..];
            return Ok(Some((block, body)));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

pub fn parse_metadata(block: &str) -> Result<Mapping, FrontMatterError> {
    match serde_yaml::from_str::<Value>(block)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        Value::Bool(_) => Err(FrontMatterError::NotAMapping("a boolean")),
        Value::Number(_) => Err(FrontMatterError::NotAMapping("a number")),
        Value::String(_) => Err(FrontMatterError::NotAMapping("a string")),
        Value::Sequence(_) => Err(FrontMatterError::NotAMapping("a sequence")),
        Value::Tagged(_) => Err(FrontMatterError::NotAMapping("a tagged value")),
    }
}

/// Parse a document that must carry a front matter block.
pub fn parse_required(raw: &str) -> Result<FrontMatter<'_>, FrontMatterError> {
    let (block, body) = split_front_matter(raw)?.ok_or(FrontMatterError::Missing)?;
    Ok(FrontMatter {
        data: parse_metadata(block)?,
        body,
    })
}

/// Parse a document whose front matter is optional; without one the whole
/// text is the body.
pub fn parse_optional(raw: &str) -> Result<FrontMatter<'_>, FrontMatterError> {
    match split_front_matter(raw)? {
        Some((block, body)) => Ok(FrontMatter {
            data: parse_metadata(block)?,
            body,
        }),
        None => Ok(FrontMatter {
            data: Mapping::new(),
            body: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_block_and_body() {
        let raw = "---\ntitle: Hello\ntags: [a, b]\n---\n## Body\n";
        let parsed = parse_required(raw).expect("parse should succeed");
        assert_eq!(
            parsed.data.get("title").and_then(Value::as_str),
            Some("Hello")
        );
        assert_eq!(parsed.body, "## Body\n");
    }

    #[test]
    fn nested_values_survive() {
        let raw = "---\nseo:\n  description: Text\nlist:\n  - one\n  - two\n---\nbody";
        let parsed = parse_required(raw).expect("parse should succeed");
        let seo = parsed.data.get("seo").and_then(Value::as_mapping).unwrap();
        assert_eq!(seo.get("description").and_then(Value::as_str), Some("Text"));
        assert_eq!(
            parsed.data.get("list").and_then(Value::as_sequence).map(Vec::len),
            Some(2)
        );
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn empty_block_is_empty_mapping() {
        let parsed = parse_required("---\n---\nbody").expect("parse should succeed");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.body, "body");
    }

    #[test]
    fn crlf_and_bom_are_accepted() {
        let raw = "\u{feff}---\r\ntitle: Win\r\n---\r\nbody\r\n";
        let parsed = parse_required(raw).expect("parse should succeed");
        assert_eq!(parsed.data.get("title").and_then(Value::as_str), Some("Win"));
        assert_eq!(parsed.body, "body\r\n");
    }

    #[test]
    fn missing_block_is_reported() {
        let err = parse_required("# Just markdown\n").expect_err("expected error");
        assert!(matches!(err, FrontMatterError::Missing));

        let parsed = parse_optional("# Just markdown\n").expect("parse should succeed");
        assert!(parsed.data.is_empty());
        assert_eq!(parsed.body, "# Just markdown\n");
    }

    #[test]
    fn unterminated_block_is_error() {
        let err = parse_optional("---\ntitle: x\nbody").expect_err("expected error");
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn invalid_yaml_is_error() {
        let err = parse_required("---\ntitle: [unclosed\n---\n").expect_err("expected error");
        assert!(matches!(err, FrontMatterError::InvalidYaml(_)));
    }

    #[test]
    fn scalar_block_is_not_a_mapping() {
        let err = parse_required("---\njust text\n---\n").expect_err("expected error");
        assert!(matches!(err, FrontMatterError::NotAMapping("a string")));
    }
}
