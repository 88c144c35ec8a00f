//! A reduced-fidelity scanner over the dictionary XML: enough self-closed-tag
//! and attribute extraction to drive the UL const table and macro emission.
//! Full MXF dictionary XML grammar (nesting, entity references, namespaces)
//! is not reproduced here; the authoritative loader remains an external
//! collaborator.

use crate::error::{DictConvertError, Result};
use std::collections::HashMap;

/// One self-closed or opening tag found in the source, with its attributes.
#[derive(Debug, Clone)]
pub struct Entry {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub line: usize,
}

impl Entry {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// Scan `xml` for tags of the form `<Tag attr="value" ...>` or
/// `<Tag attr="value" .../>`, one per logical line. Closing tags (`</Tag>`)
/// and comments are ignored.
pub fn scan(xml: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for (index, raw_line) in xml.lines().enumerate() {
        let line = raw_line.trim();
        let line_no = index + 1;

        if line.is_empty() || line.starts_with("<?") || line.starts_with("<!--") {
            continue;
        }
        if line.starts_with("</") {
            continue;
        }
        if !line.starts_with('<') {
            continue;
        }

        let body = line
            .trim_start_matches('<')
            .trim_end_matches("/>")
            .trim_end_matches('>')
            .trim();

        let mut parts = body.splitn(2, char::is_whitespace);
        let tag = parts
            .next()
            .ok_or_else(|| DictConvertError::MalformedEntry {
                line: line_no,
                reason: "missing tag name".into(),
            })?
            .to_string();
        let rest = parts.next().unwrap_or("");

        let attrs = parse_attrs(rest, line_no)?;
        entries.push(Entry {
            tag,
            attrs,
            line: line_no,
        });
    }

    Ok(entries)
}

fn parse_attrs(rest: &str, line_no: usize) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    let mut chars = rest.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let name_start = start;
        while matches!(chars.peek(), Some((_, c)) if *c != '=' && !c.is_whitespace()) {
            chars.next();
        }
        let name_end = chars.peek().map(|(i, _)| *i).unwrap_or(rest.len());
        let name = &rest[name_start..name_end];
        if name.is_empty() {
            break;
        }

        match chars.peek() {
            Some((_, '=')) => {
                chars.next();
            }
            _ => {
                return Err(DictConvertError::MalformedEntry {
                    line: line_no,
                    reason: format!("attribute \"{name}\" missing value"),
                });
            }
        }

        let quote = match chars.next() {
            Some((_, q)) if q == '"' || q == '\'' => q,
            _ => {
                return Err(DictConvertError::MalformedEntry {
                    line: line_no,
                    reason: format!("attribute \"{name}\" value must be quoted"),
                });
            }
        };

        let value_start = chars.peek().map(|(i, _)| *i).unwrap_or(rest.len());
        while matches!(chars.peek(), Some((_, c)) if *c != quote) {
            chars.next();
        }
        let value_end = chars.peek().map(|(i, _)| *i).unwrap_or(rest.len());
        let value = &rest[value_start..value_end];
        chars.next();

        attrs.insert(name.to_string(), value.to_string());
    }

    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_self_closed_tag_attributes() {
        let xml = r#"<Basic name="UInt8" detail="An 8-bit unsigned integer" size="1"/>"#;
        let entries = scan(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tag, "Basic");
        assert_eq!(entries[0].attr("name"), Some("UInt8"));
        assert_eq!(entries[0].attr("size"), Some("1"));
    }

    #[test]
    fn ignores_closing_tags_and_comments() {
        let xml = "<!-- comment -->\n<Types>\n<Basic name=\"X\"/>\n</Types>\n";
        let entries = scan(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, "Types");
        assert_eq!(entries[1].tag, "Basic");
    }

    #[test]
    fn unquoted_value_is_rejected() {
        let xml = "<Basic name=UInt8/>";
        assert!(scan(xml).is_err());
    }
}
