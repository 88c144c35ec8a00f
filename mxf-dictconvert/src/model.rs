//! Interprets the flat entry list from [`crate::source`] into the handful of
//! dictionary shapes the emitter understands.

use crate::error::{DictConvertError, Result};
use crate::source::Entry;

#[derive(Debug, Clone)]
pub struct BasicType {
    pub name: String,
    pub size: u32,
    pub little_endian: bool,
}

#[derive(Debug, Clone)]
pub struct Interpretation {
    pub name: String,
    pub base: String,
    pub size: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub name: String,
    pub type_name: String,
    pub local_tag: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub parent: Option<String>,
    pub key: Option<[u8; 16]>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone)]
pub struct UlConst {
    pub name: String,
    pub bytes: [u8; 16],
}

#[derive(Debug, Default)]
pub struct Dictionary {
    pub basics: Vec<BasicType>,
    pub interpretations: Vec<Interpretation>,
    pub classes: Vec<Class>,
    pub uls: Vec<UlConst>,
}

/// Parse a UL written as 16 dot- or colon-separated hex byte pairs, e.g.
/// `06.0e.2b.34.01.01.01.01.04.01.01.01.01.02.02.00`.
pub fn parse_ul(text: &str) -> Result<[u8; 16]> {
    let bytes: Result<Vec<u8>> = text
        .split(['.', ':'])
        .map(|part| {
            u8::from_str_radix(part.trim_start_matches("0x"), 16)
                .map_err(|_| DictConvertError::InvalidUl(text.to_string()))
        })
        .collect();
    let bytes = bytes?;
    if bytes.len() != 16 {
        return Err(DictConvertError::InvalidUl(text.to_string()));
    }
    let mut array = [0u8; 16];
    array.copy_from_slice(&bytes);
    Ok(array)
}

pub fn build(entries: &[Entry]) -> Result<Dictionary> {
    let mut dict = Dictionary::default();
    let mut current_class: Option<Class> = None;

    for entry in entries {
        match entry.tag.as_str() {
            "Basic" => {
                let name = required(entry, "name")?;
                let size: u32 = entry
                    .attr("size")
                    .unwrap_or("0")
                    .parse()
                    .map_err(|_| DictConvertError::MalformedEntry {
                        line: entry.line,
                        reason: "size must be an integer".into(),
                    })?;
                dict.basics.push(BasicType {
                    name,
                    size,
                    little_endian: entry.attr("endian") == Some("little"),
                });
            }
            "Interpretation" => {
                let name = required(entry, "name")?;
                let base = required(entry, "base")?;
                let size = entry.attr("size").and_then(|s| s.parse().ok());
                dict.interpretations.push(Interpretation { name, base, size });
            }
            "Class" => {
                if let Some(class) = current_class.take() {
                    dict.classes.push(class);
                }
                let name = required(entry, "name")?;
                let key = entry.attr("key").map(parse_ul).transpose()?;
                if let Some(bytes) = key {
                    dict.uls.push(UlConst {
                        name: format!("{name}_UL"),
                        bytes,
                    });
                }
                current_class = Some(Class {
                    name,
                    parent: entry.attr("parent").map(str::to_string),
                    key,
                    members: Vec::new(),
                });
            }
            "Member" => {
                let class = current_class.as_mut().ok_or_else(|| DictConvertError::MalformedEntry {
                    line: entry.line,
                    reason: "Member outside of a Class".into(),
                })?;
                let name = required(entry, "name")?;
                let type_name = required(entry, "type")?;
                let local_tag = entry
                    .attr("tag")
                    .map(|t| u16::from_str_radix(t.trim_start_matches("0x"), 16))
                    .transpose()
                    .map_err(|_| DictConvertError::MalformedEntry {
                        line: entry.line,
                        reason: "tag must be hex".into(),
                    })?;
                class.members.push(ClassMember {
                    name,
                    type_name,
                    local_tag,
                });
            }
            "UL" => {
                let name = required(entry, "name")?;
                let bytes = parse_ul(&required(entry, "value")?)?;
                dict.uls.push(UlConst { name, bytes });
            }
            _ => {}
        }
    }

    if let Some(class) = current_class.take() {
        dict.classes.push(class);
    }

    Ok(dict)
}

fn required(entry: &Entry, attr: &str) -> Result<String> {
    entry
        .attr(attr)
        .map(str::to_string)
        .ok_or_else(|| DictConvertError::MalformedEntry {
            line: entry.line,
            reason: format!("missing required attribute \"{attr}\""),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::scan;

    #[test]
    fn builds_basic_and_class_with_members() {
        let xml = r#"
<Basic name="UInt8" size="1"/>
<Class name="Preface" key="06.0e.2b.34.02.53.01.01.0d.01.01.01.01.2e.00.00">
<Member name="Version" type="UInt16" tag="0x0102"/>
</Class>
"#;
        let entries = scan(xml).unwrap();
        let dict = build(&entries).unwrap();
        assert_eq!(dict.basics.len(), 1);
        assert_eq!(dict.classes.len(), 1);
        assert_eq!(dict.classes[0].members.len(), 1);
        assert_eq!(dict.classes[0].members[0].local_tag, Some(0x0102));
        assert_eq!(dict.uls.len(), 1);
        assert_eq!(dict.uls[0].name, "Preface_UL");
    }

    #[test]
    fn member_outside_class_is_rejected() {
        let xml = r#"<Member name="X" type="UInt8"/>"#;
        let entries = scan(xml).unwrap();
        assert!(build(&entries).is_err());
    }

    #[test]
    fn malformed_ul_is_rejected() {
        let xml = r#"<Class name="Bad" key="not-a-ul"/>"#;
        let entries = scan(xml).unwrap();
        assert!(build(&entries).is_err());
    }
}
