//! Renders a [`Dictionary`] as Rust source: a namespace module of UL consts,
//! and (unless `only_consts`) registration functions that replay the
//! dictionary into a [`mxf_dictionary::TypeRegistry`]/`ClassRegistry` at
//! runtime — the functional equivalent of the original's compiled-in macro
//! tables.

use crate::model::Dictionary;
use std::fmt::Write as _;

pub struct EmitOptions {
    pub only_consts: bool,
    pub skip_consts: bool,
    pub long_form_consts: bool,
    pub use_name: String,
    pub ul_namespace: String,
}

pub fn emit(dict: &Dictionary, opts: &EmitOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by dictconvert. Do not edit by hand.\n");

    if !opts.only_consts {
        emit_registration(&mut out, dict, &opts.use_name);
    }

    if !opts.skip_consts {
        emit_uls(&mut out, dict, &opts.ul_namespace, opts.long_form_consts);
    }

    out
}

fn emit_registration(out: &mut String, dict: &Dictionary, use_name: &str) {
    let _ = writeln!(out, "use mxf_dictionary::{{ClassRegistry, DictionaryError, MemberUsage, ReferenceKind, TypeRegistry}};\n");

    let _ = writeln!(
        out,
        "pub fn register_{use_name}_types(registry: &mut TypeRegistry) -> Result<(), DictionaryError> {{",
        use_name = to_snake(use_name)
    );
    for basic in &dict.basics {
        let endian = if basic.little_endian { "Endian::Little" } else { "Endian::Big" };
        let _ = writeln!(
            out,
            "    registry.add_basic(\"{}\", {}, mxf_dictionary::{endian})?;",
            basic.name, basic.size
        );
    }
    for interp in &dict.interpretations {
        let size = interp.size.unwrap_or(0);
        let _ = writeln!(
            out,
            "    registry.add_interpretation(\"{}\", \"{}\", {})?;",
            interp.name, interp.base, size
        );
    }
    let _ = writeln!(out, "    Ok(())\n}}\n");

    let _ = writeln!(
        out,
        "pub fn register_{use_name}_classes(registry: &mut ClassRegistry) -> Result<(), DictionaryError> {{",
        use_name = to_snake(use_name)
    );
    for class in &dict.classes {
        let key_expr = match class.key {
            Some(bytes) => format!("Some(mxf_core::UL::new({}))", byte_array(&bytes)),
            None => "None".to_string(),
        };
        let parent_expr = match &class.parent {
            Some(p) => format!("Some(\"{p}\")"),
            None => "None".to_string(),
        };
        let _ = writeln!(
            out,
            "    registry.register_class(\"{}\", {}, {}, {})?;",
            class.name,
            parent_expr,
            key_expr,
            class.key.is_some()
        );
        for member in &class.members {
            let tag_expr = match member.local_tag {
                Some(tag) => format!("Some(0x{tag:04x})"),
                None => "None".to_string(),
            };
            let _ = writeln!(
                out,
                "    registry.append_member(\"{}\", \"{}\", \"{}\", MemberUsage::Required, {}, ReferenceKind::None)?;",
                class.name, member.name, member.type_name, tag_expr
            );
        }
    }
    let _ = writeln!(out, "    Ok(())\n}}\n");
}

fn emit_uls(out: &mut String, dict: &Dictionary, namespace: &str, long_form: bool) {
    if dict.uls.is_empty() {
        return;
    }

    let _ = writeln!(out, "// Define ULs for the global keys in this dictionary");
    let _ = writeln!(out, "pub mod {} {{", to_snake(namespace));
    let _ = writeln!(out, "    use mxf_core::UL;\n");
    for ul in &dict.uls {
        let const_name = if long_form {
            format!("{}_{}", to_screaming_snake(namespace), to_screaming_snake(&ul.name))
        } else {
            to_screaming_snake(&ul.name)
        };
        let _ = writeln!(
            out,
            "    pub const {const_name}: UL = UL::new({});",
            byte_array(&ul.bytes)
        );
    }
    let _ = writeln!(out, "}} // mod {}", to_snake(namespace));
}

fn byte_array(bytes: &[u8; 16]) -> String {
    let parts: Vec<String> = bytes.iter().map(|b| format!("0x{b:02x}")).collect();
    format!("[{}]", parts.join(", "))
}

fn to_snake(input: &str) -> String {
    let mut out = String::new();
    for (i, c) in input.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

fn to_screaming_snake(input: &str) -> String {
    to_snake(input).to_uppercase()
}
