//! The object-type (class) registry: the metadata set/group hierarchy,
//! member specs, and local-tag assignment rules.

use crate::error::{DictionaryError, Result};
use crate::types::ReferenceKind;
use mxf_core::UL;
use std::collections::BTreeMap;

/// Whether a member must, may, or may not appear on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberUsage {
    Required,
    Optional,
    /// Present on the class for documentation only; never written.
    Decoration,
}

#[derive(Debug, Clone)]
pub struct MemberSpec {
    pub name: String,
    pub type_name: String,
    pub usage: MemberUsage,
    pub local_tag: Option<u16>,
    pub reference: ReferenceKind,
}

/// A registered class (object type): either an abstract base with no key of
/// its own, or a concrete class with a 16-byte UL instantiable on disk.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<String>,
    pub key: Option<UL>,
    pub is_concrete: bool,
    pub members: Vec<MemberSpec>,
}

impl ClassDef {
    fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// Process-scoped registry of [`ClassDef`]s, mirroring the type registry's
/// append-only-during-load contract.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: BTreeMap<String, ClassDef>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new class. `key` is required for concrete (instantiable)
    /// classes and forbidden for abstract ones — an abstract class only
    /// contributes inherited members.
    pub fn register_class(
        &mut self,
        name: &str,
        parent: Option<&str>,
        key: Option<UL>,
        is_concrete: bool,
    ) -> Result<()> {
        if self.classes.contains_key(name) {
            return Err(DictionaryError::DuplicateClass(name.to_string()));
        }
        if let Some(parent) = parent {
            if !self.classes.contains_key(parent) {
                return Err(DictionaryError::UnknownClass(parent.to_string()));
            }
        }
        if is_concrete && key.is_none() {
            return Err(DictionaryError::ConcreteClassMissingKey(name.to_string()));
        }
        self.classes.insert(
            name.to_string(),
            ClassDef {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                key,
                is_concrete,
                members: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn append_member(
        &mut self,
        class: &str,
        name: &str,
        type_name: &str,
        usage: MemberUsage,
        local_tag: Option<u16>,
        reference: ReferenceKind,
    ) -> Result<()> {
        let def = self
            .classes
            .get_mut(class)
            .ok_or_else(|| DictionaryError::UnknownClass(class.to_string()))?;
        if def.member_index(name).is_some() {
            // Re-declaring a member on the same class refines it in place,
            // matching dictionary-load behaviour where a derived entry can
            // narrow a usage rule inherited textually within one class body.
            let idx = def.member_index(name).unwrap();
            def.members[idx] = MemberSpec {
                name: name.to_string(),
                type_name: type_name.to_string(),
                usage,
                local_tag,
                reference,
            };
            return Ok(());
        }
        def.members.push(MemberSpec {
            name: name.to_string(),
            type_name: type_name.to_string(),
            usage,
            local_tag,
            reference,
        });
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Walk from `name` up through parents collecting every member, nearest
    /// class first; a derived class's member with the same name shadows an
    /// ancestor's.
    pub fn all_members(&self, name: &str) -> Result<Vec<&MemberSpec>> {
        let mut out: Vec<&MemberSpec> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = Some(name);
        while let Some(class_name) = current {
            let def = self
                .classes
                .get(class_name)
                .ok_or_else(|| DictionaryError::UnknownClass(class_name.to_string()))?;
            for member in &def.members {
                if seen.insert(member.name.clone()) {
                    out.push(member);
                }
            }
            current = def.parent.as_deref();
        }
        Ok(out)
    }

    /// Resolve the concrete key for `name`, walking up to the nearest
    /// concrete ancestor if `name` itself is abstract.
    pub fn key_of(&self, name: &str) -> Result<UL> {
        let mut current = Some(name);
        while let Some(class_name) = current {
            let def = self
                .classes
                .get(class_name)
                .ok_or_else(|| DictionaryError::UnknownClass(class_name.to_string()))?;
            if let Some(key) = def.key {
                return Ok(key);
            }
            current = def.parent.as_deref();
        }
        Err(DictionaryError::ConcreteClassMissingKey(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ul(last: u8) -> UL {
        let mut bytes = [0u8; 16];
        bytes[0] = 0x06;
        bytes[15] = last;
        UL::new(bytes)
    }

    #[test]
    fn concrete_class_requires_key() {
        let mut reg = ClassRegistry::new();
        assert!(reg.register_class("Foo", None, None, true).is_err());
    }

    #[test]
    fn abstract_parent_then_concrete_child() {
        let mut reg = ClassRegistry::new();
        reg.register_class("InterchangeObject", None, None, false)
            .unwrap();
        reg.register_class("Preface", Some("InterchangeObject"), Some(ul(1)), true)
            .unwrap();
        assert_eq!(reg.key_of("Preface").unwrap(), ul(1));
    }

    #[test]
    fn members_inherit_from_parent() {
        let mut reg = ClassRegistry::new();
        reg.register_class("Base", None, None, false).unwrap();
        reg.append_member(
            "Base",
            "InstanceUID",
            "UUID",
            MemberUsage::Required,
            Some(0x3c0a),
            ReferenceKind::Target,
        )
        .unwrap();
        reg.register_class("Derived", Some("Base"), Some(ul(2)), true)
            .unwrap();
        reg.append_member(
            "Derived",
            "Name",
            "UTF16String",
            MemberUsage::Optional,
            Some(0x4001),
            ReferenceKind::None,
        )
        .unwrap();
        let members = reg.all_members("Derived").unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().any(|m| m.name == "InstanceUID"));
        assert!(members.iter().any(|m| m.name == "Name"));
    }

    #[test]
    fn unknown_parent_rejected() {
        let mut reg = ClassRegistry::new();
        assert!(reg
            .register_class("Child", Some("NoSuchParent"), Some(ul(3)), true)
            .is_err());
    }
}
