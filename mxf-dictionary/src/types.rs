//! The type registry: basic, interpretation, array/batch, compound and enum
//! types, and the traits each carries for reading/writing raw bytes and
//! converting to/from integer, string and rational surface forms.

use crate::error::{DictionaryError, Result};
use std::collections::BTreeMap;

/// Endianness a basic type's raw bytes are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Which kind of inter-object link a reference type expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Owns the target; exactly one strong reference to any target may
    /// exist at a time.
    Strong,
    /// Names a target by UUID without ownership; may dangle.
    Weak,
    /// Identifies this object itself as a valid reference target.
    Target,
    /// A global (file-external) reference, not resolved in-file.
    Global,
    /// Not a reference at all (plain 16-byte value with reference shape).
    None,
}

/// A named, registered type.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Basic {
        name: String,
        size: usize,
        endian: Endian,
    },
    Interpretation {
        name: String,
        base: String,
        size: usize,
    },
    /// Homogeneous sequence. `batch` distinguishes length-prefixed
    /// `count+size` vectors from implicit-length arrays.
    ArrayOrBatch {
        name: String,
        element: String,
        /// 0 means variable length (a batch).
        fixed_size: usize,
        batch: bool,
    },
    Compound {
        name: String,
        fields: Vec<CompoundField>,
    },
    Enum {
        name: String,
        underlying: String,
        values: Vec<(String, i64)>,
    },
    /// An interpretation of a 16-byte identifier carrying reference
    /// semantics.
    Reference {
        name: String,
        kind: ReferenceKind,
        target_class: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct CompoundField {
    pub name: String,
    pub type_name: String,
    pub size: usize,
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Basic { name, .. }
            | TypeDef::Interpretation { name, .. }
            | TypeDef::ArrayOrBatch { name, .. }
            | TypeDef::Compound { name, .. }
            | TypeDef::Enum { name, .. }
            | TypeDef::Reference { name, .. } => name,
        }
    }
}

/// Process-scoped, append-only-during-load registry of [`TypeDef`]s.
///
/// Mutating it after the first write to a file is undefined behaviour per
/// the spec; callers are expected to finish loading a dictionary before
/// opening any reader/writer.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_basic(&mut self, name: &str, size: usize, endian: Endian) -> Result<()> {
        if size == 0 {
            return Err(DictionaryError::ZeroSizedBasicType(name.to_string()));
        }
        self.insert(
            name,
            TypeDef::Basic {
                name: name.to_string(),
                size,
                endian,
            },
        )
    }

    /// `size` of 0 means "inherit the base type's size".
    pub fn add_interpretation(&mut self, name: &str, base: &str, size: usize) -> Result<()> {
        let base_size = self.size_of(base)?;
        let resolved = if size == 0 { base_size } else { size };
        if let Some(base_size) = base_size {
            if resolved != base_size && size != 0 {
                // A non-zero override must match a type the base actually
                // permits (for fixed-size bases this means equality).
                return Err(DictionaryError::IncompatibleInterpretationSize {
                    name: name.to_string(),
                    base: base_size,
                    requested: resolved,
                });
            }
        }
        self.insert(
            name,
            TypeDef::Interpretation {
                name: name.to_string(),
                base: base.to_string(),
                size: resolved,
            },
        )
    }

    pub fn add_reference(
        &mut self,
        name: &str,
        kind: ReferenceKind,
        target_class: Option<&str>,
    ) -> Result<()> {
        self.insert(
            name,
            TypeDef::Reference {
                name: name.to_string(),
                kind,
                target_class: target_class.map(str::to_string),
            },
        )
    }

    /// `fixed_size` of 0 means variable (a batch); otherwise an array with
    /// an implicit, fixed element count is assumed by callers.
    pub fn add_array(&mut self, name: &str, element: &str, fixed_size: usize) -> Result<()> {
        self.insert(
            name,
            TypeDef::ArrayOrBatch {
                name: name.to_string(),
                element: element.to_string(),
                fixed_size,
                batch: fixed_size == 0,
            },
        )
    }

    pub fn add_compound(&mut self, name: &str) -> Result<()> {
        self.insert(
            name,
            TypeDef::Compound {
                name: name.to_string(),
                fields: Vec::new(),
            },
        )
    }

    /// Append a field to a previously-registered compound type. Field order
    /// is preserved and defines wire order.
    pub fn append_field(
        &mut self,
        compound: &str,
        field_name: &str,
        type_name: &str,
        size: usize,
    ) -> Result<()> {
        match self
            .types
            .get_mut(compound)
            .ok_or_else(|| DictionaryError::UnknownType(compound.to_string()))?
        {
            TypeDef::Compound { fields, .. } => {
                fields.push(CompoundField {
                    name: field_name.to_string(),
                    type_name: type_name.to_string(),
                    size,
                });
                Ok(())
            }
            _ => Err(DictionaryError::UnknownType(compound.to_string())),
        }
    }

    pub fn add_enum(&mut self, name: &str, underlying: &str) -> Result<()> {
        self.insert(
            name,
            TypeDef::Enum {
                name: name.to_string(),
                underlying: underlying.to_string(),
                values: Vec::new(),
            },
        )
    }

    pub fn append_value(&mut self, enum_name: &str, value_name: &str, value: i64) -> Result<()> {
        match self
            .types
            .get_mut(enum_name)
            .ok_or_else(|| DictionaryError::UnknownType(enum_name.to_string()))?
        {
            TypeDef::Enum { values, .. } => {
                values.push((value_name.to_string(), value));
                Ok(())
            }
            _ => Err(DictionaryError::UnknownType(enum_name.to_string())),
        }
    }

    pub fn find(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Resolve the fixed byte size of `name`, following interpretation
    /// chains. Returns `None` for types with no fixed size (batches,
    /// variable-length compounds).
    pub fn size_of(&self, name: &str) -> Result<Option<usize>> {
        match self.types.get(name) {
            None => Ok(None),
            Some(TypeDef::Basic { size, .. }) => Ok(Some(*size)),
            Some(TypeDef::Interpretation { size, .. }) => Ok(Some(*size)),
            Some(TypeDef::ArrayOrBatch { fixed_size, .. }) => {
                Ok(if *fixed_size == 0 {
                    None
                } else {
                    Some(*fixed_size)
                })
            }
            Some(TypeDef::Compound { fields, .. }) => {
                let mut total = 0usize;
                for field in fields {
                    match self.size_of(&field.type_name)? {
                        Some(s) => total += s,
                        None => return Ok(None),
                    }
                }
                Ok(Some(total))
            }
            Some(TypeDef::Enum { underlying, .. }) => self.size_of(underlying),
            Some(TypeDef::Reference { .. }) => Ok(Some(16)),
        }
    }

    fn insert(&mut self, name: &str, def: TypeDef) -> Result<()> {
        if self.types.contains_key(name) {
            return Err(DictionaryError::DuplicateType(name.to_string()));
        }
        self.types.insert(name.to_string(), def);
        Ok(())
    }
}
