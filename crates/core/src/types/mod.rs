//! Value-level type descriptions attached to debug-info entries.
//!
//! Parsers describe the types they discover (return values, parameters,
//! named structures) with [`Type`]. Types are plain values: they are cloned
//! into collectors, serialized to JSON for the project database, and
//! rendered with a C-like spelling for human output.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A type discovered in debug data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Void,
    Bool,
    /// Integer of `width` bytes.
    Int {
        width: u64,
        signed: bool,
    },
    /// Floating point value of `width` bytes.
    Float {
        width: u64,
    },
    Pointer {
        target: Box<Type>,
        width: u64,
    },
    Array {
        element: Box<Type>,
        count: u64,
    },
    Function {
        return_type: Box<Type>,
        parameters: Vec<Type>,
        variadic: bool,
    },
    Structure(Structure),
    Enumeration(Enumeration),
    /// Reference to a type added by name elsewhere in the same debug info.
    Named {
        name: String,
    },
}

impl Type {
    pub fn void() -> Self {
        Type::Void
    }

    pub fn bool() -> Self {
        Type::Bool
    }

    pub fn int(width: u64, signed: bool) -> Self {
        Type::Int { width, signed }
    }

    pub fn float(width: u64) -> Self {
        Type::Float { width }
    }

    pub fn pointer(target: Type, width: u64) -> Self {
        Type::Pointer { target: Box::new(target), width }
    }

    pub fn array(element: Type, count: u64) -> Self {
        Type::Array { element: Box::new(element), count }
    }

    pub fn function(return_type: Type, parameters: Vec<Type>, variadic: bool) -> Self {
        Type::Function { return_type: Box::new(return_type), parameters, variadic }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Type::Named { name: name.into() }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Size in bytes, when it is knowable from the type alone.
    ///
    /// Void, function types and unresolved named references have no width.
    pub fn width(&self) -> Option<u64> {
        match self {
            Type::Void | Type::Function { .. } | Type::Named { .. } => None,
            Type::Bool => Some(1),
            Type::Int { width, .. } | Type::Float { width } | Type::Pointer { width, .. } => {
                Some(*width)
            }
            Type::Array { element, count } => element.width().map(|w| w.saturating_mul(*count)),
            Type::Structure(s) => Some(s.width),
            Type::Enumeration(e) => Some(e.width),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int { width: 1, signed: true } => write!(f, "char"),
            Type::Int { width, signed } => {
                let prefix = if *signed { "" } else { "u" };
                match width.checked_mul(8) {
                    Some(bits) => write!(f, "{prefix}int{bits}_t"),
                    None => write!(f, "{prefix}int<{width} bytes>"),
                }
            }
            Type::Float { width: 4 } => write!(f, "float"),
            Type::Float { width: 8 } => write!(f, "double"),
            Type::Float { width: 10 } => write!(f, "long double"),
            Type::Float { width } => match width.checked_mul(8) {
                Some(bits) => write!(f, "float{bits}"),
                None => write!(f, "float<{width} bytes>"),
            },
            Type::Pointer { target, .. } => match target.as_ref() {
                Type::Function { return_type, parameters, variadic } => {
                    write!(f, "{return_type} (*)(")?;
                    write_parameters(f, parameters, *variadic)?;
                    write!(f, ")")
                }
                other => write!(f, "{other}*"),
            },
            Type::Array { element, count } => write!(f, "{element}[{count}]"),
            Type::Function { return_type, parameters, variadic } => {
                write!(f, "{return_type} (")?;
                write_parameters(f, parameters, *variadic)?;
                write!(f, ")")
            }
            Type::Structure(s) => write!(f, "struct {}", s.name.as_deref().unwrap_or("<anonymous>")),
            Type::Enumeration(e) => write!(f, "enum {}", e.name.as_deref().unwrap_or("<anonymous>")),
            Type::Named { name } => write!(f, "{name}"),
        }
    }
}

fn write_parameters(f: &mut fmt::Formatter<'_>, parameters: &[Type], variadic: bool) -> fmt::Result {
    for (idx, param) in parameters.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{param}")?;
    }
    if variadic {
        if parameters.is_empty() {
            write!(f, "...")?;
        } else {
            write!(f, ", ...")?;
        }
    }
    Ok(())
}

/// Member of a [`Structure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureMember {
    pub name: String,
    pub ty: Type,
    /// Byte offset from the start of the structure.
    pub offset: u64,
}

/// Aggregate with ordered members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub name: Option<String>,
    pub width: u64,
    pub members: Vec<StructureMember>,
}

impl Structure {
    pub fn new(name: Option<String>) -> Self {
        Self { name, width: 0, members: Vec::new() }
    }

    /// Append a member at `offset`, growing the structure to cover it.
    pub fn push_member(&mut self, name: impl Into<String>, ty: Type, offset: u64) -> &mut Self {
        let end = offset.saturating_add(ty.width().unwrap_or(0));
        if end > self.width {
            self.width = end;
        }
        self.members.push(StructureMember { name: name.into(), ty, offset });
        self
    }

    pub fn member(&self, name: &str) -> Option<&StructureMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Named integer constants sharing one underlying width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    pub name: Option<String>,
    pub width: u64,
    pub members: Vec<(String, u64)>,
}

impl Enumeration {
    pub fn new(name: Option<String>, width: u64) -> Self {
        Self { name, width, members: Vec::new() }
    }

    pub fn push_member(&mut self, name: impl Into<String>, value: u64) -> &mut Self {
        self.members.push((name.into(), value));
        self
    }
}
