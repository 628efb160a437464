use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Type;

/// Descriptive metadata for one function, as reported by a parser.
///
/// This is a plain value: it carries no handle to the view it describes and
/// is only checked when added to a [`DebugInfo`](super::DebugInfo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugFunctionInfo {
    short_name: String,
    full_name: String,
    raw_name: String,
    address: u64,
    return_type: Type,
    parameters: Vec<(String, Type)>,
}

impl DebugFunctionInfo {
    /// A missing return type is recorded as `void`.
    pub fn new(
        short_name: impl Into<String>,
        full_name: impl Into<String>,
        raw_name: impl Into<String>,
        address: u64,
        return_type: Option<Type>,
        parameters: Vec<(String, Type)>,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            full_name: full_name.into(),
            raw_name: raw_name.into(),
            address,
            return_type: return_type.unwrap_or(Type::Void),
            parameters,
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn parameters(&self) -> &[(String, Type)] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// True when none of the three name forms carries any text.
    pub fn is_anonymous(&self) -> bool {
        self.short_name.is_empty() && self.full_name.is_empty() && self.raw_name.is_empty()
    }

    /// Best name for display: short, then full, then raw.
    pub fn display_name(&self) -> &str {
        [&self.short_name, &self.full_name, &self.raw_name]
            .into_iter()
            .find(|n| !n.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Function type built from the return and parameter types.
    pub fn signature(&self) -> Type {
        Type::function(
            self.return_type.clone(),
            self.parameters.iter().map(|(_, ty)| ty.clone()).collect(),
            false,
        )
    }
}

impl fmt::Display for DebugFunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<debug-info function: {}>", self.short_name)
    }
}
