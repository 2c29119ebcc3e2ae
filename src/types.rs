//! Core vocabulary shared by issues, checks and renderers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IssueError;

/// Every code an issue may carry.
pub const ISSUE_CODES: &[IssueCode] = &[
    IssueCode::InvalidType,
    IssueCode::InvalidValue,
    IssueCode::InvalidFormat,
    IssueCode::InvalidUnion,
    IssueCode::InvalidKey,
    IssueCode::InvalidElement,
    IssueCode::TooBig,
    IssueCode::TooSmall,
    IssueCode::NotMultipleOf,
    IssueCode::UnrecognizedKeys,
    IssueCode::Custom,
    IssueCode::InvalidSchema,
    IssueCode::InvalidDiscriminator,
    IssueCode::IncompatibleTypes,
    IssueCode::MissingRequired,
    IssueCode::TypeConversion,
    IssueCode::NilPointer,
];

/// Kind of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    InvalidValue,
    InvalidFormat,
    InvalidUnion,
    InvalidKey,
    InvalidElement,
    TooBig,
    TooSmall,
    NotMultipleOf,
    UnrecognizedKeys,
    Custom,
    InvalidSchema,
    InvalidDiscriminator,
    IncompatibleTypes,
    MissingRequired,
    TypeConversion,
    NilPointer,
}

impl IssueCode {
    /// Wire name of the code (e.g. `"too_small"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::InvalidType => "invalid_type",
            IssueCode::InvalidValue => "invalid_value",
            IssueCode::InvalidFormat => "invalid_format",
            IssueCode::InvalidUnion => "invalid_union",
            IssueCode::InvalidKey => "invalid_key",
            IssueCode::InvalidElement => "invalid_element",
            IssueCode::TooBig => "too_big",
            IssueCode::TooSmall => "too_small",
            IssueCode::NotMultipleOf => "not_multiple_of",
            IssueCode::UnrecognizedKeys => "unrecognized_keys",
            IssueCode::Custom => "custom",
            IssueCode::InvalidSchema => "invalid_schema",
            IssueCode::InvalidDiscriminator => "invalid_discriminator",
            IssueCode::IncompatibleTypes => "incompatible_types",
            IssueCode::MissingRequired => "missing_required",
            IssueCode::TypeConversion => "type_conversion",
            IssueCode::NilPointer => "nil_pointer",
        }
    }

    /// Codes that carry nested issues under `issues`.
    pub fn is_structural(&self) -> bool {
        matches!(self, IssueCode::InvalidKey | IssueCode::InvalidElement)
    }

    /// Codes that carry per-branch issue sequences under `errors`.
    pub fn is_branching(&self) -> bool {
        matches!(self, IssueCode::InvalidUnion)
    }

    /// Codes rendered from their own properties alone.
    pub fn is_leaf(&self) -> bool {
        !self.is_structural() && !self.is_branching()
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueCode {
    type Err = IssueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ISSUE_CODES
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| IssueError::UnknownCode {
                code: s.to_string(),
            })
    }
}

/// Runtime type tag of an arbitrary input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsedType {
    String,
    Number,
    Bool,
    Null,
    Array,
    Slice,
    Object,
    Struct,
    Map,
    Complex,
    BigInt,
    Enum,
    Tuple,
    Function,
    File,
    Date,
    Unknown,
    NaN,
    Infinity,
}

impl ParsedType {
    /// Classify a JSON value.
    ///
    /// JSON only ever yields `null`, `bool`, `number`, `string`, `array` and
    /// `object`; the other tags are for callers that build them directly.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ParsedType::Null,
            Value::Bool(_) => ParsedType::Bool,
            Value::Number(_) => ParsedType::Number,
            Value::String(_) => ParsedType::String,
            Value::Array(_) => ParsedType::Array,
            Value::Object(_) => ParsedType::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParsedType::String => "string",
            ParsedType::Number => "number",
            ParsedType::Bool => "bool",
            ParsedType::Null => "null",
            ParsedType::Array => "array",
            ParsedType::Slice => "slice",
            ParsedType::Object => "object",
            ParsedType::Struct => "struct",
            ParsedType::Map => "map",
            ParsedType::Complex => "complex",
            ParsedType::BigInt => "bigint",
            ParsedType::Enum => "enum",
            ParsedType::Tuple => "tuple",
            ParsedType::Function => "function",
            ParsedType::File => "File",
            ParsedType::Date => "Date",
            ParsedType::Unknown => "unknown",
            ParsedType::NaN => "NaN",
            ParsedType::Infinity => "Infinity",
        }
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the runtime type name used in `received` positions.
pub fn parsed_type_name(value: &Value) -> &'static str {
    ParsedType::of(value).as_str()
}

/// Largest array index a path segment may carry.
///
/// Decoded documents are rejected above it, and the tree projection stops
/// descending at larger indices rather than allocating up to them.
pub const MAX_PATH_INDEX: usize = 100_000;

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Segment as a plain string: keys verbatim, indices in decimal.
    pub fn stringify(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }

    /// Decode a segment from its JSON form. Indices must not exceed
    /// [`MAX_PATH_INDEX`].
    pub fn from_value(value: &Value) -> Result<Self, IssueError> {
        match value {
            Value::String(key) => Ok(PathSegment::Key(key.clone())),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| *n <= MAX_PATH_INDEX)
                .map(PathSegment::Index)
                .ok_or_else(|| IssueError::InvalidPathSegment {
                    segment: value.to_string(),
                }),
            other => Err(IssueError::InvalidPathSegment {
                segment: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a value inside the parsed input. Empty means the root.
pub type Path = Vec<PathSegment>;
