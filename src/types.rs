//! Source column type to Doctrine type mapping.

use crate::schema::ColumnSize;

/// Column types the modeler export declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Integer,
    String,
    Char,
    Text,
    Timestamp,
    Date,
    Datetime,
    Float,
    Boolean,
    Unknown,
}

/// Doctrine type plus the size the mapping rule yields, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub typ: &'static str,
    pub size: Option<ColumnSize>,
}

const DEFAULT_INTEGER_SIZE: u32 = 4;
const CHAR_SIZE: u32 = 1;
const TEXT_SIZE: u32 = 4000;

impl SourceType {
    /// Tokens are matched exactly; anything else is `Unknown`.
    pub fn from_str(s: &str) -> Self {
        match s {
            "INTEGER" => Self::Integer,
            "STRING" => Self::String,
            "CHAR" => Self::Char,
            "TEXT" => Self::Text,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "DATETIME" => Self::Datetime,
            "FLOAT" => Self::Float,
            "BOOLEAN" => Self::Boolean,
            _ => Self::Unknown,
        }
    }

    pub fn doctrine_type(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String | Self::Char | Self::Text => "string",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Unknown => "",
        }
    }

    /// Size for a column of this type given its `size` attribute.
    pub fn size(self, declared: Option<&str>) -> Option<ColumnSize> {
        match self {
            Self::Integer => match declared {
                Some(s) if !s.is_empty() && s != "0" => Some(ColumnSize::Declared(s.to_string())),
                _ => Some(ColumnSize::Fixed(DEFAULT_INTEGER_SIZE)),
            },
            // A missing attribute reads as the empty string.
            Self::String => Some(ColumnSize::Declared(
                declared.unwrap_or_default().to_string(),
            )),
            Self::Char => Some(ColumnSize::Fixed(CHAR_SIZE)),
            Self::Text => Some(ColumnSize::Fixed(TEXT_SIZE)),
            _ => None,
        }
    }

    pub fn resolve(self, declared_size: Option<&str>) -> ResolvedType {
        ResolvedType {
            typ: self.doctrine_type(),
            size: self.size(declared_size),
        }
    }
}

/// Map a declared type and size to the Doctrine type and size.
pub fn map_type(declared: &str, declared_size: Option<&str>) -> ResolvedType {
    SourceType::from_str(declared).resolve(declared_size)
}
