//! Doctrine schema model produced by the translator.
//!
//! Every optional field defaults to absent and is left out of the rendered
//! YAML. Maps are insertion-ordered so output follows source order.

use indexmap::IndexMap;
use serde::Serialize;

/// Class name -> table definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TargetSchema {
    classes: IndexMap<String, TableDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDef {
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub columns: IndexMap<String, ColumnDef>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub relations: IndexMap<String, RelationDef>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub indexes: IndexMap<String, IndexDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ColumnSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub notnull: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub primary: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub autoincrement: bool,
}

/// Declared sizes are copied verbatim; fixed sizes come from the type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnSize {
    Declared(String),
    Fixed(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationDef {
    pub class: String,
    pub foreign: String,
    #[serde(rename = "foreignAlias")]
    pub foreign_alias: String,
    pub alias: String,
    pub local: String,
    #[serde(rename = "onDelete")]
    pub on_delete: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDef {
    pub fields: Vec<String>,
    #[serde(rename = "type")]
    pub kind: IndexKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Unique,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl TargetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table, returning the definition it replaced, if any.
    pub fn insert(&mut self, class: String, table: TableDef) -> Option<TableDef> {
        self.classes.insert(class, table)
    }

    pub fn get(&self, class: &str) -> Option<&TableDef> {
        self.classes.get(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TableDef)> {
        self.classes.iter()
    }
}

impl TableDef {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: IndexMap::new(),
            relations: IndexMap::new(),
            indexes: IndexMap::new(),
        }
    }
}

impl ColumnDef {
    pub fn new(typ: impl Into<String>) -> Self {
        Self {
            typ: typ.into(),
            size: None,
            default: None,
            notnull: false,
            primary: false,
            autoincrement: false,
        }
    }
}

impl IndexDef {
    pub fn unique(fields: Vec<String>) -> Self {
        Self {
            fields,
            kind: IndexKind::Unique,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_defaults_absent() {
        let col = ColumnDef::new("date");
        assert_eq!(col.size, None);
        assert_eq!(col.default, None);
        assert!(!col.notnull && !col.primary && !col.autoincrement);
    }

    #[test]
    fn test_insert_reports_replaced() {
        let mut schema = TargetSchema::new();
        assert!(schema.insert("User".into(), TableDef::new("user")).is_none());
        let previous = schema.insert("User".into(), TableDef::new("_user"));
        assert_eq!(previous.unwrap().table_name, "user");
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("User").unwrap().table_name, "_user");
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let mut schema = TargetSchema::new();
        for class in ["Zebra", "Apple", "Mango"] {
            schema.insert(class.into(), TableDef::new(class.to_lowercase()));
        }
        let classes: Vec<&str> = schema.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(classes, vec!["Zebra", "Apple", "Mango"]);
    }
}
