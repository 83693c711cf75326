//! Relational document to Doctrine schema translation.
//!
//! Tables are visited in document order and each child of a table is
//! dispatched on its element name. Anomalies inside a table never abort the
//! run; they are collected as [`Warning`]s next to the schema.

use std::fmt;

use crate::inflector::{camelize, pluralize, relation_alias};
use crate::rdm::{Document, Element};
use crate::schema::{ColumnDef, IndexDef, RelationDef, TableDef, TargetSchema};
use crate::types::map_type;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("Table #{index} has no name attribute")]
    UnnamedTable { index: usize },
}

/// Non-fatal anomaly found while translating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A `foreign-key` without a `reference` child was skipped.
    MissingReference { class: String, foreign_table: String },
    /// A column type outside the mapping table degraded to an empty type.
    UnknownType {
        class: String,
        column: String,
        declared: String,
    },
    /// A later foreign key replaced an earlier relation with the same alias.
    AliasCollision { class: String, alias: String },
    /// Two tables camel-case to the same class; the later one was kept.
    ClassCollision {
        class: String,
        table: String,
        replaced: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReference {
                class,
                foreign_table,
            } => write!(
                f,
                "{class}: foreign key to {foreign_table:?} has no reference, skipped"
            ),
            Self::UnknownType {
                class,
                column,
                declared,
            } => write!(f, "{class}.{column}: unknown column type {declared:?}"),
            Self::AliasCollision { class, alias } => {
                write!(f, "{class}: relation {alias} defined twice, keeping the last one")
            }
            Self::ClassCollision {
                class,
                table,
                replaced,
            } => write!(
                f,
                "tables {replaced:?} and {table:?} both map to class {class}, keeping {table:?}"
            ),
        }
    }
}

/// Result of a translation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub schema: TargetSchema,
    pub warnings: Vec<Warning>,
}

/// Translate every `table` element of `doc` into a Doctrine schema.
pub fn translate(doc: &Document) -> Result<Translation, TranslateError> {
    let mut schema = TargetSchema::new();
    let mut warnings = Vec::new();

    for (index, table) in doc.descendants("table").into_iter().enumerate() {
        let table_name = table
            .attr("name")
            .ok_or(TranslateError::UnnamedTable { index })?;
        let class = camelize(table_name);

        let def = TableTranslator::new(&class, table_name, &mut warnings).translate(table);
        tracing::debug!(
            class = %class,
            columns = def.columns.len(),
            relations = def.relations.len(),
            indexes = def.indexes.len(),
            "translated table {table_name}"
        );

        if let Some(replaced) = schema.insert(class.clone(), def) {
            warnings.push(Warning::ClassCollision {
                class,
                table: table_name.to_string(),
                replaced: replaced.table_name,
            });
        }
    }

    Ok(Translation { schema, warnings })
}

struct TableTranslator<'a> {
    class: &'a str,
    def: TableDef,
    warnings: &'a mut Vec<Warning>,
}

impl<'a> TableTranslator<'a> {
    fn new(class: &'a str, table_name: &str, warnings: &'a mut Vec<Warning>) -> Self {
        Self {
            class,
            def: TableDef::new(table_name),
            warnings,
        }
    }

    fn translate(mut self, table: &Element) -> TableDef {
        for child in table.elements() {
            match child.name.as_str() {
                "column" => self.column(child),
                "foreign-key" => self.foreign_key(child),
                "unique" => self.unique(child),
                _ => {}
            }
        }
        self.def
    }

    fn column(&mut self, node: &Element) {
        let name = node.attr_or_empty("name");
        let declared = node.attr_or_empty("type");

        let resolved = map_type(declared, node.attr("size"));
        if resolved.typ.is_empty() {
            self.warnings.push(Warning::UnknownType {
                class: self.class.to_string(),
                column: name.to_string(),
                declared: declared.to_string(),
            });
        }

        let mut column = ColumnDef::new(resolved.typ);
        column.size = resolved.size;
        column.default = node.attr("default").map(str::to_string);
        column.notnull = node.attr_or_empty("required") == "true";
        column.primary = node.attr_or_empty("primaryKey") == "true";
        column.autoincrement = node.attr_or_empty("autoIncrement") == "true";

        self.def.columns.insert(name.to_string(), column);
    }

    fn foreign_key(&mut self, node: &Element) {
        let foreign_table = node.attr_or_empty("foreignTable");
        let Some(reference) = node.first_child("reference") else {
            self.warnings.push(Warning::MissingReference {
                class: self.class.to_string(),
                foreign_table: foreign_table.to_string(),
            });
            return;
        };

        let foreign_class = camelize(foreign_table);
        let local = reference.attr_or_empty("local");
        let on_delete = match node.attr_or_empty("onDelete") {
            "setnull" => "null",
            action => action,
        };
        let alias = relation_alias(local, &foreign_class);

        let relation = RelationDef {
            class: foreign_class,
            foreign: reference.attr_or_empty("foreign").to_string(),
            foreign_alias: pluralize(self.class),
            alias: alias.clone(),
            local: local.to_string(),
            on_delete: on_delete.to_string(),
        };

        if self.def.relations.insert(alias.clone(), relation).is_some() {
            self.warnings.push(Warning::AliasCollision {
                class: self.class.to_string(),
                alias,
            });
        }
    }

    fn unique(&mut self, node: &Element) {
        let fields = node
            .elements()
            .filter(|e| e.name == "unique-column")
            .map(|e| e.attr_or_empty("name").to_string())
            .collect();

        self.def
            .indexes
            .insert(node.attr_or_empty("name").to_string(), IndexDef::unique(fields));
    }
}
