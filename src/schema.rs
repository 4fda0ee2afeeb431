//! Model snapshot of the blogging schema and verification of a live database
//! against it.
//!
//! The snapshot is the declarative counterpart of `migrations/`: for every
//! entity it records the mapped table, the properties with their store type,
//! whether they are required and whether the store generates them on insert,
//! the primary key and the foreign keys. The `existing` variant relies on it
//! to confirm that a database created elsewhere has the shape the
//! repositories expect.

use crate::db::Pool;
use crate::model::SchemaVariant;
use sqlx::Row;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Integer,
    Text,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Integer => "INTEGER",
            StoreType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehavior {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
}

impl DeleteBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteBehavior::Cascade => "CASCADE",
            DeleteBehavior::Restrict => "RESTRICT",
            DeleteBehavior::SetNull => "SET NULL",
            DeleteBehavior::NoAction => "NO ACTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySnapshot {
    pub name: &'static str,
    pub store_type: StoreType,
    pub required: bool,
    pub value_generated_on_add: bool,
}

impl PropertySnapshot {
    fn key(name: &'static str) -> Self {
        Self {
            name,
            store_type: StoreType::Integer,
            required: true,
            value_generated_on_add: true,
        }
    }

    fn integer(name: &'static str) -> Self {
        Self {
            name,
            store_type: StoreType::Integer,
            required: true,
            value_generated_on_add: false,
        }
    }

    fn text(name: &'static str, required: bool) -> Self {
        Self {
            name,
            store_type: StoreType::Text,
            required,
            value_generated_on_add: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySnapshot {
    pub property: &'static str,
    pub principal_entity: &'static str,
    pub principal_table: &'static str,
    pub principal_key: &'static str,
    pub on_delete: DeleteBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub name: &'static str,
    pub table: &'static str,
    pub properties: Vec<PropertySnapshot>,
    pub primary_key: &'static str,
    pub foreign_keys: Vec<ForeignKeySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSnapshot {
    pub variant: SchemaVariant,
    pub entities: Vec<EntitySnapshot>,
}

impl ModelSnapshot {
    pub fn entity(&self, name: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.name == name)
    }
}

pub fn model_snapshot(variant: SchemaVariant) -> ModelSnapshot {
    let blog = EntitySnapshot {
        name: "Blog",
        table: variant.blog_table(),
        properties: vec![
            PropertySnapshot::key("BlogId"),
            PropertySnapshot::text("Url", true),
        ],
        primary_key: "BlogId",
        foreign_keys: Vec::new(),
    };
    let post = EntitySnapshot {
        name: "Post",
        table: variant.post_table(),
        properties: vec![
            PropertySnapshot::key("PostId"),
            PropertySnapshot::integer("BlogId"),
            PropertySnapshot::text("Content", false),
            PropertySnapshot::text("Title", false),
        ],
        primary_key: "PostId",
        foreign_keys: vec![ForeignKeySnapshot {
            property: "BlogId",
            principal_entity: "Blog",
            principal_table: variant.blog_table(),
            principal_key: "BlogId",
            on_delete: DeleteBehavior::Cascade,
        }],
    };
    ModelSnapshot {
        variant,
        entities: vec![blog, post],
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table {table} not found")]
    MissingTable { table: String },
    #[error("column {table}.{column} not found")]
    MissingColumn { table: String, column: String },
    #[error("column {table}.{column} has type {found}, expected {expected}")]
    WrongType {
        table: String,
        column: String,
        expected: &'static str,
        found: String,
    },
    #[error("column {table}.{column} nullability mismatch (required = {required})")]
    Nullability {
        table: String,
        column: String,
        required: bool,
    },
    #[error("table {table} primary key is not {column}")]
    PrimaryKey { table: String, column: String },
    #[error("column {table}.{column} is not generated on insert")]
    NotGenerated { table: String, column: String },
    #[error("foreign key {table}.{column} -> {principal} not found")]
    MissingForeignKey {
        table: String,
        column: String,
        principal: String,
    },
    #[error("foreign key {table}.{column} deletes with {found}, expected {expected}")]
    DeleteBehavior {
        table: String,
        column: String,
        expected: &'static str,
        found: String,
    },
    #[error("schema query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for SchemaError {
    fn from(err: sqlx::Error) -> Self {
        SchemaError::Query(err.to_string())
    }
}

#[derive(Debug, Clone)]
struct ColumnInfo {
    name: String,
    declared_type: String,
    not_null: bool,
    pk: bool,
}

#[derive(Debug, Clone)]
struct ForeignKeyInfo {
    table: String,
    from: String,
    to: String,
    on_delete: String,
}

async fn table_columns(pool: &Pool, table: &str) -> Result<Vec<ColumnInfo>, SchemaError> {
    let rows = sqlx::query(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?)"#)
        .bind(table)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| ColumnInfo {
            name: row.get("name"),
            declared_type: row.get("type"),
            not_null: row.get::<i64, _>("notnull") != 0,
            pk: row.get::<i64, _>("pk") != 0,
        })
        .collect())
}

async fn table_foreign_keys(pool: &Pool, table: &str) -> Result<Vec<ForeignKeyInfo>, SchemaError> {
    let rows =
        sqlx::query(r#"SELECT "table", "from", "to", on_delete FROM pragma_foreign_key_list(?)"#)
            .bind(table)
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|row| ForeignKeyInfo {
            table: row.get("table"),
            from: row.get("from"),
            to: row.get::<Option<String>, _>("to").unwrap_or_default(),
            on_delete: row.get("on_delete"),
        })
        .collect())
}

/// Check the live database against `snapshot`, returning the first mismatch.
#[instrument(skip_all, fields(variant = %snapshot.variant))]
pub async fn verify(pool: &Pool, snapshot: &ModelSnapshot) -> Result<(), SchemaError> {
    for entity in &snapshot.entities {
        let columns = table_columns(pool, entity.table).await?;
        if columns.is_empty() {
            return Err(SchemaError::MissingTable {
                table: entity.table.to_string(),
            });
        }

        for prop in &entity.properties {
            let col = columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(prop.name))
                .ok_or_else(|| SchemaError::MissingColumn {
                    table: entity.table.to_string(),
                    column: prop.name.to_string(),
                })?;

            if !col.declared_type.eq_ignore_ascii_case(prop.store_type.as_str()) {
                return Err(SchemaError::WrongType {
                    table: entity.table.to_string(),
                    column: prop.name.to_string(),
                    expected: prop.store_type.as_str(),
                    found: col.declared_type.clone(),
                });
            }

            // An INTEGER PRIMARY KEY is the rowid and can never hold NULL,
            // whatever `notnull` says.
            let effectively_required = col.not_null || (col.pk && prop.value_generated_on_add);
            if effectively_required != prop.required {
                return Err(SchemaError::Nullability {
                    table: entity.table.to_string(),
                    column: prop.name.to_string(),
                    required: prop.required,
                });
            }

            if prop.value_generated_on_add && !col.pk {
                return Err(SchemaError::NotGenerated {
                    table: entity.table.to_string(),
                    column: prop.name.to_string(),
                });
            }
        }

        let pk_columns: Vec<&ColumnInfo> = columns.iter().filter(|c| c.pk).collect();
        if pk_columns.len() != 1 || !pk_columns[0].name.eq_ignore_ascii_case(entity.primary_key) {
            return Err(SchemaError::PrimaryKey {
                table: entity.table.to_string(),
                column: entity.primary_key.to_string(),
            });
        }

        if entity.foreign_keys.is_empty() {
            continue;
        }
        let live_fks = table_foreign_keys(pool, entity.table).await?;
        for fk in &entity.foreign_keys {
            let live = live_fks
                .iter()
                .find(|l| {
                    l.from.eq_ignore_ascii_case(fk.property)
                        && l.table.eq_ignore_ascii_case(fk.principal_table)
                        // an omitted target column means the principal's primary key
                        && (l.to.is_empty() || l.to.eq_ignore_ascii_case(fk.principal_key))
                })
                .ok_or_else(|| SchemaError::MissingForeignKey {
                    table: entity.table.to_string(),
                    column: fk.property.to_string(),
                    principal: format!("{}.{}", fk.principal_table, fk.principal_key),
                })?;
            if !live.on_delete.eq_ignore_ascii_case(fk.on_delete.as_str()) {
                return Err(SchemaError::DeleteBehavior {
                    table: entity.table.to_string(),
                    column: fk.property.to_string(),
                    expected: fk.on_delete.as_str(),
                    found: live.on_delete.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Human-readable listing of a snapshot, one entity per block.
pub fn describe(snapshot: &ModelSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model ({} schema)", snapshot.variant);
    for entity in &snapshot.entities {
        let _ = writeln!(out, "Entity {} -> table \"{}\"", entity.name, entity.table);
        for p in &entity.properties {
            let mut flags = Vec::new();
            if p.required {
                flags.push("required");
            }
            if p.value_generated_on_add {
                flags.push("generated on add");
            }
            if p.name == entity.primary_key {
                flags.push("key");
            }
            let _ = writeln!(
                out,
                "  {} {}{}",
                p.name,
                p.store_type.as_str(),
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", flags.join(", "))
                }
            );
        }
        for fk in &entity.foreign_keys {
            let _ = writeln!(
                out,
                "  FK {} -> {}.{} on delete {}",
                fk.property,
                fk.principal_entity,
                fk.principal_key,
                fk.on_delete.as_str()
            );
        }
    }
    out
}
