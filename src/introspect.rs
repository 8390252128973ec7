//! Read a record (or collection) through its description.

use crate::error::OrmError;
use crate::model::{PRIMARY_KEY, Record, Schema, Shape, Target};
use crate::types::SqlValue;

/// What a write or read needs to know about the value it was handed.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub schema: Schema,
    pub shape: Shape,
    /// Columns whose field holds a non-zero value, in declaration order
    pub attributes: Vec<String>,
    /// Values of `attributes`, parallel to it
    pub args: Vec<SqlValue>,
    /// Value of the `id` column, when set
    pub primary_key: Option<SqlValue>,
}

impl ModelData {
    /// Describe a single record and capture its set fields.
    ///
    /// Zero-valued fields are indistinguishable from unset ones and are left out. Use an
    /// `Option` field when zero is a meaningful value.
    ///
    /// # Errors
    /// Returns `OrmError::InvalidArgument` if the type cannot be described.
    pub fn from_record(record: &dyn Record) -> Result<Self, OrmError> {
        let schema = record.schema()?;
        let mut attributes = Vec::new();
        let mut args = Vec::new();
        let mut primary_key = None;

        for (column, value) in schema.columns.iter().zip(record.attribute_values()) {
            let Some(value) = value else { continue };
            if column.name == PRIMARY_KEY {
                primary_key = Some(value.clone());
            }
            attributes.push(column.name.clone());
            args.push(value);
        }

        Ok(ModelData {
            schema,
            shape: Shape::Single,
            attributes,
            args,
            primary_key,
        })
    }

    /// Describe a read target. Collections only contribute their table and columns.
    ///
    /// # Errors
    /// Returns `OrmError::InvalidArgument` if the type cannot be described.
    pub fn from_target(target: &dyn Target) -> Result<Self, OrmError> {
        match target.as_record() {
            Some(record) => Self::from_record(record),
            None => Ok(ModelData {
                schema: target.schema()?,
                shape: target.shape(),
                attributes: Vec::new(),
                args: Vec::new(),
                primary_key: None,
            }),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.schema.table
    }
}
