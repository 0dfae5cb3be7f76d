//! # Field Shaping
//!
//! Each result type has a static projection table of public field name →
//! accessor. A `fields` list is validated against that table into a
//! [`FieldSelection`]; shaping then emits exactly the selected fields in
//! the order they were requested.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde_json::{Map, Value};

use super::errors::ValidationError;

/// One output field of `T`
pub struct FieldAccessor<T> {
    pub name: &'static str,
    pub get: fn(&T) -> Value,
}

/// The output fields of `T`, in declaration order
pub struct Projection<T: 'static> {
    fields: &'static [FieldAccessor<T>],
}

impl<T: 'static> Projection<T> {
    pub const fn new(fields: &'static [FieldAccessor<T>]) -> Self {
        Self { fields }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Validate a comma-separated field list.
    ///
    /// `None` or a blank list selects every field. Unknown names fail with
    /// all of them listed; repeated names keep their first position.
    pub fn select(&self, list: Option<&str>) -> Result<FieldSelection<T>, ValidationError> {
        let Some(list) = list.map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(FieldSelection::all());
        };

        let mut indices = Vec::new();
        let mut invalid = BTreeSet::new();

        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match self.position(name) {
                Some(index) if !indices.contains(&index) => indices.push(index),
                Some(_) => {}
                None => {
                    invalid.insert(name.to_string());
                }
            }
        }

        if !invalid.is_empty() {
            return Err(ValidationError::InvalidShapeField(invalid.into_iter().collect()));
        }

        Ok(FieldSelection {
            indices: Some(indices),
            _marker: PhantomData,
        })
    }

    /// Build the output object for one record
    pub fn shape(&self, record: &T, selection: &FieldSelection<T>) -> Value {
        let mut object = Map::new();

        match &selection.indices {
            None => {
                for field in self.fields {
                    object.insert(field.name.to_string(), (field.get)(record));
                }
            }
            Some(indices) => {
                for field in indices.iter().filter_map(|i| self.fields.get(*i)) {
                    object.insert(field.name.to_string(), (field.get)(record));
                }
            }
        }

        Value::Object(object)
    }
}

/// A field list already checked against `Projection<T>`
pub struct FieldSelection<T> {
    indices: Option<Vec<usize>>,
    _marker: PhantomData<fn(&T)>,
}

impl<T> FieldSelection<T> {
    pub fn all() -> Self {
        Self {
            indices: None,
            _marker: PhantomData,
        }
    }

    pub fn is_all(&self) -> bool {
        self.indices.is_none()
    }
}

impl<T> Clone for FieldSelection<T> {
    fn clone(&self) -> Self {
        Self {
            indices: self.indices.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for FieldSelection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSelection")
            .field("indices", &self.indices)
            .finish()
    }
}
