// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed attribute records attached to a layer's shapes.
//!
//! This is a thin row store: record `i` describes shape `i`. It exists so the
//! classifier and the output composer have something typed to read; it is not
//! a general data-table engine.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// One row of attributes.
pub type Record = FxHashMap<String, Value>;

static NULL: Value = Value::Null;

/// Row-indexed attribute table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeTable {
    fields: Vec<String>,
    records: Vec<Record>,
}

impl AttributeTable {
    /// Creates a table from records. The field list is the union of record
    /// keys in order of first appearance.
    pub fn new(records: Vec<Record>) -> Self {
        let mut fields: Vec<String> = Vec::new();
        for rec in &records {
            let mut keys: Vec<&String> = rec.keys().collect();
            keys.sort();
            for k in keys {
                if !fields.contains(k) {
                    fields.push(k.clone());
                }
            }
        }
        Self { fields, records }
    }

    /// Creates a table with an explicit field list.
    pub fn with_fields(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self { fields, records }
    }

    /// Builds a table from rows of `(field, value)` pairs.
    pub fn from_rows<K, V>(rows: Vec<Vec<(K, V)>>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut fields: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut rec = Record::default();
            for (k, v) in row {
                let k = k.into();
                if !fields.contains(&k) {
                    fields.push(k.clone());
                }
                rec.insert(k, v.into());
            }
            records.push(rec);
        }
        Self { fields, records }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the value of `field` in row `row`, or `Null` when the row or
    /// the field is absent.
    pub fn get(&self, row: usize, field: &str) -> &Value {
        self.records
            .get(row)
            .and_then(|rec| rec.get(field))
            .unwrap_or(&NULL)
    }
}
