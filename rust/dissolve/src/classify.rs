// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assignment of shapes to dissolve groups.
//!
//! A group key is the tuple of a shape's values in the dissolve fields,
//! normalized so that equality is exact and typed: `Null` is its own value,
//! distinct from `""`, `"null"` or `0`, and numbers compare by value
//! regardless of whether they were stored as integers or doubles.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::table::Value;

/// A normalized field value usable as (part of) a hash key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum KeyValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Non-integral double, by bit pattern (NaNs collapsed to one pattern).
    Float(u64),
    String(String),
}

impl KeyValue {
    /// Normalizes an attribute value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeyValue::Null,
            Value::Bool(b) => KeyValue::Bool(*b),
            Value::Int(i) => KeyValue::Int(*i),
            Value::Double(d) => Self::from_double(*d),
            Value::String(s) => KeyValue::String(s.clone()),
        }
    }

    fn from_double(d: f64) -> Self {
        if d.is_nan() {
            return KeyValue::Float(f64::NAN.to_bits());
        }
        // 2^63 as f64; integral doubles in range collapse onto Int
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if d.fract() == 0.0 && d >= -LIMIT && d < LIMIT {
            return KeyValue::Int(d as i64);
        }
        KeyValue::Float(d.to_bits())
    }

    /// Converts back to an attribute value.
    pub fn to_value(&self) -> Value {
        match self {
            KeyValue::Null => Value::Null,
            KeyValue::Bool(b) => Value::Bool(*b),
            KeyValue::Int(i) => Value::Int(*i),
            KeyValue::Float(bits) => Value::Double(f64::from_bits(*bits)),
            KeyValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => f.write_str("null"),
            KeyValue::Bool(b) => write!(f, "{b}"),
            KeyValue::Int(i) => write!(f, "{i}"),
            KeyValue::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            KeyValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Composite dissolve key. The empty key is the single group used when no
/// dissolve fields are given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey(pub Vec<KeyValue>);

impl GroupKey {
    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("0");
        }
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Maps every shape of a layer to a dissolve group.
///
/// Groups are numbered densely in order of first appearance by shape index,
/// which is also the order dissolve output is produced in.
///
/// # Example
///
/// ```
/// use dissolve_lite::{AttributeTable, Classifier, Layer, Value};
///
/// let layer = Layer::polygons(vec![None, None, None]).with_data(AttributeTable::from_rows(vec![
///     vec![("state", Value::from("CA"))],
///     vec![("state", Value::from("NV"))],
///     vec![("state", Value::from("CA"))],
/// ]));
/// let classifier = Classifier::new(&["state".to_string()], &layer).unwrap();
///
/// assert_eq!(classifier.group_count(), 2);
/// assert_eq!(classifier.group_index(0), classifier.group_index(2));
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    fields: Vec<String>,
    keys: Vec<GroupKey>,
    shape_groups: Vec<usize>,
}

impl Classifier {
    /// Builds the classifier for a layer.
    ///
    /// Returns [`Error::MissingField`] if a dissolve field is absent from the
    /// attribute table (or the layer has no table at all).
    pub fn new(fields: &[String], layer: &Layer) -> Result<Self> {
        let n = layer.shape_count();
        if fields.is_empty() {
            return Ok(Self {
                fields: Vec::new(),
                keys: if n > 0 { vec![GroupKey::default()] } else { Vec::new() },
                shape_groups: vec![0; n],
            });
        }

        let table = match &layer.data {
            Some(t) => t,
            None => return Err(Error::MissingField(fields[0].clone())),
        };
        if let Some(missing) = fields.iter().find(|f| !table.has_field(f)) {
            return Err(Error::MissingField(missing.clone()));
        }

        let mut classifier = Self::from_fn(n, |row| {
            GroupKey(
                fields
                    .iter()
                    .map(|f| KeyValue::from_value(table.get(row, f)))
                    .collect(),
            )
        });
        classifier.fields = fields.to_vec();
        Ok(classifier)
    }

    /// Builds a classifier from a caller-supplied key for each of
    /// `shape_count` shapes.
    ///
    /// Groups are numbered in order of first appearance. The classifier has
    /// no dissolve fields, so [`KeyFieldComposer`](crate::KeyFieldComposer)
    /// writes no attributes for it.
    pub fn from_fn<F>(shape_count: usize, key_of: F) -> Self
    where
        F: Fn(usize) -> GroupKey,
    {
        let mut index: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut keys = Vec::new();
        let mut shape_groups = Vec::with_capacity(shape_count);
        for shape in 0..shape_count {
            let key = key_of(shape);
            let next = keys.len();
            let group = *index.entry(key.clone()).or_insert(next);
            if group == next {
                keys.push(key);
            }
            shape_groups.push(group);
        }

        Self {
            fields: Vec::new(),
            keys,
            shape_groups,
        }
    }

    /// The dissolve fields, in key order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Dense group index of a shape.
    pub fn group_index(&self, shape: usize) -> usize {
        self.shape_groups[shape]
    }

    /// Group key of a shape.
    pub fn group_key(&self, shape: usize) -> &GroupKey {
        &self.keys[self.shape_groups[shape]]
    }

    /// Key of a group by its dense index.
    pub fn key(&self, group: usize) -> &GroupKey {
        &self.keys[group]
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    pub fn group_count(&self) -> usize {
        self.keys.len()
    }

    /// Shape ids of every group, in group order.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.keys.len()];
        for (shape, &g) in self.shape_groups.iter().enumerate() {
            groups[g].push(shape);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::AttributeTable;

    fn layer(rows: Vec<Vec<(&str, Value)>>) -> Layer {
        let n = rows.len();
        Layer::polygons(vec![None; n]).with_data(AttributeTable::from_rows(rows))
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_fields_is_one_group() {
        let lyr = Layer::polygons(vec![None, None, None]);
        let c = Classifier::new(&[], &lyr).unwrap();
        assert_eq!(c.group_count(), 1);
        assert_eq!(c.group_key(2), &GroupKey::default());
        assert_eq!(c.groups(), vec![vec![0, 1, 2]]);
        assert_eq!(c.key(0).to_string(), "0");
    }

    #[test]
    fn same_state_same_group_regardless_of_order() {
        let lyr = layer(vec![
            vec![("state", Value::from("CA"))],
            vec![("state", Value::from("OR"))],
            vec![("state", Value::from("CA"))],
        ]);
        let c = Classifier::new(&fields(&["state"]), &lyr).unwrap();
        assert_eq!(c.group_index(0), c.group_index(2));
        assert_ne!(c.group_index(0), c.group_index(1));
        assert_eq!(c.groups(), vec![vec![0, 2], vec![1]]);

        let reordered = layer(vec![
            vec![("state", Value::from("OR"))],
            vec![("state", Value::from("CA"))],
            vec![("state", Value::from("CA"))],
        ]);
        let c2 = Classifier::new(&fields(&["state"]), &reordered).unwrap();
        assert_eq!(c2.group_index(1), c2.group_index(2));
        assert_eq!(c2.group_key(1), c.group_key(0));
    }

    #[test]
    fn null_groups_with_null_only() {
        let lyr = layer(vec![
            vec![("state", Value::Null)],
            vec![("state", Value::from("null"))],
            vec![("state", Value::from(""))],
            vec![("state", Value::Null)],
        ]);
        let c = Classifier::new(&fields(&["state"]), &lyr).unwrap();
        assert_eq!(c.group_index(0), c.group_index(3));
        assert_ne!(c.group_index(0), c.group_index(1));
        assert_ne!(c.group_index(0), c.group_index(2));
        assert_eq!(c.group_count(), 3);
    }

    #[test]
    fn absent_value_groups_with_null() {
        let lyr = layer(vec![
            vec![("state", Value::from("CA")), ("name", Value::from("a"))],
            vec![("name", Value::from("b"))],
            vec![("state", Value::Null)],
        ]);
        let c = Classifier::new(&fields(&["state"]), &lyr).unwrap();
        assert_eq!(c.group_index(1), c.group_index(2));
    }

    #[test]
    fn integral_doubles_match_integers() {
        let lyr = layer(vec![
            vec![("code", Value::Int(3))],
            vec![("code", Value::Double(3.0))],
            vec![("code", Value::Double(3.5))],
            vec![("code", Value::Double(-0.0))],
            vec![("code", Value::Int(0))],
        ]);
        let c = Classifier::new(&fields(&["code"]), &lyr).unwrap();
        assert_eq!(c.group_index(0), c.group_index(1));
        assert_ne!(c.group_index(0), c.group_index(2));
        assert_eq!(c.group_index(3), c.group_index(4));
    }

    #[test]
    fn composite_keys() {
        let lyr = layer(vec![
            vec![("a", Value::from("x")), ("b", Value::Int(1))],
            vec![("a", Value::from("x")), ("b", Value::Int(2))],
            vec![("a", Value::from("x")), ("b", Value::Int(1))],
        ]);
        let c = Classifier::new(&fields(&["a", "b"]), &lyr).unwrap();
        assert_eq!(c.group_count(), 2);
        assert_eq!(c.group_key(0).to_string(), "\"x\"|1");
    }

    #[test]
    fn missing_field_is_an_error() {
        let lyr = layer(vec![vec![("state", Value::from("CA"))]]);
        let err = Classifier::new(&fields(&["county"]), &lyr).unwrap_err();
        assert!(matches!(err, Error::MissingField(f) if f == "county"));

        let bare = Layer::polygons(vec![None]);
        assert!(matches!(
            Classifier::new(&fields(&["state"]), &bare),
            Err(Error::MissingField(_))
        ));
    }

    #[test]
    fn computed_keys_group_in_first_appearance_order() {
        let c = Classifier::from_fn(5, |shape| {
            GroupKey(vec![KeyValue::Int((shape % 3) as i64 / 2)])
        });
        // keys: 0, 0, 1, 0, 0
        assert_eq!(c.group_count(), 2);
        assert_eq!(c.groups(), vec![vec![0, 1, 3, 4], vec![2]]);
        assert_eq!(c.key(1), &GroupKey(vec![KeyValue::Int(1)]));
        assert!(c.fields().is_empty());
        assert_eq!(Classifier::from_fn(0, |_| GroupKey::default()).group_count(), 0);
    }

    #[test]
    fn key_value_round_trips_to_value() {
        assert_eq!(KeyValue::from_value(&Value::Double(2.5)).to_value(), Value::Double(2.5));
        assert_eq!(KeyValue::from_value(&Value::Double(2.0)).to_value(), Value::Int(2));
    }
}
