//! Row Reconstructor: rebuilds nested records from flat result rows.

use std::collections::BTreeMap;
use std::collections::btree_map;

use compact_str::CompactString;

use crate::error::{Result, SqlDbError};
use crate::plan::{FieldPlan, StripSet, TYPE_FIELD};
use crate::traits::SQLParam;

/// A field of a [`Record`]: a column value or an embedded joined record
#[derive(Clone, Debug, PartialEq)]
pub enum RecordValue<V: SQLParam> {
    Value(V),
    Record(Record<V>),
}

impl<V: SQLParam> RecordValue<V> {
    pub fn as_value(&self) -> Option<&V> {
        match self {
            RecordValue::Value(v) => Some(v),
            RecordValue::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record<V>> {
        match self {
            RecordValue::Record(r) => Some(r),
            RecordValue::Value(_) => None,
        }
    }
}

/// One reconstructed row.
///
/// Keys are column names, plus the reserved `type` key naming the table of
/// origin and one key per joined table holding its nested record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<V: SQLParam> {
    entries: BTreeMap<CompactString, RecordValue<V>>,
}

impl<V: SQLParam> Default for Record<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V: SQLParam> Record<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.entries
            .insert(name.into(), RecordValue::Value(value.into()));
        self
    }

    pub fn with_record(mut self, name: impl Into<CompactString>, record: Record<V>) -> Self {
        self.entries.insert(name.into(), RecordValue::Record(record));
        self
    }

    pub fn get(&self, name: &str) -> Option<&RecordValue<V>> {
        self.entries.get(name)
    }

    /// The column value stored under `name`
    pub fn value(&self, name: &str) -> Option<&V> {
        self.get(name).and_then(RecordValue::as_value)
    }

    /// The joined record stored under `name`
    pub fn record(&self, name: &str) -> Option<&Record<V>> {
        self.get(name).and_then(RecordValue::as_record)
    }

    /// Table this record was read from
    pub fn table(&self) -> Option<&str> {
        self.value(TYPE_FIELD).and_then(SQLParam::as_text)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, CompactString, RecordValue<V>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `name`, returning its value
    pub fn take(&mut self, name: &str) -> Option<RecordValue<V>> {
        self.entries.remove(name)
    }
}

impl<V: SQLParam, K: Into<CompactString>> FromIterator<(K, V)> for Record<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), RecordValue::Value(v)))
                .collect(),
        }
    }
}

impl<V: SQLParam> IntoIterator for Record<V> {
    type Item = (CompactString, RecordValue<V>);
    type IntoIter = btree_map::IntoIter<CompactString, RecordValue<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, V: SQLParam> IntoIterator for &'a Record<V> {
    type Item = (&'a CompactString, &'a RecordValue<V>);
    type IntoIter = btree_map::Iter<'a, CompactString, RecordValue<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(feature = "serde")]
impl<V: SQLParam + serde::Serialize> serde::Serialize for RecordValue<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            RecordValue::Value(v) => v.serialize(serializer),
            RecordValue::Record(r) => r.serialize(serializer),
        }
    }
}

#[cfg(feature = "serde")]
impl<V: SQLParam + serde::Serialize> serde::Serialize for Record<V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

/// Rebuilds one nested record from a flat `row`.
///
/// `plans` must be in the order their columns were selected. Each plan takes
/// the next `plan.len()` values of the row; stripped fields are dropped and
/// every joined table is attached to its parent under its table name.
pub fn reconstruct<V: SQLParam>(
    row: Vec<V>,
    plans: &[FieldPlan],
    strip: &StripSet,
) -> Result<Record<V>> {
    let width: usize = plans.iter().map(FieldPlan::len).sum();
    if row.len() != width {
        return Err(SqlDbError::Structural(format!(
            "row has {} columns but the field plans select {width}",
            row.len()
        )));
    }

    let mut values = row.into_iter();
    let mut records: Vec<Record<V>> = Vec::with_capacity(plans.len());
    for plan in plans {
        let mut record: Record<V> = plan
            .fields
            .iter()
            .cloned()
            .zip(values.by_ref().take(plan.len()))
            .collect();
        for field in strip.get(&plan.path) {
            record.take(field);
        }
        records.push(record);
    }

    // Children always follow their parent, so attaching from the back
    // completes every subtree before it is moved.
    while records.len() > 1 {
        let index = records.len() - 1;
        let plan = &plans[index];
        let parent = plan
            .parent_path()
            .and_then(|parent| plans[..index].iter().rposition(|p| p.path.as_slice() == parent))
            .ok_or_else(|| {
                SqlDbError::Structural(format!(
                    "no parent plan for {}",
                    plan.path.join(".")
                ))
            })?;
        let child = records.pop().unwrap_or_default();
        records[parent]
            .entries
            .insert(CompactString::from(plan.table()), RecordValue::Record(child));
    }

    records
        .pop()
        .ok_or_else(|| SqlDbError::Structural("no field plans".to_string()))
}
