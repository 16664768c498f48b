//! Collections of records and their deduplication.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ops::Index;

use serde_json::Value as Json;

use crate::{ContextualRange, Record};

/// Added to confidences before dividing distances by them.
pub const CONFIDENCE_EPSILON: f64 = 0.01;

/// An ordered collection of extracted records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordList {
    records: Vec<Record>,
}

impl RecordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn retain(&mut self, keep: impl FnMut(&Record) -> bool) {
        self.records.retain(keep);
    }

    pub fn serialize(&self) -> Json {
        Json::Array(self.records.iter().map(Record::serialize).collect())
    }

    pub fn to_json(&self) -> String {
        self.serialize().to_string()
    }

    /// Drop records that are subsets of another record of the same type.
    ///
    /// Within each type, records are ranked by total confidence (highest
    /// first, ties in encounter order) and a record is removed when it is a
    /// subset of one that has not been removed. With `strict`, identical
    /// records are all kept; otherwise one of each is.
    pub fn remove_subsets(&mut self, strict: bool) {
        let mut groups: Vec<Vec<Record>> = Vec::new();
        for record in self.records.drain(..) {
            match groups
                .iter_mut()
                .find(|group| group[0].schema().same_type(record.schema()))
            {
                Some(group) => group.push(record),
                None => groups.push(vec![record]),
            }
        }

        for mut group in groups {
            group.sort_by(|lhs, rhs| {
                rhs.total_confidence()
                    .partial_cmp(&lhs.total_confidence())
                    .unwrap_or(Ordering::Equal)
            });
            let mut removed = vec![false; group.len()];
            for i in 0..group.len() {
                for j in 0..group.len() {
                    if i == j || removed[j] || !group[i].is_subset(&group[j]) {
                        continue;
                    }
                    if strict && group[i] == group[j] {
                        continue;
                    }
                    removed[i] = true;
                }
            }
            self.records.extend(
                group
                    .into_iter()
                    .zip(removed)
                    .filter(|(_, removed)| !removed)
                    .map(|(record, _)| record),
            );
        }
    }

    /// Drop top-level records that already appear nested inside another.
    pub fn remove_used_subrecords(&mut self) {
        let used: Vec<Record> = self
            .records
            .iter()
            .flat_map(|record| record.flatten_instance().into_iter().skip(1).cloned())
            .collect();
        self.records.retain(|record| !used.contains(record));
    }
}

impl Index<usize> for RecordList {
    type Output = Record;

    fn index(&self, idx: usize) -> &Record {
        &self.records[idx]
    }
}

impl From<Vec<Record>> for RecordList {
    fn from(records: Vec<Record>) -> Self {
        RecordList { records }
    }
}

impl FromIterator<Record> for RecordList {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        RecordList {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<Record> for RecordList {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for RecordList {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Order merge candidates closest first. With `adjust_by_confidence`, each
/// distance is divided by `confidence + epsilon` so confident candidates
/// count as nearer.
pub fn sort_merge_candidates<R: Borrow<Record>>(
    candidates: &mut [(ContextualRange, R)],
    adjust_by_confidence: bool,
    epsilon: f64,
) {
    let key = |(distance, record): &(ContextualRange, R)| {
        if adjust_by_confidence {
            *distance * (1.0 / (record.borrow().total_confidence() + epsilon))
        } else {
            *distance
        }
    };
    candidates.sort_by(|lhs, rhs| key(lhs).partial_cmp(&key(rhs)).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, FieldKind, Schema, SchemaRef, Value};

    fn compound() -> SchemaRef {
        Schema::builder("Compound")
            .field(Field::set("names", FieldKind::String))
            .field(Field::set("labels", FieldKind::String))
            .build()
            .unwrap()
    }

    fn labelled(schema: &SchemaRef, labels: &[&str], names: &[&str], confidence: f64) -> Record {
        let mut record = Record::from_values(
            schema,
            [("labels", Value::set(labels.iter().copied())), ("names", Value::set(names.iter().copied()))],
        )
        .unwrap();
        record.set_confidence("self", confidence).unwrap();
        record
    }

    #[test]
    fn subsets_of_more_confident_records_are_removed() {
        let compound = compound();
        let x = labelled(&compound, &["1"], &["DMAC-TRZ"], 0.9);
        let y = labelled(&compound, &["1"], &[], 0.5);
        let mut list = RecordList::from(vec![y, x.clone()]);
        list.remove_subsets(false);
        assert_eq!(list.records(), &[x]);
    }

    #[test]
    fn identical_records_survive_strict_removal() {
        let compound = compound();
        let a = labelled(&compound, &["1"], &[], 0.5);
        let b = labelled(&compound, &["1"], &[], 0.5);
        let mut strict = RecordList::from(vec![a.clone(), b.clone()]);
        strict.remove_subsets(true);
        assert_eq!(strict.len(), 2);

        let mut loose = RecordList::from(vec![a, b]);
        loose.remove_subsets(false);
        assert_eq!(loose.len(), 1);
    }

    #[test]
    fn types_are_deduplicated_separately() {
        let compound = compound();
        let other = Schema::builder("Solvent")
            .field(Field::set("names", FieldKind::String))
            .field(Field::set("labels", FieldKind::String))
            .build()
            .unwrap();
        let mut list = RecordList::from(vec![
            labelled(&compound, &["1"], &[], 0.5),
            labelled(&other, &["1"], &[], 0.5),
        ]);
        list.remove_subsets(false);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn used_subrecords_are_removed() {
        let compound = compound();
        let schema = Schema::builder("Yield")
            .field(Field::string("raw_value"))
            .field(Field::model("compound", &compound))
            .build()
            .unwrap();
        let found = labelled(&compound, &["4"], &[], 1.0);
        let mut measured = Record::from_values(&schema, [("raw_value", "0.5")]).unwrap();
        measured.set("compound", found.clone()).unwrap();
        let mut list = RecordList::from(vec![found, measured.clone()]);
        list.remove_used_subrecords();
        assert_eq!(list.records(), &[measured]);
    }

    #[test]
    fn candidates_ranked_by_adjusted_distance() {
        let compound = compound();
        let near_doubtful = labelled(&compound, &["1"], &[], 0.1);
        let far_confident = labelled(&compound, &["2"], &[], 0.99);
        let mut candidates = vec![
            (ContextualRange::sentences(1.0), &near_doubtful),
            (ContextualRange::sentences(3.0), &far_confident),
        ];
        sort_merge_candidates(&mut candidates, true, CONFIDENCE_EPSILON);
        assert!(std::ptr::eq(candidates[0].1, &far_confident));

        sort_merge_candidates(&mut candidates, false, CONFIDENCE_EPSILON);
        assert!(std::ptr::eq(candidates[0].1, &near_doubtful));
    }
}
