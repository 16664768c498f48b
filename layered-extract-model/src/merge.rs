//! Merging partial records found in different parts of a document.
//!
//! Both merge operations mutate the receiving record and report whether
//! anything was filled. An incompatible pair is a `false`, never an error.
//! Fields only ever go from empty to set.

use tracing::debug;

use crate::{ContextualRange, ModelError, ModelResult, Record, Value};

impl Record {
    /// Fill this record's empty contextual fields from `other`.
    ///
    /// `other` is either a record of the same type with no conflicting
    /// fields, or a record of a type nested somewhere in this one, which is
    /// placed into (or merged into) the matching nested field. Every touched
    /// field must have `distance` inside its contextual range and outside
    /// its no-merge range.
    pub fn merge_contextual(&mut self, other: &Record, distance: ContextualRange) -> bool {
        let keep_both = self.should_keep_both(other);
        if self.contextual_fulfilled() {
            return false;
        }
        let mut did_merge = false;
        if self.binding_compatible(other) {
            let schema = self.schema().clone();
            if !schema.same_type(other.schema()) {
                if !schema.contains_type(other.schema()) {
                    return false;
                }
                for (idx, field) in schema.fields().iter().enumerate() {
                    if field.is_never_merged() || !field.is_contextual() {
                        continue;
                    }
                    let fits = |target: &crate::SchemaRef| other.schema().is_instance_of(target);
                    if field.kind().element_schema().map_or(false, fits) {
                        if !self.is_filled_at(idx) && !other.is_empty() && self.in_merge_range(idx, distance) {
                            debug!(into = self.type_name(), field = field.name(), %distance, "merged record into list");
                            did_merge |= self.assign_at(idx, Value::List(vec![other.clone().into()]));
                        }
                    } else if field.kind().model_schema().map_or(false, fits) {
                        if !self.in_merge_range(idx, distance) {
                            continue;
                        }
                        if self.is_filled_at(idx) {
                            if let Some(nested) = self.nested_at_mut(idx) {
                                if !nested.contextual_fulfilled() && nested.merge_contextual(other, distance) {
                                    did_merge = true;
                                }
                            }
                        } else if !other.is_empty() {
                            debug!(into = self.type_name(), field = field.name(), %distance, "merged nested record");
                            did_merge |= self.assign_at(idx, other.clone().into());
                        }
                    }
                }
            } else if self.compatible(other) {
                for (idx, field) in schema.fields().iter().enumerate() {
                    if field.kind().is_inferred()
                        || !field.is_contextual()
                        || field.is_never_merged()
                        || self.is_filled_at(idx)
                        || !self.in_merge_range(idx, distance)
                    {
                        continue;
                    }
                    if let Some(value) = other.filled_at(idx).cloned() {
                        debug!(into = self.type_name(), field = field.name(), %distance, "merged field");
                        self.store(idx, Some(value));
                        self.merge_confidence_at(other, idx);
                        did_merge = true;
                    }
                }
            }
        } else {
            debug!(into = self.type_name(), from = other.type_name(), "binding fields disagree");
        }
        self.consolidate_binding();

        if did_merge {
            self.count_contextual_merge();
            self.merge_self_confidence(other);
            if keep_both {
                debug!(into = self.type_name(), "keeping both records");
                did_merge = false;
            }
        }
        did_merge
    }

    /// Fill any empty field from `other`, contextual or not. Only the
    /// no-merge ranges limit the distance.
    pub fn merge_all(&mut self, other: &Record, distance: ContextualRange) -> bool {
        let keep_both = self.should_keep_both(other);
        let mut did_merge = false;
        if self.binding_compatible(other) {
            let schema = self.schema().clone();
            if !schema.same_type(other.schema()) {
                if !schema.contains_type(other.schema()) {
                    return false;
                }
                for (idx, field) in schema.fields().iter().enumerate() {
                    if field.is_never_merged() || !self.outside_no_merge_range(idx, distance) {
                        continue;
                    }
                    let fits = |target: &crate::SchemaRef| other.schema().is_instance_of(target);
                    if field.kind().element_schema().map_or(false, fits) {
                        if self.is_filled_at(idx) {
                            if let Some(Value::List(items) | Value::Set(items)) = self.raw_value_at_mut(idx) {
                                for nested in items.iter_mut().filter_map(Value::as_record_mut) {
                                    did_merge |= nested.merge_all(other, distance);
                                }
                            }
                        } else if !other.is_empty() {
                            did_merge |= self.assign_at(idx, Value::List(vec![other.clone().into()]));
                        }
                    } else if field.kind().model_schema().map_or(false, fits) {
                        if self.is_filled_at(idx) {
                            if let Some(nested) = self.nested_at_mut(idx) {
                                did_merge |= nested.merge_all(other, distance);
                            }
                        } else if !other.is_empty() {
                            did_merge |= self.assign_at(idx, other.clone().into());
                        }
                    }
                }
            } else if self.compatible(other) {
                for (idx, field) in schema.fields().iter().enumerate() {
                    if field.kind().is_inferred()
                        || field.is_never_merged()
                        || self.is_filled_at(idx)
                        || !self.outside_no_merge_range(idx, distance)
                    {
                        continue;
                    }
                    if let Some(value) = other.filled_at(idx).cloned() {
                        self.store(idx, Some(value));
                        self.merge_confidence_at(other, idx);
                        did_merge = true;
                    }
                }
            }
        }
        self.consolidate_binding();

        if did_merge {
            self.merge_self_confidence(other);
            if keep_both {
                did_merge = false;
            }
        }
        did_merge
    }

    fn assign_at(&mut self, idx: usize, value: Value) -> bool {
        let schema = self.schema().clone();
        let field = &schema.fields()[idx];
        match field.kind().accept(field.name(), value) {
            Ok(value) => {
                self.store(idx, Some(value));
                true
            }
            Err(err) => {
                debug!(%err, "merge skipped an unassignable value");
                false
            }
        }
    }

    /// Keep the lower of the two confidences for `field` (or `"self"`).
    pub fn merge_confidence(&mut self, other: &Record, field: &str) -> ModelResult<()> {
        if field == "self" {
            self.merge_self_confidence(other);
            return Ok(());
        }
        let idx = self.schema().field_index(field).ok_or_else(|| ModelError::UnknownField {
            schema: self.type_name().to_string(),
            field: field.to_string(),
        })?;
        self.merge_confidence_at(other, idx);
        Ok(())
    }

    fn merge_confidence_at(&mut self, other: &Record, idx: usize) {
        if let Some(theirs) = other.raw_confidence_at(idx) {
            let merged = match self.raw_confidence_at(idx) {
                Some(mine) => mine.min(theirs),
                None => theirs,
            };
            self.set_raw_confidence_at(idx, merged);
        }
    }

    fn merge_self_confidence(&mut self, other: &Record) {
        if let Some(theirs) = other.self_confidence() {
            let merged = self.self_confidence().map_or(theirs, |mine| mine.min(theirs));
            self.set_self_confidence(Some(merged));
        }
    }

    /// Same type, and no field that counts for merging holds two different
    /// values. Nested records are compared recursively.
    pub fn compatible(&self, other: &Record) -> bool {
        if !self.schema().same_type(other.schema()) {
            return false;
        }
        for (idx, field) in self.schema().fields().iter().enumerate() {
            if field.is_ignored_when_merging() || field.kind().is_inferred() {
                continue;
            }
            let differs = match (self.filled_at(idx), other.filled_at(idx)) {
                (Some(Value::Model(mine)), Some(Value::Model(theirs))) => !mine.compatible(theirs),
                (Some(mine), Some(theirs)) => mine != theirs,
                _ => false,
            };
            if differs {
                return false;
            }
        }
        true
    }

    /// Same type records that differ in a field marked
    /// `ignore_when_merging` describe different things: they may merge, but
    /// both are kept.
    pub fn should_keep_both(&self, other: &Record) -> bool {
        if !self.schema().same_type(other.schema()) {
            return false;
        }
        self.schema().fields().iter().enumerate().any(|(idx, field)| {
            field.is_ignored_when_merging()
                && match (self.filled_at(idx), other.filled_at(idx)) {
                    (Some(Value::Model(mine)), Some(Value::Model(theirs))) => !mine.compatible(theirs),
                    (Some(mine), Some(theirs)) => mine != theirs,
                    _ => false,
                }
        })
    }

    /// The set binding fields of this record (not of nested records).
    pub fn binding_properties(&self) -> Vec<(String, Value)> {
        self.schema()
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.is_binding())
            .filter_map(|(idx, field)| {
                self.filled_at(idx)
                    .map(|value| (field.name().to_string(), value.clone()))
            })
            .collect()
    }

    /// Whether `other` agrees with this record's binding fields. Nested
    /// records only need to be a superset or subset of the bound value.
    pub fn binding_compatible(&self, other: &Record) -> bool {
        let properties = self.binding_properties();
        self.binding_compatible_with(other, &properties)
    }

    fn binding_compatible_with(&self, other: &Record, properties: &[(String, Value)]) -> bool {
        if properties.is_empty() {
            return true;
        }
        if self.schema().same_type(other.schema()) {
            return properties
                .iter()
                .all(|(name, bound)| other.value(name).filter(|value| !value.is_empty()) == Some(bound));
        }
        if other.is_empty() {
            return true;
        }
        for (idx, field) in other.schema().fields().iter().enumerate() {
            match properties.iter().find(|(name, _)| name == field.name()) {
                Some((_, bound)) => {
                    let agrees = match (bound, other.filled_at(idx)) {
                        (_, None) => true,
                        (Value::Model(bound), Some(Value::Model(theirs))) => {
                            bound.is_superset(theirs) || bound.is_subset(theirs)
                        }
                        (bound, Some(theirs)) => bound == theirs,
                    };
                    if !agrees {
                        return false;
                    }
                }
                None => {
                    if let Some(nested) = other.nested_at(idx) {
                        if !self.binding_compatible_with(nested, properties) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    /// Copy this record's binding fields onto every nested record that
    /// declares a field of the same name.
    pub fn consolidate_binding(&mut self) {
        let properties = self.binding_properties();
        if !properties.is_empty() {
            self.consolidate_binding_with(&properties);
        }
    }

    fn consolidate_binding_with(&mut self, properties: &[(String, Value)]) {
        let schema = self.schema().clone();
        for (idx, field) in schema.fields().iter().enumerate() {
            match properties.iter().find(|(name, _)| name == field.name()) {
                Some((_, bound)) => {
                    if self.filled_at(idx) != Some(bound) {
                        self.assign_at(idx, bound.clone());
                    }
                }
                None => match self.raw_value_at_mut(idx) {
                    Some(Value::Model(nested)) => nested.consolidate_binding_with(properties),
                    Some(Value::List(items) | Value::Set(items)) => {
                        for nested in items.iter_mut().filter_map(Value::as_record_mut) {
                            nested.consolidate_binding_with(properties);
                        }
                    }
                    _ => {}
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, FieldKind, Schema, SchemaRef};

    fn compound() -> SchemaRef {
        Schema::builder("Compound")
            .field(Field::set("names", FieldKind::String))
            .field(Field::set("labels", FieldKind::String))
            .field(Field::set("roles", FieldKind::String).contextual())
            .build()
            .unwrap()
    }

    fn lifetime(compound: &SchemaRef) -> SchemaRef {
        Schema::builder("Lifetime")
            .field(Field::string("specifier").required())
            .field(Field::string("raw_value").required())
            .field(Field::string("solvent").contextual().contextual_range(ContextualRange::paragraph()))
            .field(Field::model("compound", compound).contextual().required().binding())
            .build()
            .unwrap()
    }

    fn labelled(compound: &SchemaRef, label: &str) -> Record {
        Record::from_values(compound, [("labels", Value::set([label]))]).unwrap()
    }

    #[test]
    fn same_type_contextual_merge() {
        let compound = compound();
        let mut a = labelled(&compound, "1");
        let b = Record::from_values(&compound, [("roles", Value::set(["product"]))]).unwrap();
        assert!(a.merge_contextual(&b, ContextualRange::sentence()));
        assert_eq!(a.value("labels"), Some(&Value::set(["1"])));
        assert_eq!(a.value("roles"), Some(&Value::set(["product"])));
        assert_eq!(a.contextual_merge_count(), 1);
        // nothing left to fill
        assert!(!a.merge_contextual(&b, ContextualRange::sentence()));
    }

    #[test]
    fn conflicting_records_do_not_merge() {
        let compound = compound();
        let mut a = Record::from_values(&compound, [("labels", Value::set(["1"]))]).unwrap();
        let b = Record::from_values(&compound, [("labels", Value::set(["2"])), ("roles", Value::set(["host"]))]).unwrap();
        assert!(!a.compatible(&b));
        assert!(!a.merge_contextual(&b, ContextualRange::sentence()));
        assert_eq!(a.value("roles"), None);
    }

    #[test]
    fn nested_record_fills_model_field() {
        let compound = compound();
        let schema = lifetime(&compound);
        let mut record = Record::from_values(&schema, [("specifier", "τd"), ("raw_value", "3.1")]).unwrap();
        let found = labelled(&compound, "2a");
        assert!(record.merge_contextual(&found, ContextualRange::paragraphs(2.0)));
        assert_eq!(record.get_keypath("compound.labels").unwrap(), Some(&Value::set(["2a"])));

        // the nested compound is already 2a
        let other = labelled(&compound, "3b");
        assert!(!record.merge_contextual(&other, ContextualRange::sentence()));
        assert_eq!(record.get_keypath("compound.labels").unwrap(), Some(&Value::set(["2a"])));
    }

    #[test]
    fn ranges_limit_merging() {
        let compound = compound();
        let schema = lifetime(&compound);
        let mut record = Record::from_values(&schema, [("specifier", "τd"), ("raw_value", "3.1")]).unwrap();
        let mut source = Record::from_values(&schema, [("specifier", "τd"), ("raw_value", "3.1"), ("solvent", "toluene")]).unwrap();
        source.set_confidence("solvent", 0.7).unwrap();

        assert!(!record.merge_contextual(&source, ContextualRange::section()));
        assert_eq!(record.value("solvent"), None);

        record.set_no_merge_range("solvent", ContextualRange::sentence()).unwrap();
        assert!(!record.merge_contextual(&source, ContextualRange::sentence()));
        assert_eq!(record.value("solvent"), None);

        assert!(record.merge_contextual(&source, ContextualRange::sentences(3.0)));
        assert_eq!(record.value("solvent"), Some(&Value::from("toluene")));
        assert_eq!(record.confidence("solvent").unwrap(), Some(0.7));
    }

    #[test]
    fn merging_never_overwrites() {
        let compound = compound();
        let schema = lifetime(&compound);
        let mut a = Record::from_values(&schema, [("specifier", "τd"), ("raw_value", "3.1")]).unwrap();
        let b = Record::from_values(&schema, [("specifier", "τd"), ("solvent", "THF")]).unwrap();
        let before = a.clone();
        let distance = ContextualRange::sentences(2.0);
        a.merge_contextual(&b, distance);
        for field in ["specifier", "raw_value"] {
            assert_eq!(a.value(field), before.value(field));
        }
        assert_eq!(a.value("solvent"), Some(&Value::from("THF")));
        assert!(distance <= a.contextual_range("solvent").unwrap());
        assert!(distance > a.no_merge_range("solvent").unwrap());
    }

    #[test]
    fn merge_all_ignores_contextual_flag() {
        let compound = compound();
        let schema = lifetime(&compound);
        let mut a = Record::from_values(&schema, [("specifier", "τd")]).unwrap();
        let b = Record::from_values(&schema, [("specifier", "τd"), ("raw_value", "3.1")]).unwrap();
        assert!(!a.merge_contextual(&b, ContextualRange::sentence()));
        assert!(a.merge_all(&b, ContextualRange::sentence()));
        assert_eq!(a.value("raw_value"), Some(&Value::from("3.1")));
    }

    #[test]
    fn ignored_differences_keep_both_records() {
        let schema = Schema::builder("Yield")
            .field(Field::string("specifier").ignore_when_merging())
            .field(Field::string("solvent").contextual())
            .build()
            .unwrap();
        let mut a = Record::from_values(&schema, [("specifier", "PLQY")]).unwrap();
        let b = Record::from_values(&schema, [("specifier", "ΦPL"), ("solvent", "toluene")]).unwrap();
        assert!(a.should_keep_both(&b));
        assert!(!a.merge_contextual(&b, ContextualRange::sentence()));
        // the merge itself still happened
        assert_eq!(a.value("solvent"), Some(&Value::from("toluene")));
    }

    #[test]
    fn binding_reaches_nested_records() {
        let compound = compound();
        let condition = Schema::builder("Condition")
            .field(Field::string("raw_value"))
            .field(Field::model("compound", &compound))
            .build()
            .unwrap();
        let schema = Schema::builder("Measurement")
            .field(Field::model("compound", &compound).binding())
            .field(Field::model("condition", &condition).contextual())
            .build()
            .unwrap();
        let mut record = Record::new(&schema);
        record.set("compound", labelled(&compound, "1")).unwrap();
        let mut nested = Record::from_values(&condition, [("raw_value", "300")]).unwrap();
        nested.set("compound", labelled(&compound, "1")).unwrap();
        assert!(record.merge_contextual(&nested, ContextualRange::sentence()));
        assert_eq!(record.get_keypath("condition.compound.labels").unwrap(), Some(&Value::set(["1"])));

        let mut record = Record::new(&schema);
        record.set("compound", labelled(&compound, "1")).unwrap();
        let mut foreign = Record::from_values(&condition, [("raw_value", "77")]).unwrap();
        foreign.set("compound", labelled(&compound, "9")).unwrap();
        assert!(!record.merge_contextual(&foreign, ContextualRange::sentence()));
    }
}
