//! The serialization contract: `{"TypeName": {"field": value, ...}}`.

use serde_json::{Map, Number, Value as Json};

use crate::{FieldKind, ModelError, ModelResult, Record, SchemaRef, Value};

impl Value {
    pub fn to_json_value(&self) -> Json {
        match self {
            Value::String(text) => Json::String(text.clone()),
            Value::Float(number) => Number::from_f64(*number).map(Json::Number).unwrap_or(Json::Null),
            Value::List(items) | Value::Set(items) => Json::Array(items.iter().map(Value::to_json_value).collect()),
            Value::Model(record) => record.serialize(),
        }
    }
}

impl Record {
    /// One outer key, the type name, mapping to the non-empty fields.
    /// Inferred fields are included; fields declared `null` are always
    /// present.
    pub fn serialize(&self) -> Json {
        let mut data = Map::new();
        for (idx, field) in self.schema().fields().iter().enumerate() {
            match self.filled_at(idx) {
                Some(value) => {
                    data.insert(field.name().to_string(), value.to_json_value());
                }
                None if field.is_null() => {
                    data.insert(field.name().to_string(), Json::Null);
                }
                None => {}
            }
        }
        let mut record = Map::new();
        record.insert(self.type_name().to_string(), Json::Object(data));
        Json::Object(record)
    }

    pub fn to_json(&self) -> String {
        self.serialize().to_string()
    }

    /// Rebuild a record of `schema` from [`serialize`](Self::serialize)
    /// output. Inferred fields are recomputed rather than read.
    pub fn deserialize(schema: &SchemaRef, serialized: &Json) -> ModelResult<Record> {
        let error = |message: String| ModelError::Deserialize {
            schema: schema.name().to_string(),
            message,
        };
        let outer = serialized
            .as_object()
            .ok_or_else(|| error("expected an object".to_string()))?;
        let data = match outer.get(schema.name()) {
            Some(Json::Object(data)) if outer.len() == 1 => data,
            _ => {
                let found: Vec<&str> = outer.keys().map(String::as_str).collect();
                return Err(error(format!("expected a single `{}` key, found {:?}", schema.name(), found)));
            }
        };
        let mut record = Record::new(schema);
        for (name, json) in data {
            let idx = schema.require_index(name)?;
            let field = &schema.fields()[idx];
            if field.kind().is_inferred() || json.is_null() {
                continue;
            }
            let value = value_from_json(field.kind(), name, json)?;
            record.set(name, value)?;
        }
        Ok(record)
    }
}

fn value_from_json(kind: &FieldKind, field: &str, json: &Json) -> ModelResult<Value> {
    let mismatch = || ModelError::TypeMismatch {
        field: field.to_string(),
        expected: format!("{:?}", kind),
        found: json.to_string(),
    };
    match (kind, json) {
        (FieldKind::String, Json::String(text)) => Ok(Value::String(text.clone())),
        (FieldKind::String, Json::Number(number)) => Ok(Value::String(number.to_string())),
        (FieldKind::Float, Json::Number(number)) => number.as_f64().map(Value::Float).ok_or_else(mismatch),
        (FieldKind::Float, Json::String(text)) => text.parse().map(Value::Float).map_err(|_| mismatch()),
        (FieldKind::Model(schema), json) => Record::deserialize(schema, json).map(Value::from),
        (FieldKind::ListOf(inner) | FieldKind::SetOf(inner), Json::Array(items)) => items
            .iter()
            .map(|item| value_from_json(inner, field, item))
            .collect::<ModelResult<Vec<_>>>()
            .map(Value::List),
        (FieldKind::Inferred(inferrer), json) => value_from_json(inferrer.kind(), field, json),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Field, FieldKind, Record, Schema, Value};

    #[test]
    fn round_trip_with_nested_records() {
        let compound = Schema::builder("Compound")
            .field(Field::set("names", FieldKind::String))
            .field(Field::set("labels", FieldKind::String))
            .build()
            .unwrap();
        let temperature = Schema::builder("Temperature")
            .field(Field::string("raw_value"))
            .field(Field::float("value"))
            .build()
            .unwrap();
        let schema = Schema::builder("Lifetime")
            .field(Field::string("specifier"))
            .field(Field::string("comment").null())
            .field(Field::model("compound", &compound))
            .field(Field::list("temperatures", FieldKind::Model(temperature.clone())))
            .build()
            .unwrap();

        let mut record = Record::from_values(&schema, [("specifier", "τd")]).unwrap();
        record.set_keypath("compound.labels", Value::set(["2b", "1a"])).unwrap();
        let cold = Record::from_values(&temperature, [("raw_value", Value::from("77")), ("value", 77.0.into())]).unwrap();
        record.set("temperatures", Value::list([cold])).unwrap();

        let serialized = record.serialize();
        insta::assert_snapshot!(serialized.to_string(), @r###"{"Lifetime":{"comment":null,"compound":{"Compound":{"labels":["1a","2b"]}},"specifier":"τd","temperatures":[{"Temperature":{"raw_value":"77","value":77.0}}]}}"###);

        let restored = Record::deserialize(&schema, &serialized).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let schema = Schema::builder("Yield").field(Field::string("raw_value")).build().unwrap();
        let json = serde_json::json!({"Yield": {"colour": "red"}});
        assert!(matches!(
            Record::deserialize(&schema, &json),
            Err(crate::ModelError::UnknownField { .. })
        ));
        let json = serde_json::json!({"Lifetime": {}});
        assert!(matches!(
            Record::deserialize(&schema, &json),
            Err(crate::ModelError::Deserialize { .. })
        ));
    }
}
