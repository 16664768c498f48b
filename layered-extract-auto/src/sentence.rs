use layered_extract::{Element, GrammarResult, Match};
use layered_extract_model::{Record, SchemaRef};

use crate::cem::default_chem_name;
use crate::interpret::Pick;
use crate::parser::{
    chem_name_entity, entity_list, field_entities, interpret_match, labels_entity, root_phrase, specifier_entity,
    trigger_phrase, RecordParser,
};
use crate::unit::unit_element;
use crate::value::value_element;

/// Parses running text with a grammar synthesized from the schema.
///
/// For quantity schemas the root looks for the specifier, a value followed
/// by its unit, the other fields' expressions and a compound mention, in any
/// order. In lenient mode a value without a unit is accepted too.
#[derive(Debug, Clone)]
pub struct AutoSentenceParser {
    schema: SchemaRef,
    root: Element,
    trigger: Option<Element>,
}

/// Options for [`AutoSentenceParser`].
#[derive(Debug, Clone)]
pub struct AutoSentenceParserBuilder {
    schema: SchemaRef,
    lenient: bool,
    activate_to_range: bool,
    chem_name: Option<Element>,
}

impl AutoSentenceParser {
    pub fn new(schema: &SchemaRef) -> GrammarResult<Self> {
        Self::builder(schema).build()
    }

    pub fn builder(schema: &SchemaRef) -> AutoSentenceParserBuilder {
        AutoSentenceParserBuilder {
            schema: schema.clone(),
            lenient: false,
            activate_to_range: false,
            chem_name: None,
        }
    }
}

impl AutoSentenceParserBuilder {
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Accept `10 to 20` as one range.
    pub fn activate_to_range(mut self, activate_to_range: bool) -> Self {
        self.activate_to_range = activate_to_range;
        self
    }

    /// Replace the default compound mention grammar.
    pub fn chem_name(mut self, chem_name: Element) -> Self {
        self.chem_name = Some(chem_name);
        self
    }

    pub fn build(self) -> GrammarResult<AutoSentenceParser> {
        let schema = &self.schema;
        let mut entities = vec![labels_entity(schema)];

        if let Some(dimension) = schema.dimension() {
            let value_phrase = match unit_element(dimension)? {
                Some(units) if self.lenient => {
                    value_element(Some(units), self.activate_to_range) | value_element(None, self.activate_to_range)
                }
                Some(units) => value_element(Some(units), self.activate_to_range),
                None => value_element(None, self.activate_to_range),
            };
            entities.extend(specifier_entity(schema));
            entities.push(value_phrase);
        } else {
            entities.extend(specifier_entity(schema));
        }

        entities.extend(field_entities(schema));
        let chem_name = self.chem_name.unwrap_or_else(|| default_chem_name(false));
        entities.push(chem_name_entity(schema, &chem_name));

        Ok(AutoSentenceParser {
            root: root_phrase(entity_list(entities)),
            trigger: trigger_phrase(schema),
            schema: self.schema,
        })
    }
}

impl RecordParser for AutoSentenceParser {
    fn name(&self) -> &str {
        "AutoSentenceParser"
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn root(&self) -> &Element {
        &self.root
    }

    fn trigger(&self) -> Option<&Element> {
        self.trigger.as_ref()
    }

    fn interpret(&self, found: &Match) -> Vec<Record> {
        interpret_match(&self.schema, found, Pick::First, self.name())
    }
}
