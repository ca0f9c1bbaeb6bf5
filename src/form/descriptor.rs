use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use super::controller::FieldKey;
use super::rules::RuleSet;
use super::validator::{FieldError, Validator};
use super::value::FieldValue;

/// Author-supplied configuration of one field.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldConfig {
    pub id: Option<&'static str>,
    pub rules: &'static str,
}

impl FieldConfig {
    pub const fn new(rules: &'static str) -> Self {
        Self { id: None, rules }
    }

    /// Overrides the element id, for labels that must point at an id other
    /// than the field name.
    pub const fn with_id(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }
}

pub type FieldValidateFn = Arc<dyn Fn(&FieldValue) -> Result<(), FieldError> + Send + Sync>;

#[derive(Clone)]
pub struct FieldDescriptor {
    key: FieldKey,
    id: &'static str,
    rules: &'static str,
    validate: FieldValidateFn,
}

impl FieldDescriptor {
    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn rules(&self) -> &'static str {
        self.rules
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::parse(self.rules)
    }

    pub fn is_required(&self) -> bool {
        self.rule_set().is_required()
    }

    pub fn validate(&self, value: &FieldValue) -> Result<(), FieldError> {
        (self.validate)(value)
    }

    pub fn validator(&self) -> FieldValidateFn {
        self.validate.clone()
    }
}

impl Debug for FieldDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

pub fn add_field_validation(field: &FieldConfig, name: FieldKey) -> FieldDescriptor {
    add_field_validation_with(field, name, Validator::new())
}

/// Builds the descriptor for `name`; each call of its validator re-runs the
/// rules from scratch.
pub fn add_field_validation_with(
    field: &FieldConfig,
    name: FieldKey,
    validator: Validator,
) -> FieldDescriptor {
    if let Err(error) = RuleSet::parse_strict(field.rules) {
        tracing::warn!(
            field = name.as_str(),
            rules = field.rules,
            %error,
            "ignoring malformed validation rules"
        );
    }

    let rules = BTreeMap::from([(name.as_str().to_string(), field.rules.to_string())]);
    let validate: FieldValidateFn =
        Arc::new(move |value: &FieldValue| validator.validate(name.as_str(), value, &rules));

    FieldDescriptor {
        key: name,
        id: field.id.unwrap_or(name.as_str()),
        rules: field.rules,
        validate,
    }
}
