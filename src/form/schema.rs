use std::collections::BTreeMap;

use super::controller::FieldKey;
use super::descriptor::{FieldConfig, FieldDescriptor, add_field_validation_with};
use super::rules::{RuleParseError, RuleSet};
use super::validator::{FieldError, Validator};
use super::value::FieldValue;

/// Descriptors for every field of one form, keyed by field name.
#[derive(Clone, Debug, Default)]
pub struct FormSchema {
    fields: BTreeMap<FieldKey, FieldDescriptor>,
}

impl FormSchema {
    pub fn get(&self, key: FieldKey) -> Option<&FieldDescriptor> {
        self.fields.get(&key)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldDescriptor)> {
        self.fields.iter().map(|(key, descriptor)| (*key, descriptor))
    }

    pub fn required_keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.iter()
            .filter(|(_, descriptor)| descriptor.is_required())
            .map(|(key, _)| key)
    }

    /// Validates every field; keys absent from `values` are checked as
    /// missing. Only failing fields appear in the result.
    pub fn validate_values(
        &self,
        values: &BTreeMap<FieldKey, FieldValue>,
    ) -> BTreeMap<FieldKey, FieldError> {
        let missing = FieldValue::Missing;
        self.fields
            .iter()
            .filter_map(|(key, descriptor)| {
                let value = values.get(key).unwrap_or(&missing);
                descriptor.validate(value).err().map(|error| (*key, error))
            })
            .collect()
    }

    /// Fields whose rule strings do not parse cleanly, for callers that want
    /// to reject authoring mistakes at startup.
    pub fn parse_all_strict(&self) -> Vec<(FieldKey, RuleParseError)> {
        self.fields
            .iter()
            .filter_map(|(key, descriptor)| {
                RuleSet::parse_strict(descriptor.rules())
                    .err()
                    .map(|error| (*key, error))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FormSchema {
    type Item = (&'a FieldKey, &'a FieldDescriptor);
    type IntoIter = std::collections::btree_map::Iter<'a, FieldKey, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

pub fn add_validation<I>(form_fields: I) -> FormSchema
where
    I: IntoIterator<Item = (FieldKey, FieldConfig)>,
{
    add_validation_with(form_fields, &Validator::new())
}

/// Later entries replace earlier ones with the same key, so field tables can
/// be composed by appending overrides.
pub fn add_validation_with<I>(form_fields: I, validator: &Validator) -> FormSchema
where
    I: IntoIterator<Item = (FieldKey, FieldConfig)>,
{
    let mut fields = BTreeMap::new();
    for (key, config) in form_fields {
        fields.insert(key, add_field_validation_with(&config, key, validator.clone()));
    }
    FormSchema { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHOOL: [(FieldKey, FieldConfig); 3] = [
        (FieldKey::new("name"), FieldConfig::new("string|required")),
        (FieldKey::new("email"), FieldConfig::new("required|email")),
        (FieldKey::new("website"), FieldConfig::new("string|url|present")),
    ];

    #[test]
    fn every_config_gets_exactly_one_descriptor() {
        let schema = add_validation(SCHOOL);
        assert_eq!(schema.len(), SCHOOL.len());
        for (key, config) in SCHOOL {
            let descriptor = schema.get(key).expect("descriptor for every key");
            assert_eq!(descriptor.rules(), config.rules);
            assert_eq!(descriptor.id(), key.as_str());
        }
        assert_eq!(
            schema.required_keys().collect::<Vec<_>>(),
            vec![FieldKey::new("email"), FieldKey::new("name")]
        );
    }

    #[test]
    fn later_entries_override_earlier_ones() {
        let schema = add_validation([
            (FieldKey::new("last_name"), FieldConfig::new("present|string")),
            (FieldKey::new("last_name"), FieldConfig::new("required|string")),
        ]);
        assert_eq!(schema.len(), 1);
        assert!(
            schema
                .get_by_name("last_name")
                .is_some_and(FieldDescriptor::is_required)
        );
    }

    #[test]
    fn schemas_built_twice_behave_identically() {
        let first = add_validation(SCHOOL);
        let second = add_validation(SCHOOL);
        let values = BTreeMap::from([
            (FieldKey::new("name"), FieldValue::text("")),
            (FieldKey::new("email"), FieldValue::text("office@school.edu")),
        ]);
        assert_eq!(first.validate_values(&values), second.validate_values(&values));
    }

    #[test]
    fn validate_values_reports_failing_fields_only() {
        let schema = add_validation(SCHOOL);
        let values = BTreeMap::from([
            (FieldKey::new("name"), FieldValue::text("")),
            (FieldKey::new("email"), FieldValue::text("office@school.edu")),
        ]);
        let errors = schema.validate_values(&values);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[&FieldKey::new("name")].message(),
            "The name field is required."
        );
        assert_eq!(errors[&FieldKey::new("website")].directive(), "present");
    }

    #[test]
    fn strict_check_lists_malformed_fields() {
        let schema = add_validation([
            (FieldKey::new("ok"), FieldConfig::new("required")),
            (FieldKey::new("typo"), FieldConfig::new("requried")),
        ]);
        let problems = schema.parse_all_strict();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0, FieldKey::new("typo"));
        assert!(schema.get_by_name("unknown").is_none());
    }
}
