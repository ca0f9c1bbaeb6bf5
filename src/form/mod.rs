mod binding;
mod coercion;
mod controller;
mod descriptor;
mod rules;
mod schema;
mod validation;
mod validator;
mod value;


pub use binding::{FieldBinding, SelectBinding};
pub use coercion::{
    SelectMode, Selection, default_values, from_control_value, from_selection, from_selection_in,
    hydrate_selection, to_selection,
};
pub use controller::{
    FieldKey, FieldMeta, FormController, FormError, FormOptions, FormResult, FormSnapshot,
    RevalidateMode, SubmitState, ValidationMode,
};
pub use descriptor::{
    FieldConfig, FieldDescriptor, FieldValidateFn, add_field_validation, add_field_validation_with,
};
pub use rules::{Directive, RuleParseError, RuleSet};
pub use schema::{FormSchema, add_validation, add_validation_with};
pub use schoolform_derive::FormModel;
pub use validation::{FieldLens, FieldValidator, FormModel, FormValidator};
pub use validator::{FieldError, FieldRules, Messages, Validator, attribute_name, validate_field};
pub use value::{FieldValue, FromFieldValue, OptionPair, OptionValue, ToFieldValue};
