pub use crate::form::{
    FieldBinding, FieldConfig, FieldDescriptor, FieldError, FieldKey, FieldLens, FieldValue,
    FormController, FormError, FormModel, FormOptions, FormResult, FormSchema, FormSnapshot,
    OptionPair, OptionValue, RevalidateMode, SelectBinding, SelectMode, Selection, SubmitState,
    ValidationMode, Validator, add_field_validation, add_validation, from_selection,
    to_selection, validate_field,
};
pub use crate::i18n::{I18nManager, Locale};
