use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::controller::{
    FieldKey, FormController, FormResult, RevalidateMode, SyncFieldValidatorFn,
    SyncFormValidatorFn, ValidationMode, first_error_key, read_lock, write_lock,
};
use super::descriptor::FieldConfig;
use super::schema::{FormSchema, add_validation};
use super::validator::FieldError;
use super::value::FieldValue;

pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

/// A typed form whose fields carry rule strings.
///
/// Usually derived with `#[derive(FormModel)]`.
pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_configs() -> Vec<(FieldKey, FieldConfig)>;

    /// The current value of `key` as the rule engine sees it; unknown keys
    /// read as [`FieldValue::Missing`].
    fn field_value(&self, key: FieldKey) -> FieldValue;

    fn schema() -> FormSchema {
        add_validation(Self::field_configs())
    }
}

pub trait FieldValidator<T, L>: Send + Sync
where
    L: FieldLens<T>,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), FieldError>;
}

impl<T, L, F> FieldValidator<T, L> for F
where
    L: FieldLens<T>,
    F: for<'a> Fn(&'a T, &'a L::Value) -> Result<(), FieldError> + Send + Sync,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), FieldError> {
        (self)(model, value)
    }
}

pub trait FormValidator<T>: Send + Sync {
    fn validate(&self, model: &T) -> Vec<(FieldKey, FieldError)>;
}

impl<T, F> FormValidator<T> for F
where
    F: Fn(&T) -> Vec<(FieldKey, FieldError)> + Send + Sync,
{
    fn validate(&self, model: &T) -> Vec<(FieldKey, FieldError)> {
        (self)(model)
    }
}

impl<T> FormController<T>
where
    T: FormModel,
{
    /// Adds a check that runs after the field's schema rules.
    pub fn register_field_validator<L, V>(&self, lens: L, validator: V) -> FormResult<()>
    where
        L: FieldLens<T>,
        V: FieldValidator<T, L> + 'static,
    {
        let key = lens.key();
        let validator = Arc::new(validator);
        let wrapped: SyncFieldValidatorFn<T> =
            Arc::new(move |model: &T| validator.validate(model, lens.get(model)));
        let mut validators =
            write_lock(&self.sync_field_validators, "registering field validator")?;
        validators.entry(key).or_default().push(wrapped);
        Ok(())
    }

    pub fn register_form_validator<V>(&self, validator: V) -> FormResult<()>
    where
        V: FormValidator<T> + 'static,
    {
        let validator = Arc::new(validator);
        let wrapped: SyncFormValidatorFn<T> = Arc::new(move |model: &T| validator.validate(model));
        let mut validators = write_lock(&self.form_validators, "registering form validator")?;
        validators.push(wrapped);
        Ok(())
    }

    pub fn register_dependency<S, D>(&self, source: S, dependent: D) -> FormResult<()>
    where
        S: FieldLens<T>,
        D: FieldLens<T>,
    {
        let mut dependencies = write_lock(&self.dependencies, "registering dependency")?;
        dependencies
            .entry(source.key())
            .or_default()
            .insert(dependent.key());
        Ok(())
    }

    pub fn set<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "writing form model")?;
            lens.set(&mut state.model, value);
            let is_dirty = lens.get(&state.model) != lens.get(&state.initial_model);
            if is_dirty {
                state.dirty_fields.insert(key);
            } else {
                state.dirty_fields.remove(&key);
            }
            state.ensure_meta(key).dirty = is_dirty;
        }

        if self.options.validate_mode == ValidationMode::OnChange {
            let _ = self.validate_field_by_key(key)?;
        }
        if self.options.revalidate_mode == RevalidateMode::OnChange {
            self.revalidate_dependents(key)?;
        }
        Ok(())
    }

    pub fn touch<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "touching field")?;
            state.ensure_meta(key).touched = true;
        }

        if self.options.validate_mode == ValidationMode::OnBlur {
            let _ = self.validate_field_by_key(key)?;
        }
        if self.options.revalidate_mode == RevalidateMode::OnBlur {
            self.revalidate_dependents(key)?;
        }
        Ok(())
    }

    pub fn validate_field<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        self.validate_field_by_key(lens.key())
    }

    pub fn validate_form(&self) -> FormResult<bool> {
        let model = {
            read_lock(&self.state, "reading model for form validation")?
                .model
                .clone()
        };
        let field_validators = read_lock(
            &self.sync_field_validators,
            "reading field validators for form validation",
        )?
        .clone();
        let form_validators = read_lock(
            &self.form_validators,
            "reading form validators for form validation",
        )?
        .clone();

        let mut field_errors = BTreeMap::<FieldKey, Vec<FieldError>>::new();
        for (key, validators) in field_validators {
            field_errors.insert(key, self.run_field_validators(&model, &validators));
        }

        for validator in form_validators {
            for (key, error) in validator(&model) {
                field_errors.entry(key).or_default().push(error);
            }
        }

        let mut state = write_lock(&self.state, "applying form validation result")?;
        let mut keys = state
            .field_meta
            .keys()
            .copied()
            .collect::<BTreeSet<FieldKey>>();
        keys.extend(field_errors.keys().copied());
        for key in keys {
            state.ensure_meta(key).errors = field_errors.remove(&key).unwrap_or_default();
        }
        state.first_error = first_error_key(&state.field_meta);
        tracing::trace!(first_error = ?state.first_error, "form validated");
        Ok(state.first_error.is_none())
    }

    pub(super) fn validate_field_by_key(&self, key: FieldKey) -> FormResult<bool> {
        let model = {
            read_lock(&self.state, "reading model for field validation")?
                .model
                .clone()
        };
        let validators = {
            read_lock(
                &self.sync_field_validators,
                "reading field validators for key validation",
            )?
            .get(&key)
            .cloned()
            .unwrap_or_default()
        };

        let errors = self.run_field_validators(&model, &validators);
        let is_valid = errors.is_empty();

        let mut state = write_lock(&self.state, "writing field validation result")?;
        state.ensure_meta(key).errors = errors;
        state.first_error = first_error_key(&state.field_meta);
        Ok(is_valid)
    }

    fn run_field_validators(
        &self,
        model: &T,
        validators: &[SyncFieldValidatorFn<T>],
    ) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for validator in validators {
            if let Err(error) = validator(model) {
                errors.push(error);
                if self.options.validate_first_error_only {
                    break;
                }
            }
        }
        errors
    }

    pub(super) fn revalidate_dependents(&self, source: FieldKey) -> FormResult<()> {
        let dependents = read_lock(&self.dependencies, "reading field dependencies")?
            .get(&source)
            .cloned()
            .unwrap_or_default();
        for dependent in dependents {
            let _ = self.validate_field_by_key(dependent)?;
        }
        Ok(())
    }
}
