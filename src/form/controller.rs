use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::descriptor::FieldDescriptor;
use super::schema::{FormSchema, add_validation_with};
use super::validation::{FieldLens, FormModel};
use super::validator::{FieldError, Validator, attribute_name};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevalidateMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub revalidate_mode: RevalidateMode,
    pub validate_first_error_only: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::OnSubmit,
            revalidate_mode: RevalidateMode::OnChange,
            validate_first_error_only: false,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldMeta {
    pub dirty: bool,
    pub touched: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T> {
    pub model: T,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub first_error: Option<FieldKey>,
    pub field_meta: BTreeMap<FieldKey, FieldMeta>,
}

impl<T> FormSnapshot<T> {
    pub fn errors_for(&self, key: FieldKey) -> &[FieldError] {
        self.field_meta
            .get(&key)
            .map(|meta| meta.errors.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    AlreadySubmitting,
    Rejected(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
            FormError::AlreadySubmitting => f.write_str("form submit is already in progress"),
            FormError::Rejected(reason) => write!(f, "submission rejected: {reason}"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type SyncFieldValidatorFn<T> = Arc<dyn Fn(&T) -> Result<(), FieldError> + Send + Sync>;
pub(super) type SyncFormValidatorFn<T> =
    Arc<dyn Fn(&T) -> Vec<(FieldKey, FieldError)> + Send + Sync>;

pub(super) struct FormState<T> {
    pub(super) initial_model: T,
    pub(super) model: T,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) dirty_fields: BTreeSet<FieldKey>,
    pub(super) field_meta: BTreeMap<FieldKey, FieldMeta>,
    pub(super) first_error: Option<FieldKey>,
}

impl<T> FormState<T> {
    pub(super) fn ensure_meta(&mut self, key: FieldKey) -> &mut FieldMeta {
        self.field_meta.entry(key).or_default()
    }
}

/// Headless form state container.
///
/// Built from a [`FormModel`], it validates every configured field with the
/// model's schema; extra field, form-level and dependency rules can be
/// registered on top. Clones share state.
#[derive(Clone)]
pub struct FormController<T>
where
    T: FormModel,
{
    pub(super) options: FormOptions,
    pub(super) validator: Validator,
    pub(super) schema: Arc<FormSchema>,
    pub(super) state: Arc<RwLock<FormState<T>>>,
    pub(super) sync_field_validators: Arc<RwLock<BTreeMap<FieldKey, Vec<SyncFieldValidatorFn<T>>>>>,
    pub(super) form_validators: Arc<RwLock<Vec<SyncFormValidatorFn<T>>>>,
    pub(super) dependencies: Arc<RwLock<BTreeMap<FieldKey, BTreeSet<FieldKey>>>>,
    pub(super) required_fields: Arc<RwLock<BTreeSet<FieldKey>>>,
    pub(super) field_descriptions: Arc<RwLock<BTreeMap<FieldKey, String>>>,
}

impl<T> FormController<T>
where
    T: FormModel,
{
    pub fn new(initial: T, options: FormOptions) -> Self {
        Self::with_validator(initial, options, &Validator::new())
    }

    pub fn with_validator(initial: T, options: FormOptions, validator: &Validator) -> Self {
        let schema = add_validation_with(T::field_configs(), validator);
        let mut field_validators = BTreeMap::<FieldKey, Vec<SyncFieldValidatorFn<T>>>::new();
        let mut required_fields = BTreeSet::new();
        for (key, descriptor) in schema.iter() {
            let validate = descriptor.validator();
            let wrapped: SyncFieldValidatorFn<T> =
                Arc::new(move |model: &T| validate(&model.field_value(key)));
            field_validators.entry(key).or_default().push(wrapped);
            if descriptor.is_required() {
                required_fields.insert(key);
            }
        }

        Self {
            options,
            validator: validator.clone(),
            schema: Arc::new(schema),
            state: Arc::new(RwLock::new(FormState {
                initial_model: initial.clone(),
                model: initial,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                dirty_fields: BTreeSet::new(),
                field_meta: BTreeMap::new(),
                first_error: None,
            })),
            sync_field_validators: Arc::new(RwLock::new(field_validators)),
            form_validators: Arc::new(RwLock::new(Vec::new())),
            dependencies: Arc::new(RwLock::new(BTreeMap::new())),
            required_fields: Arc::new(RwLock::new(required_fields)),
            field_descriptions: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn descriptor<L>(&self, lens: L) -> Option<&FieldDescriptor>
    where
        L: FieldLens<T>,
    {
        self.schema.get(lens.key())
    }

    pub fn register_required_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let mut required = write_lock(&self.required_fields, "registering required field")?;
        required.insert(lens.key());
        Ok(())
    }

    pub fn unregister_required_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let mut required = write_lock(&self.required_fields, "unregistering required field")?;
        required.remove(&lens.key());
        Ok(())
    }

    pub fn register_field_description<L>(
        &self,
        lens: L,
        description: impl Into<String>,
    ) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let mut descriptions =
            write_lock(&self.field_descriptions, "registering field description")?;
        descriptions.insert(lens.key(), description.into());
        Ok(())
    }

    pub fn clear_field_description<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let mut descriptions = write_lock(&self.field_descriptions, "clearing field description")?;
        descriptions.remove(&lens.key());
        Ok(())
    }

    /// Validates the whole form and hands the model to `f` only when it is
    /// valid. A failed validation is not an error: the state moves to
    /// `Failed` and `Ok(())` is returned.
    pub fn submit(&self, f: impl FnOnce(&T) -> FormResult<()> + 'static) -> FormResult<()> {
        self.begin_submit("preparing submit")?;

        if !self.validate_form()? {
            let mut state = write_lock(&self.state, "handling submit validation failure")?;
            transition_submit_state(&mut state, SubmitState::Failed)?;
            tracing::debug!(first_error = ?state.first_error, "submit blocked by validation");
            return Ok(());
        }

        let model = {
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.model.clone()
        };
        let submit_result = f(&model);
        self.finish_submit(&submit_result, "completing submit")?;
        submit_result
    }

    pub async fn submit_async<F, Fut>(&self, f: F) -> FormResult<()>
    where
        F: FnOnce(&T) -> Fut + 'static,
        Fut: Future<Output = FormResult<()>> + Send + 'static,
    {
        self.begin_submit("preparing async submit")?;

        if !self.validate_form()? {
            let mut state = write_lock(&self.state, "handling async submit validation failure")?;
            transition_submit_state(&mut state, SubmitState::Failed)?;
            tracing::debug!(first_error = ?state.first_error, "async submit blocked by validation");
            return Ok(());
        }

        let model = {
            let mut state = write_lock(&self.state, "moving async submit state to submitting")?;
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            state.model.clone()
        };
        let submit_result = f(&model).await;
        self.finish_submit(&submit_result, "completing async submit")?;
        submit_result
    }

    fn begin_submit(&self, context: &'static str) -> FormResult<()> {
        let mut state = write_lock(&self.state, context)?;
        if state.submit_state == SubmitState::Submitting {
            return Err(FormError::AlreadySubmitting);
        }
        transition_submit_state(&mut state, SubmitState::Validating)?;
        state.submit_count = state.submit_count.saturating_add(1);
        Ok(())
    }

    fn finish_submit(
        &self,
        submit_result: &FormResult<()>,
        context: &'static str,
    ) -> FormResult<()> {
        let mut state = write_lock(&self.state, context)?;
        let next = if submit_result.is_ok() {
            SubmitState::Succeeded
        } else {
            SubmitState::Failed
        };
        transition_submit_state(&mut state, next)?;
        tracing::debug!(state = ?next, submit_count = state.submit_count, "submit finished");
        Ok(())
    }

    /// Replaces both the initial and current model, typically with a record
    /// freshly loaded from the API. All field state is cleared.
    pub fn reset(&self, model: T) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form with new values")?;
        state.initial_model = model.clone();
        state.model = model;
        clear_state(&mut state);
        Ok(())
    }

    pub fn reset_to_initial(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.model = state.initial_model.clone();
        clear_state(&mut state);
        Ok(())
    }

    pub fn reset_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let mut state = write_lock(&self.state, "resetting field")?;
        let initial_value = lens.get(&state.initial_model).clone();
        lens.set(&mut state.model, initial_value);
        state.dirty_fields.remove(&key);
        let meta = state.ensure_meta(key);
        meta.dirty = false;
        meta.touched = false;
        meta.errors.clear();
        state.first_error = first_error_key(&state.field_meta);
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "clearing all field errors")?;
        for meta in state.field_meta.values_mut() {
            meta.errors.clear();
        }
        state.first_error = None;
        Ok(())
    }

    pub fn clear_field_errors<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let mut state = write_lock(&self.state, "clearing field errors")?;
        if let Some(meta) = state.field_meta.get_mut(&key) {
            meta.errors.clear();
        }
        state.first_error = first_error_key(&state.field_meta);
        Ok(())
    }

    /// Applies field errors reported by the server, such as the body of a 422
    /// response. Names outside the schema are skipped; returns how many
    /// fields received errors.
    pub fn set_server_errors<I, N, M>(&self, errors: I) -> FormResult<usize>
    where
        I: IntoIterator<Item = (N, M)>,
        N: AsRef<str>,
        M: Into<String>,
    {
        let mut grouped = BTreeMap::<FieldKey, Vec<FieldError>>::new();
        for (name, message) in errors {
            let name = name.as_ref();
            let Some(descriptor) = self.schema.get_by_name(name) else {
                tracing::debug!(field = name, "ignoring server error for unknown field");
                continue;
            };
            let key = descriptor.key();
            let message = message.into();
            let message = if message.is_empty() {
                let attribute = attribute_name(key.as_str());
                self.validator
                    .i18n()
                    .t_with("validation.server", &[("attribute", attribute.as_str())])
            } else {
                message
            };
            grouped
                .entry(key)
                .or_default()
                .push(FieldError::new(key.as_str(), "server", message));
        }

        let applied = grouped.len();
        let mut state = write_lock(&self.state, "applying server errors")?;
        for (key, errors) in grouped {
            state.ensure_meta(key).errors = errors;
        }
        state.first_error = first_error_key(&state.field_meta);
        Ok(applied)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T>> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        let is_valid = state.field_meta.values().all(|meta| meta.errors.is_empty());
        Ok(FormSnapshot {
            model: state.model.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            is_dirty: !state.dirty_fields.is_empty(),
            is_valid,
            first_error: state.first_error,
            field_meta: state.field_meta.clone(),
        })
    }

    pub fn field_meta<L>(&self, lens: L) -> FormResult<Option<FieldMeta>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading field meta")?
            .field_meta
            .get(&lens.key())
            .cloned())
    }

    pub fn field_description<L>(&self, lens: L) -> FormResult<Option<String>>
    where
        L: FieldLens<T>,
    {
        Ok(
            read_lock(&self.field_descriptions, "reading field description")?
                .get(&lens.key())
                .cloned(),
        )
    }

    pub fn is_required<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.required_fields, "reading required fields")?.contains(&lens.key()))
    }
}

fn clear_state<T>(state: &mut FormState<T>) {
    state.submit_state = SubmitState::Idle;
    state.submit_count = 0;
    state.dirty_fields.clear();
    state.first_error = None;
    for meta in state.field_meta.values_mut() {
        meta.dirty = false;
        meta.touched = false;
        meta.errors.clear();
    }
}

pub(super) fn transition_submit_state<T>(
    state: &mut FormState<T>,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn first_error_key(field_meta: &BTreeMap<FieldKey, FieldMeta>) -> Option<FieldKey> {
    field_meta
        .iter()
        .find_map(|(key, meta)| (!meta.errors.is_empty()).then_some(*key))
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
