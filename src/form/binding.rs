use super::coercion::{SelectMode, Selection, from_selection_in, to_selection};
use super::controller::{FieldKey, FormController, FormResult, read_lock};
use super::validation::{FieldLens, FormModel};
use super::value::{FromFieldValue, OptionPair, ToFieldValue};

/// What a form control needs to render one field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBinding<V> {
    pub key: FieldKey,
    pub id: &'static str,
    pub value: V,
    pub required: bool,
    /// Localized marker shown next to the label of a required field.
    pub required_marker: Option<String>,
    pub description: Option<String>,
    pub error: Option<String>,
}

impl<V> FieldBinding<V> {
    pub fn name(&self) -> &'static str {
        self.key.as_str()
    }
}

/// A picker bound to one field. The form stores primitives, the picker shows
/// option pairs; `change` converts back before writing.
pub struct SelectBinding<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
{
    controller: FormController<T>,
    lens: L,
    mode: SelectMode,
    options: Vec<OptionPair>,
    selected: Option<Selection>,
    field: FieldBinding<L::Value>,
}

impl<T, L> SelectBinding<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
    L::Value: FromFieldValue,
{
    pub fn field(&self) -> &FieldBinding<L::Value> {
        &self.field
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    pub fn options(&self) -> &[OptionPair] {
        &self.options
    }

    pub fn selected(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    /// Writes the control's new selection into the form. Returns `false`
    /// without writing when the picked value does not fit the field's type.
    pub fn change(&self, selection: Option<&Selection>) -> FormResult<bool> {
        let primitive = from_selection_in(self.mode, selection);
        let Some(value) = <L::Value as FromFieldValue>::from_field_value(primitive) else {
            tracing::debug!(
                field = self.lens.key().as_str(),
                "selection does not fit the field type"
            );
            return Ok(false);
        };
        self.controller.set(self.lens, value)?;
        Ok(true)
    }
}

impl<T> FormController<T>
where
    T: FormModel,
{
    pub fn field_error_for_display<L>(&self, lens: L) -> FormResult<Option<String>>
    where
        L: FieldLens<T>,
    {
        self.display_error_message(lens.key())
    }

    pub fn bind_field<L>(&self, lens: L) -> FormResult<FieldBinding<L::Value>>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let value = {
            let state = read_lock(&self.state, "reading value for binding")?;
            lens.get(&state.model).clone()
        };
        let description = read_lock(
            &self.field_descriptions,
            "reading field description for binding",
        )?
        .get(&key)
        .cloned();
        let required =
            read_lock(&self.required_fields, "reading required fields for binding")?.contains(&key);

        let required_marker =
            required.then(|| self.validator.i18n().t("common.required_marker"));

        Ok(FieldBinding {
            key,
            id: self
                .schema
                .get(key)
                .map_or(key.as_str(), |descriptor| descriptor.id()),
            value,
            required,
            required_marker,
            description,
            error: self.display_error_message(key)?,
        })
    }

    pub fn bind_select<L>(
        &self,
        lens: L,
        options: impl Into<Vec<OptionPair>>,
    ) -> FormResult<SelectBinding<T, L>>
    where
        L: FieldLens<T>,
        L::Value: ToFieldValue,
    {
        self.bind_picker(lens, SelectMode::Single, options.into())
    }

    pub fn bind_multiselect<L>(
        &self,
        lens: L,
        options: impl Into<Vec<OptionPair>>,
    ) -> FormResult<SelectBinding<T, L>>
    where
        L: FieldLens<T>,
        L::Value: ToFieldValue,
    {
        self.bind_picker(lens, SelectMode::Multi, options.into())
    }

    fn bind_picker<L>(
        &self,
        lens: L,
        mode: SelectMode,
        options: Vec<OptionPair>,
    ) -> FormResult<SelectBinding<T, L>>
    where
        L: FieldLens<T>,
        L::Value: ToFieldValue,
    {
        let field = self.bind_field(lens)?;
        let selected = to_selection(&field.value.to_field_value(), &options);
        Ok(SelectBinding {
            controller: self.clone(),
            lens,
            mode,
            options,
            selected,
            field,
        })
    }

    fn display_error_message(&self, key: FieldKey) -> FormResult<Option<String>> {
        let state = read_lock(&self.state, "reading display error message")?;
        let Some(meta) = state.field_meta.get(&key) else {
            return Ok(None);
        };
        if !meta.touched && state.submit_count == 0 {
            return Ok(None);
        }
        Ok(meta.errors.first().map(|error| error.message().to_string()))
    }
}
