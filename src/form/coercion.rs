use super::value::{FieldValue, OptionPair, OptionValue};

/// What a picker control currently shows as picked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    Single(OptionPair),
    Multi(Vec<OptionPair>),
}

impl Selection {
    pub fn pairs(&self) -> &[OptionPair] {
        match self {
            Selection::Single(pair) => std::slice::from_ref(pair),
            Selection::Multi(pairs) => pairs,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SelectMode {
    #[default]
    Single,
    Multi,
}

impl SelectMode {
    pub fn empty_value(self) -> FieldValue {
        match self {
            SelectMode::Single => FieldValue::Text(String::new()),
            SelectMode::Multi => FieldValue::List(Vec::new()),
        }
    }
}

/// Finds the option(s) matching a form value by strict equality on
/// `.value`. Multi-select results follow the order of `options`.
pub fn to_selection(value: &FieldValue, options: &[OptionPair]) -> Option<Selection> {
    match value {
        FieldValue::List(items) => Some(Selection::Multi(
            options
                .iter()
                .filter(|option| items.iter().any(|item| matches_option(item, &option.value)))
                .cloned()
                .collect(),
        )),
        FieldValue::Missing | FieldValue::Null | FieldValue::Bool(_) => None,
        scalar => options
            .iter()
            .find(|option| matches_option(scalar, &option.value))
            .cloned()
            .map(Selection::Single),
    }
}

/// Primitive(s) to store for what the control reports; nothing picked reads
/// as the single-select empty value.
pub fn from_selection(selected: Option<&Selection>) -> FieldValue {
    from_selection_in(SelectMode::Single, selected)
}

pub fn from_selection_in(mode: SelectMode, selected: Option<&Selection>) -> FieldValue {
    match selected {
        Some(Selection::Single(pair)) => pair.value.to_field_value(),
        Some(Selection::Multi(pairs)) => FieldValue::List(
            pairs
                .iter()
                .map(|pair| pair.value.to_field_value())
                .collect(),
        ),
        None => mode.empty_value(),
    }
}

/// Like [`from_selection`] for a raw, untyped control report. Shapes other
/// than a pair or a list of pairs fall back to `""`.
pub fn from_control_value(raw: &FieldValue) -> FieldValue {
    match raw {
        FieldValue::Choice(pair) => pair.value.to_field_value(),
        FieldValue::List(items) => items
            .iter()
            .map(|item| match item {
                FieldValue::Choice(pair) => Some(pair.value.to_field_value()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(FieldValue::List)
            .unwrap_or_else(|| SelectMode::Single.empty_value()),
        _ => SelectMode::Single.empty_value(),
    }
}

/// Turns a stored primitive into the pair(s) a picker keeps in form state,
/// used when filling a form from loaded data.
pub fn hydrate_selection(value: &FieldValue, options: &[OptionPair]) -> FieldValue {
    match to_selection(value, options) {
        Some(Selection::Single(pair)) => FieldValue::Choice(pair),
        Some(Selection::Multi(pairs)) => {
            FieldValue::List(pairs.into_iter().map(FieldValue::Choice).collect())
        }
        None => SelectMode::Single.empty_value(),
    }
}

/// Replaces absent and null values with `""` so loaded records can seed a
/// form.
pub fn default_values<K, I>(data: I) -> Vec<(K, FieldValue)>
where
    I: IntoIterator<Item = (K, FieldValue)>,
{
    data.into_iter()
        .map(|(key, value)| match value {
            FieldValue::Missing | FieldValue::Null => (key, FieldValue::Text(String::new())),
            other => (key, other),
        })
        .collect()
}

fn matches_option(value: &FieldValue, option: &OptionValue) -> bool {
    match (value, option) {
        (FieldValue::Text(text), OptionValue::Text(candidate)) => text == candidate,
        (FieldValue::Number(number), OptionValue::Number(candidate)) => number == candidate,
        (FieldValue::Choice(pair), candidate) => pair.value == *candidate,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<OptionPair> {
        vec![OptionPair::new("S", 1), OptionPair::new("T", 2)]
    }

    #[test]
    fn array_round_trip() {
        let selection = to_selection(&FieldValue::list([2]), &options());
        assert_eq!(selection, Some(Selection::Multi(vec![OptionPair::new("T", 2)])));
        assert_eq!(from_selection(selection.as_ref()), FieldValue::list([2]));
    }

    #[test]
    fn single_round_trip() {
        let selection = to_selection(&FieldValue::number(1), &options());
        assert_eq!(selection, Some(Selection::Single(OptionPair::new("S", 1))));
        assert_eq!(from_selection(selection.as_ref()), FieldValue::number(1));
    }

    #[test]
    fn empty_multi_select_stays_a_list() {
        let selection = to_selection(&FieldValue::List(Vec::new()), &options());
        assert_eq!(selection, Some(Selection::Multi(Vec::new())));
        assert_eq!(
            from_selection(selection.as_ref()),
            FieldValue::List(Vec::new())
        );
    }

    #[test]
    fn unknown_value_has_no_selection() {
        assert_eq!(to_selection(&FieldValue::number(999), &options()), None);
        assert_eq!(to_selection(&FieldValue::number(1), &[]), None);
        assert_eq!(to_selection(&FieldValue::Null, &options()), None);
    }

    #[test]
    fn matching_is_strict_on_type() {
        assert_eq!(to_selection(&FieldValue::text("1"), &options()), None);
    }

    #[test]
    fn multi_select_order_follows_options() {
        let selection = to_selection(&FieldValue::list([2, 1]), &options());
        assert_eq!(
            selection.as_ref().map(Selection::pairs),
            Some(options().as_slice())
        );
    }

    #[test]
    fn choice_values_select_their_option() {
        let current = FieldValue::Choice(OptionPair::new("stale label", 2));
        assert_eq!(
            to_selection(&current, &options()),
            Some(Selection::Single(OptionPair::new("T", 2)))
        );
    }

    #[test]
    fn empty_representation_depends_on_mode() {
        assert_eq!(from_selection(None), FieldValue::text(""));
        assert_eq!(
            from_selection_in(SelectMode::Multi, None),
            FieldValue::List(Vec::new())
        );
    }

    #[test]
    fn raw_control_values_never_panic() {
        assert_eq!(
            from_control_value(&FieldValue::Choice(OptionPair::new("A", "a"))),
            FieldValue::text("a")
        );
        assert_eq!(
            from_control_value(&FieldValue::list([OptionPair::new("S", 1)])),
            FieldValue::list([1])
        );
        assert_eq!(from_control_value(&FieldValue::list([1])), FieldValue::text(""));
        assert_eq!(from_control_value(&FieldValue::Null), FieldValue::text(""));
        assert_eq!(from_control_value(&FieldValue::Bool(true)), FieldValue::text(""));
    }

    #[test]
    fn hydrate_restores_pairs_from_loaded_values() {
        assert_eq!(
            hydrate_selection(&FieldValue::number(2), &options()),
            FieldValue::Choice(OptionPair::new("T", 2))
        );
        assert_eq!(
            hydrate_selection(&FieldValue::list([1, 2]), &options()),
            FieldValue::list(options())
        );
        assert_eq!(
            hydrate_selection(&FieldValue::number(7), &options()),
            FieldValue::text("")
        );
    }

    #[test]
    fn default_values_blank_out_nulls() {
        let defaults = default_values([
            ("slogan", FieldValue::Null),
            ("name", FieldValue::text("Springfield")),
            ("about", FieldValue::Missing),
        ]);
        assert_eq!(
            defaults,
            vec![
                ("slogan", FieldValue::text("")),
                ("name", FieldValue::text("Springfield")),
                ("about", FieldValue::text("")),
            ]
        );
    }
}
