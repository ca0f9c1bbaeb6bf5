use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// The primitive carried by a picker option.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum OptionValue {
    Text(String),
    Number(Decimal),
}

impl OptionValue {
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            OptionValue::Text(text) => FieldValue::Text(text.clone()),
            OptionValue::Number(number) => FieldValue::Number(*number),
        }
    }
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Text(text) => f.write_str(text),
            OptionValue::Number(number) => write!(f, "{}", number.normalize()),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<Decimal> for OptionValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

/// A `{label, value}` pair exchanged with picker controls.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct OptionPair {
    pub label: String,
    pub value: OptionValue,
}

impl OptionPair {
    pub fn new(label: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Dynamic value of a single form field.
///
/// `Missing` is a key that was never supplied and `Null` an explicit null.
/// Only `present` tells them apart.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum FieldValue {
    #[default]
    Missing,
    Null,
    Bool(bool),
    Text(String),
    Number(Decimal),
    List(Vec<FieldValue>),
    Choice(OptionPair),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(value: impl Into<Decimal>) -> Self {
        Self::Number(value.into())
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Replaces option pairs with their underlying primitive, element-wise
    /// for lists.
    pub fn into_primitive(self) -> Self {
        match self {
            FieldValue::Choice(pair) => pair.value.to_field_value(),
            FieldValue::List(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::into_primitive).collect())
            }
            other => other,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// String form used by directives that compare literals, with lists
    /// joined by commas.
    pub fn to_plain_string(&self) -> String {
        match self {
            FieldValue::Missing => "undefined".to_string(),
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(value) => value.to_string(),
            FieldValue::Text(text) => text.clone(),
            FieldValue::Number(number) => number.normalize().to_string(),
            FieldValue::List(items) => items
                .iter()
                .map(|item| match item {
                    FieldValue::Missing | FieldValue::Null => String::new(),
                    other => other.to_plain_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            FieldValue::Choice(pair) => pair.value.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(Decimal::from(value))
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<OptionPair> for FieldValue {
    fn from(value: OptionPair) -> Self {
        Self::Choice(value)
    }
}

impl From<OptionValue> for FieldValue {
    fn from(value: OptionValue) -> Self {
        value.to_field_value()
    }
}

pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

/// Conversion back from a dynamic value into a typed model field.
///
/// `None` means the value has no representation in `Self`; callers leave the
/// field untouched in that case.
pub trait FromFieldValue: Sized {
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

impl ToFieldValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }
}

impl FromFieldValue for FieldValue {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        Some(value)
    }
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

impl FromFieldValue for String {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value.into_primitive() {
            FieldValue::Missing | FieldValue::Null => Some(String::new()),
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(number) => Some(number.normalize().to_string()),
            FieldValue::Bool(value) => Some(value.to_string()),
            FieldValue::List(_) | FieldValue::Choice(_) => None,
        }
    }
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl FromFieldValue for bool {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value.into_primitive() {
            FieldValue::Bool(value) => Some(value),
            FieldValue::Text(text) => match text.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            FieldValue::Number(number) if number.is_zero() => Some(false),
            FieldValue::Number(number) if number == Decimal::ONE => Some(true),
            _ => None,
        }
    }
}

impl ToFieldValue for Decimal {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Number(*self)
    }
}

impl FromFieldValue for Decimal {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value.into_primitive() {
            FieldValue::Number(number) => Some(number),
            FieldValue::Text(text) => Decimal::from_str(text.trim()).ok(),
            _ => None,
        }
    }
}

macro_rules! integer_field_value {
    ($($ty:ty => $to:ident),* $(,)?) => {
        $(
            impl ToFieldValue for $ty {
                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Number(Decimal::from(*self))
                }
            }

            impl FromFieldValue for $ty {
                fn from_field_value(value: FieldValue) -> Option<Self> {
                    match value.into_primitive() {
                        FieldValue::Number(number) if number.fract().is_zero() => number.$to(),
                        FieldValue::Text(text) => text.trim().parse().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_field_value!(i32 => to_i32, i64 => to_i64, u32 => to_u32, u64 => to_u64);

impl ToFieldValue for OptionPair {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Choice(self.clone())
    }
}

impl FromFieldValue for OptionPair {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Choice(pair) => Some(pair),
            _ => None,
        }
    }
}

impl ToFieldValue for OptionValue {
    fn to_field_value(&self) -> FieldValue {
        OptionValue::to_field_value(self)
    }
}

impl FromFieldValue for OptionValue {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value.into_primitive() {
            FieldValue::Text(text) => Some(OptionValue::Text(text)),
            FieldValue::Number(number) => Some(OptionValue::Number(number)),
            _ => None,
        }
    }
}

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Missing | FieldValue::Null => Some(None),
            FieldValue::Text(ref text) if text.is_empty() => Some(None),
            other => T::from_field_value(other).map(Some),
        }
    }
}

impl<T: ToFieldValue> ToFieldValue for Vec<T> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(ToFieldValue::to_field_value).collect())
    }
}

impl<T: FromFieldValue> FromFieldValue for Vec<T> {
    fn from_field_value(value: FieldValue) -> Option<Self> {
        match value {
            FieldValue::Missing | FieldValue::Null => Some(Vec::new()),
            FieldValue::Text(ref text) if text.is_empty() => Some(Vec::new()),
            FieldValue::List(items) => items.into_iter().map(T::from_field_value).collect(),
            _ => None,
        }
    }
}
