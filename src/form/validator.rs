use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::rules::{Directive, RuleSet};
use super::value::FieldValue;
use crate::i18n::{I18nManager, Locale, format_template};

/// Custom messages keyed by `"<directive>.<field>"` or `"<directive>"`.
pub type Messages = BTreeMap<String, String>;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .ok()
});

static URL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)https?://(www\.)?[-a-z0-9@:%._+~#=]{1,256}\.[a-z0-9()]{1,6}\b([-a-z0-9()@:%_+.~#?&/=]*)",
    )
    .ok()
});

static DATE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})[-/](\d{2})[-/](\d{2})([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .ok()
});

/// Where the rules for a field come from.
#[derive(Clone, Copy, Debug)]
pub enum FieldRules<'a> {
    Inline(&'a str),
    Keyed(&'a BTreeMap<String, String>),
}

impl<'a> FieldRules<'a> {
    fn for_field(self, name: &str) -> &'a str {
        match self {
            FieldRules::Inline(rules) => rules,
            FieldRules::Keyed(rules) => rules.get(name).map(String::as_str).unwrap_or(""),
        }
    }
}

impl<'a> From<&'a str> for FieldRules<'a> {
    fn from(value: &'a str) -> Self {
        FieldRules::Inline(value)
    }
}

impl<'a> From<&'a String> for FieldRules<'a> {
    fn from(value: &'a String) -> Self {
        FieldRules::Inline(value)
    }
}

impl<'a> From<&'a BTreeMap<String, String>> for FieldRules<'a> {
    fn from(value: &'a BTreeMap<String, String>) -> Self {
        FieldRules::Keyed(value)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldError {
    field: String,
    directive: &'static str,
    message: String,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        directive: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            directive,
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn directive(&self) -> &'static str {
        self.directive
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FieldError {}

/// Rule evaluator bound to a message catalog and optional custom messages.
#[derive(Clone, Debug, Default)]
pub struct Validator {
    i18n: I18nManager,
    messages: Messages,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(locale: impl Into<Locale>) -> Self {
        Self::with_i18n(I18nManager::with_locale(locale))
    }

    pub fn with_i18n(i18n: I18nManager) -> Self {
        Self {
            i18n,
            messages: Messages::new(),
        }
    }

    pub fn messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn i18n(&self) -> &I18nManager {
        &self.i18n
    }

    pub fn validate<'a>(
        &self,
        name: &str,
        value: &FieldValue,
        rules: impl Into<FieldRules<'a>>,
    ) -> Result<(), FieldError> {
        self.validate_with_messages(name, value, rules, None)
    }

    pub fn validate_with_messages<'a>(
        &self,
        name: &str,
        value: &FieldValue,
        rules: impl Into<FieldRules<'a>>,
        messages: Option<&Messages>,
    ) -> Result<(), FieldError> {
        let rules = RuleSet::parse(rules.into().for_field(name));
        let value = value.clone().into_primitive();
        let filled = passes_required(&value);

        for directive in rules.directives() {
            // Lists are always checked, so `[]` still fails `array|min:1`.
            if !directive.is_implicit() && !filled && !matches!(value, FieldValue::List(_)) {
                continue;
            }
            if passes(directive, &value, &rules) {
                continue;
            }
            let message = self.message_for(name, directive, &value, &rules, messages);
            tracing::trace!(field = name, directive = directive.name(), "field failed validation");
            return Err(FieldError::new(name, directive.name(), message));
        }
        Ok(())
    }

    fn message_for(
        &self,
        name: &str,
        directive: &Directive,
        value: &FieldValue,
        rules: &RuleSet,
        messages: Option<&Messages>,
    ) -> String {
        let attribute = attribute_name(name);
        let bound;
        let values;
        let mut params = vec![("attribute", attribute.as_str())];
        match directive {
            Directive::Min(limit) => {
                bound = limit.normalize().to_string();
                params.push(("min", bound.as_str()));
            }
            Directive::Max(limit) => {
                bound = limit.normalize().to_string();
                params.push(("max", bound.as_str()));
            }
            Directive::In(list) | Directive::NotIn(list) => {
                values = list.join(", ");
                params.push(("values", values.as_str()));
            }
            _ => {}
        }

        let scoped = format!("{}.{name}", directive.name());
        let custom = [messages, Some(&self.messages)]
            .into_iter()
            .flatten()
            .find_map(|map| map.get(&scoped).or_else(|| map.get(directive.name())));
        if let Some(template) = custom {
            return format_template(template, &params);
        }

        let key = match directive {
            Directive::Min(_) | Directive::Max(_) => {
                format!("validation.{}.{}", directive.name(), size_kind(value, rules))
            }
            _ => format!("validation.{}", directive.name()),
        };
        self.i18n.t_with(&key, &params)
    }
}

/// Validates one field against its rules with the default catalog.
///
/// `Ok(())` means every directive passed; otherwise the first failing
/// directive's message is returned.
pub fn validate_field<'a>(
    name: &str,
    value: &FieldValue,
    rules: impl Into<FieldRules<'a>>,
    messages: Option<&Messages>,
) -> Result<(), FieldError> {
    Validator::new().validate_with_messages(name, value, rules, messages)
}

/// `first_name` becomes `first name`, `roles[0]` becomes `roles 0`.
pub fn attribute_name(name: &str) -> String {
    name.replace(['_', '['], " ").replace(']', "")
}

fn passes_required(value: &FieldValue) -> bool {
    match value {
        FieldValue::Missing | FieldValue::Null => false,
        other => other
            .to_plain_string()
            .chars()
            .any(|character| !character.is_whitespace()),
    }
}

fn passes(directive: &Directive, value: &FieldValue, rules: &RuleSet) -> bool {
    match directive {
        Directive::Required => passes_required(value),
        Directive::Present => !value.is_missing(),
        Directive::String => matches!(value, FieldValue::Text(_)),
        Directive::Integer => is_integer(value),
        Directive::Numeric => is_numeric(value),
        Directive::Email => matches_pattern(&EMAIL_PATTERN, value),
        Directive::Url => matches_pattern(&URL_PATTERN, value),
        Directive::Array => matches!(value, FieldValue::List(_)),
        Directive::AlphaNum => {
            let text = value.to_plain_string();
            !text.is_empty() && text.chars().all(|character| character.is_ascii_alphanumeric())
        }
        Directive::Date => value.as_text().is_some_and(is_valid_date),
        Directive::Boolean => match value {
            FieldValue::Bool(_) => true,
            FieldValue::Number(number) => number.is_zero() || *number == Decimal::ONE,
            FieldValue::Text(text) => matches!(text.as_str(), "true" | "false" | "0" | "1"),
            _ => false,
        },
        Directive::Min(limit) => size_of(value, rules).is_some_and(|size| size >= *limit),
        Directive::Max(limit) => size_of(value, rules).is_some_and(|size| size <= *limit),
        Directive::In(list) => match value {
            FieldValue::List(items) => items.iter().all(|item| contains(list, item)),
            other => contains(list, other),
        },
        Directive::NotIn(list) => match value {
            FieldValue::List(items) => !items.iter().any(|item| contains(list, item)),
            other => !contains(list, other),
        },
    }
}

fn contains(list: &[String], value: &FieldValue) -> bool {
    let literal = value.to_plain_string();
    list.iter().any(|candidate| *candidate == literal)
}

fn is_integer(value: &FieldValue) -> bool {
    match value {
        FieldValue::Number(number) => number.fract().is_zero(),
        FieldValue::Text(text) => text
            .parse::<i64>()
            .is_ok_and(|parsed| parsed.to_string() == *text),
        _ => false,
    }
}

fn is_numeric(value: &FieldValue) -> bool {
    match value {
        FieldValue::Number(_) => true,
        FieldValue::Text(text) => is_number_literal(text.trim()),
        _ => false,
    }
}

/// Decimal and exponent forms, signed `Infinity`, and unsigned `0x`/`0o`/`0b`
/// literals. Rust-only spellings such as `inf` or `nan` are rejected.
fn is_number_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned == "Infinity" {
        return true;
    }
    let lower = text.get(..2).map(str::to_ascii_lowercase);
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if lower.as_deref() == Some(prefix) {
            let digits = &text[2..];
            return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
        }
    }
    text.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && text.parse::<f64>().is_ok()
}

fn matches_pattern(pattern: &LazyLock<Option<Regex>>, value: &FieldValue) -> bool {
    let Some(text) = value.as_text() else {
        return false;
    };
    pattern.as_ref().is_some_and(|regex| regex.is_match(text))
}

fn size_of(value: &FieldValue, rules: &RuleSet) -> Option<Decimal> {
    match value {
        FieldValue::List(items) => Some(Decimal::from(items.len())),
        FieldValue::Number(number) => Some(*number),
        FieldValue::Text(text) if rules.has_numeric_rule() => Decimal::from_str(text.trim()).ok(),
        FieldValue::Text(text) => Some(Decimal::from(text.chars().count())),
        _ => None,
    }
}

fn size_kind(value: &FieldValue, rules: &RuleSet) -> &'static str {
    match value {
        FieldValue::List(_) => "array",
        FieldValue::Number(_) => "numeric",
        _ if rules.has_numeric_rule() => "numeric",
        _ => "string",
    }
}

fn is_valid_date(text: &str) -> bool {
    let Some(captures) = DATE_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(text))
    else {
        return false;
    };
    let part = |index: usize| {
        captures
            .get(index)
            .and_then(|matched| matched.as_str().parse::<u32>().ok())
    };
    let (Some(year), Some(month), Some(day)) = (part(1), part(2), part(3)) else {
        return false;
    };
    (1..=12).contains(&month) && day >= 1 && day <= days_in_month(year, month)
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::value::OptionPair;

    fn check(value: impl Into<FieldValue>, rules: &str) -> Result<(), FieldError> {
        validate_field("field", &value.into(), rules, None)
    }

    fn message(value: impl Into<FieldValue>, name: &str, rules: &str) -> String {
        validate_field(name, &value.into(), rules, None)
            .expect_err("value should fail")
            .message()
            .to_string()
    }

    #[test]
    fn required_rejects_empty_and_accepts_filled() {
        assert_eq!(message("", "x", "required"), "The x field is required.");
        assert!(check("a", "required").is_ok());
        assert!(check(FieldValue::Null, "required").is_err());
        assert!(check(FieldValue::Missing, "required").is_err());
        assert!(check("   ", "required").is_err());
        assert!(check(false, "required").is_ok());
        assert!(check(0, "required").is_ok());
    }

    #[test]
    fn repeated_calls_return_identical_results() {
        let value = FieldValue::text("not-an-email");
        let first = validate_field("email", &value, "required|email", None);
        let second = validate_field("email", &value, "required|email", None);
        assert_eq!(first, second);
        assert_eq!(first.expect_err("invalid email").directive(), "email");
    }

    #[test]
    fn option_pairs_validate_their_underlying_value() {
        let picked = FieldValue::Choice(OptionPair::new("A", "a"));
        assert!(validate_field("x", &picked, "required", None).is_ok());

        let role = FieldValue::Choice(OptionPair::new("Admin", 2));
        assert!(validate_field("role", &role, "required|integer", None).is_ok());
        assert!(validate_field("role", &role, "string", None).is_err());
    }

    #[test]
    fn keyed_rules_apply_to_the_named_field_only() {
        let rules = BTreeMap::from([("roles".to_string(), "required|array".to_string())]);
        let empty = FieldValue::List(Vec::new());
        assert_eq!(
            validate_field("roles", &empty, &rules, None)
                .expect_err("empty roles are required")
                .directive(),
            "required"
        );
        assert!(validate_field("other", &empty, &rules, None).is_ok());
        assert!(validate_field("roles", &FieldValue::list([1, 2]), &rules, None).is_ok());
    }

    #[test]
    fn non_implicit_directives_skip_empty_values() {
        assert!(check("", "string|url|present").is_ok());
        assert!(check(FieldValue::List(Vec::new()), "array").is_ok());
        assert!(check(FieldValue::Null, "email").is_ok());
        assert_eq!(
            message(FieldValue::Missing, "website", "string|url|present"),
            "The website field must be present (but can be empty)."
        );
        assert!(check(FieldValue::Null, "present").is_ok());
    }

    #[test]
    fn empty_lists_are_still_validated() {
        let empty = FieldValue::List(Vec::new());
        assert_eq!(
            message(empty.clone(), "roles", "array|min:1"),
            "The roles must have at least 1 items."
        );
        assert!(check(empty.clone(), "array|max:2").is_ok());
        assert!(check(empty.clone(), "string").is_err());
        assert!(check(empty, "integer").is_err());
    }

    #[test]
    fn numeric_follows_number_literals() {
        assert!(check("1e3", "numeric").is_ok());
        assert!(check(".5", "numeric").is_ok());
        assert!(check("-Infinity", "numeric").is_ok());
        assert!(check("Infinity", "numeric").is_ok());
        assert!(check("0x1F", "numeric").is_ok());
        assert!(check("0b101", "numeric").is_ok());
        assert!(check("0o17", "numeric").is_ok());
        assert!(check("0x", "numeric").is_err());
        assert!(check("-0x10", "numeric").is_err());
        assert!(check("inf", "numeric").is_err());
        assert!(check("nan", "numeric").is_err());
        assert!(check("infinity", "numeric").is_err());
        assert!(check("12abc", "numeric").is_err());
    }

    #[test]
    fn type_directives() {
        assert!(check("abc", "string").is_ok());
        assert_eq!(message(5, "first_name", "string"), "The first name must be a string.");
        assert!(check(12, "integer").is_ok());
        assert!(check("12", "integer").is_ok());
        assert!(check("12.5", "integer").is_err());
        assert!(check("012", "integer").is_err());
        assert!(check(" 3.5 ", "numeric").is_ok());
        assert!(check("NaN", "numeric").is_err());
        assert!(check("abc", "array").is_err());
        assert!(check(FieldValue::list(["a"]), "array").is_ok());
        assert!(check("1", "boolean").is_ok());
        assert!(check("yes", "boolean").is_err());
    }

    #[test]
    fn email_and_url_patterns() {
        assert!(check("principal@school.edu", "email").is_ok());
        assert!(check("\"quoted name\"@school.edu", "email").is_ok());
        assert_eq!(message("principal@school", "email", "email"), "The email format is invalid.");
        assert!(check("a b@school.edu", "email").is_err());
        assert!(check("https://www.school.edu/about?x=1", "url").is_ok());
        assert!(check("HTTP://school.org", "url").is_ok());
        assert!(check("school.org", "url").is_err());
        assert!(check("ftp://school.org", "url").is_err());
        assert!(check("see https://school.org", "url").is_ok());
        assert!(check("homepage: http://www.school.edu/staff", "url").is_ok());
    }

    #[test]
    fn min_and_max_depend_on_value_kind() {
        assert_eq!(
            message("short", "password", "string|min:8"),
            "The password must be at least 8 characters."
        );
        assert!(check("long enough", "string|min:8").is_ok());
        assert_eq!(message("7", "age", "integer|min:8"), "The age must be at least 8.");
        assert!(check("9", "integer|min:8").is_ok());
        assert!(check(FieldValue::list([1, 2, 3]), "array|max:2").is_err());
        assert_eq!(
            message(FieldValue::list([1, 2, 3]), "roles", "array|max:2"),
            "The roles may not have more than 2 items."
        );
        assert!(check("héllo", "max:5").is_ok());
    }

    #[test]
    fn enumerated_literals() {
        assert!(check("B", "in:A,B,C").is_ok());
        assert_eq!(message("D", "grade", "in:A,B,C"), "The selected grade is invalid.");
        assert!(check(2, "in:1,2").is_ok());
        assert!(check(FieldValue::list(["A", "C"]), "in:A,B,C").is_ok());
        assert!(check(FieldValue::list(["A", "D"]), "in:A,B,C").is_err());
        assert!(check("A", "not_in:A,B").is_err());
    }

    #[test]
    fn alpha_num_and_date() {
        assert!(check("Passw0rd", "alpha_num").is_ok());
        assert!(check("pass word", "alpha_num").is_err());
        assert!(check("2012-02-29", "date").is_ok());
        assert!(check("2013-02-29", "date").is_err());
        assert!(check("2020/12/01 08:30", "date").is_ok());
        assert!(check("01-12-2020", "date").is_err());
    }

    #[test]
    fn first_failing_directive_wins() {
        let error = validate_field("password", &"ab cd".into(), "alpha_num|min:8", None)
            .expect_err("invalid password");
        assert_eq!(error.directive(), "alpha_num");
        assert_eq!(error.field(), "password");
    }

    #[test]
    fn malformed_rules_degrade_to_passing() {
        assert!(check("", "requird|min:abc").is_ok());
        assert!(check("", "requird|required").is_err());
    }

    #[test]
    fn custom_messages_take_precedence() {
        let messages = Messages::from([
            ("required.email".to_string(), "We need your {attribute}.".to_string()),
            ("min".to_string(), "Too short, needs {min}.".to_string()),
        ]);
        let email = validate_field("email", &"".into(), "required", Some(&messages));
        assert_eq!(email.expect_err("empty").message(), "We need your email.");
        let name = validate_field("name", &"".into(), "required", Some(&messages));
        assert_eq!(name.expect_err("empty").message(), "The name field is required.");

        let validator = Validator::new().messages(messages);
        let short = validator.validate("password", &"abc".into(), "min:8");
        assert_eq!(short.expect_err("short").message(), "Too short, needs 8.");
    }

    #[test]
    fn localized_messages() {
        let validator = Validator::with_locale("zh-CN");
        let error = validator
            .validate("email", &FieldValue::Missing, "required")
            .expect_err("missing");
        assert_eq!(error.message(), "email 为必填项。");
        assert_eq!(error.to_string(), error.message());
    }
}
