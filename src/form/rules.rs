use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;

/// One token of a pipe-delimited rule string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Directive {
    Required,
    Present,
    String,
    Integer,
    Numeric,
    Email,
    Url,
    Array,
    AlphaNum,
    Date,
    Boolean,
    Min(Decimal),
    Max(Decimal),
    In(Vec<String>),
    NotIn(Vec<String>),
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::Required => "required",
            Directive::Present => "present",
            Directive::String => "string",
            Directive::Integer => "integer",
            Directive::Numeric => "numeric",
            Directive::Email => "email",
            Directive::Url => "url",
            Directive::Array => "array",
            Directive::AlphaNum => "alpha_num",
            Directive::Date => "date",
            Directive::Boolean => "boolean",
            Directive::Min(_) => "min",
            Directive::Max(_) => "max",
            Directive::In(_) => "in",
            Directive::NotIn(_) => "not_in",
        }
    }

    /// Implicit directives still run when the value is empty; every other
    /// directive is skipped for empty values.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Directive::Required | Directive::Present)
    }

    fn parse_token(token: &str) -> Result<Self, RuleParseError> {
        let (name, parameter) = match token.split_once(':') {
            Some((name, parameter)) => (name.trim(), Some(parameter.trim())),
            None => (token, None),
        };

        let directive = match name {
            "required" => Directive::Required,
            "present" => Directive::Present,
            "string" => Directive::String,
            "integer" => Directive::Integer,
            "numeric" => Directive::Numeric,
            "email" => Directive::Email,
            "url" => Directive::Url,
            "array" => Directive::Array,
            "alpha_num" => Directive::AlphaNum,
            "date" => Directive::Date,
            "boolean" => Directive::Boolean,
            "min" => Directive::Min(size_parameter("min", parameter)?),
            "max" => Directive::Max(size_parameter("max", parameter)?),
            "in" => Directive::In(list_parameter("in", parameter)?),
            "not_in" => Directive::NotIn(list_parameter("not_in", parameter)?),
            _ => return Err(RuleParseError::UnknownDirective(name.to_string())),
        };
        Ok(directive)
    }
}

fn size_parameter(
    directive: &'static str,
    parameter: Option<&str>,
) -> Result<Decimal, RuleParseError> {
    let parameter = parameter
        .filter(|value| !value.is_empty())
        .ok_or(RuleParseError::MissingParameter(directive))?;
    Decimal::from_str(parameter).map_err(|_| RuleParseError::InvalidParameter {
        directive,
        parameter: parameter.to_string(),
    })
}

fn list_parameter(
    directive: &'static str,
    parameter: Option<&str>,
) -> Result<Vec<String>, RuleParseError> {
    let parameter = parameter
        .filter(|value| !value.is_empty())
        .ok_or(RuleParseError::MissingParameter(directive))?;
    Ok(parameter.split(',').map(|item| item.trim().to_string()).collect())
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuleParseError {
    UnknownDirective(String),
    MissingParameter(&'static str),
    InvalidParameter {
        directive: &'static str,
        parameter: String,
    },
}

impl Display for RuleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleParseError::UnknownDirective(name) => {
                write!(f, "unknown validation directive `{name}`")
            }
            RuleParseError::MissingParameter(directive) => {
                write!(f, "directive `{directive}` requires a parameter")
            }
            RuleParseError::InvalidParameter {
                directive,
                parameter,
            } => write!(f, "invalid parameter `{parameter}` for directive `{directive}`"),
        }
    }
}

impl std::error::Error for RuleParseError {}

/// Parsed form of a rule string such as `"string|min:8"`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleSet {
    directives: Vec<Directive>,
    rejected: Vec<(String, RuleParseError)>,
}

impl RuleSet {
    /// Lenient parse: tokens that do not parse are set aside and never fail a
    /// value.
    pub fn parse(rules: &str) -> Self {
        let mut set = RuleSet::default();
        for token in tokens(rules) {
            match Directive::parse_token(token) {
                Ok(directive) => set.directives.push(directive),
                Err(error) => set.rejected.push((token.to_string(), error)),
            }
        }
        set
    }

    pub fn parse_strict(rules: &str) -> Result<Self, RuleParseError> {
        let set = Self::parse(rules);
        match set.rejected.into_iter().next() {
            Some((_, error)) => Err(error),
            None => Ok(RuleSet {
                directives: set.directives,
                rejected: Vec::new(),
            }),
        }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn rejected(&self) -> &[(String, RuleParseError)] {
        &self.rejected
    }

    pub fn is_required(&self) -> bool {
        self.directives.contains(&Directive::Required)
    }

    pub fn has_numeric_rule(&self) -> bool {
        self.directives
            .iter()
            .any(|directive| matches!(directive, Directive::Integer | Directive::Numeric))
    }
}

fn tokens(rules: &str) -> impl Iterator<Item = &str> {
    rules
        .split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
