use crate::graph::{Field, FormData};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-z\-0-9]+\.)+[a-z]{2,}))$"#,
    )
    .ok()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Trims surrounding whitespace and drops every `<` and `>`. Missing input
/// cleans to the empty string.
pub fn clean_input<'a>(raw: impl Into<Option<&'a str>>) -> String {
    let Some(raw) = raw.into() else {
        return String::new();
    };
    raw.trim()
        .chars()
        .filter(|ch| *ch != '<' && *ch != '>')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Format-only check; no lookup of the domain is attempted.
pub fn validate_email<'a>(value: impl Into<Option<&'a str>>) -> bool {
    let Some(value) = value.into() else {
        return false;
    };
    EMAIL_REGEX
        .as_ref()
        .is_some_and(|regex| regex.is_match(value))
}

/// Required-ness is checked before any field specific rule.
pub fn validate_field(
    field: &Field,
    value: &str,
    form_data: &FormData,
) -> Result<(), ValidationError> {
    if field.required && value.is_empty() {
        return Err(ValidationError::new(format!("{} is required!", field.label)));
    }
    match field.name {
        "email" if !validate_email(value) => Err(ValidationError::new(
            "Please enter a valid email address!",
        )),
        "confirmPassword" if form_data.get("password").map(String::as_str) != Some(value) => {
            Err(ValidationError::new("Passwords do not match!"))
        }
        _ => Ok(()),
    }
}
