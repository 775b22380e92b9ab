//! Declarative form validation.
//!
//! A [`Form`] wraps the submitted [`FormValues`] and accumulates messages in
//! [`FormErrors`] as rules are applied. Rules never touch the values, so a
//! rejected form can be rendered back with whatever the user typed.

mod errors;

pub use errors::FormErrors;

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Loose e-mail shape check (the WHATWG `type=email` pattern)
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("EMAIL_RX is a valid pattern")
});

const BLANK: &str = "This field cannot be blank";
const INVALID: &str = "This field is invalid";
const MISMATCH: &str = "The values do not match";

/// Submitted field values. A field may carry zero, one or many values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(HashMap<String, Vec<String>>);

impl FormValues {
    /// Decode an `application/x-www-form-urlencoded` body
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
        Ok(pairs.into_iter().collect())
    }

    /// First value of `field`, if any
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|values| values.first()).map(String::as_str)
    }

    /// First value of `field`, or the empty string when absent
    pub fn get(&self, field: &str) -> &str {
        self.first(field).unwrap_or_default()
    }

    /// All values submitted for `field`
    pub fn get_all(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.0.insert(field.to_string(), vec![value.into()]);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (field, value) in iter {
            values.entry(field.into()).or_default().push(value.into());
        }
        Self(values)
    }
}

/// Submitted values plus the errors found while validating them
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: FormValues,
    pub errors: FormErrors,
}

impl Form {
    #[must_use]
    pub fn new(values: FormValues) -> Self {
        Self { values, errors: FormErrors::default() }
    }

    /// First value of `field`, or `""`
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Each field must be non-empty after trimming whitespace
    pub fn required(&mut self, fields: &[&str]) {
        for field in fields {
            if self.values.get(field).trim().is_empty() {
                self.errors.add(field, BLANK);
            }
        }
    }

    /// At most `max` characters (not bytes)
    pub fn max_length(&mut self, field: &str, max: usize) {
        let value = self.values.get(field);
        if !value.is_empty() && value.chars().count() > max {
            self.errors
                .add(field, format!("This field is too long (maximum is {max} characters)"));
        }
    }

    /// At least `min` characters (not bytes)
    pub fn min_length(&mut self, field: &str, min: usize) {
        let value = self.values.get(field);
        if !value.is_empty() && value.chars().count() < min {
            self.errors
                .add(field, format!("This field is too short (minimum is {min} characters)"));
        }
    }

    /// Value must equal one of `allowed` exactly
    pub fn permitted_values(&mut self, field: &str, allowed: &[&str]) {
        let value = self.values.get(field);
        if !value.is_empty() && !allowed.contains(&value) {
            self.errors.add(field, INVALID);
        }
    }

    pub fn matches_pattern(&mut self, field: &str, pattern: &Regex) {
        let value = self.values.get(field);
        if !value.is_empty() && !pattern.is_match(value) {
            self.errors.add(field, INVALID);
        }
    }

    /// `confirmation` must repeat `field`. The error lands on `confirmation`.
    pub fn matches(&mut self, field: &str, confirmation: &str) {
        let first = self.values.get(field);
        let second = self.values.get(confirmation);
        if !first.is_empty() && !second.is_empty() && first != second {
            self.errors.add(confirmation, MISMATCH);
        }
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }
}
