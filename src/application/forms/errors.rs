use std::collections::HashMap;

/// Validation messages keyed by field name, in the order they were added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(HashMap<String, Vec<String>>);

impl FormErrors {
    /// Record another message for `field`
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    /// The first message recorded for `field`, which is the one shown to the user
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|messages| messages.first()).map(String::as_str)
    }

    /// Every message recorded for `field`
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields carrying at least one message
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
