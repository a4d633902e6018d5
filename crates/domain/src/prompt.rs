use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Marker appended to slot values cut down to their length limit.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Caller-supplied interpolation value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// Free text inserted verbatim.
    Text(String),
    /// Whole number rendered exactly.
    Integer(i64),
    /// Numeric value rendered with its shortest decimal form.
    Number(f64),
}

impl ContextValue {
    /// Returns the value cut to `max_chars` characters, marking the cut.
    #[must_use]
    pub fn truncated(&self, max_chars: usize) -> Self {
        match self {
            Self::Text(text) if text.chars().count() > max_chars => {
                let mut cut: String = text.chars().take(max_chars).collect();
                cut.push_str(TRUNCATION_MARKER);
                Self::Text(cut)
            }
            other => other.clone(),
        }
    }
}

impl Display for ContextValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => formatter.write_str(text),
            Self::Integer(integer) => write!(formatter, "{integer}"),
            Self::Number(number) => write!(formatter, "{number}"),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

/// Named interpolation values for one prompt.
///
/// Values are not validated or escaped: whatever the caller supplies is
/// inserted verbatim, and a missing slot renders as empty text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptContext {
    values: BTreeMap<String, ContextValue>,
}

impl PromptContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context with one more slot value.
    #[must_use]
    pub fn with(mut self, slot: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(slot, value);
        self
    }

    /// Sets a slot value, replacing any previous one.
    pub fn insert(&mut self, slot: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(slot.into(), value.into());
    }

    /// Returns the value bound to a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&ContextValue> {
        self.values.get(slot)
    }

    /// Returns whether no slot is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates bound slots in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.values.iter().map(|(slot, value)| (slot.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for PromptContext
where
    K: Into<String>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (slot, value) in iter {
            context.insert(slot, value);
        }
        context
    }
}

/// Prompt text with `{{slot}}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    body: &'static str,
}

impl PromptTemplate {
    /// Creates a template from a static body.
    #[must_use]
    pub const fn new(body: &'static str) -> Self {
        Self { body }
    }

    /// Returns the raw template body.
    #[must_use]
    pub fn body(&self) -> &'static str {
        self.body
    }

    /// Returns slot names in order of first appearance.
    #[must_use]
    pub fn slots(&self) -> Vec<&'static str> {
        let mut slots = Vec::new();
        let mut rest = self.body;
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                break;
            };
            let slot = after[..end].trim();
            if !slots.contains(&slot) {
                slots.push(slot);
            }
            rest = &after[end + 2..];
        }
        slots
    }

    /// Renders the template against a context.
    ///
    /// Substituted values are never re-scanned for placeholders.
    #[must_use]
    pub fn interpolate(&self, context: &PromptContext) -> String {
        let mut rendered = String::with_capacity(self.body.len());
        let mut rest = self.body;

        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rendered.push_str(&rest[start..]);
                rest = "";
                break;
            };

            if let Some(value) = context.get(after[..end].trim()) {
                rendered.push_str(value.to_string().as_str());
            }
            rest = &after[end + 2..];
        }

        rendered.push_str(rest);
        rendered
    }
}
