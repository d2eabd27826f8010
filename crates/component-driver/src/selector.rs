//! Selectors for querying a mounted tree.
//!
//! Tests locate elements through a semantic hook attribute rather than
//! visual structure, so markup can change without breaking queries.

use std::collections::BTreeMap;

/// Attribute carrying an element's semantic hook
pub const DATA_HOOK_ATTRIBUTE: &str = "data-hook";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Semantic hook selector (`data-hook` attribute)
    DataHook(String),
    /// Tag name selector
    Tag(String),
    /// Attribute equality selector
    Attribute {
        /// Attribute name
        name: String,
        /// Expected value
        value: String,
    },
}

impl Selector {
    /// Create a tag selector
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Create an attribute selector
    #[must_use]
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check an element's tag and attributes against this selector
    #[must_use]
    pub fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
        match self {
            Self::DataHook(hook) => attributes
                .get(DATA_HOOK_ATTRIBUTE)
                .is_some_and(|value| value == hook),
            Self::Tag(expected) => tag == expected,
            Self::Attribute { name, value } => attributes.get(name) == Some(value),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataHook(hook) => write!(f, "[{DATA_HOOK_ATTRIBUTE}=\"{hook}\"]"),
            Self::Tag(tag) => f.write_str(tag),
            Self::Attribute { name, value } => write!(f, "[{name}=\"{value}\"]"),
        }
    }
}

/// Selector matching elements tagged with a semantic hook
#[must_use]
pub fn by_data_hook(hook: impl Into<String>) -> Selector {
    Selector::DataHook(hook.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_data_hook_matches_attribute() {
        let selector = by_data_hook("child");
        assert!(selector.matches("span", &attrs(&[("data-hook", "child")])));
        assert!(!selector.matches("span", &attrs(&[("data-hook", "other")])));
        assert!(!selector.matches("span", &attrs(&[])));
    }

    #[test]
    fn test_tag_and_attribute() {
        assert!(Selector::tag("div").matches("div", &attrs(&[])));
        assert!(!Selector::tag("div").matches("span", &attrs(&[])));
        let sel = Selector::attribute("role", "button");
        assert!(sel.matches("a", &attrs(&[("role", "button")])));
        assert!(!sel.matches("a", &attrs(&[("role", "link")])));
    }

    #[test]
    fn test_display() {
        assert_eq!(by_data_hook("x").to_string(), "[data-hook=\"x\"]");
        assert_eq!(Selector::tag("li").to_string(), "li");
    }
}
