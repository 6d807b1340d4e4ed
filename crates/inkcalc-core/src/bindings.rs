//! Variable bindings carried between solves.

use crate::solver::ResultItem;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Values assigned by earlier solves, keyed by expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBindings {
    vars: HashMap<String, String>,
}

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `value`, replacing any earlier value.
    pub fn assign(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Record every assignment in `items`, in order. Returns how many were
    /// applied.
    pub fn apply(&mut self, items: &[ResultItem]) -> usize {
        let mut applied = 0;
        for item in items.iter().filter(|item| item.is_assignment) {
            log::debug!("Binding {} = {}", item.expression, item.answer);
            self.assign(item.expression.clone(), item.answer.clone());
            applied += 1;
        }
        applied
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_assignments() {
        let mut bindings = VariableBindings::new();
        let applied = bindings.apply(&[
            ResultItem::new("2+2", "4", false),
            ResultItem::new("x", "5", true),
        ]);

        assert_eq!(applied, 1);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("x"), Some("5"));
        assert_eq!(bindings.get("2+2"), None);
    }

    #[test]
    fn test_repeated_assignment_is_idempotent() {
        let item = ResultItem::new("y", "7", true);
        let mut bindings = VariableBindings::new();
        bindings.apply(std::slice::from_ref(&item));
        bindings.apply(std::slice::from_ref(&item));

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("y"), Some("7"));
    }

    #[test]
    fn test_later_items_win() {
        let mut bindings = VariableBindings::new();
        bindings.apply(&[ResultItem::new("x", "1", true), ResultItem::new("x", "2", true)]);
        assert_eq!(bindings.get("x"), Some("2"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut bindings = VariableBindings::new();
        bindings.assign("x", "5");
        assert_eq!(serde_json::to_string(&bindings).unwrap(), r#"{"x":"5"}"#);
    }
}
