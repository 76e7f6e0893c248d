//! Rule system for HTML to Markdown conversion.

mod commonmark;
mod rule;

pub use commonmark::commonmark_rules;
pub use rule::{Filter, Rule};

use indexmap::IndexMap;

use crate::node::NodeRef;
use crate::service::MarkdownOptions;
use crate::utilities::is_blank;

/// Outcome of looking up the rule for an element
pub enum Resolved<'a> {
    /// Element has no renderable content
    Blank,
    /// A custom or CommonMark rule applies
    Rule(&'a Rule),
    /// Element is dropped with its content
    Remove,
    /// No rule: block elements are padded, inline elements pass through
    Default,
}

/// Collection of rules for conversion
pub struct Rules {
    /// Custom rules added by the user, checked first in insertion order
    custom_rules: IndexMap<String, Rule>,
    /// Remove rules (remove entirely)
    remove_rules: Vec<Filter>,
    /// Built-in CommonMark rules
    commonmark_rules: Vec<Rule>,
}

impl Rules {
    /// Create a new Rules instance with CommonMark rules
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            remove_rules: Vec::new(),
            commonmark_rules: commonmark_rules(),
        }
    }

    /// Add a custom rule. Re-adding a key replaces the rule but keeps its
    /// original precedence.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Add a remove filter
    pub fn remove(&mut self, filter: Filter) {
        self.remove_rules.push(filter);
    }

    /// Keys of the custom rules in precedence order
    pub fn custom_keys(&self) -> impl Iterator<Item = &str> {
        self.custom_rules.keys().map(String::as_str)
    }

    /// Find the appropriate rule for a node
    pub fn for_node<'a>(&'a self, node: &NodeRef, options: &MarkdownOptions) -> Resolved<'a> {
        if is_blank(node.node) {
            return Resolved::Blank;
        }

        if let Some(rule) = self
            .custom_rules
            .values()
            .chain(self.commonmark_rules.iter())
            .find(|rule| rule.filter.matches(node, options))
        {
            return Resolved::Rule(rule);
        }

        if self.remove_rules.iter().any(|f| f.matches(node, options)) {
            return Resolved::Remove;
        }

        Resolved::Default
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
