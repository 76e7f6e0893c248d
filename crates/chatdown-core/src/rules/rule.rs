//! Rule and Filter types for HTML conversion.

use crate::node::NodeRef;
use crate::service::MarkdownOptions;

/// Type alias for replacement functions
pub type ReplacementFn = Box<dyn Fn(&NodeRef, &str, &MarkdownOptions) -> String + Send + Sync>;

/// Type alias for filter predicates
pub type PredicateFn = Box<dyn Fn(&NodeRef, &MarkdownOptions) -> bool + Send + Sync>;

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(PredicateFn),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&NodeRef, &MarkdownOptions) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches an element
    pub fn matches(&self, node: &NodeRef, options: &MarkdownOptions) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Filter::TagName(t) => node.is_tag(t),
            Filter::TagNames(tags) => tags.iter().any(|t| node.is_tag(t)),
            Filter::Predicate(f) => f(node, options),
        }
    }
}

/// A rule defines how to convert a matched HTML element to Markdown
pub struct Rule {
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Markdown from the element and
    /// its already-converted content
    pub replacement: ReplacementFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &MarkdownOptions) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Box::new(replacement),
        }
    }

    /// Create a rule that matches a single tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &MarkdownOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), replacement)
    }

    /// Create a rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &MarkdownOptions) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), replacement)
    }

    /// Apply this rule's replacement
    pub fn replace(&self, node: &NodeRef, content: &str, options: &MarkdownOptions) -> String {
        (self.replacement)(node, content, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn test_filters_only_match_elements() {
        let options = MarkdownOptions::default();
        let text = Node::text("p");
        let p = Node::element("P");

        let filter = Filter::tag("p");
        assert!(filter.matches(&NodeRef::new(&p), &options));
        assert!(!filter.matches(&NodeRef::new(&text), &options));

        let filter = Filter::tags(&["EM", "i"]);
        assert!(filter.matches(&NodeRef::new(&Node::element("em")), &options));

        let filter = Filter::predicate(|node, _| node.has_attr("data-language"));
        assert!(!filter.matches(&NodeRef::new(&p), &options));
    }

    #[test]
    fn test_rule_replace() {
        let rule = Rule::for_tags(&["b", "strong"], |_, content, options| {
            format!("{0}{1}{0}", options.strong_delimiter, content)
        });
        let node = Node::element("b");
        let node_ref = NodeRef::new(&node);
        assert!(rule.filter.matches(&node_ref, &MarkdownOptions::default()));
        assert_eq!(rule.replace(&node_ref, "x", &MarkdownOptions::default()), "**x**");
    }
}
