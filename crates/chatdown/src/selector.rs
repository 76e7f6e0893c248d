//! A small CSS selector subset over [`Node`] trees.
//!
//! Supported: tag names, `*`, `.class`, `[attr]`, `[attr="value"]`,
//! `[attr*="value"]`, compounds of those (`span.T286Pc`) and descendant
//! combinators (`.z0e9Qd .vVRw1d`). That is everything the page catalog
//! needs; child, sibling and pseudo-class selectors are rejected.

use std::fmt;
use std::iter::Peekable;
use std::ops::ControlFlow;
use std::str::{CharIndices, FromStr};

use chatdown_core::{Node, NodePath};
use serde::Deserialize;

/// Error raised while parsing a selector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("unexpected {found:?} at offset {offset} in selector {selector:?}")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },
    #[error("selector {0:?} ends inside an attribute test")]
    Unterminated(String),
}

/// One simple test against a single element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Any,
    Tag(String),
    Class(String),
    HasAttr(String),
    AttrEquals { name: String, value: String },
    AttrContains { name: String, value: String },
    /// Compound: every part must hold
    All(Vec<Matcher>),
}

impl Matcher {
    /// Only elements ever match.
    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        match self {
            Matcher::Any => true,
            Matcher::Tag(tag) => node.is_tag(tag),
            Matcher::Class(class) => node.has_class(class),
            Matcher::HasAttr(name) => node.has_attr(name),
            Matcher::AttrEquals { name, value } => node.attr(name) == Some(value.as_str()),
            Matcher::AttrContains { name, value } => node
                .attr(name)
                .is_some_and(|v| !value.is_empty() && v.contains(value.as_str())),
            Matcher::All(parts) => parts.iter().all(|m| m.matches(node)),
        }
    }
}

/// A descendant chain of compound matchers, e.g. `.pCTyYe pre code`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Selector {
    steps: Vec<Matcher>,
    source: String,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        Parser::new(source).parse()
    }

    /// Selector matching elements by tag name alone
    pub fn tag(name: &str) -> Self {
        Self {
            steps: vec![Matcher::Tag(name.to_ascii_lowercase())],
            source: name.to_ascii_lowercase(),
        }
    }

    pub fn steps(&self) -> &[Matcher] {
        &self.steps
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test `node` given its ancestors, nearest first.
    ///
    /// The rightmost step must match `node`; every earlier step must match
    /// some ancestor, in order, moving outwards.
    pub fn matches<'a, I>(&self, node: &Node, ancestors: I) -> bool
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let Some((last, rest)) = self.steps.split_last() else {
            return false;
        };
        if !last.matches(node) {
            return false;
        }
        let mut ancestors = ancestors.into_iter();
        rest.iter()
            .rev()
            .all(|step| ancestors.by_ref().any(|a| step.matches(a)))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'s> {
    source: &'s str,
    chars: Peekable<CharIndices<'s>>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        let source = source.trim();
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<Selector, SelectorError> {
        let mut steps = Vec::new();
        loop {
            self.skip_whitespace();
            if self.chars.peek().is_none() {
                break;
            }
            steps.push(self.compound()?);
        }
        if steps.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Selector {
            steps,
            source: self.source.to_string(),
        })
    }

    fn compound(&mut self) -> Result<Matcher, SelectorError> {
        let mut parts = Vec::new();
        while let Some(&(offset, c)) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => break,
                '*' if parts.is_empty() => {
                    self.chars.next();
                    parts.push(Matcher::Any);
                }
                '.' => {
                    self.chars.next();
                    parts.push(Matcher::Class(self.ident()?));
                }
                '[' => {
                    self.chars.next();
                    parts.push(self.attribute()?);
                }
                c if is_ident_char(c) && parts.is_empty() => {
                    parts.push(Matcher::Tag(self.ident()?.to_ascii_lowercase()));
                }
                found => return Err(self.unexpected(found, offset)),
            }
        }
        Ok(match parts.len() {
            1 => parts.remove(0),
            _ => Matcher::All(parts),
        })
    }

    fn attribute(&mut self) -> Result<Matcher, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let matcher = match self.chars.next() {
            Some((_, ']')) => return Ok(Matcher::HasAttr(name)),
            Some((_, '=')) => Matcher::AttrEquals {
                name,
                value: self.value()?,
            },
            Some((_, '*')) => {
                self.expect('=')?;
                Matcher::AttrContains {
                    name,
                    value: self.value()?,
                }
            }
            Some((offset, found)) => return Err(self.unexpected(found, offset)),
            None => return Err(SelectorError::Unterminated(self.source.to_string())),
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(matcher)
    }

    fn value(&mut self) -> Result<String, SelectorError> {
        self.skip_whitespace();
        let quote = match self.chars.peek() {
            Some(&(_, q @ ('"' | '\''))) => q,
            _ => return self.ident(),
        };
        self.chars.next();

        let mut value = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == quote {
                return Ok(value);
            }
            value.push(c);
        }
        Err(SelectorError::Unterminated(self.source.to_string()))
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut ident = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !is_ident_char(c) {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        if !ident.is_empty() {
            return Ok(ident);
        }
        match self.chars.peek() {
            Some(&(offset, found)) => Err(self.unexpected(found, offset)),
            None => Err(SelectorError::Unterminated(self.source.to_string())),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.chars.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((offset, found)) => Err(self.unexpected(found, offset)),
            None => Err(SelectorError::Unterminated(self.source.to_string())),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }

    fn unexpected(&self, found: char, offset: usize) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            found,
            offset,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Visit every element strictly below `root` in document order, together
/// with its ancestors (root first) and its path from `root`.
///
/// Iterative, so arbitrarily deep trees cannot exhaust the stack.
fn walk<'a, F>(root: &'a Node, mut visit: F)
where
    F: FnMut(&'a Node, &[&'a Node], &NodePath) -> ControlFlow<()>,
{
    let mut ancestors: Vec<&'a Node> = vec![root];
    // Next child index to look at, one entry per open ancestor
    let mut cursors: Vec<usize> = vec![0];
    let mut path: NodePath = Vec::new();

    while let Some(&parent) = ancestors.last() {
        let level = ancestors.len() - 1;
        let index = cursors[level];
        let Some(child) = parent.children.as_ref().and_then(|c| c.get(index)) else {
            ancestors.pop();
            cursors.pop();
            path.pop();
            continue;
        };
        cursors[level] += 1;
        if !child.is_element() {
            continue;
        }

        path.push(index);
        if visit(child, &ancestors, &path).is_break() {
            return;
        }
        ancestors.push(child);
        cursors.push(0);
    }
}

fn matches_any(selectors: &[Selector], node: &Node, ancestors: &[&Node]) -> bool {
    selectors
        .iter()
        .any(|s| s.matches(node, ancestors.iter().rev().copied()))
}

/// First descendant of `root` matching `selector`, like `querySelector`.
pub fn select_first<'a>(root: &'a Node, selector: &Selector) -> Option<&'a Node> {
    select_first_of(root, std::slice::from_ref(selector))
}

/// First descendant of `root`, in document order, matching any of
/// `selectors`; a selector list such as `a, b` in `querySelector`.
pub fn select_first_of<'a>(root: &'a Node, selectors: &[Selector]) -> Option<&'a Node> {
    let mut found = None;
    walk(root, |node, ancestors, _| {
        if matches_any(selectors, node, ancestors) {
            found = Some(node);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

/// All descendants of `root` matching `selector`, in document order.
pub fn select_all<'a>(root: &'a Node, selector: &Selector) -> Vec<&'a Node> {
    let mut found = Vec::new();
    walk(root, |node, ancestors, _| {
        if selector.matches(node, ancestors.iter().rev().copied()) {
            found.push(node);
        }
        ControlFlow::Continue(())
    });
    found
}

/// Paths of the descendants of `root` matching any of `selectors`, in
/// document order.
pub fn select_paths(root: &Node, selectors: &[Selector]) -> Vec<NodePath> {
    let mut found = Vec::new();
    walk(root, |node, ancestors, path| {
        if matches_any(selectors, node, ancestors) {
            found.push(path.clone());
        }
        ControlFlow::Continue(())
    });
    found
}

/// Drop every path that lies inside another path of the list.
///
/// Expects document order, which is what [`select_paths`] produces.
pub fn outermost(paths: Vec<NodePath>) -> Vec<NodePath> {
    let mut kept: Vec<NodePath> = Vec::with_capacity(paths.len());
    for path in paths {
        let nested = kept.last().is_some_and(|outer| path.starts_with(outer));
        if !nested {
            kept.push(path);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        s.parse().unwrap()
    }

    fn span(class: &str, text: &str) -> Node {
        Node::element_with_attrs("span", vec![("class", class)]).with_child(Node::text(text))
    }

    #[test]
    fn test_parse_compound_and_descendant() {
        let s = sel(".sUKAcb span[role=\"heading\"]");
        assert_eq!(
            s.steps(),
            &[
                Matcher::Class("sUKAcb".into()),
                Matcher::All(vec![
                    Matcher::Tag("span".into()),
                    Matcher::AttrEquals {
                        name: "role".into(),
                        value: "heading".into()
                    }
                ]),
            ]
        );
        assert_eq!(s.to_string(), ".sUKAcb span[role=\"heading\"]");
    }

    #[test]
    fn test_parse_quoted_value_with_spaces() {
        let s = sel("[aria-label*=\"View related links\"]");
        assert_eq!(
            s.steps(),
            &[Matcher::AttrContains {
                name: "aria-label".into(),
                value: "View related links".into()
            }]
        );
        let s = sel("[style*='display: none']");
        assert_eq!(s.steps().len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(
            Selector::parse("div > p"),
            Err(SelectorError::Unexpected { found: '>', .. })
        ));
        assert!(matches!(
            Selector::parse("[data-x=\"open"),
            Err(SelectorError::Unterminated(_))
        ));
        assert!(matches!(
            Selector::parse("a:hover"),
            Err(SelectorError::Unexpected { found: ':', .. })
        ));
        assert!(matches!(
            Selector::parse(".a span.b div"),
            Ok(s) if s.steps().len() == 3
        ));
    }

    #[test]
    fn test_matcher_requires_all_classes() {
        let both = span("VndcI veK2kb", "q");
        let one = span("VndcI", "q");
        let s = sel(".VndcI.veK2kb");
        assert!(s.matches(&both, []));
        assert!(!s.matches(&one, []));
        assert!(!s.matches(&Node::text("VndcI"), []));
    }

    #[test]
    fn test_descendant_needs_ancestor() {
        let root = Node::element_with_attrs("div", vec![("class", "z0e9Qd")])
            .with_child(span("vVRw1d", "python"));
        let s = sel(".z0e9Qd .vVRw1d");
        assert_eq!(select_first(&root, &s).map(Node::text_content), Some("python".into()));

        let orphan = Node::element("div").with_child(span("vVRw1d", "python"));
        assert!(select_first(&orphan, &s).is_none());
    }

    #[test]
    fn test_select_excludes_root_itself() {
        let root = Node::element_with_attrs("div", vec![("data-container-id", "main-col")]);
        assert!(select_first(&root, &sel("[data-container-id=\"main-col\"]")).is_none());
    }

    #[test]
    fn test_select_all_document_order() {
        let turn = |n: &str| {
            Node::element_with_attrs("div", vec![("data-scope-id", "turn")]).with_child(Node::text(n))
        };
        let root = Node::element("main")
            .with_child(turn("1"))
            .with_child(Node::element("section").with_child(turn("2")))
            .with_child(turn("3"));
        let texts: Vec<String> = select_all(&root, &sel("[data-scope-id=\"turn\"]"))
            .into_iter()
            .map(Node::text_content)
            .collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_selector_list_takes_first_in_document_order() {
        let root = Node::element("div")
            .with_child(
                Node::element_with_attrs("div", vec![("aria-level", "2")]).with_child(Node::text("earlier")),
            )
            .with_child(span("VndcI veK2kb", "later"));
        let list = [sel(".VndcI.veK2kb"), sel("[aria-level=\"2\"]")];
        assert_eq!(
            select_first_of(&root, &list).map(Node::text_content),
            Some("earlier".into())
        );
        assert!(select_first_of(&root, &[]).is_none());
    }

    #[test]
    fn test_walk_handles_very_deep_trees() {
        let mut node = span("target", "deep");
        for _ in 0..5_000 {
            node = Node::element("div").with_child(node);
        }
        let root = Node::element("main").with_child(node);
        let found = select_first(&root, &sel("main div span.target"));
        assert_eq!(found.map(Node::text_content), Some("deep".into()));
    }

    #[test]
    fn test_select_paths_and_outermost() {
        let root = Node::element("div")
            .with_child(Node::element("button").with_child(Node::element("svg")))
            .with_child(Node::text("keep"))
            .with_child(Node::element("img"));
        let paths = select_paths(&root, &[sel("button"), sel("svg"), sel("img")]);
        assert_eq!(paths, vec![vec![0], vec![0, 0], vec![2]]);
        assert_eq!(outermost(paths), vec![vec![0], vec![2]]);
    }

    #[test]
    fn test_deserialize_from_string() {
        #[derive(Deserialize)]
        struct Holder {
            selector: Selector,
        }
        let holder: Holder = serde_json::from_str(r#"{"selector": "span.T286Pc"}"#).unwrap();
        assert_eq!(holder.selector.as_str(), "span.T286Pc");
        assert!(serde_json::from_str::<Holder>(r#"{"selector": "a > b"}"#).is_err());
    }
}
