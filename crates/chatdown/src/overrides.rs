//! Conversion rules for page markup the CommonMark rules get wrong.

use chatdown_core::{
    fence_for, CodeBlockStyle, Filter, HeadingStyle, MarkdownOptions, MarkdownService, Node, Rule,
};

use crate::catalog::{SectionHeadingSelectors, SelectorCatalog};
use crate::codeblock::LANGUAGE_ATTR;
use crate::selector::{select_first, Selector};

/// A converter with ATX headings, fenced code and the page overrides.
pub fn markdown_service(catalog: &SelectorCatalog) -> MarkdownService {
    let mut service = MarkdownService::with_options(MarkdownOptions {
        heading_style: HeadingStyle::Atx,
        code_block_style: CodeBlockStyle::Fenced,
        ..MarkdownOptions::default()
    });
    service.use_plugin(|service| install(service, catalog));
    service
}

/// Register the overrides on `service`, ahead of the CommonMark rules.
pub fn install(service: &mut MarkdownService, catalog: &SelectorCatalog) {
    service
        .add_rule("codeBlockWithLanguage", code_block_with_language())
        .add_rule(
            "stripCitationButtons",
            strip_citation_markers(catalog.citation_markers.clone()),
        )
        .add_rule(
            "sectionHeadings",
            section_headings(catalog.section_heading.clone()),
        )
        .remove(Filter::TagNames(
            catalog
                .removed_tags
                .iter()
                .map(|tag| tag.to_ascii_lowercase())
                .collect(),
        ));
}

/// The `code` of a `pre` that holds nothing else but whitespace, provided
/// it carries a language tag.
fn tagged_code(pre: &Node) -> Option<&Node> {
    let mut significant = pre
        .children()
        .filter(|c| c.is_element() || (c.is_text() && !c.text_content().trim().is_empty()));
    let code = significant.next()?;
    let sole = significant.next().is_none();
    (sole && code.is_tag("code") && code.has_attr(LANGUAGE_ATTR)).then_some(code)
}

fn code_block_with_language() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.is_tag("pre") && tagged_code(node.node).is_some()),
        |node, _, options| {
            let Some(code) = tagged_code(node.node) else {
                return String::new();
            };
            let language = code.attr(LANGUAGE_ATTR).unwrap_or_default().trim();
            let text = code.text_content();
            let text = text.trim();
            let fence = fence_for(text, &options.fence);
            format!("\n\n{fence}{language}\n{text}\n{fence}\n\n")
        },
    )
}

fn strip_citation_markers(markers: Vec<Selector>) -> Rule {
    Rule::new(
        Filter::predicate(move |node, _| {
            markers
                .iter()
                .any(|marker| marker.matches(node.node, node.ancestors()))
        }),
        |_, _, _| String::new(),
    )
}

fn section_headings(selectors: SectionHeadingSelectors) -> Rule {
    let SectionHeadingSelectors { container, title } = selectors;
    let title_for_replacement = title.clone();
    Rule::new(
        Filter::predicate(move |node, _| {
            container.matches(node.node, node.ancestors()) && select_first(node.node, &title).is_some()
        }),
        move |node, content, _| {
            let text = select_first(node.node, &title_for_replacement)
                .map(|t| t.text_content())
                .unwrap_or_default();
            match text.trim() {
                "" => format!("\n\n{}\n\n", content.trim()),
                text => format!("\n\n### {text}\n\n"),
            }
        },
    )
}
