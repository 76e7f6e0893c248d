//! CommonMark rules for HTML to Markdown conversion, plus GFM tables.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Filter, Rule};
use crate::node::{Node, NodeRef};
use crate::service::{CodeBlockStyle, HeadingStyle};
use crate::utilities::{clean_attribute, fence_for, repeat};

static LANGUAGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"language-(\S+)").expect("valid language class pattern"));

/// Create all CommonMark rules
pub fn commonmark_rules() -> Vec<Rule> {
    vec![
        paragraph_rule(),
        line_break_rule(),
        heading_rule(),
        blockquote_rule(),
        list_rule(),
        list_item_rule(),
        indented_code_block_rule(),
        fenced_code_block_rule(),
        horizontal_rule(),
        inline_link_rule(),
        emphasis_rule(),
        strong_rule(),
        code_rule(),
        image_rule(),
        table_cell_rule(),
        table_row_rule(),
        table_rule(),
    ]
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, _| format!("\n\n{}\n\n", content.trim()))
}

fn line_break_rule() -> Rule {
    Rule::for_tag("br", |_, _, options| format!("{}\n", options.br))
}

fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |node, content, options| {
        let level: usize = node.tag_name()[1..].parse().unwrap_or(1);

        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }

        match options.heading_style {
            HeadingStyle::Setext if level <= 2 => {
                let underline = if level == 1 { "=" } else { "-" };
                format!(
                    "\n\n{}\n{}\n\n",
                    content,
                    repeat(underline, content.chars().count())
                )
            }
            _ => format!("\n\n{} {}\n\n", repeat("#", level), content),
        }
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| {
        let content = content.trim_matches('\n');
        if content.trim().is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = content.lines().map(|line| format!("> {}", line)).collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    })
}

fn list_rule() -> Rule {
    Rule::for_tags(&["ul", "ol"], |node, content, _| {
        // A list closing out a list item hangs off that item
        let nested_last = node
            .parent()
            .map(|p| p.is_tag("li") && node.is_last_element())
            .unwrap_or(false);

        if nested_last {
            format!("\n{}", content)
        } else {
            format!("\n\n{}\n\n", content)
        }
    })
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |node, content, options| {
        let content = content.trim_start_matches('\n');
        let body = content.trim_end_matches('\n');
        let ends_with_newline = body.len() != content.len();

        let mut body = body.replace('\n', "\n    ");
        if ends_with_newline {
            body.push('\n');
        }

        let prefix = match node.parent() {
            Some(parent) if parent.is_tag("ol") => {
                let start: usize = parent
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                format!("{}.  ", start + node.element_index())
            }
            _ => format!("{}   ", options.bullet_list_marker),
        };

        let separator = if node.next_sibling().is_some() && !body.ends_with('\n') {
            "\n"
        } else {
            ""
        };

        format!("{}{}{}", prefix, body, separator)
    })
}

/// Code text of a `pre`: its leading `code` element if it has one, else its own text
fn pre_code(node: &NodeRef) -> (String, Option<String>) {
    match node.element_children().next().filter(|c| c.is_tag("code")) {
        Some(code) => (code.text_content(), language_of(code)),
        None => (node.text_content(), None),
    }
}

fn language_of(code: &Node) -> Option<String> {
    let class = code.attr("class")?;
    LANGUAGE_CLASS
        .captures(class)
        .map(|caps| caps[1].to_string())
}

fn indented_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            node.is_tag("pre") && options.code_block_style == CodeBlockStyle::Indented
        }),
        |node, _, _| {
            let (code, _) = pre_code(node);
            let indented: Vec<String> = code
                .trim_end_matches('\n')
                .lines()
                .map(|line| format!("    {}", line))
                .collect();

            format!("\n\n{}\n\n", indented.join("\n"))
        },
    )
}

fn fenced_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, options| {
            node.is_tag("pre") && options.code_block_style == CodeBlockStyle::Fenced
        }),
        |node, _, options| {
            let (code, language) = pre_code(node);
            let code = code.strip_suffix('\n').unwrap_or(&code);
            let fence = fence_for(code, &options.fence);

            format!(
                "\n\n{}{}\n{}\n{}\n\n",
                fence,
                language.unwrap_or_default(),
                code,
                fence
            )
        },
    )
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options| format!("\n\n{}\n\n", options.hr))
}

fn inline_link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| node.is_tag("a") && node.has_attr("href")),
        |node, content, _| {
            let href = clean_attribute(node.attr("href"))
                .replace('(', "\\(")
                .replace(')', "\\)");
            let title = clean_attribute(node.attr("title"));

            if href.is_empty() {
                return content.to_string();
            }

            let title_part = if title.is_empty() {
                String::new()
            } else {
                format!(" \"{}\"", title.replace('"', "\\\""))
            };

            format!("[{}]({}{})", content, href, title_part)
        },
    )
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |_, content, options| {
        if content.trim().is_empty() {
            return String::new();
        }
        let delimiter = options.em_delimiter;
        format!("{}{}{}", delimiter, content, delimiter)
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |_, content, options| {
        if content.trim().is_empty() {
            return String::new();
        }
        let delimiter = &options.strong_delimiter;
        format!("{}{}{}", delimiter, content, delimiter)
    })
}

fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|node, _| {
            // <code> as the only child of <pre> belongs to the code block rules
            let is_code_block = node
                .parent()
                .map(|p| p.is_tag("pre") && p.node.child_count() == 1)
                .unwrap_or(false);
            node.is_tag("code") && !is_code_block
        }),
        |_, content, _| {
            if content.is_empty() {
                return String::new();
            }
            let content = content
                .replace("\r\n", " ")
                .replace(|c: char| c == '\r' || c == '\n', " ");

            // Shortest backtick run that does not occur in the content
            let runs: Vec<usize> = content
                .split(|c| c != '`')
                .map(str::len)
                .filter(|len| *len > 0)
                .collect();
            let mut width = 1;
            while runs.contains(&width) {
                width += 1;
            }
            let delimiter = "`".repeat(width);

            let padded = content.starts_with('`')
                || content.ends_with('`')
                || (content.starts_with(' ')
                    && content.ends_with(' ')
                    && !content.trim().is_empty());
            let extra = if padded { " " } else { "" };

            format!("{0}{1}{2}{1}{0}", delimiter, extra, content)
        },
    )
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |node, _, _| {
        let alt = clean_attribute(node.attr("alt"));
        let src = clean_attribute(node.attr("src"));
        let title = clean_attribute(node.attr("title"));

        if src.is_empty() {
            return String::new();
        }

        let title_part = if title.is_empty() {
            String::new()
        } else {
            format!(" \"{}\"", title)
        };

        format!("![{}]({}{})", alt, src, title_part)
    })
}

fn table_cell(content: &str, first: bool) -> String {
    let prefix = if first { "| " } else { " " };
    let content = content.trim().replace('\n', " ").replace('|', "\\|");
    format!("{}{} |", prefix, content)
}

fn is_heading_row(row: &NodeRef) -> bool {
    let Some(parent) = row.parent() else {
        return false;
    };
    if parent.is_tag("thead") {
        return true;
    }
    let first_section = parent.is_tag("table") || (parent.is_tag("tbody") && parent.element_index() == 0);
    first_section
        && row.element_index() == 0
        && row.element_children().all(|cell| cell.is_tag("th"))
}

fn table_cell_rule() -> Rule {
    Rule::for_tags(&["th", "td"], |node, content, _| {
        table_cell(content, node.element_index() == 0)
    })
}

fn table_row_rule() -> Rule {
    Rule::for_tag("tr", |node, content, _| {
        if !is_heading_row(node) {
            return format!("\n{}", content);
        }
        let border: String = node
            .element_children()
            .enumerate()
            .map(|(i, _)| table_cell("---", i == 0))
            .collect();
        format!("\n{}\n{}", content, border)
    })
}

fn table_rule() -> Rule {
    Rule::for_tag("table", |_, content, _| {
        let rows: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        format!("\n\n{}\n\n", rows.join("\n"))
    })
}
