//! Markdown-to-HTML conversion and the table of contents.
//!
//! Headings at levels 2–4 get `id` attributes equal to the slugified
//! heading text so that the table of contents built by
//! [`table_of_contents`] can link to them. The TOC is built from the
//! *source* lines rather than the event stream; both sides slugify with
//! the same function, so decorated headings (`## Use **bold**`) resolve
//! to the same anchor either way.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Converts a Markdown body to HTML.
///
/// Fenced code blocks keep their `language-*` class; highlighting itself
/// is client-side in the post template.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events: Vec<Event> = Parser::new_ext(markdown, options).collect();

    // First pass: one anchor id per h2–h4, in document order.
    let mut ids = Vec::new();
    let mut heading_text: Option<String> = None;
    for event in &events {
        match event {
            Event::Start(Tag::Heading(2..=4)) => heading_text = Some(String::new()),
            Event::End(Tag::Heading(2..=4)) => {
                if let Some(text) = heading_text.take() {
                    ids.push(slug::slugify(text));
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buffer) = heading_text.as_mut() {
                    buffer.push_str(text);
                }
            }
            _ => {}
        }
    }

    // Second pass: swap heading tags for raw HTML carrying the ids.
    let mut ids = ids.into_iter();
    let events = events.into_iter().map(|event| match event {
        Event::Start(Tag::Heading(level @ 2..=4)) => {
            let id = ids.next().unwrap_or_default();
            Event::Html(CowStr::Boxed(
                format!(r#"<h{} id="{}">"#, level, id).into_boxed_str(),
            ))
        }
        Event::End(Tag::Heading(level @ 2..=4)) => Event::Html(CowStr::Boxed(
            format!("</h{}>", level).into_boxed_str(),
        )),
        event => event,
    });

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

/// Builds a nested-list table of contents from the `##`–`####` headings
/// of a Markdown body. Returns [`None`] when the body has no such
/// headings.
///
/// Nesting is single-pass: a "current level" is kept, and each heading
/// opens or closes exactly one list level when its level differs from
/// the current one. Headings that skip levels (h2 straight to h4) thus
/// nest only one level deep, and closing happens one level per heading
/// too.
pub fn table_of_contents(markdown: &str) -> Option<String> {
    let mut output = String::new();
    let mut level = 1;
    for line in markdown.lines() {
        if let Some((heading_level, text)) = heading(line) {
            if heading_level > level {
                output.push_str("<ul>");
                level += 1;
            } else if heading_level < level {
                output.push_str("</ul>");
                level -= 1;
            }
            output.push_str(&format!(
                r##"<li><a href="#{}">{}</a></li>"##,
                slug::slugify(text),
                text
            ));
        }
    }
    while level > 1 {
        output.push_str("</ul>");
        level -= 1;
    }
    match output.is_empty() {
        true => None,
        false => Some(output),
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let rest = line.trim_start_matches('#');
    let hashes = line.len() - rest.len();
    if (2..=4).contains(&hashes) && rest.starts_with(' ') {
        Some((hashes, rest.trim()))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_heading_ids() {
        let html = to_html("## Hello World\n\ntext\n\n### Sub Section\n");
        assert!(html.contains(r#"<h2 id="hello-world">"#));
        assert!(html.contains(r#"<h3 id="sub-section">"#));
    }

    #[test]
    fn test_h1_has_no_id() {
        let html = to_html("# Top\n\n## Below\n");
        assert!(html.contains("<h1>"));
        assert!(html.contains(r#"<h2 id="below">"#));
    }

    #[test]
    fn test_decorated_heading_id_matches_toc_anchor() {
        let body = "## Use **bold** text\n";
        let html = to_html(body);
        let toc = table_of_contents(body).unwrap();
        assert!(html.contains(r#"<h2 id="use-bold-text">"#));
        assert!(toc.contains(r##"href="#use-bold-text""##));
    }

    #[test]
    fn test_fenced_code_language_class() {
        let html = to_html("```rust\nfn main() {}\n```\n");
        assert!(html.contains(r#"<code class="language-rust">"#));
    }

    #[test]
    fn test_toc_lists_each_heading_once() {
        let toc = table_of_contents("## One\n\ntext\n\n## Two\n\n### Two A\n").unwrap();
        assert_eq!(toc.matches(r##"href="#one""##).count(), 1);
        assert_eq!(toc.matches(r##"href="#two""##).count(), 1);
        assert_eq!(toc.matches(r##"href="#two-a""##).count(), 1);
    }

    #[test]
    fn test_toc_nesting() {
        let toc = table_of_contents("## A\n### B\n## C\n").unwrap();
        assert_eq!(
            toc,
            r##"<ul><li><a href="#a">A</a></li><ul><li><a href="#b">B</a></li></ul><li><a href="#c">C</a></li></ul>"##
        );
    }

    #[test]
    fn test_toc_skipped_levels_nest_one_step() {
        // h2 straight to h4 opens a single nested list
        let toc = table_of_contents("## A\n#### B\n").unwrap();
        assert_eq!(
            toc,
            r##"<ul><li><a href="#a">A</a></li><ul><li><a href="#b">B</a></li></ul></ul>"##
        );
    }

    #[test]
    fn test_no_headings_no_toc() {
        assert_eq!(table_of_contents("just a paragraph\n"), None);
        assert_eq!(table_of_contents("# only a title\n"), None);
        assert_eq!(table_of_contents("##### too deep\n"), None);
    }
}
