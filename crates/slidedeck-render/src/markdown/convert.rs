//! Event stream to render tree conversion.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Tag, TagEnd};

use super::tree::{Element, Node, RenderTree};

enum Frame {
    Element(Element),
    /// A tag with no element of its own; its content lands in the parent.
    Transparent,
}

#[derive(Default)]
struct TableState {
    aligns: Vec<Alignment>,
    in_head: bool,
    body_open: bool,
    cell: usize,
}

/// Rewrites fenced code blocks in a diagram language into raw
/// `<pre class="{lang}">` passthrough blocks. The code is inserted unescaped
/// so the client-side diagram renderer sees it verbatim.
pub(crate) fn rewrite_diagrams<'a>(
    events: Vec<Event<'a>>,
    is_diagram: impl Fn(&str) -> bool,
) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut diagram: Option<(String, String)> = None;

    for event in events {
        if let Some((lang, code)) = diagram.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    let html = format!("<pre class=\"{}\">{}</pre>\n", lang, code.trim());
                    out.push(Event::Html(html.into()));
                    diagram = None;
                }
                _ => {}
            }
            continue;
        }

        if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event {
            let lang = info_language(info);
            if is_diagram(lang) {
                diagram = Some((lang.to_ascii_lowercase(), String::new()));
                continue;
            }
        }
        out.push(event);
    }

    out
}

/// First word of a fenced code block's info string.
pub(crate) fn info_language(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or("")
}

/// Builds the render tree from a (rewritten) event stream.
pub(crate) fn build_tree<'a>(events: impl IntoIterator<Item = Event<'a>>) -> RenderTree {
    let mut builder = TreeBuilder::default();
    for event in events {
        builder.event(event);
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
    table: TableState,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if !self.append_alt(&text) {
                    self.push_node(Node::Text(text.into_string()));
                }
            }
            Event::Code(code) => {
                if !self.append_alt(&code) {
                    self.push_node(Node::Element(
                        Element::new("code").with_child(Node::Text(code.into_string())),
                    ));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_node(Node::Raw(html.into_string()))
            }
            Event::SoftBreak => {
                if !self.append_alt(" ") {
                    self.push_node(Node::Text("\n".to_string()));
                }
            }
            Event::HardBreak => self.push_node(Node::Element(Element::new("br"))),
            Event::Rule => self.push_node(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                self.push_node(Node::Element(input));
            }
            Event::FootnoteReference(label) => {
                let link = Element::new("a")
                    .with_attr("href", format!("#{}", label))
                    .with_child(Node::Text(label.into_string()));
                self.push_node(Node::Element(
                    Element::new("sup")
                        .with_attr("class", "footnote-reference")
                        .with_child(Node::Element(link)),
                ));
            }
            // Math is not enabled in the parser options.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        if self.in_image() {
            self.stack.push(Frame::Transparent);
            return;
        }

        match tag {
            Tag::Paragraph => self.open(Element::new("p")),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let mut heading = Element::new(level.to_string());
                if let Some(id) = id {
                    heading.set_attr("id", id.into_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
                    heading.set_attr("class", classes.join(" "));
                }
                for (name, value) in attrs {
                    heading.set_attr(
                        name.into_string(),
                        value.map(|v| v.into_string()).unwrap_or_default(),
                    );
                }
                self.open(heading);
            }
            Tag::BlockQuote(_) => self.open(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                self.open(Element::new("pre"));
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    let lang = info_language(&info);
                    if !lang.is_empty() {
                        code.set_attr("class", format!("language-{}", lang));
                    }
                }
                self.open(code);
            }
            Tag::List(Some(start)) => {
                let mut list = Element::new("ol");
                if start != 1 {
                    list.set_attr("start", start.to_string());
                }
                self.open(list);
            }
            Tag::List(None) => self.open(Element::new("ul")),
            Tag::Item => self.open(Element::new("li")),
            Tag::FootnoteDefinition(label) => {
                let marker = Element::new("sup")
                    .with_attr("class", "footnote-definition-label")
                    .with_child(Node::Text(label.to_string()));
                self.open(
                    Element::new("div")
                        .with_attr("class", "footnote-definition")
                        .with_attr("id", label.into_string()),
                );
                self.push_node(Node::Element(marker));
            }
            Tag::Table(aligns) => {
                self.table = TableState {
                    aligns,
                    ..TableState::default()
                };
                self.open(Element::new("table"));
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell = 0;
                self.open(Element::new("thead"));
                self.open(Element::new("tr"));
            }
            Tag::TableRow => {
                if !self.table.body_open {
                    self.table.body_open = true;
                    self.open(Element::new("tbody"));
                }
                self.table.cell = 0;
                self.open(Element::new("tr"));
            }
            Tag::TableCell => {
                let mut cell = Element::new(if self.table.in_head { "th" } else { "td" });
                let align = match self.table.aligns.get(self.table.cell) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    cell.set_attr("style", format!("text-align: {}", align));
                }
                self.open(cell);
            }
            Tag::Emphasis => self.open(Element::new("em")),
            Tag::Strong => self.open(Element::new("strong")),
            Tag::Strikethrough => self.open(Element::new("del")),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = Element::new("a").with_attr("href", dest_url.into_string());
                if !title.is_empty() {
                    link.set_attr("title", title.into_string());
                }
                self.open(link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut image = Element::new("img")
                    .with_attr("src", dest_url.into_string())
                    .with_attr("alt", "");
                if !title.is_empty() {
                    image.set_attr("title", title.into_string());
                }
                self.open(image);
            }
            // Raw HTML blocks arrive as `Html` events; other containers keep
            // their content without a wrapper.
            _ => self.stack.push(Frame::Transparent),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                self.close();
                self.close();
            }
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.table.in_head = false;
            }
            TagEnd::TableCell => {
                self.close();
                self.table.cell += 1;
            }
            TagEnd::Table => {
                if self.table.body_open {
                    self.close();
                }
                self.close();
                self.table = TableState::default();
            }
            _ => self.close(),
        }
    }

    fn open(&mut self, element: Element) {
        self.stack.push(Frame::Element(element));
    }

    fn close(&mut self) {
        if let Some(Frame::Element(element)) = self.stack.pop() {
            self.push_node(Node::Element(element));
        }
    }

    fn in_image(&self) -> bool {
        self.stack
            .iter()
            .any(|frame| matches!(frame, Frame::Element(el) if el.tag == "img"))
    }

    /// Inside an image, text becomes the alt attribute.
    fn append_alt(&mut self, text: &str) -> bool {
        let image = self.stack.iter_mut().rev().find_map(|frame| match frame {
            Frame::Element(el) if el.tag == "img" => Some(el),
            _ => None,
        });
        match image {
            Some(image) => {
                let alt = format!("{}{}", image.attr("alt").unwrap_or(""), text);
                image.set_attr("alt", alt);
                true
            }
            None => false,
        }
    }

    fn push_node(&mut self, node: Node) {
        let target = self
            .stack
            .iter_mut()
            .rev()
            .find_map(|frame| match frame {
                Frame::Element(el) => Some(&mut el.children),
                Frame::Transparent => None,
            })
            .unwrap_or(&mut self.root);

        let node = match (target.last_mut(), node) {
            (Some(Node::Raw(last)), Node::Raw(raw)) => return last.push_str(&raw),
            (Some(Node::Text(last)), Node::Text(text)) => return last.push_str(&text),
            (_, node) => node,
        };
        target.push(node);
    }

    fn finish(mut self) -> RenderTree {
        while !self.stack.is_empty() {
            self.close();
        }
        RenderTree::new(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn html(markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;
        let events: Vec<Event> = Parser::new_ext(markdown, options).collect();
        let events = rewrite_diagrams(events, |lang| lang == "mermaid");
        build_tree(events).to_html()
    }

    #[test]
    fn test_paragraph_and_inline() {
        assert_eq!(
            html("Hello *big* **world** `x<y`"),
            "<p>Hello <em>big</em> <strong>world</strong> <code>x&lt;y</code></p>"
        );
    }

    #[test]
    fn test_heading_and_list() {
        assert_eq!(
            html("# Title\n\n- a\n- b"),
            "<h1>Title</h1><ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(html("3. c\n4. d"), "<ol start=\"3\"><li>c</li><li>d</li></ol>");
    }

    #[test]
    fn test_code_block_keeps_language() {
        assert_eq!(
            html("```rust\nfn main() {}\n```"),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_mermaid_becomes_raw_passthrough() {
        assert_eq!(
            html("```mermaid\ngraph TD\n  A --> B\n```"),
            "<pre class=\"mermaid\">graph TD\n  A --> B</pre>\n"
        );
    }

    #[test]
    fn test_image_alt_from_text() {
        assert_eq!(
            html("![a *b* c](img.png \"t\")"),
            "<p><img src=\"img.png\" alt=\"a b c\" title=\"t\" /></p>"
        );
    }

    #[test]
    fn test_raw_html_block_kept() {
        let out = html("<div class=\"x\">\n\n*hi*\n\n</div>");
        assert!(out.starts_with("<div class=\"x\">"));
        assert!(out.contains("<p><em>hi</em></p>"));
        assert!(out.ends_with("</div>"));
    }

    #[test]
    fn test_table() {
        let out = html("| a | b |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            out,
            "<table><thead><tr><th style=\"text-align: left\">a</th>\
             <th style=\"text-align: right\">b</th></tr></thead>\
             <tbody><tr><td style=\"text-align: left\">1</td>\
             <td style=\"text-align: right\">2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_task_list() {
        let out = html("- [x] done");
        assert!(out.contains("<input type=\"checkbox\" disabled=\"\" checked=\"\" />"));
    }

    #[test]
    fn test_link_with_title() {
        assert_eq!(
            html("[home](https://x.dev \"Home\")"),
            "<p><a href=\"https://x.dev\" title=\"Home\">home</a></p>"
        );
    }
}
