use proptest::prelude::*;
use slidedeck_render::preprocess::{two_column, COLUMN_MARKER};
use slidedeck_render::{
    HighlightStage, HighlightTheme, ImageStage, MarkdownPipeline, RenderConfig, ResourceResolver,
    ThemeKind, TreeStage,
};

fn pipeline() -> MarkdownPipeline {
    MarkdownPipeline::new(&RenderConfig::default())
}

fn render(body: &str, stages: &[&dyn TreeStage]) -> String {
    pipeline()
        .transform(body, stages, |err| panic!("pipeline failed: {err}"))
        .map(|output| output.to_html())
        .unwrap_or_default()
}

fn markdown_strategy() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        "[a-z ]{0,20}",
        "# [a-z ]{1,10}",
        "- [a-z]{1,8}",
        "\\*[a-z]{1,8}\\*",
        "!\\[[a-z]{0,5}\\]\\([a-z./]{0,10}\\)",
        Just("```rust".to_string()),
        Just("```mermaid".to_string()),
        Just("```".to_string()),
        Just("<div class=\"x\">".to_string()),
        Just("</div>".to_string()),
        Just(COLUMN_MARKER.to_string()),
    ];
    prop::collection::vec(line, 0..20).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_pipeline_is_idempotent(body in markdown_strategy()) {
        let highlight = HighlightStage::new(HighlightTheme::fallback(Some(ThemeKind::Dark)));
        let images = ImageStage::new(ResourceResolver::new("https://host.local/ws"));
        let stages: [&dyn TreeStage; 2] = [&highlight, &images];

        let body = two_column(&body, COLUMN_MARKER);
        let first = render(&body, &stages);
        let second = render(&body, &stages);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_two_column_halves_are_parsed_as_markdown() {
    let body = two_column("# Left\n\n- one\n- two\n::right::\n**Right**", COLUMN_MARKER);
    let html = render(&body, &[]);

    assert_eq!(html.matches("<div class=\"slide__left\">").count(), 1);
    assert_eq!(html.matches("<div class=\"slide__right\">").count(), 1);
    assert!(!html.contains(COLUMN_MARKER));
    assert!(html.contains("<h1>Left</h1>"));
    assert!(html.contains("<li>one</li>"));
    assert!(html.contains("<p><strong>Right</strong></p>"));

    let left = html.find("slide__left").unwrap();
    let right = html.find("slide__right").unwrap();
    let heading = html.find("<h1>Left</h1>").unwrap();
    let strong = html.find("<strong>Right</strong>").unwrap();
    assert!(left < heading && heading < right && right < strong);
}

#[test]
fn test_repeated_marker_leaves_body_alone() {
    let body = "a ::right:: b ::right:: c";
    assert_eq!(two_column(body, COLUMN_MARKER), body);
}

#[test]
fn test_mermaid_passthrough_is_not_highlighted() {
    let highlight = HighlightStage::new(HighlightTheme::fallback(Some(ThemeKind::Light)));
    let html = render("```mermaid\nflowchart LR\n  A-->B\n```", &[&highlight]);
    assert_eq!(html, "<pre class=\"mermaid\">flowchart LR\n  A-->B</pre>\n");
}

#[test]
fn test_image_resolution_is_not_double_prefixed() {
    let resolver = ResourceResolver::new("https://host.local/ws");
    let images = ImageStage::new(resolver.clone());

    let once = render("![a](./pics/a.png)", &[&images]);
    assert!(once.contains("src=\"https://host.local/ws/pics/a.png\""));

    let again = render("![a](https://host.local/ws/pics/a.png)", &[&images]);
    assert_eq!(once, again);
}

#[test]
fn test_embedded_html_is_kept() {
    let html = render("Text with <span class=\"tag\">inline</span> html", &[]);
    assert_eq!(
        html,
        "<p>Text with <span class=\"tag\">inline</span> html</p>"
    );
}
