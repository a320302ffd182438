use super::*;

#[test]
fn render_markdown_html_formats_emphasis() {
    assert_eq!(render_markdown_html("take a **deep** breath"), "<p>take a <strong>deep</strong> breath</p>\n");
}

#[test]
fn render_markdown_html_drops_raw_html() {
    let out = render_markdown_html("hi <script>alert(1)</script>");
    assert!(!out.contains("<script>"));
    assert!(out.starts_with("<p>hi "));
}

#[test]
fn render_markdown_html_keeps_web_links() {
    let out = render_markdown_html("see [the guide](https://example.com/guide)");
    assert!(out.contains(r#"<a href="https://example.com/guide">the guide</a>"#));
}

#[test]
fn render_markdown_html_strips_script_links_but_keeps_text() {
    let out = render_markdown_html("[click me](javascript:alert(1)) now");
    assert!(!out.contains("javascript"));
    assert!(!out.contains("<a"));
    assert!(out.contains("click me"));
}

#[test]
fn render_markdown_html_strips_data_images() {
    let out = render_markdown_html("![smile](data:image/svg+xml;base64,AAAA)");
    assert!(!out.contains("<img"));
    assert!(out.contains("smile"));
}

#[test]
fn is_safe_url_accepts_relative_and_allowed_schemes() {
    assert!(is_safe_url("/help"));
    assert!(is_safe_url("help?topic=a:b"));
    assert!(is_safe_url("MAILTO:care@example.com"));
    assert!(is_safe_url("http://example.com"));
    assert!(!is_safe_url(" JavaScript:alert(1)"));
    assert!(!is_safe_url("vbscript:msgbox"));
}
