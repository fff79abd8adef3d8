//! Server-rendered research page.

use pulldown_cmark::{html, Event, Options, Parser};

pub const PAGE_TITLE: &str = "The Wall Street Journal Researcher Agent";
pub const TOPIC_LABEL: &str = "Enter a topic to research:";
pub const RUN_BUTTON: &str = "Run Agent";
pub const OUTPUT_HEADING: &str = "Response Stream";

/// What the page shows below the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Idle,
    /// Markdown source of a finished run.
    Output(&'a str),
    /// Banner text.
    Error(&'a str),
}

pub fn render_page(topic: &str, outcome: Outcome<'_>) -> String {
    let result = match outcome {
        Outcome::Idle => String::new(),
        Outcome::Output(markdown) => format!(
            "<section class=\"output\">\n<h3>{}</h3>\n<div class=\"stream\">\n{}</div>\n</section>\n",
            OUTPUT_HEADING,
            markdown_to_html(markdown)
        ),
        Outcome::Error(message) => {
            format!("<div class=\"error\">{}</div>\n", escape_html(message))
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 860px; margin: 2rem auto; padding: 0 1rem; }}
form {{ display: flex; flex-direction: column; gap: .5rem; margin-bottom: 1.5rem; }}
input[type=text] {{ padding: .5rem; font-size: 1rem; }}
button {{ align-self: flex-start; padding: .5rem 1.2rem; font-size: 1rem; }}
.error {{ background: #fdecea; color: #611a15; padding: .75rem 1rem; border-radius: 4px; }}
.stream {{ line-height: 1.5; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="post" action="/">
<label for="topic">{label}</label>
<input type="text" id="topic" name="topic" value="{topic}">
<button type="submit">{button}</button>
</form>
{result}</body>
</html>
"#,
        title = PAGE_TITLE,
        label = TOPIC_LABEL,
        topic = escape_html(topic),
        button = RUN_BUTTON,
        result = result,
    )
}

/// Render markdown to HTML. Raw HTML in the source is shown as text.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
