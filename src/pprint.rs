//! Console pretty-printer for agent runs.
//!
//! Drains a [`RunStream`] and draws the accumulated response as a rounded
//! panel, the way a terminal UI would show it. Markdown level-one headings are
//! drawn as heavy boxes inside the panel.

use std::time::Instant;

use futures::StreamExt;
use serde_json::Value;

use crate::agent::{RunResponse, RunStream};
use crate::console::Console;

/// Status line written before the first fragment arrives.
pub const STATUS_LINE: &str = "Response Running...";

const MIN_WIDTH: usize = 40;

/// How the response panel is drawn.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Draw markdown headings as boxes.
    pub markdown: bool,
    /// Put the elapsed time in the panel title.
    pub show_time: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            markdown: true,
            show_time: true,
        }
    }
}

/// Consume `stream` exactly once and print the response to `console`.
///
/// Returns when the stream is exhausted, or with the first error it yields.
pub async fn pprint_run_response(
    mut stream: RunStream,
    console: &Console,
    options: &PrintOptions,
) -> anyhow::Result<()> {
    let started = Instant::now();
    console.write_line(STATUS_LINE)?;

    let mut content = String::new();
    while let Some(fragment) = stream.next().await {
        match fragment? {
            RunResponse::Content { content: text } => content.push_str(&text),
            RunResponse::ToolCall { name, arguments } => {
                content.push_str(&format!("\n - Running: {}\n\n", tool_call_label(&name, &arguments)));
            }
        }
    }

    let title = if options.show_time {
        format!("Response ({:.1}s)", started.elapsed().as_secs_f64())
    } else {
        "Response".to_string()
    };

    let body = if options.markdown {
        markdown_lines(&content)
    } else {
        content.lines().map(str::to_string).collect()
    };

    console.write_str(&panel(&title, &body))?;
    console.flush()?;
    Ok(())
}

/// Render a tool call as `name(key=value, ...)`.
fn tool_call_label(name: &str, arguments: &str) -> String {
    let args = match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => arguments.to_string(),
    };
    format!("{}({})", name, args)
}

/// Response lines with `# heading` lines replaced by heavy boxes.
fn markdown_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in content.lines() {
        match line.strip_prefix("# ") {
            Some(heading) => {
                let heading = heading.trim();
                let bar = "━".repeat(width(heading) + 2);
                lines.push(format!("┏{}┓", bar));
                lines.push(format!("┃ {} ┃", heading));
                lines.push(format!("┗{}┛", bar));
            }
            None => lines.push(line.to_string()),
        }
    }
    lines
}

/// Draw a rounded panel with a title row.
fn panel(title: &str, body: &[String]) -> String {
    let inner = body
        .iter()
        .map(|l| width(l))
        .chain(std::iter::once(width(title)))
        .max()
        .unwrap_or(0)
        .max(MIN_WIDTH);

    let bar = "─".repeat(inner + 2);
    let mut out = String::new();
    out.push_str(&format!("╭{}╮\n", bar));
    out.push_str(&row(title, inner));
    out.push_str(&row("", inner));
    for line in body {
        out.push_str(&row(line, inner));
    }
    out.push_str(&format!("╰{}╯\n", bar));
    out
}

fn row(text: &str, inner: usize) -> String {
    let pad = inner.saturating_sub(width(text));
    format!("│ {}{} │\n", text, " ".repeat(pad))
}

fn width(text: &str) -> usize {
    text.chars().count()
}
