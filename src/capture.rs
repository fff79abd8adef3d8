//! Response capture: run the agent and collect what the pretty-printer prints.

use crate::agent::ResearchAgent;
use crate::console::{CaptureBuffer, Console};
use crate::pprint::{pprint_run_response, PrintOptions};

/// Run `agent` on `topic` and return the console text the run produced.
///
/// The console is redirected into a private buffer only while the run is
/// printed; errors from the agent propagate after the console is restored.
pub async fn capture_run(
    agent: &dyn ResearchAgent,
    topic: &str,
    console: &Console,
    options: &PrintOptions,
) -> anyhow::Result<String> {
    let buffer = CaptureBuffer::new();
    {
        let _redirect = console.redirect(buffer.clone());
        pprint_run_response(agent.run_stream(topic), console, options).await?;
    }
    Ok(buffer.contents())
}
