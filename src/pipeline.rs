//! One research run: capture the agent's printed response and clean it.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::agent::ResearchAgent;
use crate::capture::capture_run;
use crate::console::Console;
use crate::pprint::PrintOptions;
use crate::sanitize::clean;

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct Report {
    pub run_id: Uuid,
    pub topic: String,
    /// Sanitized response text.
    pub output: String,
}

impl Report {
    /// Output with every newline turned into a markdown hard break.
    pub fn markdown(&self) -> String {
        hard_breaks(&self.output)
    }
}

/// Make single newlines survive markdown rendering.
pub fn hard_breaks(text: &str) -> String {
    text.replace('\n', "  \n")
}

/// Runs the agent → capture → sanitize pipeline, one run at a time.
pub struct Researcher {
    agent: Arc<dyn ResearchAgent>,
    console: Arc<Console>,
    print: PrintOptions,
    running: Mutex<()>,
}

impl Researcher {
    pub fn new(agent: Arc<dyn ResearchAgent>, console: Arc<Console>, print: PrintOptions) -> Self {
        Self {
            agent,
            console,
            print,
            running: Mutex::new(()),
        }
    }

    /// Research `topic`. A call made while another run is in flight waits for it.
    pub async fn research(&self, topic: &str) -> anyhow::Result<Report> {
        let _running = self.running.lock().await;
        let run_id = Uuid::new_v4();

        tracing::info!(%run_id, topic = %topic, "Running agent for topic");
        let raw = capture_run(self.agent.as_ref(), topic, &self.console, &self.print).await?;
        let output = clean(&raw);
        tracing::info!(%run_id, raw_chars = raw.len(), chars = output.len(), "Agent run completed successfully");

        Ok(Report {
            run_id,
            topic: topic.to_string(),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::agent::{RunResponse, RunStream};
    use crate::console::CaptureBuffer;

    /// Sleeps inside the stream and records how many runs overlap.
    struct SlowAgent {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl ResearchAgent for SlowAgent {
        fn run_stream(&self, _topic: &str) -> RunStream {
            let active = Arc::clone(&self.active);
            let peak = Arc::clone(&self.peak);
            Box::pin(async_stream::try_stream! {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                yield RunResponse::content("done");
            })
        }
    }

    fn quiet_print() -> PrintOptions {
        PrintOptions {
            markdown: true,
            show_time: false,
        }
    }

    #[test]
    fn hard_breaks_keep_line_structure() {
        assert_eq!(hard_breaks("a\nb\n\nc"), "a  \nb  \n  \nc");
    }

    #[tokio::test]
    async fn runs_are_serialized() {
        let peak = Arc::new(AtomicUsize::new(0));
        let agent = SlowAgent {
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };
        let researcher = Arc::new(Researcher::new(
            Arc::new(agent),
            Arc::new(Console::new(CaptureBuffer::new())),
            quiet_print(),
        ));

        let a = tokio::spawn({
            let r = Arc::clone(&researcher);
            async move { r.research("one").await.map(|r| r.output) }
        });
        let b = tokio::spawn({
            let r = Arc::clone(&researcher);
            async move { r.research("two").await.map(|r| r.output) }
        });

        assert_eq!(a.await.unwrap().unwrap(), "Response\n\ndone");
        assert_eq!(b.await.unwrap().unwrap(), "Response\n\ndone");
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
