//! System prompt for the research agent.

use chrono::{DateTime, Local};

use crate::tools::ToolRegistry;

use super::config::AgentConfig;

/// Build the system prompt: description, instructions, tool list.
///
/// `now` is appended to the instructions when given.
pub fn build_system_prompt(
    config: &AgentConfig,
    tools: &ToolRegistry,
    now: Option<DateTime<Local>>,
) -> String {
    let mut instructions: Vec<String> = config.instructions.clone();
    if config.markdown {
        instructions.push("Use markdown to format your answers.".to_string());
    }
    if let Some(now) = now {
        instructions.push(format!(
            "The current time is {}",
            now.format("%Y-%m-%d %H:%M:%S %:z")
        ));
    }

    let instructions = instructions
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n");

    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{description}

## Instructions
{instructions}

## Tools
You have access to the following tools:
{tool_descriptions}"#,
        description = config.description,
        instructions = instructions,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::config::ToolsConfig;

    #[test]
    fn prompt_lists_instructions_in_order() {
        let tools = ToolRegistry::research_tools(&ToolsConfig::default()).unwrap();
        let prompt = build_system_prompt(&AgentConfig::default(), &tools, None);

        let search = prompt.find("search for the top 5 links").unwrap();
        let read = prompt.find("read each URL").unwrap();
        let write = prompt.find("NYT worthy article").unwrap();
        assert!(search < read && read < write);
        assert!(prompt.starts_with("You are a senior The Wall Street Journal researcher"));
        assert!(prompt.contains("- **web_search**"));
        assert!(prompt.contains("- **read_article**"));
        assert!(prompt.contains("Use markdown"));
        assert!(!prompt.contains("current time"));
    }

    #[test]
    fn prompt_includes_datetime_when_given() {
        let now = Local.with_ymd_and_hms(2024, 9, 10, 8, 30, 0).unwrap();
        let config = AgentConfig::default().markdown(false);
        let prompt = build_system_prompt(&config, &ToolRegistry::new(), Some(now));
        assert!(prompt.contains("The current time is 2024-09-10 08:30:00"));
        assert!(!prompt.contains("Use markdown"));
    }
}
