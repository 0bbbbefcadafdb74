//! Prompts for the repository scouting engine.

/// Task wording used when the user names only a topic.
pub fn default_task(topic: &str) -> String {
    format!(
        "Find the top 5 GitHub repositories for the topic: {}.",
        topic.trim()
    )
}

/// System prompt with the record shape appended as format instructions.
pub fn system_prompt(schema_shape: &str) -> String {
    format!("{}\n\n{}", SCOUT_INSTRUCTIONS, format_instructions(schema_shape))
}

const SCOUT_INSTRUCTIONS: &str = r#"You are an expert technical analyst. Your mission is to find and qualify the 5 best GitHub repositories related to the user's request.

## Goal

Fulfill the user's specific request. If it contains detailed instructions, prioritize them. If it only names a topic, follow the default process.

## Default Process

- Find the 5 most popular and relevant repositories for the topic.
- Prioritize relevance, star count and quality of documentation.

## Mandatory Steps

1. **Search:** Use `web_search` to find candidate repositories or curated lists.
2. **Read:** For each promising URL, use `fetch_page` to read the star count, primary language and description.
3. **Format:** Compile the 5 best repositories into the JSON format below. This is your only valid final output.

Call one tool at a time. Your final answer MUST be ONLY the JSON object. Do not have a conversation."#;

fn format_instructions(schema_shape: &str) -> String {
    format!(
        "## Output Format\n\n\
         Return one JSON object that matches this schema:\n\n\
         ```json\n{}\n```\n\n\
         `identifier` is the `owner/name` form of the repository, `url` its full address \
         and `popularity` its star count as a plain integer.",
        schema_shape
    )
}
