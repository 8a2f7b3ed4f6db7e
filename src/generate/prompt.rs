// src/generate/prompt.rs

/// Build the text handed to a command-backed generator.
///
/// Contains the schema description and the recent questions the generator
/// must not repeat.
pub fn build_prompt(schema: &str, history: &[String]) -> String {
    let mut prompt = String::from(
        "You are a curious data analyst exploring a database. \
         Generate ONE specific, measurable question that would be insightful to ask.\n\n",
    );

    if !schema.trim().is_empty() {
        prompt.push_str("Schema:\n");
        prompt.push_str(schema.trim());
        prompt.push_str("\n\n");
    }

    if !history.is_empty() {
        prompt.push_str("Recently asked questions (do not repeat these):\n");
        for (i, q) in history.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, q));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Guidelines:\n\
         - Include a time comparison (today vs yesterday, this week vs last week)\n\
         - Ask about trends, top performers or anomalies\n\
         - Be specific and measurable\n\n\
         Reply with the question only.\n",
    );

    prompt
}
