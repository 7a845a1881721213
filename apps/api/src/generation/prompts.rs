pub const GENERATION_SYSTEM: &str = "You are the writing assistant of SmartCareer AI, a job board \
    and resume platform. You help students write resumes and applications, and help companies \
    write job postings. Respond with the requested text only.";

/// Placeholders: {wizard}, {target}, {instruction}, {context}, {factuality}
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Wizard: {wizard}
Field to write: {target}

Task: {instruction}

Context entered so far:
{context}

{factuality}"#;
