// Shared prompt fragments. Feature prompts live next to the code that uses them.

/// System prompt fragment for plain-text completions.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a precise writing assistant. \
    Respond with the requested text only. \
    Do NOT use markdown code fences. \
    Do NOT add headings, explanations, or apologies.";

/// Appended to every generation prompt.
pub const FACTUALITY_INSTRUCTION: &str = "\
    Use only the facts given in the context. Do NOT invent employers, degrees, \
    dates, numbers, or certifications. If a detail is missing, write around it.";
