// Shared prompt fragments. Each stage keeps its own instructions in
// analysis/prompts.rs and appends these where it needs them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps generated résumé content tied to the candidate's record.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the candidate profile and the confirmed skills. \
    Do NOT invent employers, dates, degrees or contact details. \
    If a field is unknown, use an empty string rather than a placeholder.";

/// Joins a role instruction with the JSON-only fragment.
pub fn json_system(role_instruction: &str) -> String {
    format!("{role_instruction}\n\n{JSON_ONLY_SYSTEM}")
}
