// Cross-cutting prompt fragments shared by every pipeline stage.
// Stage-specific templates live in pipeline::prompts.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every stage prompt to keep the model on the source material.
pub const EVIDENCE_INSTRUCTION: &str = "\
    Use ONLY information present in the provided material. \
    Do NOT infer, interpolate, or invent details. \
    If something is not mentioned, leave the corresponding list empty.";
