// Provider-independent instructions sent as the system message on every
// completion. Task-specific prompts live next to the feature that uses them.

/// Keeps the reply machine-readable: one JSON object, nothing around it.
pub const JSON_ONLY_SYSTEM: &str = "You extract structured data from documents. \
    Reply with a single JSON object and nothing else: \
    no prose before or after it, no markdown fences, no comments. \
    Use null for values the document does not state.";
