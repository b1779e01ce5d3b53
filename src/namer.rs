//! Optional AI namer collaborator (§6, §9): a pure-function capability the
//! pipeline treats as `snippet -> Option<identifier>`, with a deterministic
//! fallback so runs stay reproducible when no such capability is wired up.

/// Context passed to a name suggester alongside the representative snippet.
#[derive(Debug, Clone)]
pub struct NamingContext {
    pub owner_type: String,
    pub strategy: String,
}

pub trait NameSuggester: Send + Sync {
    /// Suggest an identifier for the extracted helper. Any invalid response
    /// (not a valid identifier) is discarded by the caller.
    fn suggest(&self, snippet: &str, context: &NamingContext) -> Option<String>;
}

/// Deterministic fallback: never calls out to anything external, always
/// returns `None` so callers fall through to the heuristic name in
/// `recommend::heuristic_name`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicNamer;

impl NameSuggester for HeuristicNamer {
    fn suggest(&self, _snippet: &str, _context: &NamingContext) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_namer_never_suggests() {
        let namer = HeuristicNamer;
        let ctx = NamingContext { owner_type: "Foo".into(), strategy: "EXTRACT_HELPER_METHOD".into() };
        assert!(namer.suggest("let x = 1;", &ctx).is_none());
    }
}
