//! Judgment codes produced by the evaluator's language model.

/// One of the three fixed outcomes, or free text the model produced instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Judgment {
    ClearlyNovel,
    ObviousModification,
    PossiblyPlagiarized,
    Other(String),
}

impl Judgment {
    /// Parse a raw judgment. Surrounding whitespace is ignored when matching
    /// codes; unmatched input is kept exactly as given.
    pub fn from_code(raw: &str) -> Self {
        match raw.trim() {
            "(a)" => Judgment::ClearlyNovel,
            "(b)" => Judgment::ObviousModification,
            "(c)" => Judgment::PossiblyPlagiarized,
            _ => Judgment::Other(raw.to_string()),
        }
    }

    /// Human-readable text.
    pub fn describe(&self) -> &str {
        match self {
            Judgment::ClearlyNovel => "(a) Clearly novel",
            Judgment::ObviousModification => "(b) An obvious modification",
            Judgment::PossiblyPlagiarized => "(c) Possibly plagiarized",
            Judgment::Other(text) => text,
        }
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_codes() {
        assert_eq!(Judgment::from_code("(a)").describe(), "(a) Clearly novel");
        assert_eq!(Judgment::from_code("(b)").describe(), "(b) An obvious modification");
        assert_eq!(Judgment::from_code("(c)").describe(), "(c) Possibly plagiarized");
    }

    #[test]
    fn test_codes_match_after_trim() {
        assert_eq!(Judgment::from_code("  (b)\n"), Judgment::ObviousModification);
    }

    #[test]
    fn test_other_text_passes_through_verbatim() {
        for raw in ["", "(d)", "(a) Clearly novel because...", " free text \n"] {
            let judgment = Judgment::from_code(raw);
            assert_eq!(judgment, Judgment::Other(raw.to_string()));
            assert_eq!(judgment.to_string(), raw);
        }
    }
}
