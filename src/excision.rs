//! Multi-line block excision
//!
//! An [`Excision`] is one compiled pattern plus the text that replaces every
//! match. Patterns are compiled with dot-matches-newline so a lazy `.*?` can
//! span the body of a code block.

use anyhow::Result;
use regex::{Regex, RegexBuilder};

use crate::regex_error::enhanced_regex_error_to_anyhow;

/// File the tool targets when neither the command line nor the config names one.
pub const DEFAULT_TARGET: &str = "src/components/Screens/FishingScreenModular.tsx";

/// The orphaned capture branch of the fishing screen: an
/// `if (nearbyFish && user) { .. } else { .. setShowMinigame(true); }` pair,
/// together with the whitespace leading into it.
pub const DEFAULT_PATTERN: &str =
    r"\s*if \(nearbyFish && user\) \{.*?\}\s*else \{.*?setShowMinigame\(true\);\s*\}";

/// A block of text removed (or replaced) by an excision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedBlock {
    /// Byte offset of the match in the original text
    pub start: usize,
    /// Byte offset one past the end of the match
    pub end: usize,
    /// 1-based line of the first non-whitespace character of the match
    pub start_line: usize,
    /// 1-based line holding the last character of the match
    pub end_line: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ExcisionOutcome {
    pub content: String,
    pub removed: Vec<RemovedBlock>,
}

impl ExcisionOutcome {
    /// True when the rewritten text is identical to the input
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Excision {
    regex: Regex,
    replacement: String,
    expand_captures: bool,
}

impl Excision {
    /// Compile `pattern`; every match is replaced by `replacement` verbatim.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| enhanced_regex_error_to_anyhow(&e, pattern))?;

        Ok(Self {
            regex,
            replacement: replacement.to_string(),
            expand_captures: false,
        })
    }

    /// The built-in dead block removal.
    pub fn dead_block() -> Result<Self> {
        Self::new(DEFAULT_PATTERN, "")
    }

    /// Treat `$1`, `${name}` in the replacement as capture references.
    pub fn with_capture_expansion(mut self, expand: bool) -> Self {
        self.expand_captures = expand;
        self
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace every non-overlapping match in `content`.
    pub fn apply(&self, content: &str) -> ExcisionOutcome {
        let mut output = String::with_capacity(content.len());
        let mut removed = Vec::new();
        let mut last = 0;

        for caps in self.regex.captures_iter(content) {
            let Some(m) = caps.get(0) else { continue };

            let mut piece = String::new();
            if self.expand_captures {
                caps.expand(&self.replacement, &mut piece);
            } else {
                piece.push_str(&self.replacement);
            }

            // Empty matches and replacements equal to the match leave the text as is
            let text = m.as_str();
            if piece == text {
                continue;
            }

            output.push_str(&content[last..m.start()]);
            output.push_str(&piece);
            last = m.end();

            let leading_ws = text.len() - text.trim_start().len();
            let first_visible = if leading_ws == text.len() {
                m.start()
            } else {
                m.start() + leading_ws
            };

            removed.push(RemovedBlock {
                start: m.start(),
                end: m.end(),
                start_line: line_at(content, first_visible),
                end_line: line_at(content, m.end().saturating_sub(1).max(m.start())),
                text: text.to_string(),
            });
        }

        output.push_str(&content[last..]);

        if output == content {
            return ExcisionOutcome {
                content: output,
                removed: Vec::new(),
            };
        }

        ExcisionOutcome {
            content: output,
            removed,
        }
    }
}

/// 1-based line number of the byte at `offset`
fn line_at(content: &str, offset: usize) -> usize {
    content.as_bytes()[..offset.min(content.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: &str = r#"  const handleCast = () => {
    startCast();
    if (nearbyFish && user) {
      catchFish(nearbyFish);
    } else {
      setCastFailed(true);
      setShowMinigame(true);
    }
  };
"#;

    #[test]
    fn test_dead_block_is_removed() {
        let excision = Excision::dead_block().unwrap();
        let outcome = excision.apply(SCREEN);

        assert_eq!(
            outcome.content,
            "  const handleCast = () => {\n    startCast();\n  };\n"
        );
        assert_eq!(outcome.removed.len(), 1);
    }

    #[test]
    fn test_removed_block_lines() {
        let excision = Excision::dead_block().unwrap();
        let outcome = excision.apply(SCREEN);

        let block = &outcome.removed[0];
        assert_eq!(block.start_line, 3);
        assert_eq!(block.end_line, 8);
        assert!(block.text.trim_start().starts_with("if (nearbyFish && user)"));
        assert!(block.text.ends_with('}'));
    }

    #[test]
    fn test_second_pass_is_noop() {
        let excision = Excision::dead_block().unwrap();
        let once = excision.apply(SCREEN);
        let twice = excision.apply(&once.content);

        assert!(twice.is_unchanged());
        assert_eq!(twice.content, once.content);
    }

    #[test]
    fn test_no_match_returns_input() {
        let excision = Excision::dead_block().unwrap();
        let text = "if (nearbyFish) {\n  reel();\n}\n";
        let outcome = excision.apply(text);

        assert!(outcome.is_unchanged());
        assert_eq!(outcome.content, text);
    }

    #[test]
    fn test_lazy_match_stops_at_first_minigame_call() {
        let excision = Excision::dead_block().unwrap();
        let text = "a();\nif (nearbyFish && user) {\n x();\n} else {\n setShowMinigame(true);\n}\nsetShowMinigame(true);\n}\n";
        let outcome = excision.apply(text);

        assert_eq!(outcome.content, "a();\nsetShowMinigame(true);\n}\n");
    }

    #[test]
    fn test_every_match_is_removed() {
        let excision = Excision::new(r"\s*// dead:.*?// end", "").unwrap();
        let text = "keep1\n// dead: a\n b\n// end\nkeep2\n// dead: c // end\nkeep3";
        let outcome = excision.apply(text);

        assert_eq!(outcome.content, "keep1\nkeep2\nkeep3");
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.removed[1].start_line, 6);
    }

    #[test]
    fn test_replacement_is_literal_by_default() {
        let excision = Excision::new(r"(\w+)=old", "$1=new").unwrap();
        let outcome = excision.apply("key=old");
        assert_eq!(outcome.content, "$1=new");
    }

    #[test]
    fn test_capture_expansion() {
        let excision = Excision::new(r"(\w+)=old", "$1=new")
            .unwrap()
            .with_capture_expansion(true);
        let outcome = excision.apply("key=old");
        assert_eq!(outcome.content, "key=new");
    }

    #[test]
    fn test_empty_matches_are_not_changes() {
        let excision = Excision::new("z*", "").unwrap();
        let outcome = excision.apply("abc\n");

        assert!(outcome.is_unchanged());
        assert_eq!(outcome.content, "abc\n");
    }

    #[test]
    fn test_identity_replacement_is_not_a_change() {
        let excision = Excision::new("abc", "abc").unwrap();
        assert!(excision.apply("xabcx").is_unchanged());

        let expanding = Excision::new(r"(\w+)=v", "$1=v").unwrap().with_capture_expansion(true);
        assert!(expanding.apply("key=v").is_unchanged());
    }

    #[test]
    fn test_only_changing_matches_are_recorded() {
        let excision = Excision::new("a|b", "a").unwrap();
        let outcome = excision.apply("abab");

        assert_eq!(outcome.content, "aaaa");
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.removed[0].start, 1);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = Excision::new(r"if (nearbyFish", "").unwrap_err();
        assert!(err.to_string().contains("Regex Error"));
    }

    #[test]
    fn test_multibyte_content_is_preserved() {
        let excision = Excision::dead_block().unwrap();
        let text = format!("// código órfão\n{}// fim 🎣\n", SCREEN);
        let outcome = excision.apply(&text);

        assert!(outcome.content.starts_with("// código órfão\n"));
        assert!(outcome.content.ends_with("  };\n// fim 🎣\n"));
        assert_eq!(outcome.removed[0].start_line, 4);
    }
}
