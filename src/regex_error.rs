//! Regex Error Handling
//!
//! Block patterns are mostly literal source code (`if (`, `{`, `);`) with a few
//! lazy wildcards in between, so the usual failure is an unescaped piece of
//! punctuation. This module turns `regex::Error` into a message that says
//! which delimiter is open and how to escape it.

use regex::Error as RegexError;

/// Regex compile error with diagnostic context
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedRegexError {
    pub pattern: String,
    pub error_type: RegexErrorType,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegexErrorType {
    /// Unclosed group/bracket/brace
    UnclosedDelimiter { delimiter: char, position: usize },
    /// Quantifier with nothing to repeat, or a malformed `{n,m}`
    InvalidQuantifier { message: String, position: Option<usize> },
    /// Look-ahead/look-behind, which the regex crate does not support
    Lookaround { message: String },
    /// Backreferences inside the pattern
    Backreference { message: String },
    Syntax { message: String },
}

impl EnhancedRegexError {
    pub fn from_regex_error(err: &RegexError, pattern: &str) -> Self {
        let error_msg = err.to_string();
        let error_type = Self::classify_error(&error_msg, pattern);
        let suggestion = Self::generate_suggestion(&error_type, pattern);

        EnhancedRegexError {
            pattern: pattern.to_string(),
            error_type,
            suggestion,
        }
    }

    fn classify_error(error_msg: &str, pattern: &str) -> RegexErrorType {
        // The full message echoes the pattern; classify on the summary only
        let lower_msg = first_line(error_msg).to_lowercase();

        if lower_msg.contains("unclosed") || lower_msg.contains("unterminated") {
            let candidates = if lower_msg.contains("class") || lower_msg.contains("bracket") {
                [('[', ']'), ('(', ')'), ('{', '}')]
            } else if lower_msg.contains("repetition") || lower_msg.contains("brace") {
                [('{', '}'), ('(', ')'), ('[', ']')]
            } else {
                [('(', ')'), ('[', ']'), ('{', '}')]
            };

            for (open, close) in candidates {
                if let Some(position) = find_unclosed_delimiter(pattern, open, close) {
                    return RegexErrorType::UnclosedDelimiter {
                        delimiter: open,
                        position,
                    };
                }
            }
        }

        if lower_msg.contains("look-around")
            || lower_msg.contains("lookaround")
            || lower_msg.contains("look-ahead")
            || lower_msg.contains("look-behind")
        {
            return RegexErrorType::Lookaround {
                message: error_msg.to_string(),
            };
        }

        if lower_msg.contains("backreference") {
            return RegexErrorType::Backreference {
                message: error_msg.to_string(),
            };
        }

        if lower_msg.contains("repetition")
            || lower_msg.contains("quantifier")
            || lower_msg.contains("repeat")
        {
            return RegexErrorType::InvalidQuantifier {
                message: error_msg.to_string(),
                position: find_invalid_quantifier(pattern),
            };
        }

        RegexErrorType::Syntax {
            message: error_msg.to_string(),
        }
    }

    fn generate_suggestion(error_type: &RegexErrorType, pattern: &str) -> Option<String> {
        match error_type {
            RegexErrorType::UnclosedDelimiter {
                delimiter,
                position,
            } => {
                let closer = closing_for(*delimiter)?;
                Some(format!(
                    "If '{}' at position {} is code you want to match literally, escape it as '\\{}'. \
                     Otherwise add the closing '{}'.",
                    delimiter, position, delimiter, closer
                ))
            }

            RegexErrorType::InvalidQuantifier { message, position } => {
                let at = position
                    .map(|p| format!(" at position {}", p))
                    .unwrap_or_default();
                let summary = first_line(message).to_lowercase();
                if summary.contains("missing") || summary.contains("nothing") {
                    Some(format!(
                        "A quantifier (*, +, ?){} has nothing to repeat. \
                         Escape it ('\\*', '\\+', '\\?') to match it literally.",
                        at
                    ))
                } else {
                    Some(
                        "Braces start a counted repetition ('a{2,5}'). \
                         To match a code block brace, escape it as '\\{' and '\\}'."
                            .to_string(),
                    )
                }
            }

            RegexErrorType::Lookaround { .. } => Some(
                "Look-around is not supported. Match the surrounding text with a lazy '.*?' \
                 and carry it through the replacement instead."
                    .to_string(),
            ),

            RegexErrorType::Backreference { .. } => Some(
                "Backreferences are not supported in patterns. \
                 Use '$1' or '${name}' in the replacement with --expand."
                    .to_string(),
            ),

            RegexErrorType::Syntax { .. } => {
                if pattern.contains('[') && !pattern.contains(']') {
                    Some("Unclosed character class '['. Escape it as '\\[' to match a literal bracket.".to_string())
                } else {
                    Some(
                        "Check the pattern syntax. Escape code punctuation: . + * ? ^ $ | ( ) [ ] { } \\"
                            .to_string(),
                    )
                }
            }
        }
    }

    /// Format the error as a user-friendly message
    pub fn display(&self) -> String {
        let mut output = String::from("Regex Error\n");
        output.push_str(&format!("  Pattern: \"{}\"\n", self.pattern));

        match &self.error_type {
            RegexErrorType::UnclosedDelimiter {
                delimiter,
                position,
            } => {
                output.push_str("  Type: Unclosed delimiter\n");
                output.push_str(&format!(
                    "  Missing closing '{}' for opening '{}' at position {}\n",
                    closing_for(*delimiter).unwrap_or('?'),
                    delimiter,
                    position
                ));
            }
            RegexErrorType::InvalidQuantifier { message, .. } => {
                output.push_str("  Type: Invalid quantifier\n");
                output.push_str(&format!("  Details: {}\n", first_line(message)));
            }
            RegexErrorType::Lookaround { message } => {
                output.push_str("  Type: Lookaround error\n");
                output.push_str(&format!("  Details: {}\n", first_line(message)));
            }
            RegexErrorType::Backreference { message } => {
                output.push_str("  Type: Backreference error\n");
                output.push_str(&format!("  Details: {}\n", first_line(message)));
            }
            RegexErrorType::Syntax { message } => {
                output.push_str("  Type: Syntax error\n");
                output.push_str(&format!("  Details: {}\n", first_line(message)));
            }
        }

        if let Some(ref suggestion) = self.suggestion {
            output.push_str(&format!("  Suggestion: {}\n", suggestion));
        }

        output
    }
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

/// regex::Error renders a multi-line caret diagram; keep the summary line.
fn first_line(message: &str) -> &str {
    message
        .lines()
        .rev()
        .find(|l| l.starts_with("error:"))
        .unwrap_or_else(|| message.lines().next().unwrap_or(message))
}

/// Position (in chars) of the last opening delimiter left unclosed, skipping
/// escaped characters and, for parens/braces, the inside of character classes.
fn find_unclosed_delimiter(pattern: &str, open: char, close: char) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_char_class = false;
    let mut escaped = false;

    for (i, c) in pattern.chars().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }

        if open != '[' {
            if c == '[' {
                in_char_class = true;
            } else if c == ']' {
                in_char_class = false;
            }
            if in_char_class {
                continue;
            }
        }

        if c == open {
            stack.push(i);
        } else if c == close {
            stack.pop();
        }
    }

    stack.last().copied()
}

/// Position of the first quantifier with nothing before it
fn find_invalid_quantifier(pattern: &str) -> Option<usize> {
    let chars: Vec<char> = pattern.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !matches!(c, '*' | '+' | '?') {
            continue;
        }
        if i > 0 && chars[i - 1] == '\\' {
            continue;
        }
        if i == 0 || chars[i - 1] == '(' || chars[i - 1] == '|' {
            return Some(i);
        }
    }

    None
}

/// Convert a regex error to a helpful anyhow::Error
pub fn enhanced_regex_error_to_anyhow(err: &RegexError, pattern: &str) -> anyhow::Error {
    let enhanced = EnhancedRegexError::from_regex_error(err, pattern);
    anyhow::anyhow!("{}", enhanced.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enhance(pattern: &str) -> EnhancedRegexError {
        let err = regex::Regex::new(pattern).unwrap_err();
        EnhancedRegexError::from_regex_error(&err, pattern)
    }

    #[test]
    fn test_unclosed_parenthesis_from_source_code() {
        let enhanced = enhance(r"if (nearbyFish && user\) \{");

        assert_eq!(
            enhanced.error_type,
            RegexErrorType::UnclosedDelimiter {
                delimiter: '(',
                position: 3
            }
        );
        assert!(enhanced.suggestion.unwrap().contains("\\("));
    }

    #[test]
    fn test_unclosed_bracket() {
        let enhanced = enhance("[abc");

        assert!(matches!(
            enhanced.error_type,
            RegexErrorType::UnclosedDelimiter { delimiter: '[', .. }
        ));
    }

    #[test]
    fn test_nothing_to_repeat() {
        let enhanced = enhance("*");

        assert!(matches!(
            enhanced.error_type,
            RegexErrorType::InvalidQuantifier { position: Some(0), .. }
        ));
        assert!(enhanced.suggestion.is_some());
    }

    #[test]
    fn test_lookahead_is_reported() {
        let enhanced = enhance("foo(?=bar)");
        assert!(matches!(enhanced.error_type, RegexErrorType::Lookaround { .. }));
    }

    #[test]
    fn test_find_unclosed_delimiter() {
        assert_eq!(find_unclosed_delimiter("(foo", '(', ')'), Some(0));
        assert_eq!(find_unclosed_delimiter("(foo)(bar", '(', ')'), Some(5));
        assert_eq!(find_unclosed_delimiter("(foo)(bar)", '(', ')'), None);
        assert_eq!(find_unclosed_delimiter(r"\(foo", '(', ')'), None);
        assert_eq!(find_unclosed_delimiter("[(]", '(', ')'), None);
    }

    #[test]
    fn test_find_invalid_quantifier() {
        assert_eq!(find_invalid_quantifier("*a"), Some(0));
        assert_eq!(find_invalid_quantifier("a|+b"), Some(2));
        assert_eq!(find_invalid_quantifier(r"a\*"), None);
        assert_eq!(find_invalid_quantifier(".*?"), None);
    }

    #[test]
    fn test_display_formatting() {
        let display = enhance("*").display();

        assert!(display.contains("Regex Error"));
        assert!(display.contains("Pattern: \"*\""));
        assert!(display.contains("Suggestion:"));
    }
}
