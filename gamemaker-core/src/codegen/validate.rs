//! Lightweight static checks on generated game code.
//!
//! Without a JavaScript engine available, parseability is approximated by a
//! string- and comment-aware delimiter balance scan. Structural markers the
//! templates guarantee (config object, scene functions, restart affordance)
//! are checked by substring; a missing marker is a warning, not a failure.

/// Result of validating a generated game script.
#[derive(Debug, Clone)]
pub struct Validation {
    /// False only when the code is not parseable at all.
    pub is_valid: bool,
    /// Missing structural markers (non-fatal).
    pub warnings: Vec<String>,
    /// Fatal syntax problems.
    pub errors: Vec<String>,
}

impl Validation {
    /// True when the code is valid and no markers are missing.
    pub fn has_all_required_elements(&self) -> bool {
        self.is_valid && self.warnings.is_empty()
    }
}

/// Validate a generated game script.
pub fn validate_code(code: &str) -> Validation {
    let errors = scan_delimiters(code);
    let is_valid = errors.is_empty();

    let mut warnings = Vec::new();
    if is_valid {
        if !code.contains("config") {
            warnings.push("Missing game config".to_string());
        }
        if !code.contains("function preload") {
            warnings.push("Missing preload function".to_string());
        }
        if !code.contains("function create") {
            warnings.push("Missing create function".to_string());
        }
        if !code.contains("function update") {
            warnings.push("Missing update function".to_string());
        }
        if !code.contains("Play Again") && !code.contains("play again") {
            warnings.push("Missing Play Again button".to_string());
        }
    }

    Validation {
        is_valid,
        warnings,
        errors,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScanState {
    Code,
    SingleQuote,
    DoubleQuote,
    TemplateString,
    LineComment,
    BlockComment,
}

/// Check that braces, brackets, and parens balance outside strings and
/// comments. Returns the list of problems found.
fn scan_delimiters(code: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut state = ScanState::Code;
    let mut escaped = false;
    let mut line = 1usize;

    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            if state == ScanState::LineComment {
                state = ScanState::Code;
            }
        }

        match state {
            ScanState::Code => match c {
                '\'' => state = ScanState::SingleQuote,
                '"' => state = ScanState::DoubleQuote,
                '`' => state = ScanState::TemplateString,
                '/' => {
                    if let Some(&next) = chars.peek() {
                        if next == '/' {
                            chars.next();
                            state = ScanState::LineComment;
                        } else if next == '*' {
                            chars.next();
                            state = ScanState::BlockComment;
                        }
                    }
                }
                '{' | '[' | '(' => stack.push((c, line)),
                '}' | ']' | ')' => {
                    let expected = match c {
                        '}' => '{',
                        ']' => '[',
                        _ => '(',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, open_line)) => {
                            errors.push(format!(
                                "Mismatched '{c}' on line {line} (last open was '{open}' on line {open_line})"
                            ));
                        }
                        None => {
                            errors.push(format!("Unexpected '{c}' on line {line}"));
                        }
                    }
                }
                _ => {}
            },
            ScanState::SingleQuote | ScanState::DoubleQuote | ScanState::TemplateString => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else {
                    let closer = match state {
                        ScanState::SingleQuote => '\'',
                        ScanState::DoubleQuote => '"',
                        _ => '`',
                    };
                    if c == closer {
                        state = ScanState::Code;
                    }
                }
            }
            ScanState::LineComment => {}
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = ScanState::Code;
                }
            }
        }
    }

    for (open, open_line) in stack {
        errors.push(format!("Unclosed '{open}' from line {open_line}"));
    }

    if matches!(
        state,
        ScanState::SingleQuote | ScanState::DoubleQuote | ScanState::TemplateString
    ) {
        errors.push("Unterminated string literal".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE_CODE: &str = "\
const config = {};\n\
function preload() {}\n\
function create() { showButton('Play Again'); }\n\
function update() {}\n";

    #[test]
    fn test_complete_code_is_clean() {
        let result = validate_code(COMPLETE_CODE);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert!(result.errors.is_empty());
        assert!(result.has_all_required_elements());
    }

    #[test]
    fn test_missing_update_is_single_warning() {
        let code = COMPLETE_CODE.replace("function update() {}\n", "");
        let result = validate_code(&code);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("update function"));
    }

    #[test]
    fn test_unbalanced_brace_is_fatal() {
        let code = "function create() { if (x) { }";
        let result = validate_code(code);
        assert!(!result.is_valid);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn test_stray_closer_is_fatal() {
        let result = validate_code("function update() {}}");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_braces_in_strings_do_not_count() {
        let code = "const config = { label: '}}}' };\n\
                    function preload() {}\n\
                    function create() { /* { */ show(\"Play Again\"); }\n\
                    function update() { // }\n}\n";
        let result = validate_code(code);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_lowercase_play_again_accepted() {
        let code = COMPLETE_CODE.replace("Play Again", "play again");
        let result = validate_code(&code);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let result = validate_code("const s = 'oops;\nfunction update() {}");
        assert!(!result.is_valid);
    }
}
