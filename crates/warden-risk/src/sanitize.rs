// sanitize.rs — Command-text sanitizer.
//
// Defense-in-depth only: this strips the most common injection vectors from a
// command string, but callers must not rely on it as a safety guarantee —
// the gate's pattern checks and permission checks are the real controls.
//
// Order matters: command-substitution spans are removed before the single
// dangerous characters, otherwise stripping `$` first would leave the
// substitution regex nothing to match.

use std::sync::LazyLock;

use regex::Regex;

/// `$( ... )` command-substitution spans, non-greedy within one line.
static SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\([^)]*\)").expect("literal regex"));

/// Strip shell metacharacters, `$(...)` substitutions, and trailing `#`
/// comments from a command string, then collapse whitespace.
pub fn sanitize_command(command: &str) -> String {
    // Remove command substitutions first, while `$(` is still intact.
    let without_subst = SUBSTITUTION.replace_all(command, "");

    // Remove the dangerous single characters: ; & | ` $
    let without_chars: String = without_subst
        .chars()
        .filter(|c| !matches!(c, ';' | '&' | '|' | '`' | '$'))
        .collect();

    // Remove everything from the first `#` to the end (comment).
    let without_comment = match without_chars.find('#') {
        Some(idx) => &without_chars[..idx],
        None => without_chars.as_str(),
    };

    // Collapse runs of whitespace into single spaces and trim.
    without_comment.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dangerous_characters() {
        assert_eq!(sanitize_command("ls; rm -rf /"), "ls rm -rf /");
        assert_eq!(sanitize_command("cat a | grep b"), "cat a grep b");
        assert_eq!(sanitize_command("echo hi && echo bye"), "echo hi echo bye");
    }

    #[test]
    fn strips_command_substitution() {
        assert_eq!(sanitize_command("echo $(whoami)"), "echo");
        assert_eq!(sanitize_command("echo $(cat /etc/passwd) done"), "echo done");
    }

    #[test]
    fn strips_trailing_comment() {
        assert_eq!(sanitize_command("ls -la # list everything"), "ls -la");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(sanitize_command("  ls    -la   "), "ls -la");
    }

    #[test]
    fn benign_command_unchanged() {
        assert_eq!(sanitize_command("ls -la /tmp"), "ls -la /tmp");
    }

    #[test]
    fn backtick_substitution_loses_backticks() {
        // Backticks are in the dangerous-character set; the inner text stays.
        assert_eq!(sanitize_command("echo `whoami`"), "echo whoami");
    }
}
