/// Splits a command-line remainder into argument tokens.
///
/// Handles:
/// - Space-separated arguments (runs of spaces never yield empty tokens)
/// - Double-quoted arguments, which may contain spaces
/// - Backslash escapes, which make the next character literal (quote, space
///   or backslash alike) both inside and outside quotes
///
/// Closing a quote ends the current token even when no space follows, so
/// `"a"b` yields `["a", "b"]`. An unterminated quote runs to the end of the
/// input and a trailing lone backslash is dropped.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;

    for ch in input.chars() {
        let mut complete = false;

        if escaped {
            current.push(ch);
            escaped = false;
        } else {
            match ch {
                '"' => {
                    complete = in_quote;
                    in_quote = !in_quote;
                }
                ' ' if !in_quote => complete = true,
                '\\' => escaped = true,
                _ => current.push(ch),
            }
        }

        if complete && !current.is_empty() {
            args.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Splits raw message content into a verb and the argument remainder.
///
/// Returns `None` unless `content` starts with `prefix`. The verb is the first
/// space-delimited word with the prefix removed; the remainder is everything
/// after the first space, or an empty string when there is none.
///
/// ```rust,ignore
/// assert_eq!(split_command_line("!say hi there", "!"), Some(("say", "hi there")));
/// assert_eq!(split_command_line("!ping", "!"), Some(("ping", "")));
/// ```
pub fn split_command_line<'a>(content: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let body = content.strip_prefix(prefix)?;
    Some(body.split_once(' ').unwrap_or((body, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(tokenize("a b c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tokenize_quoted() {
        assert_eq!(tokenize(r#"a "b c" d"#), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_tokenize_escaped_space() {
        assert_eq!(tokenize(r"a\ b"), vec!["a b"]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert_eq!(tokenize(r#""unterminated"#), vec!["unterminated"]);
        assert_eq!(tokenize(r#"x "keeps  its spaces"#), vec!["x", "keeps  its spaces"]);
    }

    #[test]
    fn test_tokenize_collapses_spaces() {
        assert_eq!(tokenize("a  b"), vec!["a", "b"]);
        assert_eq!(tokenize("   a   "), vec!["a"]);
        assert!(tokenize("     ").is_empty());
    }

    #[test]
    fn test_tokenize_escaped_quotes_are_literal() {
        assert_eq!(tokenize(r#"\"quoted\""#), vec![r#""quoted""#]);
        assert_eq!(tokenize(r#""say \"hi\" now""#), vec![r#"say "hi" now"#]);
    }

    #[test]
    fn test_tokenize_closing_quote_flushes() {
        assert_eq!(tokenize(r#""a"b"#), vec!["a", "b"]);
        assert_eq!(tokenize(r#"pre"fix""#), vec!["prefix"]);
    }

    #[test]
    fn test_tokenize_empty_quotes_emit_nothing() {
        assert_eq!(tokenize(r#"a "" b"#), vec!["a", "b"]);
    }

    #[test]
    fn test_tokenize_trailing_backslash_dropped() {
        assert_eq!(tokenize(r"abc\"), vec!["abc"]);
        assert_eq!(tokenize(r"a\\b"), vec![r"a\b"]);
    }

    #[test]
    fn test_tokenize_keeps_other_whitespace() {
        assert_eq!(tokenize("a\tb c"), vec!["a\tb", "c"]);
    }

    #[test]
    fn test_split_command_line() {
        assert_eq!(split_command_line("!say hi there", "!"), Some(("say", "hi there")));
        assert_eq!(split_command_line("!ping", "!"), Some(("ping", "")));
        assert_eq!(split_command_line("!!ping x", "!!"), Some(("ping", "x")));
        assert_eq!(split_command_line("ping", "!"), None);
    }

    #[test]
    fn test_split_command_line_bare_prefix() {
        assert_eq!(split_command_line("!", "!"), Some(("", "")));
        assert_eq!(split_command_line("! ping", "!"), Some(("", "ping")));
    }
}
