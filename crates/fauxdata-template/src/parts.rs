/// Split a shorthand declaration into tokens.
///
/// Tokens are separated by whitespace. A token that opens with `'` or `"`
/// runs to the matching quote, keeping inner whitespace and dropping the
/// quotes. An unterminated quote takes the rest of the input.
pub fn split_parts(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if ch == '"' || ch == '\'' {
            chars.next();
            for inner in chars.by_ref() {
                if inner == ch {
                    break;
                }
                token.push(inner);
            }
        } else {
            while let Some(&inner) = chars.peek() {
                if inner.is_whitespace() {
                    break;
                }
                token.push(inner);
                chars.next();
            }
        }
        parts.push(token);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_quoted_runs_together() {
        let parts = split_parts(
            "mycol Random Timestamp \"2023-03-03 00:00:00\" '2026-12-12 23:59:59'",
        );
        assert_eq!(
            parts,
            vec![
                "mycol",
                "Random",
                "Timestamp",
                "2023-03-03 00:00:00",
                "2026-12-12 23:59:59"
            ]
        );
    }

    #[test]
    fn extra_whitespace_yields_no_empty_tokens() {
        assert_eq!(split_parts("  a   b\tc  "), vec!["a", "b", "c"]);
        assert!(split_parts("   ").is_empty());
    }

    #[test]
    fn quotes_inside_a_token_are_literal() {
        assert_eq!(split_parts("it's fine"), vec!["it's", "fine"]);
        assert_eq!(split_parts("\"say 'hi'\" x"), vec!["say 'hi'", "x"]);
    }

    #[test]
    fn unterminated_quote_takes_the_rest() {
        assert_eq!(split_parts("a 'b c"), vec!["a", "b c"]);
    }

    #[test]
    fn explicit_empty_quotes_are_kept() {
        assert_eq!(split_parts("x Fixed String ''"), vec!["x", "Fixed", "String", ""]);
    }
}
