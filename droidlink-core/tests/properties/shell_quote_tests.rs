//! Property-based tests for remote shell quoting

use droidlink_core::shell::{detached, quote, single_quote};
use proptest::prelude::*;

/// Undoes POSIX `sh` quoting for words built from plain characters,
/// single-quoted runs and `\'`
fn sh_unquote(word: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' => loop {
                match chars.next()? {
                    '\'' => break,
                    inner => out.push(inner),
                }
            },
            '\\' => out.push(chars.next()?),
            plain => out.push(plain),
        }
    }
    Some(out)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Single quoting is undone by the shell to the original text
    #[test]
    fn single_quote_round_trips_through_sh(value in "\\PC{0,40}") {
        let quoted = single_quote(&value);
        prop_assert!(quoted.starts_with('\''));
        prop_assert!(quoted.ends_with('\''));
        prop_assert_eq!(sh_unquote(&quoted), Some(value));
    }

    /// Minimal quoting yields one shell word that means the original text
    #[test]
    fn quote_yields_single_word(value in "[a-zA-Z0-9 '\"$;&|*./_-]{0,30}") {
        let quoted = quote(&value);
        prop_assert!(!quoted.is_empty());
        prop_assert_eq!(sh_unquote(&quoted), Some(value));
    }

    /// The detached launcher carries the command as one quoted argument
    #[test]
    fn detached_embeds_command_verbatim(command in "[a-z '|;-]{1,30}") {
        let line = detached(&command, "/data/local/tmp/out.log");
        let quoted = single_quote(&command);
        let expected_prefix = format!("nohup sh -c {quoted} > ");
        prop_assert!(line.starts_with(&expected_prefix));
        prop_assert!(line.ends_with("2>&1 & echo $!"));
    }
}
