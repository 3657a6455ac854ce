// tests/property/parser_test.rs

//! Properties of request-line parsing.

use proptest::prelude::*;
use remoteplay::core::protocol::{Command, ParsedLine, parse_arguments};

// Argument text may contain anything but a double quote or a line break.
const ARG: &str = "[^\"\r\n]{0,40}";

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn arguments_come_back_in_order(args in prop::collection::vec(ARG, 0..6)) {
        let line = std::iter::once("KEYWORD".to_string())
            .chain(args.iter().map(|a| format!("\"{a}\"")))
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(parse_arguments(&line), args);
    }

    #[test]
    fn tokenizing_is_deterministic(line in ".{0,80}") {
        prop_assert_eq!(ParsedLine::tokenize(&line), ParsedLine::tokenize(&line));
    }

    #[test]
    fn play_keeps_the_filename_verbatim(filename in ARG) {
        let command = Command::parse(&format!("PLAY \"{filename}\"")).unwrap();
        prop_assert_eq!(command, Command::Play { filename });
    }

    #[test]
    fn authenticate_keeps_argument_order(device in ARG, password in ARG) {
        let line = format!("AUTHENTICATE \"{device}\" \"{password}\"");
        let command = Command::parse(&line).unwrap();
        prop_assert_eq!(command, Command::Authenticate { device, password });
    }

    #[test]
    fn lowercase_keywords_are_never_commands(word in "[a-z_]{1,12}") {
        prop_assert!(Command::parse(&word).is_err());
    }

    #[test]
    fn parsing_never_panics(line in "\\PC{0,120}") {
        let _ = Command::parse(&line);
    }
}
