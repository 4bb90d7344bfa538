//! Lookahead scanner behaviour observed through the token stream

use js_compiler::{scan_balanced, Follow, Punctuator, ScanHints, Token, TokenStream};
use proptest::prelude::*;

fn scan(source: &str) -> (js_compiler::ScanOutcome, TokenStream) {
    let mut stream = TokenStream::new(source).unwrap();
    let outcome = scan_balanced(&mut stream, false);
    (outcome, stream)
}

#[test]
fn test_pattern_followed_by_assignment() {
    let (outcome, stream) = scan("[a, b = 1, ...c] = d");
    assert!(outcome.follow.is_punct(Punctuator::Assign));
    assert!(outcome.hints.contains(ScanHints::REST | ScanHints::ASSIGNMENT));
    assert_eq!(*stream.token(), Token::Punctuator(Punctuator::LBracket));
}

#[test]
fn test_nested_rest_is_not_a_hint() {
    let (outcome, _) = scan("{a: [...b]} = c");
    assert!(!outcome.hints.contains(ScanHints::REST));
    assert!(outcome.follow.is_punct(Punctuator::Assign));
}

#[test]
fn test_arrow_parameters() {
    let (outcome, stream) = scan("({a,b}) => {}");
    assert!(outcome.follow.is_punct(Punctuator::Arrow));
    assert!(outcome.hints.is_empty());
    assert_eq!(*stream.token(), Token::Punctuator(Punctuator::LParen));
    assert_eq!(stream.position().offset, 0);
}

#[test]
fn test_nested_default_sets_assignment_hint() {
    let (outcome, _) = scan("[{a: [b = 1]}] = c");
    assert!(outcome.hints.contains(ScanHints::ASSIGNMENT));
}

#[test]
fn test_for_of_head() {
    let (outcome, _) = scan("[a, b] of list");
    assert_eq!(outcome.follow, Follow::Of);
}

#[test]
fn test_division_after_group_is_not_a_regexp() {
    // `/ 2 /` would swallow the closing bracket if read as a regexp
    let (outcome, _) = scan("[(a) / 2 / 1] = x");
    assert!(outcome.follow.is_punct(Punctuator::Assign));
}

#[test]
fn test_regexp_after_operator() {
    let (outcome, _) = scan("[a = /]/] = x");
    assert!(outcome.follow.is_punct(Punctuator::Assign));
}

#[test]
fn test_template_with_nested_object() {
    let (outcome, _) = scan("[a = `${ {b: 1}.b }`] = x");
    assert!(outcome.follow.is_punct(Punctuator::Assign));
}

#[test]
fn test_unterminated_span() {
    let (outcome, stream) = scan("{a, b");
    assert_eq!(outcome.follow, Follow::Undetermined);
    assert_eq!(*stream.token(), Token::Punctuator(Punctuator::LBrace));
}

fn bracket_soup() -> impl Strategy<Value = String> {
    let atom = prop::sample::select(vec![
        "(", ")", "[", "]", "{", "}", "a", "1", "=", ",", ";", "...", "/", "`x${", "of", "\n",
        "'s'", "+", "=>",
    ]);
    prop::collection::vec(atom, 0..40).prop_map(|parts| format!("[{}", parts.join(" ")))
}

proptest! {
    #[test]
    fn prop_scan_restores_stream(source in bracket_soup()) {
        let Ok(mut stream) = TokenStream::new(&source) else {
            return Ok(());
        };
        let before = stream.current().clone();
        let first = scan_balanced(&mut stream, false);
        prop_assert_eq!(stream.current(), &before);
        // a second scan from the same place sees the same thing
        let second = scan_balanced(&mut stream, false);
        prop_assert_eq!(first, second);
        prop_assert_eq!(stream.current(), &before);
    }

    #[test]
    fn prop_deep_nesting_never_panics(depth in 0usize..600) {
        let source = format!("{}{}", "[".repeat(depth + 1), "]".repeat(depth + 1));
        let mut stream = TokenStream::new(&source).unwrap();
        let outcome = scan_balanced(&mut stream, false);
        if depth + 2 <= js_compiler::scanner::MAX_SCAN_DEPTH {
            prop_assert_eq!(outcome.follow, Follow::Token(Token::EOF));
        } else {
            prop_assert_eq!(outcome.follow, Follow::Undetermined);
        }
    }
}
