use crate::parser::ast::Operator;
use crate::types::mode::Mode;
use crate::types::note::{AbsNote, AlphaNote, RelNote};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;

/// Represents the lexical units of the InfiniteSounds language
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Notes
    AbsNote(AbsNote),     // C, C#4, !ab3, Ebmin
    RelNote(RelNote),     // ~~1, ~2, ~-1b
    AlphaNote(AlphaNote), // ~E, ~C#1

    // Names
    Word(String),          // sine, gain, lfo
    CssVariable(String),   // --volume
    DollarVariable(usize), // $1

    /// A number with the literal text it was read from and an optional
    /// unit suffix: 440, -2, 1.5e3, 12hz
    Number {
        literal: String,
        value: f64,
        unit: String,
    },

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,

    Operator(Operator),

    /// Quoted string with its raw content; escapes are left as written
    Text(String),

    /// Text no other pattern accepts, up to the next whitespace, or a
    /// note whose numbers do not fit
    Error(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::AbsNote(note) => write!(f, "{}", note),
            Token::RelNote(note) => write!(f, "{}", note),
            Token::AlphaNote(note) => write!(f, "{}", note),
            Token::Word(word) => write!(f, "{}", word),
            Token::CssVariable(name) => write!(f, "{}", name),
            Token::DollarVariable(index) => write!(f, "${}", index),
            Token::Number { literal, unit, .. } => write!(f, "{}{}", literal, unit),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Text(text) => write!(f, "\"{}\"", text),
            Token::Error(text) => write!(f, "{}", text),
        }
    }
}

impl Token {
    /// Notes, words and variables become calls when an argument list
    /// follows them.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Token::AbsNote(_)
                | Token::RelNote(_)
                | Token::AlphaNote(_)
                | Token::Word(_)
                | Token::CssVariable(_)
                | Token::DollarVariable(_)
        )
    }
}

/// Anchored patterns, tried in this order at every position.
struct Patterns {
    abs_note: Regex,
    rel_twelve: Regex,
    rel_seven: Regex,
    alpha_note: Regex,
    word: Regex,
    css_variable: Regex,
    dollar_variable: Regex,
    number: Regex,
    bracket: Regex,
    operator: Regex,
    double_quote: Regex,
    single_quote: Regex,
    whitespace: Regex,
    error: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let rx = |pattern: &str| Regex::new(pattern).expect("static token pattern");
        Patterns {
            abs_note: rx(r"^(!?)([a-gA-G][#b]?)(\d+)?(loc|phr|aeo|dor|mix|ion|lyd|maj|min)?"),
            rel_twelve: rx(r"^~~([+-]?\d+)"),
            rel_seven: rx(r"^~([+-]?\d+)([#b]?)"),
            alpha_note: rx(r"^~([a-gA-G][#b]?)([+-]?\d+)?"),
            word: rx(r"^[_a-zA-Z][_a-zA-Z\d#]*"),
            css_variable: rx(r"^--[_a-zA-Z][_a-zA-Z-]*"),
            dollar_variable: rx(r"^\$(\d+)"),
            number: rx(r"^(-?(?:\d*\.\d+|\d+)(?:[Ee][+-]?\d+)?)([a-zA-Z]*)"),
            bracket: rx(r"^[(),\[\]]"),
            operator: rx(r"^(?:\^\+|\^-|\^\^|\^~|[~|>:+*/%^!-])"),
            double_quote: rx(r#"^"((?:\\.|[^"\\])*)""#),
            single_quote: rx(r"^'((?:\\.|[^'\\])*)'"),
            whitespace: rx(r"^\s+"),
            error: rx(r"^\S+"),
        }
    })
}

/// A note token must not run straight into a word: `abb4`, `a_x` and
/// `C#4x` are words or errors, while `a-2` is a note followed by `-2`.
fn ends_at_boundary(rest: &str) -> bool {
    !rest
        .chars()
        .next()
        .is_some_and(|ch| ch == '_' || ch == '#' || ch.is_ascii_alphanumeric())
}

/// Tokenizes input strings into tokens
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Consume the match and return its captures
    fn accept(&mut self, regex: &Regex) -> Option<Captures<'a>> {
        let rest = self.rest();
        let caps = regex.captures(rest)?;
        let len = caps.get(0).map_or(0, |m| m.len());
        if len == 0 {
            return None;
        }
        self.position += len;
        Some(caps)
    }

    fn read_abs_note(&mut self) -> Option<Token> {
        let rest = self.rest();
        let caps = patterns().abs_note.captures(rest)?;
        let whole = caps.get(0)?;
        if !ends_at_boundary(&rest[whole.end()..]) {
            return None;
        }
        self.position += whole.end();
        let frozen = !caps[1].is_empty();
        let mode = caps.get(4).and_then(|m| Mode::from_name(m.as_str()));
        let note = match caps.get(3).map(|m| m.as_str().parse::<i32>()) {
            Some(Err(_)) => None,
            Some(Ok(octave)) => AbsNote::from_tone(&caps[2], Some(octave), mode, frozen),
            None => AbsNote::from_tone(&caps[2], None, mode, frozen),
        };
        Some(note.map_or_else(|| Token::Error(whole.as_str().to_string()), Token::AbsNote))
    }

    fn read_note(&mut self) -> Option<Token> {
        if let Some(token) = self.read_abs_note() {
            return Some(token);
        }
        let p = patterns();
        if let Some(caps) = self.accept(&p.rel_twelve) {
            let token = match caps[1].parse() {
                Ok(twelve) => Token::RelNote(RelNote::new(twelve, 0, 0)),
                Err(_) => Token::Error(caps[0].to_string()),
            };
            return Some(token);
        }
        if let Some(caps) = self.accept(&p.rel_seven) {
            let augment = match &caps[2] {
                "#" => 1,
                "b" => -1,
                _ => 0,
            };
            let token = match caps[1].parse() {
                Ok(seven) => Token::RelNote(RelNote::new(augment, 0, seven)),
                Err(_) => Token::Error(caps[0].to_string()),
            };
            return Some(token);
        }
        if let Some(caps) = self.accept(&p.alpha_note) {
            let octave = match caps.get(2).map(|m| m.as_str().parse()) {
                None => Some(0),
                Some(parsed) => parsed.ok(),
            };
            let note = octave.and_then(|octave| AlphaNote::from_tone(&caps[1], octave));
            return Some(note.map_or_else(|| Token::Error(caps[0].to_string()), Token::AlphaNote));
        }
        None
    }

    /// Read the next token, skipping whitespace. Returns `None` at the end
    /// of input.
    pub fn next_token(&mut self) -> Option<Token> {
        let p = patterns();
        self.accept(&p.whitespace);
        if self.position >= self.input.len() {
            return None;
        }

        if let Some(token) = self.read_note() {
            return Some(token);
        }
        if let Some(caps) = self.accept(&p.word) {
            return Some(Token::Word(caps[0].to_string()));
        }
        if let Some(caps) = self.accept(&p.css_variable) {
            return Some(Token::CssVariable(caps[0].to_string()));
        }
        if let Some(caps) = self.accept(&p.dollar_variable) {
            if let Ok(index) = caps[1].parse() {
                return Some(Token::DollarVariable(index));
            }
            return Some(Token::Error(caps[0].to_string()));
        }
        if let Some(caps) = self.accept(&p.number) {
            let literal = caps[1].to_string();
            let value = literal.parse().unwrap_or(f64::NAN);
            return Some(Token::Number {
                literal,
                value,
                unit: caps[2].to_string(),
            });
        }
        if let Some(caps) = self.accept(&p.bracket) {
            return Some(match &caps[0] {
                "(" => Token::LeftParen,
                ")" => Token::RightParen,
                "[" => Token::LeftBracket,
                "]" => Token::RightBracket,
                _ => Token::Comma,
            });
        }
        if let Some(caps) = self.accept(&p.operator) {
            if let Some(op) = Operator::from_symbol(&caps[0]) {
                return Some(Token::Operator(op));
            }
        }
        if let Some(caps) = self.accept(&p.double_quote) {
            return Some(Token::Text(caps[1].to_string()));
        }
        if let Some(caps) = self.accept(&p.single_quote) {
            return Some(Token::Text(caps[1].to_string()));
        }
        self.accept(&p.error)
            .map(|caps| Token::Error(caps[0].to_string()))
    }

    /// Tokenize the entire input. Never fails: unreadable characters become
    /// [`Token::Error`] and are reported by the parser.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(literal: &str, unit: &str) -> Token {
        Token::Number {
            literal: literal.to_string(),
            value: literal.parse().unwrap(),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_absolute_notes() {
        let tokens = tokenize("Fb C#4 a0 G aB10");
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|t| matches!(t, Token::AbsNote(_))));

        match &tokens[1] {
            Token::AbsNote(note) => {
                assert_eq!(note.num, 1);
                assert_eq!(note.octave, 4);
                assert!(!note.frozen);
            }
            other => panic!("expected note, got {:?}", other),
        }
    }

    #[test]
    fn test_frozen_note_with_mode() {
        let tokens = tokenize("!C#4lyd");
        match tokens.as_slice() {
            [Token::AbsNote(note)] => {
                assert!(note.frozen);
                assert_eq!(note.mode, Some(Mode::Lydian));
                assert_eq!(note.absolute(), 49);
            }
            other => panic!("unexpected tokens {:?}", other),
        }
    }

    #[test]
    fn test_not_notes() {
        // Words that only start like a note
        assert_eq!(tokenize("abb4"), vec![Token::Word("abb4".to_string())]);
        assert_eq!(tokenize("f##"), vec![Token::Word("f##".to_string())]);
        assert_eq!(tokenize("gain"), vec![Token::Word("gain".to_string())]);
    }

    #[test]
    fn test_note_minus_number() {
        let tokens = tokenize("a-2");
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[0], Token::AbsNote(_)));
        assert_eq!(tokens[1], number("-2", ""));
    }

    #[test]
    fn test_relative_notes() {
        let tokens = tokenize("~~-2 ~3 ~-1b ~6#");
        assert_eq!(
            tokens,
            vec![
                Token::RelNote(RelNote::new(-2, 0, 0)),
                Token::RelNote(RelNote::new(0, 0, 3)),
                Token::RelNote(RelNote::new(-1, 0, -1)),
                Token::RelNote(RelNote::new(1, 0, 6)),
            ]
        );
    }

    #[test]
    fn test_alpha_notes() {
        let tokens = tokenize("~E ~C#1 ~b-2");
        assert_eq!(
            tokens,
            vec![
                Token::AlphaNote(AlphaNote { num: 4, octave: 0 }),
                Token::AlphaNote(AlphaNote { num: 1, octave: 1 }),
                Token::AlphaNote(AlphaNote {
                    num: 11,
                    octave: -2
                }),
            ]
        );
    }

    #[test]
    fn test_tilde_operator() {
        let tokens = tokenize("C4 ~ 2");
        assert_eq!(tokens[1], Token::Operator(Operator::Seven));
        assert_eq!(tokens[2], number("2", ""));
    }

    #[test]
    fn test_numbers_with_units() {
        let tokens = tokenize("440 1.5e3 .5 12Hz 300ms");
        assert_eq!(
            tokens,
            vec![
                number("440", ""),
                number("1.5e3", ""),
                number(".5", ""),
                number("12", "Hz"),
                number("300", "ms"),
            ]
        );
    }

    #[test]
    fn test_variables() {
        let tokens = tokenize("--my-var $12");
        assert_eq!(
            tokens,
            vec![
                Token::CssVariable("--my-var".to_string()),
                Token::DollarVariable(12),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("^+ ^- ^^ ^~ ^ | > : + * / % !");
        let ops: Vec<_> = tokens
            .iter()
            .map(|t| match t {
                Token::Operator(op) => op.symbol(),
                other => panic!("expected operator, got {:?}", other),
            })
            .collect();
        assert_eq!(
            ops,
            vec!["^+", "^-", "^^", "^~", "^", "|", ">", ":", "+", "*", "/", "%", "!"]
        );
    }

    #[test]
    fn test_quotes_keep_raw_content() {
        let tokens = tokenize(r#""say \"hi\"" 'it\'s'"#);
        assert_eq!(
            tokens,
            vec![
                Token::Text(r#"say \"hi\""#.to_string()),
                Token::Text(r"it\'s".to_string()),
            ]
        );
    }

    #[test]
    fn test_brackets_and_whitespace() {
        let tokens = tokenize(" [ 1 ,\n2 ] ( ) ");
        assert_eq!(
            tokens,
            vec![
                Token::LeftBracket,
                number("1", ""),
                Token::Comma,
                number("2", ""),
                Token::RightBracket,
                Token::LeftParen,
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_error_token_never_fails() {
        let tokens = tokenize("1 @ 2");
        assert_eq!(tokens[1], Token::Error("@".to_string()));
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokenize("\"open"), vec![Token::Error("\"open".to_string())]);
        assert_eq!(tokenize("1 @x+2 3")[1], Token::Error("@x+2".to_string()));
    }

    #[test]
    fn test_oversized_note_numbers_are_errors() {
        let error = |text: &str| vec![Token::Error(text.to_string())];
        assert_eq!(tokenize("C99999999999"), error("C99999999999"));
        // fits an i32 but not once multiplied into semitones
        assert_eq!(tokenize("C999999999lyd"), error("C999999999lyd"));
        assert_eq!(tokenize("~~99999999999"), error("~~99999999999"));
        assert_eq!(tokenize("~-99999999999b"), error("~-99999999999b"));
        assert_eq!(tokenize("~E99999999999"), error("~E99999999999"));

        let tokens = tokenize("C4(~~99999999999)");
        assert_eq!(tokens[2], Token::Error("~~99999999999".to_string()));
        assert_eq!(tokens[3], Token::RightParen);
    }

    #[test]
    fn test_deterministic() {
        let text = "sine(C4*2) > gain([0.5, random(1,2)])";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
