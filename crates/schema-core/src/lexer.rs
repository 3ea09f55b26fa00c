//! Schema tokenizer
//!
//! Turns source text into a flat stream of tokens that tile the input
//! exactly: consecutive tokens share boundaries, nothing is skipped and
//! nothing overlaps. Lexing never fails. Input that matches no rule becomes
//! a one-character `BadChar` token and the lexer moves on.
//!
//! ## Rule priority
//!
//! ```text
//! whitespace → comment → boolean → identifier → integer → string → punctuation
//! ```
//!
//! Identifiers include dotted qualified names (`a.b.c`) and a lone leading
//! or trailing `.` so that a half-typed `Color.` still lexes as one token.

use std::iter::FusedIterator;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{anychar, char, digit1, satisfy},
    combinator::{map_opt, not, opt, recognize, rest, value},
    multi::many0,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::syntax::Span;

// ============================================================================
// Token types
// ============================================================================

/// Lexical category of a token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Whitespace,
    Comment,
    Identifier,
    Integer,
    Boolean,
    String,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    Equals,
    Comma,
    Colon,
    Semicolon,
    BadChar,
}

impl TokenKind {
    /// Human-readable name used in tree dumps and diagnostics
    pub fn debug_name(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Comment => "COMMENT",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Integer => "INTEGER",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::String => "STRING",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LParen => "LPARENTHESES",
            TokenKind::RParen => "RPARENTHESES",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::LAngle => "LANGLE",
            TokenKind::RAngle => "RANGLE",
            TokenKind::Equals => "EQUALS",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::BadChar => "BAD_CHARACTER",
        }
    }

    /// Whitespace and comments are skipped by the parser
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// A lexeme: kind plus byte range over the source buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice this token's text out of the buffer it was lexed from
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Tokenize a whole buffer
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source, 0, source.len()).collect()
}

/// Streaming tokenizer over `source[start..end]`
///
/// Offsets in the produced tokens are absolute positions in `source`.
/// Bounds that fall inside a multi-byte character are moved back to the
/// previous character boundary.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    end: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, start: usize, end: usize) -> Self {
        let end = floor_char_boundary(source, end.min(source.len()));
        let start = floor_char_boundary(source, start.min(end));
        Self {
            source,
            pos: start,
            end,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.pos >= self.end {
            return None;
        }

        let input = &self.source[self.pos..self.end];
        let (kind, len) = match token(input) {
            Ok((remaining, kind)) if remaining.len() < input.len() => {
                (kind, input.len() - remaining.len())
            }
            _ => (
                TokenKind::BadChar,
                input.chars().next().map_or(1, char::len_utf8),
            ),
        };

        let token = Token {
            kind,
            start: self.pos,
            end: self.pos + len,
        };
        self.pos = token.end;
        Some(token)
    }
}

impl FusedIterator for Lexer<'_> {}

fn floor_char_boundary(source: &str, mut index: usize) -> usize {
    while index > 0 && !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

// ============================================================================
// Internal Lexers
// ============================================================================

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        whitespace,
        comment,
        boolean,
        identifier,
        integer,
        string,
        punctuation,
    ))(input)
}

fn whitespace(input: &str) -> IResult<&str, TokenKind> {
    value(TokenKind::Whitespace, take_while1(char::is_whitespace))(input)
}

fn comment(input: &str) -> IResult<&str, TokenKind> {
    value(TokenKind::Comment, alt((line_comment, block_comment)))(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), take_while(|c| c != '\n')))(input)
}

/// Block comments close themselves at end of input
fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        tag("/*"),
        alt((recognize(pair(take_until("*/"), tag("*/"))), rest)),
    ))(input)
}

fn boolean(input: &str) -> IResult<&str, TokenKind> {
    value(
        TokenKind::Boolean,
        terminated(
            alt((tag_no_case("true"), tag_no_case("false"))),
            not(satisfy(|c| is_ident_continue(c) || c == '.')),
        ),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, TokenKind> {
    value(
        TokenKind::Identifier,
        alt((
            recognize(tuple((opt(char('.')), qualified_name, opt(char('.'))))),
            recognize(char('.')),
        )),
    )(input)
}

fn qualified_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        ident_segment,
        many0(preceded(char('.'), ident_segment)),
    ))(input)
}

fn ident_segment(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_ident_continue),
    ))(input)
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn integer(input: &str) -> IResult<&str, TokenKind> {
    value(TokenKind::Integer, digit1)(input)
}

/// Strings may not span lines; an unterminated one runs to end of line
fn string(input: &str) -> IResult<&str, TokenKind> {
    value(
        TokenKind::String,
        recognize(tuple((
            char('"'),
            take_while(|c| c != '"' && c != '\n'),
            opt(char('"')),
        ))),
    )(input)
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    map_opt(anychar, punctuation_kind)(input)
}

fn punctuation_kind(c: char) -> Option<TokenKind> {
    let kind = match c {
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        '<' => TokenKind::LAngle,
        '>' => TokenKind::RAngle,
        '=' => TokenKind::Equals,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        ';' => TokenKind::Semicolon,
        _ => return None,
    };
    Some(kind)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<&str> {
        tokenize(source)
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.text(source))
            .collect()
    }

    fn assert_tiles(source: &str) {
        let tokens = tokenize(source);
        let mut pos = 0;
        for t in &tokens {
            assert_eq!(t.start, pos, "gap or overlap before {:?}", t);
            assert!(t.end > t.start, "empty token {:?}", t);
            pos = t.end;
        }
        assert_eq!(pos, source.len());
    }

    #[test]
    fn test_field_definition() {
        use TokenKind::*;
        assert_eq!(
            kinds("int32 x = 1;"),
            vec![Identifier, Identifier, Equals, Integer, Semicolon]
        );
    }

    #[test]
    fn test_qualified_names_are_single_tokens() {
        assert_eq!(texts("improbable.Position p"), vec!["improbable.Position", "p"]);
        assert_eq!(texts("a.b.c;"), vec!["a.b.c", ";"]);
    }

    #[test]
    fn test_in_progress_qualification() {
        assert_eq!(texts("Color."), vec!["Color."]);
        assert_eq!(texts(".Color"), vec![".Color"]);
        assert_eq!(kinds("."), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_decimal_lexes_as_integer_dot_integer() {
        assert_eq!(texts("1.5"), vec!["1", ".", "5"]);
        assert_eq!(
            kinds("1.5"),
            vec![TokenKind::Integer, TokenKind::Identifier, TokenKind::Integer]
        );
    }

    #[test]
    fn test_booleans_case_insensitive() {
        assert_eq!(kinds("true"), vec![TokenKind::Boolean]);
        assert_eq!(kinds("FALSE"), vec![TokenKind::Boolean]);
        assert_eq!(kinds("True,"), vec![TokenKind::Boolean, TokenKind::Comma]);
    }

    #[test]
    fn test_boolean_prefix_is_identifier() {
        assert_eq!(kinds("trueish"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("false_alarm"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_comments() {
        let source = "// line\n/* block */ type";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text(source), "// line");
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert_eq!(tokens[2].text(source), "/* block */");
        assert_tiles(source);
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_eof() {
        let source = "type T /* never closed\n more";
        let tokens = tokenize(source);
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Comment);
        assert_eq!(last.end, source.len());
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let source = "import \"a/b.schema\nfoo";
        let tokens: Vec<_> = tokenize(source)
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .collect();
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text(source), "\"a/b.schema");
        assert_eq!(tokens[2].text(source), "foo");
    }

    #[test]
    fn test_bad_characters_advance_one_char() {
        let source = "a ? é b";
        assert_tiles(source);
        let bad: Vec<_> = tokenize(source)
            .into_iter()
            .filter(|t| t.kind == TokenKind::BadChar)
            .map(|t| t.text(source).to_string())
            .collect();
        assert_eq!(bad, vec!["?", "é"]);
    }

    #[test]
    fn test_all_punctuation() {
        use TokenKind::*;
        assert_eq!(
            kinds("{}()[]<>=,:;"),
            vec![
                LBrace, RBrace, LParen, RParen, LBracket, RBracket, LAngle, RAngle, Equals,
                Comma, Colon, Semicolon
            ]
        );
    }

    #[test]
    fn test_sub_range_offsets_are_absolute() {
        let source = "package foo;";
        let tokens: Vec<_> = Lexer::new(source, 8, 11).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].start, 8);
        assert_eq!(tokens[0].text(source), "foo");
    }

    #[test]
    fn test_range_inside_multibyte_char_is_clamped() {
        let source = "é";
        let tokens: Vec<_> = Lexer::new(source, 0, 1).collect();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
    }
}
