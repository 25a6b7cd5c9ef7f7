//! # Symbol Rules
//!
//! Operators, brackets and the fixed keyword phrases recognised before the
//! general word rule. Each parser returns the matched spelling as the token value;
//! the rule table decides which [`TokenKind`](super::token::TokenKind) it becomes.
//!
//! Several operators have more than one spelling (`≧`, `>=`, `=>`). Within one
//! parser the alternatives are tried in order, so a longer spelling that shares a
//! prefix with a shorter one must come first, and across parsers the rule table
//! keeps `==` ahead of `=`, `&&` ahead of `&` and so on.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{line_ending, space0},
    combinator::{map, recognize},
    error::context,
    sequence::tuple,
};

use super::{rules::Lexeme, token::ParserResult};

macro_rules! symbol_parser {
    ($name:ident, $ctx:literal, $tag:literal) => {
        pub fn $name(input: &str) -> ParserResult<Lexeme> {
            context($ctx, map(tag($tag), Lexeme::text))(input)
        }
    };
    ($name:ident, $ctx:literal, $($tag:literal),+) => {
        pub fn $name(input: &str) -> ParserResult<Lexeme> {
            context($ctx, map(alt(($(tag($tag)),+)), Lexeme::text))(input)
        }
    };
}

pub fn parse_newline(input: &str) -> ParserResult<Lexeme> {
    context(
        "newline",
        map(line_ending, |s: &str| Lexeme::text(s).with_newlines(1)),
    )(input)
}

/// `_` at the end of a line joins it with the next one.
pub fn parse_suppressed_eol(input: &str) -> ParserResult<Lexeme> {
    context(
        "line continuation",
        map(recognize(tuple((tag("_"), space0, line_ending))), |s: &str| {
            Lexeme::text(s).with_newlines(1)
        }),
    )(input)
}

pub fn parse_space(input: &str) -> ParserResult<Lexeme> {
    context(
        "space",
        map(
            take_while1(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\u{3000}'),
            Lexeme::text,
        ),
    )(input)
}

symbol_parser!(parse_separator, "separator", ";", "。");
symbol_parser!(parse_comma, "comma", ",", "、");
symbol_parser!(parse_def_test, "def_test", "●テスト:");
symbol_parser!(parse_def_func, "def_func", "●");
symbol_parser!(parse_kokomade, "ここまで", "ここまで");
symbol_parser!(parse_kokokara, "ここから", "ここから");
symbol_parser!(parse_mosi, "もし", "もしも", "もし");
symbol_parser!(parse_chigaeba, "違えば", "違えば", "違");

pub fn parse_func_marker(input: &str) -> ParserResult<Lexeme> {
    context("func pointer marker", map(tag("{関数}"), |_| Lexeme::text("関数")))(input)
}

// 演算子
symbol_parser!(parse_gteq, "gteq", "≧", ">=", "=>");
symbol_parser!(parse_lteq, "lteq", "≦", "<=", "=<");
symbol_parser!(parse_noteq, "noteq", "≠", "<>", "!=");
symbol_parser!(parse_eq, "eq", "==", "=");
symbol_parser!(parse_not, "not", "!");
symbol_parser!(parse_gt, "gt", ">");
symbol_parser!(parse_lt, "lt", "<");
symbol_parser!(parse_and, "and", "かつ", "&&");
symbol_parser!(parse_or, "or", "または", "あるいは", "||");
symbol_parser!(parse_at, "@", "@");
symbol_parser!(parse_plus, "+", "+");
symbol_parser!(parse_minus, "-", "-");
symbol_parser!(parse_mul, "*", "*", "×");
symbol_parser!(parse_div, "/", "/", "÷");
symbol_parser!(parse_mod, "%", "%");
symbol_parser!(parse_pow, "^", "^");
symbol_parser!(parse_concat, "&", "&");

// 括弧
symbol_parser!(parse_bracket_open, "[", "[");
symbol_parser!(parse_bracket_close, "]", "]");
symbol_parser!(parse_paren_open, "(", "(");
symbol_parser!(parse_paren_close, ")", ")");
symbol_parser!(parse_brace_open, "{", "{");
symbol_parser!(parse_brace_close, "}", "}");
symbol_parser!(parse_bar, "|", "|");
symbol_parser!(parse_colon, ":", ":");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::TokenValue;

    #[test]
    fn test_spellings() {
        assert_eq!(parse_gteq("=>1").unwrap().0, "1");
        assert_eq!(parse_noteq("<>").unwrap().1.value, TokenValue::text("<>"));
        assert_eq!(parse_or("あるいはB").unwrap().0, "B");
        assert!(parse_eq(">").is_err());
    }

    #[test]
    fn test_mosi() {
        assert_eq!(parse_mosi("もしもAが").unwrap().0, "Aが");
        assert_eq!(parse_mosi("もしAが").unwrap().0, "Aが");
    }

    #[test]
    fn test_suppressed_eol() {
        let (rest, lexeme) = parse_suppressed_eol("_  \n3").unwrap();
        assert_eq!(rest, "3");
        assert_eq!(lexeme.newlines, 1);
        assert!(parse_suppressed_eol("_abc").is_err());
    }

    #[test]
    fn test_func_marker() {
        let (_, lexeme) = parse_func_marker("{関数}fを").unwrap();
        assert_eq!(lexeme.value, TokenValue::text("関数"));
    }
}
