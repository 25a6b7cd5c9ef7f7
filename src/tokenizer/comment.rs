use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::not_line_ending,
    combinator::{cut, map},
    error::context,
    sequence::{preceded, terminated},
};

use super::{rules::Lexeme, token::ParserResult};

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_line_comment(input: &str) -> ParserResult<Lexeme> {
    context(
        "line comment",
        map(
            preceded(alt((tag("#"), tag("※"), tag("//"))), not_line_ending),
            |content: &str| Lexeme::text(content.trim()),
        ),
    )(input)
}

/// `/* ... */`. An unterminated comment is fatal rather than re-lexed as operators.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_range_comment(input: &str) -> ParserResult<Lexeme> {
    preceded(
        tag("/*"),
        cut(context(
            "範囲コメントの終わり『*/』がありません。",
            map(terminated(take_until("*/"), tag("*/")), |content: &str| {
                Lexeme::text(content.trim()).with_newlines(count_newlines(content))
            }),
        )),
    )(input)
}

pub fn count_newlines(s: &str) -> u32 {
    s.chars().filter(|&c| c == '\n').count() as u32
}
