use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1, hex_digit1, one_of},
    combinator::{cut, map, map_res, opt, recognize},
    error::context,
    sequence::{preceded, terminated, tuple},
};

use super::{comment::count_newlines, josi::read_josi, rules::Lexeme, token::ParserResult};

#[tracing::instrument(level = "debug", skip(input))]
fn parse_hex(input: &str) -> ParserResult<f64> {
    context(
        "hex literal",
        preceded(
            tag("0x"),
            cut(context(
                "16進数の数値が読み取れません。",
                map_res(hex_digit1, |s: &str| {
                    i64::from_str_radix(s, 16).map(|n| n as f64)
                }),
            )),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_float(input: &str) -> ParserResult<f64> {
    context(
        "float literal",
        map_res(
            recognize(tuple((
                digit1,
                char('.'),
                digit1,
                opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
            ))),
            |s: &str| s.parse::<f64>(),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer(input: &str) -> ParserResult<f64> {
    context("integer literal", map_res(digit1, |s: &str| s.parse::<f64>()))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_number(input: &str) -> ParserResult<Lexeme> {
    context(
        "number",
        map(alt((parse_hex, parse_float, parse_integer)), Lexeme::number),
    )(input)
}

/// Reads `open ... close` followed by an optional particle.
fn quoted<'a>(
    input: &'a str,
    open: &'static str,
    close: &'static str,
    unterminated: &'static str,
) -> ParserResult<'a, Lexeme> {
    let (rest, body) = preceded(
        tag(open),
        cut(context(unterminated, terminated(take_until(close), tag(close)))),
    )(input)?;
    let (rest, josi) = match read_josi(rest) {
        Some((rest, josi)) => (rest, josi),
        None => (rest, ""),
    };
    Ok((
        rest,
        Lexeme::text(body)
            .with_newlines(count_newlines(body))
            .with_josi(josi),
    ))
}

/// 『...』 文字列 (展開なし)
pub fn parse_string_raw(input: &str) -> ParserResult<Lexeme> {
    alt((
        |i| quoted(i, "『", "』", "文字列の終わり『』』がありません。"),
        |i| quoted(i, "'", "'", "文字列の終わり『'』がありません。"),
    ))(input)
}

/// 「...」 文字列 (展開あり)
pub fn parse_string_ex(input: &str) -> ParserResult<Lexeme> {
    alt((
        |i| quoted(i, "「", "」", "文字列の終わり『」』がありません。"),
        |i| quoted(i, "\"", "\"", "文字列の終わり『\"』がありません。"),
        |i| quoted(i, "“", "”", "文字列の終わり『”』がありません。"),
    ))(input)
}

pub fn parse_embed_code(input: &str) -> ParserResult<Lexeme> {
    quoted(input, "JS{{{", "}}}", "埋め込みコードの終わり『}}}』がありません。")
}

/// Splits an interpolating string body on `{}`/`｛｝`. Text and code pieces alternate,
/// so a valid body always has an odd number of pieces.
pub fn split_interpolation(body: &str) -> Option<Vec<&str>> {
    let pieces: Vec<&str> = body.split(['{', '}', '｛', '｝']).collect();
    if pieces.len() % 2 == 0 {
        None
    } else {
        Some(pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::TokenValue;

    #[test]
    fn test_numbers() {
        let (rest, n) = parse_number("0x1Fを").unwrap();
        assert_eq!(rest, "を");
        assert_eq!(n.value, TokenValue::Number(31.0));

        let (_, n) = parse_number("1.5e3").unwrap();
        assert_eq!(n.value, TokenValue::Number(1500.0));

        let (rest, n) = parse_number("3.14に").unwrap();
        assert_eq!(rest, "に");
        assert_eq!(n.value, TokenValue::Number(3.14));

        let (rest, n) = parse_number("42個").unwrap();
        assert_eq!(rest, "個");
        assert_eq!(n.value, TokenValue::Number(42.0));
    }

    #[test]
    fn test_hex_overflow_is_failure() {
        // 0 と語句に分けて読み直さない
        let result = parse_number("0xFFFFFFFFFFFFFFFFFFFFを");
        assert!(matches!(result, Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_string_with_josi() {
        let (rest, s) = parse_string_ex("「こんにちは」を表示").unwrap();
        assert_eq!(rest, "表示");
        assert_eq!(s.value, TokenValue::text("こんにちは"));
        assert_eq!(s.josi.as_deref(), Some("を"));
    }

    #[test]
    fn test_multiline_raw_string() {
        let (_, s) = parse_string_raw("『一\n二\n三』").unwrap();
        assert_eq!(s.newlines, 2);
        assert_eq!(s.josi.as_deref(), Some(""));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse_string_ex("「閉じない"),
            Err(nom::Err::Failure(_))
        ));
        // 開始記号が違えばただの不一致
        assert!(matches!(parse_string_ex("表示"), Err(nom::Err::Error(_))));
    }

    #[test]
    fn test_split_interpolation() {
        assert_eq!(split_interpolation("a{x}b"), Some(vec!["a", "x", "b"]));
        assert_eq!(split_interpolation("なし"), Some(vec!["なし"]));
        assert_eq!(split_interpolation("a{x"), None);
    }
}
