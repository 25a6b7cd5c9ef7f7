use lazy_static::lazy_static;
use nom::error::{ErrorKind, ParseError, VerboseError};
use regex::Regex;

use super::{
    josi::{is_removable, read_josi},
    rules::Lexeme,
    token::ParserResult,
};

lazy_static! {
    static ref HIRAGANA_RUN: Regex = Regex::new("[ぁ-ん]+").expect("hiragana pattern");
    static ref TRAILING_HIRAGANA: Regex = Regex::new("[ぁ-ん]+$").expect("hiragana pattern");
}

pub fn is_hiragana(c: char) -> bool {
    ('ぁ'..='ん').contains(&c)
}

/// 漢字・カタカナ・英数字
pub fn is_kanakanji(c: char) -> bool {
    c == '\u{3005}'
        || ('\u{4E00}'..='\u{9FCF}').contains(&c)
        || c.is_ascii_alphanumeric()
        || c == '_'
        || ('ァ'..='ヶ').contains(&c)
        || c == 'ー'
}

fn can_start_word(c: char) -> bool {
    (is_kanakanji(c) && !c.is_ascii_digit() && c != 'ー') || is_hiragana(c)
}

/// Drops okurigana: `繰り返す` → `繰返`, `表示する` → `表示`.
/// A word that starts with hiragana keeps its head (`お願いします` → `お願`),
/// and an all-hiragana word is kept as is.
pub fn trim_okurigana(word: &str) -> String {
    let starts_with_hiragana = word.chars().next().map(is_hiragana).unwrap_or(false);
    if !starts_with_hiragana {
        return HIRAGANA_RUN.replace_all(word, "").to_string();
    }
    if word.chars().all(is_hiragana) {
        return word.to_string();
    }
    TRAILING_HIRAGANA.replace(word, "").to_string()
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_word(input: &str) -> ParserResult<Lexeme> {
    read_word(input, true)
}

/// テスト定義の行では送り仮名を残す
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_word_untrimmed(input: &str) -> ParserResult<Lexeme> {
    read_word(input, false)
}

fn read_word(input: &str, trim: bool) -> ParserResult<Lexeme> {
    let mut rest = input;
    let mut word = String::new();
    let mut josi = "";

    if !rest.chars().next().map(can_start_word).unwrap_or(false) {
        return Err(nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::Alpha,
        )));
    }

    while let Some(c) = rest.chars().next() {
        // 一文字以上読んだ後は助詞を優先する
        if !word.is_empty() {
            if let Some((after, j)) = read_josi(rest) {
                josi = j;
                rest = after;
                break;
            }
        }
        if is_kanakanji(c) || is_hiragana(c) {
            word.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }
        break;
    }

    // 「間」の特殊ルール: 「ある間」は「ある」+「間」
    let mut chars = word.chars().rev();
    if let (Some('間'), Some(prev)) = (chars.next(), chars.next()) {
        if is_hiragana(prev) {
            let consumed = word.len() - '間'.len_utf8();
            word.truncate(consumed);
            rest = &input[consumed..];
            josi = "";
        }
    }

    let value = if trim { trim_okurigana(&word) } else { word };
    if is_removable(josi) {
        josi = "";
    }
    Ok((rest, Lexeme::text(value).with_josi(josi)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::TokenValue;

    fn word_of(src: &str) -> (String, String, String) {
        let (rest, lexeme) = parse_word(src).unwrap();
        (
            lexeme.value.to_string(),
            lexeme.josi.unwrap_or_default(),
            rest.to_string(),
        )
    }

    #[test]
    fn test_trim_okurigana() {
        assert_eq!(trim_okurigana("繰り返す"), "繰返");
        assert_eq!(trim_okurigana("表示する"), "表示");
        assert_eq!(trim_okurigana("どうぞ"), "どうぞ");
        assert_eq!(trim_okurigana("お願いします"), "お願");
        assert_eq!(trim_okurigana("ABC"), "ABC");
    }

    #[test]
    fn test_word_with_josi() {
        assert_eq!(
            word_of("Aに5を足す"),
            ("A".into(), "に".into(), "5を足す".into())
        );
        assert_eq!(word_of("足して表示"), ("足".into(), "して".into(), "表示".into()));
        assert_eq!(word_of("表示する"), ("表示".into(), "".into(), "".into()));
    }

    #[test]
    fn test_removable_josi() {
        // 「こと」は読み捨てる
        assert_eq!(word_of("表示すること"), ("表示".into(), "".into(), "".into()));
    }

    #[test]
    fn test_aida_rule() {
        let (rest, lexeme) = parse_word("続ける間").unwrap();
        assert_eq!(lexeme.value, TokenValue::text("続"));
        assert_eq!(rest, "間");
    }

    #[test]
    fn test_untrimmed() {
        let (_, lexeme) = parse_word_untrimmed("足し算する").unwrap();
        assert_eq!(lexeme.value, TokenValue::text("足し算する"));
    }

    #[test]
    fn test_not_a_word() {
        assert!(parse_word("123").is_err());
        assert!(parse_word("「").is_err());
    }
}
