//! Particle (助詞) table.
//!
//! Particles are matched longest first directly after a word, number, string or
//! closing bracket. The conditional particles (`ならば`, `でなければ`, ...) are part of
//! the same table but the lexer turns them into standalone `ならば` tokens.

use lazy_static::lazy_static;
use regex::Regex;

pub const JOSI_LIST: &[&str] = &[
    "について", "くらい", "なのか", "までを", "までの", "による", "とは", "から", "まで", "だけ",
    "より", "ほど", "など", "いて", "えて", "きて", "けて", "して", "って", "にて", "みて", "めて",
    "ねて", "では", "には", "は~", "んで", "は", "を", "に", "へ", "で", "と", "が", "の",
];

/// もし文の条件を閉じる助詞
pub const TARAREBA: &[&str] = &["でなければ", "なければ", "ならば", "なら", "たら", "れば"];

/// 語尾として読み飛ばす
pub const REMOVABLE_JOSI: &[&str] = &["こと", "である", "です", "します", "でした"];

/// Particles meaning "and then"; a call ending with one of these is finished.
pub const KEIZOKU_JOSI: &[&str] = &[
    "いて", "えて", "きて", "けて", "して", "って", "にて", "みて", "めて", "ねて", "には", "んで",
];

lazy_static! {
    static ref SORTED_JOSI: Vec<&'static str> = {
        let mut all: Vec<&'static str> = JOSI_LIST
            .iter()
            .chain(TARAREBA.iter())
            .chain(REMOVABLE_JOSI.iter())
            .copied()
            .collect();
        all.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        all
    };
    static ref JOSI_RE: Regex = {
        let alternatives = SORTED_JOSI
            .iter()
            .map(|j| regex::escape(j))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("^[\\t ]*({})", alternatives)).expect("particle pattern")
    };
}

/// Reads one particle at the head of `input`. Returns the remainder and the particle
/// (leading blanks are consumed but not part of the particle).
pub fn read_josi(input: &str) -> Option<(&str, &str)> {
    let caps = JOSI_RE.captures(input)?;
    let whole = caps.get(0)?;
    let josi = caps.get(1)?;
    Some((&input[whole.end()..], josi.as_str()))
}

pub fn is_tarareba(josi: &str) -> bool {
    TARAREBA.contains(&josi)
}

/// Negative conditionals become `でなければ`, the rest `ならば`.
pub fn tarareba_sense(josi: &str) -> &'static str {
    match josi {
        "でなければ" | "なければ" => "でなければ",
        _ => "ならば",
    }
}

pub fn is_keizoku(josi: &str) -> bool {
    KEIZOKU_JOSI.contains(&josi)
}

pub fn is_removable(josi: &str) -> bool {
    REMOVABLE_JOSI.contains(&josi)
}
