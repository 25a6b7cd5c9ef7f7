use std::fmt;

use nom::{error::VerboseError, IResult};
use serde::{Serialize, Serializer};
use strum_macros::{AsRefStr, EnumString};

use crate::funclist::FunctionSignature;

/// Token type tags. The serialized names are the ones downstream tools expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr)]
pub enum TokenKind {
    #[strum(serialize = "eol")]
    Eol,
    #[strum(serialize = "eof")]
    Eof,
    #[strum(serialize = "comma")]
    Comma,
    #[strum(serialize = "line_comment")]
    LineComment,
    #[strum(serialize = "range_comment")]
    RangeComment,
    #[strum(serialize = "def_test")]
    DefTest,
    #[strum(serialize = "def_func")]
    DefFunc,
    #[strum(serialize = "number")]
    Number,
    #[strum(serialize = "string")]
    String,
    /// Interpolating string, split into `string & code &` before leaving the lexer.
    #[strum(serialize = "string_ex")]
    StringEx,
    /// Embedded expression taken from an interpolating string.
    #[strum(serialize = "code")]
    Code,
    #[strum(serialize = "embed_code")]
    EmbedCode,
    #[strum(serialize = "word")]
    Word,
    #[strum(serialize = "func")]
    Func,
    #[strum(serialize = "require")]
    Require,
    /// `_` followed by a line break.
    #[strum(serialize = "_eol")]
    EolSuppressed,

    // 構文用の語句
    #[strum(serialize = "ここまで")]
    KokoMade,
    #[strum(serialize = "ここから")]
    KokoKara,
    #[strum(serialize = "もし")]
    Mosi,
    #[strum(serialize = "違えば")]
    Chigaeba,
    #[strum(serialize = "とは")]
    DefinedAs,
    #[strum(serialize = "ならば")]
    Then,

    // 予約語
    #[strum(serialize = "回")]
    RepeatTimes,
    #[strum(serialize = "間")]
    While,
    #[strum(serialize = "繰り返す")]
    For,
    #[strum(serialize = "反復")]
    Foreach,
    #[strum(serialize = "抜ける")]
    Break,
    #[strum(serialize = "続ける")]
    Continue,
    #[strum(serialize = "戻る")]
    Return,
    #[strum(serialize = "代入")]
    Assign,
    #[strum(serialize = "逐次実行")]
    Sequential,
    #[strum(serialize = "先に")]
    First,
    #[strum(serialize = "次に")]
    Next,
    #[strum(serialize = "取込")]
    Include,
    #[strum(serialize = "エラー監視")]
    ErrorGuard,
    #[strum(serialize = "エラー")]
    OnError,
    #[strum(serialize = "変数")]
    Var,
    #[strum(serialize = "定数")]
    Const,

    // 演算子
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "eq")]
    Eq,
    #[strum(serialize = "noteq")]
    NotEq,
    #[strum(serialize = "gt")]
    Gt,
    #[strum(serialize = "gteq")]
    GtEq,
    #[strum(serialize = "lt")]
    Lt,
    #[strum(serialize = "lteq")]
    LtEq,
    #[strum(serialize = "&")]
    Concat,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "^")]
    Pow,
    #[strum(serialize = "not")]
    Not,

    // 記号
    #[strum(serialize = "@")]
    At,
    #[strum(serialize = "(")]
    ParenOpen,
    #[strum(serialize = ")")]
    ParenClose,
    #[strum(serialize = "[")]
    BracketOpen,
    #[strum(serialize = "]")]
    BracketClose,
    #[strum(serialize = "{")]
    BraceOpen,
    #[strum(serialize = "}")]
    BraceClose,
    #[strum(serialize = "|")]
    Bar,
    #[strum(serialize = ":")]
    Colon,
}

impl TokenKind {
    /// Binary operators that take part in infix expressions.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Or
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Gt
                | TokenKind::GtEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Concat
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::Mod
                | TokenKind::Pow
        )
    }
}

// 種別名をそのまま書き出す
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Number(f64),
    Text(String),
}

impl TokenValue {
    pub fn text<S: Into<String>>(s: S) -> Self {
        TokenValue::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            TokenValue::Number(n) => Some(*n),
            TokenValue::Text(_) => None,
        }
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Number(n) => write!(f, "{}", format_number(*n)),
            TokenValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Integral values print without a fraction, `3` rather than `3.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: TokenValue,
    pub line: u32,
    pub josi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<FunctionSignature>,
    #[serde(rename = "funcPointer", skip_serializing_if = "std::ops::Not::not")]
    pub func_pointer: bool,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, line: u32, josi: impl Into<String>) -> Self {
        Self {
            kind,
            value,
            line,
            josi: josi.into(),
            meta: None,
            func_pointer: false,
        }
    }

    /// A token whose value is its own spelling (operators, splice markers).
    pub fn marker(kind: TokenKind, value: &str, line: u32) -> Self {
        Self::new(kind, TokenValue::text(value), line, "")
    }

    pub fn eol(line: u32) -> Self {
        Self::marker(TokenKind::Eol, "", line)
    }

    pub fn eof(line: u32) -> Self {
        Self::marker(TokenKind::Eof, "", line)
    }

    pub fn text(&self) -> String {
        self.value.to_string()
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;
