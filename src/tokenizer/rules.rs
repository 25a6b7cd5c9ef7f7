use super::{
    comment::{parse_line_comment, parse_range_comment},
    literal::{parse_embed_code, parse_number, parse_string_ex, parse_string_raw},
    symbol::*,
    token::{ParserResult, TokenKind, TokenValue},
    word::parse_word,
};

/// What a rule matched: the token value, the particle if the rule read one itself,
/// and how many source lines the match spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub value: TokenValue,
    pub josi: Option<String>,
    pub newlines: u32,
}

impl Lexeme {
    pub fn text<S: Into<String>>(s: S) -> Self {
        Self {
            value: TokenValue::Text(s.into()),
            josi: None,
            newlines: 0,
        }
    }

    pub fn number(n: f64) -> Self {
        Self {
            value: TokenValue::Number(n),
            josi: None,
            newlines: 0,
        }
    }

    pub fn with_newlines(mut self, newlines: u32) -> Self {
        self.newlines = newlines;
        self
    }

    pub fn with_josi(mut self, josi: &str) -> Self {
        self.josi = Some(josi.to_string());
        self
    }
}

pub type RuleParser = for<'a> fn(&'a str) -> ParserResult<'a, Lexeme>;

pub struct LexRule {
    pub name: &'static str,
    /// `None` for input that is consumed without producing a token.
    pub kind: Option<TokenKind>,
    /// Read a particle right after the match.
    pub reads_josi: bool,
    pub parse: RuleParser,
}

const fn rule(name: &'static str, kind: TokenKind, parse: RuleParser) -> LexRule {
    LexRule {
        name,
        kind: Some(kind),
        reads_josi: false,
        parse,
    }
}

const fn rule_josi(name: &'static str, kind: TokenKind, parse: RuleParser) -> LexRule {
    LexRule {
        name,
        kind: Some(kind),
        reads_josi: true,
        parse,
    }
}

/// Tried in order; the first rule that matches wins.
pub static RULES: &[LexRule] = &[
    rule("eol", TokenKind::Eol, parse_newline),
    rule("eol", TokenKind::Eol, parse_separator),
    LexRule {
        name: "space",
        kind: None,
        reads_josi: false,
        parse: parse_space,
    },
    rule("comma", TokenKind::Comma, parse_comma),
    rule("line_comment", TokenKind::LineComment, parse_line_comment),
    rule("range_comment", TokenKind::RangeComment, parse_range_comment),
    rule("def_test", TokenKind::DefTest, parse_def_test),
    rule("def_func", TokenKind::DefFunc, parse_def_func),
    rule_josi("number", TokenKind::Number, parse_number),
    rule("ここまで", TokenKind::KokoMade, parse_kokomade),
    rule("ここから", TokenKind::KokoKara, parse_kokokara),
    rule("もし", TokenKind::Mosi, parse_mosi),
    rule("違えば", TokenKind::Chigaeba, parse_chigaeba),
    rule("embed_code", TokenKind::EmbedCode, parse_embed_code),
    rule("string", TokenKind::String, parse_string_raw),
    rule("string_ex", TokenKind::StringEx, parse_string_ex),
    rule("func", TokenKind::Func, parse_func_marker),
    rule("_eol", TokenKind::EolSuppressed, parse_suppressed_eol),
    rule("gteq", TokenKind::GtEq, parse_gteq),
    rule("lteq", TokenKind::LtEq, parse_lteq),
    rule("noteq", TokenKind::NotEq, parse_noteq),
    rule("eq", TokenKind::Eq, parse_eq),
    rule("not", TokenKind::Not, parse_not),
    rule("gt", TokenKind::Gt, parse_gt),
    rule("lt", TokenKind::Lt, parse_lt),
    rule("and", TokenKind::And, parse_and),
    rule("or", TokenKind::Or, parse_or),
    rule("@", TokenKind::At, parse_at),
    rule("+", TokenKind::Plus, parse_plus),
    rule("-", TokenKind::Minus, parse_minus),
    rule("*", TokenKind::Mul, parse_mul),
    rule("/", TokenKind::Div, parse_div),
    rule("%", TokenKind::Mod, parse_mod),
    rule("^", TokenKind::Pow, parse_pow),
    rule("&", TokenKind::Concat, parse_concat),
    rule("[", TokenKind::BracketOpen, parse_bracket_open),
    rule_josi("]", TokenKind::BracketClose, parse_bracket_close),
    rule("(", TokenKind::ParenOpen, parse_paren_open),
    rule_josi(")", TokenKind::ParenClose, parse_paren_close),
    rule("|", TokenKind::Bar, parse_bar),
    rule("{", TokenKind::BraceOpen, parse_brace_open),
    rule_josi("}", TokenKind::BraceClose, parse_brace_close),
    rule(":", TokenKind::Colon, parse_colon),
    rule("word", TokenKind::Word, parse_word),
];
