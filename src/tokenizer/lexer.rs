use std::collections::HashMap;

use nom::error::{VerboseError, VerboseErrorKind};

use super::{
    josi::{is_tarareba, read_josi, tarareba_sense},
    literal::split_interpolation,
    reserved::{canonical_word, reserved_kind},
    rules::{Lexeme, RULES},
    token::{Token, TokenKind, TokenValue},
    word::{parse_word_untrimmed, trim_okurigana},
};
use crate::{
    config::NakoConfig,
    error::{NakoError, NakoResult},
    funclist::{FuncList, FunctionSignature},
};

/// Turns source text into the token stream the parser consumes.
///
/// Lexing runs as a fixed sequence of passes over one growable token vector:
/// tokenize, require check, function pre-declaration, word rewriting.
#[derive(Debug, Clone)]
pub struct Lexer {
    filename: Option<String>,
    start_line: u32,
    append_eof: bool,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            filename: None,
            start_line: 0,
            append_eof: true,
        }
    }

    pub fn from_config(config: &NakoConfig) -> Self {
        Self {
            filename: config.filename.clone(),
            start_line: config.start_line,
            append_eof: config.append_eof,
        }
    }

    fn error(&self, message: impl Into<String>, line: u32) -> NakoError {
        NakoError::lex(message, line + 1, self.filename.as_deref())
    }

    /// Runs every pass. Function definitions found in `src` are added to `funclist`.
    #[tracing::instrument(level = "debug", skip(self, src, funclist))]
    pub fn lex(&self, src: &str, funclist: &mut FuncList) -> NakoResult<Vec<Token>> {
        let mut tokens = self.tokenize(src)?;
        if self.append_eof {
            let line = tokens.last().map(|t| t.line).unwrap_or(self.start_line);
            tokens.push(Token::eol(line));
            tokens.push(Token::eof(line));
        }
        self.check_require(&mut tokens)?;
        self.predefine_functions(&mut tokens, funclist)?;
        self.replace_words(&mut tokens, funclist);
        tracing::debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }

    #[tracing::instrument(level = "debug", skip(self, src))]
    pub fn tokenize(&self, src: &str) -> NakoResult<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut remaining = src;
        let mut line = self.start_line;
        let mut in_def_test = false;

        'scan: while !remaining.is_empty() {
            for rule in RULES {
                let parsed = if in_def_test && rule.kind == Some(TokenKind::Word) {
                    parse_word_untrimmed(remaining)
                } else {
                    (rule.parse)(remaining)
                };
                let (rest, lexeme) = match parsed {
                    Ok(ok) => ok,
                    Err(nom::Err::Error(_)) => continue,
                    Err(nom::Err::Failure(e)) => {
                        let error = self.error(failure_message(&e), line);
                        tracing::error!("{}", error);
                        return Err(error);
                    }
                    Err(nom::Err::Incomplete(e)) => {
                        let error = self.error(format!("入力が途中で終わっています。{:?}", e), line);
                        tracing::error!("{}", error);
                        return Err(error);
                    }
                };
                remaining = rest;

                let Some(kind) = rule.kind else {
                    continue 'scan;
                };
                let josi = match lexeme.josi.clone() {
                    Some(josi) => josi,
                    None if rule.reads_josi => match read_josi(remaining) {
                        Some((rest, josi)) => {
                            remaining = rest;
                            josi.to_string()
                        }
                        None => String::new(),
                    },
                    None => String::new(),
                };

                let newlines = lexeme.newlines;
                match kind {
                    TokenKind::StringEx => self.push_interpolated(&mut tokens, lexeme, josi, line)?,
                    _ => tokens.push(Token::new(kind, lexeme.value.clone(), line, josi)),
                }
                match kind {
                    TokenKind::DefTest => in_def_test = true,
                    TokenKind::Eol => in_def_test = false,
                    _ => {}
                }
                line += newlines;
                continue 'scan;
            }
            let excerpt: String = remaining.chars().take(3).collect();
            let error = self.error(format!("字句解析で未知の語句があります: {}...", excerpt), line);
            tracing::error!("{}", error);
            return Err(error);
        }
        Ok(tokens)
    }

    /// `「a{x}b」` becomes `"a" & x & "b"`; the particle goes on the last piece.
    fn push_interpolated(
        &self,
        tokens: &mut Vec<Token>,
        lexeme: Lexeme,
        josi: String,
        line: u32,
    ) -> NakoResult<()> {
        let body = lexeme.value.to_string();
        let pieces = split_interpolation(&body).ok_or_else(|| {
            self.error(
                "展開あり文字列で値の埋め込み{...}が対応していません。",
                line,
            )
        })?;
        let last = pieces.len() - 1;
        for (i, piece) in pieces.iter().enumerate() {
            if i % 2 == 0 {
                let josi = if i == last { josi.clone() } else { String::new() };
                tokens.push(Token::new(TokenKind::String, TokenValue::text(*piece), line, josi));
            } else {
                tokens.push(Token::marker(TokenKind::Concat, "&", line));
                tokens.push(Token::new(
                    TokenKind::Code,
                    TokenValue::text(trim_okurigana(piece)),
                    line,
                    "",
                ));
                tokens.push(Token::marker(TokenKind::Concat, "&", line));
            }
        }
        Ok(())
    }

    /// `!「file」を取り込む` → `require string 取込`.
    #[tracing::instrument(level = "debug", skip(self, tokens))]
    pub fn check_require(&self, tokens: &mut [Token]) -> NakoResult<()> {
        let mut i = 0;
        while i + 2 < tokens.len() {
            let is_require = tokens[i].is(TokenKind::Not)
                && matches!(&tokens[i + 2].value, TokenValue::Text(v) if v == "取込");
            if !is_require {
                i += 1;
                continue;
            }
            if !matches!(tokens[i + 1].kind, TokenKind::String | TokenKind::StringEx) {
                return Err(self.error(
                    "『!「ファイル」を取り込む』の書式で記述してください。",
                    tokens[i].line,
                ));
            }
            tokens[i].kind = TokenKind::Require;
            tokens[i + 1].kind = TokenKind::String;
            i += 3;
        }
        Ok(())
    }

    /// Registers every `●name(args)` signature before parsing, so calls that appear
    /// above a definition still resolve.
    #[tracing::instrument(level = "debug", skip(self, tokens, funclist))]
    pub fn predefine_functions(
        &self,
        tokens: &mut Vec<Token>,
        funclist: &mut FuncList,
    ) -> NakoResult<()> {
        let mut i = 0;
        while i < tokens.len() {
            let t = &mut tokens[i];
            // 「xxには」は暗黙の無名関数
            if t.kind == TokenKind::Word && (t.josi == "には" || t.josi == "は~") {
                t.josi = "には".to_string();
                let line = t.line;
                tokens.insert(i + 1, Token::marker(TokenKind::DefFunc, "関数", line));
                i += 1;
                continue;
            }
            if t.kind == TokenKind::Word {
                if let TokenValue::Text(word) = &t.value {
                    if let Some(kind) = reserved_kind(word) {
                        let word = canonical_word(word).to_string();
                        t.kind = kind;
                        t.value = TokenValue::Text(word);
                    }
                }
            }
            if !matches!(t.kind, TokenKind::DefFunc | TokenKind::DefTest) {
                i += 1;
                continue;
            }

            let def_index = i;
            let named = is_named_definition(&tokens[def_index]);
            i += 1;
            let mut args = if named { self.read_args(tokens, &mut i) } else { None };
            let mut name = None;
            if named {
                match tokens.get(i) {
                    Some(t) if matches!(t.kind, TokenKind::Word | TokenKind::Func) => {
                        name = Some(t.text());
                        i += 1;
                    }
                    Some(t) => {
                        return Err(self.error(
                            format!("関数『{}』の宣言でエラー。関数名がありません。", t.text()),
                            t.line,
                        ))
                    }
                    None => {
                        return Err(self.error(
                            "関数の宣言でエラー。関数名がありません。",
                            tokens[def_index].line,
                        ))
                    }
                }
            }
            if matches!(tokens.get(i), Some(t) if t.is(TokenKind::ParenOpen)) {
                if args.is_some() {
                    return Err(self.error(
                        format!(
                            "関数『{}』の宣言で、引数定義は名前の前か後に一度だけ可能です。",
                            name.as_deref().unwrap_or("")
                        ),
                        tokens[def_index].line,
                    ));
                }
                args = self.read_args(tokens, &mut i);
            }

            let signature = args.unwrap_or_default();
            if let Some(name) = name {
                tracing::debug!("predefine function: {}", name);
                funclist.insert(name, signature.clone());
            }
            tokens[def_index].meta = Some(signature);
        }
        Ok(())
    }

    /// Reads `(aと bを {関数} fで)` starting at `*i`. A `{関数}` marker makes the next
    /// argument a callable pointer. Repeated names merge their particles.
    fn read_args(&self, tokens: &mut [Token], i: &mut usize) -> Option<FunctionSignature> {
        if !matches!(tokens.get(*i), Some(t) if t.is(TokenKind::ParenOpen)) {
            return None;
        }
        *i += 1;
        let mut order: Vec<String> = Vec::new();
        let mut josi: HashMap<String, Vec<String>> = HashMap::new();
        let mut pointers: HashMap<String, bool> = HashMap::new();
        let mut pointer_next = false;
        while let Some(t) = tokens.get_mut(*i) {
            *i += 1;
            match t.kind {
                TokenKind::ParenClose => break,
                TokenKind::Func => pointer_next = true,
                TokenKind::Bar | TokenKind::Comma => {}
                _ => {
                    let name = t.text();
                    if pointer_next {
                        t.func_pointer = true;
                        pointer_next = false;
                    }
                    if !josi.contains_key(&name) {
                        order.push(name.clone());
                    }
                    josi.entry(name.clone()).or_default().push(t.josi.clone());
                    let flag = pointers.entry(name).or_insert(false);
                    *flag |= t.func_pointer;
                }
            }
        }
        let mut signature = FunctionSignature::default();
        for name in order {
            signature.josi.push(josi.remove(&name).unwrap_or_default());
            signature
                .func_pointers
                .push(pointers.get(&name).copied().unwrap_or(false));
            signature.varnames.push(name);
        }
        Some(signature)
    }

    /// Retypes known function names, folds negative numbers and expands the
    /// particles that act as syntax (`は`, `とは`, `ならば`). Comments are moved onto
    /// the next end-of-line token.
    #[tracing::instrument(level = "debug", skip(self, tokens, funclist))]
    pub fn replace_words(&self, tokens: &mut Vec<Token>, funclist: &FuncList) {
        let mut comments: Vec<String> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].kind == TokenKind::Word {
                let name = tokens[i].text();
                if name != "それ" {
                    if let Some(sig) = funclist.get(&name) {
                        tokens[i].kind = TokenKind::Func;
                        tokens[i].meta = Some(sig.clone());
                        continue;
                    }
                }
            }

            // (行頭)-3 | 1 * -3 | Aに -3を 足す
            if tokens[i].kind == TokenKind::Minus
                && matches!(tokens.get(i + 1), Some(n) if n.is(TokenKind::Number))
            {
                let negative = match i.checked_sub(1).map(|p| &tokens[p]) {
                    None => true,
                    Some(prev) => {
                        prev.is(TokenKind::Eol) || prev.kind.is_operator() || !prev.josi.is_empty()
                    }
                };
                if negative {
                    tokens.remove(i);
                    if let TokenValue::Number(n) = tokens[i].value {
                        tokens[i].value = TokenValue::Number(-n);
                    }
                    continue;
                }
            }

            let t = &mut tokens[i];
            if t.josi == "は" {
                t.josi.clear();
                let line = t.line;
                tokens.insert(i + 1, Token::marker(TokenKind::Eq, "=", line));
                i += 2;
                continue;
            }
            if t.josi == "とは" {
                t.josi.clear();
                let line = t.line;
                tokens.insert(i + 1, Token::marker(TokenKind::DefinedAs, "とは", line));
                i += 2;
                continue;
            }
            if is_tarareba(&t.josi) {
                let sense = tarareba_sense(&t.josi);
                t.josi.clear();
                let line = t.line;
                tokens.insert(i + 1, Token::marker(TokenKind::Then, sense, line));
                i += 2;
                continue;
            }
            let kind = t.kind;
            match kind {
                TokenKind::EolSuppressed => {
                    tokens.remove(i);
                }
                TokenKind::LineComment | TokenKind::RangeComment => {
                    comments.push(t.text());
                    tokens.remove(i);
                }
                TokenKind::Eol => {
                    t.value = TokenValue::Text(comments.join("/"));
                    comments.clear();
                    i += 1;
                }
                _ => i += 1,
            }
        }
    }
}

/// The `●` marker names a function; markers spliced in for `には` or written as
/// `関数` introduce an anonymous one.
pub fn is_named_definition(token: &Token) -> bool {
    match token.kind {
        TokenKind::DefTest => true,
        TokenKind::DefFunc => matches!(&token.value, TokenValue::Text(v) if v == "●"),
        _ => false,
    }
}

fn failure_message(e: &VerboseError<&str>) -> String {
    e.errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(ctx) => Some(ctx.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| "字句解析に失敗しました。".to_string())
}
