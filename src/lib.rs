//! # nako-front
//!
//! Front end for a Japanese particle-based programming language: source text is
//! lexed into particle-tagged tokens and parsed into a syntax tree that a separate
//! code generator consumes.
//!
//! ```text
//! Source → Lexer (tokenize → require check → pre-declare → rewrite) → Parser → Node
//! ```
//!
//! - [`tokenizer`]: token model, particle table, rule table and the multi-pass [`Lexer`]
//! - [`funclist`]: function signatures, keyed by name
//! - [`analyzer`]: the operand-stack [`Parser`]
//! - [`ast`]: the [`Node`] tree, serialized for the code generator
//!
//! A dependency-parse result can be fed in place of source text with
//! [`Compiler::lex_cotoha`].

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod error;
pub mod funclist;
pub mod tokenizer;

// Re-exports
pub use analyzer::Parser;
pub use ast::{Node, NodeKind, Operator};
pub use config::{ConfigError, NakoConfig};
pub use error::{ErrorKind, NakoError, NakoResult};
pub use funclist::{FuncList, FunctionSignature};
pub use tokenizer::{Lexer, Token, TokenKind, TokenValue};

/// Lexer and parser bound to one configuration and one function table.
///
/// Definitions found while lexing are added to the table, so later units compiled
/// with the same `Compiler` can call them.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: NakoConfig,
    funclist: FuncList,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NakoConfig) -> Self {
        let funclist = config.functions.clone();
        Self { config, funclist }
    }

    pub fn config(&self) -> &NakoConfig {
        &self.config
    }

    pub fn funclist(&self) -> &FuncList {
        &self.funclist
    }

    pub fn funclist_mut(&mut self) -> &mut FuncList {
        &mut self.funclist
    }

    pub fn add_function<S: Into<String>>(&mut self, name: S, signature: FunctionSignature) {
        self.funclist.insert(name, signature);
    }

    pub fn lex(&mut self, src: &str) -> NakoResult<Vec<Token>> {
        Lexer::from_config(&self.config).lex(src, &mut self.funclist)
    }

    #[tracing::instrument(level = "debug", skip(self, src))]
    pub fn parse(&mut self, src: &str) -> NakoResult<Node> {
        let tokens = self.lex(src)?;
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token]) -> NakoResult<Node> {
        Parser::new(tokens, &self.funclist)
            .with_filename(self.config.filename.clone())
            .parse()
    }

    /// The tree in the JSON shape the code generator reads.
    pub fn parse_to_json(&mut self, src: &str) -> NakoResult<serde_json::Value> {
        let node = self.parse(src)?;
        Ok(serde_json::to_value(&node)?)
    }

    /// One token list per sentence of a dependency-parse result.
    pub fn lex_cotoha(&self, json: &str) -> NakoResult<Vec<Vec<Token>>> {
        tokenizer::cotoha::tokens_from_cotoha(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        // テストの前に一度だけ実行したい処理
        // tracing_subscriberの初期化
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }

    #[test]
    fn test_definitions_persist_between_units() {
        let mut compiler = Compiler::new();
        compiler.add_function("表示", FunctionSignature::from_josi(&[&["を"]]));
        compiler.parse("●(aを)倍増\n  a*2で戻る\nここまで").unwrap();
        assert!(compiler.funclist().contains("倍増"));

        // 別の単位からも呼べる
        let node = compiler.parse("3を倍増して表示").unwrap();
        let NodeKind::Block { block } = node.kind else {
            panic!("not a block");
        };
        assert!(matches!(&block[0].kind, NodeKind::Block { block } if block[0].is_func()));
    }

    #[test]
    fn test_filename_in_errors() {
        let config = NakoConfig {
            filename: Some("main.nako".to_string()),
            ..NakoConfig::default()
        };
        let mut compiler = Compiler::with_config(config);
        let err = compiler.parse("A = ").unwrap_err();
        assert!(err.to_string().starts_with("[文法エラー]main.nako(1行目)"));
    }
}
