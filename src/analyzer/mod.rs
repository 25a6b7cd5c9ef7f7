//! Syntax analysis: token stream → [`Node`](crate::ast::Node) tree.
//!
//! The grammar is spread over three files that each add methods to [`Parser`]:
//! `statement` (sentences, definitions, assignments), `control` (もし, loops,
//! error guards, sequential blocks) and `expression` (calls, values, operators).

mod control;
mod expression;
pub mod parser;
mod statement;

pub use parser::Parser;

#[cfg(test)]
pub(crate) fn parse_source(src: &str) -> crate::error::NakoResult<crate::ast::Node> {
    use crate::{
        funclist::{FuncList, FunctionSignature},
        tokenizer::Lexer,
    };

    let mut funclist = FuncList::new();
    funclist.insert("表示", FunctionSignature::from_josi(&[&["を", "と"]]));
    funclist.insert("言", FunctionSignature::from_josi(&[&["と", "を"]]));
    funclist.insert("足", FunctionSignature::from_josi(&[&["に", "と"], &["を"]]));
    funclist.insert("掛", FunctionSignature::from_josi(&[&["に", "と"], &["を"]]));
    funclist.insert("音量", FunctionSignature::from_josi(&[&["を"]]));
    funclist.insert("押時", FunctionSignature::from_josi(&[&["を"]]));
    funclist.insert("今", FunctionSignature::default());

    let tokens = Lexer::new().lex(src, &mut funclist)?;
    Parser::new(&tokens, &funclist).parse()
}
