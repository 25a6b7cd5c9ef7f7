use lazy_static::lazy_static;

use crate::{
    ast::{describe_token, Node},
    error::{NakoError, NakoResult},
    funclist::FuncList,
    tokenizer::token::{Token, TokenKind},
};

lazy_static! {
    static ref END_OF_INPUT: Token = Token::eof(0);
}

/// Recursive-descent parser over a lexed token stream.
///
/// Values that are waiting for a verb live on an operand stack; a call pops its
/// arguments by particle, so the order they were written in does not matter.
pub struct Parser<'a> {
    pub(super) tokens: &'a [Token],
    pub(super) index: usize,
    pub(super) stack: Vec<Node>,
    saved_stacks: Vec<Vec<Node>>,
    pub(super) funclist: &'a FuncList,
    filename: Option<String>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], funclist: &'a FuncList) -> Self {
        Self {
            tokens,
            index: 0,
            stack: Vec::new(),
            saved_stacks: Vec::new(),
            funclist,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename;
        self
    }

    /// Parses the whole stream into the root `block` node.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn parse(&mut self) -> NakoResult<Node> {
        self.index = 0;
        self.stack.clear();
        self.saved_stacks.clear();

        let root = self.read_sentence_list()?;
        let rest = self.get();
        if !rest.is(TokenKind::Eof) {
            return Err(self.error(
                format!("構文解析でエラー。{}の使い方が間違っています。", describe_token(rest)),
                rest.line,
            ));
        }
        Ok(root)
    }

    // ---- token cursor ----

    pub(super) fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    pub(super) fn peek_at(&self, offset: usize) -> &'a Token {
        self.tokens.get(self.index + offset).unwrap_or(&*END_OF_INPUT)
    }

    pub(super) fn get(&mut self) -> &'a Token {
        match self.tokens.get(self.index) {
            Some(token) => {
                self.index += 1;
                token
            }
            None => &*END_OF_INPUT,
        }
    }

    pub(super) fn is_eof(&self) -> bool {
        self.peek().is(TokenKind::Eof)
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    pub(super) fn check_types(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek().kind)
    }

    /// The next tokens match `kinds` position by position.
    pub(super) fn check_seq(&self, kinds: &[&[TokenKind]]) -> bool {
        kinds
            .iter()
            .enumerate()
            .all(|(offset, allowed)| allowed.contains(&self.peek_at(offset).kind))
    }

    pub(super) fn skip_eols(&mut self) {
        while self.check(TokenKind::Eol) {
            self.get();
        }
    }

    // ---- operand stack ----

    pub(super) fn push_stack(&mut self, node: Node) {
        self.stack.push(node);
    }

    /// Removes the most recent operand whose particle is in `josi`.
    /// An empty set takes the top operand regardless of its particle.
    pub(super) fn pop_stack<S: AsRef<str>>(&mut self, josi: &[S]) -> Option<Node> {
        let position = self
            .stack
            .iter()
            .rposition(|n| josi.is_empty() || josi.iter().any(|j| j.as_ref() == n.josi))?;
        Some(self.stack.remove(position))
    }

    /// Runs `f` against a fresh operand stack and restores the outer one afterwards,
    /// whether `f` succeeds or not. Operands `f` leaves behind are an error.
    pub(super) fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> NakoResult<T>,
    ) -> NakoResult<T> {
        self.saved_stacks.push(std::mem::take(&mut self.stack));
        let result = f(self).and_then(|value| {
            self.ensure_stack_resolved()?;
            Ok(value)
        });
        self.stack = self.saved_stacks.pop().unwrap_or_default();
        result
    }

    // ---- errors ----

    pub(super) fn error(&self, message: impl Into<String>, line: u32) -> NakoError {
        NakoError::syntax(message, line + 1, self.filename.as_deref())
    }

    pub(super) fn wrap(&self, err: NakoError, message: impl Into<String>, line: u32) -> NakoError {
        err.context(message, line + 1, self.filename.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::TokenValue;

    fn word(value: &str, josi: &str) -> Node {
        let mut node = Node::word(value, 0);
        node.josi = josi.to_string();
        node
    }

    #[test]
    fn test_pop_by_particle() {
        let funclist = FuncList::new();
        let mut parser = Parser::new(&[], &funclist);
        parser.push_stack(word("A", "に"));
        parser.push_stack(word("B", "を"));
        parser.push_stack(word("C", "に"));

        // 後から積んだものが優先
        assert_eq!(parser.pop_stack(&["に"]), Some(word("C", "に")));
        assert_eq!(parser.pop_stack(&["に"]), Some(word("A", "に")));
        assert_eq!(parser.pop_stack(&["で"]), None);
        assert_eq!(parser.pop_stack::<&str>(&[]), Some(word("B", "を")));
        assert!(parser.stack.is_empty());
    }

    #[test]
    fn test_scoped_restores_on_error() {
        let funclist = FuncList::new();
        let mut parser = Parser::new(&[], &funclist);
        parser.push_stack(word("A", "を"));

        let result: NakoResult<()> = parser.scoped(|p| {
            assert!(p.stack.is_empty());
            p.push_stack(word("B", "を"));
            Err(p.error("内側のエラー", 0))
        });

        assert!(result.is_err());
        assert_eq!(parser.stack, vec![word("A", "を")]);
    }

    #[test]
    fn test_cursor_past_end() {
        let funclist = FuncList::new();
        let tokens = vec![Token::new(TokenKind::Number, TokenValue::Number(1.0), 0, "")];
        let mut parser = Parser::new(&tokens, &funclist);
        assert!(parser.check(TokenKind::Number));
        parser.get();
        assert!(parser.is_eof());
        assert!(parser.get().is(TokenKind::Eof));
    }
}
