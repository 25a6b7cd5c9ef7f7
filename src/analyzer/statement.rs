use super::parser::Parser;
use crate::{
    ast::{describe_token, Node, NodeKind, VarType},
    error::NakoResult,
    tokenizer::{
        lexer::is_named_definition,
        token::{Token, TokenKind},
    },
};

impl<'a> Parser<'a> {
    pub(super) fn read_sentence_list(&mut self) -> NakoResult<Node> {
        let mut blocks = Vec::new();
        let line = self.peek().line;
        while !self.is_eof() {
            match self.read_sentence()? {
                Some(node) => blocks.push(node),
                None => break,
            }
        }
        if blocks.is_empty() {
            let next = self.peek();
            return Err(self.error(
                format!("構文解析に失敗:{}", describe_token(next)),
                next.line,
            ));
        }
        let line = blocks.first().map(|n| n.line).unwrap_or(line);
        Ok(Node::block(blocks, line))
    }

    /// One statement. The operand stack is empty again once it is read.
    pub(super) fn read_sentence(&mut self) -> NakoResult<Option<Node>> {
        let node = self.read_statement()?;
        if node.is_some() {
            self.ensure_stack_resolved()?;
        }
        Ok(node)
    }

    fn read_statement(&mut self) -> NakoResult<Option<Node>> {
        // 最初の語句で決まる構文
        if self.check(TokenKind::Eol) {
            let t = self.get();
            return Ok(Node::from_token(t));
        }
        if self.check(TokenKind::EmbedCode) {
            let t = self.get();
            return Ok(Node::from_token(t));
        }
        if self.check(TokenKind::Mosi) {
            return self.read_if().map(Some);
        }
        if self.check(TokenKind::ErrorGuard) {
            return self.read_try_except().map(Some);
        }
        if self.check(TokenKind::Sequential) {
            return self.read_promise().map(Some);
        }
        if self.check(TokenKind::Break) {
            let t = self.get();
            return Ok(Some(Node::new(NodeKind::Break, t.line, "")));
        }
        if self.check(TokenKind::Continue) {
            let t = self.get();
            return Ok(Some(Node::new(NodeKind::Continue, t.line, "")));
        }
        if self.check_seq(&[
            &[TokenKind::Require],
            &[TokenKind::String],
            &[TokenKind::Include],
        ]) {
            let require = self.get();
            let file = self.get();
            self.get();
            return Ok(Some(Node::new(
                NodeKind::Require { value: file.text() },
                require.line,
                "",
            )));
        }

        // 先読みして初めて決まる構文
        if let Some(node) = self.read_let()? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_def(TokenKind::DefTest)? {
            return Ok(Some(node));
        }
        if let Some(node) = self.read_def(TokenKind::DefFunc)? {
            return Ok(Some(node));
        }

        let start = self.index;
        match self.read_call()? {
            Some(first) => {
                self.ensure_stack_resolved()?;
                // 「〜して」は次の文とつなげる
                if first.josi == "して" {
                    if let Some(second) = self.read_sentence()? {
                        let line = first.line;
                        let josi = second.josi.clone();
                        return Ok(Some(Node::new(
                            NodeKind::Block {
                                block: vec![first, second],
                            },
                            line,
                            josi,
                        )));
                    }
                }
                Ok(Some(first))
            }
            None => {
                self.index = start;
                Ok(None)
            }
        }
    }

    /// Statements up to (not including) `違えば`, `ここまで` or `エラー`.
    pub(super) fn read_block(&mut self) -> NakoResult<Node> {
        let mut blocks = Vec::new();
        if self.check(TokenKind::KokoKara) {
            self.get();
        }
        let line = self.peek().line;
        while !self.is_eof() {
            if self.check_types(&[TokenKind::Chigaeba, TokenKind::KokoMade, TokenKind::OnError]) {
                break;
            }
            match self.read_sentence()? {
                Some(node) => blocks.push(node),
                None => break,
            }
        }
        let line = blocks.first().map(|n| n.line).unwrap_or(line);
        Ok(Node::block(blocks, line))
    }

    /// `(aと bを)` of a definition. The lexer already built the signature; this keeps
    /// the argument words for the tree.
    pub(super) fn read_def_args(&mut self) -> Vec<Node> {
        let mut args = Vec::new();
        if !self.check(TokenKind::ParenOpen) {
            return args;
        }
        self.get();
        while !self.is_eof() {
            let t = self.get();
            match t.kind {
                TokenKind::ParenClose => break,
                TokenKind::Comma | TokenKind::Bar => {}
                TokenKind::Func if t.text() == "関数" => {}
                _ => {
                    let mut arg = Node::word(t.text(), t.line);
                    arg.josi = t.josi.clone();
                    args.push(arg);
                }
            }
        }
        args
    }

    /// `●name(args) ... ここまで` and `●テスト:name ... ここまで`.
    pub(super) fn read_def(&mut self, kind: TokenKind) -> NakoResult<Option<Node>> {
        if !self.check(kind) || !is_named_definition(self.peek()) {
            return Ok(None);
        }
        let def = self.get();
        let mut args = Vec::new();
        if self.check(TokenKind::ParenOpen) {
            args = self.read_def_args();
        }
        let name_token = self.get();
        if name_token.kind != TokenKind::Func {
            return Err(self.error(
                format!("関数{}の宣言でエラー。", describe_token(name_token)),
                name_token.line,
            ));
        }
        let name = name_token.text();
        if self.check(TokenKind::ParenOpen) {
            if !args.is_empty() {
                return Err(self.error(
                    format!(
                        "関数『{}』の宣言で、引数定義は名前の前か後に一度だけ可能です。",
                        name
                    ),
                    name_token.line,
                ));
            }
            args = self.read_def_args();
        }
        if self.check(TokenKind::DefinedAs) {
            self.get();
        }

        let multiline = self.check_types(&[TokenKind::KokoKara, TokenKind::Eol]);
        let block = self
            .scoped(|p| {
                if multiline {
                    let block = p.read_block()?;
                    if !p.check(TokenKind::KokoMade) {
                        return Err(p.error(
                            "『ここまで』がありません。関数定義の末尾に必要です。",
                            def.line,
                        ));
                    }
                    p.get();
                    Ok(block)
                } else {
                    let line = p.peek().line;
                    Ok(p.read_sentence()?
                        .unwrap_or_else(|| Node::block(Vec::new(), line)))
                }
            })
            .map_err(|e| {
                self.wrap(
                    e,
                    format!("関数『{}』の定義で以下のエラーがありました。", name),
                    def.line,
                )
            })?;

        let meta = def.meta.clone().unwrap_or_default();
        let block = Box::new(block);
        let kind = match kind {
            TokenKind::DefTest => NodeKind::DefTest {
                name,
                args,
                block,
                meta,
            },
            _ => NodeKind::DefFunc {
                name,
                args,
                block,
                meta,
            },
        };
        Ok(Some(Node::new(kind, def.line, "")))
    }

    /// Assignments and local definitions. Returns `None` (with the cursor restored)
    /// when the statement turns out to be something else.
    pub(super) fn read_let(&mut self) -> NakoResult<Option<Node>> {
        // 関数への代入的呼び出し (F = 値)
        if self.check_seq(&[&[TokenKind::Func], &[TokenKind::Eq]]) {
            let word = self.peek();
            let name = describe_token(word);
            return self
                .read_setter_let(word)
                .map(Some)
                .map_err(|e| {
                    self.wrap(
                        e,
                        format!("関数{}の代入的呼び出しにエラーがあります。", name),
                        word.line,
                    )
                });
        }
        // 通常の変数 (A = 値)
        if self.check_seq(&[&[TokenKind::Word], &[TokenKind::Eq]]) {
            let word = self.peek();
            let name = describe_token(word);
            return self
                .read_variable_let(word, &name)
                .map(Some)
                .map_err(|e| {
                    self.wrap(
                        e,
                        format!("{}への代入文で計算式に以下の書き間違いがあります。", name),
                        word.line,
                    )
                });
        }
        if self.check_seq(&[&[TokenKind::Word], &[TokenKind::At, TokenKind::BracketOpen]]) {
            if let Some(node) = self.read_let_array()? {
                return Ok(Some(node));
            }
        }
        // ローカル変数の定義 (Aとは変数 = 値)
        if self.check_seq(&[&[TokenKind::Word], &[TokenKind::DefinedAs]]) {
            let word = self.get();
            self.get();
            let vartype = match self.peek().kind {
                TokenKind::Var => VarType::Var,
                TokenKind::Const => VarType::Const,
                _ => {
                    return Err(self.error(
                        format!("ローカル変数『{}』の定義エラー", word.text()),
                        word.line,
                    ))
                }
            };
            self.get();
            let mut value = None;
            if self.check(TokenKind::Eq) {
                self.get();
                value = self.read_calc()?.map(Box::new);
            }
            return Ok(Some(Node::new(
                NodeKind::DefLocalVar {
                    name: word.text(),
                    vartype,
                    value,
                },
                word.line,
                "",
            )));
        }
        // 変数 A = 値 / 定数 A = 値
        for (kind, vartype) in [(TokenKind::Var, VarType::Var), (TokenKind::Const, VarType::Const)] {
            if !self.check_seq(&[&[kind], &[TokenKind::Word], &[TokenKind::Eq]]) {
                continue;
            }
            let start = self.index;
            let head = self.get();
            let word = self.get();
            self.get();
            match self.read_calc()? {
                Some(value) => {
                    return Ok(Some(Node::new(
                        NodeKind::DefLocalVar {
                            name: word.text(),
                            vartype,
                            value: Some(Box::new(value)),
                        },
                        head.line,
                        "",
                    )))
                }
                None => self.index = start,
            }
        }
        Ok(None)
    }

    fn read_setter_let(&mut self, word: &'a Token) -> NakoResult<Node> {
        self.get();
        self.get();
        let value = self.read_calc()?.ok_or_else(|| {
            self.error(
                format!(
                    "関数{}の代入的呼び出しで計算式が読み取れません。",
                    describe_token(word)
                ),
                word.line,
            )
        })?;
        self.setter_call(&word.text(), word.meta.as_ref(), value, word.line)
    }

    fn read_variable_let(&mut self, word: &'a Token, name: &str) -> NakoResult<Node> {
        self.get();
        self.get();
        let value = self.read_calc()?.ok_or_else(|| {
            self.error(
                format!("{}への代入文で計算式に書き間違いがあります。", name),
                word.line,
            )
        })?;
        Ok(Node::new(
            NodeKind::Let {
                name: word.text(),
                value: Box::new(value),
            },
            word.line,
            "",
        ))
    }

    /// `A@1@2 = 値` / `A[1][2] = 値`, up to three dimensions.
    fn read_let_array(&mut self) -> NakoResult<Option<Node>> {
        let start = self.index;
        let word = self.get();
        let mut index = Vec::new();
        while index.len() < 3 {
            if self.check(TokenKind::At) {
                self.get();
                match self.read_value()? {
                    Some(v) => index.push(v),
                    None => break,
                }
            } else if self.check(TokenKind::BracketOpen) {
                self.get();
                match self.read_calc()? {
                    Some(v) if self.check(TokenKind::BracketClose) => {
                        self.get();
                        index.push(v);
                    }
                    _ => break,
                }
            } else {
                break;
            }
            if self.check(TokenKind::Eq) {
                self.get();
                if let Some(value) = self.read_calc()? {
                    return Ok(Some(Node::new(
                        NodeKind::LetArray {
                            name: word.text(),
                            index,
                            value: Box::new(value),
                        },
                        word.line,
                        "",
                    )));
                }
                break;
            }
        }
        self.index = start;
        Ok(None)
    }
}
