use lazy_static::lazy_static;
use regex::Regex;

use super::parser::Parser;
use crate::{
    ast::{describe_token, JsonPair, Node, NodeKind, Operator},
    error::NakoResult,
    funclist::FunctionSignature,
    tokenizer::{
        josi::is_keizoku,
        token::{Token, TokenKind},
    },
};

lazy_static! {
    static ref LONE_NUMBER: Regex = Regex::new(r"^『\d+』$").expect("number pattern");
}

/// Priority of a plain operand during the infix to postfix conversion.
const OPERAND_PRIORITY: u8 = 10;

/// 計算式の要素
#[derive(Debug)]
enum Infix {
    Operand(Node),
    Operator(Operator),
}

impl Infix {
    fn priority(&self) -> u8 {
        match self {
            Infix::Operand(_) => OPERAND_PRIORITY,
            Infix::Operator(op) => op.priority(),
        }
    }
}

impl<'a> Parser<'a> {
    /// Reads values onto the operand stack until a verb (or a control keyword)
    /// consumes them. Returns `None` when nothing could be read.
    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn read_call(&mut self) -> NakoResult<Option<Node>> {
        if self.is_eof() {
            return Ok(None);
        }
        while !self.is_eof() {
            if self.check(TokenKind::Assign) {
                return self.read_assign().map(Some);
            }
            if self.check(TokenKind::KokoKara) {
                self.get();
            }
            match self.peek().kind {
                TokenKind::RepeatTimes => return self.read_repeat_times().map(Some),
                TokenKind::While => return self.read_while().map(Some),
                TokenKind::For => return self.read_for().map(Some),
                TokenKind::Foreach => return self.read_foreach().map(Some),
                TokenKind::Return => return self.read_return().map(Some),
                _ => {}
            }
            // C言語風の呼び出し F(...)
            if self.check_seq(&[&[TokenKind::Func, TokenKind::Word], &[TokenKind::ParenOpen]])
                && self.peek().josi.is_empty()
            {
                let Some(mut value) = self.read_value()? else {
                    break;
                };
                if value.is_func() && (value.josi.is_empty() || is_keizoku(&value.josi)) {
                    value.josi.clear();
                    return Ok(Some(value));
                }
                self.push_stack(value);
                if self.check(TokenKind::Comma) {
                    self.get();
                }
                continue;
            }
            if self.check(TokenKind::Func) {
                match self.read_call_func()? {
                    Some(node) => return Ok(Some(node)),
                    None => continue,
                }
            }
            match self.read_arg()? {
                Some(value) => self.push_stack(value),
                None => break,
            }
        }

        self.ensure_stack_resolved()?;
        Ok(None)
    }

    /// Operands still waiting for a verb at a statement boundary are an error.
    pub(super) fn ensure_stack_resolved(&self) -> NakoResult<()> {
        if self.stack.is_empty() {
            return Ok(());
        }
        let names: String = self.stack.iter().map(Node::describe).collect();
        let line = self.stack.last().map(|n| n.line).unwrap_or_default();
        tracing::trace!(stack = ?self.stack, peek = ?self.peek(), "unresolved operands");
        let message = if names.contains("演算子") || LONE_NUMBER.is_match(&names) {
            format!(
                "{}がありますが文が解決していません。『代入』や『表示』などと一緒に使ってください。",
                names
            )
        } else {
            format!("{}がありますが使い方が分かりません。", names)
        };
        Err(self.error(message, line))
    }

    /// Resolves a call by popping one operand per argument particle set.
    fn read_call_func(&mut self) -> NakoResult<Option<Node>> {
        let t = self.get();
        let name = t.text();

        // 「Fには ... ここまで」は無名関数を引数に補う
        let mut func_obj = None;
        if t.josi == "には" {
            func_obj = self.read_anonymous_func().map_err(|e| {
                self.wrap(
                    e,
                    format!("『{}には...』で無名関数の定義で以下の間違いがあります。", name),
                    t.line,
                )
            })?;
            if func_obj.is_none() {
                return Err(self.error(
                    format!("『{}には』構文がありましたが、関数定義が見当たりません。", name),
                    t.line,
                ));
            }
        }

        let signature = t
            .meta
            .clone()
            .or_else(|| self.funclist.get(&name).cloned())
            .ok_or_else(|| self.error("関数の定義でエラー。", t.line))?;

        let mut args = Vec::with_capacity(signature.arity());
        let mut null_count = 0;
        let mut value_count = 0;
        for (i, josi) in signature.josi.iter().enumerate() {
            let arg = match self.pop_stack(josi.as_slice()) {
                Some(arg) => {
                    value_count += 1;
                    Some(arg)
                }
                None => {
                    null_count += 1;
                    func_obj.clone()
                }
            };
            let arg = match arg {
                Some(arg) if signature.is_func_pointer(i) => {
                    Some(self.func_pointer_arg(&name, &signature, i, arg, t.line)?)
                }
                other => other,
            };
            args.push(arg);
        }

        // 一つだけなら「それ」で補われる
        if null_count >= 2 && (value_count > 0 || t.josi.is_empty() || is_keizoku(&t.josi)) {
            return Err(self.error(format!("関数『{}』の引数が不足しています。", name), t.line));
        }

        let mut node = Node::new(
            NodeKind::Func {
                name,
                args,
                setter: false,
                meta: None,
            },
            t.line,
            t.josi.clone(),
        );
        if t.josi.is_empty() {
            return Ok(Some(node));
        }
        if is_keizoku(&t.josi) {
            node.josi = "して".to_string();
            return Ok(Some(node));
        }
        // まだ続くので値として積んでおく
        if let NodeKind::Func { meta, .. } = &mut node.kind {
            *meta = Some(signature);
        }
        self.push_stack(node);
        Ok(None)
    }

    fn func_pointer_arg(
        &self,
        func: &str,
        signature: &FunctionSignature,
        index: usize,
        arg: Node,
        line: u32,
    ) -> NakoResult<Node> {
        if matches!(arg.kind, NodeKind::FuncObj { .. }) {
            return Ok(arg);
        }
        if let NodeKind::Func { name, .. } = arg.kind {
            return Ok(Node::new(NodeKind::FuncPointer { name }, arg.line, arg.josi));
        }
        let varname = signature
            .varnames
            .get(index)
            .cloned()
            .unwrap_or_else(|| (index + 1).to_string());
        Err(self.error(
            format!(
                "関数『{}』の引数『{}』には関数オブジェクトが必要です。",
                func, varname
            ),
            line,
        ))
    }

    /// `値をAに代入`
    fn read_assign(&mut self) -> NakoResult<Node> {
        let dainyu = self.get();
        let line = dainyu.line;
        let value = self.pop_stack(&["を"]);
        let target = self
            .pop_stack(&["へ", "に"])
            .ok_or_else(|| self.error("代入文で代入先の変数が見当たりません。", line))?;
        let or_sore = |value: Option<Node>| value.unwrap_or_else(|| Node::word("それ", line));

        match target.kind {
            NodeKind::Word { value: name } => Ok(Node::new(
                NodeKind::Let {
                    name,
                    value: Box::new(or_sore(value)),
                },
                line,
                "",
            )),
            NodeKind::Func {
                name, args, meta, ..
            } => {
                // 「5をFに代入」では値が先に関数の引数として取られている
                let value = value.or_else(|| args.into_iter().flatten().next());
                self.setter_call(&name, meta.as_ref(), or_sore(value), line)
            }
            NodeKind::RefArray { name, index } => Ok(Node::new(
                NodeKind::LetArray {
                    name,
                    index,
                    value: Box::new(or_sore(value)),
                },
                line,
                "",
            )),
            _ => Err(self.error("代入文で代入先の変数が見当たりません。", line)),
        }
    }

    /// Assignment to a one-argument function, i.e. a setter call.
    pub(super) fn setter_call(
        &self,
        name: &str,
        meta: Option<&FunctionSignature>,
        value: Node,
        line: u32,
    ) -> NakoResult<Node> {
        let arity = meta
            .or_else(|| self.funclist.get(name))
            .map(FunctionSignature::arity)
            .unwrap_or_default();
        match arity {
            0 => Err(self.error(
                format!("引数がない関数『{}』を代入的呼び出しすることはできません。", name),
                line,
            )),
            1 => Ok(Node::new(
                NodeKind::Func {
                    name: name.to_string(),
                    args: vec![Some(value)],
                    setter: true,
                    meta: None,
                },
                line,
                "",
            )),
            _ => Err(self.error(
                format!(
                    "引数が2つ以上ある関数『{}』を代入的呼び出しすることはできません。",
                    name
                ),
                line,
            )),
        }
    }

    /// An expression: a value, or a call chain when the value carries a particle.
    pub(super) fn read_calc(&mut self) -> NakoResult<Option<Node>> {
        if self.check(TokenKind::Eol) {
            return Ok(None);
        }
        let Some(value) = self.read_arg()? else {
            return Ok(None);
        };
        if value.josi.is_empty() {
            return Ok(Some(value));
        }
        let line = value.line;
        let name = value.describe();
        self.push_stack(value);
        let call = self.read_call()?.ok_or_else(|| {
            self.error(format!("計算式で{}の使い方が分かりません。", name), line)
        })?;
        if call.josi != "して" {
            return Ok(Some(call));
        }
        // XしてY
        match self.read_calc()? {
            None => Ok(Some(call)),
            Some(right) => {
                let josi = right.josi.clone();
                let line = call.line;
                Ok(Some(Node::new(
                    NodeKind::Renbun {
                        left: Box::new(call),
                        right: Box::new(right),
                    },
                    line,
                    josi,
                )))
            }
        }
    }

    /// A value followed by any number of `operator value` pairs.
    pub(super) fn read_arg(&mut self) -> NakoResult<Option<Node>> {
        let Some(first) = self.read_value()? else {
            return Ok(None);
        };
        let line = first.line;
        let mut items = vec![Infix::Operand(first)];
        while !self.is_eof() {
            let op = self.peek();
            let Some(operator) = Operator::from_token_kind(op.kind) else {
                break;
            };
            self.get();
            let value = self.read_value()?.ok_or_else(|| {
                self.error(
                    format!("計算式で演算子『{}』後に値がありません", op.text()),
                    line,
                )
            })?;
            items.push(Infix::Operator(operator));
            items.push(Infix::Operand(value));
        }
        if items.len() == 1 {
            if let Some(Infix::Operand(node)) = items.pop() {
                return Ok(Some(node));
            }
        }
        self.infix_to_ast(items).map(Some)
    }

    fn infix_to_ast(&self, items: Vec<Infix>) -> NakoResult<Node> {
        let (josi, line) = match items.last() {
            Some(Infix::Operand(node)) => (node.josi.clone(), node.line),
            _ => (String::new(), 0),
        };
        let mut stack: Vec<Node> = Vec::new();
        for item in infix_to_postfix(items) {
            let operator = match item {
                Infix::Operand(node) => {
                    stack.push(node);
                    continue;
                }
                Infix::Operator(op) => op,
            };
            let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                tracing::trace!(operator = %operator, "operand missing in expression");
                return Err(self.error("計算式でエラー", line));
            };
            let op_line = left.line;
            stack.push(Node::new(
                NodeKind::Op {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                op_line,
                josi.clone(),
            ));
        }
        stack.pop().ok_or_else(|| self.error("計算式でエラー", line))
    }

    /// Primary value: literal, bracketed, unary, JSON, call or variable reference.
    pub(super) fn read_value(&mut self) -> NakoResult<Option<Node>> {
        let t = self.peek();
        match t.kind {
            TokenKind::Number | TokenKind::String | TokenKind::StringEx => {
                self.get();
                return Ok(Node::from_token(t));
            }
            TokenKind::ParenOpen => return self.read_paren_value().map(Some),
            TokenKind::Minus
                if matches!(
                    self.peek_at(1).kind,
                    TokenKind::Number | TokenKind::Word | TokenKind::Func
                ) =>
            {
                let minus = self.get();
                let Some(value) = self.read_value()? else {
                    return Ok(None);
                };
                let josi = value.josi.clone();
                return Ok(Some(Node::new(
                    NodeKind::Op {
                        operator: Operator::Mul,
                        left: Box::new(Node::number(-1.0, minus.line)),
                        right: Box::new(value),
                    },
                    minus.line,
                    josi,
                )));
            }
            TokenKind::Not => {
                let not = self.get();
                let value = self.read_value()?.ok_or_else(|| {
                    self.error(
                        format!("{}の後に値がありません。", describe_token(not)),
                        not.line,
                    )
                })?;
                let josi = value.josi.clone();
                return Ok(Some(Node::new(
                    NodeKind::Not {
                        value: Box::new(value),
                    },
                    not.line,
                    josi,
                )));
            }
            TokenKind::BracketOpen => return self.read_json_array(),
            TokenKind::BraceOpen => return self.read_json_object(),
            _ => {}
        }

        // 一語関数
        if t.kind == TokenKind::Func {
            let next = self.peek_at(1).kind;
            let split = Operator::from_token_kind(next).is_some()
                || matches!(
                    next,
                    TokenKind::Eol | TokenKind::ParenClose | TokenKind::BracketClose
                );
            if split {
                self.get();
                return Ok(Some(Node::new(
                    NodeKind::Func {
                        name: t.text(),
                        args: Vec::new(),
                        setter: false,
                        meta: None,
                    },
                    t.line,
                    t.josi.clone(),
                )));
            }
        }

        if self.check_seq(&[&[TokenKind::Func, TokenKind::Word], &[TokenKind::ParenOpen]])
            && t.josi.is_empty()
        {
            let func = self.get();
            self.get();
            let args = self.read_paren_args(func)?;
            let close = self.get();
            return Ok(Some(Node::new(
                NodeKind::Func {
                    name: func.text(),
                    args: args.into_iter().map(Some).collect(),
                    setter: false,
                    meta: None,
                },
                func.line,
                close.josi.clone(),
            )));
        }

        match t.kind {
            TokenKind::EmbedCode | TokenKind::Code => {
                self.get();
                Ok(Node::from_token(t))
            }
            TokenKind::DefFunc => self.read_anonymous_func().map_err(|e| {
                self.wrap(e, "『関数』の定義で以下のエラーがありました。", t.line)
            }),
            TokenKind::Word => self.read_value_word(),
            _ => Ok(None),
        }
    }

    /// `( 式 )`; the closing bracket's particle becomes the value's particle.
    fn read_paren_value(&mut self) -> NakoResult<Node> {
        let open = self.get();
        self.scoped(|p| {
            let Some(mut value) = p.read_calc()? else {
                let near = p.get();
                return Err(p.error(
                    format!("(...)の解析エラー。{}の近く", describe_token(near)),
                    open.line,
                ));
            };
            if !p.check(TokenKind::ParenClose) {
                return Err(p.error(
                    format!("(...)の解析エラー。{}の近く", value.describe()),
                    open.line,
                ));
            }
            let close = p.get();
            value.josi = close.josi.clone();
            Ok(value)
        })
    }

    /// Arguments of `F(a, b)` in written order. Leaves the cursor on `)`.
    fn read_paren_args(&mut self, func: &Token) -> NakoResult<Vec<Node>> {
        self.scoped(|p| {
            let mut closed = false;
            while !p.is_eof() {
                if p.check(TokenKind::ParenClose) {
                    closed = true;
                    break;
                }
                match p.read_arg()? {
                    Some(value) => {
                        p.push_stack(value);
                        if p.check(TokenKind::Comma) {
                            p.get();
                        }
                    }
                    None => break,
                }
            }
            if !closed {
                return Err(p.error(
                    format!("C風関数『{}』でカッコが閉じていません", func.text()),
                    func.line,
                ));
            }
            Ok(std::mem::take(&mut p.stack))
        })
    }

    /// A variable, or an element reference `A@1@2` / `A[1][2]` (up to three levels).
    fn read_value_word(&mut self) -> NakoResult<Option<Node>> {
        let word = self.get();
        let node = Node::from_token(word);
        if !word.josi.is_empty() || !self.check_types(&[TokenKind::At, TokenKind::BracketOpen]) {
            return Ok(node);
        }

        let mut index = Vec::new();
        let mut josi = String::new();
        while !self.is_eof() && index.len() < 3 {
            let saved = self.index;
            if self.check(TokenKind::At) {
                self.get();
                if let Some(value) = self.read_value()? {
                    josi = value.josi.clone();
                    index.push(value);
                    continue;
                }
            } else if self.check(TokenKind::BracketOpen) {
                self.get();
                if let Some(value) = self.scoped(|p| p.read_calc())? {
                    if self.check(TokenKind::BracketClose) {
                        josi = self.get().josi.clone();
                        index.push(value);
                        continue;
                    }
                }
            }
            self.index = saved;
            break;
        }
        if index.is_empty() {
            return Err(self.error(
                format!("配列『{}』アクセスで指定ミス", word.text()),
                word.line,
            ));
        }
        Ok(Some(Node::new(
            NodeKind::RefArray {
                name: word.text(),
                index,
            },
            word.line,
            josi,
        )))
    }

    /// `[a, b, ...]`. Restores the cursor and yields `None` when the list is not closed.
    fn read_json_array(&mut self) -> NakoResult<Option<Node>> {
        let start = self.index;
        let open = self.get();
        let items = self.scoped(|p| {
            let mut items = Vec::new();
            while !p.is_eof() {
                p.skip_eols();
                if p.check(TokenKind::BracketClose) {
                    break;
                }
                match p.read_calc()? {
                    Some(value) => items.push(value),
                    None => break,
                }
                if p.check(TokenKind::Comma) {
                    p.get();
                }
            }
            Ok(items)
        })?;
        if !self.check(TokenKind::BracketClose) {
            self.index = start;
            return Ok(None);
        }
        let close = self.get();
        Ok(Some(Node::new(
            NodeKind::JsonArray { value: items },
            open.line,
            close.josi.clone(),
        )))
    }

    /// `{key: value, ...}`; a bare key stands for itself.
    fn read_json_object(&mut self) -> NakoResult<Option<Node>> {
        let start = self.index;
        let open = self.get();
        let pairs = self.scoped(|p| p.read_json_pairs(open.line))?;
        if !self.check(TokenKind::BraceClose) {
            self.index = start;
            return Ok(None);
        }
        let close = self.get();
        Ok(Some(Node::new(
            NodeKind::JsonObj { value: pairs },
            open.line,
            close.josi.clone(),
        )))
    }

    fn read_json_pairs(&mut self, line: u32) -> NakoResult<Vec<JsonPair>> {
        let unclosed = "辞書オブジェクトの宣言で末尾の『}』がありません。";
        let mut pairs = Vec::new();
        while !self.is_eof() {
            self.skip_eols();
            if self.check(TokenKind::BraceClose) {
                break;
            }
            if self.check_seq(&[&[TokenKind::Word, TokenKind::String], &[TokenKind::Colon]]) {
                let key = string_key(self.get());
                self.get();
                let value = self
                    .read_calc()?
                    .ok_or_else(|| self.error(unclosed, line))?;
                pairs.push(JsonPair { key, value });
            } else if self.check_types(&[TokenKind::Word, TokenKind::String, TokenKind::Number]) {
                let t = self.get();
                let key = match t.kind {
                    TokenKind::Number => Node::from_token(t),
                    _ => Some(string_key(t)),
                };
                if let Some(key) = key {
                    pairs.push(JsonPair {
                        value: key.clone(),
                        key,
                    });
                }
            } else {
                return Err(self.error(unclosed, line));
            }
            if self.check(TokenKind::Comma) {
                self.get();
            }
        }
        Ok(pairs)
    }

    /// `関数(引数) … ここまで`, an anonymous function object.
    pub(super) fn read_anonymous_func(&mut self) -> NakoResult<Option<Node>> {
        if !self.check(TokenKind::DefFunc) {
            return Ok(None);
        }
        let def = self.get();
        let args = self.read_def_args();
        let block = self.scoped(|p| p.read_block())?;
        if !self.check(TokenKind::KokoMade) {
            return Err(self.error(
                "『関数』...『ここまで』を対応させてください。",
                def.line,
            ));
        }
        self.get();
        Ok(Some(Node::new(
            NodeKind::FuncObj {
                args,
                block: Box::new(block),
                meta: def.meta.clone().unwrap_or_default(),
            },
            def.line,
            "",
        )))
    }
}

/// 辞書のキー。語句はそのまま文字列として扱う
fn string_key(token: &Token) -> Node {
    Node::new(
        NodeKind::String {
            value: token.text(),
        },
        token.line,
        "",
    )
}

fn infix_to_postfix(items: Vec<Infix>) -> Vec<Infix> {
    let mut stack: Vec<Infix> = Vec::new();
    let mut postfix = Vec::with_capacity(items.len());
    for item in items {
        while let Some(top) = stack.last() {
            if item.priority() > top.priority() {
                break;
            }
            if let Some(top) = stack.pop() {
                postfix.push(top);
            }
        }
        stack.push(item);
    }
    while let Some(top) = stack.pop() {
        postfix.push(top);
    }
    postfix
}
