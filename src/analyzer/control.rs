use super::parser::Parser;
use crate::{
    ast::{describe_token, Node, NodeKind, Operator},
    error::NakoResult,
    tokenizer::token::TokenKind,
};

const NEGATIVE_THEN: &str = "でなければ";

impl<'a> Parser<'a> {
    /// もし文の条件。`AがBならば` は比較に、それ以外は値か関数呼び出しになる。
    fn read_if_cond(&mut self) -> NakoResult<Option<Node>> {
        let Some(mut cond) = self.read_arg()? else {
            return Ok(None);
        };
        let line = cond.line;

        if cond.josi == "が" {
            let saved = self.index;
            if let Some(right) = self.read_arg()? {
                if self.check(TokenKind::Then) {
                    let then = self.get();
                    let operator = if then.text() == NEGATIVE_THEN {
                        Operator::NotEq
                    } else {
                        Operator::Eq
                    };
                    let mut left = cond;
                    left.josi.clear();
                    return Ok(Some(Node::new(
                        NodeKind::Op {
                            operator,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        line,
                        "",
                    )));
                }
            }
            self.index = saved;
        }

        if !cond.josi.is_empty() {
            self.push_stack(cond);
            cond = self.read_call()?.ok_or_else(|| {
                let next = self.peek();
                self.error(
                    format!("もし文の条件で{}の使い方が分かりません。", describe_token(next)),
                    line,
                )
            })?;
        }

        if !self.check(TokenKind::Then) {
            return Err(self.error(
                format!(
                    "もし文で『ならば』がないか、条件が複雑過ぎます。{}の直前に『ならば』を書いてください。",
                    describe_token(self.peek())
                ),
                line,
            ));
        }
        let then = self.get();
        if then.text() == NEGATIVE_THEN {
            cond = Node::new(
                NodeKind::Not {
                    value: Box::new(cond),
                },
                line,
                "",
            );
        }
        Ok(Some(cond))
    }

    /// Reads a branch of `もし`. Returns the branch and whether it was block form.
    fn read_if_branch(&mut self) -> NakoResult<(Node, bool)> {
        if self.check(TokenKind::Eol) {
            return Ok((self.read_block()?, true));
        }
        let line = self.peek().line;
        let branch = self
            .read_sentence()?
            .unwrap_or_else(|| Node::block(Vec::new(), line));
        Ok((branch, false))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn read_if(&mut self) -> NakoResult<Node> {
        let mosi = self.get();
        let line = mosi.line;

        let cond = self
            .scoped(|p| p.read_if_cond())
            .map_err(|e| self.wrap(e, "『もし』文の条件で次のエラーがあります。", line))?
            .ok_or_else(|| self.error("『もし』文で条件の指定が空です。", line))?;

        let (block, mut block_form) = self
            .scoped(|p| p.read_if_branch())
            .map_err(|e| self.wrap(e, "『もし』の中で以下のエラーがありました。", line))?;
        self.skip_eols();

        let mut false_block = None;
        if self.check(TokenKind::Chigaeba) {
            let chigaeba = self.get();
            let (branch, form) = self.scoped(|p| p.read_if_branch()).map_err(|e| {
                self.wrap(e, "『違えば』の中で以下のエラーがありました。", chigaeba.line)
            })?;
            block_form = form;
            false_block = Some(Box::new(branch));
        }

        // 最後に読んだ節がブロック形式なら『ここまで』で閉じる
        if block_form {
            if !self.check(TokenKind::KokoMade) {
                return Err(self.error("『もし』文で『ここまで』がありません。", line));
            }
            self.get();
        }

        Ok(Node::new(
            NodeKind::If {
                expr: Box::new(cond),
                block: Box::new(block),
                false_block,
            },
            line,
            "",
        ))
    }

    /// `逐次実行 ⏎ 先に… 次に… ここまで`
    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn read_promise(&mut self) -> NakoResult<Node> {
        let tikuji = self.get();
        if !self.check(TokenKind::Eol) {
            return Err(self.error("『逐次実行』の直後は改行が必要です", tikuji.line));
        }
        self.skip_eols();

        let mut blocks = Vec::new();
        while self.check_types(&[TokenKind::First, TokenKind::Next]) {
            let step = self.get();
            let keyword = format!("{}に", step.text());
            if self.check(TokenKind::Comma) {
                self.get();
            }
            let block = if self.check(TokenKind::Eol) {
                let block = self
                    .scoped(|p| p.read_block())
                    .map_err(|e| {
                        self.wrap(
                            e,
                            format!("『{}』の中で以下のエラーがありました。", keyword),
                            step.line,
                        )
                    })?;
                if !self.check(TokenKind::KokoMade) {
                    return Err(self.error(
                        format!("『{}』...『ここまで』を対応させてください。", keyword),
                        step.line,
                    ));
                }
                self.get();
                block
            } else {
                let line = step.line;
                self.scoped(|p| p.read_sentence())
                    .map_err(|e| {
                        self.wrap(
                            e,
                            format!("『{}』の中で以下のエラーがありました。", keyword),
                            line,
                        )
                    })?
                    .unwrap_or_else(|| Node::block(Vec::new(), line))
            };
            blocks.push(block);
            self.skip_eols();
        }

        if !self.check(TokenKind::KokoMade) {
            return Err(self.error(
                "『逐次実行』...『ここまで』を対応させてください。",
                tikuji.line,
            ));
        }
        self.get();
        Ok(Node::new(NodeKind::Promise { blocks }, tikuji.line, ""))
    }

    /// `エラー監視 … エラーならば … ここまで`
    #[tracing::instrument(level = "trace", skip(self))]
    pub(super) fn read_try_except(&mut self) -> NakoResult<Node> {
        let kansi = self.get();
        let line = kansi.line;
        let block = self
            .scoped(|p| p.read_block())
            .map_err(|e| self.wrap(e, "『エラー監視』の中で以下のエラーがありました。", line))?;

        if !self.check_seq(&[&[TokenKind::OnError], &[TokenKind::Then]]) {
            return Err(self.error(
                "エラー構文で『エラーならば』がありません。『エラー監視..エラーならば..ここまで』を対で記述します。",
                line,
            ));
        }
        self.get();
        self.get();

        let err_block = self
            .scoped(|p| p.read_block())
            .map_err(|e| self.wrap(e, "『エラーならば』の中で以下のエラーがありました。", line))?;
        if !self.check(TokenKind::KokoMade) {
            return Err(self.error(
                "『エラー監視』...『ここまで』を対応させてください。",
                line,
            ));
        }
        self.get();

        Ok(Node::new(
            NodeKind::TryExcept {
                block: Box::new(block),
                err_block: Box::new(err_block),
            },
            line,
            "",
        ))
    }

    /// Body of a loop. Block form (`ここから` or a line break next) must be closed by
    /// `ここまで`; otherwise the rest of the line is the body.
    fn read_body(&mut self, keyword: &str, line: u32) -> NakoResult<Node> {
        let multiline = self.check_types(&[TokenKind::KokoKara, TokenKind::Eol]);
        if multiline || self.check(TokenKind::Comma) {
            self.get();
        }
        self.scoped(|p| {
            if !multiline {
                let line = p.peek().line;
                return Ok(p
                    .read_sentence()?
                    .unwrap_or_else(|| Node::block(Vec::new(), line)));
            }
            let block = p.read_block()?;
            if !p.check(TokenKind::KokoMade) {
                return Err(p.error(
                    format!("『{}』...『ここまで』を対応させてください。", keyword),
                    line,
                ));
            }
            p.get();
            Ok(block)
        })
        .map_err(|e| {
            self.wrap(
                e,
                format!("『{}』の中で以下のエラーがありました。", keyword),
                line,
            )
        })
    }

    /// `N回 …`; without a count the loop repeats `それ` times.
    pub(super) fn read_repeat_times(&mut self) -> NakoResult<Node> {
        let kai = self.get();
        let value = self
            .pop_stack::<&str>(&[])
            .unwrap_or_else(|| Node::word("それ", kai.line));
        let block = self.read_body("回", kai.line)?;
        Ok(Node::new(
            NodeKind::RepeatTimes {
                value: Box::new(value),
                block: Box::new(block),
            },
            kai.line,
            "",
        ))
    }

    /// `条件の間 ⏎ … ここまで`
    pub(super) fn read_while(&mut self) -> NakoResult<Node> {
        let aida = self.get();
        let cond = self
            .pop_stack::<&str>(&[])
            .ok_or_else(|| self.error("『間』で条件がありません。", aida.line))?;
        if !self.check_types(&[TokenKind::KokoKara, TokenKind::Eol]) {
            return Err(self.error("『間』の直後は改行が必要です", aida.line));
        }
        let block = self.read_body("間", aida.line)?;
        Ok(Node::new(
            NodeKind::While {
                cond: Box::new(cond),
                block: Box::new(block),
            },
            aida.line,
            "",
        ))
    }

    /// `[Iを]AからBまで繰り返す`
    pub(super) fn read_for(&mut self) -> NakoResult<Node> {
        let kurikaesu = self.get();
        let to = self.pop_stack(&["まで"]);
        let from = self.pop_stack(&["から"]);
        let word = self.pop_stack(&["を", "で"]);
        let (Some(from), Some(to)) = (from, to) else {
            return Err(self.error(
                "『繰り返す』文でAからBまでの指定がありません。",
                kurikaesu.line,
            ));
        };
        let block = self.read_body("繰り返す", kurikaesu.line)?;
        Ok(Node::new(
            NodeKind::For {
                from: Box::new(from),
                to: Box::new(to),
                word: word.map(Box::new),
                block: Box::new(block),
            },
            kurikaesu.line,
            "",
        ))
    }

    /// `[Iで][Aを]反復`
    pub(super) fn read_foreach(&mut self) -> NakoResult<Node> {
        let hanpuku = self.get();
        let target = self.pop_stack(&["を"]);
        let name = self.pop_stack(&["で"]);
        let block = self.read_body("反復", hanpuku.line)?;
        Ok(Node::new(
            NodeKind::Foreach {
                name: name.map(Box::new),
                target: target.map(Box::new),
                block: Box::new(block),
            },
            hanpuku.line,
            "",
        ))
    }

    pub(super) fn read_return(&mut self) -> NakoResult<Node> {
        let modoru = self.get();
        let value = self.pop_stack(&["で", "を"]);
        Ok(Node::new(
            NodeKind::Return {
                value: value.map(Box::new),
            },
            modoru.line,
            "",
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analyzer::parse_source,
        ast::{Node, NodeKind, Operator},
        error::NakoError,
    };

    fn first(src: &str) -> Node {
        match parse_source(src).unwrap().kind {
            NodeKind::Block { block } => block
                .into_iter()
                .find(|n| !matches!(n.kind, NodeKind::Eol { .. }))
                .unwrap(),
            other => panic!("unexpected root {:?}", other),
        }
    }

    #[test]
    fn test_if_compare() {
        let node = first("もしAが5ならば「OK」を表示");
        match node.kind {
            NodeKind::If { expr, false_block, .. } => {
                assert!(matches!(expr.kind, NodeKind::Op { operator: Operator::Eq, .. }));
                assert!(false_block.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_negative() {
        let node = first("もしAが5でなければ「NG」を表示");
        assert!(matches!(node.kind, NodeKind::If { expr, .. }
            if matches!(expr.kind, NodeKind::Op { operator: Operator::NotEq, .. })));

        let node = first("もしAでなければ「NG」を表示");
        assert!(matches!(node.kind, NodeKind::If { expr, .. }
            if matches!(expr.kind, NodeKind::Not { .. })));
    }

    #[test]
    fn test_if_block_with_else() {
        let src = "もしA>1ならば\n  「大」を表示\n違えば\n  「小」を表示\nここまで\n";
        let node = first(src);
        match node.kind {
            NodeKind::If { expr, block, false_block } => {
                assert!(matches!(expr.kind, NodeKind::Op { operator: Operator::Gt, .. }));
                assert!(matches!(block.kind, NodeKind::Block { .. }));
                assert!(false_block.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_missing_kokomade() {
        let err = parse_source("もしA>1ならば\n「大」を表示\n").unwrap_err();
        assert!(matches!(&err, NakoError::Syntax { line: 1, .. }));
        assert!(err.message().contains("『ここまで』がありません"));
    }

    #[test]
    fn test_if_without_then() {
        let err = parse_source("もしA>1\n「大」を表示\nここまで").unwrap_err();
        assert!(err.message().contains("『もし』文の条件"));
        assert!(err.root_cause().message().contains("『ならば』がないか"));
    }

    #[test]
    fn test_repeat_times() {
        let node = first("3回\n  「a」を表示\nここまで");
        assert!(matches!(node.kind, NodeKind::RepeatTimes { value, .. }
            if matches!(value.kind, NodeKind::Number { value } if value == 3.0)));

        // 回数がなければ「それ」
        let node = first("回、「a」を表示");
        assert!(matches!(node.kind, NodeKind::RepeatTimes { value, .. }
            if matches!(&value.kind, NodeKind::Word { value } if value == "それ")));
    }

    #[test]
    fn test_repeat_missing_kokomade() {
        let err = parse_source("3回\n「a」を表示\n").unwrap_err();
        assert!(err.to_string().contains("『回』...『ここまで』を対応させてください。"));
    }

    #[test]
    fn test_while() {
        let node = first("A<3の間\n  Aに1を足す\nここまで");
        assert!(matches!(node.kind, NodeKind::While { cond, .. }
            if matches!(cond.kind, NodeKind::Op { operator: Operator::Lt, .. })));

        let err = parse_source("A<3の間、「a」を表示").unwrap_err();
        assert!(err.message().contains("改行が必要"));
    }

    #[test]
    fn test_for() {
        let node = first("Iを1から10まで繰り返す\n  Iを表示\nここまで");
        match node.kind {
            NodeKind::For { from, to, word, .. } => {
                assert!(matches!(from.kind, NodeKind::Number { value } if value == 1.0));
                assert!(matches!(to.kind, NodeKind::Number { value } if value == 10.0));
                assert!(matches!(word.map(|w| w.kind), Some(NodeKind::Word { value }) if value == "I"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = parse_source("1から繰り返す\nここまで").unwrap_err();
        assert!(err.message().contains("AからBまでの指定がありません"));
    }

    #[test]
    fn test_foreach() {
        let node = first("[1,2,3]を反復\n  対象を表示\nここまで");
        assert!(matches!(node.kind, NodeKind::Foreach { name: None, target: Some(t), .. }
            if matches!(t.kind, NodeKind::JsonArray { .. })));
    }

    #[test]
    fn test_return() {
        let node = first("5で戻る");
        assert!(matches!(node.kind, NodeKind::Return { value: Some(v) }
            if matches!(v.kind, NodeKind::Number { .. })));
        let node = first("戻る");
        assert!(matches!(node.kind, NodeKind::Return { value: None }));
    }

    #[test]
    fn test_try_except() {
        let node = first("エラー監視\n  「a」を表示\nエラーならば\n  「b」を表示\nここまで");
        assert!(matches!(node.kind, NodeKind::TryExcept { .. }));

        let err = parse_source("エラー監視\n「a」を表示\nここまで").unwrap_err();
        assert!(err.message().contains("『エラーならば』がありません"));
    }

    #[test]
    fn test_promise() {
        let src = "逐次実行\n  先に、「a」を表示\n  次に\n    「b」を表示\n  ここまで\nここまで";
        let node = first(src);
        assert!(matches!(node.kind, NodeKind::Promise { blocks } if blocks.len() == 2));

        let err = parse_source("逐次実行\n先に、「a」を表示\n").unwrap_err();
        assert!(err.message().contains("『逐次実行』...『ここまで』"));
    }
}
