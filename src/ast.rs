use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::{
    funclist::FunctionSignature,
    tokenizer::token::{format_number, Token, TokenKind, TokenValue},
};

// 構文木のノード。すべてのノードが行番号と助詞を持つ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub line: u32,
    pub josi: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Block {
        block: Vec<Node>,
    },
    If {
        expr: Box<Node>,
        block: Box<Node>,
        false_block: Option<Box<Node>>,
    },
    While {
        cond: Box<Node>,
        block: Box<Node>,
    },
    For {
        from: Box<Node>,
        to: Box<Node>,
        word: Option<Box<Node>>,
        block: Box<Node>,
    },
    Foreach {
        name: Option<Box<Node>>,
        target: Option<Box<Node>>,
        block: Box<Node>,
    },
    RepeatTimes {
        value: Box<Node>,
        block: Box<Node>,
    },
    TryExcept {
        block: Box<Node>,
        err_block: Box<Node>,
    },
    // 逐次実行
    Promise {
        blocks: Vec<Node>,
    },
    Func {
        name: String,
        args: Vec<Option<Node>>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        setter: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<FunctionSignature>,
    },
    FuncPointer {
        name: String,
    },
    Op {
        operator: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Not {
        value: Box<Node>,
    },
    // XしてY
    Renbun {
        left: Box<Node>,
        right: Box<Node>,
    },
    Let {
        name: String,
        value: Box<Node>,
    },
    LetArray {
        name: String,
        index: Vec<Node>,
        value: Box<Node>,
    },
    DefLocalVar {
        name: String,
        vartype: VarType,
        value: Option<Box<Node>>,
    },
    DefFunc {
        name: String,
        args: Vec<Node>,
        block: Box<Node>,
        meta: FunctionSignature,
    },
    DefTest {
        name: String,
        args: Vec<Node>,
        block: Box<Node>,
        meta: FunctionSignature,
    },
    // 無名関数
    FuncObj {
        args: Vec<Node>,
        block: Box<Node>,
        meta: FunctionSignature,
    },
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Word {
        value: String,
    },
    RefArray {
        name: String,
        index: Vec<Node>,
    },
    JsonArray {
        value: Vec<Node>,
    },
    JsonObj {
        value: Vec<JsonPair>,
    },
    Require {
        value: String,
    },
    Break,
    Continue,
    Return {
        value: Option<Box<Node>>,
    },
    Eol {
        comment: String,
    },
    EmbedCode {
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonPair {
    pub key: Node,
    pub value: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr)]
pub enum VarType {
    #[serde(rename = "変数")]
    #[strum(serialize = "変数")]
    Var,
    #[serde(rename = "定数")]
    #[strum(serialize = "定数")]
    Const,
}

// 二項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr)]
pub enum Operator {
    #[serde(rename = "and")]
    #[strum(serialize = "and")]
    And,
    #[serde(rename = "or")]
    #[strum(serialize = "or")]
    Or,
    #[serde(rename = "eq")]
    #[strum(serialize = "eq")]
    Eq,
    #[serde(rename = "noteq")]
    #[strum(serialize = "noteq")]
    NotEq,
    #[serde(rename = "gt")]
    #[strum(serialize = "gt")]
    Gt,
    #[serde(rename = "gteq")]
    #[strum(serialize = "gteq")]
    GtEq,
    #[serde(rename = "lt")]
    #[strum(serialize = "lt")]
    Lt,
    #[serde(rename = "lteq")]
    #[strum(serialize = "lteq")]
    LtEq,
    #[serde(rename = "&")]
    #[strum(serialize = "&")]
    Concat,
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Add,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Sub,
    #[serde(rename = "*")]
    #[strum(serialize = "*")]
    Mul,
    #[serde(rename = "/")]
    #[strum(serialize = "/")]
    Div,
    #[serde(rename = "%")]
    #[strum(serialize = "%")]
    Mod,
    #[serde(rename = "^")]
    #[strum(serialize = "^")]
    Pow,
}

impl Operator {
    pub fn from_token_kind(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::And => Operator::And,
            TokenKind::Or => Operator::Or,
            TokenKind::Eq => Operator::Eq,
            TokenKind::NotEq => Operator::NotEq,
            TokenKind::Gt => Operator::Gt,
            TokenKind::GtEq => Operator::GtEq,
            TokenKind::Lt => Operator::Lt,
            TokenKind::LtEq => Operator::LtEq,
            TokenKind::Concat => Operator::Concat,
            TokenKind::Plus => Operator::Add,
            TokenKind::Minus => Operator::Sub,
            TokenKind::Mul => Operator::Mul,
            TokenKind::Div => Operator::Div,
            TokenKind::Mod => Operator::Mod,
            TokenKind::Pow => Operator::Pow,
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength; larger binds tighter.
    pub fn priority(&self) -> u8 {
        match self {
            Operator::And | Operator::Or => 1,
            Operator::Eq
            | Operator::NotEq
            | Operator::Gt
            | Operator::GtEq
            | Operator::Lt
            | Operator::LtEq => 2,
            Operator::Concat => 3,
            Operator::Add | Operator::Sub => 4,
            Operator::Mul | Operator::Div | Operator::Mod => 5,
            Operator::Pow => 6,
        }
    }
}

impl Node {
    pub fn new(kind: NodeKind, line: u32, josi: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            josi: josi.into(),
        }
    }

    pub fn word(value: impl Into<String>, line: u32) -> Self {
        Self::new(
            NodeKind::Word {
                value: value.into(),
            },
            line,
            "",
        )
    }

    pub fn number(value: f64, line: u32) -> Self {
        Self::new(NodeKind::Number { value }, line, "")
    }

    pub fn block(block: Vec<Node>, line: u32) -> Self {
        Self::new(NodeKind::Block { block }, line, "")
    }

    /// Leaf nodes that are read directly off a token.
    pub fn from_token(token: &Token) -> Option<Self> {
        let text = token.text();
        let kind = match token.kind {
            TokenKind::Number => NodeKind::Number {
                value: token.value.as_number().unwrap_or_default(),
            },
            TokenKind::String | TokenKind::StringEx => NodeKind::String { value: text },
            TokenKind::Word | TokenKind::Code => NodeKind::Word { value: text },
            TokenKind::EmbedCode => NodeKind::EmbedCode { value: text },
            TokenKind::Eol => NodeKind::Eol { comment: text },
            _ => return None,
        };
        Some(Self::new(kind, token.line, token.josi.clone()))
    }

    pub fn type_name(&self) -> &'static str {
        (&self.kind).into()
    }

    pub fn is_func(&self) -> bool {
        matches!(self.kind, NodeKind::Func { .. })
    }

    /// `『name』` as used in error messages.
    pub fn describe(&self) -> String {
        let name = match &self.kind {
            NodeKind::Op { operator, .. } => format!("演算子[{}]", operator),
            NodeKind::Func { name, .. }
            | NodeKind::FuncPointer { name }
            | NodeKind::Let { name, .. }
            | NodeKind::LetArray { name, .. }
            | NodeKind::RefArray { name, .. }
            | NodeKind::DefFunc { name, .. }
            | NodeKind::DefTest { name, .. }
            | NodeKind::DefLocalVar { name, .. } => name.clone(),
            NodeKind::Number { value } => format_number(*value),
            NodeKind::String { value }
            | NodeKind::Word { value }
            | NodeKind::EmbedCode { value }
            | NodeKind::Require { value } => value.clone(),
            _ => self.type_name().to_string(),
        };
        format!("『{}』", name)
    }
}

/// `『value』` for a token, the counterpart of [`Node::describe`].
pub fn describe_token(token: &Token) -> String {
    match (&token.kind, &token.value) {
        (TokenKind::Eof, _) => "『ファイルの末尾』".to_string(),
        (TokenKind::Eol, _) => "『改行』".to_string(),
        (_, TokenValue::Text(v)) if v.is_empty() => format!("『{}』", token.kind),
        (_, value) => format!("『{}』", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_table() {
        assert!(Operator::Mul.priority() > Operator::Add.priority());
        assert!(Operator::Add.priority() > Operator::Concat.priority());
        assert!(Operator::Concat.priority() > Operator::Eq.priority());
        assert!(Operator::Eq.priority() > Operator::And.priority());
        assert!(Operator::Pow.priority() > Operator::Mod.priority());
        assert_eq!(Operator::from_token_kind(TokenKind::Minus), Some(Operator::Sub));
        assert_eq!(Operator::from_token_kind(TokenKind::Not), None);
    }

    #[test]
    fn test_node_json_shape() {
        let node = Node::new(
            NodeKind::Op {
                operator: Operator::Add,
                left: Box::new(Node::number(1.0, 0)),
                right: Box::new(Node::word("A", 0)),
            },
            0,
            "を",
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "op");
        assert_eq!(json["operator"], "+");
        assert_eq!(json["josi"], "を");
        assert_eq!(json["right"]["type"], "word");
        assert_eq!(node.type_name(), "op");
    }

    #[test]
    fn test_describe() {
        assert_eq!(Node::number(3.0, 0).describe(), "『3』");
        let op = Node::new(
            NodeKind::Op {
                operator: Operator::Mul,
                left: Box::new(Node::number(1.0, 0)),
                right: Box::new(Node::number(2.0, 0)),
            },
            0,
            "",
        );
        assert_eq!(op.describe(), "『演算子[*]』");
        assert_eq!(Node::new(NodeKind::Break, 0, "").describe(), "『break』");
    }
}
