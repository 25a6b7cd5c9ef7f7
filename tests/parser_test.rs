use nako_front::{
    Compiler, ErrorKind, FunctionSignature, NakoConfig, Node, NodeKind, Operator, TokenKind,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    // テストの前に一度だけ実行したい処理
    // tracing_subscriberの初期化
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn compiler() -> Compiler {
    let mut compiler = Compiler::new();
    compiler.add_function("表示", FunctionSignature::from_josi(&[&["を", "と"]]));
    compiler.add_function("足", FunctionSignature::from_josi(&[&["に", "と"], &["を"]]));
    compiler.add_function("掛", FunctionSignature::from_josi(&[&["に", "と"], &["を"]]));
    compiler
}

/// Top-level statements without the end-of-line markers.
fn statements(src: &str) -> Vec<Node> {
    match compiler().parse(src).unwrap().kind {
        NodeKind::Block { block } => block
            .into_iter()
            .filter(|n| !matches!(n.kind, NodeKind::Eol { .. }))
            .collect(),
        other => panic!("unexpected root {:?}", other),
    }
}

fn call_args(node: &Node) -> Vec<Option<(String, String)>> {
    match &node.kind {
        NodeKind::Func { args, .. } => args
            .iter()
            .map(|a| a.as_ref().map(|n| (n.describe(), n.josi.clone())))
            .collect(),
        other => panic!("not a call: {:?}", other),
    }
}

#[test]
fn it_parse_display_three() {
    let json = compiler().parse_to_json("3を表示").unwrap();
    assert_eq!(
        json,
        json!({
            "type": "block",
            "line": 0,
            "josi": "",
            "block": [
                {
                    "type": "func",
                    "name": "表示",
                    "line": 0,
                    "josi": "",
                    "args": [{"type": "number", "value": 3.0, "line": 0, "josi": "を"}]
                },
                {"type": "eol", "comment": "", "line": 0, "josi": ""}
            ]
        })
    );
}

#[test]
fn it_resolves_arguments_by_particle() {
    let nodes = statements("●(aをbで)HOGE\nここまで\n1を2でHOGE\n2で1をHOGE");
    assert!(matches!(&nodes[0].kind, NodeKind::DefFunc { name, .. } if name == "HOGE"));

    let expected = vec![
        Some(("『1』".to_string(), "を".to_string())),
        Some(("『2』".to_string(), "で".to_string())),
    ];
    assert_eq!(call_args(&nodes[1]), expected);
    assert_eq!(call_args(&nodes[2]), expected);
}

#[test]
fn it_calls_before_definition() {
    let nodes = statements("1を2でHOGE\n●(aをbで)HOGE\nここまで");
    assert!(nodes[0].is_func());
}

proptest! {
    #[test]
    fn particle_order_does_not_change_arguments(a in 0u32..10000, b in 0u32..10000, swap: bool) {
        let src = if swap {
            format!("{}を{}に足す", b, a)
        } else {
            format!("{}に{}を足す", a, b)
        };
        let nodes = statements(&src);
        prop_assert_eq!(
            call_args(&nodes[0]),
            vec![
                Some((format!("『{}』", a), "に".to_string())),
                Some((format!("『{}』", b), "を".to_string())),
            ]
        );
    }

    #[test]
    fn negative_literal_after_operator(n in 1u32..10000) {
        let nodes = statements(&format!("A = 1 * -{}", n));
        let NodeKind::Let { value, .. } = &nodes[0].kind else {
            panic!("not a let");
        };
        let NodeKind::Op { operator, right, .. } = &value.kind else {
            panic!("not an operation");
        };
        prop_assert_eq!(*operator, Operator::Mul);
        let is_negated = matches!(right.kind, NodeKind::Number { value } if value == -(n as f64));
        prop_assert!(is_negated);
    }
}

#[test]
fn it_parses_precedence() {
    let json = compiler().parse_to_json("A = 1 + 2 * 3").unwrap();
    let value = &json["block"][0]["value"];
    assert_eq!(value["operator"], "+");
    assert_eq!(value["left"]["value"], 1.0);
    assert_eq!(value["right"]["operator"], "*");
}

#[test]
fn it_scopes_operands_in_parens() {
    // 括弧の外の「5を」は外側の「足す」が受け取る
    let nodes = statements("5を(1に2を足す)に足す");
    assert_eq!(nodes.len(), 1);
    let NodeKind::Func { name, args, .. } = &nodes[0].kind else {
        panic!("not a call");
    };
    assert_eq!(name, "足");
    let inner = args[0].as_ref().unwrap();
    assert_eq!(inner.josi, "に");
    assert_eq!(
        call_args(inner),
        vec![
            Some(("『1』".to_string(), "に".to_string())),
            Some(("『2』".to_string(), "を".to_string())),
        ]
    );
    assert_eq!(
        call_args(&nodes[0])[1],
        Some(("『5』".to_string(), "を".to_string()))
    );
}

#[test]
fn it_rejects_stranded_operands() {
    for src in ["1と2を表示", "1と2を表示\n表示", "3回、1と2を表示"] {
        let err = compiler().parse(src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "{}", src);
        assert!(
            err.root_cause().message().contains("『1』がありますが文が解決していません。"),
            "{} => {}",
            src,
            err
        );
        assert_eq!(err.root_cause().line(), 1);
    }
}

#[test]
fn it_handles_minus() {
    let nodes = statements("-3を表示");
    assert_eq!(call_args(&nodes[0]), vec![Some(("『-3』".to_string(), "を".to_string()))]);

    let nodes = statements("A = 5 - 3");
    assert!(matches!(&nodes[0].kind, NodeKind::Let { value, .. }
        if matches!(value.kind, NodeKind::Op { operator: Operator::Sub, .. })));

    // 語句の前の符号は -1 との積になる
    let nodes = statements("A = 2 * -B");
    let NodeKind::Let { value, .. } = &nodes[0].kind else {
        panic!("not a let");
    };
    let NodeKind::Op { right, .. } = &value.kind else {
        panic!("not an operation");
    };
    assert!(matches!(&right.kind, NodeKind::Op { operator: Operator::Mul, left, .. }
        if matches!(left.kind, NodeKind::Number { value } if value == -1.0)));
}

#[test]
fn it_chains_continuation_calls() {
    let nodes = statements("1に2を足して3を掛けて表示");
    let NodeKind::Block { block } = &nodes[0].kind else {
        panic!("not a block");
    };
    assert_eq!(block.len(), 2);
    assert!(matches!(&block[0].kind, NodeKind::Func { name, .. } if name == "足"));
    assert_eq!(block[0].josi, "して");

    let NodeKind::Block { block: rest } = &block[1].kind else {
        panic!("not a block");
    };
    assert!(matches!(&rest[0].kind, NodeKind::Func { name, .. } if name == "掛"));
    // 省略された引数は「それ」で補われる
    assert_eq!(
        call_args(&rest[0]),
        vec![None, Some(("『3』".to_string(), "を".to_string()))]
    );
    assert!(matches!(&rest[1].kind, NodeKind::Func { name, .. } if name == "表示"));
}

#[test]
fn it_keeps_comments_on_eol() {
    let root = compiler().parse("3を表示 # 表示する\n/* 範囲 */4を表示").unwrap();
    let NodeKind::Block { block } = root.kind else {
        panic!("not a block");
    };
    let comments: Vec<String> = block
        .iter()
        .filter_map(|n| match &n.kind {
            NodeKind::Eol { comment } => Some(comment.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(comments, vec!["表示する".to_string(), "範囲".to_string()]);
}

#[test]
fn it_requires_kokomade() {
    let cases = [
        ("●F\n1を表示\n", "『ここまで』がありません。関数定義の末尾に必要です。"),
        ("もしAならば\n1を表示\n", "『もし』文で『ここまで』がありません。"),
        ("3回\n1を表示\n", "『回』...『ここまで』を対応させてください。"),
        ("A<3の間\n1を表示\n", "『間』...『ここまで』を対応させてください。"),
        ("Iを1から3まで繰り返す\n1を表示\n", "『繰り返す』...『ここまで』を対応させてください。"),
        ("[1,2]を反復\n1を表示\n", "『反復』...『ここまで』を対応させてください。"),
        (
            "エラー監視\n1を表示\nエラーならば\n2を表示\n",
            "『エラー監視』...『ここまで』を対応させてください。",
        ),
        ("逐次実行\n先に\n1を表示\n", "『先に』...『ここまで』を対応させてください。"),
        ("F = 関数\n1を表示\n", "『関数』...『ここまで』を対応させてください。"),
    ];
    for (src, expected) in cases {
        let err = compiler().parse(src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "{}", src);
        assert!(err.to_string().contains(expected), "{} => {}", src, err);
    }
}

#[test]
fn it_wraps_errors_with_construct() {
    let src = "●倍増\n  1を\nここまで";
    let err = compiler().parse(src).unwrap_err();
    assert_eq!(err.line(), 1);
    assert_eq!(err.breadcrumbs().len(), 2);
    assert_eq!(err.breadcrumbs()[0], "関数『倍増』の定義で以下のエラーがありました。");
    assert_eq!(err.root_cause().line(), 2);
}

#[test]
fn it_offsets_lines_from_config() {
    let config = NakoConfig {
        start_line: 10,
        ..NakoConfig::default()
    };
    let mut compiler = Compiler::with_config(config);
    let err = compiler.parse("A = 1\nB = ").unwrap_err();
    assert_eq!(err.line(), 12);
}

#[test]
fn it_loads_signatures_from_config() {
    let config = NakoConfig::from_json_str(
        r#"{"functions": {"音量": {"josi": [["を"]]}, "表示": {"josi": [["を", "と"]]}}}"#,
    )
    .unwrap();
    let mut compiler = Compiler::with_config(config);
    let root = compiler.parse("音量 = 5\n音量を表示").unwrap();
    let NodeKind::Block { block } = root.kind else {
        panic!("not a block");
    };
    assert!(matches!(&block[0].kind, NodeKind::Func { setter: true, .. }));
}

#[test]
fn it_passes_function_pointers() {
    let src = "●({関数}fを)実行\nここまで\n表示を実行";
    let nodes = statements(src);
    let NodeKind::Func { args, .. } = &nodes[1].kind else {
        panic!("not a call");
    };
    assert!(matches!(&args[0], Some(n) if matches!(&n.kind, NodeKind::FuncPointer { name } if name == "表示")));

    let err = compiler()
        .parse("●({関数}fを)実行\nここまで\n3を実行")
        .unwrap_err();
    assert!(err.message().contains("関数『実行』の引数『f』には関数オブジェクトが必要です。"));
}

#[test]
fn it_parses_if_to_json() {
    let json = compiler()
        .parse_to_json("もしAが1ならば\n「A」を表示\n違えば\n「B」を表示\nここまで")
        .unwrap();
    let node = &json["block"][0];
    assert_eq!(node["type"], "if");
    assert_eq!(node["expr"]["operator"], "eq");
    assert_eq!(node["false_block"]["type"], "block");
}

#[test]
fn it_reports_lex_errors() {
    let err = compiler().parse("A = 「あいう").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert!(err.to_string().starts_with("[字句解析エラー]"));
}

#[test]
fn it_reads_cotoha_sentences() {
    let json = r#"[{"chunks": [
        {"chunk_info": {"id": 0, "head": 1, "links": []},
         "tokens": [{"id": 0, "form": "3", "lemma": "3", "pos": "Number", "features": []}]},
        {"chunk_info": {"id": 1, "head": -1, "links": []},
         "tokens": [{"id": 1, "form": "書く", "lemma": "書く", "pos": "動詞語幹", "features": []}]}
    ]}]"#;
    let sentences = compiler().lex_cotoha(json).unwrap();
    assert_eq!(sentences.len(), 1);
    let kinds: Vec<TokenKind> = sentences[0].iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Func]);
    assert_eq!(sentences[0][1].text(), "書く");
}
