//! Alternate ingestion path: maps a dependency-parse result (sentences made of
//! chunks, each chunk made of morphemes) onto the ordinary token shape.
//!
//! Every token produced here is on line 0; the input format carries no line
//! information and the rewrite passes are not applied.

use serde::Deserialize;

use super::token::{Token, TokenKind, TokenValue};
use crate::error::NakoResult;

#[derive(Debug, Clone, Deserialize)]
pub struct Sentence {
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chunk {
    pub chunk_info: ChunkInfo,
    pub tokens: Vec<Morpheme>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkInfo {
    pub id: i64,
    #[serde(default = "default_head")]
    pub head: i64,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub link: i64,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Morpheme {
    pub id: i64,
    pub form: String,
    pub lemma: String,
    pub pos: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub dependency_labels: Vec<DependencyLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DependencyLabel {
    pub token_id: i64,
    pub label: String,
}

fn default_head() -> i64 {
    -1
}

const ADJECTIVALS: &str = "adjectivals";

impl Morpheme {
    fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    fn is_noun(&self) -> bool {
        matches!(self.pos.as_str(), "名詞" | "独立詞")
    }
}

impl Sentence {
    fn chunk(&self, id: i64) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.chunk_info.id == id)
    }

    /// True when the chunk's head consumes it as an adjectival modifier.
    fn is_adjectival_dependent(&self, chunk: &Chunk) -> bool {
        if chunk.chunk_info.head < 0 {
            return false;
        }
        self.chunk(chunk.chunk_info.head)
            .and_then(|head| {
                head.chunk_info
                    .links
                    .iter()
                    .find(|l| l.link == chunk.chunk_info.id)
            })
            .map(|l| l.label == ADJECTIVALS)
            .unwrap_or(false)
    }
}

#[tracing::instrument(level = "debug", skip(json))]
pub fn tokens_from_cotoha(json: &str) -> NakoResult<Vec<Vec<Token>>> {
    let sentences: Vec<Sentence> = serde_json::from_str(json)?;
    Ok(sentences.iter().map(sentence_tokens).collect())
}

fn sentence_tokens(sentence: &Sentence) -> Vec<Token> {
    let mut result = Vec::new();
    for chunk in &sentence.chunks {
        if let Some(token) = chunk_token(sentence, chunk) {
            result.push(token);
        }
    }
    result
}

fn chunk_token(sentence: &Sentence, chunk: &Chunk) -> Option<Token> {
    let token = |kind, value| Some(Token::new(kind, value, 0, ""));

    // 開括弧から閉括弧までを文字列リテラルとする
    if chunk.tokens.iter().any(|t| t.has_feature("開括弧")) {
        let text: String = chunk
            .tokens
            .iter()
            .skip_while(|t| !t.has_feature("開括弧"))
            .skip(1)
            .take_while(|t| !t.has_feature("閉括弧"))
            .map(|t| t.form.as_str())
            .collect();
        return token(TokenKind::String, TokenValue::Text(text));
    }

    if let Some(stem) = chunk.tokens.iter().find(|t| t.pos == "動詞語幹") {
        return token(TokenKind::Func, TokenValue::text(stem.lemma.clone()));
    }

    // 動作を表す名詞 + 動詞接尾辞 (例: 表示 + する)
    if let Some(action) = chunk.tokens.iter().find(|t| t.has_feature("動作")) {
        let has_suffix = action.dependency_labels.iter().any(|d| {
            chunk
                .tokens
                .iter()
                .find(|t| t.id == d.token_id)
                .map(|t| t.pos == "動詞接尾辞")
                .unwrap_or(false)
        });
        if has_suffix {
            return token(TokenKind::Func, TokenValue::text(action.lemma.clone()));
        }
    }

    if chunk.tokens.iter().any(Morpheme::is_noun) {
        if sentence.is_adjectival_dependent(chunk) {
            return None;
        }
        let mut value = String::new();
        for link in chunk.chunk_info.links.iter().filter(|l| l.label == ADJECTIVALS) {
            if let Some(modifier) = sentence.chunk(link.link) {
                value.extend(modifier.tokens.iter().map(|t| t.form.as_str()));
            }
        }
        for t in &chunk.tokens {
            if t.is_noun() || t.pos == "名詞接尾辞" {
                value.push_str(&t.form);
            } else if !value.is_empty() {
                break;
            }
        }
        return token(TokenKind::Word, TokenValue::Text(value));
    }

    if let Some(number) = chunk.tokens.iter().find(|t| t.pos == "Number") {
        return match number.lemma.parse::<f64>() {
            Ok(n) => token(TokenKind::Number, TokenValue::Number(n)),
            Err(_) => {
                tracing::debug!("skip non-numeric number chunk: {}", number.lemma);
                None
            }
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {"chunks": [
        {"chunk_info": {"id": 0, "head": 1, "links": []},
         "tokens": [
           {"id": 0, "form": "赤い", "lemma": "赤い", "pos": "形容詞語幹", "features": []}
         ]},
        {"chunk_info": {"id": 1, "head": 3, "links": [{"link": 0, "label": "adjectivals"}]},
         "tokens": [
           {"id": 1, "form": "花", "lemma": "花", "pos": "名詞", "features": []},
           {"id": 2, "form": "を", "lemma": "を", "pos": "格助詞", "features": []}
         ]},
        {"chunk_info": {"id": 2, "head": 3, "links": []},
         "tokens": [
           {"id": 3, "form": "「", "lemma": "「", "pos": "括弧", "features": ["開括弧"]},
           {"id": 4, "form": "こんにちは", "lemma": "こんにちは", "pos": "独立詞", "features": []},
           {"id": 5, "form": "」", "lemma": "」", "pos": "括弧", "features": ["閉括弧"]}
         ]},
        {"chunk_info": {"id": 3, "head": -1, "links": []},
         "tokens": [
           {"id": 6, "form": "表示", "lemma": "表示", "pos": "名詞", "features": ["動作"],
            "dependency_labels": [{"token_id": 7, "label": "aux"}]},
           {"id": 7, "form": "する", "lemma": "する", "pos": "動詞接尾辞", "features": []}
         ]},
        {"chunk_info": {"id": 4, "head": -1, "links": []},
         "tokens": [
           {"id": 8, "form": "3", "lemma": "3", "pos": "Number", "features": []}
         ]}
      ]}
    ]"#;

    #[test]
    fn test_categories() {
        let sentences = tokens_from_cotoha(SAMPLE).unwrap();
        assert_eq!(sentences.len(), 1);
        let tokens = &sentences[0];
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        // 連体修飾の塊は名詞側に吸収される
        assert_eq!(
            kinds,
            vec![TokenKind::Word, TokenKind::String, TokenKind::Func, TokenKind::Number]
        );
        assert_eq!(tokens[0].text(), "赤い花");
        assert_eq!(tokens[1].text(), "こんにちは");
        assert_eq!(tokens[2].text(), "表示");
        assert_eq!(tokens[3].value, TokenValue::Number(3.0));
        assert!(tokens.iter().all(|t| t.line == 0));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            tokens_from_cotoha("{"),
            Err(crate::error::NakoError::Analysis(_))
        ));
    }
}
