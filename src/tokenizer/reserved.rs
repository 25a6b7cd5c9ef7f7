use super::token::TokenKind;

/// Maps a (送り仮名を除いた) word to the keyword it stands for.
pub fn reserved_kind(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "回" | "回繰返" => TokenKind::RepeatTimes,
        "間" | "間繰返" => TokenKind::While,
        "繰返" => TokenKind::For,
        "反復" => TokenKind::Foreach,
        "抜" => TokenKind::Break,
        "続" => TokenKind::Continue,
        "戻" => TokenKind::Return,
        "代入" => TokenKind::Assign,
        "逐次実行" => TokenKind::Sequential,
        "先" => TokenKind::First,
        "次" => TokenKind::Next,
        "取込" => TokenKind::Include,
        "エラー監視" => TokenKind::ErrorGuard,
        "エラー" => TokenKind::OnError,
        "変数" => TokenKind::Var,
        "定数" => TokenKind::Const,
        "関数" => TokenKind::DefFunc,
        "それ" | "そう" => TokenKind::Word,
        _ => return None,
    };
    Some(kind)
}

/// `そう` is another spelling of the implicit `それ`.
pub fn canonical_word(word: &str) -> &str {
    if word == "そう" {
        "それ"
    } else {
        word
    }
}
