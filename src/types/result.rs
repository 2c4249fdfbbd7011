use serde::Serialize;

/// 保存時にスキップされた件数の内訳
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    /// 正規化リンクが既存と重複
    pub duplicate_link: usize,
    /// リンクなしで、タイトル+日付が既存と重複
    pub duplicate_title_date: usize,
    /// タイトルもリンクもないエントリ
    pub no_link_no_title: usize,
    /// リンクも日付もなく重複判定キーを作れないエントリ
    pub missing_key: usize,
}

impl std::fmt::Display for SkipCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "リンク重複{}件、タイトル+日付重複{}件、タイトル/リンクなし{}件、キーなし{}件",
            self.duplicate_link, self.duplicate_title_date, self.no_link_no_title, self.missing_key
        )
    }
}

/// 削除系メンテナンス操作の結果
/// 対象件数と実際に削除した件数を記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// 削除対象として選ばれた件数
    pub matched: usize,
    /// 実際に削除された件数（dry-runでは0）
    pub deleted: usize,
    pub dry_run: bool,
}

impl DeleteResult {
    pub fn new(matched: usize, deleted: usize, dry_run: bool) -> Self {
        Self {
            matched,
            deleted,
            dry_run,
        }
    }

    /// ドメイン名を指定して表示用の文字列を生成
    pub fn display_with_domain(&self, domain_name: &str) -> String {
        if self.dry_run {
            format!(
                "{}(dry-run): 削除対象{}件、削除は行っていません",
                domain_name, self.matched
            )
        } else {
            format!(
                "{}処理完了: 削除対象{}件、削除{}件",
                domain_name, self.matched, self.deleted
            )
        }
    }
}

impl std::fmt::Display for DeleteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_with_domain("削除"))
    }
}
