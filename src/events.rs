//! 画面遷移用のUI状態と画面種別。

/// TUIで現在表示中の画面。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// レコード一覧画面。
    Records,
    /// HOT22ファイルのアップロード画面。
    Upload,
    /// アップロード履歴画面。
    History,
    /// バックエンド統計画面。
    Stats,
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// 一覧テーブルの選択行（ページ内）。
    pub selected: usize,
    /// 画面下部のステータス文言。
    pub status: String,
    /// エラーメッセージ（強調表示用）。
    pub error: Option<String>,
    /// 一覧の取得中フラグ。
    pub loading: bool,
    /// 全件削除の確認待ちフラグ。
    pub confirm_delete: bool,
}

impl UiState {
    /// 初期状態（レコード一覧・未選択）を作る。
    pub fn new() -> Self {
        Self {
            screen: Screen::Records,
            selected: 0,
            status: "Ready".into(),
            error: None,
            loading: false,
            confirm_delete: false,
        }
    }
}
