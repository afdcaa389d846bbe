//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// 全画面共通の3つの領域
pub struct MainLayout {
    /// 画面本体の領域
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// レコード一覧画面の本体領域
pub struct RecordsLayout {
    /// レコードテーブルの領域
    pub table: Rect,
    /// ページ番号フッターの領域
    pub pager: Rect,
    /// 右側のINFOパネルの領域
    pub info_panel: Rect,
}

/// アップロード画面の本体領域
pub struct UploadLayout {
    /// ファイル・状態表示の領域
    pub summary: Rect,
    /// 進捗ゲージの領域
    pub gauge: Rect,
    /// 結果・エラーグループ表示の領域
    pub result: Rect,
}

/// 画面全体を3つの領域に分割（Body + HELP + STATUS）
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Body
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// 一覧画面の本体を3つに分割（テーブル + ページャ + INFOパネル）
pub fn create_records_layout(area: Rect) -> RecordsLayout {
    // まず横方向にテーブル側70% / INFO側30%へ分割する。
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    // テーブル側の下端1行分をページ番号フッターに割り当てる。
    let table_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(columns[0]);

    RecordsLayout {
        table: table_area[0],
        pager: table_area[1],
        info_panel: columns[1],
    }
}

/// アップロード画面の本体を3つに分割（概要 + ゲージ + 結果）
pub fn create_upload_layout(area: Rect) -> UploadLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // ファイル・状態
            Constraint::Length(3), // 進捗ゲージ
            Constraint::Min(5),    // 結果
        ])
        .split(area);

    UploadLayout {
        summary: chunks[0],
        gauge: chunks[1],
        result: chunks[2],
    }
}
