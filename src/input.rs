//! TUI内での文字列入力コンポーネント（InputBox）。

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// InputBox入力状態
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    // Records画面用
    /// フリーテキスト検索。
    FilterSearch,
    /// 代理店コードの絞り込み。
    FilterAgentCode,
    /// レコード種別の絞り込み。
    FilterRecordType,
    /// ページ番号ジャンプ。
    JumpToPage,

    // Upload画面用
    /// アップロードするファイルのパス。
    UploadPath,
}

impl InputBoxState {
    /// プロンプトと初期値から入力状態を作る（カーソルは末尾）。
    pub fn new(prompt: impl Into<String>, value: String, callback_id: InputCallbackId) -> Self {
        let cursor = value.chars().count();
        Self {
            prompt: prompt.into(),
            value,
            cursor,
            callback_id,
        }
    }

    /// カーソル位置（文字単位）をバイト位置へ変換する。
    fn byte_cursor(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        // バイト位置に変換してから挿入する。
        let at = self.byte_cursor();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        // カーソルが先頭なら何もしない。
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_cursor();
            self.value.remove(at);
        }
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        // カーソルが末尾なら何もしない。
        if self.cursor < self.value.chars().count() {
            let at = self.byte_cursor();
            self.value.remove(at);
        }
    }

    /// カーソルを左に移動
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// カーソルを右に移動
    pub fn move_right(&mut self) {
        // 末尾を超えないようにする。
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    /// カーソルを先頭に移動
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// カーソルを末尾に移動
    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    // 中央に配置されたポップアップ領域を計算する。
    let popup_area = centered_popup(f.area(), 70, 7);

    // 既存の描画を消してポップアップ用の背景にする。
    f.render_widget(Clear, popup_area);

    // ポップアップの外枠とスタイルを描画する。
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // 内部レイアウト（プロンプト + 入力フィールド + ヘルプ）を定義する。
    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // プロンプト
            Constraint::Length(1), // 入力フィールド
            Constraint::Length(1), // 空行
            Constraint::Length(1), // ヘルプ
        ])
        .split(popup_area);

    // プロンプトメッセージを描画する。
    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // カーソルが表示幅を超えた場合の横スクロール量を算出する。
    let display_width = inner_layout[1].width as usize;
    let scroll_offset = state.cursor.saturating_sub(display_width.saturating_sub(2));

    // 可視範囲の文字列にカーソル（|）を差し込んで描画する。
    let chars: Vec<char> = state.value.chars().collect();
    let cursor_in_visible = state.cursor - scroll_offset;
    let mut visible = String::new();
    for (i, c) in chars.iter().enumerate().skip(scroll_offset).take(display_width) {
        if i - scroll_offset == cursor_in_visible {
            visible.push('|');
        }
        visible.push(*c);
    }
    // カーソルが末尾にある場合はここで差し込む。
    if cursor_in_visible >= chars.len().saturating_sub(scroll_offset) {
        visible.push('|');
    }

    let input_widget = Paragraph::new(visible).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    // ヘルプテキストを描画する。
    let help = Paragraph::new("Enter=確定 | ESC=キャンセル | Ctrl+U=クリア")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[3]);
}

/// 中央配置のポップアップ領域を計算
fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    // 縦方向の余白を作り、中央行を取り出す。
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    // 横方向も中央に寄せてポップアップ領域を返す。
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_cursor() {
        // 途中挿入でカーソルが追従することを検証する。
        let mut s = InputBoxState::new("path:", "ab".into(), InputCallbackId::UploadPath);
        assert_eq!(s.cursor, 2);
        s.move_left();
        s.insert_char('x');
        assert_eq!(s.value, "axb");
        assert_eq!(s.cursor, 2);
    }

    #[test]
    fn test_backspace_and_delete_multibyte() {
        // マルチバイト文字でも文字単位で編集できることを検証する。
        let mut s = InputBoxState::new("q:", "札幌abc".into(), InputCallbackId::FilterSearch);
        s.move_home();
        s.move_right();
        s.backspace();
        assert_eq!(s.value, "幌abc");
        s.delete();
        assert_eq!(s.value, "abc");
        assert_eq!(s.cursor, 0);
    }

    #[test]
    fn test_clear_line() {
        // クリアで空になりカーソルが先頭へ戻ることを検証する。
        let mut s = InputBoxState::new("q:", "BKS24".into(), InputCallbackId::FilterRecordType);
        s.clear_line();
        assert_eq!(s.value, "");
        assert_eq!(s.cursor, 0);
    }
}
