//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub records: RecordsShortcuts,
    pub upload: UploadShortcuts,
    pub history: HistoryShortcuts,
    pub stats: StatsShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// レコード一覧画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsShortcuts {
    pub quit: Vec<String>,
    pub upload_screen: Vec<String>,
    pub history_screen: Vec<String>,
    pub stats_screen: Vec<String>,
    pub refresh: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
    pub next_page: Vec<String>,
    pub prev_page: Vec<String>,
    pub first_page: Vec<String>,
    pub last_page: Vec<String>,
    pub jump_page: Vec<String>,
    pub cycle_page_size: Vec<String>,
    pub search: Vec<String>,
    pub filter_agent: Vec<String>,
    pub filter_type: Vec<String>,
    pub sort_line: Vec<String>,
    pub sort_agent: Vec<String>,
    pub sort_type: Vec<String>,
    pub clear_filters: Vec<String>,
}

/// アップロード画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadShortcuts {
    pub back: Vec<String>,
    pub pick_file: Vec<String>,
    pub reset: Vec<String>,
}

/// 履歴画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryShortcuts {
    pub back: Vec<String>,
    pub clear: Vec<String>,
}

/// 統計画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsShortcuts {
    pub back: Vec<String>,
    pub refresh: Vec<String>,
    pub delete_all: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            // 既存ファイルを読み込んでパースする。
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            // 未作成の場合は既定値を利用する。
            Ok(Self::default())
        }
    }

    /// TOMLとして保存する。
    #[allow(dead_code)]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            records: RecordsShortcuts {
                quit: vec!["q".into()],
                upload_screen: vec!["u".into()],
                history_screen: vec!["y".into()],
                stats_screen: vec!["t".into()],
                refresh: vec!["r".into()],
                down: vec!["Down".into(), "j".into()],
                up: vec!["Up".into(), "k".into()],
                next_page: vec!["Right".into(), "n".into()],
                prev_page: vec!["Left".into(), "p".into()],
                first_page: vec!["Home".into()],
                last_page: vec!["End".into()],
                jump_page: vec!["g".into()],
                cycle_page_size: vec!["z".into()],
                search: vec!["/".into()],
                filter_agent: vec!["a".into()],
                filter_type: vec!["f".into()],
                sort_line: vec!["1".into()],
                sort_agent: vec!["2".into()],
                sort_type: vec!["3".into()],
                clear_filters: vec!["c".into()],
            },
            upload: UploadShortcuts {
                back: vec!["Esc".into()],
                pick_file: vec!["o".into()],
                reset: vec!["x".into()],
            },
            history: HistoryShortcuts {
                back: vec!["Esc".into()],
                clear: vec!["x".into()],
            },
            stats: StatsShortcuts {
                back: vec!["Esc".into()],
                refresh: vec!["r".into()],
                delete_all: vec!["D".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
            },
        }
    }
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts
        .iter()
        .any(|s| parse_shortcut(s).is_some_and(|(mods, code)| expected_matches(key, mods, code)))
}

/// 期待する修飾キー・キーコードとKeyEventを比較する。
fn expected_matches(key: &KeyEvent, mut mods: KeyModifiers, code: KeyCode) -> bool {
    // 大文字1文字（例: "D"）はShift付き入力として扱う。
    if let KeyCode::Char(c) = code
        && c.is_ascii_uppercase()
    {
        mods |= KeyModifiers::SHIFT;
    }
    key.modifiers == mods && key.code == code
}

/// ショートカット文字列（例: "Ctrl+u", "a", "Enter"）を分解する。
fn parse_shortcut(shortcut: &str) -> Option<(KeyModifiers, KeyCode)> {
    let mut mods = KeyModifiers::empty();
    let mut parts = shortcut.split('+').peekable();
    loop {
        let part = parts.next()?;
        // 後続が無ければこの部分がキー名。
        if parts.peek().is_none() {
            return Some((mods, parse_key_name(part)?));
        }
        // それ以外は修飾キーとして解釈する。
        match part {
            "Ctrl" | "ctrl" => mods |= KeyModifiers::CONTROL,
            "Alt" | "alt" => mods |= KeyModifiers::ALT,
            "Shift" | "shift" => mods |= KeyModifiers::SHIFT,
            _ => return None,
        }
    }
}

/// キー名をKeyCodeへ変換する。
fn parse_key_name(name: &str) -> Option<KeyCode> {
    let code = match name {
        "Enter" | "enter" => KeyCode::Enter,
        "Esc" | "esc" => KeyCode::Esc,
        "Tab" | "tab" => KeyCode::Tab,
        "Backspace" | "backspace" => KeyCode::Backspace,
        "Delete" | "delete" => KeyCode::Delete,
        "Up" | "up" => KeyCode::Up,
        "Down" | "down" => KeyCode::Down,
        "Left" | "left" => KeyCode::Left,
        "Right" | "right" => KeyCode::Right,
        "Home" | "home" => KeyCode::Home,
        "End" | "end" => KeyCode::End,
        s => {
            let mut chars = s.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(c)
        }
    };
    Some(code)
}
