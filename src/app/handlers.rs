//! キー入力ハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use crate::{
    events::Screen,
    input::{InputBoxState, InputCallbackId},
    pagination,
    shortcuts,
    upload::FileMeta,
    worker::WorkerCmd,
};

use super::{App, request_fetch};

/// ページサイズの切り替え候補。
const PAGE_SIZES: [usize; 4] = [10, 20, 50, 100];

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    // 画面ごとのハンドラへ委譲する。
    match app.ui.screen {
        Screen::Records => handle_records_key(app, k).await,
        Screen::Upload => handle_upload_key(app, k).await,
        Screen::History => handle_history_key(app, k).await,
        Screen::Stats => handle_stats_key(app, k).await,
    }
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// サーバーが返した総ページ数（未取得なら0）。
fn total_pages(app: &App) -> usize {
    app.pagination.as_ref().map_or(0, |p| p.total_pages)
}

/// レコード一覧画面のキー処理。
async fn handle_records_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 一覧画面のショートカットを参照する。
    let sc = &app.shortcuts.records;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.upload_screen) {
        app.ui.screen = Screen::Upload;
        app.ui.status = "Upload".into();
    } else if shortcuts::matches_shortcut(&k, &sc.history_screen) {
        app.ui.screen = Screen::History;
        app.ui.status = "History".into();
    } else if shortcuts::matches_shortcut(&k, &sc.stats_screen) {
        app.ui.screen = Screen::Stats;
        app.ui.status = "Stats".into();
    } else if shortcuts::matches_shortcut(&k, &sc.refresh) {
        // キャッシュを捨てて現在のクエリを取り直す。
        app.cache.invalidate();
        request_fetch(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.down) {
        // 次の行へ移動する。
        if app.ui.selected + 1 < app.records.len() {
            app.ui.selected += 1;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.up) {
        // 前の行へ移動する。
        app.ui.selected = app.ui.selected.saturating_sub(1);
    } else if shortcuts::matches_shortcut(&k, &sc.next_page) {
        go_to_page(app, app.query.page + 1).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.prev_page) {
        go_to_page(app, app.query.page.saturating_sub(1)).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.first_page) {
        go_to_page(app, 1).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.last_page) {
        go_to_page(app, total_pages(app)).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.jump_page) {
        // ページ番号の入力ボックスを開く。
        app.input_box = Some(InputBoxState::new(
            "Go to page:",
            String::new(),
            InputCallbackId::JumpToPage,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.cycle_page_size) {
        // ページサイズを循環させる。表示位置は維持される。
        let current = PAGE_SIZES
            .iter()
            .position(|&s| s == app.query.page_size)
            .unwrap_or(0);
        let next = PAGE_SIZES[(current + 1) % PAGE_SIZES.len()];
        app.query = app.query.with_page_size(next);
        request_fetch(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.search) {
        // フリーテキスト検索の入力ボックスを開く。
        let current = app.query.filters.get("search").cloned().unwrap_or_default();
        app.input_box = Some(InputBoxState::new(
            "Search:",
            current,
            InputCallbackId::FilterSearch,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.filter_agent) {
        // 代理店コードの入力ボックスを開く。
        let current = app
            .query
            .filters
            .get("agentCode")
            .cloned()
            .unwrap_or_default();
        app.input_box = Some(InputBoxState::new(
            "Agent code:",
            current,
            InputCallbackId::FilterAgentCode,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.filter_type) {
        // レコード種別の入力ボックスを開く。
        let current = app
            .query
            .filters
            .get("recordType")
            .cloned()
            .unwrap_or_default();
        app.input_box = Some(InputBoxState::new(
            "Record type (e.g. BKS24):",
            current,
            InputCallbackId::FilterRecordType,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.sort_line) {
        app.query = app.query.toggle_sort("lineNumber");
        request_fetch(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.sort_agent) {
        app.query = app.query.toggle_sort("agentCode");
        request_fetch(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.sort_type) {
        app.query = app.query.toggle_sort("recordType");
        request_fetch(app).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.clear_filters) {
        // 全フィルタを解除して1ページ目から取り直す。
        app.query = app.query.cleared();
        request_fetch(app).await?;
    }

    Ok(false)
}

/// 範囲内のページ番号なら移動して取得する（範囲外は無視）。
async fn go_to_page(app: &mut App, page: usize) -> Result<()> {
    if pagination::can_go_to(page, total_pages(app)) && page != app.query.page {
        app.query = app.query.with_page(page);
        request_fetch(app).await?;
    }
    Ok(())
}

/// アップロード画面のキー処理。
async fn handle_upload_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.upload;

    if shortcuts::matches_shortcut(&k, &sc.back) {
        app.ui.screen = Screen::Records;
        app.ui.status = "Records".into();
    } else if shortcuts::matches_shortcut(&k, &sc.pick_file) {
        // ファイルパスの入力ボックスを開く。
        app.input_box = Some(InputBoxState::new(
            "HOT22 file path (.txt):",
            app.upload_path.clone(),
            InputCallbackId::UploadPath,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.reset) {
        // 終端状態のジョブを片付けて次のアップロードに備える。
        app.pipeline.reset();
        app.upload_errors.clear();
        app.ui.error = None;
        app.ui.status = "Upload".into();
    }

    Ok(false)
}

/// 履歴画面のキー処理。
async fn handle_history_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.history;

    if shortcuts::matches_shortcut(&k, &sc.back) {
        app.ui.screen = Screen::Records;
        app.ui.status = "Records".into();
    } else if shortcuts::matches_shortcut(&k, &sc.clear) {
        // 履歴を無条件で空にする。
        app.ledger.clear();
        app.ui.status = "History cleared".into();
    }

    Ok(false)
}

/// 統計画面のキー処理。
async fn handle_stats_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.stats;

    if shortcuts::matches_shortcut(&k, &sc.back) {
        app.ui.confirm_delete = false;
        app.ui.screen = Screen::Records;
        app.ui.status = "Records".into();
    } else if shortcuts::matches_shortcut(&k, &sc.refresh) {
        app.ui.confirm_delete = false;
        app.worker_tx.send(WorkerCmd::FetchStats).await?;
        app.worker_tx.send(WorkerCmd::CheckHealth).await?;
        app.ui.status = "Refreshing stats...".into();
    } else if shortcuts::matches_shortcut(&k, &sc.delete_all) {
        if app.ui.confirm_delete {
            // 2度目の押下で実際に削除を依頼する。
            app.ui.confirm_delete = false;
            app.worker_tx.send(WorkerCmd::DeleteAll).await?;
            app.ui.status = "Deleting all records...".into();
        } else {
            // まず確認を求める。
            app.ui.confirm_delete = true;
            app.ui.status = "Press again to delete ALL records".into();
        }
    } else {
        // 他のキーで確認状態を解除する。
        app.ui.confirm_delete = false;
    }

    Ok(false)
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが無ければ何もしない。
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };

    // 入力ボックス用ショートカットを参照する。
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 入力ボックスを閉じる前に値とコールバック種別を保存する。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;

        // コールバック種別に応じて値を反映する。
        apply_input_callback(app, callback_id, value).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // 入力を破棄して入力ボックスを閉じる。
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code {
        // コントロールキー以外の通常文字を挿入する。
        if !k.modifiers.contains(KeyModifiers::CONTROL) {
            input_state.insert_char(c);
        }
    }

    Ok(false)
}

/// 入力ボックスのコールバックを適用する。
async fn apply_input_callback(app: &mut App, callback_id: InputCallbackId, value: String) -> Result<()> {
    match callback_id {
        InputCallbackId::FilterSearch => {
            // 検索語の変更は1ページ目からの取り直しになる。
            app.query = app.query.apply_filter("search", &value);
            request_fetch(app).await?;
        }
        InputCallbackId::FilterAgentCode => {
            app.query = app.query.apply_filter("agentCode", &value);
            request_fetch(app).await?;
        }
        InputCallbackId::FilterRecordType => {
            // レコード種別コードは大文字で正規化する。
            app.query = app
                .query
                .apply_filter("recordType", value.trim().to_ascii_uppercase().as_str());
            request_fetch(app).await?;
        }
        InputCallbackId::JumpToPage => {
            // ページ番号として解釈できた場合のみ移動する。
            match value.trim().parse::<usize>() {
                Ok(page) if pagination::can_go_to(page, total_pages(app)) => {
                    go_to_page(app, page).await?;
                }
                _ => {
                    app.ui.error = Some(format!("invalid page: {value}"));
                }
            }
        }
        InputCallbackId::UploadPath => {
            start_upload(app, value).await?;
        }
    }
    Ok(())
}

/// 入力されたパスのファイルを検証し、通ればWorkerへ転送を依頼する。
async fn start_upload(app: &mut App, value: String) -> Result<()> {
    let path = PathBuf::from(value.trim());
    app.upload_path = value.trim().to_string();

    // ファイルサイズを先に調べる（存在しなければその場で案内）。
    let size = match std::fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            app.ui.error = Some(format!("cannot read {}: {e}", path.display()));
            return Ok(());
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    // 前回の終端ジョブが残っていればリセットしてから選び直す。
    if app.pipeline.status().is_terminal() {
        app.pipeline.reset();
        app.upload_errors.clear();
    }

    let file = FileMeta::new(name, size);
    match app.pipeline.select_file(file.clone()) {
        Ok(()) => {
            // 検証を通過。転送を開始してWorkerへ依頼する。
            app.ui.error = None;
            app.pipeline.begin_transfer();
            app.ui.status = format!("Uploading {}...", file.name);
            app.worker_tx.send(WorkerCmd::Upload { path, file }).await?;
        }
        Err(e) => {
            // 拒否はジョブにならず、履歴にも残らない。
            app.ui.error = Some(e.to_string());
        }
    }
    Ok(())
}
