//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;

use crate::{
    api::{
        client::ApiClient,
        types::{HealthResponse, ListResponse, PaginationMeta, RecordRow, StatsResponse},
    },
    config::Config,
    events::UiState,
    history::HistoryLedger,
    input::InputBoxState,
    query::Query,
    query_cache::{FetchPlan, QueryCache},
    report::{self, ErrorGroup},
    shortcuts::Shortcuts,
    ui::Tui,
    upload::{UploadError, UploadPipeline},
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// 選択位置やステータスなどUI固有の状態。
    pub ui: UiState,
    /// 一覧取得に使う現在のクエリ。
    pub query: Query,
    /// 表示中ページのレコード。
    pub records: Vec<RecordRow>,
    /// サーバーが返した最新のページ情報。
    pub pagination: Option<PaginationMeta>,
    /// 一覧取得の調停役（重複排除・新旧判定・LRU）。
    pub cache: QueryCache<ListResponse>,
    /// アップロードの状態機械。
    pub pipeline: UploadPipeline,
    /// アップロード履歴の台帳。
    pub ledger: HistoryLedger,
    /// 直近アップロードのレコード種別ごとのエラー。
    pub upload_errors: Vec<ErrorGroup>,
    /// バックエンド統計（取得済みならSome）。
    pub stats: Option<StatsResponse>,
    /// バックエンドのヘルス状態。
    pub health: Option<HealthResponse>,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// アップロード画面で編集するファイルパス。
    pub upload_path: String,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成）。
    let cfg_path = PathBuf::from("config.toml");
    let cfg = Config::load_or_default(&cfg_path)?;

    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts_path = PathBuf::from("shortcut.toml");
    let shortcuts = Shortcuts::load_or_default(&shortcuts_path)?;

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    // バックエンドクライアントを構築してWorkerを起動する。
    let client = ApiClient::new(&cfg)?;
    tokio::spawn(worker::run(rx_cmd, tx_ev, client));

    // アプリ状態を初期化する。
    let mut app = App {
        query: Query::new(cfg.list.page_size),
        cache: QueryCache::new(cfg.list.cache_pages),
        pipeline: UploadPipeline::new(cfg.upload.max_bytes()),
        ledger: HistoryLedger::new(cfg.history.max_entries),
        cfg,
        ui: UiState::new(),
        records: vec![],
        pagination: None,
        upload_errors: vec![],
        stats: None,
        health: None,
        worker_tx: tx_cmd,
        worker_rx: rx_ev,
        upload_path: String::new(),
        input_box: None,
        shortcuts,
    };

    // 起動時に一覧・統計・ヘルスを取得する。
    request_fetch(&mut app).await?;
    app.worker_tx.send(WorkerCmd::FetchStats).await?;
    app.worker_tx.send(WorkerCmd::CheckHealth).await?;

    loop {
        // 現在の状態を描画する。
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev).await?;
        }

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            // どのフェーズでもCtrl+Cで終了できるようにする。
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
async fn handle_worker_event(app: &mut App, ev: WorkerEvent) -> Result<()> {
    match ev {
        WorkerEvent::RecordsLoaded {
            token,
            query,
            response,
        } => {
            // サーバー側でページがクランプされた場合は、実際に返された
            // ページをキーとして保存する（表示中クエリとキーを一致させる）。
            let query = if query.page == response.pagination.current_page {
                query
            } else {
                query.with_page(response.pagination.current_page)
            };
            // 最新クエリの応答だけを採用し、古い応答は破棄する。
            if app.cache.complete(token, query, response.clone()) {
                apply_list(app, response);
            } else {
                tracing::info!("discarded stale response: token {token}");
            }
        }
        WorkerEvent::RecordsFailed { token, message } => {
            // 古い失敗は無視し、現行の取得失敗だけを表示する。
            if app.cache.fail(token) {
                app.ui.loading = false;
                app.ui.error = Some(format!("fetch failed: {message}"));
            }
        }
        WorkerEvent::UploadProgress(pct) => {
            // 転送進捗を状態機械へ反映する（単調増加）。
            app.pipeline.set_progress(pct);
        }
        WorkerEvent::UploadSent => {
            // 本文送信完了。サーバー処理フェーズへ移る。
            app.pipeline.server_ack();
        }
        WorkerEvent::UploadDone(resp) => {
            // 結果を確定し、履歴へ1件だけ追加する。
            let result = resp.results.processing_result();
            if let Some(entry) = app.pipeline.complete(result) {
                app.ledger.append(entry);
            }
            // レコード種別ごとのエラーを集計しておく。
            app.upload_errors = report::aggregate(&resp.results.record_errors());
            app.ui.status = format!(
                "Upload complete: {} processed, {} errors",
                resp.results.summary.total_processed, resp.results.summary.total_errors
            );
            // データが変わったのでキャッシュを捨てて取り直す。
            refresh_after_mutation(app).await?;
        }
        WorkerEvent::UploadFailed(message) => {
            // 失敗も履歴へ1件だけ追加する。
            if let Some(entry) = app.pipeline.fail(UploadError::Transport(message.clone())) {
                app.ledger.append(entry);
            }
            app.ui.error = Some(format!("upload failed: {message}"));
        }
        WorkerEvent::StatsLoaded(stats) => {
            app.stats = Some(stats);
        }
        WorkerEvent::AllDeleted { ok } => {
            if ok {
                app.ui.status = "All records deleted".into();
                refresh_after_mutation(app).await?;
            } else {
                app.ui.error = Some("delete-all was not acknowledged".into());
            }
        }
        WorkerEvent::HealthChecked(health) => {
            app.health = Some(health);
        }
        WorkerEvent::Error(message) => {
            app.ui.error = Some(message);
        }
    }
    Ok(())
}

/// 取得した一覧ページを表示状態へ反映する。
fn apply_list(app: &mut App, response: ListResponse) {
    app.ui.loading = false;
    app.ui.error = None;
    // サーバーのページ情報を正としてクエリ側のページも合わせる。
    app.query.page = response.pagination.current_page.max(1);
    // 選択行がページ外へ出ないよう丸める。
    app.ui.selected = app.ui.selected.min(response.data.len().saturating_sub(1));
    app.ui.status = format!(
        "Page {}/{} ({} records)",
        response.pagination.current_page,
        response.pagination.total_pages.max(1),
        response.pagination.total_records
    );
    app.records = response.data;
    app.pagination = Some(response.pagination);
}

/// 現在のクエリで一覧を取得する（キャッシュ調停込み）。
pub async fn request_fetch(app: &mut App) -> Result<()> {
    match app.cache.plan(&app.query) {
        FetchPlan::Hit(response) => {
            // キャッシュ命中。ネットワークを使わず即時反映する。
            apply_list(app, response);
        }
        FetchPlan::Fetch(token) => {
            // 新しいトークンで取得を依頼する。
            app.ui.loading = true;
            app.ui.status = "Loading records...".into();
            app.worker_tx
                .send(WorkerCmd::FetchRecords {
                    token,
                    query: app.query.clone(),
                })
                .await?;
        }
        FetchPlan::InFlight => {
            // 同一クエリが取得中。結果を待つだけでよい。
        }
    }
    Ok(())
}

/// データ変更後にキャッシュを無効化して一覧と統計を取り直す。
async fn refresh_after_mutation(app: &mut App) -> Result<()> {
    app.cache.invalidate();
    request_fetch(app).await?;
    app.worker_tx.send(WorkerCmd::FetchStats).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PaginationMeta;

    /// Worker無しでイベント反映を試験するためのアプリ状態を作る。
    fn test_app() -> App {
        let cfg = Config::default();
        let (worker_tx, _cmd_rx) = mpsc::channel(8);
        let (_ev_tx, worker_rx) = mpsc::channel(8);
        App {
            query: Query::new(cfg.list.page_size),
            cache: QueryCache::new(cfg.list.cache_pages),
            pipeline: UploadPipeline::new(cfg.upload.max_bytes()),
            ledger: HistoryLedger::new(cfg.history.max_entries),
            cfg,
            ui: UiState::new(),
            records: vec![],
            pagination: None,
            upload_errors: vec![],
            stats: None,
            health: None,
            worker_tx,
            worker_rx,
            upload_path: String::new(),
            input_box: None,
            shortcuts: Shortcuts::default(),
        }
    }

    fn page_response(page: usize) -> ListResponse {
        ListResponse {
            data: vec![],
            pagination: PaginationMeta {
                current_page: page,
                total_pages: 5,
                total_records: 95,
                has_next_page: page < 5,
                has_prev_page: page > 1,
                limit: 20,
            },
        }
    }

    #[tokio::test]
    async fn test_clamped_page_is_cached_under_displayed_query() {
        let mut app = test_app();
        // 末尾を超えたページを要求し、サーバーが最終ページへクランプする。
        app.query = app.query.with_page(99);
        let token = match app.cache.plan(&app.query) {
            FetchPlan::Fetch(t) => t,
            other => panic!("expected Fetch, got {other:?}"),
        };
        let requested = app.query.clone();
        handle_worker_event(&mut app, WorkerEvent::RecordsLoaded {
            token,
            query: requested,
            response: page_response(5),
        })
        .await
        .unwrap();

        // 表示中クエリはサーバーのクランプ結果に追従する。
        assert_eq!(app.query.page, 5);
        // その表示中ページがキャッシュから供給されることを検証する。
        assert!(matches!(app.cache.plan(&app.query), FetchPlan::Hit(_)));
    }

    #[tokio::test]
    async fn test_applied_page_matches_cache_key_without_clamp() {
        let mut app = test_app();
        app.query = app.query.with_page(2);
        let token = match app.cache.plan(&app.query) {
            FetchPlan::Fetch(t) => t,
            other => panic!("expected Fetch, got {other:?}"),
        };
        let requested = app.query.clone();
        handle_worker_event(&mut app, WorkerEvent::RecordsLoaded {
            token,
            query: requested,
            response: page_response(2),
        })
        .await
        .unwrap();
        assert_eq!(app.query.page, 2);
        assert!(matches!(app.cache.plan(&app.query), FetchPlan::Hit(_)));
    }
}
