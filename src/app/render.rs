//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table, Wrap},
};

use crate::{
    api::types::HealthStatus,
    events::Screen,
    history::UploadOutcome,
    input, layout, pagination,
    query::SortDirection,
    report,
    shortcuts::Shortcuts,
    upload::UploadStatus,
};

use super::App;

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    // メインレイアウト（Body + HELP + STATUS）を作る。
    let main_layout = layout::create_main_layout(f.area());

    // 画面ごとの本体を描画する。
    match app.ui.screen {
        Screen::Records => draw_records(f, app, main_layout.body),
        Screen::Upload => draw_upload(f, app, main_layout.body),
        Screen::History => draw_history(f, app, main_layout.body),
        Screen::Stats => draw_stats(f, app, main_layout.body),
    }

    // HELPバー（画面ごとのショートカット）を描画する。
    let help_text = get_help_text(&app.ui.screen, &app.shortcuts);
    let help_bar = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    // STATUSバー（画面名・エラー）を描画する。
    let status_bar = build_status_bar(app);
    f.render_widget(status_bar, main_layout.status_bar);

    // 入力ボックスが開いていれば重ねて描画する。
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

/// レコード一覧画面を描画する。
fn draw_records(f: &mut Frame, app: &App, area: Rect) {
    let body = layout::create_records_layout(area);

    // レコード一覧からテーブル行を組み立てる。
    let rows = app.records.iter().map(|r| {
        Row::new(vec![
            r.line_number.map_or_else(|| "-".into(), |n| n.to_string()),
            r.record_type.clone(),
            r.agent_code.clone().unwrap_or_else(|| "-".into()),
            r.transaction_number.clone().unwrap_or_else(|| "-".into()),
        ])
    });

    // タイトルに取得中マークを付ける。
    let title = if app.ui.loading {
        "RECORDS (loading...)"
    } else {
        "RECORDS"
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Min(14),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(title))
    .header(Row::new(vec!["line", "type", "agent", "txn"]).bold())
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(255, 140, 0))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    // 選択中の行をハイライトする。
    let mut table_state = ratatui::widgets::TableState::default();
    if !app.records.is_empty() {
        table_state.select(Some(app.ui.selected));
    }
    f.render_stateful_widget(table, body.table, &mut table_state);

    // ページ番号フッターを描画する。
    let pager = Paragraph::new(build_pager_text(app))
        .block(Block::default().borders(Borders::ALL).title("PAGE"));
    f.render_widget(pager, body.pager);

    // INFOパネル（クエリ状態と選択レコード）を描画する。
    let info_panel = Paragraph::new(build_records_info_text(app))
        .block(Block::default().borders(Borders::ALL).title("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_panel, body.info_panel);
}

/// ページ番号の窓を「« 1 [2] 3 4 5 »」形式で組み立てる。
fn build_pager_text(app: &App) -> String {
    let Some(meta) = &app.pagination else {
        return "-".into();
    };
    let window = pagination::compute_window(
        meta.total_records,
        app.query.page_size,
        app.query.page,
        app.cfg.list.page_window,
    );
    if window.total_pages == 0 {
        return "no records".into();
    }

    let mut parts = Vec::new();
    if window.has_prev {
        parts.push("«".to_string());
    }
    for n in &window.page_numbers {
        if *n == window.current_page {
            parts.push(format!("[{n}]"));
        } else {
            parts.push(n.to_string());
        }
    }
    if window.has_next {
        parts.push("»".to_string());
    }
    // 現在ページのアイテム範囲も併記する。
    parts.push(format!(
        "({}-{} of {})",
        window.start_index + 1,
        window.end_index,
        meta.total_records
    ));
    parts.join(" ")
}

/// 一覧画面のINFOパネル文字列を構築する。
fn build_records_info_text(app: &App) -> String {
    // ソート状態の表示を作る。
    let arrow = match app.query.sort_direction {
        SortDirection::Ascending => "↑",
        SortDirection::Descending => "↓",
    };
    let mut lines = vec![
        format!("Sort: {} {}", app.query.sort_key, arrow),
        format!("Filters: {}", app.query.active_filter_count()),
    ];
    // 有効なフィルタを列挙する。
    for (key, value) in &app.query.filters {
        lines.push(format!("  {key} = {value}"));
    }
    lines.push(String::new());

    // ヘルス状態があれば表示する。
    if let Some(health) = &app.health {
        let label = match health.status {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
        };
        lines.push(format!("Backend: {label}"));
        lines.push(String::new());
    }

    // 選択中レコードの生フィールドを数件だけ表示する。
    if let Some(record) = app.records.get(app.ui.selected) {
        lines.push(format!("Selected: {} ({})", record.record_type, record.id));
        for (key, value) in record.fields.iter().take(8) {
            lines.push(format!("  {key}: {value}"));
        }
    } else {
        lines.push("No record selected".into());
    }
    lines.join("\n")
}

/// アップロード画面を描画する。
fn draw_upload(f: &mut Frame, app: &App, area: Rect) {
    let body = layout::create_upload_layout(area);

    // ファイルと状態の概要を描画する。
    let summary_text = match app.pipeline.job() {
        Some(job) => format!(
            "File: {}\nSize: {} bytes\nStatus: {}",
            job.file.name,
            job.file.size,
            status_str(job.status)
        ),
        None => format!(
            "No file selected.\nAccepted: .txt up to {} MB\nLast path: {}",
            app.cfg.upload.max_size_mb,
            if app.upload_path.is_empty() {
                "-"
            } else {
                &app.upload_path
            }
        ),
    };
    let summary = Paragraph::new(summary_text)
        .block(Block::default().borders(Borders::ALL).title("UPLOAD"))
        .wrap(Wrap { trim: true });
    f.render_widget(summary, body.summary);

    // 転送進捗ゲージを描画する。
    let progress = app.pipeline.job().map_or(0, |j| j.progress);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("TRANSFER"))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(progress));
    f.render_widget(gauge, body.gauge);

    // 結果・エラーの表示を組み立てる。
    let result_text = build_upload_result_text(app);
    let result = Paragraph::new(result_text)
        .block(Block::default().borders(Borders::ALL).title("RESULT"))
        .wrap(Wrap { trim: true });
    f.render_widget(result, body.result);
}

/// アップロード結果パネルの文字列を構築する。
fn build_upload_result_text(app: &App) -> String {
    let Some(job) = app.pipeline.job() else {
        return "Press o to choose a HOT22 file.".into();
    };
    match job.status {
        UploadStatus::Completed => {
            let Some(result) = &job.result else {
                return String::new();
            };
            let severity = report::severity(result.total_errors, result.total_processed);
            let mut lines = vec![
                format!(
                    "Processed: {}  Saved: {}  Errors: {}",
                    result.total_processed, result.total_saved, result.total_errors
                ),
                format!("Processing time: {} ms", result.processing_time_ms),
                format!("Severity: {}", severity.label()),
                String::new(),
            ];
            // レコード種別ごとの件数を表示する。
            for (record_type, counts) in &result.record_type_counts {
                lines.push(format!(
                    "{record_type}: {} processed, {} saved, {} errors",
                    counts.processed, counts.saved, counts.errors
                ));
            }
            // エラーグループの先頭数件を表示する。
            for group in &app.upload_errors {
                lines.push(String::new());
                lines.push(format!(
                    "{} — {} errors",
                    group.record_type, group.total_errors
                ));
                for v in group.validation_errors.iter().take(5) {
                    lines.push(format!("  line {}: {}", v.line_number, v.message));
                }
                for s in group.save_errors.iter().take(3) {
                    lines.push(format!("  save: {s}"));
                }
            }
            lines.join("\n")
        }
        UploadStatus::Failed => {
            let message = job
                .error
                .as_ref()
                .map_or_else(|| "unknown error".into(), |e| e.to_string());
            format!("Upload failed: {message}\n\nPress x to reset, o to retry.")
        }
        UploadStatus::Processing => "Server is processing the file...".into(),
        _ => "Transferring...".into(),
    }
}

/// 履歴画面を描画する。
fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let rows = app.ledger.entries().iter().map(|e| {
        Row::new(vec![
            e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.filename.clone(),
            match e.outcome {
                UploadOutcome::Success => "success".to_string(),
                UploadOutcome::Error => "error".to_string(),
            },
            e.record_count.to_string(),
            format!("{} ms", e.processing_time_ms),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("HISTORY (last {})", app.ledger.len())),
    )
    .header(Row::new(vec!["time", "file", "result", "records", "took"]).bold());

    f.render_widget(table, area);
}

/// 統計画面を描画する。
fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    match &app.stats {
        Some(stats) => {
            lines.push(format!("Total records: {}", stats.total_records));
            lines.push(format!("Collections: {}", stats.collections));
            lines.push(String::new());
            for (record_type, count) in &stats.statistics {
                lines.push(format!("{record_type}: {count}"));
            }
        }
        None => lines.push("Stats not loaded yet (press r).".into()),
    }
    lines.push(String::new());
    match &app.health {
        Some(health) => {
            let label = match health.status {
                HealthStatus::Healthy => "healthy",
                HealthStatus::Degraded => "degraded",
            };
            lines.push(format!(
                "Backend: {label} (up {} s)",
                health.uptime_seconds
            ));
        }
        None => lines.push("Backend health unknown".into()),
    }

    let panel = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title("STATS"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let screen_name = match app.ui.screen {
        Screen::Records => "Records",
        Screen::Upload => "Upload",
        Screen::History => "History",
        Screen::Stats => "Stats",
    };

    // 進行中のアップロードがあれば常に併記する。
    let upload_info = match app.pipeline.job() {
        Some(job) if !job.status.is_terminal() => {
            format!(" | Upload: {} {}%", status_str(job.status), job.progress)
        }
        _ => String::new(),
    };

    // エラーの有無でステータス文字列を切り替える。
    let status_text = if let Some(err) = &app.ui.error {
        format!("[{screen_name}]{upload_info} | ERROR: {err}")
    } else {
        format!("[{screen_name}]{upload_info} | {}", app.ui.status)
    };

    let mut status_bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // エラー時は赤色で強調表示する。
    if app.ui.error.is_some() {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }

    status_bar
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(screen: &Screen, shortcuts: &Shortcuts) -> String {
    match screen {
        Screen::Records => format!(
            "{}: quit | {}: upload | {}: history | {}: stats | {}/{}: page | {}: go | {}: size | {}: search | {}: agent | {}: type | {}-{}-{}: sort | {}: clear | {}: refresh",
            format_keys(&shortcuts.records.quit),
            format_keys(&shortcuts.records.upload_screen),
            format_keys(&shortcuts.records.history_screen),
            format_keys(&shortcuts.records.stats_screen),
            format_keys(&shortcuts.records.prev_page),
            format_keys(&shortcuts.records.next_page),
            format_keys(&shortcuts.records.jump_page),
            format_keys(&shortcuts.records.cycle_page_size),
            format_keys(&shortcuts.records.search),
            format_keys(&shortcuts.records.filter_agent),
            format_keys(&shortcuts.records.filter_type),
            format_keys(&shortcuts.records.sort_line),
            format_keys(&shortcuts.records.sort_agent),
            format_keys(&shortcuts.records.sort_type),
            format_keys(&shortcuts.records.clear_filters),
            format_keys(&shortcuts.records.refresh)
        ),
        Screen::Upload => format!(
            "{}: choose file | {}: reset | {}: back",
            format_keys(&shortcuts.upload.pick_file),
            format_keys(&shortcuts.upload.reset),
            format_keys(&shortcuts.upload.back)
        ),
        Screen::History => format!(
            "{}: clear history | {}: back",
            format_keys(&shortcuts.history.clear),
            format_keys(&shortcuts.history.back)
        ),
        Screen::Stats => format!(
            "{}: refresh | {}: delete all (twice) | {}: back",
            format_keys(&shortcuts.stats.refresh),
            format_keys(&shortcuts.stats.delete_all),
            format_keys(&shortcuts.stats.back)
        ),
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

/// アップロード状態を表示用の短いラベルへ変換する。
fn status_str(s: UploadStatus) -> &'static str {
    match s {
        UploadStatus::Idle => "Idle",
        UploadStatus::Validating => "Validating",
        UploadStatus::Uploading => "Uploading",
        UploadStatus::Processing => "Processing",
        UploadStatus::Completed => "Completed",
        UploadStatus::Failed => "Failed",
    }
}
