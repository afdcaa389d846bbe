//! アップロード履歴の有界台帳（新しい順）。

use chrono::{DateTime, Local};
use uuid::Uuid;

/// 履歴に残すアップロードの結末。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 正常完了。
    Success,
    /// 失敗（転送・サーバーエラー）。
    Error,
}

/// アップロード1件分の履歴レコード。
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// 一覧表示用の安定ID。
    pub id: Uuid,
    /// アップロードしたファイル名。
    pub filename: String,
    /// 終端状態に到達した時刻。
    pub timestamp: DateTime<Local>,
    /// 成否。
    pub outcome: UploadOutcome,
    /// 処理されたレコード件数（失敗時は0）。
    pub record_count: u64,
    /// サーバー側の処理時間（ミリ秒、失敗時は0）。
    pub processing_time_ms: u64,
}

impl HistoryEntry {
    /// 現在時刻と新規IDで履歴レコードを作る。
    pub fn new(
        filename: String,
        outcome: UploadOutcome,
        record_count: u64,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            timestamp: Local::now(),
            outcome,
            record_count,
            processing_time_ms,
        }
    }
}

/// 直近のアップロードだけを保持する有界の台帳。
///
/// 追加は常に先頭（最新順）。容量を超えた分は末尾から黙って捨てる。
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl HistoryLedger {
    /// 既定容量は10件。
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![],
            // 容量0は1として扱う。
            capacity: capacity.max(1),
        }
    }

    /// 先頭に追加し、容量まで末尾を切り詰める。
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
    }

    /// 台帳を無条件で空にする。
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 新しい順の履歴スライスを返す。
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> HistoryEntry {
        HistoryEntry::new(name.into(), UploadOutcome::Success, 100, 250)
    }

    #[test]
    fn test_append_is_most_recent_first() {
        // 追加順の逆（新しい順）に並ぶことを検証する。
        let mut ledger = HistoryLedger::default();
        ledger.append(entry("a.txt"));
        ledger.append(entry("b.txt"));
        ledger.append(entry("c.txt"));
        let names: Vec<&str> = ledger.entries().iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "b.txt", "a.txt"]);
    }

    #[test]
    fn test_capacity_truncates_oldest() {
        // 容量+k回追加しても長さが容量のままであることを検証する。
        let mut ledger = HistoryLedger::new(10);
        for i in 0..13 {
            ledger.append(entry(&format!("file{i}.txt")));
        }
        assert_eq!(ledger.len(), 10);
        // 最新10件が新しい順で残ることを検証する。
        let names: Vec<String> = ledger.entries().iter().map(|e| e.filename.clone()).collect();
        let expected: Vec<String> = (3..13).rev().map(|i| format!("file{i}.txt")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_clear_empties_unconditionally() {
        // clearで空になることを検証する。
        let mut ledger = HistoryLedger::new(3);
        ledger.append(entry("a.txt"));
        ledger.append(entry("b.txt"));
        ledger.clear();
        assert!(ledger.is_empty());
        // clear後も追加できることを検証する。
        ledger.append(entry("c.txt"));
        assert_eq!(ledger.len(), 1);
    }
}
