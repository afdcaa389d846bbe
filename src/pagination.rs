//! ページネーションの窓計算（純粋関数）。

/// 一覧画面で表示するページ窓の計算結果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// クランプ後の現在ページ（1始まり）。
    pub current_page: usize,
    /// 総ページ数（0件なら0）。
    pub total_pages: usize,
    /// フッターに並べるページ番号（昇順・連続）。
    pub page_numbers: Vec<usize>,
    /// 現在ページの先頭アイテムの通し位置（0始まり）。
    pub start_index: usize,
    /// 現在ページの末尾アイテムの通し位置（排他的）。
    pub end_index: usize,
    /// 次ページが存在するか。
    pub has_next: bool,
    /// 前ページが存在するか。
    pub has_prev: bool,
}

/// 件数・ページサイズ・現在ページから表示窓を計算する。
///
/// 範囲外の入力は例外にせずクランプする。窓は現在ページを中央に寄せ、
/// 先頭・末尾付近では境界側に詰める（非対称に縮めない）。
pub fn compute_window(
    total_items: usize,
    page_size: usize,
    current_page: usize,
    max_window_size: usize,
) -> PageWindow {
    // ページサイズ0は1として扱う（ゼロ除算回避）。
    let page_size = page_size.max(1);
    // 総ページ数を切り上げで求める。
    let total_pages = total_items.div_ceil(page_size);

    // アイテムが無い場合は空の窓を返す。
    if total_pages == 0 {
        return PageWindow {
            current_page: 1,
            total_pages: 0,
            page_numbers: vec![],
            start_index: 0,
            end_index: 0,
            has_next: false,
            has_prev: false,
        };
    }

    // 現在ページを [1, total_pages] にクランプする。
    let current_page = current_page.clamp(1, total_pages);
    // 窓サイズは最低1を保証する。
    let max_window_size = max_window_size.max(1);

    // 現在ページを中心に仮の窓を置く。
    let half = max_window_size / 2;
    let start = current_page.saturating_sub(half).max(1);
    let end = (start + max_window_size - 1).min(total_pages);
    // 末尾側で窓が縮んだ場合は先頭側へ寄せ直す。
    let start = if end - start + 1 < max_window_size {
        end.saturating_sub(max_window_size - 1).max(1)
    } else {
        start
    };

    // 現在ページのアイテム範囲を求める。
    let start_index = (current_page - 1) * page_size;
    let end_index = (start_index + page_size).min(total_items);

    PageWindow {
        current_page,
        total_pages,
        page_numbers: (start..=end).collect(),
        start_index,
        end_index,
        has_next: current_page < total_pages,
        has_prev: current_page > 1,
    }
}

/// ページ番号が遷移可能か判定する（範囲外は拒否）。
pub fn can_go_to(page: usize, total_pages: usize) -> bool {
    page >= 1 && page <= total_pages
}

/// ページサイズ変更後も表示位置を概ね維持するページ番号を返す。
///
/// 先頭に戻すのではなく、旧ページの先頭アイテムを含むページを選ぶ。
pub fn page_after_resize(old_start_index: usize, new_page_size: usize) -> usize {
    // 新サイズで旧先頭アイテムが属するページを求める。
    old_start_index / new_page_size.max(1) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_length_and_contiguity() {
        // 窓の長さが min(total_pages, max_window_size) になることを検証する。
        for total_items in [0usize, 1, 19, 20, 21, 95, 200, 1000] {
            for current in 1..=12usize {
                let w = compute_window(total_items, 20, current, 5);
                assert_eq!(w.page_numbers.len(), w.total_pages.min(5));
                // ページ番号が連続した昇順になっていることを検証する。
                for pair in w.page_numbers.windows(2) {
                    assert_eq!(pair[1], pair[0] + 1);
                }
                // 現在ページが窓に含まれることを検証する。
                if w.total_pages > 0 {
                    assert!(w.page_numbers.contains(&w.current_page));
                }
            }
        }
    }

    #[test]
    fn test_window_centering_and_boundaries() {
        // 中央付近では現在ページが窓の中心に来ることを検証する。
        let w = compute_window(200, 20, 5, 5);
        assert_eq!(w.page_numbers, vec![3, 4, 5, 6, 7]);
        // 先頭付近では窓が先頭に詰まることを検証する。
        let w = compute_window(200, 20, 1, 5);
        assert_eq!(w.page_numbers, vec![1, 2, 3, 4, 5]);
        // 末尾付近では窓が末尾に詰まることを検証する。
        let w = compute_window(200, 20, 10, 5);
        assert_eq!(w.page_numbers, vec![6, 7, 8, 9, 10]);
        // 総ページ数が窓サイズ未満なら全ページを並べる。
        let w = compute_window(45, 20, 2, 5);
        assert_eq!(w.page_numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_item_ranges_and_nav_flags() {
        // 中間ページのアイテム範囲とフラグを検証する。
        let w = compute_window(95, 20, 3, 5);
        assert_eq!(w.start_index, 40);
        assert_eq!(w.end_index, 60);
        assert!(w.has_next);
        assert!(w.has_prev);
        // 端数のある最終ページを検証する。
        let w = compute_window(95, 20, 5, 5);
        assert_eq!(w.start_index, 80);
        assert_eq!(w.end_index, 95);
        assert!(!w.has_next);
        assert!(w.has_prev);
        // 先頭ページを検証する。
        let w = compute_window(95, 20, 1, 5);
        assert!(!w.has_prev);
    }

    #[test]
    fn test_empty_list() {
        // 0件では空の窓が返ることを検証する。
        let w = compute_window(0, 20, 1, 5);
        assert_eq!(w.total_pages, 0);
        assert!(w.page_numbers.is_empty());
        assert_eq!(w.end_index, 0);
        assert!(!w.has_next && !w.has_prev);
    }

    #[test]
    fn test_out_of_range_clamps() {
        // 範囲外の現在ページがクランプされることを検証する。
        let w = compute_window(95, 20, 99, 5);
        assert_eq!(w.current_page, 5);
        let w = compute_window(95, 20, 0, 5);
        assert_eq!(w.current_page, 1);
    }

    #[test]
    fn test_can_go_to() {
        // 範囲内のみ遷移可能であることを検証する。
        assert!(can_go_to(1, 5));
        assert!(can_go_to(5, 5));
        assert!(!can_go_to(0, 5));
        assert!(!can_go_to(6, 5));
        assert!(!can_go_to(1, 0));
    }

    #[test]
    fn test_page_after_resize_keeps_position() {
        // ページサイズ変更後も旧先頭アイテムを含むページになることを検証する。
        // 20件/ページの3ページ目（start_index=40）を50件/ページへ変更する。
        assert_eq!(page_after_resize(40, 50), 1);
        // 10件/ページへ変更すると5ページ目になる。
        assert_eq!(page_after_resize(40, 10), 5);
        // 先頭は常に1ページ目のまま。
        assert_eq!(page_after_resize(0, 7), 1);
    }
}
