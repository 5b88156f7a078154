//! Uniform keyframe selection over an ordered snapshot sequence.

/// Index positions for up to `k` keyframes over a sequence of length `n`.
///
/// Endpoints are always included for `n > k`: index 0 and index `n - 1`.
/// Consecutive duplicate indices produced by rounding are dropped while
/// preserving order, so the result may hold fewer than `k` entries; callers
/// get "up to k", never padding.
pub fn keyframe_indices(n: usize, k: usize) -> Vec<usize> {
    if n == 0 || k == 0 {
        return Vec::new();
    }
    if n <= k {
        return (0..n).collect();
    }

    let mut out = Vec::with_capacity(k);
    for j in 0..k {
        let idx = (j as f64 * (n - 1) as f64 / (k - 1) as f64).round() as usize;
        if out.last() != Some(&idx) {
            out.push(idx);
        }
    }
    out
}

/// Pick up to `k` representative items from an ordered slice. Deterministic
/// and purely positional: no randomness, no dependence on content.
pub fn pick_uniform<T: Clone>(items: &[T], k: usize) -> Vec<T> {
    keyframe_indices(items.len(), k)
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_items_four_keyframes() {
        // round(j * 9 / 3) for j = 0..3
        assert_eq!(keyframe_indices(10, 4), vec![0, 3, 6, 9]);
    }

    #[test]
    fn endpoints_always_included() {
        for n in [5_usize, 17, 100, 999] {
            for k in [2_usize, 3, 4] {
                let idxs = keyframe_indices(n, k);
                assert_eq!(*idxs.first().unwrap(), 0, "n={n} k={k}");
                assert_eq!(*idxs.last().unwrap(), n - 1, "n={n} k={k}");
            }
        }
    }

    #[test]
    fn fewer_items_than_target_returns_all() {
        assert_eq!(keyframe_indices(5, 8), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn single_item_returns_it_for_any_k() {
        for k in 1..10 {
            assert_eq!(keyframe_indices(1, k), vec![0]);
        }
    }

    #[test]
    fn empty_input_or_zero_target_is_empty() {
        assert!(keyframe_indices(0, 8).is_empty());
        assert!(keyframe_indices(10, 0).is_empty());
        assert!(keyframe_indices(0, 0).is_empty());
    }

    #[test]
    fn indices_are_strictly_increasing_and_in_bounds() {
        for n in 1..60_usize {
            for k in 1..60_usize {
                let idxs = keyframe_indices(n, k);
                assert!(idxs.len() <= k.min(n));
                assert!(idxs.windows(2).all(|w| w[0] < w[1]), "n={n} k={k}");
                assert!(idxs.iter().all(|&i| i < n), "n={n} k={k}");
            }
        }
    }

    #[test]
    fn pick_uniform_clones_selected_items() {
        let items: Vec<i32> = (0..10).collect();
        assert_eq!(pick_uniform(&items, 4), vec![0, 3, 6, 9]);
        assert_eq!(pick_uniform(&items, 100), items);
        let empty: Vec<i32> = Vec::new();
        assert!(pick_uniform(&empty, 4).is_empty());
    }
}
