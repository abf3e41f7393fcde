use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `values[mid] == target`.
    Found,
    /// `values[mid] < target`; the search continues in `mid + 1..=right`.
    SearchRight,
    /// `values[mid] > target`; the search continues in `left..=mid - 1`.
    SearchLeft,
    /// The probe at `mid` emptied the range.
    NotFound,
}

/// One probe of a binary search. Bounds are those in effect for the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchStep {
    pub left: usize,
    pub right: usize,
    pub mid: usize,
    pub mid_value: i64,
    pub target: i64,
    pub comparison: Comparison,
}

/// Upper bound on the trace length for `n` elements: `ceil(log2 n) + 1`.
pub fn max_search_steps(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (usize::BITS - (n - 1).leading_zeros()) as usize + 1
}

/// Traces a binary search for `target` over sorted `values`.
///
/// Empty or unsorted input yields an empty trace.
pub fn binary_search_steps(values: &[i64], target: i64) -> Vec<SearchStep> {
    if values.is_empty() || !values.windows(2).all(|w| w[0] <= w[1]) {
        return Vec::new();
    }

    let mut steps = Vec::with_capacity(max_search_steps(values.len()));
    let mut left = 0usize;
    let mut right = values.len() - 1;

    loop {
        let mid = left + (right - left) / 2;
        let mid_value = values[mid];
        let mut step = SearchStep {
            left,
            right,
            mid,
            mid_value,
            target,
            comparison: Comparison::Found,
        };

        if mid_value == target {
            steps.push(step);
            break;
        }

        if mid_value < target {
            if mid + 1 > right {
                step.comparison = Comparison::NotFound;
                steps.push(step);
                break;
            }
            step.comparison = Comparison::SearchRight;
            steps.push(step);
            left = mid + 1;
        } else {
            if mid == left {
                step.comparison = Comparison::NotFound;
                steps.push(step);
                break;
            }
            step.comparison = Comparison::SearchLeft;
            steps.push(step);
            right = mid - 1;
        }
    }

    steps
}
