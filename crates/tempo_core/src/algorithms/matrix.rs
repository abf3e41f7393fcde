use nalgebra::DMatrix;
use serde::Serialize;
use tracing::warn;

/// One inner-product term of `C[row, col] = Σ_k A[row, k] · B[k, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixStep {
    pub row: usize,
    pub col: usize,
    pub k: usize,
    pub a: i64,
    pub b: i64,
    /// Sum of the terms `0..=k`.
    pub partial_sum: i64,
    /// Set on the last term of a cell; `partial_sum` is then the cell value.
    pub commit: bool,
}

/// `m · n · p` for compatible operands, otherwise 0.
pub fn matrix_step_count(a: &DMatrix<i64>, b: &DMatrix<i64>) -> usize {
    if a.ncols() != b.nrows() || a.is_empty() || b.is_empty() {
        return 0;
    }
    a.nrows() * a.ncols() * b.ncols()
}

/// Traces `a * b` in `i`, then `j`, then `k` order.
///
/// Dimension mismatch, empty operands and overflowing sums yield an empty
/// trace.
pub fn multiply_steps(a: &DMatrix<i64>, b: &DMatrix<i64>) -> Vec<MatrixStep> {
    let count = matrix_step_count(a, b);
    if count == 0 {
        return Vec::new();
    }

    let inner = a.ncols();
    let mut steps = Vec::with_capacity(count);
    for row in 0..a.nrows() {
        for col in 0..b.ncols() {
            let mut sum = 0i64;
            for k in 0..inner {
                let (x, y) = (a[(row, k)], b[(k, col)]);
                let Some(next) = x.checked_mul(y).and_then(|term| sum.checked_add(term)) else {
                    warn!(row, col, k, "matrix product overflows i64; discarding trace");
                    return Vec::new();
                };
                sum = next;
                steps.push(MatrixStep {
                    row,
                    col,
                    k,
                    a: x,
                    b: y,
                    partial_sum: sum,
                    commit: k + 1 == inner,
                });
            }
        }
    }
    steps
}

/// Rebuilds the product from the committed steps of a trace.
pub fn replay_product(steps: &[MatrixStep], rows: usize, cols: usize) -> DMatrix<i64> {
    let mut out = DMatrix::zeros(rows, cols);
    for step in steps.iter().filter(|s| s.commit) {
        if step.row < rows && step.col < cols {
            out[(step.row, step.col)] = step.partial_sum;
        }
    }
    out
}
