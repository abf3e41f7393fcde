//! Pure step generators for the discrete visualizations.
//!
//! Each generator turns an input into its complete, ordered trace up front.
//! Invalid input produces an empty trace rather than an error.

pub mod matrix;
pub mod search;
pub mod tree;

pub use matrix::{matrix_step_count, multiply_steps, replay_product, MatrixStep};
pub use search::{binary_search_steps, max_search_steps, Comparison, SearchStep};
pub use tree::{TraversalOrder, Tree, TreeEvent, TreeOperation, TreeStep, TreeTrace};

use serde::Serialize;

/// A step from any generator, as held by the playback controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum AlgorithmStep {
    Search(SearchStep),
    Tree(TreeStep),
    Matrix(MatrixStep),
}

impl From<SearchStep> for AlgorithmStep {
    fn from(step: SearchStep) -> Self {
        AlgorithmStep::Search(step)
    }
}

impl From<TreeStep> for AlgorithmStep {
    fn from(step: TreeStep) -> Self {
        AlgorithmStep::Tree(step)
    }
}

impl From<MatrixStep> for AlgorithmStep {
    fn from(step: MatrixStep) -> Self {
        AlgorithmStep::Matrix(step)
    }
}
