//! Persistent binary search tree and its operation traces.
//!
//! Every edit rebuilds only the path from the root to the edited node and
//! shares all other subtrees with the previous version, so each step of a
//! trace can hold the tree it refers to.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

type Link = Option<Arc<Node>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub value: i64,
    pub left: Tree,
    pub right: Tree,
}

impl Node {
    fn leaf(value: i64) -> Self {
        Self {
            value,
            left: Tree::new(),
            right: Tree::new(),
        }
    }
}

/// Immutable BST with unique values (`left < node < right`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tree {
    root: Link,
}

impl Tree {
    pub fn new() -> Self {
        Self { root: None }
    }

    fn from_link(root: Link) -> Self {
        Self { root }
    }

    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        values
            .into_iter()
            .fold(Tree::new(), |tree, value| tree.insert(value))
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Whether both trees are the same allocation (shared, not merely equal).
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.root().map_or(0, |n| 1 + n.left.len() + n.right.len())
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        self.root().map_or(0, |n| 1 + n.left.height().max(n.right.height()))
    }

    pub fn contains(&self, value: i64) -> bool {
        let mut cursor = self.root();
        while let Some(node) = cursor {
            cursor = match value.cmp(&node.value) {
                Ordering::Less => node.left.root(),
                Ordering::Greater => node.right.root(),
                Ordering::Equal => return true,
            };
        }
        false
    }

    pub fn min(&self) -> Option<i64> {
        let mut node = self.root()?;
        while let Some(left) = node.left.root() {
            node = left;
        }
        Some(node.value)
    }

    /// Returns a new tree containing `value`. Inserting an existing value
    /// returns a tree sharing the whole structure of `self`.
    pub fn insert(&self, value: i64) -> Tree {
        if self.contains(value) {
            return self.clone();
        }
        Tree::from_link(insert_link(&self.root, value))
    }

    /// Returns a new tree without `value`.
    ///
    /// A node with two children takes the value of its in-order successor,
    /// and the successor's value is then deleted from the right subtree.
    pub fn delete(&self, value: i64) -> Tree {
        if !self.contains(value) {
            return self.clone();
        }
        Tree::from_link(delete_link(&self.root, value))
    }

    pub fn traverse(&self, order: TraversalOrder) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.len());
        walk(self, order, &mut |value| out.push(value));
        out
    }

    pub fn in_order(&self) -> Vec<i64> {
        self.traverse(TraversalOrder::InOrder)
    }

    /// Checks `left < node < right` for every node.
    pub fn is_ordered(&self) -> bool {
        fn check(tree: &Tree, low: Option<i64>, high: Option<i64>) -> bool {
            match tree.root() {
                None => true,
                Some(node) => {
                    low.map_or(true, |l| node.value > l)
                        && high.map_or(true, |h| node.value < h)
                        && check(&node.left, low, Some(node.value))
                        && check(&node.right, Some(node.value), high)
                }
            }
        }
        check(self, None, None)
    }
}

fn insert_link(link: &Link, value: i64) -> Link {
    match link {
        None => Some(Arc::new(Node::leaf(value))),
        Some(node) => match value.cmp(&node.value) {
            Ordering::Less => Some(Arc::new(Node {
                value: node.value,
                left: Tree::from_link(insert_link(&node.left.root, value)),
                right: node.right.clone(),
            })),
            Ordering::Greater => Some(Arc::new(Node {
                value: node.value,
                left: node.left.clone(),
                right: Tree::from_link(insert_link(&node.right.root, value)),
            })),
            Ordering::Equal => Some(Arc::clone(node)),
        },
    }
}

fn delete_link(link: &Link, value: i64) -> Link {
    let node = link.as_ref()?;
    match value.cmp(&node.value) {
        Ordering::Less => Some(Arc::new(Node {
            value: node.value,
            left: Tree::from_link(delete_link(&node.left.root, value)),
            right: node.right.clone(),
        })),
        Ordering::Greater => Some(Arc::new(Node {
            value: node.value,
            left: node.left.clone(),
            right: Tree::from_link(delete_link(&node.right.root, value)),
        })),
        Ordering::Equal => match (&node.left.root, &node.right.root) {
            (None, None) => None,
            (Some(_), None) => node.left.root.clone(),
            (None, Some(_)) => node.right.root.clone(),
            (Some(_), Some(_)) => {
                let successor = node.right.min()?;
                Some(Arc::new(Node {
                    value: successor,
                    left: node.left.clone(),
                    right: Tree::from_link(delete_link(&node.right.root, successor)),
                }))
            }
        },
    }
}

/// Path-copies `target`'s node with its value replaced by `replacement`.
fn replace_link(link: &Link, target: i64, replacement: i64) -> Link {
    let node = link.as_ref()?;
    Some(Arc::new(match target.cmp(&node.value) {
        Ordering::Less => Node {
            value: node.value,
            left: Tree::from_link(replace_link(&node.left.root, target, replacement)),
            right: node.right.clone(),
        },
        Ordering::Greater => Node {
            value: node.value,
            left: node.left.clone(),
            right: Tree::from_link(replace_link(&node.right.root, target, replacement)),
        },
        Ordering::Equal => Node {
            value: replacement,
            left: node.left.clone(),
            right: node.right.clone(),
        },
    }))
}

fn walk(tree: &Tree, order: TraversalOrder, visit: &mut impl FnMut(i64)) {
    let Some(node) = tree.root() else {
        return;
    };
    if order == TraversalOrder::PreOrder {
        visit(node.value);
    }
    walk(&node.left, order, visit);
    if order == TraversalOrder::InOrder {
        visit(node.value);
    }
    walk(&node.right, order, visit);
    if order == TraversalOrder::PostOrder {
        visit(node.value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    InOrder,
    PreOrder,
    PostOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum TreeOperation {
    Insert(i64),
    Delete(i64),
    Search(i64),
    Traverse(TraversalOrder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeleteCase {
    Leaf,
    OneChild,
    TwoChildren { successor: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TreeEvent {
    /// Compared against `node` and moved towards `direction`.
    Compare { node: i64, direction: Direction },
    /// Walking the leftmost path of the right subtree to find the successor.
    SuccessorScan { node: i64 },
    /// The node being deleted now carries its successor's value.
    ReplaceWithSuccessor { target: i64, successor: i64 },
    Inserted { value: i64 },
    Duplicate { value: i64 },
    Found { value: i64 },
    NotFound { value: i64 },
    Deleted { value: i64, case: DeleteCase },
    Visit { node: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeStep {
    pub event: TreeEvent,
    /// Node values visited so far, in visiting order.
    pub path: Vec<i64>,
    /// The tree this step refers to.
    pub tree: Tree,
}

/// Steps of one operation plus the tree the operation leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeTrace {
    pub steps: Vec<TreeStep>,
    pub result: Tree,
}

impl TreeOperation {
    /// Upper bound on the trace length for this operation on `tree`.
    pub fn step_bound(&self, tree: &Tree) -> usize {
        let h = tree.height();
        match self {
            TreeOperation::Insert(_) | TreeOperation::Search(_) => h + 1,
            TreeOperation::Delete(_) => 2 * h + 1,
            TreeOperation::Traverse(_) => tree.len(),
        }
    }

    pub fn generate(&self, tree: &Tree) -> TreeTrace {
        match *self {
            TreeOperation::Insert(value) => insert_steps(tree, value),
            TreeOperation::Delete(value) => delete_steps(tree, value),
            TreeOperation::Search(value) => search_steps(tree, value),
            TreeOperation::Traverse(order) => traversal_steps(tree, order),
        }
    }
}

struct Recorder {
    steps: Vec<TreeStep>,
    path: Vec<i64>,
}

impl Recorder {
    fn new(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
            path: Vec::new(),
        }
    }

    fn visit(&mut self, value: i64, event: TreeEvent, tree: &Tree) {
        self.path.push(value);
        self.emit(event, tree);
    }

    fn emit(&mut self, event: TreeEvent, tree: &Tree) {
        self.steps.push(TreeStep {
            event,
            path: self.path.clone(),
            tree: tree.clone(),
        });
    }

    /// Walks from `tree`'s root towards `value`, recording a compare step per
    /// node passed. Returns the matching node, if any.
    fn descend<'a>(&mut self, tree: &'a Tree, value: i64) -> Option<&'a Node> {
        let mut cursor = tree.root();
        while let Some(node) = cursor {
            let direction = match value.cmp(&node.value) {
                Ordering::Equal => return Some(node),
                Ordering::Less => Direction::Left,
                Ordering::Greater => Direction::Right,
            };
            self.visit(
                node.value,
                TreeEvent::Compare {
                    node: node.value,
                    direction,
                },
                tree,
            );
            cursor = match direction {
                Direction::Left => node.left.root(),
                Direction::Right => node.right.root(),
            };
        }
        None
    }

    fn finish(self, result: Tree) -> TreeTrace {
        TreeTrace {
            steps: self.steps,
            result,
        }
    }
}

pub fn insert_steps(tree: &Tree, value: i64) -> TreeTrace {
    let mut rec = Recorder::new(TreeOperation::Insert(value).step_bound(tree));
    if let Some(node) = rec.descend(tree, value) {
        rec.visit(node.value, TreeEvent::Duplicate { value }, tree);
        return rec.finish(tree.clone());
    }
    let result = tree.insert(value);
    rec.visit(value, TreeEvent::Inserted { value }, &result);
    rec.finish(result)
}

pub fn search_steps(tree: &Tree, value: i64) -> TreeTrace {
    if tree.is_empty() {
        return TreeTrace {
            steps: Vec::new(),
            result: tree.clone(),
        };
    }
    let mut rec = Recorder::new(TreeOperation::Search(value).step_bound(tree));
    match rec.descend(tree, value) {
        Some(node) => rec.visit(node.value, TreeEvent::Found { value }, tree),
        None => rec.emit(TreeEvent::NotFound { value }, tree),
    }
    rec.finish(tree.clone())
}

pub fn delete_steps(tree: &Tree, value: i64) -> TreeTrace {
    if tree.is_empty() {
        return TreeTrace {
            steps: Vec::new(),
            result: tree.clone(),
        };
    }
    let mut rec = Recorder::new(TreeOperation::Delete(value).step_bound(tree));
    let Some(target) = rec.descend(tree, value) else {
        rec.emit(TreeEvent::NotFound { value }, tree);
        return rec.finish(tree.clone());
    };
    rec.path.push(target.value);

    let case = match (target.left.root(), target.right.root()) {
        (None, None) => DeleteCase::Leaf,
        (Some(_), None) | (None, Some(_)) => DeleteCase::OneChild,
        (Some(_), Some(right)) => {
            let mut successor = right;
            rec.visit(
                successor.value,
                TreeEvent::SuccessorScan {
                    node: successor.value,
                },
                tree,
            );
            while let Some(left) = successor.left.root() {
                successor = left;
                rec.visit(
                    successor.value,
                    TreeEvent::SuccessorScan {
                        node: successor.value,
                    },
                    tree,
                );
            }
            let intermediate = Tree::from_link(replace_link(&tree.root, value, successor.value));
            rec.emit(
                TreeEvent::ReplaceWithSuccessor {
                    target: value,
                    successor: successor.value,
                },
                &intermediate,
            );
            DeleteCase::TwoChildren {
                successor: successor.value,
            }
        }
    };

    let result = tree.delete(value);
    rec.emit(TreeEvent::Deleted { value, case }, &result);
    rec.finish(result)
}

pub fn traversal_steps(tree: &Tree, order: TraversalOrder) -> TreeTrace {
    let mut rec = Recorder::new(tree.len());
    for value in tree.traverse(order) {
        rec.visit(value, TreeEvent::Visit { node: value }, tree);
    }
    rec.finish(tree.clone())
}
