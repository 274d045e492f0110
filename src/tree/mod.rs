//! Derivation trees record which expansion was chosen at every non-terminal.
//!
//! A node is in one of three states:
//! - __unexpanded__: `children` is `None`. The node is a non-terminal that still awaits expansion.
//! - __leaf__: `children` is an empty list. The node is a terminal.
//! - __expanded__: `children` is a non-empty list.
//!
//! All traversals are iterative so that deep trees don't exhaust the stack.

mod iter;
mod record;

pub use iter::{BreadthFirst, DepthFirstPostOrder, DepthFirstPreOrder};

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use serde::{Deserialize, Serialize};

use crate::grammar::Grammar;

/// A path from some node down to one of its descendants, as a sequence of child indices.
pub type NodePath = Vec<usize>;

/// A node of a derivation tree that owns its children.
#[derive(Debug, Serialize, Deserialize)]
pub struct DerivationTree {
    symbol: String,
    children: Option<Vec<DerivationTree>>,
}

impl DerivationTree {
    /// Create a node with an explicit children state.
    pub fn new<S: Into<String>>(symbol: S, children: Option<Vec<DerivationTree>>) -> Self {
        Self {
            symbol: symbol.into(),
            children,
        }
    }

    /// Create a node that still needs to be expanded.
    pub fn unexpanded<S: Into<String>>(symbol: S) -> Self {
        Self::new(symbol, None)
    }

    /// Create a terminal leaf.
    pub fn leaf<S: Into<String>>(symbol: S) -> Self {
        Self::new(symbol, Some(Vec::new()))
    }

    /// Create a node with the given children.
    pub fn with_children<S: Into<String>>(symbol: S, children: Vec<DerivationTree>) -> Self {
        Self::new(symbol, Some(children))
    }

    /// The grammar symbol of this node.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The children, or `None` if the node is unexpanded.
    pub fn children(&self) -> Option<&[DerivationTree]> {
        self.children.as_deref()
    }

    /// Consume the node and return its children state.
    pub fn into_children(mut self) -> Option<Vec<DerivationTree>> {
        self.children.take()
    }

    /// Replace the children state of this node.
    pub fn set_children(&mut self, children: Option<Vec<DerivationTree>>) {
        self.children = children;
    }

    /// Number of direct children. Unexpanded nodes have none.
    pub fn len(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }

    /// True if the node has no children, either because it is a leaf or because it is unexpanded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The child at `index`.
    pub fn get(&self, index: usize) -> Option<&DerivationTree> {
        self.children.as_ref().and_then(|children| children.get(index))
    }

    /// True if the node has a children list, even an empty one.
    pub fn is_expanded(&self) -> bool {
        self.children.is_some()
    }

    /// True if the node is a terminal leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(&self.children, Some(children) if children.is_empty())
    }

    /// True if `child` is equal to one of the direct children.
    pub fn contains(&self, child: &DerivationTree) -> bool {
        self.children.as_ref().is_some_and(|children| children.contains(child))
    }

    /// Append a child. An unexpanded node becomes expanded.
    pub fn add_child(&mut self, child: DerivationTree) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// The number of levels of this tree. Leaves and unexpanded nodes have height 1.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self, 1)];

        while let Some((node, level)) = stack.pop() {
            height = height.max(level);

            if let Some(children) = &node.children {
                stack.extend(children.iter().map(|child| (child, level + 1)));
            }
        }

        height
    }

    /// Iterate over all nodes in depth-first pre-order.
    pub fn iter(&self) -> DepthFirstPreOrder<'_> {
        self.depth_first_preorder()
    }

    /// Iterate over all nodes level by level.
    pub fn breadth_first(&self) -> BreadthFirst<'_> {
        BreadthFirst::new(self)
    }

    /// Iterate over all nodes, parents before their children.
    pub fn depth_first_preorder(&self) -> DepthFirstPreOrder<'_> {
        DepthFirstPreOrder::new(self)
    }

    /// Iterate over all nodes, children before their parents.
    pub fn depth_first_postorder(&self) -> DepthFirstPostOrder<'_> {
        DepthFirstPostOrder::new(self)
    }

    /// The descendant at `path`. The empty path is this node.
    pub fn node_at(&self, path: &[usize]) -> Option<&DerivationTree> {
        let mut node = self;

        for &index in path {
            node = node.children.as_ref()?.get(index)?;
        }

        Some(node)
    }

    /// The descendant at `path`, mutably.
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut DerivationTree> {
        let mut node = self;

        for &index in path {
            node = node.children.as_mut()?.get_mut(index)?;
        }

        Some(node)
    }

    /// All unexpanded nodes as `(level, path)` in pre-order, where `level` is the
    /// distance from this node.
    pub fn unexpanded_nodes(&self) -> Vec<(usize, NodePath)> {
        let mut ret = Vec::new();
        let mut stack = vec![(self, NodePath::new())];

        while let Some((node, path)) = stack.pop() {
            match &node.children {
                None => ret.push((path.len(), path)),
                Some(children) => {
                    for (index, child) in children.iter().enumerate().rev() {
                        let mut child_path = path.clone();
                        child_path.push(index);
                        stack.push((child, child_path));
                    }
                },
            }
        }

        ret
    }

    /// Check that every expanded node matches an alternative of its symbol in `grammar`.
    ///
    /// Leaves must not be defined non-terminals, expanded nodes must be, and unexpanded
    /// nodes are accepted so that partial trees can be checked as well.
    pub fn is_valid(&self, grammar: &Grammar) -> bool {
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match &node.children {
                Some(children) if children.is_empty() => {
                    if grammar.contains(&node.symbol) {
                        tracing::debug!("Nonterminal {} has no children", node.symbol);
                        return false;
                    }
                },
                children => {
                    let expansions = match grammar.get(&node.symbol) {
                        Some(expansions) => expansions,
                        None => {
                            tracing::debug!("Symbol {} not in grammar", node.symbol);
                            return false;
                        },
                    };

                    let Some(children) = children else {
                        continue;
                    };

                    let matched = expansions
                        .iter()
                        .any(|expansion| expansion.matches(children.iter().map(|child| child.symbol.as_str())));

                    if !matched {
                        tracing::debug!("Invalid expansion {:?} for {}", children.iter().map(|c| c.symbol.as_str()).collect::<Vec<_>>(), node.symbol);
                        return false;
                    }

                    stack.extend(children.iter());
                },
            }
        }

        true
    }
}

impl Display for DerivationTree {
    /// Writes the leaf symbols from left to right.
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match &node.children {
                Some(children) if !children.is_empty() => stack.extend(children.iter().rev()),
                _ => f.write_str(&node.symbol)?,
            }
        }

        Ok(())
    }
}

// Clone, PartialEq, Hash and Drop are written out with explicit stacks so that deep
// trees don't overflow the call stack.

impl Clone for DerivationTree {
    fn clone(&self) -> Self {
        // Every frame holds a node and the copies of its children made so far
        let mut stack: Vec<(&DerivationTree, Vec<DerivationTree>)> = vec![(self, Vec::with_capacity(self.len()))];

        while let Some((node, copied)) = stack.last_mut() {
            let (node, index): (&DerivationTree, usize) = (*node, copied.len());

            if let Some(child) = node.children.as_ref().and_then(|children| children.get(index)) {
                stack.push((child, Vec::with_capacity(child.len())));
                continue;
            }

            let Some((node, copied)) = stack.pop() else {
                break;
            };
            let copy = DerivationTree::new(node.symbol.clone(), node.children.as_ref().map(|_| copied));

            match stack.last_mut() {
                Some((_, siblings)) => siblings.push(copy),
                None => return copy,
            }
        }

        unreachable!("the root frame is popped last")
    }
}

impl PartialEq for DerivationTree {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];

        while let Some((a, b)) = stack.pop() {
            if a.symbol != b.symbol {
                return false;
            }

            match (&a.children, &b.children) {
                (None, None) => {},
                (Some(a), Some(b)) if a.len() == b.len() => stack.extend(a.iter().zip(b.iter())),
                _ => return false,
            }
        }

        true
    }
}

impl Eq for DerivationTree {}

impl Hash for DerivationTree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for node in self.iter() {
            node.symbol.hash(state);
            node.children.as_ref().map(Vec::len).hash(state);
        }
    }
}

impl Drop for DerivationTree {
    fn drop(&mut self) {
        let Some(mut stack) = self.children.take() else {
            return;
        };

        while let Some(mut node) = stack.pop() {
            if let Some(children) = node.children.take() {
                stack.extend(children);
            }
        }
    }
}

impl<'a> IntoIterator for &'a DerivationTree {
    type Item = &'a DerivationTree;
    type IntoIter = DepthFirstPreOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
