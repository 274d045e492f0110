use std::collections::VecDeque;

use crate::tree::DerivationTree;

/// Visits nodes level by level, left to right.
pub struct BreadthFirst<'a> {
    queue: VecDeque<&'a DerivationTree>,
}

impl<'a> BreadthFirst<'a> {
    pub(crate) fn new(root: &'a DerivationTree) -> Self {
        Self {
            queue: VecDeque::from([root]),
        }
    }
}

impl<'a> Iterator for BreadthFirst<'a> {
    type Item = &'a DerivationTree;
    
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        
        if let Some(children) = node.children() {
            self.queue.extend(children.iter());
        }
        
        Some(node)
    }
}

/// Visits a node before its children.
pub struct DepthFirstPreOrder<'a> {
    stack: Vec<&'a DerivationTree>,
}

impl<'a> DepthFirstPreOrder<'a> {
    pub(crate) fn new(root: &'a DerivationTree) -> Self {
        Self {
            stack: vec![root],
        }
    }
}

impl<'a> Iterator for DepthFirstPreOrder<'a> {
    type Item = &'a DerivationTree;
    
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        
        if let Some(children) = node.children() {
            self.stack.extend(children.iter().rev());
        }
        
        Some(node)
    }
}

/// Visits a node after all of its children.
pub struct DepthFirstPostOrder<'a> {
    /// Nodes with a flag whether their children have been pushed already
    stack: Vec<(&'a DerivationTree, bool)>,
}

impl<'a> DepthFirstPostOrder<'a> {
    pub(crate) fn new(root: &'a DerivationTree) -> Self {
        Self {
            stack: vec![(root, false)],
        }
    }
}

impl<'a> Iterator for DepthFirstPostOrder<'a> {
    type Item = &'a DerivationTree;
    
    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, visited)) = self.stack.pop() {
            if visited {
                return Some(node);
            }
            
            self.stack.push((node, true));
            
            if let Some(children) = node.children() {
                self.stack.extend(children.iter().rev().map(|child| (child, false)));
            }
        }
        
        None
    }
}
