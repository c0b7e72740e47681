//! Index arena holding a document tree during expansion.
//!
//! Each slot owns one node with its `content` detached; the slot's
//! `children` list holds arena indices instead. Replacing a node's children
//! is a single assignment to that list, so the expander never needs parent
//! pointers or in-place surgery on a borrowed tree.

use herald_types::document::DocumentNode;

#[derive(Debug)]
pub(crate) struct Slot {
    pub node: DocumentNode,
    /// Unprocessed children, taken by the expander when the slot is visited.
    pub pending: Vec<DocumentNode>,
    pub children: Vec<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `node`, keeping its children aside until the slot is visited.
    pub fn push(&mut self, mut node: DocumentNode) -> usize {
        let pending = std::mem::take(&mut node.content);
        self.slots.push(Slot {
            node,
            pending,
            children: Vec::new(),
        });
        self.slots.len() - 1
    }

    pub fn take_pending(&mut self, id: usize) -> Vec<DocumentNode> {
        std::mem::take(&mut self.slots[id].pending)
    }

    pub fn set_children(&mut self, id: usize, children: Vec<usize>) {
        self.slots[id].children = children;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reassemble the tree rooted at `id`, consuming the arena.
    pub fn into_tree(mut self, id: usize) -> DocumentNode {
        let mut nodes: Vec<Option<DocumentNode>> = Vec::with_capacity(self.slots.len());
        let mut children: Vec<Vec<usize>> = Vec::with_capacity(self.slots.len());
        for slot in self.slots.drain(..) {
            nodes.push(Some(slot.node));
            children.push(slot.children);
        }
        assemble(id, &mut nodes, &children)
    }
}

fn assemble(id: usize, nodes: &mut [Option<DocumentNode>], children: &[Vec<usize>]) -> DocumentNode {
    let mut node = nodes[id].take().unwrap_or_else(|| DocumentNode::text(""));
    node.content = children[id]
        .iter()
        .map(|&child| assemble(child, nodes, children))
        .collect();
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_types::document::NodeKind;

    #[test]
    fn test_push_detaches_children_and_reassembles() {
        let mut arena = Arena::new();
        let root = arena.push(
            DocumentNode::new(NodeKind::Doc).with_content(vec![DocumentNode::text("a")]),
        );
        let pending = arena.take_pending(root);
        assert_eq!(pending.len(), 1);

        let child = arena.push(pending.into_iter().next().unwrap());
        arena.set_children(root, vec![child]);
        assert_eq!(arena.len(), 2);

        let tree = arena.into_tree(root);
        assert_eq!(tree.content.len(), 1);
        assert_eq!(tree.content[0].text.as_deref(), Some("a"));
    }
}
