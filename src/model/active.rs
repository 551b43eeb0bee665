use slotmap::SecondaryMap;

use crate::model::tree::{NodeId, NodeMap};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    AddedToForest(NodeId),
    AddedToParent(NodeId),
    RemovingFromParent(NodeId),
    RemovedFromForest(NodeId),
}

/// Which child of a tab layout is currently shown.
///
/// Only layouts that hold tabs have an entry. The entry follows the tree: the
/// first tab added to a layout becomes active, and removing the active tab
/// hands the role to the first tab left behind.
#[derive(Default)]
pub struct Active {
    nodes: SecondaryMap<NodeId, NodeId>,
}

impl Active {
    pub fn get(&self, map: &NodeMap, layout: NodeId) -> Option<NodeId> {
        let active = self.nodes.get(layout).copied();
        if let Some(active) = active {
            debug_assert_eq!(active.parent(map), Some(layout));
        }
        active
    }

    /// Makes `node` the active child of its parent. Returns whether anything
    /// changed.
    pub fn activate(&mut self, map: &NodeMap, node: NodeId) -> bool {
        let Some(parent) = node.parent(map) else {
            return false;
        };
        self.nodes.insert(parent, node).is_none_or(|prev| prev != node)
    }

    pub fn clear(&mut self, layout: NodeId) { self.nodes.remove(layout); }

    pub fn handle_event(
        &mut self,
        map: &NodeMap,
        event: TreeEvent,
        is_tab: impl Fn(NodeId) -> bool,
    ) {
        use TreeEvent::*;
        match event {
            AddedToForest(_) => {}
            AddedToParent(node) => {
                let Some(parent) = node.parent(map) else { return };
                if is_tab(node) && !self.nodes.contains_key(parent) {
                    self.nodes.insert(parent, node);
                }
            }
            RemovingFromParent(node) => {
                let Some(parent) = node.parent(map) else { return };
                if self.nodes.get(parent) != Some(&node) {
                    return;
                }
                let successor = parent.children(map).find(|&child| child != node && is_tab(child));
                match successor {
                    Some(next) => {
                        self.nodes.insert(parent, next);
                    }
                    None => {
                        self.nodes.remove(parent);
                    }
                }
            }
            RemovedFromForest(node) => {
                self.nodes.remove(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree::{Observer, Tree};

    /// Every node except the root counts as a tab.
    struct Tracker {
        root: Option<NodeId>,
        active: Active,
    }

    impl Tracker {
        fn dispatch(&mut self, map: &NodeMap, event: TreeEvent) {
            let root = self.root;
            self.active.handle_event(map, event, |node| Some(node) != root);
        }
    }

    impl Observer for Tracker {
        fn added_to_forest(&mut self, map: &NodeMap, node: NodeId) {
            self.dispatch(map, TreeEvent::AddedToForest(node))
        }

        fn added_to_parent(&mut self, map: &NodeMap, node: NodeId) {
            self.dispatch(map, TreeEvent::AddedToParent(node))
        }

        fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
            self.dispatch(map, TreeEvent::RemovingFromParent(node))
        }

        fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId) {
            self.dispatch(map, TreeEvent::RemovedFromForest(node))
        }
    }

    fn setup() -> (Tree<Tracker>, NodeId, [NodeId; 3]) {
        let mut tree = Tree::with_observer(Tracker { root: None, active: Active::default() });
        let root = tree.new_node().into_id();
        tree.data.root = Some(root);
        let tabs = [(); 3].map(|_| tree.new_node().push_back(root));
        (tree, root, tabs)
    }

    #[test]
    fn first_tab_becomes_active() {
        let (tree, root, [a, _, _]) = setup();
        assert_eq!(Some(a), tree.data.active.get(&tree.map, root));
    }

    #[test]
    fn activate_reports_changes() {
        let (mut tree, root, [a, b, _]) = setup();
        assert!(tree.data.active.activate(&tree.map, b));
        assert!(!tree.data.active.activate(&tree.map, b));
        assert_eq!(Some(b), tree.data.active.get(&tree.map, root));
        assert!(!tree.data.active.activate(&tree.map, root));
        assert!(tree.data.active.activate(&tree.map, a));
    }

    #[test]
    fn removing_active_moves_to_first_remaining() {
        let (mut tree, root, [a, b, c]) = setup();
        tree.data.active.activate(&tree.map, c);
        c.detach(&mut tree).remove();
        assert_eq!(Some(a), tree.data.active.get(&tree.map, root));
        a.detach(&mut tree).remove();
        assert_eq!(Some(b), tree.data.active.get(&tree.map, root));
    }

    #[test]
    fn removing_inactive_keeps_active() {
        let (mut tree, root, [a, b, c]) = setup();
        tree.data.active.activate(&tree.map, b);
        a.detach(&mut tree).remove();
        c.detach(&mut tree).remove();
        assert_eq!(Some(b), tree.data.active.get(&tree.map, root));
    }

    #[test]
    fn last_tab_leaving_clears_entry() {
        let (mut tree, root, tabs) = setup();
        for tab in tabs {
            tab.detach(&mut tree).remove();
        }
        assert_eq!(None, tree.data.active.get(&tree.map, root));
    }

    #[test]
    fn moved_tab_activates_empty_destination() {
        let (mut tree, root, [a, b, _]) = setup();
        let other = tree.new_node().into_id();
        b.detach(&mut tree).push_back(other);
        assert_eq!(Some(b), tree.data.active.get(&tree.map, other));
        assert_eq!(Some(a), tree.data.active.get(&tree.map, root));
    }
}
