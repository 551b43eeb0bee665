use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

/// Ordered n-ary tree backed by an arena.
///
/// Nodes carry structure only. Anything attached to a node lives in the
/// observer `O`, which is told about every structural change so it can keep
/// its own per-node state consistent.
pub struct Tree<O> {
    pub map: NodeMap,
    pub data: O,
}

impl<O: Observer> Tree<O> {
    pub fn with_observer(data: O) -> Self { Tree { map: NodeMap::new(), data } }

    /// Allocates a node that is not yet part of any parent.
    pub fn new_node(&mut self) -> UnattachedNode<'_, O> {
        let id = self.map.map.insert(Node::default());
        self.data.added_to_forest(&self.map, id);
        UnattachedNode { id, tree: self }
    }
}

/// Structure of every node in the arena.
///
/// A map may hold several disconnected roots; subtrees are built detached and
/// linked in once they are complete.
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
}

impl NodeMap {
    fn new() -> NodeMap { NodeMap { map: SlotMap::default() } }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }
}

impl Index<NodeId> for NodeMap {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

impl IndexMut<NodeId> for NodeMap {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output { &mut self.map[index] }
}

slotmap::new_key_type! {
    /// Handle to a node in a [`NodeMap`].
    pub struct NodeId;
}

impl NodeId {
    pub fn detach<'a, O: Observer>(self, tree: &'a mut Tree<O>) -> DetachedNode<'a, O> {
        DetachedNode { id: self, tree }
    }

    pub fn parent(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.parent)
    }

    pub fn children(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        ChildIterator {
            cur: map.map.get(self).and_then(|n| n.first_child),
            map,
        }
    }

    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PreorderTraversal::new(map, self)
    }

    /// Returns an iterator over all ancestors of the current node, including itself.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| n.parent(map));
            node
        })
    }

    pub fn next_sibling(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.next_sibling)
    }

    pub fn prev_sibling(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.prev_sibling)
    }

    pub fn first_child(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.first_child)
    }

    pub fn last_child(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.last_child)
    }

    pub fn is_empty(self, map: &NodeMap) -> bool {
        map.map.get(self).is_none_or(|n| n.first_child.is_none())
    }

    pub fn child_count(self, map: &NodeMap) -> usize { self.children(map).count() }
}

/// Notified about every structural change of a [`Tree`].
///
/// `removing_from_parent` runs while the node is still linked, so the
/// observer can inspect its old parent and siblings.
pub trait Observer {
    fn added_to_forest(&mut self, map: &NodeMap, node: NodeId);
    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId);
}

#[must_use = "Unattached nodes should be linked into the tree or removed"]
pub struct UnattachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> UnattachedNode<'a, O> {
    /// Leaves the node in the forest as a root of its own.
    pub fn into_id(self) -> NodeId { self.id }

    /// Runs `f` before the node is linked, so observers see its data on attach.
    pub fn with(self, f: impl FnOnce(NodeId, &mut Tree<O>)) -> Self {
        f(self.id, self.tree);
        self
    }

    pub fn push_back(self, parent: NodeId) -> NodeId {
        self.attach_with(|this| this.id.link_under_back(parent, &mut this.tree.map))
    }

    #[track_caller]
    pub fn insert_before(self, sibling: NodeId) -> NodeId {
        self.attach_with(|this| this.id.link_before(sibling, &mut this.tree.map))
    }

    #[track_caller]
    pub fn insert_after(self, sibling: NodeId) -> NodeId {
        self.attach_with(|this| this.id.link_after(sibling, &mut this.tree.map))
    }

    pub fn remove(self) {
        debug_assert!(self.id.parent(&self.tree.map).is_none());
        if let Some(node) = self.tree.map.map.remove(self.id) {
            node.delete_recursive(self.tree, self.id);
        }
    }

    fn attach_with(mut self, attach: impl FnOnce(&mut Self)) -> NodeId {
        attach(&mut self);
        self.tree.data.added_to_parent(&self.tree.map, self.id);
        self.id
    }
}

#[must_use = "Detached nodes should be reattached to the tree or removed"]
pub struct DetachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> DetachedNode<'a, O> {
    pub fn push_back(self, parent: NodeId) -> NodeId {
        self.attach_with(parent, |this| this.id.link_under_back(parent, &mut this.tree.map))
    }

    #[track_caller]
    pub fn insert_before(self, sibling: NodeId) -> NodeId {
        let new_parent = sibling
            .parent(&self.tree.map)
            .expect("cannot make a sibling of a root node or invalid sibling");
        self.attach_with(new_parent, |this| this.id.link_before(sibling, &mut this.tree.map))
    }

    #[track_caller]
    pub fn insert_after(self, sibling: NodeId) -> NodeId {
        let new_parent = sibling
            .parent(&self.tree.map)
            .expect("cannot make a sibling of a root node or invalid sibling");
        self.attach_with(new_parent, |this| this.id.link_after(sibling, &mut this.tree.map))
    }

    /// Moves the node to be the `index`-th child of `parent`, or last if
    /// `index` is past the end. The node must not already be a child of
    /// `parent`.
    pub fn insert_at(self, parent: NodeId, index: usize) -> NodeId {
        debug_assert_ne!(self.id.parent(&self.tree.map), Some(parent));
        let sibling = parent.children(&self.tree.map).nth(index);
        match sibling {
            Some(sibling) => self.insert_before(sibling),
            None => self.push_back(parent),
        }
    }

    /// Unlinks the node (if linked) and deletes it along with its subtree.
    pub fn remove(self) {
        if self.id.parent(&self.tree.map).is_some() {
            self.tree.data.removing_from_parent(&self.tree.map, self.id);
            self.tree.map.unlink(self.id);
        }
        if let Some(node) = self.tree.map.map.remove(self.id) {
            node.delete_recursive(self.tree, self.id);
        }
    }

    fn attach_with(mut self, new_parent: NodeId, attach: impl FnOnce(&mut Self)) -> NodeId {
        let old_parent = self.id.parent(&self.tree.map);
        let moved = old_parent != Some(new_parent);
        if moved && old_parent.is_some() {
            self.tree.data.removing_from_parent(&self.tree.map, self.id);
        }
        self.tree.map.unlink(self.id);
        attach(&mut self);
        if moved {
            self.tree.data.added_to_parent(&self.tree.map, self.id);
        }
        self.id
    }
}

#[derive(Default, PartialEq, Debug)]
pub struct Node {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
}

impl NodeId {
    fn link_under_back(self, parent: NodeId, map: &mut NodeMap) {
        if self == parent || !map.contains(self) || !map.contains(parent) {
            return;
        }
        let prev_child = {
            let parent_node = &mut map[parent];
            parent_node.first_child.get_or_insert(self);
            parent_node.last_child.replace(self)
        };
        map[self].parent = Some(parent);
        if let Some(prev) = prev_child {
            self.hlink_after(prev, map);
        }
    }

    #[track_caller]
    fn link_before(self, next: NodeId, map: &mut NodeMap) {
        let parent = next.parent(map).expect("cannot make a sibling of a root node");
        map[self].parent = Some(parent);
        let parent_node = &mut map[parent];
        if parent_node.first_child == Some(next) {
            parent_node.first_child = Some(self);
        }
        self.hlink_before(next, map);
    }

    #[track_caller]
    fn link_after(self, prev: NodeId, map: &mut NodeMap) {
        let parent = prev.parent(map).expect("cannot make a sibling of a root node");
        map[self].parent = Some(parent);
        let parent_node = &mut map[parent];
        if parent_node.last_child == Some(prev) {
            parent_node.last_child = Some(self);
        }
        self.hlink_after(prev, map);
    }

    fn hlink_after(self, prev: NodeId, map: &mut NodeMap) {
        if self == prev {
            return;
        }
        debug_assert_eq!(map[self].prev_sibling, None);
        map[self].prev_sibling = Some(prev);
        if let Some(next) = map[prev].next_sibling.replace(self) {
            map[next].prev_sibling = Some(self);
            map[self].next_sibling = Some(next);
        }
    }

    fn hlink_before(self, next: NodeId, map: &mut NodeMap) {
        if self == next {
            return;
        }
        debug_assert_eq!(map[self].next_sibling, None);
        map[self].next_sibling = Some(next);
        if let Some(prev) = map[next].prev_sibling.replace(self) {
            map[prev].next_sibling = Some(self);
            map[self].prev_sibling = Some(prev);
        }
    }
}

impl NodeMap {
    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.map.get(id) else { return };
        let (prev, next, parent) = (node.prev_sibling, node.next_sibling, node.parent);
        if let Some(prev) = prev {
            self[prev].next_sibling = next;
        }
        if let Some(next) = next {
            self[next].prev_sibling = prev;
        }
        if let Some(parent) = parent {
            let parent_node = &mut self[parent];
            if parent_node.first_child == Some(id) {
                parent_node.first_child = next;
            }
            if parent_node.last_child == Some(id) {
                parent_node.last_child = prev;
            }
        }
        let node = &mut self[id];
        node.prev_sibling = None;
        node.next_sibling = None;
        node.parent = None;
    }
}

impl Node {
    fn delete_recursive(&self, cx: &mut Tree<impl Observer>, id: NodeId) {
        cx.data.removed_from_forest(&cx.map, id);
        let mut iter = self.first_child;
        while let Some(child) = iter {
            let Some(node) = cx.map.map.remove(child) else { break };
            iter = node.next_sibling;
            node.delete_recursive(cx, child);
        }
    }
}

struct ChildIterator<'a> {
    cur: Option<NodeId>,
    map: &'a NodeMap,
}

impl<'a> Iterator for ChildIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        self.cur = id.next_sibling(self.map);
        Some(id)
    }
}

struct PreorderTraversal<'a> {
    top: NodeId,
    cur: Option<NodeId>,
    map: &'a NodeMap,
}

impl<'a> PreorderTraversal<'a> {
    fn new(map: &'a NodeMap, root: NodeId) -> Self { Self { top: root, cur: Some(root), map } }
}

impl<'a> Iterator for PreorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        self.cur = node.first_child(self.map).or_else(|| {
            node.ancestors(self.map)
                .take_while(|&ancestor| ancestor != self.top)
                .find_map(|ancestor| ancestor.next_sibling(self.map))
        });
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///        root            loose
    ///      /  |   \
    ///    a    b    c
    ///        / \
    ///      b1   b2
    /// ```
    struct Fixture {
        tree: Tree<Events>,
        root: NodeId,
        a: NodeId,
        b: NodeId,
        c: NodeId,
        b1: NodeId,
        b2: NodeId,
        loose: NodeId,
    }

    impl Fixture {
        #[rustfmt::skip]
        fn new() -> Self {
            let mut tree = Tree::with_observer(Events(vec![]));
            let root = tree.new_node().into_id();
            let a = tree.new_node().push_back(root);
            let b = tree.new_node().push_back(root);
            let c = tree.new_node().push_back(root);
            let b1 = tree.new_node().push_back(b);
            let b2 = tree.new_node().push_back(b);
            let loose = tree.new_node().into_id();
            tree.data.0.clear();
            Fixture { tree, root, a, b, c, b1, b2, loose }
        }

        fn children(&self, node: NodeId) -> Vec<NodeId> { node.children(&self.tree.map).collect() }

        #[track_caller]
        fn assert_linked(&self, expected: &[NodeId], parent: NodeId) {
            let map = &self.tree.map;
            assert_eq!(expected, self.children(parent), "children did not match");
            assert_eq!(expected.first().copied(), parent.first_child(map));
            assert_eq!(expected.last().copied(), parent.last_child(map));
            for pair in expected.windows(2) {
                assert_eq!(Some(pair[1]), pair[0].next_sibling(map));
                assert_eq!(Some(pair[0]), pair[1].prev_sibling(map));
            }
            for &child in expected {
                assert_eq!(Some(parent), child.parent(map), "child has incorrect parent");
            }
        }

        fn take_events(&mut self) -> Vec<Event> { self.tree.data.0.drain(..).collect() }
    }

    #[derive(Clone, PartialEq, Debug)]
    enum Event {
        AddedToForest(NodeId),
        AddedToParent(NodeId, NodeId),
        RemovingFromParent(NodeId, NodeId),
        RemovedFromForest(NodeId),
    }
    use Event::*;

    struct Events(Vec<Event>);

    impl Observer for Events {
        fn added_to_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(AddedToForest(node))
        }

        fn added_to_parent(&mut self, map: &NodeMap, node: NodeId) {
            let parent = node.parent(map).expect("added_to_parent called on a root");
            self.0.push(AddedToParent(node, parent))
        }

        fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
            let parent = node.parent(map).expect("removing_from_parent called on a root");
            self.0.push(RemovingFromParent(node, parent))
        }

        fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(RemovedFromForest(node))
        }
    }

    #[test]
    fn children_and_ancestors() {
        let t = Fixture::new();
        t.assert_linked(&[t.a, t.b, t.c], t.root);
        t.assert_linked(&[t.b1, t.b2], t.b);
        assert!(t.children(t.a).is_empty());
        assert!(t.loose.is_empty(&t.tree.map));
        let ancestors = |node: NodeId| node.ancestors(&t.tree.map).collect::<Vec<_>>();
        assert_eq!(vec![t.b2, t.b, t.root], ancestors(t.b2));
        assert_eq!(vec![t.loose], ancestors(t.loose));
    }

    #[test]
    fn preorder_stays_inside_subtree() {
        let t = Fixture::new();
        let walk = |node: NodeId| node.traverse_preorder(&t.tree.map).collect::<Vec<_>>();
        assert_eq!(vec![t.root, t.a, t.b, t.b1, t.b2, t.c], walk(t.root));
        assert_eq!(vec![t.b, t.b1, t.b2], walk(t.b));
        assert_eq!(vec![t.b2], walk(t.b2));
    }

    #[test]
    fn counts_and_emptiness() {
        let t = Fixture::new();
        let map = &t.tree.map;
        assert_eq!(3, t.root.child_count(map));
        assert_eq!(2, t.b.child_count(map));
        assert!(t.a.is_empty(map));
        assert!(!t.b.is_empty(map));
    }

    #[test]
    fn insert_before_and_after() {
        let mut t = Fixture::new();
        let first = t.tree.new_node().insert_before(t.a);
        let middle = t.tree.new_node().insert_after(t.b);
        let last = t.tree.new_node().insert_after(t.c);
        assert_eq!(
            vec![
                AddedToForest(first),
                AddedToParent(first, t.root),
                AddedToForest(middle),
                AddedToParent(middle, t.root),
                AddedToForest(last),
                AddedToParent(last, t.root),
            ],
            t.take_events()
        );
        t.assert_linked(&[first, t.a, t.b, middle, t.c, last], t.root);
    }

    #[test]
    fn insert_at_clamps_to_end() {
        let mut t = Fixture::new();
        let mut place = |parent: NodeId, index: usize| {
            let node = t.tree.new_node().into_id();
            node.detach(&mut t.tree).insert_at(parent, index)
        };
        let front = place(t.b, 0);
        let back = place(t.b, 99);
        let mid = place(t.b, 2);
        let only = place(t.a, 0);
        t.assert_linked(&[front, t.b1, mid, t.b2, back], t.b);
        t.assert_linked(&[only], t.a);
    }

    #[test]
    fn move_between_parents_reports_both_ends() {
        let mut t = Fixture::new();
        t.b1.detach(&mut t.tree).push_back(t.c);
        assert_eq!(
            vec![RemovingFromParent(t.b1, t.b), AddedToParent(t.b1, t.c)],
            t.take_events()
        );
        t.assert_linked(&[t.b2], t.b);
        t.assert_linked(&[t.b1], t.c);
    }

    #[test]
    fn reordering_within_parent_is_silent() {
        let mut t = Fixture::new();
        t.c.detach(&mut t.tree).insert_before(t.a);
        assert!(t.take_events().is_empty());
        t.assert_linked(&[t.c, t.a, t.b], t.root);
    }

    #[test]
    fn attaching_a_loose_root() {
        let mut t = Fixture::new();
        t.loose.detach(&mut t.tree).insert_after(t.a);
        assert_eq!(vec![AddedToParent(t.loose, t.root)], t.take_events());
        t.assert_linked(&[t.a, t.loose, t.b, t.c], t.root);
    }

    #[test]
    fn remove_subtree() {
        let mut t = Fixture::new();
        t.b.detach(&mut t.tree).remove();
        assert_eq!(
            vec![
                RemovingFromParent(t.b, t.root),
                RemovedFromForest(t.b),
                RemovedFromForest(t.b1),
                RemovedFromForest(t.b2),
            ],
            t.take_events()
        );
        t.assert_linked(&[t.a, t.c], t.root);
        assert!(!t.tree.map.contains(t.b1));

        t.a.detach(&mut t.tree).remove();
        t.c.detach(&mut t.tree).remove();
        assert!(t.root.is_empty(&t.tree.map));
        assert_eq!(None, t.root.first_child(&t.tree.map));
        assert_eq!(None, t.root.last_child(&t.tree.map));
    }

    #[test]
    fn remove_root_node() {
        let mut t = Fixture::new();
        t.loose.detach(&mut t.tree).remove();
        assert_eq!(vec![RemovedFromForest(t.loose)], t.take_events());
        assert!(!t.tree.map.contains(t.loose));
    }
}
