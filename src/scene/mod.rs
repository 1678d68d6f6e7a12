//! Retained scene tree for the embedded display
//!
//! The scene is an arena of nodes: tree nodes group children and carry a
//! position relative to their parent, buffer nodes display the contents of
//! one inner client surface. Each window owns one subtree, whose root is
//! tagged with the owning toplevel so hit-testing can map a buffer back to
//! its window.
//!
//! Children are stacked in insertion order: the last child of a node is the
//! top-most one.

use crate::toplevel::ToplevelId;

/// Identifier of an inner client surface, stable for the surface's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Handle to a node in a [`SceneGraph`]
///
/// Handles carry a generation so a handle to a destroyed node never resolves
/// to a node that later reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Grouping node without content of its own
    Tree,
    /// Displays the current buffer of an inner surface
    Buffer {
        surface: SurfaceId,
        width: i32,
        height: i32,
    },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    x: i32,
    y: i32,
    enabled: bool,
    kind: NodeKind,
    owner: Option<ToplevelId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Result of a point query against the scene
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hit {
    /// Window owning the surface under the point, if its ancestry is tagged
    pub toplevel: Option<ToplevelId>,
    /// Surface under the point
    pub surface: Option<SurfaceId>,
    /// Point in surface-local coordinates
    pub local_x: f64,
    pub local_y: f64,
}

/// One visible buffer in painter's order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderItem {
    pub node: NodeId,
    pub surface: SurfaceId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Arena-backed scene tree with a single root
#[derive(Debug, Clone)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a scene holding only the root tree node at (0, 0).
    pub fn new() -> Self {
        let root_node = Node {
            parent: None,
            children: Vec::new(),
            x: 0,
            y: 0,
            enabled: true,
            kind: NodeKind::Tree,
            owner: None,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root_node),
            }],
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn insert(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        if !self.contains(parent) || !matches!(self.node(parent)?.kind, NodeKind::Tree) {
            return None;
        }

        let node = Node {
            parent: Some(parent),
            children: Vec::new(),
            x: 0,
            y: 0,
            enabled: true,
            kind,
            owner: None,
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        };

        self.node_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Creates an empty tree node as the top-most child of `parent`.
    ///
    /// Returns `None` if `parent` is gone or is not a tree node.
    pub fn create_tree(&mut self, parent: NodeId) -> Option<NodeId> {
        self.insert(parent, NodeKind::Tree)
    }

    /// Creates a buffer node displaying `surface` as the top-most child of `parent`.
    pub fn create_buffer(
        &mut self,
        parent: NodeId,
        surface: SurfaceId,
        width: i32,
        height: i32,
    ) -> Option<NodeId> {
        self.insert(
            parent,
            NodeKind::Buffer {
                surface,
                width,
                height,
            },
        )
    }

    /// Destroys a node and its whole subtree.
    ///
    /// The root cannot be destroyed. Returns the number of nodes freed.
    pub fn destroy(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.contains(id) {
            return 0;
        }

        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }

        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                freed += 1;
            }
        }
        freed
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// Sets the node position relative to its parent.
    pub fn set_position(&mut self, id: NodeId, x: i32, y: i32) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.x = x;
                node.y = y;
                true
            }
            None => false,
        }
    }

    /// Position relative to the parent.
    pub fn position(&self, id: NodeId) -> Option<(i32, i32)> {
        self.node(id).map(|n| (n.x, n.y))
    }

    /// Position in scene (root) coordinates.
    pub fn absolute_position(&self, id: NodeId) -> Option<(i32, i32)> {
        let mut node = self.node(id)?;
        let (mut x, mut y) = (node.x, node.y);
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            x += node.x;
            y += node.y;
        }
        Some((x, y))
    }

    /// Disabled nodes and their subtrees are neither drawn nor hit.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.enabled).unwrap_or(false)
    }

    /// Tags a node with the window it belongs to.
    pub fn set_owner(&mut self, id: NodeId, owner: Option<ToplevelId>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.owner = owner;
                true
            }
            None => false,
        }
    }

    pub fn owner(&self, id: NodeId) -> Option<ToplevelId> {
        self.node(id)?.owner
    }

    /// Updates the displayed size of a buffer node.
    pub fn set_buffer_size(&mut self, id: NodeId, width: i32, height: i32) -> bool {
        match self.node_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Buffer {
                width: w,
                height: h,
                ..
            }) => {
                *w = width;
                *h = height;
                true
            }
            _ => false,
        }
    }

    /// Finds the top-most enabled buffer node containing the point.
    ///
    /// Returns the node and the point in the node's local coordinates.
    pub fn node_at(&self, x: f64, y: f64) -> Option<(NodeId, f64, f64)> {
        self.node_at_from(self.root, x, y, 0, 0)
    }

    fn node_at_from(
        &self,
        id: NodeId,
        x: f64,
        y: f64,
        parent_x: i32,
        parent_y: i32,
    ) -> Option<(NodeId, f64, f64)> {
        let node = self.node(id)?;
        if !node.enabled {
            return None;
        }

        let lx = parent_x + node.x;
        let ly = parent_y + node.y;

        for child in node.children.iter().rev() {
            if let Some(found) = self.node_at_from(*child, x, y, lx, ly) {
                return Some(found);
            }
        }

        if let NodeKind::Buffer { width, height, .. } = node.kind {
            let local_x = x - f64::from(lx);
            let local_y = y - f64::from(ly);
            if local_x >= 0.0
                && local_y >= 0.0
                && local_x < f64::from(width)
                && local_y < f64::from(height)
            {
                return Some((id, local_x, local_y));
            }
        }

        None
    }

    /// Maps a point to the surface under it and the window owning that surface.
    ///
    /// Tree nodes are never hit. When the buffer's ancestry carries no owner
    /// tag, the surface is still reported but the toplevel is `None`.
    pub fn hit_test(&self, x: f64, y: f64) -> Hit {
        let Some((node_id, local_x, local_y)) = self.node_at(x, y) else {
            return Hit::default();
        };

        let surface = match self.kind(node_id) {
            Some(NodeKind::Buffer { surface, .. }) => *surface,
            _ => return Hit::default(),
        };

        let mut toplevel = None;
        let mut current = Some(node_id);
        while let Some(id) = current {
            if let Some(owner) = self.owner(id) {
                toplevel = Some(owner);
                break;
            }
            current = self.parent(id);
        }

        Hit {
            toplevel,
            surface: Some(surface),
            local_x,
            local_y,
        }
    }

    /// Visible, non-empty buffers from bottom to top with scene coordinates.
    pub fn render_list(&self) -> Vec<RenderItem> {
        let mut items = Vec::new();
        self.collect_render_items(self.root, 0, 0, &mut items);
        items
    }

    fn collect_render_items(
        &self,
        id: NodeId,
        parent_x: i32,
        parent_y: i32,
        out: &mut Vec<RenderItem>,
    ) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.enabled {
            return;
        }

        let x = parent_x + node.x;
        let y = parent_y + node.y;

        if let NodeKind::Buffer {
            surface,
            width,
            height,
        } = node.kind
        {
            if width > 0 && height > 0 {
                out.push(RenderItem {
                    node: id,
                    surface,
                    x,
                    y,
                    width,
                    height,
                });
            }
        }

        for child in &node.children {
            self.collect_render_items(*child, x, y, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(
        scene: &mut SceneGraph,
        owner: u64,
        surface: u64,
        w: i32,
        h: i32,
    ) -> (NodeId, NodeId) {
        let tree = scene.create_tree(scene.root()).unwrap();
        scene.set_owner(tree, Some(ToplevelId(owner)));
        let buffer = scene.create_buffer(tree, SurfaceId(surface), w, h).unwrap();
        (tree, buffer)
    }

    #[test]
    fn new_scene_has_only_root() {
        let scene = SceneGraph::new();
        assert_eq!(scene.len(), 1);
        assert!(scene.render_list().is_empty());
        assert_eq!(scene.hit_test(1.0, 1.0), Hit::default());
    }

    #[test]
    fn destroy_frees_whole_subtree() {
        let mut scene = SceneGraph::new();
        let (tree, buffer) = window(&mut scene, 1, 1, 10, 10);
        let nested = scene.create_tree(tree).unwrap();
        scene.create_buffer(nested, SurfaceId(2), 5, 5).unwrap();
        assert_eq!(scene.len(), 5);

        assert_eq!(scene.destroy(tree), 4);
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(buffer));
        assert!(scene.children(scene.root()).is_empty());
    }

    #[test]
    fn root_cannot_be_destroyed() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert_eq!(scene.destroy(root), 0);
        assert!(scene.contains(root));
    }

    #[test]
    fn stale_handles_do_not_resolve_after_slot_reuse() {
        let mut scene = SceneGraph::new();
        let old = scene.create_tree(scene.root()).unwrap();
        scene.destroy(old);
        let new = scene.create_tree(scene.root()).unwrap();

        assert_ne!(old, new);
        assert!(!scene.set_position(old, 5, 5));
        assert_eq!(scene.position(new), Some((0, 0)));
    }

    #[test]
    fn buffers_cannot_have_children() {
        let mut scene = SceneGraph::new();
        let (_, buffer) = window(&mut scene, 1, 1, 10, 10);
        assert!(scene.create_tree(buffer).is_none());
    }

    #[test]
    fn absolute_position_sums_ancestors() {
        let mut scene = SceneGraph::new();
        let (tree, buffer) = window(&mut scene, 1, 1, 10, 10);
        scene.set_position(tree, 30, 3);
        scene.set_position(buffer, 2, 1);
        assert_eq!(scene.absolute_position(buffer), Some((32, 4)));
    }

    #[test]
    fn hit_test_reports_owner_and_local_point() {
        let mut scene = SceneGraph::new();
        let (tree, _) = window(&mut scene, 7, 70, 80, 40);
        scene.set_position(tree, 3, 3);

        let hit = scene.hit_test(13.5, 23.0);
        assert_eq!(hit.toplevel, Some(ToplevelId(7)));
        assert_eq!(hit.surface, Some(SurfaceId(70)));
        assert_eq!((hit.local_x, hit.local_y), (10.5, 20.0));
    }

    #[test]
    fn hit_test_edges_are_half_open() {
        let mut scene = SceneGraph::new();
        window(&mut scene, 1, 1, 10, 10);

        assert!(scene.hit_test(0.0, 0.0).surface.is_some());
        assert!(scene.hit_test(9.99, 9.99).surface.is_some());
        assert!(scene.hit_test(10.0, 5.0).surface.is_none());
        assert!(scene.hit_test(-0.1, 5.0).surface.is_none());
    }

    #[test]
    fn hit_test_untagged_ancestry_keeps_surface_only() {
        let mut scene = SceneGraph::new();
        let tree = scene.create_tree(scene.root()).unwrap();
        scene.create_buffer(tree, SurfaceId(9), 10, 10).unwrap();

        let hit = scene.hit_test(5.0, 5.0);
        assert_eq!(hit.toplevel, None);
        assert_eq!(hit.surface, Some(SurfaceId(9)));
    }

    #[test]
    fn topmost_child_wins_and_disabled_nodes_are_skipped() {
        let mut scene = SceneGraph::new();
        let (bottom, _) = window(&mut scene, 1, 1, 20, 20);
        let (top, _) = window(&mut scene, 2, 2, 20, 20);

        assert_eq!(scene.hit_test(5.0, 5.0).toplevel, Some(ToplevelId(2)));

        scene.set_enabled(top, false);
        assert_eq!(scene.hit_test(5.0, 5.0).toplevel, Some(ToplevelId(1)));

        scene.set_enabled(bottom, false);
        assert_eq!(scene.hit_test(5.0, 5.0), Hit::default());
    }

    #[test]
    fn render_list_is_bottom_to_top_and_skips_empty_buffers() {
        let mut scene = SceneGraph::new();
        let (a, _) = window(&mut scene, 1, 1, 10, 10);
        let (b, _) = window(&mut scene, 2, 2, 0, 10);
        let (c, _) = window(&mut scene, 3, 3, 5, 5);
        scene.set_position(a, 3, 3);
        scene.set_position(b, 16, 3);
        scene.set_position(c, 19, 3);

        let items = scene.render_list();
        let surfaces: Vec<_> = items.iter().map(|i| i.surface).collect();
        assert_eq!(surfaces, vec![SurfaceId(1), SurfaceId(3)]);
        assert_eq!((items[1].x, items[1].y), (19, 3));
    }

    #[test]
    fn buffer_size_updates_only_apply_to_buffers() {
        let mut scene = SceneGraph::new();
        let (tree, buffer) = window(&mut scene, 1, 1, 0, 0);
        assert!(!scene.set_buffer_size(tree, 10, 10));
        assert!(scene.set_buffer_size(buffer, 10, 10));
        assert!(scene.hit_test(5.0, 5.0).surface.is_some());
    }
}
