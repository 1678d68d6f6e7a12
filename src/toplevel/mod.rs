//! Toplevel registry and row layout
//!
//! Every xdg toplevel created by a plugin gets a [`Toplevel`] record with its
//! own scene subtree. The registry keeps the mapped windows in mapping order
//! and re-arranges the row after every map, unmap and commit.
//!
//! Lifecycle: `Created -> Mapped <-> Unmapped`, destroy is allowed from every
//! state and frees the scene subtree.

pub mod layout;

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::scene::{NodeId, SceneGraph, SurfaceId};
pub use layout::{horizontal_positions, LayoutParams};

/// Identifier of an inner window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToplevelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersection with `(0, 0, width, height)`; empty when disjoint.
    pub fn clip_to(self, width: i32, height: i32) -> Self {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        if x1 <= x0 || y1 <= y0 {
            return Self::default();
        }
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToplevelState {
    Created,
    Mapped,
    Unmapped,
}

/// Surface events a toplevel listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToplevelEvent {
    Map,
    Unmap,
    Commit,
    Destroy,
}

impl ToplevelEvent {
    pub const ALL: [ToplevelEvent; 4] = [
        ToplevelEvent::Map,
        ToplevelEvent::Unmap,
        ToplevelEvent::Commit,
        ToplevelEvent::Destroy,
    ];
}

/// Owned registration of a toplevel for one event of its surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub surface: SurfaceId,
    pub event: ToplevelEvent,
}

#[derive(Debug, Clone)]
pub struct Toplevel {
    pub id: ToplevelId,
    pub surface: SurfaceId,
    pub scene_tree: NodeId,
    pub buffer_node: NodeId,
    /// Geometry read from the most recent non-initial commit
    pub pending: Rectangle,
    pub state: ToplevelState,
    /// Set until the initial commit has been answered with a configure
    pub awaiting_initial_commit: bool,
    pub activated: bool,
    subscriptions: Vec<Subscription>,
}

impl Toplevel {
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn is_mapped(&self) -> bool {
        self.state == ToplevelState::Mapped
    }
}

/// What the caller must do after a commit was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// First commit of the role: answer it with a configure, nothing is arranged
    ScheduleConfigure,
    /// Geometry stored and the row re-arranged
    Arranged,
    /// Unknown toplevel
    Ignored,
}

#[derive(Debug)]
pub struct ToplevelRegistry {
    layout: LayoutParams,
    next_id: u64,
    toplevels: HashMap<ToplevelId, Toplevel>,
    /// Mapped windows in mapping order
    mapped: Vec<ToplevelId>,
    routes: HashMap<(SurfaceId, ToplevelEvent), ToplevelId>,
}

impl Default for ToplevelRegistry {
    fn default() -> Self {
        Self::new(LayoutParams::default())
    }
}

impl ToplevelRegistry {
    pub fn new(layout: LayoutParams) -> Self {
        Self {
            layout,
            next_id: 1,
            toplevels: HashMap::new(),
            mapped: Vec::new(),
            routes: HashMap::new(),
        }
    }

    pub fn layout(&self) -> LayoutParams {
        self.layout
    }

    pub fn set_layout(&mut self, scene: &mut SceneGraph, layout: LayoutParams) {
        self.layout = layout;
        self.arrange(scene);
    }

    /// Registers a new window for `surface` with a hidden scene subtree.
    pub fn create(&mut self, scene: &mut SceneGraph, surface: SurfaceId) -> Option<ToplevelId> {
        let id = ToplevelId(self.next_id);

        let scene_tree = scene.create_tree(scene.root())?;
        let Some(buffer_node) = scene.create_buffer(scene_tree, surface, 0, 0) else {
            scene.destroy(scene_tree);
            return None;
        };
        scene.set_owner(scene_tree, Some(id));
        scene.set_enabled(scene_tree, false);

        self.next_id += 1;

        let subscriptions: Vec<Subscription> = ToplevelEvent::ALL
            .iter()
            .map(|event| Subscription {
                surface,
                event: *event,
            })
            .collect();
        for sub in &subscriptions {
            self.routes.insert((sub.surface, sub.event), id);
        }

        self.toplevels.insert(
            id,
            Toplevel {
                id,
                surface,
                scene_tree,
                buffer_node,
                pending: Rectangle::default(),
                state: ToplevelState::Created,
                awaiting_initial_commit: true,
                activated: false,
                subscriptions,
            },
        );

        debug!("Created toplevel {:?} for surface {:?}", id, surface);
        Some(id)
    }

    pub fn get(&self, id: ToplevelId) -> Option<&Toplevel> {
        self.toplevels.get(&id)
    }

    /// Toplevel subscribed to `event` on `surface`, if any.
    pub fn route(&self, surface: SurfaceId, event: ToplevelEvent) -> Option<ToplevelId> {
        self.routes.get(&(surface, event)).copied()
    }

    /// Mapped windows in mapping order.
    pub fn mapped(&self) -> &[ToplevelId] {
        &self.mapped
    }

    pub fn is_mapped(&self, id: ToplevelId) -> bool {
        self.toplevels.get(&id).is_some_and(Toplevel::is_mapped)
    }

    /// Number of live toplevels, mapped or not.
    pub fn len(&self) -> usize {
        self.toplevels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toplevels.is_empty()
    }

    /// Appends the window to the row, activates it and re-arranges.
    ///
    /// Returns `false` if the window is unknown or already mapped.
    pub fn map(&mut self, scene: &mut SceneGraph, id: ToplevelId) -> bool {
        let Some(toplevel) = self.toplevels.get_mut(&id) else {
            warn!("map for unknown toplevel {:?}", id);
            return false;
        };
        if toplevel.is_mapped() {
            return false;
        }

        toplevel.state = ToplevelState::Mapped;
        toplevel.activated = true;
        scene.set_enabled(toplevel.scene_tree, true);
        self.mapped.push(id);

        info!("Mapped toplevel {:?} ({} in row)", id, self.mapped.len());
        self.arrange(scene);
        true
    }

    /// Removes the window from the row and re-arranges. The record is kept.
    pub fn unmap(&mut self, scene: &mut SceneGraph, id: ToplevelId) -> bool {
        let Some(toplevel) = self.toplevels.get_mut(&id) else {
            return false;
        };
        if !toplevel.is_mapped() {
            return false;
        }

        toplevel.state = ToplevelState::Unmapped;
        toplevel.awaiting_initial_commit = true;
        scene.set_enabled(toplevel.scene_tree, false);
        self.mapped.retain(|m| *m != id);

        info!("Unmapped toplevel {:?} ({} in row)", id, self.mapped.len());
        self.arrange(scene);
        true
    }

    /// Handles a surface commit.
    ///
    /// The first commit of the role only asks for a configure. Every later
    /// commit stores `geometry`, offsets the buffer by its origin and
    /// re-arranges, even when nothing changed.
    pub fn on_commit(
        &mut self,
        scene: &mut SceneGraph,
        id: ToplevelId,
        geometry: Rectangle,
    ) -> CommitOutcome {
        let Some(toplevel) = self.toplevels.get_mut(&id) else {
            return CommitOutcome::Ignored;
        };

        if toplevel.awaiting_initial_commit {
            toplevel.awaiting_initial_commit = false;
            return CommitOutcome::ScheduleConfigure;
        }

        toplevel.pending = geometry;
        // The window geometry origin sits at the layout position
        scene.set_position(toplevel.buffer_node, -geometry.x, -geometry.y);
        self.arrange(scene);
        CommitOutcome::Arranged
    }

    /// Destroys the window from any state.
    ///
    /// Subscriptions are dropped before the scene subtree is freed; a mapped
    /// window leaves the row and the rest is re-arranged.
    pub fn destroy(&mut self, scene: &mut SceneGraph, id: ToplevelId) -> bool {
        let Some(mut toplevel) = self.toplevels.remove(&id) else {
            return false;
        };

        for sub in toplevel.subscriptions.drain(..) {
            self.routes.remove(&(sub.surface, sub.event));
        }

        scene.destroy(toplevel.scene_tree);

        let was_mapped = toplevel.is_mapped();
        self.mapped.retain(|m| *m != id);
        if was_mapped {
            self.arrange(scene);
        }

        info!("Destroyed toplevel {:?}", id);
        true
    }

    /// Places mapped windows left to right from `(margin, margin)`.
    pub fn arrange(&self, scene: &mut SceneGraph) {
        let widths = self
            .mapped
            .iter()
            .map(|id| self.toplevels.get(id).map_or(0, |t| t.pending.width));
        let positions = horizontal_positions(widths, self.layout);

        for (id, (x, y)) in self.mapped.iter().zip(positions) {
            if let Some(toplevel) = self.toplevels.get(id) {
                scene.set_position(toplevel.scene_tree, x, y);
            }
        }
    }
}
