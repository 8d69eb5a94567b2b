/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    mem,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, TryLockError,
    },
};

use anyhow::{anyhow, bail, Result};
use tracing::debug;

use super::{Arena, ArenaObject, Handle, Region, SimulationStatistics};
use crate::{Move, MoveGenerator, NodeContext, Position, MAX_NUM_MOVES};

/// Bytes of allocations each arena of a [`Tree`] gets when none is specified.
pub const DEFAULT_ARENA_BYTES: usize = 1 << 26;

/// Size in bytes of the largest possible node, used to stop a search before its arena overflows.
pub const MAX_NODE_BYTES: usize =
    mem::size_of::<NodeHeader>() + MAX_NUM_MOVES * mem::size_of::<Edge>();

/// Location of a node: the index of the arena holding it and its offset inside that arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeHandle(u64);

impl NodeHandle {
    const OFFSET_BITS: u32 = 48;
    const OFFSET_MASK: u64 = (1 << Self::OFFSET_BITS) - 1;

    /// Marks an edge whose child hasn't been created.
    pub const NONE: Self = Self(u64::MAX);

    #[inline(always)]
    pub(crate) const fn new(arena: usize, offset: usize) -> Self {
        Self((arena as u64) << Self::OFFSET_BITS | offset as u64 & Self::OFFSET_MASK)
    }

    #[inline(always)]
    pub const fn arena(&self) -> usize {
        (self.0 >> Self::OFFSET_BITS) as usize
    }

    #[inline(always)]
    pub const fn offset(&self) -> usize {
        (self.0 & Self::OFFSET_MASK) as usize
    }

    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        self.0 == Self::NONE.0
    }
}

/// Leading part of every node allocation, directly below its edges.
#[repr(C, align(8))]
#[derive(Clone, Copy, Debug)]
pub struct NodeHeader {
    edge_count: u32,
    is_check: bool,
}

unsafe impl ArenaObject for NodeHeader {}

/// One legal move out of a node, with the statistics of every simulation that went through it.
#[repr(C, align(8))]
#[derive(Debug)]
pub struct Edge {
    child: AtomicU64,
    statistics: SimulationStatistics,
    mv: Move,
    child_context: NodeContext,
}

unsafe impl ArenaObject for Edge {}

impl Edge {
    pub fn new(mv: Move, child_context: NodeContext) -> Self {
        Self {
            child: AtomicU64::new(NodeHandle::NONE.0),
            statistics: SimulationStatistics::default(),
            mv,
            child_context,
        }
    }

    #[inline(always)]
    pub const fn mv(&self) -> &Move {
        &self.mv
    }

    /// Context of the position this edge leads to.
    #[inline(always)]
    pub const fn child_context(&self) -> NodeContext {
        self.child_context
    }

    #[inline(always)]
    pub fn simulation_count(&self) -> u32 {
        self.statistics.simulation_count()
    }

    #[inline(always)]
    pub fn cumulative_reward(&self) -> f32 {
        self.statistics.cumulative_reward()
    }

    /// Records a finished simulation through this edge. See
    /// [`SimulationStatistics::on_simulation_complete`].
    #[inline(always)]
    pub fn update(&self, reward: f32) {
        self.statistics.on_simulation_complete(reward)
    }

    #[inline(always)]
    pub fn on_simulation_complete(&self, reward: f32) {
        self.update(reward)
    }

    /// The child node, if one has been published.
    #[inline(always)]
    pub(crate) fn child(&self) -> Option<NodeHandle> {
        let child = NodeHandle(self.child.load(Ordering::Acquire));
        (!child.is_none()).then_some(child)
    }

    /// Returns the child of this edge, creating it with `create` if it doesn't exist yet.
    ///
    /// Several threads may race to create the same child. Each builds its own node in its own
    /// arena, and the first to publish wins. Every loser passes its node to `on_duplicate` and then
    /// rolls it back out of `arena`. The returned flag is `true` only for the winner.
    pub(crate) fn get_or_create_child<'t>(
        &'t self,
        tree: &'t Tree,
        arena: &mut Arena,
        create: impl FnOnce(&mut Arena) -> NodeHandle,
        on_duplicate: impl FnOnce(&Node<'_>),
    ) -> (Node<'t>, bool) {
        if let Some(child) = self.child() {
            return (tree.node(child), false);
        }

        let created = create(arena);
        match self.child.compare_exchange(
            NodeHandle::NONE.0,
            created.0,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => (tree.node(created), true),
            Err(winner) => {
                on_duplicate(&tree.node(created));
                tree.discard_node(arena, created);
                (tree.node(NodeHandle(winner)), false)
            }
        }
    }
}

/// A position in the tree: whether its side to move is in check and the edges leaving it.
///
/// A node without edges is terminal: checkmate if [`Node::is_check`], stalemate otherwise.
#[derive(Clone, Copy, Debug)]
pub struct Node<'t> {
    header: &'t NodeHeader,
    edges: &'t [Edge],
}

impl<'t> Node<'t> {
    #[inline(always)]
    pub const fn edges(&self) -> &'t [Edge] {
        self.edges
    }

    #[inline(always)]
    pub const fn edge_count(&self) -> usize {
        self.header.edge_count as usize
    }

    #[inline(always)]
    pub const fn is_check(&self) -> bool {
        self.header.is_check
    }

    #[inline(always)]
    pub const fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }
}

/// The search tree of one search, rooted at a fixed [`Position`].
///
/// Nodes live in a set of [`Arena`]s, one per concurrent writer. A [`Searcher`](super::Searcher)
/// claims an arena for the duration of its work and reads nodes from any arena. Published nodes are
/// never rolled back, so the arenas themselves are not reachable from outside the crate:
///
/// ```compile_fail
/// # use prodigy::*;
/// let tree = Tree::new(Position::default()).unwrap();
/// let (_, mut arena) = tree.claim_arena().unwrap();
/// arena.reset_all();
/// ```
pub struct Tree {
    position: Position,
    arenas: Box<[Mutex<Arena>]>,
    regions: Box<[Arc<Region>]>,
    root: NodeHandle,
}

impl Tree {
    /// Builds a tree with a single arena of [`DEFAULT_ARENA_BYTES`], expanding the root.
    pub fn new(position: Position) -> Result<Self> {
        Self::with_arenas(position, DEFAULT_ARENA_BYTES, 1)
    }

    /// Builds a tree with `count` arenas of `bytes` bytes each, expanding the root into the first.
    pub fn with_arenas(position: Position, bytes: usize, count: usize) -> Result<Self> {
        if bytes < MAX_NODE_BYTES {
            bail!("Arenas of {bytes} bytes can't hold a {MAX_NODE_BYTES} byte node.");
        }

        let mut arenas = (0..count.max(1))
            .map(|_| Arena::new(bytes))
            .collect::<Result<Vec<_>>>()?;

        let regions = arenas
            .iter()
            .map(|arena| arena.region().cloned())
            .collect::<Option<Box<[_]>>>()
            .ok_or(anyhow!("Tree arenas must own their memory."))?;

        let root = Self::expand(
            &mut arenas[0],
            0,
            &position,
            &mut Vec::with_capacity(MAX_NUM_MOVES),
        );

        let tree = Self {
            position,
            arenas: arenas.into_iter().map(Mutex::new).collect(),
            regions,
            root,
        };
        debug!(
            arenas = tree.arenas.len(),
            bytes,
            edges = tree.root().edge_count(),
            "tree created"
        );
        Ok(tree)
    }

    /// Generates every legal move of `position` and stores them as a new node in `arena`, which
    /// must be the arena at `index` of this tree.
    ///
    /// `moves` is scratch space, cleared before use.
    pub(crate) fn expand(
        arena: &mut Arena,
        index: usize,
        position: &Position,
        moves: &mut Vec<(Move, NodeContext)>,
    ) -> NodeHandle {
        moves.clear();
        let generator = MoveGenerator::new(position);
        generator.walk(moves);

        // Edges first: the cursor moves down, so the header lands directly below them
        arena.new_array(moves.iter().map(|&(mv, child)| Edge::new(mv, child)));
        let header = arena.new_object(NodeHeader {
            edge_count: moves.len() as u32,
            is_check: generator.is_check(),
        });

        NodeHandle::new(index, header.offset())
    }

    /// Rolls back `node`, which must be the most recent allocation in `arena`.
    pub(crate) fn discard_node(&self, arena: &mut Arena, node: NodeHandle) {
        let edge_count = self.node(node).edge_count();
        let edges = Handle::<Edge>::from_raw(
            node.offset() + mem::size_of::<NodeHeader>(),
            edge_count,
        );
        arena.rollback(edges);
    }

    /// Claims an arena no other thread is using.
    ///
    /// Returns `None` if every arena is claimed.
    pub(crate) fn claim_arena(&self) -> Option<(usize, MutexGuard<'_, Arena>)> {
        self.arenas
            .iter()
            .enumerate()
            .find_map(|(index, arena)| match arena.try_lock() {
                Ok(guard) => Some((index, guard)),
                // A worker that panicked leaves a consistent arena behind
                Err(TryLockError::Poisoned(poisoned)) => Some((index, poisoned.into_inner())),
                Err(TryLockError::WouldBlock) => None,
            })
    }

    #[inline(always)]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    #[inline(always)]
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    /// Resolves a handle to the node it refers to.
    ///
    /// Handles come only from this tree's arenas; an out-of-range handle aborts the process.
    pub(crate) fn node(&self, handle: NodeHandle) -> Node<'_> {
        let region = &self.regions[handle.arena()];
        // SAFETY: every `NodeHandle` in this tree was produced by `expand` on one of its arenas,
        // and published nodes are never rolled back.
        unsafe {
            let header = region.get(Handle::<NodeHeader>::from_raw(handle.offset(), 1));
            let edges = region.slice(Handle::<Edge>::from_raw(
                handle.offset() + mem::size_of::<NodeHeader>(),
                header.edge_count as usize,
            ));
            Node { header, edges }
        }
    }

    /// Total number of simulations run from the root.
    pub fn simulation_count(&self) -> u32 {
        self.root()
            .edges()
            .iter()
            .map(Edge::simulation_count)
            .sum()
    }

    /// The root move with the most simulations, or `None` if the root is terminal.
    ///
    /// Ties go to the first such edge.
    pub fn best_move(&self) -> Option<Move> {
        let mut best: Option<&Edge> = None;
        for edge in self.root().edges() {
            if best.map_or(true, |best| edge.simulation_count() > best.simulation_count()) {
                best = Some(edge);
            }
        }
        best.map(|edge| *edge.mv())
    }
}
