/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{anyhow, Result};
use tracing::{debug, trace};

use super::{Arena, Edge, RolloutPolicy, Tree, TreePolicy, MAX_NODE_BYTES};
use crate::{Move, NodeContext, MAX_NUM_MOVES};

/// Runs simulations against a [`Tree`] from a single thread.
#[derive(Debug)]
pub struct Searcher<R, T> {
    rollout_policy: R,
    tree_policy: T,

    /// Scratch space for expanding nodes.
    moves: Vec<(Move, NodeContext)>,
}

impl<R: RolloutPolicy, T: TreePolicy> Searcher<R, T> {
    pub fn new(rollout_policy: R, tree_policy: T) -> Self {
        Self {
            rollout_policy,
            tree_policy,
            moves: Vec::with_capacity(MAX_NUM_MOVES),
        }
    }

    /// Runs simulations until `until` returns `true` for the tree's simulation count, or until the
    /// claimed arena can no longer hold a node.
    ///
    /// `until` is consulted once before every simulation. Fails if every arena of `tree` is already
    /// claimed by another searcher.
    pub fn search_until(&mut self, tree: &Tree, mut until: impl FnMut(u32) -> bool) -> Result<()> {
        let (index, mut arena) = tree
            .claim_arena()
            .ok_or(anyhow!("Every arena of the tree is in use."))?;

        if tree.root().is_terminal() {
            return Ok(());
        }

        self.rollout_policy.on_search_start(tree.position().board());

        loop {
            if arena.remaining() < MAX_NODE_BYTES {
                debug!(
                    arena = index,
                    size = arena.size(),
                    "arena exhausted, stopping searcher"
                );
                break;
            }

            if until(tree.simulation_count()) {
                break;
            }

            self.simulate(tree, index, &mut arena);
        }

        Ok(())
    }

    /// Selects a path from the root to a leaf, expands it, and backpropagates its reward.
    fn simulate(&mut self, tree: &Tree, index: usize, arena: &mut Arena) {
        let mut position = *tree.position();
        let mut node = tree.root();
        let mut parent_visits = tree.simulation_count();
        let mut path: Vec<&Edge> = Vec::new();

        self.rollout_policy.on_simulation_start();

        while !node.is_terminal() {
            let edge = &node.edges()[self.tree_policy.select(parent_visits.max(1), node.edges())];

            self.rollout_policy
                .on_move(position.side_to_move(), edge.mv());
            position.advance(edge.mv(), edge.child_context());
            path.push(edge);
            parent_visits = edge.simulation_count();

            let moves = &mut self.moves;
            let (child, created) = edge.get_or_create_child(
                tree,
                arena,
                |arena| Tree::expand(arena, index, &position, moves),
                |duplicate| trace!(edges = duplicate.edge_count(), "discarded duplicate expansion"),
            );
            node = child;

            if created {
                break;
            }
        }

        // Reward for whoever played the last move of the path
        let reward = match (node.is_terminal(), node.is_check()) {
            (true, true) => 1.0,
            (true, false) => 0.0,
            _ => self.rollout_policy.simulate(!position.side_to_move()),
        };

        for (ply, edge) in path.iter().rev().enumerate() {
            edge.update(if ply % 2 == 0 { reward } else { -reward });
        }
    }
}
