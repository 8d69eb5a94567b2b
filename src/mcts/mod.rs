/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Multi-threaded search lifecycle.
mod algorithm;

/// Bump allocation out of anonymous memory maps.
mod arena;

/// Selection and rollout strategies.
mod policy;

/// The single-threaded simulation loop.
mod searcher;

/// Atomic per-edge visit and reward counters.
mod statistics;

/// Nodes and edges of the search tree.
mod tree;

pub use algorithm::*;
pub use arena::*;
pub use policy::*;
pub use searcher::*;
pub use statistics::*;
pub use tree::*;
