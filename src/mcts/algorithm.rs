/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use super::{
    EvaluationPolicy, RolloutPolicy, Searcher, Tree, TreePolicy, UctPolicy, DEFAULT_ARENA_BYTES,
};
use crate::{Move, Position};

/// Knobs for a parallel search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchConfig {
    /// Number of worker threads.
    pub threads: usize,

    /// Bytes of arena memory given to each worker.
    pub arena_bytes: usize,

    /// Exploration constant of the UCT tree policy.
    pub exploration: f32,

    /// Simulations to run before stopping on its own. `None` searches until stopped or out of memory.
    pub simulations: Option<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, |threads| threads.get()),
            arena_bytes: DEFAULT_ARENA_BYTES,
            exploration: std::f32::consts::SQRT_2,
            simulations: None,
        }
    }
}

type Factory<P> = Arc<dyn Fn() -> P + Send + Sync>;

/// A search in progress.
struct Search {
    tree: Arc<Tree>,

    /// Raised to make every worker finish its current simulation and exit.
    stop: Arc<AtomicBool>,

    workers: Vec<JoinHandle<Result<()>>>,
}

/// Parallel Monte Carlo Tree Search over a fresh [`Tree`] per search.
///
/// An [`Algorithm`] is either idle or searching. [`Algorithm::start`] begins a search, which runs
/// until its simulation limit is reached, its arenas fill up, or [`Algorithm::stop`] is called.
/// [`Algorithm::join`] waits for the workers and makes the algorithm idle again.
pub struct Algorithm<R, T> {
    threads: usize,
    arena_bytes: usize,
    rollout_policy: Factory<R>,
    tree_policy: Factory<T>,
    search: Option<Search>,
}

impl<R, T> Algorithm<R, T>
where
    R: RolloutPolicy + Send + 'static,
    T: TreePolicy + Send + 'static,
{
    /// Creates an idle algorithm whose workers build their policies with the provided factories.
    pub fn new(
        threads: usize,
        arena_bytes: usize,
        rollout_policy: impl Fn() -> R + Send + Sync + 'static,
        tree_policy: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            threads: threads.max(1),
            arena_bytes,
            rollout_policy: Arc::new(rollout_policy),
            tree_policy: Arc::new(tree_policy),
            search: None,
        }
    }

    #[inline(always)]
    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Starts searching `position` on every worker thread.
    ///
    /// Workers stop once `simulations` simulations have been claimed, if provided. The final count
    /// never exceeds it.
    pub fn start(&mut self, position: Position, simulations: Option<u32>) -> Result<()> {
        if self.search.is_some() {
            bail!("Already searching.");
        }

        let tree = Arc::new(Tree::with_arenas(position, self.arena_bytes, self.threads)?);
        let stop = Arc::new(AtomicBool::new(false));
        let claimed = Arc::new(AtomicU64::new(0));
        let limit = simulations.map_or(u64::MAX, u64::from);

        let workers = (0..self.threads)
            .map(|id| {
                let tree = Arc::clone(&tree);
                let stop = Arc::clone(&stop);
                let claimed = Arc::clone(&claimed);
                let rollout_policy = Arc::clone(&self.rollout_policy);
                let tree_policy = Arc::clone(&self.tree_policy);

                thread::Builder::new()
                    .name(format!("search-{id}"))
                    .spawn(move || {
                        let mut searcher = Searcher::new(rollout_policy(), tree_policy());
                        // Each call claims one simulation slot, so the total never overshoots
                        searcher.search_until(&tree, |_| {
                            stop.load(Ordering::Acquire)
                                || claimed.fetch_add(1, Ordering::AcqRel) >= limit
                        })
                    })
                    .with_context(|| format!("Failed to spawn search thread {id}"))
            })
            .collect::<Result<Vec<_>>>();

        let workers = match workers {
            Ok(workers) => workers,
            Err(err) => {
                stop.store(true, Ordering::Release);
                return Err(err);
            }
        };

        debug!(
            %position,
            threads = self.threads,
            ?simulations,
            "search started"
        );
        self.search = Some(Search {
            tree,
            stop,
            workers,
        });
        Ok(())
    }

    /// Returns `true` once every worker has exited.
    pub fn poll(&self) -> Result<bool> {
        let search = self.search.as_ref().ok_or(anyhow!("Not searching."))?;
        Ok(search.workers.iter().all(JoinHandle::is_finished))
    }

    /// Asks every worker to exit after its current simulation. Calling this more than once is fine.
    pub fn stop(&self) -> Result<()> {
        let search = self.search.as_ref().ok_or(anyhow!("Not searching."))?;
        if !search.stop.swap(true, Ordering::AcqRel) {
            debug!(simulations = search.tree.simulation_count(), "search stopping");
        }
        Ok(())
    }

    /// Waits for every worker to exit and hands back the finished tree.
    pub fn join_tree(&mut self) -> Result<Tree> {
        let search = self.search.take().ok_or(anyhow!("Not searching."))?;

        for worker in search.workers {
            let name = worker.thread().name().unwrap_or("search").to_string();
            worker
                .join()
                .map_err(|_| anyhow!("Search thread {name} panicked"))??;
        }

        let tree = Arc::try_unwrap(search.tree)
            .map_err(|_| anyhow!("Search tree is still shared after every worker exited"))?;
        debug!(
            simulations = tree.simulation_count(),
            "search joined"
        );
        Ok(tree)
    }

    /// Waits for every worker to exit and returns the root move with the most simulations.
    ///
    /// `None` if the searched position has no legal moves.
    pub fn join(&mut self) -> Result<Option<Move>> {
        Ok(self.join_tree()?.best_move())
    }
}

impl Algorithm<EvaluationPolicy, UctPolicy> {
    /// Creates an idle algorithm using material evaluation and UCT, configured by `config`.
    pub fn from_config(config: &SearchConfig) -> Self {
        let exploration = config.exploration;
        Self::new(
            config.threads,
            config.arena_bytes,
            EvaluationPolicy::default,
            move || UctPolicy::new(exploration),
        )
    }
}

impl<R, T> Drop for Algorithm<R, T> {
    fn drop(&mut self) {
        if let Some(search) = self.search.take() {
            search.stop.store(true, Ordering::Release);
            for worker in search.workers {
                // Errors have nowhere to go while dropping
                let _ = worker.join();
            }
        }
    }
}

impl<R, T> fmt::Debug for Algorithm<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Algorithm")
            .field("threads", &self.threads)
            .field("arena_bytes", &self.arena_bytes)
            .field("searching", &self.search.is_some())
            .finish()
    }
}
