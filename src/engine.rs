/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use tracing::debug;

use crate::{Algorithm, EvaluationPolicy, Position, SearchConfig, UciMove, UctPolicy};

/// How long the engine sleeps between checks on a running search.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The Prodigy chess engine.
#[derive(Debug)]
pub struct Engine {
    /// Settings applied to every search.
    config: SearchConfig,

    algorithm: Algorithm<EvaluationPolicy, UctPolicy>,
}

impl Engine {
    /// Constructs a new [`Engine`] whose searches follow `config`.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            algorithm: Algorithm::from_config(&config),
            config,
        }
    }

    /// Returns a string of the engine's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    #[inline(always)]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches `position` and returns the best move found, if there is one.
    ///
    /// The search ends when its simulation limit is reached, its memory runs out, or `movetime`
    /// elapses, whichever comes first.
    pub fn search(
        &mut self,
        position: Position,
        movetime: Option<Duration>,
    ) -> Result<Option<UciMove>> {
        let deadline = movetime.map(|movetime| Instant::now() + movetime);
        self.algorithm.start(position, self.config.simulations)?;

        while !self.algorithm.poll()? {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!("movetime elapsed");
                self.algorithm.stop()?;
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        let side_to_move = position.side_to_move();
        Ok(self.algorithm.join()?.map(|mv| mv.to_uci(side_to_move)))
    }

    /// Searches `position` and prints the result as a `bestmove` line.
    ///
    /// A position without legal moves is reported with the null move `0000`.
    pub fn go(&mut self, position: Position, movetime: Option<Duration>) -> Result<()> {
        match self.search(position, movetime)? {
            Some(mv) => println!("bestmove {mv}"),
            None => println!("bestmove 0000"),
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}
