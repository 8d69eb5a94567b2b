/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::{divide, init, perft, Engine, Position, SearchConfig, FEN_STARTPOS};

/// Command-line arguments of the engine.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// A task for the engine to perform.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Counts the leaf nodes of the move tree of a position, down to the supplied depth.
    Perft {
        /// Position to count from, as FEN.
        #[arg(short, long, default_value = FEN_STARTPOS)]
        fen: Position,

        depth: usize,
    },

    /// Performs a perft on every child of a position, printing the node count under each move.
    #[command(aliases = ["splitperft", "sperft"])]
    Divide {
        /// Position to count from, as FEN.
        #[arg(short, long, default_value = FEN_STARTPOS)]
        fen: Position,

        depth: usize,
    },

    /// Searches a position and prints the best move found.
    #[command(alias = "go")]
    Search {
        /// Position to search, as FEN.
        #[arg(short, long, default_value = FEN_STARTPOS)]
        fen: Position,

        /// Number of search threads. Defaults to the available parallelism.
        #[arg(short, long)]
        threads: Option<usize>,

        /// Bytes of tree memory given to each search thread.
        #[arg(long)]
        arena_bytes: Option<usize>,

        /// Exploration constant of the tree policy.
        #[arg(short, long)]
        exploration: Option<f32>,

        /// Stop after this many simulations.
        #[arg(short, long)]
        simulations: Option<u32>,

        /// Stop after this many milliseconds.
        #[arg(short, long)]
        movetime: Option<u64>,
    },
}

impl Cli {
    /// Executes the parsed command, printing its results to stdout.
    pub fn run(self) -> Result<()> {
        // Tables may already exist when embedding the CLI
        if let Err(e) = init() {
            debug!("{e}");
        }

        match self.command {
            Command::Perft { fen, depth } => println!("{}", perft(&fen, depth)?),

            Command::Divide { fen, depth } => {
                let counts = divide(&fen, depth)?;
                for (mv, nodes) in &counts {
                    println!("{mv}\t{nodes}");
                }
                println!("\n{}", counts.values().sum::<u64>());
            }

            Command::Search {
                fen,
                threads,
                arena_bytes,
                exploration,
                simulations,
                movetime,
            } => {
                let defaults = SearchConfig::default();
                let config = SearchConfig {
                    threads: threads.unwrap_or(defaults.threads),
                    arena_bytes: arena_bytes.unwrap_or(defaults.arena_bytes),
                    exploration: exploration.unwrap_or(defaults.exploration),
                    simulations,
                };
                Engine::new(config).go(fen, movetime.map(Duration::from_millis))?;
            }
        }

        Ok(())
    }
}
