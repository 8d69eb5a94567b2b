/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::atomic::{AtomicU32, Ordering};

/// Visit count and summed reward of one edge, shared between search threads.
#[repr(C)]
#[derive(Debug, Default)]
pub struct SimulationStatistics {
    simulation_count: AtomicU32,
    /// Bits of an `f32`.
    cumulative_reward: AtomicU32,
}

impl SimulationStatistics {
    #[inline(always)]
    pub fn simulation_count(&self) -> u32 {
        self.simulation_count.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn cumulative_reward(&self) -> f32 {
        f32::from_bits(self.cumulative_reward.load(Ordering::Acquire))
    }

    /// Records one finished simulation that produced `reward`.
    ///
    /// The count and the reward are updated separately, so a concurrent reader can see the new
    /// count before the new reward.
    pub fn on_simulation_complete(&self, reward: f32) {
        self.simulation_count.fetch_add(1, Ordering::Release);

        let mut expected = self.cumulative_reward.load(Ordering::Relaxed);
        loop {
            let updated = (f32::from_bits(expected) + reward).to_bits();
            match self.cumulative_reward.compare_exchange_weak(
                expected,
                updated,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => expected = actual,
            }
        }
    }
}
