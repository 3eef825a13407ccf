//! Load-driven repartitioning.
//!
//! Turns live per-processor and per-edge average costs into a fresh
//! [`ShardingConf`]: equalize per-thread load around a target, never split
//! a single hot processor, and co-locate chatty processor pairs so their
//! traffic stays on one thread.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use shardpool_api::ActorId;

use crate::graph::ActorGraph;
use crate::scheduler::ShardingConf;

#[derive(Debug, Default)]
pub struct Rebalancer;

fn nanos(duration: Duration) -> u64 {
    duration.as_nanos().min(u64::MAX as u128) as u64
}

impl Rebalancer {
    pub fn new() -> Self {
        Self
    }

    /// Compute a new partition from measured averages.
    ///
    /// `actor_cost[a]` is processor `a`'s average tick duration;
    /// `edge_cost[e]` is edge `e`'s average delivery duration. A
    /// processor's weight is its tick cost plus the cost of all its
    /// incoming edges, the full price its owning thread pays per cycle.
    ///
    /// Panics when the result is not a complete partition with every slot
    /// non-empty; that cannot be recovered from at runtime.
    pub fn compute(
        &self,
        graph: &ActorGraph,
        actor_cost: &[Duration],
        edge_cost: &[Duration],
        threads_count: usize,
    ) -> ShardingConf {
        let actor_count = graph.actor_count();
        debug_assert_eq!(actor_cost.len(), actor_count);
        debug_assert_eq!(edge_cost.len(), graph.edge_count());

        let edge_nanos: Vec<u64> = edge_cost.iter().copied().map(nanos).collect();
        let weight: Vec<u64> = (0..actor_count)
            .map(|actor| {
                nanos(actor_cost[actor])
                    + graph
                        .incoming_edges(actor)
                        .iter()
                        .map(|&edge| edge_nanos[edge])
                        .sum::<u64>()
            })
            .collect();

        let total: u64 = weight.iter().sum();
        let target = (total / threads_count as u64).max(1);
        debug!(total, target, threads = threads_count, "repartitioning");

        // Heaviest first; index breaks ties so the order is stable.
        let mut remaining: Vec<ActorId> = (0..actor_count).collect();
        remaining.sort_by(|&a, &b| weight[b].cmp(&weight[a]).then(a.cmp(&b)));

        let mut slots: Vec<Vec<ActorId>> = vec![Vec::new(); threads_count];
        for slot in slots.iter_mut() {
            if remaining.is_empty() {
                break;
            }

            // A processor too hot to share gets the whole thread.
            if weight[remaining[0]] > target {
                slot.push(remaining.remove(0));
                continue;
            }

            Self::fill_slot(graph, &weight, &edge_nanos, &mut remaining, slot, target);
        }

        // Whatever could not be packed lands on the last thread.
        if !remaining.is_empty() {
            let last = slots.last_mut().expect("threads_count >= 1");
            last.append(&mut remaining);
        }

        let conf = ShardingConf::new(slots);
        if let Err(err) = conf.validate(actor_count, threads_count) {
            panic!("rebalance produced an unusable configuration: {err}");
        }
        conf
    }

    /// Greedy packing of one thread slot: among processors fitting the
    /// remaining budget, repeatedly take the one with the strongest traffic
    /// ties to processors already in the slot.
    fn fill_slot(
        graph: &ActorGraph,
        weight: &[u64],
        edge_nanos: &[u64],
        remaining: &mut Vec<ActorId>,
        slot: &mut Vec<ActorId>,
        target: u64,
    ) {
        let mut budget = target;
        let mut affinity: HashMap<ActorId, u64> = HashMap::new();

        loop {
            let mut best: Option<(usize, u64)> = None;
            for (position, &actor) in remaining.iter().enumerate() {
                if weight[actor] > budget {
                    continue;
                }
                let score = affinity.get(&actor).copied().unwrap_or(0);
                let better = match best {
                    None => true,
                    Some((best_position, best_score)) => {
                        let best_actor = remaining[best_position];
                        score > best_score
                            || (score == best_score && weight[actor] > weight[best_actor])
                    }
                };
                if better {
                    best = Some((position, score));
                }
            }

            let Some((position, _)) = best else {
                return;
            };
            let picked = remaining.remove(position);
            slot.push(picked);
            budget -= weight[picked];
            affinity.remove(&picked);

            // Edges touching the newly placed processor raise the pull of
            // its neighbors toward this slot, in both directions.
            for &other in remaining.iter() {
                let mut gain = 0;
                for &edge in graph.connecting_edges(picked, other) {
                    gain += edge_nanos[edge];
                }
                for &edge in graph.connecting_edges(other, picked) {
                    gain += edge_nanos[edge];
                }
                if gain > 0 {
                    *affinity.entry(other).or_insert(0) += gain;
                }
            }
        }
    }
}
