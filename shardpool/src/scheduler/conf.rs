use shardpool_api::ActorId;

use crate::error::ConfigError;

/// A full partition of processor indices across worker threads: one ordered
/// list per thread slot, every processor in exactly one list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShardingConf {
    slots: Vec<Vec<ActorId>>,
}

impl ShardingConf {
    pub fn new(slots: Vec<Vec<ActorId>>) -> Self {
        Self { slots }
    }

    /// The startup partition: processor `i` goes to slot `i % threads`.
    pub fn round_robin(actor_count: usize, threads_count: usize) -> Self {
        let mut slots = vec![Vec::new(); threads_count];
        for actor in 0..actor_count {
            slots[actor % threads_count].push(actor);
        }
        Self { slots }
    }

    pub fn threads(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, thread: usize) -> &[ActorId] {
        &self.slots[thread]
    }

    pub fn slots(&self) -> &[Vec<ActorId>] {
        &self.slots
    }

    /// The thread slot owning `actor`, if any.
    pub fn slot_of(&self, actor: ActorId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.contains(&actor))
    }

    /// Check that this is a usable partition: the right number of slots,
    /// none empty, and every processor index present exactly once.
    pub fn validate(&self, actor_count: usize, threads_count: usize) -> Result<(), ConfigError> {
        if self.slots.len() != threads_count {
            return Err(ConfigError::SlotCountMismatch {
                slots: self.slots.len(),
                threads: threads_count,
            });
        }
        let mut seen = vec![false; actor_count];
        for (thread, slot) in self.slots.iter().enumerate() {
            if slot.is_empty() {
                return Err(ConfigError::EmptySlot { thread });
            }
            for &actor in slot {
                if actor >= actor_count {
                    return Err(ConfigError::UnknownActor {
                        actor,
                        count: actor_count,
                    });
                }
                if seen[actor] {
                    return Err(ConfigError::DuplicateActor { actor });
                }
                seen[actor] = true;
            }
        }
        if let Some(actor) = seen.iter().position(|&present| !present) {
            return Err(ConfigError::MissingActor { actor });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_covers_every_actor_once() {
        let conf = ShardingConf::round_robin(7, 3);
        assert_eq!(conf.threads(), 3);
        assert_eq!(conf.slot(0), &[0, 3, 6]);
        assert_eq!(conf.slot(1), &[1, 4]);
        assert_eq!(conf.slot(2), &[2, 5]);
        conf.validate(7, 3).expect("round robin is a valid partition");
    }

    #[test]
    fn slot_of_finds_the_owning_thread() {
        let conf = ShardingConf::round_robin(4, 2);
        assert_eq!(conf.slot_of(0), Some(0));
        assert_eq!(conf.slot_of(3), Some(1));
        assert_eq!(conf.slot_of(9), None);
    }

    #[test]
    fn validate_rejects_empty_slots() {
        let conf = ShardingConf::new(vec![vec![0, 1], vec![]]);
        assert_eq!(
            conf.validate(2, 2),
            Err(ConfigError::EmptySlot { thread: 1 })
        );
    }

    #[test]
    fn validate_rejects_duplicated_actors() {
        let conf = ShardingConf::new(vec![vec![0, 1], vec![1]]);
        assert_eq!(
            conf.validate(2, 2),
            Err(ConfigError::DuplicateActor { actor: 1 })
        );
    }

    #[test]
    fn validate_rejects_missing_actors() {
        let conf = ShardingConf::new(vec![vec![0], vec![2]]);
        assert_eq!(
            conf.validate(3, 2),
            Err(ConfigError::MissingActor { actor: 1 })
        );
    }

    #[test]
    fn validate_rejects_out_of_range_indices() {
        let conf = ShardingConf::new(vec![vec![0], vec![5]]);
        assert_eq!(
            conf.validate(2, 2),
            Err(ConfigError::UnknownActor { actor: 5, count: 2 })
        );
    }

    #[test]
    fn validate_rejects_wrong_slot_count() {
        let conf = ShardingConf::new(vec![vec![0, 1]]);
        assert_eq!(
            conf.validate(2, 2),
            Err(ConfigError::SlotCountMismatch {
                slots: 1,
                threads: 2
            })
        );
    }
}
