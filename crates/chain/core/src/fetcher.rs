//! Indexer reads with propagation-lag absorption.
//!
//! The indexer mirrors on-chain entities with a delay, and may serve
//! zero-valued placeholder records before the real data lands. Every fetch
//! here retries on a bounded linear backoff and validates the record against
//! the sentinel values before accepting it. Exhaustion returns `None`,
//! which callers must treat as "unknown", never as "confirmed absent".

use std::sync::Arc;

use game_types::{BeastKind, BeastStats, GameId, PlayerState};

use crate::retry::QueryPolicy;
use crate::traits::IndexerGateway;
use crate::types::{CurrentEncounterRecord, GameEventRow};

/// Retried, validated reads over an [`IndexerGateway`].
#[derive(Clone)]
pub struct StateFetcher {
    indexer: Arc<dyn IndexerGateway>,
    policy: QueryPolicy,
}

impl StateFetcher {
    pub fn new(indexer: Arc<dyn IndexerGateway>) -> Self {
        Self {
            indexer,
            policy: QueryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches player stats, rejecting the all-zero placeholder on every
    /// attempt.
    pub async fn fetch_player(&self, game_id: GameId) -> Option<PlayerState> {
        for attempt in 0..self.policy.max_attempts {
            self.wait(attempt, "player").await;

            match self.indexer.player(game_id).await {
                Ok(Some(record)) if !record.is_placeholder() => {
                    tracing::debug!(%game_id, ?record, "fetched player stats");
                    return Some(record.into());
                }
                Ok(Some(_)) => {
                    tracing::debug!(%game_id, "player record is all zeros, retrying");
                }
                Ok(None) => {
                    tracing::debug!(%game_id, "no player record yet, retrying");
                }
                Err(error) => {
                    tracing::warn!(%game_id, %error, "player query failed, retrying");
                }
            }
        }

        tracing::warn!(%game_id, "no valid player record after all retries");
        None
    }

    /// Fetches beast stats for the active encounter.
    ///
    /// Rejects not-yet-propagated records (`beast_type == 0` or all-zero
    /// stats). When `expected` is supplied, a record of a different kind is
    /// retried as suspect, but on the final attempt it is returned anyway as
    /// a best-effort fallback; the caller decides what to do with it.
    pub async fn fetch_beast_encounter(
        &self,
        game_id: GameId,
        expected: Option<BeastKind>,
    ) -> Option<BeastStats> {
        for attempt in 0..self.policy.max_attempts {
            self.wait(attempt, "beast encounter").await;
            let last_attempt = attempt + 1 == self.policy.max_attempts;

            match self.indexer.beast_encounter(game_id).await {
                Ok(Some(record)) if record.is_placeholder() => {
                    tracing::debug!(
                        %game_id,
                        beast_type = record.beast_type,
                        "beast record not propagated yet, retrying"
                    );
                }
                Ok(Some(record)) => {
                    let Some(stats) = record.to_stats() else {
                        tracing::debug!(
                            %game_id,
                            beast_type = record.beast_type,
                            "unknown beast kind, retrying"
                        );
                        continue;
                    };

                    if let Some(expected) = expected
                        && stats.kind != expected
                    {
                        if last_attempt {
                            tracing::warn!(
                                %game_id,
                                got = %stats.kind,
                                %expected,
                                "beast kind mismatch after all retries, returning best effort"
                            );
                            return Some(stats);
                        }
                        tracing::debug!(
                            %game_id,
                            got = %stats.kind,
                            %expected,
                            "beast kind mismatch, retrying"
                        );
                        continue;
                    }

                    tracing::debug!(%game_id, kind = %stats.kind, "fetched beast stats");
                    return Some(stats);
                }
                Ok(None) => {
                    tracing::debug!(%game_id, "no beast record yet, retrying");
                }
                Err(error) => {
                    tracing::warn!(%game_id, %error, "beast query failed, retrying");
                }
            }
        }

        tracing::warn!(%game_id, "no valid beast record after all retries");
        None
    }

    /// Fetches the current-encounter slot, used to re-validate local
    /// encounter state before fight/flee.
    ///
    /// `Some(record)` with `record.kind() == None` means the slot is
    /// confirmed empty; `None` means the indexer never answered.
    pub async fn fetch_current_encounter(
        &self,
        game_id: GameId,
    ) -> Option<CurrentEncounterRecord> {
        for attempt in 0..self.policy.max_attempts {
            self.wait(attempt, "current encounter").await;

            match self.indexer.current_encounter(game_id).await {
                Ok(Some(record)) => {
                    tracing::debug!(
                        %game_id,
                        encounter_type = record.encounter_type,
                        "fetched current encounter"
                    );
                    return Some(record);
                }
                Ok(None) => {
                    tracing::debug!(%game_id, "no current encounter record yet, retrying");
                }
                Err(error) => {
                    tracing::warn!(%game_id, %error, "current encounter query failed, retrying");
                }
            }
        }

        tracing::warn!(%game_id, "no current encounter record after all retries");
        None
    }

    /// Fetches the historical event log, best-effort and unretried;
    /// failures degrade to an empty log.
    pub async fn fetch_event_log(&self, game_id: GameId) -> Vec<GameEventRow> {
        match self.indexer.game_events(game_id).await {
            Ok(rows) => {
                tracing::debug!(%game_id, count = rows.len(), "fetched historical events");
                rows
            }
            Err(error) => {
                tracing::warn!(%game_id, %error, "failed to load historical events");
                Vec::new()
            }
        }
    }

    async fn wait(&self, attempt: u32, what: &str) {
        let delay = self.policy.delay_before(attempt);
        if attempt > 0 {
            tracing::debug!(
                attempt = attempt + 1,
                max = self.policy.max_attempts,
                ?delay,
                "retrying {what} query"
            );
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use crate::types::{BeastRecord, PlayerRecord};

    fn fetcher(chain: &Arc<MockChain>) -> StateFetcher {
        StateFetcher::new(chain.clone()).with_policy(QueryPolicy::no_delay(5))
    }

    fn zero_player() -> PlayerRecord {
        PlayerRecord {
            health: 0,
            attack_points: 0,
            damage_points: 0,
            has_free_attack: false,
            has_free_flee: false,
        }
    }

    fn live_player() -> PlayerRecord {
        PlayerRecord {
            health: 85,
            attack_points: 2,
            damage_points: 1,
            has_free_attack: false,
            has_free_flee: false,
        }
    }

    #[tokio::test]
    async fn player_exhausts_after_exactly_max_attempts() {
        let chain = Arc::new(MockChain::new());

        let result = fetcher(&chain).fetch_player(GameId::new(1)).await;
        assert_eq!(result, None);
        assert_eq!(chain.player_queries(), 5);
    }

    #[tokio::test]
    async fn all_zero_player_is_rejected_on_every_attempt() {
        let chain = Arc::new(MockChain::new());
        for _ in 0..5 {
            chain.queue_player(Some(zero_player()));
        }

        let result = fetcher(&chain).fetch_player(GameId::new(1)).await;
        assert_eq!(result, None);
        assert_eq!(chain.player_queries(), 5);
    }

    #[tokio::test]
    async fn player_accepted_once_real_data_propagates() {
        let chain = Arc::new(MockChain::new());
        chain.queue_player(None);
        chain.queue_player(Some(zero_player()));
        chain.queue_player(Some(live_player()));

        let stats = fetcher(&chain).fetch_player(GameId::new(1)).await.unwrap();
        assert_eq!(stats.health, 85);
        assert_eq!(chain.player_queries(), 3);
    }

    #[tokio::test]
    async fn beast_type_zero_is_never_valid() {
        let chain = Arc::new(MockChain::new());
        for _ in 0..5 {
            chain.queue_beast(Some(BeastRecord {
                beast_type: 0,
                attack_points: 5,
                damage_points: 5,
            }));
        }

        let result = fetcher(&chain)
            .fetch_beast_encounter(GameId::new(1), None)
            .await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn mismatched_beast_returned_best_effort_on_final_attempt() {
        let chain = Arc::new(MockChain::new());
        for _ in 0..5 {
            chain.queue_beast(Some(BeastRecord {
                beast_type: 2,
                attack_points: 4,
                damage_points: 9,
            }));
        }

        let stats = fetcher(&chain)
            .fetch_beast_encounter(GameId::new(1), Some(BeastKind::Werewolf))
            .await
            .unwrap();
        // All five attempts saw the "wrong" kind; the last one returns it.
        assert_eq!(stats.kind, BeastKind::Vampire);
        assert_eq!(chain.beast_queries(), 5);
    }

    #[tokio::test]
    async fn matching_beast_accepted_immediately() {
        let chain = Arc::new(MockChain::new());
        chain.queue_beast(Some(BeastRecord {
            beast_type: 1,
            attack_points: 4,
            damage_points: 9,
        }));

        let stats = fetcher(&chain)
            .fetch_beast_encounter(GameId::new(1), Some(BeastKind::Werewolf))
            .await
            .unwrap();
        assert_eq!(stats.kind, BeastKind::Werewolf);
        assert_eq!(chain.beast_queries(), 1);
    }

    #[tokio::test]
    async fn current_encounter_distinguishes_empty_from_unknown() {
        let chain = Arc::new(MockChain::new());
        chain.queue_current_encounter(Some(CurrentEncounterRecord { encounter_type: 0 }));

        let record = fetcher(&chain)
            .fetch_current_encounter(GameId::new(1))
            .await
            .unwrap();
        assert_eq!(record.kind(), None); // confirmed empty

        let unknown = fetcher(&chain).fetch_current_encounter(GameId::new(1)).await;
        assert_eq!(unknown, None); // indexer never answered
    }
}
