use crate::domain::Giveaway;
use crate::error::{GiveawayError, Result};
use crate::ledger::TicketLedger;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

/// Selects a winner for a giveaway, weighted by ticket count, and closes the
/// giveaway. Reads the ledger only; the pool is a multiset of user ids with
/// one entry per ticket held.
pub struct DrawEngine;

impl DrawEngine {
    /// Expands per-user counts into the draw pool.
    pub fn build_pool(counts: &[(i64, i64)]) -> Vec<i64> {
        counts
            .iter()
            .flat_map(|&(user_id, tickets)| std::iter::repeat(user_id).take(tickets.max(0) as usize))
            .collect()
    }

    /// Uniform pick over the pool, so the win probability of each user is
    /// proportional to their ticket count. A draw is terminal: the giveaway
    /// is deactivated on success. An empty pool is reported and the giveaway
    /// stays active; a draw is never forced through.
    pub fn draw<R: Rng>(ledger: &mut TicketLedger, giveaway: &Giveaway, rng: &mut R) -> Result<i64> {
        let pool = Self::build_pool(&ledger.ticket_counts(giveaway.id)?);
        let Some(&winner) = pool.choose(rng) else {
            return Err(GiveawayError::NoParticipants);
        };
        ledger.deactivate(giveaway.id)?;
        info!(
            "Giveaway '{}' ({}) drawn: winner {} out of {} tickets",
            giveaway.name,
            giveaway.id,
            winner,
            pool.len()
        );
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_repeats_each_user_once_per_ticket() {
        let pool = DrawEngine::build_pool(&[(1, 2), (2, 3)]);
        assert_eq!(pool, vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn empty_counts_build_an_empty_pool() {
        assert!(DrawEngine::build_pool(&[]).is_empty());
    }
}
