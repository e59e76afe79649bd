#[cfg(test)]
mod tests {
    use clip_giveaway::draw::DrawEngine;
    use clip_giveaway::error::GiveawayError;
    use clip_giveaway::ledger::TicketLedger;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    const T0: i64 = 1_700_000_000;

    #[test]
    fn draw_with_no_tickets_leaves_the_giveaway_active() {
        let mut ledger = TicketLedger::open_in_memory().unwrap();
        let gw = ledger.create_giveaway_at("prize", T0, 24, 99).unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let result = DrawEngine::draw(&mut ledger, &gw, &mut rng);
        assert!(matches!(result, Err(GiveawayError::NoParticipants)));

        // not forced through: the giveaway is still running
        assert!(ledger.active_giveaway().unwrap().is_some());
    }

    #[test]
    fn draw_picks_a_ticket_holder_and_closes_the_giveaway() {
        let mut ledger = TicketLedger::open_in_memory().unwrap();
        let gw = ledger.create_giveaway_at("prize", T0, 24, 99).unwrap();
        for user in [1, 2, 3] {
            ledger.record_user(user, None).unwrap();
            ledger.grant_base_ticket(user, gw.id).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(7);
        let winner = DrawEngine::draw(&mut ledger, &gw, &mut rng).unwrap();
        assert!([1, 2, 3].contains(&winner));

        // a draw is terminal
        assert!(ledger.active_giveaway().unwrap().is_none());
    }

    #[test]
    fn win_probability_tracks_ticket_share() {
        // user 2 holds 3 of 4 tickets; over repeated seeded picks the
        // observed frequency should sit near 0.75
        let pool = DrawEngine::build_pool(&[(1, 1), (2, 3)]);
        assert_eq!(pool.len(), 4);

        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;
        let mut wins_for_two = 0u32;
        for _ in 0..trials {
            if *pool.choose(&mut rng).unwrap() == 2 {
                wins_for_two += 1;
            }
        }
        let share = f64::from(wins_for_two) / f64::from(trials);
        assert!(
            (share - 0.75).abs() < 0.02,
            "observed share {share} strays too far from 0.75"
        );
    }
}
