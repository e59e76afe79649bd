#[cfg(test)]
mod tests {
    use clip_giveaway::config::Config;
    use clip_giveaway::engine::{EligibilityEngine, RejectReason, SubmissionOutcome};
    use clip_giveaway::handlers::{Command, CommandHandlers};
    use clip_giveaway::ledger::TicketLedger;
    use clip_giveaway::sources::{ResolveError, ResolvePublishTime};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ADMIN: i64 = 99;
    const T0: i64 = 1_700_000_000;

    /// Canned resolver so the state machine can be driven without touching
    /// the network; counts invocations to prove the duplicate short-circuit.
    struct StubResolver {
        result: Result<i64, ResolveError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ResolvePublishTime for StubResolver {
        async fn resolve(&self, _url: &str) -> Result<i64, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn test_config() -> Config {
        Config {
            youtube_api_key: "test-key".into(),
            admin_id: ADMIN,
            bot_handle: "clip_giveaway_bot".into(),
            db_path: ":memory:".into(),
        }
    }

    fn engine_with(result: Result<i64, ResolveError>) -> (EligibilityEngine, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = StubResolver {
            result,
            calls: calls.clone(),
        };
        let engine = EligibilityEngine::new(
            TicketLedger::open_in_memory().unwrap(),
            Box::new(resolver),
            &test_config(),
        );
        (engine, calls)
    }

    fn start_giveaway(engine: &mut EligibilityEngine) -> i64 {
        engine
            .ledger_mut()
            .create_giveaway_at("iPhone 16 Pro", T0, 24, ADMIN)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn video_published_before_start_is_rejected() {
        let (mut engine, _) = engine_with(Ok(T0 - 10));
        start_giveaway(&mut engine);
        engine.join(1, None, None).unwrap();

        let report = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                reason: RejectReason::PublishedBeforeStart {
                    publish_time: T0 - 10,
                    start_time: T0,
                },
            }
        );
    }

    #[tokio::test]
    async fn video_published_exactly_at_start_is_accepted() {
        let (mut engine, _) = engine_with(Ok(T0));
        let gw = start_giveaway(&mut engine);
        engine.join(1, None, None).unwrap();

        let report = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(report.outcome, SubmissionOutcome::Accepted { publish_time: T0 });
        assert!(engine.ledger().has_video_ticket(1, gw).unwrap());
    }

    #[tokio::test]
    async fn video_published_after_start_is_accepted() {
        let (mut engine, _) = engine_with(Ok(T0 + 10));
        start_giveaway(&mut engine);

        let report = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Accepted { publish_time: T0 + 10 }
        );
    }

    #[tokio::test]
    async fn second_submission_short_circuits_before_the_resolver() {
        let (mut engine, calls) = engine_with(Ok(T0 + 10));
        start_giveaway(&mut engine);

        let first = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert!(matches!(first.outcome, SubmissionOutcome::Accepted { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = engine.submit_video(1, "https://vk.com/clip-1_2").await.unwrap();
        assert_eq!(
            second.outcome,
            SubmissionOutcome::Rejected {
                reason: RejectReason::DuplicateSubmission,
            }
        );
        // The resolver must not have been consulted again
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submission_without_a_running_giveaway_is_rejected() {
        let (mut engine, calls) = engine_with(Ok(T0));

        let report = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                reason: RejectReason::NoActiveGiveaway,
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolver_diagnostics_surface_in_the_rejection() {
        let (mut engine, _) = engine_with(Err(ResolveError::TimestampNotLocated));
        start_giveaway(&mut engine);

        let report = engine.submit_video(1, "https://vk.com/clip-1_2").await.unwrap();
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                reason: RejectReason::Provenance(ResolveError::TimestampNotLocated),
            }
        );
    }

    #[tokio::test]
    async fn oversized_video_diagnostic_passes_through_regardless_of_timestamp() {
        let (mut engine, _) = engine_with(Err(ResolveError::ExceedsDurationLimit(90)));
        start_giveaway(&mut engine);

        let report = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert_eq!(
            report.outcome,
            SubmissionOutcome::Rejected {
                reason: RejectReason::Provenance(ResolveError::ExceedsDurationLimit(90)),
            }
        );
    }

    #[tokio::test]
    async fn admin_submissions_carry_the_debug_payload() {
        let (mut engine, _) = engine_with(Ok(T0 + 30));
        start_giveaway(&mut engine);

        let report = engine.submit_video(ADMIN, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        let debug = report.debug.expect("admin outcome should carry debug data");
        assert_eq!(debug.publish_time, Some(T0 + 30));
        assert_eq!(debug.start_time, T0);
        assert_eq!(debug.delta, Some(30));

        let report = engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        assert!(report.debug.is_none());
    }

    #[tokio::test]
    async fn join_grants_base_and_credits_the_referrer() {
        let (mut engine, _) = engine_with(Ok(T0));
        let gw = start_giveaway(&mut engine);

        let summary = engine.join(1, Some("alice"), None).unwrap();
        assert!(summary.base_granted);
        assert!(!summary.referral_credited);
        let link = summary.referral_link.unwrap();
        assert!(link.ends_with(&format!("start={gw}_1")));

        let summary = engine.join(2, None, Some(&format!("{gw}_1"))).unwrap();
        assert!(summary.base_granted);
        assert!(summary.referral_credited);

        // referrer: base + one referral; referred: base only
        assert_eq!(engine.ledger().user_ticket_count(1, gw).unwrap(), 2);
        assert_eq!(engine.ledger().user_ticket_count(2, gw).unwrap(), 1);

        // repeat join through the same link credits nothing further
        let summary = engine.join(2, None, Some(&format!("{gw}_1"))).unwrap();
        assert!(!summary.referral_credited);
        assert!(!summary.base_granted);
        assert_eq!(engine.ledger().user_ticket_count(1, gw).unwrap(), 2);
    }

    #[tokio::test]
    async fn malformed_or_stale_referral_payloads_change_nothing() {
        let (mut engine, _) = engine_with(Ok(T0));
        let gw = start_giveaway(&mut engine);
        engine.join(1, None, None).unwrap();

        let self_referral = format!("{gw}_2");
        for payload in ["junk", "1_x", "999_1", self_referral.as_str()] {
            let summary = engine.join(2, None, Some(payload)).unwrap();
            assert!(!summary.referral_credited, "payload {payload:?} must not credit");
        }
        assert_eq!(engine.ledger().referral_count(1, gw).unwrap(), 0);
        assert_eq!(engine.ledger().user_ticket_count(1, gw).unwrap(), 1);
    }

    #[tokio::test]
    async fn profile_reflects_ticket_standing() {
        let (mut engine, _) = engine_with(Ok(T0 + 5));
        let gw = start_giveaway(&mut engine);
        engine.join(1, None, None).unwrap();
        engine.join(2, None, Some(&format!("{gw}_1"))).unwrap();
        engine.submit_video(1, "https://youtu.be/dQw4w9WgXcQ").await.unwrap();

        let view = engine.profile(1).unwrap().unwrap();
        assert_eq!(view.total_tickets, 3);
        assert_eq!(view.referral_count, 1);
        assert!(view.has_video);

        let view = engine.profile(2).unwrap().unwrap();
        assert_eq!(view.total_tickets, 1);
        assert!(!view.has_video);
    }

    #[tokio::test]
    async fn admin_commands_are_silent_for_everyone_else() {
        let (engine, _) = engine_with(Ok(T0));
        let mut handlers = CommandHandlers::new(engine);

        for command in [
            Command::Create { name: "prize".into(), hours: 24 },
            Command::Draw,
            Command::Stats,
            Command::Top { limit: 10 },
            Command::Cancel,
            Command::RemoveVideo { user_id: 1 },
        ] {
            let reply = handlers.dispatch(5, None, command).await.unwrap();
            assert!(reply.is_silent());
        }
        // nothing was created behind the silent no-ops
        assert!(handlers.engine().ledger().active_giveaway().unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_flow_creates_reports_and_cancels() {
        let (engine, _) = engine_with(Ok(T0));
        let mut handlers = CommandHandlers::new(engine);

        let reply = handlers
            .dispatch(ADMIN, None, Command::Create { name: "prize".into(), hours: 24 })
            .await
            .unwrap();
        assert!(reply.text.contains("prize"));

        handlers.dispatch(1, Some("alice"), Command::Start { payload: None }).await.unwrap();
        let reply = handlers.dispatch(ADMIN, None, Command::Stats).await.unwrap();
        assert!(reply.text.contains("Participants: 1"));

        let reply = handlers.dispatch(ADMIN, None, Command::Top { limit: 10 }).await.unwrap();
        assert!(reply.text.contains("@alice"));

        let reply = handlers.dispatch(ADMIN, None, Command::Cancel).await.unwrap();
        assert!(reply.text.contains("cancelled"));
        assert!(handlers.engine().ledger().active_giveaway().unwrap().is_none());
    }
}
