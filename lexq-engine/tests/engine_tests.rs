//! Integration tests for the progress engine's local behavior
//!
//! Covers command handling, local write-through, notices on the event bus,
//! daily rollover scheduling and shutdown.

mod helpers;

use helpers::{state_with_xp, today, TestEngineBuilder};
use lexq_common::events::{LexqEvent, Notice, ShopItem};
use lexq_engine::error::{ClaimError, PurchaseError};
use lexq_engine::profile::Rank;
use lexq_engine::store::local::{LocalStore, PROGRESS_KEY};
use lexq_engine::EngineError;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_review_writes_through_before_reply() {
    let t = TestEngineBuilder::signed_out().start().await;

    let delta = t.engine.record_review(true).await.unwrap();

    assert!(delta.changed);
    assert_eq!(delta.notices[0], Notice::XpGained { amount: 10 });

    let persisted = t.persisted().await;
    assert_eq!(persisted.xp, 10);
    assert_eq!(persisted.coins, 5);
    assert_eq!(persisted.learned.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_review_only_moves_cursor() {
    let t = TestEngineBuilder::signed_out().start().await;

    let before = t.engine.snapshot().await.unwrap();
    t.engine.record_review(false).await.unwrap();
    let after = t.engine.snapshot().await.unwrap();

    assert_eq!(after.xp, 0);
    assert_eq!(after.coins, 0);
    assert!(after.learned.is_empty());
    assert_ne!(after.cursor, before.cursor);
}

#[tokio::test(start_paused = true)]
async fn test_startup_applies_rollover_and_persists() {
    let mut stale = state_with_xp(40, 0);
    stale.last_login_date = today().pred_opt();
    stale.streak = 4;
    stale.tasks[0].current_count = 3;

    let t = TestEngineBuilder::signed_out()
        .local_state(stale)
        .start()
        .await;

    let state = t.engine.snapshot().await.unwrap();
    assert_eq!(state.streak, 5);
    assert_eq!(state.last_login_date, Some(today()));
    assert!(state.tasks.iter().all(|q| q.current_count == 0));

    assert_eq!(t.persisted().await.streak, 5);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_local_blob_starts_fresh() {
    let t = TestEngineBuilder::signed_out().start().await;
    t.engine.shutdown().await.unwrap();

    t.local.set(PROGRESS_KEY, "{not json").await.unwrap();
    let state = t.persisted().await;

    assert_eq!(state.xp, 0);
    assert_eq!(state.tasks.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failed_purchase_leaves_state_and_publishes_notice() {
    let mut t = TestEngineBuilder::signed_out()
        .local_state(state_with_xp(0, 150))
        .start()
        .await;
    t.drain_events();

    let err = t
        .engine
        .purchase(ShopItem::StreakShield, ShopItem::StreakShield.price())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Purchase(PurchaseError::InsufficientFunds {
            needed: 200,
            available: 150
        })
    ));
    assert_eq!(t.engine.snapshot().await.unwrap().coins, 150);

    let failures: Vec<_> = t
        .drain_events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                LexqEvent::Notice {
                    notice: Notice::ActionFailed { .. },
                    ..
                }
            )
        })
        .collect();
    assert_eq!(failures.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_double_xp_purchase_doubles_quiz_reward() {
    let t = TestEngineBuilder::signed_out()
        .local_state(state_with_xp(0, 400))
        .start()
        .await;

    t.engine
        .purchase(ShopItem::DoubleXp, ShopItem::DoubleXp.price())
        .await
        .unwrap();
    let delta = t.engine.complete_quiz(10).await.unwrap();

    assert!(delta.notices.contains(&Notice::QuizCompleted { xp: 100 }));

    let state = t.engine.snapshot().await.unwrap();
    assert_eq!(state.coins, 50);
    assert_eq!(state.xp, 100);
    assert_eq!(state.boosts.double_xp_charges_remaining, 0);
    assert_eq!(state.quest("visit_shop").unwrap().current_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_quest_claim_flow() {
    let t = TestEngineBuilder::signed_out().start().await;

    let delta = t.engine.complete_quiz(20).await.unwrap();
    let ready: Vec<_> = delta
        .notices
        .iter()
        .filter_map(|n| match n {
            Notice::QuestReady { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ready, vec!["finish_quiz", "earn_xp"]);

    let delta = t.engine.claim_quest("finish_quiz").await.unwrap();
    assert_eq!(
        delta.notices,
        vec![Notice::QuestClaimed {
            id: "finish_quiz".to_string(),
            coins: 60
        }]
    );

    let state = t.engine.snapshot().await.unwrap();
    assert_eq!(state.coins, 60);
    assert_eq!(state.xp, 110);

    let again = t.engine.claim_quest("finish_quiz").await.unwrap_err();
    assert!(matches!(again, EngineError::Claim(ClaimError::NotEligible(_))));

    let missing = t.engine.claim_quest("nope").await.unwrap_err();
    assert!(matches!(missing, EngineError::Claim(ClaimError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_favorites_toggle_and_remove() {
    let t = TestEngineBuilder::signed_out().start().await;
    let current = t.engine.current_term().await.unwrap().unwrap();

    t.engine.toggle_favorite().await.unwrap();
    assert!(t.engine.snapshot().await.unwrap().is_favorite(current.id()));

    let delta = t.engine.remove_favorite(current.id()).await.unwrap();
    assert!(delta.changed);
    assert!(!t.persisted().await.is_favorite(current.id()));

    let noop = t.engine.remove_favorite(current.id()).await.unwrap();
    assert!(!noop.changed);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_check_applies_rollover_on_new_day() {
    let t = TestEngineBuilder::signed_out().start().await;
    assert_eq!(t.engine.snapshot().await.unwrap().streak, 1);

    t.clock.advance_days(1);
    tokio::time::sleep(Duration::from_secs(61)).await;

    let state = t.engine.snapshot().await.unwrap();
    assert_eq!(state.streak, 2);
    assert_eq!(state.last_login_date, today().succ_opt());
}

#[tokio::test(start_paused = true)]
async fn test_shield_protects_streak_across_missed_day() {
    let mut state = state_with_xp(0, 0);
    state.streak = 6;
    state.boosts.streak_shield_active = true;

    let t = TestEngineBuilder::signed_out()
        .local_state(state)
        .start()
        .await;

    let skip_to = today().checked_add_days(chrono::Days::new(3)).unwrap();
    let delta = t.engine.apply_daily_rollover_on(skip_to).await.unwrap();
    assert_eq!(delta.notices, vec![Notice::StreakProtected { streak: 6 }]);

    let state = t.engine.snapshot().await.unwrap();
    assert_eq!(state.streak, 6);
    assert!(!state.boosts.streak_shield_active);

    // Same day again is a no-op
    let again = t.engine.apply_daily_rollover_on(skip_to).await.unwrap();
    assert!(!again.changed);
}

#[tokio::test(start_paused = true)]
async fn test_profile_reflects_reviews() {
    let t = TestEngineBuilder::signed_out().start().await;
    for _ in 0..3 {
        t.engine.record_review(true).await.unwrap();
    }

    let profile = t.engine.profile().await.unwrap();
    assert_eq!(profile.rank, Rank::Intern);
    assert_eq!(profile.learned_count, 3);
    assert_eq!(profile.total_terms, t.engine.catalog().len());
    assert_eq!(profile.weekly_activity.len(), 7);
    assert_eq!(profile.weekly_activity.last().map(|d| d.xp), Some(30));
}

#[tokio::test(start_paused = true)]
async fn test_reset_restores_template() {
    let mut t = TestEngineBuilder::signed_out()
        .local_state(state_with_xp(900, 300))
        .start()
        .await;
    t.drain_events();

    t.engine.reset().await.unwrap();

    let state = t.persisted().await;
    assert_eq!(state.xp, 0);
    assert_eq!(state.coins, 0);
    assert_eq!(state.tasks.len(), 4);
    assert!(t
        .drain_events()
        .iter()
        .any(|e| matches!(e, LexqEvent::ProgressReset { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_handle_errors_after_shutdown() {
    let t = TestEngineBuilder::signed_out().start().await;
    let other = t.engine.clone();

    t.engine.shutdown().await.unwrap();

    let err = other.record_review(true).await.unwrap_err();
    assert!(matches!(err, EngineError::EngineStopped));
}
