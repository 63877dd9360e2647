use bot_core::{PointsEngine, PurchaseError};
use contracts::{ActivityEvent, BotConfig, LedgerSnapshot, TierRecord};
use proptest::prelude::*;

fn two_tier_config() -> BotConfig {
    BotConfig {
        tiers: vec![TierRecord::new("A", 10), TierRecord::new("B", 20)],
        ..BotConfig::default()
    }
}

fn feed(engine: &mut PointsEngine, user_id: &str, count: u64) -> usize {
    let mut milestone_count = 0;
    for offset in 0..count {
        let event = ActivityEvent::new(user_id, "chan_general", 1_000 + offset);
        milestone_count += engine.record_activity(&event).milestones.len();
    }
    milestone_count
}

#[test]
fn stock_config_carries_the_five_shipped_tiers() {
    let engine = PointsEngine::from_config(BotConfig::default()).expect("stock config is valid");

    let names: Vec<_> = engine
        .all_tiers()
        .iter()
        .map(|tier| tier.role_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Well-Known", "Respected", "Elite", "Legend", "Divine"]
    );
    assert_eq!(engine.all_tiers()[4].point_threshold, 100);
}

#[test]
fn snapshot_orders_accounts_by_user_id_and_round_trips() {
    let mut engine = PointsEngine::from_config(two_tier_config()).expect("config is valid");
    feed(&mut engine, "zeta", 3);
    feed(&mut engine, "alpha", 1);

    let snapshot = engine.snapshot();
    let user_ids: Vec<_> = snapshot
        .accounts
        .iter()
        .map(|account| account.user_id.as_str())
        .collect();
    assert_eq!(user_ids, vec!["alpha", "zeta"]);

    let encoded = serde_json::to_string(&snapshot).expect("serialize");
    let decoded: LedgerSnapshot = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(snapshot, decoded);
}

proptest! {
    #[test]
    fn n_single_increment_events_yield_n_points(count in 1_u64..200) {
        let mut engine = PointsEngine::from_config(two_tier_config()).expect("config is valid");
        let milestone_count = feed(&mut engine, "user_a", count);

        prop_assert_eq!(engine.current_points("user_a"), count as i64);

        let expected_milestones =
            usize::from(count >= 10) + usize::from(count >= 20);
        prop_assert_eq!(milestone_count, expected_milestones);
    }

    #[test]
    fn failed_purchase_never_mutates_the_account(balance in 0_i64..10) {
        let mut engine = PointsEngine::from_config(two_tier_config()).expect("config is valid");
        feed(&mut engine, "user_a", balance as u64);

        let err = engine
            .purchase_role("user_a", None, "A", 9_000)
            .expect_err("balance below threshold");
        prop_assert_eq!(
            err,
            PurchaseError::InsufficientFunds {
                role_name: "A".to_string(),
                shortfall: 10 - balance,
            }
        );
        prop_assert_eq!(engine.current_points("user_a"), balance);
        prop_assert!(engine.available_roles("user_a").is_empty());
    }

    #[test]
    fn cooldown_counts_iff_gap_has_elapsed(gap in 0_u64..120) {
        let mut config = two_tier_config();
        config.accrual_cooldown_secs = 60;
        let mut engine = PointsEngine::from_config(config).expect("config is valid");

        let first = engine.record_activity(&ActivityEvent::new("user_a", "chan", 5_000));
        prop_assert!(first.counted);

        let second = engine.record_activity(&ActivityEvent::new("user_a", "chan", 5_000 + gap));
        prop_assert_eq!(second.counted, gap >= 60);
        prop_assert_eq!(engine.current_points("user_a"), if gap >= 60 { 2 } else { 1 });
    }

    #[test]
    fn config_round_trips_with_variations(
        points_per_message in 1_i64..5,
        cooldown in 0_u64..3_600,
    ) {
        let mut config = BotConfig::default();
        config.points_per_message = points_per_message;
        config.accrual_cooldown_secs = cooldown;

        let encoded = serde_json::to_string(&config).expect("serialize");
        let decoded: BotConfig = serde_json::from_str(&encoded).expect("deserialize");
        prop_assert_eq!(config, decoded);
    }
}
