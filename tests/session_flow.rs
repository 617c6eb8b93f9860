//! End-to-end phase-cycle tests for the session orchestrator.
//!
//! Drives full turns against the scripted gateway: orders, the two-pass
//! card protocol, dislodgement, and retreat resolution, verifying the
//! committed history at each step.

use condottieri::board::phase::{Phase, PhaseInfo, PhaseKey};
use condottieri::board::unit::{UnitId, UnitKind, UnitSnapshot, UnitStatus};
use condottieri::cards::CardOrder;
use condottieri::resolve::gateway::{GatewayError, ResolutionGateway, UnitOutcome};
use condottieri::resolve::scripted::ScriptedGateway;
use condottieri::session::game::{Session, SessionError};

fn session_with(gateway: ScriptedGateway) -> Session {
    Session::new(Box::new(gateway)).with_seeded_ids(99)
}

fn submit_all_holds(session: &mut Session) {
    for nation in ["FRA", "AUS", "TUR"] {
        session.submit_orders(nation, Vec::new()).unwrap();
    }
}

fn pass_all_cards(session: &mut Session) {
    for nation in ["FRA", "ENG"] {
        session.submit_card_orders(nation, Vec::new()).unwrap();
    }
}

fn resolved_units(session: &Session, turn: u32) -> Vec<UnitSnapshot> {
    session
        .history()
        .get(&PhaseKey::new(turn, Phase::OrdersResolved))
        .expect("orders_resolved snapshot")
        .units
        .clone()
}

#[test]
fn turn_one_hold_scenario() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    let resolved = resolved_units(&s, 1);
    assert_eq!(resolved.len(), 3);
    for unit in &resolved {
        assert_eq!(unit.status, UnitStatus::Ok);
        assert!(unit.succeeded);
        assert!(unit.dislodged_by.is_none());
    }

    assert_eq!(
        s.current_phase(),
        PhaseInfo {
            turn: 2,
            phase: Phase::Orders
        }
    );
}

#[test]
fn preview_pass_commits_orders_snapshot_at_origin() {
    let mut s = session_with(ScriptedGateway::new());
    s.submit_orders("FRA", vec!["FRA: A den move -> ber".to_string()])
        .unwrap();
    s.submit_orders("AUS", Vec::new()).unwrap();
    s.submit_orders("TUR", Vec::new()).unwrap();

    let preview = &s
        .history()
        .get(&PhaseKey::new(1, Phase::Orders))
        .expect("preview snapshot")
        .units;
    let fra = preview.iter().find(|u| u.nation == "FRA").unwrap();
    // Preview keeps origin positions so the UI can show intentions.
    assert_eq!(fra.region, "den");
    assert!(fra.order.as_deref().unwrap().contains("-> ber"));
    assert_eq!(s.current_phase().phase, Phase::CardOrders);
}

#[test]
fn successful_support_does_not_relocate_the_supporter() {
    let mut s = session_with(ScriptedGateway::new());
    s.submit_orders("FRA", vec!["FRA: A den move -> ber".to_string()])
        .unwrap();
    s.submit_orders(
        "AUS",
        vec!["AUS: A kie support FRA: A den -> ber".to_string()],
    )
    .unwrap();
    s.submit_orders("TUR", Vec::new()).unwrap();
    pass_all_cards(&mut s);

    let resolved = resolved_units(&s, 1);
    let fra = resolved.iter().find(|u| u.nation == "FRA").unwrap();
    let aus = resolved.iter().find(|u| u.nation == "AUS").unwrap();
    assert_eq!(fra.region, "ber");
    // The support order names a destination too; the supporter stays put.
    assert_eq!(aus.region, "kie");
}

#[test]
fn mercenary_ghost_is_not_promoted() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);

    let mut card = CardOrder::new("FRA", "MERCENARY");
    card.unit = Some(UnitSnapshot::new(UnitId(0), "FRA", UnitKind::Army, "bur"));
    s.submit_card_orders("FRA", vec![card]).unwrap();
    s.submit_card_orders("ENG", Vec::new()).unwrap();

    let resolved = resolved_units(&s, 1);
    assert_eq!(resolved.len(), 3);
    assert!(!resolved
        .iter()
        .any(|u| u.region == "bur" || u.tag.as_deref() == Some("MERC")));
    assert!(s.state().iter().all(|u| !u.is_ghost));
}

#[test]
fn mercenary_card_order_is_rebound_to_spawned_ghost() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);

    let mut card = CardOrder::new("FRA", "MERCENARY");
    card.unit = Some(UnitSnapshot::new(UnitId(0), "FRA", UnitKind::Army, "bur"));
    s.submit_card_orders("FRA", vec![card]).unwrap();
    s.submit_card_orders("ENG", Vec::new()).unwrap();

    let snapshot = s
        .history()
        .get(&PhaseKey::new(1, Phase::OrdersResolved))
        .unwrap();
    assert_eq!(snapshot.card_orders.len(), 1);
    let bound = snapshot.card_orders[0].unit.as_ref().unwrap();
    assert!(bound.is_ghost);
    assert_eq!(bound.tag.as_deref(), Some("MERC"));
    assert_eq!(bound.region, "bur");
    assert_ne!(bound.id, UnitId(0));
}

#[test]
fn ghost_participates_in_second_pass_only() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);

    let mut card = CardOrder::new("FRA", "MERCENARY");
    card.unit = Some(UnitSnapshot::new(UnitId(0), "FRA", UnitKind::Army, "bur"));
    s.submit_card_orders("FRA", vec![card]).unwrap();
    s.submit_card_orders("ENG", Vec::new()).unwrap();

    // Pass one (the card_orders snapshot) predates the spawn.
    let card_phase = s
        .history()
        .get(&PhaseKey::new(1, Phase::CardOrders))
        .unwrap();
    assert_eq!(card_phase.units.len(), 3);
    assert!(card_phase.units.iter().all(|u| !u.is_ghost));
}

#[test]
fn dislodgement_branches_to_retreats() {
    let gateway = ScriptedGateway::new().dislodge(
        "AUS",
        UnitKind::Army,
        "kie",
        "TUR A swe",
        &["ber", "mun"],
    );
    let mut s = session_with(gateway);
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    assert_eq!(
        s.current_phase(),
        PhaseInfo {
            turn: 1,
            phase: Phase::Retreats
        }
    );

    let resolved = resolved_units(&s, 1);
    let aus = resolved.iter().find(|u| u.nation == "AUS").unwrap();
    assert_eq!(aus.status, UnitStatus::Dislodged);
    assert_eq!(aus.dislodged_by.as_deref(), Some("TUR A swe"));
    assert_eq!(aus.retreat_options, vec!["ber", "mun"]);
    // The dislodged unit stays in place pending its retreat.
    assert_eq!(aus.region, "kie");
}

#[test]
fn successful_retreat_enters_next_turn() {
    let gateway = ScriptedGateway::new().dislodge(
        "AUS",
        UnitKind::Army,
        "kie",
        "TUR A swe",
        &["ber", "mun"],
    );
    let mut s = session_with(gateway);
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    let aus_id = s
        .state()
        .iter()
        .find(|u| u.nation == "AUS")
        .map(|u| u.id)
        .unwrap();

    s.submit_retreats("AUS", vec!["AUS: A kie -> ber".to_string()])
        .unwrap();

    let retreats = &s
        .history()
        .get(&PhaseKey::new(1, Phase::Retreats))
        .expect("retreats snapshot")
        .units;
    let aus = retreats.iter().find(|u| u.nation == "AUS").unwrap();
    assert!(aus.succeeded);
    assert_eq!(aus.region, "ber");
    assert_eq!(aus.explanation.as_deref(), Some("Retreated to ber"));

    let next = &s
        .history()
        .get(&PhaseKey::new(2, Phase::Orders))
        .expect("next-turn snapshot")
        .units;
    assert_eq!(next.len(), 3);
    let survivor = next.iter().find(|u| u.nation == "AUS").unwrap();
    assert_eq!(survivor.id, aus_id);
    assert_eq!(survivor.region, "ber");
    assert_eq!(survivor.status, UnitStatus::Ok);

    assert_eq!(
        s.current_phase(),
        PhaseInfo {
            turn: 2,
            phase: Phase::Orders
        }
    );
    assert_eq!(s.state().len(), 3);
}

#[test]
fn turn_after_retreat_keeps_the_prewritten_orders_snapshot() {
    let gateway = ScriptedGateway::new().dislodge(
        "AUS",
        UnitKind::Army,
        "kie",
        "TUR A swe",
        &["ber", "mun"],
    );
    let mut s = session_with(gateway);
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);
    s.submit_retreats("AUS", vec!["AUS: A kie -> ber".to_string()])
        .unwrap();

    // The retreat commit pre-wrote 2-orders with the post-retreat state.
    let prewritten = s
        .history()
        .get(&PhaseKey::new(2, Phase::Orders))
        .unwrap()
        .units
        .clone();

    // Turn 2 plays through; the write-once history keeps the pre-written
    // snapshot rather than replacing it with the preview pass.
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    assert_eq!(
        s.history().get(&PhaseKey::new(2, Phase::Orders)).unwrap().units,
        prewritten
    );
    assert_eq!(s.current_phase().turn, 3);
    assert!(s
        .history()
        .contains_key(&PhaseKey::new(2, Phase::OrdersResolved)));
}

#[test]
fn unordered_dislodged_unit_disbands_by_default() {
    let gateway =
        ScriptedGateway::new().dislodge("AUS", UnitKind::Army, "kie", "TUR A swe", &["ber"]);
    let mut s = session_with(gateway);
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    // AUS accepts the default by submitting nothing.
    s.submit_retreats("AUS", Vec::new()).unwrap();

    let retreats = &s
        .history()
        .get(&PhaseKey::new(1, Phase::Retreats))
        .unwrap()
        .units;
    let aus = retreats.iter().find(|u| u.nation == "AUS").unwrap();
    assert_eq!(aus.status, UnitStatus::Disbanded);
    assert_eq!(aus.region, "DISBANDED");
    assert_eq!(
        aus.explanation.as_deref(),
        Some("Disbanded (no order or chosen)")
    );

    assert_eq!(s.state().len(), 2);
}

#[test]
fn illegal_retreat_destination_forces_disband() {
    let gateway = ScriptedGateway::new().dislodge(
        "FRA",
        UnitKind::Army,
        "den",
        "AUS A kie",
        &["bre", "gas"],
    );
    let mut s = session_with(gateway);
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    s.submit_retreats("FRA", vec!["FRA: A den -> par".to_string()])
        .unwrap();

    let retreats = &s
        .history()
        .get(&PhaseKey::new(1, Phase::Retreats))
        .unwrap()
        .units;
    let fra = retreats.iter().find(|u| u.nation == "FRA").unwrap();
    assert!(!fra.succeeded);
    assert_eq!(fra.region, "DISBANDED");
    assert!(fra.explanation.as_deref().unwrap().contains("par"));
}

#[test]
fn cancel_order_card_reverts_unit_to_holding() {
    let mut s = session_with(ScriptedGateway::new());
    s.submit_orders("FRA", vec!["FRA: A den move -> ber".to_string()])
        .unwrap();
    s.submit_orders("AUS", Vec::new()).unwrap();
    s.submit_orders("TUR", Vec::new()).unwrap();

    let mut card = CardOrder::new("FRA", "CANCEL_ORDER");
    card.metadata
        .insert("region".to_string(), serde_json::Value::from("den"));
    s.submit_card_orders("FRA", vec![card]).unwrap();
    s.submit_card_orders("ENG", Vec::new()).unwrap();

    let resolved = resolved_units(&s, 1);
    let fra = resolved.iter().find(|u| u.nation == "FRA").unwrap();
    assert_eq!(fra.region, "den");
    assert_eq!(fra.order.as_deref(), Some("FRA: A den holds"));
}

#[test]
fn unknown_card_type_does_not_block_the_phase() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);

    s.submit_card_orders("FRA", vec![CardOrder::new("FRA", "PIRATE_RAID")])
        .unwrap();
    s.submit_card_orders("ENG", Vec::new()).unwrap();

    assert!(s
        .history()
        .contains_key(&PhaseKey::new(1, Phase::OrdersResolved)));
    assert_eq!(s.current_phase().turn, 2);
}

#[test]
fn failing_card_handler_does_not_block_the_batch() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);

    // Mercenary with no unit fails its precondition; the gold bonus after
    // it must still apply and the phase must still resolve.
    let broken = CardOrder::new("FRA", "MERCENARY");
    let mut gold = CardOrder::new("FRA", "GOLD_BONUS");
    gold.metadata
        .insert("amount".to_string(), serde_json::Value::from(2u64));
    s.submit_card_orders("FRA", vec![broken, gold]).unwrap();
    s.submit_card_orders("ENG", Vec::new()).unwrap();

    assert_eq!(s.current_phase().turn, 2);
    assert_eq!(resolved_units(&s, 1).len(), 3);
}

#[test]
fn history_snapshots_are_stable_across_rereads() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    let first = resolved_units(&s, 1);
    let second = resolved_units(&s, 1);
    assert_eq!(first, second);

    // Play another turn; turn 1 history must be untouched.
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);
    assert_eq!(resolved_units(&s, 1), first);
    assert_eq!(s.current_phase().turn, 3);
}

#[test]
fn history_keys_follow_the_external_contract() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    for key in ["0-orders_resolved", "1-orders", "1-card_orders", "1-orders_resolved"] {
        let parsed: PhaseKey = key.parse().unwrap();
        assert!(
            s.history().contains_key(&parsed),
            "missing history key {}",
            key
        );
    }
}

#[test]
fn gateway_failure_leaves_session_in_prior_state() {
    struct FailingGateway;

    impl ResolutionGateway for FailingGateway {
        fn resolve(&self, _orders: &[String]) -> Result<Vec<UnitOutcome>, GatewayError> {
            Err(GatewayError("resolver offline".to_string()))
        }
    }

    let mut s = Session::new(Box::new(FailingGateway));
    s.submit_orders("FRA", Vec::new()).unwrap();
    s.submit_orders("AUS", Vec::new()).unwrap();

    // The last submission triggers the preview pass, which fails.
    let err = s.submit_orders("TUR", Vec::new()).unwrap_err();
    assert!(matches!(err, SessionError::Gateway(_)));

    // Still in the orders phase with nothing committed for turn 1.
    assert_eq!(s.current_phase().phase, Phase::Orders);
    assert!(!s.history().contains_key(&PhaseKey::new(1, Phase::Orders)));
    assert_eq!(s.state().len(), 3);
}

#[test]
fn reset_clears_history_and_submissions() {
    let mut s = session_with(ScriptedGateway::new());
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);

    s.reset();
    assert_eq!(s.current_phase().turn, 1);
    assert_eq!(s.history().len(), 1);
    assert!(s
        .history()
        .contains_key(&PhaseKey::new(0, Phase::OrdersResolved)));

    // A fresh turn plays cleanly after the reset.
    submit_all_holds(&mut s);
    pass_all_cards(&mut s);
    assert_eq!(s.current_phase().turn, 2);
}
