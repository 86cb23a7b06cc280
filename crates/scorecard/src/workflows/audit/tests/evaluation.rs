use crate::workflows::audit::evaluation::{display_score, message_of, AuditResult, ScoreTier};

#[test]
fn display_score_clamps_to_percentage_band() {
    assert_eq!(display_score(-250), 0);
    assert_eq!(display_score(-1), 0);
    assert_eq!(display_score(0), 0);
    assert_eq!(display_score(55), 55);
    assert_eq!(display_score(100), 100);
    assert_eq!(display_score(175), 100);
    assert_eq!(display_score(i32::MAX), 100);
    assert_eq!(display_score(i32::MIN), 0);
}

#[test]
fn tier_bands_are_inclusive_on_lower_bound() {
    assert_eq!(ScoreTier::of(100), ScoreTier::Optimized);
    assert_eq!(ScoreTier::of(80), ScoreTier::Optimized);
    assert_eq!(ScoreTier::of(79), ScoreTier::RoomForImprovement);
    assert_eq!(ScoreTier::of(50), ScoreTier::RoomForImprovement);
    assert_eq!(ScoreTier::of(49), ScoreTier::CriticalInefficiency);
    assert_eq!(ScoreTier::of(0), ScoreTier::CriticalInefficiency);

    assert_eq!(ScoreTier::of(79).label(), "Room for Improvement");
    assert_eq!(ScoreTier::of(80).label(), "Optimized");
    assert_eq!(ScoreTier::of(49).label(), "Critical Inefficiency");
}

#[test]
fn message_uses_its_own_two_bucket_split() {
    assert!(message_of(49).contains("leaking significant revenue"));
    assert!(message_of(50).contains("solid foundation"));
    assert_eq!(message_of(79), message_of(95));
    assert_ne!(ScoreTier::of(79), ScoreTier::of(95));
}

#[test]
fn result_is_derived_from_clamped_score() {
    let low = AuditResult::from_running_score(-40);
    assert_eq!(low.display_score, 0);
    assert_eq!(low.tier, ScoreTier::CriticalInefficiency);
    assert_eq!(low.message, message_of(0));

    let high = AuditResult::from_running_score(140);
    assert_eq!(high.display_score, 100);
    assert_eq!(high.tier_label, "Optimized");
}
