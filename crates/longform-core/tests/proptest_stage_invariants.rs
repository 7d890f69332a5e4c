//! Property-based invariant tests for the stage and timeline.
//!
//! 1. Every labelled tween cues at most once, however time is sliced.
//! 2. Completed tweens leave their node exactly on target.
//! 3. `finish_all` always empties the stage.
//! 4. A timeline fires each scheduled event exactly once, in offset order.

use std::time::Duration;

use longform_core::animation::{Stage, Timeline, TweenSpec};
use longform_core::pose::{NodeId, PosePatch};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct TweenPlan {
    node: u32,
    target: f32,
    delay_ms: u64,
    duration_ms: u64,
}

fn plan_strategy() -> impl Strategy<Value = TweenPlan> {
    (0u32..4, -500.0f32..500.0, 0u64..1500, 1u64..1500).prop_map(
        |(node, target, delay_ms, duration_ms)| TweenPlan {
            node,
            target,
            delay_ms,
            duration_ms,
        },
    )
}

fn ticks_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..120, 1..200)
}

fn schedule(stage: &mut Stage, plans: &[TweenPlan]) {
    for plan in plans {
        stage.tween(
            TweenSpec::to(NodeId(plan.node), PosePatch::new().x(plan.target))
                .delay(Duration::from_millis(plan.delay_ms))
                .duration(Duration::from_millis(plan.duration_ms))
                .cue("done"),
        );
    }
}

proptest! {
    #[test]
    fn cues_at_most_once(plans in prop::collection::vec(plan_strategy(), 1..8), ticks in ticks_strategy()) {
        let mut stage = Stage::new();
        schedule(&mut stage, &plans);
        let mut seen = Vec::new();
        for ms in ticks {
            for cue in stage.tick(Duration::from_millis(ms)) {
                prop_assert!(!seen.contains(&cue.tween), "duplicate cue {:?}", cue);
                seen.push(cue.tween);
            }
        }
        for cue in stage.finish_all() {
            prop_assert!(!seen.contains(&cue.tween));
            seen.push(cue.tween);
        }
        prop_assert!(seen.len() <= plans.len());
        prop_assert_eq!(stage.active_count(), 0);
    }

    #[test]
    fn single_tween_lands_on_target(plan in plan_strategy()) {
        let mut stage = Stage::new();
        schedule(&mut stage, std::slice::from_ref(&plan));
        let total = plan.delay_ms + plan.duration_ms;
        let mut elapsed = 0;
        let mut cues = 0;
        while elapsed <= total + 16 {
            cues += stage.tick(Duration::from_millis(16)).len();
            elapsed += 16;
        }
        prop_assert_eq!(cues, 1);
        prop_assert!((stage.pose(NodeId(plan.node)).x - plan.target).abs() < 1e-3);
    }

    #[test]
    fn timeline_fires_each_event_once(offsets in prop::collection::vec(0u64..2000, 0..20), ticks in ticks_strategy()) {
        let mut timeline = Timeline::new();
        for (i, ms) in offsets.iter().enumerate() {
            timeline.schedule(Duration::from_millis(*ms), i);
        }
        let mut fired = Vec::new();
        for ms in ticks {
            fired.extend(timeline.advance(Duration::from_millis(ms)));
        }
        fired.extend(timeline.advance(Duration::from_secs(5)));
        let mut sorted = fired.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), offsets.len());
        for pair in fired.windows(2) {
            prop_assert!(offsets[pair[0]] <= offsets[pair[1]]);
        }
    }
}
