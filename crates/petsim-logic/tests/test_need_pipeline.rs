//! Integration tests for the pure need pipeline.
//!
//! Exercises: NeedDescriptor → NeedEntity → urgency ranking → MessageQueue
//! → target selection, with a hand-rolled tick loop and no runtime crate.

use rand::rngs::StdRng;
use rand::SeedableRng;

use petsim_logic::autonomy::{candidates_for, select_best, ItemRef, TargetSpec};
use petsim_logic::grid::GridPos;
use petsim_logic::message::{
    AmbientKind, Candidate, Category, DropReason, MessageQueue, QueueTiming, SubmitOutcome,
};
use petsim_logic::need::{NeedDescriptor, NeedEntity, Reaction, StatusMessages};
use petsim_logic::status::Status;
use petsim_logic::urgency::{rank, urgency_score, RankedNeed};

// ── Helpers ────────────────────────────────────────────────────────────

fn needs() -> Vec<NeedEntity> {
    let mut hunger = NeedDescriptor::linear("hunger", 0.5).with_initial(75.0);
    hunger.reactions = vec![Reaction {
        from: Status::Normal,
        to: Status::Urgent,
        texts: vec!["Tummy rumbling.".into()],
    }];
    hunger.announcements = vec![StatusMessages {
        status: Status::Urgent,
        texts: vec!["Hungry...".into()],
        icon: "🍖".into(),
        repeat_after_ms: 30_000,
    }];
    let fun = NeedDescriptor::linear("fun", 0.1).with_initial(75.0);
    let affection = NeedDescriptor::linear("affection", 0.1).with_initial(75.0);
    vec![
        NeedEntity::new(hunger),
        NeedEntity::new(fun),
        NeedEntity::new(affection),
    ]
}

/// One tick over `needs`: degrade, refresh, score, collect reactions.
fn tick(needs: &mut [NeedEntity], elapsed_secs: f32, rng: &mut StdRng) -> (Vec<RankedNeed>, Vec<Candidate>) {
    let mut rows = Vec::new();
    let mut out = Vec::new();
    for need in needs.iter_mut() {
        need.degrade(elapsed_secs);
        let status = need.refresh_status();
        let urgency = urgency_score(need.percentage(), status, need.degradation_rate());
        need.set_urgency(urgency);
        if let Some(reaction) = need.check_transition_reaction(rng) {
            out.push(reaction);
        }
        need.advance_status_memory();
        rows.push(RankedNeed {
            need_id: need.id().to_string(),
            urgency,
            value: need.value(),
        });
    }
    (rank(rows), out)
}

// ── Ranking ────────────────────────────────────────────────────────────

#[test]
fn test_fast_decay_surfaces_first() {
    let mut needs = needs();
    let mut rng = StdRng::seed_from_u64(3);
    let (ranked, _) = tick(&mut needs, 0.0, &mut rng);
    // Equal values: the faster-draining need leads, the rest keep declaration order.
    let ids: Vec<&str> = ranked.iter().map(|r| r.need_id.as_str()).collect();
    assert_eq!(ids, vec!["hunger", "fun", "affection"]);
    assert!(ranked.windows(2).all(|w| w[0].urgency >= w[1].urgency));
}

#[test]
fn test_transition_reaction_fires_once() {
    let mut needs = needs();
    let mut rng = StdRng::seed_from_u64(3);
    let mut reactions = Vec::new();
    for _ in 0..20 {
        let (_, out) = tick(&mut needs, 1.0, &mut rng);
        reactions.extend(out);
    }
    // 75 - 0.5 * 20 = 65: crossed into urgent exactly once.
    assert_eq!(needs[0].status(), Status::Urgent);
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].text, "Tummy rumbling.");
    assert_eq!(reactions[0].category, Category::Reaction);
}

#[test]
fn test_values_stay_bounded() {
    let mut needs = needs();
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..500 {
        tick(&mut needs, 3.0, &mut rng);
    }
    assert!(needs.iter().all(|n| n.value() == 0.0));
    assert!(needs.iter().all(|n| n.status() == Status::Critical));
}

// ── Messages ───────────────────────────────────────────────────────────

#[test]
fn test_reaction_preempts_announcement() {
    let mut needs = needs();
    let mut rng = StdRng::seed_from_u64(3);
    let mut queue = MessageQueue::new(QueueTiming::default());

    // Drop hunger into urgent, announce, then let the reaction land 500ms later.
    needs[0].set_value(60.0);
    needs[0].refresh_status();
    let announcement = needs[0].announcement(&mut rng).unwrap();
    assert!(matches!(queue.submit(announcement, 0), SubmitOutcome::Displayed(_)));

    let reaction = needs[0].check_transition_reaction(&mut rng).unwrap();
    assert!(matches!(
        queue.submit(reaction, 500),
        SubmitOutcome::Preempted { .. }
    ));
    assert_eq!(queue.current().unwrap().text, "Tummy rumbling.");

    let chatter = Candidate::new("Just sitting.", "", Category::StatusChange);
    assert_eq!(
        queue.submit(chatter, 900),
        SubmitOutcome::Dropped(DropReason::MinimumDisplayTime)
    );
}

#[test]
fn test_repeated_movement_chatter_queues_once() {
    let walk = || Candidate::new("Walking", "🐾", Category::Ambient(AmbientKind::Movement));
    let mut queue = MessageQueue::default();
    queue.submit(Candidate::new("Hello", "", Category::StatusChange), 0);
    assert!(matches!(queue.submit(walk(), 2_000), SubmitOutcome::Queued(_)));
    assert!(matches!(queue.submit(walk(), 2_100), SubmitOutcome::Replaced { .. }));
    assert_eq!(queue.waiting().len(), 1);
}

// ── Targets ────────────────────────────────────────────────────────────

#[test]
fn test_walk_reaches_best_target() {
    let items = vec![
        ItemRef {
            id: 1,
            kind: "apple".into(),
            position: GridPos::new(1, 0),
            quality: 80,
        },
        ItemRef {
            id: 2,
            kind: "fish".into(),
            position: GridPos::new(5, 0),
            quality: 100,
        },
        ItemRef {
            id: 3,
            kind: "ball".into(),
            position: GridPos::new(0, 1),
            quality: 100,
        },
    ];
    let spec = TargetSpec::Items {
        preferences: vec!["apple".into(), "fish".into()],
    };
    let candidates = candidates_for(&spec, &items);
    let mut agent = GridPos::new(0, 0);
    let (target, score) = select_best(agent, &candidates).unwrap();
    assert_eq!((target.id, score), (2, 90));

    let mut steps = 0;
    while agent != target.position {
        agent = agent.step_toward(&target.position);
        steps += 1;
    }
    assert_eq!(steps, 5);
}
