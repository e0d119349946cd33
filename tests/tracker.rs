mod common;

use common::*;
use score_drive::{
    motor::Direction,
    policy::MoveDecision,
    runtime::{Context, Lines},
    scoreboard::{GameSnapshot, ScoreSource, SourceError},
    tracker::{session, ExitReason, Phase, ReportKind, Step, Tracker},
};

fn tracker<I>(polls: I, recorder: &Recorder) -> Tracker<Scripted, Recorder>
where
    I: IntoIterator<Item = Result<Option<GameSnapshot>, SourceError>>,
{
    let config = instant_config();
    Tracker::new(Scripted::new(polls), car(recorder, &config), GAME, config)
}

fn scored(step: Step) -> (u32, u32, MoveDecision) {
    match step {
        Step::Observed(report) => match report.kind {
            ReportKind::Scored {
                home_delta,
                away_delta,
                decision,
                ..
            } => (home_delta, away_delta, decision),
            other => panic!("expected a scoring report, got {:?}", other),
        },
        other => panic!("expected an observation, got {:?}", other),
    }
}

#[test]
fn home_basket_moves_forward() {
    let recorder = Recorder::default();
    let mut t = tracker(vec![Ok(Some(live(10, 8))), Ok(Some(live(12, 8)))], &recorder);

    assert!(matches!(t.step(), Step::Observed(r) if r.kind == ReportKind::Baseline));
    assert_eq!(*t.phase(), Phase::Tracking);
    assert_eq!(
        scored(t.step()),
        (
            2,
            0,
            MoveDecision::Move {
                direction: Direction::Forward,
                points: 2
            }
        )
    );
    assert_eq!(recorder.drives(), vec![Direction::Forward]);
    assert_eq!(recorder.calls().last(), Some(&Call::Stop));
}

#[test]
fn equal_baskets_cancel_out_but_are_reported() {
    let recorder = Recorder::default();
    let mut t = tracker(vec![Ok(Some(live(20, 15))), Ok(Some(live(22, 17)))], &recorder);

    t.step();
    assert_eq!(scored(t.step()), (2, 2, MoveDecision::CancelledOut(2)));
    assert!(recorder.drives().is_empty());
}

#[test]
fn failed_poll_keeps_the_last_good_scores() {
    let recorder = Recorder::default();
    let mut t = tracker(
        vec![
            Ok(Some(live(10, 8))),
            Err(SourceError::Network("timed out".into())),
            Ok(Some(live(10, 11))),
        ],
        &recorder,
    );

    t.step();
    assert!(matches!(t.step(), Step::Retry(_)));
    assert_eq!(t.state().previous(), Some((10, 8)));
    assert_eq!(
        scored(t.step()),
        (
            0,
            3,
            MoveDecision::Move {
                direction: Direction::Backward,
                points: 3
            }
        )
    );
}

#[test]
fn nothing_moves_after_the_final_buzzer() {
    let recorder = Recorder::default();
    let t = tracker(
        vec![
            Ok(Some(live(100, 98))),
            Ok(Some(live(102, 98))),
            Ok(Some(live(102, 101))),
            Ok(Some(finished(104, 101))),
            Ok(Some(live(110, 101))),
        ],
        &recorder,
    );
    let summary = t.run(&Context::new_global());

    assert_eq!(summary.reason, ExitReason::GameOver);
    assert_eq!(summary.tally.forward(), 4);
    assert_eq!(summary.tally.backward(), 3);
    assert_eq!(summary.tally.net(), 1);
    assert_eq!(summary.last, Some(finished(104, 101)));
    assert_eq!(
        recorder.drives(),
        vec![Direction::Forward, Direction::Backward, Direction::Forward]
    );
    assert_eq!(recorder.calls().last(), Some(&Call::Stop));
}

#[test]
fn final_game_at_baseline_ends_without_moving() {
    let recorder = Recorder::default();
    let summary = tracker(vec![Ok(Some(finished(99, 97)))], &recorder).run(&Context::new_global());

    assert_eq!(summary.reason, ExitReason::GameOver);
    assert!(recorder.drives().is_empty());
    assert!(summary.to_string().contains("Final: Knicks 97 - Celtics 99"));
}

#[test]
fn malformed_responses_exhaust_the_budget() {
    let recorder = Recorder::default();
    let bad = || Err(SourceError::Malformed("truncated".into()));
    let summary = tracker(
        vec![Ok(Some(live(1, 1))), bad(), bad(), bad(), Ok(Some(live(5, 1)))],
        &recorder,
    )
    .run(&Context::new_global());

    assert!(matches!(summary.reason, ExitReason::SourceFailed(ref e) if e.is_malformed()));
    assert_eq!(summary.last, Some(live(1, 1)));
    assert!(recorder.drives().is_empty());
}

#[test]
fn a_good_response_resets_the_malformed_budget() {
    let recorder = Recorder::default();
    let bad = || Err(SourceError::Malformed("truncated".into()));
    let summary = tracker(
        vec![
            Ok(Some(live(1, 1))),
            bad(),
            bad(),
            Ok(Some(live(3, 1))),
            bad(),
            bad(),
            Ok(Some(finished(3, 1))),
        ],
        &recorder,
    )
    .run(&Context::new_global());

    assert_eq!(summary.reason, ExitReason::GameOver);
    assert_eq!(summary.tally.forward(), 2);
}

#[test]
fn transient_failures_never_end_the_session() {
    let recorder = Recorder::default();
    let mut polls = vec![Ok(Some(live(0, 0)))];
    for i in 0..20 {
        polls.push(Err(if i % 2 == 0 {
            http(503)
        } else {
            SourceError::Network("connection reset".into())
        }));
    }
    polls.push(Err(http(429)));
    polls.push(Ok(Some(finished(0, 2))));

    let summary = tracker(polls, &recorder).run(&Context::new_global());

    assert_eq!(summary.reason, ExitReason::GameOver);
    assert_eq!(recorder.drives(), vec![Direction::Backward]);
}

#[test]
fn client_errors_are_permanent() {
    let recorder = Recorder::default();
    let mut t = tracker(vec![Ok(Some(live(0, 0))), Err(http(404))], &recorder);

    t.step();
    assert_eq!(t.step(), Step::Finished(ExitReason::SourceFailed(http(404))));
    assert_eq!(t.step(), Step::Finished(ExitReason::SourceFailed(http(404))));
}

#[test]
fn missing_game_ends_the_session() {
    let recorder = Recorder::default();
    let summary = tracker(vec![Ok(Some(live(7, 7)))], &recorder).run(&Context::new_global());

    assert_eq!(summary.reason, ExitReason::GameMissing);
    assert_eq!(summary.last, Some(live(7, 7)));
    assert!(summary.to_string().contains("Last score: Knicks 7 - Celtics 7"));
}

#[test]
fn broken_motors_end_the_session() {
    let recorder = Recorder {
        broken: true,
        ..Recorder::default()
    };
    let summary = tracker(
        vec![Ok(Some(live(0, 0))), Ok(Some(live(2, 0))), Ok(Some(live(4, 0)))],
        &recorder,
    )
    .run(&Context::new_global());

    assert!(matches!(summary.reason, ExitReason::DriveFailed(_)));
    assert_eq!(recorder.drives(), vec![Direction::Forward]);
    assert_eq!(summary.tally.net(), 0);
    assert_eq!(recorder.calls().last(), Some(&Call::Stop));
}

#[test]
fn score_corrections_are_not_counted_twice() {
    let recorder = Recorder::default();
    let summary = tracker(
        vec![
            Ok(Some(live(50, 50))),
            Ok(Some(live(53, 50))),
            Ok(Some(live(51, 50))),
            Ok(Some(live(53, 50))),
            Ok(Some(finished(53, 50))),
        ],
        &recorder,
    )
    .run(&Context::new_global());

    assert_eq!(summary.tally.forward(), 3);
    assert_eq!(summary.tally.backward(), 0);
}

#[test]
fn interrupt_before_the_first_poll() {
    let recorder = Recorder::default();
    let ctx = Context::new_global();
    ctx.cancel();
    let summary = tracker(vec![Ok(Some(live(1, 0)))], &recorder).run(&ctx);

    assert_eq!(summary.reason, ExitReason::Interrupted);
    assert_eq!(summary.last, None);
    assert!(recorder.drives().is_empty());
    assert_eq!(recorder.calls().first(), Some(&Call::Stop));
}

/// Cancels the context when a given poll is served.
struct InterruptAt {
    inner: Scripted,
    ctx: Context,
    poll: usize,
    count: usize,
}

impl ScoreSource for InterruptAt {
    fn games(&mut self) -> Result<Vec<GameSnapshot>, SourceError> {
        self.inner.games()
    }

    fn game(&mut self, game_id: &str) -> Result<Option<GameSnapshot>, SourceError> {
        self.count += 1;
        if self.count == self.poll {
            self.ctx.cancel();
        }
        self.inner.game(game_id)
    }
}

#[test]
fn interrupt_lets_the_current_movement_finish() {
    let recorder = Recorder::default();
    let ctx = Context::new_global();
    let config = instant_config();
    let source = InterruptAt {
        inner: Scripted::new(vec![
            Ok(Some(live(0, 0))),
            Ok(Some(live(0, 3))),
            Ok(Some(live(0, 6))),
        ]),
        ctx: ctx.clone(),
        poll: 2,
        count: 0,
    };
    let summary = Tracker::new(source, car(&recorder, &config), GAME, config).run(&ctx);

    assert_eq!(summary.reason, ExitReason::Interrupted);
    assert_eq!(recorder.drives(), vec![Direction::Backward]);
    assert_eq!(summary.tally.backward(), 3);
    assert_eq!(summary.last, Some(live(0, 3)));
}

fn stops_only(recorder: &Recorder) -> bool {
    let calls = recorder.calls();
    calls.len() >= 2 && calls.iter().all(|call| *call == Call::Stop)
}

#[test]
fn session_stops_motors_when_the_scoreboard_fails() {
    let recorder = Recorder::default();
    let config = instant_config();
    let result = session(
        &Context::new_global(),
        &Lines::scripted(Vec::<String>::new()),
        Scripted::new(vec![Err(http(503))]),
        car(&recorder, &config),
        None,
        config,
    );

    assert!(result.is_err());
    assert!(stops_only(&recorder));
}

#[test]
fn session_stops_motors_without_games() {
    let recorder = Recorder::default();
    let config = instant_config();
    let result = session(
        &Context::new_global(),
        &Lines::scripted(Vec::<String>::new()),
        Scripted::new(Vec::new()),
        car(&recorder, &config),
        None,
        config,
    );

    assert_eq!(result.unwrap(), None);
    assert!(stops_only(&recorder));
}

#[test]
fn session_stops_motors_when_the_menu_is_left() {
    for (answers, interrupted) in vec![(vec!["q"], false), (vec![], true)] {
        let recorder = Recorder::default();
        let config = instant_config();
        let ctx = Context::new_global();
        if interrupted {
            ctx.cancel();
        }
        let result = session(
            &ctx,
            &Lines::scripted(answers),
            Scripted::new(vec![Ok(Some(live(3, 0)))]),
            car(&recorder, &config),
            None,
            config,
        );

        assert_eq!(result.unwrap(), None);
        assert!(stops_only(&recorder));
    }
}

#[test]
fn session_tracks_the_chosen_game() {
    let recorder = Recorder::default();
    let config = instant_config();
    let summary = session(
        &Context::new_global(),
        &Lines::scripted(vec!["1"]),
        Scripted::new(vec![
            Ok(Some(live(3, 0))),
            Ok(Some(live(3, 0))),
            Ok(Some(finished(5, 0))),
        ]),
        car(&recorder, &config),
        None,
        config,
    )
    .unwrap()
    .unwrap();

    assert_eq!(summary.reason, ExitReason::GameOver);
    assert_eq!(recorder.calls().first(), Some(&Call::Stop));
    assert_eq!(recorder.drives(), vec![Direction::Forward]);
}

#[test]
fn session_with_a_game_id_skips_the_menu() {
    let recorder = Recorder::default();
    let config = instant_config();
    let summary = session(
        &Context::new_global(),
        &Lines::scripted(Vec::<String>::new()),
        Scripted::new(vec![Ok(Some(finished(1, 1)))]),
        car(&recorder, &config),
        Some(GAME.into()),
        config,
    )
    .unwrap()
    .unwrap();

    assert_eq!(summary.reason, ExitReason::GameOver);
    assert!(recorder.drives().is_empty());
}
