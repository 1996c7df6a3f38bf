//! Eight Ball entry point
//!
//! Headless self-play: `eight-ball [config.json] [matches]`

use eight_ball::MatchConfig;
use eight_ball::audio::{AudioManager, LogSink};
use eight_ball::services::{Dispatcher, RandomPlanner, ScriptedShotService};
use eight_ball::sim::{EightBallReferee, GameEvent, MatchState, TickInput, apply_response, tick};

/// Give up on a run that has not finished after this many ticks per match
const MAX_TICKS_PER_MATCH: u64 = 177 * 60 * 10;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Eight Ball (headless) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => MatchConfig::load_or_default(path),
        None => MatchConfig::default(),
    };
    let matches: u32 = match args.next().map(|s| s.parse()) {
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            log::warn!("Invalid match count ({}), playing 1", e);
            1
        }
        None => 1,
    };

    let mut state = MatchState::new(config);
    let planner = RandomPlanner::new(&state.config.automation);
    let mut dispatcher = Dispatcher::new(planner, ScriptedShotService::default());
    let mut audio = AudioManager::new(LogSink);
    let referee = EightBallReferee;
    let input = TickInput::default();

    let mut finished = 0;
    let mut inbox = Vec::new();
    let max_ticks = MAX_TICKS_PER_MATCH * u64::from(matches.max(1));

    while finished < matches && state.time_ticks < max_ticks {
        for response in inbox.drain(..) {
            apply_response(&mut state, response);
        }

        tick(&mut state, &input, &referee);

        let events = state.drain_events();
        audio.handle_events(&events);
        finished += events
            .iter()
            .filter(|e| matches!(e, GameEvent::MatchOver { .. }))
            .count() as u32;

        inbox = dispatcher.dispatch(&mut state);
    }

    if finished < matches {
        log::warn!(
            "Stopped after {} ticks with {} of {} matches played",
            state.time_ticks,
            finished,
            matches
        );
    }
    log::info!(
        "Overall score: player 1 {} - player 2 {} ({} correlation submits)",
        state.players[0].overall_score,
        state.players[1].overall_score,
        dispatcher.service.submitted.len()
    );
}
