//! A running game: lobby, lifecycle and message dispatch.
use std::fmt;

use crate::cmd::{ActionKind, Cmd, CmdInput};
use crate::config::GameConfig;
use crate::env::{GameEnv, shuffle};
use crate::error::{EngineError, InputError, ModelError, verify_input};
use crate::phase::{
    ActionPhase, ChooseTeamPhase, CombatPhase, Phase, PhaseStep, PhaseTransition, UpkeepPhase,
};
use crate::record::{NoteRecord, RecordId, RecordLog};
use crate::review::Review;
use crate::session::CommitSession;
use crate::state::{Colour, GameState, PlayerId, RaceType, TeamSlot};
use crate::update::{GameUpdate, UpdateSink};

/// Server-assigned identifier of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{}", self.0)
    }
}

/// Coarse lifecycle of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum GamePhase {
    Lobby,
    ChooseTeam,
    Main,
    Finished,
}

/// Input a player sends to a started game.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "message", rename_all = "snake_case")
)]
pub enum Message {
    ChooseTeam { race: RaceType, colour: Colour },
    StartAction { action: ActionKind },
    /// Answer to the pending command.
    Cmd { input: CmdInput },
    Undo,
    Commit,
}

/// One game and everything needed to continue, replay or review it.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveGame {
    id: GameId,
    name: String,
    owner: PlayerId,
    config: GameConfig,
    lifecycle: GamePhase,
    phase: Option<Phase>,
    state: GameState,
    /// State right after the lobby closed; replay starts here.
    initial_state: Option<GameState>,
    log: RecordLog,
}

impl LiveGame {
    /// Opens a lobby with `owner` in the first seat.
    pub fn new(id: GameId, name: impl Into<String>, owner: PlayerId, config: GameConfig) -> Self {
        let mut state = GameState::default();
        state.team_order.push(TeamSlot::new(owner));
        Self {
            id,
            name: name.into(),
            owner,
            config,
            lifecycle: GamePhase::Lobby,
            phase: None,
            state,
            initial_state: None,
            log: RecordLog::new(),
        }
    }

    pub fn add_player(&mut self, player: PlayerId) -> Result<(), InputError> {
        verify_input(self.lifecycle == GamePhase::Lobby, InputError::AlreadyStarted)?;
        verify_input(
            self.state.slot_of(player).is_none(),
            InputError::AlreadyJoined,
        )?;
        verify_input(
            self.state.team_order.len() < self.config.max_teams,
            InputError::GameFull,
        )?;
        self.state.team_order.push(TeamSlot::new(player));
        Ok(())
    }

    /// Closes the lobby: fixes the seed, shuffles the seats and opens team
    /// selection.
    pub fn start(
        &mut self,
        player: PlayerId,
        seed: u64,
        env: GameEnv<'_>,
    ) -> Result<(), EngineError> {
        verify_input(self.lifecycle == GamePhase::Lobby, InputError::AlreadyStarted)?;
        verify_input(player == self.owner, InputError::NotOwner)?;

        self.state.seed = seed;
        shuffle(env.rng()?, seed, 0, 0, &mut self.state.team_order);
        self.initial_state = Some(self.state.clone());
        self.phase = Some(Phase::ChooseTeam(ChooseTeamPhase::new()));
        self.lifecycle = GamePhase::ChooseTeam;
        Ok(())
    }

    /// Handles one message from `player` as a single transaction.
    ///
    /// A rejected input leaves the game exactly as it was. Model errors are
    /// returned as they are; the game should not be used afterwards.
    pub fn process(
        &mut self,
        player: PlayerId,
        message: &Message,
        env: GameEnv<'_>,
        sink: &mut dyn UpdateSink,
    ) -> Result<Vec<GameUpdate>, EngineError> {
        match self.lifecycle {
            GamePhase::Lobby => return Err(InputError::NotStarted.into()),
            GamePhase::Finished => return Err(InputError::GameOver.into()),
            GamePhase::ChooseTeam | GamePhase::Main => {}
        }
        verify_input(self.state.slot_of(player).is_some(), InputError::UnknownPlayer)?;

        // State and log are rolled back through the session; the phase only
        // holds command stacks and is restored from a copy.
        let backup = (self.lifecycle, self.phase.clone());
        let result = self.dispatch(player, message, env, sink);
        if let Err(EngineError::Input(_)) = &result {
            (self.lifecycle, self.phase) = backup;
        }
        result
    }

    fn dispatch(
        &mut self,
        player: PlayerId,
        message: &Message,
        env: GameEnv<'_>,
        sink: &mut dyn UpdateSink,
    ) -> Result<Vec<GameUpdate>, EngineError> {
        let LiveGame {
            config,
            lifecycle,
            phase,
            state,
            log,
            ..
        } = self;
        let max_rounds = config.max_rounds;
        let mut session = CommitSession::new(state, log, env, config);
        match Self::advance(lifecycle, phase, max_rounds, player, message, &mut session) {
            Ok(()) => {
                session.notify(GameUpdate::Choices);
                Ok(session.finish(sink))
            }
            Err(err @ EngineError::Input(_)) => {
                session.rollback()?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Feeds the message to the current phase and moves through every phase
    /// change it triggers.
    fn advance(
        lifecycle: &mut GamePhase,
        phase: &mut Option<Phase>,
        max_rounds: u32,
        player: PlayerId,
        message: &Message,
        session: &mut CommitSession<'_>,
    ) -> Result<(), EngineError> {
        let current = phase.as_mut().ok_or(ModelError::Invariant("no active phase"))?;

        let mut transition = current.process(player, message, session)?;
        while transition != PhaseTransition::None {
            let next = match transition {
                PhaseTransition::None => break,
                PhaseTransition::StartMain => {
                    *lifecycle = GamePhase::Main;
                    Phase::Action(ActionPhase::new())
                }
                PhaseTransition::FinishActions => Phase::Combat(CombatPhase::new()),
                PhaseTransition::FinishCombat => Phase::Upkeep(UpkeepPhase::new()),
                PhaseTransition::FinishRound if session.state().round > max_rounds => {
                    session.do_record(NoteRecord::new("The game is over"))?;
                    *lifecycle = GamePhase::Finished;
                    *phase = None;
                    session.notify(GameUpdate::Phase);
                    break;
                }
                PhaseTransition::FinishRound => Phase::Action(ActionPhase::new()),
            };
            let entered = phase.insert(next);
            transition = entered.enter(session)?;
        }
        Ok(())
    }

    /// Rebuilds the current state from the initial snapshot and the log.
    pub fn replay(&self, env: GameEnv<'_>) -> Result<GameState, ModelError> {
        let mut state = self
            .initial_state
            .clone()
            .ok_or(ModelError::Invariant("game has not started"))?;
        for record in self.log.records() {
            record.clone().apply(true, &mut state, env)?;
        }
        Ok(state)
    }

    /// A detached cursor over the history, positioned at the present.
    pub fn review(&self, env: GameEnv<'_>) -> Result<Review, ModelError> {
        let initial = self
            .initial_state
            .clone()
            .ok_or(ModelError::Invariant("game has not started"))?;
        let mut review = Review::new(initial, self.log.records().to_vec());
        review.seek(review.len(), env)?;
        Ok(review)
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> GamePhase {
        self.lifecycle
    }

    pub fn phase(&self) -> Option<&Phase> {
        self.phase.as_ref()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn log(&self) -> &RecordLog {
        &self.log
    }

    /// Human-readable game log.
    pub fn logs(&self) -> Vec<(RecordId, String)> {
        self.log.logs()
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.state.team_order.iter().map(|slot| slot.player)
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.state.slot_of(player).is_some()
    }

    /// Teams whose input the game is waiting for.
    pub fn active_colours(&self) -> Vec<Colour> {
        self.phase
            .as_ref()
            .map(|phase| phase.active_colours(&self.state))
            .unwrap_or_default()
    }

    /// The decision `player`'s team has to make, if any.
    pub fn current_cmd(&self, player: PlayerId) -> Option<&Cmd> {
        let colour = self
            .state
            .slot_of(player)
            .and_then(|slot| self.state.slot_colour(slot))?;
        self.phase.as_ref()?.current_cmd(colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::{CollectingSink, NullSink};
    use crate::test_support::{Fixture, SEED};

    const OWNER: PlayerId = PlayerId(1);
    const GUEST: PlayerId = PlayerId(2);

    fn lobby(config: GameConfig) -> LiveGame {
        let mut game = LiveGame::new(GameId(1), "test", OWNER, config);
        game.add_player(GUEST).unwrap();
        game
    }

    fn send(game: &mut LiveGame, fixture: &Fixture, player: PlayerId, message: Message) {
        game.process(player, &message, fixture.env(), &mut NullSink)
            .unwrap();
    }

    /// Starts the game and lets both seats pick, returning players in turn order.
    fn chosen(game: &mut LiveGame, fixture: &Fixture) -> [PlayerId; 2] {
        game.start(OWNER, SEED, fixture.env()).unwrap();
        let order: Vec<PlayerId> = game.players().collect();
        let picks = [
            (RaceType::Human, Colour::Red),
            (RaceType::Planta, Colour::Blue),
        ];
        for (player, (race, colour)) in order.iter().zip(picks) {
            send(game, fixture, *player, Message::ChooseTeam { race, colour });
        }
        [order[0], order[1]]
    }

    fn pass_round(game: &mut LiveGame, fixture: &Fixture, order: [PlayerId; 2]) {
        for player in order {
            send(
                game,
                fixture,
                player,
                Message::StartAction {
                    action: ActionKind::Pass,
                },
            );
            send(game, fixture, player, Message::Commit);
        }
        for player in order {
            send(game, fixture, player, Message::Commit);
        }
    }

    #[test]
    fn lobby_rules() {
        let fixture = Fixture::new();
        let mut config = GameConfig::new();
        config.max_teams = 2;
        let mut game = lobby(config);

        assert_eq!(game.add_player(GUEST), Err(InputError::AlreadyJoined));
        assert_eq!(game.add_player(PlayerId(3)), Err(InputError::GameFull));
        let err = game
            .process(OWNER, &Message::Commit, fixture.env(), &mut NullSink)
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotStarted));

        let err = game.start(GUEST, SEED, fixture.env()).unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotOwner));
        game.start(OWNER, SEED, fixture.env()).unwrap();
        assert_eq!(game.lifecycle(), GamePhase::ChooseTeam);
        assert_eq!(game.add_player(PlayerId(3)), Err(InputError::AlreadyStarted));
        assert_eq!(game.state().seed, SEED);
    }

    #[test]
    fn a_round_cycles_through_every_phase() {
        let fixture = Fixture::new();
        let mut game = lobby(GameConfig::new());
        let order = chosen(&mut game, &fixture);
        assert_eq!(game.lifecycle(), GamePhase::Main);
        assert!(matches!(game.phase(), Some(Phase::Action(_))));
        assert_eq!(game.active_colours(), vec![Colour::Red]);

        let err = game
            .process(order[1], &Message::Commit, fixture.env(), &mut NullSink)
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NotYourTurn));

        for player in order {
            send(&mut game, &fixture, player, Message::StartAction { action: ActionKind::Pass });
            send(&mut game, &fixture, player, Message::Commit);
        }
        // Nothing is contested, so combat is skipped straight to upkeep.
        assert!(matches!(game.phase(), Some(Phase::Upkeep(_))));
        assert_eq!(game.active_colours(), vec![Colour::Red, Colour::Blue]);

        let mut sink = CollectingSink::default();
        for player in order {
            game.process(player, &Message::Commit, fixture.env(), &mut sink)
                .unwrap();
        }
        assert!(sink.updates.contains(&GameUpdate::Round));
        assert!(matches!(game.phase(), Some(Phase::Action(_))));
        assert_eq!(game.state().round, 2);
        assert!(game.logs().iter().any(|(_, line)| line == "Round 2 begins"));
    }

    #[test]
    fn rejected_input_leaves_the_game_untouched() {
        let fixture = Fixture::new();
        let mut game = lobby(GameConfig::new());
        let order = chosen(&mut game, &fixture);
        let state = game.state().clone();
        let log = game.log().clone();

        let err = game
            .process(
                order[0],
                &Message::Cmd {
                    input: CmdInput::Fire,
                },
                fixture.env(),
                &mut NullSink,
            )
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::NoActiveCommand));
        assert_eq!(game.state(), &state);
        assert_eq!(game.log(), &log);
        assert_eq!(game.current_cmd(order[0]), None);
    }

    #[test]
    fn replay_reproduces_the_live_state() {
        let fixture = Fixture::new();
        let mut game = lobby(GameConfig::new());
        let order = chosen(&mut game, &fixture);
        send(&mut game, &fixture, order[0], Message::StartAction { action: ActionKind::Build });
        send(&mut game, &fixture, order[0], Message::Undo);
        send(&mut game, &fixture, order[0], Message::StartAction { action: ActionKind::Pass });
        send(&mut game, &fixture, order[0], Message::Commit);
        send(&mut game, &fixture, order[1], Message::StartAction { action: ActionKind::Pass });
        send(&mut game, &fixture, order[1], Message::Commit);

        let replayed = game.replay(fixture.env()).unwrap();
        assert_eq!(&replayed, game.state());
        #[cfg(feature = "serde")]
        assert_eq!(replayed.digest().unwrap(), game.state().digest().unwrap());
    }

    #[test]
    fn game_finishes_after_the_last_round() {
        let fixture = Fixture::new();
        let mut game = lobby(GameConfig::with_max_rounds(1));
        let order = chosen(&mut game, &fixture);
        pass_round(&mut game, &fixture, order);

        assert_eq!(game.lifecycle(), GamePhase::Finished);
        assert!(game.phase().is_none());
        assert!(game.active_colours().is_empty());
        let err = game
            .process(order[0], &Message::Commit, fixture.env(), &mut NullSink)
            .unwrap_err();
        assert_eq!(err.as_input(), Some(&InputError::GameOver));
    }
}
