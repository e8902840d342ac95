use super::{RecordContext, RecordTransition, captured};
use crate::battle::{Battle, DIE_SIDES, Die, Hit, PopulationHits, Turn};
use crate::env::compute_seed;
use crate::error::{ModelError, verify_model};
use crate::state::{Colour, Fleet, GameState, MapPos, Resource};
use crate::update::GameUpdate;

/// Opens a battle on a contested hex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartBattleRecord {
    pub pos: MapPos,
    pub battle: Option<Battle>,
}

impl StartBattleRecord {
    pub fn new(pos: MapPos) -> Self {
        Self { pos, battle: None }
    }
}

impl RecordTransition for StartBattleRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            if state.battle.is_some() {
                return Err(ModelError::BattleInProgress);
            }
            if self.battle.is_none() {
                let hex = state.hex(self.pos)?;
                self.battle = Some(Battle::new(hex, state, &ctx.env)?);
            }
            state.battle = Some(captured(&self.battle, "battle")?.clone());
        } else {
            let battle = state.battle.take().ok_or(ModelError::NoBattle)?;
            verify_model(battle.pos == self.pos, "another battle is in progress")?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.battle {
            Some(battle) => match battle.defender {
                Some(defender) => format!(
                    "{} attacks {} at {}",
                    battle.invader, defender, self.pos
                ),
                None => format!("{} attacks neutral ships at {}", battle.invader, self.pos),
            },
            None => String::new(),
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Battle, GameUpdate::Log]
    }
}

/// Dice rolled by one battle group. Only informs the log; the outcome is
/// applied by the attack record that follows.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiceRollRecord {
    pub colour: Option<Colour>,
    pub group: usize,
    pub count: u32,
    pub damage: u32,
    pub faces: Option<Vec<u8>>,
}

impl DiceRollRecord {
    pub fn new(colour: Option<Colour>, group: usize, count: u32, damage: u32) -> Self {
        Self {
            colour,
            group,
            count,
            damage,
            faces: None,
        }
    }

    pub fn dice(&self) -> Vec<Die> {
        self.faces
            .iter()
            .flatten()
            .map(|face| Die::new(*face, self.damage))
            .collect()
    }
}

impl RecordTransition for DiceRollRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward && self.faces.is_none() {
            let rng = ctx.env.rng()?;
            let faces = (0..self.count)
                .map(|index| {
                    let seed = compute_seed(state.seed, ctx.id.0, self.group as u32, index);
                    rng.roll_die(seed, DIE_SIDES) as u8
                })
                .collect();
            self.faces = Some(faces);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let who = self
            .colour
            .map_or_else(|| "Neutral ships".to_string(), |colour| colour.to_string());
        let faces = self.faces.as_deref().unwrap_or_default();
        format!("{who} rolled {faces:?}")
    }

    fn is_message(&self) -> bool {
        true
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Log]
    }
}

/// Applies the firing group's hits to enemy ships and passes the turn on.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackShipsRecord {
    pub hits: Vec<Hit>,
    pub previous_turn: Option<Turn>,
    /// Whether the firing group spent its missiles.
    pub used_missiles: Option<bool>,
}

impl AttackShipsRecord {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self {
            hits,
            previous_turn: None,
            used_missiles: None,
        }
    }
}

impl RecordTransition for AttackShipsRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let GameState { battle, map, .. } = state;
        let battle = battle.as_mut().ok_or(ModelError::NoBattle)?;
        let hex = map.get(battle.pos).ok_or(ModelError::HexNotFound(battle.pos))?;

        if forward {
            verify_model(!battle.is_finished(), "battle already finished")?;
            battle.apply_hits(&self.hits, true)?;
            let missile_phase = battle.is_missile_phase();
            let group = battle
                .current_group_mut()
                .ok_or(ModelError::Invariant("no group is firing"))?;
            let used = missile_phase && group.has_missiles;
            if used {
                group.has_missiles = false;
            }
            self.used_missiles = Some(used);
            self.previous_turn = Some(battle.advance_turn(hex));
        } else {
            battle.set_turn(*captured(&self.previous_turn, "battle turn")?);
            if *captured(&self.used_missiles, "missile use")? {
                battle
                    .current_group_mut()
                    .ok_or(ModelError::Invariant("no group is firing"))?
                    .has_missiles = true;
            }
            battle.apply_hits(&self.hits, false)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let dice: usize = self.hits.iter().map(|hit| hit.dice.len()).sum();
        match dice {
            0 => "All shots missed".to_string(),
            _ => format!("{dice} hit(s) on {} ship(s)", self.hits.len()),
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Battle, GameUpdate::Log]
    }
}

/// Destroys population cubes with the invader's shots.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackPopulationRecord {
    pub colour: Colour,
    pub hits: PopulationHits,
    /// Squares emptied and the track each cube belonged to.
    pub killed: Option<Vec<(usize, Resource)>>,
    pub previous_owner: Option<Option<Colour>>,
    pub previous_turn: Option<Turn>,
}

impl AttackPopulationRecord {
    pub fn new(colour: Colour, hits: PopulationHits) -> Self {
        Self {
            colour,
            hits,
            killed: None,
            previous_owner: None,
            previous_turn: None,
        }
    }
}

impl RecordTransition for AttackPopulationRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let GameState {
            battle, map, teams, ..
        } = state;
        let battle = battle.as_mut().ok_or(ModelError::NoBattle)?;
        let pos = battle.pos;
        let hex = map.get_mut(pos).ok_or(ModelError::HexNotFound(pos))?;
        let defender = battle
            .defender
            .ok_or(ModelError::Invariant("neutral ships have no population"))?;
        let team = teams
            .get_mut(&defender)
            .ok_or(ModelError::TeamNotFound(defender))?;

        if forward {
            verify_model(battle.is_population_phase(), "not in population phase")?;
            let mut killed = Vec::new();
            for index in &self.hits.squares {
                let square = hex
                    .squares
                    .get_mut(*index)
                    .ok_or(ModelError::Invariant("square index out of range"))?;
                let resource = square
                    .occupant
                    .take()
                    .ok_or(ModelError::Invariant("square already empty"))?;
                *team.graveyard.get_mut(resource) += 1;
                killed.push((*index, resource));
            }
            self.killed = Some(killed);
            self.previous_owner = Some(hex.owner);
            if !hex.has_population() && hex.owner == Some(defender) {
                hex.owner = None;
                team.influence_discs += 1;
            }
            self.previous_turn = Some(battle.advance_turn(hex));
        } else {
            battle.set_turn(*captured(&self.previous_turn, "battle turn")?);
            let previous_owner = *captured(&self.previous_owner, "hex owner")?;
            if hex.owner != previous_owner {
                hex.owner = previous_owner;
                team.influence_discs -= 1;
            }
            for (index, resource) in captured(&self.killed, "destroyed cubes")?.iter().rev() {
                let square = hex
                    .squares
                    .get_mut(*index)
                    .ok_or(ModelError::Invariant("square index out of range"))?;
                square.occupant = Some(*resource);
                *team.graveyard.get_mut(*resource) -= 1;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.killed {
            Some(killed) if !killed.is_empty() => format!(
                "{} destroyed {} population cube(s)",
                self.colour,
                killed.len()
            ),
            _ => String::new(),
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Battle, GameUpdate::Map, GameUpdate::Log]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinishedBattle {
    pub battle: Battle,
    pub fleets: Vec<Fleet>,
}

/// Removes destroyed ships from the map and closes the battle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinishBattleRecord {
    pub finished: Option<FinishedBattle>,
}

impl FinishBattleRecord {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordTransition for FinishBattleRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            let battle = state.battle()?.clone();
            verify_model(battle.is_finished(), "battle still running")?;
            let hex = state.hex_mut(battle.pos)?;
            let fleets = hex.fleets.clone();
            let casualties = battle.casualties();
            for (owner, ship, dead) in &casualties {
                hex.remove_ships(*owner, *ship, *dead)
                    .map_err(ModelError::Invariant)?;
            }
            for (owner, ship, dead) in casualties {
                if let Some(colour) = owner {
                    *state.team_mut(colour)?.supply.entry(ship).or_insert(0) += dead;
                }
            }
            state.battle = None;
            self.finished = Some(FinishedBattle { battle, fleets });
        } else {
            verify_model(state.battle.is_none(), "another battle is in progress")?;
            let finished = captured(&self.finished, "finished battle")?;
            for (owner, ship, dead) in finished.battle.casualties() {
                if let Some(colour) = owner {
                    let supply = state.team_mut(colour)?.supply.entry(ship).or_insert(0);
                    *supply = supply
                        .checked_sub(dead)
                        .ok_or(ModelError::Invariant("destroyed ships missing from supply"))?;
                }
            }
            state.hex_mut(finished.battle.pos)?.fleets = finished.fleets.clone();
            state.battle = Some(finished.battle.clone());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.finished {
            Some(finished) => format!("Battle at {} is over", finished.battle.pos),
            None => String::new(),
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Battle, GameUpdate::Map, GameUpdate::Log]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::BattlePhase;
    use crate::record::tests::round_trip;
    use crate::record::RecordId;
    use crate::state::{RaceType, ShipType};
    use crate::test_support::Fixture;

    fn ctx(fixture: &Fixture, id: u64) -> RecordContext<'_> {
        RecordContext {
            id: RecordId(id),
            env: fixture.env(),
        }
    }

    /// Red's home holds one interceptor; Blue moves in two cruisers.
    fn contested() -> (Fixture, GameState, MapPos) {
        let fixture = Fixture::new();
        let mut state = fixture.started_state(&[
            (Colour::Red, RaceType::Human),
            (Colour::Blue, RaceType::Planta),
        ]);
        let home = state.map.owned_by(Colour::Red).next().unwrap().pos;
        state
            .hex_mut(home)
            .unwrap()
            .add_ships(Some(Colour::Blue), ShipType::Cruiser, 2);
        (fixture, state, home)
    }

    #[test]
    fn start_battle_round_trips() {
        let (fixture, mut state, home) = contested();
        let record = round_trip(&fixture, &mut state, StartBattleRecord::new(home));
        let battle = record.battle.unwrap();
        assert_eq!(battle.defender, Some(Colour::Red));
        assert_eq!(battle.invader, Colour::Blue);
        assert_eq!(battle.groups().len(), 2);
    }

    #[test]
    fn dice_are_rolled_once_and_kept() {
        let (fixture, mut state, _) = contested();
        let mut record = DiceRollRecord::new(Some(Colour::Red), 0, 4, 1);
        record.apply(true, &mut state, &ctx(&fixture, 7)).unwrap();
        let dice = record.dice();
        assert_eq!(dice.len(), 4);
        assert!(dice.iter().all(|die| (1..=6).contains(&die.face)));

        record.apply(true, &mut state, &ctx(&fixture, 8)).unwrap();
        assert_eq!(record.dice(), dice);
        assert!(record.describe().starts_with("red rolled"));
    }

    #[test]
    fn attack_ships_round_trips_and_advances() {
        let (fixture, mut state, home) = contested();
        StartBattleRecord::new(home)
            .apply(true, &mut state, &ctx(&fixture, 1))
            .unwrap();
        let battle = state.battle().unwrap();
        let turn = battle.turn();
        assert_eq!(turn.phase, BattlePhase::Main);
        let dice = [Die::new(6, 1)];
        let hits = battle.auto_assign_hits(&dice);
        assert_eq!(hits.len(), 1);

        round_trip(&fixture, &mut state, AttackShipsRecord::new(hits));
        assert_eq!(state.battle().unwrap().turn(), turn);
    }

    #[test]
    fn finishing_removes_dead_ships() {
        let (fixture, mut state, home) = contested();
        StartBattleRecord::new(home)
            .apply(true, &mut state, &ctx(&fixture, 1))
            .unwrap();

        // Destroy Red's interceptor with a single shot.
        let battle = state.battle_mut().unwrap();
        let target = battle
            .groups()
            .iter()
            .position(|group| group.owner == Some(Colour::Red))
            .unwrap();
        let hit = Hit {
            group: target,
            ship: 0,
            dice: vec![Die::new(6, 1)],
        };
        battle.apply_hits(&[hit], true).unwrap();
        battle.set_turn(Turn::FINISHED);

        let supply = state.team(Colour::Red).unwrap().supply_of(ShipType::Interceptor);
        round_trip(&fixture, &mut state, FinishBattleRecord::new());

        FinishBattleRecord::new()
            .apply(true, &mut state, &ctx(&fixture, 2))
            .unwrap();
        assert!(state.battle.is_none());
        let hex = state.hex(home).unwrap();
        assert!(!hex.has_ships(Some(Colour::Red)));
        assert_eq!(
            state.team(Colour::Red).unwrap().supply_of(ShipType::Interceptor),
            supply + 1
        );
    }

    #[test]
    fn population_attack_frees_the_hex() {
        let (fixture, mut state, home) = contested();
        state
            .hex_mut(home)
            .unwrap()
            .remove_ships(Some(Colour::Red), ShipType::Interceptor, 1)
            .unwrap();
        StartBattleRecord::new(home)
            .apply(true, &mut state, &ctx(&fixture, 1))
            .unwrap();
        assert!(state.battle().unwrap().is_population_phase());

        let hits = Battle::auto_destroy_population(state.hex(home).unwrap());
        let discs = state.team(Colour::Red).unwrap().influence_discs;
        let record = round_trip(
            &fixture,
            &mut state,
            AttackPopulationRecord::new(Colour::Blue, hits.clone()),
        );
        assert_eq!(record.killed.unwrap().len(), hits.squares.len());

        AttackPopulationRecord::new(Colour::Blue, hits)
            .apply(true, &mut state, &ctx(&fixture, 2))
            .unwrap();
        let hex = state.hex(home).unwrap();
        assert_eq!(hex.owner, None);
        assert!(!hex.has_population());
        assert_eq!(state.team(Colour::Red).unwrap().influence_discs, discs + 1);
    }
}
