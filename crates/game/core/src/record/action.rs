use super::{RecordContext, RecordTransition, captured};
use crate::cmd::ActionKind;
use crate::error::{ModelError, verify_model};
use crate::state::{Colour, CubeCounts, GameState, Resource, Storage, TeamSlot, TechType};
use crate::update::GameUpdate;

/// A team spends an influence disc to take a main action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRecord {
    pub colour: Colour,
    pub action: ActionKind,
}

impl ActionRecord {
    pub fn new(colour: Colour, action: ActionKind) -> Self {
        Self { colour, action }
    }
}

impl RecordTransition for ActionRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let team = state.team_mut(self.colour)?;
        if forward {
            verify_model(team.influence_discs > 0, "no influence disc for action")?;
            team.influence_discs -= 1;
            team.action_discs += 1;
        } else {
            verify_model(team.action_discs > 0, "no action disc to return")?;
            team.action_discs -= 1;
            team.influence_discs += 1;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} chose to {}", self.colour, self.action)
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Influence(self.colour), GameUpdate::Log]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassRecord {
    pub colour: Colour,
}

impl PassRecord {
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }
}

impl RecordTransition for PassRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            let team = state.team_mut(self.colour)?;
            verify_model(!team.passed, "team already passed")?;
            team.passed = true;
            state.pass_order.push(self.colour);
        } else {
            verify_model(
                state.pass_order.last() == Some(&self.colour),
                "team is not the last to pass",
            )?;
            state.pass_order.pop();
            state.team_mut(self.colour)?.passed = false;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} passed", self.colour)
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Teams, GameUpdate::Log]
    }
}

/// Upkeep bookkeeping for one team, captured on first application.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Income {
    /// Production minus influence upkeep.
    pub storage: Storage,
    pub returned_discs: u32,
    pub returned_cubes: CubeCounts,
    pub refreshed_colony_ships: u32,
}

/// Production, influence upkeep and cleanup for one team.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncomeRecord {
    pub colour: Colour,
    pub income: Option<Income>,
}

impl IncomeRecord {
    pub fn new(colour: Colour) -> Self {
        Self {
            colour,
            income: None,
        }
    }

    fn compute(&self, state: &GameState, ctx: &RecordContext<'_>) -> Result<Income, ModelError> {
        let rules = ctx.env.rules()?;
        let team = state.team(self.colour)?;
        let capacity = rules.population_track();
        let produce = |resource: Resource| {
            let placed = capacity.saturating_sub(team.population.get(resource));
            rules.production(placed)
        };
        let upkeep = rules.influence_upkeep(team.discs_in_use());
        Ok(Income {
            storage: Storage::new(
                produce(Resource::Money) - upkeep,
                produce(Resource::Science),
                produce(Resource::Materials),
            ),
            returned_discs: team.action_discs,
            returned_cubes: team.graveyard,
            refreshed_colony_ships: team.colony_ships_used,
        })
    }
}

impl RecordTransition for IncomeRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward && self.income.is_none() {
            self.income = Some(self.compute(state, ctx)?);
        }
        let income = captured(&self.income, "income")?;
        let team = state.team_mut(self.colour)?;

        team.storage.apply(&income.storage, forward);
        if forward {
            verify_model(
                team.action_discs == income.returned_discs,
                "action discs changed since income was computed",
            )?;
            team.action_discs = 0;
            team.influence_discs += income.returned_discs;
            for resource in Resource::ALL {
                let cubes = income.returned_cubes.get(resource);
                *team.population.get_mut(resource) += cubes;
                *team.graveyard.get_mut(resource) -= cubes;
            }
            team.colony_ships_used -= income.refreshed_colony_ships;
        } else {
            team.influence_discs -= income.returned_discs;
            team.action_discs = income.returned_discs;
            for resource in Resource::ALL {
                let cubes = income.returned_cubes.get(resource);
                *team.population.get_mut(resource) -= cubes;
                *team.graveyard.get_mut(resource) += cubes;
            }
            team.colony_ships_used += income.refreshed_colony_ships;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.income {
            Some(income) => format!(
                "{} collected {} money, {} science and {} materials",
                self.colour, income.storage.money, income.storage.science, income.storage.materials
            ),
            None => String::new(),
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Storage(self.colour),
            GameUpdate::Influence(self.colour),
            GameUpdate::Population(self.colour),
            GameUpdate::Log,
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundChange {
    pub previous_order: Vec<TeamSlot>,
    pub pass_order: Vec<Colour>,
    pub tech_draw: Vec<TechType>,
}

/// Closes a round: the first team to pass leads the next round, passes are
/// cleared, the round counter advances and new technologies reach the board.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndRoundRecord {
    pub tech_count: u32,
    pub change: Option<RoundChange>,
}

impl EndRoundRecord {
    pub fn new(tech_count: u32) -> Self {
        Self {
            tech_count,
            change: None,
        }
    }
}

impl RecordTransition for EndRoundRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            if self.change.is_none() {
                let keep = state.tech_bag.len().saturating_sub(self.tech_count as usize);
                self.change = Some(RoundChange {
                    previous_order: state.team_order.clone(),
                    pass_order: state.pass_order.clone(),
                    tech_draw: state.tech_bag[keep..].to_vec(),
                });
            }
            let change = captured(&self.change, "round change")?;
            if state.team_order != change.previous_order || state.pass_order != change.pass_order {
                return Err(ModelError::ReplayDiverged("turn order at end of round"));
            }

            if let Some(first) = change.pass_order.first() {
                let lead = state
                    .team_order
                    .iter()
                    .position(|slot| slot.colour == Some(*first))
                    .ok_or(ModelError::TeamNotFound(*first))?;
                state.team_order.rotate_left(lead);
            }
            state.pass_order.clear();
            for team in state.teams.values_mut() {
                team.passed = false;
            }
            state.round += 1;

            let keep = state
                .tech_bag
                .len()
                .checked_sub(change.tech_draw.len())
                .ok_or(ModelError::ReplayDiverged("technology bag too small"))?;
            verify_model(
                state.tech_bag[keep..] == change.tech_draw[..],
                "technology draw does not match bag",
            )?;
            state.tech_bag.truncate(keep);
            for tech in &change.tech_draw {
                *state.tech_board.entry(*tech).or_insert(0) += 1;
            }
        } else {
            let change = captured(&self.change, "round change")?;
            for tech in change.tech_draw.iter().rev() {
                let count = state
                    .tech_board
                    .get_mut(tech)
                    .ok_or(ModelError::Invariant("drawn technology missing from board"))?;
                *count -= 1;
                if *count == 0 {
                    state.tech_board.remove(tech);
                }
            }
            state.tech_bag.extend_from_slice(&change.tech_draw);
            state.round -= 1;
            for colour in &change.pass_order {
                state.team_mut(*colour)?.passed = true;
            }
            state.pass_order = change.pass_order.clone();
            state.team_order = change.previous_order.clone();
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "Round over".to_string()
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Round,
            GameUpdate::Teams,
            GameUpdate::TechBoard,
            GameUpdate::Log,
        ]
    }
}
