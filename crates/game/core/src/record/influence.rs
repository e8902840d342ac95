use super::{RecordContext, RecordTransition, captured};
use crate::error::{ModelError, verify_model};
use crate::state::{Colour, GameState, MapPos, Resource};
use crate::update::GameUpdate;

fn place_name(place: Option<MapPos>) -> String {
    match place {
        Some(pos) => pos.to_string(),
        None => "the influence track".to_string(),
    }
}

/// Moves one influence disc. `None` on either side is the influence track.
///
/// Withdrawing from a hex sends its population cubes back to their tracks.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InfluenceRecord {
    pub colour: Colour,
    pub src: Option<MapPos>,
    pub dst: Option<MapPos>,
    /// Squares emptied at the source and the cube each held.
    pub returned: Option<Vec<(usize, Resource)>>,
}

impl InfluenceRecord {
    pub fn new(colour: Colour, src: Option<MapPos>, dst: Option<MapPos>) -> Self {
        Self {
            colour,
            src,
            dst,
            returned: None,
        }
    }

    fn take_disc(&mut self, state: &mut GameState) -> Result<(), ModelError> {
        let Some(pos) = self.src else {
            let team = state.team_mut(self.colour)?;
            verify_model(team.influence_discs > 0, "influence track is empty")?;
            team.influence_discs -= 1;
            return Ok(());
        };
        let hex = state.hex_mut(pos)?;
        verify_model(hex.owner == Some(self.colour), "source hex not influenced")?;
        hex.owner = None;
        let mut returned = Vec::new();
        for (index, square) in hex.squares.iter_mut().enumerate() {
            if let Some(resource) = square.occupant.take() {
                returned.push((index, resource));
            }
        }
        let team = state.team_mut(self.colour)?;
        for (_, resource) in &returned {
            *team.population.get_mut(*resource) += 1;
        }
        self.returned = Some(returned);
        Ok(())
    }

    fn return_disc(&self, state: &mut GameState) -> Result<(), ModelError> {
        let Some(pos) = self.src else {
            state.team_mut(self.colour)?.influence_discs += 1;
            return Ok(());
        };
        let returned = captured(&self.returned, "returned cubes")?;
        let team = state.team_mut(self.colour)?;
        for (_, resource) in returned {
            let cubes = team.population.get_mut(*resource);
            verify_model(*cubes > 0, "returned cube missing from track")?;
            *cubes -= 1;
        }
        let hex = state.hex_mut(pos)?;
        verify_model(hex.owner.is_none(), "source hex taken since withdrawal")?;
        hex.owner = Some(self.colour);
        for (index, resource) in returned {
            let square = hex
                .squares
                .get_mut(*index)
                .ok_or(ModelError::Invariant("square index out of range"))?;
            square.occupant = Some(*resource);
        }
        Ok(())
    }

    fn place_disc(&self, state: &mut GameState) -> Result<(), ModelError> {
        match self.dst {
            Some(pos) => {
                let hex = state.hex_mut(pos)?;
                verify_model(hex.owner.is_none(), "target hex already influenced")?;
                hex.owner = Some(self.colour);
            }
            None => state.team_mut(self.colour)?.influence_discs += 1,
        }
        Ok(())
    }

    fn lift_disc(&self, state: &mut GameState) -> Result<(), ModelError> {
        match self.dst {
            Some(pos) => {
                let hex = state.hex_mut(pos)?;
                verify_model(hex.owner == Some(self.colour), "target hex lost its disc")?;
                hex.owner = None;
            }
            None => {
                let team = state.team_mut(self.colour)?;
                verify_model(team.influence_discs > 0, "influence track is empty")?;
                team.influence_discs -= 1;
            }
        }
        Ok(())
    }
}

impl RecordTransition for InfluenceRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        verify_model(self.src != self.dst, "influence disc must move")?;
        if forward {
            self.take_disc(state)?;
            self.place_disc(state)
        } else {
            self.lift_disc(state)?;
            self.return_disc(state)
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} moved an influence disc from {} to {}",
            self.colour,
            place_name(self.src),
            place_name(self.dst)
        )
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Map,
            GameUpdate::Influence(self.colour),
            GameUpdate::Population(self.colour),
            GameUpdate::Log,
        ]
    }
}

/// Turns used colony ships face up again, at most `limit` of them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RefreshColonyShipsRecord {
    pub colour: Colour,
    pub limit: u32,
    pub refreshed: Option<u32>,
}

impl RefreshColonyShipsRecord {
    pub fn new(colour: Colour, limit: u32) -> Self {
        Self {
            colour,
            limit,
            refreshed: None,
        }
    }
}

impl RecordTransition for RefreshColonyShipsRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let team = state.team_mut(self.colour)?;
        if forward && self.refreshed.is_none() {
            self.refreshed = Some(team.colony_ships_used.min(self.limit));
        }
        let refreshed = *captured(&self.refreshed, "refreshed colony ships")?;
        if forward {
            team.colony_ships_used = team
                .colony_ships_used
                .checked_sub(refreshed)
                .ok_or(ModelError::Invariant("fewer colony ships used than refreshed"))?;
        } else {
            team.colony_ships_used += refreshed;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match self.refreshed {
            Some(count) if count > 0 => {
                format!("{} refreshed {} colony ship(s)", self.colour, count)
            }
            _ => String::new(),
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Teams, GameUpdate::Log]
    }
}
