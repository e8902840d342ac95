use std::collections::BTreeSet;

use super::{CmdInput, CmdStep, ProcessResult, next_phase, phase_limit};
use crate::env::TileDef;
use crate::error::{EngineError, InputError, ModelError, verify_input};
use crate::record::{DiscardHexRecord, DiscoveryRecord, DrawHexRecord, ExploreRecord};
use crate::session::CommitSession;
use crate::state::{
    Colour, DiscoveryType, GameState, HexId, HexRing, Map, MapPos, TechType,
};

/// Empty positions `colour` can explore: next to a hex it owns or has ships
/// in, through a wormhole on that hex (any edge with the wormhole generator),
/// within `radius` of the centre and with tiles left in the ring's pile.
pub fn explore_positions(state: &GameState, colour: Colour, radius: u32) -> Vec<MapPos> {
    let wormhole_gen = state
        .team(colour)
        .is_ok_and(|team| team.has_tech(TechType::WormholeGen));
    let mut positions = BTreeSet::new();
    for hex in state
        .map
        .hexes()
        .filter(|hex| hex.owner == Some(colour) || hex.has_ships(Some(colour)))
    {
        for (edge, next) in hex.pos.neighbours() {
            if state.map.contains(next) || next.ring_distance() > radius {
                continue;
            }
            if !wormhole_gen && !hex.wormholes.has(edge) {
                continue;
            }
            let stocked = HexRing::of(next)
                .and_then(|ring| state.hex_piles.get(&ring))
                .is_some_and(|pile| !pile.is_empty());
            if stocked {
                positions.insert(next);
            }
        }
    }
    positions.into_iter().collect()
}

/// Rotations under which `tile` placed at `pos` connects to the map.
///
/// Standard rule: some edge carries a wormhole on both the new tile and the
/// neighbour facing it. Relaxed rule (wormhole generator): some edge has a
/// neighbour and at least one of the two halves.
pub fn matching_rotations(map: &Map, tile: &TileDef, pos: MapPos, relaxed: bool) -> Vec<u8> {
    (0..6u8)
        .filter(|rotation| {
            let wormholes = tile.wormholes.rotated(*rotation);
            pos.neighbours().any(|(edge, next)| {
                let Some(neighbour) = map.get(next) else {
                    return false;
                };
                let here = wormholes.has(edge);
                let there = neighbour.wormholes.has(edge.opposite());
                if relaxed { here || there } else { here && there }
            })
        })
        .collect()
}

fn ring_of(pos: MapPos) -> Result<HexRing, ModelError> {
    HexRing::of(pos).ok_or(ModelError::Invariant("explored position has no ring"))
}

/// Choose where to explore.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExploreCmd {
    pub colour: Colour,
    pub phase: u32,
}

impl ExploreCmd {
    pub fn new(colour: Colour, phase: u32) -> Self {
        Self { colour, phase }
    }
}

impl CmdStep for ExploreCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::ExplorePos { pos } => {
                let radius = session.config().map_radius;
                let positions = explore_positions(session.state(), self.colour, radius);
                verify_input(
                    positions.contains(pos),
                    InputError::InvalidChoice("position cannot be explored"),
                )?;
                let ring = ring_of(*pos)?;
                let (_, draw) = session.do_record(DrawHexRecord::new(ring))?;
                let tile = draw
                    .tile
                    .ok_or(ModelError::NotCaptured("drawn hex"))?;
                Ok(ProcessResult::then(ExploreHexCmd {
                    colour: self.colour,
                    phase: self.phase,
                    pos: *pos,
                    tiles: vec![tile],
                }))
            }
            CmdInput::Reject if self.phase > 0 => Ok(ProcessResult::done()),
            CmdInput::Reject => {
                Err(InputError::ActionNotAllowed("undo to cancel the first exploration").into())
            }
            _ => Err(InputError::UnexpectedInput {
                expected: "explore_pos",
            }
            .into()),
        }
    }
}

/// Choose a drawn tile, its rotation and whether to influence it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExploreHexCmd {
    pub colour: Colour,
    pub phase: u32,
    pub pos: MapPos,
    /// Tiles drawn for this position, oldest first.
    pub tiles: Vec<HexId>,
}

impl ExploreHexCmd {
    fn continuation(&self, session: &CommitSession<'_>) -> Result<Option<super::Cmd>, EngineError> {
        let limit = phase_limit(session, self.colour, |rules| rules.explore_rate)?;
        let colour = self.colour;
        Ok(next_phase(self.phase, limit, |phase| {
            ExploreCmd::new(colour, phase).into()
        }))
    }

    fn discard(
        &self,
        session: &mut CommitSession<'_>,
        keep: Option<HexId>,
    ) -> Result<(), EngineError> {
        let ring = ring_of(self.pos)?;
        for tile in self.tiles.iter().filter(|tile| Some(**tile) != keep) {
            session.do_record(DiscardHexRecord::new(ring, *tile))?;
        }
        Ok(())
    }

    fn place(
        &self,
        session: &mut CommitSession<'_>,
        tile: HexId,
        rotation: u8,
        influence: bool,
    ) -> Result<ProcessResult, EngineError> {
        verify_input(
            self.tiles.contains(&tile),
            InputError::InvalidChoice("tile was not drawn"),
        )?;
        let def = session.env().tile(tile)?;
        let team = session.state().team(self.colour)?;
        let relaxed = team.has_tech(TechType::WormholeGen);
        let rotations = matching_rotations(&session.state().map, &def, self.pos, relaxed);
        verify_input(
            rotations.contains(&rotation),
            InputError::InvalidChoice("rotation does not connect to the map"),
        )?;
        if influence {
            verify_input(
                !def.is_guarded(),
                InputError::ActionNotAllowed("guarded hexes cannot be influenced"),
            )?;
            verify_input(
                team.influence_discs > 0,
                InputError::NotEnough("influence discs"),
            )?;
        }
        let continuation = self.continuation(session)?;

        let (_, explored) = session.do_record(ExploreRecord::new(
            self.colour,
            tile,
            self.pos,
            rotation,
            influence,
        ))?;
        self.discard(session, Some(tile))?;

        match explored.discovery.flatten() {
            Some(discovery) if influence => Ok(ProcessResult::then(DiscoverCmd::new(
                self.colour,
                self.pos,
                discovery,
            ))
            .with_queue(continuation.into_iter().collect())),
            _ => Ok(ProcessResult::maybe(continuation)),
        }
    }

    fn take_another(&self, session: &mut CommitSession<'_>) -> Result<ProcessResult, EngineError> {
        let race = session.state().team(self.colour)?.race;
        let choices = session.env().race_rules(race)?.explore_choices;
        verify_input(
            (self.tiles.len() as u32) < choices,
            InputError::ActionNotAllowed("no more tiles may be drawn"),
        )?;
        let ring = ring_of(self.pos)?;
        let stocked = session
            .state()
            .hex_piles
            .get(&ring)
            .is_some_and(|pile| !pile.is_empty());
        verify_input(stocked, InputError::NotEnough("tiles in the pile"))?;

        let (_, draw) = session.do_record(DrawHexRecord::new(ring))?;
        let tile = draw.tile.ok_or(ModelError::NotCaptured("drawn hex"))?;
        let mut tiles = self.tiles.clone();
        tiles.push(tile);
        Ok(ProcessResult::then(ExploreHexCmd { tiles, ..self.clone() }))
    }
}

impl CmdStep for ExploreHexCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        match input {
            CmdInput::ExploreHex {
                tile,
                rotation,
                influence,
            } => self.place(session, *tile, *rotation, *influence),
            CmdInput::ExploreTake => self.take_another(session),
            CmdInput::Reject => {
                let continuation = self.continuation(session)?;
                self.discard(session, None)?;
                Ok(ProcessResult::maybe(continuation))
            }
            _ => Err(InputError::UnexpectedInput {
                expected: "explore_hex",
            }
            .into()),
        }
    }
}

/// Claim a discovery tile for its reward or keep it for victory points.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoverCmd {
    pub colour: Colour,
    pub pos: MapPos,
    pub discovery: DiscoveryType,
}

impl DiscoverCmd {
    pub fn new(colour: Colour, pos: MapPos, discovery: DiscoveryType) -> Self {
        Self {
            colour,
            pos,
            discovery,
        }
    }
}

impl CmdStep for DiscoverCmd {
    fn colour(&self) -> Colour {
        self.colour
    }

    fn process(
        &self,
        input: &CmdInput,
        session: &mut CommitSession<'_>,
    ) -> Result<ProcessResult, EngineError> {
        let CmdInput::Discovery { take_reward } = input else {
            return Err(InputError::UnexpectedInput {
                expected: "discovery",
            }
            .into());
        };
        session.do_record(DiscoveryRecord::new(
            self.colour,
            self.pos,
            self.discovery,
            *take_reward,
        ))?;
        Ok(ProcessResult::done())
    }
}
