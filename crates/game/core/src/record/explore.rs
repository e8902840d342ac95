use super::{RecordContext, RecordTransition, captured};
use crate::error::{ModelError, verify_model};
use crate::state::{Colour, DiscoveryType, GameState, Hex, HexId, HexRing, MapPos};
use crate::update::GameUpdate;

/// Takes the top tile of a ring's draw pile.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawHexRecord {
    pub ring: HexRing,
    pub tile: Option<HexId>,
}

impl DrawHexRecord {
    pub fn new(ring: HexRing) -> Self {
        Self { ring, tile: None }
    }
}

impl RecordTransition for DrawHexRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            let empty = ModelError::PileEmpty { ring: self.ring };
            let pile = state.hex_piles.get_mut(&self.ring).ok_or(empty.clone())?;
            let top = pile.pop().ok_or(empty)?;
            match self.tile {
                Some(tile) if tile != top => {
                    pile.push(top);
                    return Err(ModelError::ReplayDiverged("hex pile order"));
                }
                _ => self.tile = Some(top),
            }
        } else {
            let tile = *captured(&self.tile, "drawn hex")?;
            state.hex_piles.entry(self.ring).or_default().push(tile);
        }
        Ok(())
    }
}

/// Puts a drawn tile on its ring's discard pile.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscardHexRecord {
    pub ring: HexRing,
    pub tile: HexId,
}

impl DiscardHexRecord {
    pub fn new(ring: HexRing, tile: HexId) -> Self {
        Self { ring, tile }
    }
}

impl RecordTransition for DiscardHexRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let discards = state.hex_discards.entry(self.ring).or_default();
        if forward {
            discards.push(self.tile);
        } else {
            verify_model(discards.last() == Some(&self.tile), "discard pile top differs")?;
            discards.pop();
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Hex {} was discarded", self.tile)
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![GameUpdate::Log]
    }
}

/// Places an explored tile on the map, optionally taking control of it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExploreRecord {
    pub colour: Colour,
    pub tile: HexId,
    pub pos: MapPos,
    pub rotation: u8,
    pub influence: bool,
    /// Discovery tile drawn for the hex, captured on first application.
    pub discovery: Option<Option<DiscoveryType>>,
}

impl ExploreRecord {
    pub fn new(colour: Colour, tile: HexId, pos: MapPos, rotation: u8, influence: bool) -> Self {
        Self {
            colour,
            tile,
            pos,
            rotation,
            influence,
            discovery: None,
        }
    }
}

impl RecordTransition for ExploreRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        if forward {
            if state.map.contains(self.pos) {
                return Err(ModelError::HexOccupied(self.pos));
            }
            let tile = ctx.env.tile(self.tile)?;
            let mut hex = Hex::from_tile(&tile, self.pos, self.rotation);
            if self.influence {
                verify_model(!tile.is_guarded(), "guarded hex cannot be influenced")?;
                let team = state.team(self.colour)?;
                verify_model(team.influence_discs > 0, "no influence disc for hex")?;
            }

            if tile.discovery {
                let top = state.discovery_bag.last().copied();
                match self.discovery {
                    Some(drawn) if drawn != top => {
                        return Err(ModelError::ReplayDiverged("discovery bag order"));
                    }
                    _ => self.discovery = Some(top),
                }
                state.discovery_bag.pop();
                hex.discovery = top;
            } else {
                self.discovery = Some(None);
            }

            if self.influence {
                state.team_mut(self.colour)?.influence_discs -= 1;
                hex.owner = Some(self.colour);
            }
            state.map.insert(hex);
        } else {
            let hex = state
                .map
                .remove(self.pos)
                .ok_or(ModelError::HexNotFound(self.pos))?;
            verify_model(hex.id == self.tile, "explored hex differs")?;
            if self.influence {
                state.team_mut(self.colour)?.influence_discs += 1;
            }
            if let Some(discovery) = captured(&self.discovery, "discovery draw")? {
                state.discovery_bag.push(*discovery);
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} explored hex {} at {}", self.colour, self.tile, self.pos)
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Map,
            GameUpdate::Influence(self.colour),
            GameUpdate::Log,
        ]
    }
}

/// Claims the discovery tile on a hex, either for its reward or face down
/// for victory points.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoveryRecord {
    pub colour: Colour,
    pub pos: MapPos,
    pub discovery: DiscoveryType,
    pub take_reward: bool,
}

impl DiscoveryRecord {
    pub fn new(colour: Colour, pos: MapPos, discovery: DiscoveryType, take_reward: bool) -> Self {
        Self {
            colour,
            pos,
            discovery,
            take_reward,
        }
    }
}

impl RecordTransition for DiscoveryRecord {
    fn apply(
        &mut self,
        forward: bool,
        state: &mut GameState,
        _ctx: &RecordContext<'_>,
    ) -> Result<(), ModelError> {
        let hex = state.hex_mut(self.pos)?;
        if forward {
            verify_model(hex.discovery == Some(self.discovery), "no such discovery on hex")?;
            hex.discovery = None;
        } else {
            verify_model(hex.discovery.is_none(), "hex already holds a discovery")?;
            hex.discovery = Some(self.discovery);
        }

        let team = state.team_mut(self.colour)?;
        if self.take_reward {
            team.storage.apply(&self.discovery.reward(), forward);
        } else if forward {
            team.kept_discoveries.push(self.discovery);
        } else {
            verify_model(
                team.kept_discoveries.last() == Some(&self.discovery),
                "kept discovery differs",
            )?;
            team.kept_discoveries.pop();
        }
        Ok(())
    }

    fn describe(&self) -> String {
        if self.take_reward {
            format!("{} claimed a {} discovery", self.colour, self.discovery)
        } else {
            format!("{} kept a discovery for victory points", self.colour)
        }
    }

    fn updates(&self) -> Vec<GameUpdate> {
        vec![
            GameUpdate::Map,
            GameUpdate::Storage(self.colour),
            GameUpdate::Log,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::round_trip;
    use crate::state::RaceType;
    use crate::test_support::Fixture;

    fn started() -> (Fixture, GameState) {
        let fixture = Fixture::new();
        let state = fixture.started_state(&[(Colour::Red, RaceType::Human)]);
        (fixture, state)
    }

    #[test]
    fn draw_and_discard_round_trip() {
        let (fixture, mut state) = started();
        let drawn = round_trip(&fixture, &mut state, DrawHexRecord::new(HexRing::Inner));
        let tile = drawn.tile.unwrap();
        assert_eq!(state.hex_piles[&HexRing::Inner].last(), Some(&tile));

        round_trip(
            &fixture,
            &mut state,
            DiscardHexRecord::new(HexRing::Inner, tile),
        );
    }

    #[test]
    fn drawing_from_empty_pile_fails() {
        let (fixture, mut state) = started();
        state.hex_piles.insert(HexRing::Outer, Vec::new());
        let ctx = RecordContext {
            id: crate::record::RecordId(3),
            env: fixture.env(),
        };
        let err = DrawHexRecord::new(HexRing::Outer)
            .apply(true, &mut state, &ctx)
            .unwrap_err();
        assert_eq!(err, ModelError::PileEmpty { ring: HexRing::Outer });
    }

    #[test]
    fn explore_with_influence_takes_disc_and_discovery() {
        let (fixture, mut state) = started();
        let discs = state.team(Colour::Red).unwrap().influence_discs;
        let bag = state.discovery_bag.len();
        let pos = MapPos::new(0, -1);

        let record = round_trip(
            &fixture,
            &mut state,
            ExploreRecord::new(Colour::Red, HexId(101), pos, 0, true),
        );
        assert!(record.discovery.unwrap().is_some());

        let mut record = ExploreRecord {
            discovery: record.discovery,
            ..ExploreRecord::new(Colour::Red, HexId(101), pos, 0, true)
        };
        let ctx = RecordContext {
            id: crate::record::RecordId(4),
            env: fixture.env(),
        };
        record.apply(true, &mut state, &ctx).unwrap();
        assert_eq!(state.team(Colour::Red).unwrap().influence_discs, discs - 1);
        assert_eq!(state.discovery_bag.len(), bag - 1);
        let discovery = state.hex(pos).unwrap().discovery.unwrap();

        round_trip(
            &fixture,
            &mut state,
            DiscoveryRecord::new(Colour::Red, pos, discovery, true),
        );
        round_trip(
            &fixture,
            &mut state,
            DiscoveryRecord::new(Colour::Red, pos, discovery, false),
        );
    }

    #[test]
    fn explore_onto_existing_hex_fails() {
        let (fixture, mut state) = started();
        let ctx = RecordContext {
            id: crate::record::RecordId(3),
            env: fixture.env(),
        };
        let err = ExploreRecord::new(Colour::Red, HexId(102), MapPos::ORIGIN, 0, false)
            .apply(true, &mut state, &ctx)
            .unwrap_err();
        assert_eq!(err, ModelError::HexOccupied(MapPos::ORIGIN));
    }
}
