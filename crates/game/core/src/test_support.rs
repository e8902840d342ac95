//! Small in-memory rules and tiles for unit tests.
use strum::IntoEnumIterator;

use crate::env::{
    Buildable, Env, GameEnv, PcgRng, RaceRules, RulesOracle, ShipBlueprint, TechCost, TileDef,
    TileOracle,
};
use crate::record::{AssignTeamRecord, RecordContext, RecordId, RecordTransition, StartGameRecord};
use crate::state::{
    Colour, DiscoveryType, EdgeSet, Edge, GameState, HexId, HexRing, PlayerId, RaceType,
    ShipType, SquareType, Storage, TeamSlot, TechType,
};
use crate::GameConfig;

pub(crate) const SEED: u64 = 7;

pub(crate) struct FixtureRules;

impl RulesOracle for FixtureRules {
    fn race(&self, race: RaceType) -> Option<RaceRules> {
        Some(RaceRules {
            explore_rate: if race == RaceType::Planta { 2 } else { 1 },
            explore_choices: if race == RaceType::Human { 2 } else { 1 },
            build_rate: 2,
            move_rate: 3,
            trade_rate: 2,
            influence_discs: 13,
            colony_ships: 3,
            population_cubes: 12,
            storage: Storage::new(2, 3, 3),
            fleet: vec![(ShipType::Interceptor, 1)],
            supply: vec![
                (ShipType::Interceptor, 8),
                (ShipType::Cruiser, 4),
                (ShipType::Dreadnought, 2),
                (ShipType::Starbase, 4),
            ],
            techs: Vec::new(),
        })
    }

    fn blueprint(&self, _race: Option<RaceType>, ship: ShipType) -> Option<ShipBlueprint> {
        let (initiative, hull, computer, cannons, movement) = match ship {
            ShipType::Interceptor => (3, 0, 0, 1, 3),
            ShipType::Cruiser => (2, 1, 1, 1, 2),
            ShipType::Dreadnought => (1, 2, 1, 2, 1),
            ShipType::Starbase => (4, 2, 1, 1, 0),
            ShipType::Ancient => (2, 1, 1, 2, 0),
            ShipType::Gcds => (0, 7, 1, 4, 0),
        };
        Some(ShipBlueprint {
            initiative,
            hull,
            computer,
            shield: 0,
            cannons,
            cannon_damage: 1,
            missiles: 0,
            missile_damage: 2,
            movement,
        })
    }

    fn build_cost(&self, _race: RaceType, item: Buildable) -> Option<u32> {
        Some(match item {
            Buildable::Interceptor => 3,
            Buildable::Cruiser => 5,
            Buildable::Dreadnought => 8,
            Buildable::Starbase => 3,
            Buildable::Orbital => 5,
            Buildable::Monolith => 10,
        })
    }

    fn tech_cost(&self, tech: TechType) -> Option<TechCost> {
        let tier = u32::from(tech.tier());
        Some(TechCost {
            cost: 4 + 2 * tier,
            min_cost: 2 + tier,
        })
    }

    fn research_discount(&self, owned: usize) -> u32 {
        const DISCOUNT: [u32; 7] = [0, 1, 2, 3, 4, 6, 8];
        DISCOUNT[owned.min(DISCOUNT.len() - 1)]
    }

    fn production(&self, placed: u32) -> i32 {
        const PRODUCTION: [i32; 13] = [2, 3, 4, 6, 8, 10, 12, 15, 18, 21, 24, 28, 28];
        PRODUCTION[(placed as usize).min(PRODUCTION.len() - 1)]
    }

    fn influence_upkeep(&self, discs: u32) -> i32 {
        const UPKEEP: [i32; 14] = [0, 0, 1, 2, 3, 5, 7, 10, 13, 17, 21, 25, 30, 35];
        UPKEEP[(discs as usize).min(UPKEEP.len() - 1)]
    }

    fn population_track(&self) -> u32 {
        12
    }

    fn discovery_tiles(&self) -> Vec<DiscoveryType> {
        DiscoveryType::iter()
            .flat_map(|discovery| std::iter::repeat_n(discovery, 3))
            .collect()
    }

    fn tech_tiles(&self) -> Vec<TechType> {
        TechType::iter()
            .flat_map(|tech| std::iter::repeat_n(tech, 2))
            .collect()
    }
}

pub(crate) struct FixtureTiles;

impl FixtureTiles {
    const CENTRE: u32 = 1;
    const HOME_BASE: u32 = 221;
}

fn tile(id: u32, ring: Option<HexRing>, wormholes: EdgeSet, squares: &[(SquareType, bool)]) -> TileDef {
    TileDef {
        id: HexId(id),
        ring,
        wormholes,
        squares: squares.to_vec(),
        discovery: false,
        ancients: 0,
        gcds: false,
        victory_points: 1,
    }
}

impl TileOracle for FixtureTiles {
    fn tile(&self, id: HexId) -> Option<TileDef> {
        let all = EdgeSet::all();
        let def = match id.0 {
            Self::CENTRE => TileDef {
                gcds: true,
                victory_points: 4,
                ..tile(id.0, None, all, &[(SquareType::Any, false)])
            },
            221..=226 => TileDef {
                victory_points: 3,
                ..tile(
                    id.0,
                    None,
                    all,
                    &[
                        (SquareType::Money, false),
                        (SquareType::Science, false),
                        (SquareType::Materials, false),
                        (SquareType::Science, true),
                    ],
                )
            },
            101 => TileDef {
                discovery: true,
                victory_points: 2,
                ..tile(
                    101,
                    Some(HexRing::Inner),
                    all,
                    &[(SquareType::Money, false), (SquareType::Science, false)],
                )
            },
            102 => tile(
                102,
                Some(HexRing::Inner),
                Edge::N.flag(),
                &[(SquareType::Materials, false)],
            ),
            103 => TileDef {
                discovery: true,
                ancients: 1,
                ..tile(103, Some(HexRing::Inner), all, &[(SquareType::Money, true)])
            },
            104 => tile(104, Some(HexRing::Inner), all, &[(SquareType::Any, false)]),
            201 => tile(
                201,
                Some(HexRing::Middle),
                all,
                &[(SquareType::Money, false), (SquareType::Materials, true)],
            ),
            202 => tile(
                202,
                Some(HexRing::Middle),
                EdgeSet::from_edges(&[Edge::N, Edge::S]),
                &[(SquareType::Science, false)],
            ),
            203 => TileDef {
                discovery: true,
                ancients: 1,
                ..tile(203, Some(HexRing::Middle), all, &[])
            },
            204 => tile(
                204,
                Some(HexRing::Middle),
                all,
                &[(SquareType::Any, false), (SquareType::Money, false)],
            ),
            301..=304 => tile(
                id.0,
                Some(HexRing::Outer),
                all,
                &[(SquareType::Materials, false)],
            ),
            _ => return None,
        };
        Some(def)
    }

    fn ring_tiles(&self, ring: HexRing) -> Vec<HexId> {
        let base = match ring {
            HexRing::Inner => 101,
            HexRing::Middle => 201,
            HexRing::Outer => 301,
        };
        (base..base + 4).map(HexId).collect()
    }

    fn centre_tile(&self) -> HexId {
        HexId(Self::CENTRE)
    }

    fn home_tile(&self, colour: Colour) -> Option<HexId> {
        let index = Colour::iter().position(|candidate| candidate == colour)?;
        Some(HexId(Self::HOME_BASE + index as u32))
    }
}

/// Oracles and helpers to build game states in a known position.
pub(crate) struct Fixture {
    pub rules: FixtureRules,
    pub tiles: FixtureTiles,
    pub rng: PcgRng,
    pub config: GameConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            rules: FixtureRules,
            tiles: FixtureTiles,
            rng: PcgRng,
            config: GameConfig::default(),
        }
    }

    pub fn env(&self) -> GameEnv<'_> {
        Env::with_all(&self.rules, &self.tiles, &self.rng).as_game_env()
    }

    /// One seat per team, every team chosen, main game not started.
    pub fn lobby_state(&self, teams: &[(Colour, RaceType)]) -> GameState {
        let mut state = GameState::new(SEED);
        state.team_order = (0..teams.len())
            .map(|index| TeamSlot::new(PlayerId(index as u32 + 1)))
            .collect();
        let ctx = RecordContext {
            id: RecordId(0),
            env: self.env(),
        };
        for (slot, (colour, race)) in teams.iter().enumerate() {
            AssignTeamRecord::new(slot, *colour, *race)
                .apply(true, &mut state, &ctx)
                .expect("fixture team assignment");
        }
        state
    }

    /// Lobby state with the opening setup applied: round 1, homes placed.
    pub fn started_state(&self, teams: &[(Colour, RaceType)]) -> GameState {
        let mut state = self.lobby_state(teams);
        let ctx = RecordContext {
            id: RecordId(1),
            env: self.env(),
        };
        StartGameRecord::new(self.config.start_tech_count(teams.len()))
            .apply(true, &mut state, &ctx)
            .expect("fixture game start");
        state
    }
}
