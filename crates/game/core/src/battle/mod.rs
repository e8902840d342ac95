//! Combat resolution for one contested hex.
//!
//! A [`Battle`] is a self-contained state machine. Groups of same-type ships
//! fire in initiative order through three sub-phases:
//!
//! 1. **Missile**: one volley from every group still carrying missiles.
//! 2. **Main**: cannon rounds, repeated while both sides have living ships.
//! 3. **Population**: a surviving invader fires once per group at the
//!    defender's population cubes.
//!
//! The battle never mutates itself on its own: records call
//! [`Battle::advance_turn`] and [`Battle::apply_hits`] and capture what they
//! need to reverse those calls exactly.
mod hits;

use std::cmp::Reverse;

pub use hits::{DIE_SIDES, Die, Hit, PopulationHits, to_hit};

use crate::env::{GameEnv, ShipBlueprint};
use crate::error::{InputError, ModelError};
use crate::state::{Colour, GameState, Hex, MapPos, ShipType};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BattlePhase {
    Missile,
    Main,
    Population,
}

/// Whose turn it is. `group == None` means the battle is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Turn {
    pub group: Option<usize>,
    pub phase: BattlePhase,
}

impl Turn {
    pub const FINISHED: Turn = Turn {
        group: None,
        phase: BattlePhase::Main,
    };

    pub const fn new(group: usize, phase: BattlePhase) -> Self {
        Self {
            group: Some(group),
            phase,
        }
    }

    pub const fn is_finished(&self) -> bool {
        self.group.is_none()
    }
}

/// Ships of one type on one side of the battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    pub ship_type: ShipType,
    pub owner: Option<Colour>,
    pub invader: bool,
    /// Statistics including the owner's technology bonuses.
    pub blueprint: ShipBlueprint,
    /// Cleared once the group has fired its missiles.
    pub has_missiles: bool,
    /// Remaining life per ship. Dead if `<= 0`.
    pub lives: Vec<i32>,
}

impl Group {
    pub fn new(
        ship_type: ShipType,
        owner: Option<Colour>,
        invader: bool,
        blueprint: ShipBlueprint,
        count: u32,
    ) -> Self {
        Self {
            ship_type,
            owner,
            invader,
            blueprint,
            has_missiles: blueprint.missiles > 0,
            lives: vec![blueprint.lives(); count as usize],
        }
    }

    pub fn alive_count(&self) -> usize {
        self.lives.iter().filter(|life| **life > 0).count()
    }

    pub fn dead_count(&self) -> usize {
        self.lives.len() - self.alive_count()
    }

    pub fn is_dead(&self) -> bool {
        self.alive_count() == 0
    }

    fn can_fire_missiles(&self) -> bool {
        self.has_missiles && self.blueprint.missiles > 0 && !self.is_dead()
    }

    fn can_fire_cannons(&self) -> bool {
        self.blueprint.cannons > 0 && !self.is_dead()
    }
}

/// Manual assignment of one die to one target ship.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitAssignment {
    pub group: usize,
    pub ship: usize,
    pub die: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battle {
    pub pos: MapPos,
    /// Defending team, `None` for neutral ships.
    pub defender: Option<Colour>,
    pub invader: Colour,
    groups: Vec<Group>,
    turn: Turn,
}

impl Battle {
    /// Sets up the battle for a contested hex.
    pub fn new(hex: &Hex, state: &GameState, env: &GameEnv<'_>) -> Result<Self, ModelError> {
        let contest = hex
            .contest()
            .ok_or(ModelError::Invariant("battle started on an uncontested hex"))?;

        let mut groups = Vec::new();
        if contest.ships {
            groups.extend(Self::side_groups(hex, contest.defender, false, state, env)?);
        }
        groups.extend(Self::side_groups(
            hex,
            Some(contest.invader),
            true,
            state,
            env,
        )?);

        Ok(Self::from_groups(
            hex,
            contest.defender,
            contest.invader,
            groups,
        ))
    }

    /// Builds a battle from explicit groups, sorting them into firing order.
    pub fn from_groups(
        hex: &Hex,
        defender: Option<Colour>,
        invader: Colour,
        mut groups: Vec<Group>,
    ) -> Self {
        // Higher initiative fires first; defenders win ties.
        groups.sort_by_key(|group| {
            (
                Reverse(group.blueprint.initiative),
                group.invader,
                group.ship_type,
            )
        });
        let mut battle = Self {
            pos: hex.pos,
            defender,
            invader,
            groups,
            turn: Turn::FINISHED,
        };
        battle.turn = battle
            .first(BattlePhase::Missile, Group::can_fire_missiles)
            .or_else(|| battle.main_start(hex))
            .unwrap_or(Turn::FINISHED);
        battle
    }

    fn side_groups(
        hex: &Hex,
        owner: Option<Colour>,
        invader: bool,
        state: &GameState,
        env: &GameEnv<'_>,
    ) -> Result<Vec<Group>, ModelError> {
        let Some(fleet) = hex.fleet(owner) else {
            return Ok(Vec::new());
        };
        let team = owner.map(|colour| state.team(colour)).transpose()?;
        let race = team.map(|team| team.race);

        fleet
            .ships
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(ship, count)| {
                let mut blueprint = env.blueprint(race, *ship)?;
                if let Some(team) = team {
                    blueprint.computer += team.computer_bonus();
                    blueprint.shield += team.shield_bonus();
                }
                Ok::<_, ModelError>(Group::new(*ship, owner, invader, blueprint, *count))
            })
            .collect()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn set_turn(&mut self, turn: Turn) {
        self.turn = turn;
    }

    pub fn is_finished(&self) -> bool {
        self.turn.is_finished()
    }

    pub fn is_missile_phase(&self) -> bool {
        self.turn.phase == BattlePhase::Missile
    }

    pub fn is_population_phase(&self) -> bool {
        self.turn.phase == BattlePhase::Population
    }

    pub fn current_group(&self) -> Option<&Group> {
        self.turn.group.and_then(|index| self.groups.get(index))
    }

    pub fn current_group_mut(&mut self) -> Option<&mut Group> {
        self.turn.group.and_then(|index| self.groups.get_mut(index))
    }

    /// Owner of the group about to fire; `None` for neutral ships or a finished battle.
    pub fn firing_colour(&self) -> Option<Colour> {
        self.current_group().and_then(|group| group.owner)
    }

    pub fn colour_of(&self, invader: bool) -> Option<Colour> {
        if invader {
            Some(self.invader)
        } else {
            self.defender
        }
    }

    pub fn side_alive(&self, invader: bool) -> bool {
        self.groups
            .iter()
            .any(|group| group.invader == invader && !group.is_dead())
    }

    /// Moves to the next group allowed to fire and returns the previous turn.
    ///
    /// The Missile phase visits groups still holding missiles, then play
    /// moves to Main. Main rounds wrap while both sides live and someone can
    /// shoot. A surviving invader then gets a Population phase if the hex
    /// holds the defender's cubes. Population ends after every invader group
    /// had its turn.
    pub fn advance_turn(&mut self, hex: &Hex) -> Turn {
        let old = self.turn;
        let next = match old.phase {
            BattlePhase::Missile => self
                .after(old.group, BattlePhase::Missile, Group::can_fire_missiles)
                .or_else(|| self.main_start(hex)),
            BattlePhase::Main => {
                if self.main_continues() {
                    self.after(old.group, BattlePhase::Main, Group::can_fire_cannons)
                        .or_else(|| self.first(BattlePhase::Main, Group::can_fire_cannons))
                } else {
                    self.population_start(hex)
                }
            }
            BattlePhase::Population => self.after(old.group, BattlePhase::Population, |group| {
                group.invader && group.can_fire_cannons()
            }),
        };
        self.turn = next.unwrap_or(Turn::FINISHED);
        old
    }

    fn main_start(&self, hex: &Hex) -> Option<Turn> {
        if self.main_continues() {
            self.first(BattlePhase::Main, Group::can_fire_cannons)
        } else {
            self.population_start(hex)
        }
    }

    fn main_continues(&self) -> bool {
        self.side_alive(true)
            && self.side_alive(false)
            && self.groups.iter().any(Group::can_fire_cannons)
    }

    fn population_start(&self, hex: &Hex) -> Option<Turn> {
        let eligible = self.side_alive(true)
            && !self.side_alive(false)
            && self.defender.is_some()
            && hex.owner == self.defender
            && hex.has_population();
        if !eligible {
            return None;
        }
        self.first(BattlePhase::Population, |group| {
            group.invader && group.can_fire_cannons()
        })
    }

    fn first(&self, phase: BattlePhase, eligible: impl Fn(&Group) -> bool) -> Option<Turn> {
        self.after(None, phase, eligible)
    }

    fn after(
        &self,
        current: Option<usize>,
        phase: BattlePhase,
        eligible: impl Fn(&Group) -> bool,
    ) -> Option<Turn> {
        let start = current.map_or(0, |index| index + 1);
        (start..self.groups.len())
            .find(|&index| eligible(&self.groups[index]))
            .map(|index| Turn::new(index, phase))
    }

    /// Dice the current group rolls this turn, as (count, damage per die).
    pub fn volley(&self) -> Option<(u32, u32)> {
        let group = self.current_group()?;
        let alive = group.alive_count() as u32;
        let blueprint = &group.blueprint;
        Some(match self.turn.phase {
            BattlePhase::Missile => (alive * blueprint.missiles, blueprint.missile_damage),
            BattlePhase::Main | BattlePhase::Population => {
                (alive * blueprint.cannons, blueprint.cannon_damage)
            }
        })
    }

    /// Face the current group needs to hit `target`.
    pub fn threshold(&self, target: usize) -> Option<u8> {
        let attacker = self.current_group()?;
        let target = self.groups.get(target)?;
        Some(to_hit(attacker.blueprint.computer, target.blueprint.shield))
    }

    /// Face the current group needs to hit a population cube.
    pub fn population_threshold(&self) -> Option<u8> {
        let attacker = self.current_group()?;
        Some(to_hit(attacker.blueprint.computer, 0))
    }

    /// Enemy group indices, biggest first (dead groups included, ties by index).
    pub fn target_groups_biggest_first(&self) -> Vec<usize> {
        let Some(attacker) = self.current_group() else {
            return Vec::new();
        };
        let mut targets: Vec<usize> = (0..self.groups.len())
            .filter(|&index| self.groups[index].invader != attacker.invader)
            .collect();
        targets.sort_by_key(|&index| (Reverse(self.groups[index].lives.len()), index));
        targets
    }

    /// Assigns the current group's dice automatically.
    ///
    /// Target groups are visited biggest first; within a group ships are hit
    /// weakest first, each absorbing dice until destroyed.
    pub fn auto_assign_hits(&self, dice: &[Die]) -> Vec<Hit> {
        let mut used = vec![false; dice.len()];
        let mut hits = Vec::new();
        for target in self.target_groups_biggest_first() {
            let Some(threshold) = self.threshold(target) else {
                continue;
            };
            hits.extend(hits::assign_to_group(
                target,
                &self.groups[target].lives,
                dice,
                threshold,
                &mut used,
            ));
        }
        hits
    }

    /// Validates a manual hit assignment and groups it per target ship.
    pub fn assign_hits(
        &self,
        dice: &[Die],
        assignments: &[HitAssignment],
    ) -> Result<Vec<Hit>, InputError> {
        let attacker = self.current_group().ok_or(InputError::InvalidChoice(
            "no group is firing",
        ))?;
        let mut used = vec![false; dice.len()];
        let mut hits: Vec<Hit> = Vec::new();

        for assignment in assignments {
            let die = *dice
                .get(assignment.die)
                .ok_or(InputError::InvalidChoice("die index out of range"))?;
            if std::mem::replace(&mut used[assignment.die], true) {
                return Err(InputError::InvalidChoice("die assigned twice"));
            }
            let group = self
                .groups
                .get(assignment.group)
                .ok_or(InputError::InvalidChoice("target group does not exist"))?;
            if group.invader == attacker.invader {
                return Err(InputError::InvalidChoice("cannot target own ships"));
            }
            let life = *group
                .lives
                .get(assignment.ship)
                .ok_or(InputError::InvalidChoice("target ship does not exist"))?;
            if life <= 0 {
                return Err(InputError::InvalidChoice("target ship is already destroyed"));
            }
            let threshold = to_hit(attacker.blueprint.computer, group.blueprint.shield);
            if !die.hits(threshold) {
                return Err(InputError::InvalidChoice("die does not hit that target"));
            }

            match hits
                .iter_mut()
                .find(|hit| hit.group == assignment.group && hit.ship == assignment.ship)
            {
                Some(hit) => hit.dice.push(die),
                None => hits.push(Hit {
                    group: assignment.group,
                    ship: assignment.ship,
                    dice: vec![die],
                }),
            }
        }
        Ok(hits)
    }

    /// One hit per occupied square, in square order, for each hitting die.
    pub fn auto_assign_population_hits(&self, dice: &[Die], hex: &Hex) -> PopulationHits {
        let Some(threshold) = self.population_threshold() else {
            return PopulationHits::default();
        };
        let hitting = dice.iter().filter(|die| die.hits(threshold)).count();
        PopulationHits {
            squares: hex
                .occupied_squares()
                .map(|(index, _)| index)
                .take(hitting)
                .collect(),
            auto_hit: false,
        }
    }

    /// Hits every occupied square without rolling.
    pub fn auto_destroy_population(hex: &Hex) -> PopulationHits {
        PopulationHits {
            squares: hex.occupied_squares().map(|(index, _)| index).collect(),
            auto_hit: true,
        }
    }

    /// Applies (or reverts) damage to target ships.
    pub fn apply_hits(&mut self, hits: &[Hit], forward: bool) -> Result<(), ModelError> {
        for hit in hits {
            let life = self
                .groups
                .get_mut(hit.group)
                .and_then(|group| group.lives.get_mut(hit.ship))
                .ok_or(ModelError::Invariant("hit references a missing ship"))?;
            if forward {
                *life -= hit.damage();
            } else {
                *life += hit.damage();
            }
        }
        Ok(())
    }

    /// Destroyed ship counts per (owner, type).
    pub fn casualties(&self) -> Vec<(Option<Colour>, ShipType, u32)> {
        self.groups
            .iter()
            .filter(|group| group.dead_count() > 0)
            .map(|group| (group.owner, group.ship_type, group.dead_count() as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::TileDef;
    use crate::state::{EdgeSet, HexId, Resource, SquareType};

    fn blueprint(initiative: i32, hull: i32, cannons: u32, missiles: u32) -> ShipBlueprint {
        ShipBlueprint {
            initiative,
            hull,
            computer: 0,
            shield: 0,
            cannons,
            cannon_damage: 1,
            missiles,
            missile_damage: 2,
            movement: 1,
        }
    }

    fn hex(owner: Option<Colour>, cubes: usize) -> Hex {
        let tile = TileDef {
            id: HexId(201),
            ring: None,
            wormholes: EdgeSet::all(),
            squares: vec![(SquareType::Money, false); 3],
            discovery: false,
            ancients: 0,
            gcds: false,
            victory_points: 1,
        };
        let mut hex = Hex::from_tile(&tile, MapPos::new(2, 0), 0);
        hex.owner = owner;
        for square in hex.squares.iter_mut().take(cubes) {
            square.occupant = Some(Resource::Money);
        }
        hex
    }

    fn battle(hex: &Hex, groups: Vec<Group>) -> Battle {
        Battle::from_groups(hex, Some(Colour::Blue), Colour::Red, groups)
    }

    #[test]
    fn groups_fire_by_initiative_defender_first() {
        let hex = hex(None, 0);
        let battle = battle(
            &hex,
            vec![
                Group::new(ShipType::Interceptor, Some(Colour::Red), true, blueprint(3, 0, 1, 0), 2),
                Group::new(ShipType::Cruiser, Some(Colour::Blue), false, blueprint(2, 1, 1, 0), 1),
                Group::new(ShipType::Interceptor, Some(Colour::Blue), false, blueprint(3, 0, 1, 0), 1),
            ],
        );
        let order: Vec<(ShipType, bool)> = battle
            .groups()
            .iter()
            .map(|group| (group.ship_type, group.invader))
            .collect();
        assert_eq!(
            order,
            vec![
                (ShipType::Interceptor, false),
                (ShipType::Interceptor, true),
                (ShipType::Cruiser, false),
            ]
        );
        assert_eq!(battle.turn(), Turn::new(0, BattlePhase::Main));
    }

    #[test]
    fn missile_phase_visits_only_missile_groups() {
        let hex = hex(None, 0);
        let mut battle = battle(
            &hex,
            vec![
                Group::new(ShipType::Interceptor, Some(Colour::Blue), false, blueprint(3, 0, 1, 0), 1),
                Group::new(ShipType::Cruiser, Some(Colour::Red), true, blueprint(2, 1, 1, 2), 1),
            ],
        );
        assert_eq!(battle.turn(), Turn::new(1, BattlePhase::Missile));

        let old = battle.advance_turn(&hex);
        assert_eq!(old, Turn::new(1, BattlePhase::Missile));
        assert_eq!(battle.turn(), Turn::new(0, BattlePhase::Main));

        battle.advance_turn(&hex);
        assert_eq!(battle.turn(), Turn::new(1, BattlePhase::Main));
        // Both sides alive: a new round starts.
        battle.advance_turn(&hex);
        assert_eq!(battle.turn(), Turn::new(0, BattlePhase::Main));
    }

    #[test]
    fn surviving_invader_attacks_population_then_finishes() {
        let hex = hex(Some(Colour::Blue), 2);
        let mut battle = battle(
            &hex,
            vec![
                Group::new(ShipType::Interceptor, Some(Colour::Blue), false, blueprint(3, 0, 1, 0), 1),
                Group::new(ShipType::Cruiser, Some(Colour::Red), true, blueprint(2, 1, 1, 0), 1),
            ],
        );
        battle
            .apply_hits(
                &[Hit {
                    group: 0,
                    ship: 0,
                    dice: vec![Die::new(6, 1)],
                }],
                true,
            )
            .unwrap();
        battle.advance_turn(&hex);
        assert_eq!(battle.turn(), Turn::new(1, BattlePhase::Population));
        assert_eq!(battle.firing_colour(), Some(Colour::Red));

        battle.advance_turn(&hex);
        assert!(battle.is_finished());
    }

    #[test]
    fn defender_victory_finishes_without_population_phase() {
        let hex = hex(Some(Colour::Blue), 2);
        let mut battle = battle(
            &hex,
            vec![
                Group::new(ShipType::Interceptor, Some(Colour::Blue), false, blueprint(3, 0, 1, 0), 1),
                Group::new(ShipType::Cruiser, Some(Colour::Red), true, blueprint(2, 0, 1, 0), 1),
            ],
        );
        battle
            .apply_hits(
                &[Hit {
                    group: 1,
                    ship: 0,
                    dice: vec![Die::new(6, 1)],
                }],
                true,
            )
            .unwrap();
        battle.advance_turn(&hex);
        assert!(battle.is_finished());
    }

    #[test]
    fn auto_assign_targets_biggest_group_weakest_ship() {
        let hex = hex(None, 0);
        let mut battle = battle(
            &hex,
            vec![
                Group::new(ShipType::Dreadnought, Some(Colour::Red), true, blueprint(5, 0, 2, 0), 1),
                Group::new(ShipType::Cruiser, Some(Colour::Blue), false, blueprint(2, 2, 1, 0), 3),
                Group::new(ShipType::Interceptor, Some(Colour::Blue), false, blueprint(3, 0, 1, 0), 1),
            ],
        );
        // Cruiser lives become [1, 3, 2].
        let cruisers = battle
            .groups()
            .iter()
            .position(|group| group.ship_type == ShipType::Cruiser)
            .unwrap();
        battle
            .apply_hits(
                &[
                    Hit {
                        group: cruisers,
                        ship: 0,
                        dice: vec![Die::new(6, 2)],
                    },
                    Hit {
                        group: cruisers,
                        ship: 2,
                        dice: vec![Die::new(6, 1)],
                    },
                ],
                true,
            )
            .unwrap();
        assert_eq!(battle.groups()[cruisers].lives, vec![1, 3, 2]);

        let dice = [Die::new(6, 1), Die::new(6, 1)];
        let hits = battle.auto_assign_hits(&dice);
        battle.apply_hits(&hits, true).unwrap();
        assert_eq!(battle.groups()[cruisers].lives, vec![0, 3, 1]);

        battle.apply_hits(&hits, false).unwrap();
        assert_eq!(battle.groups()[cruisers].lives, vec![1, 3, 2]);
    }

    #[test]
    fn manual_assignment_rejects_bad_targets() {
        let hex = hex(None, 0);
        let battle = battle(
            &hex,
            vec![
                Group::new(ShipType::Interceptor, Some(Colour::Blue), false, blueprint(3, 0, 1, 0), 1),
                Group::new(ShipType::Cruiser, Some(Colour::Red), true, blueprint(2, 1, 1, 0), 1),
            ],
        );
        let dice = [Die::new(6, 1), Die::new(2, 1)];
        let own = [HitAssignment { group: 0, ship: 0, die: 0 }];
        assert!(battle.assign_hits(&dice, &own).is_err());

        let miss = [HitAssignment { group: 1, ship: 0, die: 1 }];
        assert!(battle.assign_hits(&dice, &miss).is_err());

        let missing = [HitAssignment { group: 1, ship: 4, die: 0 }];
        assert!(battle.assign_hits(&dice, &missing).is_err());

        let good = [HitAssignment { group: 1, ship: 0, die: 0 }];
        let hits = battle.assign_hits(&dice, &good).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].damage(), 1);
    }

    #[test]
    fn population_hits_follow_square_order() {
        let hex = hex(Some(Colour::Blue), 3);
        let battle = Battle::from_groups(
            &hex,
            Some(Colour::Blue),
            Colour::Red,
            vec![Group::new(
                ShipType::Cruiser,
                Some(Colour::Red),
                true,
                blueprint(2, 1, 2, 0),
                1,
            )],
        );
        assert!(battle.is_population_phase());

        let dice = [Die::new(6, 1), Die::new(1, 1), Die::new(6, 1)];
        let hits = battle.auto_assign_population_hits(&dice, &hex);
        assert_eq!(hits.squares, vec![0, 1]);

        let bombs = Battle::auto_destroy_population(&hex);
        assert_eq!(bombs.squares, vec![0, 1, 2]);
        assert!(bombs.auto_hit);
    }
}
