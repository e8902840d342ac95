use std::fmt;

/// Identifier of a connected player, assigned by the player directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team colour. Hexes, fleets and population refer to teams by colour.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Colour {
    Red,
    Blue,
    Green,
    Yellow,
    White,
    Black,
}

impl Colour {
    /// Stable small integer used when deriving rng seeds.
    pub const fn seed_index(self) -> u32 {
        self as u32 + 1
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum RaceType {
    Human,
    Eridani,
    Hydran,
    Planta,
    Descendants,
    Mechanema,
    Orion,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Resource {
    Money,
    Science,
    Materials,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Money, Resource::Science, Resource::Materials];
}

/// Resource stockpile of a team. Money may go negative during upkeep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Storage {
    pub money: i32,
    pub science: i32,
    pub materials: i32,
}

impl Storage {
    pub const fn new(money: i32, science: i32, materials: i32) -> Self {
        Self {
            money,
            science,
            materials,
        }
    }

    pub const fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Money => self.money,
            Resource::Science => self.science,
            Resource::Materials => self.materials,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut i32 {
        match resource {
            Resource::Money => &mut self.money,
            Resource::Science => &mut self.science,
            Resource::Materials => &mut self.materials,
        }
    }

    /// Adds (or with `forward == false`, subtracts) every component of `delta`.
    pub fn apply(&mut self, delta: &Storage, forward: bool) {
        let sign = if forward { 1 } else { -1 };
        self.money += sign * delta.money;
        self.science += sign * delta.science;
        self.materials += sign * delta.materials;
    }
}

/// Per-resource cube counts (population track, graveyard).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CubeCounts {
    pub money: u32,
    pub science: u32,
    pub materials: u32,
}

impl CubeCounts {
    pub const fn uniform(count: u32) -> Self {
        Self {
            money: count,
            science: count,
            materials: count,
        }
    }

    pub const fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Money => self.money,
            Resource::Science => self.science,
            Resource::Materials => self.materials,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Money => &mut self.money,
            Resource::Science => &mut self.science,
            Resource::Materials => &mut self.materials,
        }
    }

    pub const fn total(&self) -> u32 {
        self.money + self.science + self.materials
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
