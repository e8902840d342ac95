use super::{Resource, Storage};

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
pub enum TechClass {
    Military,
    Grid,
    Nano,
}

/// Researchable technologies, eight per class in tier order.
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
pub enum TechType {
    // Military
    NeutronBomb,
    StarBase,
    PlasmaCannon,
    PhaseShield,
    AdvMining,
    TachyonSource,
    PlasmaMissile,
    GluonComp,
    // Grid
    GaussShield,
    ImprovedHull,
    FusionSource,
    PositronComp,
    AdvEconomy,
    TachyonDrive,
    AntimatterCannon,
    QuantumGrid,
    // Nano
    NanoRobots,
    FusionDrive,
    AdvRobotics,
    Orbital,
    AdvLabs,
    Monolith,
    ArtifactKey,
    WormholeGen,
}

impl TechType {
    pub const fn class(self) -> TechClass {
        match (self as u8) / 8 {
            0 => TechClass::Military,
            1 => TechClass::Grid,
            _ => TechClass::Nano,
        }
    }

    /// Position within the class track, 0 being the cheapest.
    pub const fn tier(self) -> u8 {
        (self as u8) % 8
    }

    /// Shield bonus granted to every ship of the owning team.
    pub const fn shield_bonus(self) -> i32 {
        match self {
            TechType::GaussShield => 1,
            TechType::PhaseShield => 2,
            _ => 0,
        }
    }

    /// Targeting computer bonus granted to every ship of the owning team.
    pub const fn computer_bonus(self) -> i32 {
        match self {
            TechType::PositronComp => 1,
            TechType::GluonComp => 2,
            _ => 0,
        }
    }

    /// Technology that allows cubes on advanced squares of `resource`.
    pub const fn advanced_for(resource: Resource) -> TechType {
        match resource {
            Resource::Money => TechType::AdvEconomy,
            Resource::Science => TechType::AdvLabs,
            Resource::Materials => TechType::AdvMining,
        }
    }
}

/// Face-down discovery tiles found while exploring.
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
pub enum DiscoveryType {
    Money,
    Science,
    Materials,
    Bundle,
}

impl DiscoveryType {
    /// Victory points when the tile is kept face down instead of used.
    pub const VICTORY_POINTS: u32 = 2;

    pub const fn reward(self) -> Storage {
        match self {
            DiscoveryType::Money => Storage::new(8, 0, 0),
            DiscoveryType::Science => Storage::new(0, 5, 0),
            DiscoveryType::Materials => Storage::new(0, 0, 6),
            DiscoveryType::Bundle => Storage::new(3, 2, 3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_declaration_rows() {
        assert_eq!(TechType::NeutronBomb.class(), TechClass::Military);
        assert_eq!(TechType::GluonComp.tier(), 7);
        assert_eq!(TechType::GaussShield.class(), TechClass::Grid);
        assert_eq!(TechType::WormholeGen.class(), TechClass::Nano);
        assert_eq!(TechType::WormholeGen.tier(), 7);
    }
}
