//! Race rules and balance tables loader.

use std::collections::BTreeMap;
use std::path::Path;

use galaxy_core::{
    Buildable, DiscoveryType, RaceRules, RaceType, ShipBlueprint, ShipType, TechCost, TechType,
};
use serde::Deserialize;
use strum::IntoEnumIterator;

use crate::loaders::{LoadResult, read_file};
use crate::tables::RulesTable;

/// Rules file layout. Bags are written as (item, copies).
#[derive(Debug, Deserialize)]
struct RulesRon {
    races: BTreeMap<RaceType, RaceRules>,
    ships: BTreeMap<ShipType, ShipBlueprint>,
    #[serde(default)]
    race_ships: Vec<(RaceType, ShipType, ShipBlueprint)>,
    build_costs: BTreeMap<Buildable, u32>,
    #[serde(default)]
    race_build_costs: Vec<(RaceType, Buildable, u32)>,
    tech_tiers: Vec<TechCost>,
    /// Copies of each technology in the bag, by tier.
    tech_copies: Vec<usize>,
    research_discounts: Vec<u32>,
    production: Vec<i32>,
    influence_upkeep: Vec<i32>,
    population_track: u32,
    discovery_tiles: Vec<(DiscoveryType, usize)>,
}

/// Loader for race rules and balance tables from RON files.
pub struct RulesLoader;

impl RulesLoader {
    pub fn load(path: &Path) -> LoadResult<RulesTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<RulesTable> {
        let data: RulesRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules RON: {}", e))?;
        validate(&data)?;

        let tech_tiles = TechType::iter()
            .flat_map(|tech| {
                let copies = data
                    .tech_copies
                    .get(usize::from(tech.tier()))
                    .copied()
                    .unwrap_or(0);
                std::iter::repeat_n(tech, copies)
            })
            .collect();
        let discovery_tiles = data
            .discovery_tiles
            .iter()
            .flat_map(|&(discovery, copies)| std::iter::repeat_n(discovery, copies))
            .collect();

        Ok(RulesTable {
            races: data.races,
            ships: data.ships,
            race_ships: data
                .race_ships
                .into_iter()
                .map(|(race, ship, blueprint)| ((race, ship), blueprint))
                .collect(),
            build_costs: data.build_costs,
            race_build_costs: data
                .race_build_costs
                .into_iter()
                .map(|(race, item, cost)| ((race, item), cost))
                .collect(),
            tech_tiers: data.tech_tiers,
            research_discounts: data.research_discounts,
            production: data.production,
            influence_upkeep: data.influence_upkeep,
            population_track: data.population_track,
            discovery_tiles,
            tech_tiles,
        })
    }
}

/// Rejects tables with gaps the engine would hit mid-game.
fn validate(data: &RulesRon) -> LoadResult<()> {
    for race in RaceType::iter() {
        let rules = data
            .races
            .get(&race)
            .ok_or_else(|| anyhow::anyhow!("no rules for race {}", race))?;
        anyhow::ensure!(rules.trade_rate > 0, "race {} has a zero trade rate", race);
        anyhow::ensure!(
            rules.population_cubes <= data.population_track,
            "race {} starts with more cubes than a track holds",
            race
        );
    }
    for ship in ShipType::iter() {
        anyhow::ensure!(data.ships.contains_key(&ship), "no blueprint for {}", ship);
    }
    for item in Buildable::iter() {
        anyhow::ensure!(
            data.build_costs.contains_key(&item),
            "no build cost for {}",
            item
        );
    }
    let tiers = TechType::iter()
        .map(|tech| usize::from(tech.tier()) + 1)
        .max()
        .unwrap_or(0);
    anyhow::ensure!(
        data.tech_tiers.len() >= tiers,
        "expected {} technology tiers, found {}",
        tiers,
        data.tech_tiers.len()
    );
    anyhow::ensure!(!data.production.is_empty(), "production track is empty");
    anyhow::ensure!(
        !data.influence_upkeep.is_empty(),
        "influence upkeep track is empty"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::builtin;

    #[test]
    fn builtin_rules_cover_every_race() {
        let rules = RulesLoader::parse(builtin::RULES).unwrap();
        for race in RaceType::iter() {
            assert!(rules.races.contains_key(&race), "{race}");
        }
        for tech in TechType::iter() {
            assert!(rules.tech_tiles.contains(&tech), "{tech}");
        }
        assert!(
            rules
                .discovery_tiles
                .iter()
                .any(|discovery| *discovery == DiscoveryType::Bundle)
        );
    }

    #[test]
    fn missing_race_is_reported_by_name() {
        let content = builtin::RULES.replacen("orion:", "unused_orion:", 1);
        let err = RulesLoader::parse(&content).unwrap_err();
        assert!(err.to_string().contains("rules RON"), "{err}");

        let trimmed = strip_race(builtin::RULES, "orion");
        let err = RulesLoader::parse(&trimmed).unwrap_err();
        assert_eq!(err.to_string(), "no rules for race orion");
    }

    /// Removes one `race: ( ... ),` entry from the races map.
    fn strip_race(content: &str, race: &str) -> String {
        let start = content
            .find(&format!("        {race}: ("))
            .expect("race entry");
        let end = start
            + content[start..]
                .find("\n        ),\n")
                .expect("end of race entry")
            + "\n        ),\n".len();
        format!("{}{}", &content[..start], &content[end..])
    }
}
