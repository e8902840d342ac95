//! Hex tile catalogue loader.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use galaxy_core::{Colour, Edge, EdgeSet, GameConfig, HexId, HexRing, SquareType, TileDef};
use serde::Deserialize;
use strum::IntoEnumIterator;

use crate::loaders::{LoadResult, read_file};
use crate::tables::TileTable;

/// One tile as written in the catalogue; the ring comes from the list it sits in.
#[derive(Debug, Deserialize)]
struct TileRon {
    id: u32,
    wormholes: Vec<Edge>,
    #[serde(default)]
    squares: Vec<(SquareType, bool)>,
    #[serde(default)]
    discovery: bool,
    #[serde(default)]
    ancients: u32,
    #[serde(default)]
    gcds: bool,
    victory_points: u32,
}

impl TileRon {
    fn into_def(self, ring: Option<HexRing>) -> TileDef {
        TileDef {
            id: HexId(self.id),
            ring,
            wormholes: EdgeSet::from_edges(&self.wormholes),
            squares: self.squares,
            discovery: self.discovery,
            ancients: self.ancients,
            gcds: self.gcds,
            victory_points: self.victory_points,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TilesRon {
    centre: TileRon,
    homes: BTreeMap<Colour, TileRon>,
    inner: Vec<TileRon>,
    middle: Vec<TileRon>,
    outer: Vec<TileRon>,
}

/// Loader for the hex tile catalogue from RON files.
pub struct TilesLoader;

impl TilesLoader {
    pub fn load(path: &Path) -> LoadResult<TileTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<TileTable> {
        let data: TilesRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse tiles RON: {}", e))?;

        for colour in Colour::iter() {
            anyhow::ensure!(
                data.homes.contains_key(&colour),
                "no home sector for {}",
                colour
            );
        }

        let centre = HexId(data.centre.id);
        let homes: BTreeMap<Colour, HexId> = data
            .homes
            .iter()
            .map(|(colour, tile)| (*colour, HexId(tile.id)))
            .collect();

        let mut defs = vec![data.centre.into_def(None)];
        defs.extend(data.homes.into_values().map(|tile| tile.into_def(None)));
        for (ring, tiles) in [
            (HexRing::Inner, data.inner),
            (HexRing::Middle, data.middle),
            (HexRing::Outer, data.outer),
        ] {
            defs.extend(tiles.into_iter().map(|tile| tile.into_def(Some(ring))));
        }

        let mut seen = BTreeSet::new();
        for def in &defs {
            anyhow::ensure!(seen.insert(def.id), "tile {} is listed twice", def.id);
            anyhow::ensure!(
                def.squares.len() <= GameConfig::MAX_SQUARES,
                "tile {} has more than {} population squares",
                def.id,
                GameConfig::MAX_SQUARES
            );
            anyhow::ensure!(!def.wormholes.is_empty(), "tile {} has no wormholes", def.id);
        }

        Ok(TileTable::new(defs, centre, homes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::builtin;
    use galaxy_core::TileOracle;

    #[test]
    fn builtin_tiles_place_every_ring() {
        let tiles = TilesLoader::parse(builtin::TILES).unwrap();
        let centre = tiles.tile(tiles.centre_tile()).unwrap();
        assert!(centre.gcds);
        assert_eq!(centre.ring, None);
        for ring in HexRing::iter() {
            let ids = tiles.ring_tiles(ring);
            assert!(!ids.is_empty(), "{ring}");
            assert!(ids.iter().all(|id| tiles.tile(*id).unwrap().ring == Some(ring)));
        }
        for colour in Colour::iter() {
            let home = tiles.home_tile(colour).unwrap();
            assert_eq!(tiles.tile(home).unwrap().ring, None);
        }
    }

    #[test]
    fn wormholes_follow_the_listed_edges() {
        let tiles = TilesLoader::parse(builtin::TILES).unwrap();
        let tile = tiles.tile(HexId(101)).unwrap();
        assert_eq!(tile.wormholes, EdgeSet::from_edges(&[Edge::N, Edge::S, Edge::SW]));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let content = builtin::TILES.replacen("(id: 102,", "(id: 101,", 1);
        let err = TilesLoader::parse(&content).unwrap_err();
        assert_eq!(err.to_string(), "tile 101 is listed twice");
    }
}
