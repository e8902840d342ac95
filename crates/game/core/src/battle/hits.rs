//! Dice and hit assignment.

/// Highest face of a combat die.
pub const DIE_SIDES: u32 = 6;

/// One rolled die and the damage it deals when it hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Die {
    pub face: u8,
    pub damage: u32,
}

impl Die {
    pub const fn new(face: u8, damage: u32) -> Self {
        Self { face, damage }
    }

    pub const fn hits(&self, threshold: u8) -> bool {
        self.face >= threshold
    }
}

/// Dice assigned to one target ship.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hit {
    pub group: usize,
    pub ship: usize,
    pub dice: Vec<Die>,
}

impl Hit {
    pub fn damage(&self) -> i32 {
        self.dice.iter().map(|die| die.damage as i32).sum()
    }
}

/// Population squares destroyed by an attack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationHits {
    pub squares: Vec<usize>,
    /// Hits every occupied square regardless of dice.
    pub auto_hit: bool,
}

/// Face needed to hit: `6 - computer + shield`, clamped so that a six
/// always hits and a one always misses.
pub fn to_hit(computer: i32, shield: i32) -> u8 {
    (DIE_SIDES as i32 - computer + shield).clamp(2, DIE_SIDES as i32) as u8
}

/// Assigns hitting dice to a target's ships, weakest ship first.
///
/// `lives` holds the remaining life of each ship; dead ships (`<= 0`) are
/// skipped. Each ship absorbs unused hitting dice, in roll order, until it is
/// destroyed. Consumed dice are marked in `used`.
pub(crate) fn assign_to_group(
    group: usize,
    lives: &[i32],
    dice: &[Die],
    threshold: u8,
    used: &mut [bool],
) -> Vec<Hit> {
    let mut hits = Vec::new();
    for ship in weakest_first(lives) {
        let mut life = lives[ship];
        let mut taken = Vec::new();
        while life > 0 {
            let next = dice
                .iter()
                .enumerate()
                .find(|(index, die)| !used[*index] && die.hits(threshold));
            let Some((index, die)) = next else {
                break;
            };
            used[index] = true;
            life -= die.damage as i32;
            taken.push(*die);
        }
        if !taken.is_empty() {
            hits.push(Hit {
                group,
                ship,
                dice: taken,
            });
        }
    }
    hits
}

/// Living ship indices ordered by remaining life, ties by index.
pub(crate) fn weakest_first(lives: &[i32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..lives.len()).filter(|&i| lives[i] > 0).collect();
    indices.sort_by_key(|&i| (lives[i], i));
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_hit_clamps_to_die_range() {
        assert_eq!(to_hit(0, 0), 6);
        assert_eq!(to_hit(1, 0), 5);
        assert_eq!(to_hit(9, 0), 2);
        assert_eq!(to_hit(0, 3), 6);
        assert_eq!(to_hit(2, 1), 5);
    }

    #[test]
    fn weakest_ship_absorbs_first() {
        let lives = [1, 3, 2];
        let dice = [Die::new(6, 1), Die::new(6, 1)];
        let mut used = [false; 2];

        let hits = assign_to_group(0, &lives, &dice, 6, &mut used);

        let targets: Vec<usize> = hits.iter().map(|hit| hit.ship).collect();
        assert_eq!(targets, vec![0, 2]);
        assert!(used.iter().all(|u| *u));
    }

    #[test]
    fn missing_dice_are_not_assigned() {
        let lives = [2];
        let dice = [Die::new(1, 1), Die::new(5, 1), Die::new(6, 2)];
        let mut used = [false; 3];

        let hits = assign_to_group(0, &lives, &dice, 5, &mut used);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].dice, vec![Die::new(5, 1), Die::new(6, 2)]);
        assert_eq!(used, [false, true, true]);
    }

    #[test]
    fn dead_ships_are_skipped() {
        assert_eq!(weakest_first(&[0, 2, -1, 1]), vec![3, 1]);
    }
}
