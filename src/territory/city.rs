//! Cities founded on captured cells

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::generation::CellId;

/// Starting health of a newly founded city
pub const CITY_HEALTH: f32 = 100.0;

const PREFIXES: [&str; 12] = [
    "Al", "Bel", "Cor", "Dun", "Esh", "Far", "Gal", "Hal", "Ith", "Kar", "Mor", "Val",
];
const SUFFIXES: [&str; 10] = [
    "dor", "heim", "mar", "ora", "port", "stead", "thas", "vale", "wick", "yn",
];

/// City marker on an owned cell
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub cell: usize,
    pub name: String,
    pub health: f32,
}

impl City {
    /// Found a city on `cell`, named deterministically from its grid id
    pub fn found(cell: usize, id: CellId) -> Self {
        Self {
            cell,
            name: city_name(id),
            health: CITY_HEALTH,
        }
    }
}

/// Two-syllable name derived from a cell id
pub fn city_name(id: CellId) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(id.raw());
    let prefix = PREFIXES[rng.gen_range(0..PREFIXES.len())];
    let suffix = SUFFIXES[rng.gen_range(0..SUFFIXES.len())];
    format!("{}{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_names_are_stable() {
        let id = CellId::new(3, 41);
        assert_eq!(city_name(id), city_name(id));
        assert!(!city_name(id).is_empty());

        let city = City::found(7, id);
        assert_eq!(city.cell, 7);
        assert_eq!(city.health, CITY_HEALTH);
    }
}
