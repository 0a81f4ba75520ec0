use crate::{
    catalog::{validate, CatalogItem},
    error::Error,
};

const MULTIPLIER: u128 = 9301;
const INCREMENT: u128 = 49297;

/// Position in the weight expansion of `catalog` picked by `seed`.
pub fn position(seed: u64, total_weight: u64) -> u64 {
    ((u128::from(seed) * MULTIPLIER + INCREMENT) % u128::from(total_weight)) as u64
}

/// Pick one item from `catalog`. Each item occupies `weight` consecutive
/// positions in declaration order; the seed is mapped to one position by a
/// single linear congruential step.
pub fn select(seed: u64, catalog: &[CatalogItem]) -> Result<&CatalogItem, Error> {
    let total = validate(catalog)?;
    let mut index = position(seed, total);
    for item in catalog {
        let weight = u64::from(item.weight);
        if index < weight {
            return Ok(item);
        }
        index -= weight;
    }
    unreachable!("position is always below the total weight")
}
