// Copyright 2026 the Shader Cross Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::BTreeMap;

use super::EffectError;

/// Effects with more features than this are rejected rather than expanded.
pub const MAX_FEATURES: usize = 16;

/// Every non-empty subset of `features`, in bitmask order.
///
/// Subset `m` holds `features[i]` for each bit `i` set in `m`, so single features come
/// first in declaration order, followed by their combinations.
pub fn feature_sets(features: &[String]) -> Result<Vec<Vec<String>>, EffectError> {
    if features.len() > MAX_FEATURES {
        return Err(EffectError::TooManyFeatures(features.len()));
    }
    let sets = (1_u32..1 << features.len())
        .map(|mask| {
            features
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, feature)| feature.clone())
                .collect()
        })
        .collect();
    Ok(sets)
}

/// Distinct features across all effects that fit in a `u32` mask.
pub const MAX_FEATURE_BITS: usize = u32::BITS as usize;

/// Assign each distinct feature across all effects a bit, in sorted order.
pub fn feature_bits<'a>(
    features: impl IntoIterator<Item = &'a str>,
) -> Result<BTreeMap<String, u32>, EffectError> {
    let mut names: Vec<&str> = features.into_iter().collect();
    names.sort_unstable();
    names.dedup();
    if names.len() > MAX_FEATURE_BITS {
        return Err(EffectError::TooManyFeatures(names.len()));
    }
    Ok(names
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name.to_owned(), 1 << i))
        .collect())
}

/// The mask of a feature set, given the bits from [`feature_bits`].
pub fn feature_mask(bits: &BTreeMap<String, u32>, features: &[String]) -> u32 {
    features
        .iter()
        .filter_map(|feature| bits.get(feature))
        .fold(0, |mask, bit| mask | bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subsets_in_mask_order() {
        let sets = feature_sets(&names(&["FOG", "SHADOW"])).unwrap();
        assert_eq!(
            sets,
            vec![names(&["FOG"]), names(&["SHADOW"]), names(&["FOG", "SHADOW"])]
        );
        assert_eq!(feature_sets(&names(&["A", "B", "C"])).unwrap().len(), 7);
        assert!(feature_sets(&[]).unwrap().is_empty());
    }

    #[test]
    fn feature_limit() {
        let many: Vec<String> = (0..=MAX_FEATURES).map(|i| format!("F{i}")).collect();
        assert!(matches!(
            feature_sets(&many),
            Err(EffectError::TooManyFeatures(17))
        ));
    }

    #[test]
    fn bits_are_sorted_and_unique() {
        let bits = feature_bits(["SHADOW", "FOG", "SHADOW", "ALPHA"]).unwrap();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits["ALPHA"], 1);
        assert_eq!(bits["FOG"], 2);
        assert_eq!(bits["SHADOW"], 4);
    }

    #[test]
    fn bits_run_out_after_32_features() {
        let names: Vec<String> = (0..=MAX_FEATURE_BITS).map(|i| format!("F{i:02}")).collect();
        assert!(matches!(
            feature_bits(names.iter().map(String::as_str)),
            Err(EffectError::TooManyFeatures(33))
        ));

        let bits = feature_bits(names[..MAX_FEATURE_BITS].iter().map(String::as_str)).unwrap();
        assert_eq!(bits["F31"], 1 << 31);
    }

    #[test]
    fn masks_ignore_repeats() {
        let bits = feature_bits(["FOG", "SHADOW"]).unwrap();
        assert_eq!(feature_mask(&bits, &names(&["SHADOW", "FOG"])), 3);
        assert_eq!(feature_mask(&bits, &names(&["FOG", "FOG"])), 1);
        assert_eq!(feature_mask(&bits, &[]), 0);
    }
}
