use std::cmp::Ordering;

use crate::pipeline::filter::SortKey;
use crate::types::AssetRecord;

impl SortKey {
    /// Comparator for this key. Absent prices compare as zero.
    pub fn compare(self, a: &AssetRecord, b: &AssetRecord) -> Ordering {
        match self {
            SortKey::PriceHighLow => b.effective_price().total_cmp(&a.effective_price()),
            SortKey::PriceLowHigh => a.effective_price().total_cmp(&b.effective_price()),
            SortKey::MostRare | SortKey::RarityScoreHigh => {
                b.rarity_score.total_cmp(&a.rarity_score)
            }
            SortKey::LeastRare | SortKey::RarityScoreLow => {
                a.rarity_score.total_cmp(&b.rarity_score)
            }
        }
    }
}

/// Stable sort; `None` keeps the incoming order.
pub fn sort_records(records: &mut [&AssetRecord], key: Option<SortKey>) {
    if let Some(key) = key {
        records.sort_by(|a, b| key.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures;

    fn ids(records: &[&AssetRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn price_low_high_puts_offer_only_first() {
        let catalog = fixtures::catalog();
        let mut refs: Vec<&AssetRecord> = catalog.iter().collect();
        sort_records(&mut refs, Some(SortKey::PriceLowHigh));
        assert_eq!(ids(&refs), ["1006", "1005", "1003", "1002", "1001", "1004"]);
    }

    #[test]
    fn rarity_keys_share_a_comparator() {
        let catalog = fixtures::catalog();
        let mut most: Vec<&AssetRecord> = catalog.iter().collect();
        let mut score: Vec<&AssetRecord> = catalog.iter().collect();
        sort_records(&mut most, Some(SortKey::MostRare));
        sort_records(&mut score, Some(SortKey::RarityScoreHigh));
        assert_eq!(ids(&most), ids(&score));
        assert_eq!(ids(&most)[0], "1004");

        let mut least: Vec<&AssetRecord> = catalog.iter().collect();
        sort_records(&mut least, Some(SortKey::LeastRare));
        assert_eq!(ids(&least)[0], "1005");
    }

    #[test]
    fn equal_keys_keep_incoming_order() {
        let mut catalog = fixtures::catalog();
        for rec in &mut catalog {
            rec.price = Some(100.0);
        }
        let mut refs: Vec<&AssetRecord> = catalog.iter().rev().collect();
        let before = ids(&refs);
        sort_records(&mut refs, Some(SortKey::PriceHighLow));
        assert_eq!(ids(&refs), before);
    }

    #[test]
    fn no_key_is_identity() {
        let catalog = fixtures::catalog();
        let mut refs: Vec<&AssetRecord> = catalog.iter().collect();
        let before = ids(&refs);
        sort_records(&mut refs, None);
        assert_eq!(ids(&refs), before);
    }
}
