use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::types::ProductRecord;

/// Title key used for grouping: the title with every whitespace character removed
pub fn normalize_title(title: &str) -> String {
    title.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Records sharing one normalized title, in input order
#[derive(Debug, Clone)]
pub struct TitleGroup {
    pub title: String,
    pub records: Vec<ProductRecord>,
}

/// Result of one resolution pass
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Records kept as distinct products, indexed `0..N` in this order
    pub unique: Vec<ProductRecord>,
    /// Same-title products that could not be told apart, keyed by normalized
    /// title and ordered by the title's first appearance in the input
    pub duplicates: IndexMap<String, Vec<ProductRecord>>,
    pub missing_title_count: usize,
    /// Redundant records merged into a representative
    pub collapsed_count: usize,
}

impl ResolutionOutcome {
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.values().map(Vec::len).sum()
    }

    pub fn duplicates_flattened(&self) -> Vec<ProductRecord> {
        self.duplicates.values().flatten().cloned().collect()
    }

    /// Every input record is counted in exactly one of these buckets
    pub fn accounted(&self) -> usize {
        self.unique.len() + self.duplicate_count() + self.missing_title_count + self.collapsed_count
    }
}

/// Counters of a dedupe run, including the file side
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionSummary {
    pub total_files: usize,
    /// Entries read from the input files, decodable or not
    pub total_products: usize,
    /// Entries that could not be read as a product record
    pub undecodable_count: usize,
    pub missing_title_count: usize,
    pub collapsed_count: usize,
    pub unique_products: usize,
    pub duplicate_products: usize,
    pub unique_files: usize,
    pub duplicate_files: usize,
}

impl ResolutionSummary {
    pub fn from_outcome(outcome: &ResolutionOutcome, total_files: usize, total_products: usize) -> Self {
        Self {
            total_files,
            total_products,
            missing_title_count: outcome.missing_title_count,
            collapsed_count: outcome.collapsed_count,
            unique_products: outcome.unique.len(),
            duplicate_products: outcome.duplicate_count(),
            ..Default::default()
        }
    }

    /// Every input entry lands in exactly one of these counts
    pub fn accounted(&self) -> usize {
        self.unique_products
            + self.duplicate_products
            + self.collapsed_count
            + self.missing_title_count
            + self.undecodable_count
    }
}

/// Where the members of one title group end up
#[derive(Debug, Default)]
struct GroupVerdict {
    unique: Vec<ProductRecord>,
    duplicate: Vec<ProductRecord>,
    collapsed: usize,
}

/// Split records into unique products and same-title duplicates.
///
/// Within a title group, records are partitioned by company name and then by
/// exact price text. Equal prices collapse into the first record. When a
/// company has several records with distinct prices, their SKU variant/price
/// maps are compared with the first one: matching records collapse into it
/// and it stays unique, differing records are reported as duplicates of the
/// title. If no record matches the first one, it is reported with them.
#[instrument(skip_all, fields(records = records.len()))]
pub fn resolve(records: Vec<ProductRecord>) -> ResolutionOutcome {
    let mut outcome = ResolutionOutcome::default();
    let mut groups: IndexMap<String, Vec<ProductRecord>> = IndexMap::new();

    for record in records {
        let key = record.title.as_deref().map(normalize_title).unwrap_or_default();
        if key.is_empty() {
            outcome.missing_title_count += 1;
            continue;
        }
        groups.entry(key).or_default().push(record);
    }
    if outcome.missing_title_count > 0 {
        warn!("{} records have no title and were skipped", outcome.missing_title_count);
    }

    let (singles, shared): (Vec<_>, Vec<_>) =
        groups.into_iter().partition(|(_, members)| members.len() == 1);

    let mut unique: Vec<ProductRecord> = singles.into_iter().flat_map(|(_, members)| members).collect();

    // `shared` keeps first-appearance order, which is also the duplicate output order
    for (title, members) in shared {
        let group = TitleGroup { title, records: members };
        let verdict = resolve_group(&group);

        outcome.collapsed_count += verdict.collapsed;
        unique.extend(verdict.unique);
        if !verdict.duplicate.is_empty() {
            outcome.duplicates.insert(group.title, verdict.duplicate);
        }
    }

    outcome.unique = unique
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            record.unique_index = Some(index);
            record.original_index = None;
            record
        })
        .collect();

    info!(
        "Resolved {} unique, {} duplicate, {} collapsed, {} without title",
        outcome.unique.len(),
        outcome.duplicate_count(),
        outcome.collapsed_count,
        outcome.missing_title_count
    );
    metrics::counter!("quotation_records_unique_total").increment(outcome.unique.len() as u64);
    metrics::counter!("quotation_records_duplicate_total").increment(outcome.duplicate_count() as u64);
    metrics::counter!("quotation_records_collapsed_total").increment(outcome.collapsed_count as u64);

    outcome
}

fn partition_by<'a, F>(records: &'a [ProductRecord], key: F) -> IndexMap<&'a str, Vec<&'a ProductRecord>>
where
    F: Fn(&'a ProductRecord) -> &'a str,
{
    let mut partitions: IndexMap<&str, Vec<&ProductRecord>> = IndexMap::new();
    for record in records {
        partitions.entry(key(record)).or_default().push(record);
    }
    partitions
}

fn resolve_group(group: &TitleGroup) -> GroupVerdict {
    let mut verdict = GroupVerdict::default();

    for (company, members) in partition_by(&group.records, ProductRecord::company_name) {
        let mut distinct_prices = Vec::new();

        for (price, same_price) in partition_by_refs(&members) {
            if same_price.len() > 1 {
                debug!(
                    "'{}' at price '{}': dropping {} redundant records",
                    group.title,
                    price,
                    same_price.len() - 1
                );
                verdict.collapsed += same_price.len() - 1;
                verdict.unique.push(same_price[0].clone());
            } else {
                distinct_prices.push(same_price[0]);
            }
        }

        let Some((base, rest)) = distinct_prices.split_first() else {
            continue;
        };
        if rest.is_empty() {
            verdict.unique.push((*base).clone());
            continue;
        }

        let base_skus = base.sku_price_map();
        let (same_skus, different_skus): (Vec<&ProductRecord>, Vec<&ProductRecord>) =
            rest.iter().copied().partition(|record| record.sku_price_map() == base_skus);
        verdict.collapsed += same_skus.len();

        if !same_skus.is_empty() {
            debug!(
                "'{}' from '{}': {} records share the SKU table, kept one",
                group.title,
                company,
                same_skus.len() + 1
            );
            verdict.unique.push((*base).clone());
        } else {
            // Nothing matched the base, so it is one of the conflicting variants
            verdict.duplicate.push((*base).clone());
        }
        if !different_skus.is_empty() {
            info!(
                "'{}' from '{}': {} records differ in SKU table, marked duplicate",
                group.title,
                company,
                different_skus.len()
            );
            verdict.duplicate.extend(different_skus.into_iter().cloned());
        }
    }

    verdict
}

fn partition_by_refs<'a>(records: &[&'a ProductRecord]) -> IndexMap<&'a str, Vec<&'a ProductRecord>> {
    let mut partitions: IndexMap<&str, Vec<&ProductRecord>> = IndexMap::new();
    for &record in records {
        partitions.entry(record.price_text()).or_default().push(record);
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompanyField, CompanySummary, SkuEntry};

    fn product(index: usize, title: &str, company: &str, price: &str) -> ProductRecord {
        ProductRecord {
            original_index: Some(index),
            title: Some(title.to_string()),
            price: (!price.is_empty()).then(|| price.to_string()),
            company: (!company.is_empty()).then(|| {
                CompanyField::Summary(CompanySummary {
                    name: Some(company.to_string()),
                    ..Default::default()
                })
            }),
            ..Default::default()
        }
    }

    fn with_skus(mut record: ProductRecord, skus: &[(&str, &str)]) -> ProductRecord {
        record.skus = Some(
            skus.iter()
                .map(|(variant, price)| SkuEntry {
                    variant: variant.to_string(),
                    image: String::new(),
                    price: price.to_string(),
                })
                .collect(),
        );
        record
    }

    #[test]
    fn test_normalize_title_is_idempotent() {
        let once = normalize_title(" 猫窝\t大号 \u{3000}加厚 ");
        assert_eq!(once, "猫窝大号加厚");
        assert_eq!(normalize_title(&once), once);
    }

    #[test]
    fn test_equal_price_collapses_to_one() {
        let outcome = resolve(vec![product(0, "A", "X", "10"), product(1, "A", "X", "10")]);

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.duplicate_count(), 0);
        assert_eq!(outcome.collapsed_count, 1);
        assert_eq!(outcome.unique[0].unique_index, Some(0));
        assert_eq!(outcome.unique[0].original_index, None);
    }

    #[test]
    fn test_different_skus_are_duplicates() {
        let outcome = resolve(vec![
            product(0, "B", "Y", "1"),
            with_skus(product(1, "A", "X", "10"), &[("红", "10")]),
            with_skus(product(2, "A", "X", "20"), &[("红", "20")]),
        ]);

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.unique[0].title.as_deref(), Some("B"));
        let group = &outcome.duplicates["A"];
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].original_index, Some(1));
        assert_eq!(group[1].original_index, Some(2));
    }

    #[test]
    fn test_matching_skus_keep_base_unique_beside_conflicts() {
        let outcome = resolve(vec![
            with_skus(product(0, "A", "X", "10"), &[("红", "10")]),
            with_skus(product(1, "A", "X", "11"), &[("红", "10")]),
            with_skus(product(2, "A", "X", "12"), &[("红", "99")]),
        ]);

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.unique[0].price.as_deref(), Some("10"));
        assert_eq!(outcome.collapsed_count, 1);
        let group = &outcome.duplicates["A"];
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].price.as_deref(), Some("12"));
        assert_eq!(outcome.accounted(), 3);
    }

    #[test]
    fn test_same_skus_collapse_into_first() {
        let skus = [("红", "10"), ("蓝", "12")];
        let outcome = resolve(vec![
            with_skus(product(0, "A", "X", "10"), &skus),
            with_skus(product(1, "A", "X", "12"), &skus),
        ]);

        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.collapsed_count, 1);
        assert!(outcome.duplicates.is_empty());
    }

    #[test]
    fn test_different_companies_stay_unique() {
        let outcome = resolve(vec![product(0, "A", "X", "10"), product(1, "A", "Z", "20")]);
        assert_eq!(outcome.unique.len(), 2);
        assert_eq!(outcome.collapsed_count, 0);
    }

    #[test]
    fn test_missing_titles_are_counted_not_output() {
        let mut untitled = product(0, "", "X", "1");
        untitled.title = None;
        let blank = product(1, "  ", "X", "1");

        let outcome = resolve(vec![untitled, blank, product(2, "A", "X", "1")]);
        assert_eq!(outcome.missing_title_count, 2);
        assert_eq!(outcome.unique.len(), 1);
    }

    #[test]
    fn test_titles_match_after_whitespace_removal() {
        let outcome = resolve(vec![product(0, "猫 窝", "X", "1"), product(1, "猫窝", "X", "1")]);
        assert_eq!(outcome.unique.len(), 1);
        assert_eq!(outcome.collapsed_count, 1);
    }

    #[test]
    fn test_unique_order_and_dense_indices() {
        let outcome = resolve(vec![
            product(0, "A", "X", "1"),
            product(1, "B", "X", "1"),
            product(2, "A", "X", "1"),
            product(3, "C", "X", "1"),
        ]);

        let titles: Vec<_> = outcome.unique.iter().map(|r| r.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["B", "C", "A"]);
        let indices: Vec<_> = outcome.unique.iter().map(|r| r.unique_index.unwrap()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_groups_follow_first_appearance() {
        let outcome = resolve(vec![
            with_skus(product(0, "Z", "X", "1"), &[("a", "1")]),
            with_skus(product(1, "A", "X", "1"), &[("a", "1")]),
            with_skus(product(2, "A", "X", "2"), &[("a", "2")]),
            with_skus(product(3, "Z", "X", "2"), &[("a", "2")]),
        ]);

        let titles: Vec<&str> = outcome.duplicates.keys().map(String::as_str).collect();
        assert_eq!(titles, vec!["Z", "A"]);
        assert_eq!(outcome.duplicates_flattened().len(), 4);
    }

    #[test]
    fn test_every_record_is_accounted_for() {
        let skus_a = [("红", "10")];
        let skus_b = [("红", "11")];
        let mut records = vec![
            product(0, "A", "X", "10"),
            product(1, "A", "X", "10"),
            with_skus(product(2, "A", "X", "11"), &skus_a),
            with_skus(product(3, "A", "X", "12"), &skus_a),
            with_skus(product(4, "A", "X", "13"), &skus_b),
            product(5, "A", "", "10"),
            product(6, "B", "", "10"),
        ];
        records.push(ProductRecord::default());
        let total = records.len();

        let outcome = resolve(records);
        assert_eq!(outcome.accounted(), total);
        assert_eq!(outcome.collapsed_count, 2);
        assert_eq!(outcome.duplicate_count(), 1);
    }
}
