use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::error::FieldError;
use crate::pipeline::processing::completeness::is_none_or_empty;
use crate::pipeline::processing::format_rate;
use crate::types::{CompanyField, ErrorRecord, ProductRecord, RawRecord};

pub mod fields;
pub mod literal;
pub mod registry;
pub mod shape;

pub use fields::{FieldTransform, FieldValue};
pub use registry::FieldRegistry;
pub use shape::RawShape;

const ERROR_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Collects the fields of one record as they are normalized.
///
/// Failed fields are remembered but never abort the record; whether the
/// record as a whole passes is decided in [`ProductRecordBuilder::build`].
#[derive(Debug, Default)]
pub struct ProductRecordBuilder {
    record: ProductRecord,
    failures: Vec<FieldError>,
}

impl ProductRecordBuilder {
    pub fn new(original_index: usize) -> Self {
        Self {
            record: ProductRecord {
                original_index: Some(original_index),
                ..Default::default()
            },
            failures: Vec::new(),
        }
    }

    pub fn attach(&mut self, value: FieldValue) {
        let record = &mut self.record;
        match value {
            FieldValue::Title(v) => record.title = Some(v),
            FieldValue::Timestamps(v) => record.timestamps = Some(v),
            FieldValue::Price(v) => record.price = Some(v),
            FieldValue::Sales(v) => record.sales = Some(v),
            FieldValue::Details(v) => record.details = Some(v),
            FieldValue::PackageWeight(v) => record.package_weight = Some(v),
            FieldValue::MainImages(v) => record.main_images = Some(v),
            FieldValue::DetailImages(v) => record.detail_images = Some(v),
            FieldValue::Skus(v) => record.skus = Some(v),
            FieldValue::ProductUrl(v) => record.product_url = Some(v),
            FieldValue::CompanySummary(v) => record.company = Some(CompanyField::Summary(v)),
            FieldValue::CompanyDetail(v) => record.company_detail = Some(v),
        }
    }

    pub fn record_failure(&mut self, failure: FieldError) {
        self.failures.push(failure);
    }

    /// The record, or the field failures when not a single business field survived
    pub fn build(self) -> Result<ProductRecord, Vec<FieldError>> {
        if self.record.business_field_count() >= 1 {
            Ok(self.record)
        } else {
            Err(self.failures)
        }
    }
}

/// Turns raw rows into product records
pub trait Normalizer {
    fn normalize(&self, record: &RawRecord, original_index: usize) -> Result<ProductRecord, ErrorRecord>;
}

/// Normalizer that runs every transform of a [`FieldRegistry`] over the row
#[derive(Default)]
pub struct FieldNormalizer {
    registry: FieldRegistry,
}

impl FieldNormalizer {
    pub fn new(registry: FieldRegistry) -> Self {
        Self { registry }
    }
}

impl Normalizer for FieldNormalizer {
    fn normalize(&self, record: &RawRecord, original_index: usize) -> Result<ProductRecord, ErrorRecord> {
        let mut builder = ProductRecordBuilder::new(original_index);

        for transform in self.registry.iter() {
            let key = transform.key();
            let Some(raw) = record.get(key).filter(|value| !is_none_or_empty(value)) else {
                warn!(index = original_index, "Field '{}' is missing or empty, skipped", key);
                continue;
            };

            let shape = RawShape::of(raw);
            match transform.transform(&shape) {
                Ok(Some(value)) => builder.attach(value),
                Ok(None) => {
                    warn!(index = original_index, "Field '{}' produced no value", key);
                }
                Err(failure) => {
                    warn!(index = original_index, "{}", failure);
                    metrics::counter!("quotation_field_errors_total").increment(1);
                    builder.record_failure(failure);
                }
            }
        }

        builder.build().map_err(|failures| {
            let mut message = "no usable field after cleaning".to_string();
            if !failures.is_empty() {
                let details: Vec<String> = failures.iter().map(ToString::to_string).collect();
                message = format!("{}: {}", message, details.join("; "));
            }
            ErrorRecord {
                original_index,
                error_message: message,
                error_time: Local::now().format(ERROR_TIME_FORMAT).to_string(),
                original_data: record.clone(),
            }
        })
    }
}

/// Result of cleaning one batch. Counters belong to this value, so every run
/// starts from zero.
#[derive(Debug, Clone, Default)]
pub struct CleaningOutcome {
    pub cleaned: Vec<ProductRecord>,
    pub errors: Vec<ErrorRecord>,
}

impl CleaningOutcome {
    pub fn total(&self) -> usize {
        self.cleaned.len() + self.errors.len()
    }

    pub fn success_count(&self) -> usize {
        self.cleaned.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn report(&self) -> CleaningReport {
        CleaningReport::from_counts(self.success_count(), self.error_count())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    pub total: usize,
    pub success: usize,
    pub error: usize,
    pub success_rate: String,
    pub error_rate: String,
    pub cleaned_at: String,
}

impl CleaningReport {
    pub fn from_counts(success: usize, error: usize) -> Self {
        let total = success + error;
        Self {
            total,
            success,
            error,
            success_rate: format_rate(success, total),
            error_rate: format_rate(error, total),
            cleaned_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl std::fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total: {}, cleaned: {} ({}), failed: {} ({})",
            self.total, self.success, self.success_rate, self.error, self.error_rate
        )
    }
}

/// Normalize every record of a batch; `_original_index` is the position in `records`
#[instrument(skip_all, fields(records = records.len()))]
pub fn clean(normalizer: &dyn Normalizer, records: &[RawRecord]) -> CleaningOutcome {
    let mut outcome = CleaningOutcome::default();

    for (index, record) in records.iter().enumerate() {
        match normalizer.normalize(record, index) {
            Ok(cleaned) => {
                debug!(index, fields = cleaned.business_field_count(), "Record cleaned");
                outcome.cleaned.push(cleaned);
            }
            Err(failed) => {
                error!(index, "Record {} failed: {}", index, failed.error_message);
                outcome.errors.push(failed);
            }
        }
    }

    info!(
        "Cleaning finished: {} cleaned, {} failed",
        outcome.success_count(),
        outcome.error_count()
    );
    metrics::counter!("quotation_records_cleaned_total").increment(outcome.success_count() as u64);
    metrics::counter!("quotation_records_failed_total").increment(outcome.error_count() as u64);

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextMap;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn full_record() -> RawRecord {
        raw(json!({
            "商品标题": [["宠物猫窝 四季通用"]],
            "时间": [["最早上架时间：2025-09-08 16:56:26"]],
            "价格": ["券后¥16.9\n\n首件预估到手价"],
            "销售": [["年销量", "0件"]],
            "商品详情": [["材质", "棉", "否", "是"]],
            "主产品图片": ["https://img/main.jpg"],
            "商品详情图片": ["https://img/detail.jpg"],
            "sku商品详情图片和信息": "a\tb\tc\t白色\thttps://img/sku.jpg\t16.9",
            "产品网址": "https://detail.1688.com/offer/1.html",
            "公司基本信息": [["义乌某厂"], ["回头率 30%"]],
            "公司详情信息": [["经营模式\\n生产型"]]
        }))
    }

    #[test]
    fn test_full_record_normalizes_every_field() {
        let record = FieldNormalizer::default().normalize(&full_record(), 7).unwrap();

        assert_eq!(record.original_index, Some(7));
        assert_eq!(record.title.as_deref(), Some("宠物猫窝 四季通用"));
        assert_eq!(
            record.timestamps,
            Some(TextMap::from([("最早上架时间".to_string(), "2025-09-08 16:56:26".to_string())]))
        );
        assert_eq!(record.price.as_deref(), Some("券后¥16.9 首件预估到手价"));
        assert_eq!(record.company_name(), "义乌某厂");
        assert_eq!(record.business_field_count(), 11);
        assert!(record.package_weight.is_none());
    }

    #[test]
    fn test_failed_field_does_not_abort_record() {
        let mut input = full_record();
        input.insert("价格".into(), json!({"unexpected": "mapping"}));
        input.insert("时间".into(), json!("not a list"));

        let record = FieldNormalizer::default().normalize(&input, 0).unwrap();
        assert!(record.price.is_none());
        assert!(record.timestamps.is_none());
        assert!(record.title.is_some());
    }

    #[test]
    fn test_deeply_nested_cell_only_fails_its_field() {
        let input = raw(json!({"商品标题": "猫窝", "价格": "[".repeat(30_000)}));

        let record = FieldNormalizer::default().normalize(&input, 0).unwrap();
        assert_eq!(record.title.as_deref(), Some("猫窝"));
        assert!(record.price.is_none());
    }

    #[test]
    fn test_record_without_any_field_becomes_error() {
        let input = raw(json!({"商品标题": ["flat"], "价格": "plain", "其他": "x"}));

        let failed = FieldNormalizer::default().normalize(&input, 3).unwrap_err();
        assert_eq!(failed.original_index, 3);
        assert_eq!(failed.original_data, input);
        assert!(failed.error_message.starts_with("no usable field after cleaning"));
        assert!(failed.error_message.contains("商品标题"));
        assert!(failed.error_time.contains('T'));
    }

    #[test]
    fn test_clean_counts_are_per_run() {
        let normalizer = FieldNormalizer::default();
        let batch = vec![full_record(), raw(json!({"商品标题": ""}))];

        let first = clean(&normalizer, &batch);
        let second = clean(&normalizer, &batch);

        for outcome in [&first, &second] {
            assert_eq!(outcome.total(), 2);
            assert_eq!(outcome.success_count(), 1);
            assert_eq!(outcome.error_count(), 1);
            assert_eq!(outcome.errors[0].original_index, 1);
        }
        let report = first.report();
        assert_eq!(report.success_rate, "50.00%");
        assert_eq!(report.error_rate, "50.00%");
    }

    #[test]
    fn test_builder_rejects_provenance_only_record() {
        let builder = ProductRecordBuilder::new(0);
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_custom_registry_limits_columns() {
        let mut registry = FieldRegistry::empty();
        registry.register(Box::new(fields::PriceTransform));
        let record = FieldNormalizer::new(registry).normalize(&full_record(), 0).unwrap();

        assert_eq!(record.business_field_count(), 1);
        assert!(record.title.is_none());
    }
}
