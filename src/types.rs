use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One scraped spreadsheet row: column name to raw cell value
pub type RawRecord = serde_json::Map<String, Value>;

/// Label to value mapping, in the order the labels were scraped
pub type TextMap = IndexMap<String, String>;

/// One row of the packaging weight table, keyed by header cell
pub type PackageRow = IndexMap<String, CellValue>;

/// Packaging table cell: integers under unit-bearing headers, text otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Text(String),
}

/// One line of the SKU detail table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkuEntry {
    #[serde(rename = "颜色规格")]
    pub variant: String,
    #[serde(rename = "图片")]
    pub image: String,
    #[serde(rename = "价格")]
    pub price: String,
}

/// Company summary block extracted from the seller card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySummary {
    #[serde(rename = "公司名称", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "回头率", skip_serializing_if = "Option::is_none")]
    pub repeat_rate: Option<String>,
    #[serde(rename = "主营", skip_serializing_if = "Option::is_none")]
    pub primary_business: Option<String>,
    #[serde(rename = "成立时间", skip_serializing_if = "Option::is_none")]
    pub founded: Option<String>,
    #[serde(rename = "公司简介", skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
}

impl CompanySummary {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.repeat_rate.is_none()
            && self.primary_business.is_none()
            && self.founded.is_none()
            && self.intro.is_none()
    }
}

/// Company summary as read back from persisted records.
///
/// Anything that is not a mapping of the expected keys is kept verbatim as
/// `Unrecognized` so it round-trips, and counts as the empty company name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompanyField {
    Summary(CompanySummary),
    Unrecognized(Value),
}

impl<'de> Deserialize<'de> for CompanyField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_object() {
            if let Ok(summary) = serde_json::from_value::<CompanySummary>(value.clone()) {
                return Ok(CompanyField::Summary(summary));
            }
        }
        Ok(CompanyField::Unrecognized(value))
    }
}

/// Company detail page, in one of the two scraped layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompanyDetail {
    Flat(TextMap),
    Sectioned(IndexMap<String, TextMap>),
}

/// A cleaned product record.
///
/// Every business field is optional and omitted from the serialized form when
/// absent; a present field is never an empty container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    #[serde(rename = "_unique_index", skip_serializing_if = "Option::is_none")]
    pub unique_index: Option<usize>,
    #[serde(rename = "_original_index", skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
    #[serde(rename = "商品标题", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "时间", skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<TextMap>,
    #[serde(rename = "价格", skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(rename = "销售", skip_serializing_if = "Option::is_none")]
    pub sales: Option<TextMap>,
    #[serde(rename = "商品详情", skip_serializing_if = "Option::is_none")]
    pub details: Option<TextMap>,
    #[serde(rename = "包装重量", skip_serializing_if = "Option::is_none")]
    pub package_weight: Option<Vec<PackageRow>>,
    #[serde(rename = "主产品图片", skip_serializing_if = "Option::is_none")]
    pub main_images: Option<Vec<String>>,
    #[serde(rename = "商品详情图片", skip_serializing_if = "Option::is_none")]
    pub detail_images: Option<Vec<String>>,
    #[serde(rename = "sku商品详情图片和信息", skip_serializing_if = "Option::is_none")]
    pub skus: Option<Vec<SkuEntry>>,
    #[serde(rename = "产品网址", skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(rename = "公司基本信息", skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyField>,
    #[serde(rename = "公司详情信息", skip_serializing_if = "Option::is_none")]
    pub company_detail: Option<CompanyDetail>,
}

impl ProductRecord {
    /// Company name used for duplicate partitioning; empty when absent or unrecognized
    pub fn company_name(&self) -> &str {
        match &self.company {
            Some(CompanyField::Summary(summary)) => summary.name.as_deref().unwrap_or(""),
            _ => "",
        }
    }

    pub fn price_text(&self) -> &str {
        self.price.as_deref().unwrap_or("")
    }

    /// Variant to price mapping of the SKU table, skipping entries missing either side
    pub fn sku_price_map(&self) -> IndexMap<&str, &str> {
        self.skus
            .iter()
            .flatten()
            .filter(|sku| !sku.variant.is_empty() && !sku.price.is_empty())
            .map(|sku| (sku.variant.as_str(), sku.price.as_str()))
            .collect()
    }

    /// Number of business fields present (provenance indices excluded)
    pub fn business_field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.timestamps.is_some(),
            self.price.is_some(),
            self.sales.is_some(),
            self.details.is_some(),
            self.package_weight.is_some(),
            self.main_images.is_some(),
            self.detail_images.is_some(),
            self.skus.is_some(),
            self.product_url.is_some(),
            self.company.is_some(),
            self.company_detail.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// A row that could not be normalized into any business field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "_original_index")]
    pub original_index: usize,
    #[serde(rename = "_error_message")]
    pub error_message: String,
    #[serde(rename = "_error_time")]
    pub error_time: String,
    #[serde(rename = "_original_data")]
    pub original_data: RawRecord,
}

/// A raw row that is missing at least one required field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    #[serde(rename = "_missing_fields")]
    pub missing_fields: Vec<String>,
    #[serde(rename = "_row_index")]
    pub row_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let record = ProductRecord {
            original_index: Some(3),
            title: Some("猫窝".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"_original_index": 3, "商品标题": "猫窝"}));
    }

    #[test]
    fn test_non_ascii_is_written_verbatim() {
        let record = ProductRecord {
            title: Some("猫窝大号".to_string()),
            ..Default::default()
        };

        let text = serde_json::to_string(&record).unwrap();
        assert!(text.contains("猫窝大号"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_company_field_round_trip() {
        let record: ProductRecord = serde_json::from_value(json!({
            "商品标题": "A",
            "公司基本信息": {"公司名称": "X", "回头率": "45%"}
        }))
        .unwrap();

        assert_eq!(record.company_name(), "X");
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["公司基本信息"], json!({"公司名称": "X", "回头率": "45%"}));
    }

    #[test]
    fn test_unrecognized_company_is_empty_name() {
        let record: ProductRecord = serde_json::from_value(json!({
            "商品标题": "A",
            "公司基本信息": ["X"]
        }))
        .unwrap();

        assert_eq!(record.company_name(), "");
        assert!(matches!(record.company, Some(CompanyField::Unrecognized(_))));
    }

    #[test]
    fn test_company_detail_layouts_deserialize() {
        let flat: CompanyDetail =
            serde_json::from_value(json!({"经营模式": "生产型"})).unwrap();
        assert!(matches!(flat, CompanyDetail::Flat(_)));

        let nested: CompanyDetail =
            serde_json::from_value(json!({"基本信息": {"注册资金": "200万"}})).unwrap();
        assert!(matches!(nested, CompanyDetail::Sectioned(_)));
    }

    #[test]
    fn test_sku_price_map_skips_partial_entries() {
        let record = ProductRecord {
            skus: Some(vec![
                SkuEntry { variant: "红".into(), image: String::new(), price: "10".into() },
                SkuEntry { variant: "".into(), image: String::new(), price: "12".into() },
                SkuEntry { variant: "蓝".into(), image: String::new(), price: "".into() },
            ]),
            ..Default::default()
        };

        let map = record.sku_price_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("红"), Some(&"10"));
    }

    #[test]
    fn test_incomplete_record_appends_bookkeeping_keys() {
        let mut raw = RawRecord::new();
        raw.insert("商品标题".into(), json!("A"));
        let incomplete = IncompleteRecord {
            record: raw,
            missing_fields: vec!["价格".into()],
            row_index: 4,
        };

        let value = serde_json::to_value(&incomplete).unwrap();
        assert_eq!(
            value,
            json!({"商品标题": "A", "_missing_fields": ["价格"], "_row_index": 4})
        );
    }
}
