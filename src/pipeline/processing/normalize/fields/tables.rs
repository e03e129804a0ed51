use super::{escaped_lines, unsupported, FieldTransform, FieldValue, TransformResult};
use crate::constants::{FIELD_PACKAGE_WEIGHT, FIELD_SKU, PACKAGE_UNIT_MARKERS, SKU_PRICE_PLACEHOLDER};
use crate::pipeline::processing::normalize::shape::{RawItem, RawShape};
use crate::types::{CellValue, PackageRow, SkuEntry};

// SKU export columns: 0-2 are listing metadata, then variant, image, price
const SKU_VARIANT_COLUMN: usize = 3;
const SKU_IMAGE_COLUMN: usize = 4;
const SKU_PRICE_COLUMN: usize = 5;

/// Packaging table: tab-separated header line followed by data lines of the
/// same width. Values under unit-bearing headers become integers when they
/// are all digits.
pub struct PackageWeightTransform;

impl FieldTransform for PackageWeightTransform {
    fn key(&self) -> &'static str {
        FIELD_PACKAGE_WEIGHT
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let table = match shape {
            RawShape::Unsupported(_) => return Err(unsupported(FIELD_PACKAGE_WEIGHT, shape)),
            _ => shape.first_leaf().map(str::trim).unwrap_or(""),
        };
        if table.is_empty() {
            return Ok(None);
        }

        let lines = escaped_lines(table);
        let Some((header_line, data_lines)) = lines.split_first() else {
            return Ok(None);
        };
        if data_lines.is_empty() {
            return Ok(None);
        }
        let headers: Vec<&str> = header_line.split('\t').map(str::trim).collect();

        let mut rows = Vec::new();
        for line in data_lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let values: Vec<&str> = line.split('\t').collect();
            if values.len() != headers.len() {
                continue;
            }
            let row: PackageRow = headers
                .iter()
                .zip(values)
                .map(|(header, value)| (header.to_string(), package_cell(header, value.trim())))
                .collect();
            rows.push(row);
        }
        Ok((!rows.is_empty()).then_some(FieldValue::PackageWeight(rows)))
    }
}

fn package_cell(header: &str, value: &str) -> CellValue {
    let has_unit = PACKAGE_UNIT_MARKERS.iter().any(|marker| header.contains(marker));
    if has_unit && !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(number) = value.parse::<i64>() {
            return CellValue::Int(number);
        }
    }
    CellValue::Text(value.to_string())
}

/// SKU table exported as tab-separated lines, either one multi-line string or
/// one list element per line. Lines without a tab are skipped.
pub struct SkuTransform;

impl FieldTransform for SkuTransform {
    fn key(&self) -> &'static str {
        FIELD_SKU
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let lines: Vec<&str> = match shape {
            RawShape::Text(text) | RawShape::Table(text) => text.split('\n').collect(),
            RawShape::List(items) => items.iter().map(String::as_str).collect(),
            RawShape::NestedList(items) => items
                .iter()
                .filter_map(|item| match item {
                    RawItem::Leaf(leaf) => Some(leaf.as_str()),
                    RawItem::Row(_) => None,
                })
                .collect(),
            other => return Err(unsupported(FIELD_SKU, other)),
        };

        let entries: Vec<SkuEntry> = lines
            .into_iter()
            .map(str::trim)
            .filter(|line| line.contains('\t'))
            .map(sku_entry)
            .collect();
        Ok((!entries.is_empty()).then_some(FieldValue::Skus(entries)))
    }
}

fn sku_entry(line: &str) -> SkuEntry {
    let columns: Vec<&str> = line.split('\t').collect();
    let column = |index: usize| columns.get(index).copied();

    SkuEntry {
        variant: column(SKU_VARIANT_COLUMN).map(str::trim).unwrap_or("").to_string(),
        image: column(SKU_IMAGE_COLUMN)
            .filter(|image| image.starts_with("http"))
            .map(str::trim)
            .unwrap_or("")
            .to_string(),
        price: column(SKU_PRICE_COLUMN)
            .filter(|price| *price != SKU_PRICE_PLACEHOLDER)
            .map(str::trim)
            .unwrap_or("")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(transform: &dyn FieldTransform, raw: serde_json::Value) -> TransformResult {
        transform.transform(&RawShape::of(&raw))
    }

    #[test]
    fn test_package_table_converts_unit_columns() {
        let raw = json!([["颜色\t长(cm)\t重量(g)\n白色\t40\t350\n黑色\t4O\t360\n短行\t1"]]);
        let Some(FieldValue::PackageWeight(rows)) = run(&PackageWeightTransform, raw).unwrap() else {
            panic!("expected package rows");
        };

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["颜色"], CellValue::Text("白色".into()));
        assert_eq!(rows[0]["长(cm)"], CellValue::Int(40));
        assert_eq!(rows[0]["重量(g)"], CellValue::Int(350));
        assert_eq!(rows[1]["长(cm)"], CellValue::Text("4O".into()));
    }

    #[test]
    fn test_package_table_accepts_escaped_line_breaks() {
        let raw = json!("规格\t体积(cm³)\\n小\t1200");
        let Some(FieldValue::PackageWeight(rows)) = run(&PackageWeightTransform, raw).unwrap() else {
            panic!("expected package rows");
        };
        assert_eq!(rows[0]["体积(cm³)"], CellValue::Int(1200));
    }

    #[test]
    fn test_package_table_needs_data_rows() {
        assert_eq!(run(&PackageWeightTransform, json!(["颜色\t长(cm)"])).unwrap(), None);
        assert_eq!(run(&PackageWeightTransform, json!(["  "])).unwrap(), None);
    }

    #[test]
    fn test_sku_columns() {
        let raw = json!("a\tb\tc\t红色\thttps://img/1.jpg\t12.5\r\nno tab line\n\na\tb\tc\t蓝色\tnone\t--");
        assert_eq!(
            run(&SkuTransform, raw).unwrap(),
            Some(FieldValue::Skus(vec![
                SkuEntry {
                    variant: "红色".into(),
                    image: "https://img/1.jpg".into(),
                    price: "12.5".into()
                },
                SkuEntry {
                    variant: "蓝色".into(),
                    image: String::new(),
                    price: String::new()
                },
            ]))
        );
    }

    #[test]
    fn test_sku_short_lines_keep_empty_columns() {
        let Some(FieldValue::Skus(entries)) = run(&SkuTransform, json!(["a\tb"])).unwrap() else {
            panic!("expected sku entries");
        };
        assert_eq!(entries, vec![SkuEntry::default()]);
    }

    #[test]
    fn test_sku_without_tabs_is_absent() {
        assert_eq!(run(&SkuTransform, json!(["plain", "text"])).unwrap(), None);
        assert!(run(&SkuTransform, json!(12)).is_err());
    }
}
