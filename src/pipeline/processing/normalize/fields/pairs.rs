use super::{unsupported, FieldTransform, FieldValue, TransformResult};
use crate::constants::{DETAILS_NEGATIVE_MARKER, FIELD_DETAILS, FIELD_SALES, FIELD_TIME};
use crate::pipeline::processing::normalize::shape::{RawItem, RawShape};
use crate::types::TextMap;

fn rows<'a>(
    field: &'static str,
    shape: &'a RawShape,
) -> Result<impl Iterator<Item = &'a Vec<String>>, crate::error::FieldError> {
    match shape {
        RawShape::NestedList(items) => Ok(items.iter().filter_map(|item| match item {
            RawItem::Row(row) => Some(row),
            RawItem::Leaf(_) => None,
        })),
        other => Err(unsupported(field, other)),
    }
}

fn insert_pair(map: &mut TextMap, key: &str, value: &str) {
    let (key, value) = (key.trim(), value.trim());
    if !key.is_empty() && !value.is_empty() {
        map.insert(key.to_string(), value.to_string());
    }
}

/// Split `label：value` on the first full-width colon, or on the first ASCII
/// colon when no full-width one is present
pub fn split_label(text: &str) -> Option<(&str, &str)> {
    if text.contains('：') {
        text.split_once('：')
    } else {
        text.split_once(':')
    }
}

/// Listing timestamps, e.g. `[["最早上架时间：2025-09-08 16:56:26"]]`
pub struct TimestampsTransform;

impl FieldTransform for TimestampsTransform {
    fn key(&self) -> &'static str {
        FIELD_TIME
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let mut map = TextMap::new();
        for row in rows(FIELD_TIME, shape)? {
            if let Some((label, value)) = row.first().and_then(|cell| split_label(cell)) {
                insert_pair(&mut map, label, value);
            }
        }
        Ok((!map.is_empty()).then_some(FieldValue::Timestamps(map)))
    }
}

/// Sales counters: first cell is the label, second the value, the rest ignored
pub struct SalesTransform;

impl FieldTransform for SalesTransform {
    fn key(&self) -> &'static str {
        FIELD_SALES
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let mut map = TextMap::new();
        for row in rows(FIELD_SALES, shape)? {
            if let [label, value, ..] = row.as_slice() {
                insert_pair(&mut map, label, value);
            }
        }
        Ok((!map.is_empty()).then_some(FieldValue::Sales(map)))
    }
}

/// Attribute table: each row alternates label, value, label, value...
pub struct DetailsTransform;

impl FieldTransform for DetailsTransform {
    fn key(&self) -> &'static str {
        FIELD_DETAILS
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let mut map = TextMap::new();
        for row in rows(FIELD_DETAILS, shape)? {
            for pair in row.chunks_exact(2) {
                if pair[0].trim() == DETAILS_NEGATIVE_MARKER {
                    continue;
                }
                insert_pair(&mut map, &pair[0], &pair[1]);
            }
        }
        Ok((!map.is_empty()).then_some(FieldValue::Details(map)))
    }
}
