use super::{non_empty, unsupported, FieldTransform, FieldValue, TransformResult};
use crate::constants::{
    FIELD_DETAIL_IMAGES, FIELD_MAIN_IMAGES, FIELD_PRICE, FIELD_PRODUCT_URL, FIELD_TITLE,
};
use crate::error::FieldError;
use crate::pipeline::processing::normalize::shape::{RawItem, RawShape};

fn is_web_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Product title: first cell of a nested singleton list, or a plain string
pub struct TitleTransform;

impl FieldTransform for TitleTransform {
    fn key(&self) -> &'static str {
        FIELD_TITLE
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let title = match shape {
            RawShape::Text(text) | RawShape::Table(text) => text.as_str(),
            RawShape::NestedList(items) => match items.first() {
                Some(RawItem::Row(row)) => match row.first() {
                    Some(cell) => cell.as_str(),
                    None => return Ok(None),
                },
                _ => {
                    return Err(FieldError::Malformed {
                        field: FIELD_TITLE,
                        reason: "first element is not a list".to_string(),
                    })
                }
            },
            other => return Err(unsupported(FIELD_TITLE, other)),
        };
        Ok(non_empty(title).map(FieldValue::Title))
    }
}

/// Price label, e.g. `券后¥16.9\n\n首件预估到手价` becomes `券后¥16.9 首件预估到手价`
pub struct PriceTransform;

impl FieldTransform for PriceTransform {
    fn key(&self) -> &'static str {
        FIELD_PRICE
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let raw = match shape {
            RawShape::List(_) | RawShape::NestedList(_) => shape.first_leaf(),
            other => return Err(unsupported(FIELD_PRICE, other)),
        };
        let Some(raw) = raw else {
            return Ok(None);
        };
        Ok(non_empty(&collapse_newlines(raw)).map(FieldValue::Price))
    }
}

/// Runs of two or more line breaks become one space; single breaks are dropped
pub fn collapse_newlines(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for c in text.trim().chars() {
        if c == '\n' {
            run += 1;
            continue;
        }
        if run >= 2 {
            out.push(' ');
        }
        run = 0;
        out.push(c);
    }
    out
}

/// Product page link; anything without an http(s) scheme is discarded
pub struct ProductUrlTransform;

impl FieldTransform for ProductUrlTransform {
    fn key(&self) -> &'static str {
        FIELD_PRODUCT_URL
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        match shape {
            RawShape::Text(text) | RawShape::Table(text) => Ok(non_empty(text)
                .filter(|url| is_web_url(url))
                .map(FieldValue::ProductUrl)),
            other => Err(unsupported(FIELD_PRODUCT_URL, other)),
        }
    }
}

/// Main or detail image list
pub struct ImageListTransform {
    key: &'static str,
    wrap: fn(Vec<String>) -> FieldValue,
}

impl ImageListTransform {
    pub fn main() -> Self {
        Self {
            key: FIELD_MAIN_IMAGES,
            wrap: FieldValue::MainImages,
        }
    }

    pub fn detail() -> Self {
        Self {
            key: FIELD_DETAIL_IMAGES,
            wrap: FieldValue::DetailImages,
        }
    }
}

impl FieldTransform for ImageListTransform {
    fn key(&self) -> &'static str {
        self.key
    }

    fn transform(&self, shape: &RawShape) -> TransformResult {
        let candidates: Vec<&str> = match shape {
            RawShape::Text(text) | RawShape::Table(text) => vec![text.as_str()],
            RawShape::List(items) => items.iter().map(String::as_str).collect(),
            // nested rows never hold a bare URL
            RawShape::NestedList(items) => items
                .iter()
                .filter_map(|item| match item {
                    RawItem::Leaf(leaf) => Some(leaf.as_str()),
                    RawItem::Row(_) => None,
                })
                .collect(),
            other => return Err(unsupported(self.key, other)),
        };

        let urls: Vec<String> = candidates
            .into_iter()
            .map(str::trim)
            .filter(|url| is_web_url(url))
            .map(str::to_string)
            .collect();
        Ok((!urls.is_empty()).then(|| (self.wrap)(urls)))
    }
}
