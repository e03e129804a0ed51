use super::fields::{
    CompanyDetailTransform, CompanySummaryTransform, DetailsTransform, FieldTransform,
    ImageListTransform, PackageWeightTransform, PriceTransform, ProductUrlTransform,
    SalesTransform, SkuTransform, TimestampsTransform, TitleTransform,
};

/// Ordered table of field transforms applied to every record
pub struct FieldRegistry {
    transforms: Vec<Box<dyn FieldTransform>>,
}

impl FieldRegistry {
    /// Registry with every product sheet column, in output order
    pub fn new() -> Self {
        let transforms: Vec<Box<dyn FieldTransform>> = vec![
            Box::new(TitleTransform),
            Box::new(TimestampsTransform),
            Box::new(PriceTransform),
            Box::new(SalesTransform),
            Box::new(DetailsTransform),
            Box::new(PackageWeightTransform),
            Box::new(ImageListTransform::main()),
            Box::new(ImageListTransform::detail()),
            Box::new(SkuTransform),
            Box::new(ProductUrlTransform),
            Box::new(CompanySummaryTransform),
            Box::new(CompanyDetailTransform),
        ];
        Self { transforms }
    }

    /// Empty registry, for callers that pick their own columns
    pub fn empty() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Add a transform, replacing any registered for the same column
    pub fn register(&mut self, transform: Box<dyn FieldTransform>) {
        match self.transforms.iter().position(|t| t.key() == transform.key()) {
            Some(index) => self.transforms[index] = transform,
            None => self.transforms.push(transform),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn FieldTransform> {
        self.transforms.iter().map(|t| t.as_ref())
    }

    /// Column names handled, in application order
    pub fn keys(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.key()).collect()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FIELD_COMPANY_DETAIL, FIELD_PRICE, FIELD_TITLE};

    #[test]
    fn test_registry_covers_every_column_in_order() {
        let registry = FieldRegistry::new();
        let keys = registry.keys();

        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], FIELD_TITLE);
        assert_eq!(keys[11], FIELD_COMPANY_DETAIL);
    }

    #[test]
    fn test_register_replaces_same_column() {
        let mut registry = FieldRegistry::empty();
        registry.register(Box::new(PriceTransform));
        registry.register(Box::new(TitleTransform));
        registry.register(Box::new(PriceTransform));

        assert_eq!(registry.keys(), vec![FIELD_PRICE, FIELD_TITLE]);
    }
}
