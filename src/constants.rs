/// Column names of the scraped product sheets. These are the keys of both the
/// raw rows and the normalized records, so they stay in the sheet's language.
pub const FIELD_TITLE: &str = "商品标题";
pub const FIELD_TIME: &str = "时间";
pub const FIELD_PRICE: &str = "价格";
pub const FIELD_SALES: &str = "销售";
pub const FIELD_DETAILS: &str = "商品详情";
pub const FIELD_PACKAGE_WEIGHT: &str = "包装重量";
pub const FIELD_MAIN_IMAGES: &str = "主产品图片";
pub const FIELD_DETAIL_IMAGES: &str = "商品详情图片";
pub const FIELD_SKU: &str = "sku商品详情图片和信息";
pub const FIELD_PRODUCT_URL: &str = "产品网址";
pub const FIELD_COMPANY_SUMMARY: &str = "公司基本信息";
pub const FIELD_COMPANY_DETAIL: &str = "公司详情信息";

/// Default required-field list used by the completeness filter.
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &[
    FIELD_TITLE,
    FIELD_TIME,
    FIELD_PRICE,
    FIELD_SALES,
    FIELD_DETAILS,
    FIELD_MAIN_IMAGES,
    FIELD_DETAIL_IMAGES,
    FIELD_SKU,
    FIELD_PRODUCT_URL,
    FIELD_COMPANY_SUMMARY,
];

// Company summary markers, matched in the scraped card text
pub const COMPANY_REPEAT_RATE: &str = "回头率";
pub const COMPANY_PRIMARY_BUSINESS: &str = "主营";
pub const COMPANY_FOUNDED: &str = "成立时间";

/// Product-detail keys equal to this marker are scraped "no" cells, not labels.
pub const DETAILS_NEGATIVE_MARKER: &str = "否";

/// Trailing link text on the company intro block ("enter yellow pages").
pub const COMPANY_INTRO_TRAILER: &str = "进入黄页";

/// First-line tokens of the two company-detail page layouts.
pub const DETAIL_FLAT_HEADER: &str = "经营模式";
pub const DETAIL_BASIC_SECTION: &str = "基本信息";
pub const DETAIL_INDUSTRY_SECTION: &str = "行业信息";
pub const DETAIL_BUSINESS_SECTION: &str = "经营信息";

/// SKU table placeholder for "no price".
pub const SKU_PRICE_PLACEHOLDER: &str = "--";

/// Unit markers in packaging-table headers whose values are integers.
pub const PACKAGE_UNIT_MARKERS: &[&str] = &["(cm)", "(cm³)", "(g)"];
