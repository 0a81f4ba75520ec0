use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub url: String,
    pub weight: u32,
}

impl CatalogItem {
    pub fn new(name: &str, url: &str, weight: u32) -> Self {
        CatalogItem {
            name: name.to_string(),
            url: url.to_string(),
            weight,
        }
    }
}

const DISHES: &[(&str, &str, u32)] = &[
    (
        "Cơm rang hoặc phở",
        "https://assets.unileversolutions.com/v1/1187779.jpg",
        3,
    ),
    (
        "Cơm ngon Bắc Giang",
        "https://bazantravel.com/cdn/medias/uploads/85/85768-an-toi-nha-trang-oc-chao-700x394.jpg",
        3,
    ),
    (
        "Cơm sườn",
        "https://inhat.vn/wp-content/uploads/2022/03/com-van-phong-bac-ninh-7-min.jpg",
        3,
    ),
    (
        "Cơm như ý ",
        "https://afamilycdn.com/2018/10/15/ava-ngang-1-1539616620729517899602.jpg",
        3,
    ),
    (
        "bún bò huế",
        "https://vnaroma.com/wp-content/uploads/2020/10/bi-quyet-chuan-bi-gia-vi-nau-bun-bo-hue-chuan-vi-01.jpg",
        1,
    ),
    (
        "Bún 2 chị sinh đôi",
        "https://cdn.tgdd.vn/Files/2020/04/03/1246339/cach-nau-bun-ca-ha-noi-thom-ngon-chuan-vi-khong-ta-13.jpg",
        1,
    ),
    (
        "Bún đậu",
        "https://bizweb.dktcdn.net/100/514/078/products/chuyen-de-bun-dau-man-tom-rosa-bien-hoa-dong-nai-10-1714982875768-071b3ef1-f2ab-4f58-9725-6c92fc74a290-eb47202d-864b-400b-bffb-ae095ddcfbdd.jpg?v=1716988391733",
        1,
    ),
];

/// The compiled-in catalog, in declaration order.
pub fn default_catalog() -> Vec<CatalogItem> {
    DISHES
        .iter()
        .map(|(name, url, weight)| CatalogItem::new(name, url, *weight))
        .collect()
}

/// Check a catalog is usable for selection and return its total weight.
pub fn validate(catalog: &[CatalogItem]) -> Result<u64, Error> {
    if catalog.is_empty() {
        return Err(Error::InvalidCatalog("catalog is empty".into()));
    }
    let mut total = 0u64;
    for (i, item) in catalog.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(Error::InvalidCatalog(format!("item {} has no name", i)));
        }
        if item.weight == 0 {
            return Err(Error::InvalidCatalog(format!(
                "item {:?} has zero weight",
                item.name
            )));
        }
        total += u64::from(item.weight);
    }
    Ok(total)
}
