use serde::{Deserialize, Serialize};

/// Remote table receiving marketplace sold-listing prices. Append-only.
pub const PRICE_TABLE: &str = "price_data";

/// Remote table receiving operational errors. Append-only, never cleared.
pub const ERROR_TABLE: &str = "error_log";

/// Remote table holding the column-oriented keyword configuration.
pub const KEYWORD_TABLE: &str = "keywords";

/// One of the five keyword groupings tracked by the pipeline.
///
/// Each category owns a dedicated trend table in the remote store and a column
/// in the remote keyword configuration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Brands,
    VintageBrands,
    Colors,
    Styles,
    Textures,
}

impl Category {
    /// Fixed collection order for a run.
    pub const ALL: [Category; 5] = [
        Category::Brands,
        Category::VintageBrands,
        Category::Colors,
        Category::Styles,
        Category::Textures,
    ];

    /// Name of this category's trend table in the remote store.
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            Category::Brands => "brand_trends",
            Category::VintageBrands => "vintage_brand_trends",
            Category::Colors => "color_trends",
            Category::Styles => "style_trends",
            Category::Textures => "texture_trends",
        }
    }

    /// Column index of this category in the remote keyword table.
    ///
    /// The keyword table is column-oriented: textures, colors, styles, brands,
    /// vintage brands, in that order. Columns may have unequal lengths.
    #[must_use]
    pub fn keyword_column(self) -> usize {
        match self {
            Category::Textures => 0,
            Category::Colors => 1,
            Category::Styles => 2,
            Category::Brands => 3,
            Category::VintageBrands => 4,
        }
    }

    /// Hardcoded fallback keywords, used when both the local cache and the
    /// remote keyword table come up empty for this category.
    #[must_use]
    pub fn defaults(self) -> &'static [&'static str] {
        match self {
            Category::Brands => &[
                "Hermès bag",
                "Chanel bag",
                "Louis Vuitton bag",
                "Gucci bag",
                "Prada bag",
                "Bottega Veneta bag",
            ],
            Category::VintageBrands => &[
                "vintage Hermès bag",
                "vintage Chanel bag",
                "vintage Louis Vuitton bag",
                "vintage Gucci bag",
                "vintage Prada bag",
                "vintage Bottega Veneta bag",
            ],
            Category::Colors => &[
                "black bag",
                "brown bag",
                "beige bag",
                "white bag",
                "green bag",
                "red bag",
                "blue bag",
                "pink bag",
            ],
            Category::Styles => &[
                "shoulder bag",
                "tote bag",
                "crossbody bag",
                "clutch bag",
                "bucket bag",
                "satchel bag",
            ],
            Category::Textures => &[
                "leather bag",
                "quilted bag",
                "canvas bag",
                "suede bag",
                "patent leather bag",
                "woven bag",
            ],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Brands => write!(f, "brands"),
            Category::VintageBrands => write!(f, "vintage-brands"),
            Category::Colors => write!(f, "colors"),
            Category::Styles => write!(f, "styles"),
            Category::Textures => write!(f, "textures"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brands" => Ok(Category::Brands),
            "vintage-brands" | "vintage_brands" => Ok(Category::VintageBrands),
            "colors" => Ok(Category::Colors),
            "styles" => Ok(Category::Styles),
            "textures" => Ok(Category::Textures),
            other => Err(format!(
                "unknown category \"{other}\" (expected one of: brands, vintage-brands, colors, styles, textures)"
            )),
        }
    }
}
