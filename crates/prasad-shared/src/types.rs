use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

/// Free-form key/value pairs attached to an image at upload time
/// (`user_id`, `product_id`, `category_id`, ...).
pub type ImageMetadata = BTreeMap<String, String>;

/// Why an image was uploaded. Doubles as the storage sub-directory and the
/// listing filter, so the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    Profile,
    Product,
    Category,
}

impl ImageCategory {
    pub const ALL: [ImageCategory; 3] = [Self::Profile, Self::Product, Self::Category];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Product => "product",
            Self::Category => "category",
        }
    }

    /// Directory under the upload root holding files of this category.
    pub fn dir_name(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageCategory {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Self::Profile),
            "product" => Ok(Self::Product),
            "category" => Ok(Self::Category),
            other => Err(SharedError::UnknownCategory(other.to_string())),
        }
    }
}
