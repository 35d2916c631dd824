//! `[minify]` section configuration.
//!
//! ```toml
//! [minify]
//! enable = true
//! keep_special_comments = 0   # 0 none | 1 first | 2 or "*" all
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::minify::SpecialComments;
use crate::pipeline::MinifyOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyConfig {
    pub enable: bool,

    #[serde(deserialize_with = "deserialize_special_comments")]
    pub keep_special_comments: SpecialComments,
}

impl MinifyConfig {
    pub fn options(&self) -> MinifyOptions {
        MinifyOptions {
            keep_special_comments: self.keep_special_comments,
        }
    }
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            enable: true,
            keep_special_comments: SpecialComments::None,
        }
    }
}

/// Accept `0`, `1`, `2`, `"*"` or a policy name.
fn deserialize_special_comments<'de, D>(deserializer: D) -> Result<SpecialComments, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(i64),
        Text(String),
    }

    let text = match Raw::deserialize(deserializer)? {
        Raw::Count(n) => n.to_string(),
        Raw::Text(s) => s,
    };
    text.parse().map_err(serde::de::Error::custom)
}
