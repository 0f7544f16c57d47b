// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{lenient_bool, lenient_string, now_rfc2822, opt_keywords, or_default, overwrite};

/// Whether episodes are meant to be consumed in any order or in sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowType {
    #[default]
    Episodic,
    Serial,
}

impl ShowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Serial => "serial",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Episodic, Self::Serial]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Unknown names read as [`ShowType::Episodic`]
impl<'de> Deserialize<'de> for ShowType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value
            .as_str()
            .and_then(Self::from_name)
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "lenient_string")]
    pub primary: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub secondary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funding {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
}

/// Show-level metadata rendered into the feed's channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastInfo {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    /// Canonical site URL; the feed lives at `<link>/feed.xml`
    #[serde(deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(deserialize_with = "lenient_string")]
    pub language: String,
    #[serde(deserialize_with = "lenient_string")]
    pub copyright: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub explicit: bool,
    #[serde(deserialize_with = "or_default")]
    pub owner: Owner,
    #[serde(deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(deserialize_with = "or_default")]
    pub category: Category,
    /// Stamped by the server on every mutation
    #[serde(deserialize_with = "lenient_string")]
    pub last_build_date: String,
    pub show_type: ShowType,
    #[serde(deserialize_with = "super::keywords")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "or_default")]
    pub funding: Funding,
}

impl Default for PodcastInfo {
    fn default() -> Self {
        Self {
            title: "My Podcast".to_string(),
            link: "https://example.com".to_string(),
            language: "en-us".to_string(),
            copyright: "© My Podcast".to_string(),
            description: "A podcast about interesting things".to_string(),
            author: "Podcast Author".to_string(),
            explicit: false,
            owner: Owner {
                name: "Podcast Author".to_string(),
                email: "podcast@example.com".to_string(),
            },
            image: "https://example.com/cover.jpg".to_string(),
            category: Category {
                primary: "Technology".to_string(),
                secondary: String::new(),
            },
            last_build_date: now_rfc2822(),
            show_type: ShowType::Episodic,
            keywords: Vec::new(),
            funding: Funding::default(),
        }
    }
}

impl PodcastInfo {
    /// URL the published feed is served from
    pub fn feed_url(&self) -> String {
        format!("{}/feed.xml", self.link.trim_end_matches('/'))
    }
}

/// Partial update of [`PodcastInfo`]; `last_build_date` is not client-settable
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PodcastInfoPatch {
    pub title: Option<String>,
    pub link: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub explicit: Option<bool>,
    pub owner: Option<Owner>,
    pub image: Option<String>,
    pub category: Option<Category>,
    pub show_type: Option<ShowType>,
    #[serde(default, deserialize_with = "opt_keywords")]
    pub keywords: Option<Vec<String>>,
    pub funding: Option<Funding>,
}

impl PodcastInfoPatch {
    /// Overwrite every field present in the patch; nested records are replaced whole
    pub fn apply_to(self, info: &mut PodcastInfo) {
        overwrite(&mut info.title, self.title);
        overwrite(&mut info.link, self.link);
        overwrite(&mut info.language, self.language);
        overwrite(&mut info.copyright, self.copyright);
        overwrite(&mut info.description, self.description);
        overwrite(&mut info.author, self.author);
        overwrite(&mut info.explicit, self.explicit);
        overwrite(&mut info.owner, self.owner);
        overwrite(&mut info.image, self.image);
        overwrite(&mut info.category, self.category);
        overwrite(&mut info.show_type, self.show_type);
        overwrite(&mut info.keywords, self.keywords);
        overwrite(&mut info.funding, self.funding);
    }
}
