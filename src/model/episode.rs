// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp::Reverse;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    keywords, lenient_opt_string, lenient_string, now_rfc2822, opt_keywords, or_default,
    overwrite,
};
use crate::error::RepositoryError;

pub const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";
pub const DEFAULT_AUDIO_LENGTH: &str = "0";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    #[default]
    Full,
    Trailer,
    Bonus,
}

impl EpisodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Trailer => "trailer",
            Self::Bonus => "bonus",
        }
    }

    /// Case-insensitive lookup by the serialized name
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Full, Self::Trailer, Self::Bonus]
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Unknown names, and anything that is not a string, read as [`EpisodeType::Full`]
impl<'de> Deserialize<'de> for EpisodeType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(value
            .as_str()
            .and_then(Self::from_name)
            .unwrap_or_default())
    }
}

/// Episode identifier; `is_perma_link` is kept as the string the client sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guid {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default = "not_a_permalink", deserialize_with = "lenient_string")]
    pub is_perma_link: String,
}

impl Default for Guid {
    fn default() -> Self {
        Self {
            value: String::new(),
            is_perma_link: not_a_permalink(),
        }
    }
}

fn not_a_permalink() -> String {
    "false".to_string()
}

impl Guid {
    /// Fresh random GUID that is not a URL
    pub fn generate() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            is_perma_link: not_a_permalink(),
        }
    }

    /// Only the exact string `"true"` marks the GUID as a permalink
    pub fn is_permalink(&self) -> bool {
        self.is_perma_link == "true"
    }
}

/// The enclosure: audio file URL, MIME type and byte length
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audio {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub length: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmTags {
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub medium: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub campaign: String,
}

/// A stored episode.
///
/// Every field is optional on read: a missing, `null` or off-type value takes
/// its default so one odd episode never makes the document unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(default, deserialize_with = "or_default")]
    pub guid: Guid,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// RFC 2822 publication date
    #[serde(default, deserialize_with = "lenient_string")]
    pub pub_date: String,
    #[serde(default, deserialize_with = "or_default")]
    pub audio: Audio,
    #[serde(default, deserialize_with = "lenient_string")]
    pub season: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub episode: String,
    #[serde(default)]
    pub episode_type: EpisodeType,
    #[serde(default, deserialize_with = "or_default")]
    pub transcript: Transcript,
    #[serde(default, deserialize_with = "lenient_string")]
    pub chapters_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "keywords")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub links: String,
    #[serde(default, deserialize_with = "or_default")]
    pub cta: CallToAction,
    #[serde(default, deserialize_with = "or_default")]
    pub utm: UtmTags,
    /// Opaque payload for dynamic ad insertion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_insertion: Option<Value>,
}

impl Episode {
    /// Parsed publication date, `None` when the stored string is not a date
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(&self.pub_date)
            .ok()
            .or_else(|| parse_relaxed_date(&self.pub_date))
    }
}

/// Try to parse dates that don't strictly conform to RFC 2822
fn parse_relaxed_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt);
    }

    let formats = ["%a, %d %b %Y %H:%M:%S %z", "%Y-%m-%d %H:%M:%S %z"];
    formats
        .iter()
        .find_map(|format| DateTime::parse_from_str(date_str, format).ok())
}

/// Order episodes by publication date, newest first.
///
/// Episodes without a parseable date go last; equal dates keep their stored order.
pub fn sort_newest_first(episodes: &mut [Episode]) {
    episodes.sort_by_cached_key(|episode| Reverse(episode.published_at()));
}

/// GUID as supplied on creation; a missing permalink flag means `"false"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidInput {
    #[serde(default)]
    pub value: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub is_perma_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewAudio {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub length: Option<String>,
}

/// Fields accepted when creating an episode
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEpisode {
    pub guid: Option<GuidInput>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    pub audio: Option<NewAudio>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub episode: Option<String>,
    pub episode_type: Option<EpisodeType>,
    pub transcript: Option<Transcript>,
    pub chapters_url: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "opt_keywords")]
    pub keywords: Option<Vec<String>>,
    pub links: Option<String>,
    pub cta: Option<CallToAction>,
    pub utm: Option<UtmTags>,
    pub ad_insertion: Option<Value>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RepositoryError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(RepositoryError::Validation { field })
}

impl NewEpisode {
    /// Validate the required fields and fill in defaults for everything else
    pub fn into_episode(self) -> Result<Episode, RepositoryError> {
        let title = required(self.title, "title")?;
        let description = required(self.description, "description")?;
        let audio = self.audio.unwrap_or_default();
        let audio_url = required(audio.url, "audio.url")?;

        let guid = match self.guid {
            Some(guid) if !guid.value.is_empty() => Guid {
                value: guid.value,
                is_perma_link: guid.is_perma_link.unwrap_or_else(not_a_permalink),
            },
            _ => Guid::generate(),
        };

        Ok(Episode {
            guid,
            title,
            description,
            pub_date: self
                .pub_date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(now_rfc2822),
            audio: Audio {
                url: audio_url,
                mime_type: audio
                    .mime_type
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_AUDIO_TYPE.to_string()),
                length: audio
                    .length
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| DEFAULT_AUDIO_LENGTH.to_string()),
            },
            season: self.season.unwrap_or_default(),
            episode: self.episode.unwrap_or_default(),
            episode_type: self.episode_type.unwrap_or_default(),
            transcript: self.transcript.unwrap_or_default(),
            chapters_url: self.chapters_url.unwrap_or_default(),
            subtitle: self.subtitle.unwrap_or_default(),
            keywords: self.keywords.unwrap_or_default(),
            links: self.links.unwrap_or_default(),
            cta: self.cta.unwrap_or_default(),
            utm: self.utm.unwrap_or_default(),
            ad_insertion: self.ad_insertion,
        })
    }
}

/// Partial episode update.
///
/// Present fields overwrite the stored ones; nested records such as `audio`
/// or `guid` are replaced whole, never merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodePatch {
    pub guid: Option<Guid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    pub audio: Option<Audio>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub episode: Option<String>,
    pub episode_type: Option<EpisodeType>,
    pub transcript: Option<Transcript>,
    pub chapters_url: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "opt_keywords")]
    pub keywords: Option<Vec<String>>,
    pub links: Option<String>,
    pub cta: Option<CallToAction>,
    pub utm: Option<UtmTags>,
    pub ad_insertion: Option<Value>,
}

impl EpisodePatch {
    pub fn apply_to(self, episode: &mut Episode) {
        overwrite(&mut episode.guid, self.guid);
        overwrite(&mut episode.title, self.title);
        overwrite(&mut episode.description, self.description);
        overwrite(&mut episode.pub_date, self.pub_date);
        overwrite(&mut episode.audio, self.audio);
        overwrite(&mut episode.season, self.season);
        overwrite(&mut episode.episode, self.episode);
        overwrite(&mut episode.episode_type, self.episode_type);
        overwrite(&mut episode.transcript, self.transcript);
        overwrite(&mut episode.chapters_url, self.chapters_url);
        overwrite(&mut episode.subtitle, self.subtitle);
        overwrite(&mut episode.keywords, self.keywords);
        overwrite(&mut episode.links, self.links);
        overwrite(&mut episode.cta, self.cta);
        overwrite(&mut episode.utm, self.utm);
        if self.ad_insertion.is_some() {
            episode.ad_insertion = self.ad_insertion;
        }
    }
}
