// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod document;
mod episode;
mod podcast;

pub use document::{DocumentMetadata, PodcastDocument, SCHEMA_VERSION};
pub use episode::{
    Audio, CallToAction, DEFAULT_AUDIO_LENGTH, DEFAULT_AUDIO_TYPE, Episode, EpisodePatch,
    EpisodeType, Guid, GuidInput, NewAudio, NewEpisode, Transcript, UtmTags, sort_newest_first,
};
pub use podcast::{Category, Funding, Owner, PodcastInfo, PodcastInfoPatch, ShowType};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Current time in the RFC 2822 form used for `pubDate` and `lastBuildDate`
pub fn now_rfc2822() -> String {
    Utc::now().to_rfc2822()
}

/// Overwrite-if-present rule shared by the partial update records
pub(crate) fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn scalar_to_string<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(E::custom(format!("expected a string or number, found {other}"))),
    }
}

/// Accept a JSON string, number or boolean and keep it as a string.
///
/// Stored fields must never make a whole document unreadable, so `null` and
/// any other off-type value read as the empty string.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(scalar_to_string::<D::Error>(value)
        .ok()
        .flatten()
        .unwrap_or_default())
}

/// `true`, `"true"`/`"yes"` in any case, or a non-zero number; everything else is `false`
pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

/// Nested stored record; `null` or a value of the wrong shape reads as the default
pub(crate) fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(d)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like [`lenient_string`] but for client input: `null` maps to `None` and
/// objects or arrays are rejected
pub(crate) fn lenient_opt_string<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<String>, D::Error> {
    scalar_to_string(Value::deserialize(d)?)
}

fn value_to_keywords<E: serde::de::Error>(value: Value) -> Result<Option<Vec<String>>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(
            s.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect(),
        )),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => Err(E::custom(format!("expected a keyword string, found {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        other => Err(E::custom(format!(
            "expected a keyword list or comma separated string, found {other}"
        ))),
    }
}

/// Accept keywords either as a JSON array or as a comma separated string.
///
/// Stored keywords of any other shape read as an empty list.
pub(crate) fn keywords<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(value_to_keywords::<D::Error>(value)
        .ok()
        .flatten()
        .unwrap_or_default())
}

pub(crate) fn opt_keywords<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Vec<String>>, D::Error> {
    value_to_keywords(Value::deserialize(d)?)
}
