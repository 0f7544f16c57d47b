// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use rss::extension::itunes::{
    ITunesCategory, ITunesChannelExtension, ITunesItemExtension, ITunesOwner,
};
use rss::extension::{Extension, ExtensionMap};
use rss::{Channel, Enclosure, Guid, Item};

use crate::error::RenderError;
use crate::model::{Episode, PodcastDocument, PodcastInfo};

pub const ITUNES_NAMESPACE: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const PODCAST_NAMESPACE: &str = "https://podcastindex.org/namespace/1.0";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

pub const DEFAULT_TRANSCRIPT_TYPE: &str = "text/plain";
pub const CHAPTERS_TYPE: &str = "application/json+chapters";

const INDENT_SIZE: usize = 2;

/// Render the document as indented RSS XML
pub fn render_feed(document: &PodcastDocument) -> Result<String, RenderError> {
    let channel = build_channel(document);
    let bytes = channel.pretty_write_to(Vec::new(), b' ', INDENT_SIZE)?;
    Ok(String::from_utf8(bytes)?)
}

/// Project the document onto an RSS channel, items newest first
pub fn build_channel(document: &PodcastDocument) -> Channel {
    let info = &document.podcast;

    let namespaces = [
        ("atom", ATOM_NAMESPACE),
        ("itunes", ITUNES_NAMESPACE),
        ("podcast", PODCAST_NAMESPACE),
    ]
    .into_iter()
    .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
    .collect();

    let mut extensions = ExtensionMap::new();
    push_extension(
        &mut extensions,
        "atom",
        "link",
        None,
        &[
            ("href", info.feed_url().as_str()),
            ("rel", "self"),
            ("type", "application/rss+xml"),
        ],
    );
    push_extension(
        &mut extensions,
        "podcast",
        "funding",
        Some(info.funding.text.clone()),
        &[("url", info.funding.url.as_str())],
    );

    Channel {
        title: info.title.clone(),
        link: info.link.clone(),
        description: info.description.clone(),
        language: Some(info.language.clone()),
        copyright: Some(info.copyright.clone()),
        last_build_date: Some(info.last_build_date.clone()),
        items: document
            .episodes_newest_first()
            .iter()
            .map(build_item)
            .collect(),
        itunes_ext: Some(channel_itunes(info)),
        extensions,
        namespaces,
        ..Default::default()
    }
}

fn channel_itunes(info: &PodcastInfo) -> ITunesChannelExtension {
    let subcategory = Some(&info.category.secondary)
        .filter(|s| !s.is_empty())
        .map(|text| {
            Box::new(ITunesCategory {
                text: text.clone(),
                subcategory: None,
            })
        });

    ITunesChannelExtension {
        author: Some(info.author.clone()),
        explicit: Some(info.explicit.to_string()),
        owner: Some(ITunesOwner {
            name: Some(info.owner.name.clone()),
            email: Some(info.owner.email.clone()),
        }),
        image: Some(info.image.clone()),
        categories: vec![ITunesCategory {
            text: info.category.primary.clone(),
            subcategory,
        }],
        r#type: Some(info.show_type.as_str().to_string()),
        keywords: Some(info.keywords.join(",")),
        ..Default::default()
    }
}

fn build_item(episode: &Episode) -> Item {
    let mut extensions = ExtensionMap::new();

    if !episode.transcript.url.is_empty() {
        let mime_type = Some(episode.transcript.mime_type.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TRANSCRIPT_TYPE);
        push_extension(
            &mut extensions,
            "podcast",
            "transcript",
            None,
            &[("url", episode.transcript.url.as_str()), ("type", mime_type)],
        );
    }

    if !episode.chapters_url.is_empty() {
        push_extension(
            &mut extensions,
            "podcast",
            "chapters",
            None,
            &[
                ("url", episode.chapters_url.as_str()),
                ("type", CHAPTERS_TYPE),
            ],
        );
    }

    Item {
        title: Some(episode.title.clone()),
        description: Some(episode.description.clone()),
        enclosure: Some(Enclosure {
            url: episode.audio.url.clone(),
            length: episode.audio.length.clone(),
            mime_type: episode.audio.mime_type.clone(),
        }),
        guid: Some(Guid {
            value: episode.guid.value.clone(),
            permalink: episode.guid.is_permalink(),
        }),
        pub_date: Some(episode.pub_date.clone()),
        itunes_ext: Some(ITunesItemExtension {
            subtitle: Some(episode.subtitle.clone()),
            keywords: Some(episode.keywords.join(",")),
            season: Some(episode.season.clone()),
            episode: Some(episode.episode.clone()),
            episode_type: Some(episode.episode_type.as_str().to_string()),
            ..Default::default()
        }),
        extensions,
        ..Default::default()
    }
}

fn push_extension(
    extensions: &mut ExtensionMap,
    prefix: &str,
    name: &str,
    value: Option<String>,
    attrs: &[(&str, &str)],
) {
    let extension = Extension {
        name: format!("{prefix}:{name}"),
        value,
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children: BTreeMap::new(),
    };

    extensions
        .entry(prefix.to_string())
        .or_default()
        .entry(name.to_string())
        .or_default()
        .push(extension);
}
