// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod generator;
mod render;

pub use generator::FeedGenerator;
pub use render::{
    ATOM_NAMESPACE, CHAPTERS_TYPE, DEFAULT_TRANSCRIPT_TYPE, ITUNES_NAMESPACE, PODCAST_NAMESPACE,
    build_channel, render_feed,
};
