//! Test fixtures for pipeline tests
//!
//! Builds scratch input trees and small MP3 stand-ins so tag handling and the
//! batch driver can be tested without an encoder installed.

#![cfg(test)]

use std::fs;
use std::path::{Path, PathBuf};

use id3::frame::{
    Comment, Content, ExtendedLink, ExtendedText, InvolvedPeopleList, InvolvedPeopleListItem,
    Picture, PictureType,
};
use id3::{Frame, Tag, TagLike, Version};

/// Title of the `write_messy_mp3` stand-in; not representable in Latin-1
pub const MESSY_TITLE: &str = "Papercut (Живьём)";

/// Fake MPEG frame header followed by padding; enough for the tag writer
const FAKE_AUDIO: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

/// Create an empty file (and its parent directories) under `root`
pub fn touch(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, b"").expect("Failed to create fixture file");
    path
}

/// Write an MP3 stand-in with no ID3 tag
pub fn write_untagged_mp3(path: &Path) {
    fs::write(path, FAKE_AUDIO).expect("Failed to write fixture audio");
}

/// Write an MP3 stand-in carrying every frame kind the firmware chokes on
///
/// A non-Latin-1 title, one comment, one TXXX, one WXXX, a described cover and
/// the v2.4-only frames ffmpeg emits (TDRC, TSOP, TIPL), saved as ID3v2.4.
pub fn write_messy_mp3(path: &Path) {
    write_untagged_mp3(path);

    let mut tag = Tag::new();
    tag.set_title(MESSY_TITLE);
    tag.set_artist("Linkin Park");
    tag.set_album("Hybrid Theory");
    tag.add_frame(Comment {
        lang: "eng".to_string(),
        description: String::new(),
        text: "Ripped with love".to_string(),
    });
    tag.add_frame(ExtendedText {
        description: "encoder".to_string(),
        value: "Lavf60.16.100".to_string(),
    });
    tag.add_frame(ExtendedLink {
        description: "store".to_string(),
        link: "http://example.com/album".to_string(),
    });
    tag.add_frame(Picture {
        mime_type: "image/jpeg".to_string(),
        picture_type: PictureType::CoverFront,
        description: "Cover (front)".to_string(),
        data: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9],
    });
    tag.add_frame(Frame::text("TDRC", "2000-10-24"));
    tag.add_frame(Frame::text("TSOP", "Linkin Park"));
    tag.add_frame(Frame::with_content(
        "TIPL",
        Content::InvolvedPeopleList(InvolvedPeopleList {
            items: vec![InvolvedPeopleListItem {
                involvement: "producer".to_string(),
                involvee: "Don Gilmore".to_string(),
            }],
        }),
    ));
    tag.write_to_path(path, Version::Id3v24)
        .expect("Failed to write fixture tag");
}
