//! Tag normalization for Walkman firmware
//!
//! The Walkman 2.0 tag parser is the lowest common denominator across Sony
//! Ericsson players, so files are rewritten to what it accepts:
//! - no comment, user-defined text or user-defined URL frames
//! - cover art without a description (art is not shown when one is present)
//! - exactly one marker comment (art is not shown when there is no comment)
//! - ID3v2.3 container, with the v2.4 frames ffmpeg writes converted or removed

use std::path::Path;

use id3::frame::{Comment, Content, InvolvedPeopleList};
use id3::{Encoding, ErrorKind, Frame, Tag, TagLike, Timestamp, Version};

use crate::error::{Error, Result};

/// Text of the marker comment written into every converted file
pub const MARKER_TEXT: &str = "SEMP3FIXED";

/// Language code of the marker comment
const MARKER_LANG: &str = "XXX";

/// Tag version understood by the firmware
pub const TAG_VERSION: Version = Version::Id3v23;

/// Frames introduced by ID3v2.4 that have no v2.3 counterpart
const V24_ONLY_FRAMES: &[&str] = &[
    "ASPI", "EQU2", "RVA2", "SEEK", "SIGN", "TDEN", "TDRL", "TDTG", "TMOO", "TPRO", "TSOA",
    "TSOP", "TSOT", "TSST",
];

/// Frame kinds the normalizer cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCategory {
    /// COMM
    Comment,
    /// TXXX
    UserText,
    /// WXXX
    UserUrl,
    /// APIC
    Picture,
    Other,
}

impl FrameCategory {
    /// Classify a frame by its decoded content
    ///
    /// Frames the library could not decode fall back to their frame id.
    pub fn of(frame: &Frame) -> Self {
        match frame.content() {
            Content::Comment(_) => FrameCategory::Comment,
            Content::ExtendedText(_) => FrameCategory::UserText,
            Content::ExtendedLink(_) => FrameCategory::UserUrl,
            Content::Picture(_) => FrameCategory::Picture,
            _ => Self::from_id(frame.id()),
        }
    }

    fn from_id(id: &str) -> Self {
        match id {
            "COMM" | "COM" => FrameCategory::Comment,
            "TXXX" | "TXX" => FrameCategory::UserText,
            "WXXX" | "WXX" => FrameCategory::UserUrl,
            "APIC" | "PIC" => FrameCategory::Picture,
            _ => FrameCategory::Other,
        }
    }

    /// Whether frames of this kind are removed outright
    pub fn is_stripped(self) -> bool {
        matches!(
            self,
            FrameCategory::Comment | FrameCategory::UserText | FrameCategory::UserUrl
        )
    }
}

/// What `normalize_tag` changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub removed_comments: usize,
    pub removed_user_texts: usize,
    pub removed_user_urls: usize,
    /// Pictures whose description was cleared
    pub cleaned_pictures: usize,
    /// Picture frames that could not be decoded and were dropped
    pub dropped_pictures: usize,
    /// v2.4 frames rewritten as their v2.3 equivalents (TDRC, TDOR, TIPL, TMCL)
    pub converted_v24_frames: usize,
    /// v2.4 frames with no v2.3 equivalent
    pub dropped_v24_frames: usize,
    /// The file had no ID3 tag and got a fresh one
    pub new_tag: bool,
}

impl NormalizeReport {
    fn record_removed(&mut self, category: FrameCategory) {
        match category {
            FrameCategory::Comment => self.removed_comments += 1,
            FrameCategory::UserText => self.removed_user_texts += 1,
            FrameCategory::UserUrl => self.removed_user_urls += 1,
            FrameCategory::Picture | FrameCategory::Other => {}
        }
    }
}

/// The marker comment added to every file
pub fn marker_comment() -> Comment {
    Comment {
        lang: MARKER_LANG.to_string(),
        description: String::new(),
        text: MARKER_TEXT.to_string(),
    }
}

/// Build the normalized copy of a tag
///
/// Frames keep their original order; the marker comment comes last.
pub fn normalize_tag(tag: &Tag) -> (Tag, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let mut normalized = Tag::with_version(TAG_VERSION);
    let mut people = InvolvedPeopleList { items: Vec::new() };

    for frame in tag.frames() {
        match FrameCategory::of(frame) {
            category if category.is_stripped() => report.record_removed(category),
            FrameCategory::Picture => match frame.content() {
                Content::Picture(picture) => {
                    let mut picture = picture.clone();
                    if !picture.description.is_empty() {
                        picture.description.clear();
                        report.cleaned_pictures += 1;
                    }
                    normalized.add_frame(picture);
                }
                _ => report.dropped_pictures += 1,
            },
            _ => downgrade_frame(frame, &mut normalized, &mut people, &mut report),
        }
    }

    if !people.items.is_empty() {
        normalized.add_frame(Frame::with_content(
            "IPLS",
            Content::InvolvedPeopleList(people),
        ));
    }

    normalized.add_frame(marker_comment());
    (normalized, report)
}

/// Copy one kept frame into `normalized`, rewriting v2.4-only frames
///
/// TDRC becomes TYER/TDAT/TIME, TDOR becomes TORY, TIPL and TMCL are merged
/// into `people` (written as a single IPLS). Other v2.4-only frames are dropped
/// and v2.4-only text encodings are reset.
fn downgrade_frame(
    frame: &Frame,
    normalized: &mut Tag,
    people: &mut InvolvedPeopleList,
    report: &mut NormalizeReport,
) {
    match frame.id() {
        "TDRC" => match frame_timestamp(frame) {
            Some(ts) => {
                normalized.add_frame(Frame::text("TYER", format!("{:04}", ts.year)));
                if let (Some(month), Some(day)) = (ts.month, ts.day) {
                    normalized.add_frame(Frame::text("TDAT", format!("{:02}{:02}", day, month)));
                }
                if let (Some(hour), Some(minute)) = (ts.hour, ts.minute) {
                    normalized.add_frame(Frame::text("TIME", format!("{:02}{:02}", hour, minute)));
                }
                report.converted_v24_frames += 1;
            }
            None => report.dropped_v24_frames += 1,
        },
        "TDOR" => match frame_timestamp(frame) {
            Some(ts) => {
                normalized.add_frame(Frame::text("TORY", format!("{:04}", ts.year)));
                report.converted_v24_frames += 1;
            }
            None => report.dropped_v24_frames += 1,
        },
        "TIPL" | "TMCL" => match frame.content() {
            Content::InvolvedPeopleList(list) => {
                people.items.extend(list.items.iter().cloned());
                report.converted_v24_frames += 1;
            }
            _ => report.dropped_v24_frames += 1,
        },
        id if V24_ONLY_FRAMES.contains(&id) => report.dropped_v24_frames += 1,
        _ => {
            // UTF-8 and UTF-16BE are v2.4 encodings; unset lets the writer pick
            let frame = match frame.encoding() {
                Some(Encoding::UTF8 | Encoding::UTF16BE) => frame.clone().set_encoding(None),
                _ => frame.clone(),
            };
            normalized.add_frame(frame);
        }
    }
}

/// First timestamp of a TDRC/TDOR frame
fn frame_timestamp(frame: &Frame) -> Option<Timestamp> {
    let text = frame.content().text()?;
    text.split('\0').next()?.trim().parse().ok()
}

/// Normalize the tag of an MP3 file in place
///
/// A file without a tag gets a fresh one holding only the marker comment.
pub fn normalize_tags(path: &Path) -> Result<NormalizeReport> {
    let (tag, new_tag) = match Tag::read_from_path(path) {
        Ok(tag) => (tag, false),
        Err(e) if matches!(e.kind, ErrorKind::NoTag) => (Tag::new(), true),
        Err(e) => {
            return Err(Error::Tag {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let (normalized, mut report) = normalize_tag(&tag);
    report.new_tag = new_tag;

    normalized
        .write_to_path(path, TAG_VERSION)
        .map_err(|e| Error::Tag {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{MESSY_TITLE, write_messy_mp3, write_untagged_mp3};
    use id3::frame::{ExtendedLink, ExtendedText, InvolvedPeopleListItem, Picture, PictureType};

    fn comment(desc: &str, text: &str) -> Comment {
        Comment {
            lang: "eng".to_string(),
            description: desc.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_frame_category_by_content() {
        let frame: Frame = comment("", "hi").into();
        assert_eq!(FrameCategory::of(&frame), FrameCategory::Comment);

        let frame: Frame = ExtendedText {
            description: "ENCODER".to_string(),
            value: "x".to_string(),
        }
        .into();
        assert_eq!(FrameCategory::of(&frame), FrameCategory::UserText);

        let frame: Frame = ExtendedLink {
            description: "shop".to_string(),
            link: "http://example.com".to_string(),
        }
        .into();
        assert_eq!(FrameCategory::of(&frame), FrameCategory::UserUrl);

        let frame = Frame::text("TIT2", "Papercut");
        assert_eq!(FrameCategory::of(&frame), FrameCategory::Other);
    }

    #[test]
    fn test_frame_category_falls_back_to_id() {
        assert_eq!(FrameCategory::from_id("COMM"), FrameCategory::Comment);
        assert_eq!(FrameCategory::from_id("TXX"), FrameCategory::UserText);
        assert_eq!(FrameCategory::from_id("WXXX"), FrameCategory::UserUrl);
        assert_eq!(FrameCategory::from_id("APIC"), FrameCategory::Picture);
        assert_eq!(FrameCategory::from_id("TALB"), FrameCategory::Other);
        assert!(FrameCategory::Comment.is_stripped());
        assert!(!FrameCategory::Picture.is_stripped());
        assert!(!FrameCategory::Other.is_stripped());
    }

    #[test]
    fn test_normalize_tag_strips_and_marks() {
        let mut tag = Tag::new();
        tag.set_title("Papercut");
        tag.add_frame(comment("", "ripped by someone"));
        tag.add_frame(comment("iTunNORM", "0000"));
        tag.add_frame(ExtendedText {
            description: "ENCODER".to_string(),
            value: "LAME".to_string(),
        });
        tag.add_frame(ExtendedLink {
            description: "shop".to_string(),
            link: "http://example.com".to_string(),
        });
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "Front Cover".to_string(),
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
        });

        let (normalized, report) = normalize_tag(&tag);

        assert_eq!(report.removed_comments, 2);
        assert_eq!(report.removed_user_texts, 1);
        assert_eq!(report.removed_user_urls, 1);
        assert_eq!(report.cleaned_pictures, 1);
        assert_eq!(report.dropped_pictures, 0);

        let comments: Vec<_> = normalized.comments().collect();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, MARKER_TEXT);
        assert_eq!(comments[0].description, "");
        assert_eq!(normalized.extended_texts().count(), 0);
        assert_eq!(normalized.extended_links().count(), 0);

        let pictures: Vec<_> = normalized.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].description, "");
        assert_eq!(pictures[0].data, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(pictures[0].picture_type, PictureType::CoverFront);

        assert_eq!(normalized.title(), Some("Papercut"));
    }

    #[test]
    fn test_normalize_tag_is_idempotent() {
        let mut tag = Tag::new();
        tag.set_artist("Linkin Park");
        tag.add_frame(comment("", "old"));
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "cover".to_string(),
            data: vec![1, 2, 3],
        });

        let (once, _) = normalize_tag(&tag);
        let (twice, report) = normalize_tag(&once);

        assert_eq!(once.frames().count(), twice.frames().count());
        for (a, b) in once.frames().zip(twice.frames()) {
            assert_eq!(a, b);
        }
        assert_eq!(report.removed_comments, 1);
        assert_eq!(report.cleaned_pictures, 0);
    }

    #[test]
    fn test_normalize_empty_tag_adds_only_marker() {
        let (normalized, report) = normalize_tag(&Tag::new());
        assert_eq!(report, NormalizeReport::default());
        assert_eq!(normalized.frames().count(), 1);
        assert_eq!(normalized.comments().next().map(|c| c.text.as_str()), Some(MARKER_TEXT));
    }

    /// Frame ids and text-encoding bytes of the ID3v2.3 tag at the start of a file
    fn raw_v23_frames(path: &Path) -> Vec<(String, u8)> {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..3], b"ID3");
        assert_eq!(bytes[3], 3, "major version byte");

        let size = bytes[6..10]
            .iter()
            .fold(0usize, |acc, b| (acc << 7) | (*b as usize & 0x7F));
        let body = &bytes[10..10 + size];

        let mut frames = Vec::new();
        let mut pos = 0;
        while pos + 10 <= body.len() && body[pos] != 0 {
            let id = String::from_utf8_lossy(&body[pos..pos + 4]).into_owned();
            let len = u32::from_be_bytes([body[pos + 4], body[pos + 5], body[pos + 6], body[pos + 7]])
                as usize;
            frames.push((id, body[pos + 10]));
            pos += 10 + len;
        }
        frames
    }

    #[test]
    fn test_normalize_tags_rewrites_file_as_v23() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_messy_mp3(&path);

        let report = normalize_tags(&path).unwrap();
        assert_eq!(report.removed_comments, 1);
        assert_eq!(report.cleaned_pictures, 1);
        assert_eq!(report.converted_v24_frames, 2);
        assert_eq!(report.dropped_v24_frames, 1);
        assert!(!report.new_tag);

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.version(), Version::Id3v23);
        assert_eq!(tag.title(), Some(MESSY_TITLE));
        let comments: Vec<_> = tag.comments().collect();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, MARKER_TEXT);
        assert_eq!(tag.extended_texts().count(), 0);
        assert_eq!(tag.extended_links().count(), 0);
        assert!(tag.pictures().all(|p| p.description.is_empty()));
        assert_eq!(tag.pictures().count(), 1);
        assert_eq!(tag.get("TYER").and_then(|f| f.content().text()), Some("2000"));
        assert_eq!(tag.get("TDAT").and_then(|f| f.content().text()), Some("2410"));
        let people = tag
            .get("IPLS")
            .and_then(|f| f.content().involved_people_list())
            .unwrap();
        assert_eq!(people.items[0].involvee, "Don Gilmore");
    }

    #[test]
    fn test_written_tag_has_only_v23_frames_and_encodings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_messy_mp3(&path);

        normalize_tags(&path).unwrap();
        let frames = raw_v23_frames(&path);

        let ids: Vec<&str> = frames.iter().map(|(id, _)| id.as_str()).collect();
        for v24_only in ["TDRC", "TSOP", "TIPL", "TMCL", "TDOR"] {
            assert!(!ids.contains(&v24_only), "{} left in a v2.3 tag", v24_only);
        }
        assert!(ids.contains(&"TYER"));
        assert!(ids.contains(&"IPLS"));

        for (id, encoding) in &frames {
            if id.starts_with('T') || id == "COMM" || id == "IPLS" {
                assert!(*encoding <= 1, "{} written with encoding byte {}", id, encoding);
            }
        }
        let (_, title_encoding) = frames.iter().find(|(id, _)| id == "TIT2").unwrap();
        assert_eq!(*title_encoding, 1, "non-Latin-1 title needs UTF-16");
    }

    #[test]
    fn test_recording_time_is_split_into_v23_frames() {
        let mut tag = Tag::new();
        tag.add_frame(Frame::text("TDRC", "2001-03-09T14:05:33"));
        tag.add_frame(Frame::text("TDOR", "1999"));

        let (normalized, report) = normalize_tag(&tag);

        assert_eq!(report.converted_v24_frames, 2);
        let text = |id: &str| normalized.get(id).and_then(|f| f.content().text());
        assert_eq!(text("TYER"), Some("2001"));
        assert_eq!(text("TDAT"), Some("0903"));
        assert_eq!(text("TIME"), Some("1405"));
        assert_eq!(text("TORY"), Some("1999"));
        assert!(normalized.get("TDRC").is_none());
        assert!(normalized.get("TDOR").is_none());
    }

    #[test]
    fn test_year_only_recording_time_has_no_date_frames() {
        let mut tag = Tag::new();
        tag.add_frame(Frame::text("TDRC", "2001"));

        let (normalized, _) = normalize_tag(&tag);

        assert_eq!(normalized.get("TYER").and_then(|f| f.content().text()), Some("2001"));
        assert!(normalized.get("TDAT").is_none());
        assert!(normalized.get("TIME").is_none());
    }

    #[test]
    fn test_unparseable_recording_time_is_dropped() {
        let mut tag = Tag::new();
        tag.add_frame(Frame::text("TDRC", "sometime in the nineties"));

        let (normalized, report) = normalize_tag(&tag);

        assert_eq!(report.dropped_v24_frames, 1);
        assert!(normalized.get("TDRC").is_none());
        assert!(normalized.get("TYER").is_none());
    }

    #[test]
    fn test_people_lists_merge_into_ipls() {
        let person = |role: &str, name: &str| InvolvedPeopleListItem {
            involvement: role.to_string(),
            involvee: name.to_string(),
        };
        let mut tag = Tag::new();
        tag.add_frame(Frame::with_content(
            "TIPL",
            Content::InvolvedPeopleList(InvolvedPeopleList {
                items: vec![person("producer", "Don Gilmore")],
            }),
        ));
        tag.add_frame(Frame::with_content(
            "TMCL",
            Content::InvolvedPeopleList(InvolvedPeopleList {
                items: vec![person("guitar", "Brad Delson")],
            }),
        ));
        tag.add_frame(Frame::text("TSOP", "Linkin Park"));
        tag.add_frame(Frame::text("TMOO", "Angry"));

        let (normalized, report) = normalize_tag(&tag);

        assert_eq!(report.converted_v24_frames, 2);
        assert_eq!(report.dropped_v24_frames, 2);
        let ids: Vec<_> = normalized.frames().map(|f| f.id().to_string()).collect();
        assert_eq!(ids, vec!["IPLS", "COMM"]);
        let people = normalized
            .get("IPLS")
            .and_then(|f| f.content().involved_people_list())
            .unwrap();
        assert_eq!(
            people.items,
            vec![person("producer", "Don Gilmore"), person("guitar", "Brad Delson")]
        );
    }

    #[test]
    fn test_utf8_text_frame_loses_its_encoding() {
        let mut tag = Tag::new();
        tag.add_frame(Frame::text("TIT2", MESSY_TITLE).set_encoding(Some(Encoding::UTF8)));
        tag.add_frame(Frame::text("TALB", "Hybrid Theory").set_encoding(Some(Encoding::Latin1)));

        let (normalized, _) = normalize_tag(&tag);

        assert_eq!(normalized.get("TIT2").unwrap().encoding(), None);
        assert_eq!(normalized.get("TALB").unwrap().encoding(), Some(Encoding::Latin1));
        assert_eq!(normalized.title(), Some(MESSY_TITLE));
    }

    #[test]
    fn test_normalize_tags_twice_gives_same_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_messy_mp3(&path);

        normalize_tags(&path).unwrap();
        let first = Tag::read_from_path(&path).unwrap();
        normalize_tags(&path).unwrap();
        let second = Tag::read_from_path(&path).unwrap();

        let first: Vec<_> = first.frames().cloned().collect();
        let second: Vec<_> = second.frames().cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_tags_untagged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.mp3");
        write_untagged_mp3(&path);

        let report = normalize_tags(&path).unwrap();
        assert_eq!(
            report,
            NormalizeReport {
                new_tag: true,
                ..Default::default()
            }
        );

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.comments().count(), 1);
    }

    #[test]
    fn test_normalize_tags_missing_file() {
        let result = normalize_tags(Path::new("/nonexistent/file.mp3"));
        assert!(matches!(result, Err(Error::Tag { .. })));
    }
}
