//! Content-type detection for upload sources.
//!
//! Sniffs container signatures from the leading bytes and falls back to the
//! filename extension. The detected type also drives the storage object
//! name's extension.

/// Sniff a content type from the leading bytes of a source, falling back to
/// the filename extension, then to `application/octet-stream`.
pub fn sniff(head: &[u8], filename: &str) -> &'static str {
    if let Some(sniffed) = sniff_magic(head) {
        return sniffed;
    }
    by_extension(filename).unwrap_or("application/octet-stream")
}

fn sniff_magic(head: &[u8]) -> Option<&'static str> {
    if head.len() >= 12 {
        // ISO base media container: brand at bytes 8..12 distinguishes
        // plain MP4, M4A audio, and QuickTime.
        if &head[4..8] == b"ftyp" {
            return Some(match &head[8..12] {
                b"M4A " => "audio/mp4",
                b"qt  " => "video/quicktime",
                _ => "video/mp4",
            });
        }
        if head.starts_with(b"RIFF") {
            if &head[8..12] == b"WAVE" {
                return Some("audio/wav");
            }
            if &head[8..12] == b"AVI " {
                return Some("video/x-msvideo");
            }
        }
    }
    if head.len() >= 4 {
        if head.starts_with(b"\x1a\x45\xdf\xa3") {
            return Some("video/webm");
        }
        if head.starts_with(b"OggS") {
            return Some("audio/ogg");
        }
        if head.starts_with(b"fLaC") {
            return Some("audio/flac");
        }
        if head.starts_with(b"ID3") || head.starts_with(b"\xff\xfb") || head.starts_with(b"\xff\xf3")
        {
            return Some("audio/mpeg");
        }
    }
    None
}

fn by_extension(filename: &str) -> Option<&'static str> {
    let extension = filename.rsplit('.').next()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" | "mkv" => "video/webm",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        _ => return None,
    };
    Some(content_type)
}

/// File extension to store an object of the given content type under.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/x-msvideo" => "avi",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        "audio/aac" => "aac",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_mp4_from_ftyp_box() {
        let head = b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00";
        assert_eq!(sniff(head, "clip"), "video/mp4");
    }

    #[test]
    fn sniffs_m4a_brand_as_audio() {
        let head = b"\x00\x00\x00\x20ftypM4A \x00\x00\x02\x00";
        assert_eq!(sniff(head, "clip"), "audio/mp4");
    }

    #[test]
    fn sniffs_wave_riff() {
        let head = b"RIFF\x24\x08\x00\x00WAVEfmt ";
        assert_eq!(sniff(head, "take1"), "audio/wav");
    }

    #[test]
    fn sniffs_matroska_as_webm() {
        let head = b"\x1a\x45\xdf\xa3\x42\x86\x81\x01\x42\xf7\x81\x01";
        assert_eq!(sniff(head, "clip"), "video/webm");
    }

    #[test]
    fn falls_back_to_extension() {
        assert_eq!(sniff(b"short", "song.MP3"), "audio/mpeg");
        assert_eq!(sniff(b"short", "clip.mov"), "video/quicktime");
    }

    #[test]
    fn unknown_source_is_octet_stream() {
        assert_eq!(sniff(b"????", "mystery.xyz"), "application/octet-stream");
    }

    #[test]
    fn extension_round_trip_for_common_types() {
        assert_eq!(extension_for("video/mp4"), "mp4");
        assert_eq!(extension_for("audio/mpeg"), "mp3");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }
}
