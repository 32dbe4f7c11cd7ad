use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::Result;
use crate::types::BibleRecording;

/// File extension for a stored MIME type.
#[must_use]
pub fn extension_for_mime(mime: Option<&str>) -> &'static str {
    match mime {
        Some("audio/webm") => ".webm",
        Some("audio/wav") => ".wav",
        _ => ".bin",
    }
}

/// Archive paths for each recording, in input order.
///
/// Recordings are grouped as `{book}/{chapter:02}{ext}`; the second and later
/// recordings of the same chapter get a `_{n:03}` suffix.
#[must_use]
pub fn entry_names(recordings: &[BibleRecording]) -> Vec<String> {
    let mut seen: HashMap<(&str, u32), u32> = HashMap::new();

    recordings
        .iter()
        .map(|rec| {
            let n = seen
                .entry((rec.book_name.as_str(), rec.chapter_number))
                .or_insert(0);
            *n += 1;

            let suffix = if *n > 1 {
                format!("_{:03}", *n)
            } else {
                String::new()
            };
            let ext = extension_for_mime(rec.recording.file_mime.as_deref());
            format!("{}/{:02}{suffix}{ext}", rec.book_name, rec.chapter_number)
        })
        .collect()
}

/// Packs every recording's audio into a deflate-compressed zip.
pub fn build_bible_archive(recordings: &[BibleRecording]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, rec) in entry_names(recordings).into_iter().zip(recordings) {
        writer.start_file(name, options)?;
        writer.write_all(&rec.recording.file)?;
    }

    Ok(writer.finish()?.into_inner())
}
