//! Zip extraction into a scoped working directory

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{ProcessError, Result};

/// Extract every regular file of `archive` below `workdir`, in archive
/// member order.
///
/// Each member keeps the bytes decompressed from its own entry, so entries
/// that resolve to the same file on disk do not share content. Only a
/// container that cannot be opened at all is an error. Members that fail to
/// decompress or write are skipped and reported in `diagnostics`.
pub(crate) fn extract_members(
    archive: &[u8],
    workdir: &Path,
    diagnostics: &mut Vec<String>,
) -> Result<Vec<(String, Vec<u8>)>> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(ProcessError::InvalidArchive)?;

    let mut members = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = match zip.by_index(i) {
            Ok(file) => file,
            Err(e) => {
                report(diagnostics, format!("Cannot open archive entry #{}: {}", i, e));
                continue;
            }
        };

        if file.is_dir() {
            continue;
        }

        // Rejects absolute paths and `..` traversal
        let Some(inner_path) = file.enclosed_name() else {
            report(diagnostics, format!("Skipping entry with unsafe path: {}", file.name()));
            continue;
        };

        let relative_path = inner_path.to_string_lossy().replace('\\', "/");
        let disk_path = workdir.join(&inner_path);

        let mut data = Vec::with_capacity(file.size() as usize);
        if let Err(e) = file.read_to_end(&mut data) {
            report(diagnostics, format!("Cannot decompress {}: {}", relative_path, e));
            continue;
        }

        if let Err(e) = write_entry(&data, &disk_path) {
            report(diagnostics, format!("Cannot extract {}: {}", relative_path, e));
            let _ = fs::remove_file(&disk_path);
            continue;
        }

        members.push((relative_path, data));
    }

    Ok(members)
}

fn write_entry(data: &[u8], disk_path: &Path) -> io::Result<()> {
    if let Some(parent) = disk_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(disk_path, data)
}

fn report(diagnostics: &mut Vec<String>, message: String) {
    log::warn!("{}", message);
    diagnostics.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extracts_in_member_order() {
        let archive = build(&[
            ("b.osu", b"chart"),
            ("sb/", b""),
            ("sb/star.png", b"png"),
            ("a.mp3", b"mp3"),
        ]);
        let workdir = tempfile::tempdir().unwrap();
        let mut diagnostics = Vec::new();

        let members = extract_members(&archive, workdir.path(), &mut diagnostics).unwrap();

        let names: Vec<_> = members.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["b.osu", "sb/star.png", "a.mp3"]);
        assert_eq!(members[1].1, b"png");
        assert!(diagnostics.is_empty());
        assert!(workdir.path().join("sb/star.png").exists());
    }

    #[test]
    fn traversal_entries_are_skipped() {
        let archive = build(&[("../evil.osu", b"x"), ("ok.osu", b"y")]);
        let workdir = tempfile::tempdir().unwrap();
        let mut diagnostics = Vec::new();

        let members = extract_members(&archive, workdir.path(), &mut diagnostics).unwrap();

        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0, "ok.osu");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn colliding_entries_keep_their_own_bytes() {
        let archive = build(&[
            ("a.osu", b"easy"),
            ("x/../a.osu", b"hard"),
            ("./a.osu", b"insane"),
        ]);
        let workdir = tempfile::tempdir().unwrap();
        let mut diagnostics = Vec::new();

        let members = extract_members(&archive, workdir.path(), &mut diagnostics).unwrap();

        let contents: Vec<&[u8]> = members.iter().map(|(_, data)| data.as_slice()).collect();
        let expected: [&[u8]; 3] = [b"easy", b"hard", b"insane"];
        assert_eq!(contents, expected);
        assert_eq!(members[0].0, "a.osu");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn garbage_is_invalid_archive() {
        let workdir = tempfile::tempdir().unwrap();
        let result = extract_members(b"definitely not a zip", workdir.path(), &mut Vec::new());
        assert!(matches!(result, Err(ProcessError::InvalidArchive(_))));
    }
}
