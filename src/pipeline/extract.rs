use crate::error::{EtlError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, info, instrument};

/// Unpack the gzip-compressed tar archive at `archive` into `dest`, preserving
/// relative member paths. Any member whose path would land outside `dest` is a
/// hard error; nothing is filtered otherwise. Returns the unpacked member
/// paths, relative to `dest`.
#[instrument(fields(archive = %archive.display(), dest = %dest.display()))]
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let gz = GzDecoder::new(file);
    let mut tar = Archive::new(gz);

    let mut extracted = Vec::new();
    for entry in tar.entries()? {
        let mut entry = entry?;
        let member = entry.path()?.into_owned();
        if !stays_within_dest(&member) {
            return Err(EtlError::UnsafeArchivePath(member));
        }
        if entry.unpack_in(dest)? {
            debug!(member = %member.display(), "unpacked archive member");
            extracted.push(member);
        }
    }
    info!(members = extracted.len(), "archive extracted");
    Ok(extracted)
}

/// A member path is safe when it is relative and never walks above the
/// extraction root at any point.
fn stays_within_dest(member: &Path) -> bool {
    let mut depth: i64 = 0;
    for component in member.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return false,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::CurDir => {}
            Component::Normal(_) => depth += 1,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    fn build_archive(members: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let gz = GzEncoder::new(&mut buf, Compression::default());
            let mut tar = tar::Builder::new(gz);
            for (name, content) in members {
                let mut header = tar::Header::new_gnu();
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                tar.append_data(&mut header, name, content.as_bytes())
                    .unwrap();
            }
            tar.into_inner().unwrap().finish().unwrap();
        }
        buf
    }

    #[test]
    fn extracts_all_members_at_their_relative_paths() {
        let temp = tempdir().unwrap();
        let archive_path = temp.path().join("data.tgz");
        let dest = temp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();

        let bytes = build_archive(&[
            ("vehicle-data.csv", "a,b\n1,2\n"),
            ("nested/payment-data.txt", "xx yy\n"),
        ]);
        std::fs::write(&archive_path, bytes).unwrap();

        let members = extract_archive(&archive_path, &dest).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(
            std::fs::read_to_string(dest.join("vehicle-data.csv")).unwrap(),
            "a,b\n1,2\n"
        );
        assert_eq!(
            std::fs::read_to_string(dest.join("nested/payment-data.txt")).unwrap(),
            "xx yy\n"
        );
    }

    #[test]
    fn corrupt_archive_is_fatal() {
        let temp = tempdir().unwrap();
        let archive_path = temp.path().join("data.tgz");
        std::fs::write(&archive_path, b"definitely not gzip").unwrap();

        let result = extract_archive(&archive_path, temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn rejects_escaping_member_paths() {
        assert!(!stays_within_dest(Path::new("../evil.txt")));
        assert!(!stays_within_dest(Path::new("/etc/passwd")));
        assert!(!stays_within_dest(Path::new("nested/../../evil.txt")));
    }

    #[test]
    fn accepts_relative_paths_that_stay_inside() {
        assert!(stays_within_dest(Path::new("data.csv")));
        assert!(stays_within_dest(Path::new("nested/data.csv")));
        assert!(stays_within_dest(Path::new("nested/../data.csv")));
        assert!(stays_within_dest(Path::new("./data.csv")));
    }
}
