use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::storage::{Host, IngestionError, PROJECTS_DIR};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Returns the extension of the final segment of `source`, including the leading dot.
///
/// Everything from the last `.` of the file name onwards is kept, with its original
/// case. No dot means no extension, which yields an empty string.
pub fn file_extension(source: &Path) -> String {
    let Some(file_name) = source.file_name() else {
        return String::new();
    };
    let file_name = file_name.to_string_lossy();
    match file_name.rfind('.') {
        Some(idx) => file_name[idx..].to_string(),
        None => String::new(),
    }
}

/// Builds the relative managed path `/projects/<project_id>/<record_id><extension>`.
pub fn managed_path(project_id: &str, record_id: &str, extension: &str) -> String {
    format!("/{}/{}/{}{}", PROJECTS_DIR, project_id, record_id, extension)
}

/// Resolves a relative managed path against the storage root.
///
/// The leading `/` of managed paths does not make them absolute; each `/`-separated
/// segment is appended to `root` in turn. Segments are not sanitized here: paths
/// built by [`ingest_file`] never contain `..`, but a rehydrated path is trusted as
/// given and may point outside the root.
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Copies `source` into the managed storage tree and returns its relative path.
///
/// The destination directory is created if needed. An existing file at the
/// destination is never overwritten. When the copy fails halfway, the partially
/// written destination is removed before the error is returned.
#[instrument(skip(host, source), fields(source = %source.display()))]
pub fn ingest_file<H: Host + ?Sized>(
    host: &H,
    source: &Path,
    project_id: &str,
    record_id: &str,
) -> Result<String, IngestionError> {
    check_segment("project id", project_id)?;
    check_segment("document id", record_id)?;

    let relative = managed_path(project_id, record_id, &file_extension(source));
    let root = host.storage_root().map_err(IngestionError::StorageRoot)?;
    let destination = resolve(&root, &relative);
    debug!("Ingesting into {}", destination.display());

    let reader = open_source(source)?;

    if let Some(dir) = destination.parent() {
        fs::create_dir_all(dir).map_err(|e| IngestionError::DirectoryUncreatable {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let bytes = write_destination(reader, source, &destination)?;
    debug!(bytes, "Source file copied");
    Ok(relative)
}

/// Ids become directory and file names, so each must be exactly one path segment.
fn check_segment(kind: &'static str, value: &str) -> Result<(), IngestionError> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(IngestionError::InvalidIdentifier { kind, value: value.to_string() });
    }
    Ok(())
}

fn open_source(source: &Path) -> Result<File, IngestionError> {
    let unreadable = |e| IngestionError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    };

    let file = File::open(source).map_err(unreadable)?;
    // Opening a directory succeeds on some platforms
    if file.metadata().map_err(unreadable)?.is_dir() {
        return Err(unreadable(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source is a directory",
        )));
    }
    Ok(file)
}

/// Creates `destination` (never overwriting) and streams `reader` into it.
///
/// Read failures are reported against `source`, write failures against
/// `destination`. Either way the partial destination is removed.
fn write_destination<R: Read>(
    mut reader: R,
    source: &Path,
    destination: &Path,
) -> Result<u64, IngestionError> {
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                IngestionError::DestinationExists(destination.to_path_buf())
            } else {
                IngestionError::DestinationUnwritable {
                    path: destination.to_path_buf(),
                    source: e,
                }
            }
        })?;

    let copied = copy_stream(&mut reader, &mut writer).and_then(|bytes| {
        writer.sync_all().map_err(CopyError::Write)?;
        Ok(bytes)
    });

    match copied {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(writer);
            if let Err(remove_err) = fs::remove_file(destination) {
                warn!("Failed to remove partial file {}: {}", destination.display(), remove_err);
            }
            Err(match e {
                CopyError::Read(e) => IngestionError::SourceUnreadable {
                    path: source.to_path_buf(),
                    source: e,
                },
                CopyError::Write(e) => IngestionError::DestinationUnwritable {
                    path: destination.to_path_buf(),
                    source: e,
                },
            })
        }
    }
}

#[derive(Debug)]
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Like `io::copy`, but keeps track of which side failed.
fn copy_stream<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> Result<u64, CopyError> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
    writer.flush().map_err(CopyError::Write)?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SystemHost;
    use tempfile::tempdir;

    #[test]
    fn test_file_extension_logic() {
        assert_eq!(file_extension(Path::new("/tmp/report.pdf")), ".pdf");
        assert_eq!(file_extension(Path::new("/tmp/in voice.pdf")), ".pdf");
        assert_eq!(file_extension(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(file_extension(Path::new("Scan.JPEG")), ".JPEG"); // Case preserved
        assert_eq!(file_extension(Path::new("/tmp/README")), "");
        assert_eq!(file_extension(Path::new("/tmp/v1.2/notes")), ""); // Dot in a directory only
        assert_eq!(file_extension(Path::new(".bashrc")), ".bashrc");
        assert_eq!(file_extension(Path::new("")), "");
    }

    #[test]
    fn test_managed_path_is_deterministic() {
        assert_eq!(managed_path("P1", "abc", ".pdf"), "/projects/P1/abc.pdf");
        assert_eq!(managed_path("P1", "abc", ""), "/projects/P1/abc");
    }

    #[test]
    fn test_resolve_appends_segments() {
        let root = Path::new("/srv/docket");
        assert_eq!(
            resolve(root, "/projects/P1/abc.pdf"),
            PathBuf::from("/srv/docket/projects/P1/abc.pdf")
        );
        assert_eq!(resolve(root, ""), PathBuf::from("/srv/docket"));
    }

    #[test]
    fn ingest_copies_content() {
        let root = tempdir().unwrap();
        let src_dir = tempdir().unwrap();
        let source = src_dir.path().join("quote.docx");
        fs::write(&source, b"quote body").unwrap();

        let host = SystemHost::with_root(root.path());
        let relative = ingest_file(&host, &source, "P1", "abc").unwrap();

        assert_eq!(relative, "/projects/P1/abc.docx");
        let stored = root.path().join("projects").join("P1").join("abc.docx");
        assert_eq!(fs::read(stored).unwrap(), b"quote body");
        assert!(source.exists()); // Source is copied, not moved
    }

    #[test]
    fn ingest_without_extension() {
        let root = tempdir().unwrap();
        let source = root.path().join("Makefile");
        fs::write(&source, "all:").unwrap();

        let host = SystemHost::with_root(root.path());
        let relative = ingest_file(&host, &source, "P1", "abc").unwrap();
        assert_eq!(relative, "/projects/P1/abc");
    }

    #[test]
    fn ingest_missing_source() {
        let root = tempdir().unwrap();
        let host = SystemHost::with_root(root.path());
        let missing = root.path().join("missing.pdf");

        let result = ingest_file(&host, &missing, "P1", "abc");
        assert!(
            matches!(result, Err(IngestionError::SourceUnreadable { path, .. }) if path == missing)
        );
        assert!(!root.path().join("projects").exists());
    }

    #[test]
    fn ingest_directory_source() {
        let root = tempdir().unwrap();
        let host = SystemHost::with_root(root.path());
        let src_dir = tempdir().unwrap();

        let result = ingest_file(&host, src_dir.path(), "P1", "abc");
        assert!(matches!(result, Err(IngestionError::SourceUnreadable { .. })));
    }

    #[test]
    fn ingest_refuses_to_overwrite() {
        let root = tempdir().unwrap();
        let source = root.path().join("new.txt");
        fs::write(&source, "new").unwrap();
        let existing = root.path().join("projects/P1/abc.txt");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "old").unwrap();

        let host = SystemHost::with_root(root.path());
        let result = ingest_file(&host, &source, "P1", "abc");
        assert!(matches!(result, Err(IngestionError::DestinationExists(p)) if p == existing));
        assert_eq!(fs::read_to_string(&existing).unwrap(), "old");
    }

    #[test]
    fn ingest_when_project_dir_is_a_file() {
        let root = tempdir().unwrap();
        let source = root.path().join("a.txt");
        fs::write(&source, "a").unwrap();
        fs::create_dir_all(root.path().join("projects")).unwrap();
        fs::write(root.path().join("projects/P1"), "not a directory").unwrap();

        let host = SystemHost::with_root(root.path());
        let result = ingest_file(&host, &source, "P1", "abc");
        assert!(matches!(result, Err(IngestionError::DirectoryUncreatable { .. })));
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::Other, "device read error"));
            }
            self.served = true;
            buf[..4].copy_from_slice(b"head");
            Ok(4)
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn copy_stream_tags_failing_side() {
        let mut sink = Vec::new();
        let result = copy_stream(&mut FailingReader { served: false }, &mut sink);
        assert!(matches!(result, Err(CopyError::Read(_))));
        assert_eq!(sink, b"head");

        let result = copy_stream(&mut &b"body"[..], &mut FullDisk);
        assert!(matches!(result, Err(CopyError::Write(_))));

        let mut sink = Vec::new();
        assert_eq!(copy_stream(&mut &b"body"[..], &mut sink).unwrap(), 4);
        assert_eq!(sink, b"body");
    }

    #[test]
    fn read_failure_is_source_error_and_leaves_no_file() {
        let root = tempdir().unwrap();
        let source = root.path().join("flaky.bin");
        let destination = root.path().join("abc.bin");

        let result = write_destination(FailingReader { served: false }, &source, &destination);
        assert!(
            matches!(result, Err(IngestionError::SourceUnreadable { path, .. }) if path == source)
        );
        assert!(!destination.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreadable_source_after_open() {
        // Opens fine, but reading offset 0 of our own address space fails
        let root = tempdir().unwrap();
        let host = SystemHost::with_root(root.path());

        let result = ingest_file(&host, Path::new("/proc/self/mem"), "P1", "abc");
        assert!(matches!(result, Err(IngestionError::SourceUnreadable { .. })));
        assert!(!root.path().join("projects/P1/abc").exists());
    }

    #[test]
    fn uncreatable_destination_is_unwritable() {
        let root = tempdir().unwrap();
        let source = root.path().join("a.txt");
        fs::write(&source, "a").unwrap();
        let blocker = root.path().join("blocker");
        fs::write(&blocker, "regular file").unwrap();
        let destination = blocker.join("abc.txt");

        let reader = File::open(&source).unwrap();
        let result = write_destination(reader, &source, &destination);
        assert!(matches!(
            result,
            Err(IngestionError::DestinationUnwritable { path, .. }) if path == destination
        ));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "regular file");
    }

    #[test]
    fn ingest_rejects_path_like_ids() {
        let root = tempdir().unwrap();
        let source = root.path().join("a.txt");
        fs::write(&source, "a").unwrap();
        let host = SystemHost::with_root(root.path());

        for project_id in ["", ".", "..", "../../x", "a/b", "a\\b"] {
            let result = ingest_file(&host, &source, project_id, "abc");
            assert!(
                matches!(
                    &result,
                    Err(IngestionError::InvalidIdentifier { kind: "project id", value })
                        if value == project_id
                ),
                "{:?} accepted",
                project_id
            );
        }
        let result = ingest_file(&host, &source, "P1", "..");
        assert!(matches!(
            result,
            Err(IngestionError::InvalidIdentifier { kind: "document id", .. })
        ));
        assert!(!root.path().join("projects").exists());
    }
}
