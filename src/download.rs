//! Download, unpack and install a selected release asset.

use crate::error::{IrError, Result};
use crate::types::ReleaseAsset;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tar::Archive;
use walkdir::WalkDir;

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Extensions that never hold the binary we are after.
const NON_BINARY_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".json", ".yaml", ".yml", ".cfg", ".conf", ".log",
];
const EXECUTABLE_SUFFIXES: &[&str] = &[".exe", ".bin", ".app"];
const PLATFORM_TOKENS: &[&str] = &["linux", "darwin", "windows", "amd64", "x86_64", "arm64"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Tar,
    Zip,
    /// Not an archive; the download is the binary itself.
    Raw,
}

impl ArchiveKind {
    pub fn from_filename(filename: &str) -> ArchiveKind {
        let name = filename.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else if name.ends_with(".tar") {
            ArchiveKind::Tar
        } else if name.ends_with(".zip") {
            ArchiveKind::Zip
        } else {
            ArchiveKind::Raw
        }
    }
}

/// Turns a [`ReleaseAsset`] into an executable on disk.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    http: reqwest::Client,
    show_progress: bool,
}

impl ArchiveInstaller {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("install-release/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IrError::download("(client setup)", e))?;
        Ok(Self::with_client(http))
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        ArchiveInstaller {
            http,
            show_progress: true,
        }
    }

    /// Disable the download progress bar.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Download `asset`, extract it if needed and install the executable it
    /// contains as `dest_dir/dest_name`. Returns the installed path.
    pub async fn install(
        &self,
        asset: &ReleaseAsset,
        dest_dir: &Path,
        dest_name: &str,
    ) -> Result<PathBuf> {
        let work = tempfile::Builder::new()
            .prefix("install-release-")
            .tempdir()
            .map_err(|e| IrError::download(&asset.download_url, e))?;

        let file_name = Path::new(&asset.filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "asset".to_string());
        let download_path = work.path().join(&file_name);

        tracing::info!("Downloading {} ({:.1} MB)", file_name, asset.size_mb());
        download_file(
            &self.http,
            &asset.download_url,
            &download_path,
            self.show_progress,
        )
        .await?;

        let extract_dir = work.path().join("extract");
        fs::create_dir_all(&extract_dir).map_err(|e| IrError::extract(&download_path, e))?;

        let kind = ArchiveKind::from_filename(&file_name);
        match kind {
            ArchiveKind::Raw => {
                fs::copy(&download_path, extract_dir.join(&file_name))
                    .map_err(|e| IrError::extract(&download_path, e))?;
            }
            _ => {
                tracing::info!("Extracting {}", file_name);
                extract_archive(kind, &download_path, &extract_dir)?;
            }
        }

        let executable = find_executable(&extract_dir)?;
        tracing::debug!("Selected executable {}", executable.display());

        install_binary(&executable, dest_dir, dest_name)
    }
}

/// Stream `url` into `local_path`. Non-2xx responses are download errors.
pub async fn download_file(
    http: &reqwest::Client,
    url: &str,
    local_path: &Path,
    show_progress: bool,
) -> Result<()> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| IrError::download(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(IrError::download(
            url,
            format!("server responded with status {}", status),
        ));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = if show_progress {
        ProgressBar::new(total_size)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path).map_err(|e| IrError::download(url, e))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| IrError::download(url, e))?;
        file.write_all(&chunk).map_err(|e| IrError::download(url, e))?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush().map_err(|e| IrError::download(url, e))?;

    pb.finish_and_clear();
    tracing::debug!("Downloaded {} bytes from {}", downloaded, url);
    Ok(())
}

pub fn extract_archive(kind: ArchiveKind, archive_path: &Path, extract_dir: &Path) -> Result<()> {
    fs::create_dir_all(extract_dir).map_err(|e| IrError::extract(archive_path, e))?;
    match kind {
        ArchiveKind::TarGz => {
            let file = fs::File::open(archive_path).map_err(|e| IrError::extract(archive_path, e))?;
            extract_tar(GzDecoder::new(file), archive_path, extract_dir)
        }
        ArchiveKind::Tar => {
            let file = fs::File::open(archive_path).map_err(|e| IrError::extract(archive_path, e))?;
            extract_tar(file, archive_path, extract_dir)
        }
        ArchiveKind::Zip => extract_zip(archive_path, extract_dir),
        ArchiveKind::Raw => Err(IrError::extract(archive_path, "not an archive")),
    }
}

fn extract_tar<R: Read>(reader: R, archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let mut archive = Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| IrError::extract(archive_path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| IrError::extract(archive_path, e))?;
        // `unpack_in` refuses entries that would land outside `extract_dir`.
        let unpacked = entry
            .unpack_in(extract_dir)
            .map_err(|e| IrError::extract(archive_path, e))?;
        if !unpacked {
            let name = entry
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            tracing::warn!("Skipping unsafe path in archive: {}", name);
        }
    }

    Ok(())
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path).map_err(|e| IrError::extract(archive_path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| IrError::extract(archive_path, e))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| IrError::extract(archive_path, e))?;

        let outpath = match file.enclosed_name() {
            Some(path) => extract_dir.join(path),
            None => {
                tracing::warn!("Skipping unsafe path in zip: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| IrError::extract(archive_path, e))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| IrError::extract(archive_path, e))?;
        }
        let mut outfile =
            fs::File::create(&outpath).map_err(|e| IrError::extract(archive_path, e))?;
        io::copy(&mut file, &mut outfile).map_err(|e| IrError::extract(archive_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))
                    .map_err(|e| IrError::extract(archive_path, e))?;
            }
        }
    }

    Ok(())
}

/// True when the file starts with an ELF, PE or Mach-O signature.
pub fn is_binary_executable(path: &Path) -> bool {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut header = Vec::with_capacity(16);
    if file.take(16).read_to_end(&mut header).is_err() || header.len() < 4 {
        return false;
    }

    if header.starts_with(b"\x7fELF") || header.starts_with(b"MZ") {
        return true;
    }

    let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    matches!(magic, 0xFEEDFACE | 0xCEFAEDFE | 0xFEEDFACF | 0xCFFAEDFE)
}

#[cfg(unix)]
fn has_exec_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn has_exec_bit(_path: &Path) -> bool {
    false
}

fn is_man_page(path: &Path, name: &str) -> bool {
    let in_man_dir = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|d| d.to_string_lossy().starts_with("man"))
        .unwrap_or(false);
    if in_man_dir {
        return true;
    }

    man_page_name().is_some_and(|re| re.is_match(name))
}

/// `tool.1`, `tool.8.gz`; not `tool-v1.2.3`.
fn man_page_name() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.]\.[0-9](\.gz)?$").ok())
        .as_ref()
}

/// `LICENSE`, `LICENSE-MIT`, `UNLICENSE`, `README.md` and friends; not
/// binaries that merely start with those words, such as `licensed`.
fn is_license_or_readme(name: &str) -> bool {
    let upper = name.to_uppercase();
    let stem = upper.split('.').next().unwrap_or(upper.as_str());
    stem == "README"
        || stem == "COPYING"
        || stem.ends_with("LICENSE")
        || stem.starts_with("LICENSE-")
}

fn is_excluded(path: &Path, name: &str) -> bool {
    let lower = name.to_lowercase();

    NON_BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || is_license_or_readme(name)
        || ArchiveKind::from_filename(name) != ArchiveKind::Raw
        || is_man_page(path, name)
}

/// `relative` is the path below the extraction root.
fn is_completion_script(relative: &Path, name: &str) -> bool {
    name.starts_with('_')
        || relative
            .parent()
            .map(|dir| dir.to_string_lossy().to_lowercase().contains("completion"))
            .unwrap_or(false)
}

fn looks_like_binary_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    !name.contains('.')
        || EXECUTABLE_SUFFIXES.iter().any(|s| lower.ends_with(s))
        || (lower.contains('-') && PLATFORM_TOKENS.iter().any(|t| lower.contains(t)))
}

/// Pick the file to install out of an extracted tree.
///
/// Tiers, each consulted only when the previous one is empty: binary
/// signature, executable bit (minus completion scripts), binary-looking
/// names that also carry a signature, and finally a lone remaining file.
pub fn find_executable(dir: &Path) -> Result<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if is_excluded(entry.path(), &name) {
            tracing::trace!("Excluding {}", entry.path().display());
            continue;
        }
        files.push(entry.into_path());
    }

    if let Some(found) = files.iter().find(|p| is_binary_executable(p)) {
        return Ok(found.clone());
    }

    let executable = files.iter().find(|p| {
        let relative = p.strip_prefix(dir).unwrap_or(p);
        has_exec_bit(p) && !is_completion_script(relative, &file_name(p))
    });
    if let Some(found) = executable {
        return Ok(found.clone());
    }

    let candidate = files
        .iter()
        .filter(|p| looks_like_binary_name(&file_name(p)))
        .find(|p| is_binary_executable(p));
    if let Some(found) = candidate {
        return Ok(found.clone());
    }

    if let [only] = files.as_slice() {
        if is_binary_executable(only) {
            return Ok(only.clone());
        }
    }

    Err(IrError::NoExecutableFound(dir.to_path_buf()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Copy `src` to `dest_dir/dest_name` and mark it executable.
pub fn install_binary(src: &Path, dest_dir: &Path, dest_name: &str) -> Result<PathBuf> {
    let dest = dest_dir.join(dest_name);
    let install_err = |source: io::Error| IrError::Install {
        path: dest.clone(),
        source,
    };

    fs::create_dir_all(dest_dir).map_err(install_err)?;

    // Unlink first so a running binary can be replaced.
    match fs::remove_file(&dest) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(install_err(e)),
    }
    fs::copy(src, &dest).map_err(install_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&dest, fs::Permissions::from_mode(0o755)).map_err(install_err)?;
    }

    let installed = fs::canonicalize(&dest).map_err(install_err)?;
    tracing::info!("Installed {}", installed.display());
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use mockito::Server;
    use tempfile::TempDir;

    const ELF_BYTES: &[u8] = b"\x7fELF\x02\x01\x01\x00fake-elf-body";

    fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        for (path, data) in entries {
            writer
                .start_file(*path, zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn asset(server: &Server, filename: &str) -> ReleaseAsset {
        ReleaseAsset {
            filename: filename.to_string(),
            download_url: format!("{}/download/{}", server.url(), filename),
            size_bytes: 1024,
            ..Default::default()
        }
    }

    #[test]
    fn test_archive_kind() {
        assert_eq!(ArchiveKind::from_filename("t-linux.tar.gz"), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::from_filename("t-linux.TGZ"), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::from_filename("t-linux.tar"), ArchiveKind::Tar);
        assert_eq!(ArchiveKind::from_filename("t-windows.zip"), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::from_filename("t-linux-amd64"), ArchiveKind::Raw);
        assert_eq!(ArchiveKind::from_filename("t.tar.xz"), ArchiveKind::Raw);
    }

    #[test]
    fn test_binary_signatures() {
        let dir = TempDir::new().unwrap();
        let cases: &[(&str, &[u8], bool)] = &[
            ("elf", ELF_BYTES, true),
            ("pe", b"MZ\x90\x00\x03\x00", true),
            ("macho64", &[0xCF, 0xFA, 0xED, 0xFE, 0x07, 0x00], true),
            ("macho32", &[0xFE, 0xED, 0xFA, 0xCE, 0x00], true),
            ("script", b"#!/bin/sh\necho hi\n", false),
            ("short", b"MZ", false),
            ("text", b"hello world", false),
        ];
        for (name, data, expected) in cases {
            let path = dir.path().join(name);
            fs::write(&path, data).unwrap();
            assert_eq!(is_binary_executable(&path), *expected, "{}", name);
        }
        assert!(!is_binary_executable(&dir.path().join("missing")));
    }

    #[test]
    fn test_elf_wins_among_docs() {
        let dir = TempDir::new().unwrap();
        let mut entries: Vec<(String, Vec<u8>, u32)> = Vec::new();
        for i in 0..5 {
            entries.push((format!("pkg/doc{}.md", i), b"# docs".to_vec(), 0o644));
            entries.push((format!("pkg/notes{}.txt", i), b"notes".to_vec(), 0o755));
        }
        entries.push(("pkg/zz-unhelpful-name.dat".to_string(), ELF_BYTES.to_vec(), 0o644));
        let refs: Vec<(&str, &[u8], u32)> = entries
            .iter()
            .map(|(p, d, m)| (p.as_str(), d.as_slice(), *m))
            .collect();

        let archive = dir.path().join("tool.tar.gz");
        fs::write(&archive, tar_gz(&refs)).unwrap();
        let out = dir.path().join("out");
        extract_archive(ArchiveKind::TarGz, &archive, &out).unwrap();

        let found = find_executable(&out).unwrap();
        assert_eq!(file_name(&found), "zz-unhelpful-name.dat");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_bit_tier_skips_completions() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("tool.tar.gz");
        fs::write(
            &archive,
            tar_gz(&[
                ("tool/completion/_tool", b"#compdef tool", 0o755),
                ("tool/_tool", b"#compdef tool", 0o755),
                ("tool/tool.sh", b"#!/bin/sh\necho tool\n", 0o755),
                ("tool/LICENSE", b"MIT", 0o755),
            ]),
        )
        .unwrap();
        let out = dir.path().join("out");
        extract_archive(ArchiveKind::TarGz, &archive, &out).unwrap();

        let found = find_executable(&out).unwrap();
        assert_eq!(file_name(&found), "tool.sh");
    }

    #[cfg(unix)]
    #[test]
    fn test_completion_check_ignores_extraction_root() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("tool.tar.gz");
        fs::write(
            &archive,
            tar_gz(&[("tool/tool.sh", b"#!/bin/sh\necho tool\n", 0o755)]),
        )
        .unwrap();
        let out = dir.path().join("shell-completions").join("out");
        extract_archive(ArchiveKind::TarGz, &archive, &out).unwrap();

        let found = find_executable(&out).unwrap();
        assert_eq!(file_name(&found), "tool.sh");
    }

    #[test]
    fn test_binary_named_like_license_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("LICENSE"), b"MIT").unwrap();
        fs::write(dir.path().join("README.md"), b"# licensed").unwrap();
        fs::write(dir.path().join("licensed"), ELF_BYTES).unwrap();

        let found = find_executable(dir.path()).unwrap();
        assert_eq!(file_name(&found), "licensed");
    }

    #[test]
    fn test_license_and_readme_names() {
        let docs = [
            "LICENSE",
            "license.txt",
            "LICENSE-MIT",
            "UNLICENSE",
            "README",
            "readme.rst",
            "COPYING",
        ];
        for name in docs {
            assert!(is_license_or_readme(name), "{}", name);
        }
        for name in ["licensed", "readme-generator", "tool"] {
            assert!(!is_license_or_readme(name), "{}", name);
        }
    }

    #[test]
    fn test_docs_only_archive_has_no_executable() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("docs.zip");
        fs::write(
            &archive,
            zip_archive(&[("README", b"read me"), ("docs/tool.1", b".TH TOOL 1")]),
        )
        .unwrap();
        let out = dir.path().join("out");
        extract_archive(ArchiveKind::Zip, &archive, &out).unwrap();

        assert!(matches!(
            find_executable(&out),
            Err(IrError::NoExecutableFound(_))
        ));
    }

    #[test]
    fn test_man_page_detection() {
        assert!(is_man_page(Path::new("x/tool.1"), "tool.1"));
        assert!(is_man_page(Path::new("x/tool.8.gz"), "tool.8.gz"));
        assert!(is_man_page(Path::new("share/man1/tool"), "tool"));
        assert!(!is_man_page(Path::new("x/tool-v1.2.3"), "tool-v1.2.3"));
        assert!(!is_man_page(Path::new("x/tool"), "tool"));
    }

    #[test]
    fn test_tar_skips_path_traversal() {
        let dir = TempDir::new().unwrap();
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let evil = b"../escaped";
        let mut header = tar::Header::new_gnu();
        header.as_gnu_mut().unwrap().name[..evil.len()].copy_from_slice(evil);
        header.set_size(ELF_BYTES.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append(&header, ELF_BYTES).unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_size(ELF_BYTES.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, "bin/tool", ELF_BYTES).unwrap();
        let bytes = builder.into_inner().unwrap().finish().unwrap();

        let archive = dir.path().join("evil.tar.gz");
        fs::write(&archive, bytes).unwrap();
        let out = dir.path().join("nested").join("out");
        extract_archive(ArchiveKind::TarGz, &archive, &out).unwrap();

        assert!(!dir.path().join("nested").join("escaped").exists());
        assert_eq!(file_name(&find_executable(&out).unwrap()), "tool");
    }

    #[test]
    fn test_install_binary_sets_mode() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src-bin");
        fs::write(&src, ELF_BYTES).unwrap();
        let dest_dir = dir.path().join("bin").join("deeper");

        let installed = install_binary(&src, &dest_dir, "tool").unwrap();
        assert!(installed.is_absolute());
        assert_eq!(fs::read(&installed).unwrap(), ELF_BYTES);

        // Reinstalling over an existing file works.
        install_binary(&src, &dest_dir, "tool").unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&installed).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_install_tar_gz_from_server() {
        let mut server = Server::new_async().await;
        let body = tar_gz(&[
            ("tool-1.0/README.md", b"# tool", 0o644),
            ("tool-1.0/tool", ELF_BYTES, 0o644),
        ]);
        let mock = server
            .mock("GET", "/download/tool-linux-amd64.tar.gz")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let dest = TempDir::new().unwrap();
        let installer = ArchiveInstaller::new().unwrap().quiet();
        let installed = installer
            .install(
                &asset(&server, "tool-linux-amd64.tar.gz"),
                dest.path(),
                "mytool",
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(file_name(&installed), "mytool");
        assert_eq!(fs::read(&installed).unwrap(), ELF_BYTES);
    }

    #[tokio::test]
    async fn test_install_raw_binary() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download/tool-linux-amd64")
            .with_status(200)
            .with_body(ELF_BYTES)
            .create_async()
            .await;

        let dest = TempDir::new().unwrap();
        let installer = ArchiveInstaller::new().unwrap().quiet();
        let installed = installer
            .install(&asset(&server, "tool-linux-amd64"), dest.path(), "tool")
            .await
            .unwrap();
        assert_eq!(installed, fs::canonicalize(dest.path().join("tool")).unwrap());
    }

    #[tokio::test]
    async fn test_install_zip_from_server() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download/tool-windows-amd64.zip")
            .with_status(200)
            .with_body(zip_archive(&[
                ("LICENSE", b"MIT"),
                ("tool.exe", b"MZ\x90\x00\x03\x00\x00\x00"),
            ]))
            .create_async()
            .await;

        let dest = TempDir::new().unwrap();
        let installed = ArchiveInstaller::new()
            .unwrap()
            .quiet()
            .install(&asset(&server, "tool-windows-amd64.zip"), dest.path(), "tool.exe")
            .await
            .unwrap();
        assert!(fs::read(&installed).unwrap().starts_with(b"MZ"));
    }

    #[tokio::test]
    async fn test_download_failure_installs_nothing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download/tool-linux-amd64.tar.gz")
            .with_status(500)
            .create_async()
            .await;

        let dest = TempDir::new().unwrap();
        let err = ArchiveInstaller::new()
            .unwrap()
            .quiet()
            .install(
                &asset(&server, "tool-linux-amd64.tar.gz"),
                dest.path(),
                "tool",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, IrError::Download { .. }));
        assert!(!dest.path().join("tool").exists());
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_extract_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/download/tool.tar.gz")
            .with_status(200)
            .with_body("definitely not gzip")
            .create_async()
            .await;

        let dest = TempDir::new().unwrap();
        let err = ArchiveInstaller::new()
            .unwrap()
            .quiet()
            .install(&asset(&server, "tool.tar.gz"), dest.path(), "tool")
            .await
            .unwrap_err();
        assert!(matches!(err, IrError::Extract { .. }));
    }
}
