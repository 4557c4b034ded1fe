//! File operation dispatcher
//!
//! Every operation accepts plain local paths as well as `[user@]host:path`
//! endpoints. Local endpoints go straight to filesystem syscalls; remote
//! endpoints run the POSIX-equivalent command (`test`, `rm`, `mkdir`,
//! `unzip`) through the execution engine, and transfers go through
//! `scp -r`. Both sides expose the same contract: `Ok(true)` on success,
//! `Ok(false)` on failure, with local filesystem errors logged rather than
//! raised. `Err` is reserved for the fatal cases that abort before any
//! I/O - conflicting endpoints and missing transport executables.

use anyhow::Context;
use async_recursion::async_recursion;

use crate::ToolError;
use crate::endpoint::Endpoint;
use crate::job::{ExecOptions, Job};

fn resolve(path: &str, remote_host: Option<&str>) -> anyhow::Result<Endpoint> {
    let endpoint = Endpoint::parse(path);
    if endpoint.is_remote() && remote_host.is_some() {
        return Err(ToolError::ConflictingEndpoint(path.to_string()).into());
    }
    if let Some(host) = remote_host {
        return Ok(Endpoint::remote(host, path));
    }
    Ok(endpoint)
}

async fn remote_check(cmd: Vec<String>, host: &str) -> anyhow::Result<bool> {
    let mut job = Job::new(cmd);
    let exit_code = job.execute(&ExecOptions::remote(host)).await?;
    Ok(exit_code == 0)
}

/// Checks if a file exists locally or on a remote host.
pub async fn is_file(path: &str, remote_host: Option<&str>) -> anyhow::Result<bool> {
    let endpoint = resolve(path, remote_host)?;
    match endpoint.host() {
        None => Ok(tokio::fs::metadata(endpoint.path())
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)),
        Some(host) => {
            remote_check(
                vec![
                    "test".to_string(),
                    "-f".to_string(),
                    endpoint.path().to_string(),
                ],
                host,
            )
            .await
        }
    }
}

/// Checks if a directory exists locally or on a remote host.
pub async fn is_dir(path: &str, remote_host: Option<&str>) -> anyhow::Result<bool> {
    let endpoint = resolve(path, remote_host)?;
    match endpoint.host() {
        None => Ok(tokio::fs::metadata(endpoint.path())
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)),
        Some(host) => {
            remote_check(
                vec![
                    "test".to_string(),
                    "-d".to_string(),
                    endpoint.path().to_string(),
                ],
                host,
            )
            .await
        }
    }
}

/// Checks if a file or directory exists locally or on a remote host.
pub async fn exists(path: &str, remote_host: Option<&str>) -> anyhow::Result<bool> {
    let endpoint = resolve(path, remote_host)?;
    match endpoint.host() {
        None => Ok(tokio::fs::try_exists(endpoint.path()).await.unwrap_or(false)),
        Some(host) => {
            remote_check(
                vec![
                    "test".to_string(),
                    "-e".to_string(),
                    endpoint.path().to_string(),
                ],
                host,
            )
            .await
        }
    }
}

/// Deletes a file or directory locally or remotely.
///
/// `force` maps to `rm -rf` on the remote side. A path that does not
/// exist counts as success.
pub async fn remove(path: &str, force: bool) -> anyhow::Result<bool> {
    let endpoint = Endpoint::parse(path);
    match endpoint.host() {
        None => Ok(local_remove(endpoint.path(), force).await),
        Some(host) => {
            let flags = if force { "-rf" } else { "-r" };
            remote_check(
                vec![
                    "rm".to_string(),
                    flags.to_string(),
                    endpoint.path().to_string(),
                ],
                host,
            )
            .await
        }
    }
}

/// Copies src to dest.
///
/// When either side is remote the whole transfer runs as `scp -r`. A
/// pre-existing local destination fails the copy unless `force` is set,
/// in which case it is removed first.
pub async fn copy(src: &str, dest: &str, force: bool) -> anyhow::Result<bool> {
    if Endpoint::parse(src).is_local() && Endpoint::parse(dest).is_local() {
        if !clear_destination(src, dest, force, "copy").await {
            return Ok(false);
        }
        return Ok(local_copy(src, dest).await);
    }
    transfer(src, dest).await
}

/// Moves src to dest.
///
/// Remote endpoints transfer via `scp -r`; the source is removed only
/// after the transfer succeeded, so a failed transfer never loses data.
pub async fn move_path(src: &str, dest: &str, force: bool) -> anyhow::Result<bool> {
    if Endpoint::parse(src).is_local() && Endpoint::parse(dest).is_local() {
        if !clear_destination(src, dest, force, "move").await {
            return Ok(false);
        }
        return Ok(local_move(src, dest).await);
    }
    transfer_and_remove(src, dest).await
}

/// Renames src to dest.
///
/// Behaves like [`move_path`] except that a local rename never falls back
/// to copying across filesystems.
pub async fn rename(src: &str, dest: &str, force: bool) -> anyhow::Result<bool> {
    if Endpoint::parse(src).is_local() && Endpoint::parse(dest).is_local() {
        if !clear_destination(src, dest, force, "rename").await {
            return Ok(false);
        }
        return Ok(local_rename(src, dest).await);
    }
    transfer_and_remove(src, dest).await
}

/// Creates a directory locally or on a remote host.
///
/// `force` creates missing parents (`mkdir -p` remotely). An already
/// existing directory counts as success.
pub async fn mkdir(dirname: &str, force: bool, remote_host: Option<&str>) -> anyhow::Result<bool> {
    if dirname.is_empty() {
        tracing::error!("Directory name cannot be empty");
        return Ok(false);
    }
    let endpoint = resolve(dirname, remote_host)?;
    match endpoint.host() {
        None => Ok(local_mkdir(endpoint.path(), force).await),
        Some(host) => {
            let mut cmd = vec!["mkdir".to_string()];
            if force {
                cmd.push("-p".to_string());
            }
            cmd.push(endpoint.path().to_string());
            remote_check(cmd, host).await
        }
    }
}

/// Extracts a zip archive locally or on a remote host.
///
/// `dest` defaults to the current directory. The remote side shells out
/// to `unzip -o <archive> -d <dest>` run from the destination directory.
pub async fn extract(
    archive: &str,
    dest: Option<&str>,
    remote_host: Option<&str>,
) -> anyhow::Result<bool> {
    let endpoint = resolve(archive, remote_host)?;
    match endpoint.host() {
        None => Ok(local_extract(endpoint.path(), dest).await),
        Some(host) => {
            let dest = dest.unwrap_or(".");
            let cmd = vec![
                "unzip".to_string(),
                "-o".to_string(),
                endpoint.path().to_string(),
                "-d".to_string(),
                dest.to_string(),
            ];
            let mut job = Job::new(cmd);
            let options = ExecOptions {
                cwd: Some(dest.to_string()),
                remote_host: Some(host.to_string()),
                ..Default::default()
            };
            let exit_code = job.execute(&options).await?;
            Ok(exit_code == 0)
        }
    }
}

/// Lists entries of a local directory whose names match a glob pattern.
///
/// Listing is local-only; remote endpoints are rejected. A missing
/// directory yields an empty list.
pub async fn list_content(
    dirname: &str,
    pattern: &str,
    remote_host: Option<&str>,
) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let endpoint = resolve(dirname, remote_host)?;
    if endpoint.is_remote() {
        anyhow::bail!("listing remote directories is not supported");
    }
    let dir = std::path::Path::new(endpoint.path());
    if !tokio::fs::metadata(dir)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
    {
        return Ok(Vec::new());
    }
    let matcher = globset::GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?
        .compile_matcher();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot open directory {dir:?} for reading"))?;
    let mut matches = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed traversing directory {dir:?}"))?
    {
        if matcher.is_match(std::path::Path::new(&entry.file_name())) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}

/// Lists files of a local directory whose names match a glob pattern.
pub async fn get_files(
    dirname: &str,
    pattern: &str,
    remote_host: Option<&str>,
) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for path in list_content(dirname, pattern, remote_host).await? {
        if tokio::fs::metadata(&path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
        {
            files.push(path);
        }
    }
    Ok(files)
}

/// Lists subdirectories of a local directory whose names match a glob
/// pattern.
pub async fn get_dirs(
    dirname: &str,
    pattern: &str,
    remote_host: Option<&str>,
) -> anyhow::Result<Vec<std::path::PathBuf>> {
    let mut dirs = Vec::new();
    for path in list_content(dirname, pattern, remote_host).await? {
        if tokio::fs::metadata(&path)
            .await
            .map(|metadata| metadata.is_dir())
            .unwrap_or(false)
        {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

// destructive operations refuse an existing destination unless forced
async fn clear_destination(src: &str, dest: &str, force: bool, operation: &str) -> bool {
    if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
        return true;
    }
    if !force {
        tracing::error!("Cannot {operation} {src} to {dest}, destination already exists");
        return false;
    }
    local_remove(dest, force).await
}

async fn transfer(src: &str, dest: &str) -> anyhow::Result<bool> {
    if !crate::executable("scp") {
        return Err(ToolError::MissingDependency("scp".to_string()).into());
    }
    let mut job = Job::new(["scp", "-r", src, dest]);
    let exit_code = job.execute(&ExecOptions::default()).await?;
    Ok(exit_code == 0)
}

async fn transfer_and_remove(src: &str, dest: &str) -> anyhow::Result<bool> {
    if !transfer(src, dest).await? {
        return Ok(false);
    }
    if !remove(src, false).await? {
        tracing::warn!("Moved {src} to {dest} but removing the source failed; both copies remain");
        return Ok(false);
    }
    Ok(true)
}

async fn local_remove(path: &str, _force: bool) -> bool {
    let path = std::path::Path::new(path);
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(_) => return true, // already gone
    };
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Ok(()) => true,
        Err(error) => {
            tracing::error!("Failed to remove {path:?}: {error}");
            false
        }
    }
}

async fn local_copy(src: &str, dest: &str) -> bool {
    let is_file = match tokio::fs::metadata(src).await {
        Ok(metadata) => metadata.is_file(),
        Err(error) => {
            tracing::error!("Failed to copy {src} to {dest}: {error}");
            return false;
        }
    };
    let result = if is_file {
        tokio::fs::copy(src, dest)
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from)
    } else {
        copy_dir(std::path::PathBuf::from(src), std::path::PathBuf::from(dest)).await
    };
    match result {
        Ok(()) => true,
        Err(error) => {
            tracing::error!("Failed to copy {src} to {dest}: {error:#}");
            false
        }
    }
}

async fn copy_entry(src: std::path::PathBuf, dest: std::path::PathBuf) -> anyhow::Result<()> {
    if tokio::fs::metadata(&src).await?.is_file() {
        tokio::fs::copy(&src, &dest).await?;
        return Ok(());
    }
    copy_dir(src, dest).await
}

#[async_recursion]
async fn copy_dir(src: std::path::PathBuf, dest: std::path::PathBuf) -> anyhow::Result<()> {
    let mut entries = tokio::fs::read_dir(&src)
        .await
        .with_context(|| format!("cannot open directory {src:?} for reading"))?;
    tokio::fs::create_dir(&dest)
        .await
        .with_context(|| format!("failed to create directory {dest:?}"))?;
    let mut join_set = tokio::task::JoinSet::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed traversing directory {src:?}"))?
    {
        let entry_path = entry.path();
        let Some(entry_name) = entry_path.file_name() else {
            continue;
        };
        let dest_path = dest.join(entry_name);
        join_set.spawn(copy_entry(entry_path, dest_path));
    }
    while let Some(res) = join_set.join_next().await {
        res??;
    }
    Ok(())
}

async fn local_move(src: &str, dest: &str) -> bool {
    if let Err(rename_error) = tokio::fs::rename(src, dest).await {
        // renames fail across filesystems; fall back to copy + remove
        tracing::debug!("Rename of {src} failed ({rename_error}), copying instead");
        if !local_copy(src, dest).await {
            tracing::error!("Failed to move {src} to {dest}");
            return false;
        }
        return local_remove(src, true).await;
    }
    true
}

async fn local_rename(src: &str, dest: &str) -> bool {
    match tokio::fs::rename(src, dest).await {
        Ok(()) => true,
        Err(error) => {
            tracing::error!("Failed to rename {src} to {dest}: {error}");
            false
        }
    }
}

async fn local_mkdir(dirname: &str, force: bool) -> bool {
    tracing::debug!("Creating new directory: {dirname}");
    let result = if force {
        tokio::fs::create_dir_all(dirname).await
    } else {
        tokio::fs::create_dir(dirname).await
    };
    match result {
        Ok(()) => true,
        Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
            // an existing directory is fine, an existing file is not
            tokio::fs::metadata(dirname)
                .await
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false)
        }
        Err(error) => {
            tracing::error!("Failed to create directory {dirname}: {error}");
            false
        }
    }
}

async fn local_extract(archive: &str, dest: Option<&str>) -> bool {
    if !tokio::fs::metadata(archive)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
    {
        tracing::error!("Cannot extract {archive}, no such file");
        return false;
    }
    let dest = match dest {
        Some(dest) => std::path::PathBuf::from(dest),
        None => match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(error) => {
                tracing::error!("Failed to resolve the current directory: {error}");
                return false;
            }
        },
    };
    let archive = std::path::PathBuf::from(archive);
    // the zip reader is synchronous; keep it off the async workers
    let unpack = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let file = std::fs::File::open(&archive)
            .with_context(|| format!("failed to open archive {archive:?}"))?;
        let mut zip_archive = zip::ZipArchive::new(file)
            .with_context(|| format!("failed to read archive {archive:?}"))?;
        zip_archive
            .extract(&dest)
            .with_context(|| format!("failed to extract into {dest:?}"))?;
        Ok(())
    });
    match unpack.await {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            tracing::error!("{error:#}");
            false
        }
        Err(error) => {
            tracing::error!("Extraction task failed: {error}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils;

    #[tokio::test]
    async fn test_conflicting_endpoint_is_fatal_before_io() {
        for result in [
            is_file("host:/x", Some("otherhost")).await,
            is_dir("host:/x", Some("otherhost")).await,
            exists("host:/x", Some("otherhost")).await,
            mkdir("host:/x", false, Some("otherhost")).await,
            extract("host:/x.zip", None, Some("otherhost")).await,
        ] {
            let error = result.unwrap_err();
            assert!(matches!(
                error.downcast_ref::<ToolError>(),
                Some(ToolError::ConflictingEndpoint(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_remote_listing_is_rejected() {
        assert!(list_content("host:/srv", "*", None).await.is_err());
        assert!(get_files("/tmp", "*", Some("host")).await.is_err());
    }

    #[tokio::test]
    async fn test_existence_checks() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let foo = tmp_dir.join("foo");
        let file = foo.join("0.txt");
        assert!(exists(foo.to_str().unwrap(), None).await?);
        assert!(is_dir(foo.to_str().unwrap(), None).await?);
        assert!(!is_file(foo.to_str().unwrap(), None).await?);
        assert!(is_file(file.to_str().unwrap(), None).await?);
        assert!(!is_dir(file.to_str().unwrap(), None).await?);
        assert!(!exists(tmp_dir.join("missing").to_str().unwrap(), None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_missing_path_succeeds() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let missing = tmp_dir.join("nothing-here");
        assert!(remove(missing.to_str().unwrap(), false).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_file_and_directory() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let file = tmp_dir.join("foo").join("0.txt");
        let dir = tmp_dir.join("foo").join("bar");
        assert!(remove(file.to_str().unwrap(), false).await?);
        assert!(!file.exists());
        assert!(remove(dir.to_str().unwrap(), false).await?);
        assert!(!dir.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_refuses_existing_destination() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("foo").join("0.txt");
        let dest = tmp_dir.join("foo").join("bar").join("1.txt");
        assert!(!copy(src.to_str().unwrap(), dest.to_str().unwrap(), false).await?);
        // destination is byte-for-byte untouched
        assert_eq!(tokio::fs::read_to_string(&dest).await?, "1");
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_with_force_overwrites() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("foo").join("0.txt");
        let dest = tmp_dir.join("foo").join("bar").join("1.txt");
        assert!(copy(src.to_str().unwrap(), dest.to_str().unwrap(), true).await?);
        assert_eq!(
            tokio::fs::read_to_string(&dest).await?,
            tokio::fs::read_to_string(&src).await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_directory_recursively() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("foo");
        let dest = tmp_dir.join("copy-of-foo");
        assert!(copy(src.to_str().unwrap(), dest.to_str().unwrap(), false).await?);
        assert_eq!(
            tokio::fs::read_to_string(dest.join("0.txt")).await?,
            "0"
        );
        assert_eq!(
            tokio::fs::read_to_string(dest.join("bar").join("2.txt")).await?,
            "2"
        );
        assert!(dest.join("baz").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("missing");
        let dest = tmp_dir.join("dest");
        assert!(!copy(src.to_str().unwrap(), dest.to_str().unwrap(), false).await?);
        assert!(!dest.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_move_leaves_no_source_behind() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("foo").join("0.txt");
        let dest = tmp_dir.join("moved.txt");
        assert!(move_path(src.to_str().unwrap(), dest.to_str().unwrap(), false).await?);
        assert!(!src.exists());
        assert_eq!(tokio::fs::read_to_string(&dest).await?, "0");
        Ok(())
    }

    #[tokio::test]
    async fn test_move_refuses_existing_destination() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("foo").join("0.txt");
        let dest = tmp_dir.join("foo").join("bar").join("1.txt");
        assert!(!move_path(src.to_str().unwrap(), dest.to_str().unwrap(), false).await?);
        assert!(src.exists());
        assert_eq!(tokio::fs::read_to_string(&dest).await?, "1");
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_directory() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let src = tmp_dir.join("foo").join("baz");
        let dest = tmp_dir.join("foo").join("qux");
        assert!(rename(src.to_str().unwrap(), dest.to_str().unwrap(), false).await?);
        assert!(!src.exists());
        assert!(dest.join("4.txt").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn test_mkdir_without_force_needs_existing_parent() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let nested = tmp_dir.join("a").join("b").join("c");
        assert!(!mkdir(nested.to_str().unwrap(), false, None).await?);
        assert!(mkdir(nested.to_str().unwrap(), true, None).await?);
        assert!(nested.is_dir());
        // an existing directory is success either way
        assert!(mkdir(nested.to_str().unwrap(), false, None).await?);
        assert!(mkdir(nested.to_str().unwrap(), true, None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_mkdir_rejects_empty_name() -> anyhow::Result<()> {
        assert!(!mkdir("", false, None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_mkdir_over_existing_file_fails() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let file = tmp_dir.join("foo").join("0.txt");
        assert!(!mkdir(file.to_str().unwrap(), false, None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_with_glob_patterns() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let foo = tmp_dir.join("foo");
        let dirname = foo.to_str().unwrap();
        let everything = list_content(dirname, "*", None).await?;
        assert_eq!(everything.len(), 3); // 0.txt, bar, baz
        let text_files = list_content(dirname, "*.txt", None).await?;
        assert_eq!(text_files, vec![foo.join("0.txt")]);
        let files = get_files(dirname, "*", None).await?;
        assert_eq!(files, vec![foo.join("0.txt")]);
        let dirs = get_dirs(dirname, "*", None).await?;
        assert_eq!(dirs, vec![foo.join("bar"), foo.join("baz")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_missing_directory_is_empty() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let missing = tmp_dir.join("not-a-dir");
        assert!(list_content(missing.to_str().unwrap(), "*", None)
            .await?
            .is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_missing_archive_fails() -> anyhow::Result<()> {
        let tmp_dir = testutils::setup_test_dir().await?;
        let archive = tmp_dir.join("missing.zip");
        assert!(!extract(archive.to_str().unwrap(), None, None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_unpacks_zip_archive() -> anyhow::Result<()> {
        use std::io::Write;
        let tmp_dir = testutils::setup_test_dir().await?;
        let archive = tmp_dir.join("bundle.zip");
        {
            let file = std::fs::File::create(&archive)?;
            let mut writer = zip::ZipWriter::new(file);
            writer.start_file("hello.txt", zip::write::SimpleFileOptions::default())?;
            writer.write_all(b"hi there")?;
            writer.add_directory("sub", zip::write::SimpleFileOptions::default())?;
            writer.start_file("sub/nested.txt", zip::write::SimpleFileOptions::default())?;
            writer.write_all(b"nested")?;
            writer.finish()?;
        }
        let dest = tmp_dir.join("unpacked");
        tokio::fs::create_dir(&dest).await?;
        assert!(
            extract(
                archive.to_str().unwrap(),
                Some(dest.to_str().unwrap()),
                None
            )
            .await?
        );
        assert_eq!(
            tokio::fs::read_to_string(dest.join("hello.txt")).await?,
            "hi there"
        );
        assert_eq!(
            tokio::fs::read_to_string(dest.join("sub").join("nested.txt")).await?,
            "nested"
        );
        Ok(())
    }
}
