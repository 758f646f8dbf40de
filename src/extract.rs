use crate::error::{InstallError, Result};
use crate::shell::{glob_literal, quote, run_sequence, CommandRunner, MatchKind, Step, MATCH};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;

fn scratch_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("jdkman-i-").tempdir()?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Drop the first `count` normal components of `path`; `None` when nothing
/// is left or the remainder would escape the destination.
fn strip_components(path: &Path, count: usize) -> Option<PathBuf> {
    let mut stripped = PathBuf::new();
    let mut skipped = 0;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(_) if skipped < count => skipped += 1,
            Component::Normal(part) => stripped.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Extract a gzipped tarball into `target`, dropping the single top-level
/// directory every distribution wraps its content in.
pub fn extract_tgz(source: &Path, target: &Path) -> Result<()> {
    tracing::info!("Extracting {} to {}", source.display(), target.display());
    unpack_tgz(source, target).map_err(|e| InstallError::Archive {
        archive: source.to_path_buf(),
        source: e,
    })
}

/// Whether `path` stays inside `root` once the symlinks among its existing
/// ancestors are resolved. `root` must already be canonical.
fn resolves_within(root: &Path, path: &Path) -> io::Result<bool> {
    let mut existing = path;
    while fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Ok(false),
        }
    }
    Ok(existing.canonicalize()?.starts_with(root))
}

fn unpack_tgz(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;
    let root = target.canonicalize()?;
    let file = fs::File::open(source)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let Some(relative) = strip_components(&path, 1) else {
            continue;
        };
        let dest = root.join(&relative);
        let parent = dest.parent().unwrap_or(root.as_path());
        if !resolves_within(&root, parent)? {
            tracing::warn!("Skipping {}: it resolves outside the install directory", path.display());
            continue;
        }
        fs::create_dir_all(parent)?;

        // A later entry must not write through a symlink an earlier one left here
        if !entry.header().entry_type().is_dir()
            && fs::symlink_metadata(&dest).map(|m| m.file_type().is_symlink()).unwrap_or(false)
        {
            fs::remove_file(&dest)?;
        }

        // Hard links name their target by archive path, which was stripped too
        if entry.header().entry_type().is_hard_link() {
            if let Some(link) = entry.link_name()? {
                if let Some(link_relative) = strip_components(&link, 1) {
                    let link_target = root.join(link_relative);
                    if resolves_within(&root, &link_target)? {
                        fs::hard_link(link_target, &dest)?;
                    } else {
                        tracing::warn!("Skipping hard link {} outside the install directory", path.display());
                    }
                }
            }
            continue;
        }

        entry.unpack(&dest)?;
    }
    Ok(())
}

/// Prefix to strip from every zip entry, found by looking for the first level
/// below the root where the archive fans out.
///
/// An entry's depth is its count of `/` separators, plus one for files. The
/// directory remembered at the level above the first multi-entry level (other
/// than the root) is the wrapper to flatten away.
pub fn zip_prefix_to_strip<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut entries_per_level: BTreeMap<usize, usize> = BTreeMap::new();
    let mut dir_per_level: BTreeMap<usize, &str> = BTreeMap::new();

    for (name, is_dir) in entries {
        let mut level = name.matches('/').count();
        if is_dir {
            dir_per_level.insert(level, name);
        } else {
            level += 1;
        }
        *entries_per_level.entry(level).or_default() += 1;
    }

    entries_per_level
        .iter()
        .find(|(level, count)| **level > 0 && **count > 1)
        .and_then(|(level, _)| dir_per_level.get(&(level - 1)))
        .map(|prefix| prefix.to_string())
        .unwrap_or_default()
}

pub fn extract_zip(source: &Path, target: &Path) -> Result<()> {
    tracing::info!("Extracting {} to {}", source.display(), target.display());
    let zip_error = |e| InstallError::Zip {
        archive: source.to_path_buf(),
        source: e,
    };
    let io_error = |e| InstallError::Archive {
        archive: source.to_path_buf(),
        source: e,
    };

    let file = fs::File::open(source).map_err(io_error)?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;

    let mut listing = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(zip_error)?;
        listing.push((entry.name().to_string(), entry.is_dir()));
    }
    let prefix = zip_prefix_to_strip(listing.iter().map(|(name, is_dir)| (name.as_str(), *is_dir)));
    if !prefix.is_empty() {
        tracing::debug!("Stripping '{}' from zip entries", prefix);
    }

    fs::create_dir_all(target).map_err(io_error)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        let name = entry.name().to_string();
        let stripped = name.strip_prefix(prefix.as_str()).unwrap_or(&name);
        if stripped.is_empty() {
            continue;
        }
        let relative = Path::new(stripped);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            tracing::warn!("Skipping malicious path in zip: {}", name);
            continue;
        }
        let outpath = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(io_error)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let mode = entry.unix_mode();
        write_entry(&mut entry, &outpath, mode).map_err(io_error)?;
    }
    Ok(())
}

fn write_entry(reader: &mut impl io::Read, outpath: &Path, mode: Option<u32>) -> io::Result<()> {
    let mut outfile = fs::File::create(outpath)?;
    io::copy(reader, &mut outfile)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(outpath, fs::Permissions::from_mode(mode & 0o7777))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Steps for a self-extracting `.bin`: run it in scratch space with an empty
/// line on stdin (accepting any license prompt), then move the `jdk*`
/// directory it unpacks into `target`.
pub fn bin_plan(source: &Path, scratch: &Path, target: &Path) -> Vec<Step> {
    let name = file_name(source);
    vec![
        Step::run(format!("cp {} {}", quote(source), quote(scratch))),
        Step::labeled(
            format!(
                "Extracting {} to {}",
                scratch.join(&name).display(),
                target.display()
            ),
            format!(
                "cd {} && echo | sh {}",
                quote(scratch),
                quote(Path::new(&name))
            ),
        ),
        Step::if_match(
            format!("{}/jdk*", glob_literal(scratch)),
            MatchKind::Dir,
            format!("mv {} {}", MATCH, quote(target)),
        ),
    ]
}

pub fn extract_bin<R: CommandRunner + ?Sized>(runner: &R, source: &Path, target: &Path) -> Result<()> {
    let scratch = scratch_dir()?;
    let result = run_sequence(runner, &bin_plan(source, scratch.path(), target));
    if result.is_err() {
        let kept = scratch.keep();
        tracing::debug!("Keeping scratch directory {} for inspection", kept.display());
    }
    result
}

pub struct DmgPlan {
    pub mount: Vec<Step>,
    pub extract: Vec<Step>,
    pub unmount: Vec<Step>,
}

/// Steps for a disk image: mount it, expand the installer package, then try
/// each known payload layout in turn.
pub fn dmg_plan(source: &Path, scratch: &Path, target: &Path) -> DmgPlan {
    let basename = file_name(source);
    let mountpoint = scratch.join(&basename);
    let pkgdir = scratch.join(format!("{}-pkg", basename));

    let mount = vec![Step::labeled(
        format!("Mounting {}", source.display()),
        format!("hdiutil mount -mountpoint {} {}", quote(&mountpoint), quote(source)),
    )];

    let extract = vec![
        Step::labeled(
            format!("Extracting {} to {}", source.display(), target.display()),
            format!("pkgutil --expand {}/*.pkg {}", quote(&mountpoint), quote(&pkgdir)),
        ),
        Step::run(format!("mkdir -p {}", quote(target))),
        // Vendor package: the payload is the JDK bundle itself
        Step::if_match(
            format!("{}/jdk*.pkg/Payload", glob_literal(&pkgdir)),
            MatchKind::Any,
            format!("tar xvf {} -C {}", MATCH, quote(target)),
        ),
        // Legacy Apple package: the bundle sits under Library/Java
        Step::if_match(
            format!("{}/JavaForOSX.pkg/Payload", glob_literal(&pkgdir)),
            MatchKind::Any,
            format!(
                "tar xzf {} -C {} && mv {}/Library/Java/JavaVirtualMachines/*/Contents {}",
                MATCH,
                quote(&pkgdir),
                quote(&pkgdir),
                quote(&target.join("Contents"))
            ),
        ),
    ];

    let unmount = vec![Step::labeled(
        format!("Unmounting {}", source.display()),
        format!("hdiutil unmount {}", quote(&mountpoint)),
    )];

    DmgPlan {
        mount,
        extract,
        unmount,
    }
}

pub fn extract_dmg<R: CommandRunner + ?Sized>(runner: &R, source: &Path, target: &Path) -> Result<()> {
    let scratch = scratch_dir()?;
    let plan = dmg_plan(source, scratch.path(), target);

    run_sequence(runner, &plan.mount)?;
    let extracted = run_sequence(runner, &plan.extract);
    let unmounted = run_sequence(runner, &plan.unmount);

    // Never recursively delete a directory that may still hold a mounted volume
    if unmounted.is_err() || extracted.is_err() {
        let kept = scratch.keep();
        tracing::debug!("Keeping scratch directory {} for inspection", kept.display());
    }
    extracted.and(unmounted)
}
