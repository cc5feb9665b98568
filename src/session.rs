//! Capture sessions: one numbered output directory per run.
//!
//! Layout:
//! ```text
//! <output_root>/sequence_<session_id>/player_<index>.png
//! <output_root>/sequence_<session_id>/opponent_<index>.png
//! ```
//! Both frames of a pair are staged as hidden `.partial` files inside the
//! session directory and only then moved to their final names, so a failed
//! write never leaves half a pair behind. A process that is killed mid-write
//! can still leave staging files; `open` removes those from earlier sessions.

use std::ffi::OsStr;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat};
use tempfile::NamedTempFile;

use crate::capture::Role;
use crate::error::{ConfigError, PersistError};

const SESSION_PREFIX: &str = "sequence_";
const STAGING_SUFFIX: &str = ".partial";

/// Returns the directory name for a session id.
pub fn session_dir_name(id: u32) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}

/// Returns the file name of one frame.
pub fn frame_file_name(role: Role, index: u32) -> String {
    format!("{}_{}.png", role.file_prefix(), index)
}

/// Paths of a pair that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPair {
    pub index: u32,
    pub player: PathBuf,
    pub opponent: PathBuf,
}

/// The output scope of one process run.
#[derive(Debug)]
pub struct SequenceSession {
    id: u32,
    dir: PathBuf,
    frame_counter: u32,
}

impl SequenceSession {
    /// Creates the next session directory under `root`.
    ///
    /// The id is the number of `sequence_<n>` directories already present.
    /// If that name is taken (a lower-numbered session was deleted), the next
    /// free id is used instead.
    pub fn open(root: &Path) -> Result<Self, ConfigError> {
        let root_error = |source| ConfigError::OutputRoot {
            path: root.to_path_buf(),
            source,
        };

        fs::create_dir_all(root).map_err(root_error)?;
        match sweep_staging_files(root) {
            Ok(0) => {}
            Ok(n) => log::warn!("Removed {} leftover staging files from earlier sessions", n),
            Err(e) => log::warn!("Could not clean up staging files in {}: {}", root.display(), e),
        }
        let existing = count_sessions(root).map_err(root_error)?;

        let mut id = existing;
        let dir = loop {
            let dir = root.join(session_dir_name(id));
            match fs::create_dir(&dir) {
                Ok(()) => break dir,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::warn!(
                        "{} already exists although only {} sessions were found, trying the next id",
                        dir.display(),
                        existing
                    );
                    id = id.checked_add(1).ok_or_else(|| {
                        root_error(std::io::Error::other("session ids exhausted"))
                    })?;
                }
                Err(e) => return Err(root_error(e)),
            }
        };

        // Creating the directory does not prove files can be written into it
        tempfile::tempfile_in(&dir).map_err(root_error)?;

        log::info!("Session {} opened at {}", id, dir.display());
        Ok(Self {
            id,
            dir,
            frame_counter: 0,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of indices handed out so far.
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Reserves the next one-based frame index.
    pub fn next_index(&mut self) -> u32 {
        self.frame_counter += 1;
        self.frame_counter
    }

    /// Final path of one frame in this session.
    pub fn frame_path(&self, role: Role, index: u32) -> PathBuf {
        self.dir.join(frame_file_name(role, index))
    }

    /// Writes both frames of a pair, or neither.
    pub fn persist_pair(
        &self,
        index: u32,
        player: &GrayImage,
        opponent: &GrayImage,
    ) -> Result<PersistedPair, PersistError> {
        let player_path = self.frame_path(Role::Player, index);
        let opponent_path = self.frame_path(Role::Opponent, index);
        if player_path.exists() || opponent_path.exists() {
            return Err(PersistError::IndexExists(index));
        }

        // A staged file is deleted when dropped, so an early return cleans up
        let player_tmp = self.stage(Role::Player, index, player)?;
        let opponent_tmp = self.stage(Role::Opponent, index, opponent)?;

        publish([
            (player_tmp, player_path.as_path()),
            (opponent_tmp, opponent_path.as_path()),
        ])?;

        Ok(PersistedPair {
            index,
            player: player_path,
            opponent: opponent_path,
        })
    }

    /// Encodes a frame into a hidden temporary file in the session directory.
    fn stage(&self, role: Role, index: u32, pixels: &GrayImage) -> Result<NamedTempFile, PersistError> {
        let stage_error = |source| PersistError::Stage {
            role,
            dir: self.dir.clone(),
            source,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{}_{}", role.file_prefix(), index))
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(stage_error)?;

        let mut writer = BufWriter::new(&mut tmp);
        pixels
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|source| PersistError::Encode { role, source })?;
        writer.flush().map_err(stage_error)?;
        drop(writer);

        Ok(tmp)
    }
}

/// Moves staged files to their final names in order.
///
/// Never overwrites an existing file. If any move fails, the files already
/// published are removed again and the remaining staged files are dropped.
fn publish<const N: usize>(staged: [(NamedTempFile, &Path); N]) -> Result<(), PersistError> {
    let mut published: Vec<&Path> = Vec::with_capacity(N);

    for (tmp, path) in staged {
        if let Err(e) = tmp.persist_noclobber(path) {
            for done in published {
                if let Err(rm) = fs::remove_file(done) {
                    log::error!("Failed to remove orphaned frame {}: {}", done.display(), rm);
                }
            }
            return Err(PersistError::Publish {
                path: path.to_path_buf(),
                source: e.error,
            });
        }
        published.push(path);
    }

    Ok(())
}

/// Counts `sequence_<n>` directories directly under `root`.
fn count_sessions(root: &Path) -> std::io::Result<u32> {
    let mut count = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if is_session_name(&entry.file_name()) {
            count += 1;
        }
    }
    Ok(count)
}

fn is_session_name(name: &OsStr) -> bool {
    name.to_str()
        .and_then(|n| n.strip_prefix(SESSION_PREFIX))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Deletes staging files a killed run left in existing session directories.
fn sweep_staging_files(root: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() || !is_session_name(&entry.file_name()) {
            continue;
        }
        for file in fs::read_dir(entry.path())? {
            let file = file?;
            let is_staging = file
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with('.') && n.ends_with(STAGING_SUFFIX));
            if is_staging && file.file_type()?.is_file() {
                fs::remove_file(file.path())?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}
