//! Layout of the data root and the per-branch database files
//!
//! ```text
//! <root>/accounts.db
//! <root>/.staybook.lock
//! <root>/branch_database/<username>.db
//! ```
//!
//! File moves and removals hold an exclusive advisory lock on
//! `.staybook.lock` so two processes never shuffle the same branch file.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{HotelError, Result};

pub const ACCOUNTS_FILE: &str = "accounts.db";
pub const BRANCH_DIR: &str = "branch_database";
const LOCK_FILE: &str = ".staybook.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_NAME_LEN: usize = 64;

/// SQLite keeps these next to a database in WAL mode
const SIDECAR_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

/// The data root holding the accounts database and branch shards
#[derive(Debug, Clone)]
pub struct BranchDirectory {
    root: PathBuf,
}

/// Held while branch files are being moved; released on drop
#[derive(Debug)]
pub struct ShardLock {
    _file: File,
}

impl BranchDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.root.join(ACCOUNTS_FILE)
    }

    pub fn branch_dir(&self) -> PathBuf {
        self.root.join(BRANCH_DIR)
    }

    /// Path of a branch's database file. The username must be usable as a
    /// file name on every platform.
    pub fn branch_db_path(&self, username: &str) -> Result<PathBuf> {
        validate_branch_name(username)?;
        Ok(self.branch_dir().join(format!("{}.db", username)))
    }

    pub fn branch_db_exists(&self, username: &str) -> Result<bool> {
        Ok(self.branch_db_path(username)?.exists())
    }

    /// Acquire the exclusive shard lock, waiting up to five seconds
    pub fn lock(&self) -> Result<ShardLock> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::WouldBlock || is_lock_contended(&e) => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        return Err(HotelError::LockTimeout(path));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Lock holder info for debugging
        let _ = writeln!(file, "Locked by PID {}", std::process::id());
        Ok(ShardLock { _file: file })
    }

    /// Moves a branch database to its new username.
    ///
    /// A branch that never opened its database has no file; that is not an
    /// error. Fails if a file for `new` already exists.
    pub fn rename_branch_db(&self, _lock: &ShardLock, old: &str, new: &str) -> Result<()> {
        let from = self.branch_db_path(old)?;
        let to = self.branch_db_path(new)?;

        if from == to {
            return Ok(());
        }
        if to.exists() {
            return Err(HotelError::DuplicateBranch(new.to_string()));
        }
        if !from.exists() {
            tracing::debug!(old, new, "no branch database to rename");
            return Ok(());
        }

        move_with_sidecars(&from, &to)?;
        tracing::info!(old, new, "branch database renamed");
        Ok(())
    }

    /// Moves a branch database aside so its removal can still be undone.
    /// Returns the staged path, or `None` if the branch had no file.
    pub fn stage_removal(&self, _lock: &ShardLock, username: &str) -> Result<Option<PathBuf>> {
        let path = self.branch_db_path(username)?;
        if !path.exists() {
            return Ok(None);
        }

        let staged = path.with_extension("db.deleting");
        move_with_sidecars(&path, &staged)?;
        Ok(Some(staged))
    }

    /// Puts a staged database back under its username
    pub fn restore_staged(&self, _lock: &ShardLock, staged: &Path, username: &str) -> Result<()> {
        let path = self.branch_db_path(username)?;
        move_with_sidecars(staged, &path)
    }

    /// Deletes a staged database for good
    pub fn finish_removal(&self, _lock: &ShardLock, staged: &Path) -> Result<()> {
        remove_if_exists(staged)?;
        for suffix in SIDECAR_SUFFIXES {
            remove_if_exists(&sidecar_path(staged, suffix))?;
        }
        tracing::info!(path = %staged.display(), "branch database removed");
        Ok(())
    }

    /// Deletes a branch database and its sidecars. Missing files are fine.
    pub fn remove_branch_db(&self, lock: &ShardLock, username: &str) -> Result<()> {
        match self.stage_removal(lock, username)? {
            Some(staged) => self.finish_removal(lock, &staged),
            None => Ok(()),
        }
    }
}

/// Checks that a username is a safe, portable file stem
pub fn validate_branch_name(username: &str) -> Result<()> {
    let valid = !username.is_empty()
        && username.len() <= MAX_NAME_LEN
        && !username.starts_with('.')
        && username.trim() == username
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(HotelError::InvalidBranchName(username.to_string()))
    }
}

/// Moves a database file and any sidecars. If one move fails, the moves
/// already made are undone so the files stay together under `from`.
fn move_with_sidecars(from: &Path, to: &Path) -> Result<()> {
    let mut moves = vec![(from.to_path_buf(), to.to_path_buf())];
    for suffix in SIDECAR_SUFFIXES {
        let sidecar = sidecar_path(from, suffix);
        if sidecar.exists() {
            moves.push((sidecar, sidecar_path(to, suffix)));
        }
    }

    for (done, (src, dst)) in moves.iter().enumerate() {
        if let Err(err) = fs::rename(src, dst) {
            for (src, dst) in moves[..done].iter().rev() {
                if let Err(undo) = fs::rename(dst, src) {
                    tracing::error!(error = %undo, path = %dst.display(), "failed to undo move");
                }
            }
            return Err(err.into());
        }
    }
    Ok(())
}

fn sidecar_path(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn is_lock_contended(err: &std::io::Error) -> bool {
    err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"db").unwrap();
    }

    #[test]
    fn test_layout() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        assert_eq!(shards.accounts_path(), dir.path().join("accounts.db"));
        assert_eq!(
            shards.branch_db_path("iloilo").unwrap(),
            dir.path().join("branch_database").join("iloilo.db")
        );
    }

    #[test]
    fn test_branch_name_rules() {
        assert!(validate_branch_name("Iloilo City-2_b.v").is_ok());
        assert!(validate_branch_name("").is_err());
        assert!(validate_branch_name("../escape").is_err());
        assert!(validate_branch_name(".hidden").is_err());
        assert!(validate_branch_name("a/b").is_err());
        assert!(validate_branch_name(" padded").is_err());
        assert!(validate_branch_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_rename_moves_database_and_sidecars() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        let old = shards.branch_db_path("iloilo").unwrap();
        touch(&old);
        touch(&sidecar_path(&old, "-wal"));

        let lock = shards.lock().unwrap();
        shards.rename_branch_db(&lock, "iloilo", "iloilo-city").unwrap();

        assert!(!old.exists());
        let new = shards.branch_db_path("iloilo-city").unwrap();
        assert!(new.exists());
        assert!(sidecar_path(&new, "-wal").exists());
    }

    #[test]
    fn test_failed_sidecar_move_keeps_files_together() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        let old = shards.branch_db_path("iloilo").unwrap();
        touch(&old);
        touch(&sidecar_path(&old, "-wal"));

        // A non-empty directory squatting on the new WAL name blocks that move
        let new = shards.branch_db_path("iloilo-city").unwrap();
        touch(&sidecar_path(&new, "-wal").join("blocker"));

        let lock = shards.lock().unwrap();
        assert!(shards.rename_branch_db(&lock, "iloilo", "iloilo-city").is_err());

        assert!(old.exists());
        assert!(sidecar_path(&old, "-wal").is_file());
        assert!(!new.exists());
    }

    #[test]
    fn test_rename_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        touch(&shards.branch_db_path("iloilo").unwrap());
        touch(&shards.branch_db_path("bacolod").unwrap());

        let lock = shards.lock().unwrap();
        assert!(matches!(
            shards.rename_branch_db(&lock, "iloilo", "bacolod"),
            Err(HotelError::DuplicateBranch(_))
        ));
        assert!(shards.branch_db_exists("iloilo").unwrap());
    }

    #[test]
    fn test_rename_without_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        let lock = shards.lock().unwrap();
        shards.rename_branch_db(&lock, "iloilo", "cebu").unwrap();
        assert!(!shards.branch_db_exists("cebu").unwrap());
    }

    #[test]
    fn test_staged_removal_can_be_restored() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        touch(&shards.branch_db_path("iloilo").unwrap());
        let lock = shards.lock().unwrap();

        let staged = shards.stage_removal(&lock, "iloilo").unwrap().unwrap();
        assert!(!shards.branch_db_exists("iloilo").unwrap());
        shards.restore_staged(&lock, &staged, "iloilo").unwrap();
        assert!(shards.branch_db_exists("iloilo").unwrap());

        shards.remove_branch_db(&lock, "iloilo").unwrap();
        assert!(!shards.branch_db_exists("iloilo").unwrap());
        assert!(!staged.exists());

        // Removing again is fine
        shards.remove_branch_db(&lock, "iloilo").unwrap();
    }

    #[test]
    fn test_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let shards = BranchDirectory::new(dir.path());
        let _held = shards.lock().unwrap();

        let path = dir.path().join(LOCK_FILE);
        let other = OpenOptions::new().write(true).open(&path).unwrap();
        assert!(other.try_lock_exclusive().is_err());
    }
}
