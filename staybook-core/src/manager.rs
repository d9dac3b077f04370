//! Entry point tying the accounts database to the branch database files

use std::path::Path;

use crate::db::{AccountDatabase, HotelDatabase};
use crate::error::{HotelError, Result};
use crate::models::{Branch, BranchDraft, Session};
use crate::shard::{validate_branch_name, BranchDirectory, ShardLock};
use crate::validation::{
    normalize_branch, validate_admin_password, validate_branch, validate_branch_update,
    DEFAULT_MIN_PASSWORD_LENGTH,
};

/// An opened data root: accounts plus access to every branch database
pub struct Staybook {
    accounts: AccountDatabase,
    shards: BranchDirectory,
    min_password_length: usize,
}

impl Staybook {
    /// Opens the data root, creating `accounts.db` if needed
    pub fn open<P: AsRef<Path>>(data_root: P) -> Result<Self> {
        let shards = BranchDirectory::new(data_root);
        let accounts = AccountDatabase::open(shards.accounts_path())?;
        Ok(Self {
            accounts,
            shards,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        })
    }

    pub fn with_min_password_length(mut self, min_password_length: usize) -> Self {
        self.min_password_length = min_password_length;
        self
    }

    pub fn accounts(&self) -> &AccountDatabase {
        &self.accounts
    }

    pub fn shards(&self) -> &BranchDirectory {
        &self.shards
    }

    // =========================================================================
    // Login
    // =========================================================================

    pub fn admin_exists(&self) -> Result<bool> {
        self.accounts.admin_exists()
    }

    /// Creates the administrator from the password and its confirmation
    pub fn create_administrator(&self, password: &str, confirm_password: &str) -> Result<()> {
        validate_admin_password(password, confirm_password, self.min_password_length)?;
        self.accounts.create_administrator(password)
    }

    pub fn login_admin(&self, password: &str) -> Result<Session> {
        if password.trim().is_empty() {
            return Err(HotelError::validation(
                "Password field is empty. Please enter password.",
            ));
        }
        self.accounts.validate_admin(password)?;
        tracing::info!("administrator logged in");
        Ok(Session::Administrator)
    }

    pub fn login_branch(&self, username: &str, password: &str) -> Result<Session> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(HotelError::validation(
                "Please enter both username and password.",
            ));
        }
        let branch = self.accounts.validate_branch(username, password)?;
        tracing::info!(username = %branch.username, "branch logged in");
        Ok(Session::Branch(branch.username))
    }

    /// Opens the database of the branch behind a session
    pub fn hotel(&self, session: &Session) -> Result<HotelDatabase> {
        match session {
            Session::Administrator => Err(HotelError::NoBranchDatabase),
            Session::Branch(username) => self.open_branch_db(username),
        }
    }

    fn open_branch_db(&self, username: &str) -> Result<HotelDatabase> {
        HotelDatabase::open(self.shards.branch_db_path(username)?)
    }

    // =========================================================================
    // Branch administration
    // =========================================================================

    /// Validates and adds a branch, creating its empty database.
    ///
    /// The row stays uncommitted until the database file exists, so a
    /// branch is never left without its file.
    pub fn add_branch(&mut self, draft: &BranchDraft) -> Result<Branch> {
        let draft = normalize_branch(draft);
        validate_branch(&draft, self.min_password_length)?;
        validate_branch_name(&draft.username)?;

        let lock = self.shards.lock()?;

        // A file left behind by a deleted branch must not be inherited
        if self.shards.branch_db_exists(&draft.username)? {
            return Err(HotelError::DuplicateBranch(draft.username));
        }

        let pending = self.accounts.begin_branch_add(&draft)?;
        let created = self
            .shards
            .branch_db_path(&draft.username)
            .and_then(HotelDatabase::open);
        if let Err(err) = created {
            drop(pending);
            self.discard_branch_db(&lock, &draft.username);
            return Err(err);
        }

        match pending.commit() {
            Ok(branch) => Ok(branch),
            Err(err) => {
                self.discard_branch_db(&lock, &draft.username);
                Err(err)
            }
        }
    }

    fn discard_branch_db(&self, lock: &ShardLock, username: &str) {
        if let Err(err) = self.shards.remove_branch_db(lock, username) {
            tracing::error!(error = %err, username, "failed to remove branch database");
        }
    }

    /// Updates a branch; a new username also renames its database file.
    ///
    /// The row change is held open while the file moves. A failed move
    /// rolls the row back, and a failed commit moves the file back.
    pub fn update_branch(&mut self, uid: i64, draft: &BranchDraft) -> Result<Branch> {
        let draft = normalize_branch(draft);
        validate_branch_update(&draft, self.min_password_length)?;
        validate_branch_name(&draft.username)?;

        let lock = self.shards.lock()?;
        let change = self.accounts.begin_branch_update(uid, &draft)?;

        if !change.renames() {
            let (_, updated) = change.commit()?;
            return updated.ok_or_else(|| HotelError::not_found("Branch", uid));
        }

        let old = change.previous().username.clone();
        self.shards.rename_branch_db(&lock, &old, &draft.username)?;

        match change.commit() {
            Ok((_, updated)) => updated.ok_or_else(|| HotelError::not_found("Branch", uid)),
            Err(err) => {
                if let Err(undo) = self.shards.rename_branch_db(&lock, &draft.username, &old) {
                    tracing::error!(
                        error = %undo,
                        old = %old,
                        "failed to restore branch database name"
                    );
                }
                Err(err)
            }
        }
    }

    /// Deletes a branch together with its database file
    pub fn delete_branch(&mut self, uid: i64) -> Result<Branch> {
        let lock = self.shards.lock()?;
        let change = self.accounts.begin_branch_delete(uid)?;
        let username = change.previous().username.clone();

        // Names from older releases may not be valid file stems; such
        // branches never had a reachable file.
        let staged = match validate_branch_name(&username) {
            Ok(()) => self.shards.stage_removal(&lock, &username)?,
            Err(_) => None,
        };

        match change.commit() {
            Ok((previous, _)) => {
                if let Some(staged) = staged {
                    self.shards.finish_removal(&lock, &staged)?;
                }
                Ok(previous)
            }
            Err(err) => {
                if let Some(staged) = staged {
                    if let Err(undo) = self.shards.restore_staged(&lock, &staged, &username) {
                        tracing::error!(
                            error = %undo,
                            username = %username,
                            "failed to restore branch database"
                        );
                    }
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, ReservationDraft, RoomDraft};
    use chrono::{Days, Local};
    use tempfile::TempDir;

    fn branch(username: &str) -> BranchDraft {
        BranchDraft {
            username: username.to_string(),
            address: "JM Basa St".to_string(),
            contact: "0335551234".to_string(),
            password: "branchpass".to_string(),
            confirm_password: "branchpass".to_string(),
        }
    }

    fn setup() -> (TempDir, Staybook) {
        let dir = TempDir::new().unwrap();
        let app = Staybook::open(dir.path()).unwrap();
        app.create_administrator("adminpass", "adminpass").unwrap();
        (dir, app)
    }

    #[test]
    fn test_first_run_needs_administrator() {
        let dir = TempDir::new().unwrap();
        let app = Staybook::open(dir.path()).unwrap();
        assert!(!app.admin_exists().unwrap());
        assert!(dir.path().join("accounts.db").exists());

        assert!(matches!(
            app.create_administrator("short", "short"),
            Err(HotelError::Validation(_))
        ));
        app.create_administrator("adminpass", "adminpass").unwrap();
        assert_eq!(app.login_admin("adminpass").unwrap(), Session::Administrator);
    }

    #[test]
    fn test_min_password_length_is_configurable() {
        let dir = TempDir::new().unwrap();
        let app = Staybook::open(dir.path()).unwrap().with_min_password_length(12);
        assert!(app.create_administrator("adminpass", "adminpass").is_err());
        assert!(app.create_administrator("adminpass1234", "adminpass1234").is_ok());
    }

    #[test]
    fn test_empty_login_fields() {
        let (_dir, app) = setup();
        assert!(matches!(app.login_admin("  "), Err(HotelError::Validation(_))));
        assert!(matches!(
            app.login_branch("", "branchpass"),
            Err(HotelError::Validation(_))
        ));
    }

    #[test]
    fn test_add_branch_creates_database() {
        let (dir, mut app) = setup();
        app.add_branch(&branch("iloilo")).unwrap();
        assert!(dir.path().join("branch_database").join("iloilo.db").exists());

        let session = app.login_branch("iloilo", "branchpass").unwrap();
        assert_eq!(session, Session::Branch("iloilo".to_string()));
        let hotel = app.hotel(&session).unwrap();
        assert!(hotel.list_rooms().unwrap().is_empty());
    }

    #[test]
    fn test_add_branch_rejects_unsafe_name() {
        let (_dir, mut app) = setup();
        assert!(matches!(
            app.add_branch(&branch("../../etc")),
            Err(HotelError::InvalidBranchName(_))
        ));
        assert!(app.accounts().list_branches().unwrap().is_empty());
    }

    #[test]
    fn test_add_branch_does_not_inherit_stray_file() {
        let (dir, mut app) = setup();
        let stray = dir.path().join("branch_database").join("cebu.db");
        std::fs::create_dir_all(stray.parent().unwrap()).unwrap();
        std::fs::write(&stray, b"").unwrap();

        assert!(matches!(
            app.add_branch(&branch("cebu")),
            Err(HotelError::DuplicateBranch(_))
        ));
    }

    #[test]
    fn test_add_branch_rolls_back_when_database_cannot_be_created() {
        let (dir, mut app) = setup();
        // A plain file where the branch directory should be
        std::fs::write(dir.path().join("branch_database"), b"").unwrap();

        assert!(app.add_branch(&branch("iloilo")).is_err());
        assert!(app.accounts().list_branches().unwrap().is_empty());
        assert!(app.login_branch("iloilo", "branchpass").is_err());
    }

    #[test]
    fn test_administrator_has_no_hotel() {
        let (_dir, app) = setup();
        assert!(matches!(
            app.hotel(&Session::Administrator),
            Err(HotelError::NoBranchDatabase)
        ));
    }

    #[test]
    fn test_rename_branch_moves_its_data() {
        let (dir, mut app) = setup();
        let created = app.add_branch(&branch("iloilo")).unwrap();
        {
            let session = app.login_branch("iloilo", "branchpass").unwrap();
            let mut hotel = app.hotel(&session).unwrap();
            let room = hotel.add_room(&RoomDraft::new("Single", 1200.0, 1)).unwrap();
            let today = Local::now().date_naive();
            hotel
                .add_reservation(&ReservationDraft {
                    guest_name: "Andres".to_string(),
                    contact: "0917".to_string(),
                    room_number: room.room_number,
                    checkin_date: today,
                    checkout_date: today + Days::new(1),
                    payment_status: PaymentStatus::Paid,
                })
                .unwrap();
        }

        let mut edit = BranchDraft::from_branch(&created);
        edit.username = "iloilo-city".to_string();
        let renamed = app.update_branch(created.uid, &edit).unwrap();
        assert_eq!(renamed.username, "iloilo-city");

        let branch_dir = dir.path().join("branch_database");
        assert!(!branch_dir.join("iloilo.db").exists());
        assert!(branch_dir.join("iloilo-city.db").exists());

        // Old name no longer logs in, password is unchanged
        assert!(app.login_branch("iloilo", "branchpass").is_err());
        let session = app.login_branch("iloilo-city", "branchpass").unwrap();
        let hotel = app.hotel(&session).unwrap();
        assert_eq!(hotel.list_reservations().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_rename_keeps_account_row() {
        let (dir, mut app) = setup();
        let created = app.add_branch(&branch("iloilo")).unwrap();

        // A stray file occupies the target name
        std::fs::write(dir.path().join("branch_database").join("cebu.db"), b"").unwrap();

        let mut edit = BranchDraft::from_branch(&created);
        edit.username = "cebu".to_string();
        assert!(matches!(
            app.update_branch(created.uid, &edit),
            Err(HotelError::DuplicateBranch(_))
        ));

        let row = app.accounts().get_branch(created.uid).unwrap().unwrap();
        assert_eq!(row.username, "iloilo");
        assert!(app.shards().branch_db_exists("iloilo").unwrap());
    }

    #[test]
    fn test_update_branch_without_rename() {
        let (_dir, mut app) = setup();
        let created = app.add_branch(&branch("iloilo")).unwrap();

        let mut edit = BranchDraft::from_branch(&created);
        edit.contact = "0339990000".to_string();
        let updated = app.update_branch(created.uid, &edit).unwrap();
        assert_eq!(updated.contact, "0339990000");
        assert!(app.shards().branch_db_exists("iloilo").unwrap());

        edit.contact = "not-digits".to_string();
        assert!(matches!(
            app.update_branch(created.uid, &edit),
            Err(HotelError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_branch_removes_database() {
        let (dir, mut app) = setup();
        let created = app.add_branch(&branch("iloilo")).unwrap();
        app.add_branch(&branch("bacolod")).unwrap();

        let deleted = app.delete_branch(created.uid).unwrap();
        assert_eq!(deleted.username, "iloilo");

        let branch_dir = dir.path().join("branch_database");
        assert!(!branch_dir.join("iloilo.db").exists());
        assert!(!branch_dir.join("iloilo.db.deleting").exists());
        assert!(branch_dir.join("bacolod.db").exists());
        assert_eq!(app.accounts().branch_names().unwrap(), vec!["bacolod"]);

        assert!(matches!(
            app.delete_branch(created.uid),
            Err(HotelError::NotFound { .. })
        ));
    }
}
