//! Accounts database: the administrator and the branch logins

use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, Transaction,
};
use std::path::{Path, PathBuf};

use crate::error::{HotelError, Result};
use crate::filter::branch_search;
use crate::models::{Branch, BranchDraft};
use crate::password::{hash_password, needs_rehash, verify_password};

use super::schema::ACCOUNTS_SCHEMA;

const BRANCH_COLUMNS: &str = "uid, username, address, contact, password";

const INVALID_ADMIN_PASSWORD: &str = "Invalid password. Please enter the correct credential";
const INVALID_BRANCH_LOGIN: &str = "Invalid username or password";

/// Administrator and branch accounts
pub struct AccountDatabase {
    path: PathBuf,
    conn: Connection,
}

/// A branch change that has been written but not yet committed.
///
/// Dropping it rolls the change back. Callers use the window between
/// [`AccountDatabase::begin_branch_update`] and [`BranchChange::commit`] to
/// move the branch database file.
pub struct BranchChange<'a> {
    tx: Transaction<'a>,
    previous: Branch,
    updated: Option<Branch>,
}

impl BranchChange<'_> {
    /// The branch row as it was before the change
    pub fn previous(&self) -> &Branch {
        &self.previous
    }

    /// The branch row after the change; `None` for a deletion
    pub fn updated(&self) -> Option<&Branch> {
        self.updated.as_ref()
    }

    /// True when the change gives the branch a new username
    pub fn renames(&self) -> bool {
        self.updated
            .as_ref()
            .is_some_and(|b| b.username != self.previous.username)
    }

    pub fn commit(self) -> Result<(Branch, Option<Branch>)> {
        self.tx.commit()?;
        Ok((self.previous, self.updated))
    }
}

/// A branch that has been inserted but not yet committed. Dropping it
/// rolls the insert back.
pub struct PendingBranch<'a> {
    tx: Transaction<'a>,
    branch: Branch,
}

impl PendingBranch<'_> {
    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    pub fn commit(self) -> Result<Branch> {
        self.tx.commit()?;
        tracing::info!(uid = self.branch.uid, username = %self.branch.username, "branch added");
        Ok(self.branch)
    }
}

impl AccountDatabase {
    /// Opens (creating if needed) the accounts database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = super::open_connection(&path, ACCOUNTS_SCHEMA)?;
        Ok(Self { path, conn })
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: super::open_in_memory(ACCOUNTS_SCHEMA)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Administrator
    // =========================================================================

    pub fn admin_exists(&self) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT admin_id FROM admin_table LIMIT 1", [], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Creates the single administrator account
    pub fn create_administrator(&self, password: &str) -> Result<()> {
        if self.admin_exists()? {
            return Err(HotelError::AdminExists);
        }

        self.conn.execute(
            "INSERT INTO admin_table (password) VALUES (?1)",
            [hash_password(password.trim())],
        )?;
        tracing::info!("administrator created");
        Ok(())
    }

    /// Checks the administrator password
    pub fn validate_admin(&self, password: &str) -> Result<()> {
        let admins: Vec<(i64, String)> = {
            let mut stmt = self.conn.prepare("SELECT admin_id, password FROM admin_table")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        if admins.is_empty() {
            return Err(HotelError::NoAdministrator);
        }

        let password = password.trim();
        let matched = admins
            .iter()
            .find(|(_, stored)| verify_password(password, stored));

        match matched {
            Some((admin_id, stored)) => {
                if needs_rehash(stored) {
                    self.conn.execute(
                        "UPDATE admin_table SET password = ?1 WHERE admin_id = ?2",
                        params![hash_password(password), admin_id],
                    )?;
                    tracing::info!(admin_id, "upgraded legacy administrator password");
                }
                Ok(())
            }
            None => {
                tracing::debug!("administrator login rejected");
                Err(HotelError::InvalidCredentials(INVALID_ADMIN_PASSWORD))
            }
        }
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Branch usernames in creation order, as offered on the login screen
    pub fn branch_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM branches_table ORDER BY uid")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    pub fn list_branches(&self) -> Result<Vec<Branch>> {
        self.search_branches("")
    }

    /// Case-insensitive search over username, address and contact
    pub fn search_branches(&self, query: &str) -> Result<Vec<Branch>> {
        let clause = branch_search(query);
        let sql = format!(
            "SELECT {} FROM branches_table{} ORDER BY uid",
            BRANCH_COLUMNS,
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let branches = stmt
            .query_map(params_from_iter(clause.params.iter()), branch_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(branches)
    }

    pub fn get_branch(&self, uid: i64) -> Result<Option<Branch>> {
        fetch_branch(&self.conn, uid)
    }

    pub fn get_branch_by_username(&self, username: &str) -> Result<Option<Branch>> {
        let sql = format!(
            "SELECT {} FROM branches_table WHERE username = ?1",
            BRANCH_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, [username.trim()], branch_from_row)
            .optional()?)
    }

    /// Inserts a branch and commits. The draft is expected to be validated
    /// already.
    pub fn add_branch(&mut self, draft: &BranchDraft) -> Result<Branch> {
        self.begin_branch_add(draft)?.commit()
    }

    /// Inserts a branch inside a transaction left open for the caller
    pub fn begin_branch_add(&mut self, draft: &BranchDraft) -> Result<PendingBranch<'_>> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO branches_table (username, address, contact, password)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                draft.username,
                draft.address,
                draft.contact,
                hash_password(&draft.password),
            ],
        )
        .map_err(|e| map_unique(e, &draft.username))?;

        let uid = tx.last_insert_rowid();
        let branch = fetch_branch(&tx, uid)?.ok_or_else(|| HotelError::not_found("Branch", uid))?;
        Ok(PendingBranch { tx, branch })
    }

    /// Updates a branch and commits immediately
    pub fn update_branch(&mut self, uid: i64, draft: &BranchDraft) -> Result<Branch> {
        let (_, updated) = self.begin_branch_update(uid, draft)?.commit()?;
        updated.ok_or_else(|| HotelError::not_found("Branch", uid))
    }

    /// Writes a branch update inside a transaction left open for the caller.
    /// A draft with blank password fields keeps the stored password.
    pub fn begin_branch_update(
        &mut self,
        uid: i64,
        draft: &BranchDraft,
    ) -> Result<BranchChange<'_>> {
        let tx = self.conn.transaction()?;
        let previous = fetch_branch(&tx, uid)?.ok_or_else(|| HotelError::not_found("Branch", uid))?;

        let password = if draft.keeps_password() {
            previous.password_hash.clone()
        } else {
            hash_password(&draft.password)
        };

        tx.execute(
            "UPDATE branches_table SET username = ?1, address = ?2, contact = ?3, password = ?4
             WHERE uid = ?5",
            params![draft.username, draft.address, draft.contact, password, uid],
        )
        .map_err(|e| map_unique(e, &draft.username))?;

        let updated = fetch_branch(&tx, uid)?.ok_or_else(|| HotelError::not_found("Branch", uid))?;
        Ok(BranchChange {
            tx,
            previous,
            updated: Some(updated),
        })
    }

    /// Deletes a branch row and commits immediately
    pub fn delete_branch(&mut self, uid: i64) -> Result<Branch> {
        let (previous, _) = self.begin_branch_delete(uid)?.commit()?;
        Ok(previous)
    }

    /// Deletes a branch row inside a transaction left open for the caller
    pub fn begin_branch_delete(&mut self, uid: i64) -> Result<BranchChange<'_>> {
        let tx = self.conn.transaction()?;
        let previous = fetch_branch(&tx, uid)?.ok_or_else(|| HotelError::not_found("Branch", uid))?;
        tx.execute("DELETE FROM branches_table WHERE uid = ?1", [uid])?;
        Ok(BranchChange {
            tx,
            previous,
            updated: None,
        })
    }

    /// Checks a branch login and returns the branch on success
    pub fn validate_branch(&self, username: &str, password: &str) -> Result<Branch> {
        let branch = self
            .get_branch_by_username(username)?
            .filter(|b| verify_password(password.trim(), &b.password_hash));

        match branch {
            Some(branch) => {
                if needs_rehash(&branch.password_hash) {
                    self.conn.execute(
                        "UPDATE branches_table SET password = ?1 WHERE uid = ?2",
                        params![hash_password(password.trim()), branch.uid],
                    )?;
                    tracing::info!(uid = branch.uid, "upgraded legacy branch password");
                }
                Ok(branch)
            }
            None => {
                tracing::debug!(username, "branch login rejected");
                Err(HotelError::InvalidCredentials(INVALID_BRANCH_LOGIN))
            }
        }
    }
}

fn fetch_branch(conn: &Connection, uid: i64) -> Result<Option<Branch>> {
    let sql = format!("SELECT {} FROM branches_table WHERE uid = ?1", BRANCH_COLUMNS);
    Ok(conn.query_row(&sql, [uid], branch_from_row).optional()?)
}

fn branch_from_row(row: &Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        uid: row.get(0)?,
        username: row.get(1)?,
        address: row.get(2)?,
        contact: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn map_unique(err: rusqlite::Error, username: &str) -> HotelError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => HotelError::DuplicateBranch(username.to_string()),
        _ => HotelError::Database(err),
    }
}
