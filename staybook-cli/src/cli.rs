use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Hotel branch room and reservation manager")]
pub struct Cli {
    /// Directory holding accounts.db and branch_database/ (overrides STAYBOOK_DATA_DIR and config)
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Branch to log in as (defaults to STAYBOOK_BRANCH, otherwise prompts)
    #[clap(long, short = 'b', global = true)]
    pub branch: Option<String>,

    /// Password for the login (defaults to STAYBOOK_PASSWORD, otherwise prompts)
    #[clap(long, global = true)]
    pub password: Option<String>,

    /// Increase log output (-v info, -vv debug)
    #[clap(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Administrator account commands
    #[clap(subcommand)]
    Admin(AdminCommand),

    /// Check a branch login
    Login,

    /// Branch account management (administrator only)
    #[clap(subcommand)]
    Branch(BranchCommand),

    /// Room management for the logged-in branch
    #[clap(subcommand)]
    Room(RoomCommand),

    /// Reservation management for the logged-in branch
    #[clap(subcommand, alias = "res")]
    Reservation(ReservationCommand),

    /// Show room and reservation totals for the logged-in branch
    Dashboard {
        /// Print as JSON
        #[clap(long)]
        json: bool,
    },

    /// Repair room statuses so they match the reservations
    Reconcile,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Create the administrator account (first run)
    Init,

    /// Report whether an administrator exists
    Status,

    /// Check the administrator password
    Login,
}

#[derive(Subcommand, Debug)]
pub enum BranchCommand {
    /// Add a branch account
    Add {
        /// Branch username, also the name of its database file
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        address: Option<String>,

        /// Contact number (digits only)
        #[clap(long)]
        contact: Option<String>,

        /// Password for the new branch
        #[clap(long)]
        branch_password: Option<String>,
    },

    /// List branch accounts
    List {
        /// Search username, address and contact
        #[clap(long, short = 's')]
        search: Option<String>,

        /// Print as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show one branch
    Show {
        uid: i64,
    },

    /// Edit a branch; renaming it also renames its database
    Edit {
        uid: i64,

        /// New username
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        address: Option<String>,

        #[clap(long)]
        contact: Option<String>,

        /// New password (omit to keep the current one)
        #[clap(long)]
        branch_password: Option<String>,
    },

    /// Delete a branch and its database
    Del {
        uid: i64,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoomCommand {
    /// Add a room
    Add {
        /// Room type, e.g. Single, Double, Suite
        #[clap(long)]
        r#type: Option<String>,

        /// Nightly rate
        #[clap(long)]
        price: Option<String>,

        #[clap(long)]
        capacity: Option<String>,

        /// Initial status (available, maintenance)
        #[clap(long)]
        status: Option<String>,

        #[clap(long)]
        description: Option<String>,
    },

    /// List rooms
    List {
        /// Filter by status (available, occupied, maintenance)
        #[clap(long)]
        status: Option<String>,

        /// Filter by room type
        #[clap(long)]
        r#type: Option<String>,

        /// Only rooms for at least this many guests
        #[clap(long)]
        min_capacity: Option<u32>,

        /// Only rooms at or below this nightly rate
        #[clap(long)]
        max_price: Option<f64>,

        /// Search type and description
        #[clap(long, short = 's')]
        search: Option<String>,

        /// Print as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show one room
    Show {
        room_number: i64,
    },

    /// Edit a room
    Edit {
        room_number: i64,

        #[clap(long)]
        r#type: Option<String>,

        #[clap(long)]
        price: Option<String>,

        #[clap(long)]
        capacity: Option<String>,

        #[clap(long)]
        status: Option<String>,

        #[clap(long)]
        description: Option<String>,
    },

    /// Delete a room with no reservation
    Del {
        room_number: i64,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReservationCommand {
    /// Book an available room
    Add {
        #[clap(long)]
        guest: Option<String>,

        /// Contact number (digits only)
        #[clap(long)]
        contact: Option<String>,

        /// Room number (must be available)
        #[clap(long)]
        room: Option<i64>,

        /// Check-in date (YYYY-MM-DD)
        #[clap(long)]
        checkin: Option<String>,

        /// Check-out date (YYYY-MM-DD)
        #[clap(long)]
        checkout: Option<String>,

        /// Payment status (unpaid, partial, paid)
        #[clap(long)]
        payment: Option<String>,
    },

    /// List reservations
    List {
        /// Search guest name and contact
        #[clap(long, short = 's')]
        search: Option<String>,

        /// Filter by payment status
        #[clap(long)]
        payment: Option<String>,

        /// Filter by room number
        #[clap(long)]
        room: Option<i64>,

        /// Print as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show one reservation
    Show {
        guest_id: i64,
    },

    /// Edit a reservation; changing the room moves its occupancy
    Edit {
        guest_id: i64,

        #[clap(long)]
        guest: Option<String>,

        #[clap(long)]
        contact: Option<String>,

        #[clap(long)]
        room: Option<i64>,

        #[clap(long)]
        checkin: Option<String>,

        #[clap(long)]
        checkout: Option<String>,

        #[clap(long)]
        payment: Option<String>,
    },

    /// Cancel a reservation and free its room
    Del {
        guest_id: i64,

        /// Skip confirmation prompt
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// List the rooms a reservation can be moved to
    Rooms {
        guest_id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "staybook", "room", "list", "--branch", "iloilo", "--status", "available", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.branch.as_deref(), Some("iloilo"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Room(RoomCommand::List { status: Some(_), .. })
        ));
    }

    #[test]
    fn test_reservation_alias() {
        let cli = Cli::try_parse_from(["staybook", "res", "del", "4", "-y"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Reservation(ReservationCommand::Del { guest_id: 4, yes: true })
        ));
    }
}
