mod cli;
mod display;
mod prompts;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use std::env;
use std::str::FromStr;

use staybook_core::validation::parse_room_form;
use staybook_core::{
    get_config_path, BranchDraft, Config, HotelDatabase, PaymentStatus, ReservationDraft,
    ReservationFilter, RoomFilter, RoomStatus, Session, Staybook, DATE_FORMAT,
};

use crate::cli::{AdminCommand, BranchCommand, Cli, Command, ReservationCommand, RoomCommand};

const BRANCH_ENV: &str = "STAYBOOK_BRANCH";
const PASSWORD_ENV: &str = "STAYBOOK_PASSWORD";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = get_config_path()?;
    let config = Config::load_or_create(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let data_dir = config.resolve_data_dir(cli.data_dir.as_deref());
    tracing::debug!(data_dir = %data_dir.display(), "using data directory");

    let mut app = Staybook::open(&data_dir)
        .with_context(|| format!("Failed to open data directory {:?}", data_dir))?
        .with_min_password_length(config.min_password_length);

    match &cli.command {
        Command::Admin(admin_cmd) => {
            handle_admin_command(admin_cmd, &cli, &app)?;
        }
        Command::Login => {
            let session = branch_login(&cli, &app)?;
            println!(
                "{} {}",
                "Login successful:".green(),
                session.display_name().bold()
            );
        }
        Command::Branch(branch_cmd) => {
            admin_login(&cli, &app)?;
            handle_branch_command(branch_cmd, &mut app)?;
        }
        Command::Room(room_cmd) => {
            let session = branch_login(&cli, &app)?;
            let mut hotel = app.hotel(&session)?;
            handle_room_command(room_cmd, &mut hotel)?;
        }
        Command::Reservation(reservation_cmd) => {
            let session = branch_login(&cli, &app)?;
            let mut hotel = app.hotel(&session)?;
            handle_reservation_command(reservation_cmd, &mut hotel, &config)?;
        }
        Command::Dashboard { json } => {
            let session = branch_login(&cli, &app)?;
            let summary = app.hotel(&session)?.summary()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                display::print_summary(session.display_name(), &summary);
            }
        }
        Command::Reconcile => {
            let session = branch_login(&cli, &app)?;
            let report = app.hotel(&session)?.reconcile_room_statuses()?;
            display::print_reconcile_report(&report);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// =============================================================================
// Login
// =============================================================================

fn login_password(cli: &Cli, label: &str) -> Result<String> {
    if let Some(password) = &cli.password {
        return Ok(password.clone());
    }
    if let Ok(password) = env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    prompts::prompt_password(label)
}

fn admin_login(cli: &Cli, app: &Staybook) -> Result<Session> {
    if !app.admin_exists()? {
        anyhow::bail!("No administrator detected. Please create one with `staybook admin init`.");
    }
    let password = login_password(cli, "Administrator password:")?;
    Ok(app.login_admin(&password)?)
}

fn branch_login(cli: &Cli, app: &Staybook) -> Result<Session> {
    let username = match &cli.branch {
        Some(name) => name.clone(),
        None => match env::var(BRANCH_ENV) {
            Ok(name) => name,
            Err(_) => prompts::prompt_select_branch(app.accounts().branch_names()?)?,
        },
    };
    let password = login_password(cli, "Password:")?;
    Ok(app.login_branch(&username, &password)?)
}

// =============================================================================
// Administrator
// =============================================================================

fn handle_admin_command(cmd: &AdminCommand, cli: &Cli, app: &Staybook) -> Result<()> {
    match cmd {
        AdminCommand::Init => {
            if app.admin_exists()? {
                anyhow::bail!("An administrator already exists");
            }
            let (password, confirm) = match &cli.password {
                Some(password) => (password.clone(), password.clone()),
                None => prompts::prompt_new_password("Administrator password:")?,
            };
            app.create_administrator(&password, &confirm)?;
            println!("{}", "Administrator Creation Successful".green());
        }
        AdminCommand::Status => {
            if app.admin_exists()? {
                println!("{}", "Administrator exists".green());
            } else {
                println!(
                    "{}",
                    "No administrator detected. Please create one.".yellow()
                );
            }
        }
        AdminCommand::Login => {
            admin_login(cli, app)?;
            println!("{}", "Login successful".green());
        }
    }
    Ok(())
}

// =============================================================================
// Branches
// =============================================================================

fn handle_branch_command(cmd: &BranchCommand, app: &mut Staybook) -> Result<()> {
    match cmd {
        BranchCommand::Add {
            name,
            address,
            contact,
            branch_password,
        } => {
            let username = value_or_prompt(name, "Branch username:")?;
            let address = value_or_prompt(address, "Address:")?;
            let contact = value_or_prompt(contact, "Contact number:")?;
            let (password, confirm_password) = match branch_password {
                Some(p) => (p.clone(), p.clone()),
                None => prompts::prompt_new_password("Branch password:")?,
            };

            let branch = app.add_branch(&BranchDraft {
                username,
                address,
                contact,
                password,
                confirm_password,
            })?;
            println!("{}", "Branch added successfully".green());
            println!("UID: {}", branch.uid);
        }
        BranchCommand::List { search, json } => {
            let branches = app
                .accounts()
                .search_branches(search.as_deref().unwrap_or(""))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&branches)?);
            } else {
                display::print_branches(&branches);
            }
        }
        BranchCommand::Show { uid } => {
            let branch = app
                .accounts()
                .get_branch(*uid)?
                .with_context(|| format!("Branch not found: {}", uid))?;
            display::print_branch(&branch);
        }
        BranchCommand::Edit {
            uid,
            name,
            address,
            contact,
            branch_password,
        } => {
            let existing = app
                .accounts()
                .get_branch(*uid)?
                .with_context(|| format!("Branch not found: {}", uid))?;
            let mut draft = BranchDraft::from_branch(&existing);

            let interactive = name.is_none()
                && address.is_none()
                && contact.is_none()
                && branch_password.is_none();

            if interactive {
                draft.username = prompts::prompt_text_with_default("Username:", &draft.username)?;
                draft.address = prompts::prompt_text_with_default("Address:", &draft.address)?;
                draft.contact = prompts::prompt_text_with_default("Contact:", &draft.contact)?;
                if prompts::confirm("Change password?")? {
                    let (password, confirm) = prompts::prompt_new_password("New password:")?;
                    draft.password = password;
                    draft.confirm_password = confirm;
                }
            } else {
                if let Some(name) = name {
                    draft.username = name.clone();
                }
                if let Some(address) = address {
                    draft.address = address.clone();
                }
                if let Some(contact) = contact {
                    draft.contact = contact.clone();
                }
                if let Some(password) = branch_password {
                    draft.password = password.clone();
                    draft.confirm_password = password.clone();
                }
            }

            let updated = app.update_branch(*uid, &draft)?;
            println!("{}", "Branch updated successfully".green());
            if updated.username != existing.username {
                println!(
                    "Branch database renamed: {} -> {}",
                    existing.username,
                    updated.username.bold()
                );
            }
        }
        BranchCommand::Del { uid, yes } => {
            let existing = app
                .accounts()
                .get_branch(*uid)?
                .with_context(|| format!("Branch not found: {}", uid))?;

            let question = format!(
                "Delete branch '{}' and all of its rooms and reservations?",
                existing.username
            );
            if !*yes && !prompts::confirm(&question)? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }

            app.delete_branch(*uid)?;
            println!("{}", "Branch deleted successfully".green());
        }
    }
    Ok(())
}

// =============================================================================
// Rooms
// =============================================================================

fn handle_room_command(cmd: &RoomCommand, hotel: &mut HotelDatabase) -> Result<()> {
    match cmd {
        RoomCommand::Add {
            r#type,
            price,
            capacity,
            status,
            description,
        } => {
            let interactive = r#type.is_none()
                && price.is_none()
                && capacity.is_none()
                && status.is_none()
                && description.is_none();

            let draft = if interactive {
                let room_type = prompts::prompt_room_type()?;
                let price = prompts::prompt_text("Price rate:")?;
                let capacity = prompts::prompt_text("Capacity:")?;
                let status = prompts::prompt_new_room_status()?;
                let description = prompts::prompt_text("Description:")?;
                parse_room_form(&room_type, &price, &capacity, status, &description)?
            } else {
                let room_type = r#type
                    .as_deref()
                    .context("Room type is required. Use --type to specify one.")?;
                let status = parse_flag::<RoomStatus>(status)?.unwrap_or_default();
                parse_room_form(
                    room_type,
                    price.as_deref().unwrap_or(""),
                    capacity.as_deref().unwrap_or(""),
                    status,
                    description.as_deref().unwrap_or(""),
                )?
            };

            let room = hotel.add_room(&draft)?;
            println!("{}", "Room added successfully".green());
            println!("Room number: {}", room.room_number.to_string().bold());
        }
        RoomCommand::List {
            status,
            r#type,
            min_capacity,
            max_price,
            search,
            json,
        } => {
            let filter = RoomFilter {
                status: parse_flag(status)?,
                room_type: r#type.clone(),
                min_capacity: *min_capacity,
                max_price: *max_price,
                query: search.clone(),
            };
            let rooms = hotel.search_rooms(&filter)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&rooms)?);
            } else {
                display::print_rooms(&rooms);
            }
        }
        RoomCommand::Show { room_number } => {
            let room = hotel
                .get_room(*room_number)?
                .with_context(|| format!("Room not found: {}", room_number))?;
            display::print_room(&room);
        }
        RoomCommand::Edit {
            room_number,
            r#type,
            price,
            capacity,
            status,
            description,
        } => {
            let current = hotel
                .get_room(*room_number)?
                .with_context(|| format!("Room not found: {}", room_number))?;

            let interactive = r#type.is_none()
                && price.is_none()
                && capacity.is_none()
                && status.is_none()
                && description.is_none();

            let current_price = current.price_rate.to_string();
            let current_capacity = current.capacity.to_string();

            let draft = if interactive {
                let room_type =
                    prompts::prompt_text_with_default("Room type:", &current.room_type)?;
                let price = prompts::prompt_text_with_default("Price rate:", &current_price)?;
                let capacity = prompts::prompt_text_with_default("Capacity:", &current_capacity)?;
                let status = prompts::prompt_room_status(current.status)?;
                let description =
                    prompts::prompt_text_with_default("Description:", &current.description)?;
                parse_room_form(&room_type, &price, &capacity, status, &description)?
            } else {
                parse_room_form(
                    r#type.as_deref().unwrap_or(&current.room_type),
                    price.as_deref().unwrap_or(&current_price),
                    capacity.as_deref().unwrap_or(&current_capacity),
                    parse_flag(status)?.unwrap_or(current.status),
                    description.as_deref().unwrap_or(&current.description),
                )?
            };

            hotel.update_room(*room_number, &draft)?;
            println!("{}", "Room updated successfully".green());
        }
        RoomCommand::Del { room_number, yes } => {
            if !*yes && !prompts::confirm(&format!("Delete room {}?", room_number))? {
                println!("{}", "Deletion cancelled.".yellow());
                return Ok(());
            }
            hotel.delete_room(*room_number)?;
            println!("{}", "Room deleted successfully".green());
        }
    }
    Ok(())
}

// =============================================================================
// Reservations
// =============================================================================

fn handle_reservation_command(
    cmd: &ReservationCommand,
    hotel: &mut HotelDatabase,
    config: &Config,
) -> Result<()> {
    let date_format = config.date_format.as_str();

    match cmd {
        ReservationCommand::Add {
            guest,
            contact,
            room,
            checkin,
            checkout,
            payment,
        } => {
            let today = Local::now().date_naive();
            let interactive = guest.is_none()
                && contact.is_none()
                && room.is_none()
                && checkin.is_none()
                && checkout.is_none()
                && payment.is_none();

            let draft = if interactive {
                let guest_name = prompts::prompt_text("Guest name:")?;
                let contact = prompts::prompt_text("Contact number:")?;
                let room_number = prompts::prompt_select_room(&hotel.list_available_rooms()?)?;
                let checkin_date = prompts::prompt_date("Check-in date:", today)?;
                let checkout_date =
                    prompts::prompt_date("Check-out date:", next_day(checkin_date))?;
                let payment_status = prompts::prompt_payment_status(PaymentStatus::Unpaid)?;
                ReservationDraft {
                    guest_name,
                    contact,
                    room_number,
                    checkin_date,
                    checkout_date,
                    payment_status,
                }
            } else {
                let checkin_date = parse_optional_date(checkin)?.unwrap_or(today);
                ReservationDraft {
                    guest_name: guest.clone().unwrap_or_default(),
                    contact: contact.clone().unwrap_or_default(),
                    room_number: room.context("Room is required. Use --room to specify one.")?,
                    checkin_date,
                    checkout_date: parse_optional_date(checkout)?
                        .unwrap_or_else(|| next_day(checkin_date)),
                    payment_status: parse_flag(payment)?.unwrap_or_default(),
                }
            };

            let reservation = hotel.add_reservation(&draft)?;
            println!("{}", "Reservation added successfully".green());
            println!("Guest ID: {}", reservation.guest_id.to_string().bold());
        }
        ReservationCommand::List {
            search,
            payment,
            room,
            json,
        } => {
            let filter = ReservationFilter {
                payment_status: parse_flag(payment)?,
                room_number: *room,
                query: search.clone(),
            };
            let reservations = hotel.search_reservations(&filter)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&reservations)?);
            } else {
                display::print_reservations(&reservations, date_format);
            }
        }
        ReservationCommand::Show { guest_id } => {
            let reservation = hotel
                .get_reservation(*guest_id)?
                .with_context(|| format!("Reservation not found: {}", guest_id))?;
            display::print_reservation(&reservation, date_format);
        }
        ReservationCommand::Edit {
            guest_id,
            guest,
            contact,
            room,
            checkin,
            checkout,
            payment,
        } => {
            let existing = hotel
                .get_reservation(*guest_id)?
                .with_context(|| format!("Reservation not found: {}", guest_id))?;
            let mut draft = ReservationDraft::from_reservation(&existing);

            let interactive = guest.is_none()
                && contact.is_none()
                && room.is_none()
                && checkin.is_none()
                && checkout.is_none()
                && payment.is_none();

            if interactive {
                draft.guest_name =
                    prompts::prompt_text_with_default("Guest name:", &draft.guest_name)?;
                draft.contact =
                    prompts::prompt_text_with_default("Contact number:", &draft.contact)?;
                draft.room_number =
                    prompts::prompt_select_room(&hotel.rooms_for_reservation_edit(*guest_id)?)?;
                draft.checkin_date = prompts::prompt_date("Check-in date:", draft.checkin_date)?;
                draft.checkout_date = prompts::prompt_date("Check-out date:", draft.checkout_date)?;
                draft.payment_status = prompts::prompt_payment_status(draft.payment_status)?;
            } else {
                if let Some(guest) = guest {
                    draft.guest_name = guest.clone();
                }
                if let Some(contact) = contact {
                    draft.contact = contact.clone();
                }
                if let Some(room) = room {
                    draft.room_number = *room;
                }
                if let Some(date) = parse_optional_date(checkin)? {
                    draft.checkin_date = date;
                }
                if let Some(date) = parse_optional_date(checkout)? {
                    draft.checkout_date = date;
                }
                if let Some(status) = parse_flag(payment)? {
                    draft.payment_status = status;
                }
            }

            let updated = hotel.update_reservation(*guest_id, &draft)?;
            println!("{}", "Reservation updated successfully".green());
            if updated.room_number != existing.room_number {
                println!(
                    "Moved from room {} to room {}",
                    existing.room_number,
                    updated.room_number.to_string().bold()
                );
            }
        }
        ReservationCommand::Del { guest_id, yes } => {
            let question = format!("Cancel reservation {}?", guest_id);
            if !*yes && !prompts::confirm(&question)? {
                println!("{}", "Cancellation aborted.".yellow());
                return Ok(());
            }
            let reservation = hotel.delete_reservation(*guest_id)?;
            println!("{}", "Reservation deleted successfully".green());
            println!("Room {} is available again", reservation.room_number);
        }
        ReservationCommand::Rooms { guest_id } => {
            let rooms = hotel.rooms_for_reservation_edit(*guest_id)?;
            display::print_rooms(&rooms);
        }
    }
    Ok(())
}

// =============================================================================
// Parsing helpers
// =============================================================================

fn value_or_prompt(value: &Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v.clone()),
        None => prompts::prompt_text(label),
    }
}

/// Parses an optional flag with the type's `FromStr`
fn parse_flag<T>(value: &Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    value
        .as_deref()
        .map(|s| s.parse::<T>().map_err(|e| anyhow::anyhow!(e)))
        .transpose()
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD.", value))
}

fn parse_optional_date(value: &Option<String>) -> Result<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}
