mod api;
mod cache;
mod config;
mod custom_fields;
mod detail;
mod error;
mod import;
mod logging;
mod model;
mod query;
mod store;
mod table;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use api::http::HttpBackend;
use api::Backend;
use config::Config;
use error::ApiError;
use import::FieldMap;
use model::{ContactField, CustomFieldType, CustomPropertyDraft};
use query::{ContactQuery, ViewPreset};
use store::{Session, Store};
use ui::app::{App, Exit};

const SIGN_IN_HINT: &str = "run `contactdesk auth --token <TOKEN> --user <USER_ID>` to sign in";

#[derive(Parser, Debug)]
#[command(name = "contactdesk", version, about = "Terminal client for the contact CRM")]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of contacts
    List(ListArgs),
    /// Create contacts from a CSV file
    Import(ImportArgs),
    /// Create a single contact
    Add(AddArgs),
    /// Manage custom contact properties
    #[command(subcommand)]
    Fields(FieldsCommand),
    /// Store the API token and user id
    Auth(AuthArgs),
    /// Forget the stored token
    Logout,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Search text (matches name, email and phone)
    #[arg(long, short = 's')]
    search: Option<String>,

    /// View preset: all, leads, buyers, sellers, past-clients, new, qualified, won
    #[arg(long, default_value = "all")]
    view: String,

    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Override the guessed mapping, e.g. `--map "Mobile=phone"` or `--map "Notes=-"`
    #[arg(long = "map", value_name = "HEADER=FIELD")]
    map: Vec<String>,

    /// Import the valid rows even when other rows have errors
    #[arg(long, default_value_t = false)]
    skip_invalid: bool,

    /// Validate and print the mapping without creating anything
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[arg(value_name = "PATH")]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    suburb: Option<String>,
    #[arg(long = "type")]
    contact_type: Option<String>,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    status: Option<String>,
}

#[derive(Subcommand, Debug)]
enum FieldsCommand {
    /// Show every custom property with its options
    List,
    /// Define a new custom property
    Add {
        name: String,
        /// text, date, dropdown or multiselect
        #[arg(long = "type", default_value = "text")]
        field_type: String,
        /// Option label (dropdown and multiselect); repeat for several
        #[arg(long = "option", value_name = "LABEL")]
        options: Vec<String>,
    },
    /// Edit the options of a dropdown or multiselect property
    Option {
        /// Field key of the property
        field: String,
        #[command(subcommand)]
        action: OptionAction,
    },
}

#[derive(Subcommand, Debug)]
enum OptionAction {
    Add { label: String },
    /// Move the option at position FROM to position TO (0-based)
    Move { from: usize, to: usize },
    Disable { value: String },
    Enable { value: String },
}

#[derive(Args, Debug)]
struct AuthArgs {
    #[arg(long)]
    token: String,
    #[arg(long = "user")]
    user_id: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    logging::init(&config.log_file)?;
    info!(config = %config.config_path.display(), "starting");

    let store = Store::open(&config.db_path)?;

    let result = match cli.command {
        None => handle_tui(&config, &store),
        Some(Command::List(args)) => handle_list(args, &config, &store),
        Some(Command::Import(args)) => handle_import(args, &config, &store),
        Some(Command::Add(args)) => handle_add(args, &config, &store),
        Some(Command::Fields(command)) => handle_fields(command, &config, &store),
        Some(Command::Auth(args)) => handle_auth(args, &store),
        Some(Command::Logout) => handle_logout(&store),
    };
    if let Err(err) = &result {
        forget_rejected_session(err, &store)?;
    }
    result
}

/// A 401 from any command means the stored token is dead.
fn forget_rejected_session(err: &anyhow::Error, store: &Store) -> Result<()> {
    if err
        .downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_unauthorized)
    {
        warn!("token rejected, clearing stored session");
        store.clear_session()?;
        eprintln!("The stored session was cleared; {}.", SIGN_IN_HINT);
    }
    Ok(())
}

/// Credentials from the config file take precedence over the stored session.
fn resolve_session(config: &Config, store: &Store) -> Result<Session> {
    let stored = store.session()?;
    let token = config
        .token
        .clone()
        .or_else(|| stored.as_ref().map(|s| s.token.clone()));
    let user_id = config
        .user_id
        .clone()
        .or_else(|| stored.as_ref().map(|s| s.user_id.clone()));
    match (token, user_id) {
        (Some(token), Some(user_id)) => Ok(Session { token, user_id }),
        _ => bail!("not signed in; {}", SIGN_IN_HINT),
    }
}

fn connect(config: &Config, store: &Store) -> Result<(Arc<dyn Backend>, Session)> {
    let session = resolve_session(config, store)?;
    let backend = HttpBackend::new(&config.api_url, &session.token)?;
    Ok((Arc::new(backend), session))
}

fn handle_tui(config: &Config, store: &Store) -> Result<()> {
    let (backend, session) = connect(config, store)?;
    let mut app = App::new(config, store, backend, session.user_id);
    match app.run()? {
        Exit::Quit => Ok(()),
        Exit::SignedOut => {
            eprintln!("Your session has expired; {}.", SIGN_IN_HINT);
            Ok(())
        }
    }
}

fn handle_list(args: ListArgs, config: &Config, store: &Store) -> Result<()> {
    let Some(preset) = ViewPreset::parse(&args.view) else {
        bail!("unknown view \"{}\"", args.view);
    };
    let (status, contact_type) = preset.filters();
    let query = ContactQuery {
        search: args.search.filter(|s| !s.trim().is_empty()),
        status,
        contact_type,
        page: args.page.max(1),
        limit: args.limit.unwrap_or(config.table.page_size).max(1),
    };

    let (backend, _) = connect(config, store)?;
    let page = backend.list_contacts(&query)?;

    println!(
        "Page {}/{} ({} contact(s))",
        query.page,
        page.pagination.total_pages.max(1),
        page.pagination.total
    );
    // id<TAB>name<TAB>email<TAB>phone<TAB>status
    for contact in &page.contacts {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            contact.id,
            contact.name,
            contact.email.as_deref().unwrap_or(""),
            contact.phone.as_deref().unwrap_or(""),
            contact.status.label()
        );
    }
    Ok(())
}

fn handle_import(args: ImportArgs, config: &Config, store: &Store) -> Result<()> {
    let plan = import::plan_file(&args.input, &args.map)?;

    println!("Column mapping:");
    for line in plan.describe_mapping() {
        println!("  {}", line);
    }
    for error in &plan.errors {
        println!("{}", error);
    }
    println!(
        "{} row(s): {} valid, {} with errors.",
        plan.rows,
        plan.valid.len(),
        plan.rows - plan.valid.len()
    );

    if args.dry_run {
        return Ok(());
    }
    if !plan.is_clean() && !args.skip_invalid {
        bail!("import aborted: fix the rows above or pass --skip-invalid");
    }
    if plan.valid.is_empty() {
        println!("Nothing to import.");
        return Ok(());
    }

    let (backend, _) = connect(config, store)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Importing {} contacts...", plan.valid.len()));
    let result = backend.import_contacts(&plan.valid);
    spinner.finish_and_clear();

    let summary = result.context("bulk import failed")?;
    info!(created = summary.created, "bulk import finished");
    println!("Imported {} contacts.", summary.created);
    Ok(())
}

fn handle_add(args: AddArgs, config: &Config, store: &Store) -> Result<()> {
    let values = [
        (ContactField::Name, Some(args.name)),
        (ContactField::Email, args.email),
        (ContactField::Phone, args.phone),
        (ContactField::Address, args.address),
        (ContactField::Suburb, args.suburb),
        (ContactField::ContactType, args.contact_type),
        (ContactField::LeadSource, args.source),
        (ContactField::Status, args.status),
    ];
    let mut row = Vec::new();
    let mut mapping = FieldMap::new();
    for (field, value) in values {
        if let Some(value) = value {
            mapping.insert(row.len(), field);
            row.push(value);
        }
    }
    let draft = match import::validate_row(&row, &mapping) {
        Ok(draft) => draft,
        Err(messages) => bail!("{}", messages.join("; ")),
    };

    let (backend, _) = connect(config, store)?;
    let contact = backend.create_contact(&draft)?;
    println!("Created {} ({})", contact.name, contact.id);
    Ok(())
}

fn parse_field_type(raw: &str) -> Result<CustomFieldType> {
    match CustomFieldType::parse(raw) {
        Some(field_type) => Ok(field_type),
        None => {
            let choices: Vec<&str> = CustomFieldType::ALL.iter().map(|t| t.wire()).collect();
            bail!(
                "unknown field type \"{}\" (expected one of {})",
                raw,
                choices.join(", ").to_lowercase()
            )
        }
    }
}

fn handle_fields(command: FieldsCommand, config: &Config, store: &Store) -> Result<()> {
    let (backend, _) = connect(config, store)?;
    match command {
        FieldsCommand::List => {
            let definitions = backend.list_custom_properties()?;
            if definitions.is_empty() {
                println!("No custom properties.");
            }
            for definition in definitions {
                let state = if definition.is_active { "" } else { " (inactive)" };
                println!(
                    "{}\t{}\t{}{}",
                    definition.field_key,
                    definition.name,
                    definition.field_type.label(),
                    state
                );
                let mut options = definition.options.clone();
                options.sort_by_key(|o| o.sort_order);
                for (position, option) in options.iter().enumerate() {
                    let state = if option.is_active { "" } else { " (inactive)" };
                    println!("  {}. {} [{}]{}", position, option.label, option.value, state);
                }
            }
        }
        FieldsCommand::Add {
            name,
            field_type,
            options,
        } => {
            let field_type = parse_field_type(&field_type)?;
            let name = name.trim().to_string();
            if name.is_empty() {
                bail!("property name cannot be empty");
            }
            let takes_options = matches!(
                field_type,
                CustomFieldType::Dropdown | CustomFieldType::Multiselect
            );
            if !takes_options && !options.is_empty() {
                bail!("{} properties do not take options", field_type.label());
            }
            let mut draft = CustomPropertyDraft {
                name,
                field_type,
                options: Vec::new(),
            };
            for label in &options {
                custom_fields::add_option(&mut draft.options, label)?;
            }
            let definition = backend.create_custom_property(&draft)?;
            println!(
                "Created {} ({}, key {})",
                definition.name,
                definition.field_type.label(),
                definition.field_key
            );
        }
        FieldsCommand::Option { field, action } => {
            let definitions = backend.list_custom_properties()?;
            let Some(definition) = definitions.iter().find(|d| d.field_key == field) else {
                bail!("no custom property with key \"{}\"", field);
            };
            if !matches!(
                definition.field_type,
                CustomFieldType::Dropdown | CustomFieldType::Multiselect
            ) {
                bail!("{} has no options", definition.name);
            }

            let mut draft = CustomPropertyDraft::from(definition);
            custom_fields::normalize_order(&mut draft.options);
            match action {
                OptionAction::Add { label } => {
                    let value = custom_fields::add_option(&mut draft.options, &label)?;
                    println!("Added option {} [{}]", label.trim(), value);
                }
                OptionAction::Move { from, to } => {
                    custom_fields::move_option(&mut draft.options, from, to)?;
                }
                OptionAction::Disable { value } => {
                    custom_fields::set_option_active(&mut draft.options, &value, false)?;
                }
                OptionAction::Enable { value } => {
                    custom_fields::set_option_active(&mut draft.options, &value, true)?;
                }
            }
            backend.update_custom_property(&definition.id, &draft)?;
            println!("Updated {}", definition.name);
        }
    }
    Ok(())
}

fn handle_auth(args: AuthArgs, store: &Store) -> Result<()> {
    let token = args.token.trim();
    let user_id = args.user_id.trim();
    if token.is_empty() || user_id.is_empty() {
        bail!("token and user id cannot be empty");
    }
    store.save_session(&Session {
        token: token.to_string(),
        user_id: user_id.to_string(),
    })?;
    println!("Signed in as {}.", user_id);
    Ok(())
}

fn handle_logout(store: &Store) -> Result<()> {
    store.clear_session()?;
    println!("Signed out.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn signed_in_store(dir: &TempDir) -> Store {
        let store = Store::open(&dir.path().join("state.db")).unwrap();
        store
            .save_session(&Session {
                token: "secret".into(),
                user_id: "user-1".into(),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_unauthorized_clears_session_through_context() {
        let dir = TempDir::new().unwrap();
        let store = signed_in_store(&dir);

        let err = anyhow::Error::from(ApiError::Unauthorized).context("bulk import failed");
        forget_rejected_session(&err, &store).unwrap();
        assert_eq!(store.session().unwrap(), None);
    }

    #[test]
    fn test_other_failures_keep_session() {
        let dir = TempDir::new().unwrap();
        let store = signed_in_store(&dir);

        let rejected = anyhow::Error::from(ApiError::Rejected {
            status: 422,
            message: "name is required".into(),
        });
        forget_rejected_session(&rejected, &store).unwrap();
        forget_rejected_session(&anyhow::anyhow!("unknown view"), &store).unwrap();
        assert!(store.session().unwrap().is_some());
    }
}
