use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;
use tracing_subscriber::EnvFilter;

use invoice_scan::config::{
    clear_api_key, config_dir, load_config, mask_key, set_api_key, CONFIG_FILE, CONFIG_TEMPLATE,
};
use invoice_scan::error::{InvoiceError, Result};
use invoice_scan::export::{load_draft, save_draft, write_json};
use invoice_scan::extract::extractor_for;
use invoice_scan::format::{currency, percent, quantity};
use invoice_scan::invoice::{
    add_item, remove_item, set_field, update_item, validate, InvoiceRecord, ItemUpdate,
    ValidationError,
};
use invoice_scan::pdf::{write_pdf, PdfPreview};
use invoice_scan::session::Session;
use invoice_scan::upload::ImageUpload;

const DEFAULT_DRAFT: &str = "invoice_draft.json";

#[derive(Parser)]
#[command(name = "invoice-scan")]
#[command(version, long_about = None)]
#[command(about = "Extract, validate, and export invoice data from invoice images")]
struct Cli {
    /// Path to config directory (default: XDG config dir)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Manage the vision API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Extract invoice data from an image into a draft file
    Extract {
        /// Invoice image (JPEG, PNG, ...)
        image: PathBuf,

        /// Draft file to write
        #[arg(short, long, default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },

    /// Show a draft with its validation status
    Show {
        #[arg(default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },

    /// Set an invoice field (invoiceNumber, date, dueDate, customerName,
    /// customerAddress, customerEmail, notes, taxRate)
    Set {
        field: String,
        value: String,

        #[arg(short, long, default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },

    /// Add, update, or remove line items
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// Check a draft; exits with an error if anything needs fixing
    Validate {
        #[arg(default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },

    /// Export a valid draft as JSON and/or PDF
    Export {
        #[arg(default_value = DEFAULT_DRAFT)]
        draft: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output directory (default: current directory)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Open the exported PDF with the system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Render the draft to a temporary PDF and open it
    Preview {
        #[arg(default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store the API key in config.toml
    Set { key: String },
    /// Remove the stored API key
    Clear,
    /// Show whether a key is configured
    Status,
}

#[derive(Subcommand)]
enum ItemAction {
    /// Append a line item
    Add {
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit_price: Option<f64>,
        #[arg(short, long, default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },
    /// Change a line item (0-based index)
    Update {
        index: usize,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit_price: Option<f64>,
        #[arg(short, long, default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },
    /// Remove a line item (0-based index)
    Remove {
        index: usize,
        #[arg(short, long, default_value = DEFAULT_DRAFT)]
        draft: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Pdf,
    Both,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        if let InvoiceError::ValidationFailed(errors) = &e {
            eprintln!("{}", error_table(errors));
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Key { action } => cmd_key(&cfg_dir, action),
        Commands::Extract { image, draft } => cmd_extract(&cfg_dir, &image, &draft),
        Commands::Show { draft } => cmd_show(&draft),
        Commands::Set { field, value, draft } => {
            edit_draft(&draft, |record| set_field(record, &field, &value))
        }
        Commands::Item { action } => cmd_item(action),
        Commands::Validate { draft } => cmd_validate(&draft),
        Commands::Export {
            draft,
            format,
            output,
            open,
        } => cmd_export(&cfg_dir, &draft, format, &output, open),
        Commands::Preview { draft } => cmd_preview(&cfg_dir, &draft),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(InvoiceError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;

    println!("Initialized invoice-scan config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}",
        cfg_dir.join(CONFIG_FILE).display()
    );
    println!("  2. Store your API key:         invoice-scan key set <KEY>");
    println!();
    println!("Then extract your first invoice:");
    println!("  invoice-scan extract <image>");

    Ok(())
}

fn cmd_key(cfg_dir: &Path, action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Set { key } => {
            let key = key.trim();
            if key.is_empty() {
                return Err(InvoiceError::EmptyApiKey);
            }
            set_api_key(cfg_dir, key)?;
            println!("API key saved to {}", cfg_dir.join(CONFIG_FILE).display());
        }
        KeyAction::Clear => {
            clear_api_key(cfg_dir)?;
            println!("API key removed");
        }
        KeyAction::Status => {
            let config = load_config(cfg_dir)?;
            match config.vision.api_key() {
                Some(key) => println!("API key is set ({})", mask_key(key)),
                None => {
                    println!("No API key set. Extraction will use sample data.");
                }
            }
        }
    }
    Ok(())
}

/// Upload an image, extract it, and start a new draft
fn cmd_extract(cfg_dir: &Path, image: &Path, draft: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let upload = ImageUpload::open(image, config.upload.max_bytes)?;

    let today = Local::now().date_naive();
    let extractor = extractor_for(&config.vision, today);

    let mut session = Session::new();
    let record = session.process_on(&upload, extractor.as_ref(), today)?;

    save_draft(draft, record)?;
    info!(draft = %draft.display(), "Draft written");

    if config.vision.api_key().is_none() {
        println!("No API key set; using sample invoice data.");
    }
    println!("Invoice data extracted successfully");
    print_record(record);
    println!();
    println!("Draft saved: {}", draft.display());

    Ok(())
}

fn cmd_show(draft: &Path) -> Result<()> {
    let record = load_draft(draft)?;
    print_record(&record);

    let errors = validate(&record);
    println!();
    if errors.is_empty() {
        println!("Ready to export.");
    } else {
        println!("{} issue(s) to fix before export:", errors.len());
        println!("{}", error_table(&errors));
    }
    Ok(())
}

fn cmd_item(action: ItemAction) -> Result<()> {
    match action {
        ItemAction::Add {
            description,
            quantity,
            unit_price,
            draft,
        } => edit_draft(&draft, |record| {
            let index = add_item(record, description, quantity, unit_price)?;
            println!("Added item {index}");
            Ok(())
        }),
        ItemAction::Update {
            index,
            description,
            quantity,
            unit_price,
            draft,
        } => edit_draft(&draft, |record| {
            update_item(
                record,
                index,
                ItemUpdate {
                    description,
                    quantity,
                    unit_price,
                },
            )
        }),
        ItemAction::Remove { index, draft } => edit_draft(&draft, |record| {
            let removed = remove_item(record, index)?;
            println!("Removed item {index}: {}", removed.description);
            Ok(())
        }),
    }
}

/// Load a draft, apply one edit, and save it back only if the edit succeeded
fn edit_draft(draft: &Path, edit: impl FnOnce(&mut InvoiceRecord) -> Result<()>) -> Result<()> {
    let mut record = load_draft(draft)?;
    edit(&mut record)?;
    save_draft(draft, &record)?;

    println!(
        "Subtotal: {}  Tax: {}  Total: {}",
        currency(record.subtotal),
        currency(record.tax_amount),
        currency(record.total)
    );
    Ok(())
}

fn cmd_validate(draft: &Path) -> Result<()> {
    let record = load_draft(draft)?;
    let errors = validate(&record);
    if !errors.is_empty() {
        return Err(InvoiceError::ValidationFailed(errors));
    }
    println!("Invoice {} is valid", record.invoice_number);
    Ok(())
}

fn cmd_export(
    cfg_dir: &Path,
    draft: &Path,
    format: ExportFormat,
    output: &Path,
    open: bool,
) -> Result<()> {
    let record = load_draft(draft)?;

    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let path = write_json(&record, output)?;
        println!("Saved: {}", path.display());
    }

    if matches!(format, ExportFormat::Pdf | ExportFormat::Both) {
        let config = load_config(cfg_dir)?;
        let path = write_pdf(&record, &config.company, output)?;
        println!("Saved: {}", path.display());
        if open {
            open_path(&path)?;
        }
    }

    Ok(())
}

fn cmd_preview(cfg_dir: &Path, draft: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let record = load_draft(draft)?;

    let preview = PdfPreview::create(&record, &config.company)?;
    open_path(preview.path())?;
    println!("Invoice Preview: {}", record.invoice_number);
    println!("  {}", preview.path().display());
    println!("Press Enter to close the preview...");

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    preview.release()
}

fn open_path(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .arg("/C")
            .arg("start")
            .arg("")
            .arg(path)
            .spawn()?;
    }
    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "UNIT PRICE")]
    unit_price: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "FIELD")]
    field: String,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

fn error_table(errors: &[ValidationError]) -> String {
    let rows: Vec<ErrorRow> = errors
        .iter()
        .map(|e| ErrorRow {
            field: e.field.clone(),
            message: e.message.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn print_record(record: &InvoiceRecord) {
    println!("Invoice:  {}", record.invoice_number);
    println!("Date:     {}", record.date);
    println!("Due:      {}", record.due_date);
    println!("Customer: {}", record.customer_name);
    if !record.customer_address.is_empty() {
        println!("Address:  {}", record.customer_address);
    }
    if !record.customer_email.is_empty() {
        println!("Email:    {}", record.customer_email);
    }

    let rows: Vec<ItemRow> = record
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| ItemRow {
            index,
            description: item.description.clone(),
            quantity: quantity(item.quantity),
            unit_price: currency(item.unit_price),
            amount: currency(item.amount),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let tax_label = format!("Tax ({}%):", percent(record.tax_rate));
    println!("{:<17}{}", "Subtotal:", currency(record.subtotal));
    println!("{:<17}{}", tax_label, currency(record.tax_amount));
    println!("{:<17}{}", "Total:", currency(record.total));
    if !record.notes.is_empty() {
        println!("Notes:    {}", record.notes);
    }
}
