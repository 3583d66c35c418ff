use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use enderchest::mapper::{read_tree, write_tree};
use enderchest::{ChestOwner, Config, InventoryMapper, StorageFormat, Translations};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "enderchest", version, about = "Convert and inspect stored ender chest inventories")]
struct Cli {
    /// Config file, for the inventory list name and translations
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a stored inventory to JSON
    ToJson {
        input: PathBuf,
        /// Output file, standard output if missing
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Indent the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Convert a JSON or Mojangson inventory to gzip-compressed NBT
    ToNbt {
        input: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Print the tag tree of a stored inventory
    Show { file: PathBuf },
    /// Decode a stored inventory and summarize it
    Inspect {
        file: PathBuf,
        /// Rows to assume at least, when the file stores no row count
        #[arg(long, default_value_t = 1)]
        min_rows: i32,
        /// Inventory name the file was stored under, defaults to the file name
        #[arg(long)]
        name: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct InspectReport {
    title: String,
    owner: String,
    rows: i32,
    disabled_slots: i32,
    item_insertion: bool,
    items: Vec<InspectItem>,
}

#[derive(Serialize)]
struct InspectItem {
    slot: usize,
    id: String,
    count: i8,
    damage: i16,
    has_tag: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::ToJson {
            input,
            output,
            pretty,
        } => {
            let root = read_tree(&std::fs::read(&input)?)?;
            let json = if pretty {
                nbt::json::to_string_pretty(&root)?
            } else {
                nbt::json::to_string(&root)?
            };
            match output {
                Some(output) => std::fs::write(output, json)?,
                None => println!("{json}"),
            }
        }
        Command::ToNbt { input, output } => {
            let root = read_tree(&std::fs::read(&input)?)?;
            std::fs::write(&output, write_tree(&root, StorageFormat::Binary)?)?;
            tracing::info!("Wrote {}.", output.display());
        }
        Command::Show { file } => {
            let root = read_tree(&std::fs::read(&file)?)?;
            print!("{}", nbt::visitor::pretty_print(&root, 2));
        }
        Command::Inspect {
            file,
            min_rows,
            name,
            json,
        } => {
            let name = name.unwrap_or_else(|| inventory_name(&file));
            let mapper = InventoryMapper::new(config.storage.inventory_tag.as_str());
            let inventory = mapper.decode_bytes(
                &std::fs::read(&file)?,
                ChestOwner::from_inventory_name(&name),
                min_rows,
            )?;

            let translations = Translations::load(&config.translations);
            let restrictions = inventory.restrictions();
            let report = InspectReport {
                title: inventory.owner().title(&translations),
                owner: inventory.owner().display_name().clone(),
                rows: restrictions.rows(),
                disabled_slots: restrictions.disabled_slots(),
                item_insertion: restrictions.item_insertion_allowed(),
                items: inventory
                    .items()
                    .map(|(slot, item)| InspectItem {
                        slot,
                        id: item.id.clone(),
                        count: item.count,
                        damage: item.damage,
                        has_tag: item.tag.is_some(),
                    })
                    .collect(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

fn inventory_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn print_report(report: &InspectReport) {
    println!("{}", report.title);
    println!(
        "{} rows, {} disabled slots, item insertion {}",
        report.rows,
        report.disabled_slots,
        if report.item_insertion { "allowed" } else { "denied" }
    );
    for item in &report.items {
        print!("{:>3}: {} x{}", item.slot, item.id, item.count);
        if item.damage != 0 {
            print!(" (damage {})", item.damage);
        }
        if item.has_tag {
            print!(" +tag");
        }
        println!();
    }
}
