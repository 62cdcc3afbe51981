use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

use crate::application::{AppError, CategoryReport, LedgerStore};
use crate::domain::{CategoryStyle, DATE_FORMAT, ExpenseRecord, format_cents};

/// Spendlog - plain-CSV expense ledger
#[derive(Parser)]
#[command(name = "spendlog")]
#[command(about = "Record, list and summarize personal expenses in a CSV file")]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    #[arg(short, long, env = "SPENDLOG_FILE", default_value = "expenses.csv")]
    pub file: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger file with its header (does nothing if it exists)
    Init,

    /// Record an expense
    Add {
        /// Amount spent (e.g., "12.50" or "12"), must be positive
        amount: String,

        /// Category (e.g., "Food", "Transport"); blank means "Uncategorized"
        #[arg(short, long, default_value = "")]
        category: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Store the category as "Capitalized" regardless of how it was typed
        #[arg(long)]
        capitalize: bool,
    },

    /// List all expenses, numbered
    List,

    /// Delete expenses by date, by category, or by list number
    #[command(group(
        ArgGroup::new("target")
            .required(true)
            .args(["date", "category", "index"])
    ))]
    Delete {
        /// Delete every expense on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Delete every expense in this category
        #[arg(long)]
        category: Option<String>,

        /// Match the category without regard to case
        #[arg(long, requires = "category")]
        ignore_case: bool,

        /// Delete the expense with this number, as shown by `list`
        #[arg(long)]
        index: Option<usize>,
    },

    /// Show total spending per category
    Totals {
        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,
    },

    /// Show the single most expensive expense
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let store = LedgerStore::open(&self.file);

        match run_command(store, self.command) {
            Err(e) if matches!(e.downcast_ref::<AppError>(), Some(AppError::MissingStore(_))) => {
                println!("No expenses recorded yet.");
                Ok(())
            }
            other => other,
        }
    }
}

fn run_command(mut store: LedgerStore, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            if store.initialize()? {
                println!("Ledger initialized: {}", store.location());
            } else {
                println!("Ledger already exists: {}", store.location());
            }
        }

        Commands::Add {
            amount,
            category,
            date,
            capitalize,
        } => {
            if capitalize {
                store = store.with_category_style(CategoryStyle::Capitalize);
            }
            let date = date.unwrap_or_else(|| Local::now().format(DATE_FORMAT).to_string());

            let record = store.add_expense(&date, &category, &amount)?;
            println!(
                "Added expense: {} | {} | {}",
                record.date,
                record.category,
                display_amount(&record)
            );
        }

        Commands::List => {
            let records = store.list()?;
            print_records(&records);
        }

        Commands::Delete {
            date,
            category,
            ignore_case,
            index,
        } => {
            if let Some(position) = index {
                let removed = store.delete_at(position)?;
                println!(
                    "Deleted expense #{}: {} | {} | {}",
                    position,
                    removed.date,
                    removed.category,
                    display_amount(&removed)
                );
            } else {
                let (label, count) = match (date, category) {
                    (Some(date), _) => {
                        let count = store.delete_by_date(&date)?;
                        (format!("date '{}'", date), count)
                    }
                    (None, Some(category)) => {
                        let count = store.delete_by_category(&category, ignore_case)?;
                        (format!("category '{}'", category), count)
                    }
                    // clap's "target" group guarantees one of the three
                    (None, None) => return Ok(()),
                };

                if count == 0 {
                    println!("No matching expenses found for {}.", label);
                } else {
                    println!("Deleted {} expense(s) with {}.", count, label);
                }
            }
        }

        Commands::Totals { format } => {
            let report = store.totals_by_category()?;
            print_report(&report, format)?;
        }

        Commands::Top => match store.most_expensive()? {
            Some(record) => println!(
                "Most expensive: {} | {} | {}",
                record.date,
                record.category,
                display_amount(&record)
            ),
            None => println!("No expenses recorded yet."),
        },
    }

    Ok(())
}

fn print_records(records: &[ExpenseRecord]) {
    if records.is_empty() {
        println!("No expenses recorded yet.");
        return;
    }

    println!("{:>4}  {:<12} {:<20} {:>12}", "#", "DATE", "CATEGORY", "AMOUNT");
    println!("{}", "-".repeat(52));
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>4}  {:<12} {:<20} {:>12}",
            i + 1,
            record.date,
            truncate(&record.category, 20),
            display_amount(record)
        );
    }
}

fn print_report(report: &CategoryReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Table => {
            if report.is_empty() {
                println!("No expenses recorded yet.");
                return Ok(());
            }
            println!("{:<20} {:>12} {:>6} {:>7}", "CATEGORY", "TOTAL", "COUNT", "%");
            println!("{}", "-".repeat(48));
            for summary in &report.categories {
                println!(
                    "{:<20} {:>12} {:>6} {:>6.1}%",
                    truncate(&summary.category, 20),
                    format!("${}", format_cents(summary.total)),
                    summary.count,
                    summary.percentage
                );
            }
            println!("{}", "-".repeat(48));
            println!(
                "{:<20} {:>12}",
                "TOTAL",
                format!("${}", format_cents(report.total))
            );
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            println!("{}", json);
        }
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["category", "total", "count", "percentage"])?;
            for summary in &report.categories {
                writer.write_record([
                    summary.category.clone(),
                    format_cents(summary.total),
                    summary.count.to_string(),
                    format!("{:.2}", summary.percentage),
                ])?;
            }
            writer.flush().context("Failed to write CSV")?;
        }
    }
    Ok(())
}

/// Amount as "$12.50", or the raw stored text if it doesn't parse.
fn display_amount(record: &ExpenseRecord) -> String {
    match record.amount_cents() {
        Ok(cents) => format!("${}", format_cents(cents)),
        Err(_) => record.amount.clone(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
