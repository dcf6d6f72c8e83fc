pub mod aliases;
pub mod demo;
pub mod export;
pub mod history;
pub mod import;
pub mod init;
pub mod listing_screen;
pub mod mapper_form;
pub mod mapper_grid;
pub mod preview;
pub mod reservations;
pub mod status;
pub mod templates;
pub mod units;

use clap::{Parser, Subcommand};

use crate::error::{CasonaError, Result};
use crate::mapping::{ColumnMapping, Field, MappingDraft};

/// Parse repeated `--map field=index` flags into a mapping. Accepts the
/// field keys shown in `casona import --help`.
pub(crate) fn parse_map_args(args: &[String]) -> Result<Option<ColumnMapping>> {
    if args.is_empty() {
        return Ok(None);
    }
    let mut draft = MappingDraft::default();
    for arg in args {
        let (key, idx) = arg.split_once('=').ok_or_else(|| {
            CasonaError::Other(format!("Invalid --map '{arg}' (expected field=column)"))
        })?;
        let field = Field::from_key(key.trim())
            .ok_or_else(|| CasonaError::Other(format!("Unknown field '{key}' in --map")))?;
        let column: usize = idx
            .trim()
            .parse()
            .map_err(|_| CasonaError::Other(format!("Invalid column index '{idx}' in --map")))?;
        draft.set(field, column);
    }
    draft.build().map(Some).ok_or_else(|| {
        let missing: Vec<&str> = draft.missing_fields().iter().map(|f| f.key()).collect();
        CasonaError::MappingIncomplete(missing.join(", "))
    })
}

#[derive(Parser)]
#[command(name = "casona", about = "Reservation bookkeeping CLI for vacation-rental hosts.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up casona: choose a data directory and initialize the database.
    Init {
        /// Path for casona data (default: ~/Documents/casona)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage billing units.
    Units {
        #[command(subcommand)]
        command: UnitsCommands,
    },
    /// Manage listing-name aliases.
    Alias {
        #[command(subcommand)]
        command: AliasCommands,
    },
    /// Import a reservation export (CSV/XLSX) from Airbnb, Booking.com or
    /// any mapped format.
    Import {
        /// Path to the file to import
        file: String,
        /// Billing unit for rows without a listing column
        #[arg(long)]
        unit: Option<String>,
        /// Saved template to use for unrecognized formats
        #[arg(long)]
        template: Option<String>,
        /// Interactive mapper variant: form or grid (default from settings)
        #[arg(long)]
        mapper: Option<String>,
        /// Column assignment, e.g. --map guest=0 --map checkin=1
        #[arg(long = "map")]
        map: Vec<String>,
        /// Date format: DD/MM/YYYY, MM/DD/YYYY, YYYY-MM-DD, DD-MM-YYYY
        #[arg(long = "date-format")]
        date_format: Option<String>,
        /// Number format: EU or US
        #[arg(long = "number-format")]
        number_format: Option<String>,
        /// Amount type: NET or GROSS
        #[arg(long = "amount-type")]
        amount_type: Option<String>,
        /// Delete existing reservations for the affected units first
        #[arg(long)]
        replace: bool,
        /// Import rows that match existing reservations
        #[arg(long = "allow-duplicates")]
        allow_duplicates: bool,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Parse a file and show what an import would do, without writing.
    Preview {
        /// Path to the file to preview
        file: String,
        /// Saved template to use for unrecognized formats
        #[arg(long)]
        template: Option<String>,
        /// Column assignment, e.g. --map guest=0 --map checkin=1
        #[arg(long = "map")]
        map: Vec<String>,
        #[arg(long = "date-format")]
        date_format: Option<String>,
        #[arg(long = "number-format")]
        number_format: Option<String>,
        /// Show at most this many rows (default 20)
        #[arg(long, default_value = "20")]
        rows: usize,
    },
    /// Manage saved mapping templates.
    Templates {
        #[command(subcommand)]
        command: TemplatesCommands,
    },
    /// Show past imports and their outcomes.
    History,
    /// List reservations.
    Reservations {
        /// Filter by billing unit name
        #[arg(long)]
        unit: Option<String>,
        /// Filter by status (Confirmada, Cancelada, Completada, Pendiente)
        #[arg(long)]
        status: Option<String>,
    },
    /// Export reservations to a CSV file.
    Export {
        /// Output path (default: <data_dir>/exports/reservations-YYYYMMDD.csv)
        #[arg(long)]
        output: Option<String>,
        /// Only export one billing unit
        #[arg(long)]
        unit: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
    /// Load sample units and reservations to explore casona.
    Demo,
}

#[derive(Subcommand)]
pub enum UnitsCommands {
    /// Add a billing unit.
    Add {
        /// Unit name, e.g. 'Casa Azul'
        name: String,
        /// Short accounting code
        #[arg(long)]
        code: Option<String>,
    },
    /// List all billing units.
    List,
}

#[derive(Subcommand)]
pub enum AliasCommands {
    /// Map a listing name to a billing unit.
    Add {
        /// Listing name as it appears in platform exports
        listing: String,
        /// Billing unit name
        #[arg(long)]
        unit: String,
    },
    /// List all aliases.
    List,
    /// Delete an alias by ID.
    Delete {
        /// Alias ID (shown in `casona alias list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TemplatesCommands {
    /// List saved templates.
    List,
    /// Show one template's mapping and config.
    Show {
        /// Template name
        name: String,
    },
    /// Save a template from --map flags, without running an import.
    Save {
        /// Template name
        name: String,
        /// Column assignment, e.g. --map guest=0 --map checkin=1
        #[arg(long = "map", required = true)]
        map: Vec<String>,
        #[arg(long = "date-format")]
        date_format: Option<String>,
        #[arg(long = "number-format")]
        number_format: Option<String>,
        #[arg(long = "amount-type")]
        amount_type: Option<String>,
    },
    /// Delete a template by name.
    Delete {
        /// Template name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map_args_complete() {
        let args: Vec<String> = ["guest=0", "checkin=1", "checkout=2", "amount=3", "listing=5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = parse_map_args(&args).unwrap().unwrap();
        assert_eq!(mapping.guest_name, 0);
        assert_eq!(mapping.amount, 3);
        assert_eq!(mapping.listing, Some(5));
    }

    #[test]
    fn test_parse_map_args_empty_is_none() {
        assert!(parse_map_args(&[]).unwrap().is_none());
    }

    #[test]
    fn test_parse_map_args_incomplete() {
        let args = vec!["guest=0".to_string()];
        match parse_map_args(&args) {
            Err(CasonaError::MappingIncomplete(missing)) => {
                assert!(missing.contains("amount"));
            }
            other => panic!("expected MappingIncomplete, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_map_args_rejects_garbage() {
        assert!(parse_map_args(&["guest".to_string()]).is_err());
        assert!(parse_map_args(&["ghost=0".to_string()]).is_err());
        assert!(parse_map_args(&["guest=x".to_string()]).is_err());
    }
}
