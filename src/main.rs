mod cli;
mod db;
mod detect;
mod error;
mod fmt;
mod importer;
mod mapping;
mod matcher;
mod models;
mod outcome;
mod parse;
mod preview;
mod settings;
mod table;
mod tui;

use clap::Parser;

use cli::{AliasCommands, Cli, Commands, TemplatesCommands, UnitsCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Units { command } => match command {
            UnitsCommands::Add { name, code } => cli::units::add(&name, code.as_deref()),
            UnitsCommands::List => cli::units::list(),
        },
        Commands::Alias { command } => match command {
            AliasCommands::Add { listing, unit } => cli::aliases::add(&listing, &unit),
            AliasCommands::List => cli::aliases::list(),
            AliasCommands::Delete { id } => cli::aliases::delete(id),
        },
        Commands::Import {
            file,
            unit,
            template,
            mapper,
            map,
            date_format,
            number_format,
            amount_type,
            replace,
            allow_duplicates,
            yes,
        } => cli::import::run(cli::import::ImportArgs {
            file,
            unit,
            template,
            mapper,
            map,
            date_format,
            number_format,
            amount_type,
            replace,
            allow_duplicates,
            yes,
        }),
        Commands::Preview {
            file,
            template,
            map,
            date_format,
            number_format,
            rows,
        } => cli::preview::run(
            &file,
            template.as_deref(),
            &map,
            date_format.as_deref(),
            number_format.as_deref(),
            rows,
        ),
        Commands::Templates { command } => match command {
            TemplatesCommands::List => cli::templates::list(),
            TemplatesCommands::Show { name } => cli::templates::show(&name),
            TemplatesCommands::Save {
                name,
                map,
                date_format,
                number_format,
                amount_type,
            } => cli::templates::save(
                &name,
                &map,
                date_format.as_deref(),
                number_format.as_deref(),
                amount_type.as_deref(),
            ),
            TemplatesCommands::Delete { name } => cli::templates::delete(&name),
        },
        Commands::History => cli::history::run(),
        Commands::Reservations { unit, status } => {
            cli::reservations::list(unit.as_deref(), status.as_deref())
        }
        Commands::Export { output, unit } => cli::export::run(output.as_deref(), unit.as_deref()),
        Commands::Status => cli::status::run(),
        Commands::Demo => cli::demo::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
