use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gettext_catalog::{Catalog, Error, ReadOptions, codec};
use gettext_catalog_cli::{
    lookup::{Query, resolve},
    view::{print_view, view_json},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Options shared by every command that reads a catalog.
#[derive(clap::Args, Debug)]
struct ReadArgs {
    /// The catalog file (.mo, .po or .json)
    #[arg(short, long)]
    input: String,

    /// Language to use when the file does not declare one
    #[arg(short, long)]
    lang: Option<String>,

    /// Skip PO entries flagged fuzzy
    #[arg(long)]
    no_fuzzy: bool,

    /// Fail instead of falling back to the single-form plural rule
    #[arg(long)]
    strict: bool,
}

impl ReadArgs {
    fn options(&self) -> ReadOptions {
        ReadOptions::new()
            .with_language_hint(self.lang.clone())
            .with_fuzzy(!self.no_fuzzy)
            .with_strict(self.strict)
    }
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve one message the way an application would.
    Lookup {
        #[command(flatten)]
        read: ReadArgs,

        /// Message context (msgctxt)
        #[arg(short, long, default_value = "")]
        context: String,

        /// Source string (msgid)
        #[arg(long)]
        id: String,

        /// Plural source string (msgid_plural)
        #[arg(long)]
        plural: Option<String>,

        /// Count used to select the plural form
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// View the messages of a catalog.
    View {
        #[command(flatten)]
        read: ReadArgs,

        /// Display full value without truncation
        #[arg(long)]
        full: bool,

        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert catalogs between formats.
    Convert {
        /// The input file to process
        #[arg(short, long)]
        input: String,
        /// The output file to write the results to
        #[arg(short, long)]
        output: String,
        /// Language to use when the input does not declare one
        #[arg(short, long)]
        lang: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(args.commands) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(commands: Commands) -> Result<(), Error> {
    debug!(?commands, "running command");
    match commands {
        Commands::Lookup {
            read,
            context,
            id,
            plural,
            count,
        } => {
            let catalog = Catalog::open(&read.input, &read.options())?;
            let query = Query {
                context,
                id,
                plural,
                count,
            };
            println!("{}", resolve(&catalog, &query));
        }
        Commands::View { read, full, json } => {
            let resource = codec::read_resource_auto(&read.input, &read.options())?;
            let catalog = Catalog::from_resource(resource.clone(), &read.options())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view_json(&resource, &catalog))?);
            } else {
                print_view(&resource, &catalog, full);
            }
        }
        Commands::Convert {
            input,
            output,
            lang,
        } => {
            let input_format = codec::infer_format_from_extension(&input)
                .ok_or_else(|| Error::UnknownFormat(input.clone()))?;
            let output_format = codec::infer_format_from_extension(&output)
                .ok_or_else(|| Error::UnknownFormat(output.clone()))?;
            let options = ReadOptions::new().with_language_hint(lang);
            codec::convert(&input, input_format, &output, output_format, &options)?;
        }
    }
    Ok(())
}
