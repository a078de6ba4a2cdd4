//! archive-rico CLI: spreadsheet finding aids to RiC-O graphs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use archive_rico::config::PipelineConfig;
use archive_rico::geo::{GeoNamesClient, GeoResolver, ReferenceGazetteer};
use archive_rico::graph::export::{write_graph, RdfOutput};
use archive_rico::graph::GraphAccumulator;
use archive_rico::mapping::{parse_rule_table, RuleTable};
use archive_rico::pipeline::Converter;
use archive_rico::source::read_workbook;
use archive_rico::structure::structure_model;
use archive_rico::vocab::Namespaces;

#[derive(Parser)]
#[command(name = "archive-rico", version, about = "Archival spreadsheets to RiC-O RDF")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an instance workbook using a mapping workbook.
    Convert {
        /// Mapping workbook (one rule sheet per hierarchy level).
        #[arg(long)]
        mapping: PathBuf,

        /// Instance workbook with the inventory rows.
        #[arg(long)]
        instances: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output syntax: turtle or ntriples.
        #[arg(long, default_value = "turtle")]
        format: String,

        /// Skip the GeoNames enrichment pass.
        #[arg(long)]
        no_enrich: bool,

        /// GeoNames web-service account; overrides the config file.
        #[arg(long, env = "GEONAMES_USERNAME")]
        geonames_user: Option<String>,

        /// Local GeoNames dump; overrides the config file.
        #[arg(long)]
        geonames_dump: Option<PathBuf>,
    },

    /// Print the rules parsed from a mapping workbook.
    Rules {
        #[arg(long)]
        mapping: PathBuf,
    },

    /// Write the schematic model of a mapping workbook.
    Structure {
        #[arg(long)]
        mapping: PathBuf,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, default_value = "turtle")]
        format: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Convert {
            mapping,
            instances,
            output,
            format,
            no_enrich,
            geonames_user,
            geonames_dump,
        } => {
            let format: RdfOutput = format.parse()?;
            if geonames_user.is_some() {
                config.geonames.username = geonames_user;
            }
            if geonames_dump.is_some() {
                config.geonames.reference_dump = geonames_dump;
            }

            let rules = load_rules(&mapping, &config)?;
            let source = read_workbook(&instances)?;
            let mut resolver = if no_enrich {
                None
            } else {
                Some(build_resolver(&config)?)
            };

            let out = Converter::new(&config, &rules).run(&source, resolver.as_mut())?;
            write_output(&out.context.graph, &rules.namespaces, format, output.as_deref())?;

            eprintln!("{}", out.context.report);
            if let Some(stats) = out.enrichment {
                eprintln!("{stats}");
            }
            eprintln!(
                "{} statements, {} entities",
                out.context.graph.len(),
                out.context.graph.entity_count()
            );
        }

        Commands::Rules { mapping } => {
            let rules = load_rules(&mapping, &config)?;
            for sheet in &rules.sheets {
                println!("{} ({} rules)", sheet.name, sheet.rules.len());
                for rule in &sheet.rules {
                    println!("  {rule}");
                }
            }
            for (sheet, reason) in &rules.skipped {
                println!("skipped {sheet}: {reason}");
            }
        }

        Commands::Structure {
            mapping,
            output,
            format,
        } => {
            let format: RdfOutput = format.parse()?;
            let rules = load_rules(&mapping, &config)?;
            let model = structure_model(&rules)?;
            write_output(&model, &rules.namespaces, format, output.as_deref())?;
        }
    }

    Ok(())
}

fn load_rules(path: &Path, config: &PipelineConfig) -> Result<RuleTable> {
    let workbook = read_workbook(path)?;
    let rules = parse_rule_table(&workbook, config)?;
    tracing::info!(
        sheets = rules.sheets.len(),
        rules = rules.rule_count(),
        skipped = rules.skipped.len(),
        "rule table loaded"
    );
    Ok(rules)
}

fn build_resolver(config: &PipelineConfig) -> Result<GeoResolver> {
    let mut resolver = GeoResolver::new();
    if let Some(dump) = &config.geonames.reference_dump {
        let reference = ReferenceGazetteer::load(dump)?;
        tracing::info!(path = %dump.display(), places = reference.len(), "reference gazetteer loaded");
        resolver = resolver.with_reference(reference);
    }
    match GeoNamesClient::from_config(&config.geonames) {
        Some(client) => resolver = resolver.with_remote(Box::new(client)),
        None => tracing::info!("no GeoNames username, remote lookups disabled"),
    }
    Ok(resolver)
}

fn write_output(
    graph: &GraphAccumulator,
    ns: &Namespaces,
    format: RdfOutput,
    path: Option<&Path>,
) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = write_graph(graph, ns, format, BufWriter::new(file))?;
            writer.flush().into_diagnostic()?;
            println!("Wrote {} statements to {}", graph.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = write_graph(graph, ns, format, stdout.lock())?;
            writer.flush().into_diagnostic()?;
        }
    }
    Ok(())
}
