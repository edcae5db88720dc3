use std::fs;
use std::path::{Path, PathBuf};

use catalog_core::content::{self, load_snapshot};
use catalog_core::generate::{self, AssetRef};
use catalog_core::resource_number::ResourceNumber;
use catalog_core::{archive, diff_master_maps, logging, reconcile};
use catalog_core::{CatalogConfig, Classifier, GoverningRules, Report};
use clap::{Parser, Subcommand};

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_LOAD: i32 = 10;
const EXIT_ERRORS: i32 = 11;

#[derive(Parser)]
#[command(name = "resmap", version, about = "Resource catalog consistency tools")]
struct Cli {
    /// Catalog configuration file; defaults apply relative to the working directory.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode or decode resource numbers.
    Resid {
        #[command(subcommand)]
        command: ResidCommand,
    },
    /// Print the symbolic key for each asset path.
    Classify {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Cross-check headers, package indices and the master map.
    Reconcile,
    /// Generate a master map from the package indices.
    Mastermap {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Re-emit one package index with classified keys in place of paths.
    Relabel { package: String },
    /// Report keys and types in TARGET missing from BASE.
    Diff { base: PathBuf, target: PathBuf },
    /// Check that every file a bundled master map references is in the archive.
    VerifyArchive { archive: PathBuf },
    /// Write master map, headers and package indices from a descriptor table.
    Generate { descriptor: PathBuf },
    /// Update a descriptor table from the master map.
    Sync { descriptor: PathBuf, map: PathBuf },
}

#[derive(Subcommand)]
enum ResidCommand {
    Encode {
        package: u32,
        instance: u32,
        res_type: u32,
    },
    Decode {
        #[arg(required = true)]
        literals: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = cli.config.as_deref();
    let exit_code = match cli.command {
        Commands::Resid { command } => run_resid(command),
        Commands::Classify { paths } => run_classify(&paths),
        Commands::Reconcile => run_reconcile(config),
        Commands::Mastermap { out } => run_mastermap(config, out.as_deref()),
        Commands::Relabel { package } => run_relabel(config, &package),
        Commands::Diff { base, target } => run_diff(&base, &target),
        Commands::VerifyArchive { archive } => run_verify_archive(config, &archive),
        Commands::Generate { descriptor } => run_generate(config, &descriptor),
        Commands::Sync { descriptor, map } => run_sync(&descriptor, &map),
    };
    std::process::exit(exit_code);
}

fn run_resid(command: ResidCommand) -> i32 {
    match command {
        ResidCommand::Encode {
            package,
            instance,
            res_type,
        } => {
            println!("{}", ResourceNumber::encode(package, instance, res_type).describe());
            EXIT_SUCCESS
        }
        ResidCommand::Decode { literals } => {
            let mut exit_code = EXIT_SUCCESS;
            for literal in literals {
                match ResourceNumber::parse(&literal) {
                    Ok(number) => println!("{}", number.describe()),
                    Err(err) => {
                        eprintln!("{}", err);
                        exit_code = EXIT_USAGE;
                    }
                }
            }
            exit_code
        }
    }
}

fn run_classify(paths: &[String]) -> i32 {
    let classifier = Classifier::builtin();
    for path in paths {
        match classifier.classify(path).name() {
            Some(key) => println!("{} -> {}", path, key),
            None => println!("{} {}", generate::NO_MATCH_MARKER, path),
        }
    }
    EXIT_SUCCESS
}

fn run_reconcile(config_path: Option<&Path>) -> i32 {
    let (config, rules) = match load_config(config_path).and_then(|config| {
        let rules = GoverningRules::from_config(&config).map_err(load_failed)?;
        Ok((config, rules))
    }) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let snapshot = match load_snapshot(&config) {
        Ok(snapshot) => snapshot,
        Err(err) => return load_failed(err),
    };
    let outcome = reconcile(&snapshot.model, &rules, Classifier::builtin());

    for resolved in &outcome.resolved {
        println!(
            "{:<32} {} {:<10} {} ({})",
            resolved.symbol,
            resolved.number,
            resolved.resource_type,
            resolved.file_path,
            resolved.key.as_deref().unwrap_or("-")
        );
    }
    let mut report = snapshot.report;
    report.merge(outcome.report);
    finish(&report)
}

fn run_mastermap(config_path: Option<&Path>, out: Option<&Path>) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let mut snapshot = match load_snapshot(&config) {
        Ok(snapshot) => snapshot,
        Err(err) => return load_failed(err),
    };
    let assets: Vec<AssetRef> = snapshot
        .model
        .packages
        .values()
        .flat_map(|package| package.entries().iter().map(AssetRef::from_entry))
        .collect();
    let generated =
        generate::generate_master_map(&assets, Classifier::builtin(), &mut snapshot.report);
    let text = generated.lines().join("\n") + "\n";
    match out {
        Some(path) => {
            if let Err(err) = fs::write(path, text) {
                eprintln!("write {} failed: {}", path.display(), err);
                return EXIT_LOAD;
            }
        }
        None => print!("{}", text),
    }
    finish(&snapshot.report)
}

fn run_relabel(config_path: Option<&Path>, package_name: &str) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let snapshot = match load_snapshot(&config) {
        Ok(snapshot) => snapshot,
        Err(err) => return load_failed(err),
    };
    let Some(package) = snapshot.model.packages.get(package_name) else {
        eprintln!("package not found: {}", package_name);
        return EXIT_USAGE;
    };
    for line in generate::relabel_package(package, Classifier::builtin()) {
        println!("{}", line);
    }
    EXIT_SUCCESS
}

fn run_diff(base: &Path, target: &Path) -> i32 {
    let mut load_report = Report::new();
    let maps = content::read_master_map(base, &mut load_report)
        .and_then(|base| Ok((base, content::read_master_map(target, &mut load_report)?)));
    let (base_map, target_map) = match maps {
        Ok(maps) => maps,
        Err(err) => return load_failed(err),
    };
    let mut report = load_report;
    report.merge(diff_master_maps(&base_map, &target_map));
    if report.is_empty() {
        println!("no differences");
    }
    finish(&report)
}

fn run_verify_archive(config_path: Option<&Path>, path: &Path) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    match archive::verify_zip(path, config.archive_prefix.as_deref()) {
        Ok(report) => finish(&report),
        Err(err) => load_failed(err),
    }
}

fn run_generate(config_path: Option<&Path>, descriptor: &Path) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let mut report = Report::new();
    let rows = match content::read_descriptors(descriptor, &mut report) {
        Ok(rows) => rows,
        Err(err) => return load_failed(err),
    };
    let artifacts = generate::generate_artifacts(&rows, &mut report);
    match artifacts.write_to(&config) {
        Ok(written) => {
            for path in written {
                println!("wrote {}", path.display());
            }
        }
        Err(err) => return load_failed(err),
    }
    finish(&report)
}

fn run_sync(descriptor: &Path, map: &Path) -> i32 {
    let mut report = Report::new();
    let loaded = content::read_descriptors(descriptor, &mut report)
        .and_then(|rows| Ok((rows, content::read_master_map(map, &mut report)?)));
    let (mut rows, master_map) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => return load_failed(err),
    };
    let changed = generate::sync_descriptors(&mut rows, &master_map, &mut report);
    if changed > 0 {
        if let Err(err) = content::write_descriptors(descriptor, &rows) {
            return load_failed(err);
        }
    }
    println!("{} descriptor rows updated", changed);
    finish(&report)
}

fn load_config(path: Option<&Path>) -> Result<CatalogConfig, i32> {
    match path {
        Some(path) => CatalogConfig::load(path).map_err(load_failed),
        None => Ok(CatalogConfig::default()),
    }
}

fn load_failed(err: catalog_core::CatalogError) -> i32 {
    tracing::error!(%err, "load failed");
    eprintln!("{}", err);
    EXIT_LOAD
}

fn finish(report: &Report) -> i32 {
    if !report.is_empty() {
        println!("{}", report.render());
    }
    if report.has_errors() {
        EXIT_ERRORS
    } else {
        EXIT_SUCCESS
    }
}
