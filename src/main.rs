mod checks;
mod endpoint;
mod error;
mod lnk_sta;
mod lspci;
mod pci_addr;
mod pci_device;
mod profile;
mod report;
mod side_switch;
mod slot;
mod switch;
mod tree;

use std::{
    io::{Write, stderr, stdout},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Arg, ArgAction, ArgGroup, CommandFactory, Parser};
use colored::Colorize;

use checks::SystemChecker;
use endpoint::{AnnotatedEndpoint, EndpointKind, Upstream, map_endpoints};
use lnk_sta::LnkSta;
use lspci::{Filter, ListingMode, Lspci, PciSource, enumerate, enumerate_verbose};
use pci_addr::PciAddr;
use pci_device::{PcieDevice, parse_listing};
use profile::{EndpointProfile, Profile};
use side_switch::{SideSwitchPair, resolve_side_switch};
use slot::{SlotInfo, annotate};
use switch::{SwitchMap, context_chunks, resolve_switches};
use tree::{TreeLine, TreeLineKind, render_tree};

/// lspci info tool for HGX systems
#[derive(Debug, Parser)]
#[command(name = "pcislot", version, disable_version_flag = true)]
#[command(group(ArgGroup::new("view").args(["tree", "gpu", "nic"]).multiple(false)))]
#[command(arg(Arg::new("version")
    .short('v')
    .long("version")
    .action(ArgAction::Version)
    .help("Show program's version number and exit")))]
struct Cli {
    /// Show root port, GPU, NIC and main PLX switch topology tree
    #[arg(short = 't')]
    tree: bool,

    /// Show GPU bus ID, slot, PLX switch bus ID and CPU node mapping
    #[arg(short = 'g')]
    gpu: bool,

    /// Show NIC bus ID, slot, PLX switch bus ID and CPU node mapping
    #[arg(short = 'n')]
    nic: bool,

    /// Load device patterns from a TOML profile
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a sample TOML profile and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum View {
    Tree,
    Endpoints(EndpointKind),
}

impl Cli {
    fn view(&self) -> Option<View> {
        if self.tree {
            Some(View::Tree)
        } else if self.gpu {
            Some(View::Endpoints(EndpointKind::Gpu))
        } else if self.nic {
            Some(View::Endpoints(EndpointKind::Nic))
        } else {
            None
        }
    }
}

fn fatal(err: &error::Error) -> ExitCode {
    println!("{}", format!("Error: {}", err).red().bold());
    ExitCode::from(1)
}

fn show_endpoints(source: &dyn PciSource, kind: EndpointKind, profile: &Profile) {
    let endpoints = map_endpoints(source, kind, profile);

    for ep in &endpoints {
        println!("{}", report::endpoint_line(ep));
    }
}

fn show_tree(source: &dyn PciSource, profile: &Profile) {
    println!("{}", report::tree_header());

    for line in render_tree(&source.listing(ListingMode::Tree), profile) {
        println!("{}", report::tree_line(&line));
    }
}

fn run<C>(view: View, check: C, source: &dyn PciSource, profile: &Profile) -> error::Result<()>
where
    C: FnOnce() -> error::Result<()>,
{
    check()?;

    match view {
        View::Tree => show_tree(source, profile),
        View::Endpoints(kind) => show_endpoints(source, kind, profile),
    }

    stdout().flush()?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", Profile::sample_toml());
        return ExitCode::SUCCESS;
    }

    let Some(view) = cli.view() else {
        let mut err = stderr();
        let _ = Cli::command().write_help(&mut err);
        let _ = writeln!(err);
        return ExitCode::from(1);
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let profile = match &cli.config {
        Some(path) => match Profile::from_toml_file(path) {
            Ok(profile) => profile,
            Err(e) => return fatal(&e),
        },
        None => Profile::default(),
    };

    let checker = SystemChecker::new(&profile.compatible_systems);

    match run(view, || checker.run(), &Lspci::new(), &profile) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&e),
    }
}
