use std::process::Command;

use crate::{PciAddr, PcieDevice, parse_listing};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListingMode {
    /// `lspci`
    Flat,
    /// `lspci -k`
    Kernel,
    /// `lspci -s <addr> -vv`
    Verbose(PciAddr),
    /// `lspci -tvv`
    Tree,
}

pub trait PciSource {
    fn listing(&self, mode: ListingMode) -> Vec<String>;
}

#[derive(Debug)]
pub struct Lspci {
    program: String,
}

impl Lspci {
    pub fn new() -> Lspci {
        Lspci {
            program: "lspci".to_string(),
        }
    }

    fn args(mode: ListingMode) -> Vec<String> {
        match mode {
            ListingMode::Flat => Vec::new(),
            ListingMode::Kernel => vec!["-k".to_string()],
            ListingMode::Verbose(addr) => vec!["-s".to_string(), addr.to_string(), "-vv".to_string()],
            ListingMode::Tree => vec!["-tvv".to_string()],
        }
    }
}

impl Default for Lspci {
    fn default() -> Self {
        Self::new()
    }
}

impl PciSource for Lspci {
    fn listing(&self, mode: ListingMode) -> Vec<String> {
        let args = Lspci::args(mode);

        log::debug!("running {} {}", self.program, args.join(" "));

        let output = match Command::new(&self.program).args(&args).output() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("failed to run {}: {}", self.program, e);
                return Vec::new();
            }
        };

        if !output.status.success() {
            log::warn!(
                "{} {} exited with {}",
                self.program,
                args.join(" "),
                output.status
            );
            return Vec::new();
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct Filter<'a> {
    pub pattern: &'a str,
    pub exclude_secondary_functions: bool,
}

pub fn enumerate(source: &dyn PciSource, filter: &Filter) -> Vec<PcieDevice> {
    let devices = parse_listing(&source.listing(ListingMode::Flat))
        .into_iter()
        .filter(|dev| dev.mentions_ignore_case(filter.pattern))
        .filter(|dev| !(filter.exclude_secondary_functions && dev.is_secondary_function()))
        .collect::<Vec<_>>();

    log::debug!("{} devices match {:?}", devices.len(), filter.pattern);

    devices
}

pub fn enumerate_verbose(source: &dyn PciSource, addr: PciAddr) -> Vec<String> {
    source.listing(ListingMode::Verbose(addr))
}
