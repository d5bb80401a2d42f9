use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    ops::Range,
};

use crate::{EndpointKind, PciAddr, PcieDevice, Profile};

/// Records following a model match that still belong to its chunk.
pub const SWITCH_WINDOW: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwitchBinding {
    pub endpoint: PciAddr,
    pub switch: Option<PciAddr>,
}

impl Display for SwitchBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.switch {
            Some(switch) => write!(f, "{} -> {}", self.endpoint, switch),
            None => write!(f, "{} -> NA", self.endpoint),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SwitchMap {
    bindings: BTreeMap<PciAddr, SwitchBinding>,
}

impl SwitchMap {
    pub fn get(&self, endpoint: &PciAddr) -> Option<&SwitchBinding> {
        self.bindings.get(endpoint)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwitchBinding> {
        self.bindings.values()
    }

    fn record(&mut self, binding: SwitchBinding) {
        if let Some(prev) = self.bindings.insert(binding.endpoint, binding) {
            log::debug!("{} replaces earlier binding {}", binding, prev);
        }
    }
}

/// Merges `grep -A`-style context windows: each seed index covers itself and
/// `after` following indices, clipped to `len`.
pub fn context_chunks<I>(len: usize, seeds: I, after: usize) -> Vec<Range<usize>>
where
    I: IntoIterator<Item = usize>,
{
    let mut chunks: Vec<Range<usize>> = Vec::new();

    for seed in seeds {
        let window = seed..(seed + after + 1).min(len);

        match chunks.last_mut() {
            Some(last) if window.start <= last.end => last.end = last.end.max(window.end),
            _ => chunks.push(window),
        }
    }

    chunks
}

pub fn resolve_switches(devices: &[PcieDevice], kind: EndpointKind, profile: &Profile) -> SwitchMap {
    let endpoint = kind.profile(profile);
    let vendor = profile.switch.vendor.as_str();

    // NIC chunks skip the second port of each dual-port card.
    let devices = devices
        .iter()
        .filter(|dev| kind == EndpointKind::Gpu || !dev.is_secondary_function())
        .collect::<Vec<_>>();

    let seeds = devices
        .iter()
        .enumerate()
        .filter(|(_, dev)| dev.mentions(&endpoint.model))
        .map(|(i, _)| i);

    let mut map = SwitchMap::default();

    for chunk in context_chunks(devices.len(), seeds, SWITCH_WINDOW) {
        let chunk = &devices[chunk];

        let Some(key) = chunk.iter().find(|dev| dev.mentions(&endpoint.marker)) else {
            continue;
        };

        let switch = chunk
            .iter()
            .find(|dev| dev.mentions(vendor))
            .map(|dev| dev.addr());

        if switch.is_none() {
            log::debug!(
                "no {} switch near {} {} ({})",
                vendor,
                kind,
                key.addr(),
                key.driver_info()
            );
        }

        map.record(SwitchBinding {
            endpoint: key.addr(),
            switch,
        });
    }

    map
}
