use std::fmt::{Display, Formatter};

use crate::{
    EndpointProfile, Filter, LnkSta, ListingMode, PciAddr, PciSource, Profile, SideSwitchPair,
    SlotInfo, SwitchMap, annotate, enumerate, parse_listing, resolve_side_switch,
    resolve_switches,
};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum EndpointKind {
    Gpu,
    Nic,
}

impl EndpointKind {
    pub fn profile(self, profile: &Profile) -> &EndpointProfile {
        match self {
            EndpointKind::Gpu => &profile.gpu,
            EndpointKind::Nic => &profile.nic,
        }
    }
}

impl Display for EndpointKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            EndpointKind::Gpu => write!(f, "GPU"),
            EndpointKind::Nic => write!(f, "NIC"),
        }
    }
}

/// Where an endpoint's switch came from.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Upstream {
    /// Main PLX binding; `None` when no switch sat next to the endpoint.
    Main(Option<PciAddr>),
    /// Heuristic side-switch match for an endpoint without a slot.
    Side(PciAddr),
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedEndpoint {
    pub bus: PciAddr,
    pub kind: EndpointKind,
    pub physical_slot: String,
    pub upstream: Upstream,
    pub cpu_node: String,
    pub link: Option<LnkSta>,
}

/// The side switch is only asked for when the endpoint has no physical slot.
pub fn join<F>(slot: SlotInfo, kind: EndpointKind, switches: &SwitchMap, side: F) -> AnnotatedEndpoint
where
    F: FnOnce() -> Option<SideSwitchPair>,
{
    let upstream = if !slot.physical_slot.is_empty() {
        Upstream::Main(switches.get(&slot.bus).and_then(|binding| binding.switch))
    } else {
        match side() {
            Some(pair) if pair.endpoint == slot.bus => Upstream::Side(pair.switch),
            _ => Upstream::Unknown,
        }
    };

    AnnotatedEndpoint {
        bus: slot.bus,
        kind,
        physical_slot: slot.physical_slot,
        upstream,
        cpu_node: slot.cpu_node,
        link: slot.link,
    }
}

pub fn map_endpoints(
    source: &dyn PciSource,
    kind: EndpointKind,
    profile: &Profile,
) -> Vec<AnnotatedEndpoint> {
    let endpoints = enumerate(
        source,
        &Filter {
            pattern: &kind.profile(profile).filter,
            exclude_secondary_functions: true,
        },
    );

    if endpoints.is_empty() {
        log::info!("no {} endpoints found", kind);
        return Vec::new();
    }

    let kernel = parse_listing(&source.listing(ListingMode::Kernel));
    let switches = resolve_switches(&kernel, kind, profile);

    if switches.is_empty() {
        log::info!("no {} switch bindings resolved", kind);
    } else {
        log::debug!("{} {} switch bindings resolved", switches.len(), kind);
    }

    for binding in switches.iter() {
        log::debug!("{} binding {}", kind, binding);
    }

    let mut side: Option<Option<SideSwitchPair>> = None;

    endpoints
        .iter()
        .map(|dev| {
            log::debug!("{} {} {}", kind, dev.addr(), dev.description());

            let slot = annotate(source, dev.addr());
            join(slot, kind, &switches, || {
                *side.get_or_insert_with(|| resolve_side_switch(&kernel, profile))
            })
        })
        .collect()
}
