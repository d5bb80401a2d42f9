use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::OnceLock,
};

use regex::Regex;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PciAddr {
    pub domain: u16,
    pub bus: u8,
    pub devfn: u8,
}

impl PciAddr {
    pub fn new(domain: u16, bus: u8, device: u8, function: u8) -> PciAddr {
        PciAddr {
            domain,
            bus,
            devfn: (device << 3) | function,
        }
    }

    /// Parses the address at the start of an lspci line, e.g. `18:00.0` or
    /// `0000:18:00.0`. Returns the address and the remainder of the line.
    pub fn parse_prefix(line: &str) -> Option<(PciAddr, &str)> {
        static PCI_ADDR_RE: OnceLock<Regex> = OnceLock::new();

        let caps = PCI_ADDR_RE
            .get_or_init(|| {
                Regex::new(
                    r"^(?i)(?:([0-9a-f]{4}):)?([0-9a-f]{2}):([0-1][0-9a-f])\.([0-7])(?:\s+|$)",
                )
                .unwrap()
            })
            .captures(line)?;

        let domain = caps
            .get(1)
            .map_or(Some(0), |m| u16::from_str_radix(m.as_str(), 16).ok())?;
        let bus = u8::from_str_radix(&caps[2], 16).ok()?;
        let device = u8::from_str_radix(&caps[3], 16).ok()?;
        let function = u8::from_str_radix(&caps[4], 16).ok()?;

        let rest = &line[caps.get(0)?.end()..];

        Some((PciAddr::new(domain, bus, device, function), rest))
    }

    pub fn domain(&self) -> u16 {
        self.domain
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn device(&self) -> u8 {
        self.devfn >> 3
    }

    pub fn function(&self) -> u8 {
        self.devfn & 0x7
    }
}

impl FromStr for PciAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<PciAddr, String> {
        match PciAddr::parse_prefix(s.trim()) {
            Some((addr, rest)) if rest.is_empty() => Ok(addr),
            _ => Err(format!("invalid PCI address: {:?}", s)),
        }
    }
}

impl Display for PciAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain(),
            self.bus(),
            self.device(),
            self.function()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_defaults_to_domain_zero() {
        let addr: PciAddr = "1b:00.0".parse().unwrap();

        assert_eq!(addr, PciAddr::new(0, 0x1b, 0, 0));
        assert_eq!(addr.to_string(), "0000:1b:00.0");
    }

    #[test]
    fn display_is_canonical_lowercase() {
        let addr: PciAddr = "0001:9A:1F.7".parse().unwrap();

        assert_eq!(addr.domain(), 1);
        assert_eq!(addr.bus(), 0x9a);
        assert_eq!(addr.device(), 0x1f);
        assert_eq!(addr.function(), 7);
        assert_eq!(addr.to_string(), "0001:9a:1f.7");
    }

    #[test]
    fn prefix_leaves_description() {
        let (addr, rest) =
            PciAddr::parse_prefix("18:00.0 3D controller: NVIDIA Corporation").unwrap();

        assert_eq!(addr.to_string(), "0000:18:00.0");
        assert_eq!(rest, "3D controller: NVIDIA Corporation");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!("18:00".parse::<PciAddr>().is_err());
        assert!("18:20.0".parse::<PciAddr>().is_err());
        assert!("18:00.8".parse::<PciAddr>().is_err());
        assert!("18:00.0 trailing".parse::<PciAddr>().is_err());
        assert!(PciAddr::parse_prefix("\tSubsystem: NVIDIA").is_none());
    }
}
