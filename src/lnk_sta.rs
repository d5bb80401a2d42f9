use std::{
    fmt::{Display, Formatter},
    sync::OnceLock,
};

use regex::Regex;

/// Negotiated link status as reported by `lspci -vv`.
#[derive(Clone, Debug, PartialEq)]
pub struct LnkSta {
    gt: f32,
    width: u8,
    downgraded: bool,
}

impl LnkSta {
    pub fn new(gt: f32, width: u8, downgraded: bool) -> LnkSta {
        LnkSta {
            gt,
            width,
            downgraded,
        }
    }

    pub fn parse(line: &str) -> Option<LnkSta> {
        static LNK_STA_RE: OnceLock<Regex> = OnceLock::new();

        let caps = LNK_STA_RE
            .get_or_init(|| {
                Regex::new(concat!(
                    r"LnkSta:\s+",
                    r"Speed ([0-9.]+)GT/s",
                    r"((?: \(ok\))?)",
                    r"((?: \(downgraded\))?)",
                    r", ",
                    r"Width x([0-9]+)",
                    r"((?: \(ok\))?)",
                    r"((?: \(downgraded\))?)"
                ))
                .unwrap()
            })
            .captures(line)?;

        Some(LnkSta::new(
            caps[1].parse::<f32>().ok()?,
            caps[4].parse::<u8>().ok()?,
            !caps[3].is_empty() || !caps[6].is_empty(),
        ))
    }

    pub fn downgraded(&self) -> bool {
        self.downgraded
    }
}

impl Display for LnkSta {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}GT/s x{}{}",
            self.gt,
            self.width,
            if self.downgraded { " (downgraded)" } else { "" }
        )
    }
}
