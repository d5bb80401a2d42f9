use std::process::Command;

use nix::unistd::geteuid;

use crate::error::{Error, Result};

const PART_NUMBER: &str = "Product Part Number";

pub struct SystemChecker<'a> {
    compatible_systems: &'a [String],
}

impl<'a> SystemChecker<'a> {
    pub fn new(compatible_systems: &'a [String]) -> SystemChecker<'a> {
        SystemChecker { compatible_systems }
    }

    pub fn run(&self) -> Result<()> {
        check_root()?;
        check_tool("ipmitool", None)?;
        check_tool("lspci", Some("pciutils"))?;
        self.check_system_compatibility()
    }

    fn check_system_compatibility(&self) -> Result<()> {
        let output = Command::new("ipmitool").args(["fru", "list"]).output()?;

        if !output.status.success() {
            log::warn!("ipmitool fru list exited with {}", output.status);
        }

        check_part_numbers(&String::from_utf8_lossy(&output.stdout), self.compatible_systems)
    }
}

fn check_root() -> Result<()> {
    if geteuid().is_root() {
        Ok(())
    } else {
        Err(Error::NotRoot)
    }
}

fn check_tool(tool: &'static str, package: Option<&'static str>) -> Result<()> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("found {} at {}", tool, path.display());
            Ok(())
        }
        Err(_) => Err(Error::MissingTool { tool, package }),
    }
}

/// Every part number line in the FRU listing must name a compatible system.
/// A listing without part numbers raises no objection.
pub fn check_part_numbers(fru: &str, compatible: &[String]) -> Result<()> {
    for line in fru.lines().filter(|line| line.contains(PART_NUMBER)) {
        let part_number = line.rsplit(':').next().unwrap_or_default().trim();

        if !compatible.iter().any(|pn| part_number.contains(pn.as_str())) {
            return Err(Error::IncompatibleSystem(part_number.to_string()));
        }

        log::debug!("system part number {} is compatible", part_number);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compatible() -> Vec<String> {
        vec!["SYS-821GE-TNHR".to_string()]
    }

    const FRU: &str = "\
FRU Device Description : Builtin FRU Device (ID 0)
 Chassis Type          : Other
 Board Mfg             : Supermicro
 Product Manufacturer  : Supermicro
 Product Name          :
 Product Part Number   : SYS-821GE-TNHR
";

    #[test]
    fn listed_system_passes() {
        assert!(check_part_numbers(FRU, &compatible()).is_ok());
    }

    #[test]
    fn unlisted_system_is_rejected() {
        let fru = FRU.replace("SYS-821GE-TNHR", "SYS-421GE-TNRT");

        match check_part_numbers(&fru, &compatible()) {
            Err(Error::IncompatibleSystem(pn)) => assert_eq!(pn, "SYS-421GE-TNRT"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn no_part_number_raises_no_objection() {
        assert!(check_part_numbers("FRU Device Description : Builtin FRU Device (ID 0)", &compatible()).is_ok());
        assert!(check_part_numbers("", &compatible()).is_ok());
    }

    #[test]
    fn error_messages() {
        assert_eq!(Error::NotRoot.to_string(), "This script must be run as root.");
        assert_eq!(
            Error::MissingTool {
                tool: "ipmitool",
                package: None
            }
            .to_string(),
            "ipmitool is not installed. Please install it to use this script."
        );
        assert_eq!(
            Error::MissingTool {
                tool: "lspci",
                package: Some("pciutils")
            }
            .to_string(),
            "lspci is not installed. Please install pciutils to use this script."
        );
        assert_eq!(
            Error::IncompatibleSystem("X".into()).to_string(),
            "This system PN is not listed on the compatible system list."
        );
    }

    #[test]
    fn absent_tool_is_reported() {
        assert!(matches!(
            check_tool("pcislot-no-such-tool", None),
            Err(Error::MissingTool { .. })
        ));
    }
}
