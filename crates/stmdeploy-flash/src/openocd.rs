//! OpenOCD command lines
//!
//! ```text
//! openocd -f interface/<cfg> -f target/<cfg> -c init -c halt \
//!         -c "program <file> <addr> [verify]" [-c reset] -c exit
//! ```

use std::path::Path;

use stmdeploy_core::hex;

/// Target configuration used when the chip name matches nothing better
pub const DEFAULT_TARGET: &str = "stm32f1x.cfg";

/// Chip name fragments and their target configuration, first match wins
pub const TARGET_CONFIGS: &[(&str, &str)] = &[
    ("f103", "stm32f1x.cfg"),
    ("f4", "stm32f4x.cfg"),
    ("g4", "stm32g4x.cfg"),
];

/// Interface configuration for a port: ST-LINK for SWD, J-Link otherwise
pub fn interface_config(port: &str) -> &'static str {
    if port.eq_ignore_ascii_case("SWD") {
        "stlink.cfg"
    } else {
        "jlink.cfg"
    }
}

/// Target configuration for a chip identifier
pub fn target_config(chip: &str) -> &'static str {
    let chip = chip.to_ascii_lowercase();
    TARGET_CONFIGS
        .iter()
        .find(|(fragment, _)| chip.contains(fragment))
        .map(|(_, cfg)| *cfg)
        .unwrap_or(DEFAULT_TARGET)
}

/// Program `binary` at `address`, optionally verifying and resetting
pub fn flash_args(
    port: &str,
    chip: &str,
    binary: &Path,
    address: u32,
    verify: bool,
    reset: bool,
) -> Vec<String> {
    let mut program = format!("program {} {}", binary.display(), hex(address));
    if verify {
        program.push_str(" verify");
    }

    let commands = [
        "init".to_string(),
        "halt".to_string(),
        program,
        if reset { "reset" } else { "" }.to_string(),
        "exit".to_string(),
    ];

    let mut args = vec![
        "-f".to_string(),
        format!("interface/{}", interface_config(port)),
        "-f".to_string(),
        format!("target/{}", target_config(chip)),
    ];
    // An empty command drops its `-c` too
    for command in commands.into_iter().filter(|c| !c.is_empty()) {
        args.push("-c".to_string());
        args.push(command);
    }
    args
}
