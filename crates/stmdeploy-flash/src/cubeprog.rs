//! STM32CubeProgrammer command lines
//!
//! ```text
//! STM32_Programmer_CLI -c port=<port> -w <file> <addr> [-v <file> <addr>] [-rst]
//! STM32_Programmer_CLI -c port=<port> -e <all|0>
//! STM32_Programmer_CLI -c port=<port> -q
//! STM32_Programmer_CLI -c port=<port> -r <file> <addr> <size>
//! ```

use std::path::Path;

use stmdeploy_core::hex;

fn connect(port: &str) -> Vec<String> {
    vec!["-c".to_string(), format!("port={}", port)]
}

/// Write `binary` at `address`, optionally verifying and resetting
pub fn flash_args(port: &str, binary: &Path, address: u32, verify: bool, reset: bool) -> Vec<String> {
    let file = binary.display().to_string();
    let mut args = connect(port);
    args.extend(["-w".to_string(), file.clone(), hex(address)]);
    if verify {
        args.extend(["-v".to_string(), file, hex(address)]);
    }
    if reset {
        args.push("-rst".to_string());
    }
    args
}

/// Erase the whole chip (`full`) or sector 0
pub fn erase_args(port: &str, full: bool) -> Vec<String> {
    let mut args = connect(port);
    args.extend(["-e".to_string(), if full { "all" } else { "0" }.to_string()]);
    args
}

/// Query the connected device
pub fn query_args(port: &str) -> Vec<String> {
    let mut args = connect(port);
    args.push("-q".to_string());
    args
}

/// Dump `size` bytes at `address` into `output`
pub fn read_args(port: &str, output: &Path, address: u32, size: u32) -> Vec<String> {
    let mut args = connect(port);
    args.extend([
        "-r".to_string(),
        output.display().to_string(),
        hex(address),
        hex(size),
    ]);
    args
}
