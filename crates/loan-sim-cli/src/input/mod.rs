pub mod file;
pub mod stdin;

use serde_json::Value;

/// JSON input from `--input <file>` if given, else from piped stdin.
/// `None` means the command should fall back to its flags.
pub fn file_or_stdin(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            log::debug!("reading input from {p}");
            Ok(Some(file::read_json_value(p)?))
        }
        None => stdin::read_stdin(),
    }
}
