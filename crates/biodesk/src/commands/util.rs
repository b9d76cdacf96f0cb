//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::error::CliError;
use crate::output::OutputOpts;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, the action is refused rather than
/// assumed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Await `fut` behind a stderr spinner when attached to a terminal.
pub async fn with_spinner<F: Future>(opts: &OutputOpts, message: String, fut: F) -> F::Output {
    if !opts.progress {
        return fut.await;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = fut.await;
    spinner.finish_and_clear();
    result
}

/// Read `--from-file` as `field=value` pairs, in file order.
///
/// Scalars keep their JSON spelling (`true`, `12.5`); `null` clears the
/// field.
pub fn read_assignments(path: &Path) -> Result<Vec<(String, String)>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let Value::Object(object) = value else {
        return Err(CliError::Validation {
            field: "from-file".into(),
            reason: "expected a JSON object of field values".into(),
        });
    };
    object
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(CliError::Validation {
                        field,
                        reason: "nested values are not supported".into(),
                    });
                }
            };
            Ok((field, text))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn file_values_become_form_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"biobank_code": "BB-01", "ffpe": true, "weight": 12.5, "notes": null}}"#
        )
        .unwrap();
        let pairs = read_assignments(file.path()).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("biobank_code".to_owned(), "BB-01".to_owned()),
                ("ffpe".to_owned(), "true".to_owned()),
                ("weight".to_owned(), "12.5".to_owned()),
                ("notes".to_owned(), String::new()),
            ]
        );
    }

    #[test]
    fn non_object_files_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        assert!(matches!(
            read_assignments(file.path()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("Delete?", "delete", true).unwrap());
    }
}
