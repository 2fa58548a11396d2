//! Command line arguments of the convergence driver.

use std::{num::NonZeroUsize, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_SAVE_INTERVAL: NonZeroUsize = match NonZeroUsize::new(1_000_000) {
  Some(interval) => interval,
  None => unreachable!(),
};
pub const DEFAULT_OUTPUT_DIR: &str = "out";

pub const USAGE: &str = "\
usage: induction -deg <int> -N <int>... [-s <int>] [-o <dir>] [--no-output]

  -deg <int>     degree of the polynomial space
  -N <int>...    number of cells per side, e.g. 20 40 80
  -s <int>       interval to save results (default 1000000)
  -o <dir>       output directory (default out)
  --no-output    do not write any files
  -h, --help     print this message";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
  #[error("missing required argument {0}")]
  Missing(&'static str),
  #[error("missing value for {0}")]
  MissingValue(String),
  #[error("invalid value `{value}` for {flag}")]
  InvalidValue { flag: String, value: String },
  #[error("unknown argument `{0}`")]
  Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
  pub degree: usize,
  pub resolutions: Vec<usize>,
  pub save_interval: NonZeroUsize,
  /// `None` disables file output.
  pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  Run(CliArgs),
  Help,
}

fn parse_value(flag: &str, value: &str, min: usize) -> Result<usize, CliError> {
  match value.parse::<usize>() {
    Ok(v) if v >= min => Ok(v),
    _ => Err(CliError::InvalidValue {
      flag: flag.to_string(),
      value: value.to_string(),
    }),
  }
}

/// Parses the arguments following the program name.
pub fn parse<I>(args: I) -> Result<Command, CliError>
where
  I: IntoIterator<Item = String>,
{
  let mut args = args.into_iter().peekable();

  let mut degree = None;
  let mut resolutions = Vec::new();
  let mut save_interval = DEFAULT_SAVE_INTERVAL;
  let mut output_dir = Some(PathBuf::from(DEFAULT_OUTPUT_DIR));
  let mut no_output = false;

  while let Some(arg) = args.next() {
    match arg.as_str() {
      "-h" | "--help" => return Ok(Command::Help),
      "-deg" => {
        let value = args.next().ok_or(CliError::MissingValue(arg.clone()))?;
        degree = Some(parse_value(&arg, &value, 0)?);
      }
      "-N" => {
        while let Some(value) = args.next_if(|v| !v.starts_with('-')) {
          resolutions.push(parse_value(&arg, &value, 1)?);
        }
        if resolutions.is_empty() {
          return Err(CliError::MissingValue(arg));
        }
      }
      "-s" => {
        let value = args.next().ok_or(CliError::MissingValue(arg.clone()))?;
        save_interval = value.parse().map_err(|_| CliError::InvalidValue {
          flag: arg.clone(),
          value: value.clone(),
        })?;
      }
      "-o" => {
        let value = args.next().ok_or(CliError::MissingValue(arg.clone()))?;
        output_dir = Some(PathBuf::from(value));
      }
      "--no-output" => no_output = true,
      _ => return Err(CliError::Unknown(arg)),
    }
  }

  let degree = degree.ok_or(CliError::Missing("-deg"))?;
  if resolutions.is_empty() {
    return Err(CliError::Missing("-N"));
  }
  if no_output {
    output_dir = None;
  }

  Ok(Command::Run(CliArgs {
    degree,
    resolutions,
    save_interval,
    output_dir,
  }))
}

#[cfg(test)]
mod test {
  use super::*;

  fn args(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
  }

  #[test]
  fn parses_full_command_line() {
    let command = parse(args("-deg 1 -N 20 40 80 -s 5 -o results")).unwrap();
    assert_eq!(
      command,
      Command::Run(CliArgs {
        degree: 1,
        resolutions: vec![20, 40, 80],
        save_interval: NonZeroUsize::new(5).unwrap(),
        output_dir: Some(PathBuf::from("results")),
      })
    );
  }

  #[test]
  fn defaults_and_flags() {
    let Command::Run(cli) = parse(args("-N 10 -deg 2 --no-output")).unwrap() else {
      panic!("expected a run command");
    };
    assert_eq!(cli.save_interval, DEFAULT_SAVE_INTERVAL);
    assert_eq!(cli.output_dir, None);
    assert_eq!(parse(args("-deg 1 -h")).unwrap(), Command::Help);
  }

  #[test]
  fn rejects_malformed_arguments() {
    assert_eq!(parse(args("-N 20")), Err(CliError::Missing("-deg")));
    assert_eq!(parse(args("-deg 1")), Err(CliError::Missing("-N")));
    assert_eq!(parse(args("-deg 1 -N")), Err(CliError::MissingValue("-N".into())));
    assert_eq!(parse(args("-deg")), Err(CliError::MissingValue("-deg".into())));
    assert!(matches!(
      parse(args("-deg one -N 20")),
      Err(CliError::InvalidValue { .. })
    ));
    assert!(matches!(
      parse(args("-deg 1 -N 0")),
      Err(CliError::InvalidValue { .. })
    ));
    assert!(matches!(
      parse(args("-deg 1 -N 20 -s 0")),
      Err(CliError::InvalidValue { .. })
    ));
    assert_eq!(
      parse(args("-deg 1 -N 20 --fast")),
      Err(CliError::Unknown("--fast".into()))
    );
  }
}
