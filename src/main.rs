use induction::{
  cli::{self, Command},
  config::InductionConfig,
  problems::convergence::{ConvergenceReport, ConvergenceStudy},
};

use std::process::ExitCode;

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .init();

  let args = match cli::parse(std::env::args().skip(1)) {
    Ok(Command::Run(args)) => args,
    Ok(Command::Help) => {
      println!("{}", cli::USAGE);
      return ExitCode::SUCCESS;
    }
    Err(err) => {
      eprintln!("error: {err}\n\n{}", cli::USAGE);
      return ExitCode::from(2);
    }
  };

  let mut study = ConvergenceStudy::new(
    InductionConfig::default(),
    args.degree,
    args.resolutions,
    args.save_interval,
  );
  if let Some(dir) = args.output_dir {
    study = study.with_output_dir(dir);
  }

  match study.run() {
    Ok(report) => {
      print_report(&report);
      ExitCode::SUCCESS
    }
    Err(err) => {
      tracing::error!("run aborted: {err}");
      ExitCode::FAILURE
    }
  }
}

fn print_report(report: &ConvergenceReport) {
  for record in &report.records {
    println!(
      "np, div, err = {}, {:e}, {:e}",
      record.resolution, record.div_error, record.l2_error
    );
  }

  println!();
  println!("{:>8} {:>14} {:>14}", "np", "l2 error", "div error");
  for record in &report.records {
    println!(
      "{:>8} {:>14.6e} {:>14.6e}",
      record.resolution, record.l2_error, record.div_error
    );
  }

  println!();
  println!("{:>8} {:>14} {:>14}", "np", "L2 rate", "Div rate");
  for rate in report.rates() {
    println!(
      "{:>8} {:>14.4} {:>14.4}",
      format!("{}->{}", rate.resolutions[0], rate.resolutions[1]),
      rate.l2_rate,
      rate.div_rate
    );
  }
}
