use clap::{Parser, Subcommand};
use convoy::commands;
use convoy::core::error::{print_error, ConvoyError};

/// Release a set of mutually dependent packages as a coherent, pinned unit
#[derive(Parser)]
#[command(name = "convoy")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct ConvoyCli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Initialize convoy configuration for a workspace
  Init,

  /// Show configured packages and resolved registry endpoints
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Mirror auxiliary dependencies into the publish registry
  Mirror {
    /// Dist-tag applied to mirrored publishes
    #[arg(long, default_value = "next")]
    tag: String,
    /// Actually publish missing mirrors (default: dry-run mode showing decisions)
    #[arg(long)]
    apply: bool,
    /// Output outcomes in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Run the dependency-ordered release pipeline
  Release {
    /// Prerelease suffix shared by every package in the run (default: UTC timestamp)
    #[arg(long)]
    suffix: Option<String>,
    /// Dist-tag applied to every publish in the run
    #[arg(long, default_value = "next")]
    tag: String,
    /// Actually publish (default: dry-run mode showing the full decision sequence)
    #[arg(long)]
    apply: bool,
    /// Visibility polling bound per package, in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
    /// Output plan and outcome in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = ConvoyCli::parse();

  let result = match cli.command {
    Commands::Init => commands::run_init(),
    Commands::Status { json } => commands::run_status(json),
    Commands::Mirror { tag, apply, json } => commands::run_mirror(tag, apply, json),
    Commands::Release {
      suffix,
      tag,
      apply,
      timeout_secs,
      json,
    } => commands::run_release(suffix, tag, apply, timeout_secs, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ConvoyError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
