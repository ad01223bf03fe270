use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mlf_runner::{Encoding, Overrides, Runner};

#[derive(Parser)]
#[command(name = "mlf", version, about = "Filter MISRA lint reports down to the findings you own")]
struct Cli {
    /// Config file (default: .mlf/mlf.toml, falling back to built-in profiles)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default .mlf/mlf.toml
    Init,

    /// Validate profiles and check the report exists
    Doctor,

    /// List configured profiles
    Profiles,

    /// Filter the report with one profile, or all of them
    Filter {
        #[arg(long, default_value = "advisory", conflicts_with = "all")]
        profile: String,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, conflicts_with = "all")]
        output: Option<PathBuf>,
        #[arg(long)]
        path_fragment: Option<String>,
        #[arg(long)]
        encoding: Option<Encoding>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let root = std::env::current_dir()?;

    let open = |root: PathBuf| match &cli.config {
        Some(path) => Runner::open_with_config(root, path),
        None => Runner::open(root),
    };

    match cli.cmd {
        Command::Init => {
            let path = Runner::init_repo(&root)?;
            println!("Initialized mlf config at {}", path.display());
        }
        Command::Doctor => {
            let r = open(root)?;
            r.doctor()?;
            println!("OK");
        }
        Command::Profiles => {
            let r = open(root)?;
            println!("Path fragment: {}", r.cfg.policy.path_fragment);
            for (name, p) in &r.cfg.profiles {
                println!(
                    "- {} -> {} [ext:{} drop:{} strip:{} discard_empty:{}]",
                    name,
                    p.output,
                    p.require_source_extension,
                    p.drop_severities,
                    p.strip_severities,
                    p.discard_empty_blocks
                );
            }
        }
        Command::Filter {
            profile,
            all,
            input,
            output,
            path_fragment,
            encoding,
        } => {
            let r = open(root)?;
            let ov = Overrides {
                input,
                output,
                path_fragment,
                encoding,
            };
            let summaries = if all { r.run_all(&ov)? } else { vec![r.run_profile(&profile, &ov)?] };
            for s in summaries {
                tracing::debug!(profile = %s.profile, input_lines = s.input_lines, output_lines = s.output_lines);
                println!("Done! Output Stored To: {}", s.output.display());
            }
        }
    }

    Ok(())
}
