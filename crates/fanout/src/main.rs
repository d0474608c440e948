use anyhow::Context;
use clap::{Parser, Subcommand};
use fanout::action::{ActionSpec, Symbol};
use fanout::config::{self, RadialConfig};
use fanout::geom::{Point, Size};
use fanout::layout::RadialLayout;
use fanout::replay::{self, Script};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fanout", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Radial tunables (TOML). Defaults to the user config directory.
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Print the resolved button layout for a press point as JSON
    Layout {
        x: f64,
        y: f64,
        #[arg(long, default_value_t = 400.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
        /// Actions to lay out, in order
        #[arg(short, long, value_delimiter = ',', default_value = "star,bookmark,share")]
        actions: Vec<Symbol>,
    },
    /// Replay a recorded pointer script and print how the menu resolved
    Replay { script: PathBuf },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config)?;

    match cli.command {
        Commands::Layout {
            x,
            y,
            width,
            height,
            actions,
        } => {
            let actions: Vec<ActionSpec> = actions.into_iter().map(ActionSpec::from_symbol).collect();
            let layout =
                RadialLayout::resolve(Point::new(x, y), Size::new(width, height), &actions, &cfg);
            for clipped in layout.clipped_targets(cfg.button_radius) {
                log::warn!("{} extends past the viewport", clipped.id);
            }
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Commands::Replay { script } => {
            let raw = fs_err::read_to_string(&script)?;
            let script: Script = serde_json::from_str(&raw)
                .with_context(|| format!("invalid replay script {}", script.display()))?;
            let report = replay::run(&script, &cfg);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<RadialConfig> {
    let path = match path {
        Some(p) => p,
        None => config::default_config_path()?,
    };
    log::debug!("loading radial config from {}", path.display());
    Ok(config::load_radial(&path)?)
}
