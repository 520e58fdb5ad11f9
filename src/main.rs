use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use ratemix::core::allocation::{Mode, Preference};
use ratemix::core::custom::CustomEntry;
use ratemix::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Deposit,
    Wealth,
    Mixed,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Mode {
        match mode {
            ModeArg::Deposit => Mode::Deposit,
            ModeArg::Wealth => Mode::Wealth,
            ModeArg::Mixed => Mode::Mixed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PreferenceArg {
    Yield,
    Liquidity,
    Balance,
}

impl From<PreferenceArg> for Preference {
    fn from(preference: PreferenceArg) -> Preference {
        match preference {
            PreferenceArg::Yield => Preference::Yield,
            PreferenceArg::Liquidity => Preference::Liquidity,
            PreferenceArg::Balance => Preference::Balance,
        }
    }
}

#[derive(Subcommand)]
enum ScenarioCommands {
    /// Save a custom split (e.g. "Demand Deposit=20" "wealth:7-Day Redemption=80")
    Save {
        #[arg(short, long, value_enum, default_value = "mixed")]
        mode: ModeArg,
        #[arg(short, long)]
        amount: f64,
        #[arg(required = true)]
        entries: Vec<CustomEntry>,
    },
    /// List saved scenarios
    List,
    /// Delete a saved scenario
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Split an amount across products to hit a target client rate
    Solve {
        #[arg(short, long)]
        amount: f64,
        /// Target annual client rate, in percent
        #[arg(short, long)]
        target: f64,
        #[arg(short, long, value_enum, default_value = "deposit")]
        mode: ModeArg,
        /// Share kept in the demand deposit, in percent (defaults to the config value)
        #[arg(short, long)]
        liquidity_ratio: Option<f64>,
        /// Solve for one preference only
        #[arg(short, long, value_enum)]
        preference: Option<PreferenceArg>,
    },
    /// Find the one- or two-product mix with the highest bank margin
    Optimize {
        #[arg(short, long)]
        amount: f64,
        #[arg(short, long)]
        target: f64,
    },
    /// Compute the blended rates of a custom split
    Evaluate {
        #[arg(short, long, value_enum, default_value = "mixed")]
        mode: ModeArg,
        #[arg(short, long)]
        amount: f64,
        #[arg(required = true)]
        entries: Vec<CustomEntry>,
    },
    /// Fill the rest of a partial split towards a target rate
    Suggest {
        #[arg(short, long, value_enum, default_value = "mixed")]
        mode: ModeArg,
        #[arg(short, long)]
        target: f64,
        fixed: Vec<CustomEntry>,
    },
    /// Show the bank's preset schemes
    Schemes {
        #[arg(short, long, default_value_t = 1000.0)]
        amount: f64,
        /// Show one scheme in detail
        #[arg(long)]
        id: Option<i64>,
    },
    /// Manage saved scenarios
    Scenario {
        #[command(subcommand)]
        action: ScenarioCommands,
    },
    /// Compare two or three saved scenarios
    Compare {
        #[arg(required = true, num_args = 2..=3)]
        ids: Vec<i64>,
    },
    /// Fetch the shared product catalog and bank schemes
    Sync,
}

impl From<Commands> for ratemix::AppCommand {
    fn from(cmd: Commands) -> ratemix::AppCommand {
        match cmd {
            Commands::Solve {
                amount,
                target,
                mode,
                liquidity_ratio,
                preference,
            } => ratemix::AppCommand::Solve {
                amount,
                target_rate: target,
                mode: mode.into(),
                liquidity_ratio,
                preference: preference.map(Into::into),
            },
            Commands::Optimize { amount, target } => ratemix::AppCommand::Optimize {
                amount,
                target_rate: target,
            },
            Commands::Evaluate {
                mode,
                amount,
                entries,
            } => ratemix::AppCommand::Evaluate {
                mode: mode.into(),
                amount,
                entries,
            },
            Commands::Suggest {
                mode,
                target,
                fixed,
            } => ratemix::AppCommand::Suggest {
                mode: mode.into(),
                target_rate: target,
                fixed,
            },
            Commands::Schemes { amount, id } => ratemix::AppCommand::Schemes { amount, id },
            Commands::Scenario { action } => match action {
                ScenarioCommands::Save {
                    mode,
                    amount,
                    entries,
                } => ratemix::AppCommand::ScenarioSave {
                    mode: mode.into(),
                    amount,
                    entries,
                },
                ScenarioCommands::List => ratemix::AppCommand::ScenarioList,
                ScenarioCommands::Delete { id } => ratemix::AppCommand::ScenarioDelete { id },
            },
            Commands::Compare { ids } => ratemix::AppCommand::Compare { ids },
            Commands::Sync => ratemix::AppCommand::Sync,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => ratemix::cli::setup::setup_at_path(path),
            None => ratemix::cli::setup::setup(),
        },
        Some(cmd) => ratemix::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
