use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rt_ring::{
    config::{DEFAULT_BURST_LEN, DEFAULT_CAPACITY},
    event_log::DEFAULT_LOG_CAPACITY,
    walkthrough, Config, Discipline, Scenario, SpinOrdering,
};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rt-ring", about = "SPSC ring buffer workload driver")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the producer/consumer workload
    Run(RunArgs),
    /// Step through a single-threaded enqueue/dequeue sequence
    Walkthrough,
}

#[derive(Args)]
struct RunArgs {
    #[arg(short, long, default_value_t = Scenario::Burst)]
    scenario: Scenario,

    /// Values produced before the sentinel
    #[arg(short = 'n', long, default_value_t = 1000)]
    count: u32,

    #[arg(short, long, default_value_t = Discipline::Spin)]
    lock: Discipline,

    /// Run once per lock discipline instead of only `--lock`
    #[arg(long, conflicts_with = "lock")]
    compare: bool,

    /// Spin lock memory ordering: seqcst or acqrel
    #[arg(long, default_value_t = SpinOrdering::SeqCst)]
    ordering: SpinOrdering,

    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    #[arg(long, default_value_t = DEFAULT_LOG_CAPACITY)]
    log_capacity: usize,

    /// Do not record queue operations
    #[arg(long)]
    no_event_log: bool,

    #[arg(long, default_value_t = DEFAULT_BURST_LEN)]
    burst_len: u32,

    /// Pause between bursts, in microseconds
    #[arg(long, default_value_t = 1000)]
    burst_pause_us: u64,
}

impl RunArgs {
    fn config(&self, discipline: Discipline) -> Config {
        Config {
            capacity: self.capacity,
            discipline,
            spin_ordering: self.ordering,
            event_log: !self.no_event_log,
            log_capacity: self.log_capacity,
            burst_len: self.burst_len,
            burst_pause: Duration::from_micros(self.burst_pause_us),
        }
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let disciplines = if args.compare {
        vec![Discipline::Spin, Discipline::Blocking]
    } else {
        vec![args.lock]
    };

    for discipline in disciplines {
        let config = args.config(discipline);
        let report = rt_ring::run(&config, args.scenario, args.count)
            .with_context(|| format!("{} run with {discipline} lock failed", args.scenario))?;
        println!("{report}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Walkthrough => {
            print!("{}", walkthrough::run_to_string());
            Ok(())
        }
    }
}
