use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mqlab::{setup_local_tracing, setup_tracing, AppResult, Broker, DeliveryGuarantee, LabConfig};
use tokio::runtime;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "partitioned pub/sub lab")]
pub struct CommandLine {
    /// path to config file, built-in defaults are used when absent
    #[arg(short, long)]
    pub conf: Option<String>,
    /// also write logs to hourly rolling files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
    /// log level (v: info, vv: debug, vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    PrintConfig,
    /// Produce a backlog, run a consumer group through a failure and print stats
    Demo {
        #[arg(long, default_value_t = 3)]
        consumers: usize,
    },
    /// Replay a backlog under a delivery guarantee
    Guarantee {
        /// at-most-once, at-least-once or exactly-once
        #[arg(long, default_value = "at-least-once")]
        kind: String,
        #[arg(long, default_value_t = 100)]
        messages: usize,
        #[arg(long, default_value_t = 10)]
        fail_rate: u32,
    },
}

fn main() -> AppResult<()> {
    let commandline = CommandLine::parse();

    let directive = match commandline.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _log_guard = match &commandline.log_dir {
        Some(dir) => Some(setup_tracing(dir, directive)?),
        None => {
            setup_local_tracing(directive)?;
            None
        }
    };

    let config = match &commandline.conf {
        Some(path) => LabConfig::set_up_config(path)?,
        None => LabConfig::default(),
    };

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let broker = Broker::with_config(config);

    match commandline.command {
        Command::PrintConfig => println!("{:#?}", broker.config()),
        Command::Demo { consumers } => rt.block_on(run_demo(&broker, consumers))?,
        Command::Guarantee {
            kind,
            messages,
            fail_rate,
        } => {
            let guarantee: DeliveryGuarantee = kind.parse()?;
            let report =
                rt.block_on(broker.simulate_delivery_guarantee(guarantee, messages, fail_rate))?;
            println!("{:#?}", report);
        }
    }
    Ok(())
}

async fn run_demo(broker: &Broker, consumers: usize) -> AppResult<()> {
    let config = broker.config().clone();
    let group = config.consume.default_group.as_str();

    let status = broker.init_topic(config.topic.default_partitions)?;
    info!("topic {} with {} partitions", status.status, status.partition_count);

    let bulk = broker.produce_bulk(
        config.produce.default_message_count,
        config.produce.default_key_count,
    )?;
    println!(
        "produced {} messages in {}ms ({:.0} msg/s), distribution {:?}",
        bulk.produced_count, bulk.duration_ms, bulk.throughput, bulk.partition_distribution
    );

    for i in 0..consumers {
        let registered = broker
            .register_consumer(group, &format!("consumer-{}", i))
            .await?;
        println!(
            "{} joined {} with partitions {:?}",
            registered.consumer_id, registered.group_id, registered.assigned_partitions
        );
    }

    let processing_time = config.consume.default_processing_time_ms;
    let first = broker.consume(group, processing_time).await;
    println!(
        "pass 1: consumed {} in {}ms",
        first.consumed_count, first.duration_ms
    );

    if consumers > 0 {
        let removed = broker.remove_consumer("consumer-0").await;
        println!(
            "{} removed, active now {:?}",
            removed.removed_consumer,
            removed
                .active_consumers
                .iter()
                .map(|c| (c.consumer_id.as_str(), c.partitions.clone()))
                .collect::<Vec<_>>()
        );
    }

    let second = broker.consume(group, processing_time).await;
    println!(
        "pass 2: consumed {} in {}ms",
        second.consumed_count, second.duration_ms
    );
    println!("{:#?}", broker.stats().await);
    Ok(())
}
