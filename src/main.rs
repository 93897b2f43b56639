use anyhow::Context;
use cloud_provider::config::{Config, Opts};
use cloud_provider::{Instances, NodeName};
use ecs_provider::EcsInstances;
use serde_json::json;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ask ECS what the cloud-controller-manager would learn about a node
#[derive(StructOpt, Debug)]
#[structopt(name = "ecs-instances")]
struct Cli {
    #[structopt(flatten)]
    cloud: Opts,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Debug, PartialEq)]
enum Command {
    /// Print the node addresses of an instance
    NodeAddresses {
        /// The node provider ID, with or without the provider prefix
        provider_id: String,
    },
    /// Print the instance type (flavor) of an instance
    InstanceType {
        /// The node provider ID, with or without the provider prefix
        provider_id: String,
    },
    /// Print whether an instance exists
    Exists {
        /// The node provider ID, with or without the provider prefix
        provider_id: String,
    },
    /// Print whether an instance is shut down
    Shutdown {
        /// The node provider ID, with or without the provider prefix
        provider_id: String,
    },
    /// Print the ID of the instance with the given name
    InstanceId {
        /// The node name
        node_name: String,
    },
    /// Print the node name for a hostname
    CurrentNodeName {
        /// The hostname, defaults to the hostname of this machine
        hostname: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let output = execute(Cli::from_args()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn execute(cli: Cli) -> anyhow::Result<serde_json::Value> {
    match cli.command {
        // EcsInstances keeps the hostname default, so this needs no cloud config.
        Command::CurrentNodeName { hostname } => {
            let hostname = hostname_or_default(hostname)?;
            info!("current node name is the hostname: {}", hostname);
            Ok(json!(NodeName::from(hostname).as_str()))
        }
        command => {
            let config = Config::from_opts(cli.cloud)?;
            info!(
                "using ECS endpoint {} for project {}",
                config.endpoint, config.project_id
            );

            // The client is built once; every lookup below reuses it.
            let instances = EcsInstances::from_config(&config)?;
            run(&instances, command).await
        }
    }
}

async fn run(instances: &impl Instances, command: Command) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        Command::NodeAddresses { provider_id } => {
            json!(instances.node_addresses_by_provider_id(&provider_id).await?)
        }
        Command::InstanceType { provider_id } => {
            json!(instances.instance_type_by_provider_id(&provider_id).await?)
        }
        Command::Exists { provider_id } => {
            json!(instances.instance_exists_by_provider_id(&provider_id).await?)
        }
        Command::Shutdown { provider_id } => {
            json!(instances.instance_shutdown_by_provider_id(&provider_id).await?)
        }
        Command::InstanceId { node_name } => {
            json!(instances.instance_id(&NodeName::from(node_name)).await?)
        }
        Command::CurrentNodeName { hostname } => {
            let hostname = hostname_or_default(hostname)?;
            json!(instances.current_node_name(&hostname).await?.as_str())
        }
    };
    Ok(output)
}

fn init_logger() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    // Results go to stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("unable to initialize logging: {}", e))
}

fn hostname_or_default(hostname: Option<String>) -> anyhow::Result<String> {
    match hostname {
        Some(h) => Ok(h),
        None => default_hostname(),
    }
}

fn default_hostname() -> anyhow::Result<String> {
    hostname::get()
        .context("unable to read the hostname")?
        .into_string()
        .map_err(|_| anyhow::anyhow!("invalid utf-8 hostname string"))
}
