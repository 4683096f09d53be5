// SPDX-License-Identifier: Apache-2.0 OR MIT

//! gridqctl - query a pool's collector and schedds from the command
//! line.
//!
//! # Usage
//!
//! ```bash
//! # All schedd ads in the configured pool
//! gridqctl --config client.json status --category schedd
//!
//! # Schedds with queued jobs, two attributes only
//! gridqctl status --pool collector.example.org:9618 \
//!     --constraint 'TotalJobAds > 0' --attrs Name,Address
//!
//! # Resolve a schedd, then list its jobs
//! gridqctl locate sched1@node7 --pool collector.example.org:9618
//! gridqctl jobs --name sched1@node7 --pool collector.example.org:9618 \
//!     --constraint 'Owner == "astra"'
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use gridq::{
    Ad, AdCategory, AdValue, ClientConfig, CollectorClient, Constraint, PoolSelector, Projection,
    ScheddClient, ScheddLocation, ScheddLocator,
};
use std::path::PathBuf;

/// Query collectors and schedds of a gridq pool.
#[derive(Parser, Debug)]
#[command(name = "gridqctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Client configuration file (JSON format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Category {
    Any,
    Machine,
    Schedd,
}

impl From<Category> for AdCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::Any => AdCategory::Any,
            Category::Machine => AdCategory::Machine,
            Category::Schedd => AdCategory::Schedd,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the collector for ads
    Status {
        /// Named collector to contact (default: the configured set)
        #[arg(short, long)]
        pool: Option<String>,

        /// Ad category to request
        #[arg(long, value_enum, default_value = "any")]
        category: Category,

        /// Filter constraint expression
        #[arg(long)]
        constraint: Option<String>,

        /// Comma-separated attribute projection
        #[arg(long)]
        attrs: Option<String>,
    },

    /// Resolve a schedd's network location
    Locate {
        /// Schedd name to resolve
        name: Option<String>,

        /// Resolve every active schedd in the pool
        #[arg(long, conflicts_with = "name")]
        all: bool,

        /// Resolve the locally configured schedd
        #[arg(long, conflicts_with_all = ["name", "all"])]
        local: bool,

        /// Named collector to contact (default: the configured set)
        #[arg(short, long)]
        pool: Option<String>,
    },

    /// Query a schedd's job queue
    Jobs {
        /// Schedd name, resolved via the collector
        #[arg(long, conflicts_with = "address")]
        name: Option<String>,

        /// Schedd address, skipping the collector lookup
        #[arg(long)]
        address: Option<String>,

        /// Named collector for the lookup (default: the configured set)
        #[arg(short, long)]
        pool: Option<String>,

        /// Filter constraint expression
        #[arg(long)]
        constraint: Option<String>,

        /// Comma-separated attribute projection
        #[arg(long)]
        attrs: Option<String>,
    },
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(args.log_level.clone()),
    )
    .init();

    if let Err(err) = run(args) {
        eprintln!("gridqctl: {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> gridq::Result<()> {
    let config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };

    match args.command {
        Command::Status {
            pool,
            category,
            constraint,
            attrs,
        } => {
            let client = CollectorClient::new(config)?;
            let constraint = parse_constraint(constraint.as_deref())?;
            let ads = client.query(
                category.into(),
                &selector(pool),
                constraint.as_ref(),
                &projection(attrs.as_deref()),
            )?;
            print_ads(&ads);
            log::debug!("[gridqctl] {} ad(s)", ads.len());
        }

        Command::Locate {
            name,
            all,
            local,
            pool,
        } => {
            let locator = ScheddLocator::new(CollectorClient::new(config)?);
            if local {
                print_location(&locator.locate_local()?);
            } else if all {
                for location in locator.locate_all(&selector(pool))? {
                    print_location(&location);
                }
            } else {
                let name = name.ok_or_else(|| {
                    gridq::Error::InvalidRequest(
                        "a schedd name is required unless --all or --local is given".into(),
                    )
                })?;
                print_location(&locator.locate_by_name(&selector(pool), &name)?);
            }
        }

        Command::Jobs {
            name,
            address,
            pool,
            constraint,
            attrs,
        } => {
            let location = match (name, address) {
                (_, Some(address)) => ScheddLocation {
                    address,
                    name: "Unknown".into(),
                    hostname: "Unknown".into(),
                    version: String::new(),
                },
                (Some(name), None) => {
                    let locator = ScheddLocator::new(CollectorClient::new(config.clone())?);
                    locator.locate_by_name(&selector(pool), &name)?
                }
                (None, None) => {
                    let locator = ScheddLocator::new(CollectorClient::new(config.clone())?);
                    locator.locate_local()?
                }
            };

            let schedd = ScheddClient::new(&config, location)?;
            let constraint = parse_constraint(constraint.as_deref())?;
            let jobs = schedd.query_jobs(constraint.as_ref(), &projection(attrs.as_deref()))?;
            print_ads(&jobs);
        }
    }

    Ok(())
}

fn selector(pool: Option<String>) -> PoolSelector {
    match pool {
        Some(address) => PoolSelector::Named(address),
        None => PoolSelector::Default,
    }
}

fn parse_constraint(text: Option<&str>) -> gridq::Result<Option<Constraint>> {
    text.map(Constraint::parse).transpose()
}

fn projection(attrs: Option<&str>) -> Projection {
    match attrs {
        Some(list) => Projection::new(
            list.split(',')
                .map(str::trim)
                .filter(|attr| !attr.is_empty()),
        ),
        None => Projection::all(),
    }
}

fn print_ads(ads: &[Ad]) {
    for (i, ad) in ads.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for (name, value) in ad.iter() {
            println!("{} = {}", name, format_value(value));
        }
    }
}

fn print_location(location: &ScheddLocation) {
    println!(
        "{}\t{}\t{}\t{}",
        location.name,
        location.address,
        location.hostname,
        if location.version.is_empty() {
            "-"
        } else {
            location.version.as_str()
        }
    );
}

fn format_value(value: &AdValue) -> String {
    match value {
        AdValue::Undefined => "undefined".to_string(),
        AdValue::Bool(b) => b.to_string(),
        AdValue::Integer(n) => n.to_string(),
        AdValue::Real(x) => x.to_string(),
        AdValue::String(s) => format!("{:?}", s),
        AdValue::Expr(e) => e.clone(),
    }
}
