use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use opskit_db::DbHandle;
use opskit_errors::Problem;
use opskit_security::Caller;
use retail_ops::seed::{DemoCallers, seed_demo};
use retail_ops::{DomainError, RetailOpsConfig, ServiceContext, Services};
use serde_json::{Value, json};
use uuid::Uuid;

/// Retail back office - scoped listing, lookup and deletion from the shell
#[derive(Parser)]
#[command(name = "retail-ops")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Insert the demo data set before running the command
    #[arg(long)]
    seed: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// One page of a resource, e.g. `list product --query 'search=boot&page=2'`
    List {
        resource: Resource,
        /// Raw query string with bracket-notation filters
        #[arg(short, long, default_value = "")]
        query: String,
        #[command(flatten)]
        caller: CallerArg,
    },
    /// One record with its relations
    Get {
        resource: Resource,
        id: Uuid,
        #[command(flatten)]
        caller: CallerArg,
    },
    /// Delete a record (soft where the resource supports it)
    Delete {
        resource: Resource,
        id: Uuid,
        #[command(flatten)]
        caller: CallerArg,
    },
    /// Insert the demo data set and print the matching callers
    Seed,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    Project,
    Brand,
    Category,
    Product,
    Survey,
    Feedback,
    Location,
}

#[derive(Args)]
struct CallerArg {
    /// Authenticated caller as JSON: {"id": "...", "role": {"name": "..."}, "project_id": "..."}
    #[arg(long)]
    caller: String,
}

impl CallerArg {
    fn parse(&self) -> Result<Caller> {
        serde_json::from_str(&self.caller).context("invalid --caller JSON")
    }
}

/// Binds `$svc` to the service for `$resource` and evaluates `$body`.
macro_rules! with_service {
    ($services:expr, $resource:expr, |$svc:ident| $body:expr) => {
        match $resource {
            Resource::Project => {
                let $svc = &$services.projects;
                $body
            }
            Resource::Brand => {
                let $svc = &$services.brands;
                $body
            }
            Resource::Category => {
                let $svc = &$services.categories;
                $body
            }
            Resource::Product => {
                let $svc = &$services.products;
                $body
            }
            Resource::Survey => {
                let $svc = &$services.surveys;
                $body
            }
            Resource::Feedback => {
                let $svc = &$services.feedback;
                $body
            }
            Resource::Location => {
                let $svc = &$services.locations;
                $body
            }
        }
    };
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = RetailOpsConfig::load(cli.config.as_deref())?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }
    retail_ops::logging::init(&config.logging)?;

    let db = DbHandle::from_config(&config.database)
        .await
        .context("failed to connect to database")?;
    retail_ops::migrate(&db).await.context("migrations failed")?;
    if cli.seed {
        seed_demo(db.sea()).await.context("seeding failed")?;
    }

    let Some(command) = cli.command else {
        tracing::info!(dsn = %db.dsn(), "schema is up to date");
        return Ok(ExitCode::SUCCESS);
    };

    let db = Arc::new(db);
    let services = Services::new(&ServiceContext::from_config(Arc::clone(&db), &config));

    match run(&services, &db, command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.downcast::<DomainError>() {
            Ok(domain) => {
                let problem = Problem::from(domain);
                println!("{}", serde_json::to_string_pretty(&problem)?);
                Ok(ExitCode::FAILURE)
            }
            Err(other) => Err(other),
        },
    }
}

async fn run(services: &Services, db: &DbHandle, command: Command) -> Result<Value> {
    let output = match command {
        Command::List {
            resource,
            query,
            caller,
        } => {
            let caller = caller.parse()?;
            with_service!(services, resource, |svc| serde_json::to_value(
                svc.list(&caller, &query).await?
            )?)
        }
        Command::Get {
            resource,
            id,
            caller,
        } => {
            let caller = caller.parse()?;
            with_service!(services, resource, |svc| serde_json::to_value(
                svc.get(&caller, id).await?
            )?)
        }
        Command::Delete {
            resource,
            id,
            caller,
        } => {
            let caller = caller.parse()?;
            with_service!(services, resource, |svc| svc.delete(&caller, id).await?);
            json!({ "deleted": id })
        }
        Command::Seed => {
            let inserted = seed_demo(db.sea()).await.context("seeding failed")?;
            json!({ "inserted": inserted, "callers": DemoCallers::new() })
        }
    };
    Ok(output)
}
