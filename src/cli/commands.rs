use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RouterConfig;
use crate::dispatcher::Dispatcher;
use crate::logging::init_logging;
use crate::resolver::Dependency;
use crate::router::{PathPattern, RouteError, RouteTable};
use crate::server::Request;
use crate::views::TemplateEngine;

/// Command-line interface for nestrouter
///
/// Inspect route patterns and run requests through a demo table without
/// writing a host application.
#[derive(Parser)]
#[command(name = "nestrouter")]
#[command(about = "nestrouter CLI", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Match a path against a single route template
    Match {
        /// Route template, e.g. `/users/:userId/invite`
        #[arg(short, long)]
        pattern: String,

        /// Request path, e.g. `/users/42/invite`
        #[arg(long)]
        path: String,
    },
    /// Show the effective router configuration and the demo routes it yields
    Routes {
        /// Router config file (YAML or TOML)
        #[arg(short, long, env = "NEST_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Dispatch one request through the demo route table
    Dispatch {
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request URI including any query string
        #[arg(short, long)]
        uri: String,

        /// Router config file (YAML or TOML)
        #[arg(short, long, env = "NEST_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Parse arguments, initialize logging and run the selected command
///
/// # Errors
///
/// Propagates logging, configuration and route registration failures.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    let stdout = io::stdout();
    run(&cli, &mut stdout.lock())
}

/// Run `cli`, writing command output to `out`
///
/// # Errors
///
/// Configuration that cannot be loaded, demo routes that fail to register,
/// or a failed write to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Match { pattern, path } => {
            let pattern = PathPattern::parse(pattern)?;
            match pattern.matches(path) {
                Some(bindings) => {
                    let map: Map<String, Value> = bindings
                        .iter()
                        .map(|(k, v)| (k.to_string(), Value::from(v)))
                        .collect();
                    writeln!(out, "{}", serde_json::to_string_pretty(&map)?)?;
                }
                None => writeln!(out, "no match")?,
            }
        }
        Commands::Routes { config } => {
            let config = RouterConfig::load_or_default(config.as_deref())?;
            let table = demo_table(&config).context("failed to build demo route table")?;
            table.dump_routes();

            let methods: Vec<&str> = table
                .supported_methods()
                .iter()
                .map(http::Method::as_str)
                .collect();
            writeln!(out, "methods: {}", methods.join(", "))?;
            writeln!(out, "duplicate_policy: {:?}", table.duplicate_policy())?;
            if let Some(dir) = &config.templates_dir {
                writeln!(out, "templates_dir: {}", dir.display())?;
            }
            for (method, pattern) in table.all_patterns() {
                writeln!(out, "{:<7} {pattern}", method.as_str())?;
            }
        }
        Commands::Dispatch {
            method,
            uri,
            config,
        } => {
            let config = RouterConfig::load_or_default(config.as_deref())?;
            let table = demo_table(&config).context("failed to build demo route table")?;
            let views = Arc::new(TemplateEngine::from_config(&config));

            let method = http::Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method '{method}'"))?;
            let mut request = Request::new(method, uri.as_str());
            let response = Dispatcher::new(&table, views).dispatch(&mut request);
            writeln!(out, "{response}")?;
        }
    }
    Ok(())
}

#[derive(Default, Dependency)]
struct Greeting {
    salutation: &'static str,
}

impl Greeting {
    fn greet(&self, name: &str) -> String {
        let salutation = if self.salutation.is_empty() {
            "Hello"
        } else {
            self.salutation
        };
        format!("{salutation}, {name}!")
    }
}

#[derive(Default, Dependency)]
struct UserController;

impl UserController {
    fn show(&self, req: &Request, greeting: Greeting) -> String {
        greeting.greet(req.param("userId").unwrap_or("stranger"))
    }

    fn invite(&self, req: &Request) -> Value {
        serde_json::json!({
            "invited": req.param("userId"),
            "by": req.query("from"),
        })
    }
}

/// Table used by `routes` and `dispatch`.
///
/// Only registers for methods the configuration supports.
pub(crate) fn demo_table(config: &RouterConfig) -> Result<RouteTable, RouteError> {
    let mut table = RouteTable::from_config(config)?;
    table
        .controllers_mut()
        .register::<UserController>("UserController")
        .action("show", UserController::show)
        .action("invite", UserController::invite);

    let get = table.supports(&http::Method::GET);
    let post = table.supports(&http::Method::POST);

    if get {
        table
            .get("/", |_req: &Request| "Welcome to nestrouter")?
            .get("/users/:userId", ("UserController", "show"))?
            .get("/:user/ban/:timeout", |req: &Request| {
                format!(
                    "{} banned for {}s",
                    req.param("user").unwrap_or_default(),
                    req.param("timeout").unwrap_or_default()
                )
            })?
            .get("/:category/:action:/:color", |req: &Request| {
                Value::Object(
                    req.params()
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                        .collect(),
                )
            })?;
    }
    if post {
        table.post("/users/:userId/invite", ("UserController", "invite"))?;
    }
    table.any("/health", |_req: &Request, _g: Greeting| "ok")?;
    Ok(table)
}
