//! ORKG CLI: inspect and edit a local statement graph.
//!
//! Usage:
//!   orkg init [--db path]
//!   orkg resource <create|show|search|delete> [--db path]
//!   orkg statement <add|list|bundle> [--db path]
//!   orkg class <hierarchy|roots> [--db path]

use clap::{Parser, Subcommand};
use orkg_graph::config::Config;
use orkg_graph::graph::ContributorId;
use orkg_graph::services::{
    seed_vocabulary, ClassHierarchyUseCases, CreateResourceCommand, CreateStatementCommand, GraphServices,
    ResourceUseCases, StatementUseCases,
};
use orkg_graph::storage::{
    BundleConfiguration, OpenStore, PageRequest, ResourceFilter, SearchString, SqliteGraph, StatementFilter,
    StatementRepository, ThingCache,
};
use orkg_graph::ThingId;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orkg", version, about = "Statement graph for scholarly knowledge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed the built-in vocabulary
    Init,
    /// Manage resources
    Resource {
        #[command(subcommand)]
        action: ResourceAction,
    },
    /// Manage statements
    Statement {
        #[command(subcommand)]
        action: StatementAction,
    },
    /// Inspect the class hierarchy
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },
}

#[derive(Subcommand)]
enum ResourceAction {
    /// Create a resource
    Create {
        label: String,
        /// Class of the resource (repeatable)
        #[arg(long = "class")]
        classes: Vec<String>,
        /// Contributor UUID
        #[arg(long)]
        contributor: Option<String>,
    },
    /// Print a resource as JSON
    Show { id: String },
    /// Search resources by label
    Search {
        query: String,
        /// Match the label exactly instead of by tokens
        #[arg(long)]
        exact: bool,
        /// Restrict to instances of this class
        #[arg(long = "class")]
        class: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        size: usize,
    },
    /// Delete an unused resource
    Delete {
        id: String,
        #[arg(long)]
        contributor: Option<String>,
    },
}

#[derive(Subcommand)]
enum StatementAction {
    /// Add a statement between existing things
    Add {
        subject: String,
        predicate: String,
        object: String,
        #[arg(long)]
        contributor: Option<String>,
    },
    /// List statements matching the given parts
    List {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        predicate: Option<String>,
        #[arg(long)]
        object: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        size: usize,
    },
    /// Print the statements reachable from a thing
    Bundle {
        id: String,
        #[arg(long)]
        max_level: Option<usize>,
        /// Do not traverse into instances of this class (repeatable)
        #[arg(long)]
        blacklist: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ClassAction {
    /// Path from a class up to its root
    Hierarchy { id: String },
    /// Classes without a parent
    Roots {
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 50)]
        size: usize,
    },
}

type Services = GraphServices<SqliteGraph>;

fn init_tracing(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &Config, db: Option<PathBuf>) -> Result<Arc<SqliteGraph>, String> {
    let path = db.unwrap_or_else(|| config.database_path());
    tracing::debug!(path = %path.display(), "opening graph store");
    let store = SqliteGraph::open(&path).map_err(|e| e.to_string())?;
    Ok(Arc::new(store.with_cache(Arc::new(ThingCache::new(config.cache.enabled)))))
}

fn parse_contributor(input: Option<&str>) -> Result<ContributorId, String> {
    match input {
        None => Ok(ContributorId::UNKNOWN),
        Some(s) => ContributorId::parse(s).ok_or_else(|| format!("invalid contributor id '{}'", s)),
    }
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_init(store: &SqliteGraph) -> i32 {
    match seed_vocabulary(store) {
        Ok(created) => {
            println!("Seeded {} vocabulary entries", created);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_resource_create(services: &Services, label: &str, classes: Vec<String>, contributor: Option<&str>) -> i32 {
    let contributor = match parse_contributor(contributor) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let command = CreateResourceCommand::new(contributor, label).with_classes(classes);
    match services.create_resource(command) {
        Ok(id) => {
            println!("{}", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_resource_show(services: &Services, id: &str) -> i32 {
    match services.find_resource_by_id(&ThingId::from(id)) {
        Ok(Some(resource)) => print_json(&resource),
        Ok(None) => {
            eprintln!("Error: resource '{}' not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_resource_search(
    services: &Services,
    query: &str,
    exact: bool,
    class: Option<String>,
    page: &PageRequest,
) -> i32 {
    let mut filter = ResourceFilter::new().with_label(SearchString::of(query, exact));
    if let Some(class) = class {
        filter = filter.with_class(class);
    }
    match services.find_all_resources(&filter, page) {
        Ok(found) => {
            if found.content.is_empty() {
                println!("No resources found.");
                return 0;
            }
            println!("{:<16}  {:<48}  CLASSES", "ID", "LABEL");
            println!("{}", "-".repeat(80));
            for resource in &found.content {
                let classes: Vec<&str> = resource.classes.iter().map(|c| c.as_str()).collect();
                println!("{:<16}  {:<48}  {}", resource.id, resource.label, classes.join(", "));
            }
            println!("({} of {} total)", found.content.len(), found.total_elements);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_resource_delete(services: &Services, id: &str, contributor: Option<&str>) -> i32 {
    let contributor = match parse_contributor(contributor) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match services.delete_resource(&ThingId::from(id), contributor) {
        Ok(()) => {
            println!("Deleted resource '{}'", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_statement_add(
    services: &Services,
    subject: &str,
    predicate: &str,
    object: &str,
    contributor: Option<&str>,
) -> i32 {
    let contributor = match parse_contributor(contributor) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match services.add_statement(CreateStatementCommand::new(contributor, subject, predicate, object)) {
        Ok(id) => {
            println!("{}", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_statement_list(services: &Services, filter: &StatementFilter, page: &PageRequest) -> i32 {
    match services.find_all_statements(filter, page) {
        Ok(found) => print_json(&json!({
            "content": found.content,
            "page": found.page,
            "size": found.size,
            "total_elements": found.total_elements,
        })),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_statement_bundle(store: &SqliteGraph, id: &str, configuration: &BundleConfiguration) -> i32 {
    match store.fetch_as_bundle(&ThingId::from(id), configuration) {
        Ok(statements) => print_json(&statements),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_class_hierarchy(services: &Services, id: &str) -> i32 {
    match services.find_class_hierarchy(&ThingId::from(id), &PageRequest::all()) {
        Ok(found) => {
            let entries: Vec<_> = found
                .content
                .iter()
                .map(|entry| json!({ "class": entry.class, "parent_id": entry.parent_id }))
                .collect();
            print_json(&entries)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_class_roots(services: &Services, page: &PageRequest) -> i32 {
    match services.find_all_root_classes(page) {
        Ok(found) => {
            if found.content.is_empty() {
                println!("No root classes.");
                return 0;
            }
            println!("{:<24}  LABEL", "ID");
            println!("{}", "-".repeat(64));
            for class in &found.content {
                println!("{:<24}  {}", class.id, class.label);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config, cli.verbose);

    let store = match open_store(&config, cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let services = GraphServices::new(Arc::clone(&store));

    let code = match cli.command {
        Commands::Init => cmd_init(&store),
        Commands::Resource { action } => match action {
            ResourceAction::Create { label, classes, contributor } => {
                cmd_resource_create(&services, &label, classes, contributor.as_deref())
            }
            ResourceAction::Show { id } => cmd_resource_show(&services, &id),
            ResourceAction::Search { query, exact, class, page, size } => {
                cmd_resource_search(&services, &query, exact, class, &PageRequest::of(page, size))
            }
            ResourceAction::Delete { id, contributor } => cmd_resource_delete(&services, &id, contributor.as_deref()),
        },
        Commands::Statement { action } => match action {
            StatementAction::Add { subject, predicate, object, contributor } => {
                cmd_statement_add(&services, &subject, &predicate, &object, contributor.as_deref())
            }
            StatementAction::List { subject, predicate, object, page, size } => {
                let mut filter = StatementFilter::new();
                if let Some(s) = subject {
                    filter = filter.with_subject(s);
                }
                if let Some(p) = predicate {
                    filter = filter.with_predicate(p);
                }
                if let Some(o) = object {
                    filter = filter.with_object(o);
                }
                cmd_statement_list(&services, &filter, &PageRequest::of(page, size))
            }
            StatementAction::Bundle { id, max_level, blacklist } => {
                let mut configuration = BundleConfiguration::new().with_blacklist(blacklist);
                if let Some(level) = max_level {
                    configuration = configuration.with_max_level(level);
                }
                cmd_statement_bundle(&store, &id, &configuration)
            }
        },
        Commands::Class { action } => match action {
            ClassAction::Hierarchy { id } => cmd_class_hierarchy(&services, &id),
            ClassAction::Roots { page, size } => cmd_class_roots(&services, &PageRequest::of(page, size)),
        },
    };
    std::process::exit(code);
}
