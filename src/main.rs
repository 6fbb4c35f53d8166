//! Rategraph CLI
//!
//! Usage:
//!   rategraph [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --circuit <NAME>  Build the named circuit and print its graph
//!   -r, --resolve <NAME>  Print the fully merged form of a template
//!   -l, --list            List all templates in the document
//!   -f, --format          Show the template document format reference
//!   -h, --help            Print help

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use rategraph::{build_circuit, CompileError, TemplateKind, TemplateResolver, TemplateStore};

#[derive(Parser)]
#[command(name = "rategraph")]
#[command(about = "Template resolution and circuit assembly for neural-mass models")]
struct Cli {
    /// Template document (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Build the named circuit template and print its graph
    #[arg(short, long)]
    circuit: Option<String>,

    /// Print the fully merged form of a template
    #[arg(short, long)]
    resolve: Option<String>,

    /// List all templates in the document
    #[arg(short, long)]
    list: bool,

    /// Show the template document format reference
    #[arg(short, long)]
    format: bool,

    /// Debug mode: include variable namespaces in circuit output
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.format {
        print_format();
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Load the template document
    let store = match &cli.input {
        Some(path) => match TemplateStore::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
            match TemplateStore::from_toml_str(&buffer) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    if cli.list {
        let mut names: Vec<&str> = store.names().collect();
        names.sort_unstable();
        for name in names {
            println!("{}", name);
        }
        return;
    }

    if let Some(name) = &cli.resolve {
        let mut resolver = TemplateResolver::new(&store);
        match resolver.resolve(name) {
            Ok(record) => print_resolved(&record),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(name) = &cli.circuit {
        match build_circuit(&store, name) {
            Ok(graph) => {
                print!("{}", graph.describe());
                if cli.debug {
                    print_namespaces(&graph);
                }
            }
            Err(e) => {
                report_error(&e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Default action: validate every circuit template in the document
    let mut circuits: Vec<String> = Vec::new();
    {
        let mut resolver = TemplateResolver::new(&store);
        for name in store.names() {
            if let Ok(resolved) = resolver.resolve(name) {
                if resolved.kind() == Some(TemplateKind::Circuit) {
                    circuits.push(name.to_string());
                }
            }
        }
    }
    circuits.sort_unstable();

    if circuits.is_empty() {
        eprintln!("No circuit templates in document ({} templates total)", store.len());
        return;
    }

    for name in circuits {
        match build_circuit(&store, &name) {
            Ok(graph) => println!(
                "{}: ok ({} nodes, {} edges)",
                name,
                graph.node_count(),
                graph.edge_count()
            ),
            Err(e) => {
                eprintln!("{}: error", name);
                report_error(&e);
                std::process::exit(1);
            }
        }
    }
}

fn report_error(err: &CompileError) {
    match err {
        // Operator errors carry labeled equation diagnostics
        CompileError::Operator(op_err) => eprintln!("{}", op_err.format()),
        other => eprintln!("Error: {}", other),
    }
}

fn print_resolved(record: &rategraph::RawTemplate) {
    println!("name: {}", record.name);
    if let Some(kind) = record.kind() {
        println!("kind: {}", kind.keyword());
    }
    if let Some(description) = &record.description {
        println!("description: {}", description);
    }
    if let Some(equations) = &record.equations {
        println!("equations:");
        for eq in equations {
            println!("  {}", eq);
        }
    }
    if !record.variables.is_empty() {
        println!("variables:");
        for (name, var) in &record.variables {
            match var.default_value() {
                rategraph::RawValue::Number(n) => println!("  {} = {}", name, n),
                rategraph::RawValue::Text(s) => println!("  {} = {}", name, s),
            }
        }
    }
    if let Some(operators) = &record.operators {
        println!("operators: {}", operators.join(", "));
    }
    if let Some(nodes) = &record.nodes {
        println!("nodes:");
        for (instance, template) in nodes {
            println!("  {} = {}", instance, template);
        }
    }
    if let Some(edges) = &record.edges {
        println!("edges:");
        for edge in edges {
            println!(
                "  {} -> {} [{}]",
                edge.source_path(),
                edge.target_path(),
                edge.transfer_template()
            );
        }
    }
}

fn print_namespaces(graph: &rategraph::CircuitGraph) {
    for (name, node) in &graph.nodes {
        eprintln!("[{}]", name);
        for (var, spec) in &node.unit.chain.namespace {
            match &spec.default {
                Some(default) => eprintln!("  {}: {} = {}", var, spec.role, default),
                None => eprintln!("  {}: {}", var, spec.role),
            }
        }
    }
}

fn print_intro() {
    println!(
        r#"Rategraph - template resolution and circuit assembly for neural-mass models

USAGE:
    rategraph [OPTIONS] [FILE]
    cat model.toml | rategraph --circuit Net3

OPTIONS:
    -c, --circuit <NAME>  Build the named circuit and print its graph
    -r, --resolve <NAME>  Print the fully merged form of a template
    -l, --list            List all templates in the document
    -f, --format          Show the template document format reference
    -d, --debug           Include variable namespaces in circuit output
    -h, --help            Print help

QUICK START:
    rategraph demos/net3.toml

With no other option the tool validates every circuit template it finds.
Run --format for the document format reference."#
    );
}

fn print_format() {
    println!(
        r#"TEMPLATE DOCUMENT FORMAT
========================

Documents are TOML. Each template is one [templates.<name>] table whose
'base' is either a primitive kind (OperatorTemplate, NodeTemplate,
EdgeTemplate, CircuitTemplate) or the name of a parent template to derive
from. Child fields overlay the resolved parent: scalar fields replace,
variables merge key-wise, operator/node/edge lists replace wholesale.

OPERATORS
---------
[templates.RateOp]
base = "OperatorTemplate"
equations = [
    "d/dt * r = -r / tau + r_in",
]

[templates.RateOp.variables]
r = "output"          # exposed for downstream wiring
r_in = "input"        # open slot, summed from incoming edges
v = "variable"        # internal state
u = "placeholder"     # bound externally at run time
tau = 10.0            # constant with a numeric default

Equations use 'd/dt * x = rhs' for state updates and 'x = rhs' for
algebraic assignments. Every symbol must be declared as a variable;
PI, E and the usual functions (exp, sin, tanh, ...) are builtin.

NODES AND EDGES
---------------
[templates.Pop]
base = "NodeTemplate"
operators = ["RateOp"]       # chained in order; a later operator's input
                             # is satisfied by an earlier same-named output

[templates.LC]
base = "EdgeTemplate"
operators = ["CouplingOp"]   # empty list = pass-through scalar weighting

CIRCUITS
--------
[templates.Net]
base = "CircuitTemplate"
edges = [
    # [source, target, edge template, parameters]
    ["A/RateOp/r", "B/RateOp/r_in", "LC", {{ weight = 5.0 }}],
]

[templates.Net.nodes]
A = "Pop"
B = "Pop"

Edge endpoints are '<node>/<operator>/<variable>' paths. Sources must
name an output, targets an input. Multiple edges may target the same
input; their contributions are summed by the numerical engine."#
    );
}
