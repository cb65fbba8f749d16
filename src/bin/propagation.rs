use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{anyhow, Context, Result};
use clap::{value_t, App, Arg, ArgMatches};
use propagation_depth::{read_graph, with_stack_size, Orientation, PropagationGraph};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn validate_usize_arg(arg: String) -> Result<(), String> {
    match arg.parse::<usize>() {
        Ok(_) => Ok(()),
        Err(_) => Err(String::from("expected integer")),
    }
}

fn init_logging(verbosity: u64) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn load(path: Option<&str>) -> Result<PropagationGraph> {
    let graph = match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path))?;
            read_graph(BufReader::new(file)).with_context(|| format!("loading {}", path))?
        }
        None => read_graph(io::stdin().lock()).context("loading graph from stdin")?,
    };
    Ok(graph)
}

/// Runs the computation, on a thread with `stack_size` bytes of stack when
/// one is given.
fn compute(mut graph: PropagationGraph, stack_size: Option<usize>) -> Result<PropagationGraph> {
    match stack_size {
        Some(size) => with_stack_size(size, move || {
            graph.compute();
            graph
        })
        .map_err(|_| anyhow!("computation thread with a {} byte stack failed", size)),
        None => {
            graph.compute();
            Ok(graph)
        }
    }
}

fn run(matches: &ArgMatches) -> Result<usize> {
    let orientation: Orientation = matches.value_of("ORIENTATION").unwrap_or("reach").parse()?;
    let stack_size = match matches.value_of("STACK_SIZE") {
        Some(_) => Some(value_t!(matches, "STACK_SIZE", usize)?),
        None => None,
    };

    let graph = load(matches.value_of("INPUT"))?.with_orientation(orientation);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        orientation = ?graph.orientation(),
        "graph loaded"
    );

    let graph = compute(graph, stack_size)?;
    info!(components = graph.components().len(), "components assigned");
    Ok(graph.max_value())
}

fn main() {
    let matches = App::new("Propagation depth")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Longest chain of influence across strongly connected components")
        .arg(
            Arg::with_name("INPUT")
                .help("file holding `N M` and M edges, stdin when omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("ORIENTATION")
                .long("orientation")
                .help("count chains reaching each person or leaving each person")
                .takes_value(true)
                .possible_values(&["reach", "influence"])
                .default_value("reach"),
        )
        .arg(
            Arg::with_name("STACK_SIZE")
                .long("stack-size")
                .value_name("BYTES")
                .help("run the computation on a thread with this stack size")
                .takes_value(true)
                .validator(validate_usize_arg),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("raise log level, repeat for more"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    match run(&matches) {
        Ok(max) => println!("{}", max),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_feeding_sink(orientation: &str) -> PropagationGraph {
        PropagationGraph::from_edges(3, [(1, 2), (2, 1), (1, 3)])
            .unwrap()
            .with_orientation(orientation.parse().unwrap())
    }

    #[test]
    fn compute_on_small_stack_matches_inline() {
        let inline = compute(cycle_feeding_sink("reach"), None).unwrap();
        let threaded = compute(cycle_feeding_sink("reach"), Some(64 * 1024)).unwrap();
        assert_eq!(inline.values(), &[0, 0, 1]);
        assert_eq!(threaded.values(), inline.values());
        assert_eq!(threaded.components().len(), 2);
    }

    #[test]
    fn orientation_argument_selects_direction() {
        let graph = compute(cycle_feeding_sink("influence"), Some(64 * 1024)).unwrap();
        assert_eq!(graph.orientation(), Orientation::Influence);
        assert_eq!(graph.values(), &[1, 1, 0]);
        assert!("sideways".parse::<Orientation>().is_err());
    }
}
