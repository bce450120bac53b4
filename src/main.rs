use clap::{App, Arg, ArgMatches};
use std::ffi::OsStr;
use std::fs::{read, read_to_string};
use std::path::Path;
use std::process::exit;
use std::str::FromStr;
use syndelta::{
    parse_source, AnsiColoredReportFormatter, Differ, DiffOptions, DiffReport, Grammar,
    PlainReportFormatter, ReportView, SynTree,
};
use tracing_subscriber::EnvFilter;
use tree_sitter::Parser;
use tree_sitter_config::Config;
use tree_sitter_loader::Loader;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("syndelta {}", panic_info);
        exit(-3)
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SYNDELTA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd_args = App::new("Syndelta")
        .version("0.1")
        .about("Compare files syntactically and group the edits into logical changes")
        .long_about("Compare files syntactically and group the edits into logical changes\n\n\
            Both files are parsed by a tree-sitter grammar, their syntax trees are matched \
            and the differences are reported as insertions, deletions, updates and moves, \
            grouped under the enclosing boundary nodes (declarations, methods...).")
        .arg(
            Arg::with_name("original-file")
                .required(true)
                .help("Path to the original file"),
        )
        .arg(
            Arg::with_name("modified-file")
                .required(true)
                .help("Path to the modified file"),
        )
        .arg(
            Arg::with_name("scope")
                .long("scope")
                .takes_value(true)
                .help("Select the tree-sitter language by scope instead of file extension"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .help("Read diff options from a JSON file, flags override its values"),
        )
        .arg(
            Arg::with_name("threshold")
                .long("threshold")
                .takes_value(true)
                .help("Similarity above which two containers are matched (default 0.5)"),
        )
        .arg(
            Arg::with_name("min-height")
                .long("min-height")
                .takes_value(true)
                .help("Minimal height of subtrees anchored by the top-down phase (default 2)"),
        )
        .arg(
            Arg::with_name("boundary")
                .long("boundary")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Node kind delimiting a logical change, can be repeated"),
        )
        .arg(
            Arg::with_name("name-kind")
                .long("name-kind")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Node kind holding the name of a boundary node, can be repeated"),
        )
        .arg(
            Arg::with_name("type-kind")
                .long("type-kind")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Node kind never searched for the name of a boundary node, can be repeated"),
        )
        .arg(
            Arg::with_name("max-nodes")
                .long("max-nodes")
                .takes_value(true)
                .help("Refuse to compare trees with more nodes than this in total"),
        )
        .arg(
            Arg::with_name("time-limit")
                .long("time-limit")
                .takes_value(true)
                .help("Abort the comparison after this many milliseconds"),
        )
        .arg(
            Arg::with_name("trees")
                .long("trees")
                .help("Also print both syntax trees with node ids and source ranges"),
        )
        .arg(
            Arg::with_name("mappings")
                .long("mappings")
                .help("Also list the matched node pairs and the unmatched nodes"),
        )
        .arg(
            Arg::with_name("stats")
                .long("stats")
                .help("Also print statistics about the comparison"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .conflicts_with("colored")
                .help("Print the whole report as JSON"),
        )
        .arg(Arg::with_name("colored").short("c").long("colored").help("Color actions by kind"))
        .get_matches_safe()
        .unwrap_or_else(|err| {
            eprintln!("{}", err);
            exit(-1)
        });

    let options = diff_options(&cmd_args);

    let config = Config::load().unwrap_or_else(|err| {
        eprintln!("Error loading tree-sitter configuration: {}", err);
        exit(-2)
    });
    let mut lang_loader = Loader::new().unwrap_or_else(|err| {
        eprintln!("Error creating parser loader: {}", err);
        exit(-2)
    });
    let loader_config = config.get().unwrap_or_else(|err| {
        eprintln!("Error reading tree-sitter configuration: {}", err);
        exit(-2)
    });
    lang_loader
        .find_all_languages(&loader_config)
        .unwrap_or_else(|err| {
            eprintln!("Error loading parser list: {}", err);
            exit(-2)
        });

    let origin_filename = cmd_args.value_of_os("original-file").unwrap();

    let language = lang_loader
        .select_language(
            Path::new(&origin_filename),
            Path::new(""),
            cmd_args.value_of("scope"),
        )
        .unwrap_or_else(|err| {
            eprintln!("Error loading parser: {}", err);
            exit(-2)
        });

    let mut parser = Parser::new();
    parser.set_language(language).unwrap_or_else(|err| {
        eprintln!("Failed initializing parser: {}", err);
        exit(-2);
    });

    let mut grammar = Grammar::default();
    let origin_src = read_file(origin_filename);
    let origin_tree = parse_tree(&origin_src, origin_filename, &mut parser, &mut grammar);

    let modified_filename = cmd_args.value_of_os("modified-file").unwrap();
    let modified_src = read_file(modified_filename);
    let modified_tree = parse_tree(&modified_src, modified_filename, &mut parser, &mut grammar);

    let report = Differ::new(options, &grammar)
        .diff(&origin_tree, &modified_tree)
        .unwrap_or_else(|err| {
            eprintln!("Unable to compare files: {}", err);
            exit(-3)
        });

    if cmd_args.is_present("json") {
        print_json(&report, &grammar);
        return;
    }

    let mut view = ReportView::new(&report, &origin_tree, &modified_tree, &grammar);
    view.show_trees = cmd_args.is_present("trees");
    view.show_mappings = cmd_args.is_present("mappings");
    view.show_stats = cmd_args.is_present("stats");
    let output = std::io::stdout().lock();
    let written = if cmd_args.is_present("colored") {
        view.write_with(&mut AnsiColoredReportFormatter::new(output))
    } else {
        view.write_with(&mut PlainReportFormatter::new(output))
    };
    written.unwrap_or_else(|err| {
        eprintln!("Unable to write output: {}", err);
        exit(-1)
    });
}

fn diff_options(cmd_args: &ArgMatches) -> DiffOptions {
    let mut options = match cmd_args.value_of_os("config") {
        Some(config_filename) => {
            let text = read_to_string(config_filename).unwrap_or_else(|err| {
                eprintln!(
                    "Unable to read {}: {}",
                    config_filename.to_string_lossy(),
                    err
                );
                exit(-1)
            });
            DiffOptions::from_json(&text).unwrap_or_else(|err| {
                eprintln!(
                    "Invalid configuration {}: {}",
                    config_filename.to_string_lossy(),
                    err
                );
                exit(-1)
            })
        }
        None => DiffOptions::default(),
    };

    if let Some(threshold) = parse_arg(cmd_args, "threshold") {
        options.similarity_threshold = threshold;
    }
    if let Some(min_height) = parse_arg(cmd_args, "min-height") {
        options.min_height = min_height;
    }
    if let Some(max_nodes) = parse_arg(cmd_args, "max-nodes") {
        options.max_nodes = Some(max_nodes);
    }
    if let Some(time_limit) = parse_arg(cmd_args, "time-limit") {
        options.time_limit_ms = Some(time_limit);
    }
    if let Some(kinds) = cmd_args.values_of("boundary") {
        options.boundary_kinds = kinds.map(str::to_owned).collect();
    }
    if let Some(kinds) = cmd_args.values_of("name-kind") {
        options.name_kinds = kinds.map(str::to_owned).collect();
    }
    if let Some(kinds) = cmd_args.values_of("type-kind") {
        options.type_kinds = kinds.map(str::to_owned).collect();
    }
    options
}

fn parse_arg<T: FromStr>(cmd_args: &ArgMatches, name: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let value = cmd_args.value_of(name)?;
    Some(value.parse().unwrap_or_else(|err| {
        eprintln!("Invalid value `{}` for --{}: {}", value, name, err);
        exit(-1)
    }))
}

fn read_file(filename: &OsStr) -> Vec<u8> {
    read(filename).unwrap_or_else(|err| {
        eprintln!("Unable to read {}: {}", filename.to_string_lossy(), err);
        exit(-1)
    })
}

fn parse_tree(
    source: &[u8],
    filename: &OsStr,
    parser: &mut Parser,
    grammar: &mut Grammar,
) -> SynTree {
    parse_source(source, parser, grammar).unwrap_or_else(|| {
        eprintln!("Unable to parse {}", filename.to_string_lossy());
        exit(-2)
    })
}

fn print_json(report: &DiffReport, grammar: &Grammar) {
    let document = serde_json::json!({
        "kinds": grammar.names().collect::<Vec<_>>(),
        "report": report,
    });
    serde_json::to_writer_pretty(std::io::stdout().lock(), &document).unwrap_or_else(|err| {
        eprintln!("Unable to write output: {}", err);
        exit(-1)
    });
    println!();
}
