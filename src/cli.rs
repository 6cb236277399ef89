use std::env;

pub struct Opts {
    pub subcommand: String,
    /// Task name for `run`, job name for `run-job`.
    pub arg: Option<String>,
    pub project_dir: String,
}

pub fn get_opts() -> Opts {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: pigrun <tasks|run|jobs|run-job> [name] [project_dir]");
        std::process::exit(1);
    }
    let subcommand = args[1].clone();
    // `run` and `run-job` take a name; the trailing argument is a project dir
    let (arg, project_dir) = match subcommand.as_str() {
        "run" | "run-job" => (args.get(2).cloned(), args.get(3).cloned()),
        _ => (None, args.get(2).cloned()),
    };
    Opts {
        subcommand,
        arg,
        project_dir: project_dir.unwrap_or_else(|| ".".to_string()),
    }
}
