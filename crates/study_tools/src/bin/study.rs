#![forbid(unsafe_code)]

fn main() {
    study_tools::init_logging();
    let mut stdout = std::io::stdout().lock();
    if let Err(error) = study_tools::cli::run_from_env(&mut stdout) {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
