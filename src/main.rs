use stratus_cli::cli;

fn main() {
    if let Err(err) = cli::run() {
        stratus_cli::ui::output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
