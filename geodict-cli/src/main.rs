//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = geodict_cli::run() {
        eprintln!("geodict: {err}");
        std::process::exit(1);
    }
}
