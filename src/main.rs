mod app;
mod cli;
mod config;
mod consts;
mod core;
mod data;
mod error;
mod export;
mod output;
mod report;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
