use env_logger::Env;
use hikarlsen::{EngineConfig, UciEngine};
use log::error;
use parking_lot::Mutex;
use std::io;
use std::process;
use std::sync::Arc;

fn main() {
    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = EngineConfig::from_env();
    let mut engine = UciEngine::new(config, Arc::new(Mutex::new(io::stdout())));

    if let Err(err) = engine.run(io::stdin().lock()) {
        error!("engine stopped: {}", err);
        drop(engine);
        process::exit(1);
    }
}
