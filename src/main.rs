use std::process;
use tracing::error;
use word2vec_trainer::Pipeline;

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = Pipeline::run() {
        error!("{}", e);
        process::exit(1);
    }
}
