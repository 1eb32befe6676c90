
mod error;
mod config;
mod vocab;
mod reader;
mod sampling;
mod model;
mod similarity;
mod train;
mod pipeline;

pub use error::{Error, Result};
pub use config::{files_handling, Config, Params, TrainParams};
pub use vocab::{IndexSpace, Vocabulary, UNKNOWN};
pub use reader::CyclicReader;
pub use sampling::{parse_pair, Batch, NegativeSampler};
pub use model::{softmax_rows, GradientDescent, Gradients, Minimizer, SkipGram, SoftmaxSquaredError};
pub use similarity::{rank, squared_distance, Similarity};
pub use train::Train;
pub use pipeline::Pipeline;
