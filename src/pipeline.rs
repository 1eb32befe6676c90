
// imports
use crate::config::{files_handling, Config};
use crate::error::Result;
use crate::model::SkipGram;
use crate::reader::CyclicReader;
use crate::sampling::NegativeSampler;
use crate::similarity::Similarity;
use crate::train::Train;
use crate::vocab::{IndexSpace, Vocabulary};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use tracing::info;

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> vocabulary and pair source loading
    // -> training
    pub fn run() -> Result<Train> {
        info!("entering program...");
        let args: Vec<String> = env::args().collect();
        Pipeline::run_with_args(&args)
    }

    pub fn run_with_args(args: &[String]) -> Result<Train> {

        info!("building parameters...");
        let params = Config::new(args)?.get_params();
        info!("{}", params);

        // vocabulary, most frequent words first
        let timer = Instant::now();
        let words = files_handling::read_input::<Vec<String>>(&params.word_file)?;
        let vocab = Vocabulary::load(&words, params.maximum_number_of_words);

        // fails before anything is allocated when the stop words eat the vocabulary
        let index = IndexSpace::new(vocab.len(), params.number_of_stop_words)?;
        info!(
            vocabulary = vocab.len(),
            stop_words = params.number_of_stop_words,
            trainable = index.number_of_words(),
            "loaded vocabulary"
        );

        // an empty pair source is reported here, not in the middle of training
        let reader = files_handling::read_input::<CyclicReader<BufReader<File>>>(&params.neighbors_file)?;
        info!("loaded vocabulary and pair source, took {} seconds ...", timer.elapsed().as_secs());

        // one generator for the initial tables and every negative, in this order
        let mut rng = match params.train.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let model = SkipGram::new(index.number_of_words(), params.train.vector_size, &mut rng);
        let mut sampler = NegativeSampler::new(reader, index, rng);

        info!("starting training part...");
        let similarity = Similarity::new(&vocab, index);
        let trainer = Train::run(model, &mut sampler, &similarity, &params.train)?;

        info!(wraps = sampler.reader().wraps(), "pair source cycles during training");
        Ok(trainer)
    }

}
