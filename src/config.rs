use crate::error::{Error, Result};
use serde_json::Value;
use std::{fmt::Display, fs::File, io::BufReader};

#[derive(Clone, Debug)]
pub struct TrainParams {
    pub vector_size: usize,
    pub negative_examples: usize,
    pub batch_size: usize,
    pub number_of_batches: usize,
    pub learning_rate: f32,
    pub seed: Option<u64>,
    pub report_every: usize,
    pub probe_words: Vec<String>,
    pub top_k: usize,
}

impl Display for TrainParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "training hyper parameters:
        vector_size: {},
        negative_examples: {},
        batch_size: {},
        number_of_batches: {},
        learning_rate: {},
        seed: {:?},
        report_every: {},
        probe_words: {:?},
        top_k: {}",
        self.vector_size, self.negative_examples, self.batch_size, self.number_of_batches,
        self.learning_rate, self.seed, self.report_every, self.probe_words, self.top_k
        )
    }
}

#[derive(Clone, Debug)]
pub struct Params {
    pub word_file: String,
    pub neighbors_file: String,
    pub maximum_number_of_words: usize,
    pub number_of_stop_words: usize,
    pub train: TrainParams,
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using hyper-params:
        word_file: {}
        neighbors_file: {}
        maximum_number_of_words: {}
        number_of_stop_words: {}
        Using training hyper-params: {}",
        self.word_file, self.neighbors_file, self.maximum_number_of_words, self.number_of_stop_words, self.train)
    }
}

pub struct Config {
    params: Params,
}

impl Config {

    pub fn get_params(&self) -> Params {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(Error::Config("input should be a path to json file only".to_string()));
        }

        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f)?;
        Config::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config> {

        // input files have no defaults
        let word_file = required_str(json, "word_file")?;
        let neighbors_file = required_str(json, "neighbors_file")?;

        // handle default vs input parameters, defaults follow the reference run
        let maximum_number_of_words = positive(json, "maximum_number_of_words", 10000)?;
        let number_of_stop_words = non_negative(json, "number_of_stop_words", 40)?;
        let vector_size = positive(json, "vector_size", 30)?;
        let negative_examples = non_negative(json, "negative_examples", 9)?;
        let batch_size = positive(json, "batch_size", 1000)?;
        let number_of_batches = non_negative(json, "number_of_batches", 16000)?;
        let report_every = positive(json, "report_every", 50)?;
        let top_k = positive(json, "top_k", 20)?;

        let learning_rate = match json.get("learning_rate") {
            Some(learning_rate) => learning_rate.as_f64().ok_or_else(|| {
                Error::Config("given learning_rate is not numeric".to_string())
            })?,
            None => 0.1,
        };
        if learning_rate <= 0.0 || !learning_rate.is_finite() {
            return Err(Error::Config(format!("learning_rate must be positive, got {}", learning_rate)));
        }

        let seed = match json.get("seed") {
            Some(seed) => Some(seed.as_u64().ok_or_else(|| {
                Error::Config("given seed is not a non-negative integer".to_string())
            })?),
            None => None,
        };

        let probe_words = match json.get("probe_words") {
            Some(Value::Array(words)) => words
                .iter()
                .map(|w| {
                    w.as_str()
                        .map(|s| s.to_owned())
                        .ok_or_else(|| Error::Config("probe_words must hold strings".to_string()))
                })
                .collect::<Result<Vec<String>>>()?,
            Some(_) => return Err(Error::Config("probe_words must be an array".to_string())),
            None => vec!["year".to_string(), "development".to_string()],
        };

        let params = Params {
            word_file,
            neighbors_file,
            maximum_number_of_words,
            number_of_stop_words,
            train: TrainParams {
                vector_size,
                negative_examples,
                batch_size,
                number_of_batches,
                learning_rate: learning_rate as f32,
                seed,
                report_every,
                probe_words,
                top_k,
            },
        };

        Ok(Self { params })
    }

}

fn required_str(json: &Value, key: &str) -> Result<String> {
    json.get(key)
        .ok_or_else(|| Error::Config(format!("{} was not supplied through json", key)))?
        .as_str()
        .map(|s| s.to_owned())
        .ok_or_else(|| Error::Config(format!("cannot cast {} to string", key)))
}

fn non_negative(json: &Value, key: &str, default: usize) -> Result<usize> {
    match json.get(key) {
        Some(value) => value
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| Error::Config(format!("given {} is not a non-negative integer", key))),
        None => Ok(default),
    }
}

fn positive(json: &Value, key: &str, default: usize) -> Result<usize> {
    let value = non_negative(json, key, default)?;
    if value == 0 {
        return Err(Error::Config(format!("{} must be positive", key)));
    }
    Ok(value)
}


pub mod files_handling {

    use crate::error::Result;
    use crate::reader::CyclicReader;
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    pub fn read_input<R: ReadFile>(file_path: &str) -> Result<R> {
        let input = R::read_file(file_path)?;
        Ok(input)
    }

    pub trait ReadFile: Sized {
        fn read_file(file_path: &str) -> Result<Self>;
    }

    // the word list, one word per line, most frequent first
    impl ReadFile for Vec<String> {
        fn read_file(file_path: &str) -> Result<Self> {
            let f = BufReader::new(File::open(file_path)?);
            let mut words = Vec::new();
            for line in f.lines() {
                words.push(line?);
            }
            Ok(words)
        }
    }

    // the pair source, cycled forever
    impl ReadFile for CyclicReader<BufReader<File>> {
        fn read_file(file_path: &str) -> Result<Self> {
            let f = BufReader::new(File::open(file_path)?);
            CyclicReader::new(f)
        }
    }

}
