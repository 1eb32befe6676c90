use crate::config::TrainParams;
use crate::error::{Error, Result};
use crate::model::{GradientDescent, Minimizer, SkipGram};
use crate::sampling::NegativeSampler;
use crate::similarity::Similarity;
use rand::Rng;
use std::io::{BufRead, Seek};
use std::time::Instant;
use tracing::{info, warn};

pub struct Train {
    model: SkipGram,
    losses: Vec<f32>,
}

struct DisplayProgress {
    window_loss: f32,   // summed loss since the last report
    window_batches: usize,
    report_every: usize,
    top_k: usize,
}

impl DisplayProgress {

    fn new(params: &TrainParams) -> Self {
        Self {
            window_loss: 0.0,
            window_batches: 0,
            report_every: params.report_every,
            top_k: params.top_k,
        }
    }

    fn record(&mut self, loss: f32) {
        self.window_loss += loss;
        self.window_batches += 1;
    }

    fn should_report(&self, batch_number: usize) -> bool {
        self.report_every > 0 && batch_number % self.report_every == 0
    }

    fn take_mean(&mut self) -> f32 {
        let mean = self.window_loss / self.window_batches.max(1) as f32;
        self.window_loss = 0.0;
        self.window_batches = 0;
        mean
    }
}

impl Train {

    pub fn get_model(&self) -> &SkipGram {
        &self.model
    }

    pub fn into_model(self) -> SkipGram {
        self.model
    }

    /// Loss of every batch, before its update, in training order.
    pub fn get_losses(&self) -> &[f32] {
        &self.losses
    }

    fn report(&self, batch_number: usize, progress: &mut DisplayProgress, similarity: &Similarity<'_>, probe_words: &[String], wraps: usize) -> Result<()> {

        let loss = self.losses.last().copied().unwrap_or(0.0);
        let mean_loss = progress.take_mean();
        info!(batch = batch_number, loss, mean_loss, wraps, "training progress");

        for probe in probe_words {
            match similarity.similar_words_top(probe, self.model.word_table(), progress.top_k) {
                Ok(words) => info!(batch = batch_number, probe = %probe, "similar words: {:?}", words),
                Err(Error::Lookup(_) | Error::NoRow(_)) => warn!(probe = %probe, "probe word has no vector, skipping"),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Train for `number_of_batches` batches with plain gradient descent.
    pub fn run<R, G>(
        model: SkipGram,
        sampler: &mut NegativeSampler<R, G>,
        similarity: &Similarity<'_>,
        train_params: &TrainParams,
    ) -> Result<Train>
    where
        R: BufRead + Seek,
        G: Rng,
    {
        let mut minimizer = GradientDescent { learning_rate: train_params.learning_rate };
        Train::run_with(model, sampler, similarity, train_params, &mut minimizer)
    }

    /// Batches are built and consumed strictly in order, one at a time.
    pub fn run_with<R, G, M>(
        model: SkipGram,
        sampler: &mut NegativeSampler<R, G>,
        similarity: &Similarity<'_>,
        train_params: &TrainParams,
        minimizer: &mut M,
    ) -> Result<Train>
    where
        R: BufRead + Seek,
        G: Rng,
        M: Minimizer,
    {
        let timer = Instant::now();
        let mut trainer = Train {
            model,
            losses: Vec::with_capacity(train_params.number_of_batches),
        };
        let mut progress = DisplayProgress::new(train_params);

        for batch_number in 0..train_params.number_of_batches {

            let batch = sampler.build_batch(train_params.batch_size, train_params.negative_examples)?;
            let loss = trainer.model.train_batch(&batch, minimizer)?;
            trainer.losses.push(loss);
            progress.record(loss);

            if progress.should_report(batch_number) {
                let wraps = sampler.reader().wraps();
                trainer.report(batch_number, &mut progress, similarity, &train_params.probe_words, wraps)?;
            }
        }

        info!(
            batches = train_params.number_of_batches,
            seconds = timer.elapsed().as_secs(),
            "finished training"
        );
        Ok(trainer)
    }

}
