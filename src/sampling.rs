use crate::error::{Error, Result};
use crate::reader::CyclicReader;
use crate::vocab::IndexSpace;
use rand::Rng;
use std::io::{BufRead, Seek};

/// A flat batch of training tuples.
///
/// Entries come in groups of `group_size = 1 + negative_examples`. Every
/// entry of a group holds the same word; the first context of a group is the
/// observed one and the rest are random negatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub words: Vec<usize>,
    pub contexts: Vec<usize>,
    pub group_size: usize,
}

impl Batch {

    pub fn with_capacity(batch_size: usize, negative_examples: usize) -> Batch {
        let group_size = 1 + negative_examples;
        Batch {
            words: Vec::with_capacity(batch_size * group_size),
            contexts: Vec::with_capacity(batch_size * group_size),
            group_size,
        }
    }

    /// Number of entries, `batch_size * group_size`.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn num_groups(&self) -> usize {
        self.words.len() / self.group_size
    }

    /// Append one group: the observed pair followed by negatives drawn
    /// uniformly from `0..number_of_words`, with replacement. A negative may
    /// equal the observed context.
    pub fn push_group<G: Rng>(&mut self, word: usize, context: usize, number_of_words: usize, rng: &mut G) {
        self.words.extend(std::iter::repeat(word).take(self.group_size));
        self.contexts.push(context);
        for _ in 1..self.group_size {
            self.contexts.push(rng.gen_range(0..number_of_words));
        }
    }
}

/// Parse a pair line, `word_raw_id context_raw_id`.
pub fn parse_pair(line: &str) -> Result<(usize, usize)> {
    let malformed = |reason: &str| Error::Parse {
        line: line.to_owned(),
        reason: reason.to_owned(),
    };

    let mut fields = line.split_whitespace();
    let word = fields.next().ok_or_else(|| malformed("missing word id"))?;
    let context = fields.next().ok_or_else(|| malformed("missing context id"))?;
    if fields.next().is_some() {
        return Err(malformed("expected exactly two ids"));
    }

    let word = word.parse().map_err(|_| malformed("word id is not a non-negative integer"))?;
    let context = context.parse().map_err(|_| malformed("context id is not a non-negative integer"))?;
    Ok((word, context))
}

/// Expands positive pairs read from the pair source into batches with
/// negative examples.
///
/// The random source is owned and consumed in batch order, so a seeded
/// generator reproduces the same batches.
pub struct NegativeSampler<R, G> {
    reader: CyclicReader<R>,
    index: IndexSpace,
    rng: G,
}

impl<R: BufRead + Seek, G: Rng> NegativeSampler<R, G> {

    pub fn new(reader: CyclicReader<R>, index: IndexSpace, rng: G) -> NegativeSampler<R, G> {
        NegativeSampler { reader, index, rng }
    }

    /// Read `batch_size` pairs and build `batch_size` groups of
    /// `1 + negative_examples` entries, in reading order.
    pub fn build_batch(&mut self, batch_size: usize, negative_examples: usize) -> Result<Batch> {
        let number_of_words = self.index.number_of_words();
        let mut batch = Batch::with_capacity(batch_size, negative_examples);

        for line in self.reader.next_lines(batch_size)? {
            let (word, context) = parse_pair(&line)?;
            let word = self.index.checked_model_index(word)?;
            let context = self.index.checked_model_index(context)?;
            batch.push_group(word, context, number_of_words, &mut self.rng);
        }

        Ok(batch)
    }

    pub fn reader(&self) -> &CyclicReader<R> {
        &self.reader
    }
}
