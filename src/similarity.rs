use crate::error::{Error, Result};
use crate::vocab::{IndexSpace, Vocabulary};
use ndarray::prelude::*;
use rayon::prelude::*;

/// Squared euclidean distance, `sum((a - b)^2)`.
///
/// # Panics
///
/// If `a` and `b` differ in length.
pub fn squared_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Row indices of `table` sorted by ascending squared distance to `vec`.
///
/// Ties keep the original row order. Every row is scored, nothing is cached.
///
/// # Panics
///
/// If the length of `vec` is not the number of columns of `table`.
pub fn rank(vec: ArrayView1<'_, f32>, table: ArrayView2<'_, f32>) -> Vec<usize> {
    // distances are independent per row, order is restored by the indexed collect
    let distances: Vec<f32> = table
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|row| squared_distance(vec, row))
        .collect();

    let mut indexed: Vec<usize> = (0..distances.len()).collect();
    indexed.sort_by(|i, j| distances[*i].total_cmp(&distances[*j]));
    indexed
}

/// Nearest neighbor queries over a table in model index space.
pub struct Similarity<'a> {
    vocab: &'a Vocabulary,
    index: IndexSpace,
}

impl<'a> Similarity<'a> {

    pub fn new(vocab: &'a Vocabulary, index: IndexSpace) -> Similarity<'a> {
        Similarity { vocab, index }
    }

    /// The row of `table` that belongs to `token`.
    ///
    /// Fails with [`Error::Lookup`] for a word outside the vocabulary and with
    /// [`Error::NoRow`] for the sentinel and the stop words.
    pub fn extract_vec_from_word<'t>(&self, token: &str, table: ArrayView2<'t, f32>) -> Result<ArrayView1<'t, f32>> {
        let raw = self.vocab.index_of(token)?;
        let row = self
            .index
            .model_index(raw)
            .filter(|i| *i < table.dim().0)
            .ok_or_else(|| Error::NoRow(token.to_owned()))?;
        Ok(table.index_axis_move(Axis(0), row))
    }

    /// Every word of the table, closest to `token` first.
    ///
    /// `token` itself has distance zero and so comes first, unless another
    /// row holds the very same vector and has a smaller index.
    pub fn similar_words(&self, token: &str, table: ArrayView2<'_, f32>) -> Result<Vec<String>> {
        let vec = self.extract_vec_from_word(token, table)?;
        rank(vec, table)
            .into_iter()
            .map(|i| {
                let raw = self.index.word_index(i);
                self.vocab
                    .word(raw)
                    .map(|w| w.to_owned())
                    .ok_or_else(|| Error::IndexOutOfRange {
                        raw,
                        first: self.index.word_index(0),
                        end: self.vocab.len(),
                    })
            })
            .collect()
    }

    /// The first `k` entries of [`Similarity::similar_words`].
    pub fn similar_words_top(&self, token: &str, table: ArrayView2<'_, f32>, k: usize) -> Result<Vec<String>> {
        let mut words = self.similar_words(token, table)?;
        words.truncate(k);
        Ok(words)
    }
}
