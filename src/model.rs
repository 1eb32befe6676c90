use crate::error::{Error, Result};
use crate::sampling::Batch;
use ndarray::prelude::*;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::Rng;
use std::iter::zip;

/// Skip-gram model with two embedding tables of shape `(number_of_words, vector_size)`.
///
/// A batch entry `(w, c)` scores `word_table[w] · context_table[c]`. Scores are
/// normalized with a softmax inside each group and compared against the
/// target `[1, 0, .., 0]` with a squared error.
#[derive(Debug, Clone)]
pub struct SkipGram {
    word_table: Array2<f32>,
    context_table: Array2<f32>,
}

/// Partial derivatives of the loss for one batch, row by row.
///
/// `d_word[i]` is the derivative with respect to `word_table[words[i]]`,
/// `d_context[i]` with respect to `context_table[contexts[i]]`. A row index
/// can repeat; the dense gradient is the sum of its rows.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub words: Vec<usize>,
    pub contexts: Vec<usize>,
    pub d_word: Array2<f32>,
    pub d_context: Array2<f32>,
}

impl Gradients {

    /// Sum the rows into dense `(number_of_words, vector_size)` matrices.
    #[cfg(test)]
    pub fn to_dense(&self, number_of_words: usize) -> (Array2<f32>, Array2<f32>) {
        let vector_size = self.d_word.dim().1;
        let mut d_word = Array2::zeros((number_of_words, vector_size));
        let mut d_context = Array2::zeros((number_of_words, vector_size));
        for (ll, (ii, jj)) in zip(&self.words, &self.contexts).enumerate() {
            d_word.row_mut(*ii).scaled_add(1.0, &self.d_word.row(ll));
            d_context.row_mut(*jj).scaled_add(1.0, &self.d_context.row(ll));
        }
        (d_word, d_context)
    }
}

/// Applies gradients to the model tables.
pub trait Minimizer {
    fn step(&mut self, model: &mut SkipGram, gradients: &Gradients);
}

/// Plain gradient descent, `table -= learning_rate * gradient`.
#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    pub learning_rate: f32,
}

impl Minimizer for GradientDescent {
    fn step(&mut self, model: &mut SkipGram, gradients: &Gradients) {
        let (word_table, context_table) = model.tables_mut();

        // update by index, a row shared by several entries gets every contribution
        for (ll, (ii, jj)) in zip(&gradients.words, &gradients.contexts).enumerate() {
            word_table.row_mut(*ii).scaled_add(-self.learning_rate, &gradients.d_word.row(ll));
            context_table.row_mut(*jj).scaled_add(-self.learning_rate, &gradients.d_context.row(ll));
        }
    }
}

/// The squared error between grouped softmax outputs and `[1, 0, .., 0]`.
#[derive(Debug, Clone, Copy)]
pub struct SoftmaxSquaredError;

impl SoftmaxSquaredError {

    /// `[1, 0, .., 0]` of length `group_size`.
    pub fn target(group_size: usize) -> Array1<f32> {
        let mut target = Array1::zeros(group_size);
        if group_size > 0 {
            target[0] = 1.0;
        }
        target
    }

    /// Sum of squared differences over every group and position.
    pub fn loss(&self, probabilities: ArrayView2<'_, f32>) -> f32 {
        let target = Self::target(probabilities.dim().1);
        (&probabilities - &target).mapv(|x| x.powi(2)).sum()
    }

    /// ∂loss/∂scores, given the softmax outputs of the scores.
    pub fn deriv(&self, probabilities: ArrayView2<'_, f32>) -> Array2<f32> {
        let target = Self::target(probabilities.dim().1);
        let dp = 2.0 * (&probabilities - &target);

        // softmax backward pass, per row:
        //     ds[j] = p[j] * (dp[j] - sum(p[k] * dp[k] for k))
        let weighted = (&dp * &probabilities).sum_axis(Axis(1)).insert_axis(Axis(1));
        &probabilities * &(&dp - &weighted)
    }
}

/// Softmax of each row.
pub fn softmax_rows(mut x: Array2<f32>) -> Array2<f32> {
    for mut row in x.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    x
}

impl SkipGram {

    /// Both tables are drawn from a standard normal distribution.
    pub fn new<G: Rng>(number_of_words: usize, vector_size: usize, rng: &mut G) -> SkipGram {
        let word_table = Array::random_using((number_of_words, vector_size), StandardNormal, rng);
        let context_table = Array::random_using((number_of_words, vector_size), StandardNormal, rng);
        SkipGram {
            word_table,
            context_table,
        }
    }

    pub fn from_tables(word_table: Array2<f32>, context_table: Array2<f32>) -> Result<SkipGram> {
        if word_table.dim() != context_table.dim() {
            return Err(Error::Config(format!(
                "word table {:?} and context table {:?} differ in shape",
                word_table.dim(),
                context_table.dim()
            )));
        }
        Ok(SkipGram {
            word_table,
            context_table,
        })
    }

    pub fn number_of_words(&self) -> usize {
        self.word_table.dim().0
    }

    pub fn vector_size(&self) -> usize {
        self.word_table.dim().1
    }

    pub fn word_table(&self) -> ArrayView2<'_, f32> {
        self.word_table.view()
    }

    pub fn context_table(&self) -> ArrayView2<'_, f32> {
        self.context_table.view()
    }

    pub fn tables_mut(&mut self) -> (&mut Array2<f32>, &mut Array2<f32>) {
        (&mut self.word_table, &mut self.context_table)
    }

    /// Raw score of every batch entry.
    pub fn scores(&self, batch: &Batch) -> Array1<f32> {
        zip(&batch.words, &batch.contexts)
            .map(|(w, c)| self.word_table.row(*w).dot(&self.context_table.row(*c)))
            .collect()
    }

    /// Softmax outputs, one row per group, shape `(num_groups, group_size)`.
    pub fn group_probabilities(&self, batch: &Batch) -> Result<Array2<f32>> {
        let scores = self.scores(batch).into_shape((batch.num_groups(), batch.group_size))?;
        Ok(softmax_rows(scores))
    }

    pub fn loss(&self, batch: &Batch) -> Result<f32> {
        let probabilities = self.group_probabilities(batch)?;
        Ok(SoftmaxSquaredError.loss(probabilities.view()))
    }

    /// Loss and gradients of one batch, both computed from the current tables.
    pub fn gradients(&self, batch: &Batch) -> Result<(f32, Gradients)> {
        let probabilities = self.group_probabilities(batch)?;
        let loss = SoftmaxSquaredError.loss(probabilities.view());

        // ds is of shape (batch len, 1) after flattening the groups
        let ds = SoftmaxSquaredError
            .deriv(probabilities.view())
            .into_shape((batch.len(), 1))?;

        // d_word is (batch len, vector_size), row i is ds[i] * context vector i
        let v_word: Array2<f32> = self.word_table.select(Axis(0), &batch.words);
        let v_context: Array2<f32> = self.context_table.select(Axis(0), &batch.contexts);
        let d_word = &v_context * &ds;
        let d_context = &v_word * &ds;

        Ok((
            loss,
            Gradients {
                words: batch.words.clone(),
                contexts: batch.contexts.clone(),
                d_word,
                d_context,
            },
        ))
    }

    /// One minimization step. Returns the loss before the update.
    pub fn train_batch<M: Minimizer>(&mut self, batch: &Batch, minimizer: &mut M) -> Result<f32> {
        let (loss, gradients) = self.gradients(batch)?;
        minimizer.step(self, &gradients);
        Ok(loss)
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_model(number_of_words: usize, vector_size: usize, seed: u64) -> SkipGram {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shape = (number_of_words, vector_size);
        SkipGram::from_tables(
            Array::random_using(shape, Uniform::new(-1.0, 1.0), &mut rng),
            Array::random_using(shape, Uniform::new(-1.0, 1.0), &mut rng),
        )
        .unwrap()
    }

    fn batch(words: Vec<usize>, contexts: Vec<usize>, group_size: usize) -> Batch {
        Batch { words, contexts, group_size }
    }

    #[test]
    fn init_test() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let model = SkipGram::new(7, 4, &mut rng);
        assert_eq!(model.word_table().dim(), (7, 4));
        assert_eq!(model.context_table().dim(), (7, 4));
        assert_ne!(model.word_table(), model.context_table());

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let again = SkipGram::new(7, 4, &mut rng);
        assert_eq!(model.word_table(), again.word_table());

        let bad = SkipGram::from_tables(Array2::zeros((3, 2)), Array2::zeros((3, 4)));
        assert!(matches!(bad, Err(Error::Config(_))));
    }

    #[test]
    fn scores_test() {
        let word_table = array![[1.0, 2.0], [0.0, -1.0]];
        let context_table = array![[3.0, 1.0], [2.0, 2.0]];
        let model = SkipGram::from_tables(word_table, context_table).unwrap();

        let b = batch(vec![0, 0, 1, 1], vec![0, 1, 1, 0], 2);
        assert_eq!(model.scores(&b), array![5.0f32, 6.0, -2.0, -1.0]);

        let p = model.group_probabilities(&b).unwrap();
        assert_eq!(p.dim(), (2, 2));
        for row in p.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
        // the second candidate of the first group scores higher
        assert!(p[[0, 1]] > p[[0, 0]]);
    }

    #[test]
    fn softmax_rows_test() {
        let p = softmax_rows(array![[0.0, 0.0], [1000.0, 0.0], [1.0, 2.0]]);
        assert_eq!(p.row(0), array![0.5f32, 0.5]);
        assert_eq!(p.row(1), array![1.0f32, 0.0]);
        let e = 1.0f32.exp();
        assert!((p[[2, 0]] - 1.0 / (1.0 + e)).abs() < 1e-6);
    }

    #[test]
    fn loss_test() {
        let target = SoftmaxSquaredError::target(3);
        assert_eq!(target, array![1.0f32, 0.0, 0.0]);

        // exact target, zero loss
        let exact = array![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert_eq!(SoftmaxSquaredError.loss(exact.view()), 0.0);

        let uniform = array![[0.5, 0.5], [0.25, 0.75]];
        let expected = 0.25 + 0.25 + 0.5625 + 0.5625;
        assert!((SoftmaxSquaredError.loss(uniform.view()) - expected).abs() < 1e-6);
    }

    #[test]
    fn loss_zero_when_positive_dominates_test() {
        // scores 200 and -200, the softmax saturates to [1, 0] exactly
        let model = SkipGram::from_tables(array![[1.0], [0.0]], array![[200.0], [-200.0]]).unwrap();
        let b = batch(vec![0, 0], vec![0, 1], 2);
        assert_eq!(model.loss(&b).unwrap(), 0.0);

        // and the other way round the loss is maximal, 1 + 1
        let b = batch(vec![0, 0], vec![1, 0], 2);
        assert!((model.loss(&b).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn single_candidate_groups_test() {
        // with no negatives each group is one entry and the softmax is always 1
        let model = random_model(5, 3, 1);
        let b = batch(vec![0, 3, 4], vec![1, 2, 2], 1);
        assert_eq!(model.loss(&b).unwrap(), 0.0);
        let (_, gradients) = model.gradients(&b).unwrap();
        assert!(gradients.d_word.iter().all(|x| *x == 0.0));
        assert!(gradients.d_context.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn loss_non_negative_test() {
        let model = random_model(10, 4, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..20 {
            let mut b = Batch::with_capacity(4, 3);
            for _ in 0..4 {
                let (w, c) = (rng.gen_range(0..10), rng.gen_range(0..10));
                b.push_group(w, c, 10, &mut rng);
            }
            assert!(model.loss(&b).unwrap() >= 0.0);
        }
    }

    #[test]
    fn gradients_match_finite_differences_test() {
        let number_of_words = 4;
        let mut model = random_model(number_of_words, 3, 17);
        // duplicated rows on both sides, and a negative equal to the positive
        let b = batch(
            vec![0, 0, 0, 2, 2, 2, 0, 0, 0],
            vec![1, 3, 1, 2, 0, 3, 3, 0, 2],
            3,
        );

        let (_, gradients) = model.gradients(&b).unwrap();
        let (d_word, d_context) = gradients.to_dense(number_of_words);

        let h = 0.01;
        let error_limit = 0.05;

        fn err(claimed: f32, measured: f32) -> f32 {
            let d = measured.abs().max(0.01);
            (claimed - measured).abs() / d
        }

        for table in 0..2 {
            for i in 0..number_of_words {
                for j in 0..3 {
                    let saved = model.entry(table, i, j);
                    model.set_entry(table, i, j, saved - h);
                    let minus = model.loss(&b).unwrap();
                    model.set_entry(table, i, j, saved + h);
                    let plus = model.loss(&b).unwrap();
                    model.set_entry(table, i, j, saved);

                    let measured = (plus - minus) / (2.0 * h);
                    let claimed = if table == 0 { d_word[[i, j]] } else { d_context[[i, j]] };
                    let error = err(claimed, measured);
                    assert!(
                        error <= error_limit,
                        "table {table} entry ({i}, {j}) computed derivative = {claimed}, measured = {measured}, error = {error}"
                    );
                }
            }
        }
    }

    #[test]
    fn descent_lowers_loss_test() {
        let mut model = random_model(6, 4, 23);
        let b = batch(vec![1, 1, 1, 4, 4, 4], vec![2, 0, 5, 3, 1, 1], 3);
        let mut minimizer = GradientDescent { learning_rate: 0.05 };

        let before = model.loss(&b).unwrap();
        let reported = model.train_batch(&b, &mut minimizer).unwrap();
        let after = model.loss(&b).unwrap();
        assert_eq!(reported, before);
        assert!(after < before, "loss went from {before} to {after}");

        for _ in 0..200 {
            model.train_batch(&b, &mut minimizer).unwrap();
        }
        assert!(model.loss(&b).unwrap() < after);
    }

    #[test]
    fn untouched_rows_stay_test() {
        let mut model = random_model(6, 2, 31);
        let before = model.clone();
        let b = batch(vec![0, 0], vec![1, 2], 2);
        model.train_batch(&b, &mut GradientDescent { learning_rate: 0.5 }).unwrap();

        for i in 1..6 {
            assert_eq!(model.word_table().row(i), before.word_table().row(i));
        }
        for i in [0, 3, 4, 5] {
            assert_eq!(model.context_table().row(i), before.context_table().row(i));
        }
    }

    impl SkipGram {
        fn entry(&mut self, table: usize, i: usize, j: usize) -> f32 {
            let (w, c) = self.tables_mut();
            if table == 0 { w[[i, j]] } else { c[[i, j]] }
        }

        fn set_entry(&mut self, table: usize, i: usize, j: usize, value: f32) {
            let (w, c) = self.tables_mut();
            if table == 0 { w[[i, j]] = value } else { c[[i, j]] = value }
        }
    }
}
