use crate::error::{Error, Result};
use std::collections::HashMap;

/// Surface form of the sentinel that owns raw id 0.
pub const UNKNOWN: &str = "__UNKNOWN__";

/// Bidirectional mapping between words and dense raw ids.
///
/// Id 0 is always [`UNKNOWN`]; the remaining ids follow the order of the
/// word list, most frequent first. Built once and never modified.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    i2t: Vec<String>,
    t2i: HashMap<String, usize>,
}

impl Vocabulary {

    /// Assign ids `1..=min(max_words, len(source))` to the words of `source`
    /// in order. A blank entry ends the list early.
    pub fn load<I, S>(source: I, max_words: usize) -> Vocabulary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut i2t = vec![UNKNOWN.to_string()];
        let mut t2i = HashMap::new();
        t2i.insert(UNKNOWN.to_string(), 0);

        for word in source.into_iter().take(max_words) {
            let word = word.as_ref();
            if word.is_empty() {
                break;
            }
            // a repeated line keeps its first id, the bijection must hold
            if t2i.contains_key(word) {
                continue;
            }
            t2i.insert(word.to_owned(), i2t.len());
            i2t.push(word.to_owned());
        }

        Vocabulary { i2t, t2i }
    }

    /// Number of ids, including [`UNKNOWN`].
    pub fn len(&self) -> usize {
        self.i2t.len()
    }

    pub fn is_empty(&self) -> bool {
        // the sentinel is always present
        false
    }

    pub fn index_of(&self, word: &str) -> Result<usize> {
        self.t2i
            .get(word)
            .copied()
            .ok_or_else(|| Error::Lookup(word.to_owned()))
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.i2t.get(index).map(|w| w.as_str())
    }
}

/// The offset between raw vocabulary ids and rows of the embedding tables.
///
/// Raw ids `0..=number_of_stop_words` (the sentinel and the stop words) have
/// no row; raw id `number_of_stop_words + 1` is row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpace {
    offset: usize,
    number_of_words: usize,
}

impl IndexSpace {

    /// Fails when no trainable word remains after removing the sentinel and
    /// the stop words.
    pub fn new(vocab_size: usize, number_of_stop_words: usize) -> Result<IndexSpace> {
        let offset = number_of_stop_words + 1;
        if vocab_size <= offset {
            return Err(Error::Config(format!(
                "vocabulary of {} ids leaves no trainable words after {} stop words",
                vocab_size, number_of_stop_words
            )));
        }
        Ok(IndexSpace {
            offset,
            number_of_words: vocab_size - offset,
        })
    }

    /// Number of rows of each embedding table.
    pub fn number_of_words(&self) -> usize {
        self.number_of_words
    }

    /// Row of a raw id, `None` for the sentinel, stop words and ids past the vocabulary.
    pub fn model_index(&self, raw: usize) -> Option<usize> {
        raw.checked_sub(self.offset)
            .filter(|&i| i < self.number_of_words)
    }

    pub fn word_index(&self, model: usize) -> usize {
        model + self.offset
    }

    /// Like [`IndexSpace::model_index`], for ids read from the pair source.
    pub fn checked_model_index(&self, raw: usize) -> Result<usize> {
        self.model_index(raw).ok_or(Error::IndexOutOfRange {
            raw,
            first: self.offset,
            end: self.offset + self.number_of_words,
        })
    }
}
