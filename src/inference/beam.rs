//! Bounded beam-search decoding.
//!
//! The search only needs next-token log-probabilities for a batch of
//! prefixes, supplied by a [`StepScorer`]. Every prefix starts with the
//! decoder start token; the returned sequence excludes it and the final EOS.

use super::{GenerationError, GenerationOptions, GenerationResult};

/// Source of next-token log-probabilities.
pub trait StepScorer {
    /// Return one row of vocabulary log-probabilities per prefix, in order.
    fn next_log_probs(&mut self, prefixes: &[Vec<u32>]) -> GenerationResult<Vec<Vec<f32>>>;
}

impl<F> StepScorer for F
where
    F: FnMut(&[Vec<u32>]) -> GenerationResult<Vec<Vec<f32>>>,
{
    fn next_log_probs(&mut self, prefixes: &[Vec<u32>]) -> GenerationResult<Vec<Vec<f32>>> {
        self(prefixes)
    }
}

#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

/// Best `capacity` finished hypotheses, ranked by length-normalized score.
#[derive(Debug)]
struct Finished {
    capacity: usize,
    length_penalty: f32,
    hyps: Vec<(f32, Vec<u32>)>,
}

impl Finished {
    fn new(capacity: usize, length_penalty: f32) -> Self {
        Self {
            capacity,
            length_penalty,
            hyps: Vec::with_capacity(capacity + 1),
        }
    }

    fn normalize(&self, sum_log_probs: f32, generated_len: usize) -> f32 {
        sum_log_probs / (generated_len.max(1) as f32).powf(self.length_penalty)
    }

    fn worst(&self) -> f32 {
        self.hyps
            .iter()
            .map(|(score, _)| *score)
            .fold(f32::INFINITY, f32::min)
    }

    /// `tokens` includes the start token.
    fn add(&mut self, tokens: Vec<u32>, sum_log_probs: f32) {
        let score = self.normalize(sum_log_probs, tokens.len().saturating_sub(1));
        if self.hyps.len() < self.capacity || score > self.worst() {
            self.hyps.push((score, tokens));
            if self.hyps.len() > self.capacity {
                if let Some(worst) = self
                    .hyps
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1 .0.total_cmp(&b.1 .0))
                    .map(|(i, _)| i)
                {
                    self.hyps.remove(worst);
                }
            }
        }
    }

    fn is_done(&self, best_live: Option<f32>, generated_len: usize, early_stopping: bool) -> bool {
        if self.hyps.len() < self.capacity {
            return false;
        }
        if early_stopping {
            return true;
        }
        match best_live {
            Some(sum) => self.normalize(sum, generated_len) <= self.worst(),
            None => true,
        }
    }

    fn into_best(self) -> Option<Vec<u32>> {
        self.hyps
            .into_iter()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, tokens)| tokens)
    }
}

/// Beam-search decoder configuration.
#[derive(Debug, Clone)]
pub struct BeamSearch {
    options: GenerationOptions,
    start_token: u32,
    eos_token: u32,
}

impl BeamSearch {
    pub fn new(options: GenerationOptions, start_token: u32, eos_token: u32) -> Self {
        Self {
            options,
            start_token,
            eos_token,
        }
    }

    /// Decode the highest scoring sequence.
    pub fn run<S: StepScorer + ?Sized>(&self, scorer: &mut S) -> GenerationResult<Vec<u32>> {
        self.options.validate()?;

        let num_beams = self.options.num_beams;
        let width = 2 * num_beams;
        let mut finished = Finished::new(num_beams, self.options.length_penalty);
        let mut live = vec![Beam {
            tokens: vec![self.start_token],
            score: 0.0,
        }];

        for step in 1..self.options.max_length {
            let prefixes: Vec<Vec<u32>> = live.iter().map(|b| b.tokens.clone()).collect();
            let rows = scorer.next_log_probs(&prefixes)?;
            if rows.len() != prefixes.len() {
                return Err(GenerationError::ScorerShape {
                    expected: prefixes.len(),
                    got: rows.len(),
                });
            }

            let mut candidates: Vec<(f32, usize, u32)> = Vec::with_capacity(width * live.len());
            for (parent, (beam, row)) in live.iter().zip(&rows).enumerate() {
                for (token, log_prob) in top_k(row, width) {
                    candidates.push((beam.score + log_prob, parent, token));
                }
            }
            candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
            candidates.truncate(width);

            let mut next = Vec::with_capacity(num_beams);
            for (rank, (score, parent, token)) in candidates.into_iter().enumerate() {
                let mut tokens = live[parent].tokens.clone();
                tokens.push(token);

                if token == self.eos_token {
                    // EOS candidates outside the top `num_beams` are dropped.
                    if rank < num_beams {
                        finished.add(tokens, score);
                    }
                } else {
                    next.push(Beam { tokens, score });
                }

                if next.len() == num_beams {
                    break;
                }
            }

            let best_live = next.first().map(|b| b.score);
            let done = finished.is_done(best_live, step, self.options.early_stopping);
            live = next;
            if done {
                live.clear();
                break;
            }
            if live.is_empty() {
                break;
            }
        }

        for beam in live {
            finished.add(beam.tokens, beam.score);
        }

        let mut best = finished
            .into_best()
            .ok_or_else(|| GenerationError::Other("beam search produced no hypothesis".to_string()))?;

        if best.last() == Some(&self.eos_token) {
            best.pop();
        }
        best.remove(0);
        Ok(best)
    }
}

/// Indices and values of the `k` largest entries, unordered.
fn top_k(row: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indices: Vec<usize> = (0..row.len()).collect();
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |a, b| row[*b].total_cmp(&row[*a]));
        indices.truncate(k);
    }
    indices.into_iter().map(|i| (i as u32, row[i])).collect()
}
