/// Challenge session: the two-step quiz opened by a station.
///
///   1. **Sequence**: the station's facts in shuffled order. Any choice
///      advances; the pick is not graded.
///   2. **TrueFalse**: a statement built from the key fact. The expected
///      answer is always `true`, and either reply finishes the session.
///
/// Shuffling is Fisher–Yates over the simulation's seeded RNG, so a fixed
/// seed always yields the same option order.

use rand::seq::SliceRandom;
use rand::Rng;

use super::entity::{ChallengeAnswer, Station};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ChallengeStep {
    Sequence { prompt: String, options: Vec<String> },
    TrueFalse { prompt: String, expected_answer: bool },
}

/// What an answer did to the session.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    /// Answer did not fit the current step (wrong kind or bad index).
    Ignored,
    Advanced,
    /// True/false answered: the session is over.
    Finished { correct: bool },
}

#[derive(Clone, Debug)]
pub struct ChallengeSession {
    pub station_id: u32,
    pub steps: Vec<ChallengeStep>,
    index: usize,
}

impl ChallengeSession {
    pub fn for_station<R: Rng + ?Sized>(station: &Station, rng: &mut R) -> Self {
        let mut options = station.facts.clone();
        options.shuffle(rng);

        let key_fact = station.facts.first().cloned().unwrap_or_default();
        let steps = vec![
            ChallengeStep::Sequence {
                prompt: format!("{}: which of these did you discover?", station.title),
                options,
            },
            ChallengeStep::TrueFalse {
                prompt: format!("True or false? {}", key_fact),
                expected_answer: true,
            },
        ];

        ChallengeSession { station_id: station.id, steps, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &ChallengeStep {
        &self.steps[self.index]
    }

    /// Feed one answer. The index never leaves `[0, steps.len())`.
    pub fn answer(&mut self, answer: ChallengeAnswer) -> StepOutcome {
        match (self.current(), answer) {
            (ChallengeStep::Sequence { options, .. }, ChallengeAnswer::Choice(i)) => {
                if i >= options.len() && !options.is_empty() {
                    return StepOutcome::Ignored;
                }
                if self.index + 1 < self.steps.len() {
                    self.index += 1;
                    StepOutcome::Advanced
                } else {
                    StepOutcome::Finished { correct: true }
                }
            }
            (ChallengeStep::TrueFalse { expected_answer, .. }, ChallengeAnswer::TrueFalse(v)) => {
                StepOutcome::Finished { correct: v == *expected_answer }
            }
            _ => StepOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Rect, Route};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn station() -> Station {
        Station::new(3, "Geology", Rect::new(0.0, 0.0, 10.0, 10.0), Route::High,
            &["Basalt covers the plains", "Olivine sand", "Iron oxide dust", "Ancient deltas"])
    }

    fn options(s: &ChallengeSession) -> Vec<String> {
        match &s.steps[0] {
            ChallengeStep::Sequence { options, .. } => options.clone(),
            other => panic!("unexpected first step {:?}", other),
        }
    }

    #[test]
    fn two_steps_sequence_then_true_false() {
        let mut rng = Pcg32::seed_from_u64(1);
        let s = ChallengeSession::for_station(&station(), &mut rng);
        assert_eq!(s.station_id, 3);
        assert_eq!(s.steps.len(), 2);
        assert!(matches!(s.steps[0], ChallengeStep::Sequence { .. }));
        assert_eq!(s.steps[1], ChallengeStep::TrueFalse {
            prompt: "True or false? Basalt covers the plains".into(),
            expected_answer: true,
        });
    }

    #[test]
    fn options_are_a_permutation_of_facts() {
        let mut rng = Pcg32::seed_from_u64(99);
        let s = ChallengeSession::for_station(&station(), &mut rng);
        let mut got = options(&s);
        got.sort();
        let mut want = station().facts;
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn same_seed_same_order() {
        let a = ChallengeSession::for_station(&station(), &mut Pcg32::seed_from_u64(42));
        let b = ChallengeSession::for_station(&station(), &mut Pcg32::seed_from_u64(42));
        assert_eq!(options(&a), options(&b));
    }

    #[test]
    fn any_choice_advances_then_either_answer_finishes() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut s = ChallengeSession::for_station(&station(), &mut rng);
        assert_eq!(s.answer(ChallengeAnswer::TrueFalse(true)), StepOutcome::Ignored);
        assert_eq!(s.answer(ChallengeAnswer::Choice(9)), StepOutcome::Ignored);
        assert_eq!(s.index(), 0);
        assert_eq!(s.answer(ChallengeAnswer::Choice(3)), StepOutcome::Advanced);
        assert_eq!(s.index(), 1);
        assert_eq!(s.answer(ChallengeAnswer::Choice(0)), StepOutcome::Ignored);

        let mut t = s.clone();
        assert_eq!(s.answer(ChallengeAnswer::TrueFalse(true)), StepOutcome::Finished { correct: true });
        assert_eq!(t.answer(ChallengeAnswer::TrueFalse(false)), StepOutcome::Finished { correct: false });
        assert_eq!(s.index(), 1);
    }
}
