//! Multiple-choice quiz sessions
//!
//! A quiz asks for the translation of randomly drawn terms. The final
//! correct count is credited through `ProgressState::complete_quiz`.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{Catalog, Term};
use crate::progress::transitions::QUIZ_QUESTIONS;

/// Answer options shown per question, including the correct one
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Source term shown to the user
    pub prompt: String,
    pub answer: String,
    /// Shuffled options, always containing `answer`
    pub options: Vec<String>,
}

impl Question {
    fn build<R: Rng + ?Sized>(target: &Term, catalog: &Catalog, rng: &mut R) -> Self {
        let mut distractors: Vec<&str> = catalog
            .iter()
            .filter(|t| t.id() != target.id() && t.target != target.target)
            .map(|t| t.target.as_str())
            .collect();
        distractors.sort_unstable();
        distractors.dedup();
        distractors.shuffle(rng);

        let mut options: Vec<String> = distractors
            .into_iter()
            .take(OPTIONS_PER_QUESTION - 1)
            .map(str::to_string)
            .collect();
        options.push(target.target.clone());
        options.shuffle(rng);

        Self {
            prompt: target.source.clone(),
            answer: target.target.clone(),
            options,
        }
    }
}

/// An in-progress quiz
#[derive(Debug, Clone)]
pub struct Quiz {
    questions: Vec<Question>,
    results: Vec<bool>,
}

impl Quiz {
    /// Draw a full quiz; None for an empty catalog
    pub fn generate<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Option<Self> {
        if catalog.is_empty() {
            return None;
        }

        let mut questions = Vec::with_capacity(QUIZ_QUESTIONS as usize);
        for _ in 0..QUIZ_QUESTIONS {
            if let Some(term) = catalog.terms().choose(rng) {
                questions.push(Question::build(term, catalog, rng));
            }
        }

        Some(Self {
            questions,
            results: Vec::new(),
        })
    }

    /// The question awaiting an answer
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.results.len())
    }

    /// Answer the current question; None once the quiz is finished
    pub fn answer(&mut self, choice: &str) -> Option<bool> {
        let correct = self.current()?.answer == choice;
        self.results.push(correct);
        Some(correct)
    }

    pub fn is_finished(&self) -> bool {
        self.results.len() >= self.questions.len()
    }

    pub fn correct_count(&self) -> u32 {
        self.results.iter().filter(|&&ok| ok).count() as u32
    }

    /// (answered, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.results.len(), self.questions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_full_quiz() {
        let catalog = Catalog::builtin();
        let quiz = Quiz::generate(&catalog, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(quiz.progress(), (0, QUIZ_QUESTIONS as usize));
        let q = quiz.current().unwrap();
        assert_eq!(q.options.len(), OPTIONS_PER_QUESTION);
        assert!(q.options.contains(&q.answer));
        assert_eq!(catalog.find(&q.prompt).unwrap().target, q.answer);
    }

    #[test]
    fn test_small_catalog_has_fewer_options() {
        let catalog = Catalog::parse("A|a;B|b");
        let quiz = Quiz::generate(&catalog, &mut StdRng::seed_from_u64(3)).unwrap();
        let q = quiz.current().unwrap();
        assert_eq!(q.options.len(), 2);
    }

    #[test]
    fn test_empty_catalog_has_no_quiz() {
        assert!(Quiz::generate(&Catalog::default(), &mut StdRng::seed_from_u64(0)).is_none());
    }

    #[test]
    fn test_answering_counts_and_finishes() {
        let catalog = Catalog::builtin();
        let mut quiz = Quiz::generate(&catalog, &mut StdRng::seed_from_u64(9)).unwrap();

        let mut answered = 0;
        while let Some(q) = quiz.current().cloned() {
            let choice = if answered % 2 == 0 { q.answer.clone() } else { "wrong".to_string() };
            quiz.answer(&choice).unwrap();
            answered += 1;
        }

        assert!(quiz.is_finished());
        assert_eq!(quiz.correct_count(), 10);
        assert_eq!(quiz.answer("late"), None);
    }
}
