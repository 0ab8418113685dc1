//! Seed data: the built-in question pool and exam catalog that make the
//! service useful without any external configuration.

use crate::domain::{ExamDefinition, Question, QuestionSource};

/// Built-in question pool. Small on purpose; a deployment supplies a real
/// bank via QUESTION_BANK_PATH.
pub fn seed_questions() -> Vec<Question> {
  vec![
    Question {
      id: "q1".into(),
      prompt: "What is the solution to the equation 2x + 5 = 13?".into(),
      options: vec!["x = 3".into(), "x = 4".into(), "x = 5".into(), "x = 6".into()],
      correct_answer: 1,
      explanation: "Subtract 5 from both sides: 2x = 8. Then divide by 2: x = 4.".into(),
      topic: "Algebra".into(),
      difficulty: "Medium".into(),
      source: QuestionSource::Seed,
    },
    Question {
      id: "q2".into(),
      prompt: "In a right triangle, if one angle is 30°, what is the measure of the other acute angle?".into(),
      options: vec!["30°".into(), "45°".into(), "60°".into(), "90°".into()],
      correct_answer: 2,
      explanation: "In a right triangle, the sum of the two acute angles is 90°. If one is 30°, the other must be 60°.".into(),
      topic: "Geometry".into(),
      difficulty: "Easy".into(),
      source: QuestionSource::Seed,
    },
    Question {
      id: "q3".into(),
      prompt: "What is the value of sin(90°)?".into(),
      options: vec!["0".into(), "0.5".into(), "1".into(), "Undefined".into()],
      correct_answer: 2,
      explanation: "sin(90°) = 1, as the sine of 90 degrees is 1.".into(),
      topic: "Trigonometry".into(),
      difficulty: "Medium".into(),
      source: QuestionSource::Seed,
    },
    Question {
      id: "q4".into(),
      prompt: "Solve for x: x² - 4x + 4 = 0".into(),
      options: vec!["x = 2".into(), "x = -2".into(), "x = 2 or x = -2".into(), "x = 0".into()],
      correct_answer: 0,
      explanation: "This is a perfect square: (x - 2)² = 0, so x = 2.".into(),
      topic: "Algebra".into(),
      difficulty: "Hard".into(),
      source: QuestionSource::Seed,
    },
    Question {
      id: "q5".into(),
      prompt: "What is the area of a circle with radius 5 units?".into(),
      options: vec!["25π".into(), "50π".into(), "75π".into(), "100π".into()],
      correct_answer: 0,
      explanation: "Area = πr² = π(5)² = 25π square units.".into(),
      topic: "Geometry".into(),
      difficulty: "Medium".into(),
      source: QuestionSource::Seed,
    },
  ]
}

/// Built-in exam catalog for the timed-exam browser.
pub fn seed_exams() -> Vec<ExamDefinition> {
  vec![
    ExamDefinition {
      id: "e1".into(),
      title: "Mathematics Practice Exam".into(),
      description: "Comprehensive test covering Algebra, Geometry, and Trigonometry".into(),
      duration_mins: 60,
      question_count: 50,
      difficulty: "Mixed".into(),
      topics: vec!["Algebra".into(), "Geometry".into(), "Trigonometry".into()],
    },
    ExamDefinition {
      id: "e2".into(),
      title: "Algebra Focus Test".into(),
      description: "Deep dive into algebraic concepts and problem solving".into(),
      duration_mins: 45,
      question_count: 30,
      difficulty: "Medium".into(),
      topics: vec!["Linear Equations".into(), "Quadratic Functions".into(), "Systems of Equations".into()],
    },
    ExamDefinition {
      id: "e3".into(),
      title: "Geometry Mastery Test".into(),
      description: "Test your knowledge of geometric principles and theorems".into(),
      duration_mins: 40,
      question_count: 25,
      difficulty: "Hard".into(),
      topics: vec!["Triangles".into(), "Circles".into(), "Polygons".into(), "Coordinate Geometry".into()],
    },
    ExamDefinition {
      id: "e4".into(),
      title: "Trigonometry Challenge".into(),
      description: "Advanced trigonometric functions and identities".into(),
      duration_mins: 35,
      question_count: 20,
      difficulty: "Hard".into(),
      topics: vec!["Sine and Cosine".into(), "Tangent".into(), "Identities".into(), "Applications".into()],
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seed_pool_is_valid_and_nonempty() {
    let qs = seed_questions();
    assert!(!qs.is_empty());
    for q in &qs {
      q.validate().unwrap();
    }
  }

  #[test]
  fn seed_ids_are_unique() {
    let qs = seed_questions();
    let mut ids: Vec<&str> = qs.iter().map(|q| q.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), qs.len());
  }
}
