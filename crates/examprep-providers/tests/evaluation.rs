//! Answer evaluation through the mock grader.

use std::sync::Arc;

use examprep_core::error::EvaluationError;
use examprep_core::evaluation::{GRADING_MAX_TOKENS, SYSTEM_INSTRUCTION};
use examprep_core::model::{McqBody, Question, QuestionBody, RecordId, StructuralBody};
use examprep_core::AnswerEvaluator;
use examprep_providers::mock::MockGrader;

fn structural_question() -> Question {
    Question {
        id: RecordId::Int(3),
        topic_id: RecordId::Int(5),
        question_type_id: RecordId::Int(1),
        text: "Explain why leaves are green.".into(),
        image_url: None,
        body: QuestionBody::Structural(StructuralBody {
            model_answer: "Chlorophyll reflects green light.".into(),
            mark_allocation: 5,
            explanation: None,
            diagram: None,
        }),
    }
}

#[tokio::test]
async fn evaluates_and_parses_reply() {
    let grader = Arc::new(MockGrader::with_fixed_reply(
        "You've earned 4 out of 5 marks. Good attempt but missed X.\n\nConsider adding Y next time.",
    ));
    let evaluator = AnswerEvaluator::new(grader.clone());

    let result = evaluator
        .evaluate_answer("Q", "Model", "Mine", 5)
        .await
        .unwrap();

    assert_eq!(result.score, 4);
    assert_eq!(
        result.explanation,
        "You've earned 4 out of 5 marks. Good attempt but missed X."
    );
    assert_eq!(result.suggestions, "Consider adding Y next time.");

    let request = grader.last_request().unwrap();
    assert_eq!(request.system_prompt, SYSTEM_INSTRUCTION);
    assert_eq!(request.temperature, 0.5);
    assert_eq!(request.max_tokens, GRADING_MAX_TOKENS);
    assert!(request.prompt.contains("Student's Answer: Mine"));
}

#[tokio::test]
async fn unscored_reply_is_still_a_result() {
    let grader = Arc::new(MockGrader::with_fixed_reply("A fair try, three points."));
    let evaluator = AnswerEvaluator::new(grader);

    let result = evaluator
        .evaluate_answer("Q", "Model", "Mine", 5)
        .await
        .unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.explanation, "A fair try, three points.");
    assert_eq!(result.suggestions, "");
}

#[tokio::test]
async fn missing_inputs_never_reach_the_grader() {
    let grader = Arc::new(MockGrader::with_fixed_reply("unused"));
    let evaluator = AnswerEvaluator::new(grader.clone());

    let err = evaluator
        .evaluate_answer("Q", "", "   ", 0)
        .await
        .unwrap_err();

    match err {
        EvaluationError::Validation(missing) => {
            assert!(missing.contains("model answer"));
            assert!(missing.contains("user answer"));
            assert!(missing.contains("mark allocation"));
            assert!(!missing.contains("question,"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(grader.call_count(), 0);
}

#[tokio::test]
async fn remote_errors_are_surfaced_once() {
    let grader = Arc::new(MockGrader::with_remote_error(503, "overloaded"));
    let evaluator = AnswerEvaluator::new(grader.clone());

    let err = evaluator
        .evaluate_answer("Q", "Model", "Mine", 5)
        .await
        .unwrap_err();

    assert!(matches!(err, EvaluationError::Remote { status: 503, .. }));
    assert_eq!(grader.call_count(), 1);
}

#[tokio::test]
async fn structural_question_supplies_model_answer_and_marks() {
    let grader = Arc::new(MockGrader::with_fixed_reply(
        "You've earned 5 out of 5 marks. Excellent.",
    ));
    let evaluator = AnswerEvaluator::new(grader.clone());

    let result = evaluator
        .evaluate_structural(&structural_question(), "Because of chlorophyll.")
        .await
        .unwrap();
    assert_eq!(result.score, 5);

    let prompt = grader.last_request().unwrap().prompt;
    assert!(prompt.contains("Question: Explain why leaves are green."));
    assert!(prompt.contains("Model Answer: Chlorophyll reflects green light."));
    assert!(prompt.contains("Maximum Marks: 5"));
}

#[tokio::test]
async fn mcq_question_cannot_be_graded_as_structural() {
    let grader = Arc::new(MockGrader::with_fixed_reply("unused"));
    let evaluator = AnswerEvaluator::new(grader.clone());

    let question = Question {
        body: QuestionBody::Mcq(McqBody {
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "A".into(),
        }),
        ..structural_question()
    };

    let err = evaluator
        .evaluate_structural(&question, "a")
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluationError::Validation(_)));
    assert_eq!(grader.call_count(), 0);
}

#[tokio::test]
async fn sampling_can_be_overridden() {
    let grader = Arc::new(MockGrader::with_fixed_reply("You've earned 1 out of 2 marks."));
    let evaluator = AnswerEvaluator::new(grader.clone()).with_sampling(0.1, 300);

    evaluator
        .evaluate_answer("Q", "Model", "Mine", 2)
        .await
        .unwrap();

    let request = grader.last_request().unwrap();
    assert_eq!(request.temperature, 0.1);
    assert_eq!(request.max_tokens, 300);
}
