//! Tests, quizzes and grading

use crate::flow::TaskDefinition;
use crate::prompt::TemplateError;
use crate::schema::{InputContract, ObjectSchema, Schema};
use serde_json::json;

const GENERATE_QUIZ: &str = "\
Write a quiz of five multiple-choice questions based on this text:

{{text}}

Every question has four options and exactly one correct answer. Answer in the \
requested JSON format.";

const CREATE_TEST: &str = "\
You write practice tests. Produce {{numberOfQuestions}} questions of type \
'{{questionType}}' for a student with these parameters:

Curriculum Level: {{curriculumLevel}}
{{#if board}}Board: {{board}}
{{/if}}Subject: {{subject}}
Topic: {{topic}}
Difficulty Level: {{difficultyLevel}}
Medium: {{medium}}
Question Type: {{questionType}}

Questions should genuinely test understanding, and each needs a clear answer.

- For 'mcq', write multiple-choice questions with four options and one correct \
answer, in the 'mcqs' array.
- For 'short', write short-answer questions in the 'shortQuestions' array.
- For 'long', write long-answer questions in the 'longQuestions' array.

Answer in the requested JSON format.";

const GRADE_ANSWERS: &str = "\
You are a teacher grading a submitted test.

For each question decide whether the student's answer is correct; answers to \
non-MCQ questions may be worded differently and still be correct. Give short, \
constructive feedback, especially for wrong answers.

Then look at the answers as a whole for signs of academic dishonesty: text that \
reads as copy-pasted, vocabulary above the student's level, or suspiciously \
perfect answers. Summarize what you find.

Finally give the score as the percentage of correct answers.

Questions and answers:
{{#each answers}}
- Question: {{this.question}}
- Correct Answer: {{this.correctAnswer}}
- Student's Answer: {{this.studentAnswer}}
---
{{/each}}

Answer in the requested JSON format.";

const EVALUATE_ESSAY: &str = "\
You are an experienced English teacher reviewing a student's essay:
---
{{essayText}}
---

Work out the essay's topic, then assess it on:
1. Grammar and spelling
2. Structure and organization
3. Creativity and originality
4. Logic and clarity

Score it out of 100, give specific feedback for each criterion, an overall \
comment and a list of concrete improvement tips. Finish with a short A-grade \
sample essay on the same topic.

Answer in the requested JSON format.";

fn mcq() -> Schema {
    ObjectSchema::new()
        .required("question", Schema::String)
        .required("options", Schema::array_of(Schema::String))
        .required("answer", Schema::String)
        .into()
}

fn written_question() -> Schema {
    ObjectSchema::new()
        .required("question", Schema::String)
        .required("answer", Schema::String)
        .into()
}

pub(super) fn definitions() -> Result<Vec<TaskDefinition>, TemplateError> {
    Ok(vec![
        TaskDefinition::new(
            "generateQuiz",
            "Five-question multiple-choice quiz from a text",
            InputContract::new(ObjectSchema::new().required("text", Schema::String)),
            ObjectSchema::new().required("quiz", Schema::array_of(mcq())),
            GENERATE_QUIZ,
        )?,
        TaskDefinition::new(
            "createTest",
            "Curriculum-aligned practice test",
            InputContract::new(
                ObjectSchema::new()
                    .required("subject", Schema::String)
                    .required("topic", Schema::String)
                    .required("difficultyLevel", Schema::one_of(&["easy", "medium", "hard"]))
                    .with_default("numberOfQuestions", Schema::positive_integer(), json!(10))
                    .required("curriculumLevel", Schema::String)
                    .optional("board", Schema::String)
                    .required("medium", Schema::one_of(&["english", "urdu"]))
                    .required("questionType", Schema::one_of(&["mcq", "short", "long"])),
            ),
            ObjectSchema::new()
                .optional("mcqs", Schema::array_of(mcq()))
                .optional("shortQuestions", Schema::array_of(written_question()))
                .optional("longQuestions", Schema::array_of(written_question())),
            CREATE_TEST,
        )?,
        TaskDefinition::new(
            "gradeAnswers",
            "Grade submitted answers and check for cheating",
            InputContract::new(
                ObjectSchema::new().required(
                    "answers",
                    Schema::array_of(
                        ObjectSchema::new()
                            .required("question", Schema::String)
                            .required("correctAnswer", Schema::String)
                            .required("studentAnswer", Schema::String)
                            .into(),
                    ),
                ),
            )
            .system_credential_only(),
            ObjectSchema::new()
                .required("score", Schema::Number)
                .required(
                    "results",
                    Schema::array_of(
                        ObjectSchema::new()
                            .required("question", Schema::String)
                            .required("isCorrect", Schema::Boolean)
                            .required("feedback", Schema::String)
                            .into(),
                    ),
                )
                .required("cheatingAnalysis", Schema::String),
            GRADE_ANSWERS,
        )?,
        TaskDefinition::new(
            "evaluateEssay",
            "Scored essay feedback with a sample essay",
            InputContract::new(ObjectSchema::new().required("essayText", Schema::String)),
            ObjectSchema::new()
                .required("score", Schema::Number)
                .required(
                    "feedback",
                    ObjectSchema::new()
                        .required("grammar", Schema::String)
                        .required("structure", Schema::String)
                        .required("creativity", Schema::String)
                        .required("logic", Schema::String),
                )
                .required("overallComments", Schema::String)
                .required("improvementTips", Schema::array_of(Schema::String))
                .required("sampleEssay", Schema::String),
            EVALUATE_ESSAY,
        )?,
    ])
}
