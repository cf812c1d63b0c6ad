//! Plans, roadmaps and long-form generation

use crate::flow::TaskDefinition;
use crate::prompt::TemplateError;
use crate::schema::{InputContract, ObjectSchema, Schema};

const CAREER_ADVICE: &str = "\
You are a career counselor for students in Pakistan. Give personalized advice \
and an actionable roadmap.

Student profile:
- Current Education: {{currentEducation}}
- Interests:
{{#each interests}}  - {{this}}
{{/each}}- Strengths:
{{#each strengths}}  - {{this}}
{{/each}}
First suggest three to five career fields that fit this profile, each with a \
short reason.

Then, for the single best of those careers, lay out a detailed step-by-step \
roadmap starting from the student's current education: what to study next, \
which skills to build and what projects to make, with resources where possible. \
Frame it as \"How to become a <career> after {{currentEducation}}\".

Answer in the requested JSON format.";

const LESSON_PLAN: &str = "\
You are an instructional designer. Write a lesson plan for a teacher:

Topic: {{topic}}
Lesson Duration: {{duration}}
Learning Objective: {{objective}}

Split the lesson into modules, each with a title, an estimated duration and a \
list of engaging classroom activities. End with a creative idea for assessing \
what the students understood.

Answer in the requested JSON format.";

const LEARNING_PATH: &str = "\
You are an academic advisor for students in Pakistan. Build a personalized \
learning path.

Goal: \"{{goal}}\"
Weak topics:
{{#each weakTopics}}- {{this}}
{{/each}}
Start from foundations and build up, making sure every weak topic is addressed. \
Each step is one of study_chapter, watch_video or take_test, with the topic it \
covers and why it matters.

Also propose a simple, realistic daily study routine the student can keep up \
every day.

Answer in the requested JSON format.";

const SELF_LEARNING_MODULE: &str = "\
You are an instructional designer. Build a self-learning module on \"{{topic}}\".

Lay out three to five lessons in order. For each lesson give a clear title, a \
summary of its key concepts, two or three relevant article or video URLs, and a \
short quiz of two or three multiple-choice questions.

Answer in the requested JSON format.";

const GENERATE_BOOK: &str = "\
You are an author and educator. Write a complete book.

Book Title: \"{{title}}\"
Number of Chapters: {{numChapters}}
Purpose of the Book: \"{{purpose}}\"

Write exactly that many chapters. Each needs a meaningful title and detailed, \
engaging content that serves the book's purpose, in a tone suited to its \
subject. The title in your answer must match the title above.

Answer in the requested JSON format.";

fn string_list() -> Schema {
    Schema::array_of(Schema::String)
}

fn mcq() -> Schema {
    ObjectSchema::new()
        .required("question", Schema::String)
        .required("options", string_list())
        .required("answer", Schema::String)
        .into()
}

pub(super) fn definitions() -> Result<Vec<TaskDefinition>, TemplateError> {
    Ok(vec![
        TaskDefinition::new(
            "generateCareerAdvice",
            "Career suggestions and a roadmap for the best fit",
            InputContract::new(
                ObjectSchema::new()
                    .required("interests", string_list())
                    .required("strengths", string_list())
                    .required("currentEducation", Schema::String),
            ),
            ObjectSchema::new()
                .required(
                    "suggestedCareers",
                    Schema::array_of(
                        ObjectSchema::new()
                            .required("field", Schema::String)
                            .required("reason", Schema::String)
                            .into(),
                    ),
                )
                .required(
                    "topCareerRoadmap",
                    ObjectSchema::new()
                        .required("career", Schema::String)
                        .required(
                            "roadmap",
                            Schema::array_of(
                                ObjectSchema::new()
                                    .required("step", Schema::Number)
                                    .required("title", Schema::String)
                                    .required("description", Schema::String)
                                    .optional("resources", string_list())
                                    .into(),
                            ),
                        ),
                ),
            CAREER_ADVICE,
        )?,
        TaskDefinition::new(
            "generateLessonPlan",
            "Modular lesson plan for teachers",
            InputContract::new(
                ObjectSchema::new()
                    .required("topic", Schema::String)
                    .required("duration", Schema::String)
                    .required("objective", Schema::String),
            ),
            ObjectSchema::new()
                .required("lessonTitle", Schema::String)
                .required(
                    "modules",
                    Schema::array_of(
                        ObjectSchema::new()
                            .required("title", Schema::String)
                            .required("duration", Schema::String)
                            .required("activities", string_list())
                            .into(),
                    ),
                )
                .required("assessment", Schema::String),
            LESSON_PLAN,
        )?,
        TaskDefinition::new(
            "generateLearningPath",
            "Adaptive learning steps and a daily routine",
            InputContract::new(
                ObjectSchema::new()
                    .required("goal", Schema::String)
                    .required("weakTopics", string_list()),
            ),
            ObjectSchema::new()
                .required(
                    "learningSteps",
                    Schema::array_of(
                        ObjectSchema::new()
                            .required(
                                "type",
                                Schema::one_of(&["study_chapter", "watch_video", "take_test"]),
                            )
                            .required("topic", Schema::String)
                            .optional("resource", Schema::String)
                            .required("rationale", Schema::String)
                            .into(),
                    ),
                )
                .required("dailyRoutine", Schema::String),
            LEARNING_PATH,
        )?,
        TaskDefinition::new(
            "generateSelfLearningModule",
            "Lessons with resources and quizzes for self study",
            InputContract::new(ObjectSchema::new().required("topic", Schema::String)),
            ObjectSchema::new().required(
                "learningPath",
                Schema::array_of(
                    ObjectSchema::new()
                        .required("title", Schema::String)
                        .required("summary", Schema::String)
                        .required("resources", string_list())
                        .required("quiz", Schema::array_of(mcq()))
                        .into(),
                ),
            ),
            SELF_LEARNING_MODULE,
        )?,
        TaskDefinition::new(
            "generateBook",
            "Multi-chapter book on a subject",
            InputContract::new(
                ObjectSchema::new()
                    .required("title", Schema::String)
                    .required("numChapters", Schema::integer_range(1, 10))
                    .required("purpose", Schema::String),
            ),
            ObjectSchema::new()
                .required("title", Schema::String)
                .required(
                    "chapters",
                    Schema::array_of(
                        ObjectSchema::new()
                            .required("title", Schema::String)
                            .required("content", Schema::String)
                            .into(),
                    ),
                ),
            GENERATE_BOOK,
        )?,
    ])
}
