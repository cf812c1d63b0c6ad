//! Reading and revision tasks

use crate::flow::TaskDefinition;
use crate::prompt::TemplateError;
use crate::schema::{InputContract, ObjectSchema, Schema};
use serde_json::json;

/// Sub-flow used by fan-out enrichment for each search result
pub const SUMMARIZE_VIDEO_DESCRIPTION: &str = "summarizeVideoDescription";

const SUMMARIZE_CHAPTER: &str = "\
You summarize textbook chapters for students and extract the points that matter.

Write a concise summary of this chapter:

{{chapterText}}";

const GENERATE_Q_AND_A: &str = "\
You are a learning assistant. Write a set of questions with their answers about \
the topic below, suitable for a student testing themselves before an exam.

Topic: {{{topic}}}

Questions and Answers:";

const EXTRACT_KEY_TAKEAWAYS: &str = "\
Read the text below and extract its five most important key takeaways.

{{text}}

Answer in the requested JSON format.";

const ANSWER_QUESTION_ABOUT_TEXT: &str = "\
Answer the question using only the text provided.

Question: {{question}}

Text:
{{text}}

Answer in the requested JSON format.";

const SUGGEST_RELATED_RESOURCES: &str = "\
Suggest between three and five resources (articles, books or videos) that would \
help a student learn about:

{{topic}}

Give each a title, a URL and its type. Answer in the requested JSON format.";

const SUMMARIZE_VIDEO: &str = "\
Summarize the following video description in one concise paragraph, focusing on \
the main topics the video covers. If the description is too short or unhelpful, \
reply exactly \"No summary available.\"

Description:
\"\"\"
{{description}}
\"\"\"

Summary:";

pub(super) fn definitions() -> Result<Vec<TaskDefinition>, TemplateError> {
    Ok(vec![
        TaskDefinition::new(
            "summarizeChapter",
            "Summarize a textbook chapter",
            InputContract::new(ObjectSchema::new().required("chapterText", Schema::String)),
            ObjectSchema::new()
                .required("summary", Schema::String)
                .required("progress", Schema::String),
            SUMMARIZE_CHAPTER,
        )?
        .with_fixed_output("progress", json!("Generated a summary of the chapter.")),
        TaskDefinition::new(
            "generateQAndA",
            "Practice questions and answers for a topic",
            InputContract::new(ObjectSchema::new().required("topic", Schema::String)),
            ObjectSchema::new().required("questionsAndAnswers", Schema::String),
            GENERATE_Q_AND_A,
        )?,
        TaskDefinition::new(
            "extractKeyTakeaways",
            "Five key takeaways from a text",
            InputContract::new(ObjectSchema::new().required("text", Schema::String)),
            ObjectSchema::new().required(
                "takeaways",
                Schema::array_of(ObjectSchema::new().required("takeaway", Schema::String).into()),
            ),
            EXTRACT_KEY_TAKEAWAYS,
        )?,
        TaskDefinition::new(
            "answerQuestionAboutText",
            "Answer a question from a supplied text",
            InputContract::new(
                ObjectSchema::new()
                    .required("text", Schema::String)
                    .required("question", Schema::String),
            ),
            ObjectSchema::new().required("answer", Schema::String),
            ANSWER_QUESTION_ABOUT_TEXT,
        )?,
        TaskDefinition::new(
            "suggestRelatedResources",
            "Articles, books and videos for a topic",
            InputContract::new(ObjectSchema::new().required("topic", Schema::String)),
            ObjectSchema::new().required(
                "resources",
                Schema::array_of(
                    ObjectSchema::new()
                        .required("title", Schema::String)
                        .required("url", Schema::String)
                        .required("type", Schema::one_of(&["article", "book", "video"]))
                        .into(),
                ),
            ),
            SUGGEST_RELATED_RESOURCES,
        )?,
        summarize_video_description()?,
    ])
}

/// Plain-text summary of one video description
pub fn summarize_video_description() -> Result<TaskDefinition, TemplateError> {
    TaskDefinition::new(
        SUMMARIZE_VIDEO_DESCRIPTION,
        "One-paragraph summary of a video description",
        InputContract::new(ObjectSchema::new().required("description", Schema::String)),
        Schema::String,
        SUMMARIZE_VIDEO,
    )
}
