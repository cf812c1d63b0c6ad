//! Conversational helpers

use crate::flow::TaskDefinition;
use crate::prompt::TemplateError;
use crate::schema::{InputContract, ObjectSchema, Schema};

const ASK_AI_TUTOR: &str = "\
You are a friendly, knowledgeable tutor for students in Pakistan who explains \
things clearly and simply.

Topic: \"{{topic}}\"
Student's question: \"{{question}}\"

Answer step by step, using a simple analogy or example where it helps. Keep the \
tone encouraging. Reply in the language of the question (English or Urdu) when \
you can.";

// Product facts the visitor assistant may draw on; nothing else.
const VISITOR_QUESTION: &str = "\
You are the help assistant for EduGenius, an AI learning co-pilot for students \
in Pakistan. You only answer questions about what EduGenius is and does.

What EduGenius offers:
---
1. Personalized learning paths: finds weak topics and builds a study roadmap \
with a daily routine.
2. Audio generator: turns text notes into downloadable voice-overs.
3. Career counseling: suggests careers from interests and gives a roadmap.
4. Essay evaluator: instant scored feedback on grammar, structure, creativity \
and logic, plus an A-grade sample.
5. Chapter summarizer and Q&A generator.
6. Test generator with MCQ, short and long questions, practice and exam modes, \
and optional AI proctoring.
7. Download center for notes, summaries and tests as TXT or PDF.
8. Free tech courses: a curated library of programming and AI video courses.
9. Community hub and AI tutor for instant doubt solving.
10. Voice assistant, custom API key support, smart search and bookmarks.
11. Admin and teacher panels for managing users and classes.
---

If the question is about anything else, politely decline and offer to explain \
a feature such as the test generator or career counseling instead.

Visitor's question: \"{{question}}\"

Answer concisely, using only the information above.";

pub(super) fn definitions() -> Result<Vec<TaskDefinition>, TemplateError> {
    Ok(vec![
        TaskDefinition::new(
            "askAiTutor",
            "Step-by-step tutor answer",
            InputContract::new(
                ObjectSchema::new()
                    .required("topic", Schema::String)
                    .required("question", Schema::String),
            ),
            ObjectSchema::new().required("answer", Schema::String),
            ASK_AI_TUTOR,
        )?,
        TaskDefinition::new(
            "answerVisitorQuestion",
            "Product help for site visitors",
            InputContract::new(ObjectSchema::new().required("question", Schema::String))
                .system_credential_only(),
            ObjectSchema::new().required("answer", Schema::String),
            VISITOR_QUESTION,
        )?,
    ])
}
