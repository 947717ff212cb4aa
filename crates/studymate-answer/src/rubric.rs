//! Deterministic exam-style answers built from the context alone.
//!
//! - 7 marks: Introduction (1) + Main Analysis (5) + Conclusion (1)
//! - 14 marks: Introduction (2) + Detailed Analysis (8) + Critical Evaluation (3) + Conclusion (1)
//! - detailed: the 14-mark layout with one explanation per point, used by
//!   the fast path that skips every backend
//!
//! Points are context sentences ranked by how many question keywords they
//! contain. When no sentence matches, the sections are filled from the
//! leading words of the context instead, so no section is ever empty.

use studymate_core::keywords::{extract_keywords, leading_words, rank_by_keywords, word_slice};
use studymate_core::types::{AnswerKind, ComposedAnswer, Marks};
use studymate_core::{Error, Result};
use tracing::debug;

pub const SEVEN_MARK_LABEL: &str = "7-Mark Structured Answer";
pub const FOURTEEN_MARK_LABEL: &str = "14-Mark Comprehensive Answer";
pub const DETAILED_LABEL: &str = "Fast AI - Detailed";

const EMPTY_CONTEXT: &str = "Limited context available from document.";

#[derive(Debug, Clone)]
pub struct LocalComposer {
    keyword_min_len: usize,
}

impl Default for LocalComposer {
    fn default() -> Self { Self { keyword_min_len: 3 } }
}

/// [`LocalComposer::rubric`] with default keyword length.
pub fn compose_rubric(question: &str, context: &str, marks: Marks) -> Result<ComposedAnswer> {
    LocalComposer::default().rubric(question, context, marks)
}

/// [`LocalComposer::detailed`] with default keyword length.
pub fn compose_detailed(question: &str, context: &str) -> Result<ComposedAnswer> {
    LocalComposer::default().detailed(question, context)
}

impl LocalComposer {
    pub fn new(keyword_min_len: usize) -> Self { Self { keyword_min_len } }

    pub fn rubric(&self, question: &str, context: &str, marks: Marks) -> Result<ComposedAnswer> {
        let context = checked(question, context)?;
        let (text, label) = match marks {
            Marks::Seven => (self.seven_marks(question, context), SEVEN_MARK_LABEL),
            Marks::Fourteen => (self.fourteen_marks(question, context), FOURTEEN_MARK_LABEL),
        };
        Ok(local_answer(text, AnswerKind::Rubric(marks), label))
    }

    pub fn detailed(&self, question: &str, context: &str) -> Result<ComposedAnswer> {
        let context = checked(question, context)?;
        let points = self.ranked_sentences(question, context, 10, 4);
        let mut out = String::new();

        out.push_str(&format!(
            "**Question Analysis:** {question}\n\n\
             **Introduction:** Based on the document analysis, this question requires a comprehensive \
             examination of the key concepts and their interrelationships.\n\n"
        ));

        out.push_str("**Main Analysis:**\n\n");
        if points.is_empty() {
            out.push_str(&format!(
                "**Key Information:** The document discusses {}...\n\n\
                 **Analysis:** This information provides important insights relevant to the question asked.\n\n",
                leading_words(context, 100)
            ));
        } else {
            for (i, sentence) in points.iter().enumerate() {
                out.push_str(&format!(
                    "**Point {}:** {sentence}\n\n\
                     *Explanation:* This point is significant because it directly relates to the question's core \
                     themes and provides essential context for understanding the topic.\n\n",
                    i + 1
                ));
            }
        }

        out.push_str(
            "**Critical Evaluation:**\n\n\
             The evidence presented in the document supports multiple perspectives on this topic. \
             Key strengths include the comprehensive coverage of relevant concepts, while potential limitations \
             may include the need for additional context or contemporary examples.\n\n",
        );
        out.push_str(
            "**Conclusion:**\n\n\
             In conclusion, the analysis of the document content reveals important insights that directly address \
             the question. The comprehensive examination of the available information provides a solid foundation \
             for understanding the topic and its implications.\n\n\
             **Total Marks Structure:** Introduction (2) + Main Analysis (8) + Critical Evaluation (3) + Conclusion (1) = **14 Marks**",
        );
        Ok(local_answer(out, AnswerKind::Detailed, DETAILED_LABEL))
    }

    fn seven_marks(&self, question: &str, context: &str) -> String {
        let points = self.ranked_sentences(question, context, 8, 3);
        let mut out = String::new();

        out.push_str(&format!(
            "**Question:** {question}\n\n\
             **Introduction:** This question requires an examination of the key concepts presented in the document.\n\n"
        ));

        out.push_str("**Main Analysis:**\n\n");
        if points.is_empty() {
            out.push_str(&format!(
                "**Key Information:** The document provides information about {}...\n\n\
                 **Analysis:** The content shows important relationships between the discussed concepts.\n\n\
                 **Significance:** These points are relevant to understanding the core topic.\n\n",
                leading_words(context, 80)
            ));
        } else {
            for (i, sentence) in points.iter().enumerate() {
                out.push_str(&format!("**Point {}:** {sentence}\n\n", i + 1));
                if i < 2 {
                    out.push_str("*This demonstrates the key relationship between the concepts discussed.*\n\n");
                }
            }
        }

        out.push_str(
            "**Conclusion:**\n\n\
             In summary, the document provides valuable insights that address the question. \
             The analysis demonstrates understanding of the key concepts and their practical applications.\n\n\
             **Mark Allocation:** Introduction (1) + Main Analysis (5) + Conclusion (1) = **7 Marks**",
        );
        out
    }

    fn fourteen_marks(&self, question: &str, context: &str) -> String {
        let points = self.ranked_sentences(question, context, 12, 4);
        let mut out = String::new();

        out.push_str(&format!(
            "**Question Analysis:** {question}\n\n\
             **Introduction:** This question requires a comprehensive examination of the key concepts and their \
             interrelationships. The analysis will consider multiple perspectives and provide detailed evidence \
             from the document to support the discussion.\n\n"
        ));

        out.push_str("**Detailed Analysis:**\n\n");
        if points.is_empty() {
            out.push_str(&format!(
                "**Primary Analysis:** The document extensively covers {}...\n\n\
                 *This analysis reveals fundamental insights into the topic's core principles.*\n\n\
                 **Secondary Analysis:** Further examination shows {}...\n\n\
                 *These findings demonstrate the complexity and interconnected nature of the subject.*\n\n\
                 **Tertiary Analysis:** Additional evidence indicates {}...\n\n\
                 *This provides comprehensive coverage of the essential elements required for full understanding.*\n\n\
                 **Synthesis:** The combined evidence presents a cohesive picture that addresses all aspects of the question.\n\n",
                word_slice(context, 0, 40),
                word_slice(context, 40, 80),
                word_slice(context, 80, 120),
            ));
        } else {
            for (i, sentence) in points.iter().enumerate() {
                out.push_str(&format!(
                    "**Section {}:** {sentence}\n\n\
                     *Detailed Explanation:* This point is crucial because it demonstrates the fundamental principles \
                     underlying the topic. The evidence shows clear connections to the broader themes discussed \
                     in the document and provides essential context for understanding the subject matter.\n\n\
                     *Supporting Evidence:* The information presented aligns with established theories and \
                     provides practical examples that reinforce the key concepts being examined.\n\n",
                    i + 1
                ));
            }
        }

        out.push_str(
            "**Critical Evaluation:**\n\n\
             **Strengths:** The document provides comprehensive coverage of the topic with detailed explanations \
             and relevant examples. The information is well-structured and addresses multiple aspects of the question.\n\n\
             **Limitations:** While thorough, the analysis could benefit from additional contemporary examples \
             or alternative perspectives to provide a more complete understanding of the topic.\n\n\
             **Overall Assessment:** The evidence strongly supports the main arguments and provides a solid \
             foundation for understanding the key concepts and their practical applications.\n\n",
        );
        out.push_str(
            "**Conclusion:**\n\n\
             In conclusion, the comprehensive analysis of the document content reveals significant insights \
             that directly address the question posed. The examination of multiple perspectives and detailed \
             evidence provides a thorough understanding of the topic and its broader implications for the field.\n\n\
             **Mark Distribution:** Introduction (2) + Detailed Analysis (8) + Critical Evaluation (3) + Conclusion (1) = **14 Marks**",
        );
        out
    }

    /// Up to `keep` of the first `window` sentences of `context`, ordered by
    /// keyword count; ties keep context order.
    fn ranked_sentences<'a>(&self, question: &str, context: &'a str, window: usize, keep: usize) -> Vec<&'a str> {
        let keywords = extract_keywords(question, self.keyword_min_len);
        let sentences: Vec<&str> = context.split('.').take(window).map(str::trim).filter(|s| !s.is_empty()).collect();
        let ranked: Vec<&str> = rank_by_keywords(sentences, &keywords).into_iter().take(keep).map(|(_, s, _)| s).collect();
        debug!(keywords = keywords.len(), matched = ranked.len(), "ranked context sentences");
        ranked
    }
}

fn checked<'a>(question: &str, context: &'a str) -> Result<&'a str> {
    if question.trim().is_empty() {
        return Err(Error::EmptyQuestion);
    }
    Ok(if context.trim().is_empty() { EMPTY_CONTEXT } else { context })
}

fn local_answer(text: String, kind: AnswerKind, label: &str) -> ComposedAnswer {
    ComposedAnswer { text, kind, contributors: vec![label.to_string()], responses: Vec::new() }
}
