//! The guided journaling interview.
//!
//! One-shot, non-looping flow: per configured topic the engine
//! generates interview questions as a numbered list, the operator
//! answers each one, optionally a bounded number of follow-up
//! questions is generated per answer (exactly one level deep), and
//! every answer is independently rewritten as first-person narrative
//! prose. The concatenated narrative plus the raw answers become one
//! timestamped entry in the append-only journal file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::config::{JournalConfig, Topic};
use crate::engine::ReasoningEngine;

// ── Operator seam ────────────────────────────────────────────

/// Source of operator answers. The binary implements this over the
/// console; tests script it.
pub trait Prompter {
    fn ask(&mut self, question: &str) -> anyhow::Result<String>;
}

// ── Answer record ────────────────────────────────────────────

/// Ordered question → answer pairs collected during one run. Question
/// text is the unique key; re-answering a question overwrites in place.
#[derive(Debug, Default, Clone)]
pub struct AnswerRecord {
    entries: Vec<(String, String)>,
}

impl AnswerRecord {
    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();
        if let Some(entry) = self.entries.iter_mut().find(|(q, _)| *q == question) {
            entry.1 = answer;
        } else {
            self.entries.push((question, answer));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

// ── Question parsing ─────────────────────────────────────────

/// Parse a model-generated numbered list into discrete questions.
///
/// Deliberately permissive: every non-blank trimmed line counts as a
/// question, whether or not it carries the `N.` prefix. Tightening
/// this would change observed behavior without cause.
pub fn parse_questions(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Prompt templates ─────────────────────────────────────────

fn questions_prompt(topic: &Topic, min_questions: usize) -> String {
    format!(
        "I want you to generate a list of questions about {topic}.\n\
         The description of the topic is: {description}\n\
         Generate the questions in the following format:\n\
         1. How did you feel today?\n\
         2. What did you do today?\n\
         3. What did you learn today?\n\
         You can generate as many questions as you want, \
         but you should generate at least {min_questions}.",
        topic = topic.name,
        description = topic.description,
    )
}

fn followup_prompt(question: &str, answer: &str, max_followups: usize) -> String {
    format!(
        "A user was asked the following question:\n{question}\n\
         They answered:\n{answer}\n\
         Generate at most {max_followups} open-ended follow-up question(s) \
         that dig deeper into this answer, formatted as a numbered list."
    )
}

fn summary_prompt(question: &str, answer: &str) -> String {
    format!(
        "A user was asked questions and they gave the following responses:\n\
         Question:\n{question}\n\
         Answer:\n{answer}\n\
         Generate a section of a daily journal entry based on the responses.\n\
         Do not include an introduction or conclusion, just the portion of the \
         entry that would be a summary of the answer.\n\
         Write the summary as if it is a continuation of a journal entry \
         (i.e. don't start with \"Today I did ...\").\n\
         Use the first person and the present tense as if you are the user \
         who has written the responses.\n\
         Use interesting and descriptive language that will make the entry \
         interesting to read.\n\
         Use variety in your sentence structure and vocabulary.\n\
         Correct any spelling or grammar mistakes."
    )
}

// ── JournalSession ───────────────────────────────────────────

/// Runs the interview against an engine and an operator.
pub struct JournalSession<'a> {
    engine: &'a dyn ReasoningEngine,
    config: JournalConfig,
}

impl<'a> JournalSession<'a> {
    pub fn new(engine: &'a dyn ReasoningEngine, config: JournalConfig) -> Self {
        Self { engine, config }
    }

    /// Run the full interview: questions, answers, follow-ups, then
    /// summarization. Returns the collected record and the summary.
    ///
    /// Unlike the conversation loop, engine failures here abort the
    /// run: there is no partial state worth keeping mid-interview.
    pub async fn run(&self, prompter: &mut dyn Prompter) -> anyhow::Result<(AnswerRecord, String)> {
        let mut record = AnswerRecord::default();

        for topic in &self.config.topics {
            let questions = self.generate_questions(topic).await?;
            info!(topic = %topic.name, count = questions.len(), "questions generated");

            for question in questions {
                let answer = prompter.ask(&question)?;
                record.insert(&question, &answer);

                // Follow-ups go exactly one level deep: answers to
                // follow-up questions never spawn more follow-ups.
                for followup in self.generate_followups(&question, &answer).await? {
                    let followup_answer = prompter.ask(&followup)?;
                    record.insert(&followup, &followup_answer);
                }
            }
        }

        let summary = self.summarize(&record).await?;
        Ok((record, summary))
    }

    async fn generate_questions(&self, topic: &Topic) -> anyhow::Result<Vec<String>> {
        let prompt = questions_prompt(topic, self.config.min_questions);
        let response = self
            .engine
            .complete(&[], &prompt)
            .await
            .with_context(|| format!("generate questions for topic {}", topic.name))?;
        Ok(parse_questions(&response))
    }

    async fn generate_followups(
        &self,
        question: &str,
        answer: &str,
    ) -> anyhow::Result<Vec<String>> {
        if self.config.max_followups == 0 {
            return Ok(Vec::new());
        }
        let prompt = followup_prompt(question, answer, self.config.max_followups);
        let response = self
            .engine
            .complete(&[], &prompt)
            .await
            .context("generate follow-up questions")?;
        let mut followups = parse_questions(&response);
        followups.truncate(self.config.max_followups);
        debug!(count = followups.len(), "follow-ups generated");
        Ok(followups)
    }

    /// Rewrite every answer independently as narrative prose and
    /// concatenate the fragments. No cross-question coherence pass.
    async fn summarize(&self, record: &AnswerRecord) -> anyhow::Result<String> {
        let mut summary = String::new();
        for (question, answer) in record.iter() {
            let fragment = self
                .engine
                .complete(&[], &summary_prompt(question, answer))
                .await
                .context("summarize answer")?;
            if !summary.is_empty() {
                summary.push('\n');
            }
            summary.push_str(fragment.trim());
        }
        Ok(summary)
    }
}

// ── JournalWriter ────────────────────────────────────────────

/// Appends timestamped entries to the append-only journal file.
#[derive(Debug, Clone)]
pub struct JournalWriter {
    path: PathBuf,
}

impl JournalWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry stamped with the current local time.
    pub async fn append(&self, record: &AnswerRecord, summary: &str) -> anyhow::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        self.append_stamped(record, summary, &timestamp.to_string())
            .await
    }

    /// Append one entry with an explicit timestamp string.
    pub async fn append_stamped(
        &self,
        record: &AnswerRecord,
        summary: &str,
        timestamp: &str,
    ) -> anyhow::Result<()> {
        use tokio::io::AsyncWriteExt;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("create journal dir")?;
            }
        }

        let mut entry = format!("Journal Entry for {timestamp}\n");
        entry.push_str("Questions and Answers:\n");
        for (question, answer) in record.iter() {
            entry.push_str(&format!("{question}: {answer}\n"));
        }
        entry.push_str("Summary:\n");
        entry.push_str(summary);
        entry.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("open journal file {}", self.path.display()))?;

        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        info!(path = %self.path.display(), answers = record.len(), "journal entry appended");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_questions_splits_on_non_blank_lines() {
        let response = "1. How did you feel today?\n\n2. What did you do today?\n3. What did you learn today?\n";
        let questions = parse_questions(response);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "1. How did you feel today?");
    }

    #[test]
    fn parse_questions_accepts_unnumbered_lines() {
        // Permissive on purpose: lines without the `N.` prefix still count.
        let response = "Here are some questions:\n1. One?\nAnother without a number?\n";
        let questions = parse_questions(response);
        assert_eq!(questions.len(), 3);
    }

    #[test]
    fn parse_questions_trims_whitespace() {
        let questions = parse_questions("   1. Padded?   \n\t2. Tabbed?\n");
        assert_eq!(questions, vec!["1. Padded?", "2. Tabbed?"]);
    }

    #[test]
    fn parse_questions_empty_response_yields_nothing() {
        assert!(parse_questions("\n  \n").is_empty());
    }

    #[test]
    fn answer_record_preserves_insertion_order() {
        let mut record = AnswerRecord::default();
        record.insert("b?", "2");
        record.insert("a?", "1");
        let keys: Vec<&str> = record.iter().map(|(q, _)| q).collect();
        assert_eq!(keys, vec!["b?", "a?"]);
    }

    #[test]
    fn answer_record_overwrites_duplicate_question() {
        let mut record = AnswerRecord::default();
        record.insert("q?", "first");
        record.insert("q?", "second");
        assert_eq!(record.len(), 1);
        assert_eq!(record.iter().next(), Some(("q?", "second")));
    }

    #[tokio::test]
    async fn writer_appends_labeled_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JournalWriter::new(dir.path().join("journal.txt"));

        let mut record = AnswerRecord::default();
        record.insert("1. How was today?", "Good.");
        writer
            .append_stamped(&record, "The day treats me well.", "2026-08-26 10:00:00")
            .await
            .unwrap();

        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert!(contents.starts_with("Journal Entry for 2026-08-26 10:00:00\n"));
        assert!(contents.contains("Questions and Answers:\n"));
        assert!(contents.contains("1. How was today?: Good.\n"));
        assert!(contents.contains("Summary:\nThe day treats me well.\n"));
    }

    #[tokio::test]
    async fn writer_appends_not_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JournalWriter::new(dir.path().join("journal.txt"));

        let mut record = AnswerRecord::default();
        record.insert("q?", "a");
        writer
            .append_stamped(&record, "one", "2026-08-25 09:00:00")
            .await
            .unwrap();
        writer
            .append_stamped(&record, "two", "2026-08-26 09:00:00")
            .await
            .unwrap();

        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(contents.matches("Journal Entry for ").count(), 2);
    }
}
