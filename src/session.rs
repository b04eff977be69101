use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{UserMetrics, UserResponse, UserResponseMap};
use crate::words::get_random_words;

/// Outcome of one finished session, as kept in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub finished_at: DateTime<Local>,
    pub duration_secs: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub words_attempted: usize,
    pub words_correct: usize,
    pub characters_typed: usize,
}

/// Scores typed input against a word list, one word at a time.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    words: Vec<String>,
    responses: UserResponseMap,
    metrics: UserMetrics,
    current_index: usize,
    input: String,
    // 0 disables topping up
    batch_size: usize,
}

impl PracticeSession {
    /// Fresh session with `number_of_words` random words, topped up as the
    /// user gets through them.
    pub fn new(number_of_words: usize) -> Self {
        Self {
            batch_size: number_of_words,
            ..Self::with_words(get_random_words(number_of_words))
        }
    }

    /// Session over a fixed word list.
    pub fn with_words(words: Vec<String>) -> Self {
        Self {
            words,
            responses: UserResponseMap::new(),
            metrics: UserMetrics::default(),
            current_index: 0,
            input: String::new(),
            batch_size: 0,
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn responses(&self) -> &UserResponseMap {
        &self.responses
    }

    pub fn metrics(&self) -> UserMetrics {
        self.metrics
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_index).map(String::as_str)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// True while what has been typed so far is a prefix of the current word.
    pub fn is_on_track(&self) -> bool {
        self.current_word()
            .is_some_and(|word| word.starts_with(self.input.as_str()))
    }

    pub fn type_char(&mut self, c: char) {
        if self.current_word().is_none() {
            return;
        }
        self.input.push(c);
        self.metrics.characters_typed += 1;
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Record the current input against the current word and move on.
    /// Nothing is recorded for an empty input.
    pub fn submit_word(&mut self) -> Option<&UserResponse> {
        let word = self.current_word()?;
        if self.input.is_empty() {
            return None;
        }

        let response = UserResponse {
            correct: self.input == word,
            input: std::mem::take(&mut self.input),
        };
        let index = self.current_index;
        self.responses.insert(index, response);
        self.metrics.characters_typed += 1;
        self.current_index += 1;
        self.top_up();

        self.responses.get(&index)
    }

    fn top_up(&mut self) {
        let ahead = self.words.len().saturating_sub(self.current_index);
        if self.batch_size > 0 && ahead < self.batch_size / 2 {
            self.words.extend(get_random_words(self.batch_size));
        }
    }

    pub fn words_attempted(&self) -> usize {
        self.responses.len()
    }

    pub fn words_correct(&self) -> usize {
        self.responses.values().filter(|r| r.correct).count()
    }

    /// Characters of correctly typed words, each with its trailing separator.
    fn correct_characters(&self) -> usize {
        self.responses
            .values()
            .filter(|r| r.correct)
            .map(|r| r.input.chars().count() + 1)
            .sum()
    }

    pub fn wpm(&self, elapsed: Duration) -> f64 {
        let minutes = elapsed.as_secs_f64() / 60.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        (self.correct_characters() as f64 / 5.0 / minutes).round()
    }

    pub fn accuracy(&self) -> f64 {
        match self.words_attempted() {
            0 => 0.0,
            attempted => (self.words_correct() as f64 / attempted as f64 * 100.0).round(),
        }
    }

    pub fn result(&self, elapsed: Duration) -> SessionResult {
        SessionResult {
            finished_at: Local::now(),
            duration_secs: elapsed.as_secs_f64(),
            wpm: self.wpm(elapsed),
            accuracy: self.accuracy(),
            words_attempted: self.words_attempted(),
            words_correct: self.words_correct(),
            characters_typed: self.metrics.characters_typed,
        }
    }
}
