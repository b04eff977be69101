use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

static LANG_DIR: Dir = include_dir!("src/lang");

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("language file `{0}` not found")]
    NotFound(String),

    #[error("language file `{0}` is not valid UTF-8")]
    Encoding(String),

    #[error("unable to deserialize language json: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    /// Load one of the word lists bundled under `src/lang`.
    pub fn load(name: &str) -> Result<Self, LanguageError> {
        let file_name = format!("{name}.json");
        let file = LANG_DIR
            .get_file(&file_name)
            .ok_or_else(|| LanguageError::NotFound(file_name.clone()))?;
        let contents = file
            .contents_utf8()
            .ok_or(LanguageError::Encoding(file_name))?;
        Ok(serde_json::from_str(contents)?)
    }

    /// The bundled English list, parsed once.
    pub fn english() -> &'static Language {
        static ENGLISH: OnceLock<Language> = OnceLock::new();
        ENGLISH.get_or_init(|| Language::load("english").expect("bundled english word list"))
    }

    /// Exactly `n` words, drawn with replacement.
    pub fn random_words_with<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<String> {
        (0..n)
            .filter_map(|_| self.words.choose(rng).cloned())
            .collect()
    }

    pub fn random_words(&self, n: usize) -> Vec<String> {
        self.random_words_with(&mut rand::thread_rng(), n)
    }
}

/// `n` random English words; empty for `n == 0`.
pub fn get_random_words(n: usize) -> Vec<String> {
    Language::english().random_words(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn english_list_is_bundled() {
        let lang = Language::english();

        assert_eq!(lang.name, "english");
        assert!(!lang.words.is_empty());
        assert_eq!(lang.size as usize, lang.words.len());
    }

    #[test]
    fn returns_exactly_the_requested_number() {
        for n in [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 100, 1000, 10000] {
            assert_eq!(get_random_words(n).len(), n);
        }
    }

    #[test]
    fn zero_words_is_empty() {
        assert!(get_random_words(0).is_empty());
    }

    #[test]
    fn words_come_from_the_list() {
        let lang = Language::english();
        let words = get_random_words(200);

        assert!(words.iter().all(|w| !w.is_empty()));
        assert!(words.iter().all(|w| lang.words.contains(w)));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let lang = Language::english();
        let a = lang.random_words_with(&mut StdRng::seed_from_u64(7), 20);
        let b = lang.random_words_with(&mut StdRng::seed_from_u64(7), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn language_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "size": 3,
            "words": ["hello", "world", "test"]
        }
        "#;

        let lang: Language = serde_json::from_str(json_data).unwrap();

        assert_eq!(lang.name, "test");
        assert_eq!(lang.size, 3);
        assert_eq!(lang.random_words(10).len(), 10);
    }

    #[test]
    fn unknown_language_is_an_error() {
        assert_matches!(
            Language::load("klingon"),
            Err(LanguageError::NotFound(name)) if name == "klingon.json"
        );
    }
}
