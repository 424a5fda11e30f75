use async_trait::async_trait;
use std::collections::HashMap;

use super::LanguageDetector;
use crate::ProviderError;

/// Source code that asks the translation service to detect the language itself
pub const AUTO_DETECT: &str = "auto";

/// Characters inspected per chunk
const SAMPLE_CHARS: usize = 500;

/// Unicode blocks of scripts used by (mostly) one language
const SCRIPT_LANGUAGES: &[(char, char, &str)] = &[
    ('\u{0370}', '\u{03FF}', "el"),
    ('\u{0400}', '\u{04FF}', "ru"),
    ('\u{0590}', '\u{05FF}', "iw"),
    ('\u{0600}', '\u{06FF}', "ar"),
    ('\u{0900}', '\u{097F}', "hi"),
    ('\u{0980}', '\u{09FF}', "bn"),
    ('\u{0A00}', '\u{0A7F}', "pa"),
    ('\u{0A80}', '\u{0AFF}', "gu"),
    ('\u{0B80}', '\u{0BFF}', "ta"),
    ('\u{0C00}', '\u{0C7F}', "te"),
    ('\u{0C80}', '\u{0CFF}', "kn"),
    ('\u{0D00}', '\u{0D7F}', "ml"),
    ('\u{0E00}', '\u{0E7F}', "th"),
    ('\u{1100}', '\u{11FF}', "ko"),
    ('\u{3040}', '\u{30FF}', "ja"),
    ('\u{4E00}', '\u{9FFF}', "zh-CN"),
    ('\u{AC00}', '\u{D7AF}', "ko"),
];

/// Best-effort local detector keyed on the dominant writing script.
///
/// Latin and other shared scripts cannot be told apart this way and yield
/// [`AUTO_DETECT`], leaving detection to the translation service within the same request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDetector;

impl ScriptDetector {
    pub fn detect_code(text: &str) -> &'static str {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        let mut letters = 0usize;

        for c in text.chars().filter(|c| c.is_alphabetic()).take(SAMPLE_CHARS) {
            letters += 1;
            if let Some((_, _, lang)) = SCRIPT_LANGUAGES
                .iter()
                .find(|(start, end, _)| (*start..=*end).contains(&c))
            {
                *counts.entry(*lang).or_default() += 1;
            }
        }

        // Japanese mixes kana with Han characters
        if counts.contains_key("ja") && counts.contains_key("zh-CN") {
            let han = counts.remove("zh-CN").unwrap_or(0);
            *counts.entry("ja").or_default() += han;
        }

        match counts.into_iter().max_by_key(|(_, count)| *count) {
            Some((lang, count)) if count * 2 > letters => lang,
            _ => AUTO_DETECT,
        }
    }
}

#[async_trait]
impl LanguageDetector for ScriptDetector {
    async fn detect(&self, text: &str) -> Result<String, ProviderError> {
        let lang = Self::detect_code(text);
        tracing::debug!("Detected source language '{}'", lang);
        Ok(lang.to_string())
    }
}
