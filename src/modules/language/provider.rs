use crate::api::error;

/// Supplies the language codes every banner must be translated into.
pub trait LanguageProvider: Send + Sync {
    fn languages(&self) -> Vec<String>;

    fn is_supported(&self, code: &str) -> bool {
        self.languages().iter().any(|language| language == code)
    }
}

/// Language list fixed at startup.
#[derive(Debug, Clone)]
pub struct ConfigLanguageProvider {
    languages: Vec<String>,
}

impl ConfigLanguageProvider {
    pub fn new<I, S>(languages: I) -> Result<Self, error::SystemError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes: Vec<String> = Vec::new();
        for language in languages {
            let code: String = language.into();
            let code = code.trim().to_string();
            if code.is_empty() || codes.contains(&code) {
                continue;
            }
            if code.len() > 16 || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(error::SystemError::config(format!("Invalid language code '{code}'")));
            }
            codes.push(code);
        }

        if codes.is_empty() {
            return Err(error::SystemError::config("You should configure language provider"));
        }

        Ok(Self { languages: codes })
    }

    /// Parse a comma separated list such as `en,fr,pt-BR`. Codes are kept as written,
    /// since posted translation keys are matched exactly.
    pub fn from_list(list: &str) -> Result<Self, error::SystemError> {
        Self::new(list.split(','))
    }
}

impl LanguageProvider for ConfigLanguageProvider {
    fn languages(&self) -> Vec<String> {
        self.languages.clone()
    }

    fn is_supported(&self, code: &str) -> bool {
        self.languages.iter().any(|language| language == code)
    }
}
