use crate::models::RepositoryRecord;

pub const MAX_TECHNOLOGIES: usize = 5;

/// Keyword → technologies, checked in this order. Order matters: it decides
/// which technologies survive truncation.
pub const KEYWORD_TECHNOLOGIES: &[(&str, &[&str])] = &[
    ("machine learning", &["Scikit-learn", "TensorFlow", "PyTorch"]),
    ("deep learning", &["TensorFlow", "Keras", "PyTorch"]),
    ("data analysis", &["Pandas", "NumPy", "Matplotlib"]),
    ("visualization", &["Plotly", "Seaborn", "D3.js"]),
    ("api", &["Flask", "FastAPI", "REST"]),
    ("web", &["HTML", "CSS", "JavaScript"]),
    ("database", &["SQL", "MongoDB", "PostgreSQL"]),
    ("nlp", &["NLTK", "spaCy", "Transformers"]),
    ("computer vision", &["OpenCV", "PIL", "TensorFlow"]),
    ("streamlit", &["Streamlit"]),
    ("jupyter", &["Jupyter"]),
    ("docker", &["Docker"]),
    ("aws", &["AWS"]),
    ("azure", &["Azure"]),
    ("gcp", &["Google Cloud"]),
];

/// Guesses a repository's technology stack from its language and the words
/// in its name and description.
pub struct TechnologyTagger {
    table: &'static [(&'static str, &'static [&'static str])],
    max_tags: usize,
}

impl TechnologyTagger {
    pub fn new() -> Self {
        Self {
            table: KEYWORD_TECHNOLOGIES,
            max_tags: MAX_TECHNOLOGIES,
        }
    }

    pub fn tag(&self, record: &RepositoryRecord) -> Vec<String> {
        let mut technologies: Vec<&str> = Vec::new();

        if let Some(ref language) = record.language {
            technologies.push(language);
        }

        let haystack = format!(
            "{} {}",
            record.name,
            record.description.as_deref().unwrap_or_default()
        )
        .to_lowercase();

        for (keyword, techs) in self.table {
            if haystack.contains(keyword) {
                technologies.extend_from_slice(techs);
            }
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.max_tags);
        for tech in technologies {
            if tags.len() == self.max_tags {
                break;
            }
            if !tags.iter().any(|t| t == tech) {
                tags.push(tech.to_string());
            }
        }

        tags
    }
}

impl Default for TechnologyTagger {
    fn default() -> Self {
        Self::new()
    }
}
