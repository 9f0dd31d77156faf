//! Trending topics and featured papers shown on the landing page.

use std::sync::LazyLock;

use serde::Serialize;

use crate::models::{ImpactFactor, Paper};

/// Topics suggested on the landing page.
pub const TRENDING_TOPICS: &[&str] = &[
    "Generative AI",
    "Large Language Models",
    "Climate Change Mitigation",
    "CRISPR Gene Editing",
    "Quantum Computing Algorithms",
    "Sustainable Energy Storage",
    "Personalized Medicine",
    "Neuromorphic Computing",
    "Space Exploration Technologies",
    "Cybersecurity in IoT",
    "Blockchain Scalability",
    "Ethical AI",
];

/// Featured papers grouped for the landing page.
#[derive(Debug, Clone, Serialize)]
pub struct FeaturedPapers {
    pub ai: Vec<Paper>,
    pub ml: Vec<Paper>,
    pub mixed: Vec<Paper>,
}

static FEATURED: LazyLock<FeaturedPapers> = LazyLock::new(build_featured);

/// The featured paper collections.
#[must_use]
pub fn featured_papers() -> &'static FeaturedPapers {
    &FEATURED
}

struct Entry {
    id: &'static str,
    title: &'static str,
    summary: &'static str,
    authors: &'static str,
    fields: [&'static str; 2],
    citations: (u64, u64, u64),
    pdf: &'static str,
    journal: &'static str,
    score: f64,
}

impl Entry {
    fn into_paper(self) -> Paper {
        let (citation_count, influential_citation_count, reference_count) = self.citations;
        Paper {
            id: self.id.to_string(),
            title: self.title.to_string(),
            authors: self.authors.to_string(),
            r#abstract: Some(self.summary.to_string()),
            year: Some(2024),
            impact_factor: ImpactFactor {
                citation_count,
                influential_citation_count,
                reference_count,
            },
            fields_of_study: self.fields.iter().map(|f| (*f).to_string()).collect(),
            quartile_ranking: Some("Q1".to_string()),
            journal_name: Some(self.journal.to_string()),
            pdf_link: Some(self.pdf.to_string()),
            downloadable: Some(true),
            score: Some(self.score),
            ..Paper::default()
        }
    }
}

fn build_featured() -> FeaturedPapers {
    let ai: Vec<Paper> = [
        Entry {
            id: "top-ai-1",
            title: "Gemini: A Family of Highly Capable Multimodal Models",
            summary: "Introduces Gemini, multimodal models trained jointly across image, audio, \
                      video and text with state-of-the-art results across many benchmarks.",
            authors: "Google DeepMind Team",
            fields: ["Artificial Intelligence", "Multimodal Learning"],
            citations: (15_420, 850, 120),
            pdf: "https://storage.googleapis.com/deepmind-media/gemini/gemini_1_report.pdf",
            journal: "arXiv",
            score: 99.9,
        },
        Entry {
            id: "top-ai-2",
            title: "Llama 3: Open Foundation and Chat Models",
            summary: "Introduces Llama 3, open foundation language models from 8B to 70B \
                      parameters competitive with leading proprietary models.",
            authors: "Meta AI",
            fields: ["Large Language Models", "Open Source AI"],
            citations: (8_900, 420, 85),
            pdf: "https://ai.meta.com/research/publications/llama-3-paper/",
            journal: "Meta Research",
            score: 98.5,
        },
        Entry {
            id: "top-ai-3",
            title: "Sora: Creating Video from Text",
            summary: "A text-to-video model generating minute-long videos; studies large-scale \
                      training of generative models on video data.",
            authors: "OpenAI",
            fields: ["Generative Video", "Computer Vision"],
            citations: (12_500, 630, 95),
            pdf: "https://openai.com/research/video-generation-models-as-world-simulators",
            journal: "OpenAI Technical Report",
            score: 99.2,
        },
    ]
    .into_iter()
    .map(Entry::into_paper)
    .collect();

    let ml: Vec<Paper> = [
        Entry {
            id: "top-ml-1",
            title: "Accurate prediction of protein structures and interactions using AlphaFold 3",
            summary: "AlphaFold 3 predicts the structure of complexes of proteins, nucleic \
                      acids, small molecules, ions and modified residues with improved accuracy.",
            authors: "Google DeepMind, Isomorphic Labs",
            fields: ["Machine Learning", "Structural Biology"],
            citations: (5_200, 950, 75),
            pdf: "https://www.nature.com/articles/s41586-024-07487-w.pdf",
            journal: "Nature",
            score: 99.5,
        },
        Entry {
            id: "top-ml-2",
            title: "Mamba: Linear-Time Sequence Modeling with Selective State Spaces",
            summary: "Mamba, a selective state space architecture, matches transformer quality \
                      while scaling linearly in sequence length.",
            authors: "Gu, Albert and Dao, Tri",
            fields: ["Deep Learning", "Sequence Modeling"],
            citations: (3_100, 450, 60),
            pdf: "https://arxiv.org/pdf/2312.00752.pdf",
            journal: "arXiv",
            score: 98.0,
        },
        Entry {
            id: "top-ml-3",
            title: "YOLOv10: Real-Time End-to-End Object Detection",
            summary: "YOLOv10 removes non-maximum suppression via consistent dual assignments, \
                      reaching state-of-the-art speed and accuracy.",
            authors: "Wang, Ao et al.",
            fields: ["Computer Vision", "Object Detection"],
            citations: (1_800, 120, 45),
            pdf: "https://arxiv.org/pdf/2405.14458",
            journal: "arXiv",
            score: 97.5,
        },
    ]
    .into_iter()
    .map(Entry::into_paper)
    .collect();

    let mixed = vec![ai[0].clone(), ml[0].clone(), ai[2].clone()];

    FeaturedPapers { ai, ml, mixed }
}
