//! Reading topic and writing theme catalogs, and the rotation that picks from
//! them.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::WritingTaskKind;

/// A category of catalog entries.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    pub entries: &'static [&'static str],
}

pub const READING_TOPICS: &[Category] = &[
    // Natural sciences
    Category {
        name: "Biology",
        entries: &["Evolutionary Biology", "Ecosystems", "Cell Biology", "Genetics", "Microbiology"],
    },
    Category {
        name: "Environmental Science",
        entries: &["Climate Change", "Conservation", "Sustainable Development", "Biodiversity", "Natural Resources"],
    },
    Category {
        name: "Astronomy",
        entries: &["Stellar Evolution", "Planetary Science", "Cosmology", "Space Exploration", "Astrophysics"],
    },
    Category {
        name: "Geology",
        entries: &["Plate Tectonics", "Mineralogy", "Natural Disasters", "Earth's History", "Geological Formations"],
    },
    // Social sciences
    Category {
        name: "Anthropology",
        entries: &["Cultural Anthropology", "Archaeological Discoveries", "Human Evolution", "Indigenous Cultures", "Social Structures"],
    },
    Category {
        name: "Psychology",
        entries: &["Cognitive Development", "Behavioral Psychology", "Memory Formation", "Social Psychology", "Psychological Disorders"],
    },
    Category {
        name: "Economics",
        entries: &["Economic Systems", "Market Structures", "International Trade", "Economic Development", "Monetary Policy"],
    },
    Category {
        name: "Sociology",
        entries: &["Social Movements", "Urbanization", "Social Institutions", "Demographic Change", "Cultural Norms"],
    },
    // Humanities
    Category {
        name: "History",
        entries: &["Ancient Civilizations", "Industrial Revolution", "Social Movements", "Cultural Exchange", "Political Systems"],
    },
    Category {
        name: "Arts",
        entries: &["Art History", "Artistic Movements", "Architecture", "Music History", "Cultural Expression"],
    },
    Category {
        name: "Philosophy",
        entries: &["Ethics", "Logic", "Metaphysics", "Political Philosophy", "Eastern Philosophy"],
    },
    // Technology
    Category {
        name: "Technology",
        entries: &["Artificial Intelligence", "Biotechnology", "Information Technology", "Renewable Energy", "Transportation Technology"],
    },
    Category {
        name: "Agriculture",
        entries: &["Sustainable Farming", "Food Systems", "Agricultural History", "Crop Development", "Farming Technologies"],
    },
];

pub const INDEPENDENT_THEMES: &[Category] = &[
    Category {
        name: "Education",
        entries: &[
            "Role of technology in education",
            "Traditional vs. modern teaching methods",
            "Value of arts education",
            "Learning from mistakes vs. learning from success",
            "Practical skills vs. theoretical knowledge",
        ],
    },
    Category {
        name: "Society",
        entries: &[
            "Urban vs. rural living",
            "Effects of social media",
            "Cultural preservation vs. adaptation",
            "Individual rights vs. community needs",
            "Generational differences",
        ],
    },
    Category {
        name: "Career",
        entries: &[
            "Job satisfaction vs. high salary",
            "Working from home vs. office",
            "Career change vs. job stability",
            "Entrepreneurship vs. employment",
            "Specializing vs. generalist knowledge",
        ],
    },
    Category {
        name: "Environment",
        entries: &[
            "Environmental protection vs. economic development",
            "Individual vs. governmental responsibility for climate",
            "Technology's impact on environment",
            "Traditional vs. alternative energy",
            "Local vs. global environmental solutions",
        ],
    },
    Category {
        name: "Lifestyle",
        entries: &[
            "Travel experiences vs. material possessions",
            "Traditional vs. non-traditional lifestyle choices",
            "Planning vs. spontaneity",
            "Independence vs. interdependence",
            "Work-life balance",
        ],
    },
];

pub const INTEGRATED_THEMES: &[Category] = &[
    Category {
        name: "Science",
        entries: &[
            "Scientific theory controversy",
            "New research findings",
            "Environmental phenomenon",
            "Medical discovery",
            "Technological innovation",
        ],
    },
    Category {
        name: "Social Science",
        entries: &[
            "Historical interpretation",
            "Economic policy",
            "Psychological theory",
            "Educational approach",
            "Urban development plan",
        ],
    },
    Category {
        name: "Academic",
        entries: &[
            "Research methodology",
            "Academic theory critique",
            "Campus policy change",
            "Student learning approach",
            "Academic resource allocation",
        ],
    },
];

/// Flatten a catalog into `"Category: Entry"` labels, with an optional prefix.
pub fn labels(catalog: &[Category], prefix: Option<&str>) -> Vec<String> {
    catalog
        .iter()
        .flat_map(|cat| {
            cat.entries.iter().map(move |entry| match prefix {
                Some(p) => format!("{p}: {}: {entry}", cat.name),
                None => format!("{}: {entry}", cat.name),
            })
        })
        .collect()
}

/// Which entries have already been handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicHistory {
    used: HashSet<String>,
    last: Option<String>,
}

impl TopicHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `label` has been picked since the last reset.
    pub fn contains(&self, label: &str) -> bool {
        self.used.contains(label)
    }

    /// Number of distinct labels picked since the last reset.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// True when nothing has been picked since the last reset.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// The most recent pick, if any.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    fn record(&mut self, label: String) {
        self.used.insert(label.clone());
        self.last = Some(label);
    }
}

/// Picks labels from a fixed list, preferring ones not yet in the history.
#[derive(Debug, Clone)]
pub struct TopicSelector {
    labels: Vec<String>,
}

impl TopicSelector {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn reading() -> Self {
        Self::new(labels(READING_TOPICS, None))
    }

    pub fn writing(kind: WritingTaskKind) -> Self {
        let catalog = match kind {
            WritingTaskKind::Integrated => INTEGRATED_THEMES,
            WritingTaskKind::Independent => INDEPENDENT_THEMES,
        };
        Self::new(labels(catalog, Some(kind.theme_prefix())))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Pick a random unused label and record it.
    ///
    /// Once every label has been used the history starts over, but the label
    /// picked last is still skipped on the next draw. Returns `None` only for
    /// an empty selector.
    pub fn pick<R: Rng + ?Sized>(&self, history: &mut TopicHistory, rng: &mut R) -> Option<String> {
        if self.labels.is_empty() {
            return None;
        }

        let mut available: Vec<&String> = self
            .labels
            .iter()
            .filter(|l| !history.contains(l))
            .collect();

        if available.is_empty() {
            tracing::debug!(total = self.labels.len(), "topic list exhausted, starting over");
            history.used.clear();
            available = self
                .labels
                .iter()
                .filter(|l| self.labels.len() == 1 || history.last() != Some(l.as_str()))
                .collect();
        }

        let selected = available.choose(rng).map(|s| (*s).clone())?;
        history.record(selected.clone());
        Some(selected)
    }
}
