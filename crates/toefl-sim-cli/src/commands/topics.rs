//! The `toefl-sim topics` command.

use anyhow::Result;
use clap::ValueEnum;

use toefl_sim_core::topics::{Category, INDEPENDENT_THEMES, INTEGRATED_THEMES, READING_TOPICS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogKind {
    Reading,
    Independent,
    Integrated,
}

impl CatalogKind {
    fn title(self) -> &'static str {
        match self {
            CatalogKind::Reading => "Reading topics",
            CatalogKind::Independent => "Independent writing themes",
            CatalogKind::Integrated => "Integrated writing themes",
        }
    }

    fn catalog(self) -> &'static [Category] {
        match self {
            CatalogKind::Reading => READING_TOPICS,
            CatalogKind::Independent => INDEPENDENT_THEMES,
            CatalogKind::Integrated => INTEGRATED_THEMES,
        }
    }
}

pub fn execute(kind: Option<CatalogKind>) -> Result<()> {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => CatalogKind::value_variants().to_vec(),
    };

    for kind in kinds {
        print!("{}", render(kind));
    }
    Ok(())
}

fn render(kind: CatalogKind) -> String {
    let catalog = kind.catalog();
    let count: usize = catalog.iter().map(|c| c.entries.len()).sum();
    let mut text = format!("{} ({count})\n", kind.title());
    for category in catalog {
        text.push_str(&format!("  {}\n", category.name));
        for entry in category.entries {
            text.push_str(&format!("    - {entry}\n"));
        }
    }
    text.push('\n');
    text
}
