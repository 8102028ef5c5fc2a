//! Terminal view layer: view identities and tags, theme preference, and
//! markdown rendering of backend answers.

use termimad::MadSkin;

use crate::api::types::Source;
use crate::error::StoreError;
use crate::permissions::{Affordance, AffordanceTag};
use crate::session::{SessionStore, THEME_KEY};

/// The application's views, one per backend feature. Pleading generation,
/// jurisprudence search and consultation are paid features; the admin panel
/// is admin-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Welcome,
    Upload,
    Search,
    Documents,
    Cases,
    Pleading,
    Jurisprudence,
    Consultant,
    Admin,
}

impl View {
    pub const ALL: [View; 9] = [
        View::Welcome,
        View::Upload,
        View::Search,
        View::Documents,
        View::Cases,
        View::Pleading,
        View::Jurisprudence,
        View::Consultant,
        View::Admin,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Upload => "upload",
            Self::Search => "search",
            Self::Documents => "documents",
            Self::Cases => "cases",
            Self::Pleading => "pleading",
            Self::Jurisprudence => "jurisprudence",
            Self::Consultant => "consultant",
            Self::Admin => "admin",
        }
    }

    pub fn tag(self) -> AffordanceTag {
        match self {
            Self::Pleading | Self::Jurisprudence | Self::Consultant => AffordanceTag::PremiumOnly,
            Self::Admin => AffordanceTag::AdminOnly,
            _ => AffordanceTag::Open,
        }
    }
}

/// One affordance per view, for the permission pass at startup.
pub fn default_affordances() -> Vec<Affordance> {
    View::ALL
        .iter()
        .map(|v| Affordance::new(v.id(), v.tag()))
        .collect()
}

/// Display preference, persisted independently of the session so it
/// survives logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Stored theme, defaulting to dark when unset or unrecognized.
pub fn load_theme(store: &SessionStore) -> Result<Theme, StoreError> {
    Ok(store
        .get(THEME_KEY)?
        .as_deref()
        .and_then(Theme::parse)
        .unwrap_or_default())
}

pub fn save_theme(store: &SessionStore, theme: Theme) -> Result<(), StoreError> {
    store.put(THEME_KEY, theme.as_str())
}

/// Render a markdown answer to the terminal.
pub fn print_markdown(theme: Theme, text: &str) {
    skin_for(theme).print_text(text);
}

fn skin_for(theme: Theme) -> MadSkin {
    match theme {
        Theme::Dark => MadSkin::default_dark(),
        Theme::Light => MadSkin::default_light(),
    }
}

/// List the sources cited by an answer, with chunk and relevance detail
/// when the backend provides them.
pub fn print_sources(sources: &[Source]) {
    if sources.is_empty() {
        return;
    }

    println!("\nSources ({}):", sources.len());
    for source in sources {
        let mut line = format!("  - {}", source.filename);
        if let Some(chunk) = source.chunk_index {
            line.push_str(&format!(" (chunk {chunk})"));
        }
        if let Some(score) = source.relevance_score {
            line.push_str(&format!(" [relevance {:.0}%]", score * 100.0));
        }
        println!("{line}");
        if let Some(preview) = source.content_preview.as_deref().or(source.snippet.as_deref()) {
            let cleaned = preview.replace(['#', '*'], "");
            println!("      \"{}...\"", cleaned.trim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn premium_features_carry_the_premium_tag() {
        assert_eq!(View::Pleading.tag(), AffordanceTag::PremiumOnly);
        assert_eq!(View::Jurisprudence.tag(), AffordanceTag::PremiumOnly);
        assert_eq!(View::Consultant.tag(), AffordanceTag::PremiumOnly);
        assert_eq!(View::Admin.tag(), AffordanceTag::AdminOnly);
        assert_eq!(View::Search.tag(), AffordanceTag::Open);
    }

    #[test]
    fn theme_parse_and_default() {
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse(" DARK "), Some(Theme::Dark));
        assert_eq!(Theme::parse("sepia"), None);
    }

    #[test]
    fn theme_roundtrips_through_the_store() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        assert_eq!(load_theme(&store).unwrap(), Theme::Dark);
        save_theme(&store, Theme::Light).unwrap();
        assert_eq!(load_theme(&store).unwrap(), Theme::Light);
    }
}
