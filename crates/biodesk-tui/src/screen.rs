//! Tab bar entries: the dashboard plus one tab per top-level collection.

use std::fmt;

use biodesk_core::{EntityKind, Route};

/// A tab in the bottom bar, reachable with a number key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Dashboard, // 1
    Patients,   // 2
    Tumors,     // 3
    Biopsies,   // 4
    Biomodels,  // 5
    Passages,   // 6
    Trials,     // 7
}

impl Tab {
    /// All tabs in tab-bar order.
    pub const ALL: [Tab; 7] = [
        Self::Dashboard,
        Self::Patients,
        Self::Tumors,
        Self::Biopsies,
        Self::Biomodels,
        Self::Passages,
        Self::Trials,
    ];

    /// Number key (1-7) for this tab.
    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Patients => 2,
            Self::Tumors => 3,
            Self::Biopsies => 4,
            Self::Biomodels => 5,
            Self::Passages => 6,
            Self::Trials => 7,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.number() == n)
    }

    /// Next tab in bar order (wraps around).
    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous tab in bar order (wraps around).
    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&t| t == self).unwrap_or(0)
    }

    /// Collection shown by this tab; `None` for the dashboard.
    pub fn kind(self) -> Option<EntityKind> {
        match self {
            Self::Dashboard => None,
            Self::Patients => Some(EntityKind::Patient),
            Self::Tumors => Some(EntityKind::Tumor),
            Self::Biopsies => Some(EntityKind::LiquidBiopsy),
            Self::Biomodels => Some(EntityKind::Biomodel),
            Self::Passages => Some(EntityKind::Passage),
            Self::Trials => Some(EntityKind::Trial),
        }
    }

    pub fn route(self) -> Route {
        self.kind().map_or(Route::Dashboard, Route::List)
    }

    /// The tab a route lives under. Trial subtypes and sub-records sit
    /// under Trials.
    pub fn for_route(route: &Route) -> Self {
        let Some(kind) = route.kind() else {
            return Self::Dashboard;
        };
        Self::ALL
            .into_iter()
            .find(|tab| tab.kind() == Some(kind))
            .unwrap_or(Self::Trials)
    }

    pub fn label(self) -> &'static str {
        self.kind().map_or("Dashboard", EntityKind::label)
    }

    /// Compact label for narrow terminals (< 100 cols).
    pub fn label_short(self) -> &'static str {
        match self {
            Self::Dashboard => "Dash",
            Self::Patients => "Pat",
            Self::Tumors => "Tum",
            Self::Biopsies => "LB",
            Self::Biomodels => "Bio",
            Self::Passages => "Pas",
            Self::Trials => "Tri",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
