//! Name-search hints by coordinate area.
//!
//! When neither the catalog nor the live stop listing turns up enough rail
//! stops, the locator searches stops by name. These hints pick extra search
//! terms for a few well-known neighbourhoods.

use std::ops::RangeInclusive;

use crate::domain::Coordinates;

/// Search terms for one rectangular area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaHint {
    pub lat: RangeInclusive<f64>,
    pub lon: RangeInclusive<f64>,
    pub terms: Vec<String>,
}

impl AreaHint {
    pub fn contains(&self, at: Coordinates) -> bool {
        self.lat.contains(&at.lat) && self.lon.contains(&at.lon)
    }
}

/// Area hints plus terms that are always searched.
#[derive(Debug, Clone, Default)]
pub struct AreaHints {
    areas: Vec<AreaHint>,
    always: Vec<String>,
}

impl AreaHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an area. The first area containing a point wins.
    pub fn area(
        mut self,
        lat: RangeInclusive<f64>,
        lon: RangeInclusive<f64>,
        terms: &[&str],
    ) -> Self {
        self.areas.push(AreaHint {
            lat,
            lon,
            terms: terms.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    /// Add terms searched for every point.
    pub fn always(mut self, terms: &[&str]) -> Self {
        self.always.extend(terms.iter().map(|t| t.to_string()));
        self
    }

    /// Search terms for a point: the matching area's terms, then the
    /// always-searched terms.
    pub fn terms_for(&self, at: Coordinates) -> Vec<String> {
        self.areas
            .iter()
            .find(|a| a.contains(at))
            .map(|a| a.terms.clone())
            .unwrap_or_default()
            .into_iter()
            .chain(self.always.iter().cloned())
            .collect()
    }
}

/// Hints for Cambridge, Back Bay and downtown Boston.
pub fn boston_areas() -> AreaHints {
    AreaHints::new()
        .area(
            42.35..=42.37,
            -71.09..=-71.08,
            &["kendall", "mit", "central", "cambridge"],
        )
        .area(
            42.34..=42.36,
            -71.08..=-71.06,
            &["copley", "back bay", "boylston", "arlington"],
        )
        .area(
            42.355..=42.365,
            -71.065..=-71.055,
            &["downtown", "park", "state", "government"],
        )
        .always(&["station", "square"])
}
