#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Control panel state for per-category rollout tuning.
//!
//! The panel discovers categories as responses name them, tracks one current
//! selection whose sliders the user edits, and exports its entries for
//! payload serialization. Entry defaults come from the environment-overrides
//! pseudo-config; reloading that resource is an explicit fetch-then-apply
//! operation, so values stay as stale as the caller's refresh cadence allows.

use rollout_reef_core::{Category, PanelValues};
use serde::Deserialize;

/// Delay probability forced onto entries whenever the overrides reload
/// succeeds.
const OVERRIDE_DELAY_PERCENT: u32 = 100;

/// Environment-sourced defaults applied to newly discovered panel entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    return_500: u32,
    delay_percent: u32,
    delay_length: u32,
}

#[derive(Debug, Default, Deserialize)]
struct EnvDocument {
    #[serde(default, rename = "errorRate")]
    error_rate: Option<u32>,
    #[serde(default)]
    latency: Option<u32>,
}

impl EnvOverrides {
    /// Builds overrides from a fetched pseudo-config resource.
    ///
    /// The body is JS-literal-wrapped JSON (`const ENV_X = {...}`); the
    /// leading `const ENV_…=` token is stripped before parsing. A non-200
    /// status resets every override to zero, and an unparsable body is
    /// treated the same way rather than leaving values undefined.
    #[must_use]
    pub fn from_fetch(status: u16, body: &str) -> Self {
        if status != 200 {
            return Self::default();
        }

        let document: EnvDocument = match serde_json::from_str(strip_env_literal(body).trim()) {
            Ok(document) => document,
            Err(_) => return Self::default(),
        };

        Self {
            return_500: document.error_rate.unwrap_or(0),
            delay_percent: OVERRIDE_DELAY_PERCENT,
            delay_length: document.latency.unwrap_or(0),
        }
    }

    /// Error-rate percent applied to new entries.
    #[must_use]
    pub const fn return_500(&self) -> u32 {
        self.return_500
    }

    /// Delay probability percent applied to new entries.
    #[must_use]
    pub const fn delay_percent(&self) -> u32 {
        self.delay_percent
    }

    /// Injected latency in whole seconds applied to new entries.
    #[must_use]
    pub const fn delay_length(&self) -> u32 {
        self.delay_length
    }
}

/// Removes the leading `const ENV_…=` token from a pseudo-config body.
fn strip_env_literal(body: &str) -> &str {
    let Some(start) = body.find("const ENV_") else {
        return body;
    };
    match body[start..].find('=') {
        Some(offset) => &body[start + offset + 1..],
        None => body,
    }
}

/// One per-category configuration row owned by the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelEntry {
    category: Category,
    return_500: u32,
    delay_percent: u32,
    delay_length: u32,
}

impl PanelEntry {
    fn from_overrides(category: Category, overrides: &EnvOverrides) -> Self {
        Self {
            category,
            return_500: overrides.return_500(),
            delay_percent: overrides.delay_percent(),
            delay_length: overrides.delay_length(),
        }
    }

    /// Category the entry configures.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Probability (percent) that the backend answers with a 500.
    #[must_use]
    pub const fn return_500(&self) -> u32 {
        self.return_500
    }

    /// Probability (percent) that the backend injects latency.
    #[must_use]
    pub const fn delay_percent(&self) -> u32 {
        self.delay_percent
    }

    /// Injected latency in whole seconds.
    #[must_use]
    pub const fn delay_length(&self) -> u32 {
        self.delay_length
    }

    /// Exports the entry as boundary data for transmission.
    #[must_use]
    pub const fn values(&self) -> PanelValues {
        PanelValues::new(
            self.category,
            self.return_500,
            self.delay_percent,
            self.delay_length,
        )
    }
}

/// Slider positions applied to the currently selected entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderAdjustment {
    /// New error-rate percent.
    pub return_500: u32,
    /// New delay probability percent.
    pub delay_percent: u32,
    /// New injected latency in whole seconds.
    pub delay_length: u32,
}

/// Per-category configuration edited by the user and serialized for
/// transmission.
#[derive(Debug, Default)]
pub struct ControlPanel {
    entries: Vec<PanelEntry>,
    current: Option<usize>,
}

impl ControlPanel {
    /// Creates an empty panel; categories register as responses name them.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a category on first sight, seeding it from the overrides.
    ///
    /// The first discovered category becomes the current selection. Returns
    /// whether a new entry was created.
    pub fn observe_category(&mut self, category: Category, overrides: &EnvOverrides) -> bool {
        if self.entries.iter().any(|entry| entry.category == category) {
            return false;
        }

        self.entries
            .push(PanelEntry::from_overrides(category, overrides));
        if self.current.is_none() {
            self.current = Some(self.entries.len() - 1);
        }
        true
    }

    /// Selects the entry whose sliders subsequent adjustments edit.
    ///
    /// Returns `false` when the category has not been discovered yet.
    pub fn select(&mut self, category: Category) -> bool {
        match self
            .entries
            .iter()
            .position(|entry| entry.category == category)
        {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    /// Category currently selected for editing, if any.
    #[must_use]
    pub fn current_category(&self) -> Option<Category> {
        self.current.map(|index| self.entries[index].category)
    }

    /// Applies slider positions to the current selection.
    ///
    /// A panel without a selection ignores the adjustment.
    pub fn adjust(&mut self, adjustment: SliderAdjustment) {
        let Some(index) = self.current else {
            return;
        };
        let entry = &mut self.entries[index];
        entry.return_500 = adjustment.return_500;
        entry.delay_percent = adjustment.delay_percent;
        entry.delay_length = adjustment.delay_length;
    }

    /// Entries in discovery order.
    #[must_use]
    pub fn entries(&self) -> &[PanelEntry] {
        &self.entries
    }

    /// Whether no category has been discovered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the panel for transmission.
    ///
    /// A configured panel serializes as a JSON array of entries; an empty
    /// panel serializes as the JSON string literal `"[]"`, an intentional
    /// type inconsistency the backend parser tolerates.
    #[must_use]
    pub fn payload(&self) -> String {
        if self.entries.is_empty() {
            return serde_json::to_string("[]").unwrap_or_else(|_| String::from("\"[]\""));
        }

        let values: Vec<PanelValues> = self.entries.iter().map(PanelEntry::values).collect();
        serde_json::to_string(&values).unwrap_or_else(|_| String::from("\"[]\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse_the_env_literal_wrapper() {
        let body = r#"const ENV_REEF = {"errorRate": 20, "latency": 2}"#;
        let overrides = EnvOverrides::from_fetch(200, body);

        assert_eq!(overrides.return_500(), 20);
        assert_eq!(overrides.delay_percent(), 100);
        assert_eq!(overrides.delay_length(), 2);
    }

    #[test]
    fn overrides_default_missing_fields_to_zero() {
        let overrides = EnvOverrides::from_fetch(200, r#"const ENV_REEF = {}"#);
        assert_eq!(overrides.return_500(), 0);
        assert_eq!(overrides.delay_length(), 0);
        assert_eq!(overrides.delay_percent(), 100);
    }

    #[test]
    fn overrides_accept_bare_json_without_the_wrapper() {
        let overrides = EnvOverrides::from_fetch(200, r#"{"errorRate": 5}"#);
        assert_eq!(overrides.return_500(), 5);
    }

    #[test]
    fn failed_fetches_reset_every_override() {
        let overrides = EnvOverrides::from_fetch(404, r#"const ENV_REEF = {"errorRate": 20}"#);
        assert_eq!(overrides, EnvOverrides::default());
        assert_eq!(overrides.delay_percent(), 0);
    }

    #[test]
    fn unparsable_bodies_reset_every_override() {
        let overrides = EnvOverrides::from_fetch(200, "const ENV_REEF = not json");
        assert_eq!(overrides, EnvOverrides::default());
    }

    #[test]
    fn first_discovered_category_becomes_current() {
        let mut panel = ControlPanel::new();
        let overrides = EnvOverrides::from_fetch(200, r#"const ENV_REEF = {"errorRate": 10}"#);

        assert!(panel.observe_category(Category::Yellow, &overrides));
        assert!(panel.observe_category(Category::Blue, &overrides));
        assert!(!panel.observe_category(Category::Yellow, &overrides));

        assert_eq!(panel.current_category(), Some(Category::Yellow));
        assert_eq!(panel.entries().len(), 2);
        assert_eq!(panel.entries()[0].return_500(), 10);
        assert_eq!(panel.entries()[0].delay_percent(), 100);
    }

    #[test]
    fn adjustments_only_touch_the_current_selection() {
        let mut panel = ControlPanel::new();
        let overrides = EnvOverrides::default();
        let _ = panel.observe_category(Category::Blue, &overrides);
        let _ = panel.observe_category(Category::Yellow, &overrides);

        assert!(panel.select(Category::Yellow));
        panel.adjust(SliderAdjustment {
            return_500: 40,
            delay_percent: 75,
            delay_length: 3,
        });

        assert_eq!(panel.entries()[0].return_500(), 0, "blue untouched");
        assert_eq!(panel.entries()[1].return_500(), 40);
        assert_eq!(panel.entries()[1].delay_percent(), 75);
        assert_eq!(panel.entries()[1].delay_length(), 3);
    }

    #[test]
    fn selecting_an_unknown_category_is_refused() {
        let mut panel = ControlPanel::new();
        assert!(!panel.select(Category::Blue));
        panel.adjust(SliderAdjustment {
            return_500: 99,
            delay_percent: 99,
            delay_length: 9,
        });
        assert!(panel.is_empty(), "adjusting an empty panel is a no-op");
    }

    #[test]
    fn empty_panels_serialize_as_the_quoted_array_literal() {
        let panel = ControlPanel::new();
        assert_eq!(panel.payload(), "\"[]\"");
    }

    #[test]
    fn configured_panels_serialize_as_a_json_array() {
        let mut panel = ControlPanel::new();
        let _ = panel.observe_category(Category::Blue, &EnvOverrides::default());
        panel.adjust(SliderAdjustment {
            return_500: 25,
            delay_percent: 100,
            delay_length: 2,
        });

        assert_eq!(
            panel.payload(),
            r#"[{"category":"blue","return500":25,"delayPercent":100,"delayLength":2}]"#
        );
    }
}
