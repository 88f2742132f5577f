use std::fmt;

use serde::{Deserialize, Serialize};

/// The six pests the prediction service scores, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pest {
    FleaBeetle,
    Thrips,
    MealyBug,
    Jassids,
    RedSpiderMites,
    LeafEatingCaterpillar,
}

impl Pest {
    pub const ALL: [Pest; 6] = [
        Pest::FleaBeetle,
        Pest::Thrips,
        Pest::MealyBug,
        Pest::Jassids,
        Pest::RedSpiderMites,
        Pest::LeafEatingCaterpillar,
    ];

    /// Label shown in reports and used as the key of a `PredictionResult`.
    pub fn display_name(self) -> &'static str {
        match self {
            Pest::FleaBeetle => "Flea Beetle",
            Pest::Thrips => "Thrips",
            Pest::MealyBug => "MealyBug",
            Pest::Jassids => "Jassids",
            Pest::RedSpiderMites => "Red Spider Mites",
            Pest::LeafEatingCaterpillar => "Leaf Eating Caterpillar",
        }
    }

    /// Key used by `/predict` under `predicted_pest_attacks`.
    pub fn service_key(self) -> &'static str {
        match self {
            Pest::FleaBeetle => "Flea Beetle",
            Pest::Thrips => "Thrips",
            Pest::MealyBug => "Mealybug",
            Pest::Jassids => "Jassids",
            Pest::RedSpiderMites => "Red-Spider Mites",
            Pest::LeafEatingCaterpillar => "Leaf Eating Caterpillar",
        }
    }

    /// Field name in the `/describe` request body.
    pub fn analysis_field(self) -> &'static str {
        match self {
            Pest::FleaBeetle => "flea_beetle",
            Pest::Thrips => "thrips",
            Pest::MealyBug => "mealybug",
            Pest::Jassids => "jassids",
            Pest::RedSpiderMites => "red_spider_mites",
            Pest::LeafEatingCaterpillar => "leaf_eating_caterpillar",
        }
    }

    pub fn from_service_key(key: &str) -> Option<Pest> {
        Pest::ALL.into_iter().find(|p| p.service_key() == key)
    }

    pub fn from_display_name(name: &str) -> Option<Pest> {
        Pest::ALL.into_iter().find(|p| p.display_name() == name)
    }
}

impl fmt::Display for Pest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Pest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for Pest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Pest::from_display_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown pest '{}'", name)))
    }
}

/// A pest probability as the service sends it, e.g. `"42%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Probability(String);

impl Probability {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Drops exactly one trailing `%`, leaving anything else untouched.
    pub fn strip_percent(&self) -> &str {
        self.0.strip_suffix('%').unwrap_or(&self.0)
    }

    /// Numeric magnitude from the leading decimal number, ignoring any suffix.
    pub fn percent(&self) -> Option<f64> {
        leading_float(&self.0)
    }

    /// Bar width in percent of the track, clamped to `0..=100`. Unparseable values draw no bar.
    pub fn bar_width(&self) -> f64 {
        match self.percent() {
            Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
            _ => 0.0,
        }
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Probability {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let mut digits = 0;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if digits == 0 {
        return None;
    }
    // Exponent only counts when digits follow it: "1e2" is 100, "1e%" is 1.
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..].iter().take_while(|b| b.is_ascii_digit()).count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    s[..end].parse().ok()
}
