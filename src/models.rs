use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::MissingPestPolicy;
use crate::pests::{Pest, Probability};

/// Body returned by `/predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    pub predicted_disease: String,
    pub predicted_pest_attacks: HashMap<String, Probability>,
}

/// Disease label plus pest probabilities under the internal pest names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub disease: String,
    /// Keyed by `Pest`, so iteration always follows the fixed report order.
    pub pest_attacks: BTreeMap<Pest, Probability>,
}

impl PredictionResult {
    pub fn probability(&self, pest: Pest) -> Option<&Probability> {
        self.pest_attacks.get(&pest)
    }

    pub fn missing_pests(&self) -> Vec<Pest> {
        Pest::ALL
            .into_iter()
            .filter(|p| !self.pest_attacks.contains_key(p))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.pest_attacks.len() == Pest::ALL.len()
    }
}

impl PredictionResponse {
    /// Renames service pest keys to internal ones. Unknown keys are ignored.
    /// Missing pests fail under `Strict` and are dropped under `Lenient`.
    pub fn into_result(self, policy: MissingPestPolicy) -> Result<PredictionResult, Vec<Pest>> {
        let mut by_service_key = self.predicted_pest_attacks;
        let mut pest_attacks = BTreeMap::new();
        let mut missing = Vec::new();

        for pest in Pest::ALL {
            match by_service_key.remove(pest.service_key()) {
                Some(probability) => {
                    pest_attacks.insert(pest, probability);
                }
                None => missing.push(pest),
            }
        }

        if !by_service_key.is_empty() {
            let mut extra: Vec<_> = by_service_key.keys().cloned().collect();
            extra.sort();
            tracing::debug!("Ignoring unknown pest keys in prediction: {:?}", extra);
        }

        if !missing.is_empty() {
            match policy {
                MissingPestPolicy::Strict => return Err(missing),
                MissingPestPolicy::Lenient => {
                    tracing::warn!("Prediction lacks pests {:?}; keeping the rest", missing);
                }
            }
        }

        Ok(PredictionResult { disease: self.predicted_disease, pest_attacks })
    }
}

/// Body sent to `/describe`: the disease plus each pest probability with its `%` removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub disease: String,
    pub flea_beetle: String,
    pub thrips: String,
    pub mealybug: String,
    pub jassids: String,
    pub red_spider_mites: String,
    pub leaf_eating_caterpillar: String,
}

impl AnalysisRequest {
    /// Fails with the first pest the result does not carry.
    pub fn from_result(result: &PredictionResult) -> Result<Self, Pest> {
        let field = |pest: Pest| {
            result
                .probability(pest)
                .map(|p| p.strip_percent().to_string())
                .ok_or(pest)
        };
        Ok(AnalysisRequest {
            disease: result.disease.clone(),
            flea_beetle: field(Pest::FleaBeetle)?,
            thrips: field(Pest::Thrips)?,
            mealybug: field(Pest::MealyBug)?,
            jassids: field(Pest::Jassids)?,
            red_spider_mites: field(Pest::RedSpiderMites)?,
            leaf_eating_caterpillar: field(Pest::LeafEatingCaterpillar)?,
        })
    }
}
