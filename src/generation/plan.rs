use crate::error::ApiError;
use crate::exercise::{default_quotas, CategoryQuota};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Ordered quota table plus the per-category attempt budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub categories: Vec<CategoryQuota>,
    pub max_attempts: usize,
}

impl Default for GenerationPlan {
    fn default() -> Self {
        Self {
            categories: default_quotas(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl GenerationPlan {
    pub fn new(categories: Vec<CategoryQuota>, max_attempts: usize) -> Self {
        Self {
            categories,
            max_attempts,
        }
    }

    pub fn total_target(&self) -> usize {
        self.categories.iter().map(|q| q.quota).sum()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.categories.is_empty() {
            return Err(ApiError::ConfigError(
                "Generation plan must contain at least one category".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ApiError::ConfigError(
                "Generation plan max_attempts must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for quota in &self.categories {
            if quota.quota == 0 {
                return Err(ApiError::ConfigError(format!(
                    "Quota for {} must be at least 1",
                    quota.category
                )));
            }
            if !seen.insert(quota.category) {
                return Err(ApiError::ConfigError(format!(
                    "Category {} listed more than once",
                    quota.category
                )));
            }
        }
        Ok(())
    }
}
