use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// A preset country dataset the service can load by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCountry {
    pub id: String,
    pub name: String,
    pub continent: String,
}

impl SampleCountry {
    pub fn new(id: &str, name: &str, continent: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            continent: continent.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCatalog {
    pub countries: Vec<SampleCountry>,
}

impl Default for SampleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SampleCatalog {
    pub fn builtin() -> Self {
        Self {
            countries: vec![
                SampleCountry::new("hungary", "Hungary", "Europe"),
                SampleCountry::new("norway", "Norway", "Europe"),
                SampleCountry::new("japan", "Japan", "Asia"),
                SampleCountry::new("chile", "Chile", "South America"),
                SampleCountry::new("madagascar", "Madagascar", "Africa"),
            ],
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(payload).map_err(|e| CatalogError::Corrupt(e.to_string()))
    }

    pub fn countries(&self) -> &[SampleCountry] {
        &self.countries
    }

    pub fn get(&self, id: &str) -> Result<&SampleCountry, CatalogError> {
        self.countries
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub fn by_continent<'a>(
        &'a self,
        continent: &'a str,
    ) -> impl Iterator<Item = &'a SampleCountry> + 'a {
        self.countries.iter().filter(move |c| c.continent == continent)
    }
}
