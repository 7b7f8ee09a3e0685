// Site discovery payload (GET /api/npm.search/1.0/search?types=sdwan.site.name)

use serde::{Deserialize, Serialize};

use super::job::id_as_string;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default)]
    pub has_data: bool,
    #[serde(rename = "sdwan.site.name")]
    pub site: SiteRef,
}

impl Site {
    pub fn id(&self) -> &str {
        &self.site.id
    }

    pub fn name(&self) -> &str {
        &self.site.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSearch {
    #[serde(default)]
    pub items: Vec<Site>,
}
