//! Deployment configuration
//!
//! Settings arrive already parsed from the deployment's configuration source;
//! every section can also be read from YAML directly.

use crate::data_model::BranchDirectory;
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// Statuses ranked by every deployment unless overridden.
pub const BUILTIN_STATUS_RANKINGS: [(&str, i32); 3] = [
    ("Lost--Library Applied", 1),
    ("Charged", 2),
    ("On Hold", 3),
];

/// Rank of a status with no entry in the ranking table.
pub const DEFAULT_STATUS_RANK: i32 = 32000;

fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, ConfigError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Rank lookup for branch and location ordering.
///
/// Deserializes from a map (`{MAIN: 1, WEST: 2}`), a sequence of keys, or the
/// colon-separated list form `"MAIN=1:WEST:EAST/STACKS"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "OrderRepr")]
pub struct OrderTable(HashMap<String, i32>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderRepr {
    List(String),
    Keys(Vec<String>),
    Map(HashMap<String, i32>),
}

impl TryFrom<OrderRepr> for OrderTable {
    type Error = ConfigError;

    fn try_from(repr: OrderRepr) -> Result<Self, Self::Error> {
        match repr {
            OrderRepr::List(list) => OrderTable::parse(&list),
            OrderRepr::Keys(keys) => Ok(keys
                .into_iter()
                .enumerate()
                .map(|(i, key)| (key, i as i32))
                .collect()),
            OrderRepr::Map(map) => Ok(OrderTable(map)),
        }
    }
}

impl OrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key` / `key=rank` elements separated by `:`. An element without
    /// an explicit rank gets its 0-based position in the list.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut ranks = HashMap::new();
        for (position, element) in list.split(':').enumerate() {
            let element = element.trim();
            if element.is_empty() {
                continue;
            }
            let (key, rank) = match element.split_once('=') {
                Some((key, rank)) => {
                    let rank = rank.trim().parse::<i32>().map_err(|e| {
                        ConfigError::InvalidOrder {
                            element: element.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    (key.trim(), rank)
                }
                None => (element, position as i32),
            };
            if key.is_empty() {
                return Err(ConfigError::InvalidOrder {
                    element: element.to_string(),
                    message: "empty key".to_string(),
                });
            }
            ranks.insert(key.to_string(), rank);
        }
        Ok(OrderTable(ranks))
    }

    pub fn with_rank(mut self, key: impl Into<String>, rank: i32) -> Self {
        self.0.insert(key.into(), rank);
        self
    }

    pub fn rank(&self, key: &str) -> Option<i32> {
        self.0.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, i32)> for OrderTable {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        OrderTable(iter.into_iter().collect())
    }
}

/// Status Classifier settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Deployment rankings, merged over [`BUILTIN_STATUS_RANKINGS`]
    pub rankings: HashMap<String, i32>,

    /// Statuses that mean "on the shelf" when the backend sends no flag
    #[serde(alias = "availableStatuses")]
    pub available_statuses: Vec<String>,

    #[serde(alias = "defaultRank")]
    pub default_rank: i32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            rankings: HashMap::new(),
            available_statuses: vec!["Available".to_string()],
            default_rank: DEFAULT_STATUS_RANK,
        }
    }
}

impl StatusConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        from_yaml(yaml)
    }

    /// Built-in rankings with the deployment's entries applied on top.
    pub fn effective_rankings(&self) -> HashMap<String, i32> {
        let mut rankings: HashMap<String, i32> = BUILTIN_STATUS_RANKINGS
            .iter()
            .map(|(status, rank)| (status.to_string(), *rank))
            .collect();
        rankings.extend(self.rankings.iter().map(|(k, v)| (k.clone(), *v)));
        rankings
    }
}

/// Holding Normalizer settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Format key (or `*`) to process types that hide a copy
    #[serde(alias = "hiddenProcessTypes")]
    pub hidden_process_types: HashMap<String, Vec<String>>,

    #[serde(alias = "groupByLocation")]
    pub group_by_location: bool,

    #[serde(alias = "placeholderPrefix")]
    pub placeholder_prefix: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            hidden_process_types: HashMap::new(),
            group_by_location: false,
            placeholder_prefix: "HLD_".to_string(),
        }
    }
}

impl NormalizerConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        from_yaml(yaml)
    }

    pub fn is_hidden(&self, format: Option<&str>, process_type: &str) -> bool {
        let listed = |key: &str| {
            self.hidden_process_types
                .get(key)
                .is_some_and(|types| types.iter().any(|t| t == process_type))
        };
        format.is_some_and(|f| listed(f)) || listed("*")
    }
}

/// Holdings Ranking Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Keys are `branch` or `branch/location`; the composite wins
    #[serde(alias = "branchOrder")]
    pub branch_order: OrderTable,

    #[serde(alias = "locationOrder")]
    pub location_order: OrderTable,

    #[serde(alias = "sortByEnumChron")]
    pub sort_by_enum_chron: bool,

    #[serde(alias = "singleReservationQueue")]
    pub single_reservation_queue: bool,

    #[serde(alias = "displayTotalHoldCount")]
    pub display_total_hold_count: bool,

    #[serde(alias = "countPlaceholdersInTotal")]
    pub count_placeholders_in_total: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            branch_order: OrderTable::default(),
            location_order: OrderTable::default(),
            sort_by_enum_chron: false,
            single_reservation_queue: false,
            display_total_hold_count: false,
            count_placeholders_in_total: true,
        }
    }
}

impl RankingConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        from_yaml(yaml)
    }
}

/// Ordering of the real pickup locations offered to a patron.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "PickupOrderRepr")]
pub enum PickupOrder {
    /// Case-insensitive by label
    #[default]
    Alphabetical,
    /// As the catalog lists them
    Catalog,
    /// Listed ids first in list order, the rest alphabetically
    Explicit(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PickupOrderRepr {
    Name(String),
    Ids(Vec<String>),
}

impl From<PickupOrderRepr> for PickupOrder {
    fn from(repr: PickupOrderRepr) -> Self {
        match repr {
            PickupOrderRepr::Name(name) => match name.trim().to_ascii_lowercase().as_str() {
                "" | "alphabetical" | "default" => PickupOrder::Alphabetical,
                "catalog" => PickupOrder::Catalog,
                _ => PickupOrder::Explicit(
                    name.split(':')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(String::from)
                        .collect(),
                ),
            },
            PickupOrderRepr::Ids(ids) => PickupOrder::Explicit(ids),
        }
    }
}

/// Pickup-Rule Engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Rule lines, evaluated in order
    pub rules: Vec<String>,

    /// Location ids never offered, even when a rule grants them
    #[serde(alias = "excludePickupLocations")]
    pub exclude: Vec<String>,

    #[serde(alias = "pickUpLocationOrder")]
    pub order: PickupOrder,
}

impl PickupConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        from_yaml(yaml)
    }
}

/// All engine settings for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HoldshelfConfig {
    pub status: StatusConfig,
    pub normalizer: NormalizerConfig,
    pub ranking: RankingConfig,
    pub pickup: PickupConfig,
    pub branches: BranchDirectory,
}

impl HoldshelfConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        from_yaml(yaml)
    }
}
