//! Capacity settings entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Which management API family the capacity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "capacity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CapacityType {
    /// Microsoft Fabric capacity.
    Fabric,
    /// Power BI Embedded / Dedicated capacity.
    PowerBiDedicated,
}

impl CapacityType {
    /// Resource provider namespace used in management URLs.
    pub fn provider_namespace(&self) -> &'static str {
        match self {
            Self::Fabric => "Microsoft.Fabric",
            Self::PowerBiDedicated => "Microsoft.PowerBIDedicated",
        }
    }

    /// Management API version for this provider.
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::Fabric => "2023-11-01",
            Self::PowerBiDedicated => "2021-01-01",
        }
    }

    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fabric => "fabric",
            Self::PowerBiDedicated => "power_bi_dedicated",
        }
    }
}

impl std::fmt::Display for CapacityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CapacityType {
    type Err = reportal_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fabric" => Ok(Self::Fabric),
            "power_bi_dedicated" | "powerbidedicated" => Ok(Self::PowerBiDedicated),
            _ => Err(reportal_core::AppError::validation(format!(
                "Invalid capacity type: '{s}'"
            ))),
        }
    }
}

/// Singleton capacity configuration row.
///
/// Addressing columns are nullable so an administrator can save a partial
/// configuration; autoscaling stays disabled until all of them are filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CapacitySettings {
    /// Management API family.
    pub capacity_type: CapacityType,
    /// Capacity resource name.
    pub capacity_name: Option<String>,
    /// Resource group containing the capacity.
    pub resource_group: Option<String>,
    /// Subscription containing the resource group.
    pub subscription_id: Option<String>,
    /// Whether the controller may resume/suspend autonomously.
    pub auto_managed_capacity: bool,
    /// Last administrator update.
    pub updated_at: DateTime<Utc>,
}

/// Settings are missing a required addressing field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("capacity settings missing `{0}`")]
pub struct IncompleteSettings(pub &'static str);

/// Fully resolved address of a capacity resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityAddress {
    /// Management API family.
    pub capacity_type: CapacityType,
    /// Subscription ID.
    pub subscription_id: String,
    /// Resource group.
    pub resource_group: String,
    /// Capacity name.
    pub capacity_name: String,
}

impl CapacitySettings {
    /// Resolve the full resource address, or name the first missing field.
    pub fn address(&self) -> Result<CapacityAddress, IncompleteSettings> {
        fn required(
            value: &Option<String>,
            field: &'static str,
        ) -> Result<String, IncompleteSettings> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(IncompleteSettings(field))
        }

        Ok(CapacityAddress {
            capacity_type: self.capacity_type,
            subscription_id: required(&self.subscription_id, "subscription_id")?,
            resource_group: required(&self.resource_group, "resource_group")?,
            capacity_name: required(&self.capacity_name, "capacity_name")?,
        })
    }

    /// True when the controller is allowed to act and has full addressing.
    pub fn is_manageable(&self) -> bool {
        self.auto_managed_capacity && self.address().is_ok()
    }
}

impl CapacityAddress {
    /// Resource path relative to the management endpoint.
    pub fn resource_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/capacities/{}",
            self.subscription_id,
            self.resource_group,
            self.capacity_type.provider_namespace(),
            self.capacity_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CapacitySettings {
        CapacitySettings {
            capacity_type: CapacityType::Fabric,
            capacity_name: Some("reportcap".to_string()),
            resource_group: Some("rg-bi".to_string()),
            subscription_id: Some("0000-sub".to_string()),
            auto_managed_capacity: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_complete_settings_resolve_address() {
        let address = settings().address().expect("complete settings");
        assert_eq!(
            address.resource_path(),
            "/subscriptions/0000-sub/resourceGroups/rg-bi/providers/Microsoft.Fabric/capacities/reportcap"
        );
        assert!(settings().is_manageable());
    }

    #[test]
    fn test_blank_capacity_name_is_incomplete() {
        let mut s = settings();
        s.capacity_name = Some("   ".to_string());
        assert_eq!(s.address(), Err(IncompleteSettings("capacity_name")));
        assert!(!s.is_manageable());

        s.capacity_name = None;
        assert_eq!(s.address(), Err(IncompleteSettings("capacity_name")));
    }

    #[test]
    fn test_auto_managed_flag_gates_manageability() {
        let mut s = settings();
        s.auto_managed_capacity = false;
        assert!(s.address().is_ok());
        assert!(!s.is_manageable());
    }

    #[test]
    fn test_capacity_type_parsing() {
        assert_eq!("Fabric".parse::<CapacityType>().ok(), Some(CapacityType::Fabric));
        assert_eq!(
            "PowerBIDedicated".parse::<CapacityType>().ok(),
            Some(CapacityType::PowerBiDedicated)
        );
        assert!("premium".parse::<CapacityType>().is_err());
        assert_eq!(CapacityType::PowerBiDedicated.api_version(), "2021-01-01");
    }
}
