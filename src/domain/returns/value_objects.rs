use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Return Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnReason {
    DefectiveProduct,
    NotAsDescribed,
    Damaged,
    ChangeOfMind,
    Other,
}

impl ReturnReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnReason::DefectiveProduct => "DefectiveProduct",
            ReturnReason::NotAsDescribed => "NotAsDescribed",
            ReturnReason::Damaged => "Damaged",
            ReturnReason::ChangeOfMind => "ChangeOfMind",
            ReturnReason::Other => "Other",
        }
    }
}

impl FromStr for ReturnReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DefectiveProduct" => Ok(ReturnReason::DefectiveProduct),
            "NotAsDescribed" => Ok(ReturnReason::NotAsDescribed),
            "Damaged" => Ok(ReturnReason::Damaged),
            "ChangeOfMind" => Ok(ReturnReason::ChangeOfMind),
            "Other" => Ok(ReturnReason::Other),
            other => Err(format!("unknown return reason '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "Pending",
            ReturnStatus::Approved => "Approved",
            ReturnStatus::Rejected => "Rejected",
            ReturnStatus::Completed => "Completed",
        }
    }

    /// Pending and Approved returns still block a new request for the order
    pub fn is_open(&self) -> bool {
        matches!(self, ReturnStatus::Pending | ReturnStatus::Approved)
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ReturnStatus::Pending),
            "Approved" => Ok(ReturnStatus::Approved),
            "Rejected" => Ok(ReturnStatus::Rejected),
            "Completed" => Ok(ReturnStatus::Completed),
            other => Err(format!("unknown return status '{}'", other)),
        }
    }
}
