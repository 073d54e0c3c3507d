use serde::{Deserialize, Serialize};

/// A price alert as stored by the alerts service.
///
/// The id is assigned server-side; the service publishes it as `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub coin_id: String,
    pub coin_name: String,
    pub target_price: f64,
}

/// Body of an alert creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub coin_id: String,
    pub coin_name: String,
    pub target_price: f64,
}

impl NewAlert {
    pub fn new(
        coin_id: impl Into<String>,
        coin_name: impl Into<String>,
        target_price: f64,
    ) -> Self {
        Self {
            coin_id: coin_id.into(),
            coin_name: coin_name.into(),
            target_price,
        }
    }
}

/// Which way the price moved to meet an alert's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCrossing {
    /// Rose from below the target to at/above it
    Rose,
    /// Fell from above the target to at/below it
    Fell,
    /// Observed exactly at the target
    Touched,
}

impl std::fmt::Display for AlertCrossing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCrossing::Rose => write!(f, "rose to"),
            AlertCrossing::Fell => write!(f, "fell to"),
            AlertCrossing::Touched => write!(f, "touched"),
        }
    }
}

/// An alert whose condition was met during an evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub alert: PriceAlert,
    pub coin_name: String,
    pub current_price: f64,
    pub crossing: AlertCrossing,
}

impl TriggeredAlert {
    /// The user-facing notification text.
    pub fn message(&self) -> String {
        format!(
            "🚨 {} price alert! Current: ${} Target: ${}",
            self.coin_name, self.current_price, self.alert.target_price
        )
    }
}
