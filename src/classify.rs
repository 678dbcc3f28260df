use serde_derive::Serialize;

/// Coarse occupancy bucket derived from the signal counters.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum CrowdLevel {
    Calm,
    Moderate,
    Crowded,
}

impl CrowdLevel {
    pub fn ordinal(&self) -> u8 {
        match self {
            CrowdLevel::Calm => 0,
            CrowdLevel::Moderate => 1,
            CrowdLevel::Crowded => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrowdLevel::Calm => "CALM",
            CrowdLevel::Moderate => "MODERATE",
            CrowdLevel::Crowded => "CROWDED",
        }
    }
}

/// Which counter a policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalSignals,
    BleCount,
}

impl Metric {
    pub fn value(&self, wifi_count: u16, ble_count: u16) -> u32 {
        match self {
            Metric::TotalSignals => u32::from(wifi_count) + u32::from(ble_count),
            Metric::BleCount => u32::from(ble_count),
        }
    }
}

/// Two thresholds over one metric. A value equal to a threshold falls into
/// the upper bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationPolicy {
    pub name: &'static str,
    pub metric: Metric,
    pub calm_below: u32,
    pub crowded_from: u32,
}

impl ClassificationPolicy {
    pub fn classify(&self, wifi_count: u16, ble_count: u16) -> CrowdLevel {
        let value = self.metric.value(wifi_count, ble_count);
        if value < self.calm_below {
            CrowdLevel::Calm
        } else if value < self.crowded_from {
            CrowdLevel::Moderate
        } else {
            CrowdLevel::Crowded
        }
    }
}

/// Counter-only and beacon payloads (4 and 5 bytes).
pub const COUNTS_POLICY: ClassificationPolicy = ClassificationPolicy {
    name: "counts",
    metric: Metric::TotalSignals,
    calm_below: 5,
    crowded_from: 20,
};

/// Environment payloads (6 bytes) classify on BLE devices only.
pub const BLE_POLICY: ClassificationPolicy = ClassificationPolicy {
    name: "ble",
    metric: Metric::BleCount,
    calm_below: 20,
    crowded_from: 80,
};

/// CROWD_STATUS for the dashboard field list. Deliberately separate from the
/// per-version policies: the two disagree and have not been reconciled.
pub const DASHBOARD_POLICY: ClassificationPolicy = ClassificationPolicy {
    name: "dashboard",
    metric: Metric::TotalSignals,
    calm_below: 40,
    crowded_from: 80,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_policy_boundaries() {
        // wifi=0 so total_signals == ble_count
        assert_eq!(COUNTS_POLICY.classify(0, 4), CrowdLevel::Calm);
        assert_eq!(COUNTS_POLICY.classify(0, 5), CrowdLevel::Moderate);
        assert_eq!(COUNTS_POLICY.classify(0, 19), CrowdLevel::Moderate);
        assert_eq!(COUNTS_POLICY.classify(0, 20), CrowdLevel::Crowded);
        assert_eq!(COUNTS_POLICY.classify(3, 2), CrowdLevel::Moderate);
    }

    #[test]
    fn test_ble_policy_ignores_wifi() {
        assert_eq!(BLE_POLICY.classify(500, 19), CrowdLevel::Calm);
        assert_eq!(BLE_POLICY.classify(0, 20), CrowdLevel::Moderate);
        assert_eq!(BLE_POLICY.classify(0, 79), CrowdLevel::Moderate);
        assert_eq!(BLE_POLICY.classify(0, 80), CrowdLevel::Crowded);
    }

    #[test]
    fn test_dashboard_policy_boundaries() {
        assert_eq!(DASHBOARD_POLICY.classify(20, 19), CrowdLevel::Calm);
        assert_eq!(DASHBOARD_POLICY.classify(20, 20), CrowdLevel::Moderate);
        assert_eq!(DASHBOARD_POLICY.classify(40, 39), CrowdLevel::Moderate);
        assert_eq!(DASHBOARD_POLICY.classify(40, 40), CrowdLevel::Crowded);
    }

    #[test]
    fn test_total_signals_does_not_overflow() {
        assert_eq!(Metric::TotalSignals.value(u16::MAX, u16::MAX), 131_070);
        assert_eq!(
            COUNTS_POLICY.classify(u16::MAX, u16::MAX),
            CrowdLevel::Crowded
        );
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(CrowdLevel::Calm.ordinal(), 0);
        assert_eq!(CrowdLevel::Crowded.ordinal(), 2);
        assert_eq!(CrowdLevel::Moderate.as_str(), "MODERATE");
        assert_eq!(
            serde_json::to_string(&CrowdLevel::Crowded).unwrap(),
            "\"CROWDED\""
        );
    }
}
