use serde::{Deserialize, Serialize};

/// A star system node on the galaxy map. The position is fixed at creation;
/// only `owner_id` changes as colonization shifts ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl StarSystem {
    /// Display label: the assigned name, or the raw id for unnamed systems.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Ownership signal for the influence field. Many planets per system;
/// colonization state is maintained by the backend, never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: String,
    pub system_id: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colonized_by: Option<String>,
}

/// Undirected edge in the fleet-traversable connectivity graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperlane {
    pub from_system: String,
    pub to_system: String,
}

impl Hyperlane {
    /// True when this lane joins `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.from_system == a && self.to_system == b)
            || (self.from_system == b && self.to_system == a)
    }
}

/// A fleet marker. The rendered position is derived every frame from the
/// current system and order progress; this struct is never the source of
/// truth for simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    pub id: String,
    pub current_system: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_system: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

/// A commercial lane, drawn in a distinct style from hyperlanes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    pub from_system: String,
    pub to_system: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperlane_connects_both_directions() {
        let lane = Hyperlane {
            from_system: "sol".into(),
            to_system: "alpha-centauri".into(),
        };
        assert!(lane.connects("sol", "alpha-centauri"));
        assert!(lane.connects("alpha-centauri", "sol"));
        assert!(!lane.connects("sol", "vega"));
    }

    #[test]
    fn system_label_falls_back_to_id() {
        let named = StarSystem {
            id: "sys-1".into(),
            x: 0.0,
            y: 0.0,
            name: Some("Sol".into()),
            owner_id: None,
        };
        let unnamed = StarSystem {
            id: "sys-2".into(),
            x: 0.0,
            y: 0.0,
            name: None,
            owner_id: None,
        };
        assert_eq!(named.label(), "Sol");
        assert_eq!(unnamed.label(), "sys-2");
    }

    #[test]
    fn system_deserializes_without_optional_fields() {
        let sys: StarSystem =
            serde_json::from_str(r#"{"id":"s1","x":120.5,"y":-40.0}"#).expect("minimal system");
        assert_eq!(sys.name, None);
        assert_eq!(sys.owner_id, None);
        assert_eq!(sys.position(), (120.5, -40.0));
    }
}
