//! Bus route keys and resolved route descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::StopId;

/// Direction of a bus route variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteDirection {
    /// Outbound ("ascendente").
    Asc,
    /// Inbound ("descendente").
    Desc,
    /// Circular route.
    Circ,
    /// Direction not recorded by the validator.
    Undefined,
}

impl RouteDirection {
    /// Map a raw direction code to a direction.
    ///
    /// Accepts the single-letter operator codes (`A`, `D`, `C`) and the
    /// spelled-out names used by the processed route table. Anything else,
    /// including an empty field, is `Undefined`.
    ///
    /// # Examples
    ///
    /// ```
    /// use odx::domain::RouteDirection;
    ///
    /// assert_eq!(RouteDirection::from_code("A"), RouteDirection::Asc);
    /// assert_eq!(RouteDirection::from_code("DESC"), RouteDirection::Desc);
    /// assert_eq!(RouteDirection::from_code(""), RouteDirection::Undefined);
    /// ```
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "A" | "ASC" => RouteDirection::Asc,
            "D" | "DESC" => RouteDirection::Desc,
            "C" | "CIRC" => RouteDirection::Circ,
            _ => RouteDirection::Undefined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDirection::Asc => "ASC",
            RouteDirection::Desc => "DESC",
            RouteDirection::Circ => "CIRC",
            RouteDirection::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for RouteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one boarded bus service variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RouteKey {
    pub route_id: String,
    pub direction: RouteDirection,
    pub variant: u32,
}

impl RouteKey {
    pub fn new(route_id: impl Into<String>, direction: RouteDirection, variant: u32) -> Self {
        Self {
            route_id: route_id.into(),
            direction,
            variant,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.route_id, self.direction, self.variant)
    }
}

/// A resolved route descriptor: the key plus the ordered stops it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    #[serde(flatten)]
    key: RouteKey,
    stop_ids: Vec<StopId>,
}

impl Route {
    pub fn new(key: RouteKey, stop_ids: Vec<StopId>) -> Self {
        Self { key, stop_ids }
    }

    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    /// Stops served by this variant, in travel order.
    pub fn stop_ids(&self) -> &[StopId] {
        &self.stop_ids
    }

    /// Returns true if the variant calls at `stop`.
    pub fn serves(&self, stop: StopId) -> bool {
        self.stop_ids.contains(&stop)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route {} ({} stops)", self.key, self.stop_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_codes() {
        assert_eq!(RouteDirection::from_code("a"), RouteDirection::Asc);
        assert_eq!(RouteDirection::from_code("D"), RouteDirection::Desc);
        assert_eq!(RouteDirection::from_code("C"), RouteDirection::Circ);
        assert_eq!(RouteDirection::from_code("CIRC"), RouteDirection::Circ);
        assert_eq!(RouteDirection::from_code("X"), RouteDirection::Undefined);
        assert_eq!(RouteDirection::from_code(" "), RouteDirection::Undefined);
    }

    #[test]
    fn direction_serde_names() {
        let json = serde_json::to_string(&RouteDirection::Desc).unwrap();
        assert_eq!(json, "\"DESC\"");
        let parsed: RouteDirection = serde_json::from_str("\"UNDEFINED\"").unwrap();
        assert_eq!(parsed, RouteDirection::Undefined);
    }

    #[test]
    fn key_display() {
        let key = RouteKey::new("728", RouteDirection::Asc, 0);
        assert_eq!(key.to_string(), "728/ASC/0");
    }

    #[test]
    fn route_serves_its_stops() {
        let route = Route::new(
            RouteKey::new("728", RouteDirection::Asc, 0),
            vec![StopId(1), StopId(2), StopId(3)],
        );
        assert!(route.serves(StopId(2)));
        assert!(!route.serves(StopId(4)));
        assert_eq!(route.to_string(), "route 728/ASC/0 (3 stops)");
    }

    #[test]
    fn route_serializes_flat() {
        let route = Route::new(RouteKey::new("15E", RouteDirection::Circ, 2), vec![StopId(9)]);
        let value = serde_json::to_value(&route).unwrap();
        assert_eq!(value["route_id"], "15E");
        assert_eq!(value["direction"], "CIRC");
        assert_eq!(value["variant"], 2);
        assert_eq!(value["stop_ids"][0], 9);
    }
}
