//! Properties and roles.
//!
//! A role is a named vector of ordinal adjustments, one per attribute
//! channel. Each level maps to a fixed constant through a lookup table, so
//! resolving a role into concrete attributes is a pure function. A role is
//! only accepted if its levels sum to zero: boosting one channel has to be
//! paid for by decreasing others.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Ordinal adjustment level for a single channel.
///
/// Serialized as a signed integer. Unknown integers read back as `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i8", into = "i8")]
pub enum Level {
    Decreased,
    #[default]
    Default,
    Increased,
    Boosted,
}

impl Level {
    pub fn value(self) -> i8 {
        match self {
            Level::Decreased => -1,
            Level::Default => 0,
            Level::Increased => 1,
            Level::Boosted => 2,
        }
    }

    fn slot(self) -> usize {
        (self.value() + 1) as usize
    }
}

impl From<i8> for Level {
    fn from(raw: i8) -> Self {
        match raw {
            -1 => Level::Decreased,
            1 => Level::Increased,
            2 => Level::Boosted,
            _ => Level::Default,
        }
    }
}

impl From<Level> for i8 {
    fn from(level: Level) -> i8 {
        level.value()
    }
}

const SPEED: [f64; 4] = [3.0, 4.0, 5.0, 6.0];
const TURN_RATE: [f64; 4] = [6.0, 8.0, 12.0, 16.0];
const CAPACITY: [u32; 4] = [4, 5, 7, 10];
const SIGHT: [f64; 4] = [45.0, 60.0, 75.0, 90.0];
const RANGE_MULTIPLIER: [f64; 4] = [0.75, 1.0, 1.5, 2.0];
const STAMINA: [u32; 4] = [50, 100, 175, 250];
const ATTACK: [u32; 4] = [0, 10, 20, 30];

/// Per-channel adjustment vector for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub speed: Level,
    pub turn_rate: Level,
    pub capacity: Level,
    pub sight: Level,
    pub range: Level,
    pub stamina: Level,
    pub attack: Level,
}

impl Adjustments {
    /// All channels at their default level.
    pub fn baseline() -> Self {
        Self::default()
    }

    fn levels(&self) -> [Level; 7] {
        [
            self.speed,
            self.turn_rate,
            self.capacity,
            self.sight,
            self.range,
            self.stamina,
            self.attack,
        ]
    }

    pub fn sum(&self) -> i32 {
        self.levels().iter().map(|l| l.value() as i32).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.sum() == 0
    }
}

/// Concrete numeric attributes an agent is built with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Distance per tick.
    pub speed: f64,
    /// Degrees per tick.
    pub turn_rate: f64,
    /// Maximum carried load.
    pub capacity: u32,
    pub sight_radius: f64,
    /// Marking range, scaled from the simulation's base range.
    pub range: u32,
    pub stamina: u32,
    pub attack: u32,
}

impl AttributeSet {
    /// Attributes of an agent with no role.
    pub fn baseline(base_range: f64) -> Self {
        resolve_attributes(&Adjustments::baseline(), base_range)
    }
}

/// Map an adjustment vector onto concrete attributes.
pub fn resolve_attributes(adjustments: &Adjustments, base_range: f64) -> AttributeSet {
    AttributeSet {
        speed: SPEED[adjustments.speed.slot()],
        turn_rate: TURN_RATE[adjustments.turn_rate.slot()],
        capacity: CAPACITY[adjustments.capacity.slot()],
        sight_radius: SIGHT[adjustments.sight.slot()],
        range: (base_range * RANGE_MULTIPLIER[adjustments.range.slot()]).max(0.0) as u32,
        stamina: STAMINA[adjustments.stamina.slot()],
        attack: ATTACK[adjustments.attack.slot()],
    }
}

/// Number of live agents per role name.
pub type RoleCounts = BTreeMap<String, usize>;

/// Named roles, each guaranteed balanced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoleTable {
    roles: BTreeMap<String, Adjustments>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock roles shipped with the engine.
    pub fn standard() -> Self {
        use Level::*;
        let mut roles = BTreeMap::new();
        roles.insert("worker".to_string(), Adjustments::baseline());
        roles.insert(
            "scout".to_string(),
            Adjustments {
                speed: Boosted,
                sight: Increased,
                capacity: Decreased,
                stamina: Decreased,
                attack: Decreased,
                ..Adjustments::default()
            },
        );
        roles.insert(
            "carrier".to_string(),
            Adjustments {
                capacity: Boosted,
                speed: Decreased,
                attack: Decreased,
                ..Adjustments::default()
            },
        );
        roles.insert(
            "soldier".to_string(),
            Adjustments {
                attack: Boosted,
                stamina: Increased,
                sight: Decreased,
                capacity: Decreased,
                range: Decreased,
                ..Adjustments::default()
            },
        );
        Self { roles }
    }

    /// Add a role, rejecting empty names, duplicates and unbalanced vectors.
    pub fn define(&mut self, name: impl Into<String>, adjustments: Adjustments) -> CoreResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CoreError::EmptyRoleName);
        }
        if self.roles.contains_key(&name) {
            return Err(CoreError::DuplicateRole(name));
        }
        if !adjustments.is_balanced() {
            return Err(CoreError::UnbalancedRole {
                sum: adjustments.sum(),
                role: name,
            });
        }
        debug!(role = %name, ?adjustments, "role defined");
        self.roles.insert(name, adjustments);
        Ok(())
    }

    /// Build a table from raw pairs, validating each one.
    pub fn from_roles<I, S>(roles: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, Adjustments)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, adjustments) in roles {
            table.define(name, adjustments)?;
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&Adjustments> {
        self.roles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Adjustments)> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Attributes for `name`, or the baseline when the role is unknown.
    pub fn attributes_for(&self, name: &str, base_range: f64) -> AttributeSet {
        match self.roles.get(name) {
            Some(adjustments) => resolve_attributes(adjustments, base_range),
            None => AttributeSet::baseline(base_range),
        }
    }
}

impl<'de> Deserialize<'de> for RoleTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Adjustments>::deserialize(deserializer)?;
        RoleTable::from_roles(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_levels_reproduce_baseline() {
        let attrs = AttributeSet::baseline(100.0);
        assert_eq!(attrs.speed, 4.0);
        assert_eq!(attrs.turn_rate, 8.0);
        assert_eq!(attrs.capacity, 5);
        assert_eq!(attrs.sight_radius, 60.0);
        assert_eq!(attrs.range, 100);
        assert_eq!(attrs.stamina, 100);
        assert_eq!(attrs.attack, 10);
    }

    #[test]
    fn boosted_and_decreased_use_table_extremes() {
        let adj = Adjustments {
            speed: Level::Boosted,
            range: Level::Decreased,
            capacity: Level::Decreased,
            attack: Level::Decreased,
            ..Adjustments::default()
        };
        let attrs = resolve_attributes(&adj, 200.0);
        assert_eq!(attrs.speed, 6.0);
        assert_eq!(attrs.range, 150);
        assert_eq!(attrs.capacity, 4);
        assert_eq!(attrs.attack, 0);
    }

    #[test]
    fn unknown_integers_fall_back_to_default() {
        assert_eq!(Level::from(7), Level::Default);
        assert_eq!(Level::from(-3), Level::Default);
        assert_eq!(Level::from(2), Level::Boosted);
        assert_eq!(i8::from(Level::Decreased), -1);
    }

    #[test]
    fn define_rejects_bad_roles() {
        let mut table = RoleTable::new();
        let lopsided = Adjustments {
            speed: Level::Boosted,
            ..Adjustments::default()
        };
        assert_eq!(
            table.define("runner", lopsided),
            Err(CoreError::UnbalancedRole { role: "runner".into(), sum: 2 })
        );
        assert_eq!(table.define("  ", Adjustments::default()), Err(CoreError::EmptyRoleName));
        table.define("plain", Adjustments::default()).unwrap();
        assert_eq!(
            table.define("plain", Adjustments::default()),
            Err(CoreError::DuplicateRole("plain".into()))
        );
    }

    #[test]
    fn unknown_role_gets_baseline() {
        let table = RoleTable::standard();
        assert_eq!(table.attributes_for("queen", 50.0), AttributeSet::baseline(50.0));
        assert_ne!(table.attributes_for("scout", 50.0), AttributeSet::baseline(50.0));
    }
}
