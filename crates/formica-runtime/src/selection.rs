//! Role selection strategies.
//!
//! When the population is topped up, each new agent gets a role from the
//! configured [`RoleSelector`]. Selectors see the current per-role counts
//! and return a role name; a name missing from the role table yields the
//! baseline attributes.

use formica_core::roles::RoleCounts;

/// Picks a role for the next spawned agent.
pub trait RoleSelector: Send + Sync {
    fn choose(&self, counts: &RoleCounts) -> String;
}

impl<F> RoleSelector for F
where
    F: Fn(&RoleCounts) -> String + Send + Sync,
{
    fn choose(&self, counts: &RoleCounts) -> String {
        self(counts)
    }
}

/// Always the same role. The default is the empty name, i.e. no role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedRole(pub String);

impl FixedRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }
}

impl RoleSelector for FixedRole {
    fn choose(&self, _counts: &RoleCounts) -> String {
        self.0.clone()
    }
}

/// Keeps the population close to a target mix.
///
/// Picks the role whose `count / weight` is lowest, so a role with weight 3
/// ends up with three times as many agents as a role with weight 1.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedRoles {
    weights: Vec<(String, f64)>,
}

impl BalancedRoles {
    /// Roles with non-positive weights are ignored.
    pub fn new<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut weights: Vec<(String, f64)> = weights
            .into_iter()
            .map(|(name, w)| (name.into(), w))
            .filter(|(_, w)| w.is_finite() && *w > 0.0)
            .collect();
        weights.sort_by(|a, b| a.0.cmp(&b.0));
        Self { weights }
    }

    /// Equal weight for every name.
    pub fn even<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(roles.into_iter().map(|r| (r, 1.0)))
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.weights.iter().map(|(name, _)| name.as_str())
    }
}

impl RoleSelector for BalancedRoles {
    fn choose(&self, counts: &RoleCounts) -> String {
        self.weights
            .iter()
            .map(|(name, weight)| {
                let count = counts.get(name).copied().unwrap_or(0) as f64;
                (name, count / weight)
            })
            // weights are sorted by name, so ties go to the first name
            .fold(None::<(&String, f64)>, |best, (name, ratio)| match best {
                Some((_, best_ratio)) if best_ratio <= ratio => best,
                _ => Some((name, ratio)),
            })
            .map(|(name, _)| name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(selector: &dyn RoleSelector, n: usize) -> RoleCounts {
        let mut counts = RoleCounts::new();
        for _ in 0..n {
            *counts.entry(selector.choose(&counts)).or_default() += 1;
        }
        counts
    }

    #[test]
    fn even_split() {
        let counts = run(&BalancedRoles::even(["scout", "worker"]), 10);
        assert_eq!(counts["scout"], 5);
        assert_eq!(counts["worker"], 5);
    }

    #[test]
    fn weighted_split() {
        let counts = run(&BalancedRoles::new([("worker", 3.0), ("soldier", 1.0)]), 40);
        assert_eq!(counts["worker"], 30);
        assert_eq!(counts["soldier"], 10);
    }

    #[test]
    fn ties_go_to_first_name() {
        let selector = BalancedRoles::even(["worker", "carrier"]);
        assert_eq!(selector.choose(&RoleCounts::new()), "carrier");
    }

    #[test]
    fn empty_selector_yields_no_role() {
        let selector = BalancedRoles::new(Vec::<(String, f64)>::new());
        assert_eq!(selector.choose(&RoleCounts::new()), "");
        assert_eq!(FixedRole::default().choose(&RoleCounts::new()), "");
    }

    #[test]
    fn closures_select_roles() {
        let selector = |counts: &RoleCounts| {
            if counts.get("scout").copied().unwrap_or(0) < 2 {
                "scout".to_string()
            } else {
                "worker".to_string()
            }
        };
        let counts = run(&selector, 5);
        assert_eq!(counts["scout"], 2);
        assert_eq!(counts["worker"], 3);
    }
}
