//! Integration tests for role resolution and role tables.

use formica_core::prelude::*;

#[test]
fn resolve_is_deterministic() {
    let adj = Adjustments {
        sight: Level::Boosted,
        speed: Level::Decreased,
        stamina: Level::Decreased,
        ..Adjustments::default()
    };
    let first = resolve_attributes(&adj, 500.0);
    for _ in 0..10 {
        assert_eq!(resolve_attributes(&adj, 500.0), first);
    }
    assert_eq!(first.sight_radius, 90.0);
    assert_eq!(first.speed, 3.0);
    assert_eq!(first.stamina, 50);
}

#[test]
fn every_standard_role_is_balanced() {
    let table = RoleTable::standard();
    assert!(!table.is_empty());
    for (name, adj) in table.iter() {
        assert_eq!(adj.sum(), 0, "role {name} is unbalanced");
    }
}

#[test]
fn range_scales_with_base_range() {
    let adj = Adjustments {
        range: Level::Increased,
        attack: Level::Decreased,
        ..Adjustments::default()
    };
    assert_eq!(resolve_attributes(&adj, 100.0).range, 150);
    assert_eq!(resolve_attributes(&adj, 500.0).range, 750);
}

#[test]
fn role_table_loads_from_toml() {
    let text = r#"
        [scout]
        speed = 2
        capacity = -1
        attack = -1

        [idler]
        speed = 9
    "#;
    let table: RoleTable = toml::from_str(text).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("scout").map(|a| a.speed), Some(Level::Boosted));
    // out-of-range level reads as default, leaving the vector balanced
    assert_eq!(table.get("idler"), Some(&Adjustments::default()));
}

#[test]
fn unbalanced_toml_role_is_rejected() {
    let text = r#"
        [glutton]
        capacity = 2
    "#;
    let err = toml::from_str::<RoleTable>(text).unwrap_err();
    assert!(err.to_string().contains("unbalanced"));
}

#[test]
fn role_table_round_trips_through_json() {
    let table = RoleTable::standard();
    let json = serde_json::to_string(&table).unwrap();
    let back: RoleTable = serde_json::from_str(&json).unwrap();
    assert_eq!(back, table);
}
