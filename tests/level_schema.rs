// tests/level_schema.rs
use gridbot::{
    CatalogError, Color, LevelCatalog, LevelConfig, LevelError, Position, Routine,
    is_valid_star_position,
};

#[test]
fn test_minimal_level_gets_defaults() {
    let json = r#"[{
        "id": 1,
        "name": "Level 1",
        "robotStart": { "x": 0, "y": 0 },
        "starPositions": [{ "x": 4, "y": 4 }]
    }]"#;
    let catalog = LevelCatalog::from_json_str(json).unwrap();
    let level = catalog.first();

    assert_eq!(level.grid_size, 5);
    assert!(level.obstacles.is_empty());
    assert!(level.keys.is_empty());
    assert_eq!(level.max_commands, None);
    assert_eq!(level.routine_limit(Routine::F0), None);
    assert_eq!(level.time_limit, None);
}

#[test]
fn test_full_level_schema() {
    let json = r#"[{
        "id": 4,
        "name": "Keys and paint",
        "robotStart": { "x": 0, "y": 0 },
        "starPositions": [{ "x": 5, "y": 5 }, { "x": 0, "y": 5 }],
        "obstacles": [{ "x": 3, "y": 3 }],
        "keys": [{ "id": "red", "position": { "x": 1, "y": 1 } }],
        "doors": [{ "id": "red", "position": { "x": 2, "y": 2 } }],
        "coloredCells": [{ "position": { "x": 4, "y": 0 }, "color": "purple" }],
        "gridSize": 6,
        "maxCommands": 8,
        "functionLimits": { "F0": 4, "F2": 2 },
        "timeLimit": 90
    }]"#;
    let catalog = LevelCatalog::from_json_str(json).unwrap();
    let level = catalog.level(4).unwrap();

    assert_eq!(level.grid_size, 6);
    assert_eq!(level.star_positions.len(), 2);
    assert_eq!(level.keys[0].id, "red");
    assert_eq!(level.doors[0].position, Position::new(2, 2));
    assert_eq!(level.initial_paint().get(&Position::new(4, 0)), Some(&Color::Purple));
    assert_eq!(level.max_commands, Some(8));
    assert_eq!(level.routine_limit(Routine::F0), Some(4));
    assert_eq!(level.routine_limit(Routine::F1), None);
    assert_eq!(level.routine_limit(Routine::F2), Some(2));
    assert_eq!(level.time_limit, Some(90));
}

#[test]
fn test_catalog_survives_save_and_load() {
    let level = LevelConfig::new(9, "saved", Position::new(1, 1))
        .with_star(Position::new(3, 3))
        .with_obstacle(Position::new(2, 2))
        .with_key("cyan", Position::new(0, 4))
        .with_door("cyan", Position::new(4, 0))
        .with_paint(Position::new(1, 2), Color::Orange)
        .with_function_limit(Routine::F1, 3);
    let catalog = LevelCatalog::from_levels(vec![level]).unwrap();

    let json = catalog.to_json_string().unwrap();
    assert!(json.contains("\"robotStart\""));
    assert!(json.contains("\"F1\": 3"));
    assert!(!json.contains("timeLimit"));

    assert_eq!(LevelCatalog::from_json_str(&json).unwrap(), catalog);
}

#[test]
fn test_star_on_start_is_rejected() {
    let start = Position::new(2, 2);
    assert!(!is_valid_star_position(start, start));

    let level = LevelConfig::new(1, "bad", start).with_star(start);
    assert_eq!(
        level.validate(),
        Err(LevelError::StarOnStart {
            level: 1,
            position: start
        })
    );
}

#[test]
fn test_out_of_bounds_is_rejected() {
    let level = LevelConfig::new(2, "bad", Position::new(0, 0)).with_star(Position::new(5, 0));
    assert!(matches!(
        level.validate(),
        Err(LevelError::OutOfBounds { what: "star", .. })
    ));
}

#[test]
fn test_items_on_walls_are_rejected() {
    let paint_on_wall = LevelConfig::new(3, "bad", Position::new(0, 0))
        .with_star(Position::new(4, 4))
        .with_obstacle(Position::new(1, 1))
        .with_paint(Position::new(1, 1), Color::Red);
    assert!(matches!(
        paint_on_wall.validate(),
        Err(LevelError::OnWall { what: "painted cell", .. })
    ));

    let door_on_wall = LevelConfig::new(3, "bad", Position::new(0, 0))
        .with_obstacle(Position::new(1, 1))
        .with_door("red", Position::new(1, 1));
    assert!(matches!(
        door_on_wall.validate(),
        Err(LevelError::OnWall { what: "door", .. })
    ));
}

#[test]
fn test_zero_budgets_are_rejected() {
    let level = LevelConfig::new(5, "bad", Position::new(0, 0)).with_max_commands(0);
    assert!(matches!(level.validate(), Err(LevelError::EmptyBudget { .. })));

    let level = LevelConfig::new(5, "bad", Position::new(0, 0)).with_function_limit(Routine::F2, 0);
    assert_eq!(
        level.validate(),
        Err(LevelError::EmptyBudget {
            level: 5,
            what: "F2"
        })
    );
}

#[test]
fn test_catalog_rejects_bad_lists() {
    assert!(matches!(LevelCatalog::from_json_str("[]"), Err(CatalogError::Empty)));
    assert!(matches!(
        LevelCatalog::from_json_str("{ not json"),
        Err(CatalogError::Json(_))
    ));

    let a = LevelConfig::new(1, "a", Position::new(0, 0));
    let b = LevelConfig::new(1, "b", Position::new(1, 1));
    assert!(matches!(
        LevelCatalog::from_levels(vec![a, b]),
        Err(CatalogError::DuplicateId(1))
    ));
}

#[test]
fn test_unknown_paint_color_fails_to_load() {
    let json = r#"[{
        "id": 1,
        "name": "x",
        "robotStart": { "x": 0, "y": 0 },
        "coloredCells": [{ "position": { "x": 1, "y": 1 }, "color": "mauve" }]
    }]"#;
    assert!(matches!(
        LevelCatalog::from_json_str(json),
        Err(CatalogError::Json(_))
    ));
}

#[test]
fn test_builtin_catalog_navigation() {
    let catalog = LevelCatalog::builtin();
    assert_eq!(catalog.len(), 3);
    assert!(catalog.is_first(1));
    assert!(catalog.is_last(3));
    assert_eq!(catalog.next_id(1), Some(2));
    assert_eq!(catalog.next_id(3), None);
    assert_eq!(catalog.previous_id(1), None);
    assert!(matches!(catalog.level(99), Err(CatalogError::NotFound(99))));
    for level in catalog.levels() {
        assert!(level.validate().is_ok());
    }
}

#[test]
fn test_repainting_replaces_color() {
    let mut level = LevelConfig::new(1, "p", Position::new(0, 0));
    level.paint(Position::new(2, 2), Color::Red);
    level.paint(Position::new(2, 2), Color::Blue);
    assert_eq!(level.colored_cells.len(), 1);
    assert_eq!(level.initial_paint()[&Position::new(2, 2)], Color::Blue);
}
