use super::*;
use dealsdb_core::{CategoryNode, CategoryRegistry, ScheduleConfig};

fn registry() -> CategoryRegistry {
    CategoryRegistry::from_nodes(vec![
        CategoryNode::new("abcat0507000", "products_table"),
        CategoryNode::new("abcat0507010", "products_table_2").with_children(vec![
            CategoryNode::new("abcat0507010&search=AMD", "products_table_15"),
        ]),
    ])
    .expect("valid registry")
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["dealsdb-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_categories_command() {
    let cli =
        Cli::try_parse_from(["dealsdb-cli", "categories"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Categories)));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["dealsdb-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn ingest_without_filter_defaults_to_all_categories() {
    let cli = Cli::try_parse_from(["dealsdb-cli", "ingest"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ingest {
            storage_key: None,
            concurrency: 4
        })
    ));
}

#[test]
fn ingest_accepts_storage_key_and_concurrency() {
    let cli = Cli::try_parse_from([
        "dealsdb-cli",
        "ingest",
        "--storage-key",
        "products_table_15",
        "--concurrency",
        "2",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Ingest {
            storage_key,
            concurrency,
        }) => {
            assert_eq!(storage_key.as_deref(), Some("products_table_15"));
            assert_eq!(concurrency, 2);
        }
        other => panic!("expected ingest command, got: {other:?}"),
    }
}

#[test]
fn select_nodes_without_key_returns_every_node_in_order() {
    let registry = registry();
    let keys: Vec<&str> = ingest::select_nodes(&registry, None)
        .expect("all nodes")
        .iter()
        .map(|n| n.storage_key.as_str())
        .collect();
    assert_eq!(
        keys,
        vec!["products_table", "products_table_2", "products_table_15"]
    );
}

#[test]
fn select_nodes_resolves_child_key() {
    let registry = registry();
    let nodes = ingest::select_nodes(&registry, Some("products_table_15")).expect("child node");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].external_category_id, "abcat0507010&search=AMD");
}

#[test]
fn select_nodes_rejects_unknown_key() {
    let registry = registry();
    let err = ingest::select_nodes(&registry, Some("nope")).expect_err("unknown key");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn format_registry_shows_slots_and_indents_children() {
    let schedule = ScheduleConfig {
        enabled: true,
        base_secs: 12 * 3600,
        stagger_secs: 60,
    };
    let rendered = ingest::format_registry(&registry(), schedule);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("12:00:00  products_table "));
    assert!(lines[1].starts_with("12:01:00  products_table_2 "));
    assert!(lines[2].starts_with("12:02:00    products_table_15 "));
    assert!(lines[2].ends_with("abcat0507010&search=AMD"));
}

#[test]
fn format_outcome_marks_failures_with_kind() {
    let started_at = chrono::Utc::now();
    let outcome = dealsdb_ingest::IngestionOutcome {
        storage_key: "products_table".to_string(),
        external_category_id: "abcat0507000".to_string(),
        trigger: dealsdb_ingest::Trigger::Cli,
        started_at,
        finished_at: started_at,
        result: Err(dealsdb_ingest::IngestError::Config("bad".to_string())),
    };
    let line = ingest::format_outcome(&outcome);
    assert!(line.starts_with("FAILED products_table"));
    assert!(line.contains("[config]"));
}
