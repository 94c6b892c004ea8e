//! CLI smoke entry point.
//!
//! # Responsibility
//! - Build a small outline in an in-memory store and print it numbered.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Set `OUTLINE_LOG_DIR` to an absolute directory to also write command logs.

use log::info;
use outline_core::{
    init_logging, open_db_in_memory, ExpansionService, ItemPayload, ItemService, LogConfig,
    NodeFields, NodeId, OutlineResult, OutlineService, Scope, SqliteExpansionRepository,
    SqliteItemRepository, SqliteOutlineRepository, TreeKind, ViewMode,
};
use std::process::ExitCode;

const DEMO_USER: i64 = 1;

fn main() -> ExitCode {
    if let Some(log_dir) = std::env::var_os("OUTLINE_LOG_DIR") {
        if let Err(err) = init_logging(&LogConfig::new("info", log_dir)) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("outline_core ping={}", outline_core::ping());
    println!("outline_core version={}", outline_core::core_version());

    match run_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {} ({err})", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run_demo() -> OutlineResult<()> {
    let conn = open_db_in_memory()?;
    let outline = OutlineService::new(SqliteOutlineRepository::try_new(&conn)?);
    let expansion = ExpansionService::new(SqliteExpansionRepository::try_new(&conn)?);
    let items: ItemService<SqliteItemRepository<'_, ItemPayload>, ItemPayload> =
        ItemService::new(SqliteItemRepository::try_new(&conn)?);
    let scope = Scope::new(1, TreeKind::Program);

    let add = |parent: Option<NodeId>, title: &str| -> OutlineResult<NodeId> {
        let node = outline.insert(scope, parent, &NodeFields::new(title), DEMO_USER)?;
        expansion.expand(DEMO_USER, node.node_id)?;
        Ok(node.node_id)
    };

    let intro = add(None, "Introduction")?;
    add(Some(intro), "Goals")?;
    let methods = add(None, "Methods")?;
    add(Some(methods), "Lectures")?;
    let practicals = add(Some(methods), "Practicals")?;
    add(None, "Assessment")?;

    items.create(
        practicals,
        &ItemPayload::Resource {
            title: "Lab guide".to_string(),
            target: "resource:lab-guide".to_string(),
        },
    )?;

    outline.move_up(scope, methods)?;
    outline.move_right(scope, practicals)?;
    outline.move_left(scope, practicals)?;

    for row in outline.list_visible(expansion.repository(), scope, DEMO_USER, ViewMode::View)? {
        let attached = items.list(row.node.node_id, false)?.len();
        let indent = "  ".repeat(row.node.level.saturating_sub(1) as usize);
        if attached > 0 {
            println!("{indent}{} {} [{attached} item(s)]", row.number, row.node.title);
        } else {
            println!("{indent}{} {}", row.number, row.node.title);
        }
    }

    info!(
        "event=demo_done module=cli status=ok scope={} nodes={}",
        scope,
        outline.count_nodes(scope)?
    );
    Ok(())
}
