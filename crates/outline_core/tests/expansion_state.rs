use outline_core::{
    open_db_in_memory, ExpansionService, NodeFields, NodeId, OutlineService, Scope,
    SqliteExpansionRepository, SqliteOutlineRepository, TreeKind, ViewMode, VisibleNode,
};
use rusqlite::Connection;

type Outline<'conn> = OutlineService<SqliteOutlineRepository<'conn>>;
type Expansion<'conn> = ExpansionService<SqliteExpansionRepository<'conn>>;

const TEACHER: i64 = 10;
const STUDENT: i64 = 20;

fn scope() -> Scope {
    Scope::new(5, TreeKind::TeachingGuide)
}

fn services(conn: &Connection) -> (Outline<'_>, Expansion<'_>) {
    (
        OutlineService::new(SqliteOutlineRepository::try_new(conn).unwrap()),
        ExpansionService::new(SqliteExpansionRepository::try_new(conn).unwrap()),
    )
}

fn add(outline: &Outline<'_>, parent: Option<NodeId>, title: &str) -> NodeId {
    outline
        .insert(scope(), parent, &NodeFields::new(title), TEACHER)
        .unwrap()
        .node_id
}

fn rows(visible: &[VisibleNode]) -> Vec<String> {
    visible
        .iter()
        .map(|row| format!("{} {}", row.number, row.node.title))
        .collect()
}

#[test]
fn expand_and_contract_are_idempotent_and_per_user() {
    let conn = open_db_in_memory().unwrap();
    let (outline, expansion) = services(&conn);
    let unit = add(&outline, None, "Unit 1");

    assert!(!expansion.is_expanded(TEACHER, Some(unit)).unwrap());
    expansion.expand(TEACHER, unit).unwrap();
    expansion.expand(TEACHER, unit).unwrap();
    assert!(expansion.is_expanded(TEACHER, Some(unit)).unwrap());
    assert!(!expansion.is_expanded(STUDENT, Some(unit)).unwrap());

    expansion.contract(TEACHER, unit).unwrap();
    expansion.contract(TEACHER, unit).unwrap();
    assert!(!expansion.is_expanded(TEACHER, Some(unit)).unwrap());
}

#[test]
fn root_is_always_expanded() {
    let conn = open_db_in_memory().unwrap();
    let (_, expansion) = services(&conn);
    assert!(expansion.is_expanded(STUDENT, None).unwrap());
}

#[test]
fn visible_outline_follows_expansion_and_hidden_state() {
    let conn = open_db_in_memory().unwrap();
    let (outline, expansion) = services(&conn);
    let unit1 = add(&outline, None, "Unit 1");
    let topic = add(&outline, Some(unit1), "Topic");
    add(&outline, Some(topic), "Detail");
    let draft = add(&outline, Some(unit1), "Draft");
    add(&outline, Some(draft), "Draft notes");
    let unit2 = add(&outline, None, "Unit 2");
    add(&outline, Some(unit2), "Review");
    outline.hide(scope(), draft).unwrap();

    let collapsed = outline
        .list_visible(expansion.repository(), scope(), STUDENT, ViewMode::View)
        .unwrap();
    assert_eq!(rows(&collapsed), ["1 Unit 1", "2 Unit 2"]);
    assert!(collapsed.iter().all(|row| row.has_children && !row.is_expanded));

    for node_id in [unit1, topic, draft, unit2] {
        expansion.expand(STUDENT, node_id).unwrap();
    }
    let view = outline
        .list_visible(expansion.repository(), scope(), STUDENT, ViewMode::View)
        .unwrap();
    assert_eq!(
        rows(&view),
        ["1 Unit 1", "1.1 Topic", "1.1.1 Detail", "2 Unit 2", "2.1 Review"]
    );

    let edit = outline
        .list_visible(expansion.repository(), scope(), STUDENT, ViewMode::Edit)
        .unwrap();
    let hidden: Vec<&str> = edit
        .iter()
        .filter(|row| row.effectively_hidden)
        .map(|row| row.node.title.as_str())
        .collect();
    assert_eq!(edit.len(), 7);
    assert_eq!(hidden, ["Draft", "Draft notes"]);

    expansion.contract(STUDENT, topic).unwrap();
    let teacher_view = outline
        .list_visible(expansion.repository(), scope(), TEACHER, ViewMode::Edit)
        .unwrap();
    assert_eq!(rows(&teacher_view), ["1 Unit 1", "2 Unit 2"]);
}

#[test]
fn deleting_subtree_drops_its_expansion_entries() {
    let conn = open_db_in_memory().unwrap();
    let (outline, expansion) = services(&conn);
    let unit = add(&outline, None, "Unit");
    let topic = add(&outline, Some(unit), "Topic");
    expansion.expand(STUDENT, unit).unwrap();
    expansion.expand(TEACHER, topic).unwrap();

    let removal = outline.delete_subtree(scope(), unit).unwrap();

    assert_eq!(removal.expansions, 2);
    assert!(!expansion.is_expanded(STUDENT, Some(unit)).unwrap());
    assert!(!expansion.is_expanded(TEACHER, Some(topic)).unwrap());
}
